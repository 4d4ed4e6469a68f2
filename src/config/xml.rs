//! XML configuration support.
//! - Loads optional settings from config.xml (quick_xml + serde).
//! - A missing file is not an error; a malformed one is.
//!
//! Example:
//! <config>
//!   <log_level>info</log_level>
//!   <log_file>/var/log/fat_sort.log</log_file>
//!   <settle_ms>250</settle_ms>
//!   <hidden_marker>.</hidden_marker>
//! </config>

use anyhow::{Context, Result, bail};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use super::paths::default_config_path;
use super::types::{Config, LogLevel};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    #[serde(rename = "log_level")]
    log_level: Option<String>,
    #[serde(rename = "log_file")]
    log_file: Option<String>,
    #[serde(rename = "settle_ms", default, deserialize_with = "de_u64_trimmed_opt")]
    settle_ms: Option<u64>,
    #[serde(rename = "hidden_marker")]
    hidden_marker: Option<String>,
}

// Custom deserializer that trims surrounding whitespace for optional u64
fn de_u64_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<u64>().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Settings found in a config file. Unset fields leave the defaults alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlSettings {
    pub log_level: Option<LogLevel>,
    pub log_file: Option<PathBuf>,
    pub settle_delay: Option<Duration>,
    pub hidden_marker: Option<char>,
}

impl XmlSettings {
    /// Overlay these settings onto `cfg`.
    pub fn apply(&self, cfg: &mut Config) {
        if let Some(level) = self.log_level {
            cfg.log_level = level;
        }
        if let Some(p) = &self.log_file {
            cfg.log_file = Some(p.clone());
        }
        if let Some(d) = self.settle_delay {
            cfg.settle_delay = d;
        }
        if let Some(c) = self.hidden_marker {
            cfg.hidden_marker = c;
        }
    }
}

fn trimmed(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse one config file.
pub fn load_config_from_xml_path(path: &Path) -> Result<XmlSettings> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;

    let log_level = match trimmed(parsed.log_level) {
        Some(s) => Some(
            s.parse::<LogLevel>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("config '{}'", path.display()))?,
        ),
        None => None,
    };
    let hidden_marker = match trimmed(parsed.hidden_marker) {
        Some(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => bail!(
                    "config '{}': hidden_marker must be a single character, got '{s}'",
                    path.display()
                ),
            }
        }
        None => None,
    };

    Ok(XmlSettings {
        log_level,
        log_file: trimmed(parsed.log_file).map(PathBuf::from),
        settle_delay: parsed.settle_ms.map(Duration::from_millis),
        hidden_marker,
    })
}

/// Load the config file from [`default_config_path`], if there is one.
/// Returns Ok(None) when no file exists.
pub fn load_config_from_xml() -> Result<Option<(PathBuf, XmlSettings)>> {
    let Some(path) = default_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        debug!(path = %path.display(), "no config file");
        return Ok(None);
    }
    let settings = load_config_from_xml_path(&path)?;
    Ok(Some((path, settings)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(xml: &str) -> (tempfile::TempDir, PathBuf) {
        let td = tempdir().unwrap();
        let p = td.path().join("config.xml");
        fs::write(&p, xml).unwrap();
        (td, p)
    }

    #[test]
    fn reads_all_fields_with_whitespace() {
        let (_td, p) = write(
            r#"<config>
  <log_level> info </log_level>
  <log_file> /tmp/fs.log </log_file>
  <settle_ms> 250 </settle_ms>
  <hidden_marker>_</hidden_marker>
</config>
"#,
        );
        let s = load_config_from_xml_path(&p).unwrap();
        assert_eq!(s.log_level, Some(LogLevel::Info));
        assert_eq!(s.log_file, Some(PathBuf::from("/tmp/fs.log")));
        assert_eq!(s.settle_delay, Some(Duration::from_millis(250)));
        assert_eq!(s.hidden_marker, Some('_'));

        let mut cfg = Config::default();
        s.apply(&mut cfg);
        assert_eq!(cfg.hidden_marker, '_');
        assert_eq!(cfg.settle_delay, Duration::from_millis(250));
    }

    #[test]
    fn empty_elements_keep_defaults() {
        let (_td, p) = write("<config><log_file></log_file><settle_ms></settle_ms></config>");
        let s = load_config_from_xml_path(&p).unwrap();
        assert_eq!(s, XmlSettings::default());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let (_td, p) = write("<config><download_base>/x</download_base></config>");
        let err = load_config_from_xml_path(&p).unwrap_err();
        assert!(format!("{err:#}").contains("parse config xml"), "{err:#}");
    }

    #[test]
    fn multi_char_marker_is_rejected() {
        let (_td, p) = write("<config><hidden_marker>..</hidden_marker></config>");
        let err = load_config_from_xml_path(&p).unwrap_err();
        assert!(err.to_string().contains("single character"), "{err}");
    }

    #[test]
    fn bad_level_is_rejected() {
        let (_td, p) = write("<config><log_level>loud</log_level></config>");
        let err = load_config_from_xml_path(&p).unwrap_err();
        assert!(format!("{err:#}").contains("invalid log level"), "{err:#}");
    }
}
