//! Default config location.

use dirs::config_dir;
use std::env;
use std::path::PathBuf;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "FAT_SORT_CONFIG";

/// Config file to read: `$FAT_SORT_CONFIG` if set, else the OS config dir
/// (`~/.config/fat_sort/config.xml` on Linux). None if neither is known.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(p));
    }
    if let Some(mut base) = config_dir() {
        base.push("fat_sort");
        base.push("config.xml");
        Some(base)
    } else {
        env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join(".config")
                .join("fat_sort")
                .join("config.xml")
        })
    }
}
