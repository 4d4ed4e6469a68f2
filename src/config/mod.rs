//! Config module.
//! Provides configuration types, the default config path, and the optional XML
//! config file.

pub mod paths;
pub mod types;
pub mod xml;

pub use paths::{CONFIG_ENV_VAR, default_config_path};
pub use types::{Config, LogLevel};
pub use xml::{load_config_from_xml, load_config_from_xml_path, XmlSettings};

/// Names starting with this are hidden from the sorter.
pub const HIDDEN_MARKER_DEFAULT: char = '.';
/// Pause after each flush so the device settles before the next move.
pub const SETTLE_DELAY_DEFAULT: std::time::Duration = std::time::Duration::from_millis(100);
