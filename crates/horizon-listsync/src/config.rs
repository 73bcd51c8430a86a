//! Configuration for managed lists and windows.
//!
//! Both config types use a builder pattern and can also be loaded from TOML,
//! so a host can keep per-screen list settings next to its skin files.
//!
//! ```
//! use horizon_listsync::config::{ListConfig, WindowSettings};
//!
//! let list = ListConfig::from_toml_str("control_id = 101\nmax_view_index = 7").unwrap();
//! assert_eq!(list.max_view_index(), 7);
//!
//! let settings = WindowSettings::default().with_crossfade(true);
//! assert!(settings.crossfade());
//! ```

use serde::{Deserialize, Serialize};

use horizon_listsync_core::ConfigError;

/// Default fallback background image shown when an item has no art.
pub const DEFAULT_FALLBACK_BACKGROUND: &str = "backgrounds/fallback_black.png";

/// Default namespace prefixed to global (home window) property keys.
pub const DEFAULT_PROPERTY_NAMESPACE: &str = "listsync";

/// Configuration for a [`ManagedList`](crate::model::ManagedList).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    /// Id of the native list control inside its hosting window.
    control_id: u32,
    /// Index of the last row that fits in the visible viewport
    /// (visible rows minus one). Zero disables viewport shifting.
    max_view_index: usize,
    /// Property names every row must present, even before any item sets them.
    property_keys: Vec<String>,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            control_id: 0,
            max_view_index: 0,
            property_keys: Vec::new(),
        }
    }
}

impl ListConfig {
    /// Create a configuration for the given control.
    pub fn new(control_id: u32) -> Self {
        Self {
            control_id,
            ..Default::default()
        }
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the maximum visible row index.
    pub fn with_max_view_index(mut self, max_view_index: usize) -> Self {
        self.max_view_index = max_view_index;
        self
    }

    /// Add a property name every row should present.
    pub fn with_property_key(mut self, key: impl Into<String>) -> Self {
        self.property_keys.push(key.into());
        self
    }

    /// The native control id.
    pub fn control_id(&self) -> u32 {
        self.control_id
    }

    /// The maximum visible row index.
    pub fn max_view_index(&self) -> usize {
        self.max_view_index
    }

    /// Property names pre-seeded into the list's normalized key set.
    pub fn property_keys(&self) -> &[String] {
        &self.property_keys
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.property_keys.iter().any(|k| k.is_empty()) {
            return Err(ConfigError::invalid_value(
                "property_keys",
                "property names must not be empty",
            ));
        }
        Ok(())
    }
}

/// Display settings consulted by window lifecycle bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    /// Whether item art drives the window background.
    dynamic_backgrounds: bool,
    /// Whether background changes crossfade between two layers.
    crossfade: bool,
    /// Whether the skin should show the fallback image behind missing art.
    use_bg_fallback: bool,
    /// Solid background colour as `AARRGGBB` hex, or `None` for the default.
    background_colour: Option<String>,
    /// Image used when no background is available.
    fallback_background: String,
    /// Namespace prefixed to global property keys.
    property_namespace: String,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            dynamic_backgrounds: true,
            crossfade: false,
            use_bg_fallback: false,
            background_colour: None,
            fallback_background: DEFAULT_FALLBACK_BACKGROUND.to_string(),
            property_namespace: DEFAULT_PROPERTY_NAMESPACE.to_string(),
        }
    }
}

impl WindowSettings {
    /// Parse settings from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(text)?;
        if let Some(colour) = &settings.background_colour {
            if colour != "-" && (colour.len() != 8 || !colour.chars().all(|c| c.is_ascii_hexdigit())) {
                return Err(ConfigError::invalid_value(
                    "background_colour",
                    format!("expected AARRGGBB hex, got {colour:?}"),
                ));
            }
        }
        Ok(settings)
    }

    /// Enable or disable art-driven backgrounds.
    pub fn with_dynamic_backgrounds(mut self, enabled: bool) -> Self {
        self.dynamic_backgrounds = enabled;
        self
    }

    /// Enable or disable background crossfading.
    pub fn with_crossfade(mut self, enabled: bool) -> Self {
        self.crossfade = enabled;
        self
    }

    /// Enable or disable the fallback image layer.
    pub fn with_bg_fallback(mut self, enabled: bool) -> Self {
        self.use_bg_fallback = enabled;
        self
    }

    /// Use a solid background colour (`AARRGGBB`, or `"-"` for opaque black).
    pub fn with_background_colour(mut self, colour: impl Into<String>) -> Self {
        self.background_colour = Some(colour.into());
        self
    }

    /// Set the fallback background image.
    pub fn with_fallback_background(mut self, path: impl Into<String>) -> Self {
        self.fallback_background = path.into();
        self
    }

    /// Set the global property namespace.
    pub fn with_property_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.property_namespace = namespace.into();
        self
    }

    /// Whether item art drives the window background.
    pub fn dynamic_backgrounds(&self) -> bool {
        self.dynamic_backgrounds
    }

    /// Whether background changes crossfade.
    pub fn crossfade(&self) -> bool {
        self.crossfade
    }

    /// Whether the fallback image layer is used.
    pub fn use_bg_fallback(&self) -> bool {
        self.use_bg_fallback
    }

    /// The configured solid background colour, if any.
    pub fn background_colour(&self) -> Option<&str> {
        self.background_colour.as_deref()
    }

    /// The fallback background image.
    pub fn fallback_background(&self) -> &str {
        &self.fallback_background
    }

    /// The global property namespace.
    pub fn property_namespace(&self) -> &str {
        &self.property_namespace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_config_defaults() {
        let config = ListConfig::from_toml_str("").unwrap();
        assert_eq!(config, ListConfig::default());
    }

    #[test]
    fn test_list_config_from_toml() {
        let config = ListConfig::from_toml_str(
            r#"
            control_id = 101
            max_view_index = 5
            property_keys = ["watched", "progress"]
            "#,
        )
        .unwrap();
        assert_eq!(config.control_id(), 101);
        assert_eq!(config.max_view_index(), 5);
        assert_eq!(config.property_keys(), ["watched", "progress"]);
    }

    #[test]
    fn test_list_config_rejects_empty_key() {
        let err = ListConfig::from_toml_str(r#"property_keys = [""]"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_list_config_parse_error() {
        let err = ListConfig::from_toml_str("control_id = \"abc\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_window_settings_builder() {
        let settings = WindowSettings::default()
            .with_crossfade(true)
            .with_background_colour("FF202020")
            .with_property_namespace("app");
        assert!(settings.crossfade());
        assert!(settings.dynamic_backgrounds());
        assert_eq!(settings.background_colour(), Some("FF202020"));
        assert_eq!(settings.property_namespace(), "app");
    }

    #[test]
    fn test_window_settings_rejects_bad_colour() {
        let err = WindowSettings::from_toml_str(r#"background_colour = "red""#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let ok = WindowSettings::from_toml_str(r#"background_colour = "-""#).unwrap();
        assert_eq!(ok.background_colour(), Some("-"));
    }
}
