//! Configuration

use crate::binding::Binding;
use crate::error::ConfigError;
use crate::host::WritePath;
use serde::{Deserialize, Serialize};

/// Settings for the free-function API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetanodeConfig {
    /// Write through the host's undo log
    pub undoable: bool,
    /// How stored node ids decode
    pub binding: Binding,
}

impl MetanodeConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With undo support on or off
    #[inline]
    #[must_use]
    pub fn with_undoable(mut self, undoable: bool) -> Self {
        self.undoable = undoable;
        self
    }

    /// With node binding
    #[inline]
    #[must_use]
    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.binding = binding;
        self
    }

    /// Write path for mutations
    #[inline]
    #[must_use]
    pub fn write_path(&self) -> WritePath {
        WritePath::from(self.undoable)
    }

    /// Load from TOML; missing keys take their defaults
    ///
    /// # Errors
    /// `ConfigError::Parse` on invalid TOML or unknown values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

impl Default for MetanodeConfig {
    fn default() -> Self {
        Self {
            undoable: true,
            binding: Binding::Handles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MetanodeConfig::new();
        assert!(config.undoable);
        assert_eq!(config.binding, Binding::Handles);
        assert_eq!(config.write_path(), WritePath::Undoable);
    }

    #[test]
    fn builders() {
        let config = MetanodeConfig::new()
            .with_undoable(false)
            .with_binding(Binding::Names);
        assert_eq!(config.write_path(), WritePath::Direct);
        assert_eq!(config.binding, Binding::Names);
    }

    #[test]
    fn from_toml() {
        let config = MetanodeConfig::from_toml_str("binding = \"names\"").unwrap();
        assert!(config.undoable);
        assert_eq!(config.binding, Binding::Names);

        let config = MetanodeConfig::from_toml_str("undoable = false").unwrap();
        assert!(!config.undoable);

        assert_eq!(MetanodeConfig::from_toml_str("").unwrap(), MetanodeConfig::default());
        assert!(MetanodeConfig::from_toml_str("undoable = \"yes\"").is_err());
    }

    #[test]
    fn serializes_back_to_toml() {
        let config = MetanodeConfig::new().with_binding(Binding::Names);
        let text = toml::to_string(&config).unwrap();
        assert_eq!(MetanodeConfig::from_toml_str(&text).unwrap(), config);
    }
}
