//! SettingsManager: environment-backed settings with defaults and validation.

use std::collections::HashMap;

use super::SettingInfo;
use super::defaults::DEFAULT_SETTINGS;
use super::validation::validate_setting;

/// Resolves settings from explicit overrides, falling back to defaults.
#[derive(Debug, Clone, Default)]
pub struct SettingsManager {
    overrides: HashMap<String, String>,
}

impl SettingsManager {
    /// Build a manager from the process environment.
    ///
    /// Only known keys are picked up; invalid values are dropped with a warning
    /// so that the default applies.
    pub fn from_env() -> Self {
        let mut sm = Self::default();
        for key in DEFAULT_SETTINGS.keys() {
            if let Ok(value) = std::env::var(key) {
                if let Err(e) = sm.set_setting(key, &value) {
                    tracing::warn!("Ignoring environment value for {key}: {e}");
                }
            }
        }
        sm
    }

    /// Build a manager from an explicit map. Invalid values are rejected.
    pub fn with_overrides<I, K, V>(overrides: I) -> Result<Self, anyhow::Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut sm = Self::default();
        for (key, value) in overrides {
            sm.set_setting(key.as_ref(), value.as_ref())?;
        }
        Ok(sm)
    }

    /// Get a setting value. Falls back to default if not overridden.
    pub fn get_setting(&self, key: &str) -> Result<String, anyhow::Error> {
        if let Some(val) = self.overrides.get(key) {
            return Ok(val.clone());
        }
        if let Some(def) = DEFAULT_SETTINGS.get(key) {
            return Ok(def.default.to_string());
        }
        anyhow::bail!("setting not found: {key}");
    }

    /// Set a setting value with validation.
    pub fn set_setting(&mut self, key: &str, value: &str) -> Result<(), anyhow::Error> {
        if !DEFAULT_SETTINGS.contains_key(key) {
            anyhow::bail!("unknown setting key: {key}");
        }

        validate_setting(key, value)
            .map_err(|e| anyhow::anyhow!("validation error for {key}: {e}"))?;

        self.overrides.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Get all settings, filling in defaults for keys without an override.
    pub fn get_all_settings(&self) -> HashMap<String, SettingInfo> {
        DEFAULT_SETTINGS
            .values()
            .map(|def| {
                let value = self
                    .overrides
                    .get(def.key)
                    .cloned()
                    .unwrap_or_else(|| def.default.to_string());
                (
                    def.key.to_string(),
                    SettingInfo {
                        key: def.key.to_string(),
                        value,
                        description: def.description.to_string(),
                        is_default: !self.overrides.contains_key(def.key),
                    },
                )
            })
            .collect()
    }
}
