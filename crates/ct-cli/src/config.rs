//! Layered configuration for the `ct` binary.

use std::path::{Path, PathBuf};

use ct_core::analyzers::{BonusDamageConfig, BuffUsageConfig};
use ct_core::{EntityRegistry, EntitySpec, NormalizerConfig, RegistryError};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Settings shared by every subcommand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Actor ID of the player whose casts and buffs are analyzed.
    pub player_id: u64,

    /// Intellect before the first stat change in the trace.
    #[serde(default)]
    pub initial_intellect: u64,

    /// Entity table override. Empty means the built-in demonology table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<EntitySpec>,

    #[serde(default)]
    pub normalizer: NormalizerConfig,

    #[serde(default)]
    pub bonus_damage: BonusDamageConfig,

    #[serde(default)]
    pub buff_usage: BuffUsageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player_id: 1,
            initial_intellect: 0,
            entities: Vec::new(),
            normalizer: NormalizerConfig::default(),
            bonus_damage: BonusDamageConfig::default(),
            buff_usage: BuffUsageConfig::default(),
        }
    }
}

impl Config {
    /// Layers defaults, the user config file, `config_path`, then `CT_*`
    /// environment variables, later layers winning.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // ~/.config/ct/config.toml
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // --config
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // CT_NORMALIZER__EXTENSION_MS=5000 and friends
        figment = figment.merge(Env::prefixed("CT_").split("__"));

        figment.extract()
    }

    /// Builds the entity registry, falling back to the built-in table.
    pub fn registry(&self) -> Result<EntityRegistry, RegistryError> {
        if self.entities.is_empty() {
            Ok(EntityRegistry::demonology())
        } else {
            EntityRegistry::new(self.entities.iter().cloned())
        }
    }
}

/// Returns the platform-specific config directory for ct.
///
/// On Linux: `~/.config/ct`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ct"))
}
