//! Identity key configuration.

use crate::*;
use std::sync::Arc;

/// Identity key configuration struct.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityConfig {
    #[serde(default)]
    account_index: u32,

    #[serde(default = "default_proof_version")]
    proof_version: u64,
}

fn default_proof_version() -> u64 {
    CURRENT_VERSION
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            account_index: 0,
            proof_version: CURRENT_VERSION,
        }
    }
}

impl IdentityConfig {
    fn finalize(mut self) -> Arc<IdentityConfig> {
        self.proof_version = self.proof_version.clamp(1, CURRENT_VERSION);
        Arc::new(self)
    }

    /// Obtain a new config builder.
    pub fn builder() -> IdentityConfigBuilder {
        IdentityConfigBuilder::default()
    }

    /// Parse a config from yaml. Out of range values are clamped.
    pub fn from_yaml(yaml: &str) -> IdentityResult<Arc<IdentityConfig>> {
        let config: IdentityConfig =
            serde_yaml::from_str(yaml).map_err(IdentityError::other)?;
        Ok(config.finalize())
    }

    /// Render this config as yaml.
    pub fn to_yaml(&self) -> IdentityResult<String> {
        serde_yaml::to_string(self).map_err(IdentityError::other)
    }

    /// Account index used for the identity and discovery paths.
    pub fn get_account_index(&self) -> u32 {
        self.account_index
    }

    /// Proof version stamped on newly bootstrapped chains.
    pub fn get_proof_version(&self) -> u64 {
        self.proof_version
    }
}

/// Identity key configuration builder.
#[derive(Debug, Default)]
pub struct IdentityConfigBuilder(IdentityConfig);

impl IdentityConfigBuilder {
    /// Obtain a new config builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the config builder to obtain a true IdentityConfig instance.
    pub fn build(self) -> Arc<IdentityConfig> {
        self.0.finalize()
    }

    /// Override the default account index (0).
    pub fn set_account_index(mut self, account_index: u32) -> Self {
        self.0.account_index = account_index;
        self
    }

    /// Override the emitted proof version. Clamped on build.
    pub fn set_proof_version(mut self, proof_version: u64) -> Self {
        self.0.proof_version = proof_version;
        self
    }
}
