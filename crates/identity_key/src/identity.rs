use crate::*;
use std::sync::Arc;

/// The keys of one identity, derived from a single seed.
///
/// Wraps a [KeyChain] and an [IdentityConfig]. Dropping or clearing an
/// IdentityKey zeroes every keypair and symmetric key it handed out.
#[derive(Debug)]
pub struct IdentityKey {
    key_chain: KeyChain,
    config: Arc<IdentityConfig>,
    identity: KeyPair,
}

impl IdentityKey {
    /// Derive an identity from a raw 64 byte seed.
    pub fn from_seed(seed: &[u8]) -> IdentityResult<Self> {
        Self::from_key_chain(KeyChain::from_seed(seed)?)
    }

    /// Derive an identity from a mnemonic phrase.
    pub fn from_mnemonic(words: &str) -> IdentityResult<Self> {
        Self::from_key_chain(KeyChain::from_mnemonic(words)?)
    }

    /// Wrap an existing key chain with the default config.
    pub fn from_key_chain(key_chain: KeyChain) -> IdentityResult<Self> {
        Self::priv_new(key_chain, IdentityConfig::builder().build())
    }

    /// Switch to a different config, re-deriving the identity keypair
    /// for its account index.
    pub fn with_config(
        self,
        config: Arc<IdentityConfig>,
    ) -> IdentityResult<Self> {
        let Self { key_chain, .. } = self;
        Self::priv_new(key_chain, config)
    }

    fn priv_new(
        mut key_chain: KeyChain,
        config: Arc<IdentityConfig>,
    ) -> IdentityResult<Self> {
        let account_index = config.get_account_index();
        let identity = key_chain.get_key_pair(identity_path(account_index))?;
        tracing::debug!(
            account_index,
            identity = %identity.public_key(),
            "identity key ready"
        );
        Ok(Self {
            key_chain,
            config,
            identity,
        })
    }

    /// The active config.
    pub fn config(&self) -> &Arc<IdentityConfig> {
        &self.config
    }

    /// The identity public key.
    pub fn identity_public_key(&self) -> &Ed25519PubKey {
        self.identity.public_key()
    }

    /// The identity signing keypair. Zeroed when this IdentityKey is
    /// cleared or dropped.
    pub fn identity_key_pair(&self) -> KeyPair {
        self.identity.clone()
    }

    /// The discovery keypair for the configured account.
    pub fn discovery_key_pair(&mut self) -> IdentityResult<KeyPair> {
        self.key_chain
            .get_key_pair(discovery_path(self.config.get_account_index()))
    }

    /// The public half of the discovery keypair.
    pub fn profile_discovery_public_key(
        &mut self,
    ) -> IdentityResult<Ed25519PubKey> {
        Ok(self.discovery_key_pair()?.public_key().clone())
    }

    /// The symmetric encryption key scoped to `context_key`.
    pub fn encryption_key(
        &mut self,
        context_key: &[u8],
    ) -> IdentityResult<SymmetricKey> {
        self.key_chain
            .get_symmetric_key(&encryption_key_path(context_key))
    }

    /// Start a new chain authorizing `device_public_key`, stamped with
    /// the configured proof version.
    pub fn bootstrap(
        &self,
        device_public_key: &Ed25519PubKey,
    ) -> IdentityResult<Box<[u8]>> {
        AttestationProof::new(self.identity.public_key().clone(), Epoch::now())
            .with_version(self.config.get_proof_version())
            .attest_device(device_public_key, &self.identity)?
            .encode()
    }

    /// Zero all secret material. Later derivations error, and the
    /// identity keypair can no longer produce valid signatures.
    pub fn clear(&mut self) {
        self.key_chain.clear();
    }
}
