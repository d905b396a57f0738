//! Hierarchical deterministic derivation of signing and symmetric keys.
//!
//! Two independent trees hang off the root seed. Signing keypairs are
//! derived along hardened integer paths with the libsodium kdf, symmetric
//! keys along label paths with keyed blake2b. Each tree has its own root,
//! so no integer path and label path can ever produce the same secret.

use crate::*;
use std::collections::HashMap;
use std::sync::Arc;
use zeroize::Zeroize;

// blake2b keys, must be at least 16 bytes
const ASYMMETRIC_ROOT_KEY: &[u8] = b"identity-key asymmetric root";
const SYMMETRIC_ROOT_KEY: &[u8] = b"identity-key symmetric root";

const KDF_CONTEXT: &[u8; 8] = b"IdKeyHrd";

/// Every integer segment is offset into the hardened range.
pub const HARDENED_OFFSET: u64 = 0x8000_0000;

/// Byte length of derived symmetric keys.
pub const SYMMETRIC_KEY_BYTES: usize = 32;

/// An ed25519 signing keypair. The secret key lives in locked memory
/// and is shared by clones, so zeroing one zeroes them all.
#[derive(Clone)]
pub struct KeyPair {
    public_key: Ed25519PubKey,
    secret_key: SharedSizedLockedArray<SECRET_KEY_BYTES>,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .finish()
    }
}

impl PartialEq for KeyPair {
    fn eq(&self, oth: &Self) -> bool {
        self.public_key == oth.public_key
    }
}

impl Eq for KeyPair {}

impl KeyPair {
    /// Generate a new random keypair (e.g. for a device).
    pub fn new_random() -> IdentityResult<Self> {
        let mut pk = [0; PUBLIC_KEY_BYTES];
        let secret_key = new_shared_locked::<SECRET_KEY_BYTES>()?;
        sodoken::sign::keypair(&mut pk, &mut secret_key.lock().lock())?;
        Ok(Self {
            public_key: pk.into(),
            secret_key,
        })
    }

    /// Deterministically build a keypair from a 32 byte locked seed.
    pub fn from_seed(
        seed: &mut sodoken::SizedLockedArray<32>,
    ) -> IdentityResult<Self> {
        let mut pk = [0; PUBLIC_KEY_BYTES];
        let secret_key = new_shared_locked::<SECRET_KEY_BYTES>()?;
        sodoken::sign::seed_keypair(
            &mut pk,
            &mut secret_key.lock().lock(),
            &seed.lock(),
        )?;
        Ok(Self {
            public_key: pk.into(),
            secret_key,
        })
    }

    /// The public half of this keypair.
    pub fn public_key(&self) -> &Ed25519PubKey {
        &self.public_key
    }

    /// The secret half of this keypair.
    pub fn secret_key(&self) -> SharedSizedLockedArray<SECRET_KEY_BYTES> {
        self.secret_key.clone()
    }

    /// Produce a detached signature over `message`.
    pub fn sign(&self, message: &[u8]) -> IdentityResult<Ed25519Signature> {
        let mut signature = [0; SIGNATURE_BYTES];
        sodoken::sign::sign_detached(
            &mut signature,
            message,
            &self.secret_key.lock().lock(),
        )?;
        Ok(signature.into())
    }

    /// Zero the secret key in place. Signatures made afterwards
    /// will not verify.
    pub fn zero(&self) {
        self.secret_key.lock().lock().zeroize();
    }
}

/// A 32 byte symmetric key derived from a label path.
#[derive(Clone)]
pub struct SymmetricKey(SharedSizedLockedArray<SYMMETRIC_KEY_BYTES>);

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SymmetricKey").field(&"<secret>").finish()
    }
}

impl PartialEq for SymmetricKey {
    fn eq(&self, oth: &Self) -> bool {
        // the mutex is not reentrant
        if Arc::ptr_eq(&self.0, &oth.0) {
            return true;
        }
        *self.0.lock().lock() == *oth.0.lock().lock()
    }
}

impl Eq for SymmetricKey {}

impl SymmetricKey {
    /// Access the locked key bytes.
    pub fn inner(&self) -> SharedSizedLockedArray<SYMMETRIC_KEY_BYTES> {
        self.0.clone()
    }

    /// Zero the key in place.
    pub fn zero(&self) {
        self.0.lock().lock().zeroize();
    }
}

/// Derives and caches keys from a single root seed.
///
/// Derived keys are handed out as clones sharing the same locked memory,
/// so [KeyChain::clear] (also run on drop) wipes every copy.
pub struct KeyChain {
    asymmetric_root: sodoken::SizedLockedArray<32>,
    symmetric_root: sodoken::SizedLockedArray<32>,
    key_pairs: HashMap<HardenedPath, KeyPair>,
    symmetric_keys: HashMap<LabelPath, SymmetricKey>,
    cleared: bool,
}

impl std::fmt::Debug for KeyChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyChain")
            .field("cached_key_pairs", &self.key_pairs.len())
            .field("cached_symmetric_keys", &self.symmetric_keys.len())
            .field("cleared", &self.cleared)
            .finish()
    }
}

impl KeyChain {
    /// Build a key chain from a raw seed or a mnemonic.
    pub fn derive(source: SeedSource<'_>) -> IdentityResult<Self> {
        let seed = source.to_seed()?;
        let mut seed = seed.lock();
        let key_chain = Self::priv_from_seed(&seed.lock()[..])?;
        Ok(key_chain)
    }

    /// Build a key chain from a raw [SEED_BYTES] seed.
    pub fn from_seed(seed: &[u8]) -> IdentityResult<Self> {
        Self::derive(SeedSource::Seed(seed))
    }

    /// Build a key chain from a mnemonic phrase.
    pub fn from_mnemonic(words: &str) -> IdentityResult<Self> {
        Self::derive(SeedSource::Mnemonic(words))
    }

    fn priv_from_seed(seed: &[u8]) -> IdentityResult<Self> {
        let mut asymmetric_root = sodoken::SizedLockedArray::new()?;
        sodoken::blake2b::blake2b_hash(
            &mut *asymmetric_root.lock(),
            seed,
            Some(ASYMMETRIC_ROOT_KEY),
        )?;

        let mut symmetric_root = sodoken::SizedLockedArray::new()?;
        sodoken::blake2b::blake2b_hash(
            &mut *symmetric_root.lock(),
            seed,
            Some(SYMMETRIC_ROOT_KEY),
        )?;

        Ok(Self {
            asymmetric_root,
            symmetric_root,
            key_pairs: HashMap::new(),
            symmetric_keys: HashMap::new(),
            cleared: false,
        })
    }

    fn check_live(&self) -> IdentityResult<()> {
        if self.cleared {
            return Err("key chain has been cleared".into());
        }
        Ok(())
    }

    /// Get the keypair at a hardened integer path.
    pub fn get_key_pair<P: Into<HardenedPath>>(
        &mut self,
        path: P,
    ) -> IdentityResult<KeyPair> {
        self.check_live()?;
        let path = path.into();

        if let Some(key_pair) = self.key_pairs.get(&path) {
            return Ok(key_pair.clone());
        }

        let mut node = sodoken::SizedLockedArray::<32>::new()?;
        node.lock().copy_from_slice(&*self.asymmetric_root.lock());

        for segment in path.segments() {
            let mut child = sodoken::SizedLockedArray::<32>::new()?;
            sodoken::kdf::derive_from_key(
                &mut *child.lock(),
                HARDENED_OFFSET + *segment as u64,
                KDF_CONTEXT,
                &node.lock(),
            )?;
            node = child;
        }

        let key_pair = KeyPair::from_seed(&mut node)?;
        tracing::trace!(
            %path,
            public_key = %key_pair.public_key,
            "derived key pair"
        );

        self.key_pairs.insert(path, key_pair.clone());
        Ok(key_pair)
    }

    /// Get the symmetric key at a label path.
    pub fn get_symmetric_key(
        &mut self,
        path: &LabelPath,
    ) -> IdentityResult<SymmetricKey> {
        self.check_live()?;

        if let Some(key) = self.symmetric_keys.get(path) {
            return Ok(key.clone());
        }

        let mut node = sodoken::SizedLockedArray::<32>::new()?;
        node.lock().copy_from_slice(&*self.symmetric_root.lock());

        // each label keys a hash of the next, so the full ordered
        // sequence determines the result
        for label in path.labels() {
            let mut child = sodoken::SizedLockedArray::<32>::new()?;
            sodoken::blake2b::blake2b_hash(
                &mut *child.lock(),
                &label[..],
                Some(&node.lock()[..]),
            )?;
            node = child;
        }

        let key = SymmetricKey(Arc::new(parking_lot::Mutex::new(node)));
        tracing::trace!(%path, "derived symmetric key");

        self.symmetric_keys.insert(path.clone(), key.clone());
        Ok(key)
    }

    /// Zero all secret material held or handed out by this key chain.
    /// Any further derivation is an error.
    pub fn clear(&mut self) {
        for (_, key_pair) in self.key_pairs.drain() {
            key_pair.zero();
        }
        for (_, key) in self.symmetric_keys.drain() {
            key.zero();
        }
        self.asymmetric_root.lock().zeroize();
        self.symmetric_root.lock().zeroize();
        if !self.cleared {
            tracing::debug!("key chain cleared");
        }
        self.cleared = true;
    }
}

impl Drop for KeyChain {
    fn drop(&mut self) {
        self.clear();
    }
}
