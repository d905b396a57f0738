use crate::dependencies::sodoken;
use crate::BinDataSized;
use parking_lot::Mutex;
use std::sync::Arc;

/// SharedSizedLockedArray type alias for a [sodoken::SizedLockedArray]
/// wrapped in an [Arc] and [Mutex].
pub type SharedSizedLockedArray<const N: usize> =
    Arc<Mutex<sodoken::SizedLockedArray<N>>>;

/// Byte length of an ed25519 public key.
pub const PUBLIC_KEY_BYTES: usize = 32;

/// Byte length of an ed25519 secret key.
pub const SECRET_KEY_BYTES: usize = 64;

/// Byte length of an ed25519 detached signature.
pub const SIGNATURE_BYTES: usize = 64;

/// Byte length of the digest binding attested data.
pub const HASH_BYTES: usize = 32;

/// Ed25519 signature public key.
pub type Ed25519PubKey = BinDataSized<PUBLIC_KEY_BYTES>;

/// Ed25519 detached signature.
pub type Ed25519Signature = BinDataSized<SIGNATURE_BYTES>;

/// 32 byte blake2b digest of attested data.
pub type DataHash = BinDataSized<HASH_BYTES>;

/// Hash arbitrary data into the digest used by data attestations.
pub fn hash_data(data: &[u8]) -> crate::IdentityResult<DataHash> {
    let mut digest = [0; HASH_BYTES];
    sodoken::blake2b::blake2b_hash(&mut digest, data, None)?;
    Ok(digest.into())
}

/// Allocate a new shared locked array.
pub(crate) fn new_shared_locked<const N: usize>(
) -> crate::IdentityResult<SharedSizedLockedArray<N>> {
    Ok(Arc::new(Mutex::new(sodoken::SizedLockedArray::new()?)))
}
