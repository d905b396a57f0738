//! Mnemonic and seed handling.

use crate::*;

/// Byte length of a root seed.
pub const SEED_BYTES: usize = 64;

/// Byte length of the entropy encoded by a mnemonic.
pub const ENTROPY_BYTES: usize = 32;

// blake2b key, must be at least 16 bytes
const SEED_STRETCH_KEY: &[u8] = b"identity-key mnemonic seed";

/// Where a key chain gets its root secret from.
#[derive(Clone, Copy)]
pub enum SeedSource<'lt> {
    /// A raw seed, must be exactly [SEED_BYTES] long.
    Seed(&'lt [u8]),

    /// A mnemonic phrase, as produced by [generate_mnemonic].
    Mnemonic(&'lt str),
}

impl std::fmt::Debug for SeedSource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Seed(_) => f.write_str("SeedSource::Seed"),
            Self::Mnemonic(_) => f.write_str("SeedSource::Mnemonic"),
        }
    }
}

/// Generate a new random mnemonic phrase.
pub fn generate_mnemonic() -> IdentityResult<String> {
    let mut entropy = sodoken::SizedLockedArray::<ENTROPY_BYTES>::new()?;
    sodoken::random::randombytes_buf(&mut *entropy.lock())?;
    let words = mnemonic::to_string(&*entropy.lock());
    Ok(words)
}

/// Decode a mnemonic phrase and stretch its entropy into a root seed.
pub fn seed_from_mnemonic(
    words: &str,
) -> IdentityResult<SharedSizedLockedArray<SEED_BYTES>> {
    let mut entropy = sodoken::SizedLockedArray::<ENTROPY_BYTES>::new()?;

    // a phrase must carry exactly ENTROPY_BYTES, longer ones fail here
    let len = mnemonic::decode(words.trim(), &mut entropy.lock()[..])
        .map_err(|e| IdentityError::InvalidSeed(format!("{e:?}")))?;

    if len != ENTROPY_BYTES {
        return Err(IdentityError::InvalidSeed(format!(
            "mnemonic encodes {len} bytes, expected {ENTROPY_BYTES}"
        )));
    }

    let seed = new_shared_locked::<SEED_BYTES>()?;
    sodoken::blake2b::blake2b_hash(
        &mut *seed.lock().lock(),
        &*entropy.lock(),
        Some(SEED_STRETCH_KEY),
    )?;

    Ok(seed)
}

/// Copy a raw seed into locked memory, validating its length.
pub fn seed_from_bytes(
    seed: &[u8],
) -> IdentityResult<SharedSizedLockedArray<SEED_BYTES>> {
    if seed.len() != SEED_BYTES {
        return Err(IdentityError::InvalidSeed(format!(
            "expected {} seed bytes, got {}",
            SEED_BYTES,
            seed.len()
        )));
    }

    let out = new_shared_locked::<SEED_BYTES>()?;
    out.lock().lock().copy_from_slice(seed);
    Ok(out)
}

impl SeedSource<'_> {
    /// Resolve this source into a locked root seed.
    pub fn to_seed(
        self,
    ) -> IdentityResult<SharedSizedLockedArray<SEED_BYTES>> {
        match self {
            Self::Seed(seed) => seed_from_bytes(seed),
            Self::Mnemonic(words) => seed_from_mnemonic(words),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnemonic_is_deterministic() {
        let words = generate_mnemonic().unwrap();
        assert!(!words.is_empty());

        let a = seed_from_mnemonic(&words).unwrap();
        let b = seed_from_mnemonic(&words).unwrap();
        assert_eq!(&*a.lock().lock(), &*b.lock().lock());
    }

    #[test]
    fn bad_mnemonic_is_invalid_seed() {
        let res = seed_from_mnemonic("definitely not mnemonic words");
        assert!(matches!(res, Err(IdentityError::InvalidSeed(_))));

        // valid words, but far too little entropy
        let short = mnemonic::to_string([1, 2, 3, 4]);
        let res = seed_from_mnemonic(&short);
        assert!(matches!(res, Err(IdentityError::InvalidSeed(_))));
    }

    #[test]
    fn wrong_seed_length_is_invalid_seed() {
        let res = seed_from_bytes(&[0; 32]);
        assert!(matches!(res, Err(IdentityError::InvalidSeed(_))));
        assert!(seed_from_bytes(&[0; SEED_BYTES]).is_ok());
    }
}
