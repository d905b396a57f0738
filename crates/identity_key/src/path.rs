//! Canonical derivation paths.
//!
//! ```text
//! seed
//! ├── asymmetric (hardened integer paths)
//! │   └── 48' / 5338' / 0' / account'
//! │       ├── 0' ─── identity signing key
//! │       └── 1' ─── discovery key
//! └── symmetric (label paths)
//!     └── "identity-key" / "profile" / <hex context key> / "encryption"
//! ```

/// Purpose segment shared by all identity key paths.
pub const PURPOSE: u32 = 48;

/// Coin type segment shared by all identity key paths.
pub const COIN_TYPE: u32 = 5338;

/// Role segment for identity keys.
pub const IDENTITY_ROLE: u32 = 0;

/// Trailing index of the identity signing key.
pub const IDENTITY_KEY_INDEX: u32 = 0;

/// Trailing index of the discovery key.
pub const DISCOVERY_KEY_INDEX: u32 = 1;

/// Namespace prefix for all symmetric key label paths.
pub const SYMMETRIC_NAMESPACE: [&[u8]; 2] = [b"identity-key", b"profile"];

/// Trailing label of profile encryption key paths.
pub const ENCRYPTION_LABEL: &[u8] = b"encryption";

/// A hierarchical derivation path where every segment is hardened.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HardenedPath(Box<[u32]>);

impl HardenedPath {
    /// The path segments.
    pub fn segments(&self) -> &[u32] {
        &self.0
    }
}

impl From<Vec<u32>> for HardenedPath {
    fn from(p: Vec<u32>) -> Self {
        Self(p.into_boxed_slice())
    }
}

impl From<&[u32]> for HardenedPath {
    fn from(p: &[u32]) -> Self {
        Self(p.into())
    }
}

impl<const N: usize> From<[u32; N]> for HardenedPath {
    fn from(p: [u32; N]) -> Self {
        Self(p.into())
    }
}

impl std::fmt::Display for HardenedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("m")?;
        for s in self.0.iter() {
            write!(f, "/{s}'")?;
        }
        Ok(())
    }
}

/// An ordered sequence of byte string labels for symmetric derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LabelPath(Vec<Box<[u8]>>);

impl LabelPath {
    /// An empty label path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a label, builder style.
    pub fn push<L: AsRef<[u8]>>(mut self, label: L) -> Self {
        self.0.push(label.as_ref().into());
        self
    }

    /// The path labels.
    pub fn labels(&self) -> &[Box<[u8]>] {
        &self.0
    }
}

impl std::fmt::Display for LabelPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for l in self.0.iter() {
            if !first {
                f.write_str("/")?;
            }
            first = false;
            f.write_str(&String::from_utf8_lossy(l))?;
        }
        Ok(())
    }
}

/// Path of the identity signing key for an account.
pub fn identity_path(account_index: u32) -> HardenedPath {
    [
        PURPOSE,
        COIN_TYPE,
        IDENTITY_ROLE,
        account_index,
        IDENTITY_KEY_INDEX,
    ]
    .into()
}

/// Path of the discovery key for an account.
pub fn discovery_path(account_index: u32) -> HardenedPath {
    [
        PURPOSE,
        COIN_TYPE,
        IDENTITY_ROLE,
        account_index,
        DISCOVERY_KEY_INDEX,
    ]
    .into()
}

/// Label path of the symmetric encryption key scoped to `context_key`
/// (generally a profile discovery public key).
pub fn encryption_key_path(context_key: &[u8]) -> LabelPath {
    let [ns, scope] = SYMMETRIC_NAMESPACE;
    LabelPath::new()
        .push(ns)
        .push(scope)
        .push(hex::encode(context_key))
        .push(ENCRYPTION_LABEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_integer_paths() {
        assert_eq!(&[48, 5338, 0, 7, 0], identity_path(7).segments());
        assert_eq!(&[48, 5338, 0, 7, 1], discovery_path(7).segments());
        assert_eq!("m/48'/5338'/0'/0'/0'", identity_path(0).to_string());
    }

    #[test]
    fn encryption_path_hex_encodes_context() {
        let p = encryption_key_path(&[0xab, 0x01]);
        assert_eq!("identity-key/profile/ab01/encryption", p.to_string());
        assert_eq!(4, p.labels().len());
        assert_ne!(p, encryption_key_path(&[0xab, 0x02]));
    }
}
