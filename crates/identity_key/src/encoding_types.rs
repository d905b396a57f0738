//! Helper types for dealing with serialization of binary data.

use crate::*;
use base64::Engine;
use std::sync::Arc;

fn to_base64_url<B: AsRef<[u8]>>(b: B) -> String {
    base64::prelude::BASE64_URL_SAFE_NO_PAD.encode(b.as_ref())
}

fn from_base64_url<S: AsRef<str>>(s: S) -> IdentityResult<Arc<[u8]>> {
    base64::prelude::BASE64_URL_SAFE_NO_PAD
        .decode(s.as_ref())
        .map_err(IdentityError::other)
        .map(|b| b.into())
}

/// Wrapper newtype for serde encoding / decoding binary data,
/// such as encoded proofs and receipts.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BinData(pub Arc<[u8]>);

impl std::fmt::Debug for BinData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = to_base64_url(&*self.0);
        f.debug_tuple("BinData").field(&s).finish()
    }
}

impl std::fmt::Display for BinData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&to_base64_url(&*self.0))
    }
}

impl std::str::FromStr for BinData {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        from_base64_url(s).map(Self)
    }
}

impl From<Box<[u8]>> for BinData {
    fn from(b: Box<[u8]>) -> Self {
        Self(b.into())
    }
}

impl From<Vec<u8>> for BinData {
    fn from(b: Vec<u8>) -> Self {
        Self(b.into())
    }
}

impl From<&[u8]> for BinData {
    fn from(b: &[u8]) -> Self {
        Self(b.into())
    }
}

impl std::ops::Deref for BinData {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl serde::Serialize for BinData {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&to_base64_url(&*self.0))
    }
}

impl<'de> serde::Deserialize<'de> for BinData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tmp: String = serde::Deserialize::deserialize(deserializer)?;
        from_base64_url(tmp)
            .map_err(serde::de::Error::custom)
            .map(Self)
    }
}

/// Wrapper newtype for serde encoding / decoding sized binary data.
/// Public keys, signatures and digests are all fixed size.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BinDataSized<const N: usize>(pub Arc<[u8; N]>);

impl<const N: usize> std::fmt::Debug for BinDataSized<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = to_base64_url(*self.0);
        write!(f, "BinDataSized<{N}>({s})")
    }
}

impl<const N: usize> std::fmt::Display for BinDataSized<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&to_base64_url(*self.0))
    }
}

fn sized_from_slice<const N: usize>(
    b: &[u8],
) -> IdentityResult<BinDataSized<N>> {
    if b.len() != N {
        return Err(format!(
            "invalid buffer length, expected {} bytes, got {} bytes",
            N,
            b.len()
        )
        .into());
    }
    let mut out = [0; N];
    out.copy_from_slice(b);
    Ok(BinDataSized(Arc::new(out)))
}

impl<const N: usize> std::str::FromStr for BinDataSized<N> {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        sized_from_slice(&from_base64_url(s)?)
    }
}

impl<const N: usize> BinDataSized<N> {
    /// Get a clone of our inner Arc<[u8; N]>
    pub fn cloned_inner(&self) -> Arc<[u8; N]> {
        self.0.clone()
    }

    /// Copy an exactly-sized slice into a new instance.
    pub fn from_slice(b: &[u8]) -> IdentityResult<Self> {
        sized_from_slice(b)
    }
}

impl<const N: usize> From<[u8; N]> for BinDataSized<N> {
    fn from(b: [u8; N]) -> Self {
        Self(Arc::new(b))
    }
}

impl<const N: usize> From<Arc<[u8; N]>> for BinDataSized<N> {
    fn from(b: Arc<[u8; N]>) -> Self {
        Self(b)
    }
}

impl<const N: usize> std::ops::Deref for BinDataSized<N> {
    type Target = [u8; N];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const N: usize> AsRef<[u8]> for BinDataSized<N> {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl<const N: usize> serde::Serialize for BinDataSized<N> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&to_base64_url(*self.0))
    }
}

impl<'de, const N: usize> serde::Deserialize<'de> for BinDataSized<N> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tmp: String = serde::Deserialize::deserialize(deserializer)?;
        let tmp = from_base64_url(tmp).map_err(serde::de::Error::custom)?;
        sized_from_slice(&tmp).map_err(serde::de::Error::custom)
    }
}

impl BinDataSized<32> {
    /// Treat this bin data as an ed25519 public key,
    /// and use it to verify a signature over a given message.
    pub fn verify_detached(
        &self,
        signature: &BinDataSized<64>,
        message: &[u8],
    ) -> bool {
        sodoken::sign::verify_detached(&signature.0, message, &self.0)
    }
}
