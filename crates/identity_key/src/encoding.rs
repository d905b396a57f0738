//! Attestation proof types and their exact binary encodings.
//!
//! ```text
//! device signable: version:uint | 0:u8 | epoch:u64 | identity:32 | device:32
//! data signable:   version:uint | 1:u8 | epoch:u64 | identity:32 | hash:32
//! link:            tag:u8 | [public_key:32 if tag == 0] | signature:64
//! proof:           version:uint | epoch:u64 | identity:32 | chain:array<link>
//! receipt:         epoch:u64
//! ```
//!
//! Epochs are carried as whole seconds. Proofs floor their epoch on
//! construction so a decoded proof equals the one that was encoded.

use crate::codec::{CodecReader, CodecWriter};
use crate::*;

/// The newest proof version this library understands and emits.
pub const CURRENT_VERSION: u64 = 1;

/// Reserved legacy version. Decodes to [DecodedProof::Legacy].
pub const LEGACY_VERSION: u64 = 0;

const ATTESTED_DEVICE: u8 = 0;
const ATTESTED_DATA: u8 = 1;

const DATA_LINK_BYTES: usize = 1 + SIGNATURE_BYTES;

/// A millisecond unix timestamp. Only whole seconds survive encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(u64);

impl Epoch {
    /// The current wall-clock time.
    pub fn now() -> Self {
        let ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self(ms)
    }

    /// Construct from unix milliseconds.
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Construct from unix seconds.
    pub fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    /// Unix milliseconds.
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Whole unix seconds, as written to the wire.
    pub fn as_secs(&self) -> u64 {
        self.0 / 1000
    }

    fn encode(&self, writer: &mut CodecWriter) -> IdentityResult<()> {
        writer.write_u64(self.as_secs())
    }

    fn decode(reader: &mut CodecReader<'_>) -> IdentityResult<Self> {
        Ok(Self::from_secs(reader.read_u64()?))
    }
}

/// One link in an attestation chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttestationLink {
    /// Authorizes `public_key` to act on behalf of the previous signer.
    Device {
        /// The newly authorized device key.
        public_key: Ed25519PubKey,

        /// Signature by the previous signer over the device signable.
        signature: Ed25519Signature,
    },

    /// Terminal link attesting to external data on behalf of the
    /// previous signer.
    Data {
        /// Signature by the previous signer over the data signable.
        signature: Ed25519Signature,
    },
}

impl AttestationLink {
    /// The signature carried by this link.
    pub fn signature(&self) -> &Ed25519Signature {
        match self {
            Self::Device { signature, .. } | Self::Data { signature } => {
                signature
            }
        }
    }

    /// The device key authorized by this link, if it is a device link.
    pub fn device_public_key(&self) -> Option<&Ed25519PubKey> {
        match self {
            Self::Device { public_key, .. } => Some(public_key),
            Self::Data { .. } => None,
        }
    }

    fn encode(&self, writer: &mut CodecWriter) -> IdentityResult<()> {
        match self {
            Self::Device {
                public_key,
                signature,
            } => {
                writer.write_u8(ATTESTED_DEVICE)?;
                writer.write_fixed(&public_key[..])?;
                writer.write_fixed(&signature[..])
            }
            Self::Data { signature } => {
                writer.write_u8(ATTESTED_DATA)?;
                writer.write_fixed(&signature[..])
            }
        }
    }

    fn decode(reader: &mut CodecReader<'_>) -> IdentityResult<Self> {
        match reader.read_u8()? {
            ATTESTED_DEVICE => {
                let public_key = reader.read_fixed::<PUBLIC_KEY_BYTES>()?;
                let signature = reader.read_fixed::<SIGNATURE_BYTES>()?;
                Ok(Self::Device {
                    public_key: public_key.into(),
                    signature: signature.into(),
                })
            }
            ATTESTED_DATA => Ok(Self::Data {
                signature: reader.read_fixed::<SIGNATURE_BYTES>()?.into(),
            }),
            tag => Err(IdentityError::malformed(format!(
                "unknown link tag: {tag}"
            ))),
        }
    }
}

/// Build the exact bytes signed by a device link.
pub fn device_signable(
    version: u64,
    epoch: Epoch,
    identity: &Ed25519PubKey,
    device: &Ed25519PubKey,
) -> IdentityResult<Vec<u8>> {
    let mut writer = CodecWriter::new();
    writer.write_uint(version)?;
    writer.write_u8(ATTESTED_DEVICE)?;
    epoch.encode(&mut writer)?;
    writer.write_fixed(&identity[..])?;
    writer.write_fixed(&device[..])?;
    Ok(writer.into_vec())
}

/// Build the exact bytes signed by a data link.
pub fn data_signable(
    version: u64,
    epoch: Epoch,
    identity: &Ed25519PubKey,
    data_hash: &DataHash,
) -> IdentityResult<Vec<u8>> {
    let mut writer = CodecWriter::new();
    writer.write_uint(version)?;
    writer.write_u8(ATTESTED_DATA)?;
    epoch.encode(&mut writer)?;
    writer.write_fixed(&identity[..])?;
    writer.write_fixed(&data_hash[..])?;
    Ok(writer.into_vec())
}

/// An attestation chain rooted at an identity key.
///
/// This is an immutable value: extending a proof consumes it and
/// returns a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationProof {
    version: u64,
    epoch: Epoch,
    identity: Ed25519PubKey,
    chain: Vec<AttestationLink>,
}

impl AttestationProof {
    /// A fresh, empty chain at [CURRENT_VERSION].
    /// The epoch is floored to whole seconds, as it will be on the wire.
    pub fn new(identity: Ed25519PubKey, epoch: Epoch) -> Self {
        Self {
            version: CURRENT_VERSION,
            epoch: Epoch::from_secs(epoch.as_secs()),
            identity,
            chain: Vec::new(),
        }
    }

    /// The same proof stamped with a different version.
    pub fn with_version(self, version: u64) -> Self {
        Self { version, ..self }
    }

    /// The same proof with `link` appended to the chain.
    pub fn with_link(mut self, link: AttestationLink) -> Self {
        self.chain.push(link);
        self
    }

    /// Protocol version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Issue time of the chain.
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Root identity public key.
    pub fn identity(&self) -> &Ed25519PubKey {
        &self.identity
    }

    /// Ordered chain links.
    pub fn chain(&self) -> &[AttestationLink] {
        &self.chain
    }

    /// True if the chain ends in a data link.
    pub fn is_data_terminal(&self) -> bool {
        matches!(self.chain.last(), Some(AttestationLink::Data { .. }))
    }

    /// The last device key in the chain, or the identity when no device
    /// has been attested.
    pub fn device_public_key(&self) -> &Ed25519PubKey {
        self.chain
            .iter()
            .rev()
            .find_map(AttestationLink::device_public_key)
            .unwrap_or(&self.identity)
    }

    /// The signable message for authorizing `device` within this chain.
    pub fn device_signable(
        &self,
        device: &Ed25519PubKey,
    ) -> IdentityResult<Vec<u8>> {
        device_signable(self.version, self.epoch, &self.identity, device)
    }

    /// The signable message for attesting `data_hash` within this chain.
    pub fn data_signable(
        &self,
        data_hash: &DataHash,
    ) -> IdentityResult<Vec<u8>> {
        data_signable(self.version, self.epoch, &self.identity, data_hash)
    }

    /// Encode this proof as bytes.
    pub fn encode(&self) -> IdentityResult<Box<[u8]>> {
        let mut writer = CodecWriter::new();
        writer.write_uint(self.version)?;
        self.epoch.encode(&mut writer)?;
        writer.write_fixed(&self.identity[..])?;
        writer.write_array(&self.chain, |w, link| link.encode(w))?;
        Ok(writer.into_vec().into_boxed_slice())
    }
}

/// The result of decoding proof bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedProof {
    /// A version 0 proof. Nothing past the version is parsed.
    /// Verifies as rejected, and cannot be extended.
    Legacy,

    /// A versioned proof.
    Proof(AttestationProof),
}

impl DecodedProof {
    /// Decode proof bytes.
    pub fn decode(data: &[u8]) -> IdentityResult<Self> {
        let mut reader = CodecReader::new(data);
        let version = reader.read_uint()?;
        if version == LEGACY_VERSION {
            return Ok(Self::Legacy);
        }

        let epoch = Epoch::decode(&mut reader)?;
        let identity = reader.read_fixed::<PUBLIC_KEY_BYTES>()?.into();
        let chain =
            reader.read_array(DATA_LINK_BYTES, AttestationLink::decode)?;
        reader.finish()?;

        Ok(Self::Proof(AttestationProof {
            version,
            epoch,
            identity,
            chain,
        }))
    }

    /// Protocol version of the decoded bytes.
    pub fn version(&self) -> u64 {
        match self {
            Self::Legacy => LEGACY_VERSION,
            Self::Proof(proof) => proof.version,
        }
    }

    /// Unwrap into a proof that may be extended.
    pub fn into_proof(self) -> IdentityResult<AttestationProof> {
        match self {
            Self::Legacy => Err(IdentityError::IllegalExtension),
            Self::Proof(proof) => Ok(proof),
        }
    }
}

impl From<AttestationProof> for DecodedProof {
    fn from(proof: AttestationProof) -> Self {
        Self::Proof(proof)
    }
}

/// A freshness token. Verifiers holding a receipt reject any proof
/// issued before the receipt's epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    /// The epoch of the proof that produced this receipt.
    pub epoch: Epoch,
}

impl Receipt {
    /// The receipt for a given proof.
    pub fn from_proof(proof: &AttestationProof) -> Self {
        Self { epoch: proof.epoch }
    }

    /// Encode this receipt as bytes.
    pub fn encode(&self) -> IdentityResult<Box<[u8]>> {
        let mut writer = CodecWriter::new();
        self.epoch.encode(&mut writer)?;
        Ok(writer.into_vec().into_boxed_slice())
    }

    /// Decode receipt bytes.
    pub fn decode(data: &[u8]) -> IdentityResult<Self> {
        let mut reader = CodecReader::new(data);
        let epoch = Epoch::decode(&mut reader)?;
        reader.finish()?;
        Ok(Self { epoch })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DEVICE_LINK_BYTES: usize = 1 + PUBLIC_KEY_BYTES + SIGNATURE_BYTES;

    fn key(b: u8) -> Ed25519PubKey {
        [b; PUBLIC_KEY_BYTES].into()
    }

    fn sig(b: u8) -> Ed25519Signature {
        [b; SIGNATURE_BYTES].into()
    }

    fn sample() -> AttestationProof {
        AttestationProof::new(key(1), Epoch::from_millis(1_700_000_000_999))
            .with_link(AttestationLink::Device {
                public_key: key(2),
                signature: sig(3),
            })
            .with_link(AttestationLink::Data { signature: sig(4) })
    }

    #[test]
    fn proof_layout() {
        let raw = sample().encode().unwrap();
        assert_eq!(
            1 + 8 + 32 + 1 + DEVICE_LINK_BYTES + DATA_LINK_BYTES,
            raw.len()
        );
        assert_eq!(CURRENT_VERSION as u8, raw[0]);
        assert_eq!(&1_700_000_000u64.to_le_bytes(), &raw[1..9]);
        assert_eq!(&[1; 32], &raw[9..41]);
        assert_eq!(2, raw[41]);
        assert_eq!(ATTESTED_DEVICE, raw[42]);
        assert_eq!(ATTESTED_DATA, raw[42 + DEVICE_LINK_BYTES]);
    }

    #[test]
    fn proof_round_trip_truncates_epoch() {
        let proof = sample();
        let raw = proof.encode().unwrap();
        let decoded = DecodedProof::decode(&raw).unwrap().into_proof().unwrap();
        assert_eq!(proof, decoded);
        assert_eq!(1_700_000_000_000, decoded.epoch().as_millis());
        assert_eq!(proof.chain(), decoded.chain());
        assert_eq!(proof.identity(), decoded.identity());
        assert_eq!(key(2), *decoded.device_public_key());
        assert!(decoded.is_data_terminal());
    }

    #[test]
    fn legacy_version_short_circuits() {
        let raw = sample().with_version(LEGACY_VERSION).encode().unwrap();
        let decoded = DecodedProof::decode(&raw).unwrap();
        assert_eq!(DecodedProof::Legacy, decoded);
        assert!(matches!(
            decoded.into_proof(),
            Err(IdentityError::IllegalExtension)
        ));

        // even a lone version byte decodes
        assert_eq!(DecodedProof::Legacy, DecodedProof::decode(&[0]).unwrap());
    }

    #[test]
    fn malformed_proofs_error() {
        let raw = sample().encode().unwrap();

        for len in [0, 1, 20, raw.len() - 1] {
            assert!(matches!(
                DecodedProof::decode(&raw[..len]),
                Err(IdentityError::MalformedProof(_))
            ));
        }

        let mut trailing = raw.to_vec();
        trailing.push(0);
        assert!(DecodedProof::decode(&trailing).is_err());

        let mut bad_tag = raw.to_vec();
        bad_tag[42] = 9;
        assert!(DecodedProof::decode(&bad_tag).is_err());
    }

    #[test]
    fn signable_layouts() {
        let proof = sample();
        let device = proof.device_signable(&key(9)).unwrap();
        assert_eq!(1 + 1 + 8 + 32 + 32, device.len());
        assert_eq!(ATTESTED_DEVICE, device[1]);
        assert_eq!(&[9; 32], &device[42..]);

        let data = proof.data_signable(&[7; HASH_BYTES].into()).unwrap();
        assert_eq!(ATTESTED_DATA, data[1]);
        assert_eq!(&device[2..42], &data[2..42]);
    }

    #[test]
    fn receipt_round_trip() {
        let receipt = Receipt {
            epoch: Epoch::from_millis(5_500),
        };
        let raw = receipt.encode().unwrap();
        assert_eq!(&[5, 0, 0, 0, 0, 0, 0, 0], &raw[..]);
        assert_eq!(
            Epoch::from_millis(5_000),
            Receipt::decode(&raw).unwrap().epoch
        );
        assert!(Receipt::decode(&raw[..7]).is_err());
    }
}
