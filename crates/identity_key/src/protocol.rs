//! Building and verifying attestation chains.
//!
//! An identity keypair signs the first device into a chain with
//! [bootstrap]. From then on each device can authorize further devices
//! with [attest_device], or vouch for external data with [attest_data],
//! using only its own keypair and the current proof bytes. A third party
//! calls [verify] with the proof bytes alone.

use crate::*;

/// Anything a proof can be read from.
pub trait ProofSource {
    /// Decode (if needed) into a [DecodedProof].
    fn into_decoded(self) -> IdentityResult<DecodedProof>;
}

macro_rules! bytes_proof_source {
    ($($t:ty),* $(,)?) => {$(
        impl ProofSource for $t {
            fn into_decoded(self) -> IdentityResult<DecodedProof> {
                DecodedProof::decode(&self[..])
            }
        }
    )*};
}

bytes_proof_source!(
    &[u8],
    &Vec<u8>,
    Vec<u8>,
    &Box<[u8]>,
    Box<[u8]>,
    &BinData,
    BinData,
);

impl ProofSource for DecodedProof {
    fn into_decoded(self) -> IdentityResult<DecodedProof> {
        Ok(self)
    }
}

impl ProofSource for AttestationProof {
    fn into_decoded(self) -> IdentityResult<DecodedProof> {
        Ok(self.into())
    }
}

impl ProofSource for &AttestationProof {
    fn into_decoded(self) -> IdentityResult<DecodedProof> {
        Ok(self.clone().into())
    }
}

/// The identity that signs the first link of a new chain.
#[derive(Debug, Clone, Copy)]
pub enum BootstrapIdentity<'lt> {
    /// An already derived identity keypair.
    KeyPair(&'lt KeyPair),

    /// Derive the identity keypair at `identity_path(0)`.
    Source(SeedSource<'lt>),
}

impl<'lt> From<&'lt KeyPair> for BootstrapIdentity<'lt> {
    fn from(key_pair: &'lt KeyPair) -> Self {
        Self::KeyPair(key_pair)
    }
}

impl<'lt> From<SeedSource<'lt>> for BootstrapIdentity<'lt> {
    fn from(source: SeedSource<'lt>) -> Self {
        Self::Source(source)
    }
}

/// Optional pins applied during verification.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOptions {
    /// Encoded [Receipt]. Proofs older than the receipt are rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<BinData>,

    /// Reject unless the chain is rooted at this identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_identity: Option<Ed25519PubKey>,

    /// Reject unless this is the attested device (or, for data signed
    /// directly by the identity, the identity itself).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_device: Option<Ed25519PubKey>,
}

impl VerifyOptions {
    /// Pin a receipt, builder style.
    pub fn with_receipt<R: Into<BinData>>(mut self, receipt: R) -> Self {
        self.receipt = Some(receipt.into());
        self
    }

    /// Pin the expected identity, builder style.
    pub fn with_expected_identity(mut self, identity: Ed25519PubKey) -> Self {
        self.expected_identity = Some(identity);
        self
    }

    /// Pin the expected device, builder style.
    pub fn with_expected_device(mut self, device: Ed25519PubKey) -> Self {
        self.expected_device = Some(device);
        self
    }
}

/// A successfully verified chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedAttestation {
    /// Encoded [Receipt] for this proof, to be presented on later
    /// verifications.
    pub receipt: BinData,

    /// The root identity.
    pub identity_public_key: Ed25519PubKey,

    /// The attested device, or the identity when it signed data directly.
    pub device_public_key: Ed25519PubKey,

    /// Issue time of the chain.
    pub epoch: Epoch,
}

impl AttestationProof {
    fn check_extensible(&self) -> IdentityResult<()> {
        if self.version() == LEGACY_VERSION {
            return Err(IdentityError::IllegalExtension);
        }
        Ok(())
    }

    /// Append a device link signed by `signer`.
    ///
    /// `signer` should be the current tip of the chain. That is not
    /// checked here; a wrong signer produces a proof that fails [verify].
    /// Errors with [IdentityError::IllegalExtension] for a version 0 proof.
    pub fn attest_device(
        self,
        device_public_key: &Ed25519PubKey,
        signer: &KeyPair,
    ) -> IdentityResult<Self> {
        self.check_extensible()?;
        let signable = self.device_signable(device_public_key)?;
        let signature = signer.sign(&signable)?;
        tracing::trace!(
            device = %device_public_key,
            signer = %signer.public_key(),
            depth = self.chain().len(),
            "attest device"
        );
        Ok(self.with_link(AttestationLink::Device {
            public_key: device_public_key.clone(),
            signature,
        }))
    }

    /// Append a terminal data link over `payload` signed by `signer`.
    ///
    /// Errors with [IdentityError::IllegalExtension] for a version 0 proof.
    pub fn attest_data(
        self,
        payload: &[u8],
        signer: &KeyPair,
    ) -> IdentityResult<Self> {
        self.check_extensible()?;
        let signable = self.data_signable(&hash_data(payload)?)?;
        let signature = signer.sign(&signable)?;
        tracing::trace!(
            signer = %signer.public_key(),
            depth = self.chain().len(),
            "attest data"
        );
        Ok(self.with_link(AttestationLink::Data { signature }))
    }

    /// Verify this proof. See [verify].
    pub fn verify(
        &self,
        attested_data: Option<&[u8]>,
        options: &VerifyOptions,
    ) -> IdentityResult<Option<VerifiedAttestation>> {
        verify_proof(self, attested_data, options)
    }
}

fn resolve_existing(
    existing: Option<&[u8]>,
    signer: &KeyPair,
) -> IdentityResult<AttestationProof> {
    match existing {
        Some(data) => DecodedProof::decode(data)?.into_proof(),
        // no chain yet, the signer becomes the identity
        None => Ok(AttestationProof::new(
            signer.public_key().clone(),
            Epoch::now(),
        )),
    }
}

/// Start a new chain rooted at `identity`, authorizing one device.
pub fn bootstrap<'lt, I: Into<BootstrapIdentity<'lt>>>(
    identity: I,
    device_public_key: &Ed25519PubKey,
) -> IdentityResult<Box<[u8]>> {
    match identity.into() {
        BootstrapIdentity::KeyPair(key_pair) => {
            attest_device(device_public_key, key_pair, None)
        }
        BootstrapIdentity::Source(source) => {
            let mut key_chain = KeyChain::derive(source)?;
            let key_pair = key_chain.get_key_pair(identity_path(0))?;
            let proof = attest_device(device_public_key, &key_pair, None)?;
            Ok(proof)
        }
    }
}

/// Extend `existing` (or start a new chain with `signer` as the identity)
/// with a device link.
///
/// Errors with [IdentityError::IllegalExtension] for a version 0 proof.
pub fn attest_device(
    device_public_key: &Ed25519PubKey,
    signer: &KeyPair,
    existing: Option<&[u8]>,
) -> IdentityResult<Box<[u8]>> {
    resolve_existing(existing, signer)?
        .attest_device(device_public_key, signer)?
        .encode()
}

/// Extend `existing` (or start a new chain with `signer` as the identity)
/// with a terminal data link over `payload`.
///
/// Errors with [IdentityError::NotAttestable] if there is no payload, and
/// with [IdentityError::IllegalExtension] for a version 0 proof.
pub fn attest_data(
    payload: Option<&[u8]>,
    signer: &KeyPair,
    existing: Option<&[u8]>,
) -> IdentityResult<Box<[u8]>> {
    let payload = payload.ok_or(IdentityError::NotAttestable)?;
    resolve_existing(existing, signer)?
        .attest_data(payload, signer)?
        .encode()
}

/// Verify a proof.
///
/// `attested_data` must be given exactly when the chain ends in a data
/// link. Every rejection (unknown version, stale epoch, pin mismatch,
/// structural mismatch, bad signature) is the same `Ok(None)`. Only
/// undecodable input is an error.
pub fn verify<P: ProofSource>(
    proof: P,
    attested_data: Option<&[u8]>,
    options: &VerifyOptions,
) -> IdentityResult<Option<VerifiedAttestation>> {
    match proof.into_decoded()? {
        DecodedProof::Legacy => {
            tracing::debug!("reject: legacy version 0 proof");
            Ok(None)
        }
        DecodedProof::Proof(proof) => {
            verify_proof(&proof, attested_data, options)
        }
    }
}

macro_rules! reject {
    ($($arg:tt)*) => {{
        tracing::debug!($($arg)*);
        return Ok(None);
    }};
}

fn verify_proof(
    proof: &AttestationProof,
    attested_data: Option<&[u8]>,
    options: &VerifyOptions,
) -> IdentityResult<Option<VerifiedAttestation>> {
    let version = proof.version();
    if version == LEGACY_VERSION || version > CURRENT_VERSION {
        reject!(version, "reject: unsupported version");
    }

    if let Some(receipt) = &options.receipt {
        let receipt = Receipt::decode(receipt)?;
        if proof.epoch() < receipt.epoch {
            reject!("reject: proof predates receipt");
        }
    }

    if let Some(expected) = &options.expected_identity {
        if expected != proof.identity() {
            reject!("reject: identity mismatch");
        }
    }

    let (last, rest) = match proof.chain().split_last() {
        Some(split) => split,
        None => reject!("reject: empty chain"),
    };

    if rest.iter().any(|l| matches!(l, AttestationLink::Data { .. })) {
        reject!("reject: non-terminal data link");
    }

    let subject = match (last, attested_data) {
        (AttestationLink::Device { public_key, .. }, None) => public_key,
        (AttestationLink::Data { .. }, Some(_)) => rest
            .last()
            .and_then(AttestationLink::device_public_key)
            .unwrap_or(proof.identity()),
        (AttestationLink::Device { .. }, Some(_)) => {
            reject!("reject: data expected, chain ends in a device")
        }
        (AttestationLink::Data { .. }, None) => {
            reject!("reject: device expected, chain ends in data")
        }
    };

    if let Some(expected) = &options.expected_device {
        if expected != subject {
            reject!("reject: device mismatch");
        }
    }

    let data_hash = attested_data.map(hash_data).transpose()?;

    let mut parent = proof.identity();
    for (index, link) in proof.chain().iter().enumerate() {
        let (signable, signature) = match link {
            AttestationLink::Device {
                public_key,
                signature,
            } => (proof.device_signable(public_key)?, signature),
            AttestationLink::Data { signature } => match &data_hash {
                Some(data_hash) => (proof.data_signable(data_hash)?, signature),
                None => reject!("reject: no data to check"),
            },
        };

        if !parent.verify_detached(signature, &signable) {
            reject!(index, "reject: bad signature");
        }

        if let AttestationLink::Device { public_key, .. } = link {
            parent = public_key;
        }
    }

    Ok(Some(VerifiedAttestation {
        receipt: Receipt::from_proof(proof).encode()?.into(),
        identity_public_key: proof.identity().clone(),
        device_public_key: subject.clone(),
        epoch: proof.epoch(),
    }))
}
