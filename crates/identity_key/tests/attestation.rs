use identity_key::*;
use std::sync::Once;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env(),
            )
            .with_test_writer()
            .try_init();
    });
}

fn random_pair() -> KeyPair {
    KeyPair::new_random().unwrap()
}

struct Fixture {
    identity: IdentityKey,
    d1: KeyPair,
    d2: KeyPair,
    proof: Box<[u8]>,
}

impl Fixture {
    fn new() -> Self {
        init_tracing();
        let words = generate_mnemonic().unwrap();
        let identity = IdentityKey::from_mnemonic(&words).unwrap();
        let d1 = random_pair();
        let d2 = random_pair();
        let proof = bootstrap(
            SeedSource::Mnemonic(&words),
            d1.public_key(),
        )
        .unwrap();
        let proof =
            attest_device(d2.public_key(), &d1, Some(&proof)).unwrap();
        Self {
            identity,
            d1,
            d2,
            proof,
        }
    }
}

#[test]
fn round_trip_device_chain() {
    let f = Fixture::new();

    let res = verify(&f.proof, None, &VerifyOptions::default())
        .unwrap()
        .unwrap();
    assert_eq!(f.identity.identity_public_key(), &res.identity_public_key);
    assert_eq!(f.d2.public_key(), &res.device_public_key);

    // the typed form verifies identically
    let decoded = DecodedProof::decode(&f.proof).unwrap();
    let res2 = verify(decoded, None, &VerifyOptions::default())
        .unwrap()
        .unwrap();
    assert_eq!(res, res2);
}

#[test]
fn round_trip_data_chain() {
    let f = Fixture::new();
    let payload = b"profile update";
    let proof = attest_data(Some(payload), &f.d2, Some(&f.proof)).unwrap();

    let opts = VerifyOptions::default()
        .with_expected_identity(f.identity.identity_public_key().clone())
        .with_expected_device(f.d2.public_key().clone());
    let res = verify(&proof, Some(payload), &opts).unwrap().unwrap();
    assert_eq!(f.d2.public_key(), &res.device_public_key);
}

#[test]
fn wrong_signer_breaks_chain_of_trust() {
    let f = Fixture::new();
    let d3 = random_pair();

    // d1 is no longer the tip, but may still sign
    let proof = attest_device(d3.public_key(), &f.d1, Some(&f.proof)).unwrap();
    assert!(verify(&proof, None, &VerifyOptions::default())
        .unwrap()
        .is_none());

    let proof = attest_data(Some(b"x"), &f.d1, Some(&f.proof)).unwrap();
    assert!(verify(&proof, Some(b"x"), &VerifyOptions::default())
        .unwrap()
        .is_none());
}

#[test]
fn any_flipped_bit_is_rejected_or_malformed() {
    let f = Fixture::new();
    let proof = attest_data(Some(b"data"), &f.d2, Some(&f.proof)).unwrap();

    // skip the version byte, which flips into unknown versions
    for index in 1..proof.len() {
        let mut tampered = proof.to_vec();
        tampered[index] ^= 0x01;
        match verify(&tampered, Some(b"data"), &VerifyOptions::default()) {
            Ok(res) => assert!(res.is_none(), "byte {index} accepted"),
            Err(IdentityError::MalformedProof(_)) => (),
            Err(e) => panic!("unexpected error at byte {index}: {e}"),
        }
    }
}

#[test]
fn tampered_data_is_rejected() {
    let f = Fixture::new();
    let proof = attest_data(Some(b"data"), &f.d2, Some(&f.proof)).unwrap();
    let opts = VerifyOptions::default();
    assert!(verify(&proof, Some(b"data"), &opts).unwrap().is_some());
    assert!(verify(&proof, Some(b"date"), &opts).unwrap().is_none());
    assert!(verify(&proof, Some(b""), &opts).unwrap().is_none());
}

#[test]
fn terminal_kind_must_match_data_presence() {
    let f = Fixture::new();
    let opts = VerifyOptions::default();
    assert!(verify(&f.proof, Some(b"data"), &opts).unwrap().is_none());

    let proof = attest_data(Some(b"data"), &f.d2, Some(&f.proof)).unwrap();
    assert!(verify(&proof, None, &opts).unwrap().is_none());
}

#[test]
fn receipts_enforce_epoch_monotonicity() {
    init_tracing();
    let root = random_pair();
    let device = random_pair();

    let old = AttestationProof::new(
        root.public_key().clone(),
        Epoch::from_secs(1_000),
    )
    .attest_device(device.public_key(), &root)
    .unwrap();
    let new = AttestationProof::new(
        root.public_key().clone(),
        Epoch::from_secs(2_000),
    )
    .attest_device(device.public_key(), &root)
    .unwrap();

    let receipt = new
        .verify(None, &VerifyOptions::default())
        .unwrap()
        .unwrap()
        .receipt;
    assert_eq!(
        Epoch::from_secs(2_000),
        Receipt::decode(&receipt).unwrap().epoch
    );

    let opts = VerifyOptions::default().with_receipt(receipt);
    assert!(new.verify(None, &opts).unwrap().is_some());
    assert!(old.verify(None, &opts).unwrap().is_none());

    // the receipt of an older proof does not block a newer one
    let old_receipt = Receipt::from_proof(&old).encode().unwrap();
    let opts = VerifyOptions::default().with_receipt(old_receipt);
    assert!(new.verify(None, &opts).unwrap().is_some());
}

#[test]
fn identity_pinning() {
    let f = Fixture::new();
    let opts = VerifyOptions::default()
        .with_expected_identity(f.d1.public_key().clone());
    assert!(verify(&f.proof, None, &opts).unwrap().is_none());

    let opts = VerifyOptions::default()
        .with_expected_identity(f.identity.identity_public_key().clone());
    assert!(verify(&f.proof, None, &opts).unwrap().is_some());
}

#[test]
fn device_pinning() {
    let f = Fixture::new();
    let opts = VerifyOptions::default()
        .with_expected_device(f.d1.public_key().clone());
    assert!(verify(&f.proof, None, &opts).unwrap().is_none());

    let opts = VerifyOptions::default()
        .with_expected_device(f.d2.public_key().clone());
    assert!(verify(&f.proof, None, &opts).unwrap().is_some());
}

#[test]
fn self_attestation_by_identity() {
    init_tracing();
    let mut kc = KeyChain::from_mnemonic(&generate_mnemonic().unwrap())
        .unwrap();
    let root = kc.get_key_pair(identity_path(0)).unwrap();

    let proof = attest_data(Some(b"hello"), &root, None).unwrap();
    let opts = VerifyOptions::default()
        .with_expected_device(root.public_key().clone());
    let res = verify(&proof, Some(b"hello"), &opts).unwrap().unwrap();
    assert_eq!(root.public_key(), &res.identity_public_key);
    assert_eq!(root.public_key(), &res.device_public_key);
}

#[test]
fn legacy_proofs_are_rejected_and_frozen() {
    init_tracing();
    let root = random_pair();
    let device = random_pair();
    let mut legacy = bootstrap(&root, device.public_key()).unwrap().to_vec();
    legacy[0] = LEGACY_VERSION as u8;

    assert!(verify(&legacy, None, &VerifyOptions::default())
        .unwrap()
        .is_none());
    assert!(matches!(
        attest_device(device.public_key(), &device, Some(&legacy)),
        Err(IdentityError::IllegalExtension)
    ));
    assert!(matches!(
        attest_data(Some(b"x"), &device, Some(&legacy)),
        Err(IdentityError::IllegalExtension)
    ));
}

#[test]
fn typed_legacy_proofs_cannot_be_extended() {
    init_tracing();
    let root = random_pair();
    let device = random_pair();
    let legacy = AttestationProof::new(root.public_key().clone(), Epoch::now())
        .with_version(LEGACY_VERSION);

    assert!(matches!(
        legacy.clone().attest_device(device.public_key(), &root),
        Err(IdentityError::IllegalExtension)
    ));
    assert!(matches!(
        legacy.clone().attest_data(b"x", &root),
        Err(IdentityError::IllegalExtension)
    ));
    assert!(legacy
        .verify(None, &VerifyOptions::default())
        .unwrap()
        .is_none());
}

#[test]
fn malformed_bytes_are_errors() {
    init_tracing();
    let opts = VerifyOptions::default();
    assert!(matches!(
        verify(&[1u8, 2, 3][..], None, &opts),
        Err(IdentityError::MalformedProof(_))
    ));

    let root = random_pair();
    assert!(matches!(
        attest_device(root.public_key(), &root, Some(&[7u8; 5][..])),
        Err(IdentityError::MalformedProof(_))
    ));
}

#[test]
fn symmetric_keys_are_deterministic_and_separated() {
    init_tracing();
    let words = generate_mnemonic().unwrap();
    let mut a = IdentityKey::from_mnemonic(&words).unwrap();
    let mut b = IdentityKey::from_mnemonic(&words).unwrap();
    let mut other =
        IdentityKey::from_mnemonic(&generate_mnemonic().unwrap()).unwrap();

    let ctx = a.profile_discovery_public_key().unwrap();
    let ka = a.encryption_key(&ctx[..]).unwrap();
    assert_eq!(ka, b.encryption_key(&ctx[..]).unwrap());
    assert_ne!(ka, other.encryption_key(&ctx[..]).unwrap());
    assert_ne!(ka, a.encryption_key(b"another context").unwrap());
}

#[test]
fn invalid_seeds_are_rejected() {
    init_tracing();
    assert!(matches!(
        IdentityKey::from_seed(&[0; 12]),
        Err(IdentityError::InvalidSeed(_))
    ));
    assert!(matches!(
        IdentityKey::from_mnemonic("not a real phrase"),
        Err(IdentityError::InvalidSeed(_))
    ));
    assert!(matches!(
        bootstrap(SeedSource::Seed(&[1; 3]), random_pair().public_key()),
        Err(IdentityError::InvalidSeed(_))
    ));
}
