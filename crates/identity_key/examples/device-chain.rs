//! Walk through the full life of an identity: mnemonic, bootstrap,
//! device delegation, data attestation and verification.
//!
//! Run with `RUST_LOG=identity_key=trace` to see each step logged.

use identity_key::prelude::*;

fn main() -> IdentityResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let words = generate_mnemonic()?;
    println!("mnemonic: {words}");

    let mut identity = IdentityKey::from_mnemonic(&words)?;
    println!("identity: {}", identity.identity_public_key());

    let laptop = KeyPair::new_random()?;
    let phone = KeyPair::new_random()?;

    // the identity authorizes the laptop, the laptop the phone
    let proof = identity.bootstrap(laptop.public_key())?;
    let proof = attest_device(phone.public_key(), &laptop, Some(&proof))?;

    // the phone signs a profile update
    let update = b"display name: alice";
    let proof = attest_data(Some(update), &phone, Some(&proof))?;
    println!("proof: {} bytes", proof.len());

    let opts = VerifyOptions::default()
        .with_expected_identity(identity.identity_public_key().clone());
    match verify(&proof, Some(update), &opts)? {
        Some(res) => {
            println!("verified, signed by device {}", res.device_public_key);
            println!("receipt: {}", res.receipt);

            // a later verifier pins the receipt to refuse older proofs
            let pinned = opts.with_receipt(res.receipt);
            println!("pinned options:\n{}", serde_yaml_string(&pinned)?);
        }
        None => println!("rejected"),
    }

    let discovery = identity.profile_discovery_public_key()?;
    let _encryption_key = identity.encryption_key(&discovery[..])?;
    println!("profile discovery key: {discovery}");

    identity.clear();
    Ok(())
}

fn serde_yaml_string(opts: &VerifyOptions) -> IdentityResult<String> {
    identity_key::dependencies::serde_yaml::to_string(opts)
        .map_err(IdentityError::other)
}
