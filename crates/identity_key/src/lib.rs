#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(warnings)]
//! Hierarchical deterministic identity keys and device attestation chains.
//!
//! A single seed (or mnemonic) yields a stable identity signing keypair,
//! a discovery keypair, and symmetric keys scoped to arbitrary contexts.
//! The identity authorizes devices through a compact, signed attestation
//! chain that anyone can verify offline from the proof bytes alone.
//!
//! # Example
//!
//! ```
//! use identity_key::*;
//!
//! let words = generate_mnemonic().unwrap();
//! let identity = IdentityKey::from_mnemonic(&words).unwrap();
//!
//! let device = KeyPair::new_random().unwrap();
//! let proof = identity.bootstrap(device.public_key()).unwrap();
//!
//! let payload = b"hello";
//! let proof = attest_data(Some(payload), &device, Some(&proof)).unwrap();
//!
//! let opts = VerifyOptions::default()
//!     .with_expected_identity(identity.identity_public_key().clone());
//! let res = verify(&proof, Some(payload), &opts).unwrap().unwrap();
//! assert_eq!(device.public_key(), &res.device_public_key);
//! ```

/// Re-exported dependencies.
pub mod dependencies {
    pub use hex;
    pub use mnemonic;
    pub use serde;
    pub use serde_yaml;
    pub use sodoken;
    pub use tracing;
}

mod error;
pub use error::*;

mod types;
pub use types::*;

mod encoding_types;
pub use encoding_types::*;

pub mod codec;

mod path;
pub use path::*;

mod seed;
pub use seed::*;

mod key_chain;
pub use key_chain::*;

mod encoding;
pub use encoding::*;

mod protocol;
pub use protocol::*;

mod config;
pub use config::*;

mod identity;
pub use identity::*;

/// Common imports.
pub mod prelude {
    pub use crate::{
        attest_data, attest_device, bootstrap, generate_mnemonic, verify,
        AttestationProof, DecodedProof, Ed25519PubKey, IdentityConfig,
        IdentityError, IdentityKey, IdentityResult, KeyChain, KeyPair,
        Receipt, SeedSource, VerifiedAttestation, VerifyOptions,
    };
}
