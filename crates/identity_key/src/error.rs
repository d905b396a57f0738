/// Identity key error type.
///
/// Note that a rejected proof is NOT an error. `verify` communicates
/// rejection purely by returning `None`.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum IdentityError {
    /// The seed was the wrong length, or the mnemonic could not be decoded.
    #[error("InvalidSeed: {0}")]
    InvalidSeed(String),

    /// `attest_data` was called without a payload.
    #[error("NotAttestable: attested data is required")]
    NotAttestable,

    /// The bytes do not parse as a valid proof or receipt envelope.
    #[error("MalformedProof: {0}")]
    MalformedProof(String),

    /// Attempted to extend a legacy (version 0) proof.
    #[error("IllegalExtension: cannot extend a version 0 proof")]
    IllegalExtension,

    /// Unspecified internal error, generally from a crypto primitive.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl IdentityError {
    /// Build an "Other" type IdentityError.
    pub fn other(
        e: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        IdentityError::Other(e.into())
    }

    /// Build a "MalformedProof" type IdentityError.
    pub(crate) fn malformed(reason: impl std::fmt::Display) -> Self {
        IdentityError::MalformedProof(reason.to_string())
    }
}

// libsodium failures surface as io errors
impl From<std::io::Error> for IdentityError {
    fn from(error: std::io::Error) -> Self {
        Self::other(error)
    }
}

impl From<String> for IdentityError {
    fn from(s: String) -> Self {
        #[derive(Debug, thiserror::Error)]
        #[error("{0}")]
        struct OtherError(String);

        IdentityError::other(OtherError(s))
    }
}

impl From<&str> for IdentityError {
    fn from(s: &str) -> Self {
        s.to_string().into()
    }
}

/// Identity key Result type.
pub type IdentityResult<T> = Result<T, IdentityError>;
