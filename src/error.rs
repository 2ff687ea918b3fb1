use thiserror::Error;

/// Everything that can go wrong while hashing or verifying a password.
#[derive(Debug, Error)]
pub enum BCryptError {
    /// The work factor lies outside `4..=31`.
    #[error("Invalid cost: {0} is outside the supported range 4..=31")]
    InvalidCost(u32),

    /// A caller-supplied salt was not exactly 16 bytes long.
    #[error("Invalid salt length: expected 16 bytes, got {0}")]
    InvalidSaltLength(usize),

    /// An encoded hash string could not be parsed.
    #[error("Malformed encoding: {0}")]
    MalformedEncoding(String),

    /// The operating system random generator failed to produce a salt.
    #[error("Random source failure: {0}")]
    RandomSourceFailure(#[from] rand::Error),
}

pub type BCryptResult<T> = Result<T, BCryptError>;
