//! Error type shared by every layer of the hasher.

pub type Result<T> = std::result::Result<T, BCryptError>;

/// Errors raised while hashing or verifying.
///
/// None of these are transient: they point at a caller mistake or at a
/// corrupted stored hash.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BCryptError {
    /// The work factor is outside `4..=31`.
    #[error("Invalid cost: {0} (must be between 4 and 31)")]
    InvalidCost(u32),

    /// The salt buffer was not exactly 16 bytes.
    #[error("Invalid salt length: expected 16 bytes, got {0}")]
    InvalidSaltLength(usize),

    /// A settings or hash string did not have the expected structure.
    #[error("Malformed hash: {0}")]
    MalformedHash(&'static str),

    /// The version tag is not one this crate can compute.
    #[error("Unsupported bcrypt version: ${0}$")]
    UnsupportedVersion(String),

    /// A radix-64 string contained a character outside the bcrypt alphabet,
    /// or a final character carrying non-zero padding bits.
    #[error("Invalid radix-64 character {character:?} at position {position}")]
    InvalidCharacter { character: char, position: usize },

    /// A radix-64 string whose length cannot come from any byte sequence.
    #[error("Invalid radix-64 length: {0}")]
    InvalidLength(usize),
}
