//! bcrypt password hashing.
//!
//! bcrypt is a password hashing function designed by Niels Provos and David
//! Mazières, based on the Blowfish cipher. Its key setup ("EksBlowfish")
//! runs `2^cost` rounds, so the work factor can grow as hardware gets faster.
//!
//! ```
//! let stored = eksblowfish::hash_password("WyWihatdyd?frub1", 4)?;
//! assert!(eksblowfish::verify("WyWihatdyd?frub1", &stored)?);
//! assert!(!eksblowfish::verify("wrong", &stored)?);
//! # Ok::<(), eksblowfish::BCryptError>(())
//! ```
//!
//! Every hash owns its cipher state, so concurrent calls need no locking.
//! A hash at a realistic cost takes hundreds of milliseconds of CPU; run it
//! off latency-sensitive paths.

mod bcrypt;
mod blowfish;
mod blowfish_consts;
mod eks;
mod error;
pub mod radix64;
mod settings;

pub use crate::bcrypt::{
    gen_salt, gen_salt_with, generate_salt, hash, hash_password, hash_password_with,
    hash_with_salt, verify, BCrypt, KEY_LEN_MAX,
};
pub use crate::eks::{Cost, DEFAULT_COST, DIGEST_LEN, MAX_COST, MIN_COST, SALT_LEN};
pub use crate::error::{BCryptError, Result};
pub use crate::settings::{format_hash, parse_settings, HashParts, Settings, Version, HASH_LEN};
