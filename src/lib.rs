//! bcrypt password hashing on top of a from-scratch Blowfish.
//!
//! bcrypt is a password hashing function designed by Niels Provos and David
//! Mazières, based on the Blowfish cipher, and presented in 1999 at the Usenix
//! Security Symposium. Its key setup is repeated `2^cost` times, so hashing and
//! verifying both get slower as the cost grows.
//!
//! ```
//! let hashed = bcrypt_rust::hash("hunter2", 4).unwrap();
//! assert!(bcrypt_rust::verify("hunter2", &hashed).unwrap());
//! assert!(!bcrypt_rust::verify("hunter3", &hashed).unwrap());
//! ```
//!
//! Hashes use the `$2a$` format and interoperate with other bcrypt
//! implementations. Every call owns its cipher state, so the functions can be
//! called from any number of threads at once. A single call can take hundreds
//! of milliseconds at production costs; keep it off latency-sensitive threads.

mod bcrypt;
mod blowfish;
mod constants;
mod digest;
mod eks;
mod error;
mod password;
pub mod radix64;
mod settings;

pub use crate::bcrypt::{
    generate_salt, hash, hash_with_salt, verify, BCrypt, HashParts, Version, ENCODED_LEN,
};
pub use crate::blowfish::Blowfish;
pub use crate::digest::{bcrypt, digest, DIGEST_LEN, KEY_LEN_MAX};
pub use crate::eks::{setup as eks_setup, Cost, DEFAULT_COST, MAX_COST, MIN_COST, SALT_LEN};
pub use crate::error::{BCryptError, BCryptResult};
pub use crate::password::normalize_password;
pub use crate::settings::BcryptSettings;
