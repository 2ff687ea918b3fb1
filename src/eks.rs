//! The expensive key schedule (EksBlowfish) underlying bcrypt.

use std::fmt;

use crate::blowfish::Blowfish;
use crate::error::{BCryptError, BCryptResult};

pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;
pub const DEFAULT_COST: u32 = 12;

/// The number of bytes in a bcrypt salt.
pub const SALT_LEN: usize = 16;

const ZERO_SALT: [u8; SALT_LEN] = [0; SALT_LEN];

/// A bcrypt work factor: the base-2 logarithm of the key setup rounds.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Cost(u32);

impl Cost {
    /// Accepts a work factor between 4 and 31 (inclusive).
    pub fn new(log_rounds: u32) -> BCryptResult<Self> {
        if (MIN_COST..=MAX_COST).contains(&log_rounds) {
            Ok(Cost(log_rounds))
        } else {
            Err(BCryptError::InvalidCost(log_rounds))
        }
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// The number of key setup rounds, 2\*\*cost.
    pub const fn rounds(self) -> u64 {
        1 << self.0
    }
}

impl Default for Cost {
    fn default() -> Self {
        Cost(DEFAULT_COST)
    }
}

impl TryFrom<u32> for Cost {
    type Error = BCryptError;

    fn try_from(log_rounds: u32) -> BCryptResult<Self> {
        Cost::new(log_rounds)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// Runs the expensive key setup and hands back the keyed cipher.
///
/// The real salt is mixed in exactly once. Each of the `2^cost` rounds then
/// re-keys with the key alone and with the salt alone, both against a zero
/// salt stream.
pub fn setup(cost: Cost, salt: &[u8; SALT_LEN], key: &[u8]) -> Blowfish {
    let mut state = Blowfish::new();
    state.expand_key(key, salt);

    for _ in 0..cost.rounds() {
        state.expand_key(key, &ZERO_SALT);
        state.expand_key(salt, &ZERO_SALT);
    }

    state
}
