use crate::eks::DEFAULT_COST;

/// Work factor presets.
///
/// Every increment of `cost` doubles the time spent in key setup, both when
/// hashing and when verifying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BcryptSettings {
    pub cost: u32,
}

impl BcryptSettings {
    /// Roughly a second per hash on current server hardware.
    pub const PARANOID: Self = Self { cost: 14 };

    pub const DEFAULT: Self = Self { cost: DEFAULT_COST };

    /// For logins where the user is waiting on the result.
    pub const INTERACTIVE: Self = Self { cost: 10 };

    /// The cheapest valid work factor. Tests only.
    pub const TEST: Self = Self { cost: 4 };
}

impl Default for BcryptSettings {
    fn default() -> Self {
        Self::DEFAULT
    }
}
