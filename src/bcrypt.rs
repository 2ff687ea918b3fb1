use std::fmt;
use std::str::FromStr;

use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, instrument};

use crate::digest::{self, DIGEST_LEN};
use crate::eks::{Cost, SALT_LEN};
use crate::error::{BCryptError, BCryptResult};
use crate::radix64;
use crate::settings::BcryptSettings;

/// Length of an encoded hash: `$2a$` + cost + `$` + salt + digest.
pub const ENCODED_LEN: usize = 60;

const SALT_CHARS: usize = 22;
const DIGEST_CHARS: usize = 31;

/// The bcrypt revision tag at the front of an encoded hash.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Version {
    TwoA,
    TwoB,
}

impl Version {
    pub fn as_str(self) -> &'static str {
        match self {
            Version::TwoA => "2a",
            Version::TwoB => "2b",
        }
    }

    fn from_prefix(prefix: &[u8]) -> BCryptResult<Self> {
        match prefix {
            b"$2a$" => Ok(Version::TwoA),
            b"$2b$" => Ok(Version::TwoB),
            _ => Err(BCryptError::MalformedEncoding(format!(
                "unsupported version prefix {:?}",
                String::from_utf8_lossy(prefix)
            ))),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fields of an encoded bcrypt hash.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HashParts {
    version: Version,
    cost: Cost,
    salt: [u8; SALT_LEN],
    digest: [u8; DIGEST_LEN],
}

impl HashParts {
    pub fn version(&self) -> Version {
        self.version
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn digest(&self) -> &[u8; DIGEST_LEN] {
        &self.digest
    }
}

impl FromStr for HashParts {
    type Err = BCryptError;

    fn from_str(encoded: &str) -> BCryptResult<Self> {
        if encoded.len() != ENCODED_LEN {
            return Err(BCryptError::MalformedEncoding(format!(
                "expected {} characters, got {}",
                ENCODED_LEN,
                encoded.len()
            )));
        }
        if !encoded.is_ascii() {
            return Err(BCryptError::MalformedEncoding(
                "hash contains non-ASCII characters".to_string(),
            ));
        }

        let bytes = encoded.as_bytes();
        let version = Version::from_prefix(&bytes[..4])?;

        let cost = match (bytes[4], bytes[5], bytes[6]) {
            (tens @ b'0'..=b'9', ones @ b'0'..=b'9', b'$') => {
                Cost::new(u32::from(tens - b'0') * 10 + u32::from(ones - b'0'))?
            }
            _ => {
                return Err(BCryptError::MalformedEncoding(format!(
                    "cost field {:?} is not two digits followed by '$'",
                    &encoded[4..7]
                )))
            }
        };

        let salt: [u8; SALT_LEN] = radix64::decode(&encoded[7..7 + SALT_CHARS], SALT_LEN)?
            .try_into()
            .map_err(|_| BCryptError::MalformedEncoding("salt is too short".to_string()))?;
        let digest: [u8; DIGEST_LEN] = radix64::decode(&encoded[7 + SALT_CHARS..], DIGEST_LEN)?
            .try_into()
            .map_err(|_| BCryptError::MalformedEncoding("digest is too short".to_string()))?;

        Ok(HashParts {
            version,
            cost,
            salt,
            digest,
        })
    }
}

impl fmt::Display for HashParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${}${}${}{}",
            self.version,
            self.cost,
            radix64::encode(&self.salt, SALT_CHARS),
            radix64::encode(&self.digest, DIGEST_CHARS)
        )
    }
}

/// Draws a fresh 16-byte salt from the operating system.
pub fn generate_salt() -> BCryptResult<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.try_fill_bytes(&mut salt)?;
    Ok(salt)
}

/// Hashes `password` under a freshly generated salt.
pub fn hash<P: AsRef<[u8]>>(password: P, cost: u32) -> BCryptResult<String> {
    let cost = Cost::new(cost)?;
    let salt = generate_salt()?;
    Ok(hash_parts(password.as_ref(), cost, salt).to_string())
}

/// Hashes `password` under a caller-chosen 16-byte salt. Deterministic.
pub fn hash_with_salt<P: AsRef<[u8]>>(password: P, salt: &[u8], cost: u32) -> BCryptResult<String> {
    let cost = Cost::new(cost)?;
    let salt: [u8; SALT_LEN] = salt
        .try_into()
        .map_err(|_| BCryptError::InvalidSaltLength(salt.len()))?;
    Ok(hash_parts(password.as_ref(), cost, salt).to_string())
}

#[instrument(level = "debug", skip_all, fields(cost = cost.get()))]
fn hash_parts(password: &[u8], cost: Cost, salt: [u8; SALT_LEN]) -> HashParts {
    let digest = digest::bcrypt(cost, &salt, password);
    debug!("derived bcrypt digest");

    HashParts {
        version: Version::TwoA,
        cost,
        salt,
        digest,
    }
}

/// Checks `password` against an encoded hash.
///
/// Returns an error only when `encoded` cannot be parsed. The digest
/// comparison takes the same time wherever the digests differ.
#[instrument(level = "debug", skip_all)]
pub fn verify<P: AsRef<[u8]>>(password: P, encoded: &str) -> BCryptResult<bool> {
    let stored: HashParts = encoded.parse().map_err(|e| {
        debug!(error = %e, "rejecting malformed hash");
        e
    })?;

    let computed = hash_parts(password.as_ref(), stored.cost, stored.salt);
    let matches = constant_time_compare(&stored.digest, &computed.digest);
    if !matches {
        debug!(cost = stored.cost.get(), "password mismatch");
    }
    Ok(matches)
}

/// A hasher bound to one work factor.
#[derive(Clone, Copy, Debug, Default)]
pub struct BCrypt {
    cost: Cost,
}

impl BCrypt {
    pub fn new(cost: u32) -> BCryptResult<Self> {
        Ok(BCrypt {
            cost: Cost::new(cost)?,
        })
    }

    pub fn from_settings(settings: &BcryptSettings) -> BCryptResult<Self> {
        Self::new(settings.cost)
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub fn hash<P: AsRef<[u8]>>(&self, password: P) -> BCryptResult<String> {
        hash(password, self.cost.get())
    }

    pub fn verify<P: AsRef<[u8]>>(&self, password: P, encoded: &str) -> BCryptResult<bool> {
        verify(password, encoded)
    }

    /// Whether a stored hash should be replaced with one made by this hasher,
    /// because it used another work factor or another version tag.
    pub fn needs_rehash(&self, encoded: &str) -> BCryptResult<bool> {
        let stored: HashParts = encoded.parse()?;
        Ok(stored.cost != self.cost || stored.version != Version::TwoA)
    }
}

// Every byte pair is compared, so timing does not reveal the first mismatch.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: [u8; SALT_LEN] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
        0x0f,
    ];

    #[test]
    fn test_basic_hashing() -> Result<(), BCryptError> {
        let hash = hash_with_salt("MySecretP@ssw0rd", &SALT, 4)?;
        assert_eq!(
            hash,
            "$2a$04$..CA.uOD/eaGAOmJB.yMBu0Vg.IqgE5e1N3Jo7bVq9ebueyvZWNbi"
        );
        Ok(())
    }

    #[test]
    fn test_password_verification() -> Result<(), BCryptError> {
        let bcrypt = BCrypt::new(4)?;
        let hash = bcrypt.hash("test_password")?;

        assert!(bcrypt.verify("test_password", &hash)?);
        assert!(!bcrypt.verify("wrong_password", &hash)?);
        Ok(())
    }

    #[test]
    fn test_invalid_cost_factors() {
        assert!(matches!(BCrypt::new(3), Err(BCryptError::InvalidCost(3))));
        assert!(matches!(BCrypt::new(32), Err(BCryptError::InvalidCost(32))));
        assert!(BCrypt::new(4).is_ok());
        assert!(BCrypt::new(31).is_ok());
        assert!(matches!(hash("pw", 0), Err(BCryptError::InvalidCost(0))));
    }

    #[test]
    fn test_invalid_salt_length() {
        assert!(matches!(
            hash_with_salt("pw", &[0; 15], 4),
            Err(BCryptError::InvalidSaltLength(15))
        ));
        assert!(matches!(
            hash_with_salt("pw", &[], 4),
            Err(BCryptError::InvalidSaltLength(0))
        ));
    }

    #[test]
    fn test_salt_generation() -> Result<(), BCryptError> {
        let salt1 = generate_salt()?;
        let salt2 = generate_salt()?;
        assert_ne!(salt1, salt2);
        Ok(())
    }

    #[test]
    fn test_parse_fields() -> Result<(), BCryptError> {
        let parts: HashParts = "$2b$05$..CA.uOD/eaGAOmJB.yMBuME2.Mfei1OX4jODwlhzXHZpuc17bHoi".parse()?;
        assert_eq!(parts.version(), Version::TwoB);
        assert_eq!(parts.cost().get(), 5);
        assert_eq!(parts.salt(), &SALT);
        assert_eq!(
            parts.to_string(),
            "$2b$05$..CA.uOD/eaGAOmJB.yMBuME2.Mfei1OX4jODwlhzXHZpuc17bHoi"
        );
        Ok(())
    }

    #[test]
    fn test_parse_rejects_bad_cost_field() {
        let digits = "$2a$1x$..CA.uOD/eaGAOmJB.yMBuME2.Mfei1OX4jODwlhzXHZpuc17bHoi";
        assert!(matches!(
            digits.parse::<HashParts>(),
            Err(BCryptError::MalformedEncoding(_))
        ));

        let separator = "$2a$05#..CA.uOD/eaGAOmJB.yMBuME2.Mfei1OX4jODwlhzXHZpuc17bHoi";
        assert!(matches!(
            separator.parse::<HashParts>(),
            Err(BCryptError::MalformedEncoding(_))
        ));

        let range = "$2a$03$..CA.uOD/eaGAOmJB.yMBuME2.Mfei1OX4jODwlhzXHZpuc17bHoi";
        assert!(matches!(
            range.parse::<HashParts>(),
            Err(BCryptError::InvalidCost(3))
        ));
    }

    #[test]
    fn test_parse_rejects_non_ascii() {
        // 60 bytes, but the multi-byte character straddles the salt boundary
        let encoded = format!("$2a$05$..CA.uOD/eaGAOmJB.yMB\u{e9}{}", "a".repeat(30));
        assert_eq!(encoded.len(), ENCODED_LEN);
        assert!(matches!(
            encoded.parse::<HashParts>(),
            Err(BCryptError::MalformedEncoding(_))
        ));
    }

    #[test]
    fn test_needs_rehash() -> Result<(), BCryptError> {
        let bcrypt = BCrypt::new(5)?;
        let current = "$2a$05$..CA.uOD/eaGAOmJB.yMBuME2.Mfei1OX4jODwlhzXHZpuc17bHoi";
        let weaker = "$2a$04$..CA.uOD/eaGAOmJB.yMBu0Vg.IqgE5e1N3Jo7bVq9ebueyvZWNbi";
        let other_version = "$2b$05$..CA.uOD/eaGAOmJB.yMBuME2.Mfei1OX4jODwlhzXHZpuc17bHoi";

        assert!(!bcrypt.needs_rehash(current)?);
        assert!(bcrypt.needs_rehash(weaker)?);
        assert!(bcrypt.needs_rehash(other_version)?);
        Ok(())
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare(b"abc", b"abc"));
        assert!(!constant_time_compare(b"abc", b"abd"));
        assert!(!constant_time_compare(b"xbc", b"abc"));
        assert!(!constant_time_compare(b"abc", b"ab"));
    }
}
