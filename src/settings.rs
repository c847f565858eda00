//! Settings and hash strings.
//!
//! ```text
//! $2b$12$R9h/cIPz0gi.URNNX3kh2OPST9/PgBkqquzi.Ss7KIUgO2t0jWMUW
//! \__/\_/\____________________/\_____________________________/
//!  |   |          salt                      digest
//!  |   cost
//!  version
//! ```
//!
//! The settings string is everything up to and including the salt; it is
//! all that is needed to recompute a hash for a candidate password.

use std::fmt;
use std::str::FromStr;

use crate::eks::{Cost, SALT_LEN};
use crate::error::{BCryptError, Result};
use crate::radix64;

/// Number of digest bytes kept in a hash string.
pub const HASH_LEN: usize = 23;

const SALT_CHARS: usize = radix64::encoded_len(SALT_LEN);
const HASH_CHARS: usize = radix64::encoded_len(HASH_LEN);

/// bcrypt version tag.
///
/// All supported versions run the same algorithm; they differ only in
/// whether the key gets a NUL terminator.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Version {
    /// `$2$`: the original version, key without terminator.
    Two,
    TwoA,
    #[default]
    TwoB,
    TwoY,
}

impl Version {
    pub fn as_str(self) -> &'static str {
        match self {
            Version::Two => "2",
            Version::TwoA => "2a",
            Version::TwoB => "2b",
            Version::TwoY => "2y",
        }
    }

    /// Whether the key material is followed by a NUL byte.
    pub(crate) fn nul_terminated(self) -> bool {
        !matches!(self, Version::Two)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Version {
    type Err = BCryptError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "2" => Ok(Version::Two),
            "2a" => Ok(Version::TwoA),
            "2b" => Ok(Version::TwoB),
            "2y" => Ok(Version::TwoY),
            "" => Err(BCryptError::MalformedHash("empty version")),
            other => Err(BCryptError::UnsupportedVersion(other.to_string())),
        }
    }
}

/// Version, cost and salt: the parameters of one hash.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Settings {
    version: Version,
    cost: Cost,
    salt: [u8; SALT_LEN],
}

impl Settings {
    pub fn new(version: Version, cost: Cost, salt: [u8; SALT_LEN]) -> Self {
        Settings {
            version,
            cost,
            salt,
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${}${:02}${}",
            self.version,
            self.cost.get(),
            radix64::encode(&self.salt)
        )
    }
}

impl FromStr for Settings {
    type Err = BCryptError;

    /// Parses a bare settings string; see [`parse_settings`] for the
    /// variant that also accepts a full hash.
    fn from_str(s: &str) -> Result<Self> {
        let (version, cost, rest) = split_header(s)?;
        if rest.len() != SALT_CHARS {
            return Err(BCryptError::MalformedHash("wrong salt length"));
        }
        let salt = decode_field(rest, s.len() - rest.len())?;
        Ok(Settings::new(version, cost, salt))
    }
}

/// A parsed hash string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HashParts {
    settings: Settings,
    digest: [u8; HASH_LEN],
}

impl HashParts {
    pub fn new(settings: Settings, digest: [u8; HASH_LEN]) -> Self {
        HashParts { settings, digest }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn version(&self) -> Version {
        self.settings.version
    }

    pub fn cost(&self) -> Cost {
        self.settings.cost
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.settings.salt
    }

    pub fn digest(&self) -> &[u8; HASH_LEN] {
        &self.digest
    }
}

impl fmt::Display for HashParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.settings, radix64::encode(&self.digest))
    }
}

impl FromStr for HashParts {
    type Err = BCryptError;

    fn from_str(s: &str) -> Result<Self> {
        let (version, cost, rest) = split_header(s)?;
        if rest.len() != SALT_CHARS + HASH_CHARS {
            return Err(BCryptError::MalformedHash("wrong hash length"));
        }
        let offset = s.len() - rest.len();
        let (salt, digest) = split_at_checked(rest, SALT_CHARS)?;
        Ok(HashParts::new(
            Settings::new(version, cost, decode_field(salt, offset)?),
            decode_field(digest, offset + SALT_CHARS)?,
        ))
    }
}

/// Parses the settings portion of `text`, which may be a bare settings
/// string or a complete hash string.
pub fn parse_settings(text: &str) -> Result<Settings> {
    let (_, _, rest) = split_header(text)?;
    match rest.len() {
        SALT_CHARS => text.parse(),
        n if n == SALT_CHARS + HASH_CHARS => text.parse::<HashParts>().map(|h| h.settings),
        _ => Err(BCryptError::MalformedHash("wrong salt length")),
    }
}

/// Assembles a complete hash string.
pub fn format_hash(
    version: Version,
    cost: Cost,
    salt: &[u8; SALT_LEN],
    digest: &[u8; HASH_LEN],
) -> String {
    HashParts::new(Settings::new(version, cost, *salt), *digest).to_string()
}

/// Splits `$<version>$<cost>$` off the front of `s`.
fn split_header(s: &str) -> Result<(Version, Cost, &str)> {
    let rest = s
        .strip_prefix('$')
        .ok_or(BCryptError::MalformedHash("missing leading '$'"))?;
    let (tag, rest) = rest
        .split_once('$')
        .ok_or(BCryptError::MalformedHash("missing cost"))?;
    let version: Version = tag.parse()?;

    let (cost, rest) = rest
        .split_once('$')
        .ok_or(BCryptError::MalformedHash("missing salt"))?;
    if cost.len() != 2 || !cost.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BCryptError::MalformedHash("cost must be two decimal digits"));
    }
    let cost = cost
        .bytes()
        .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'));

    Ok((version, Cost::new(cost)?, rest))
}

/// Decodes a radix-64 field found at byte `offset` of the whole string, so
/// that character errors point into the full hash.
fn decode_field<const N: usize>(field: &str, offset: usize) -> Result<[u8; N]> {
    radix64::decode_array(field).map_err(|err| match err {
        BCryptError::InvalidCharacter {
            character,
            position,
        } => BCryptError::InvalidCharacter {
            character,
            position: position + offset,
        },
        other => other,
    })
}

fn split_at_checked(s: &str, mid: usize) -> Result<(&str, &str)> {
    if s.is_char_boundary(mid) {
        Ok(s.split_at(mid))
    } else {
        Err(BCryptError::MalformedHash("non-ASCII character in hash"))
    }
}
