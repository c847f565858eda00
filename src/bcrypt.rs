//! Hash and verify entry points, and the salt helpers around them.

use log::debug;
use rand::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::eks::{self, Cost, SALT_LEN};
use crate::error::{BCryptError, Result};
use crate::settings::{parse_settings, HashParts, Settings, Version, HASH_LEN};

/// Longest key material consumed by the key schedule, terminator included.
/// Longer passwords are truncated.
pub const KEY_LEN_MAX: usize = 72;

/// A hasher bound to one cost and salt.
pub struct BCrypt {
    version: Version,
    cost: Cost,
    salt: [u8; SALT_LEN],
}

impl BCrypt {
    pub fn new(cost: u32, salt: [u8; SALT_LEN]) -> Result<Self> {
        Ok(BCrypt {
            version: Version::default(),
            cost: Cost::new(cost)?,
            salt,
        })
    }

    /// Emits hashes tagged with `version` instead of the default `$2b$`.
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn settings(&self) -> Settings {
        Settings::new(self.version, self.cost, self.salt)
    }

    pub fn hash<P: AsRef<[u8]>>(&self, password: P) -> Result<String> {
        compute(&self.settings(), password.as_ref()).map(|parts| parts.to_string())
    }

    /// Checks `password` against `hash`, which must have been produced with
    /// this hasher's version, cost and salt; any other stored hash is a
    /// mismatch.
    pub fn verify<P: AsRef<[u8]>>(&self, password: P, hash: &str) -> Result<bool> {
        let stored: HashParts = hash.parse()?;
        if *stored.settings() != self.settings() {
            debug!("stored hash was not produced by this hasher's settings");
            return Ok(false);
        }
        verify(password, hash)
    }
}

/// Builds the key material for `version`: the password, a NUL terminator
/// for every version but `$2$`, truncated to [`KEY_LEN_MAX`] bytes.
fn key_material(version: Version, password: &[u8]) -> Zeroizing<Vec<u8>> {
    let mut key = Zeroizing::new(Vec::with_capacity(KEY_LEN_MAX));
    let len = password.len().min(KEY_LEN_MAX);
    key.extend_from_slice(&password[..len]);
    if version.nul_terminated() && key.len() < KEY_LEN_MAX {
        key.push(0);
    }
    key
}

fn compute(settings: &Settings, password: &[u8]) -> Result<HashParts> {
    debug!(
        "computing ${}$ hash at cost {}",
        settings.version(),
        settings.cost().get()
    );

    let key = key_material(settings.version(), password);
    let state = eks::setup(settings.cost(), settings.salt(), &key)?;
    let raw = Zeroizing::new(eks::digest(&state));
    drop(state);

    let mut digest = [0u8; HASH_LEN];
    digest.copy_from_slice(&raw[..HASH_LEN]);
    Ok(HashParts::new(settings.clone(), digest))
}

/// Hashes `password` with the parameters in `settings`.
///
/// `settings` is either a bare settings string (`$2b$12$` plus 22 salt
/// characters) or a complete hash, whose digest is then ignored.
pub fn hash<P: AsRef<[u8]>>(password: P, settings: &str) -> Result<String> {
    let settings = parse_settings(settings)?;
    Ok(compute(&settings, password.as_ref())?.to_string())
}

/// Hashes `password` with an explicit cost and raw salt bytes.
pub fn hash_with_salt<P: AsRef<[u8]>>(password: P, cost: u32, salt: &[u8]) -> Result<HashParts> {
    let cost = Cost::new(cost)?;
    let salt: [u8; SALT_LEN] = salt
        .try_into()
        .map_err(|_| BCryptError::InvalidSaltLength(salt.len()))?;
    compute(&Settings::new(Version::default(), cost, salt), password.as_ref())
}

/// Hashes a new password under a fresh random salt.
pub fn hash_password<P: AsRef<[u8]>>(password: P, cost: u32) -> Result<String> {
    hash_password_with(password, cost, &mut rand::thread_rng())
}

/// Like [`hash_password`], with salt bytes drawn from `rng`.
pub fn hash_password_with<P, R>(password: P, cost: u32, rng: &mut R) -> Result<String>
where
    P: AsRef<[u8]>,
    R: RngCore + CryptoRng,
{
    let settings = new_settings(cost, rng)?;
    Ok(compute(&settings, password.as_ref())?.to_string())
}

/// Checks `password` against a stored hash.
///
/// Returns `Ok(false)` on a mismatch and an error if `stored` cannot be
/// parsed; it never reports a match for a malformed hash.
pub fn verify<P: AsRef<[u8]>>(password: P, stored: &str) -> Result<bool> {
    let expected: HashParts = stored.parse().map_err(|err| {
        debug!("rejecting stored hash: {err}");
        err
    })?;

    let computed = compute(expected.settings(), password.as_ref())?;
    Ok(computed.digest().ct_eq(expected.digest()).into())
}

/// Returns a settings string for `cost` with a fresh random salt.
pub fn gen_salt(cost: u32) -> Result<String> {
    gen_salt_with(cost, &mut rand::thread_rng())
}

/// Like [`gen_salt`], with salt bytes drawn from `rng`.
pub fn gen_salt_with<R: RngCore + CryptoRng>(cost: u32, rng: &mut R) -> Result<String> {
    Ok(new_settings(cost, rng)?.to_string())
}

fn new_settings<R: RngCore + CryptoRng>(cost: u32, rng: &mut R) -> Result<Settings> {
    let cost = Cost::new(cost)?;
    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);
    Ok(Settings::new(Version::default(), cost, salt))
}

// Helper function to generate a random salt
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_known_hashes() -> Result<()> {
        let test_vectors: [(&[u8], &str); 9] = [
            (b"", "$2a$06$DCq7YPn5Rq63x1Lad4cll.TV4S6ytwfsfvkgY8jIucDrjc8deX1s."),
            (b"U*U", "$2a$05$CCCCCCCCCCCCCCCCCCCCC.E5YPO9kmyuRGyh0XouQYb4YMJKvyOeW"),
            (b"abc", "$2a$10$WvvTPHKwdBJ3uk0Z37EMR.hLA2W6N9AEBhEgrAOljy2Ae5MtaSIUi"),
            (b"password", "$2a$04$UuTkLRZZ6QofpDOlMz32MuuxEHA43WOemOYHPz6.SjsVsyO1tDU96"),
            (
                b"correctbatteryhorsestapler",
                "$2b$04$EGdrhbKUv8Oc9vGiXX0HQOxSg445d458Muh7DAHskb6QbtCvdxcie",
            ),
            (
                b"My S3cre7 P@55w0rd!",
                "$2y$05$HlFShUxTu4ZHHfOLJwfmCeDj/kuKFKboanXtDJXxCC7aIPTUgxNDe",
            ),
            (b"hunter2", "$2b$04$......................kqsx/caaQ2ooGaGUPBIUMKYjFvRA7Wi"),
            (b"U*U", "$2$05$CCCCCCCCCCCCCCCCCCCCC.s9E2NDMJ4Db1NbCC8JPhLL29bHiDQtK"),
            (b"", "$2$05$CCCCCCCCCCCCCCCCCCCCC.7uG0VCzI2bS7j6ymqJi9CdcdxiRTWNy"),
        ];

        for (password, expected) in test_vectors {
            let settings = parse_settings(expected)?.to_string();
            assert_eq!(hash(password, &settings)?, expected);
            assert!(verify(password, expected)?);
        }
        Ok(())
    }

    #[test]
    fn test_binary_password() -> Result<()> {
        let binary_input = [
            29, 225, 195, 167, 223, 236, 85, 195, 114, 227, 7, 0, 209, 239, 189, 24, 51, 105, 124,
            168, 151, 75, 144, 64, 198, 197, 196, 4, 241, 97, 110, 135,
        ];
        let hash = "$2a$04$tjARW6ZON3PhrAIRW2LG/u9aDw5eFdstYLR8nFCNaOQmsH9XD23w.";
        assert!(verify(binary_input, hash)?);
        Ok(())
    }

    #[test]
    fn test_basic_hashing() -> Result<()> {
        let salt = generate_salt();
        let bcrypt = BCrypt::new(4, salt)?;
        let hash = bcrypt.hash("password123")?;
        assert!(hash.starts_with("$2b$04$"));
        assert_eq!(hash.len(), 60);
        assert_eq!(hash, bcrypt.hash("password123")?);
        Ok(())
    }

    #[test]
    fn test_password_verification() -> Result<()> {
        let bcrypt = BCrypt::new(4, generate_salt())?.with_version(Version::TwoA);

        let password = "test_password";
        let hash = bcrypt.hash(password)?;
        assert!(hash.starts_with("$2a$04$"));

        assert!(verify(password, &hash)?);
        assert!(!verify("wrong_password", &hash)?);

        assert!(bcrypt.verify(password, &hash)?);
        assert!(!bcrypt.verify("wrong_password", &hash)?);
        Ok(())
    }

    #[test]
    fn test_hasher_verify_requires_its_own_settings() -> Result<()> {
        let salt = [0x42; SALT_LEN];
        let bcrypt = BCrypt::new(4, salt)?;
        let hash = bcrypt.hash("pw")?;
        assert!(bcrypt.verify("pw", &hash)?);

        // same password, but the hash came from another salt, cost or version
        let other_salt = BCrypt::new(4, [0x43; SALT_LEN])?.hash("pw")?;
        let other_cost = BCrypt::new(5, salt)?.hash("pw")?;
        let other_version = BCrypt::new(4, salt)?.with_version(Version::TwoY).hash("pw")?;
        assert!(verify("pw", &other_salt)?);
        assert!(!bcrypt.verify("pw", &other_salt)?);
        assert!(!bcrypt.verify("pw", &other_cost)?);
        assert!(!bcrypt.verify("pw", &other_version)?);

        assert!(matches!(
            bcrypt.verify("pw", &hash[..40]),
            Err(BCryptError::MalformedHash(_))
        ));
        Ok(())
    }

    #[test]
    fn test_single_bit_flips_fail() -> Result<()> {
        let password = b"flip me".to_vec();
        let hash = hash_password(&password, 4)?;

        for byte in 0..password.len() {
            for bit in 0..8 {
                let mut flipped = password.clone();
                flipped[byte] ^= 1 << bit;
                assert!(!verify(&flipped, &hash)?, "byte {byte} bit {bit}");
            }
        }
        assert!(verify(&password, &hash)?);
        Ok(())
    }

    #[test]
    fn test_hash_accepts_stored_hash_as_settings() -> Result<()> {
        let stored = hash_password("hunter2", 4)?;
        assert_eq!(hash("hunter2", &stored)?, stored);
        assert_ne!(hash("hunter3", &stored)?, stored);
        Ok(())
    }

    #[test]
    fn test_long_passwords_truncate() -> Result<()> {
        // produced with python -c 'import bcrypt; bcrypt.hashpw(b"x"*100, b"$2a$05$...............................")'
        let hash = "$2a$05$......................YgIDy4hFBdVlc/6LHnD9mX488r9cLd2";
        assert!(verify("x".repeat(100), hash)?);

        let settings = "$2b$04$......................";
        let h71 = super::hash("a".repeat(71), settings)?;
        let h72 = super::hash("a".repeat(72), settings)?;
        let h90 = super::hash("a".repeat(90), settings)?;
        assert_eq!(h71, "$2b$04$......................OKajFstSaQgvFOLFT26yIEg4fPr47jO");
        assert_eq!(h72, "$2b$04$......................UaUp2CqHXn14N7RprrzoDsNv91ahi36");
        assert_ne!(h71, h72);
        assert_eq!(h72, h90);
        Ok(())
    }

    #[test]
    fn test_key_material() {
        assert_eq!(&*key_material(Version::TwoB, b"abc"), b"abc\0");
        assert_eq!(&*key_material(Version::Two, b"abc"), b"abc");
        assert_eq!(key_material(Version::TwoA, &[b'a'; 71]).len(), 72);
        assert_eq!(key_material(Version::TwoA, &[b'a'; 72]).last(), Some(&b'a'));
        assert_eq!(key_material(Version::TwoY, &[b'a'; 200]).len(), KEY_LEN_MAX);
    }

    #[test]
    fn test_null_bytes_are_significant() -> Result<()> {
        let passwords: [&[u8]; 5] = [b"\0", b"passw0rd\0", b"password\0with tail", b"a", b"a\0b\0"];
        for (i, p1) in passwords.iter().enumerate() {
            let stored = hash_with_salt(p1, 4, &[0x11; 16])?.to_string();
            for (j, p2) in passwords.iter().enumerate() {
                assert_eq!(verify(p2, &stored)?, i == j, "{p1:?} vs {p2:?}");
            }
        }
        Ok(())
    }

    #[test]
    fn test_invalid_cost_factors() {
        let salt = generate_salt();

        assert_eq!(BCrypt::new(3, salt).err(), Some(BCryptError::InvalidCost(3)));
        assert_eq!(BCrypt::new(32, salt).err(), Some(BCryptError::InvalidCost(32)));
        assert!(BCrypt::new(4, salt).is_ok());
        assert!(BCrypt::new(31, salt).is_ok());

        assert_eq!(hash_password("pw", 0), Err(BCryptError::InvalidCost(0)));
        assert_eq!(gen_salt(32), Err(BCryptError::InvalidCost(32)));
    }

    #[test]
    fn test_invalid_salt_length() {
        assert_eq!(
            hash_with_salt("pw", 4, &[0; 15]).err(),
            Some(BCryptError::InvalidSaltLength(15))
        );
    }

    #[test]
    fn test_verify_fails_closed() {
        assert!(verify("pw", "").is_err());
        assert!(verify("pw", "$2a$04$tjARW6ZON3PhrAIRW2LG/u9a.").is_err());
        assert!(matches!(
            verify("pw", "$2a$04$tjARW6ZON3PhrAIRW2LG/u9aDw5eFdstYLR8nFCNaOQ!sH9XD23w."),
            Err(BCryptError::InvalidCharacter { character: '!', .. })
        ));
        assert_eq!(
            verify("pw", "$2a$99$tjARW6ZON3PhrAIRW2LG/u9aDw5eFdstYLR8nFCNaOQmsH9XD23w."),
            Err(BCryptError::InvalidCost(99))
        );
        assert!(verify(
            "pw",
            "$2a$04$n4Uy0eSnMfvnESYL.bLwuuj0U/ETSsoTpRT9GVk$5bektyVVa5xnIi"
        )
        .is_err());
    }

    #[test]
    fn test_salt_generation() -> Result<()> {
        assert_ne!(generate_salt(), generate_salt());

        let settings = gen_salt(5)?;
        assert_eq!(settings.len(), 29);
        assert!(settings.starts_with("$2b$05$"));

        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        assert_eq!(gen_salt_with(4, &mut a)?, gen_salt_with(4, &mut b)?);
        assert_eq!(
            hash_password_with("pw", 4, &mut a)?,
            hash_password_with("pw", 4, &mut b)?
        );
        Ok(())
    }

    #[test]
    fn test_parallel_hashing() -> Result<()> {
        let stored = hash_password("shared", 4)?;
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let stored = stored.clone();
                std::thread::spawn(move || {
                    let candidate = if i % 2 == 0 { "shared" } else { "other" };
                    (i, verify(candidate, &stored))
                })
            })
            .collect();

        for handle in handles {
            let (i, result) = handle.join().expect("worker panicked");
            assert_eq!(result?, i % 2 == 0);
        }
        Ok(())
    }
}
