//! EksBlowfish: the salted, cost-driven key setup, and the digest computed
//! from the resulting state.

use log::trace;

use crate::blowfish::Blowfish;
use crate::error::{BCryptError, Result};

pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;
pub const DEFAULT_COST: u32 = 12;

/// Number of salt bytes.
pub const SALT_LEN: usize = 16;

/// Number of raw digest bytes produced by [`digest`].
pub const DIGEST_LEN: usize = 24;

const MAGIC: &[u8; DIGEST_LEN] = b"OrpheanBeholderScryDoubt";

/// A validated work factor. The key schedule runs `2^cost` rounds.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Cost(u32);

impl Cost {
    pub fn new(cost: u32) -> Result<Self> {
        if (MIN_COST..=MAX_COST).contains(&cost) {
            Ok(Cost(cost))
        } else {
            Err(BCryptError::InvalidCost(cost))
        }
    }

    /// The base-2 logarithm of the number of rounds.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The number of key schedule rounds.
    pub const fn rounds(self) -> u32 {
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

    fn try_from(cost: u32) -> Result<Self> {
        Cost::new(cost)
    }
}

fn salt_words(salt: &[u8; SALT_LEN]) -> [u32; 4] {
    let mut words = [0u32; 4];
    for (w, chunk) in words.iter_mut().zip(salt.chunks_exact(4)) {
        *w = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    words
}

/// Runs the expensive key setup for `key` under `salt`.
///
/// `key` is the final key material (terminator included, already bounded
/// to 72 bytes); an empty key is treated as a single zero byte.
pub(crate) fn setup(cost: Cost, salt: &[u8], key: &[u8]) -> Result<Blowfish> {
    let salt: &[u8; SALT_LEN] = salt
        .try_into()
        .map_err(|_| BCryptError::InvalidSaltLength(salt.len()))?;
    let key = if key.is_empty() { &[0u8][..] } else { key };
    let words = salt_words(salt);

    let mut state = Blowfish::init_state();
    state.expand_key(key);
    state.scramble_salted(&words);

    for _ in 0..cost.rounds() {
        state.expand_key(key);
        state.scramble();
        state.expand_key(salt);
        state.scramble();
    }

    trace!("key schedule finished after {} rounds", cost.rounds());
    Ok(state)
}

/// Encrypts the magic text 64 times under `state`.
pub(crate) fn digest(state: &Blowfish) -> [u8; DIGEST_LEN] {
    let mut cdata = [0u32; DIGEST_LEN / 4];
    for (w, chunk) in cdata.iter_mut().zip(MAGIC.chunks_exact(4)) {
        *w = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }

    for _ in 0..64 {
        for i in (0..cdata.len()).step_by(2) {
            (cdata[i], cdata[i + 1]) = state.encrypt_block(cdata[i], cdata[i + 1]);
        }
    }

    let mut out = [0u8; DIGEST_LEN];
    for (b, w) in out.chunks_exact_mut(4).zip(cdata) {
        b.copy_from_slice(&w.to_be_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_bounds() {
        assert_eq!(Cost::new(3), Err(BCryptError::InvalidCost(3)));
        assert_eq!(Cost::new(0), Err(BCryptError::InvalidCost(0)));
        assert_eq!(Cost::new(32), Err(BCryptError::InvalidCost(32)));
        assert_eq!(Cost::new(4).map(Cost::get), Ok(4));
        assert_eq!(Cost::new(31).map(Cost::rounds), Ok(2147483648));
        assert_eq!(Cost::default().get(), DEFAULT_COST);
        assert!(Cost::try_from(10u32).is_ok());
    }

    #[test]
    fn setup_rejects_wrong_salt_length() {
        let cost = Cost::new(4).unwrap();
        assert!(matches!(
            setup(cost, &[0; 15], b"abc\0"),
            Err(BCryptError::InvalidSaltLength(15))
        ));
        assert!(matches!(
            setup(cost, &[0; 17], b"abc\0"),
            Err(BCryptError::InvalidSaltLength(17))
        ));
    }

    #[test]
    fn digest_is_deterministic() {
        let cost = Cost::new(4).unwrap();
        let a = digest(&setup(cost, &[7; SALT_LEN], b"secret\0").unwrap());
        let b = digest(&setup(cost, &[7; SALT_LEN], b"secret\0").unwrap());
        assert_eq!(a, b);

        let c = digest(&setup(cost, &[8; SALT_LEN], b"secret\0").unwrap());
        assert_ne!(a, c);
        let d = digest(&setup(Cost::new(5).unwrap(), &[7; SALT_LEN], b"secret\0").unwrap());
        assert_ne!(a, d);
    }

    #[test]
    fn empty_key_is_a_zero_byte() {
        let cost = Cost::new(4).unwrap();
        let a = digest(&setup(cost, &[1; SALT_LEN], b"").unwrap());
        let b = digest(&setup(cost, &[1; SALT_LEN], b"\0").unwrap());
        assert_eq!(a, b);
    }

    #[test]
    #[ignore = "wall-clock dependent; run with --ignored on an idle machine"]
    fn each_cost_step_doubles_the_work() {
        use std::time::Instant;

        // best of three runs, to damp scheduler noise
        let time = |cost: u32| {
            let cost = Cost::new(cost).unwrap();
            (0..3)
                .map(|_| {
                    let start = Instant::now();
                    let state = setup(cost, &[3; SALT_LEN], b"timing\0").unwrap();
                    let elapsed = start.elapsed();
                    drop(state);
                    elapsed.as_secs_f64()
                })
                .fold(f64::INFINITY, f64::min)
        };

        // warm up caches before measuring
        time(6);
        let t8 = time(8);
        let t9 = time(9);
        let t10 = time(10);
        for (cost, ratio) in [(9, t9 / t8), (10, t10 / t9)] {
            assert!(
                (1.4..3.0).contains(&ratio),
                "cost {cost} / cost {} ratio was {ratio}",
                cost - 1
            );
        }
    }
}
