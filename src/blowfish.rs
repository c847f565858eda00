//! The Blowfish machinery used by the bcrypt key setup.
//!
//! Only encryption is provided. The state is a plain value: callers own it
//! for the duration of one hash and it is wiped when dropped.

use zeroize::Zeroize;

use crate::blowfish_consts::{P_INIT, S_INIT};

/// Number of Feistel rounds.
const ROUNDS: usize = 16;

/// P-array and S-boxes of one Blowfish instance.
#[derive(Clone)]
pub(crate) struct Blowfish {
    p: [u32; ROUNDS + 2],
    s: [[u32; 256]; 4],
}

impl Blowfish {
    /// The default state, before any key has been mixed in.
    pub(crate) fn init_state() -> Self {
        Blowfish {
            p: P_INIT,
            s: S_INIT,
        }
    }

    fn f(&self, x: u32) -> u32 {
        let [a, b, c, d] = x.to_be_bytes();
        let h = self.s[0][usize::from(a)].wrapping_add(self.s[1][usize::from(b)]);
        (h ^ self.s[2][usize::from(c)]).wrapping_add(self.s[3][usize::from(d)])
    }

    /// Encrypts one 64-bit block given as its two big-endian halves.
    pub(crate) fn encrypt_block(&self, mut left: u32, mut right: u32) -> (u32, u32) {
        for i in (0..ROUNDS).step_by(2) {
            left ^= self.p[i];
            right ^= self.f(left);
            right ^= self.p[i + 1];
            left ^= self.f(right);
        }

        left ^= self.p[ROUNDS];
        right ^= self.p[ROUNDS + 1];

        (right, left)
    }

    /// XORs the P-array with big-endian words read cyclically from `key`.
    ///
    /// `key` must not be empty.
    pub(crate) fn expand_key(&mut self, key: &[u8]) {
        debug_assert!(!key.is_empty());

        let mut bytes = key.iter().copied().cycle();
        for pi in &mut self.p {
            let mut word = 0u32;
            for b in bytes.by_ref().take(4) {
                word = (word << 8) | u32::from(b);
            }
            *pi ^= word;
        }
    }

    /// Replaces the P-array and then every S-box entry with a chain of
    /// encryptions starting from the zero block.
    pub(crate) fn scramble(&mut self) {
        self.scramble_salted(&[0; 4]);
    }

    /// Like [`Blowfish::scramble`], but before each encryption the next two
    /// salt words (cycling through all four) are XORed into the block.
    pub(crate) fn scramble_salted(&mut self, salt: &[u32; 4]) {
        let mut left = 0u32;
        let mut right = 0u32;
        let mut j = 0;

        for i in (0..ROUNDS + 2).step_by(2) {
            left ^= salt[j];
            right ^= salt[j + 1];
            j = (j + 2) % 4;

            (left, right) = self.encrypt_block(left, right);
            self.p[i] = left;
            self.p[i + 1] = right;
        }

        for sbox in 0..4 {
            for k in (0..256).step_by(2) {
                left ^= salt[j];
                right ^= salt[j + 1];
                j = (j + 2) % 4;

                (left, right) = self.encrypt_block(left, right);
                self.s[sbox][k] = left;
                self.s[sbox][k + 1] = right;
            }
        }
    }
}

impl Drop for Blowfish {
    fn drop(&mut self) {
        self.p.zeroize();
        for sbox in &mut self.s {
            sbox.zeroize();
        }
    }
}
