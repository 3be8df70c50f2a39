//! Token-seeded random source.
//!
//! The mapping from token id to parameters is a stored format: metadata that
//! was published for a token must stay valid for every later run. The
//! generator is therefore pinned to MT19937 with `init_by_array` seeding and
//! the rejection-sampling draw below, which together reproduce the reference
//! generator the first collection was minted with. Do not swap this for a
//! `rand` algorithm whose stream may change between releases.

use rand_mt::Mt;

pub struct TokenRng {
    mt: Mt,
}

impl TokenRng {
    /// Seeds the generator from the token id alone.
    ///
    /// The key is the id split into little-endian 32-bit words with leading
    /// zero words dropped; id 0 seeds with the single word `0`.
    pub fn for_token(token_id: u64) -> Self {
        let low = token_id as u32;
        let high = (token_id >> 32) as u32;
        let key: Vec<u32> = if high == 0 { vec![low] } else { vec![low, high] };
        Self {
            mt: Mt::new_with_key(key.into_iter()),
        }
    }

    /// Returns the top `bits` bits of the next 32-bit output.
    pub fn getrandbits(&mut self, bits: u32) -> u32 {
        debug_assert!((1..=32).contains(&bits));
        self.mt.next_u32() >> (32 - bits)
    }

    /// Uniform integer in `0..n`, by rejection over `bit_length(n)` bits.
    pub fn below(&mut self, n: u32) -> u32 {
        if n <= 1 {
            return 0;
        }
        let bits = u32::BITS - n.leading_zeros();
        loop {
            let candidate = self.getrandbits(bits);
            if candidate < n {
                return candidate;
            }
        }
    }

    /// Uniform integer in `low..=high`.
    pub fn int_inclusive(&mut self, low: u32, high: u32) -> u32 {
        low + self.below(high - low + 1)
    }

    pub fn choose<'a, T>(&mut self, candidates: &'a [T]) -> &'a T {
        let index = self.below(candidates.len() as u32) as usize;
        &candidates[index]
    }
}
