/// Small deterministic generator (SplitMix64) used by randomized degradations.
///
/// Operations never read ambient randomness: every stream is derived from the `seed` parameter
/// and the frame index, so a frame degrades identically on every run.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Rng64 {
    state: u64,
}

impl Rng64 {
    pub(crate) fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Independent stream for one frame of one seeded invocation.
    pub(crate) fn for_frame(seed: u64, frame: usize) -> Self {
        let mut mix = Self::new(seed ^ (frame as u64).wrapping_mul(0xD6E8_FEB8_6659_FD93));
        Self::new(mix.next_u64())
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        // SplitMix64
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    pub(crate) fn next_f64_01(&mut self) -> f64 {
        // 53 bits of precision.
        let v = self.next_u64() >> 11;
        (v as f64) * (1.0 / ((1u64 << 53) as f64))
    }

    /// Uniform integer in `[lo, hi]` (inclusive).
    pub(crate) fn range_i64(&mut self, lo: i64, hi: i64) -> i64 {
        if hi <= lo {
            return lo;
        }
        let span = (hi - lo) as u64 + 1;
        lo + (self.next_u64() % span) as i64
    }

    /// Uniform index in `[0, n)`; `n` must be non-zero.
    pub(crate) fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    /// Standard normal sample (Box-Muller).
    pub(crate) fn next_gaussian(&mut self) -> f64 {
        let u1 = self.next_f64_01().max(f64::MIN_POSITIVE);
        let u2 = self.next_f64_01();
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }

    /// Poisson sample; uses a normal approximation for large means.
    pub(crate) fn next_poisson(&mut self, lambda: f64) -> f64 {
        if lambda <= 0.0 {
            return 0.0;
        }
        if lambda > 30.0 {
            return (lambda + lambda.sqrt() * self.next_gaussian()).round().max(0.0);
        }
        let limit = (-lambda).exp();
        let mut k = 0.0;
        let mut p = 1.0;
        loop {
            p *= self.next_f64_01();
            if p <= limit {
                return k;
            }
            k += 1.0;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/rng.rs"]
mod tests;
