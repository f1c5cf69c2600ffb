//! Seeded 2D simplex noise.
//!
//! The permutation table is shuffled with a Park-Miller style LCG
//! (`seed * 16807 mod 2^31-1`) driving a Fisher-Yates pass. The generator is
//! weak but kept as is so the same seed always yields the same field.

const LCG_MULTIPLIER: u64 = 16807;
const LCG_MODULUS: u64 = 2_147_483_647;

/// Deterministic noise source. Immutable once built.
#[derive(Clone)]
pub struct NoiseField {
    /// 256 shuffled entries, duplicated so `perm[i + perm[j]]` never wraps.
    perm: [u8; 512],
}

impl NoiseField {
    /// Skewing factor: (sqrt(3) - 1) / 2
    const F2: f64 = 0.366_025_403_784_438_6;
    /// Unskewing factor: (3 - sqrt(3)) / 6
    const G2: f64 = 0.211_324_865_405_187_13;

    pub fn new(seed: u32) -> Self {
        let mut p = [0u8; 256];
        for (i, v) in p.iter_mut().enumerate() {
            *v = i as u8;
        }

        let mut state = seed as u64;
        for i in (1..256usize).rev() {
            state = (state * LCG_MULTIPLIER) % LCG_MODULUS;
            let j = (state % (i as u64 + 1)) as usize;
            p.swap(i, j);
        }

        let mut perm = [0u8; 512];
        for (i, v) in perm.iter_mut().enumerate() {
            *v = p[i & 255];
        }

        Self { perm }
    }

    /// Sample the field, clamped to [-1, 1].
    ///
    /// The `u ± 2v` gradients overshoot the usual simplex bound (peaks near
    /// ±1.55), so the scaled sum is clamped.
    pub fn noise2d(&self, x: f64, y: f64) -> f64 {
        let s = (x + y) * Self::F2;
        let i = (x + s).floor();
        let j = (y + s).floor();

        let t = (i + j) * Self::G2;
        let x0 = x - (i - t);
        let y0 = y - (j - t);

        // Lower or upper triangle of the skewed cell
        let (i1, j1) = if x0 > y0 { (1usize, 0usize) } else { (0, 1) };

        let x1 = x0 - i1 as f64 + Self::G2;
        let y1 = y0 - j1 as f64 + Self::G2;
        let x2 = x0 - 1.0 + 2.0 * Self::G2;
        let y2 = y0 - 1.0 + 2.0 * Self::G2;

        let ii = lattice_index(i);
        let jj = lattice_index(j);

        let perm = &self.perm;
        let h0 = perm[ii + perm[jj] as usize];
        let h1 = perm[ii + i1 + perm[jj + j1] as usize];
        let h2 = perm[ii + 1 + perm[jj + 1] as usize];

        let sum = corner(h0, x0, y0) + corner(h1, x1, y1) + corner(h2, x2, y2);
        (70.0 * sum).clamp(-1.0, 1.0)
    }
}

/// Wrap a lattice coordinate into [0, 255], two's complement style for
/// negative inputs.
fn lattice_index(v: f64) -> usize {
    ((v as i64) & 255) as usize
}

fn corner(hash: u8, x: f64, y: f64) -> f64 {
    let t = 0.5 - x * x - y * y;
    if t < 0.0 {
        return 0.0;
    }
    let t2 = t * t;
    t2 * t2 * grad(hash, x, y)
}

/// One of 8 gradient directions, picked by the low 3 bits of the hash.
fn grad(hash: u8, x: f64, y: f64) -> f64 {
    let h = hash & 7;
    let (u, v) = if h < 4 { (x, y) } else { (y, x) };
    let u = if h & 1 != 0 { -u } else { u };
    let v = if h & 2 != 0 { -2.0 * v } else { 2.0 * v };
    u + v
}
