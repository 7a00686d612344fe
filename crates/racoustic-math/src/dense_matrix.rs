//! Dense square matrices for FDN feedback topologies.
//!
//! The two feedback matrices an FDN supports (Householder, random
//! orthogonal) are both N x N orthonormal transforms. Householder's
//! closed form (`§4.6`) doesn't need a stored matrix; random-orthogonal
//! does, built once at `init_late_reverb` time via Gram-Schmidt over a
//! small embedded PRNG (the corpus carries no `rand` dependency, and a
//! one-time startup basis build doesn't warrant adding one).

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

/// A deterministic, dependency-free xorshift64* generator.
///
/// Not cryptographically secure — used only to seed the random vectors
/// that Gram-Schmidt turns into an orthonormal basis.
#[derive(Debug, Clone)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    /// Seed the generator.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next raw 64-bit output.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E3779B97F4A7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }

    /// A uniform f32 in `[-1, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        let bits = (self.next_u64() >> 40) as u32; // top 24 bits
        (bits as f32 / (1u32 << 24) as f32) * 2.0 - 1.0
    }
}

/// A square matrix stored row-major, flattened.
#[derive(Debug, Clone)]
pub struct DenseMatrix {
    n: usize,
    data: Vec<f32>,
}

impl DenseMatrix {
    /// The N x N identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            data[i * n + i] = 1.0;
        }
        Self { n, data }
    }

    /// An orthonormal basis built by Gram-Schmidt over `n` random vectors
    /// drawn from a PRNG seeded with `seed`. Deterministic for a given seed.
    pub fn random_orthogonal(n: usize, seed: u64) -> Self {
        let mut rng = SplitMix64::new(seed);
        let mut rows: Vec<Vec<f32>> = Vec::with_capacity(n);

        for _ in 0..n {
            let mut candidate: Vec<f32> = (0..n).map(|_| rng.next_f32()).collect();
            for existing in &rows {
                let proj: f32 = candidate.iter().zip(existing).map(|(a, b)| a * b).sum();
                for (c, e) in candidate.iter_mut().zip(existing) {
                    *c -= proj * e;
                }
            }
            let norm = libm::sqrtf(candidate.iter().map(|x| x * x).sum::<f32>()).max(1e-9);
            for c in &mut candidate {
                *c /= norm;
            }
            rows.push(candidate);
        }

        let mut data = vec![0.0; n * n];
        for (i, row) in rows.iter().enumerate() {
            data[i * n..(i + 1) * n].copy_from_slice(row);
        }
        Self { n, data }
    }

    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Apply `y' = M * y`, writing into `out` (must be length `n`).
    pub fn apply(&self, y: &[f32], out: &mut [f32]) {
        debug_assert_eq!(y.len(), self.n);
        debug_assert_eq!(out.len(), self.n);
        for i in 0..self.n {
            let row = &self.data[i * self.n..(i + 1) * self.n];
            out[i] = row.iter().zip(y).map(|(a, b)| a * b).sum();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_applies_as_passthrough() {
        let m = DenseMatrix::identity(4);
        let input = [1.0, 2.0, 3.0, 4.0];
        let mut out = [0.0; 4];
        m.apply(&input, &mut out);
        assert_eq!(out, input);
    }

    #[test]
    fn random_orthogonal_rows_are_unit_length_and_mutually_orthogonal() {
        let m = DenseMatrix::random_orthogonal(8, 42);
        for i in 0..8 {
            let row_i = &m.data[i * 8..(i + 1) * 8];
            let norm: f32 = row_i.iter().map(|x| x * x).sum();
            assert!((norm - 1.0).abs() < 1e-3, "row {i} not unit length: {norm}");
            for j in (i + 1)..8 {
                let row_j = &m.data[j * 8..(j + 1) * 8];
                let dot: f32 = row_i.iter().zip(row_j).map(|(a, b)| a * b).sum();
                assert!(dot.abs() < 1e-3, "rows {i},{j} not orthogonal: {dot}");
            }
        }
    }

    #[test]
    fn random_orthogonal_preserves_energy() {
        let m = DenseMatrix::random_orthogonal(6, 7);
        let input = [1.0, -1.0, 0.5, -0.5, 2.0, -2.0];
        let mut out = [0.0; 6];
        m.apply(&input, &mut out);
        let in_energy: f32 = input.iter().map(|x| x * x).sum();
        let out_energy: f32 = out.iter().map(|x| x * x).sum();
        assert!((in_energy - out_energy).abs() < 1e-2);
    }

    #[test]
    fn same_seed_is_deterministic() {
        let a = DenseMatrix::random_orthogonal(5, 123);
        let b = DenseMatrix::random_orthogonal(5, 123);
        assert_eq!(a.data, b.data);
    }
}
