//! Vector quantization of cell luma vectors into a shared codebook.
//!
//! The encoder only depends on the [`Quantizer`] trait. [`LbgQuantizer`] is
//! the default engine: Lloyd/LBG refinement from randomly drawn training
//! vectors, with empty cells re-seeded from the worst represented vectors.

use rayon::prelude::*;

use crate::blocks::{LumaVector, VECTOR_DIM};

/// Default number of refinement passes.
pub const DEFAULT_STEPS: u32 = 5;
/// Default seed for the codebook initialisation.
pub const DEFAULT_SEED: u32 = 1;

/// A codebook-learning service.
pub trait Quantizer {
    /// Learn `codebook.len()` centroids from `vectors`.
    ///
    /// On return `assignment[i]` is the index of the centroid chosen for
    /// `vectors[i]`. Returns the total squared error of that assignment.
    ///
    /// `assignment` has the same length as `vectors` and `codebook` holds at
    /// most 256 entries.
    fn learn_codebook(
        &mut self,
        vectors: &[LumaVector],
        codebook: &mut [LumaVector],
        assignment: &mut [u8],
    ) -> u64;
}

/// Squared euclidean distance between two vectors.
#[inline]
pub fn distance(a: &LumaVector, b: &LumaVector) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x as i32 - y as i32;
            (d * d) as u32
        })
        .sum()
}

/// Index and distance of the centroid nearest to `vector`.
pub fn nearest(codebook: &[LumaVector], vector: &LumaVector) -> (usize, u32) {
    let mut best = 0;
    let mut best_dist = u32::MAX;
    for (i, centroid) in codebook.iter().enumerate() {
        let dist = distance(centroid, vector);
        if dist < best_dist {
            best = i;
            best_dist = dist;
            if dist == 0 {
                break;
            }
        }
    }
    (best, best_dist)
}

/// Running sum of the vectors assigned to one centroid.
#[derive(Clone)]
struct CentroidSum {
    sum: [u64; VECTOR_DIM],
    count: u64,
}

impl CentroidSum {
    fn zero() -> Self {
        Self {
            sum: [0; VECTOR_DIM],
            count: 0,
        }
    }

    fn add(&mut self, vector: &LumaVector) {
        for (s, &v) in self.sum.iter_mut().zip(vector.iter()) {
            *s += v as u64;
        }
        self.count += 1;
    }

    /// Rounded mean, or `None` for an empty cell.
    fn centroid(&self) -> Option<LumaVector> {
        if self.count == 0 {
            return None;
        }
        let mut out = [0u8; VECTOR_DIM];
        for (o, &s) in out.iter_mut().zip(self.sum.iter()) {
            *o = ((s + self.count / 2) / self.count) as u8;
        }
        Some(out)
    }
}

/// xorshift32 generator for reproducible seeding.
#[derive(Debug, Clone)]
struct Rng {
    state: u32,
}

impl Rng {
    fn new(seed: u32) -> Self {
        // xorshift never leaves zero
        Self {
            state: if seed == 0 { 0x1234_5678 } else { seed },
        }
    }

    fn next(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    fn below(&mut self, bound: usize) -> usize {
        (self.next() as u64 * bound as u64 >> 32) as usize
    }
}

/// Lloyd/LBG codebook training.
///
/// The generator state carries over between batches, so a stream is
/// reproducible for a given seed.
#[derive(Debug, Clone)]
pub struct LbgQuantizer {
    steps: u32,
    rng: Rng,
}

impl LbgQuantizer {
    pub fn new(steps: u32, seed: u32) -> Self {
        Self {
            steps: steps.max(1),
            rng: Rng::new(seed),
        }
    }

    fn seed_codebook(&mut self, vectors: &[LumaVector], codebook: &mut [LumaVector]) {
        if vectors.len() <= codebook.len() {
            for (i, centroid) in codebook.iter_mut().enumerate() {
                *centroid = vectors[i % vectors.len()];
            }
            return;
        }
        for centroid in codebook.iter_mut() {
            *centroid = vectors[self.rng.below(vectors.len())];
        }
    }
}

impl Default for LbgQuantizer {
    fn default() -> Self {
        Self::new(DEFAULT_STEPS, DEFAULT_SEED)
    }
}

/// Assign every vector to its nearest centroid, in parallel.
fn assign(
    vectors: &[LumaVector],
    codebook: &[LumaVector],
    assignment: &mut [u8],
    errors: &mut [u32],
) -> u64 {
    assignment
        .par_iter_mut()
        .zip(errors.par_iter_mut())
        .zip(vectors.par_iter())
        .map(|((slot, err), vector)| {
            let (index, dist) = nearest(codebook, vector);
            *slot = index as u8;
            *err = dist;
            dist as u64
        })
        .sum()
}

impl Quantizer for LbgQuantizer {
    fn learn_codebook(
        &mut self,
        vectors: &[LumaVector],
        codebook: &mut [LumaVector],
        assignment: &mut [u8],
    ) -> u64 {
        if vectors.is_empty() || codebook.is_empty() {
            codebook.fill([0; VECTOR_DIM]);
            return 0;
        }
        debug_assert!(codebook.len() <= 256);
        debug_assert_eq!(vectors.len(), assignment.len());

        self.seed_codebook(vectors, codebook);
        let mut errors = vec![0u32; vectors.len()];
        let mut sums = vec![CentroidSum::zero(); codebook.len()];

        for step in 0..self.steps {
            let distortion = assign(vectors, codebook, assignment, &mut errors);
            log::debug!("LBG step {}: distortion {}", step, distortion);

            sums.fill(CentroidSum::zero());
            for (vector, &index) in vectors.iter().zip(assignment.iter()) {
                sums[index as usize].add(vector);
            }

            // Worst represented vectors first, used to re-seed empty cells
            let mut worst: Vec<usize> = Vec::new();
            let mut reseeded = 0;
            for (i, sum) in sums.iter().enumerate() {
                match sum.centroid() {
                    Some(centroid) => codebook[i] = centroid,
                    None => {
                        if worst.is_empty() {
                            worst = (0..vectors.len()).collect();
                            worst.sort_unstable_by(|&a, &b| errors[b].cmp(&errors[a]));
                        }
                        if let Some(&candidate) = worst.get(reseeded) {
                            codebook[i] = vectors[candidate];
                        }
                        reseeded += 1;
                    }
                }
            }
            if reseeded > 0 {
                log::debug!("LBG step {}: re-seeded {} empty cell(s)", step, reseeded);
            }
        }

        assign(vectors, codebook, assignment, &mut errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(v: u8) -> LumaVector {
        [v; VECTOR_DIM]
    }

    #[test]
    fn test_distance() {
        assert_eq!(distance(&solid(0), &solid(0)), 0);
        assert_eq!(distance(&solid(0), &solid(2)), 4 * 32);
    }

    #[test]
    fn test_nearest_prefers_first_on_tie() {
        let codebook = [solid(10), solid(30), solid(10)];
        assert_eq!(nearest(&codebook, &solid(12)).0, 0);
        assert_eq!(nearest(&codebook, &solid(25)).0, 1);
    }

    #[test]
    fn test_rng_is_deterministic() {
        let mut a = Rng::new(1);
        let mut b = Rng::new(1);
        for _ in 0..100 {
            assert_eq!(a.next(), b.next());
        }
        let mut r = Rng::new(7);
        assert!((0..1000).all(|_| r.below(10) < 10));
    }

    #[test]
    fn test_two_clusters_are_separated() {
        let vectors: Vec<LumaVector> = (0..200)
            .map(|i| if i % 2 == 0 { solid(20) } else { solid(220) })
            .collect();
        let mut codebook = vec![[0u8; VECTOR_DIM]; 2];
        let mut assignment = vec![0u8; vectors.len()];

        let distortion =
            LbgQuantizer::default().learn_codebook(&vectors, &mut codebook, &mut assignment);

        assert_eq!(distortion, 0);
        assert_ne!(assignment[0], assignment[1]);
        for (vector, &index) in vectors.iter().zip(assignment.iter()) {
            assert_eq!(&codebook[index as usize], vector);
        }
    }

    #[test]
    fn test_assignment_points_to_nearest() {
        let vectors: Vec<LumaVector> = (0..1000).map(|i| solid((i * 7 % 256) as u8)).collect();
        let mut codebook = vec![[0u8; VECTOR_DIM]; 256];
        let mut assignment = vec![0u8; vectors.len()];
        LbgQuantizer::new(3, 42).learn_codebook(&vectors, &mut codebook, &mut assignment);

        for (vector, &index) in vectors.iter().zip(assignment.iter()) {
            let (best, best_dist) = nearest(&codebook, vector);
            assert_eq!(distance(&codebook[index as usize], vector), best_dist);
            assert!(best <= 255);
        }
    }

    #[test]
    fn test_fewer_vectors_than_codebook() {
        let vectors = vec![solid(1), solid(2), solid(3)];
        let mut codebook = vec![[0u8; VECTOR_DIM]; 256];
        let mut assignment = vec![0u8; 3];
        let distortion =
            LbgQuantizer::default().learn_codebook(&vectors, &mut codebook, &mut assignment);
        assert_eq!(distortion, 0);
    }

    #[test]
    fn test_same_seed_same_codebook() {
        let vectors: Vec<LumaVector> = (0..500)
            .map(|i| {
                let mut v = [0u8; VECTOR_DIM];
                for (j, s) in v.iter_mut().enumerate() {
                    *s = ((i * 13 + j * 29) % 256) as u8;
                }
                v
            })
            .collect();
        let run = || {
            let mut codebook = vec![[0u8; VECTOR_DIM]; 16];
            let mut assignment = vec![0u8; vectors.len()];
            LbgQuantizer::new(4, 9).learn_codebook(&vectors, &mut codebook, &mut assignment);
            (codebook, assignment)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_empty_input() {
        let mut codebook = vec![solid(5); 4];
        let distortion = LbgQuantizer::default().learn_codebook(&[], &mut codebook, &mut []);
        assert_eq!(distortion, 0);
        assert!(codebook.iter().all(|c| c == &solid(0)));
    }
}
