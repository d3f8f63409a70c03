//! Soft Cosine Measure support.
//!
//! The SCM generalizes cosine similarity through a token-similarity matrix
//! `S`: `scm(u, v) = uᵀSv / (‖u‖_S · ‖v‖_S)` with `‖v‖_S = sqrt(vᵀSv)`.
//! When `S` is absent the identity is implied and everything collapses to
//! set intersection over the sparse index representation, which is the fast
//! path the scorer and threshold calculator both take.
//!
//! The matrix can be fitted from a pair of pre-matched datasets: index
//! co-occurrence frequencies of true matches against jumbled non-matches,
//! log-ratioed and projected back onto the positive semi-definite cone so
//! norms stay real.

use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::EmbedderError;

/// Dense symmetric token-similarity matrix for the Soft Cosine Measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScmMatrix {
    matrix: Array2<f32>,
}

impl ScmMatrix {
    /// The identity matrix of the given size; SCM over it is plain cosine.
    pub fn identity(m: usize) -> Self {
        Self {
            matrix: Array2::eye(m),
        }
    }

    /// Wrap a caller-supplied matrix, enforcing shape and symmetry.
    pub fn from_matrix(matrix: Array2<f32>, m: usize) -> Result<Self, EmbedderError> {
        let (rows, cols) = matrix.dim();
        if rows != m || cols != m {
            return Err(EmbedderError::ScmShape {
                rows,
                cols,
                expected: m,
            });
        }
        for i in 0..m {
            for j in (i + 1)..m {
                if (matrix[[i, j]] - matrix[[j, i]]).abs() > 1e-4 {
                    return Err(EmbedderError::ScmNotSymmetric { row: i, col: j });
                }
            }
        }
        Ok(Self { matrix })
    }

    /// Matrix dimension.
    pub fn size(&self) -> usize {
        self.matrix.dim().0
    }

    pub fn as_array(&self) -> &Array2<f32> {
        &self.matrix
    }

    /// Sparse quadratic form `Σ S[i, j]` over `a × b`.
    pub fn quadratic_form(&self, a: &[u32], b: &[u32]) -> f64 {
        let mut sum = 0.0f64;
        for &i in a {
            for &j in b {
                sum += self.matrix[[i as usize, j as usize]] as f64;
            }
        }
        sum
    }

    /// SCM self-norm `sqrt(vᵀSv)` of a sparse binary vector.
    ///
    /// Clamped at zero before the root so numerically-negative quadratic
    /// forms cannot surface as NaN.
    pub fn self_norm(&self, indices: &[u32]) -> f64 {
        self.quadratic_form(indices, indices).max(0.0).sqrt()
    }
}

/// `|a ∩ b|` over two sorted index slices.
pub fn intersection_size(a: &[u32], b: &[u32]) -> usize {
    let (mut i, mut j, mut n) = (0usize, 0usize, 0usize);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                n += 1;
                i += 1;
                j += 1;
            }
        }
    }
    n
}

/// Identity-case self-norm `sqrt(|indices|)`.
pub fn identity_norm(indices: &[u32]) -> f64 {
    (indices.len() as f64).sqrt()
}

/// SCM similarity between two embedded records given their precomputed
/// norms. Returns 0 for empty records and clips to `[0, 1]` to absorb
/// floating-point error at the boundary.
pub fn similarity(
    a_indices: &[u32],
    a_norm: f64,
    b_indices: &[u32],
    b_norm: f64,
    scm: Option<&ScmMatrix>,
) -> f64 {
    if a_norm <= 0.0 || b_norm <= 0.0 {
        return 0.0;
    }
    let dot = match scm {
        None => intersection_size(a_indices, b_indices) as f64,
        Some(scm) => scm.quadratic_form(a_indices, b_indices),
    };
    (dot / (a_norm * b_norm)).clamp(0.0, 1.0)
}

/// Joint index co-occurrence frequency matrix over paired rows,
/// symmetrized.
pub(crate) fn joint_frequency(x: &[Vec<u32>], y: &[Vec<u32>], m: usize) -> Array2<f32> {
    let mut counts = Array2::<f32>::zeros((m, m));
    for (a, b) in x.iter().zip(y.iter()) {
        for &i in a {
            for &j in b {
                counts[[i as usize, j as usize]] += 1.0;
            }
        }
    }
    let transposed = counts.t().to_owned();
    (counts + transposed) / 2.0
}

/// Deterministically jumble the right-hand rows to build the non-match
/// frequency baseline.
pub(crate) fn jumble<T: Clone>(rows: &[T], seed: u64) -> Vec<T> {
    let mut shuffled: Vec<T> = rows.to_vec();
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    shuffled.shuffle(&mut rng);
    shuffled
}

/// Project a symmetric matrix onto the positive semi-definite cone by
/// clamping negative eigenvalues to `eps`.
///
/// Uses a cyclic Jacobi eigendecomposition, which is exact enough for the
/// moderate filter sizes this matrix is trained at and keeps the crate free
/// of a LAPACK binding.
pub(crate) fn nearest_positive_semi_definite(matrix: &Array2<f64>, eps: f64) -> Array2<f64> {
    let n = matrix.dim().0;
    // Symmetrize first; Jacobi assumes it.
    let mut a = (matrix + &matrix.t().to_owned()) / 2.0;
    let mut v = Array2::<f64>::eye(n);

    const MAX_SWEEPS: usize = 64;
    const TOL: f64 = 1e-10;

    for _ in 0..MAX_SWEEPS {
        let mut off = 0.0f64;
        for p in 0..n {
            for q in (p + 1)..n {
                off += a[[p, q]] * a[[p, q]];
            }
        }
        if off.sqrt() < TOL {
            break;
        }
        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq.abs() < TOL {
                    continue;
                }
                let app = a[[p, p]];
                let aqq = a[[q, q]];
                let theta = (aqq - app) / (2.0 * apq);
                let t = if theta >= 0.0 {
                    1.0 / (theta + (1.0 + theta * theta).sqrt())
                } else {
                    -1.0 / (-theta + (1.0 + theta * theta).sqrt())
                };
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    // Reconstruct with clamped eigenvalues: V · diag(max(λ, eps)) · Vᵀ.
    let mut scaled = Array2::<f64>::zeros((n, n));
    for col in 0..n {
        let lambda = a[[col, col]].max(eps);
        for row in 0..n {
            scaled[[row, col]] = v[[row, col]] * lambda;
        }
    }
    let reconstructed = scaled.dot(&v.t());
    (&reconstructed + &reconstructed.t().to_owned()) / 2.0
}
