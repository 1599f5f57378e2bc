//! SMOTE oversampling
//!
//! Synthesizes minority-class rows by interpolating between a minority sample
//! and one of its `k` nearest minority neighbours (Euclidean distance) until
//! both classes have the same count. Synthetic rows are appended after the
//! originals.

use super::ModelError;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct Smote {
    pub k_neighbors: usize,
    pub seed: u64,
}

impl Default for Smote {
    fn default() -> Self {
        Self {
            k_neighbors: 5,
            seed: 42,
        }
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl Smote {
    pub fn new(k_neighbors: usize, seed: u64) -> Self {
        Self { k_neighbors, seed }
    }

    /// Return a class-balanced copy of `(x, y)`. Labels must be 0/1.
    pub fn fit_resample(
        &self,
        x: &[Vec<f64>],
        y: &[f64],
    ) -> Result<(Vec<Vec<f64>>, Vec<f64>), ModelError> {
        super::validate_training_data(x, y)?;

        let up: Vec<usize> = (0..y.len()).filter(|&i| y[i] > 0.5).collect();
        let down: Vec<usize> = (0..y.len()).filter(|&i| y[i] <= 0.5).collect();
        if up.is_empty() || down.is_empty() {
            return Err(ModelError::SingleClass);
        }

        let (minority, minority_label, n_synthetic) = if up.len() < down.len() {
            let diff = down.len() - up.len();
            (up, 1.0, diff)
        } else {
            let diff = up.len() - down.len();
            (down, 0.0, diff)
        };

        let mut out_x = x.to_vec();
        let mut out_y = y.to_vec();
        if n_synthetic == 0 {
            return Ok((out_x, out_y));
        }

        if minority.len() <= self.k_neighbors {
            return Err(ModelError::InsufficientSamples {
                needed: self.k_neighbors + 1,
                got: minority.len(),
            });
        }

        let neighbours: Vec<Vec<usize>> = minority
            .iter()
            .map(|&i| {
                let mut dists: Vec<(f64, usize)> = minority
                    .iter()
                    .filter(|&&j| j != i)
                    .map(|&j| (squared_distance(&x[i], &x[j]), j))
                    .collect();
                dists.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                dists.truncate(self.k_neighbors);
                dists.into_iter().map(|(_, j)| j).collect()
            })
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        for _ in 0..n_synthetic {
            let pick = rng.random_range(0..minority.len());
            let base = &x[minority[pick]];
            let nn = &x[neighbours[pick][rng.random_range(0..self.k_neighbors)]];
            let gap: f64 = rng.random();
            let sample: Vec<f64> = base
                .iter()
                .zip(nn)
                .map(|(b, n)| b + gap * (n - b))
                .collect();
            out_x.push(sample);
            out_y.push(minority_label);
        }

        debug!(
            original = y.len(),
            synthetic = n_synthetic,
            minority_label,
            "SMOTE resampled"
        );

        Ok((out_x, out_y))
    }
}
