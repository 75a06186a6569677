// BSD 3-Clause License
//
// Copyright (c) 2025, BlackPortal ○
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this
//    list of conditions and the following disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice,
//    this list of conditions and the following disclaimer in the documentation
//    and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its
//    contributors may be used to endorse or promote products derived from
//    this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
// AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
// FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
// DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
// CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
// OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::ops::AddAssign;
use std::str::FromStr;

use ndarray::{Array1, Array2, ArrayView1};
use num_traits::{Float, FromPrimitive};

use super::Classifier;
use crate::error::ModelError;

/// How the `k` nearest neighbors are weighted when they vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightFunction {
    /// Every neighbor counts once.
    Rectangular,
    /// Neighbors count `1 / distance`; exact matches outvote everything else.
    #[default]
    Inverse,
    /// `1 - d / d_max`, where `d_max` is the distance to the (k+1)-th neighbor.
    Triangular,
    /// `exp(-(d / d_max)^2 / 2)`, with `d_max` as for `Triangular`.
    Gaussian,
}

impl WeightFunction {
    pub fn name(&self) -> &'static str {
        match self {
            WeightFunction::Rectangular => "rectangular",
            WeightFunction::Inverse => "inverse",
            WeightFunction::Triangular => "triangular",
            WeightFunction::Gaussian => "gaussian",
        }
    }
}

impl FromStr for WeightFunction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rectangular" | "uniform" => Ok(WeightFunction::Rectangular),
            "inverse" => Ok(WeightFunction::Inverse),
            "triangular" => Ok(WeightFunction::Triangular),
            "gaussian" => Ok(WeightFunction::Gaussian),
            other => Err(format!("unknown weight function '{}'", other)),
        }
    }
}

/// A struct for performing K-Nearest Neighbors classification.
///
/// This implementation uses the Euclidean distance metric to find the `k` nearest neighbors
/// of every query row and lets them vote, weighted by a [`WeightFunction`].
#[derive(Debug, Clone)]
pub struct KNearestNeighbors<T>
where
    T: Float,
{
    k: usize,
    weight: WeightFunction,
    x_train: Option<Array2<T>>,
    y_train: Option<Array1<usize>>,
    n_classes: usize,
}

impl<T> KNearestNeighbors<T>
where
    T: Float + FromPrimitive + AddAssign + Debug,
{
    /// Creates a new `KNearestNeighbors` instance using inverse-distance weighting.
    ///
    /// # Arguments
    /// - `k`: The number of neighbors to consider.
    pub fn new(k: usize) -> Self {
        KNearestNeighbors {
            k,
            weight: WeightFunction::default(),
            x_train: None,
            y_train: None,
            n_classes: 0,
        }
    }

    pub fn with_weight(mut self, weight: WeightFunction) -> Self {
        self.weight = weight;
        self
    }

    /// Fixes the number of classes so `predict_proba` keeps one column per
    /// class even when the highest class is absent from the training rows.
    pub fn with_n_classes(mut self, n_classes: usize) -> Self {
        self.n_classes = n_classes;
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn weight(&self) -> WeightFunction {
        self.weight
    }

    fn training_data(&self) -> Result<(&Array2<T>, &Array1<usize>), ModelError> {
        match (self.x_train.as_ref(), self.y_train.as_ref()) {
            (Some(x), Some(y)) => Ok((x, y)),
            _ => Err(ModelError::NotFitted),
        }
    }

    /// Calculates the Euclidean distance of elements between a provided sample, `x`, and
    /// the training data.
    ///
    /// # Arguments
    /// - `x`: A 2D array of input features (`Array2<T>`), where each row represents a sample.
    ///
    /// # Returns
    /// A 2D array of shape `(x.nrows(), n_train)` holding every query-to-training distance.
    pub fn calculate_distances(&self, x: &Array2<T>) -> Result<Array2<T>, ModelError> {
        let (x_train, _) = self.training_data()?;
        let n_samples = x_train.nrows();
        let n_features = x_train.ncols();
        if x.ncols() != n_features {
            return Err(ModelError::ShapeMismatch { expected: n_features, actual: x.ncols() });
        }
        let n_test_samples = x.nrows();

        let mut distances = Array2::zeros((n_test_samples, n_samples));

        for i in 0..n_test_samples {
            for j in 0..n_samples {
                let mut dist = T::zero();
                for k in 0..n_features {
                    dist += (x[[i, k]] - x_train[[j, k]]).powi(2);
                }
                distances[[i, j]] = dist.sqrt();
            }
        }
        Ok(distances)
    }

    /// Returns the nearest training rows for one query, closest first, paired
    /// with their voting weight.
    fn weighted_neighbors(&self, distances: ArrayView1<T>) -> Vec<(usize, T)> {
        let mut order: Vec<usize> = (0..distances.len()).collect();
        // Stable sort: equidistant rows keep training order.
        order.sort_by(|&a, &b| distances[a].partial_cmp(&distances[b]).unwrap_or(Ordering::Equal));

        let k = self.k.min(order.len());
        let nearest = &order[..k];

        let mut weights: Vec<T> = match self.weight {
            WeightFunction::Rectangular => vec![T::one(); k],
            WeightFunction::Inverse => {
                if nearest.iter().any(|&j| distances[j] == T::zero()) {
                    nearest
                        .iter()
                        .map(|&j| if distances[j] == T::zero() { T::one() } else { T::zero() })
                        .collect()
                } else {
                    nearest.iter().map(|&j| T::one() / distances[j]).collect()
                }
            }
            WeightFunction::Triangular | WeightFunction::Gaussian => {
                let d_max = order.get(k).or(order.get(k.saturating_sub(1))).map(|&j| distances[j]);
                let d_max = d_max.unwrap_or_else(T::zero);
                nearest
                    .iter()
                    .map(|&j| {
                        if d_max == T::zero() {
                            return T::one();
                        }
                        let u = distances[j] / d_max;
                        match self.weight {
                            WeightFunction::Triangular => (T::one() - u).max(T::zero()),
                            _ => {
                                let half = T::from_f64(0.5).unwrap_or_else(T::one);
                                (-(u * u) * half).exp()
                            }
                        }
                    })
                    .collect()
            }
        };

        // A kernel can zero out every neighbor; fall back to a plain vote.
        if weights.iter().all(|&w| w == T::zero()) {
            weights = vec![T::one(); k];
        }

        nearest.iter().copied().zip(weights).collect()
    }

    fn class_weights(&self, neighbors: &[(usize, T)], y_train: &Array1<usize>) -> Vec<T> {
        let mut votes = vec![T::zero(); self.n_classes];
        for &(j, w) in neighbors {
            votes[y_train[j]] += w;
        }
        votes
    }

    /// Returns the normalised vote share of every class for every query row,
    /// shaped `(x.nrows(), n_classes)`.
    pub fn predict_proba(&self, x: &Array2<T>) -> Result<Array2<T>, ModelError> {
        let (_, y_train) = self.training_data()?;
        let distances = self.calculate_distances(x)?;
        let mut proba = Array2::zeros((x.nrows(), self.n_classes));

        for (i, row) in distances.rows().into_iter().enumerate() {
            let neighbors = self.weighted_neighbors(row);
            let votes = self.class_weights(&neighbors, y_train);
            let total = votes.iter().fold(T::zero(), |acc, &v| acc + v);
            for (c, v) in votes.into_iter().enumerate() {
                proba[[i, c]] = v / total;
            }
        }
        Ok(proba)
    }
}

impl<T> Classifier<T> for KNearestNeighbors<T>
where
    T: Float + FromPrimitive + AddAssign + Debug,
{
    /// Stores the training data; all work happens at prediction time.
    fn fit(&mut self, x: &Array2<T>, y: &Array1<usize>) -> Result<(), ModelError> {
        if self.k == 0 {
            return Err(ModelError::InvalidK);
        }
        if x.nrows() != y.len() {
            return Err(ModelError::LengthMismatch { rows: x.nrows(), targets: y.len() });
        }
        if x.nrows() == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        self.n_classes = self.n_classes.max(y.iter().max().map_or(0, |&m| m + 1));
        self.x_train = Some(x.clone());
        self.y_train = Some(y.clone());
        Ok(())
    }

    /// Predicts the class of every sample by a weighted vote of its `k` nearest
    /// training rows.
    ///
    /// Ties between classes go to the tied class whose member is nearest to the
    /// query.
    fn predict(&self, x: &Array2<T>) -> Result<Array1<usize>, ModelError> {
        let (_, y_train) = self.training_data()?;
        let distances = self.calculate_distances(x)?;
        let mut y_pred = Array1::zeros(x.nrows());

        for (i, row) in distances.rows().into_iter().enumerate() {
            let neighbors = self.weighted_neighbors(row);
            let votes = self.class_weights(&neighbors, y_train);
            let best = votes.iter().copied().fold(T::neg_infinity(), T::max);
            y_pred[i] = neighbors
                .iter()
                .map(|&(j, _)| y_train[j])
                .find(|&class| votes[class] == best)
                .unwrap_or(0);
        }

        Ok(y_pred)
    }
}
