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

//! Cross-validated grid search over the number of neighbors.

use std::ops::RangeInclusive;

use log::{debug, info};
use rand::Rng;
use serde::Serialize;

use crate::classical::{Classifier, ScaledKnn, WeightFunction};
use crate::data::Dataset;
use crate::error::TuneError;
use crate::metrics::accuracy;
use crate::split::{DEFAULT_FOLDS, StratifiedKFold};

pub const DEFAULT_NEIGHBORS: RangeInclusive<usize> = 1..=20;

/// Cross-validated accuracy of one candidate neighbor count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CvMetric {
    pub neighbors: usize,
    pub mean: f64,
    pub std_err: f64,
    pub n: usize,
}

impl CvMetric {
    fn from_scores(neighbors: usize, scores: &[f64]) -> Self {
        let n = scores.len();
        let mean = scores.iter().sum::<f64>() / n as f64;
        let std_err = if n > 1 {
            let var = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            (var / n as f64).sqrt()
        } else {
            0.0
        };
        CvMetric { neighbors, mean, std_err, n }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TuneResults {
    metrics: Vec<CvMetric>,
}

impl TuneResults {
    pub fn new(metrics: Vec<CvMetric>) -> Self {
        TuneResults { metrics }
    }

    pub fn metrics(&self) -> &[CvMetric] {
        &self.metrics
    }

    /// The candidate with the highest mean accuracy; ties go to the fewest neighbors.
    pub fn select_best(&self) -> Result<&CvMetric, TuneError> {
        let mut best: Option<&CvMetric> = None;
        for metric in &self.metrics {
            best = match best {
                Some(b) if metric.mean > b.mean => Some(metric),
                Some(b) if metric.mean == b.mean && metric.neighbors < b.neighbors => Some(metric),
                Some(b) => Some(b),
                None => Some(metric),
            };
        }
        best.ok_or(TuneError::EmptyGrid)
    }
}

/// Grid search over `neighbors`, scored by stratified k-fold accuracy.
#[derive(Debug, Clone)]
pub struct GridSearch {
    neighbors: RangeInclusive<usize>,
    n_folds: usize,
    weight: WeightFunction,
}

impl GridSearch {
    pub fn new() -> Self {
        GridSearch {
            neighbors: DEFAULT_NEIGHBORS,
            n_folds: DEFAULT_FOLDS,
            weight: WeightFunction::default(),
        }
    }

    pub fn with_neighbors(mut self, neighbors: RangeInclusive<usize>) -> Self {
        self.neighbors = neighbors;
        self
    }

    pub fn with_folds(mut self, n_folds: usize) -> Self {
        self.n_folds = n_folds;
        self
    }

    pub fn with_weight(mut self, weight: WeightFunction) -> Self {
        self.weight = weight;
        self
    }

    /// Scores every candidate on the same set of folds.
    pub fn run<R: Rng + ?Sized>(
        &self,
        dataset: &Dataset,
        rng: &mut R,
    ) -> Result<TuneResults, TuneError> {
        if self.neighbors.is_empty() {
            return Err(TuneError::EmptyGrid);
        }
        let folds = StratifiedKFold::new(self.n_folds).folds(&dataset.targets, rng)?;
        let resamples: Vec<(Dataset, Dataset)> = folds
            .iter()
            .map(|fold| (dataset.select(&fold.analysis), dataset.select(&fold.assessment)))
            .collect();
        info!(
            "Tuning neighbors {}..={} over {} folds ({} weighting)",
            self.neighbors.start(),
            self.neighbors.end(),
            resamples.len(),
            self.weight.name()
        );

        let mut metrics = Vec::new();
        for k in self.neighbors.clone() {
            let mut scores = Vec::with_capacity(resamples.len());
            for (fold, (analysis, assessment)) in resamples.iter().enumerate() {
                let mut model =
                    ScaledKnn::new(k, self.weight).with_n_classes(dataset.n_classes());
                model
                    .fit(&analysis.features, &analysis.targets)
                    .map_err(|source| TuneError::Fit { k, fold: fold + 1, source })?;
                let predicted = model
                    .predict(&assessment.features)
                    .map_err(|source| TuneError::Fit { k, fold: fold + 1, source })?;
                let score = accuracy(&assessment.targets, &predicted)?;
                debug!("k={} fold {}: accuracy {:.4}", k, fold + 1, score);
                scores.push(score);
            }
            let metric = CvMetric::from_scores(k, &scores);
            debug!("k={}: mean accuracy {:.4} (se {:.4})", k, metric.mean, metric.std_err);
            metrics.push(metric);
        }

        Ok(TuneResults::new(metrics))
    }
}

impl Default for GridSearch {
    fn default() -> Self {
        GridSearch::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn metric(neighbors: usize, mean: f64) -> CvMetric {
        CvMetric { neighbors, mean, std_err: 0.0, n: 5 }
    }

    /// Three well separated clusters along the diagonal.
    fn clusters(per_class: usize) -> Dataset {
        let mut features = Vec::new();
        let mut targets = Vec::new();
        for class in 0..3 {
            for i in 0..per_class {
                let offset = (i % 5) as f64 * 0.1;
                features.push(class as f64 * 10.0 + offset);
                features.push(class as f64 * 10.0 - offset);
                targets.push(class);
            }
        }
        Dataset {
            features: Array2::from_shape_vec((3 * per_class, 2), features).unwrap(),
            targets: Array1::from_vec(targets),
            feature_names: vec!["a".to_string(), "b".to_string()],
            class_names: vec!["1".to_string(), "2".to_string(), "3".to_string()],
        }
    }

    #[test]
    fn test_cv_metric_statistics() {
        let m = CvMetric::from_scores(3, &[0.5, 1.0]);
        assert_eq!(m.n, 2);
        assert!((m.mean - 0.75).abs() < 1e-12);
        // sd = sqrt(0.125), se = sd / sqrt(2) = 0.25
        assert!((m.std_err - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_select_best_prefers_smallest_k_on_ties() {
        let results = TuneResults::new(vec![metric(1, 0.9), metric(2, 0.95), metric(3, 0.95)]);
        assert_eq!(results.select_best().unwrap().neighbors, 2);

        let results = TuneResults::new(vec![metric(5, 0.95), metric(4, 0.95)]);
        assert_eq!(results.select_best().unwrap().neighbors, 4);
    }

    #[test]
    fn test_select_best_on_empty_results() {
        let results = TuneResults::new(Vec::new());
        assert!(matches!(results.select_best(), Err(TuneError::EmptyGrid)));
    }

    #[test]
    fn test_grid_search_scores_every_candidate() {
        let _ =
            env_logger::builder().is_test(true).filter_level(log::LevelFilter::Debug).try_init();

        let dataset = clusters(10);
        let mut rng = StdRng::seed_from_u64(2024);
        let results = GridSearch::new().with_neighbors(1..=6).run(&dataset, &mut rng).unwrap();

        assert_eq!(results.metrics().len(), 6);
        for (m, k) in results.metrics().iter().zip(1..=6) {
            assert_eq!(m.neighbors, k);
            assert_eq!(m.n, 5);
            assert!((m.mean - 1.0).abs() < 1e-12, "k={} mean {}", k, m.mean);
        }
        assert_eq!(results.select_best().unwrap().neighbors, 1);
    }

    #[test]
    fn test_grid_search_empty_grid() {
        let dataset = clusters(5);
        let mut rng = StdRng::seed_from_u64(1);
        #[allow(clippy::reversed_empty_ranges)]
        let result = GridSearch::new().with_neighbors(3..=2).run(&dataset, &mut rng);
        assert!(matches!(result, Err(TuneError::EmptyGrid)));
    }

    #[test]
    fn test_grid_search_too_many_folds() {
        let dataset = clusters(1);
        let mut rng = StdRng::seed_from_u64(1);
        let result = GridSearch::new().with_folds(5).run(&dataset, &mut rng);
        assert!(matches!(result, Err(TuneError::Split(_))));
    }
}
