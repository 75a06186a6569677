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

use std::ops::RangeInclusive;
use std::path::PathBuf;

use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::classical::{Classifier, ScaledKnn, WeightFunction};
use crate::data::{DataLoader, WineCsvLoader};
use crate::error::{PipelineError, Result};
use crate::metrics::{ConfusionMatrix, accuracy};
use crate::report::ReportWriter;
use crate::split::{DEFAULT_FOLDS, DEFAULT_TRAIN_FRACTION, stratified_split};
use crate::tuning::{CvMetric, DEFAULT_NEIGHBORS, GridSearch};

pub const DEFAULT_FILE_NAME: &str = "wine.csv";
pub const DEFAULT_TARGET_COLUMN: &str = "class";
pub const DEFAULT_SEED: u64 = 2024;

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    data_dir: PathBuf,
    output_dir: PathBuf,
    file_name: String,
    target_column: String,
    train_fraction: f64,
    n_folds: usize,
    neighbors: RangeInclusive<usize>,
    weight: WeightFunction,
    seed: u64,
}

impl PipelineConfig {
    pub fn new(data_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        PipelineConfig {
            data_dir: data_dir.into(),
            output_dir: output_dir.into(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            train_fraction: DEFAULT_TRAIN_FRACTION,
            n_folds: DEFAULT_FOLDS,
            neighbors: DEFAULT_NEIGHBORS,
            weight: WeightFunction::default(),
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn with_target_column(mut self, target_column: impl Into<String>) -> Self {
        self.target_column = target_column.into();
        self
    }

    pub fn with_train_fraction(mut self, train_fraction: f64) -> Self {
        self.train_fraction = train_fraction;
        self
    }

    pub fn with_folds(mut self, n_folds: usize) -> Self {
        self.n_folds = n_folds;
        self
    }

    pub fn with_neighbors(mut self, neighbors: RangeInclusive<usize>) -> Self {
        self.neighbors = neighbors;
        self
    }

    pub fn with_weight(mut self, weight: WeightFunction) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn data_path(&self) -> PathBuf {
        self.data_dir.join(&self.file_name)
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    fn validate(&self) -> Result<()> {
        if *self.neighbors.start() == 0 {
            return Err(PipelineError::Config("neighbor grid must start at 1 or above".to_string()));
        }
        if !self.data_dir.is_dir() {
            return Err(PipelineError::Config(format!(
                "data directory {:?} does not exist",
                self.data_dir
            )));
        }
        Ok(())
    }
}

/// What one run produced.
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub n_train: usize,
    pub n_test: usize,
    pub best: CvMetric,
    pub cv_metrics: Vec<CvMetric>,
    pub test_accuracy: f64,
    pub confusion: ConfusionMatrix,
    pub class_names: Vec<String>,
    pub artifacts: Vec<PathBuf>,
}

/// Runs the whole analysis: load, split, tune, refit, evaluate, report.
pub fn run(config: &PipelineConfig) -> Result<PipelineSummary> {
    info!("Starting wine KNN pipeline with config: {:?}", config);
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let data_path = config.data_path();
    let dataset = WineCsvLoader::new(config.target_column.as_str()).load(&data_path)?;
    info!(
        "Loaded {} rows with {} features and classes {:?}",
        dataset.n_rows(),
        dataset.n_features(),
        dataset.class_names
    );

    let split = stratified_split(&dataset.targets, config.train_fraction, &mut rng)?;
    let train = dataset.select(&split.train);
    let test = dataset.select(&split.test);
    info!("Split data: train_size={}, test_size={}", train.n_rows(), test.n_rows());
    debug!(
        "Train class counts {:?}, test class counts {:?}",
        train.class_counts(),
        test.class_counts()
    );

    let results = GridSearch::new()
        .with_neighbors(config.neighbors.clone())
        .with_folds(config.n_folds)
        .with_weight(config.weight)
        .run(&train, &mut rng)?;
    let best = results.select_best()?.clone();
    info!("Selected k={} (mean CV accuracy {:.4})", best.neighbors, best.mean);

    let mut model =
        ScaledKnn::new(best.neighbors, config.weight).with_n_classes(dataset.n_classes());
    model.fit(&train.features, &train.targets)?;
    let predicted = model.predict(&test.features)?;
    let test_accuracy = accuracy(&test.targets, &predicted)?;
    let confusion = ConfusionMatrix::new(&test.targets, &predicted, dataset.n_classes())?;
    info!("Test accuracy: {:.4}", test_accuracy);

    let writer = ReportWriter::create(&config.output_dir)?;
    let artifacts = vec![
        writer.write_accuracy_plot(results.metrics(), &best)?,
        writer.write_test_accuracy(test_accuracy, dataset.n_classes())?,
        writer.write_confusion_matrix(&confusion, &dataset.class_names)?,
        writer.write_cv_metrics(results.metrics(), &best)?,
    ];

    info!("Pipeline completed successfully");
    Ok(PipelineSummary {
        n_train: train.n_rows(),
        n_test: test.n_rows(),
        best,
        cv_metrics: results.metrics().to_vec(),
        test_accuracy,
        confusion,
        class_names: dataset.class_names,
        artifacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_defaults() {
        let config = PipelineConfig::new("data", "out");
        assert_eq!(config.data_path(), PathBuf::from("data").join("wine.csv"));
        assert_eq!(config.neighbors, 1..=20);
        assert_eq!(config.n_folds, 5);
        assert_eq!(config.weight, WeightFunction::Inverse);
        assert!((config.train_fraction - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_data_dir() {
        let out = tempdir().unwrap();
        let config = PipelineConfig::new("/nonexistent/wine/data", out.path());
        assert!(matches!(run(&config), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_missing_data_file() {
        let data = tempdir().unwrap();
        let out = tempdir().unwrap();
        let config = PipelineConfig::new(data.path(), out.path());
        assert!(matches!(run(&config), Err(PipelineError::Csv(_))));
    }

    #[test]
    fn test_zero_neighbors_rejected() {
        let data = tempdir().unwrap();
        let out = tempdir().unwrap();
        let config = PipelineConfig::new(data.path(), out.path()).with_neighbors(0..=3);
        assert!(matches!(run(&config), Err(PipelineError::Config(_))));
    }
}
