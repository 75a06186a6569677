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

use thiserror::Error;

use crate::data::CsvError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    #[error("Split error: {0}")]
    Split(#[from] SplitError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Tuning error: {0}")]
    Tune(#[from] TuneError),

    #[error("Metric error: {0}")]
    Metric(#[from] MetricError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum SplitError {
    #[error("Train fraction must lie strictly between 0 and 1, got {0}")]
    InvalidFraction(f64),

    #[error("Cannot build {folds} folds from {rows} rows")]
    InvalidFolds { folds: usize, rows: usize },

    #[error("Cannot split an empty dataset")]
    Empty,
}

#[derive(Error, Debug, PartialEq)]
pub enum ScalerError {
    #[error("Scaler not fitted")]
    NotFitted,

    #[error("Scaler needs at least two rows to fit, got {0}")]
    TooFewRows(usize),

    #[error("Scaler fitted on {expected} columns, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
}

#[derive(Error, Debug, PartialEq)]
pub enum ModelError {
    #[error("Number of neighbors must be at least 1")]
    InvalidK,

    #[error("Model not fitted")]
    NotFitted,

    #[error("Cannot fit on an empty training set")]
    EmptyTrainingSet,

    #[error("Features have {rows} rows but targets have {targets} entries")]
    LengthMismatch { rows: usize, targets: usize },

    #[error("Model fitted on {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Scaling failed: {0}")]
    Scaler(#[from] ScalerError),
}

#[derive(Error, Debug, PartialEq)]
pub enum MetricError {
    #[error("Truth has {truth} entries but predictions have {predicted}")]
    LengthMismatch { truth: usize, predicted: usize },

    #[error("Cannot score an empty prediction set")]
    Empty,

    #[error("Class index {index} out of range for {n_classes} classes")]
    ClassOutOfRange { index: usize, n_classes: usize },
}

#[derive(Error, Debug)]
pub enum TuneError {
    #[error("Neighbor grid is empty")]
    EmptyGrid,

    #[error("Resampling failed: {0}")]
    Split(#[from] SplitError),

    #[error("Model failed on k={k}, fold {fold}: {source}")]
    Fit { k: usize, fold: usize, source: ModelError },

    #[error("Scoring failed: {0}")]
    Metric(#[from] MetricError),
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write table: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to draw figure: {0}")]
    Plot(String),

    #[error("Expected {expected} class names, got {actual}")]
    ClassNames { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
