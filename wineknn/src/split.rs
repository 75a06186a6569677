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

//! Stratified resampling: the initial train/test split and the k-fold
//! partition used for cross-validation.

use log::{debug, warn};
use ndarray::Array1;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::SplitError;

pub const DEFAULT_TRAIN_FRACTION: f64 = 0.75;
pub const DEFAULT_FOLDS: usize = 5;

/// Row indices of the two sides of an initial split, each sorted ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// One resample: `analysis` rows fit the model, `assessment` rows score it.
#[derive(Debug, Clone, PartialEq)]
pub struct Fold {
    pub analysis: Vec<usize>,
    pub assessment: Vec<usize>,
}

/// Groups row indices by class, preserving row order inside each class.
fn rows_by_class(targets: &Array1<usize>) -> Vec<Vec<usize>> {
    let n_classes = targets.iter().max().map_or(0, |&m| m + 1);
    let mut groups = vec![Vec::new(); n_classes];
    for (row, &class) in targets.iter().enumerate() {
        groups[class].push(row);
    }
    groups
}

/// Splits rows into train and test sets, sampling each class separately so both
/// sides keep the class proportions of the full data.
///
/// Each class contributes `floor(n_c * train_fraction)` rows to the train set,
/// adjusted so that a class with at least two rows lands on both sides.
pub fn stratified_split<R: Rng + ?Sized>(
    targets: &Array1<usize>,
    train_fraction: f64,
    rng: &mut R,
) -> Result<TrainTestSplit, SplitError> {
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(SplitError::InvalidFraction(train_fraction));
    }
    if targets.is_empty() {
        return Err(SplitError::Empty);
    }

    let mut train = Vec::with_capacity(targets.len());
    let mut test = Vec::with_capacity(targets.len());
    for (class, mut rows) in rows_by_class(targets).into_iter().enumerate() {
        if rows.is_empty() {
            continue;
        }
        rows.shuffle(rng);
        let n = rows.len();
        let mut n_train = (n as f64 * train_fraction).floor() as usize;
        if n >= 2 {
            n_train = n_train.clamp(1, n - 1);
        }
        debug!("Class {}: {} train rows, {} test rows", class, n_train, n - n_train);
        train.extend_from_slice(&rows[..n_train]);
        test.extend_from_slice(&rows[n_train..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(TrainTestSplit { train, test })
}

/// Stratified k-fold partitioning.
#[derive(Debug, Clone, Copy)]
pub struct StratifiedKFold {
    n_folds: usize,
}

impl StratifiedKFold {
    pub fn new(n_folds: usize) -> Self {
        StratifiedKFold { n_folds }
    }

    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// Partitions the rows into `n_folds` folds.
    ///
    /// Each class's shuffled rows are dealt across folds in turn, continuing
    /// from where the previous class stopped, so fold sizes never differ by more
    /// than one and every row is assessed exactly once.
    pub fn folds<R: Rng + ?Sized>(
        &self,
        targets: &Array1<usize>,
        rng: &mut R,
    ) -> Result<Vec<Fold>, SplitError> {
        let n_rows = targets.len();
        if self.n_folds < 2 || self.n_folds > n_rows {
            return Err(SplitError::InvalidFolds { folds: self.n_folds, rows: n_rows });
        }

        let mut assessments: Vec<Vec<usize>> = vec![Vec::new(); self.n_folds];
        let mut next = 0;
        for (class, mut rows) in rows_by_class(targets).into_iter().enumerate() {
            if rows.is_empty() {
                continue;
            }
            if rows.len() < self.n_folds {
                warn!(
                    "Class {} has {} rows, fewer than {} folds; some folds will not assess it",
                    class,
                    rows.len(),
                    self.n_folds
                );
            }
            rows.shuffle(rng);
            for row in rows {
                assessments[next].push(row);
                next = (next + 1) % self.n_folds;
            }
        }

        let folds = assessments
            .into_iter()
            .map(|mut assessment| {
                assessment.sort_unstable();
                let analysis =
                    (0..n_rows).filter(|row| assessment.binary_search(row).is_err()).collect();
                Fold { analysis, assessment }
            })
            .collect();
        Ok(folds)
    }
}

impl Default for StratifiedKFold {
    fn default() -> Self {
        StratifiedKFold::new(DEFAULT_FOLDS)
    }
}
