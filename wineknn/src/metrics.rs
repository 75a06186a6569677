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

use ndarray::{Array1, Array2};

use crate::error::MetricError;

fn check_lengths(truth: &Array1<usize>, predicted: &Array1<usize>) -> Result<(), MetricError> {
    if truth.len() != predicted.len() {
        return Err(MetricError::LengthMismatch { truth: truth.len(), predicted: predicted.len() });
    }
    if truth.is_empty() {
        return Err(MetricError::Empty);
    }
    Ok(())
}

/// Fraction of predictions equal to the truth.
pub fn accuracy(truth: &Array1<usize>, predicted: &Array1<usize>) -> Result<f64, MetricError> {
    check_lengths(truth, predicted)?;
    let correct = truth.iter().zip(predicted.iter()).filter(|(t, p)| t == p).count();
    Ok(correct as f64 / truth.len() as f64)
}

/// One cell of a confusion matrix in long form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfusionCell {
    pub prediction: usize,
    pub truth: usize,
    pub count: usize,
}

/// Counts of predicted classes against true classes, indexed `[prediction, truth]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    counts: Array2<usize>,
}

impl ConfusionMatrix {
    pub fn new(
        truth: &Array1<usize>,
        predicted: &Array1<usize>,
        n_classes: usize,
    ) -> Result<Self, MetricError> {
        check_lengths(truth, predicted)?;
        let mut counts = Array2::zeros((n_classes, n_classes));
        for (&t, &p) in truth.iter().zip(predicted.iter()) {
            let index = t.max(p);
            if index >= n_classes {
                return Err(MetricError::ClassOutOfRange { index, n_classes });
            }
            counts[[p, t]] += 1;
        }
        Ok(ConfusionMatrix { counts })
    }

    pub fn n_classes(&self) -> usize {
        self.counts.nrows()
    }

    pub fn get(&self, prediction: usize, truth: usize) -> usize {
        self.counts[[prediction, truth]]
    }

    pub fn counts(&self) -> &Array2<usize> {
        &self.counts
    }

    pub fn total(&self) -> usize {
        self.counts.sum()
    }

    pub fn correct(&self) -> usize {
        self.counts.diag().sum()
    }

    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.correct() as f64 / total as f64,
        }
    }

    /// Every cell, zero counts included, ordered by prediction then truth.
    pub fn to_long(&self) -> Vec<ConfusionCell> {
        self.counts
            .indexed_iter()
            .map(|((prediction, truth), &count)| ConfusionCell { prediction, truth, count })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_accuracy() {
        let truth = array![0, 1, 2, 1];
        let predicted = array![0, 1, 1, 1];
        assert_eq!(accuracy(&truth, &predicted), Ok(0.75));
    }

    #[test]
    fn test_accuracy_length_mismatch() {
        let result = accuracy(&array![0, 1], &array![0]);
        assert_eq!(result, Err(MetricError::LengthMismatch { truth: 2, predicted: 1 }));
    }

    #[test]
    fn test_accuracy_empty() {
        let empty: Array1<usize> = Array1::zeros(0);
        assert_eq!(accuracy(&empty, &empty), Err(MetricError::Empty));
    }

    #[test]
    fn test_confusion_matrix_counts() {
        let truth = array![0, 0, 1, 1, 2, 2];
        let predicted = array![0, 1, 1, 1, 2, 0];
        let cm = ConfusionMatrix::new(&truth, &predicted, 3).unwrap();

        assert_eq!(cm.get(0, 0), 1);
        assert_eq!(cm.get(1, 0), 1);
        assert_eq!(cm.get(1, 1), 2);
        assert_eq!(cm.get(0, 2), 1);
        assert_eq!(cm.get(2, 2), 1);
        assert_eq!(cm.total(), 6);
        assert_eq!(cm.correct(), 4);
        assert!((cm.accuracy() - accuracy(&truth, &predicted).unwrap()).abs() < 1e-12);
    }

    #[test]
    fn test_confusion_matrix_long_form_includes_zeros() {
        let cm = ConfusionMatrix::new(&array![0, 1], &array![0, 0], 2).unwrap();
        let cells = cm.to_long();

        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0], ConfusionCell { prediction: 0, truth: 0, count: 1 });
        assert_eq!(cells[1], ConfusionCell { prediction: 0, truth: 1, count: 1 });
        assert_eq!(cells[3], ConfusionCell { prediction: 1, truth: 1, count: 0 });
    }

    #[test]
    fn test_confusion_matrix_class_out_of_range() {
        let result = ConfusionMatrix::new(&array![0, 3], &array![0, 1], 2);
        assert_eq!(result, Err(MetricError::ClassOutOfRange { index: 3, n_classes: 2 }));
    }
}
