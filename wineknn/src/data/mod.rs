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

pub mod csv;
pub mod error;

pub use csv::WineCsvLoader;
pub use error::CsvError;

use ndarray::{Array1, Array2, Axis};

/// A labelled table of numeric features.
///
/// `targets[i]` is an index into `class_names`; class names are kept in sorted
/// order so that class indices are stable between runs over the same file.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub features: Array2<f64>,
    pub targets: Array1<usize>,
    pub feature_names: Vec<String>,
    pub class_names: Vec<String>,
}

impl Dataset {
    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn n_classes(&self) -> usize {
        self.class_names.len()
    }

    /// Number of rows per class, indexed by class.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes()];
        for &t in self.targets.iter() {
            counts[t] += 1;
        }
        counts
    }

    /// Returns the rows at `indices`, in the given order.
    pub fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            features: self.features.select(Axis(0), indices),
            targets: self.targets.select(Axis(0), indices),
            feature_names: self.feature_names.clone(),
            class_names: self.class_names.clone(),
        }
    }
}

/// A trait for loading a labelled dataset from a file.
///
/// Implementors read a file from a given path and return a [`Dataset`]. The
/// trait is generic over an associated error type, allowing each implementation
/// to define its own specific errors.
pub trait DataLoader {
    /// Loads a file into a feature matrix and class targets.
    ///
    /// # Parameters
    /// - `path`: The path to the data file, accepting any type that implements `AsRef<Path>`.
    fn load<P: AsRef<std::path::Path>>(&self, path: P) -> Result<Dataset, Self::Error>;

    /// The error type returned by the `load` method.
    type Error: std::error::Error + 'static;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> Dataset {
        Dataset {
            features: array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0], [7.0, 8.0]],
            targets: array![0, 1, 1, 2],
            feature_names: vec!["a".to_string(), "b".to_string()],
            class_names: vec!["x".to_string(), "y".to_string(), "z".to_string()],
        }
    }

    #[test]
    fn test_class_counts() {
        assert_eq!(sample().class_counts(), vec![1, 2, 1]);
    }

    #[test]
    fn test_select_keeps_order_and_names() {
        let subset = sample().select(&[3, 0]);
        assert_eq!(subset.features, array![[7.0, 8.0], [1.0, 2.0]]);
        assert_eq!(subset.targets, array![2, 0]);
        assert_eq!(subset.n_classes(), 3);
        assert_eq!(subset.n_features(), 2);
    }
}
