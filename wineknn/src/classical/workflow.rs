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

use super::{Classifier, KNearestNeighbors, WeightFunction};
use crate::error::ModelError;
use crate::scalers::{Scaler, StandardScaler};

/// Standardizes features with statistics from the training rows, then
/// classifies with KNN. Distances are only meaningful on a common scale.
#[derive(Debug, Clone)]
pub struct ScaledKnn {
    scaler: StandardScaler<f64>,
    model: KNearestNeighbors<f64>,
}

impl ScaledKnn {
    pub fn new(k: usize, weight: WeightFunction) -> Self {
        ScaledKnn {
            scaler: StandardScaler::new(),
            model: KNearestNeighbors::new(k).with_weight(weight),
        }
    }

    pub fn with_n_classes(mut self, n_classes: usize) -> Self {
        self.model = self.model.with_n_classes(n_classes);
        self
    }

    pub fn k(&self) -> usize {
        self.model.k()
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        let x = self.scaler.transform(x)?;
        self.model.predict_proba(&x)
    }
}

impl Classifier<f64> for ScaledKnn {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<usize>) -> Result<(), ModelError> {
        let x = self.scaler.fit_transform(x)?;
        self.model.fit(&x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>, ModelError> {
        let x = self.scaler.transform(x)?;
        self.model.predict(&x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_scaling_removes_unit_dominance() {
        // Column 1 is large-valued noise; column 0 separates the classes.
        let x = array![
            [0.0, 1000.0],
            [0.1, 3000.0],
            [0.2, 2000.0],
            [1.0, 2900.0],
            [1.1, 1100.0],
            [0.9, 2100.0],
        ];
        let y = array![0, 0, 0, 1, 1, 1];
        let query = array![[1.0, 1000.0]];

        let mut raw = KNearestNeighbors::new(1);
        raw.fit(&x, &y).unwrap();
        assert_eq!(raw.predict(&query).unwrap(), array![0]);

        let mut scaled = ScaledKnn::new(1, WeightFunction::Inverse);
        scaled.fit(&x, &y).unwrap();
        assert_eq!(scaled.predict(&query).unwrap(), array![1]);
    }

    #[test]
    fn test_predict_before_fit() {
        let model = ScaledKnn::new(3, WeightFunction::Rectangular);
        let result = model.predict(&array![[1.0, 2.0]]);
        assert!(matches!(result, Err(ModelError::Scaler(_))));
    }
}
