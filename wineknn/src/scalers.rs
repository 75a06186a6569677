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

use ndarray::{Array1, Array2, Axis};
use num_traits::{Float, FromPrimitive};

use crate::error::ScalerError;

pub trait Scaler<T: Float> {
    fn fit(&mut self, x: &Array2<T>) -> Result<(), ScalerError>;

    fn transform(&self, x: &Array2<T>) -> Result<Array2<T>, ScalerError>;

    fn inverse_transform(&self, x: &Array2<T>) -> Result<Array2<T>, ScalerError>;

    fn fit_transform(&mut self, x: &Array2<T>) -> Result<Array2<T>, ScalerError> {
        self.fit(x)?;
        self.transform(x)
    }
}

/// Centres every column on its mean and scales it by its sample standard deviation.
#[derive(Debug, Clone, Default)]
pub struct StandardScaler<T: Float> {
    mean: Option<Array1<T>>,
    std: Option<Array1<T>>,
}

impl<T: Float + FromPrimitive> StandardScaler<T> {
    pub fn new() -> Self {
        StandardScaler { mean: None, std: None }
    }

    fn fitted(&self, x: &Array2<T>) -> Result<(&Array1<T>, &Array1<T>), ScalerError> {
        let (Some(mean), Some(std)) = (self.mean.as_ref(), self.std.as_ref()) else {
            return Err(ScalerError::NotFitted);
        };
        if x.ncols() != mean.len() {
            return Err(ScalerError::ShapeMismatch { expected: mean.len(), actual: x.ncols() });
        }
        Ok((mean, std))
    }
}

impl<T: Float + FromPrimitive> Scaler<T> for StandardScaler<T> {
    fn fit(&mut self, x: &Array2<T>) -> Result<(), ScalerError> {
        if x.nrows() < 2 {
            return Err(ScalerError::TooFewRows(x.nrows()));
        }
        let mean = x.mean_axis(Axis(0)).ok_or(ScalerError::TooFewRows(0))?;
        let std = x.var_axis(Axis(0), T::one()).mapv(|v| v.sqrt());
        self.mean = Some(mean);
        // Constant columns stay centred at zero rather than dividing by zero.
        self.std = Some(std.mapv(|s| if s == T::zero() { T::one() } else { s }));
        Ok(())
    }

    fn transform(&self, x: &Array2<T>) -> Result<Array2<T>, ScalerError> {
        let (mean, std) = self.fitted(x)?;
        Ok((x - mean) / std)
    }

    fn inverse_transform(&self, x: &Array2<T>) -> Result<Array2<T>, ScalerError> {
        let (mean, std) = self.fitted(x)?;
        Ok(x * std + mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    #[test]
    fn test_standard_scaler_fit_transform() {
        let x = Array2::from_shape_vec((3, 2), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let mut scaler = StandardScaler::new();
        let x_scaled = scaler.fit_transform(&x).unwrap();

        // Check mean ~ 0 and std ~ 1 per column
        let mean = x_scaled.mean_axis(Axis(0)).unwrap();
        let std = x_scaled.var_axis(Axis(0), 1.0).mapv(|v| v.sqrt());
        for &m in mean.iter() {
            assert!((m.abs() < 1e-10), "Mean should be ~0, got {}", m);
        }
        for &s in std.iter() {
            assert!((s - 1.0).abs() < 1e-10, "Std should be ~1, got {}", s);
        }
    }

    #[test]
    fn test_standard_scaler_inverse_transform() {
        let x = Array2::from_shape_vec((3, 2), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let mut scaler = StandardScaler::new();
        let x_scaled = scaler.fit_transform(&x).unwrap();
        let x_restored = scaler.inverse_transform(&x_scaled).unwrap();

        for (orig, restored) in x.iter().zip(x_restored.iter()) {
            assert!((orig - restored).abs() < 1e-10, "Restored value differs");
        }
    }

    #[test]
    fn test_standard_scaler_zero_variance() {
        let x = Array2::from_shape_vec((3, 2), vec![1.0, 2.0, 1.0, 2.0, 1.0, 2.0]).unwrap();
        let mut scaler = StandardScaler::new();
        let x_scaled = scaler.fit_transform(&x).unwrap();

        assert_eq!(x_scaled.column(0), Array1::from_vec(vec![0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_transform_uses_training_statistics() {
        let train = Array2::from_shape_vec((2, 1), vec![0.0, 2.0]).unwrap();
        let test = Array2::from_shape_vec((1, 1), vec![4.0]).unwrap();
        let mut scaler = StandardScaler::new();
        scaler.fit(&train).unwrap();

        // mean 1, sample std sqrt(2)
        let scaled = scaler.transform(&test).unwrap();
        assert!((scaled[[0, 0]] - 3.0 / 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_transform_before_fit() {
        let scaler = StandardScaler::<f64>::new();
        let x = Array2::zeros((2, 2));
        assert_eq!(scaler.transform(&x), Err(ScalerError::NotFitted));
    }

    #[test]
    fn test_transform_shape_mismatch() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap()).unwrap();
        let result = scaler.transform(&Array2::zeros((1, 3)));
        assert_eq!(result, Err(ScalerError::ShapeMismatch { expected: 2, actual: 3 }));
    }

    #[test]
    fn test_fit_single_row() {
        let mut scaler = StandardScaler::<f64>::new();
        let result = scaler.fit(&Array2::zeros((1, 3)));
        assert_eq!(result, Err(ScalerError::TooFewRows(1)));
    }
}
