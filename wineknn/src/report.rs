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

//! Output artifacts: the tuning figure and the summary tables.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use plotters::prelude::*;
use serde::Serialize;

use crate::error::ReportError;
use crate::metrics::ConfusionMatrix;
use crate::tuning::CvMetric;

pub const ACCURACY_PLOT_FILE: &str = "knn_cv_accuracy.svg";
pub const TEST_ACCURACY_FILE: &str = "test_accuracy.csv";
pub const CONFUSION_MATRIX_FILE: &str = "confusion_matrix.csv";
pub const CV_METRICS_FILE: &str = "cv_metrics.csv";

#[derive(Debug, Serialize)]
struct AccuracyRow<'a> {
    metric: &'a str,
    estimator: &'a str,
    estimate: f64,
}

#[derive(Debug, Serialize)]
struct ConfusionRow<'a> {
    prediction: &'a str,
    truth: &'a str,
    count: usize,
}

#[derive(Debug, Serialize)]
struct CvRow {
    neighbors: usize,
    mean: f64,
    std_err: f64,
    n: usize,
    selected: bool,
}

fn plot_err<E: Display>(e: E) -> ReportError {
    ReportError::Plot(e.to_string())
}

/// Writes every artifact into one output directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    /// Creates the output directory, and any missing parents, if needed.
    pub fn create<P: AsRef<Path>>(output_dir: P) -> Result<Self, ReportError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;
        Ok(ReportWriter { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Line chart of mean CV accuracy against the number of neighbors, with the
    /// selected candidate marked.
    pub fn write_accuracy_plot(
        &self,
        metrics: &[CvMetric],
        best: &CvMetric,
    ) -> Result<PathBuf, ReportError> {
        let path = self.output_dir.join(ACCURACY_PLOT_FILE);

        let k_min = metrics.iter().map(|m| m.neighbors).min().unwrap_or(best.neighbors) as f64;
        let k_max = metrics.iter().map(|m| m.neighbors).max().unwrap_or(best.neighbors) as f64;
        let y_min = metrics.iter().map(|m| m.mean).fold(best.mean, f64::min);
        let y_max = metrics.iter().map(|m| m.mean).fold(best.mean, f64::max);
        let pad = ((y_max - y_min) * 0.1).max(0.01);

        {
            let root = SVGBackend::new(&path, (800, 500)).into_drawing_area();
            root.fill(&WHITE).map_err(plot_err)?;

            let mut chart = ChartBuilder::on(&root)
                .caption("Cross-validated accuracy by number of neighbors", ("sans-serif", 22))
                .margin(15)
                .x_label_area_size(40)
                .y_label_area_size(60)
                .build_cartesian_2d(
                    k_min - 0.5..k_max + 0.5,
                    (y_min - pad).max(0.0)..(y_max + pad).min(1.0),
                )
                .map_err(plot_err)?;

            chart
                .configure_mesh()
                .x_desc("Neighbors")
                .y_desc("Accuracy estimate")
                .x_label_formatter(&|k: &f64| format!("{:.0}", k))
                .draw()
                .map_err(plot_err)?;

            chart
                .draw_series(LineSeries::new(
                    metrics.iter().map(|m| (m.neighbors as f64, m.mean)),
                    &BLUE,
                ))
                .map_err(plot_err)?;
            chart
                .draw_series(
                    metrics
                        .iter()
                        .map(|m| Circle::new((m.neighbors as f64, m.mean), 3, BLUE.filled())),
                )
                .map_err(plot_err)?;
            chart
                .draw_series(std::iter::once(Circle::new(
                    (best.neighbors as f64, best.mean),
                    6,
                    RED.filled(),
                )))
                .map_err(plot_err)?;

            root.present().map_err(plot_err)?;
        }

        info!("Wrote accuracy figure to {:?}", path);
        Ok(path)
    }

    /// One-row table with the held-out accuracy.
    pub fn write_test_accuracy(
        &self,
        accuracy: f64,
        n_classes: usize,
    ) -> Result<PathBuf, ReportError> {
        let path = self.output_dir.join(TEST_ACCURACY_FILE);
        let estimator = if n_classes == 2 { "binary" } else { "multiclass" };
        let mut wtr = csv::Writer::from_path(&path)?;
        wtr.serialize(AccuracyRow { metric: "accuracy", estimator, estimate: accuracy })?;
        wtr.flush()?;
        info!("Wrote test accuracy to {:?}", path);
        Ok(path)
    }

    /// Long-form confusion matrix labelled with class names.
    pub fn write_confusion_matrix(
        &self,
        matrix: &ConfusionMatrix,
        class_names: &[String],
    ) -> Result<PathBuf, ReportError> {
        if class_names.len() < matrix.n_classes() {
            return Err(ReportError::ClassNames {
                expected: matrix.n_classes(),
                actual: class_names.len(),
            });
        }
        let path = self.output_dir.join(CONFUSION_MATRIX_FILE);
        let mut wtr = csv::Writer::from_path(&path)?;
        for cell in matrix.to_long() {
            wtr.serialize(ConfusionRow {
                prediction: &class_names[cell.prediction],
                truth: &class_names[cell.truth],
                count: cell.count,
            })?;
        }
        wtr.flush()?;
        info!("Wrote confusion matrix to {:?}", path);
        Ok(path)
    }

    pub fn write_cv_metrics(
        &self,
        metrics: &[CvMetric],
        best: &CvMetric,
    ) -> Result<PathBuf, ReportError> {
        let path = self.output_dir.join(CV_METRICS_FILE);
        let mut wtr = csv::Writer::from_path(&path)?;
        for m in metrics {
            wtr.serialize(CvRow {
                neighbors: m.neighbors,
                mean: m.mean,
                std_err: m.std_err,
                n: m.n,
                selected: m.neighbors == best.neighbors,
            })?;
        }
        wtr.flush()?;
        info!("Wrote cross-validation metrics to {:?}", path);
        Ok(path)
    }
}
