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

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;
use wineknn::classical::WeightFunction;
use wineknn::pipeline::{DEFAULT_FILE_NAME, DEFAULT_SEED, DEFAULT_TARGET_COLUMN};
use wineknn::split::{DEFAULT_FOLDS, DEFAULT_TRAIN_FRACTION};
use wineknn::tuning::DEFAULT_NEIGHBORS;
use wineknn::{PipelineConfig, run};

#[derive(Parser, Debug)]
#[command(name = "wineknn")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tune, fit and evaluate a KNN classifier on the wine dataset", long_about = None)]
struct Cli {
    /// Directory containing the input CSV
    data_dir: PathBuf,

    /// Directory to write the figure and tables to (created if missing)
    output_dir: PathBuf,

    /// Name of the CSV file inside the data directory
    #[arg(long, default_value = DEFAULT_FILE_NAME)]
    file_name: String,

    /// Column holding the class label
    #[arg(long, default_value = DEFAULT_TARGET_COLUMN)]
    target: String,

    /// Seed for the split and the fold assignment
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Number of cross-validation folds
    #[arg(long, default_value_t = DEFAULT_FOLDS)]
    folds: usize,

    /// Largest neighbor count in the tuning grid (the grid starts at 1)
    #[arg(long, default_value_t = *DEFAULT_NEIGHBORS.end())]
    max_neighbors: usize,

    /// Share of rows used for training
    #[arg(long, default_value_t = DEFAULT_TRAIN_FRACTION)]
    train_fraction: f64,

    /// Neighbor weighting: rectangular, inverse, triangular or gaussian
    #[arg(long, default_value = "inverse")]
    weight: WeightFunction,

    /// Log filter, e.g. "info" or "wineknn=debug"
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn to_config(&self) -> PipelineConfig {
        PipelineConfig::new(&self.data_dir, &self.output_dir)
            .with_file_name(self.file_name.as_str())
            .with_target_column(self.target.as_str())
            .with_seed(self.seed)
            .with_folds(self.folds)
            .with_neighbors(*DEFAULT_NEIGHBORS.start()..=self.max_neighbors)
            .with_train_fraction(self.train_fraction)
            .with_weight(self.weight)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::new().parse_filters(&cli.log_level).init();

    let config = cli.to_config();

    match run(&config) {
        Ok(summary) => {
            println!("Selected neighbors: {}", summary.best.neighbors);
            println!("Mean CV accuracy:   {:.4}", summary.best.mean);
            println!("Test accuracy:      {:.4}", summary.test_accuracy);
            for path in &summary.artifacts {
                println!("Wrote {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_library() {
        let cli = Cli::try_parse_from(["wineknn", "data", "out"]).unwrap();
        let expected = PipelineConfig::new("data", "out");
        assert_eq!(format!("{:?}", cli.to_config()), format!("{:?}", expected));
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "wineknn",
            "data",
            "out",
            "--folds",
            "3",
            "--max-neighbors",
            "8",
            "--weight",
            "gaussian",
        ])
        .unwrap();
        let expected = PipelineConfig::new("data", "out")
            .with_folds(3)
            .with_neighbors(1..=8)
            .with_weight(WeightFunction::Gaussian);
        assert_eq!(format!("{:?}", cli.to_config()), format!("{:?}", expected));
    }
}
