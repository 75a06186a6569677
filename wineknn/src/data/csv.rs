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

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::path::Path;

use log::debug;
use ndarray::{Array1, Array2};

use super::{DataLoader, Dataset, error::CsvError};

/// Loads a header CSV where one named column holds the class label and every
/// other column is a numeric feature.
#[derive(Debug, Clone)]
pub struct WineCsvLoader {
    target_column: String,
}

impl WineCsvLoader {
    pub fn new(target_column: impl Into<String>) -> Self {
        WineCsvLoader { target_column: target_column.into() }
    }

    pub fn target_column(&self) -> &str {
        &self.target_column
    }
}

impl Default for WineCsvLoader {
    fn default() -> Self {
        WineCsvLoader::new("class")
    }
}

/// Orders class labels numerically when every label is a number, otherwise
/// lexicographically.
fn sort_labels(labels: BTreeSet<String>) -> Vec<String> {
    let mut labels: Vec<String> = labels.into_iter().collect();
    let numeric: Option<Vec<f64>> = labels.iter().map(|l| l.parse::<f64>().ok()).collect();
    if let Some(values) = numeric {
        let mut paired: Vec<(f64, String)> = values.into_iter().zip(labels).collect();
        paired.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        labels = paired.into_iter().map(|(_, l)| l).collect();
    }
    labels
}

fn load_wine_csv<P: AsRef<Path>>(path: P, target_column: &str) -> Result<Dataset, CsvError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let target_idx = headers
        .iter()
        .position(|h| h == target_column)
        .ok_or_else(|| CsvError::MissingTargetColumn(target_column.to_string()))?;
    let n_cols = headers.len();
    if n_cols < 2 {
        return Err(CsvError::InsufficientColumns);
    }
    let feature_names: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != target_idx)
        .map(|(_, h)| h.clone())
        .collect();

    let mut feature_data: Vec<f64> = Vec::new();
    let mut labels: Vec<String> = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let row = i + 1;
        if record.len() != n_cols {
            return Err(CsvError::InconsistentColumns {
                row,
                actual: record.len(),
                expected: n_cols,
            });
        }
        for (col, value) in record.iter().enumerate() {
            if col == target_idx {
                if value.is_empty() {
                    return Err(CsvError::MissingTarget { row });
                }
                labels.push(value.to_string());
                continue;
            }
            let invalid = || CsvError::InvalidNumeric {
                value: value.to_string(),
                row,
                column: headers[col].clone(),
            };
            let num = value.parse::<f64>().map_err(|_| invalid())?;
            // NaN and infinities parse, but poison every distance downstream.
            if !num.is_finite() {
                return Err(invalid());
            }
            feature_data.push(num);
        }
    }

    let n_rows = labels.len();
    if n_rows == 0 {
        return Err(CsvError::EmptyFile);
    }

    let class_names = sort_labels(labels.iter().cloned().collect());
    if class_names.len() < 2 {
        return Err(CsvError::SingleClass);
    }
    let index: HashMap<&str, usize> =
        class_names.iter().enumerate().map(|(i, name)| (name.as_str(), i)).collect();
    let targets: Array1<usize> = labels.iter().map(|l| index[l.as_str()]).collect();

    let features = Array2::from_shape_vec((n_rows, n_cols - 1), feature_data)?;
    debug!(
        "Loaded {} rows, {} features, {} classes from {:?}",
        n_rows,
        n_cols - 1,
        class_names.len(),
        path
    );

    Ok(Dataset { features, targets, feature_names, class_names })
}

impl DataLoader for WineCsvLoader {
    type Error = CsvError;

    fn load<P: AsRef<Path>>(&self, path: P) -> Result<Dataset, Self::Error> {
        load_wine_csv(path, &self.target_column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes()).expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_load_target_first_column() {
        let csv_content = "class,alcohol,ash\n1,14.2,2.4\n2,12.3,2.1\n1,13.9,2.6\n";
        let temp_file = create_temp_csv(csv_content);

        let dataset = WineCsvLoader::default().load(temp_file.path()).expect("Failed to load CSV");

        assert_eq!(dataset.features, array![[14.2, 2.4], [12.3, 2.1], [13.9, 2.6]]);
        assert_eq!(dataset.targets, array![0, 1, 0]);
        assert_eq!(dataset.feature_names, vec!["alcohol", "ash"]);
        assert_eq!(dataset.class_names, vec!["1", "2"]);
    }

    #[test]
    fn test_load_target_last_column_with_string_labels() {
        let csv_content =
            "alcohol,hue,cultivar\n14.2,1.0,barolo\n12.3,0.9,grignolino\n13.0,1.1,barbera\n";
        let temp_file = create_temp_csv(csv_content);

        let dataset =
            WineCsvLoader::new("cultivar").load(temp_file.path()).expect("Failed to load CSV");

        assert_eq!(dataset.class_names, vec!["barbera", "barolo", "grignolino"]);
        assert_eq!(dataset.targets, array![1, 2, 0]);
        assert_eq!(dataset.features, array![[14.2, 1.0], [12.3, 0.9], [13.0, 1.1]]);
    }

    #[test]
    fn test_numeric_labels_sort_numerically() {
        let csv_content = "class,x\n10,1.0\n2,2.0\n1,3.0\n";
        let temp_file = create_temp_csv(csv_content);

        let dataset = WineCsvLoader::default().load(temp_file.path()).expect("Failed to load CSV");

        assert_eq!(dataset.class_names, vec!["1", "2", "10"]);
        assert_eq!(dataset.targets, array![2, 1, 0]);
    }

    #[test]
    fn test_load_empty_file() {
        let temp_file = create_temp_csv("class,x\n");

        let result = WineCsvLoader::default().load(temp_file.path());
        assert!(matches!(result, Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_missing_target_column() {
        let temp_file = create_temp_csv("label,x\n1,2.0\n");

        let result = WineCsvLoader::default().load(temp_file.path());
        assert!(matches!(result, Err(CsvError::MissingTargetColumn(name)) if name == "class"));
    }

    #[test]
    fn test_load_single_column() {
        let temp_file = create_temp_csv("class\n1\n2\n");

        let result = WineCsvLoader::default().load(temp_file.path());
        assert!(matches!(result, Err(CsvError::InsufficientColumns)));
    }

    #[test]
    fn test_load_invalid_numeric() {
        let temp_file = create_temp_csv("class,x\n1,2.0\n2,abc\n");

        let result = WineCsvLoader::default().load(temp_file.path());
        assert!(
            matches!(result, Err(CsvError::InvalidNumeric { value, row, column }) if value == "abc" && row == 2 && column == "x")
        );
    }

    #[test]
    fn test_load_missing_feature_value() {
        let temp_file = create_temp_csv("class,x,y\n1,2.0,\n2,1.0,3.0\n");

        let result = WineCsvLoader::default().load(temp_file.path());
        assert!(matches!(result, Err(CsvError::InvalidNumeric { row: 1, .. })));
    }

    #[test]
    fn test_load_missing_target() {
        let temp_file = create_temp_csv("class,x\n1,2.0\n,3.0\n");

        let result = WineCsvLoader::default().load(temp_file.path());
        assert!(matches!(result, Err(CsvError::MissingTarget { row: 2 })));
    }

    #[test]
    fn test_load_single_class() {
        let temp_file = create_temp_csv("class,x\n1,2.0\n1,3.0\n");

        let result = WineCsvLoader::default().load(temp_file.path());
        assert!(matches!(result, Err(CsvError::SingleClass)));
    }

    #[test]
    fn test_load_inconsistent_columns() {
        let temp_file = create_temp_csv("class,x\n1,2.0\n2,3.0,4.0\n");

        let result = WineCsvLoader::default().load(temp_file.path());
        assert!(
            matches!(result, Err(CsvError::InconsistentColumns { row, actual, expected }) if row == 2 && actual == 3 && expected == 2)
        );
    }

    #[test]
    fn test_load_rejects_non_finite_values() {
        for bad in ["NaN", "inf", "-inf"] {
            let temp_file = create_temp_csv(&format!("class,x\n1,1.0\n2,{}\n1,2.0\n", bad));

            let result = WineCsvLoader::default().load(temp_file.path());
            assert!(
                matches!(&result, Err(CsvError::InvalidNumeric { value, row: 2, .. }) if value == bad),
                "{} was accepted: {:?}",
                bad,
                result
            );
        }
    }

    #[test]
    fn test_load_malformed_csv() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(b"class,x\n1,1.0\n2,\xff\xfe\n").expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");

        let result = WineCsvLoader::default().load(file.path());
        assert!(matches!(result, Err(CsvError::CsvParse(_))), "Unexpected result: {:?}", result);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = WineCsvLoader::default().load("nonexistent.csv");
        assert!(matches!(result, Err(CsvError::FileOpen(_))));
    }
}
