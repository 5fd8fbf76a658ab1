// codec.rs - Triangular distance matrix serialization

use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::matrix::RawMatrix;
use crate::core::metric::Metric;

/// Location of the persisted matrix for one metric.
pub fn matrix_path(dist_dir: &Path, metric: Metric) -> PathBuf {
    dist_dir.join(metric.matrix_file_name())
}

fn format_cell(value: &Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "nan".to_string(),
    }
}

fn parse_cell(field: &str, path: &Path, row: usize) -> Result<Option<f64>, String> {
    let value: f64 = field.trim().parse().map_err(|_| {
        format!(
            "Invalid distance value '{}' in '{}' row {}",
            field,
            path.display(),
            row
        )
    })?;
    Ok(if value.is_nan() { None } else { Some(value) })
}

/// Write one metric's matrix: newline-separated rows, comma-separated
/// decimal fields, row `j` with `j + 1` fields, `nan` for undefined cells.
pub fn write_matrix(dist_dir: &Path, metric: Metric, matrix: &RawMatrix) -> Result<(), String> {
    create_dir_all(dist_dir).map_err(|e| {
        format!(
            "Failed to create distance directory '{}': {}",
            dist_dir.display(),
            e
        )
    })?;
    let path = matrix_path(dist_dir, metric);
    let file = File::create(&path)
        .map_err(|e| format!("Failed to create matrix file '{}': {}", path.display(), e))?;
    let mut writer = BufWriter::new(file);
    for row in matrix {
        let line = row.iter().map(format_cell).collect::<Vec<_>>().join(",");
        writeln!(writer, "{}", line).map_err(|e| format!("Write error: {}", e))?;
    }
    writer.flush().map_err(|e| format!("Flush error: {}", e))?;
    Ok(())
}

/// Read one metric's matrix back, rejecting rows that break the strict
/// lower-triangular shape.
pub fn read_matrix(dist_dir: &Path, metric: Metric) -> Result<RawMatrix, String> {
    let path = matrix_path(dist_dir, metric);
    let content = std::fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read matrix file '{}': {}", path.display(), e))?;
    let mut matrix = Vec::new();
    for (j, line) in content.lines().enumerate() {
        let row: Vec<Option<f64>> = line
            .split(',')
            .map(|field| parse_cell(field, &path, j))
            .collect::<Result<_, _>>()?;
        if row.len() != j + 1 {
            return Err(format!(
                "Malformed matrix file '{}': row {} has {} fields, expected {}",
                path.display(),
                j,
                row.len(),
                j + 1
            ));
        }
        matrix.push(row);
    }
    Ok(matrix)
}
