// report.rs - Distance-derived summary report

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::core::matrix::{DistanceMatrix, ReferenceSet};
use crate::core::metric::Metric;
use crate::data::dataset::DatasetRow;

/// The gold-standard reference role; distances of the inferred trees to
/// this tree are the headline columns of the report.
const GOLD_STANDARD: &str = "glottolog";
/// The consensus role is itself derived from the sampled trees and gets no
/// per-coding comparison column.
const CONSENSUS: &str = "consensus";

fn fmt_cell(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        // Undefined must be visible in the table, never a silent zero.
        None => "NaN".to_string(),
    }
}

/// Distance-derived summary table, one row per dataset, `;`-separated.
///
/// The column set adapts to the configured reference set: every inferred
/// reference (neither gold standard nor consensus) gets a `gqd_<name>`
/// column holding its GQ distance to the gold standard, the first inferred
/// reference gets RF stability columns against the sampled trees, and every
/// pair of inferred references gets an `rf_<a>_<b>` column.
pub struct DistanceReport {
    columns: Vec<String>,
    records: Vec<Vec<String>>,
    gold: Option<String>,
    inferred: Vec<String>,
    has_rf: bool,
    has_gq: bool,
}

impl DistanceReport {
    pub fn new(ref_set: &ReferenceSet, metrics: &[Metric]) -> Self {
        let gold = ref_set
            .contains(GOLD_STANDARD)
            .then(|| GOLD_STANDARD.to_string());
        let inferred: Vec<String> = ref_set
            .names()
            .iter()
            .filter(|n| n.as_str() != GOLD_STANDARD && n.as_str() != CONSENSUS)
            .cloned()
            .collect();
        let has_rf = metrics.contains(&Metric::Rf);
        let has_gq = metrics.contains(&Metric::Gq);

        let mut columns: Vec<String> = ["ds_id", "source", "ling_type", "family"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        if has_rf {
            if let Some(primary) = inferred.first() {
                columns.push(format!("rf_{}_avg", primary));
                columns.push(format!("rf_{}_max", primary));
            }
            columns.push("rf_sampled_avg".to_string());
            columns.push("rf_sampled_max".to_string());
            for (i, a) in inferred.iter().enumerate() {
                for b in &inferred[i + 1..] {
                    columns.push(format!("rf_{}_{}", a, b));
                }
            }
        }
        if has_gq && gold.is_some() {
            for name in &inferred {
                columns.push(format!("gqd_{}", name));
            }
            columns.push("gqd_sampled_avg".to_string());
        }
        columns.push("alpha".to_string());
        columns.push("heterogenity".to_string());
        columns.push("avg_ml_dist_bin".to_string());
        columns.push("zero_base_frequency_bin".to_string());

        Self {
            columns,
            records: Vec::new(),
            gold,
            inferred,
            has_rf,
            has_gq,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append one dataset's derived statistics.
    pub fn add_row(
        &mut self,
        row: &DatasetRow,
        dm: &DistanceMatrix,
        alpha: Option<f64>,
        avg_ml_dist: Option<f64>,
        zero_base_frequency: Option<f64>,
    ) -> Result<(), String> {
        let mut record = vec![
            row.ds_id.clone(),
            row.source.clone(),
            row.ling_type.clone(),
            row.family.clone(),
        ];
        if self.has_rf {
            if let Some(primary) = self.inferred.first() {
                record.push(fmt_cell(dm.avg_reference_distance(primary, Metric::Rf)?));
                record.push(fmt_cell(dm.max_reference_distance(primary, Metric::Rf)?));
            }
            record.push(fmt_cell(dm.sampled_avg_of_averages(Metric::Rf)?));
            record.push(fmt_cell(dm.sampled_max_of_averages(Metric::Rf)?));
            for (i, a) in self.inferred.iter().enumerate() {
                for b in &self.inferred[i + 1..] {
                    record.push(fmt_cell(dm.reference_distance(a, b, Metric::Rf)?));
                }
            }
        }
        if self.has_gq {
            if let Some(gold) = &self.gold {
                for name in &self.inferred {
                    record.push(fmt_cell(dm.reference_distance(gold, name, Metric::Gq)?));
                }
                record.push(fmt_cell(dm.avg_reference_distance(gold, Metric::Gq)?));
            }
        }
        record.push(fmt_cell(alpha));
        // High rate heterogeneity shows up as a small alpha.
        record.push(fmt_cell(
            alpha.map(|a| if a < 20.0 { 1.0 } else { 0.0 }),
        ));
        record.push(fmt_cell(avg_ml_dist));
        record.push(fmt_cell(zero_base_frequency));
        self.records.push(record);
        Ok(())
    }

    /// Write the report; `;`-separated with a generation header.
    pub fn write(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                format!(
                    "Failed to create report directory '{}': {}",
                    parent.display(),
                    e
                )
            })?;
        }
        let mut file = File::create(path)
            .map_err(|e| format!("Failed to create report file '{}': {}", path.display(), e))?;
        writeln!(
            file,
            "# Generated: {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        )
        .map_err(|e| format!("Write error: {}", e))?;
        writeln!(file, "# lingdist v{}", env!("CARGO_PKG_VERSION"))
            .map_err(|e| format!("Write error: {}", e))?;

        let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(file);
        writer
            .write_record(&self.columns)
            .map_err(|e| format!("Write error: {}", e))?;
        for record in &self.records {
            writer
                .write_record(record)
                .map_err(|e| format!("Write error: {}", e))?;
        }
        writer.flush().map_err(|e| format!("Flush error: {}", e))?;
        Ok(())
    }
}
