// metric.rs - Distance metric identifiers

use std::fmt;
use std::str::FromStr;

/// Tree distance metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Robinson-Foulds distance, normalized by the maximum possible distance
    Rf,
    /// Generalized quartet distance, computed by the external quartet tool
    Gq,
}

impl Metric {
    /// All metrics, in the order matrices are generated and loaded
    pub const ALL: [Metric; 2] = [Metric::Rf, Metric::Gq];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Rf => "rf",
            Metric::Gq => "gq",
        }
    }

    /// File name of the persisted matrix for this metric
    pub fn matrix_file_name(&self) -> String {
        format!("matrix_{}.csv", self.name())
    }

    pub fn description(&self) -> &'static str {
        match self {
            Metric::Rf => "normalized Robinson-Foulds distance",
            Metric::Gq => "generalized quartet distance (1 - quartet agreement)",
        }
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rf" => Ok(Metric::Rf),
            "gq" => Ok(Metric::Gq),
            _ => Err(format!("Invalid metric: {}. Use: rf, gq", s)),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_parsing() {
        assert_eq!("rf".parse::<Metric>().unwrap(), Metric::Rf);
        assert_eq!("GQ".parse::<Metric>().unwrap(), Metric::Gq);
        assert!("quartet".parse::<Metric>().is_err());
    }

    #[test]
    fn test_gqd_is_not_a_metric() {
        // "gqd" shows up as a column prefix in downstream reports but is not
        // a metric identifier; accepting it here would silently address the
        // wrong matrix file.
        let err = "gqd".parse::<Metric>().unwrap_err();
        assert!(err.contains("rf, gq"));
    }

    #[test]
    fn test_matrix_file_names() {
        assert_eq!(Metric::Rf.matrix_file_name(), "matrix_rf.csv");
        assert_eq!(Metric::Gq.matrix_file_name(), "matrix_gq.csv");
    }
}
