use std::path::Path;
use upi_core::{RecommenderError, RecommenderResult};

/// On-disk layout of a table, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
    Json,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> RecommenderResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("csv") => Ok(DataFormat::Csv),
            Some("json") => Ok(DataFormat::Json),
            other => Err(RecommenderError::data_source(
                path.display().to_string(),
                format!("unsupported file extension {other:?} (expected .csv or .json)"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DataFormat::from_path(Path::new("a/profiles.csv")).unwrap(), DataFormat::Csv);
        assert_eq!(DataFormat::from_path(Path::new("profiles.JSON")).unwrap(), DataFormat::Json);
        assert!(DataFormat::from_path(Path::new("profiles.parquet")).is_err());
        assert!(DataFormat::from_path(Path::new("profiles")).is_err());
    }
}
