//! Historical transaction log. Not consulted on the request path; loaded at
//! startup so a missing or unreadable data source fails fast.

use crate::format::DataFormat;
use crate::profiles::ProfileStore;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;
use upi_core::types::TransactionRecord;
use upi_core::{RecommenderError, RecommenderResult};

#[derive(Debug, Clone, Default)]
pub struct TransactionLog {
    records: Vec<TransactionRecord>,
}

impl TransactionLog {
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        Self { records }
    }

    /// Load a `.csv` (header row, unknown columns ignored) or `.json` (array)
    /// transaction table. Any unparsable row is fatal.
    pub fn load(path: impl AsRef<Path>) -> RecommenderResult<Self> {
        let path = path.as_ref();
        let source = path.display().to_string();
        let format = DataFormat::from_path(path)?;
        let file = File::open(path).map_err(|e| RecommenderError::data_source(&source, e))?;
        let reader = BufReader::new(file);

        let log = match format {
            DataFormat::Csv => Self::from_csv_reader(reader, &source)?,
            DataFormat::Json => {
                let records: Vec<TransactionRecord> = serde_json::from_reader(reader)
                    .map_err(|e| RecommenderError::data_source(&source, e))?;
                Self::new(records)
            }
        };

        info!(
            path = %source,
            transactions = log.len(),
            users = log.distinct_users(),
            "Transaction log loaded"
        );
        Ok(log)
    }

    pub fn from_csv_reader<R: Read>(reader: R, source: &str) -> RecommenderResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let records = csv_reader
            .deserialize::<TransactionRecord>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RecommenderError::data_source(source, e))?;
        Ok(Self::new(records))
    }

    fn user_ids(&self) -> HashSet<&str> {
        self.records.iter().map(|r| r.user_id.as_str()).collect()
    }

    pub fn distinct_users(&self) -> usize {
        self.user_ids().len()
    }

    /// Users with transaction history but no profile row. They are served
    /// category-average recommendations like new users.
    pub fn users_without_profile(&self, profiles: &ProfileStore) -> usize {
        self.user_ids()
            .into_iter()
            .filter(|id| !profiles.contains(id))
            .count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use upi_core::types::UserProfile;

    const CSV: &str = "\
transaction_id,user_id,amount,category,timestamp
T1,USER_0001,250.0,Food & Dining,2024-01-01 13:00:00
T2,USER_0001,120,Transportation,2024-01-02 08:10:00
T3,USER_0002,800,,2024-01-03 19:45:00
";

    #[test]
    fn test_csv_ignores_extra_columns() {
        let log = TransactionLog::from_csv_reader(CSV.as_bytes(), "inline").unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log.distinct_users(), 2);
    }

    #[test]
    fn test_users_without_profile() {
        let log = TransactionLog::from_csv_reader(CSV.as_bytes(), "inline").unwrap();
        let profile = UserProfile {
            avg_amount: 185.0,
            median_amount: 185.0,
            amount_std: 65.0,
            transaction_count: 2,
            avg_hour: 10.5,
            weekend_ratio: 0.0,
            cluster: None,
            preferred_category: None,
        };
        let profiles = ProfileStore::from_profiles([("USER_0001", profile)]);
        assert_eq!(log.users_without_profile(&profiles), 1);
        assert_eq!(log.users_without_profile(&ProfileStore::default()), 2);
    }

    #[test]
    fn test_optional_category() {
        let log = TransactionLog::from_csv_reader(CSV.as_bytes(), "inline").unwrap();
        assert_eq!(log.records[0].category.as_deref(), Some("Food & Dining"));
        assert_eq!(log.records[2].amount, 800.0);
        assert_eq!(log.records[2].category, None);

        let from_json: Vec<TransactionRecord> =
            serde_json::from_str(r#"[{"user_id": "USER_0002", "amount": 800}]"#).unwrap();
        assert_eq!(from_json[0].category, None);
    }

    #[test]
    fn test_bad_amount_is_fatal() {
        let csv = "user_id,amount\nUSER_0001,lots\n";
        let err = TransactionLog::from_csv_reader(csv.as_bytes(), "inline").unwrap_err();
        assert!(matches!(err, RecommenderError::DataSource { .. }));
    }
}
