//! Categorical encoding for the request fields.
//!
//! Each field has its own lookup table fitted at training time. Serving-time
//! values drift (new categories, typos, locales), so an unknown field or an
//! unseen value encodes to 0 instead of failing the request.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;
use upi_core::features::EncodedContext;
use upi_core::types::TransactionContext;
use upi_core::{RecommenderError, RecommenderResult};

pub const CATEGORY: &str = "category";
pub const RECEIVER_TYPE: &str = "receiver_type";
pub const LOCATION: &str = "location";
pub const PAYMENT_METHOD: &str = "payment_method";

/// Code returned for unregistered fields and unseen values.
pub const UNKNOWN_CODE: i64 = 0;

/// One field's table as exported: either the fitted class list (code is the
/// position) or an explicit value-to-code map.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EncoderTable {
    Classes(Vec<String>),
    Codes(HashMap<String, i64>),
}

impl EncoderTable {
    fn into_codes(self) -> HashMap<String, i64> {
        match self {
            EncoderTable::Classes(classes) => classes
                .into_iter()
                .enumerate()
                .map(|(code, value)| (value, code as i64))
                .collect(),
            EncoderTable::Codes(codes) => codes,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeatureEncoder {
    tables: HashMap<String, HashMap<String, i64>>,
}

impl FeatureEncoder {
    pub fn new(tables: HashMap<String, EncoderTable>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|(field, table)| (field, table.into_codes()))
                .collect(),
        }
    }

    /// Register a fitted class list for `field`; codes follow list order.
    pub fn with_classes<I, S>(mut self, field: &str, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let table = EncoderTable::Classes(classes.into_iter().map(Into::into).collect());
        self.tables.insert(field.to_string(), table.into_codes());
        self
    }

    /// Load encoder tables from a JSON object keyed by field name.
    pub fn load(path: impl AsRef<Path>) -> RecommenderResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| RecommenderError::EncoderLoad(format!("{}: {e}", path.display())))?;
        let tables: HashMap<String, EncoderTable> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| RecommenderError::EncoderLoad(format!("{}: {e}", path.display())))?;

        let encoder = Self::new(tables);
        info!(
            path = %path.display(),
            fields = ?encoder.fields(),
            "Categorical encoders loaded"
        );
        Ok(encoder)
    }

    pub fn encode(&self, field: &str, value: &str) -> i64 {
        self.tables
            .get(field)
            .and_then(|table| table.get(value))
            .copied()
            .unwrap_or(UNKNOWN_CODE)
    }

    pub fn encode_context(&self, context: &TransactionContext) -> EncodedContext {
        EncodedContext {
            category: self.encode(CATEGORY, &context.category),
            receiver_type: self.encode(RECEIVER_TYPE, &context.receiver_type),
            location: self.encode(LOCATION, &context.location),
            payment_method: self.encode(PAYMENT_METHOD, &context.payment_method),
        }
    }

    /// Registered field names, sorted.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        fields.sort_unstable();
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> FeatureEncoder {
        FeatureEncoder::default()
            .with_classes(CATEGORY, ["Bills & Utilities", "Education", "Food & Dining"])
            .with_classes(LOCATION, ["Bangalore", "Delhi", "Mumbai"])
    }

    #[test]
    fn test_known_values_use_class_position() {
        let encoder = encoder();
        assert_eq!(encoder.encode(CATEGORY, "Food & Dining"), 2);
        assert_eq!(encoder.encode(LOCATION, "Delhi"), 1);
    }

    #[test]
    fn test_unknown_value_and_field_encode_to_zero() {
        let encoder = encoder();
        assert_eq!(encoder.encode(CATEGORY, "Crypto"), UNKNOWN_CODE);
        assert_eq!(encoder.encode(CATEGORY, "food & dining"), UNKNOWN_CODE);
        assert_eq!(encoder.encode(PAYMENT_METHOD, "PhonePe"), UNKNOWN_CODE);
        assert_eq!(encoder.encode("merchant_mcc", "5411"), UNKNOWN_CODE);
        assert_eq!(FeatureEncoder::default().encode(CATEGORY, "Fuel"), UNKNOWN_CODE);
    }

    #[test]
    fn test_encode_context() {
        let mut context = TransactionContext::for_category("Education");
        context.location = "Bangalore".to_string();
        let encoded = encoder().encode_context(&context);
        assert_eq!(
            encoded,
            EncodedContext {
                category: 1,
                receiver_type: 0,
                location: 0,
                payment_method: 0,
            }
        );
    }

    #[test]
    fn test_tables_accept_lists_and_maps() {
        let tables: HashMap<String, EncoderTable> = serde_json::from_str(
            r#"{"payment_method": ["Google Pay", "Paytm", "PhonePe"],
                "receiver_type": {"Merchant": 4, "Individual": 9}}"#,
        )
        .unwrap();
        let encoder = FeatureEncoder::new(tables);
        assert_eq!(encoder.encode(PAYMENT_METHOD, "PhonePe"), 2);
        assert_eq!(encoder.encode(RECEIVER_TYPE, "Individual"), 9);
        assert_eq!(encoder.fields(), vec![PAYMENT_METHOD, RECEIVER_TYPE]);
    }

    #[test]
    fn test_load_missing_file_is_fatal() {
        assert!(matches!(
            FeatureEncoder::load("/nonexistent/encoders.json"),
            Err(RecommenderError::EncoderLoad(_))
        ));
    }
}
