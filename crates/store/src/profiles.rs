//! User profile table, keyed by user id and immutable once loaded.
//!
//! Rows that fail to parse are kept as quarantined entries rather than
//! dropped: the user is still known, so requests for them degrade instead of
//! silently being treated as new users.

use crate::format::DataFormat;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};
use upi_core::types::UserProfile;
use upi_core::{RecommenderError, RecommenderResult};

#[derive(Debug, Clone)]
enum ProfileEntry {
    Valid(UserProfile),
    Malformed(String),
}

/// Result of looking a user up in the [`ProfileStore`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProfileLookup<'a> {
    Found(&'a UserProfile),
    /// The user has a row, but it could not be parsed.
    Malformed(&'a str),
    Missing,
}

/// Read-only profile table.
#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    entries: HashMap<String, ProfileEntry>,
    malformed: usize,
}

impl ProfileStore {
    /// Build a store from already-parsed profiles.
    pub fn from_profiles<I, K>(profiles: I) -> Self
    where
        I: IntoIterator<Item = (K, UserProfile)>,
        K: Into<String>,
    {
        let entries = profiles
            .into_iter()
            .map(|(id, profile)| (id.into(), ProfileEntry::Valid(profile)))
            .collect();
        Self {
            entries,
            malformed: 0,
        }
    }

    /// Load the profile table from a `.csv` or `.json` file.
    ///
    /// CSV: the first column holds the user id (whatever its header), the
    /// remaining columns are matched by header name. JSON: an object mapping
    /// user id to profile.
    pub fn load(path: impl AsRef<Path>) -> RecommenderResult<Self> {
        let path = path.as_ref();
        let source = path.display().to_string();
        let format = DataFormat::from_path(path)?;
        let file = File::open(path).map_err(|e| RecommenderError::data_source(&source, e))?;
        let reader = BufReader::new(file);

        let store = match format {
            DataFormat::Csv => Self::from_csv_reader(reader, &source)?,
            DataFormat::Json => Self::from_json_reader(reader, &source)?,
        };

        info!(
            path = %source,
            profiles = store.len(),
            malformed = store.malformed,
            "Profile table loaded"
        );
        Ok(store)
    }

    pub fn from_csv_reader<R: Read>(reader: R, source: &str) -> RecommenderResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader
            .headers()
            .map_err(|e| RecommenderError::data_source(source, e))?
            .clone();

        let mut store = Self::default();
        for (row, record) in csv_reader.records().enumerate() {
            let record = record.map_err(|e| RecommenderError::data_source(source, e))?;
            let user_id = match record.get(0) {
                Some(id) if !id.is_empty() => id.to_string(),
                _ => {
                    warn!(path = source, row = row + 1, "Skipping profile row without a user id");
                    continue;
                }
            };
            let entry = match record.deserialize::<UserProfile>(Some(&headers)) {
                Ok(profile) => ProfileEntry::Valid(profile),
                Err(e) => ProfileEntry::Malformed(e.to_string()),
            };
            store.insert(user_id, entry, source);
        }
        Ok(store)
    }

    pub fn from_json_reader<R: Read>(reader: R, source: &str) -> RecommenderResult<Self> {
        let rows: HashMap<String, serde_json::Value> = serde_json::from_reader(reader)
            .map_err(|e| RecommenderError::data_source(source, e))?;

        let mut store = Self::default();
        for (user_id, value) in rows {
            let entry = match serde_json::from_value::<UserProfile>(value) {
                Ok(profile) => ProfileEntry::Valid(profile),
                Err(e) => ProfileEntry::Malformed(e.to_string()),
            };
            store.insert(user_id, entry, source);
        }
        Ok(store)
    }

    fn insert(&mut self, user_id: String, entry: ProfileEntry, source: &str) {
        if self.entries.contains_key(&user_id) {
            warn!(path = source, user_id = %user_id, "Duplicate profile row ignored");
            return;
        }
        if let ProfileEntry::Malformed(reason) = &entry {
            warn!(path = source, user_id = %user_id, reason = %reason, "Malformed profile row");
            self.malformed += 1;
        }
        self.entries.insert(user_id, entry);
    }

    pub fn lookup(&self, user_id: &str) -> ProfileLookup<'_> {
        match self.entries.get(user_id) {
            Some(ProfileEntry::Valid(profile)) => ProfileLookup::Found(profile),
            Some(ProfileEntry::Malformed(reason)) => ProfileLookup::Malformed(reason),
            None => ProfileLookup::Missing,
        }
    }

    /// Parsed profile for `user_id`, if the row exists and is well formed.
    pub fn get(&self, user_id: &str) -> Option<&UserProfile> {
        match self.lookup(user_id) {
            ProfileLookup::Found(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.entries.contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn malformed_count(&self) -> usize {
        self.malformed
    }
}
