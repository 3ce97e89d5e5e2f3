#![warn(clippy::unwrap_used)]

//! Read-only tabular inputs: the user profile table and the historical
//! transaction log.

pub mod format;
pub mod profiles;
pub mod transactions;

pub use format::DataFormat;
pub use profiles::ProfileStore;
pub use transactions::TransactionLog;
