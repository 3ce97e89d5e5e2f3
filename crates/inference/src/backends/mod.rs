//! Model backends.
//!
//! Each module implements [`upi_core::inference::AmountModel`] for a
//! different family of trained regressor, so the predictor runs identically
//! whichever artifact was exported.

pub mod forest;
pub mod linear;
