//! Utility layer - errors shared by every other layer

pub mod errors;

pub use errors::{RedraftError, RedraftResult};
