use crate::error::Error as VcErr;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, VcErr>;
