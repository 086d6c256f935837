//! Result type alias for Sextant

use super::errors::SextantError;

/// Result type alias for Sextant operations
///
/// # Examples
///
/// ```
/// use sextant::domain::result::Result;
/// use sextant::domain::errors::SextantError;
///
/// fn failing_function() -> Result<()> {
///     Err(SextantError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, SextantError>;
