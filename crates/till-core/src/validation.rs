//! # Validation Module
//!
//! Input validation for drawer operations. Runs before any ledger logic,
//! so a failed check never touches stored state.

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a cashier id.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 64 characters
///
/// ## Example
/// ```rust
/// use till_core::validation::validate_cashier_id;
///
/// assert!(validate_cashier_id("C1").is_ok());
/// assert!(validate_cashier_id("").is_err());
/// ```
pub fn validate_cashier_id(cashier_id: &str) -> ValidationResult<()> {
    let cashier_id = cashier_id.trim();

    if cashier_id.is_empty() {
        return Err(ValidationError::Required {
            field: "cashier_id".to_string(),
        });
    }

    if cashier_id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "cashier_id".to_string(),
            max: 64,
        });
    }

    Ok(())
}

/// Validates a cashier display name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 100 characters
pub fn validate_cashier_name(cashier_name: &str) -> ValidationResult<()> {
    let cashier_name = cashier_name.trim();

    if cashier_name.is_empty() {
        return Err(ValidationError::Required {
            field: "cashier_name".to_string(),
        });
    }

    if cashier_name.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "cashier_name".to_string(),
            max: 100,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_cashier_id() {
        assert!(validate_cashier_id("C1").is_ok());
        assert!(validate_cashier_id("  ").is_err());
        assert!(validate_cashier_id(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_cashier_name() {
        assert!(validate_cashier_name("Alice").is_ok());
        assert!(validate_cashier_name("").is_err());
        assert!(validate_cashier_name(&"x".repeat(101)).is_err());
    }
}
