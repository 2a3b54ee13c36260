//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Authentication errors
/// - 2xxx: Permission / role errors
/// - 5xxx: Payment errors
/// - 7xxx: Shift, attendance and break errors
/// - 8xxx: Employee errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Permission errors (2xxx)
    Permission,
    /// Payment errors (5xxx)
    Payment,
    /// Shift / attendance / break errors (7xxx)
    Shift,
    /// Employee errors (8xxx)
    Employee,
    /// System errors (9xxx and unassigned ranges)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            2000..3000 => Self::Permission,
            5000..6000 => Self::Payment,
            7000..8000 => Self::Shift,
            8000..9000 => Self::Employee,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Payment => "payment",
            Self::Shift => "shift",
            Self::Employee => "employee",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1001), ErrorCategory::Auth);
        assert_eq!(ErrorCategory::from_code(2104), ErrorCategory::Permission);
        assert_eq!(ErrorCategory::from_code(5001), ErrorCategory::Payment);
        assert_eq!(ErrorCategory::from_code(7402), ErrorCategory::Shift);
        assert_eq!(ErrorCategory::from_code(8002), ErrorCategory::Employee);
        assert_eq!(ErrorCategory::from_code(9006), ErrorCategory::System);
        assert_eq!(ErrorCategory::from_code(3001), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::Success.category(), ErrorCategory::General);
        assert_eq!(ErrorCode::TokenExpired.category(), ErrorCategory::Auth);
        assert_eq!(
            ErrorCode::RoleRequestNotPending.category(),
            ErrorCategory::Permission
        );
        assert_eq!(ErrorCode::ClockInTooEarly.category(), ErrorCategory::Shift);
        assert_eq!(
            ErrorCode::CashierNotFound.category(),
            ErrorCategory::Employee
        );
        assert_eq!(
            ErrorCode::StoreIndexMissing.category(),
            ErrorCategory::System
        );
    }

    #[test]
    fn test_category_serde() {
        let json = serde_json::to_string(&ErrorCategory::Shift).unwrap();
        assert_eq!(json, "\"shift\"");
        let category: ErrorCategory = serde_json::from_str("\"permission\"").unwrap();
        assert_eq!(category, ErrorCategory::Permission);
    }
}
