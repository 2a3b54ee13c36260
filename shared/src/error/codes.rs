//! Unified error codes for the Till workspace
//!
//! This module defines all error codes used by pos-server and its clients.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission / role elevation errors
//! - 5xxx: Payment errors
//! - 7xxx: Shift, attendance and break errors
//! - 8xxx: Employee errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,
    /// No role request on file for the user
    RoleRequestNotFound = 2101,
    /// Role request was already approved or denied
    RoleRequestNotPending = 2102,
    /// Elevation duration is not one of the allowed values
    InvalidElevationDuration = 2103,
    /// Another role operation for the same user is still running
    RoleOperationInProgress = 2104,

    // ==================== 5xxx: Payment ====================
    /// Payment processing failed
    PaymentFailed = 5001,
    /// Refund not found
    RefundNotFound = 5006,

    // ==================== 7xxx: Shift ====================
    /// Shift not found
    ShiftNotFound = 7201,
    /// Shift is not active
    ShiftNotActive = 7202,
    /// Shift belongs to another employee
    ShiftNotAssigned = 7203,
    /// End time is not after start time
    ShiftInvalidTimeRange = 7204,
    /// Start time lies in the past
    ShiftStartInPast = 7205,
    /// Attendance record not found
    AttendanceNotFound = 7301,
    /// Already clocked in for the shift
    AlreadyClockedIn = 7302,
    /// Clock-in attempted before the shift starts
    ClockInTooEarly = 7303,
    /// Clock-in attempted after the shift ends
    ClockInTooLate = 7304,
    /// Attendance record already closed
    AlreadyClockedOut = 7305,
    /// Attendance id missing
    AttendanceIdRequired = 7306,
    /// No open attendance record
    NotClockedIn = 7307,
    /// Break not found
    BreakNotFound = 7401,
    /// Another break is active or paused
    BreakInProgress = 7402,
    /// Break status transition is not allowed
    BreakInvalidTransition = 7403,
    /// Break id missing
    BreakIdRequired = 7404,

    // ==================== 8xxx: Employee ====================
    /// Employee not found
    EmployeeNotFound = 8001,
    /// Cashier user record not found
    CashierNotFound = 8002,
    /// Notification not found
    NotificationNotFound = 8201,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// Query needs a store index that is not configured
    StoreIndexMissing = 9006,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",
            ErrorCode::RoleRequestNotFound => "Role request not found",
            ErrorCode::RoleRequestNotPending => "Role request has already been decided",
            ErrorCode::InvalidElevationDuration => "Duration must be 30, 60, 120 or 240 minutes",
            ErrorCode::RoleOperationInProgress => "Another role change is still in progress",

            // Payment
            ErrorCode::PaymentFailed => "Payment processing failed",
            ErrorCode::RefundNotFound => "Refund not found",

            // Shift
            ErrorCode::ShiftNotFound => "Shift not found",
            ErrorCode::ShiftNotActive => "Shift is not active",
            ErrorCode::ShiftNotAssigned => "This shift is not assigned to you",
            ErrorCode::ShiftInvalidTimeRange => "End time must be after start time",
            ErrorCode::ShiftStartInPast => "Start time cannot be in the past",
            ErrorCode::AttendanceNotFound => "Attendance record not found",
            ErrorCode::AlreadyClockedIn => "Already clocked in for this shift",
            ErrorCode::ClockInTooEarly => "Cannot clock in before shift starts",
            ErrorCode::ClockInTooLate => "Cannot clock in after shift ends",
            ErrorCode::AlreadyClockedOut => "Already clocked out",
            ErrorCode::AttendanceIdRequired => "Attendance ID is required",
            ErrorCode::NotClockedIn => "You must be clocked in to start a break",
            ErrorCode::BreakNotFound => "Break not found",
            ErrorCode::BreakInProgress => "A break is already in progress",
            ErrorCode::BreakInvalidTransition => "Invalid break transition",
            ErrorCode::BreakIdRequired => "Break ID is required",

            // Employee
            ErrorCode::EmployeeNotFound => "Employee not found",
            ErrorCode::CashierNotFound => "Cashier record not found",
            ErrorCode::NotificationNotFound => "Notification not found",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::StoreIndexMissing => {
                "This view needs a database index that is not configured yet. Please contact your administrator."
            }
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),
            2101 => Ok(ErrorCode::RoleRequestNotFound),
            2102 => Ok(ErrorCode::RoleRequestNotPending),
            2103 => Ok(ErrorCode::InvalidElevationDuration),
            2104 => Ok(ErrorCode::RoleOperationInProgress),

            // Payment
            5001 => Ok(ErrorCode::PaymentFailed),
            5006 => Ok(ErrorCode::RefundNotFound),

            // Shift
            7201 => Ok(ErrorCode::ShiftNotFound),
            7202 => Ok(ErrorCode::ShiftNotActive),
            7203 => Ok(ErrorCode::ShiftNotAssigned),
            7204 => Ok(ErrorCode::ShiftInvalidTimeRange),
            7205 => Ok(ErrorCode::ShiftStartInPast),
            7301 => Ok(ErrorCode::AttendanceNotFound),
            7302 => Ok(ErrorCode::AlreadyClockedIn),
            7303 => Ok(ErrorCode::ClockInTooEarly),
            7304 => Ok(ErrorCode::ClockInTooLate),
            7305 => Ok(ErrorCode::AlreadyClockedOut),
            7306 => Ok(ErrorCode::AttendanceIdRequired),
            7307 => Ok(ErrorCode::NotClockedIn),
            7401 => Ok(ErrorCode::BreakNotFound),
            7402 => Ok(ErrorCode::BreakInProgress),
            7403 => Ok(ErrorCode::BreakInvalidTransition),
            7404 => Ok(ErrorCode::BreakIdRequired),

            // Employee
            8001 => Ok(ErrorCode::EmployeeNotFound),
            8002 => Ok(ErrorCode::CashierNotFound),
            8201 => Ok(ErrorCode::NotificationNotFound),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),
            9006 => Ok(ErrorCode::StoreIndexMissing),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::RoleRequired.code(), 2002);
        assert_eq!(ErrorCode::InvalidElevationDuration.code(), 2103);
        assert_eq!(ErrorCode::PaymentFailed.code(), 5001);
        assert_eq!(ErrorCode::ShiftNotFound.code(), 7201);
        assert_eq!(ErrorCode::AlreadyClockedIn.code(), 7302);
        assert_eq!(ErrorCode::BreakInProgress.code(), 7402);
        assert_eq!(ErrorCode::CashierNotFound.code(), 8002);
        assert_eq!(ErrorCode::StoreIndexMissing.code(), 9006);
    }

    #[test]
    fn test_try_from_roundtrip() {
        let codes = [
            ErrorCode::Success,
            ErrorCode::TokenExpired,
            ErrorCode::RoleOperationInProgress,
            ErrorCode::RefundNotFound,
            ErrorCode::ClockInTooLate,
            ErrorCode::NotClockedIn,
            ErrorCode::BreakIdRequired,
            ErrorCode::NotificationNotFound,
            ErrorCode::StoreIndexMissing,
        ];
        for code in codes {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_invalid_code() {
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
        assert_eq!(
            InvalidErrorCode(4242).to_string(),
            "invalid error code: 4242"
        );
    }

    #[test]
    fn test_clock_in_messages_are_distinct() {
        let messages = [
            ErrorCode::ShiftNotFound.message(),
            ErrorCode::ShiftNotActive.message(),
            ErrorCode::ShiftNotAssigned.message(),
            ErrorCode::CashierNotFound.message(),
            ErrorCode::AlreadyClockedIn.message(),
            ErrorCode::ClockInTooEarly.message(),
            ErrorCode::ClockInTooLate.message(),
        ];
        let unique: std::collections::HashSet<_> = messages.iter().collect();
        assert_eq!(unique.len(), messages.len());
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::ShiftNotActive).unwrap();
        assert_eq!(json, "7202");
        let code: ErrorCode = serde_json::from_str("7305").unwrap();
        assert_eq!(code, ErrorCode::AlreadyClockedOut);
    }
}
