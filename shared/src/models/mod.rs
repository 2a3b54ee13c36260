//! Data Models
//!
//! Documents persisted in the store. All timestamps are Unix millis and
//! field names are camelCase on the wire. The optional `id` is filled from
//! the document key on read and never written into the document body.

pub mod analytics;
pub mod attendance;
pub mod breaks;
pub mod notification;
pub mod role;
pub mod shift;
pub mod user;

pub use analytics::ShiftAnalytics;
pub use attendance::{AttendanceRecord, AttendanceStatus, ClockInRequest};
pub use breaks::{BreakRecord, BreakStart, BreakStatus, BreakTransition, BreakType};
pub use notification::Notification;
pub use role::{
    ElevationDuration, RoleElevationRecord, RoleRequest, RoleRequestCreate, RoleRequestStatus,
    UserRole,
};
pub use shift::{Shift, ShiftCreate, ShiftStatus, ShiftUpdate, ShiftWindow};
pub use user::UserProfile;
