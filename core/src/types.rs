//! Shared primitive types used across the desk.

/// Row id of a lead.
pub type LeadId = i64;

/// Row id of an application user.
pub type UserId = i64;

/// Row id of a team.
pub type TeamId = i64;

/// Row id of any reference table (insurance, product, center code).
pub type RefId = i64;

/// Identifier shared by every row touched in one bulk operation.
pub type BatchId = String;
