//! Error handling utilities for repositories

use flock_core::error::DomainError;
use sqlx::Error as SqlxError;

/// Convert SQLx error to DomainError.
///
/// Any storage failure surfaces as `LedgerUnavailable`; callers treat it as
/// batch-fatal and show a generic retry message while the detail is logged.
pub fn map_db_error(e: SqlxError) -> DomainError {
    DomainError::LedgerUnavailable(e.to_string())
}
