//! Shared helpers for the admin services.

use authgrid_core::error::AuthGridError;
use authgrid_core::status::Status;
use tracing::error;

/// Convert an infrastructure failure into the generic system-error
/// status. The underlying error is logged here and never surfaced.
pub(crate) fn system_status<T>(operation: &str, err: &AuthGridError) -> Status<T> {
    error!(operation, error = %err, "admin operation failed");
    Status::system_error()
}
