//! Aggregate operation status.
//!
//! Admin operations validate everything they can before returning, so
//! a caller sees all problems in one round trip instead of fixing them
//! one at a time. Domain rule violations accumulate as [`StatusError`]
//! entries; only infrastructure failures travel as
//! [`AuthGridError`](crate::error::AuthGridError) and are converted at
//! the service boundary into a single generic `System` error.

/// Message surfaced for infrastructure failures. The underlying error
/// is logged server side and never shown to the caller.
pub const SYSTEM_ERROR_MESSAGE: &str =
    "An internal error occurred. Please try again or contact support.";

/// Category of a status error, mirroring the error taxonomy of the
/// admin services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input shape: empty name, forbidden character, invalid email.
    Validation,
    /// A role/tenant/user lookup missed.
    NotFound,
    /// Duplicate name, database already claimed, role-type mismatch.
    Conflict,
    /// Deletion blocked by dependents.
    InUse,
    /// The operation is not supported by the configured tenant mode.
    Configuration,
    /// Infrastructure failure; detail is logged, not surfaced.
    System,
}

/// One error inside a [`Status`], optionally tagged with the offending
/// input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusError {
    pub kind: ErrorKind,
    pub message: String,
    pub field: Option<String>,
}

impl core::fmt::Display for StatusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}: {}", field, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Result of an admin operation: zero or more errors, a human-readable
/// message, and (when valid) a result payload.
#[derive(Debug)]
pub struct Status<T> {
    result: Option<T>,
    errors: Vec<StatusError>,
    message: String,
}

impl<T> Default for Status<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Status<T> {
    pub fn new() -> Self {
        Self {
            result: None,
            errors: Vec::new(),
            message: "Success".into(),
        }
    }

    /// Shortcut for a status that failed with a single error.
    pub fn from_error(kind: ErrorKind, message: impl Into<String>) -> Self {
        let mut status = Self::new();
        status.add_error(kind, message);
        status
    }

    /// The one generic status for infrastructure failures.
    pub fn system_error() -> Self {
        Self::from_error(ErrorKind::System, SYSTEM_ERROR_MESSAGE)
    }

    pub fn add_error(&mut self, kind: ErrorKind, message: impl Into<String>) -> &mut Self {
        self.errors.push(StatusError {
            kind,
            message: message.into(),
            field: None,
        });
        self
    }

    pub fn add_field_error(
        &mut self,
        kind: ErrorKind,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> &mut Self {
        self.errors.push(StatusError {
            kind,
            message: message.into(),
            field: Some(field.into()),
        });
        self
    }

    /// Absorb the errors of another status. Returns the other status's
    /// result so valid sub-results can keep flowing through a larger
    /// operation.
    pub fn combine<U>(&mut self, other: Status<U>) -> Option<U> {
        self.errors.extend(other.errors);
        other.result
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[StatusError] {
        &self.errors
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    /// Attach the success payload. Ignored by callers if the status is
    /// invalid.
    pub fn set_result(&mut self, result: T) {
        self.result = Some(result);
    }

    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    /// Consume the status, yielding the payload only when no error was
    /// recorded.
    pub fn into_result(self) -> Option<T> {
        if self.errors.is_empty() {
            self.result
        } else {
            None
        }
    }
}
