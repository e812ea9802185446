//! Tests for the aggregate Status type.

use authgrid_core::status::{ErrorKind, SYSTEM_ERROR_MESSAGE, Status};

#[test]
fn new_status_is_valid_with_default_message() {
    let status: Status<()> = Status::new();
    assert!(status.is_valid());
    assert_eq!(status.message(), "Success");
}

#[test]
fn errors_accumulate() {
    let mut status: Status<i32> = Status::new();
    status.add_error(ErrorKind::Validation, "first problem");
    status.add_field_error(ErrorKind::NotFound, "role", "second problem");

    assert!(!status.is_valid());
    assert_eq!(status.errors().len(), 2);
    assert_eq!(status.errors()[1].field.as_deref(), Some("role"));
    assert_eq!(format!("{}", status.errors()[1]), "role: second problem");
}

#[test]
fn into_result_yields_payload_only_when_valid() {
    let mut ok: Status<i32> = Status::new();
    ok.set_result(42);
    assert_eq!(ok.into_result(), Some(42));

    let mut bad: Status<i32> = Status::new();
    bad.set_result(42);
    bad.add_error(ErrorKind::Conflict, "nope");
    assert_eq!(bad.into_result(), None);
}

#[test]
fn combine_merges_errors_and_passes_the_sub_result() {
    let mut outer: Status<String> = Status::new();

    let mut good_sub: Status<i32> = Status::new();
    good_sub.set_result(7);
    assert_eq!(outer.combine(good_sub), Some(7));
    assert!(outer.is_valid());

    let mut bad_sub: Status<i32> = Status::new();
    bad_sub.add_error(ErrorKind::NotFound, "missing");
    bad_sub.add_error(ErrorKind::NotFound, "also missing");
    outer.combine(bad_sub);
    assert_eq!(outer.errors().len(), 2);
}

#[test]
fn system_error_is_generic() {
    let status: Status<()> = Status::system_error();
    assert_eq!(status.errors().len(), 1);
    assert_eq!(status.errors()[0].kind, ErrorKind::System);
    assert_eq!(status.errors()[0].message, SYSTEM_ERROR_MESSAGE);
}
