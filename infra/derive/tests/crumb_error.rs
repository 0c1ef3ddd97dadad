use crumb_derive::crumb_error;
use std::borrow::Cow;

#[crumb_error]
pub enum StoreError {
    #[error("Parse error{}: {source}", format_context(.context))]
    Parse { source: std::num::ParseIntError, context: Option<Cow<'static, str>> },

    #[error("Missing entry{}: {message}", format_context(.context))]
    Missing { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal store error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn parse(raw: &str) -> Result<i64, StoreError> {
    raw.parse::<i64>().context("Reading counter")
}

#[test]
fn crumb_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/crumb_error_pass.rs");
}

#[test]
fn source_errors_convert_with_and_without_context() {
    let err = parse("not-a-number").unwrap_err();
    assert!(matches!(err, StoreError::Parse { context: Some(_), .. }));
    assert!(err.to_string().starts_with("Parse error (Reading counter): "));

    let plain: StoreError = "x".parse::<i64>().unwrap_err().into();
    assert!(matches!(plain, StoreError::Parse { context: None, .. }));
}

#[test]
fn context_is_attached_to_existing_errors() {
    let missing: Result<(), StoreError> =
        Err(StoreError::Missing { message: "alias".into(), context: None });

    let err = missing.context("Looking up cookie").unwrap_err();
    assert_eq!(err.to_string(), "Missing entry (Looking up cookie): alias");
}

#[test]
fn strings_become_internal_errors() {
    let from_static: StoreError = "boom".into();
    let from_owned: StoreError = String::from("bang").into();

    assert_eq!(from_static.to_string(), "Internal store error: boom");
    assert_eq!(from_owned.to_string(), "Internal store error: bang");
}
