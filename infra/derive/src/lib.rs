#![allow(unreachable_pub)]

//! # Macros
//!
//! Procedural macros shared by the crumb crates.
//!
//! Only one macro lives here for now: [`crumb_error`], which every crate in the workspace uses to
//! declare its error enum.

mod error;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro for declaring a crate-level error enum.
///
/// # Generated items
///
/// * `#[derive(Debug, thiserror::Error)]`, unless the enum already derives them.
/// * An `<ErrorName>Ext` trait with `.context(..)`, implemented for `Result<T, ErrorName>` and for
///   `Result<T, Source>` of every variant that wraps a `source` error.
/// * `From<Source>` for every variant with a `source` field (or a field marked `#[source]` /
///   `#[from]`).
/// * `From<&'static str>` and `From<String>` when an `Internal { message, context }` variant exists.
/// * A module-private `format_context` helper for the `#[error(..)]` strings.
///
/// # Requirements
///
/// * Applied to an enum whose variants all have named fields.
/// * A `context` field, when present, must be `Option<Cow<'static, str>>`.
/// * A variant wrapping a source error must also carry a `context` field.
///
/// # Example
///
/// ```rust,ignore
/// use crumb_derive::crumb_error;
/// use std::borrow::Cow;
///
/// #[crumb_error]
/// pub enum StoreError {
///     #[error("IO error{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn load(path: &str) -> Result<String, StoreError> {
///     std::fs::read_to_string(path).context("Reading store file")
/// }
/// ```
#[proc_macro_attribute]
pub fn crumb_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    error::expand(input).into()
}
