//! Derive macros for rowbind
//!
//! Provides `#[derive(Record)]` and `#[derive(FromRow)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod common;
mod from_row;
mod record;
mod sql_ident;

/// Derive the `Record` descriptor for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use rowbind::Record;
///
/// #[derive(Record)]
/// #[orm(rename_all = "snake_case")]
/// struct UserFilter {
///     userName: String,
///     #[orm(column = "years")]
///     age: i32,
///     email: Option<String>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[orm(rename_all = "...")]` - Column naming rule for every field:
///   `snake_case`, `lowercase`, `UPPERCASE`, `camelCase`, `PascalCase`,
///   `SCREAMING_SNAKE_CASE`. Without it the field name is used as-is.
/// - `#[orm(column = "name")]` - Map one field to a different column name
///
/// Every field type must implement `rowbind::SqlType`: `String`, `bool`,
/// `f32`/`f64`, integers up to `i64` (`u8`/`u16`/`u32` included; `u64`,
/// `usize` and `i128` are rejected), chrono dates and timestamps,
/// `uuid::Uuid` and `serde_json::Value`. `Option<T>` marks a nullable column
/// that is unset only when `None`.
#[proc_macro_derive(Record, attributes(orm))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive `FromRow` for a struct with named fields.
///
/// Columns are bound by position in field order, so the struct must also
/// derive (or implement) `Record`; the row's column count is checked against
/// the record's descriptor before any field is decoded.
///
/// # Example
///
/// ```ignore
/// use rowbind::{FromRow, Record};
///
/// #[derive(Record, FromRow)]
/// struct User {
///     id: i64,
///     name: String,
///     email: Option<String>,
/// }
/// ```
#[proc_macro_derive(FromRow, attributes(orm))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
