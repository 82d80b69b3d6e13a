//! Field collection shared by both derives, so their column order always agrees.

use crate::attrs::{parse_field_attrs, parse_struct_attrs};
use crate::common::syn_types::is_nested_option;
use crate::sql_ident::{parse_sql_ident, parse_sql_ident_with_span};
use std::collections::HashSet;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, Ident, Result, Type};

/// One struct field and the column it maps to.
pub struct FieldSpec<'a> {
    pub ident: &'a Ident,
    pub ty: &'a Type,
    pub column: String,
}

/// Collect the named fields of `input` in declaration order.
pub fn collect<'a>(input: &'a DeriveInput, derive: &str) -> Result<Vec<FieldSpec<'a>>> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    format!("{derive} can only be derived for structs with named fields"),
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                format!("{derive} can only be derived for structs"),
            ));
        }
    };

    let struct_attrs = parse_struct_attrs(&input.attrs)?;
    let mut seen = HashSet::new();
    let mut specs = Vec::with_capacity(fields.len());

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        if is_nested_option(&field.ty) {
            return Err(syn::Error::new_spanned(
                &field.ty,
                "Option<Option<T>> is ambiguous here; use Option<T> for a nullable column",
            ));
        }

        let attrs = parse_field_attrs(&field.attrs)?;
        let column = match &attrs.column {
            Some(lit) => parse_sql_ident(lit, "column")?,
            None => {
                let name = ident.to_string();
                let name = name.strip_prefix("r#").unwrap_or(&name);
                let name = match struct_attrs.rename_all {
                    Some(rule) => rule.apply(name),
                    None => name.to_string(),
                };
                parse_sql_ident_with_span(&name, ident.span(), "column")?
            }
        };

        if !seen.insert(column.clone()) {
            return Err(syn::Error::new(
                field.span(),
                format!("duplicate column '{column}'"),
            ));
        }

        specs.push(FieldSpec {
            ident,
            ty: &field.ty,
            column,
        });
    }

    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn columns(input: &DeriveInput) -> Vec<String> {
        collect(input, "Record")
            .unwrap()
            .into_iter()
            .map(|f| f.column)
            .collect()
    }

    #[test]
    fn keeps_declaration_order() {
        let input: DeriveInput = parse_quote! {
            struct User { id: i64, name: String, age: i32 }
        };
        assert_eq!(columns(&input), ["id", "name", "age"]);
    }

    #[test]
    fn column_attr_wins_over_rename_all() {
        let input: DeriveInput = parse_quote! {
            #[orm(rename_all = "UPPERCASE")]
            struct Abc {
                a: String,
                #[orm(column = "Bee")]
                b: i32,
                c: f64,
            }
        };
        assert_eq!(columns(&input), ["A", "Bee", "C"]);
    }

    #[test]
    fn rejects_tuple_structs_and_enums() {
        let input: DeriveInput = parse_quote!(struct T(i32, String););
        assert!(collect(&input, "Record").is_err());

        let input: DeriveInput = parse_quote!(enum E { A, B });
        assert!(collect(&input, "FromRow").is_err());
    }

    #[test]
    fn rejects_nested_option() {
        let input: DeriveInput = parse_quote! {
            struct S { v: Option<Option<i32>> }
        };
        assert!(collect(&input, "Record").is_err());
    }

    #[test]
    fn rejects_duplicate_and_invalid_columns() {
        let input: DeriveInput = parse_quote! {
            struct S {
                a: i32,
                #[orm(column = "a")]
                b: i32,
            }
        };
        assert!(collect(&input, "Record").is_err());

        let input: DeriveInput = parse_quote! {
            struct S {
                #[orm(column = "a b")]
                a: i32,
            }
        };
        assert!(collect(&input, "Record").is_err());
    }
}
