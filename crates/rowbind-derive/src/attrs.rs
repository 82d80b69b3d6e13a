//! Parsing of struct-level and field-level `#[orm(...)]` attributes.

use heck::{ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use syn::punctuated::Punctuated;
use syn::{Attribute, Expr, ExprLit, Lit, LitStr, Meta, Result};

/// Column naming rule from `#[orm(rename_all = "...")]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RenameRule {
    SnakeCase,
    Lowercase,
    Uppercase,
    CamelCase,
    PascalCase,
    ScreamingSnakeCase,
}

impl RenameRule {
    fn parse(lit: &LitStr) -> Result<Self> {
        Ok(match lit.value().as_str() {
            "snake_case" => Self::SnakeCase,
            "lowercase" => Self::Lowercase,
            "UPPERCASE" => Self::Uppercase,
            "camelCase" => Self::CamelCase,
            "PascalCase" => Self::PascalCase,
            "SCREAMING_SNAKE_CASE" => Self::ScreamingSnakeCase,
            other => {
                return Err(syn::Error::new(
                    lit.span(),
                    format!(
                        "unknown rename_all rule '{other}' (expected snake_case, lowercase, \
                         UPPERCASE, camelCase, PascalCase or SCREAMING_SNAKE_CASE)"
                    ),
                ));
            }
        })
    }

    pub(crate) fn apply(self, field: &str) -> String {
        match self {
            Self::SnakeCase => field.to_snake_case(),
            Self::Lowercase => field.to_lowercase(),
            Self::Uppercase => field.to_uppercase(),
            Self::CamelCase => field.to_lower_camel_case(),
            Self::PascalCase => field.to_upper_camel_case(),
            Self::ScreamingSnakeCase => field.to_shouty_snake_case(),
        }
    }
}

/// Struct-level options.
#[derive(Debug, Default)]
pub(crate) struct StructAttrs {
    pub rename_all: Option<RenameRule>,
}

/// Field-level options.
#[derive(Debug, Default)]
pub(crate) struct FieldAttrs {
    pub column: Option<LitStr>,
}

fn orm_metas(attrs: &[Attribute]) -> Result<Vec<Meta>> {
    let mut metas = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let nested =
            attr.parse_args_with(Punctuated::<Meta, syn::Token![,]>::parse_terminated)?;
        metas.extend(nested);
    }
    Ok(metas)
}

fn str_value<'a>(meta: &'a Meta, key: &str) -> Result<&'a LitStr> {
    if let Meta::NameValue(nv) = meta {
        if let Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) = &nv.value
        {
            return Ok(s);
        }
    }
    Err(syn::Error::new_spanned(
        meta,
        format!("expected `{key} = \"...\"`"),
    ))
}

pub(crate) fn parse_struct_attrs(attrs: &[Attribute]) -> Result<StructAttrs> {
    let mut out = StructAttrs::default();
    for meta in orm_metas(attrs)? {
        if meta.path().is_ident("rename_all") {
            out.rename_all = Some(RenameRule::parse(str_value(&meta, "rename_all")?)?);
        } else {
            return Err(syn::Error::new_spanned(
                meta.path(),
                "unknown struct attribute (expected `rename_all`)",
            ));
        }
    }
    Ok(out)
}

pub(crate) fn parse_field_attrs(attrs: &[Attribute]) -> Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for meta in orm_metas(attrs)? {
        if meta.path().is_ident("column") {
            out.column = Some(str_value(&meta, "column")?.clone());
        } else {
            return Err(syn::Error::new_spanned(
                meta.path(),
                "unknown field attribute (expected `column`)",
            ));
        }
    }
    Ok(out)
}
