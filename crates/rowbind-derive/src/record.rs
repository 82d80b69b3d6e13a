//! Record derive macro implementation

use crate::common::fields::collect;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let specs = collect(&input, "Record")?;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let columns = specs.iter().map(|f| {
        let ty = f.ty;
        let column = &f.column;
        quote! { ::rowbind::Column::of::<#ty>(#column) }
    });

    let values = specs.iter().enumerate().map(|(idx, f)| {
        let ident = f.ident;
        quote! { ::rowbind::FieldValue::of(Self::COLUMNS[#idx], &self.#ident) }
    });

    Ok(quote! {
        impl #impl_generics ::rowbind::Record for #name #ty_generics #where_clause {
            const COLUMNS: &'static [::rowbind::Column] = &[#(#columns),*];

            fn fields(&self) -> ::std::vec::Vec<::rowbind::FieldValue> {
                ::std::vec![#(#values),*]
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn emits_one_column_per_field() {
        let input: DeriveInput = parse_quote! {
            struct UserFilter { name: String, age: Option<i32> }
        };
        let out = expand(input).unwrap().to_string();
        assert!(out.contains("Column :: of :: < String > (\"name\")"));
        assert!(out.contains("Column :: of :: < Option < i32 > > (\"age\")"));
        assert!(out.contains("Self :: COLUMNS [1usize]"));
    }
}
