//! FromRow derive macro implementation

use crate::common::fields::collect;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let specs = collect(&input, "FromRow")?;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let field_extracts = specs.iter().enumerate().map(|(idx, f)| {
        let ident = f.ident;
        let ty = f.ty;
        quote! { #ident: row.get_at::<#ty>(#idx)? }
    });

    Ok(quote! {
        impl #impl_generics ::rowbind::FromRow for #name #ty_generics #where_clause {
            fn from_row<__R: ::rowbind::Row + ?::std::marker::Sized>(
                row: &__R,
            ) -> ::rowbind::OrmResult<Self> {
                ::rowbind::check_arity::<Self, __R>(row)?;
                ::std::result::Result::Ok(Self {
                    #(#field_extracts),*
                })
            }
        }
    })
}
