use proc_macro2::TokenStream;
use quote::quote;
use syn::{parse2, Data, DeriveInput, Result};

use crate::syn_utils::{find_marker, single_unnamed_field};

pub fn derive_embed(input: TokenStream) -> Result<TokenStream> {
    let input: DeriveInput = parse2(input)?;
    let Data::Enum(data) = &input.data else {
        bail!(input.ident.span(), "`#[derive(Embed)]` supports only enums");
    };
    let this = &input.ident;
    let (impl_g, type_g, where_c) = input.generics.split_for_impl();

    let mut items = Vec::new();
    for variant in &data.variants {
        if find_marker(&variant.attrs, "embed")?.is_none() {
            continue;
        }
        let ident = &variant.ident;
        let Some(ty) = single_unnamed_field(&variant.fields) else {
            bail!(
                ident.span(),
                "`#[embed]` variant must have exactly one unnamed field"
            );
        };
        items.push(quote! {
            impl #impl_g ::uniflow::Embed<#ty> for #this #type_g #where_c {
                fn embed(child: #ty) -> Self {
                    Self::#ident(child)
                }
                fn extract(self) -> ::core::result::Result<#ty, Self> {
                    #[allow(unreachable_patterns)]
                    match self {
                        Self::#ident(child) => ::core::result::Result::Ok(child),
                        other => ::core::result::Result::Err(other),
                    }
                }
            }
            impl #impl_g ::core::convert::From<#ty> for #this #type_g #where_c {
                fn from(child: #ty) -> Self {
                    Self::#ident(child)
                }
            }
        });
    }
    if items.is_empty() {
        bail!(
            _,
            "`#[derive(Embed)]` requires at least one variant marked with `#[embed]`"
        );
    }
    Ok(quote!(#(#items)*))
}
