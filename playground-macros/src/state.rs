use convert_case::{Case, Casing};
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, Data, DeriveInput, Error, Fields};

pub fn derive_state_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let vis = &input.vis;
    let update_name = format_ident!("{}Update", name);

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    "State can only be derived for structs with named fields",
                ))
            }
        },
        _ => return Err(Error::new(input.span(), "State can only be derived for structs")),
    };

    let mut update_variants = vec![];
    let mut update_match_arms = vec![];

    for field in fields {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected a named field"))?;
        let field_type = &field.ty;

        let strategy = match field.attrs.iter().find(|attr| attr.path().is_ident("update")) {
            Some(attr) => attr.parse_args::<syn::Ident>()?,
            None => syn::Ident::new("replace", proc_macro2::Span::call_site()),
        };

        let variant_name = format_ident!("{}", field_name.to_string().to_case(Case::Pascal));
        update_variants.push(quote! {
            #variant_name(#field_type)
        });

        let update_impl = match strategy.to_string().as_str() {
            "append" => quote! { self.#field_name.extend(value) },
            "merge" => quote! { self.#field_name.extend(value.into_iter()) },
            "replace" => quote! { self.#field_name = value },
            other => {
                return Err(Error::new(
                    strategy.span(),
                    format!("unknown update strategy `{}`, expected append, merge or replace", other),
                ))
            }
        };

        update_match_arms.push(quote! {
            #update_name::#variant_name(value) => { #update_impl }
        });
    }

    Ok(quote! {
        #[derive(Debug, Clone)]
        #vis enum #update_name {
            #(#update_variants),*
        }

        impl ::playground_core::GraphState for #name {
            type Update = #update_name;

            fn apply(&mut self, update: Self::Update) {
                match update {
                    #(#update_match_arms),*
                }
            }
        }
    })
}
