extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::parse::{ParseStream, Parser};
use syn::punctuated::Punctuated;
use syn::{Attribute, Data, DeriveInput, Expr, Fields, Lit, Meta, Token, parse_macro_input};

/// Declares a table from a struct.
///
/// ```ignore
/// #[model(tablename = "users")]
/// struct User {
///     #[column(Serial::default(), primary_key)]
///     id: Option<i64>,
///     #[column(Text::varchar(64), unique, index = Index::new().unique(false))]
///     email: String,
/// }
/// ```
///
/// The first `column` argument is the column type; the rest are `primary_key`,
/// `unique`, `nullable`, `index`, `index = <Index>`, `name = "..."` and
/// `default = <value>`. Fields without `#[column]` are not columns.
#[proc_macro_attribute]
pub fn model(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut input = parse_macro_input!(item as DeriveInput);

    match expand(attr.into(), &mut input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(attr: TokenStream2, input: &mut DeriveInput) -> syn::Result<TokenStream2> {
    // -------- tablename parsing --------
    let mut tablename: Option<String> = None;
    let metas = Punctuated::<Meta, Token![,]>::parse_terminated.parse2(attr)?;
    for meta in metas {
        match meta {
            Meta::NameValue(nv) if nv.path.is_ident("tablename") => {
                tablename = Some(lit_str(&nv.value)?);
            }
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "expected `tablename = \"...\"`",
                ));
            }
        }
    }

    // -------- fields --------
    let fields = match &mut input.data {
        Data::Struct(s) => match &mut s.fields {
            Fields::Named(named) => &mut named.named,
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "#[model] requires named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "#[model] can only be used on structs",
            ));
        }
    };

    let mut columns = Vec::new();
    for field in fields.iter_mut() {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let field_name = ident.unraw().to_string();

        let mut column_attrs = Vec::new();
        field.attrs.retain(|attr| {
            if attr.path().is_ident("column") {
                column_attrs.push(attr.clone());
                false
            } else {
                true
            }
        });

        match column_attrs.as_slice() {
            [] => {}
            [attr] => {
                let column = column_builder(attr)?;
                columns.push(quote! {
                    .column(
                        #field_name,
                        #column.build().map_err(|e| e.in_column(#field_name))?,
                    )
                });
            }
            [_, extra, ..] => {
                return Err(syn::Error::new_spanned(
                    extra,
                    "a field can only carry one #[column]",
                ));
            }
        }
    }

    let struct_name = &input.ident;
    let type_name = struct_name.unraw().to_string();
    let tablename = tablename.map(|name| quote! { .tablename(#name) });
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // -------- generate output --------
    Ok(quote! {
        #input

        impl #impl_generics ::postdb::Model for #struct_name #ty_generics #where_clause {
            fn definition() -> ::postdb::Result<::postdb::TableDef> {
                ::core::result::Result::Ok(
                    ::postdb::TableDef::new(#type_name)
                        #tablename
                        #(#columns)*
                )
            }
        }
    })
}

fn column_builder(attr: &Attribute) -> syn::Result<TokenStream2> {
    let (column_type, metas) = attr.parse_args_with(|input: ParseStream| {
        let column_type: Expr = input.parse()?;
        let mut metas = Vec::new();
        while !input.is_empty() {
            input.parse::<Token![,]>()?;
            if input.is_empty() {
                break;
            }
            metas.push(input.parse::<Meta>()?);
        }
        Ok((column_type, metas))
    })?;

    let mut builder = quote! { ::postdb::Column::builder(#column_type) };
    for meta in metas {
        builder = match meta {
            Meta::Path(path) => {
                let ident = path
                    .get_ident()
                    .ok_or_else(|| syn::Error::new_spanned(&path, "unknown column option"))?
                    .to_string();
                match ident.as_str() {
                    "primary_key" => quote! { #builder.primary_key() },
                    "unique" => quote! { #builder.unique() },
                    "nullable" => quote! { #builder.nullable() },
                    "index" => quote! { #builder.index() },
                    _ => return Err(syn::Error::new_spanned(path, "unknown column option")),
                }
            }
            Meta::NameValue(nv) => {
                let ident = nv
                    .path
                    .get_ident()
                    .ok_or_else(|| syn::Error::new_spanned(&nv.path, "unknown column option"))?
                    .to_string();
                let value = &nv.value;
                match ident.as_str() {
                    "name" => {
                        let name = lit_str(value)?;
                        quote! { #builder.name(#name) }
                    }
                    "default" => quote! { #builder.default(#value) },
                    "index" => quote! { #builder.with_index(#value) },
                    _ => return Err(syn::Error::new_spanned(nv.path, "unknown column option")),
                }
            }
            Meta::List(list) => {
                return Err(syn::Error::new_spanned(list, "unknown column option"));
            }
        };
    }

    Ok(builder)
}

fn lit_str(expr: &Expr) -> syn::Result<String> {
    if let Expr::Lit(expr_lit) = expr {
        if let Lit::Str(litstr) = &expr_lit.lit {
            return Ok(litstr.value());
        }
    }
    Err(syn::Error::new_spanned(expr, "expected a string literal"))
}
