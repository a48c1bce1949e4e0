//! Implementation of `#[derive(Describe)]`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    Data, DeriveInput, Error, Field, Fields, GenericParam, Index, LitStr, Result, Visibility,
    parse_quote, parse2,
};

/// How a field is turned into a value.
enum Render {
    Dump,
    Display,
    Debug,
}

struct FieldAttributes {
    skip: bool,
    rename: Option<String>,
    render: Render,
}

pub fn expand(input: TokenStream) -> Result<TokenStream> {
    let mut input: DeriveInput = parse2(input)?;

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        Data::Enum(data) => {
            return Err(Error::new_spanned(
                data.enum_token,
                "Describe can only be derived for structs",
            ));
        }
        Data::Union(data) => {
            return Err(Error::new_spanned(
                data.union_token,
                "Describe can only be derived for structs",
            ));
        }
    };

    let statements = field_statements(fields)?;

    for param in &mut input.generics.params {
        if let GenericParam::Type(ty) = param {
            ty.bounds.push(parse_quote!(::reportkit::dump::Dump));
        }
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics ::reportkit::dump::Describe for #name #ty_generics #where_clause {
            fn describe(&self, fields: &mut ::reportkit::dump::Fields) {
                #(#statements)*
            }
        }

        #[automatically_derived]
        impl #impl_generics ::reportkit::dump::Dump for #name #ty_generics #where_clause {
            fn dump_value(&self) -> ::reportkit::dump::Value {
                ::reportkit::dump::Value::nested(self)
            }
        }
    })
}

fn field_statements(fields: &Fields) -> Result<Vec<TokenStream>> {
    let mut statements = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let attrs = parse_field_attributes(field)?;
        if attrs.skip || !matches!(field.vis, Visibility::Public(_)) {
            continue;
        }

        let (member, default_name) = match &field.ident {
            Some(ident) => (quote!(#ident), ident.to_string()),
            None => {
                let index = Index::from(index);
                (quote!(#index), index.index.to_string())
            }
        };
        let name = attrs.rename.unwrap_or(default_name);
        let name = name.strip_prefix("r#").unwrap_or(&name);

        let method = match attrs.render {
            Render::Dump => quote!(field),
            Render::Display => quote!(field_display),
            Render::Debug => quote!(field_debug),
        };
        statements.push(quote! {
            fields.#method(#name, &self.#member);
        });
    }

    Ok(statements)
}

fn parse_field_attributes(field: &Field) -> Result<FieldAttributes> {
    let mut attrs = FieldAttributes {
        skip: false,
        rename: None,
        render: Render::Dump,
    };

    for attr in &field.attrs {
        if !attr.path().is_ident("describe") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                attrs.skip = true;
            } else if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.rename = Some(value.value());
            } else if meta.path.is_ident("display") {
                attrs.render = Render::Display;
            } else if meta.path.is_ident("debug") {
                attrs.render = Render::Debug;
            } else {
                return Err(meta.error(
                    "Unknown attribute. Expected: skip, rename = \"...\", display or debug",
                ));
            }
            Ok(())
        })?;
    }

    Ok(attrs)
}
