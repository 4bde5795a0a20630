//! Derive macro for `envscan::EnvRecord`.
//!
//! The generated impl carries a static field table (name, env key, kind) and a
//! slot accessor handing out typed `&mut` references into the struct, so the
//! binder never needs runtime type introspection.

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{ToTokens, format_ident, quote};
use syn::ext::IdentExt;
use syn::{
    Attribute, Data, DeriveInput, Field, Fields, GenericArgument, Ident, LitStr, PathArguments,
    Type,
};

/// Derive `envscan::EnvRecord` (and `envscan::EnvTarget`) for a struct with
/// named fields.
///
/// Each field names its environment variable with `#[env(key = "NAME")]`.
/// Fields without a key are still part of the table and fail at bind time.
#[proc_macro_derive(EnvRecord, attributes(env))]
pub fn derive_env_record(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match expand_env_record(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_env_record(input: &DeriveInput) -> Result<proc_macro2::TokenStream, syn::Error> {
    reject_container_attrs(&input.attrs)?;
    let Data::Struct(struct_data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "EnvRecord can only be derived for structs",
        ));
    };

    let fields: Vec<&Field> = match &struct_data.fields {
        Fields::Named(fields) => fields.named.iter().collect(),
        Fields::Unit => Vec::new(),
        Fields::Unnamed(_) => {
            return Err(syn::Error::new_spanned(
                &struct_data.fields,
                "EnvRecord requires named fields",
            ));
        },
    };

    let mut descriptors = Vec::with_capacity(fields.len());
    let mut slot_arms = Vec::with_capacity(fields.len());
    for (index, field) in fields.into_iter().enumerate() {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let key = parse_env_key(&field.attrs)?;
        let field_type = classify(&field.ty);
        descriptors.push(expand_descriptor(ident, key.as_ref(), &field_type));
        let slot = expand_slot(ident, &field_type);
        slot_arms.push(quote! {
            #index => ::core::option::Option::Some(#slot),
        });
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics envscan::EnvRecord for #name #ty_generics #where_clause {
            fn fields(&self) -> &'static [envscan::FieldDescriptor] {
                static FIELDS: &[envscan::FieldDescriptor] = &[#(#descriptors),*];
                FIELDS
            }

            fn slot(&mut self, index: usize) -> ::core::option::Option<envscan::FieldSlot<'_>> {
                match index {
                    #(#slot_arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl #impl_generics envscan::EnvTarget for #name #ty_generics #where_clause {
            fn as_record(&mut self) -> ::core::option::Option<&mut dyn envscan::EnvRecord> {
                ::core::option::Option::Some(self)
            }
        }
    })
}

fn reject_container_attrs(attrs: &[Attribute]) -> Result<(), syn::Error> {
    for attr in attrs {
        if attr.path().is_ident("env") {
            return Err(syn::Error::new_spanned(
                attr,
                "env attributes belong on fields, not on the struct",
            ));
        }
    }
    Ok(())
}

fn parse_env_key(attrs: &[Attribute]) -> Result<Option<LitStr>, syn::Error> {
    let mut key: Option<LitStr> = None;
    for attr in attrs {
        if !attr.path().is_ident("env") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("key") {
                let value: LitStr = meta.value()?.parse()?;
                if key.is_some() {
                    return Err(meta.error("duplicate env(key = ...)"));
                }
                key = Some(value);
                return Ok(());
            }
            Err(meta.error("unsupported env attribute on field"))
        })?;
    }
    Ok(key)
}

#[derive(Debug, PartialEq, Eq)]
enum FieldType {
    Str,
    Bool,
    /// Variant name shared by `IntWidth` and `IntSlot`.
    Int(&'static str),
    StrSeq,
    /// `[String; N]`, labeled as written.
    StrArray(String),
    Unsupported(String),
}

fn expand_descriptor(
    ident: &Ident,
    key: Option<&LitStr>,
    field_type: &FieldType,
) -> proc_macro2::TokenStream {
    let name = LitStr::new(&ident.unraw().to_string(), ident.span());
    let key = key.map_or_else(
        || quote!(::core::option::Option::None),
        |key| quote!(::core::option::Option::Some(#key)),
    );
    let kind = match field_type {
        FieldType::Str => quote!(envscan::FieldKind::Str),
        FieldType::Bool => quote!(envscan::FieldKind::Bool),
        FieldType::Int(width) => {
            let width = format_ident!("{}", width);
            quote!(envscan::FieldKind::Int(envscan::IntWidth::#width))
        },
        FieldType::StrSeq => quote!(envscan::FieldKind::StrSeq),
        FieldType::StrArray(label) => {
            let label = LitStr::new(label, Span::call_site());
            quote!(envscan::FieldKind::StrArray(#label))
        },
        FieldType::Unsupported(label) => {
            let label = LitStr::new(label, Span::call_site());
            quote!(envscan::FieldKind::Unsupported(#label))
        },
    };
    quote! {
        envscan::FieldDescriptor::new(#name, #key, #kind)
    }
}

fn expand_slot(ident: &Ident, field_type: &FieldType) -> proc_macro2::TokenStream {
    match field_type {
        FieldType::Str => quote!(envscan::FieldSlot::Str(&mut self.#ident)),
        FieldType::Bool => quote!(envscan::FieldSlot::Bool(&mut self.#ident)),
        FieldType::Int(width) => {
            let width = format_ident!("{}", width);
            quote!(envscan::FieldSlot::Int(envscan::IntSlot::#width(&mut self.#ident)))
        },
        FieldType::StrSeq => quote!(envscan::FieldSlot::StrSeq(&mut self.#ident)),
        FieldType::StrArray(_) => quote!(envscan::FieldSlot::StrArray(&mut self.#ident)),
        // Borrow the field so it never reads as dead code.
        FieldType::Unsupported(_) => quote!({
            let _ = &self.#ident;
            envscan::FieldSlot::Unsupported
        }),
    }
}

/// Classify a field type by its last path segment.
///
/// Detection is syntactic: aliases of supported types are reported as
/// unsupported under their alias name. Invisible groups (from `$ty:ty`
/// macro fragments) and parentheses are looked through.
fn classify(ty: &Type) -> FieldType {
    let ty = peel(ty);
    if let Type::Array(array) = ty {
        return if classify(&array.elem) == FieldType::Str {
            FieldType::StrArray(type_label(ty))
        } else {
            FieldType::Unsupported(type_label(ty))
        };
    }
    let Some((ident, arguments)) = last_segment(ty) else {
        return FieldType::Unsupported(type_label(ty));
    };
    let bare = matches!(arguments, PathArguments::None);
    let name = ident.to_string();
    match name.as_str() {
        "String" if bare => FieldType::Str,
        "bool" if bare => FieldType::Bool,
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" if bare => {
            FieldType::Int(int_width_variant(&name))
        },
        "Vec" if holds_string(arguments) => FieldType::StrSeq,
        _ => FieldType::Unsupported(type_label(ty)),
    }
}

fn peel(mut ty: &Type) -> &Type {
    loop {
        match ty {
            Type::Group(group) => ty = &*group.elem,
            Type::Paren(paren) => ty = &*paren.elem,
            _ => return ty,
        }
    }
}

fn holds_string(arguments: &PathArguments) -> bool {
    single_type_argument(arguments).is_some_and(|inner| classify(inner) == FieldType::Str)
}

fn last_segment(ty: &Type) -> Option<(&Ident, &PathArguments)> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    if type_path.qself.is_some() {
        return None;
    }
    let segment = type_path.path.segments.last()?;
    Some((&segment.ident, &segment.arguments))
}

fn single_type_argument(arguments: &PathArguments) -> Option<&Type> {
    let PathArguments::AngleBracketed(args) = arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    match args.args.first() {
        Some(GenericArgument::Type(inner)) => Some(inner),
        _ => None,
    }
}

fn int_width_variant(name: &str) -> &'static str {
    match name {
        "i8" => "I8",
        "i16" => "I16",
        "i32" => "I32",
        "i128" => "I128",
        "isize" => "Isize",
        _ => "I64",
    }
}

fn type_label(ty: &Type) -> String {
    ty.to_token_stream().to_string().replace(' ', "")
}
