//! # Citrus Derive
//!
//! Procedural macros for the citrus dynamic content engine.
//!
//! ## Macros
//!
//! - `#[citrus::function(prefix = "my:")]` - Registers a plain function in a
//!   discoverable function library
//! - `#[derive(FunctionParameters)]` - Builds a typed parameter struct from the
//!   positional parameters of a function call
//!
//! These macros are automatically re-exported by the main `citrus` crate,
//! so users typically don't need to import this crate directly.

extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse::Parse, parse_macro_input, spanned::Spanned, Data, DeriveInput, Fields,
    GenericArgument, Ident, ItemFn, LitStr, Path, PathArguments, Token, Type,
};

/// Arguments of `#[citrus::function(prefix = "...", name = "...")]`.
struct FunctionArgs {
    prefix: LitStr,
    name: Option<LitStr>,
}

impl Parse for FunctionArgs {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let mut prefix: Option<LitStr> = None;
        let mut name: Option<LitStr> = None;

        while !input.is_empty() {
            let key: Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            let value: LitStr = input.parse()?;

            if key == "prefix" {
                prefix = Some(value);
            } else if key == "name" {
                name = Some(value);
            } else {
                return Err(syn::Error::new(
                    key.span(),
                    format!("unknown argument `{key}`, expected `prefix` or `name`"),
                ));
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        let prefix = prefix.ok_or_else(|| {
            input.error("missing library prefix, e.g. #[citrus::function(prefix = \"my:\")]")
        })?;
        if prefix.value().trim_end_matches(':').is_empty() {
            return Err(syn::Error::new(prefix.span(), "library prefix must not be empty"));
        }

        Ok(FunctionArgs { prefix, name })
    }
}

/// Library prefixes always end with a colon.
fn normalize_prefix(prefix: &str) -> String {
    if prefix.ends_with(':') {
        prefix.to_string()
    } else {
        format!("{prefix}:")
    }
}

/// `decimal_places` -> `decimalPlaces`.
fn lower_camel_case(ident: &str) -> String {
    let ident = ident.strip_prefix("r#").unwrap_or(ident);
    let mut out = String::with_capacity(ident.len());
    let mut upper_next = false;
    for c in ident.chars() {
        if c == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn expand_function(args: FunctionArgs, function: ItemFn) -> syn::Result<proc_macro2::TokenStream> {
    if let Some(asyncness) = function.sig.asyncness {
        return Err(syn::Error::new(
            asyncness.span(),
            "citrus functions must be synchronous",
        ));
    }

    let ident = &function.sig.ident;
    let prefix = normalize_prefix(&args.prefix.value());
    let name = args
        .name
        .map(|name| name.value())
        .unwrap_or_else(|| lower_camel_case(&ident.to_string()));

    Ok(quote! {
        #function

        ::citrus::inventory::submit! {
            ::citrus::FunctionRegistration {
                prefix: #prefix,
                name: #name,
                function: #ident,
            }
        }
    })
}

/// Registers a function in the library bound to `prefix`.
///
/// The function is picked up by `FunctionRegistry::discover` and is callable as
/// `prefix:name(...)`. The name defaults to the function identifier in lowerCamelCase.
///
/// # Usage
///
/// ```rust,ignore
/// #[citrus::function(prefix = "greet:")]
/// fn say_hello(parameters: &[String], _: &citrus::TestContext) -> citrus::Result<String> {
///     Ok(format!("Hello {}", parameters.join(" ")))
/// }
///
/// // resolves "greet:sayHello('Ann')" to "Hello Ann"
/// ```
///
/// # Requirements
///
/// - Signature must be `fn(&[String], &TestContext) -> citrus::Result<String>`
/// - Function must not be `async`
#[proc_macro_attribute]
pub fn function(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(args as FunctionArgs);
    let function = parse_macro_input!(input as ItemFn);
    expand_function(args, function)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// How a struct field is populated from the parameter list.
#[derive(Debug, PartialEq)]
enum FieldKind {
    Required,
    Optional,
    Defaulted(String),
    Rest,
}

struct ParameterField {
    ident: Ident,
    name: String,
    kind: FieldKind,
}

/// Inner type of `Wrapper<T>` when the last path segment is `wrapper`.
fn wrapped_type<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

fn parameter_field(field: &syn::Field) -> syn::Result<ParameterField> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new(field.span(), "expected a named field"))?;
    let mut name = lower_camel_case(&ident.to_string());
    let mut default: Option<String> = None;
    let mut rest = false;

    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("param")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                default = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("name") {
                name = meta.value()?.parse::<LitStr>()?.value();
            } else if meta.path.is_ident("rest") {
                rest = true;
            } else {
                return Err(meta.error("expected `default`, `name` or `rest`"));
            }
            Ok(())
        })?;
    }

    let kind = match (default, rest) {
        (Some(_), true) => {
            return Err(syn::Error::new(
                field.span(),
                "`default` and `rest` can not be combined",
            ))
        }
        (Some(default), false) => FieldKind::Defaulted(default),
        (None, true) => {
            if wrapped_type(&field.ty, "Vec").is_none() {
                return Err(syn::Error::new(field.ty.span(), "`rest` fields must be a Vec"));
            }
            FieldKind::Rest
        }
        (None, false) if wrapped_type(&field.ty, "Option").is_some() => FieldKind::Optional,
        (None, false) => FieldKind::Required,
    };

    Ok(ParameterField { ident, name, kind })
}

fn crate_path(input: &DeriveInput) -> syn::Result<Path> {
    let mut krate: Path = syn::parse_quote!(::citrus);
    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("parameters")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("crate") {
                krate = meta.value()?.parse::<LitStr>()?.parse()?;
                Ok(())
            } else {
                Err(meta.error("expected `crate`"))
            }
        })?;
    }
    Ok(krate)
}

fn expand_function_parameters(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(
            input.span(),
            "FunctionParameters can only be derived for structs",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new(
            data.fields.span(),
            "FunctionParameters requires named fields",
        ));
    };

    let fields = named
        .named
        .iter()
        .map(parameter_field)
        .collect::<syn::Result<Vec<_>>>()?;
    if let Some(position) = fields.iter().position(|f| f.kind == FieldKind::Rest) {
        if position + 1 != fields.len() {
            return Err(syn::Error::new(
                fields[position].ident.span(),
                "`rest` must be the last field",
            ));
        }
    }

    let krate = crate_path(input)?;
    let helpers = quote!(#krate::function::parameterized);
    let initializers = fields.iter().enumerate().map(|(index, field)| {
        let ParameterField { ident, name, kind } = field;
        let value = match kind {
            FieldKind::Required => {
                quote!(#helpers::required_parameter(parameters, #index, #name)?)
            }
            FieldKind::Optional => {
                quote!(#helpers::optional_parameter(parameters, #index, #name)?)
            }
            FieldKind::Defaulted(default) => {
                quote!(#helpers::defaulted_parameter(parameters, #index, #name, #default)?)
            }
            FieldKind::Rest => quote!(#helpers::rest_parameters(parameters, #index, #name)?),
        };
        quote!(#ident: #value)
    });

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics #helpers::FunctionParameters for #ident #ty_generics #where_clause {
            fn from_parameters(
                parameters: &[::std::string::String],
            ) -> #krate::Result<Self> {
                ::std::result::Result::Ok(Self {
                    #(#initializers,)*
                })
            }
        }
    })
}

/// Derives `FunctionParameters` for a struct with named fields.
///
/// Fields are populated from the positional parameters in declaration order:
///
/// - plain fields are required
/// - `Option<T>` fields are optional
/// - `#[param(default = "...")]` fields fall back to parsing the default
/// - a trailing `#[param(rest)] Vec<T>` field collects the remaining parameters
///
/// Each value is parsed with `FromStr`. `#[param(name = "...")]` overrides the
/// parameter name reported in errors, which defaults to the field name in lowerCamelCase.
///
/// ```rust,ignore
/// #[derive(citrus::FunctionParameters)]
/// struct PadParameters {
///     value: String,
///     width: usize,
///     #[param(default = " ")]
///     fill: char,
/// }
/// ```
#[proc_macro_derive(FunctionParameters, attributes(param, parameters))]
pub fn derive_function_parameters(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_function_parameters(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
