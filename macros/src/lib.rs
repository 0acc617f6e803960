//! Derive macros for the catalog state-management pipeline
//!
//! This crate provides procedural macros that remove boilerplate from
//! action vocabularies.
//!
//! # Available Macros
//!
//! - `#[derive(Action)]` - Classifies action variants (request / success / failure)
//!   and labels them for logging
//!
//! # Example
//!
//! ```ignore
//! use catalog_macros::Action;
//!
//! #[derive(Action, Clone, Debug)]
//! #[action(source = "Products")]
//! enum ProductsAction {
//!     #[request]
//!     LoadProducts,
//!
//!     #[success]
//!     LoadProductsSuccess { products: Vec<Product> },
//!
//!     #[failure]
//!     LoadProductsFailure { error: String },
//! }
//!
//! // Generated methods:
//! assert!(ProductsAction::LoadProducts.is_request());
//! assert_eq!(ProductsAction::LoadProducts.action_type(), "[Products] Load Products");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, Variant, parse_macro_input};

/// Derive macro for Action enums
///
/// Generates helper methods for action enums:
/// - `is_request()` - Returns true if this variant asks for asynchronous work
/// - `is_success()` - Returns true if this variant reports a successful outcome
/// - `is_failure()` - Returns true if this variant reports a failed outcome
/// - `is_outcome()` - Returns true for success or failure variants
/// - `action_type()` - Returns a `"[Source] Words Of Variant"` label
///
/// Variants with none of the attributes are plain UI intents.
///
/// # Attributes
///
/// - `#[action(source = "...")]` on the enum - The label prefix (defaults to
///   the enum name with a trailing `Action` stripped)
/// - `#[request]`, `#[success]`, `#[failure]` on variants
///
/// # Panics
///
/// This macro will produce a compile error (not a runtime panic) if:
/// - Applied to a non-enum type
/// - A variant carries more than one classification attribute
/// - The `source` argument is not a string literal
///
/// # Example
///
/// ```ignore
/// #[derive(Action, Clone, Debug)]
/// enum ProductsAction {
///     #[request]
///     DeleteProduct { id: u64 },
///
///     #[success]
///     DeleteProductSuccess { id: u64 },
///
///     #[failure]
///     DeleteProductFailure { error: String },
///
///     ClearError,
/// }
///
/// let action = ProductsAction::DeleteProduct { id: 1 };
/// assert!(action.is_request());
/// assert!(!action.is_outcome());
/// assert_eq!(action.action_type(), "[Products] Delete Product");
/// ```
#[proc_macro_derive(Action, attributes(action, request, success, failure))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_action(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Which side of the request / outcome protocol a variant sits on
#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Request,
    Success,
    Failure,
}

fn expand_action(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;

    let Data::Enum(data_enum) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "#[derive(Action)] can only be used on enums",
        ));
    };

    let source = match source_override(&input.attrs)? {
        Some(source) => source,
        None => default_source(&name.to_string()),
    };

    let mut request_arms = Vec::new();
    let mut success_arms = Vec::new();
    let mut failure_arms = Vec::new();
    let mut label_arms = Vec::new();

    for variant in &data_enum.variants {
        let pattern = variant_pattern(variant);
        let label = format!("[{source}] {}", split_words(&variant.ident.to_string()));
        label_arms.push(quote! { #pattern => #label, });

        match classify(variant)? {
            Some(Kind::Request) => request_arms.push(pattern),
            Some(Kind::Success) => success_arms.push(pattern),
            Some(Kind::Failure) => failure_arms.push(pattern),
            None => {},
        }
    }

    // An empty enum has no variants to match on
    let label_body = if label_arms.is_empty() {
        quote! { match *self {} }
    } else {
        quote! { match self { #(#label_arms)* } }
    };

    let request_body = any_of(&request_arms);
    let success_body = any_of(&success_arms);
    let failure_body = any_of(&failure_arms);

    Ok(quote! {
        impl #name {
            /// Returns true if this action requests asynchronous work
            #[must_use]
            pub const fn is_request(&self) -> bool {
                #request_body
            }

            /// Returns true if this action reports a successful outcome
            #[must_use]
            pub const fn is_success(&self) -> bool {
                #success_body
            }

            /// Returns true if this action reports a failed outcome
            #[must_use]
            pub const fn is_failure(&self) -> bool {
                #failure_body
            }

            /// Returns true if this action is the outcome of a request
            #[must_use]
            pub const fn is_outcome(&self) -> bool {
                self.is_success() || self.is_failure()
            }

            /// Human-readable label of this action, used in logs
            #[must_use]
            pub const fn action_type(&self) -> &'static str {
                #label_body
            }
        }
    })
}

/// `matches!` over `patterns`, or `false` when there are none
fn any_of(patterns: &[TokenStream2]) -> TokenStream2 {
    if patterns.is_empty() {
        quote! { false }
    } else {
        quote! { matches!(self, #(#patterns)|*) }
    }
}

/// Match pattern ignoring the variant's fields
fn variant_pattern(variant: &Variant) -> TokenStream2 {
    let ident = &variant.ident;
    match &variant.fields {
        Fields::Named(_) => quote! { Self::#ident { .. } },
        Fields::Unnamed(_) => quote! { Self::#ident(..) },
        Fields::Unit => quote! { Self::#ident },
    }
}

fn classify(variant: &Variant) -> syn::Result<Option<Kind>> {
    let marks: Vec<Kind> = [
        ("request", Kind::Request),
        ("success", Kind::Success),
        ("failure", Kind::Failure),
    ]
    .into_iter()
    .filter(|(attr, _)| has_attribute(&variant.attrs, attr))
    .map(|(_, kind)| kind)
    .collect();

    match marks.as_slice() {
        [] => Ok(None),
        [kind] => Ok(Some(*kind)),
        _ => Err(syn::Error::new_spanned(
            variant,
            "Variant can carry only one of #[request], #[success] and #[failure]",
        )),
    }
}

/// Read `#[action(source = "...")]` from the enum attributes
fn source_override(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut source = None;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("action")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("source") {
                let value: LitStr = meta.value()?.parse()?;
                source = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported action attribute, expected `source`"))
            }
        })?;
    }
    Ok(source)
}

/// `ProductsAction` becomes `Products`
fn default_source(enum_name: &str) -> String {
    match enum_name.strip_suffix("Action") {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => enum_name.to_string(),
    }
}

/// `LoadProductsSuccess` becomes `Load Products Success`
fn split_words(ident: &str) -> String {
    let mut words = String::with_capacity(ident.len() + 4);
    for (i, ch) in ident.chars().enumerate() {
        if i > 0 && ch.is_uppercase() {
            words.push(' ');
        }
        words.push(ch);
    }
    words
}

/// Helper function to check if an attribute list contains a specific attribute
fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}
