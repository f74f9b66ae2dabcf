//! Derive macros for the spacefx scene simulation.
//!
//! This crate provides one derive macro:
//!
//! - [`Mode`] - Turns a fieldless enum into a mode label usable with
//!   `spacefx::mode::ModeMachine`
//!
//! # Usage
//!
//! The macro is re-exported from the main `spacefx` crate. You don't need
//! to add this crate directly:
//!
//! ```ignore
//! use spacefx::prelude::*;
//!
//! #[derive(Mode, Clone, Copy, Debug, PartialEq, Eq)]
//! enum Door {
//!     Open,
//!     Closed,
//! }
//! ```
//!
//! # The Mode Macro
//!
//! `#[derive(Mode)]` assigns every variant a dense index in declaration
//! order so a mode machine can keep its hook table in a plain array.
//!
//! It generates an implementation of `spacefx::Mode` with:
//! - `COUNT` - Number of variants
//! - `ALL` - Every variant in declaration order
//! - `index()` / `from_index()` - Variant <-> dense index
//! - `name()` - `snake_case` variant name, used in log lines

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

/// Derive macro for mode label enums.
///
/// Variants are assigned sequential indices starting from 0.
///
/// # Requirements
///
/// - Must be an enum (not a struct)
/// - All variants must be unit variants (no fields)
/// - The enum must also derive `Clone`, `Copy`, `PartialEq`, `Eq` and `Debug`
///
/// # Example
///
/// ```ignore
/// #[derive(Mode, Clone, Copy, Debug, PartialEq, Eq)]
/// enum RocketMode {
///     Idle,       // index 0, name "idle"
///     Launching,  // index 1, name "launching"
/// }
///
/// assert_eq!(RocketMode::COUNT, 2);
/// assert_eq!(RocketMode::Launching.name(), "launching");
/// assert_eq!(RocketMode::from_index(0), Some(RocketMode::Idle));
/// ```
///
/// # Panics
///
/// The macro panics at compile time if:
/// - Applied to a struct instead of an enum
/// - Any variant has fields (tuple or struct variants)
/// - Enum has zero variants
#[proc_macro_derive(Mode)]
pub fn derive_mode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let variants = match &input.data {
        Data::Enum(data) => &data.variants,
        _ => panic!("Mode derive only supports enums"),
    };

    for variant in variants.iter() {
        if !matches!(variant.fields, Fields::Unit) {
            panic!(
                "Mode enum variants must be unit variants (no fields). \
                 Found fields on variant '{}'",
                variant.ident
            );
        }
    }

    if variants.is_empty() {
        panic!("Mode enum '{}' must have at least one variant", name);
    }

    let all: Vec<_> = variants
        .iter()
        .map(|variant| {
            let variant_name = &variant.ident;
            quote! { #name::#variant_name }
        })
        .collect();

    let index_arms: Vec<_> = variants
        .iter()
        .enumerate()
        .map(|(i, variant)| {
            let variant_name = &variant.ident;
            quote! { #name::#variant_name => #i }
        })
        .collect();

    let from_arms: Vec<_> = variants
        .iter()
        .enumerate()
        .map(|(i, variant)| {
            let variant_name = &variant.ident;
            quote! { #i => ::core::option::Option::Some(#name::#variant_name) }
        })
        .collect();

    let name_arms: Vec<_> = variants
        .iter()
        .map(|variant| {
            let variant_name = &variant.ident;
            let label = snake_case(&variant_name.to_string());
            quote! { #name::#variant_name => #label }
        })
        .collect();

    let variant_count = variants.len();

    let expanded = quote! {
        impl spacefx::Mode for #name {
            const COUNT: usize = #variant_count;
            const ALL: &'static [Self] = &[#(#all),*];

            fn index(self) -> usize {
                match self {
                    #(#index_arms),*
                }
            }

            fn from_index(index: usize) -> ::core::option::Option<Self> {
                match index {
                    #(#from_arms,)*
                    _ => ::core::option::Option::None,
                }
            }

            fn name(self) -> &'static str {
                match self {
                    #(#name_arms),*
                }
            }
        }
    };

    TokenStream::from(expanded)
}

/// `FollowingPointer` -> `following_pointer`.
fn snake_case(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 4);
    for (i, ch) in ident.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
