//! Derive macro for `reportkit`.
//!
//! Use it through the re-export, `reportkit::Describe`.

mod describe;

use proc_macro::TokenStream;

/// Derives `reportkit::dump::Describe` and `reportkit::dump::Dump`.
///
/// Public fields are rendered in declaration order; private fields are left
/// out. Field attributes:
///
/// - `#[describe(skip)]`
/// - `#[describe(rename = "Name")]`
/// - `#[describe(display)]` or `#[describe(debug)]` to render through the
///   `Display` or `Debug` impl instead of `Dump`.
///
/// # Example
///
/// ```ignore
/// use reportkit::Describe;
///
/// #[derive(Describe)]
/// struct Request {
///     pub method: String,
///     #[describe(rename = "URL")]
///     pub url: String,
///     #[describe(debug)]
///     pub headers: Vec<(String, String)>,
///     token: String,
/// }
/// ```
#[proc_macro_derive(Describe, attributes(describe))]
pub fn derive_describe(input: TokenStream) -> TokenStream {
    describe::expand(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
