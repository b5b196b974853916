use proc_macro::TokenStream;
use syn_utils::into_macro_output;

#[macro_use]
mod syn_utils;

mod embed_impl;

/// Implements `uniflow::Embed<T>` and `From<T>` for each variant marked with `#[embed]`.
///
/// A marked variant must have exactly one unnamed field. The type of that field is the
/// embedded (child) vocabulary.
///
/// # Examples
///
/// ```ignore
/// #[derive(Debug, Embed)]
/// enum AppAction {
///     #[embed]
///     Counter(CounterAction),
///     #[embed]
///     Search(SearchAction),
///     Reset,
/// }
///
/// let action = AppAction::embed(CounterAction::Increment);
/// assert!(matches!(action.extract(), Ok(CounterAction::Increment)));
/// ```
#[proc_macro_derive(Embed, attributes(embed))]
pub fn derive_embed(input: TokenStream) -> TokenStream {
    into_macro_output(embed_impl::derive_embed(input.into()))
}
