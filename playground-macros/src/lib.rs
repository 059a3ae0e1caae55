use proc_macro::TokenStream;

mod state;

/// Derives `playground_core::GraphState` for a struct with named fields.
///
/// Each field becomes a variant of a generated `<Name>Update` enum. The
/// `#[update(...)]` attribute picks how a variant is applied:
///
/// - `replace` (default): the field is overwritten
/// - `append`: the value is extended onto the field (`Vec`, `String`, ...)
/// - `merge`: the value's items are extended onto the field (maps, sets)
#[proc_macro_derive(State, attributes(update))]
pub fn derive_state(input: TokenStream) -> TokenStream {
    state::derive_state_impl(input)
}
