// all helper functions for derive macros used in the wire codec
use proc_macro::TokenStream;
use syn::parse_macro_input;
use syn::DeriveInput;

mod wire_struct;
use wire_struct::wire_derive;

mod wire_enum;
use wire_enum::wire_enum;

/// Derives `ToFromNetworkOrder` for a struct by chaining the trait call
/// across every field in declaration order.
#[proc_macro_derive(WireStruct)]
pub fn wire_macro_struct(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    wire_derive(&ast)
}

/// Derives `Default`, `TryFrom<u8>`, `TryFrom<u16>` and `FromStr` for a
/// C-like enum whose variants all carry an explicit integer discriminant.
#[proc_macro_derive(WireEnum)]
pub fn wire_macro_enum(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    wire_enum(&ast)
}
