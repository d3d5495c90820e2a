mod decode_fields;
mod from_row_trait;
mod parameters_trait;

use decode_fields::decode_fields;
use from_row_trait::from_row_trait;
use parameters_trait::parameters_trait;
use proc_macro::TokenStream;
use syn::{ItemStruct, parse_macro_input};

/// Binds the fields of a struct as named parameters.
///
/// Field attributes: `#[conduit(name = "..")]` and `#[conduit(ignore)]`.
/// Struct attribute: `#[conduit(rename_all = "PascalCase")]`.
#[proc_macro_derive(Parameters, attributes(conduit))]
pub fn derive_parameters(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    parameters_trait(&decode_fields(&item)).into()
}

/// Builds a struct from a result row, reading each field from the column of the same name.
///
/// Ignored fields take their default value.
#[proc_macro_derive(FromRow, attributes(conduit))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    from_row_trait(&decode_fields(&item)).into()
}
