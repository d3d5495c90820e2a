use crate::decode_fields::StructMetadata;
use proc_macro2::TokenStream;
use quote::quote;

pub(crate) fn parameters_trait(metadata: &StructMetadata) -> TokenStream {
    let item = metadata.item;
    let struct_name = &item.ident;
    let (impl_generics, ty_generics, where_clause) = item.generics.split_for_impl();
    let entries = metadata.fields.iter().filter(|f| !f.ignore).map(|f| {
        let ident = &f.ident;
        let name = &f.name;
        quote! {
            (
                ::std::string::String::from(#name),
                ::conduit::AsValue::as_value(::std::clone::Clone::clone(&self.#ident)),
            )
        }
    });
    quote! {
        impl #impl_generics ::conduit::Parameters for #struct_name #ty_generics #where_clause {
            fn parameters(&self) -> ::std::vec::Vec<(::std::string::String, ::conduit::Value)> {
                ::std::vec![#(#entries),*]
            }
        }
    }
}
