use crate::decode_fields::StructMetadata;
use proc_macro2::TokenStream;
use quote::quote;

pub(crate) fn from_row_trait(metadata: &StructMetadata) -> TokenStream {
    let item = metadata.item;
    let struct_name = &item.ident;
    let (impl_generics, ty_generics, where_clause) = item.generics.split_for_impl();
    let assignments = metadata.fields.iter().map(|f| {
        let ident = &f.ident;
        let ty = &f.ty;
        let name = &f.name;
        if f.ignore {
            quote!(#ident: ::std::default::Default::default())
        } else {
            quote!(#ident: row.get::<#ty>(#name)?)
        }
    });
    quote! {
        impl #impl_generics ::conduit::FromRow for #struct_name #ty_generics #where_clause {
            fn from_row(row: ::conduit::RowLabeled) -> ::conduit::Result<Self> {
                Ok(#struct_name {
                    #(#assignments,)*
                })
            }
        }
    }
}
