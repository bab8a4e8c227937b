use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::ext::IdentExt;
use syn::{
    Data, DeriveInput, Error, Field, Fields, Ident, LitStr, Result, Type, Visibility, parse_macro_input, spanned::Spanned,
};

mod parsed;

use parsed::ParsedRecord;

/// Implements `tagwalk::Reflect` and `tagwalk::Record` for a struct with named fields.
///
/// Field annotations are written as `#[tag(key = "name,opt1,opt2")]`, one string per key.
/// `#[tag(embed)]` promotes a nested record's annotations into the parent. `#[tag(skip)]` leaves
/// a field out of the record; its type then only needs `Default`.
///
/// ```text
/// #[derive(Record)]
/// pub struct Filter {
///     #[tag(json = "name", query = "n,omitempty")]
///     pub name: String,
///     #[tag(embed)]
///     pub paging: Paging,
/// }
/// ```
#[proc_macro_derive(Record, attributes(tag))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match ParsedRecord::from_input(&input) {
        Ok(parsed) => parsed.emit().into(),
        Err(err) => err.to_compile_error().into(),
    }
}
