#[allow(unused_imports)]
use super::*;

pub(crate) struct ParsedRecord {
    name: Ident,
    fields: Vec<ParsedField>,
}

impl ParsedRecord {
    pub(crate) fn from_input(input: &DeriveInput) -> Result<Self> {
        if !input.generics.params.is_empty() {
            return Err(Error::new_spanned(
                &input.generics,
                "Record cannot be derived for generic structs",
            ));
        }

        let fields = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(named) => named
                    .named
                    .iter()
                    .map(ParsedField::from_field)
                    .collect::<Result<Vec<_>>>()?,
                _ => return Err(Error::new(input.ident.span(), "Record requires named fields")),
            },
            _ => return Err(Error::new(input.ident.span(), "Record can only be derived for structs")),
        };

        Ok(Self {
            name: input.ident.clone(),
            fields,
        })
    }

    pub(crate) fn emit(&self) -> TokenStream2 {
        let name = &self.name;
        let record_name = LitStr::new(&name.to_string(), name.span());
        let (fields, skipped): (Vec<&ParsedField>, Vec<&ParsedField>) =
            self.fields.iter().partition(|field| !field.skipped);

        let defs = fields.iter().map(|field| field.def_tokens());
        let idents: Vec<&Ident> = fields.iter().map(|field| &field.ident).collect();
        let names: Vec<LitStr> = fields
            .iter()
            .map(|field| LitStr::new(&field.name, field.ident.span()))
            .collect();
        let tys: Vec<&Type> = fields.iter().map(|field| &field.ty).collect();
        let indices: Vec<usize> = (0..fields.len()).collect();
        let skipped: Vec<&Ident> = skipped.iter().map(|field| &field.ident).collect();

        quote! {
            const _: () = {
                const FIELDS: &[::tagwalk::FieldDef] = &[#(#defs),*];

                impl ::tagwalk::Reflect for #name {
                    fn type_descriptor() -> ::tagwalk::TypeDescriptor {
                        ::tagwalk::TypeDescriptor::Record(::tagwalk::RecordDescriptor::new(
                            ::std::any::type_name::<Self>(),
                            FIELDS,
                            || ::std::vec![#(<#tys as ::tagwalk::Reflect>::type_descriptor()),*],
                        ))
                    }

                    fn zero() -> Self {
                        Self {
                            #(#idents: <#tys as ::tagwalk::Reflect>::zero(),)*
                            #(#skipped: ::std::default::Default::default(),)*
                        }
                    }

                    #[allow(unused_mut)]
                    fn from_value(value: ::tagwalk::Value) -> ::std::result::Result<Self, ::tagwalk::CoerceError> {
                        match value {
                            ::tagwalk::Value::Nil => ::std::result::Result::Ok(<Self as ::tagwalk::Reflect>::zero()),
                            ::tagwalk::Value::Record(mut record) if record.type_name == ::std::any::type_name::<Self>() => {
                                ::std::result::Result::Ok(Self {
                                    #(#idents: record.take_field::<#tys>(#names)?,)*
                                    #(#skipped: ::std::default::Default::default(),)*
                                })
                            }
                            other => ::std::result::Result::Err(::tagwalk::CoerceError::mismatch(
                                &<Self as ::tagwalk::Reflect>::type_descriptor(),
                                &other,
                            )),
                        }
                    }

                    fn descriptor(&self) -> ::tagwalk::TypeDescriptor {
                        <Self as ::tagwalk::Reflect>::type_descriptor()
                    }

                    fn to_value(&self) -> ::tagwalk::Value {
                        ::tagwalk::Value::Record(::tagwalk::RecordValue::new(
                            ::std::any::type_name::<Self>(),
                            ::std::vec![#((#names, ::tagwalk::Reflect::to_value(&self.#idents))),*],
                        ))
                    }

                    #[allow(unused_mut)]
                    fn assign(&mut self, value: ::tagwalk::Value) -> ::std::result::Result<(), ::tagwalk::CoerceError> {
                        let mut next = <Self as ::tagwalk::Reflect>::from_value(value)?;
                        #(::std::mem::swap(&mut next.#skipped, &mut self.#skipped);)*
                        *self = next;
                        ::std::result::Result::Ok(())
                    }

                    fn as_record(&self) -> ::std::option::Option<&dyn ::tagwalk::Record> {
                        ::std::option::Option::Some(self)
                    }

                    fn as_record_mut(&mut self) -> ::std::option::Option<&mut dyn ::tagwalk::Record> {
                        ::std::option::Option::Some(self)
                    }
                }

                impl ::tagwalk::Record for #name {
                    fn record_name(&self) -> &'static str {
                        #record_name
                    }

                    fn field_defs(&self) -> &'static [::tagwalk::FieldDef] {
                        FIELDS
                    }

                    fn field(&self, index: usize) -> ::std::option::Option<&dyn ::tagwalk::Reflect> {
                        match index {
                            #(#indices => ::std::option::Option::Some(&self.#idents),)*
                            _ => ::std::option::Option::None,
                        }
                    }

                    fn field_mut(&mut self, index: usize) -> ::std::option::Option<&mut dyn ::tagwalk::Reflect> {
                        match index {
                            #(#indices => ::std::option::Option::Some(&mut self.#idents),)*
                            _ => ::std::option::Option::None,
                        }
                    }
                }
            };
        }
    }
}
