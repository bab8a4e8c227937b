#[allow(unused_imports)]
use super::*;

pub(crate) struct ParsedField {
    pub(crate) ident: Ident,
    /// Declared name with any raw-identifier prefix removed.
    pub(crate) name: String,
    pub(crate) ty: Type,
    pub(crate) exported: bool,
    pub(crate) embedded: bool,
    /// Left out of the record entirely; the field only needs `Default`.
    pub(crate) skipped: bool,
    /// `(key, raw annotation)` in the order written.
    pub(crate) tags: Vec<(String, LitStr)>,
}

/// Bare flags seen in `#[tag(...)]`.
#[derive(Default)]
struct Flags {
    embed: bool,
    skip: bool,
}

impl ParsedField {
    pub(crate) fn from_field(field: &Field) -> Result<Self> {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| Error::new(field.span(), "Record requires named fields"))?;
        let name = ident.unraw().to_string();

        let mut flags = Flags::default();
        let mut tags = Vec::new();

        for attr in &field.attrs {
            if attr.path().is_ident("tag") {
                Self::parse_tag_attr(attr, &mut flags, &mut tags)?;
            }
        }
        if flags.embed && flags.skip {
            return Err(Error::new(ident.span(), "`skip` cannot be combined with `embed`"));
        }

        Ok(Self {
            ident,
            name,
            ty: field.ty.clone(),
            exported: !matches!(field.vis, Visibility::Inherited),
            embedded: flags.embed,
            skipped: flags.skip,
            tags,
        })
    }

    fn parse_tag_attr(attr: &syn::Attribute, flags: &mut Flags, tags: &mut Vec<(String, LitStr)>) -> Result<()> {
        attr.parse_nested_meta(|meta| {
            let key = meta
                .path
                .get_ident()
                .ok_or_else(|| meta.error("expected an annotation key such as `json = \"...\"`"))?
                .unraw()
                .to_string();

            if meta.input.peek(syn::Token![=]) {
                let raw = match meta.value()?.parse::<syn::Lit>()? {
                    syn::Lit::Str(raw) => raw,
                    other => return Err(Error::new(other.span(), "annotation values must be string literals")),
                };
                if tags.iter().any(|(existing, _)| *existing == key) {
                    return Err(Error::new_spanned(&meta.path, format!("duplicate annotation key `{key}`")));
                }
                tags.push((key, raw));
                Ok(())
            } else {
                let slot = match key.as_str() {
                    "embed" => &mut flags.embed,
                    "skip" => &mut flags.skip,
                    _ => {
                        return Err(Error::new_spanned(
                            &meta.path,
                            format!("unknown flag `{key}`; expected `embed`, `skip` or `key = \"...\"`"),
                        ));
                    }
                };
                if *slot {
                    return Err(Error::new_spanned(&meta.path, format!("duplicate `{key}` flag")));
                }
                *slot = true;
                Ok(())
            }
        })
    }

    /// `::tagwalk::FieldDef` constructor for the generated field table.
    pub(crate) fn def_tokens(&self) -> TokenStream2 {
        let name = LitStr::new(&self.name, self.ident.span());
        let exported = self.exported;
        let embedded = self.embedded;
        let keys = self.tags.iter().map(|(key, _)| LitStr::new(key, Span::call_site()));
        let raws = self.tags.iter().map(|(_, raw)| raw);
        quote! {
            ::tagwalk::FieldDef::new(#name, #exported, #embedded, &[#((#keys, #raws)),*])
        }
    }
}
