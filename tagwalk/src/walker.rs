//! Recursive extraction of field annotations from records.

use crate::config::WalkerSettings;
use crate::errors::TagError;
use crate::reflect::{FieldRef, Record, Reflect};
use crate::tag::{Tag, Tags, parse_tag};
use crate::types::FieldDef;
use crate::value::Value;

/// Hook invoked once per extracted entry, before the entry is appended.
///
/// The processor may rewrite the entry and, during a mutable walk, write to the field through
/// the [`FieldRef`]. Returning an error aborts the walk.
pub trait TagProcessor {
    fn process(&mut self, field: FieldRef<'_>, tag: &mut Tag) -> anyhow::Result<()>;
}

impl<F> TagProcessor for F
where
    F: FnMut(FieldRef<'_>, &mut Tag) -> anyhow::Result<()>,
{
    fn process(&mut self, field: FieldRef<'_>, tag: &mut Tag) -> anyhow::Result<()> {
        self(field, tag)
    }
}

/// Pins a closure to the [`TagProcessor`] signature so its argument types are inferred.
///
/// ```
/// use tagwalk::{Record, get_tags_and_process, processor_fn};
///
/// #[derive(Record)]
/// pub struct Query {
///     #[tag(query = "page")]
///     pub page: i32,
/// }
///
/// let mut data = Query { page: 2 };
/// let mut rename = processor_fn(|_, tag| {
///     tag.name = tag.name.to_uppercase();
///     Ok(())
/// });
/// let tags = get_tags_and_process("query", &mut data, Some(&mut rename)).unwrap();
/// assert_eq!(tags[0].name, "PAGE");
/// ```
pub fn processor_fn<F>(f: F) -> F
where
    F: FnMut(FieldRef<'_>, &mut Tag) -> anyhow::Result<()>,
{
    f
}

/// Extracts annotations stored under one key.
#[derive(Debug, Clone)]
pub struct Walker {
    key: String,
    settings: WalkerSettings,
}

impl Walker {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            settings: WalkerSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: WalkerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn settings(&self) -> &WalkerSettings {
        &self.settings
    }

    /// Walks `data` read-only. The processor sees a [`FieldRef::Value`] snapshot of each
    /// field; writes through it are rejected by the coercion engine.
    pub fn walk<T: Reflect + ?Sized>(
        &self,
        data: &T,
        processor: Option<&mut dyn TagProcessor>,
    ) -> Result<Tags, TagError> {
        let record = data.as_record().ok_or_else(|| TagError::NotARecord {
            type_name: data.type_name().to_string(),
        })?;
        log::debug!("walking {} for key {:?}", record.record_name(), self.key);
        let tags = self.visitor(processor).record(record, 0)?;
        log::debug!("extracted {} tags from {}", tags.len(), record.record_name());
        Ok(tags)
    }

    /// Walks `data` handing the processor writable access to each field. Entry values are
    /// re-read after the processor returns, so they reflect any write it made.
    pub fn walk_mut<T: Reflect + ?Sized>(
        &self,
        data: &mut T,
        processor: Option<&mut dyn TagProcessor>,
    ) -> Result<Tags, TagError> {
        let type_name = data.type_name();
        let record = data.as_record_mut().ok_or_else(|| TagError::NotARecord {
            type_name: type_name.to_string(),
        })?;
        let name = record.record_name();
        log::debug!("walking {} mutably for key {:?}", name, self.key);
        let tags = self.visitor(processor).record_mut(record, 0)?;
        log::debug!("extracted {} tags from {}", tags.len(), name);
        Ok(tags)
    }

    fn visitor<'w, 'p>(&'w self, processor: Option<&'p mut dyn TagProcessor>) -> Visitor<'w, 'p> {
        Visitor {
            key: &self.key,
            max_depth: self.settings.max_depth,
            processor,
        }
    }
}

/// What to do with one field after its annotation has been inspected.
///
/// `snapshot` holds the field's value when deciding required it (the `omitempty` check).
enum Step {
    Skip,
    Embed,
    Visit {
        raw: &'static str,
        snapshot: Option<Value>,
    },
}

struct Visitor<'w, 'p> {
    key: &'w str,
    max_depth: usize,
    processor: Option<&'p mut dyn TagProcessor>,
}

impl Visitor<'_, '_> {
    fn record(&mut self, record: &dyn Record, depth: usize) -> Result<Tags, TagError> {
        self.check_depth(record.record_name(), depth)?;

        let mut tags = Tags::new();
        let mut embedded = Vec::new();

        for (index, def) in record.field_defs().iter().enumerate() {
            let Some(field) = record.field(index) else {
                continue;
            };
            match self.inspect(record.record_name(), def, field) {
                Step::Skip => continue,
                Step::Embed => {
                    if let Some(inner) = field.as_record() {
                        embedded.push(inner);
                    }
                    continue;
                }
                Step::Visit { raw, snapshot } => {
                    let mut tag = parse_tag(self.key, raw, Value::Nil);
                    if !tag.name.is_empty() {
                        let value = snapshot.unwrap_or_else(|| field.to_value());
                        tag.value = value.clone();
                        self.process(record.record_name(), def, FieldRef::Value(value), &mut tag)?;
                        tags.push(tag);
                    }
                }
            }

            if let Some(nested) = field.as_record() {
                tags.extend(self.record(nested, depth + 1)?);
            }
        }

        for inner in embedded {
            tags.extend(self.record(inner, depth + 1)?);
        }
        Ok(tags)
    }

    fn record_mut(&mut self, record: &mut dyn Record, depth: usize) -> Result<Tags, TagError> {
        let record_name = record.record_name();
        self.check_depth(record_name, depth)?;

        let mut tags = Tags::new();
        let mut embedded = Vec::new();

        for (index, def) in record.field_defs().iter().enumerate() {
            let Some(field) = record.field_mut(index) else {
                continue;
            };
            match self.inspect(record_name, def, &*field) {
                Step::Skip => continue,
                Step::Embed => {
                    if field.as_record().is_some() {
                        embedded.push(index);
                    }
                    continue;
                }
                Step::Visit { raw, snapshot } => {
                    let mut tag = parse_tag(self.key, raw, Value::Nil);
                    if !tag.name.is_empty() {
                        tag.value = snapshot.unwrap_or_else(|| field.to_value());
                        self.process(record_name, def, FieldRef::Mut(&mut *field), &mut tag)?;
                        tag.value = field.to_value();
                        tags.push(tag);
                    }
                }
            }

            if let Some(nested) = field.as_record_mut() {
                tags.extend(self.record_mut(nested, depth + 1)?);
            }
        }

        for index in embedded {
            if let Some(inner) = record.field_mut(index).and_then(|field| field.as_record_mut()) {
                tags.extend(self.record_mut(inner, depth + 1)?);
            }
        }
        Ok(tags)
    }

    fn inspect(&self, record_name: &str, def: &FieldDef, field: &dyn Reflect) -> Step {
        if !def.exported && !def.embedded {
            log::trace!("skipping {record_name}.{}: not exported", def.name);
            return Step::Skip;
        }

        let raw = def.tag(self.key);
        if raw == "-" {
            log::trace!("skipping {record_name}.{}: excluded", def.name);
            return Step::Skip;
        }
        let mut snapshot = None;
        if raw.contains("omitempty") {
            let value = field.to_value();
            if value.is_zero() {
                log::trace!("skipping {record_name}.{}: empty value with omitempty", def.name);
                return Step::Skip;
            }
            snapshot = Some(value);
        }

        if def.embedded {
            return Step::Embed;
        }
        Step::Visit { raw, snapshot }
    }

    fn process(
        &mut self,
        record_name: &str,
        def: &FieldDef,
        field: FieldRef<'_>,
        tag: &mut Tag,
    ) -> Result<(), TagError> {
        let Some(processor) = self.processor.as_deref_mut() else {
            return Ok(());
        };
        processor.process(field, tag).map_err(|source| TagError::Process {
            field: format!("{record_name}.{}", def.name),
            source,
        })
    }

    fn check_depth(&self, record_name: &str, depth: usize) -> Result<(), TagError> {
        if depth > self.max_depth {
            return Err(TagError::DepthExceeded {
                max_depth: self.max_depth,
                record: record_name.to_string(),
            });
        }
        Ok(())
    }
}

/// Extracts every annotation stored under `key` from `data`.
pub fn get_tags<T: Reflect + ?Sized>(key: &str, data: &T) -> Result<Tags, TagError> {
    Walker::new(key).walk(data, None)
}

/// Like [`get_tags`], running `processor` on each entry with writable access to its field.
pub fn get_tags_and_process<T: Reflect + ?Sized>(
    key: &str,
    data: &mut T,
    processor: Option<&mut dyn TagProcessor>,
) -> Result<Tags, TagError> {
    Walker::new(key).walk_mut(data, processor)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::HashMap;

    use super::*;
    use crate::Record;
    use crate::errors::CoerceError;
    use crate::types::TypeDescriptor;

    thread_local! {
        static SNAPSHOTS: Cell<usize> = const { Cell::new(0) };
    }

    /// Counts every snapshot taken of it.
    #[derive(Default)]
    struct Counted;

    impl Reflect for Counted {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::Dynamic
        }

        fn zero() -> Self {
            Counted
        }

        fn from_value(_: Value) -> Result<Self, CoerceError> {
            Ok(Counted)
        }

        fn descriptor(&self) -> TypeDescriptor {
            TypeDescriptor::Dynamic
        }

        fn to_value(&self) -> Value {
            SNAPSHOTS.with(|count| count.set(count.get() + 1));
            Value::from("counted")
        }

        fn assign(&mut self, _: Value) -> Result<(), CoerceError> {
            Ok(())
        }
    }

    #[derive(Record, Default)]
    struct Audited {
        #[tag(form = "id")]
        pub id: u32,
        pub untagged: Counted,
        #[tag(form = "-")]
        pub excluded: Counted,
        #[tag(json = "other")]
        pub other_key: Counted,
        #[tag(form = ",omitempty")]
        pub unnamed: Counted,
        #[tag(form = "seen")]
        pub seen: Counted,
        hidden: Counted,
        pub index: HashMap<u32, u32>,
    }

    #[derive(Record, Default)]
    struct Leaf {
        #[tag(form = "id")]
        pub id: u32,
        #[tag(form = "note,omitempty")]
        pub note: String,
    }

    #[derive(Record, Default)]
    struct Branch {
        #[tag(form = "label")]
        pub label: String,
        #[tag(form = "leaf")]
        pub leaf: Leaf,
    }

    fn names(tags: &Tags) -> Vec<&str> {
        tags.iter().map(|tag| tag.name.as_str()).collect()
    }

    #[test]
    fn nested_entries_follow_their_parent() {
        let data = Branch {
            label: "b".into(),
            leaf: Leaf { id: 3, note: "n".into() },
        };
        let tags = Walker::new("form").walk(&data, None).unwrap();
        assert_eq!(names(&tags), ["label", "leaf", "id", "note"]);
        assert_eq!(tags[2].value, Value::from(3u32));
    }

    #[test]
    fn omitempty_skips_zero_values() {
        let tags = Walker::new("form").walk(&Leaf::default(), None).unwrap();
        assert_eq!(names(&tags), ["id"]);
    }

    #[test]
    fn depth_limit_counts_nested_records() {
        let shallow = Walker::new("form").with_settings(WalkerSettings { max_depth: 0 });
        let err = shallow.walk(&Branch::default(), None).unwrap_err();
        assert!(matches!(err, TagError::DepthExceeded { max_depth: 0, ref record } if record == "Leaf"));

        let enough = Walker::new("form").with_settings(WalkerSettings { max_depth: 1 });
        assert_eq!(enough.walk(&Branch::default(), None).unwrap().len(), 3);
    }

    #[test]
    fn mutable_walk_reports_values_written_by_the_processor() {
        let mut data = Leaf::default();
        let mut bump = processor_fn(|field, tag| {
            if tag.name == "id" {
                crate::set_field(field, 9)?;
            }
            Ok(())
        });
        let tags = Walker::new("form").walk_mut(&mut data, Some(&mut bump)).unwrap();
        assert_eq!(data.id, 9);
        assert_eq!(tags[0].value, Value::from(9u32));
    }

    #[test]
    fn only_reported_or_omitempty_fields_are_snapshotted() {
        let data = Audited {
            index: (0..50_000).map(|i| (i, i)).collect(),
            ..Default::default()
        };
        SNAPSHOTS.with(|count| count.set(0));
        let tags = Walker::new("form").walk(&data, None).unwrap();
        assert_eq!(names(&tags), ["id", "seen"]);
        assert_eq!(tags[1].value, Value::from("counted"));
        // one for the omitempty check on `unnamed`, one for the `seen` entry
        assert_eq!(SNAPSHOTS.with(Cell::get), 2);
    }

    #[test]
    fn non_records_are_rejected() {
        let err = Walker::new("form").walk(&5i32, None).unwrap_err();
        assert!(matches!(err, TagError::NotARecord { .. }));
    }
}
