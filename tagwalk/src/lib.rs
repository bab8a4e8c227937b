//! Struct-annotation walking and best-effort value coercion.
//!
//! Records derive [`Record`] and carry per-field annotations under arbitrary keys:
//!
//! ```
//! use tagwalk::{Record, get_tags};
//!
//! #[derive(Record)]
//! pub struct Search {
//!     #[tag(query = "q")]
//!     pub term: String,
//!     #[tag(query = "page,omitempty")]
//!     pub page: u32,
//! }
//!
//! let tags = get_tags("query", &Search { term: "rust".into(), page: 0 }).unwrap();
//! assert_eq!(tags.len(), 1);
//! assert_eq!(tags[0].name, "q");
//! ```
//!
//! [`get_tags`] returns one [`Tag`] per annotated field in declaration order, descending into
//! nested records. [`get_tags_and_process`] additionally runs a [`TagProcessor`] per entry
//! with writable access to the field, typically paired with [`set_field`] to fill a record
//! from loosely typed input.

extern crate self as tagwalk;

pub mod coerce;
pub mod config;
pub mod errors;
pub mod reflect;
pub mod tag;
pub mod types;
pub mod value;
pub mod walker;

pub use coerce::{Coercer, set, set_field};
pub use config::{CoerceSettings, Config, WalkerSettings};
pub use errors::*;
pub use reflect::{FieldRef, Record, Reflect};
pub use tag::{Tag, Tags, parse_tag};
pub use tagwalk_macros::Record;
pub use types::{FieldDef, PrimitiveKind, RecordDescriptor, TypeDescriptor};
pub use value::{Mapping, RecordValue, Value};
pub use walker::{TagProcessor, Walker, get_tags, get_tags_and_process, processor_fn};
