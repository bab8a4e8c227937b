use std::collections::HashMap;

use tagwalk::{CoerceError, Record, Reflect, Tag, Tags, Value, get_tags};

#[derive(Record, Debug, PartialEq)]
struct Named {
    #[tag(query = "name")]
    pub name: String,
}

fn sample() -> Tags {
    Tags::from(vec![
        Tag::new("body", "json").with_value("1,2,3,4"),
        Tag::new("query", "id").with_value(42),
        Tag::new("url", "path"),
    ])
}

#[test]
fn filter_keeps_matching_entries_in_order() {
    let filtered = sample().filter(|tag| !tag.value.is_nil());
    assert_eq!(
        filtered.to_vec(),
        vec![
            Tag::new("body", "json").with_value("1,2,3,4"),
            Tag::new("query", "id").with_value(42),
        ]
    );
}

#[test]
fn find_returns_first_match() {
    let tags = Tags::from(vec![
        Tag::new("body", "text,omitempty").with_value(69),
        Tag::new("query", "id").with_value(42),
        Tag::new("url", "path"),
    ]);
    let found = tags.find(|tag| tag.key == "body");
    assert_eq!(found, Some(&Tag::new("body", "text,omitempty").with_value(69)));
}

#[test]
fn find_without_match_is_none() {
    let tags = Tags::from(vec![Tag::new("body", "xml"), Tag::new("query", "id")]);
    assert!(tags.find(|tag| !tag.value.is_nil()).is_none());
}

#[test]
fn to_vec_copies_entries() {
    let tags = Tags::from(vec![
        Tag::new("body", "xml").with_value(10),
        Tag::new("path", "param").with_value(42),
    ]);
    let copy = tags.to_vec();
    assert_eq!(copy.len(), 2);
    assert_eq!(copy, tags.iter().cloned().collect::<Vec<_>>());
}

#[test]
fn display_lists_every_part() {
    let tag = Tag::new("query", "name").with_options(["omitempty"]).with_value("John");
    assert_eq!(tag.to_string(), "Tag(key=query, name=name, options=[omitempty], value=John)");

    let bare = Tag::new("query", "ptr_int").with_options(["opt1", "opt2"]).with_value(42);
    assert_eq!(bare.to_string(), "Tag(key=query, name=ptr_int, options=[opt1, opt2], value=42)");
}

#[test]
fn value_as_extracts_matching_shapes() {
    let string = Tag::new("query", "name").with_value("John");
    assert_eq!(string.value_as::<String>().unwrap(), "John");

    let err = string.value_as::<i64>().unwrap_err();
    assert!(matches!(err, CoerceError::TypeMismatch { .. }));
    assert_eq!(err.to_string(), "type assertion to i64 failed for value of type string");

    let ids = Tag::new("query", "ids").with_value(vec![1, 2, 3]);
    assert_eq!(ids.value_as::<Vec<i64>>().unwrap(), vec![1, 2, 3]);

    let mut properties = HashMap::new();
    properties.insert("key1".to_string(), "value1".to_string());
    properties.insert("key2".to_string(), "value2".to_string());
    let map = Tag::new("query", "properties").with_value(properties.clone());
    assert_eq!(map.value_as::<HashMap<String, String>>().unwrap(), properties);

    let ptr = Tag::new("query", "ptr").with_value(42);
    assert_eq!(ptr.value_as::<Option<i64>>().unwrap(), Some(42));
}

#[test]
fn value_as_rejects_values_that_do_not_fit() {
    let wide = Tag::new("q", "n").with_value(300i64);
    let err = wide.value_as::<i8>().unwrap_err();
    assert!(matches!(err, CoerceError::TypeMismatch { ref expected, ref found } if expected == "i8" && found == "int"));
    assert_eq!(wide.value_as::<i16>().unwrap(), 300);

    let negative = Tag::new("q", "n").with_value(-1i64);
    assert!(negative.value_as::<u64>().is_err());

    let elements = Tag::new("q", "ids").with_value(vec![1i64, 300]);
    assert!(elements.value_as::<Vec<u8>>().is_err());
    assert_eq!(elements.value_as::<Vec<i32>>().unwrap(), vec![1, 300]);

    let precise = Tag::new("q", "ratio").with_value(0.1f64);
    assert!(precise.value_as::<f32>().is_err());
    assert_eq!(precise.value_as::<f64>().unwrap(), 0.1);

    let nan = Tag::new("q", "ratio").with_value(f64::NAN);
    assert!(nan.value_as::<f64>().unwrap().is_nan());
}

#[test]
fn value_as_extracts_records_from_walks() {
    let data = Named { name: "John".into() };
    let tags = get_tags("query", &data).unwrap();
    assert_eq!(tags[0].value_as::<String>().unwrap(), "John");

    let record = Tag::new("query", "simple").with_value(data.to_value());
    assert_eq!(record.value_as::<Named>().unwrap(), data);
    assert!(record.value_as::<String>().is_err());
}

#[test]
fn value_as_rejects_nil_for_plain_types() {
    let nil = Tag::new("url", "path");
    assert!(nil.value_as::<String>().is_err());
    assert_eq!(nil.value_as::<Option<String>>().unwrap(), None);
    assert_eq!(nil.value_as::<Value>().unwrap(), Value::Nil);
}

#[test]
fn tags_iterate_by_reference_and_value() {
    let tags = sample();
    let keys: Vec<&str> = (&tags).into_iter().map(|tag| tag.key.as_str()).collect();
    assert_eq!(keys, ["body", "query", "url"]);
    assert_eq!(tags.into_vec().len(), 3);
}
