//! Fills a request struct from raw query parameters.
//!
//! Run with `RUST_LOG=tagwalk=trace cargo run --example query_params` to see the walk.

use std::collections::HashMap;

use anyhow::Result;
use tagwalk::{Record, get_tags_and_process, processor_fn, set_field};

#[derive(Record, Debug, Default)]
pub struct Paging {
    #[tag(query = "page")]
    pub page: u32,
    #[tag(query = "per_page")]
    pub per_page: u32,
}

#[derive(Record, Debug, Default)]
pub struct ListUsers {
    #[tag(query = "q")]
    pub search: Option<String>,
    #[tag(query = "ids")]
    pub ids: Vec<u64>,
    #[tag(query = "active")]
    pub active: bool,
    #[tag(embed)]
    pub paging: Paging,
}

fn main() -> Result<()> {
    env_logger::init();

    let params: HashMap<&str, &str> = [("q", "ada"), ("ids", "3, 5, 8"), ("active", "1"), ("page", "2")]
        .into_iter()
        .collect();

    let mut request = ListUsers::default();
    let mut fill = processor_fn(|field, tag| {
        if let Some(raw) = params.get(tag.name.as_str()) {
            set_field(field, *raw)?;
        }
        Ok(())
    });
    let tags = get_tags_and_process("query", &mut request, Some(&mut fill))?;

    for tag in &tags {
        println!("{tag}");
    }
    println!("{request:?}");
    Ok(())
}
