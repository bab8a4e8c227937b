use tagwalk::Record;

#[derive(Record)]
pub struct Page {
    #[tag(flatten)]
    pub base: String,
}

fn main() {}
