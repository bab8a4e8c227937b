use tagwalk::Record;

#[derive(Record)]
pub struct Limits {
    #[tag(query = 10)]
    pub max: u32,
}

fn main() {}
