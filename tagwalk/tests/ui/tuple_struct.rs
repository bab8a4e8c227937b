use tagwalk::Record;

#[derive(Record)]
pub struct Pair(pub i32, pub i32);

fn main() {}
