use tagwalk::Record;

#[derive(Record)]
pub enum Shape {
    Circle,
}

fn main() {}
