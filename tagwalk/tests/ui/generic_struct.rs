use tagwalk::Record;

#[derive(Record)]
pub struct Wrapper<T> {
    pub inner: T,
}

fn main() {}
