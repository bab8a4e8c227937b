use tagwalk::Record;

#[derive(Record)]
pub struct Login {
    #[tag(json = "user", json = "login")]
    pub user: String,
}

fn main() {}
