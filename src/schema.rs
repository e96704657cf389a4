diesel::table! {
    books (isbn) {
        isbn -> Int8,
        description -> Text,
        author -> Text,
        stock -> Int8,
        name -> Text,
    }
}

pub const CREATE_BOOKS_TABLE: &str = "CREATE TABLE IF NOT EXISTS books (
    isbn BIGINT PRIMARY KEY NOT NULL,
    description TEXT NOT NULL,
    author TEXT NOT NULL,
    stock BIGINT NOT NULL,
    name TEXT NOT NULL UNIQUE
)";
