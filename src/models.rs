use crate::schema::books;

#[derive(
    Debug, Clone, PartialEq, Eq, serde::Serialize, diesel::Queryable, diesel::Selectable, diesel::Insertable,
)]
#[diesel(table_name = books)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Book {
    pub isbn: i64,
    pub name: String,
    pub description: String,
    pub author: String,
    pub stock: i64,
}

/// A single row of a catalog listing, which only exposes the title.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, diesel::Queryable, diesel::Selectable)]
#[diesel(table_name = books)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BookName {
    pub name: String,
}
