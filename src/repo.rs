use crate::error::AppError;
use crate::models::Book;
use crate::pagination::{Listing, PageRequest};
use std::future::Future;

/// Which side of the stock boundary a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockFilter {
    InStock,
    OutOfStock,
}

/// How a unique-key lookup matches the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookLookup {
    Isbn(i64),
    /// Substring match on the book name
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum LookupResult {
    Single(Option<Book>),
    Many(Vec<Book>),
}

/// Failures come back already tagged with the operation that raised them,
/// ready to be shown to the client.
pub trait BookRepo {
    fn create_table(&self) -> impl Future<Output = Result<(), AppError>> + Send;

    fn add(&self, book: Book) -> impl Future<Output = Result<(), AppError>> + Send;

    fn list(
        &self,
        request: PageRequest,
        filter: StockFilter,
    ) -> impl Future<Output = Result<Listing, AppError>> + Send;

    fn get_by_unique_param(
        &self,
        lookup: BookLookup,
    ) -> impl Future<Output = Result<LookupResult, AppError>> + Send;

    /// Returns the number of rows changed, 0 when no book has that ISBN
    fn edit(&self, book: Book) -> impl Future<Output = Result<usize, AppError>> + Send;

    /// Returns the number of rows deleted, 0 when no book has that ISBN
    fn delete_by_isbn(&self, isbn: i64) -> impl Future<Output = Result<usize, AppError>> + Send;
}
