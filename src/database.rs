use std::error::Error;
use std::fmt;

use crate::error::AppError;
use crate::models::{Book, BookName};
use crate::pagination::{Listing, PageRequest, PageResult};
use crate::repo::{BookLookup, BookRepo, LookupResult, StockFilter};
use crate::schema::{books, CREATE_BOOKS_TABLE};
use bb8::Pool;
use diesel::expression::BoxableExpression;
use diesel::expression_methods::{EscapeExpressionMethods, ExpressionMethods, TextExpressionMethods};
use diesel::pg::Pg;
use diesel::result::DatabaseErrorKind;
use diesel::sql_types::Bool;
use diesel::{OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{
    pooled_connection::{AsyncDieselConnectionManager, PoolError},
    AsyncPgConnection, RunQueryDsl,
};
use serde_json::{Map, Value};

pub type DBPool = bb8::Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

pub async fn create_db_pool(connection_string: String, max_size: u32) -> Result<DBPool, DatabaseError> {
    let config =
        AsyncDieselConnectionManager::<diesel_async::AsyncPgConnection>::new(connection_string);
    let pool = Pool::builder().max_size(max_size).build(config).await?;
    Ok(pool)
}

#[derive(Debug)]
pub enum DatabaseError {
    ConnectionError(PoolError),
    PoolError(bb8::RunError<PoolError>),
    ResultError(diesel::result::Error),
}

impl DatabaseError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::ResultError(diesel::result::Error::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                _
            ))
        )
    }

    /// What the store reported about the failure, as loose key/value pairs that
    /// can be merged into an error body.
    pub fn fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        match self {
            DatabaseError::ResultError(diesel::result::Error::DatabaseError(kind, info)) => {
                fields.insert("kind".to_string(), Value::from(format!("{kind:?}")));
                fields.insert("cause".to_string(), Value::from(info.message()));
                let extra = [
                    ("details", info.details()),
                    ("constraint", info.constraint_name()),
                    ("table", info.table_name()),
                ];
                for (key, value) in extra {
                    if let Some(value) = value {
                        fields.insert(key.to_string(), Value::from(value));
                    }
                }
            }
            other => {
                fields.insert("cause".to_string(), Value::from(other.to_string()));
            }
        }
        fields
    }
}

impl From<PoolError> for DatabaseError {
    fn from(error: PoolError) -> Self {
        DatabaseError::ConnectionError(error)
    }
}

impl From<bb8::RunError<PoolError>> for DatabaseError {
    fn from(error: bb8::RunError<PoolError>) -> Self {
        DatabaseError::PoolError(error)
    }
}

impl From<diesel::result::Error> for DatabaseError {
    fn from(error: diesel::result::Error) -> Self {
        DatabaseError::ResultError(error)
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::ConnectionError(e) => {
                write!(f, "could not open connections to the book catalog store: {e}")
            }
            DatabaseError::PoolError(e) => {
                write!(f, "no catalog store connection available: {e}")
            }
            DatabaseError::ResultError(e) => {
                write!(f, "catalog store rejected the statement: {e}")
            }
        }
    }
}

impl Error for DatabaseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DatabaseError::ConnectionError(e) => Some(e),
            DatabaseError::PoolError(e) => Some(e),
            DatabaseError::ResultError(e) => Some(e),
        }
    }
}

const DUPLICATED_BOOK: &str = "Já existe um livro com a mesma isbn e/ou nome cadastrados";

fn layer_message(operation: &str, description: &str) -> String {
    format!("model :: {operation} :: {description}")
}

/// Tags a store failure with the operation that raised it. Uniqueness
/// violations stay distinguishable so they reach the client as conflicts.
fn tagged(operation: &str, description: &str, error: DatabaseError) -> AppError {
    let message = layer_message(operation, description);
    let fields = error.fields();
    if error.is_unique_violation() {
        AppError::Conflict { message, fields }
    } else {
        AppError::Internal {
            message: Some(message),
            fields,
        }
    }
}

type StockCondition = Box<dyn BoxableExpression<books::table, Pg, SqlType = Bool>>;

fn stock_condition(filter: StockFilter) -> StockCondition {
    match filter {
        StockFilter::InStock => Box::new(books::stock.gt(0)),
        StockFilter::OutOfStock => Box::new(books::stock.eq(0)),
    }
}

/// Turns a name fragment into a LIKE pattern that matches it literally.
fn substring_pattern(fragment: &str) -> String {
    let escaped = fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[derive(Clone)]
pub struct DatabaseBookRepo {
    pool: DBPool,
}

impl DatabaseBookRepo {
    pub fn new(pool: DBPool) -> Self {
        DatabaseBookRepo { pool }
    }

    async fn run_create_table(&self) -> Result<(), DatabaseError> {
        let mut conn = self.pool.get().await?;

        diesel::sql_query(CREATE_BOOKS_TABLE)
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    async fn insert_book(&self, book: Book) -> Result<(), DatabaseError> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(books::table)
            .values(book)
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    async fn list_book_names(
        &self,
        request: PageRequest,
        filter: StockFilter,
    ) -> Result<Listing, DatabaseError> {
        let mut conn = self.pool.get().await?;

        let total_results: i64 = books::table
            .filter(stock_condition(filter))
            .count()
            .get_result(&mut conn)
            .await?;

        if total_results == 0 {
            return Ok(Listing::Empty);
        }

        let names = books::table
            .filter(stock_condition(filter))
            .select(BookName::as_select())
            .order(books::isbn.asc())
            .limit(request.size)
            .offset(request.offset())
            .load(&mut conn)
            .await?;

        Ok(Listing::Page(PageResult::new(request, total_results, names)))
    }

    async fn find_books(&self, lookup: BookLookup) -> Result<LookupResult, DatabaseError> {
        let mut conn = self.pool.get().await?;

        let found = match lookup {
            BookLookup::Isbn(isbn) => {
                let maybe_book = books::table
                    .find(isbn)
                    .select(Book::as_select())
                    .first(&mut conn)
                    .await
                    .optional()?;
                LookupResult::Single(maybe_book)
            }
            BookLookup::Name(fragment) => {
                let matches = books::table
                    .filter(books::name.like(substring_pattern(&fragment)).escape('\\'))
                    .select(Book::as_select())
                    .order(books::isbn.asc())
                    .load(&mut conn)
                    .await?;
                LookupResult::Many(matches)
            }
        };

        Ok(found)
    }

    async fn update_book(&self, book: Book) -> Result<usize, DatabaseError> {
        let mut conn = self.pool.get().await?;

        let changes = diesel::update(books::table.find(book.isbn))
            .set((
                books::name.eq(book.name),
                books::description.eq(book.description),
                books::author.eq(book.author),
                books::stock.eq(book.stock),
            ))
            .execute(&mut conn)
            .await?;

        Ok(changes)
    }

    async fn remove_book(&self, isbn: i64) -> Result<usize, DatabaseError> {
        let mut conn = self.pool.get().await?;

        let changes = diesel::delete(books::table.find(isbn))
            .execute(&mut conn)
            .await?;

        Ok(changes)
    }
}

impl BookRepo for DatabaseBookRepo {
    async fn create_table(&self) -> Result<(), AppError> {
        self.run_create_table().await.map_err(|e| AppError::Internal {
            message: Some(layer_message(
                "createBookTable",
                "Erro ao executar criação da tabela de livros!",
            )),
            fields: e.fields(),
        })
    }

    async fn add(&self, book: Book) -> Result<(), AppError> {
        self.insert_book(book).await.map_err(|e| {
            let description = if e.is_unique_violation() {
                DUPLICATED_BOOK
            } else {
                "Erro ao cadastrar livro"
            };
            tagged("addBook", description, e)
        })
    }

    async fn list(&self, request: PageRequest, filter: StockFilter) -> Result<Listing, AppError> {
        self.list_book_names(request, filter)
            .await
            .map_err(|e| tagged("listBooks", "Erro ao listar livros", e))
    }

    async fn get_by_unique_param(&self, lookup: BookLookup) -> Result<LookupResult, AppError> {
        self.find_books(lookup).await.map_err(|e| {
            tagged(
                "getBookByUniqueParam",
                "Erro ao listar detalhes do(s) livro(s)",
                e,
            )
        })
    }

    async fn edit(&self, book: Book) -> Result<usize, AppError> {
        self.update_book(book)
            .await
            .map_err(|e| tagged("editBook", "Erro ao editar o livro", e))
    }

    async fn delete_by_isbn(&self, isbn: i64) -> Result<usize, AppError> {
        self.remove_book(isbn)
            .await
            .map_err(|e| tagged("deleteBookByISBN", "Erro ao deletar o livro", e))
    }
}
