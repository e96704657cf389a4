use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::error::AppError;
use crate::pagination::Listing;
use crate::repo::{BookLookup, BookRepo, LookupResult, StockFilter};
use crate::validation::{
    is_valid_body, is_valid_isbn_param, is_valid_name_param, is_valid_pagination_query,
};

const BOOK_ADDED: &str = "Livro cadastrado com sucesso";
const BOOK_EDITED: &str = "Livro editado com sucesso";
const BOOK_DELETED: &str = "Livro deletado com sucesso";
const ISBN_NOT_REGISTERED: &str =
    "O código isbn informado não está registrado à nenhum livro. Nenhuma alteração foi feita";

#[derive(Clone)]
struct AppState<R> {
    repo: R,
}

pub fn build_api<R>(repo: R) -> Router
where
    R: BookRepo + Clone + Send + Sync + 'static,
{
    // A known path hit with an unsupported method is answered like an unknown path.
    Router::new()
        .route("/", get(health_check).fallback(not_found))
        .route(
            "/book",
            post(add_book::<R>).put(edit_book::<R>).fallback(not_found),
        )
        .route("/books", get(list_books::<R>).fallback(not_found))
        .route(
            "/books/out-of-stock",
            get(list_out_of_stock_books::<R>).fallback(not_found),
        )
        .route(
            "/book/isbn/{isbn}",
            get(get_book_by_isbn::<R>).fallback(not_found),
        )
        .route(
            "/book/name/{name}",
            get(get_book_by_name::<R>).fallback(not_found),
        )
        .route("/book/{isbn}", delete(delete_book::<R>).fallback(not_found))
        .fallback(not_found)
        .with_state(AppState { repo })
}

async fn health_check() -> Json<Value> {
    Json(json!({ "message": "OK" }))
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn add_book<R>(
    State(state): State<AppState<R>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response
where
    R: BookRepo + Send + Sync,
{
    match try_to_add_book(&state.repo, json_body(body)).await {
        Ok(isbn) => {
            info!("Inserted book into the DB with ISBN: {}", isbn);
            message_response(BOOK_ADDED)
        }
        Err(error) => error.into_response_at(Some("controller :: addBook")),
    }
}

async fn try_to_add_book(repo: &impl BookRepo, body: Value) -> Result<i64, AppError> {
    let book = is_valid_body(&body)?;
    let isbn = book.isbn;
    repo.add(book).await?;
    Ok(isbn)
}

async fn list_books<R>(
    State(state): State<AppState<R>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response
where
    R: BookRepo + Send + Sync,
{
    list(&state.repo, query, StockFilter::InStock).await
}

async fn list_out_of_stock_books<R>(
    State(state): State<AppState<R>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response
where
    R: BookRepo + Send + Sync,
{
    list(&state.repo, query, StockFilter::OutOfStock).await
}

async fn list(repo: &impl BookRepo, query: HashMap<String, String>, filter: StockFilter) -> Response {
    match try_to_list(repo, query, filter).await {
        Ok(listing) => {
            match &listing {
                Listing::Page(page) => info!(
                    "Retrieved page {} of {} ({:?}) from the DB",
                    page.page, page.total_pages, filter
                ),
                Listing::Empty => info!("No books found in the DB ({:?})", filter),
            }
            (StatusCode::OK, Json(listing)).into_response()
        }
        Err(error) => error.into_response_at(Some("controller :: listBooks")),
    }
}

async fn try_to_list(
    repo: &impl BookRepo,
    query: HashMap<String, String>,
    filter: StockFilter,
) -> Result<Listing, AppError> {
    let query = query
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect::<Map<String, Value>>();
    let request = is_valid_pagination_query(&Value::Object(query))?;
    repo.list(request, filter).await
}

async fn get_book_by_isbn<R>(State(state): State<AppState<R>>, Path(isbn): Path<String>) -> Response
where
    R: BookRepo + Send + Sync,
{
    let found = try_to_get_book_by_isbn(&state.repo, &isbn).await;

    lookup_response(found, "controller :: getBookByISBN")
}

async fn try_to_get_book_by_isbn(repo: &impl BookRepo, isbn: &str) -> Result<LookupResult, AppError> {
    let isbn = is_valid_isbn_param(isbn)?;
    repo.get_by_unique_param(BookLookup::Isbn(isbn)).await
}

async fn get_book_by_name<R>(State(state): State<AppState<R>>, Path(name): Path<String>) -> Response
where
    R: BookRepo + Send + Sync,
{
    let found = try_to_get_books_by_name(&state.repo, &name).await;

    lookup_response(found, "controller :: getBookByName")
}

async fn try_to_get_books_by_name(repo: &impl BookRepo, name: &str) -> Result<LookupResult, AppError> {
    let name = is_valid_name_param(name)?;
    repo.get_by_unique_param(BookLookup::Name(name)).await
}

fn lookup_response(found: Result<LookupResult, AppError>, location: &str) -> Response {
    match found {
        Ok(result) => {
            match &result {
                LookupResult::Single(Some(book)) => info!("Retrieved book from DB: {:?}", book),
                LookupResult::Single(None) => info!("No book found in DB for the given ISBN"),
                LookupResult::Many(books) => info!("Retrieved {} books from the DB", books.len()),
            }
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(error) => error.into_response_at(Some(location)),
    }
}

async fn edit_book<R>(
    State(state): State<AppState<R>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response
where
    R: BookRepo + Send + Sync,
{
    match try_to_edit_book(&state.repo, json_body(body)).await {
        Ok((isbn, 0)) => {
            info!("Tried to edit non-existent book with ISBN: {}", isbn);
            message_response(ISBN_NOT_REGISTERED)
        }
        Ok((isbn, _)) => {
            info!("Edited book in DB with ISBN: {}", isbn);
            message_response(BOOK_EDITED)
        }
        Err(error) => error.into_response_at(Some("controller :: editBook")),
    }
}

async fn try_to_edit_book(repo: &impl BookRepo, body: Value) -> Result<(i64, usize), AppError> {
    let book = is_valid_body(&body)?;
    let isbn = book.isbn;
    let changes = repo.edit(book).await?;
    Ok((isbn, changes))
}

async fn delete_book<R>(State(state): State<AppState<R>>, Path(isbn): Path<String>) -> Response
where
    R: BookRepo + Send + Sync,
{
    match try_to_delete_book(&state.repo, &isbn).await {
        Ok(0) => {
            info!("Tried to delete non-existent book with ISBN: {}", isbn);
            message_response(ISBN_NOT_REGISTERED)
        }
        Ok(_) => {
            info!("Deleted book from DB with ISBN: {}", isbn);
            message_response(BOOK_DELETED)
        }
        Err(error) => error.into_response_at(Some("controller :: deleteBookByISBN")),
    }
}

async fn try_to_delete_book(repo: &impl BookRepo, isbn: &str) -> Result<usize, AppError> {
    let isbn = is_valid_isbn_param(isbn)?;
    repo.delete_by_isbn(isbn).await
}

/// An unreadable or absent body is validated as if it were empty, so the client
/// learns which fields are missing.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> Value {
    match body {
        Ok(Json(value)) => value,
        Err(rejection) => {
            warn!("Could not read request body as JSON: {}", rejection);
            Value::Null
        }
    }
}

fn message_response(message: &str) -> Response {
    (StatusCode::OK, Json(json!({ "message": message }))).into_response()
}
