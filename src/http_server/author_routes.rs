//! Author HTTP Routes
//!
//! - `POST /authors` create an author
//! - `GET /authors` list authors
//! - `GET /authors/{id}?includeBooks=true` fetch one author
//! - `POST /authors/{id}/books` create a book for an author
//!
//! Domain calls run on the blocking pool since a commit may fsync.

use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Json, Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use uuid::Uuid;

use super::problem::ProblemDetails;
use crate::domain::{AuthorDetail, AuthorService, Book, Failure, Outcome};
use crate::store::CatalogStore;

// ==================
// Shared State
// ==================

/// State shared across author handlers
pub struct AuthorsState {
    pub service: AuthorService<CatalogStore>,
}

impl AuthorsState {
    /// State over a fresh in-memory store
    pub fn new() -> Self {
        Self::with_store(CatalogStore::in_memory())
    }

    pub fn with_store(store: CatalogStore) -> Self {
        Self {
            service: AuthorService::new(store),
        }
    }
}

impl Default for AuthorsState {
    fn default() -> Self {
        Self::new()
    }
}

// ==================
// Request Types
// ==================

/// Body of `POST /authors`. A missing name is treated as empty.
#[derive(Debug, Deserialize)]
pub struct CreateAuthorRequest {
    #[serde(default)]
    pub name: Option<String>,
}

/// Body of `POST /authors/{id}/books`. A missing title is treated as empty.
#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GetAuthorQuery {
    #[serde(
        default,
        rename = "includeBooks",
        alias = "include_books",
        deserialize_with = "case_insensitive_bool"
    )]
    pub include_books: bool,
}

/// `true`/`false` in any letter case, as query strings carry them
fn case_insensitive_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct BoolVisitor;

    impl Visitor<'_> for BoolVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("true or false")
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<bool, E> {
            Ok(value)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<bool, E> {
            if value.eq_ignore_ascii_case("true") {
                Ok(true)
            } else if value.eq_ignore_ascii_case("false") {
                Ok(false)
            } else {
                Err(E::invalid_value(de::Unexpected::Str(value), &self))
            }
        }
    }

    deserializer.deserialize_any(BoolVisitor)
}

// ==================
// Errors
// ==================

/// Failure raised by a route: either a domain outcome or a transport rejection
#[derive(Debug)]
pub enum RouteError {
    Domain(Failure),
    Transport(ProblemDetails),
}

impl From<Failure> for RouteError {
    fn from(failure: Failure) -> Self {
        RouteError::Domain(failure)
    }
}

impl From<ProblemDetails> for RouteError {
    fn from(problem: ProblemDetails) -> Self {
        RouteError::Transport(problem)
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        match self {
            RouteError::Domain(failure) => failure.into_response(),
            RouteError::Transport(problem) => problem.into_response(),
        }
    }
}

type RouteResult<T> = Result<T, RouteError>;

// ==================
// Routes
// ==================

pub fn author_routes(state: Arc<AuthorsState>) -> Router {
    Router::new()
        .route("/authors", get(list_authors_handler).post(create_author_handler))
        .route("/authors/{id}", get(get_author_handler))
        .route("/authors/{id}/books", post(create_book_handler))
        .with_state(state)
}

/// Run a domain operation on the blocking pool
async fn run_blocking<T, F>(state: &Arc<AuthorsState>, op: F) -> RouteResult<T>
where
    F: FnOnce(&AuthorService<CatalogStore>) -> Outcome<T> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    let outcome = tokio::task::spawn_blocking(move || op(&state.service))
        .await
        .map_err(|e| ProblemDetails::internal(format!("Request task failed: {}", e)))?;
    Ok(outcome?)
}

fn parse_id(path: Result<Path<Uuid>, PathRejection>) -> RouteResult<Uuid> {
    path.map(|Path(id)| id)
        .map_err(|e| ProblemDetails::invalid_id(e.body_text()).into())
}

// ==================
// Handlers
// ==================

async fn create_author_handler(
    State(state): State<Arc<AuthorsState>>,
    body: Result<Json<CreateAuthorRequest>, JsonRejection>,
) -> RouteResult<impl IntoResponse> {
    let Json(request) = body.map_err(|e| ProblemDetails::invalid_body(e.body_text()))?;
    let name = request.name.unwrap_or_default();

    let author = run_blocking(&state, move |service| service.create_author(&name)).await?;
    let location = format!("/authors/{}", author.id());

    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(author)))
}

async fn list_authors_handler(
    State(state): State<Arc<AuthorsState>>,
) -> RouteResult<Json<Vec<AuthorDetail>>> {
    let authors = run_blocking(&state, |service| service.list_authors()).await?;
    Ok(Json(authors))
}

async fn get_author_handler(
    State(state): State<Arc<AuthorsState>>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<GetAuthorQuery>, QueryRejection>,
) -> RouteResult<Json<AuthorDetail>> {
    let id = parse_id(path)?;
    let Query(query) = query.map_err(|e| ProblemDetails::invalid_query(e.body_text()))?;

    let author = run_blocking(&state, move |service| {
        service.get_author(id, query.include_books)
    })
    .await?;
    Ok(Json(author))
}

async fn create_book_handler(
    State(state): State<Arc<AuthorsState>>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<CreateBookRequest>, JsonRejection>,
) -> RouteResult<(StatusCode, [(header::HeaderName, String); 1], Json<Book>)> {
    let author_id = parse_id(path)?;
    let Json(request) = body.map_err(|e| ProblemDetails::invalid_body(e.body_text()))?;
    let title = request.title.unwrap_or_default();

    let book = run_blocking(&state, move |service| service.create_book(author_id, &title)).await?;
    let location = format!("/books/{}", book.id);

    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(book)))
}
