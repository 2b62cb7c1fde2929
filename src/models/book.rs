//! Book model and related types.
//!
//! A `Book` is the catalog entry; the physical copies patrons actually
//! borrow are [`BookInstance`](super::instance::BookInstance) rows owned
//! by it. The Genre relation is a plain join table (`book_genres`);
//! genres are loaded separately and carried on `#[sqlx(skip)]` fields.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::genre::Genre;
use super::instance::BookInstance;

/// Full book model (DB + API). Author and genres are loaded separately.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    /// Nullable: a book survives the deletion of its author.
    pub author_id: Option<i32>,
    // Relations (loaded separately)
    #[sqlx(skip)]
    #[serde(default)]
    pub author: Option<super::author::Author>,
    #[sqlx(skip)]
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[sqlx(skip)]
    #[serde(default)]
    pub instances: Vec<BookInstance>,
}

/// Short book representation for lists
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookShort {
    pub id: i32,
    pub title: String,
    pub isbn: String,
    pub author_id: Option<i32>,
    pub author_name: Option<String>,
    pub nb_instances: i64,
    pub nb_available: i64,
}

/// Book query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Case-insensitive substring match on the title
    pub title: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 1000, message = "Summary must be at most 1000 characters"))]
    pub summary: String,
    /// 13-character ISBN
    #[validate(length(equal = 13, message = "ISBN must be 13 characters"))]
    pub isbn: String,
    pub author_id: Option<i32>,
    /// Genres to associate (zero or more)
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}

/// Update book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 1000, message = "Summary must be at most 1000 characters"))]
    pub summary: Option<String>,
    #[validate(length(equal = 13, message = "ISBN must be 13 characters"))]
    pub isbn: Option<String>,
    pub author_id: Option<i32>,
    /// When present, replaces the full genre set
    pub genre_ids: Option<Vec<i32>>,
}
