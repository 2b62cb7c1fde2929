//! Catalog service: books, authors and genres

use uuid::Uuid;
use validator::Validate;

use crate::{
    api::home::CatalogCounts,
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorQuery, CreateAuthor, UpdateAuthor},
        book::{Book, BookQuery, BookShort, CreateBook, UpdateBook},
        genre::{CreateGenre, Genre},
        instance::{BookInstance, CreateInstance, InstanceQuery, UpdateInstance},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    // --- Books ---

    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<BookShort>, i64)> {
        self.repository.books.search(query).await
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()?;
        self.check_book_relations(book.author_id, &book.genre_ids)
            .await?;
        self.repository.books.create(&book).await
    }

    pub async fn update_book(&self, id: i32, update: UpdateBook) -> AppResult<Book> {
        update.validate()?;
        let genre_ids = update.genre_ids.clone().unwrap_or_default();
        self.check_book_relations(update.author_id, &genre_ids)
            .await?;
        self.repository.books.update(id, &update).await
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await
    }

    /// Verify the author and genres a book refers to actually exist
    async fn check_book_relations(
        &self,
        author_id: Option<i32>,
        genre_ids: &[i32],
    ) -> AppResult<()> {
        if let Some(author_id) = author_id {
            self.repository.authors.get_by_id(author_id).await.map_err(
                |_| AppError::field("author_id", format!("Unknown author {}", author_id)),
            )?;
        }
        if !genre_ids.is_empty() {
            let existing = self.repository.genres.count_existing(genre_ids).await?;
            if existing != genre_ids.len() as i64 {
                return Err(AppError::field("genre_ids", "Unknown genre in list"));
            }
        }
        Ok(())
    }

    // --- Authors ---

    pub async fn list_authors(&self, query: &AuthorQuery) -> AppResult<(Vec<Author>, i64)> {
        self.repository.authors.list(query).await
    }

    pub async fn get_author(&self, id: i32) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await
    }

    pub async fn create_author(&self, author: CreateAuthor) -> AppResult<Author> {
        author.validate()?;
        self.repository.authors.create(&author).await
    }

    pub async fn update_author(&self, id: i32, update: UpdateAuthor) -> AppResult<Author> {
        update.validate()?;
        self.repository.authors.update(id, &update).await
    }

    /// Delete an author; their books are detached, never deleted
    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await
    }

    // --- Genres ---

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.list().await
    }

    pub async fn create_genre(&self, genre: CreateGenre) -> AppResult<Genre> {
        genre.validate()?;
        self.repository.genres.create(&genre).await
    }

    // --- Instances ---

    pub async fn list_instances(
        &self,
        query: &InstanceQuery,
    ) -> AppResult<(Vec<BookInstance>, i64)> {
        self.repository.instances.list(query).await
    }

    pub async fn get_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        self.repository.instances.get_by_id(id).await
    }

    pub async fn create_instance(&self, instance: CreateInstance) -> AppResult<BookInstance> {
        instance.validate()?;
        // The owning book must exist before a copy of it can
        self.repository.books.get_by_id(instance.book_id).await?;
        if let Some(borrower_id) = instance.borrower_id {
            self.repository.users.get_by_id(borrower_id).await?;
        }
        self.repository.instances.create(&instance).await
    }

    pub async fn update_instance(
        &self,
        id: Uuid,
        update: UpdateInstance,
    ) -> AppResult<BookInstance> {
        update.validate()?;
        if let Some(borrower_id) = update.borrower_id {
            self.repository.users.get_by_id(borrower_id).await?;
        }
        self.repository.instances.update(id, &update).await
    }

    pub async fn delete_instance(&self, id: Uuid) -> AppResult<()> {
        self.repository.instances.delete(id).await
    }

    // --- Home summary ---

    /// Counts shown on the home page
    pub async fn counts(&self) -> AppResult<CatalogCounts> {
        Ok(CatalogCounts {
            num_books: self.repository.books.count().await?,
            num_instances: self.repository.instances.count().await?,
            num_instances_available: self.repository.instances.count_available().await?,
            num_authors: self.repository.authors.count().await?,
        })
    }
}
