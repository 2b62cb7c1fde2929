//! Books repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        author::Author,
        book::{Book, BookQuery, BookShort, CreateBook, UpdateBook},
    },
};

/// Default page size for book listings
const DEFAULT_PER_PAGE: i64 = 2;
const MAX_PER_PAGE: i64 = 100;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID with author, genres and instances loaded
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        let mut book = sqlx::query_as::<_, Book>(
            "SELECT id, title, summary, isbn, author_id FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        book.author = sqlx::query_as::<_, Author>(
            "SELECT id, first_name, last_name, date_of_birth, date_of_death FROM authors WHERE id = $1",
        )
        .bind(book.author_id)
        .fetch_optional(&self.pool)
        .await?;

        book.genres = sqlx::query_as(
            r#"
            SELECT g.id, g.name
            FROM book_genres bg
            JOIN genres g ON g.id = bg.genre_id
            WHERE bg.book_id = $1
            ORDER BY g.name
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        book.instances = sqlx::query_as(
            r#"
            SELECT id, book_id, imprint, due_back, borrower_id, status
            FROM book_instances
            WHERE book_id = $1
            ORDER BY due_back ASC NULLS FIRST
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(book)
    }

    /// Search books with pagination and optional title substring filter
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<BookShort>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        let offset = (page - 1) * per_page;

        let title_pattern = query
            .title
            .as_ref()
            .map(|t| format!("%{}%", t.to_lowercase()));

        let (where_clause, has_title) = match title_pattern {
            Some(_) => ("WHERE LOWER(b.title) LIKE $1", true),
            None => ("", false),
        };

        let count_query = format!("SELECT COUNT(*) FROM books b {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(ref pattern) = title_pattern {
            count_builder = count_builder.bind(pattern);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            r#"
            SELECT b.id, b.title, b.isbn, b.author_id,
                   CASE WHEN a.id IS NULL THEN NULL
                        ELSE a.last_name || ', ' || a.first_name
                   END as author_name,
                   COALESCE((
                       SELECT COUNT(*) FROM book_instances bi WHERE bi.book_id = b.id
                   ), 0) as nb_instances,
                   COALESCE((
                       SELECT COUNT(*) FROM book_instances bi
                       WHERE bi.book_id = b.id AND bi.status = 'a'
                   ), 0) as nb_available
            FROM books b
            LEFT JOIN authors a ON a.id = b.author_id
            {}
            ORDER BY b.title
            LIMIT {} OFFSET {}
            "#,
            where_clause,
            if has_title { "$2" } else { "$1" },
            if has_title { "$3" } else { "$2" },
        );

        let mut select_builder = sqlx::query_as::<_, BookShort>(&select_query);
        if let Some(ref pattern) = title_pattern {
            select_builder = select_builder.bind(pattern);
        }
        let books = select_builder
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((books, total))
    }

    /// Create a new book and its genre associations
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO books (title, summary, isbn, author_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&book.title)
        .bind(&book.summary)
        .bind(&book.isbn)
        .bind(book.author_id)
        .fetch_one(&mut *tx)
        .await?;

        for genre_id in &book.genre_ids {
            sqlx::query("INSERT INTO book_genres (book_id, genre_id) VALUES ($1, $2)")
                .bind(id)
                .bind(genre_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        self.get_by_id(id).await
    }

    /// Update a book, replacing the genre set when one is provided
    pub async fn update(&self, id: i32, update: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE books
            SET title = COALESCE($2, title),
                summary = COALESCE($3, summary),
                isbn = COALESCE($4, isbn),
                author_id = COALESCE($5, author_id)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.summary)
        .bind(&update.isbn)
        .bind(update.author_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        if let Some(ref genre_ids) = update.genre_ids {
            sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for genre_id in genre_ids {
                sqlx::query("INSERT INTO book_genres (book_id, genre_id) VALUES ($1, $2)")
                    .bind(id)
                    .bind(genre_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;

        self.get_by_id(id).await
    }

    /// Delete a book. Refused while instances exist: a copy cannot
    /// outlive its book (the schema enforces this with ON DELETE RESTRICT,
    /// the explicit check turns it into a conflict response).
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let nb_instances: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE book_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        if nb_instances > 0 {
            return Err(AppError::Conflict(format!(
                "Book has {} instances and cannot be deleted",
                nb_instances
            )));
        }

        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    /// Count all books
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
