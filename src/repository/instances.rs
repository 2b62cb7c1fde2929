//! Book instances repository for database operations

use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::instance::{
        BookInstance, CreateInstance, InstanceQuery, LoanStatus, UpdateInstance,
    },
};

/// Default page size for instance listings (including "my borrowed")
const DEFAULT_PER_PAGE: i64 = 10;
const MAX_PER_PAGE: i64 = 100;

#[derive(Clone)]
pub struct InstancesRepository {
    pool: Pool<Postgres>,
}

impl InstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get instance by its UUID, with the owning book's title
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>(
            r#"
            SELECT bi.id, bi.book_id, bi.imprint, bi.due_back, bi.borrower_id,
                   bi.status, b.title as book_title
            FROM book_instances bi
            JOIN books b ON b.id = bi.book_id
            WHERE bi.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    /// List instances with pagination, optionally filtered by status.
    /// Default ordering is by due date, copies without one first.
    pub async fn list(&self, query: &InstanceQuery) -> AppResult<(Vec<BookInstance>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        let offset = (page - 1) * per_page;

        // An out-of-set status code is invalid input, not an empty filter.
        let status = match query.status.as_deref() {
            Some(code) => Some(
                code.parse::<LoanStatus>()
                    .map_err(|e| AppError::field("status", e))?,
            ),
            None => None,
        };

        let where_clause = if status.is_some() {
            "WHERE bi.status = $1"
        } else {
            ""
        };

        let count_query = format!(
            "SELECT COUNT(*) FROM book_instances bi {}",
            where_clause
        );
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(s) = status {
            count_builder = count_builder.bind(s);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            r#"
            SELECT bi.id, bi.book_id, bi.imprint, bi.due_back, bi.borrower_id,
                   bi.status, b.title as book_title
            FROM book_instances bi
            JOIN books b ON b.id = bi.book_id
            {}
            ORDER BY bi.due_back ASC NULLS FIRST
            LIMIT {} OFFSET {}
            "#,
            where_clause,
            if status.is_some() { "$2" } else { "$1" },
            if status.is_some() { "$3" } else { "$2" },
        );

        let mut select_builder = sqlx::query_as::<_, BookInstance>(&select_query);
        if let Some(s) = status {
            select_builder = select_builder.bind(s);
        }
        let instances = select_builder
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((instances, total))
    }

    /// Copies currently on loan to a user, ordered by due date ascending
    pub async fn borrowed_by(
        &self,
        user_id: i32,
        page: i64,
        per_page: i64,
    ) -> AppResult<(Vec<BookInstance>, i64)> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, MAX_PER_PAGE);
        let offset = (page - 1) * per_page;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_instances WHERE borrower_id = $1 AND status = 'o'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let instances = sqlx::query_as::<_, BookInstance>(
            r#"
            SELECT bi.id, bi.book_id, bi.imprint, bi.due_back, bi.borrower_id,
                   bi.status, b.title as book_title
            FROM book_instances bi
            JOIN books b ON b.id = bi.book_id
            WHERE bi.borrower_id = $1 AND bi.status = 'o'
            ORDER BY bi.due_back ASC NULLS FIRST
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((instances, total))
    }

    /// Create a new instance with a freshly generated UUID
    pub async fn create(&self, instance: &CreateInstance) -> AppResult<BookInstance> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO book_instances (id, book_id, imprint, due_back, borrower_id, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(instance.book_id)
        .bind(&instance.imprint)
        .bind(instance.due_back)
        .bind(instance.borrower_id)
        .bind(instance.status.unwrap_or_default())
        .execute(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    /// Update an instance. Status writes are permissive: any of the four
    /// states may be set, there is no transition graph to enforce.
    pub async fn update(&self, id: Uuid, update: &UpdateInstance) -> AppResult<BookInstance> {
        let result = sqlx::query(
            r#"
            UPDATE book_instances
            SET imprint = COALESCE($2, imprint),
                due_back = COALESCE($3, due_back),
                borrower_id = COALESCE($4, borrower_id),
                status = COALESCE($5, status)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&update.imprint)
        .bind(update.due_back)
        .bind(update.borrower_id)
        .bind(update.status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }

        self.get_by_id(id).await
    }

    /// Delete an instance
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM book_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }
        Ok(())
    }

    /// Persist a renewed due date
    pub async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<()> {
        let result = sqlx::query("UPDATE book_instances SET due_back = $2 WHERE id = $1")
            .bind(id)
            .bind(due_back)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }
        Ok(())
    }

    /// Count all instances
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count instances with status 'a'
    pub async fn count_available(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE status = 'a'")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
