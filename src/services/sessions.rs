//! Redis-backed session store.
//!
//! Session state carries exactly one thing: the per-session visit
//! counter shown on the home page.

use redis::{AsyncCommands, Client};

use crate::error::{AppError, AppResult};

/// Sessions expire after two weeks of inactivity
const SESSION_TTL_SECONDS: u64 = 14 * 24 * 3600;

#[derive(Clone)]
pub struct SessionsService {
    client: Client,
}

impl SessionsService {
    /// Create a new sessions service
    pub async fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        // Test connection
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { client })
    }

    /// Record a visit for the session and return the count to display.
    ///
    /// The first visit reads nothing and reports 1; each request stores
    /// `reported + 1` for the next one (fixed increment of 1).
    pub async fn record_visit(&self, session_id: &str) -> AppResult<i64> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))?;

        let key = format!("session:visits:{}", session_id);

        let stored: Option<i64> = conn
            .get(&key)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read visit count: {}", e)))?;

        let num_visits = stored.unwrap_or(1);

        conn.set_ex::<_, _, ()>(&key, num_visits + 1, SESSION_TTL_SECONDS)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store visit count: {}", e)))?;

        Ok(num_visits)
    }
}
