//! SQLite entitlement store implementation.
//!
//! Implements `EntitlementStore` from `gridmind-core`. The quota increment
//! and the monthly reset are each a single conditional UPDATE, so they stay
//! correct under concurrent requests for the same user.

use gridmind_core::entitlement::store::EntitlementStore;
use gridmind_types::agent::AgentKind;
use gridmind_types::entitlement::Entitlement;
use gridmind_types::error::StoreError;
use gridmind_types::plan::PlanTier;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `EntitlementStore`.
pub struct SqliteEntitlementStore {
    pool: DatabasePool,
}

impl SqliteEntitlementStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for mapping SQLite rows to domain Entitlement.
struct EntitlementRow {
    user_id: String,
    plan: String,
    hired_agents: String,
    monthly_query_count: i64,
    last_reset_at: String,
    last_query_at: Option<String>,
}

impl EntitlementRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            plan: row.try_get("plan")?,
            hired_agents: row.try_get("hired_agents")?,
            monthly_query_count: row.try_get("monthly_query_count")?,
            last_reset_at: row.try_get("last_reset_at")?,
            last_query_at: row.try_get("last_query_at")?,
        })
    }

    fn into_entitlement(self) -> Result<Entitlement, StoreError> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| StoreError::Query(format!("invalid user_id: {e}")))?;
        let plan: PlanTier = self
            .plan
            .parse()
            .map_err(|e: String| StoreError::Query(e))?;
        let hired_agents: Vec<AgentKind> = serde_json::from_str(&self.hired_agents)
            .map_err(|e| StoreError::Query(format!("invalid hired_agents: {e}")))?;
        let last_reset_at = parse_datetime(&self.last_reset_at)?;
        let last_query_at = self
            .last_query_at
            .as_deref()
            .map(parse_datetime)
            .transpose()?;

        Ok(Entitlement {
            user_id,
            plan,
            hired_agents,
            monthly_query_count: self.monthly_query_count as u32,
            last_reset_at,
            last_query_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// EntitlementStore implementation
// ---------------------------------------------------------------------------

impl EntitlementStore for SqliteEntitlementStore {
    async fn get(&self, user_id: &Uuid) -> Result<Option<Entitlement>, StoreError> {
        let row = sqlx::query("SELECT * FROM entitlements WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let entitlement_row = EntitlementRow::from_row(&row)
                    .map_err(|e| StoreError::Query(e.to_string()))?;
                Ok(Some(entitlement_row.into_entitlement()?))
            }
            None => Ok(None),
        }
    }

    async fn upsert(&self, entitlement: &Entitlement) -> Result<(), StoreError> {
        let hired = serde_json::to_string(&entitlement.hired_agents)
            .map_err(|e| StoreError::Query(format!("failed to serialize hired_agents: {e}")))?;

        sqlx::query(
            r#"INSERT INTO entitlements (user_id, plan, hired_agents, monthly_query_count, last_reset_at, last_query_at)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT (user_id) DO UPDATE SET
                   plan = excluded.plan,
                   hired_agents = excluded.hired_agents,
                   monthly_query_count = excluded.monthly_query_count,
                   last_reset_at = excluded.last_reset_at,
                   last_query_at = excluded.last_query_at"#,
        )
        .bind(entitlement.user_id.to_string())
        .bind(entitlement.plan.to_string())
        .bind(&hired)
        .bind(entitlement.monthly_query_count as i64)
        .bind(format_datetime(&entitlement.last_reset_at))
        .bind(entitlement.last_query_at.as_ref().map(format_datetime))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    async fn reset_if_stale(
        &self,
        user_id: &Uuid,
        period_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        // RFC 3339 text compares chronologically, so the staleness check
        // stays inside the single UPDATE.
        let result = sqlx::query(
            r#"UPDATE entitlements
               SET monthly_query_count = 0, last_reset_at = ?
               WHERE user_id = ? AND last_reset_at < ?"#,
        )
        .bind(format_datetime(&now))
        .bind(user_id.to_string())
        .bind(format_datetime(&period_start))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn try_admit(
        &self,
        user_id: &Uuid,
        ceiling: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<u32>, StoreError> {
        // Check and increment in one statement; RETURNING gives the count
        // after this admission.
        let row = sqlx::query(
            r#"UPDATE entitlements
               SET monthly_query_count = monthly_query_count + 1, last_query_at = ?
               WHERE user_id = ? AND monthly_query_count < ?
               RETURNING monthly_query_count"#,
        )
        .bind(format_datetime(&now))
        .bind(user_id.to_string())
        .bind(ceiling as i64)
        .fetch_optional(&self.pool.writer)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let count: i64 = row
                    .try_get("monthly_query_count")
                    .map_err(|e| StoreError::Query(e.to_string()))?;
                Ok(Some(count as u32))
            }
            None => Ok(None),
        }
    }
}
