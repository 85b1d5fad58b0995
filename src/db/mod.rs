use async_trait::async_trait;
use log::info;
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions},
    Sqlite, Row,
};
use std::collections::HashMap;

use crate::catalog::{BUSINESS_NAME_POLL, PollCatalog, TAGLINES_POLL};
use crate::ledger::{Ledger, LedgerError, Tally, align_counts};
use crate::models::{PairCount, Submission, TaglineChoice};

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> Result<Self, LedgerError> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            info!("Creating database at {}", db_url);
            Sqlite::create_database(db_url).await?;
        }

        let mut options = SqlitePoolOptions::new().max_connections(5);
        if db_url.contains(":memory:") || db_url.contains("mode=memory") {
            // Each connection to an in-memory database sees its own copy, and
            // the data goes away when the connection is closed
            options = options.max_connections(1).idle_timeout(None).max_lifetime(None);
        }

        let pool = options.connect(db_url).await?;

        Self::init_schema(&pool).await?;

        Ok(Self { pool })
    }

    async fn init_schema(pool: &SqlitePool) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS submissions (
                device_id TEXT PRIMARY KEY,
                business_name_index INTEGER NOT NULL,
                tagline_index INTEGER NOT NULL,
                custom_tagline TEXT,
                created_at TEXT NOT NULL,
                CHECK ((tagline_index = -1) = (custom_tagline IS NOT NULL))
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS option_tallies (
                poll_id TEXT NOT NULL,
                option_index INTEGER NOT NULL,
                count INTEGER NOT NULL DEFAULT 0 CHECK (count >= 0),
                PRIMARY KEY (poll_id, option_index)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pair_tallies (
                label TEXT PRIMARY KEY,
                count INTEGER NOT NULL DEFAULT 0 CHECK (count >= 0)
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    #[cfg(test)]
    async fn get_submission(&self, device_id: &str) -> Result<Option<Submission>, LedgerError> {
        let row = sqlx::query(
            r#"
            SELECT device_id, business_name_index, tagline_index, custom_tagline, created_at
            FROM submissions
            WHERE device_id = ?
            "#,
        )
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let business_name_index = row.get::<i64, _>("business_name_index");
        let tagline_index = row.get::<i64, _>("tagline_index");
        let custom_tagline: Option<String> = row.get("custom_tagline");
        let created_at_str = row.get::<String, _>("created_at");

        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| LedgerError::Corrupt(format!("Failed to parse created_at: {}", e)))?
            .with_timezone(&chrono::Utc);

        let tagline = match (tagline_index, custom_tagline) {
            (-1, Some(text)) => TaglineChoice::Custom(text),
            (index, None) if index >= 0 => TaglineChoice::Predefined(index as usize),
            (index, _) => {
                return Err(LedgerError::Corrupt(format!(
                    "Bad tagline index {} for {}",
                    index, device_id
                )));
            }
        };

        Ok(Some(Submission {
            device_id: row.get::<String, _>("device_id"),
            business_name_index: usize::try_from(business_name_index).map_err(|_| {
                LedgerError::Corrupt(format!("Bad business name index {}", business_name_index))
            })?,
            tagline,
            created_at,
        }))
    }

    async fn option_counts(
        conn: &mut SqliteConnection,
        poll_id: &str,
    ) -> Result<HashMap<usize, u64>, LedgerError> {
        let rows = sqlx::query(
            r#"
            SELECT option_index, count
            FROM option_tallies
            WHERE poll_id = ?
            "#,
        )
        .bind(poll_id)
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter()
            .map(|row| {
                let index = row.get::<i64, _>("option_index");
                let count = row.get::<i64, _>("count");
                match (usize::try_from(index), u64::try_from(count)) {
                    (Ok(index), Ok(count)) => Ok((index, count)),
                    _ => Err(LedgerError::Corrupt(format!(
                        "Bad tally row for {}: index {}, count {}",
                        poll_id, index, count
                    ))),
                }
            })
            .collect()
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
}

#[async_trait]
impl Ledger for Database {
    async fn has_submitted(&self, device_id: &str) -> Result<bool, LedgerError> {
        let exists = sqlx::query("SELECT 1 FROM submissions WHERE device_id = ?")
            .bind(device_id)
            .fetch_optional(&self.pool)
            .await?
            .is_some();
        Ok(exists)
    }

    async fn record(&self, submission: &Submission, pair_label: &str) -> Result<(), LedgerError> {
        // Dropping the transaction on any early return rolls everything back
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO submissions
                (device_id, business_name_index, tagline_index, custom_tagline, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&submission.device_id)
        .bind(submission.business_name_index as i64)
        .bind(submission.tagline.index())
        .bind(submission.tagline.custom_text())
        .bind(submission.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                LedgerError::DuplicateDevice
            } else {
                LedgerError::Database(e)
            }
        })?;

        let mut bumps = vec![(BUSINESS_NAME_POLL, submission.business_name_index)];
        if let TaglineChoice::Predefined(index) = submission.tagline {
            bumps.push((TAGLINES_POLL, index));
        }

        for (poll_id, option_index) in bumps {
            sqlx::query(
                r#"
                INSERT INTO option_tallies (poll_id, option_index, count)
                VALUES (?, ?, 1)
                ON CONFLICT(poll_id, option_index)
                DO UPDATE SET count = count + 1
                "#,
            )
            .bind(poll_id)
            .bind(option_index as i64)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO pair_tallies (label, count)
            VALUES (?, 1)
            ON CONFLICT(label)
            DO UPDATE SET count = count + 1
            "#,
        )
        .bind(pair_label)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn tallies(&self, catalog: &PollCatalog) -> Result<Tally, LedgerError> {
        // One read transaction, so counts and total come from the same snapshot
        let mut tx = self.pool.begin().await?;

        let business_counts = Self::option_counts(&mut *tx, BUSINESS_NAME_POLL).await?;
        let tagline_counts = Self::option_counts(&mut *tx, TAGLINES_POLL).await?;

        let pairs = sqlx::query("SELECT label, count FROM pair_tallies")
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .map(|row| PairCount {
                label: row.get::<String, _>("label"),
                count: row.get::<i64, _>("count").max(0) as u64,
            })
            .collect();

        let total_submissions = sqlx::query("SELECT COUNT(*) AS total FROM submissions")
            .fetch_one(&mut *tx)
            .await?
            .get::<i64, _>("total")
            .max(0) as u64;

        tx.commit().await?;

        Ok(Tally {
            business_name: align_counts(&catalog.business_name, &business_counts),
            taglines: align_counts(&catalog.taglines, &tagline_counts),
            pairs,
            total_submissions,
        })
    }
}
