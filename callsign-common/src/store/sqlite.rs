//! SQLite-backed member store
//!
//! One table, `members`, keyed by callsign. Opened read-write-create so the
//! first start on a fresh machine produces an empty directory.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use super::{MemberStore, StoreError};
use crate::member::Member;

/// Member store persisted in a SQLite database file
#[derive(Debug, Clone)]
pub struct SqliteMemberStore {
    pool: SqlitePool,
}

impl SqliteMemberStore {
    /// Open (creating if missing) the database at `db_path`
    ///
    /// `max_connections` should be at least the importer's writer count,
    /// otherwise writers queue on the pool instead of the store.
    pub async fn open(db_path: &Path, max_connections: u32) -> Result<Self, StoreError> {
        let newly_created = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // WAL lets lookups read while an upload is writing
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        if newly_created {
            info!("Initialized new member database: {}", db_path.display());
        } else {
            info!("Opened existing member database: {}", db_path.display());
        }

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating the members table if needed
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        create_members_table(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn create_members_table(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS members (
            callsign TEXT PRIMARY KEY NOT NULL,
            last_name TEXT NOT NULL DEFAULT '',
            name TEXT NOT NULL DEFAULT '',
            street TEXT NOT NULL DEFAULT '',
            city TEXT NOT NULL DEFAULT '',
            state TEXT NOT NULL DEFAULT '',
            zip TEXT NOT NULL DEFAULT '',
            league TEXT NOT NULL DEFAULT '',
            home_repeater TEXT NOT NULL DEFAULT '',
            date_joined TEXT NOT NULL DEFAULT '',
            member_type TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT '',
            quarter_expiring INTEGER NOT NULL DEFAULT 0,
            year_expiring INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

fn member_from_row(row: &SqliteRow) -> Result<Member, sqlx::Error> {
    Ok(Member {
        callsign: row.try_get("callsign")?,
        last_name: row.try_get("last_name")?,
        name: row.try_get("name")?,
        street: row.try_get("street")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        zip: row.try_get("zip")?,
        league: row.try_get("league")?,
        home_repeater: row.try_get("home_repeater")?,
        date_joined: row.try_get("date_joined")?,
        member_type: row.try_get("member_type")?,
        status: row.try_get("status")?,
        quarter_expiring: row.try_get("quarter_expiring")?,
        year_expiring: row.try_get("year_expiring")?,
    })
}

#[async_trait]
impl MemberStore for SqliteMemberStore {
    async fn get(&self, callsign: &str) -> Result<Option<Member>, StoreError> {
        let row = sqlx::query("SELECT * FROM members WHERE callsign = ?")
            .bind(callsign)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(member_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, member: &Member) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO members (
                callsign, last_name, name, street, city, state, zip, league,
                home_repeater, date_joined, member_type, status,
                quarter_expiring, year_expiring
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(callsign) DO UPDATE SET
                last_name = excluded.last_name,
                name = excluded.name,
                street = excluded.street,
                city = excluded.city,
                state = excluded.state,
                zip = excluded.zip,
                league = excluded.league,
                home_repeater = excluded.home_repeater,
                date_joined = excluded.date_joined,
                member_type = excluded.member_type,
                status = excluded.status,
                quarter_expiring = excluded.quarter_expiring,
                year_expiring = excluded.year_expiring
            "#,
        )
        .bind(&member.callsign)
        .bind(&member.last_name)
        .bind(&member.name)
        .bind(&member.street)
        .bind(&member.city)
        .bind(&member.state)
        .bind(&member.zip)
        .bind(&member.league)
        .bind(&member.home_repeater)
        .bind(&member.date_joined)
        .bind(&member.member_type)
        .bind(&member.status)
        .bind(member.quarter_expiring)
        .bind(member.year_expiring)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn scan_keys(&self) -> Result<Vec<String>, StoreError> {
        let keys = sqlx::query_scalar::<_, String>("SELECT callsign FROM members")
            .fetch_all(&self.pool)
            .await?;
        Ok(keys)
    }

    async fn delete_multi(&self, callsigns: &[String]) -> Result<(), StoreError> {
        if callsigns.is_empty() {
            return Ok(());
        }

        // All-or-nothing: a failure rolls back every delete in the batch
        let mut tx = self.pool.begin().await?;
        for callsign in callsigns {
            sqlx::query("DELETE FROM members WHERE callsign = ?")
                .bind(callsign)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}
