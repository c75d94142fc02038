pub mod store;

use crate::errors::StoreError;
use crate::models::{NewProject, Organizer, Poll, ProjectVoteRecord, ViewerId};
use chrono::{DateTime, Utc};
use log::info;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{migrate::MigrateDatabase, Row, Sqlite};
use std::time::Duration;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> Result<Self, StoreError> {
        let in_memory = db_url.contains(":memory:");

        // Create database if it doesn't exist
        if !in_memory && !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            info!("Creating database at {}", db_url);
            Sqlite::create_database(db_url).await?;
        }

        // An in-memory database lives and dies with its only connection
        let options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = options.connect(db_url).await?;

        Self::init_schema(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn init_schema(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS organizers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                discord_user_id TEXT NOT NULL UNIQUE,
                username TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS polls (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                created_by INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (created_by) REFERENCES organizers(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                poll_id INTEGER NOT NULL,
                team_name TEXT NOT NULL,
                project_name TEXT NOT NULL,
                description TEXT,
                votes INTEGER NOT NULL CHECK (votes >= 0),
                position INTEGER NOT NULL,
                FOREIGN KEY (poll_id) REFERENCES polls(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn register_organizer(&self, discord_user_id: &str, username: &str) -> Result<Organizer, StoreError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(StoreError::Invalid("username must not be empty".to_string()));
        }

        if self.find_organizer_by_discord_id(discord_user_id).await?.is_some() {
            return Err(StoreError::Conflict("this account is already registered".to_string()));
        }

        let username_taken = sqlx::query("SELECT 1 FROM organizers WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .is_some();
        if username_taken {
            return Err(StoreError::Conflict(format!("username `{}` is taken", username)));
        }

        let created_at = Utc::now();
        let id = sqlx::query(
            r#"
            INSERT INTO organizers (discord_user_id, username, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(discord_user_id)
        .bind(username)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        info!("Registered organizer {} ({})", username, id);
        Ok(Organizer {
            id,
            discord_user_id: discord_user_id.to_string(),
            username: username.to_string(),
            created_at,
        })
    }

    pub async fn find_organizer_by_discord_id(&self, discord_user_id: &str) -> Result<Option<Organizer>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, discord_user_id, username, created_at
            FROM organizers
            WHERE discord_user_id = ?
            "#,
        )
        .bind(discord_user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<Organizer, StoreError> {
            Ok(Organizer {
                id: row.get("id"),
                discord_user_id: row.get("discord_user_id"),
                username: row.get("username"),
                created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
            })
        })
        .transpose()
    }

    // Create a poll and its projects in one transaction
    pub async fn create_poll(&self, title: &str, owner_id: ViewerId, projects: &[NewProject]) -> Result<i64, StoreError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(StoreError::Invalid("poll title must not be empty".to_string()));
        }
        if projects.is_empty() {
            return Err(StoreError::Invalid("a poll needs at least one project".to_string()));
        }
        for project in projects {
            if project.team_name.trim().is_empty() || project.project_name.trim().is_empty() {
                return Err(StoreError::Invalid("team and project names must not be empty".to_string()));
            }
            if project.votes < 0 {
                return Err(StoreError::Invalid(format!(
                    "{} has a negative vote count",
                    project.project_name
                )));
            }
        }

        let mut tx = self.pool.begin().await?;

        let poll_id = sqlx::query(
            r#"
            INSERT INTO polls (title, created_by, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(title)
        .bind(owner_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for (position, project) in projects.iter().enumerate() {
            let description = project
                .description
                .as_deref()
                .map(str::trim)
                .filter(|description| !description.is_empty());

            sqlx::query(
                r#"
                INSERT INTO projects (poll_id, team_name, project_name, description, votes, position)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(poll_id)
            .bind(project.team_name.trim())
            .bind(project.project_name.trim())
            .bind(description)
            .bind(project.votes)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Created poll {} with {} projects for organizer {}", poll_id, projects.len(), owner_id);
        Ok(poll_id)
    }

    pub async fn poll_exists(&self, poll_id: i64) -> Result<bool, StoreError> {
        Ok(sqlx::query("SELECT 1 FROM polls WHERE id = ?")
            .bind(poll_id)
            .fetch_optional(&self.pool)
            .await?
            .is_some())
    }

    // Highest votes first; equal votes keep the order they were entered in
    pub async fn get_poll_projects(&self, poll_id: i64) -> Result<Vec<ProjectVoteRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, team_name, project_name, description, votes
            FROM projects
            WHERE poll_id = ?
            ORDER BY votes DESC, position ASC
            "#,
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(project_from_row).collect())
    }

    pub async fn get_polls_by_owner(&self, owner_id: ViewerId) -> Result<Vec<Poll>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, created_by, created_at
            FROM polls
            WHERE created_by = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<Poll, StoreError> {
                Ok(Poll {
                    id: row.get("id"),
                    title: row.get("title"),
                    created_by: row.get("created_by"),
                    created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
                })
            })
            .collect()
    }
}

fn project_from_row(row: &SqliteRow) -> ProjectVoteRecord {
    ProjectVoteRecord {
        id: row.get("id"),
        team_name: row.get("team_name"),
        project_name: row.get("project_name"),
        description: row.get("description"),
        votes: row.get("votes"),
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}
