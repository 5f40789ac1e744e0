use crate::{
    error::{AppError, Result},
    storage::models::{
        Clearance, Fingerprint, NewClearance, NewFingerprint, NewOffence, NewUser, Offence, User,
    },
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                image TEXT,
                role TEXT NOT NULL DEFAULT 'user',
                timestamp TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS fingerprints (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL UNIQUE,
                full_name TEXT NOT NULL,
                id_number TEXT NOT NULL,
                image_url TEXT NOT NULL,
                image_size INTEGER,
                image_name TEXT,
                timestamp TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS offences (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                offence_details TEXT NOT NULL,
                offence_date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS clearances (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                full_name TEXT NOT NULL,
                id_number TEXT NOT NULL,
                image_url TEXT NOT NULL,
                description TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_offences_user ON offences(user_id)",
            [],
        )?;

        Ok(())
    }

    pub fn create_user(&self, user: &NewUser) -> Result<User> {
        let now = Utc::now();

        self.conn
            .execute(
                "INSERT INTO users (name, email, image, role, timestamp)
                 VALUES (?1, ?2, ?3, 'user', ?4)",
                params![user.name, user.email, user.image, format_timestamp(&now)],
            )
            .map_err(|e| unique_violation(e, "A user with this email already exists"))?;

        let id = self.conn.last_insert_rowid();
        self.get_user(id)?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, name, email, image, role, timestamp FROM users WHERE id = ?1",
                [id],
                user_from_row,
            )
            .optional()?;

        Ok(user)
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, name, email, image, role, timestamp FROM users WHERE email = ?1",
                [email],
                user_from_row,
            )
            .optional()?;

        Ok(user)
    }

    /// All users, most recently registered first
    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, email, image, role, timestamp
             FROM users
             ORDER BY timestamp DESC, id DESC",
        )?;

        let users = stmt
            .query_map([], user_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(users)
    }

    pub fn set_user_role(&self, email: &str, role: crate::storage::Role) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE users SET role = ?1 WHERE email = ?2",
            params![role.to_string(), email],
        )?;

        if updated == 0 {
            return Err(AppError::NotFound(format!("No user with email {}", email)));
        }

        Ok(())
    }

    pub fn create_fingerprint(&self, fingerprint: &NewFingerprint) -> Result<Fingerprint> {
        let now = Utc::now();

        self.conn
            .execute(
                "INSERT INTO fingerprints
                 (user_id, full_name, id_number, image_url, image_size, image_name, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    fingerprint.user_id,
                    fingerprint.full_name,
                    fingerprint.id_number,
                    fingerprint.image_url,
                    fingerprint.image_size,
                    fingerprint.image_name,
                    format_timestamp(&now),
                ],
            )
            .map_err(|e| unique_violation(e, "A fingerprint is already registered for this user"))?;

        Ok(Fingerprint {
            id: self.conn.last_insert_rowid(),
            user_id: fingerprint.user_id,
            full_name: fingerprint.full_name.clone(),
            id_number: fingerprint.id_number.clone(),
            image_url: fingerprint.image_url.clone(),
            image_size: fingerprint.image_size,
            image_name: fingerprint.image_name.clone(),
            timestamp: now,
        })
    }

    pub fn get_fingerprint_by_user(&self, user_id: i64) -> Result<Option<Fingerprint>> {
        let fingerprint = self
            .conn
            .query_row(
                "SELECT id, user_id, full_name, id_number, image_url, image_size, image_name, timestamp
                 FROM fingerprints
                 WHERE user_id = ?1",
                [user_id],
                |row| {
                    Ok(Fingerprint {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        full_name: row.get(2)?,
                        id_number: row.get(3)?,
                        image_url: row.get(4)?,
                        image_size: row.get(5)?,
                        image_name: row.get(6)?,
                        timestamp: timestamp_column(row, 7)?,
                    })
                },
            )
            .optional()?;

        Ok(fingerprint)
    }

    pub fn create_offence(&self, offence: &NewOffence) -> Result<Offence> {
        let now = Utc::now();
        let offence_date = offence.offence_date.unwrap_or(now);

        self.conn.execute(
            "INSERT INTO offences (user_id, offence_details, offence_date, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                offence.user_id,
                offence.offence_details,
                format_timestamp(&offence_date),
                format_timestamp(&now),
            ],
        )?;

        Ok(Offence {
            id: self.conn.last_insert_rowid(),
            user_id: offence.user_id,
            offence_details: offence.offence_details.clone(),
            offence_date,
            created_at: now,
        })
    }

    pub fn get_offences_by_user(&self, user_id: i64) -> Result<Vec<Offence>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, offence_details, offence_date, created_at
             FROM offences
             WHERE user_id = ?1
             ORDER BY id",
        )?;

        let offences = stmt
            .query_map([user_id], |row| {
                Ok(Offence {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    offence_details: row.get(2)?,
                    offence_date: timestamp_column(row, 3)?,
                    created_at: timestamp_column(row, 4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(offences)
    }

    pub fn create_clearance(&self, clearance: &NewClearance) -> Result<Clearance> {
        let now = Utc::now();

        self.conn.execute(
            "INSERT INTO clearances
             (user_id, full_name, id_number, image_url, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                clearance.user_id,
                clearance.full_name,
                clearance.id_number,
                clearance.image_url,
                clearance.description,
                format_timestamp(&now),
            ],
        )?;

        Ok(Clearance {
            id: self.conn.last_insert_rowid(),
            user_id: clearance.user_id,
            full_name: clearance.full_name.clone(),
            id_number: clearance.id_number.clone(),
            image_url: clearance.image_url.clone(),
            description: clearance.description.clone(),
            created_at: now,
        })
    }

    pub fn get_clearances_by_user(&self, user_id: i64) -> Result<Vec<Clearance>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, full_name, id_number, image_url, description, created_at
             FROM clearances
             WHERE user_id = ?1
             ORDER BY id",
        )?;

        let clearances = stmt
            .query_map([user_id], |row| {
                Ok(Clearance {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    full_name: row.get(2)?,
                    id_number: row.get(3)?,
                    image_url: row.get(4)?,
                    description: row.get(5)?,
                    created_at: timestamp_column(row, 6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(clearances)
    }

    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 = self.conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", table),
                [],
                |row| row.get(0),
            )?;
            Ok(n as usize)
        };

        let users_with_offences: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT user_id) FROM offences",
            [],
            |row| row.get(0),
        )?;

        Ok(DatabaseStats {
            total_users: count("users")?,
            total_fingerprints: count("fingerprints")?,
            total_offences: count("offences")?,
            total_clearances: count("clearances")?,
            users_with_offences: users_with_offences as usize,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    pub total_users: usize,
    pub total_fingerprints: usize,
    pub total_offences: usize,
    pub total_clearances: usize,
    pub users_with_offences: usize,
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(4)?;

    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        image: row.get(3)?,
        role: role.parse().unwrap_or_default(),
        timestamp: timestamp_column(row, 5)?,
    })
}

/// Map a UNIQUE constraint failure to a conflict, pass anything else through
fn unique_violation(err: rusqlite::Error, message: &str) -> AppError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}
