//! User persistence bound to one database session.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::domain::User;

const USER_COLUMNS: &str =
    "id, email, hashed_password, is_active, is_superuser, is_verified, created_at";

/// Column changes applied by `UserRepository::update`. `None` leaves the column as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub email: Option<String>,
    pub hashed_password: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_verified: Option<bool>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Fields for a new user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
}

/// User table access over a single connection.
///
/// The connection sits behind a mutex so the repository can be shared across
/// `.await` points; the lock is only held for the duration of one statement.
pub struct UserRepository {
    conn: Mutex<Connection>,
}

impl UserRepository {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-statement leaves nothing half-written that we care about.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, id: Uuid) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id.to_string()],
            user_from_row,
        )
        .optional()
    }

    /// Case-insensitive lookup by email.
    pub fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            params![email],
            user_from_row,
        )
        .optional()
    }

    pub fn create(&self, new_user: NewUser) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            hashed_password: new_user.hashed_password,
            is_active: new_user.is_active,
            is_superuser: new_user.is_superuser,
            is_verified: new_user.is_verified,
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = self.conn();
        conn.execute(
            &format!("INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                user.id.to_string(),
                user.email,
                user.hashed_password,
                user.is_active,
                user.is_superuser,
                user.is_verified,
                user.created_at,
            ],
        )?;
        Ok(user)
    }

    /// Apply `changes` to `user` and persist them. Returns the updated row.
    pub fn update(&self, user: &User, changes: UserChanges) -> Result<User> {
        let mut updated = user.clone();
        if let Some(email) = changes.email {
            updated.email = email;
        }
        if let Some(hash) = changes.hashed_password {
            updated.hashed_password = hash;
        }
        if let Some(active) = changes.is_active {
            updated.is_active = active;
        }
        if let Some(superuser) = changes.is_superuser {
            updated.is_superuser = superuser;
        }
        if let Some(verified) = changes.is_verified {
            updated.is_verified = verified;
        }

        let conn = self.conn();
        conn.execute(
            r#"UPDATE users
               SET email = ?1, hashed_password = ?2, is_active = ?3, is_superuser = ?4, is_verified = ?5
               WHERE id = ?6"#,
            params![
                updated.email,
                updated.hashed_password,
                updated.is_active,
                updated.is_superuser,
                updated.is_verified,
                updated.id.to_string(),
            ],
        )?;
        Ok(updated)
    }

    /// Delete a user, returns whether a row was removed
    pub fn delete(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn();
        let count = conn.execute("DELETE FROM users WHERE id = ?1", params![id.to_string()])?;
        Ok(count > 0)
    }
}

fn user_from_row(row: &Row<'_>) -> Result<User> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(User {
        id,
        email: row.get(1)?,
        hashed_password: row.get(2)?,
        is_active: row.get(3)?,
        is_superuser: row.get(4)?,
        is_verified: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Whether an error is a UNIQUE constraint violation (duplicate email)
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}
