pub mod schema;
pub mod users;

use rusqlite::{Connection, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub use schema::run_migrations;
pub use users::{NewUser, UserChanges, UserRepository};

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
    /// Log the error at warn level and return None
    fn log_warn(self, context: &str) -> Option<T>;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
    fn log_warn(self, context: &str) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                None
            }
        }
    }
}

/// Handle to the file-backed users database.
///
/// Cheap to clone. Each call to [`Database::session`] opens a fresh
/// connection, so every request works on its own scoped session.
#[derive(Clone, Debug)]
pub struct Database {
    path: Arc<PathBuf>,
}

impl Database {
    /// Create the database file if needed and bring the schema up to date.
    pub fn init(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).log_warn("Failed to create database directory");
            }
        }

        let conn = open_connection(path)?;
        run_migrations(&conn)?;
        tracing::info!("Users database ready at {}", path.display());

        Ok(Self {
            path: Arc::new(path.to_path_buf()),
        })
    }

    /// Open a new connection to the database.
    pub fn session(&self) -> Result<Connection> {
        open_connection(&self.path)
    }

    /// Open a session and bind a user repository to it.
    pub fn users(&self) -> Result<UserRepository> {
        Ok(UserRepository::new(self.session()?))
    }
}

fn open_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_parent_and_schema() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("users.db");
        let db = Database::init(&path).unwrap();
        assert!(path.exists());

        let conn = db.session().unwrap();
        assert_eq!(
            schema::get_schema_version(&conn).unwrap(),
            schema::SCHEMA_VERSION
        );
    }

    #[test]
    fn test_sessions_share_the_file() {
        let temp = TempDir::new().unwrap();
        let db = Database::init(&temp.path().join("users.db")).unwrap();

        let created = db
            .users()
            .unwrap()
            .create(NewUser {
                email: "shared@example.com".into(),
                hashed_password: "h".into(),
                is_active: true,
                is_superuser: false,
                is_verified: false,
            })
            .unwrap();

        let other = db.users().unwrap();
        assert_eq!(other.get(created.id).unwrap().unwrap().email, "shared@example.com");
    }

    #[test]
    fn test_log_warn() {
        let ok: std::result::Result<i32, String> = Ok(3);
        assert_eq!(ok.log_warn("ctx"), Some(3));
        let err: std::result::Result<i32, String> = Err("boom".into());
        assert_eq!(err.log_warn("ctx"), None);
    }
}
