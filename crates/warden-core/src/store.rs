//! Append-only event log (joins, attendance) backed by SQLite.
//!
//! Rows are committed one at a time; a successful append has already hit the
//! disk when the call returns. The store stamps every row itself, so record
//! order per table follows insertion order.

use std::{path::Path, sync::Arc};

use sqlite::{Connection, State};
use tokio::sync::Mutex;

use crate::{domain::UserId, utils::iso_timestamp_utc, Result};

/// One row of the joins or attendance table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    pub user_id: i64,
    pub name: String,
    pub timestamp: String,
}

#[derive(Clone)]
pub struct Store {
    connection: Arc<Mutex<Connection>>,
}

impl Store {
    pub async fn new(db_path: &Path) -> Result<Self> {
        let connection = sqlite::open(db_path)?;
        let store = Self {
            connection: Arc::new(Mutex::new(connection)),
        };
        store.init_tables().await?;
        println!("[STORE] Database initialized at: {}", db_path.display());
        Ok(store)
    }

    async fn init_tables(&self) -> Result<()> {
        let conn = self.connection.lock().await;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS joins (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )",
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS attendance (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )",
        )?;

        Ok(())
    }

    pub async fn append_join(&self, user_id: UserId, name: &str) -> Result<()> {
        self.append("joins", user_id, name).await
    }

    pub async fn append_attendance(&self, user_id: UserId, name: &str) -> Result<()> {
        self.append("attendance", user_id, name).await
    }

    async fn append(&self, table: &str, user_id: UserId, name: &str) -> Result<()> {
        let conn = self.connection.lock().await;

        let sql = format!("INSERT INTO {table} (user_id, name, timestamp) VALUES (?, ?, ?)");
        let mut statement = conn.prepare(sql.as_str())?;
        statement.bind((1, user_id.0))?;
        statement.bind((2, name))?;
        statement.bind((3, iso_timestamp_utc().as_str()))?;
        statement.next()?;

        Ok(())
    }

    pub async fn count_joins(&self) -> Result<i64> {
        self.count("joins").await
    }

    pub async fn count_attendance(&self) -> Result<i64> {
        self.count("attendance").await
    }

    async fn count(&self, table: &str) -> Result<i64> {
        let conn = self.connection.lock().await;

        let sql = format!("SELECT COUNT(*) FROM {table}");
        let mut statement = conn.prepare(sql.as_str())?;
        statement.next()?;
        let n = statement.read::<i64, _>(0)?;

        Ok(n)
    }

    /// All attendance rows in insertion order.
    pub async fn all_attendance(&self) -> Result<Vec<LogRecord>> {
        let conn = self.connection.lock().await;

        let mut statement =
            conn.prepare("SELECT user_id, name, timestamp FROM attendance ORDER BY id")?;

        let mut records = Vec::new();
        // A read error mid-iteration propagates; no truncated Ok.
        while let State::Row = statement.next()? {
            records.push(LogRecord {
                user_id: statement.read::<i64, _>("user_id")?,
                name: statement.read::<String, _>("name")?,
                timestamp: statement.read::<String, _>("timestamp")?,
            });
        }

        Ok(records)
    }
}

/// Render attendance rows as CSV with a header line.
pub fn attendance_csv(records: &[LogRecord]) -> String {
    let mut out = String::from("user_id,name,timestamp\n");
    for r in records {
        out.push_str(&r.user_id.to_string());
        out.push(',');
        out.push_str(&csv_field(&r.name));
        out.push(',');
        out.push_str(&csv_field(&r.timestamp));
        out.push('\n');
    }
    out
}

fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{path::PathBuf, time::Duration};

    fn tmp_db(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_millis();
        let pid = std::process::id();
        PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}.db"))
    }

    #[tokio::test]
    async fn fresh_store_has_zero_counts() {
        let store = Store::new(&tmp_db("warden-store-empty")).await.unwrap();

        assert_eq!(store.count_joins().await.unwrap(), 0);
        assert_eq!(store.count_attendance().await.unwrap(), 0);
        assert!(store.all_attendance().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn appends_are_counted_per_table() {
        let store = Store::new(&tmp_db("warden-store-counts")).await.unwrap();

        store.append_join(UserId(1), "alice").await.unwrap();
        store.append_join(UserId(2), "bob").await.unwrap();
        store.append_attendance(UserId(1), "alice").await.unwrap();

        assert_eq!(store.count_joins().await.unwrap(), 2);
        assert_eq!(store.count_attendance().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn attendance_rows_come_back_in_insertion_order() {
        let store = Store::new(&tmp_db("warden-store-order")).await.unwrap();

        store.append_attendance(UserId(10), "carol").await.unwrap();
        store.append_attendance(UserId(11), "dave").await.unwrap();
        store.append_attendance(UserId(12), "erin").await.unwrap();

        let rows = store.all_attendance().await.unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["carol", "dave", "erin"]);
        assert_eq!(rows[0].user_id, 10);
    }

    #[tokio::test]
    async fn store_stamps_rows_itself() {
        let store = Store::new(&tmp_db("warden-store-stamp")).await.unwrap();

        store.append_attendance(UserId(5), "frank").await.unwrap();

        let rows = store.all_attendance().await.unwrap();
        assert_eq!(rows.len(), 1);
        // RFC3339: date, 'T', time.
        assert!(rows[0].timestamp.contains('T'));
        assert!(!rows[0].timestamp.is_empty());
    }

    #[test]
    fn csv_has_header_and_quotes_awkward_names() {
        let records = vec![
            LogRecord {
                user_id: 1,
                name: "plain".to_string(),
                timestamp: "2026-01-01T00:00:00+00:00".to_string(),
            },
            LogRecord {
                user_id: 2,
                name: "Doe, Jane \"JD\"".to_string(),
                timestamp: "2026-01-01T00:00:01+00:00".to_string(),
            },
        ];

        let csv = attendance_csv(&records);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "user_id,name,timestamp");
        assert_eq!(lines[1], "1,plain,2026-01-01T00:00:00+00:00");
        assert_eq!(lines[2], "2,\"Doe, Jane \"\"JD\"\"\",2026-01-01T00:00:01+00:00");
    }

    #[tokio::test]
    async fn rows_survive_a_reopen() {
        let path = tmp_db("warden-store-reopen");

        {
            let store = Store::new(&path).await.unwrap();
            store.append_join(UserId(3), "grace").await.unwrap();
        }

        let reopened = Store::new(&path).await.unwrap();
        assert_eq!(reopened.count_joins().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn appends_and_reads_fail_loudly_once_the_table_is_gone() {
        let path = tmp_db("warden-store-dropped");
        let store = Store::new(&path).await.unwrap();
        store.append_attendance(UserId(7), "carol").await.unwrap();

        // A second connection drops the table out from under the store.
        sqlite::open(&path)
            .unwrap()
            .execute("DROP TABLE attendance")
            .unwrap();

        assert!(store.append_attendance(UserId(8), "dave").await.is_err());
        assert!(store.all_attendance().await.is_err());
        // The joins table is unaffected.
        store.append_join(UserId(8), "dave").await.unwrap();
    }
}
