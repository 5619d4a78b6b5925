//! Visit history
//!
//! A capped, most-recent-first list of visited pages. Each URL appears at most
//! once: visiting it again moves it back to the front with a fresh timestamp.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;
use ferry_storage::Database;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub url: String,
    pub title: String,
    pub visited_at: DateTime<Utc>,
}

pub struct HistoryManager {
    db: Database,
    limit: usize,
}

impl HistoryManager {
    pub fn new(db: Database) -> Self {
        Self::with_limit(db, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(db: Database, limit: usize) -> Self {
        Self {
            db,
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Record a visit, moving the URL to the front and trimming past the cap
    pub fn record_visit(&self, url: &str, title: &str) -> Result<HistoryEntry> {
        let entry = HistoryEntry {
            url: url.to_string(),
            title: if title.trim().is_empty() {
                url.to_string()
            } else {
                title.to_string()
            },
            visited_at: Utc::now(),
        };

        // Fixed-width timestamps so text ordering matches time ordering
        let visited_at = entry.visited_at.to_rfc3339_opts(SecondsFormat::Nanos, true);

        self.db.transaction(|conn| {
            conn.execute("DELETE FROM visits WHERE url = ?1", [&entry.url])?;
            conn.execute(
                "INSERT INTO visits (url, title, visited_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![entry.url, entry.title, visited_at],
            )?;
            conn.execute(
                "DELETE FROM visits WHERE rowid NOT IN (
                     SELECT rowid FROM visits ORDER BY visited_at DESC, rowid DESC LIMIT ?1
                 )",
                [self.limit as i64],
            )?;
            Ok(())
        })?;

        tracing::debug!(url = %entry.url, "Recorded visit");

        Ok(entry)
    }

    /// Most recent entries first
    pub fn recent(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT url, title, visited_at FROM visits
                 ORDER BY visited_at DESC, rowid DESC
                 LIMIT ?1",
            )?;

            let entries: Vec<HistoryEntry> = stmt
                .query_map([self.limit as i64], |row| {
                    let visited_str: String = row.get(2)?;
                    let visited_at = DateTime::parse_from_rfc3339(&visited_str)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now());

                    Ok(HistoryEntry {
                        url: row.get(0)?,
                        title: row.get(1)?,
                        visited_at,
                    })
                })?
                .filter_map(|r| r.ok())
                .collect();

            Ok(entries)
        })?)
    }

    /// Remove a single URL from history
    pub fn remove(&self, url: &str) -> Result<()> {
        Ok(self.db.with_connection(|conn| {
            conn.execute("DELETE FROM visits WHERE url = ?1", [url])?;
            Ok(())
        })?)
    }

    /// Clear all history
    pub fn clear(&self) -> Result<()> {
        Ok(self.db.with_connection(|conn| {
            conn.execute("DELETE FROM visits", [])?;
            Ok(())
        })?)
    }
}

impl Clone for HistoryManager {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_manager() {
        let db = Database::open_in_memory().unwrap();
        let manager = HistoryManager::new(db);

        manager
            .record_visit("https://example.com", "Example")
            .unwrap();
        manager
            .record_visit("https://rust-lang.org", "Rust")
            .unwrap();
        manager
            .record_visit("https://example.com", "Example Domain")
            .unwrap(); // Second visit moves it to the front

        let recent = manager.recent().unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].url, "https://example.com");
        assert_eq!(recent[0].title, "Example Domain");
        assert_eq!(recent[1].url, "https://rust-lang.org");
    }

    #[test]
    fn test_empty_title_falls_back_to_url() {
        let manager = HistoryManager::new(Database::open_in_memory().unwrap());
        let entry = manager.record_visit("https://example.com", "  ").unwrap();
        assert_eq!(entry.title, "https://example.com");
    }

    #[test]
    fn test_history_is_capped() {
        let manager = HistoryManager::with_limit(Database::open_in_memory().unwrap(), 3);

        for i in 0..5 {
            manager
                .record_visit(&format!("https://site{}.example", i), "")
                .unwrap();
        }

        let urls: Vec<String> = manager.recent().unwrap().into_iter().map(|e| e.url).collect();
        assert_eq!(
            urls,
            vec![
                "https://site4.example",
                "https://site3.example",
                "https://site2.example"
            ]
        );
    }

    #[test]
    fn test_remove_and_clear() {
        let manager = HistoryManager::new(Database::open_in_memory().unwrap());
        manager.record_visit("https://a.example", "A").unwrap();
        manager.record_visit("https://b.example", "B").unwrap();

        manager.remove("https://a.example").unwrap();
        let recent = manager.recent().unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].url, "https://b.example");

        manager.clear().unwrap();
        assert!(manager.recent().unwrap().is_empty());
    }
}
