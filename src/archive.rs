//! Durable store of finished session summaries, one list per user.
//! The whole document is serialized and rewritten on every upsert; the write
//! goes to a temp file first and is renamed over the real path, so the
//! document on disk is never partially written.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::warn;

use crate::error::Result;
use crate::types::Summary;

type Document = HashMap<String, Vec<Summary>>;

pub struct FinishedArchive {
    path: PathBuf,
    /// user_id → finished summaries, in finish order.
    /// The lock is held across the durable write — finish operations
    /// serialize, which the small local write keeps cheap.
    entries: Mutex<Document>,
}

impl FinishedArchive {
    /// Load the archive document from `path`. A missing or corrupt document
    /// starts an empty archive rather than failing startup.
    pub fn load(path: impl Into<PathBuf>) -> Arc<Self> {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Document>(&bytes) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!("Corrupt archive document at {}: {e}; starting empty", path.display());
                    Document::new()
                }
            },
            Err(_) => Document::new(),
        };
        Arc::new(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Document> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the entry with the same session_id for this user, or append,
    /// then persist the full document synchronously.
    pub fn upsert(&self, user_id: &str, summary: Summary) -> Result<()> {
        let mut entries = self.lock();
        let items = entries.entry(user_id.to_string()).or_default();
        match items.iter_mut().find(|s| s.session_id == summary.session_id) {
            Some(existing) => *existing = summary,
            None => items.push(summary),
        }
        self.save(&entries)
    }

    fn save(&self, entries: &Document) -> Result<()> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn find(&self, user_id: &str, session_id: &str) -> Option<Summary> {
        self.lock()
            .get(user_id)?
            .iter()
            .find(|s| s.session_id == session_id)
            .cloned()
    }

    /// The summary with the greatest end_time for this user. Canonical
    /// timestamps are UTC second-precision strings, so string order is
    /// chronological order.
    pub fn latest(&self, user_id: &str) -> Option<Summary> {
        self.lock()
            .get(user_id)?
            .iter()
            .max_by(|a, b| a.end_time.cmp(&b.end_time))
            .cloned()
    }

    pub fn user_count(&self) -> usize {
        self.lock().len()
    }

    #[cfg(test)]
    fn summaries_for(&self, user_id: &str) -> Vec<Summary> {
        self.lock().get(user_id).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Num;
    use tempfile::TempDir;

    fn summary(session_id: &str, end_time: &str, net: f64) -> Summary {
        Summary {
            session_id: session_id.to_string(),
            user_id: "alice".to_string(),
            start_time: "2026-02-12T14:00:00+00:00".to_string(),
            end_time: end_time.to_string(),
            rounds: 2,
            total_bets: Num::from(15.0),
            total_wins: Num::from(15.0 + net),
            net_change: Num::from(net),
        }
    }

    #[test]
    fn missing_document_loads_empty() {
        let temp = TempDir::new().unwrap();
        let archive = FinishedArchive::load(temp.path().join("summaries.json"));
        assert_eq!(archive.user_count(), 0);
        assert!(archive.latest("alice").is_none());
    }

    #[test]
    fn corrupt_document_loads_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("summaries.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let archive = FinishedArchive::load(&path);
        assert_eq!(archive.user_count(), 0);
    }

    #[test]
    fn upsert_replaces_by_session_id() {
        let temp = TempDir::new().unwrap();
        let archive = FinishedArchive::load(temp.path().join("summaries.json"));

        archive
            .upsert("alice", summary("s1", "2026-02-12T15:00:00+00:00", 0.0))
            .unwrap();
        archive
            .upsert("alice", summary("s1", "2026-02-12T15:00:00+00:00", 5.0))
            .unwrap();

        let items = archive.summaries_for("alice");
        assert_eq!(items.len(), 1, "replace must not duplicate the entry");
        assert_eq!(items[0].net_change, Num::Whole(5));
    }

    #[test]
    fn latest_picks_greatest_end_time() {
        let temp = TempDir::new().unwrap();
        let archive = FinishedArchive::load(temp.path().join("summaries.json"));

        archive
            .upsert("alice", summary("s1", "2026-02-12T15:00:00+00:00", 0.0))
            .unwrap();
        archive
            .upsert("alice", summary("s2", "2026-02-12T18:00:00+00:00", 1.0))
            .unwrap();
        archive
            .upsert("alice", summary("s3", "2026-02-12T16:00:00+00:00", 2.0))
            .unwrap();

        assert_eq!(archive.latest("alice").unwrap().session_id, "s2");
    }

    #[test]
    fn latest_for_unknown_user_is_none() {
        let temp = TempDir::new().unwrap();
        let archive = FinishedArchive::load(temp.path().join("summaries.json"));
        assert!(archive.latest("nobody").is_none());
    }

    #[test]
    fn document_round_trips_field_for_field() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("summaries.json");

        let archive = FinishedArchive::load(&path);
        let mut s = summary("s1", "2026-02-12T15:00:00+00:00", 0.0);
        s.total_wins = Num::from(12.5);
        s.net_change = Num::from(-2.5);
        archive.upsert("alice", s.clone()).unwrap();

        // Reload from disk and compare, including whole/decimal normalization.
        let reloaded = FinishedArchive::load(&path);
        assert_eq!(reloaded.find("alice", "s1").unwrap(), s);
    }

    #[test]
    fn persisted_numbers_are_terse() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("summaries.json");

        let archive = FinishedArchive::load(&path);
        archive
            .upsert("alice", summary("s1", "2026-02-12T15:00:00+00:00", 0.0))
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"total_bets\": 15"));
        assert!(!text.contains("15.0"), "whole figures must not render as decimals");
    }

    #[test]
    fn find_distinguishes_users() {
        let temp = TempDir::new().unwrap();
        let archive = FinishedArchive::load(temp.path().join("summaries.json"));

        archive
            .upsert("alice", summary("s1", "2026-02-12T15:00:00+00:00", 0.0))
            .unwrap();

        assert!(archive.find("alice", "s1").is_some());
        assert!(archive.find("bob", "s1").is_none());
        assert!(archive.find("alice", "s2").is_none());
    }
}
