//! Persistent search history: an ordered, case-insensitively de-duplicated,
//! size-bounded list of past queries, stored as a JSON array of strings.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::constants::constants;

pub struct SearchHistory {
  entries: Vec<String>,
  path: PathBuf,
}

impl SearchHistory {
  /// Load history from `path`. A missing file is an empty history; an
  /// unreadable or unparsable file is logged and treated the same way.
  pub fn load(path: PathBuf) -> Self {
    let entries = match std::fs::read_to_string(&path) {
      Ok(content) => match serde_json::from_str::<Vec<String>>(&content) {
        Ok(entries) => entries,
        Err(e) => {
          warn!(path = %path.display(), err = %e, "history file is not valid JSON, starting empty");
          Vec::new()
        }
      },
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
      Err(e) => {
        warn!(path = %path.display(), err = %e, "failed to read history file, starting empty");
        Vec::new()
      }
    };
    debug!(count = entries.len(), "loaded search history");
    Self { entries, path }
  }

  /// Most-recently-used first.
  pub fn entries(&self) -> &[String] {
    &self.entries
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Record a query: remove any case-insensitive duplicate, insert at the
  /// front, evict past the size bound, then persist the whole list.
  ///
  /// A persist failure propagates; nothing else in the session can make the
  /// on-disk list consistent again once a write starts failing.
  pub fn record(&mut self, query: &str) -> Result<()> {
    let lower = query.to_lowercase();
    if let Some(pos) = self.entries.iter().position(|e| e.to_lowercase() == lower) {
      self.entries.remove(pos);
    }
    self.entries.insert(0, query.to_string());
    self.entries.truncate(constants().history_limit);
    self.persist()
  }

  /// Write the list atomically: serialize to a sibling temp file, then rename
  /// over the target so a crash mid-write cannot truncate the previous
  /// snapshot.
  fn persist(&self) -> Result<()> {
    if let Some(dir) = self.path.parent()
      && !dir.as_os_str().is_empty()
    {
      std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let json = serde_json::to_string(&self.entries).context("Failed to serialize search history")?;
    let tmp = self.path.with_extension("json.tmp");
    std::fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, &self.path)
      .with_context(|| format!("Failed to replace {}", self.path.display()))?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn history_in(dir: &tempfile::TempDir) -> SearchHistory {
    SearchHistory::load(dir.path().join("search_history.json"))
  }

  #[test]
  fn load_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    assert!(history_in(&dir).is_empty());
  }

  #[test]
  fn load_corrupt_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("search_history.json");
    std::fs::write(&path, "not json {").unwrap();
    assert!(SearchHistory::load(path).is_empty());
  }

  #[test]
  fn record_prepends_most_recent() {
    let dir = tempfile::tempdir().unwrap();
    let mut history = history_in(&dir);
    history.record("first").unwrap();
    history.record("second").unwrap();
    assert_eq!(history.entries(), ["second", "first"]);
  }

  #[test]
  fn record_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("search_history.json");
    let mut history = SearchHistory::load(path.clone());
    history.record("alpha").unwrap();
    history.record("beta").unwrap();

    let reloaded = SearchHistory::load(path);
    assert_eq!(reloaded.entries(), ["beta", "alpha"]);
  }

  #[test]
  fn record_dedupes_case_insensitively() {
    let dir = tempfile::tempdir().unwrap();
    let mut history = history_in(&dir);
    history.record("Daft Punk").unwrap();
    history.record("queen").unwrap();
    history.record("DAFT PUNK").unwrap();
    assert_eq!(history.entries(), ["DAFT PUNK", "queen"]);
  }

  #[test]
  fn record_same_query_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut history = history_in(&dir);
    history.record("same").unwrap();
    history.record("same").unwrap();
    assert_eq!(history.entries(), ["same"]);
  }

  #[test]
  fn record_evicts_oldest_past_the_bound() {
    let dir = tempfile::tempdir().unwrap();
    let mut history = history_in(&dir);
    for i in 0..11 {
      history.record(&format!("query {}", i)).unwrap();
    }
    assert_eq!(history.entries().len(), 10);
    assert_eq!(history.entries()[0], "query 10");
    // "query 0" was the oldest and fell off the end.
    assert!(!history.entries().iter().any(|e| e == "query 0"));
  }

  #[test]
  fn duplicate_within_a_full_list_stays_single_and_frontmost() {
    let dir = tempfile::tempdir().unwrap();
    let mut history = history_in(&dir);
    for i in 0..10 {
      history.record(&format!("query {}", i)).unwrap();
    }
    history.record("QUERY 3").unwrap();
    let entries = history.entries();
    assert!(entries.len() <= 10);
    assert_eq!(entries[0], "QUERY 3");
    assert_eq!(entries.iter().filter(|e| e.to_lowercase() == "query 3").count(), 1);
  }
}
