//! Listening progress tracker.
//!
//! Per-lesson listening state (completion, time spent, playback position, play
//! count) kept as one JSON map under the `listening-progress` key of a small
//! key/value store. Independent of the server-side `user_progress` table.

use std::{
  collections::{BTreeMap, HashMap},
  fs, io,
  path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const STORAGE_KEY: &str = "listening-progress";

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("storage I/O failed for {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
  #[error("could not encode listening progress: {0}")]
  Encode(#[from] serde_json::Error),
}

/// String key/value storage, the server-side stand-in for browser local storage.
pub trait KeyValueStore {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
  fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
  fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
  entries: HashMap<String, String>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    Ok(self.entries.get(key).cloned())
  }

  fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
    self.entries.insert(key.to_string(), value);
    Ok(())
  }

  fn remove(&mut self, key: &str) -> Result<(), StoreError> {
    self.entries.remove(key);
    Ok(())
  }
}

/// One `<key>.json` file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
  dir: PathBuf,
}

impl FileStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  fn path_for(&self, key: &str) -> PathBuf {
    self.dir.join(format!("{key}.json"))
  }
}

fn io_error(path: &Path, source: io::Error) -> StoreError {
  StoreError::Io { path: path.to_path_buf(), source }
}

impl KeyValueStore for FileStore {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    let path = self.path_for(key);
    match fs::read_to_string(&path) {
      Ok(s) => Ok(Some(s)),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(io_error(&path, e)),
    }
  }

  fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
    fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;
    let path = self.path_for(key);
    fs::write(&path, value).map_err(|e| io_error(&path, e))
  }

  fn remove(&mut self, key: &str) -> Result<(), StoreError> {
    let path = self.path_for(key);
    match fs::remove_file(&path) {
      Err(e) if e.kind() != io::ErrorKind::NotFound => Err(io_error(&path, e)),
      _ => Ok(()),
    }
  }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LessonProgress {
  pub completed: bool,
  pub completed_at: Option<DateTime<Utc>>,
  /// Seconds, accumulated across sessions.
  pub time_spent: u64,
  /// Seconds into the audio where playback last stopped.
  pub last_position: u64,
  pub play_count: u32,
}

/// A listening lesson as the stats need to see it.
#[derive(Clone, Debug)]
pub struct ListeningLesson {
  pub id: i64,
  pub level: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
  pub total_lessons: usize,
  pub completed_lessons: usize,
  pub completion_rate: f64,
  pub total_time_spent: u64,
  pub favorite_level: Option<String>,
}

pub type ProgressMap = BTreeMap<i64, LessonProgress>;

pub struct ListeningTracker<S> {
  store: S,
}

impl<S: KeyValueStore> ListeningTracker<S> {
  pub fn new(store: S) -> Self {
    Self { store }
  }

  pub fn into_store(self) -> S {
    self.store
  }

  /// Everything recorded so far. Missing, unreadable or corrupt data reads as
  /// an empty map.
  pub fn get_all(&self) -> ProgressMap {
    let raw = match self.store.get(STORAGE_KEY) {
      Ok(Some(raw)) => raw,
      Ok(None) => return ProgressMap::new(),
      Err(e) => {
        warn!(target: "listening", error = %e, "Could not read listening progress");
        return ProgressMap::new();
      }
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
      warn!(target: "listening", error = %e, "Discarding corrupt listening progress");
      ProgressMap::new()
    })
  }

  pub fn get(&self, lesson_id: i64) -> Option<LessonProgress> {
    self.get_all().remove(&lesson_id)
  }

  pub fn is_completed(&self, lesson_id: i64) -> bool {
    self.get(lesson_id).map(|p| p.completed).unwrap_or(false)
  }

  pub fn mark_completed(&mut self, lesson_id: i64) -> Result<LessonProgress, StoreError> {
    self.mark_completed_at(lesson_id, Utc::now())
  }

  pub fn mark_completed_at(&mut self, lesson_id: i64, now: DateTime<Utc>) -> Result<LessonProgress, StoreError> {
    self.update(lesson_id, |p| {
      p.completed = true;
      p.completed_at = Some(now);
    })
  }

  /// Adds `seconds` to the lesson's running total.
  pub fn update_time_spent(&mut self, lesson_id: i64, seconds: u64) -> Result<LessonProgress, StoreError> {
    self.update(lesson_id, |p| p.time_spent = p.time_spent.saturating_add(seconds))
  }

  pub fn update_position(&mut self, lesson_id: i64, seconds: u64) -> Result<LessonProgress, StoreError> {
    self.update(lesson_id, |p| p.last_position = seconds)
  }

  pub fn increment_play_count(&mut self, lesson_id: i64) -> Result<LessonProgress, StoreError> {
    self.update(lesson_id, |p| p.play_count = p.play_count.saturating_add(1))
  }

  pub fn reset_lesson(&mut self, lesson_id: i64) -> Result<(), StoreError> {
    let mut all = self.get_all();
    if all.remove(&lesson_id).is_some() {
      self.save(&all)?;
    }
    Ok(())
  }

  pub fn reset_all(&mut self) -> Result<(), StoreError> {
    self.store.remove(STORAGE_KEY)
  }

  /// Summary over `lessons`; progress for lessons outside the list is ignored.
  pub fn get_progress_stats(&self, lessons: &[ListeningLesson]) -> ProgressStats {
    let all = self.get_all();

    let mut completed = 0usize;
    let mut time = 0u64;
    // Level -> (completed count, first position in `lessons`).
    let mut per_level: HashMap<&str, (usize, usize)> = HashMap::new();

    for (pos, lesson) in lessons.iter().enumerate() {
      let entry = per_level.entry(lesson.level.as_str()).or_insert((0, pos));
      let Some(p) = all.get(&lesson.id) else { continue };
      time = time.saturating_add(p.time_spent);
      if p.completed {
        completed += 1;
        entry.0 += 1;
      }
    }

    let favorite_level = per_level
      .into_iter()
      .filter(|(_, (count, _))| *count > 0)
      .max_by(|a, b| a.1 .0.cmp(&b.1 .0).then(b.1 .1.cmp(&a.1 .1)))
      .map(|(level, _)| level.to_string());

    let total = lessons.len();
    ProgressStats {
      total_lessons: total,
      completed_lessons: completed,
      completion_rate: if total == 0 { 0.0 } else { 100.0 * completed as f64 / total as f64 },
      total_time_spent: time,
      favorite_level,
    }
  }

  fn update(&mut self, lesson_id: i64, f: impl FnOnce(&mut LessonProgress)) -> Result<LessonProgress, StoreError> {
    let mut all = self.get_all();
    let entry = all.entry(lesson_id).or_default();
    f(entry);
    let updated = entry.clone();
    self.save(&all)?;
    debug!(target: "listening", lesson_id, ?updated, "Listening progress saved");
    Ok(updated)
  }

  fn save(&mut self, all: &ProgressMap) -> Result<(), StoreError> {
    let raw = serde_json::to_string(all)?;
    self.store.set(STORAGE_KEY, raw)
  }
}

/// "1h 5m", "3m 20s" or "45s".
pub fn format_duration(seconds: u64) -> String {
  let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
  if h > 0 {
    format!("{h}h {m}m")
  } else if m > 0 {
    format!("{m}m {s}s")
  } else {
    format!("{s}s")
  }
}

/// Playback clock, "m:ss".
pub fn format_position(seconds: u64) -> String {
  format!("{}:{:02}", seconds / 60, seconds % 60)
}
