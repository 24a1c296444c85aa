//! In-memory progress aggregate.
//!
//! Each student's record sits behind its own mutex, so concurrent sessions
//! for one student are serialized while different students proceed
//! independently. The outer index is only write-locked to insert a student
//! seen for the first time.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProgressError;
use crate::model::{ProgressRecord, SessionUpdate, SubjectProgress, TopicProgress};

type SharedRecord = Arc<Mutex<ProgressRecord>>;

/// Serializable copy of every student's record, keyed by student ID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    #[serde(default)]
    pub students: BTreeMap<String, ProgressRecord>,
}

/// Tracks learning sessions per student, subject and topic.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    students: RwLock<HashMap<String, SharedRecord>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one session.
    ///
    /// The topic entry is replaced wholesale with this session's figures,
    /// while the subject totals accumulate. `board` and `class_level` only
    /// take effect the first time the student is seen.
    pub fn record_session(&self, update: &SessionUpdate) {
        self.record_session_at(update, Utc::now());
    }

    /// Same as [`record_session`](Self::record_session) with an explicit timestamp.
    pub fn record_session_at(&self, update: &SessionUpdate, at: DateTime<Utc>) {
        let record = self.record_for(update);
        let mut record = lock(&record);

        let subject = record
            .subjects
            .entry(update.subject.clone())
            .or_insert_with(SubjectProgress::default);

        subject.topics.insert(
            update.topic.clone(),
            TopicProgress {
                understanding_level: update.understanding_level,
                questions_asked: update.questions_asked,
                time_spent: update.time_spent,
                last_updated: at,
            },
        );

        subject.total_time_spent = subject
            .total_time_spent
            .saturating_add(u64::from(update.time_spent));
        subject.total_questions_asked = subject
            .total_questions_asked
            .saturating_add(u64::from(update.questions_asked));

        tracing::debug!(
            student = %update.student_id,
            subject = %update.subject,
            topic = %update.topic,
            total_time_spent = subject.total_time_spent,
            total_questions_asked = subject.total_questions_asked,
            "recorded session"
        );
    }

    /// Full record for a student.
    pub fn get_progress(&self, student_id: &str) -> Result<ProgressRecord, ProgressError> {
        let record = read(&self.students)
            .get(student_id)
            .cloned()
            .ok_or_else(|| ProgressError::NotFound(student_id.to_string()))?;
        let record = lock(&record).clone();
        Ok(record)
    }

    /// Mark a topic as revisited by an explanation request.
    ///
    /// If the student already has `topic` under some subject, that topic's
    /// `questions_asked` goes up by one and `last_updated` is refreshed.
    /// Subject totals are left alone. Returns whether a topic was found.
    pub fn touch_topic(&self, student_id: &str, topic: &str) -> bool {
        let Some(record) = read(&self.students).get(student_id).cloned() else {
            return false;
        };
        let mut record = lock(&record);

        let Some(entry) = record
            .subjects
            .values_mut()
            .find_map(|subject| subject.topics.get_mut(topic))
        else {
            return false;
        };
        entry.questions_asked = entry.questions_asked.saturating_add(1);
        entry.last_updated = Utc::now();
        true
    }

    /// IDs of every tracked student, sorted.
    pub fn student_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = read(&self.students).keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        read(&self.students).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy out every record.
    pub fn snapshot(&self) -> ProgressSnapshot {
        let students = read(&self.students)
            .iter()
            .map(|(id, record)| (id.clone(), lock(record).clone()))
            .collect();
        ProgressSnapshot { students }
    }

    /// Rebuild a tracker from a snapshot.
    pub fn from_snapshot(snapshot: ProgressSnapshot) -> Self {
        let students = snapshot
            .students
            .into_iter()
            .map(|(id, record)| (id, Arc::new(Mutex::new(record))))
            .collect();
        Self {
            students: RwLock::new(students),
        }
    }

    /// Save every record as pretty-printed JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.snapshot())
            .context("failed to serialize progress")?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write progress to {}", path.display()))?;
        Ok(())
    }

    /// Load a tracker saved with [`save_json`](Self::save_json).
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read progress from {}", path.display()))?;
        let snapshot: ProgressSnapshot =
            serde_json::from_str(&content).context("failed to parse progress JSON")?;
        Ok(Self::from_snapshot(snapshot))
    }

    fn record_for(&self, update: &SessionUpdate) -> SharedRecord {
        if let Some(record) = read(&self.students).get(&update.student_id) {
            return Arc::clone(record);
        }

        let mut students = self
            .students
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let record = students
            .entry(update.student_id.clone())
            .or_insert_with(|| {
                tracing::info!(student = %update.student_id, "tracking new student");
                Arc::new(Mutex::new(ProgressRecord::new(
                    update.board.clone(),
                    update.class_level.clone(),
                )))
            });
        Arc::clone(record)
    }
}

fn read(
    students: &RwLock<HashMap<String, SharedRecord>>,
) -> std::sync::RwLockReadGuard<'_, HashMap<String, SharedRecord>> {
    students.read().unwrap_or_else(PoisonError::into_inner)
}

fn lock(record: &Mutex<ProgressRecord>) -> MutexGuard<'_, ProgressRecord> {
    record.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(level: u8, questions: u32, minutes: u32) -> SessionUpdate {
        SessionUpdate {
            student_id: "s1".into(),
            board: "CBSE".into(),
            class_level: "5".into(),
            subject: "Math".into(),
            topic: "Fractions".into(),
            understanding_level: level,
            questions_asked: questions,
            time_spent: minutes,
        }
    }

    #[test]
    fn first_session_creates_record() {
        let tracker = ProgressTracker::new();
        tracker.record_session(&session(3, 2, 10));

        let record = tracker.get_progress("s1").unwrap();
        assert_eq!(record.board, "CBSE");
        assert_eq!(record.class_level, "5");

        let math = &record.subjects["Math"];
        let fractions = &math.topics["Fractions"];
        assert_eq!(fractions.understanding_level, 3);
        assert_eq!(fractions.questions_asked, 2);
        assert_eq!(fractions.time_spent, 10);
        assert_eq!(math.total_time_spent, 10);
        assert_eq!(math.total_questions_asked, 2);
    }

    #[test]
    fn topic_overwrites_while_subject_accumulates() {
        let tracker = ProgressTracker::new();
        tracker.record_session(&session(3, 2, 10));
        tracker.record_session(&session(4, 1, 5));

        let math = &tracker.get_progress("s1").unwrap().subjects["Math"];
        let fractions = &math.topics["Fractions"];
        assert_eq!(
            (
                fractions.understanding_level,
                fractions.questions_asked,
                fractions.time_spent
            ),
            (4, 1, 5)
        );
        assert_eq!(math.total_time_spent, 15);
        assert_eq!(math.total_questions_asked, 3);
    }

    #[test]
    fn repeated_identical_sessions_are_additive() {
        let tracker = ProgressTracker::new();
        let update = session(2, 3, 7);
        tracker.record_session(&update);
        tracker.record_session(&update);

        let math = &tracker.get_progress("s1").unwrap().subjects["Math"];
        assert_eq!(math.total_time_spent, 14);
        assert_eq!(math.total_questions_asked, 6);
        assert_eq!(math.topics["Fractions"].questions_asked, 3);
        assert_eq!(math.topics["Fractions"].time_spent, 7);
    }

    #[test]
    fn board_and_class_are_first_write_wins() {
        let tracker = ProgressTracker::new();
        tracker.record_session(&session(3, 2, 10));

        let mut moved = session(3, 1, 1);
        moved.board = "ICSE".into();
        moved.class_level = "6".into();
        tracker.record_session(&moved);

        let record = tracker.get_progress("s1").unwrap();
        assert_eq!(record.board, "CBSE");
        assert_eq!(record.class_level, "5");
    }

    #[test]
    fn last_updated_tracks_latest_session() {
        let tracker = ProgressTracker::new();
        let earlier = DateTime::parse_from_rfc3339("2026-01-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let later = DateTime::parse_from_rfc3339("2026-01-02T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        tracker.record_session_at(&session(3, 2, 10), earlier);
        tracker.record_session_at(&session(3, 2, 10), later);

        let record = tracker.get_progress("s1").unwrap();
        assert_eq!(record.subjects["Math"].topics["Fractions"].last_updated, later);
    }

    #[test]
    fn serialized_last_updated_sorts_like_time() {
        let base = DateTime::parse_from_rfc3339("2026-01-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let on_millisecond = base + chrono::Duration::milliseconds(120);
        let just_after = base + chrono::Duration::microseconds(120_001);

        let tracker = ProgressTracker::new();
        let mut first = session(3, 2, 10);
        first.topic = "Decimals".into();
        tracker.record_session_at(&first, on_millisecond);
        tracker.record_session_at(&session(3, 2, 10), just_after);

        let json = serde_json::to_value(tracker.get_progress("s1").unwrap()).unwrap();
        let topics = &json["subjects"]["Math"]["topics"];
        let a = topics["Decimals"]["last_updated"].as_str().unwrap();
        let b = topics["Fractions"]["last_updated"].as_str().unwrap();
        assert_eq!(a, "2026-01-01T09:00:00.120000000Z");
        assert!(a < b, "{a} should sort before {b}");

        let back: ProgressRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.subjects["Math"].topics["Decimals"].last_updated, on_millisecond);
    }

    #[test]
    fn topics_and_subjects_are_independent() {
        let tracker = ProgressTracker::new();
        tracker.record_session(&session(3, 2, 10));
        let mut decimals = session(5, 4, 20);
        decimals.topic = "Decimals".into();
        tracker.record_session(&decimals);
        let mut science = session(1, 1, 30);
        science.subject = "Science".into();
        science.topic = "Plants".into();
        tracker.record_session(&science);

        let record = tracker.get_progress("s1").unwrap();
        assert_eq!(record.subjects.len(), 2);
        assert_eq!(record.subjects["Math"].topics.len(), 2);
        assert_eq!(record.subjects["Math"].total_time_spent, 30);
        assert_eq!(record.subjects["Science"].total_time_spent, 30);
        assert_eq!(record.subjects["Science"].total_questions_asked, 1);
    }

    #[test]
    fn out_of_range_level_is_stored_verbatim() {
        let tracker = ProgressTracker::new();
        tracker.record_session(&session(9, 0, 0));
        let record = tracker.get_progress("s1").unwrap();
        assert_eq!(record.subjects["Math"].topics["Fractions"].understanding_level, 9);
    }

    #[test]
    fn unknown_student_is_not_found() {
        let tracker = ProgressTracker::new();
        assert_eq!(
            tracker.get_progress("unknown"),
            Err(ProgressError::NotFound("unknown".into()))
        );
    }

    #[test]
    fn touch_topic_bumps_questions_only() {
        let tracker = ProgressTracker::new();
        tracker.record_session(&session(3, 2, 10));

        assert!(tracker.touch_topic("s1", "Fractions"));
        assert!(!tracker.touch_topic("s1", "Geometry"));
        assert!(!tracker.touch_topic("nobody", "Fractions"));

        let math = &tracker.get_progress("s1").unwrap().subjects["Math"];
        assert_eq!(math.topics["Fractions"].questions_asked, 3);
        assert_eq!(math.total_questions_asked, 2);
    }

    #[test]
    fn concurrent_sessions_for_one_student_lose_nothing() {
        let tracker = ProgressTracker::new();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..250 {
                        tracker.record_session(&session(3, 1, 2));
                    }
                });
            }
        });

        let math = &tracker.get_progress("s1").unwrap().subjects["Math"];
        assert_eq!(math.total_questions_asked, 2000);
        assert_eq!(math.total_time_spent, 4000);
    }

    #[test]
    fn concurrent_students_are_isolated() {
        let tracker = ProgressTracker::new();
        std::thread::scope(|scope| {
            for i in 0..8 {
                let tracker = &tracker;
                scope.spawn(move || {
                    let mut update = session(3, 1, 1);
                    update.student_id = format!("student-{i}");
                    for _ in 0..50 {
                        tracker.record_session(&update);
                    }
                });
            }
        });

        assert_eq!(tracker.len(), 8);
        for id in tracker.student_ids() {
            let math = &tracker.get_progress(&id).unwrap().subjects["Math"];
            assert_eq!(math.total_questions_asked, 50);
        }
    }

    #[test]
    fn snapshot_survives_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("progress.json");

        let tracker = ProgressTracker::new();
        tracker.record_session(&session(3, 2, 10));
        tracker.save_json(&path).unwrap();

        let restored = ProgressTracker::load_json(&path).unwrap();
        assert_eq!(restored.snapshot(), tracker.snapshot());

        restored.record_session(&session(4, 1, 5));
        let math = &restored.get_progress("s1").unwrap().subjects["Math"];
        assert_eq!(math.total_time_spent, 15);
    }

    #[test]
    fn load_missing_file_fails_with_path() {
        let err = ProgressTracker::load_json(Path::new("/nonexistent/progress.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/progress.json"));
    }
}
