//! Progress data model.
//!
//! A student's record nests subject aggregates, which in turn hold the
//! latest-session snapshot for each topic.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProgressError;

/// Lowest accepted understanding level.
pub const MIN_UNDERSTANDING_LEVEL: u8 = 1;

/// Highest accepted understanding level.
pub const MAX_UNDERSTANDING_LEVEL: u8 = 5;

/// Everything recorded for one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Board the student was first recorded under. Never updated afterwards.
    pub board: String,
    /// Class level the student was first recorded under. Never updated afterwards.
    pub class_level: String,
    /// Per-subject progress keyed by subject name.
    #[serde(default)]
    pub subjects: BTreeMap<String, SubjectProgress>,
}

impl ProgressRecord {
    pub fn new(board: impl Into<String>, class_level: impl Into<String>) -> Self {
        Self {
            board: board.into(),
            class_level: class_level.into(),
            subjects: BTreeMap::new(),
        }
    }
}

/// Cumulative totals for a subject plus the latest snapshot of each topic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectProgress {
    #[serde(default)]
    pub topics: BTreeMap<String, TopicProgress>,
    /// Sum of every session's minutes for this subject.
    #[serde(default)]
    pub total_time_spent: u64,
    /// Sum of every session's question count for this subject.
    #[serde(default)]
    pub total_questions_asked: u64,
}

/// The most recent session on a topic. Each session replaces the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicProgress {
    pub understanding_level: u8,
    pub questions_asked: u32,
    /// Minutes spent in the latest session.
    pub time_spent: u32,
    /// RFC 3339 with a nine-digit fraction, so the text sorts in time order.
    #[serde(serialize_with = "fixed_rfc3339::serialize")]
    pub last_updated: DateTime<Utc>,
}

mod fixed_rfc3339 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::Serializer;

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Nanos, true))
    }
}

/// One study session reported by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUpdate {
    pub student_id: String,
    pub board: String,
    pub class_level: String,
    pub subject: String,
    pub topic: String,
    /// Self-reported understanding on a 1-5 scale.
    pub understanding_level: u8,
    #[serde(default)]
    pub questions_asked: u32,
    /// Minutes spent.
    #[serde(default)]
    pub time_spent: u32,
}

impl SessionUpdate {
    /// Reject payloads the tracker should never see.
    ///
    /// The tracker itself stores whatever it is given; callers facing
    /// untrusted input run this first.
    pub fn check(&self) -> Result<(), ProgressError> {
        let required = [
            ("student_id", &self.student_id),
            ("subject", &self.subject),
            ("topic", &self.topic),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ProgressError::InvalidInput(format!("{field} is required")));
            }
        }

        if !(MIN_UNDERSTANDING_LEVEL..=MAX_UNDERSTANDING_LEVEL).contains(&self.understanding_level)
        {
            return Err(ProgressError::InvalidInput(format!(
                "understanding_level must be between {MIN_UNDERSTANDING_LEVEL} and {MAX_UNDERSTANDING_LEVEL}, got {}",
                self.understanding_level
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update() -> SessionUpdate {
        SessionUpdate {
            student_id: "s1".into(),
            board: "CBSE".into(),
            class_level: "5".into(),
            subject: "Math".into(),
            topic: "Fractions".into(),
            understanding_level: 3,
            questions_asked: 2,
            time_spent: 10,
        }
    }

    #[test]
    fn well_formed_update_passes() {
        assert_eq!(update().check(), Ok(()));
    }

    #[test]
    fn missing_identifiers_are_rejected() {
        let mut u = update();
        u.topic = "  ".into();
        let err = u.check().unwrap_err();
        assert_eq!(err, ProgressError::InvalidInput("topic is required".into()));
    }

    #[test]
    fn understanding_level_out_of_range() {
        for level in [0, 6, 255] {
            let mut u = update();
            u.understanding_level = level;
            assert!(
                matches!(u.check(), Err(ProgressError::InvalidInput(msg)) if msg.contains("between 1 and 5")),
                "level {level}"
            );
        }
    }

    #[test]
    fn counts_default_to_zero() {
        let json = r#"{
            "student_id": "s1", "board": "CBSE", "class_level": "5",
            "subject": "Math", "topic": "Fractions", "understanding_level": 4
        }"#;
        let u: SessionUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(u.questions_asked, 0);
        assert_eq!(u.time_spent, 0);
    }
}
