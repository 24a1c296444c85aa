//! The `edubot progress` commands.
//!
//! Works against a JSON snapshot file so progress can be inspected and
//! edited without a running server.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Table};

use edubot_core::model::{ProgressRecord, SessionUpdate};
use edubot_core::progress::ProgressTracker;

const DEFAULT_STORE: &str = "edubot-progress.json";

#[derive(Subcommand)]
pub enum ProgressAction {
    /// Record a study session
    Record {
        /// Progress store
        #[arg(long, default_value = DEFAULT_STORE)]
        store: PathBuf,

        #[arg(long)]
        student_id: String,

        #[arg(long)]
        board: String,

        #[arg(long)]
        class_level: String,

        #[arg(long)]
        subject: String,

        #[arg(long)]
        topic: String,

        /// Understanding level, 1-5
        #[arg(long)]
        understanding_level: u8,

        #[arg(long, default_value = "0")]
        questions_asked: u32,

        /// Minutes spent
        #[arg(long, default_value = "0")]
        time_spent: u32,
    },

    /// Show a student's progress
    Show {
        /// Progress store
        #[arg(long, default_value = DEFAULT_STORE)]
        store: PathBuf,

        #[arg(long)]
        student_id: String,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn execute(action: ProgressAction) -> Result<()> {
    match action {
        ProgressAction::Record {
            store,
            student_id,
            board,
            class_level,
            subject,
            topic,
            understanding_level,
            questions_asked,
            time_spent,
        } => {
            let update = SessionUpdate {
                student_id,
                board,
                class_level,
                subject,
                topic,
                understanding_level,
                questions_asked,
                time_spent,
            };
            update.check()?;

            let tracker = open_store(&store)?;
            tracker.record_session(&update);
            tracker.save_json(&store)?;

            println!(
                "Progress updated for {} ({} / {})",
                update.student_id, update.subject, update.topic
            );
            Ok(())
        }
        ProgressAction::Show {
            store,
            student_id,
            json,
        } => {
            let record = open_store(&store)?.get_progress(&student_id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print_record(&student_id, &record);
            }
            Ok(())
        }
    }
}

fn open_store(path: &Path) -> Result<ProgressTracker> {
    if path.exists() {
        ProgressTracker::load_json(path)
    } else {
        Ok(ProgressTracker::new())
    }
}

fn print_record(student_id: &str, record: &ProgressRecord) {
    println!(
        "Student: {student_id} (board {}, class {})",
        record.board, record.class_level
    );

    let mut table = Table::new();
    table.set_header(vec![
        "Subject",
        "Topic",
        "Understanding",
        "Questions",
        "Minutes",
        "Last updated",
    ]);

    for (subject_name, subject) in &record.subjects {
        for (topic_name, topic) in &subject.topics {
            table.add_row(vec![
                Cell::new(subject_name),
                Cell::new(topic_name),
                Cell::new(topic.understanding_level),
                Cell::new(topic.questions_asked),
                Cell::new(topic.time_spent),
                Cell::new(topic.last_updated.format("%Y-%m-%d %H:%M")),
            ]);
        }
        table.add_row(vec![
            Cell::new(subject_name),
            Cell::new("(total)"),
            Cell::new(""),
            Cell::new(subject.total_questions_asked),
            Cell::new(subject.total_time_spent),
            Cell::new(""),
        ]);
    }

    println!("{table}");
}
