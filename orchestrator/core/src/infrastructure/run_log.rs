// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Per-run deploy log
//!
//! Each deploy or destroy run appends JSON lines to its own file under the
//! log directory, then finalizes it with an overall outcome record. Logging
//! is best-effort: a log that cannot be written is reported through
//! `tracing` and never fails the run.

use chrono::Utc;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use crate::domain::deployment::{DeployStep, StepStatus};

#[derive(Serialize)]
struct LogRecord<'a> {
    timestamp: String,
    run_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<DeployStep>,
    #[serde(flatten)]
    status: &'a StepStatus,
}

#[derive(Serialize)]
struct FinalRecord<'a> {
    timestamp: String,
    run_id: &'a str,
    outcome: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

pub struct DeployRunLog {
    run_id: String,
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl DeployRunLog {
    /// Open `<log_dir>/<kind>-<timestamp>-<run id>.log`.
    pub fn create(log_dir: &Path, kind: &str) -> Self {
        let run_id = Uuid::new_v4().simple().to_string()[..8].to_string();
        let file_name = format!("{}-{}-{}.log", kind, Utc::now().format("%Y%m%dT%H%M%SZ"), run_id);
        let path = log_dir.join(file_name);

        let file = std::fs::create_dir_all(log_dir)
            .and_then(|_| OpenOptions::new().create(true).append(true).open(&path));
        let file = match file {
            Ok(f) => Some(f),
            Err(e) => {
                warn!(path = %path.display(), "Unable to open deploy log: {}", e);
                None
            }
        };

        Self {
            run_id,
            path,
            file: Mutex::new(file),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn step(&self, step: DeployStep, status: &StepStatus) {
        let record = LogRecord {
            timestamp: Utc::now().to_rfc3339(),
            run_id: &self.run_id,
            step: Some(step),
            status,
        };
        self.append(&record);
    }

    pub fn finish(&self, succeeded: bool, message: Option<&str>) {
        let record = FinalRecord {
            timestamp: Utc::now().to_rfc3339(),
            run_id: &self.run_id,
            outcome: if succeeded { "succeeded" } else { "failed" },
            message,
        };
        self.append(&record);
    }

    fn append<T: Serialize>(&self, record: &T) {
        let mut guard = self.file.lock().unwrap_or_else(|e| e.into_inner());
        let Some(file) = guard.as_mut() else {
            return;
        };
        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(e) => {
                warn!("Unable to encode deploy log record: {}", e);
                return;
            }
        };
        if let Err(e) = writeln!(file, "{}", line) {
            warn!(path = %self.path.display(), "Unable to write deploy log: {}", e);
        }
    }
}
