//! Per-cycle scan log
//!
//! Each scan cycle writes its events to a fresh JSON-lines file in the log
//! directory as well as to the process log. If the file cannot be created
//! the cycle logs to the process log only.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::observability::{log_event_with_fields, severity_for, Event, Logger};

pub(crate) struct ScanLog {
    file: Option<File>,
    path: Option<PathBuf>,
}

impl ScanLog {
    pub(crate) fn open(log_dir: &Path) -> Self {
        let path = log_dir.join(file_name());
        let created = fs::create_dir_all(log_dir).and_then(|()| File::create(&path));
        match created {
            Ok(file) => Self {
                file: Some(file),
                path: Some(path),
            },
            Err(e) => {
                log_event_with_fields(
                    Event::ScanLogUnavailable,
                    &[
                        ("path", &path.display().to_string()),
                        ("reason", &e.to_string()),
                    ],
                );
                Self {
                    file: None,
                    path: None,
                }
            }
        }
    }

    pub(crate) fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn emit(&mut self, event: Event, fields: &[(&str, &str)]) {
        log_event_with_fields(event, fields);
        if let Some(file) = self.file.as_mut() {
            Logger::log_to(file, severity_for(event), event.as_str(), fields);
        }
    }
}

fn file_name() -> String {
    format!(
        "scan-{}-{}.log",
        Utc::now().format("%Y%m%dT%H%M%S"),
        Uuid::new_v4()
    )
}
