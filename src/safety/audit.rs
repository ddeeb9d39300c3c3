// src/safety/audit.rs
// Append-only, size-rotated file sink for safety-critical detections.
// Every HIGH/MEDIUM detection (lexical or semantic) lands here; the pipeline
// never reads it back. Entries are mirrored to tracing under the
// `safety_audit` target so they also show up in the main log stream.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{error, warn};

pub struct SafetyAuditLog {
    sink: Mutex<Option<AuditSink>>,
}

struct AuditSink {
    path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
    max_backups: usize,
}

impl SafetyAuditLog {
    /// Open (or create) the audit log. A failure to open the file disables
    /// the file sink but never fails startup; detections still reach the
    /// tracing stream.
    pub fn open(path: impl AsRef<Path>, max_bytes: u64, max_backups: usize) -> Self {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    error!(
                        "Failed to create audit log directory {}: {}",
                        parent.display(),
                        e
                    );
                    return Self::disabled();
                }
            }
        }

        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => {
                let written = file.metadata().map(|m| m.len()).unwrap_or(0);
                Self {
                    sink: Mutex::new(Some(AuditSink {
                        path,
                        file,
                        written,
                        max_bytes,
                        max_backups,
                    })),
                }
            }
            Err(e) => {
                error!("Failed to open safety audit log {}: {}", path.display(), e);
                Self::disabled()
            }
        }
    }

    /// Audit log with no file sink (used in tests and degraded startup).
    pub fn disabled() -> Self {
        Self {
            sink: Mutex::new(None),
        }
    }

    /// Record a warning-level safety event.
    pub fn warn(&self, session_id: &str, message: &str) {
        warn!(target: "safety_audit", "[{}] {}", session_id, message);
        self.append("WARNING", session_id, message);
    }

    fn append(&self, level: &str, session_id: &str, message: &str) {
        let line = format!(
            "{} - {} - [{}] {}\n",
            Utc::now().to_rfc3339(),
            level,
            session_id,
            message
        );

        let mut guard = self.sink.lock();
        if let Some(sink) = guard.as_mut() {
            if let Err(e) = sink.write_line(&line) {
                error!("Failed to write safety audit entry: {}", e);
            }
        }
    }
}

impl AuditSink {
    fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        if self.written + line.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        self.written += line.len() as u64;
        Ok(())
    }

    /// Shift path.N -> path.N+1 (dropping the oldest) and reopen a fresh file.
    fn rotate(&mut self) -> std::io::Result<()> {
        let backup = |n: usize| -> PathBuf {
            let mut p = self.path.as_os_str().to_owned();
            p.push(format!(".{}", n));
            PathBuf::from(p)
        };

        if self.max_backups > 0 {
            let _ = std::fs::remove_file(backup(self.max_backups));
            for n in (1..self.max_backups).rev() {
                let _ = std::fs::rename(backup(n), backup(n + 1));
            }
            std::fs::rename(&self.path, backup(1))?;
        } else {
            std::fs::remove_file(&self.path)?;
        }

        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_entries_with_session_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let log = SafetyAuditLog::open(&path, 1024 * 1024, 2);

        log.warn("session-1", "KEYWORD CHECK: HIGH RISK DETECTED!");

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[session-1] KEYWORD CHECK: HIGH RISK DETECTED!"));
        assert!(contents.contains("WARNING"));
    }

    #[test]
    fn rotates_when_size_limit_exceeded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        // Tiny budget: every entry forces a rotation after the first.
        let log = SafetyAuditLog::open(&path, 64, 2);

        for i in 0..10 {
            log.warn("s", &format!("entry number {}", i));
        }

        assert!(path.exists());
        assert!(dir.path().join("audit.log.1").exists());
        // Current file stays under the budget after rotation.
        assert!(std::fs::metadata(&path).unwrap().len() <= 128);
    }

    #[test]
    fn disabled_sink_does_not_panic() {
        let log = SafetyAuditLog::disabled();
        log.warn("s", "no file behind this one");
    }
}
