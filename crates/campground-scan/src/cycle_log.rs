use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use tracing::{info, warn};

/// Append-only diagnostic buffer for one campsite's poll cycle.
///
/// Each finder owns one. Lines are forwarded to `tracing` as they arrive and
/// kept so a failure notification can carry the whole cycle's trail.
#[derive(Debug)]
pub struct CycleLog {
    label: String,
    lines: Mutex<Vec<String>>,
    flush_path: Option<PathBuf>,
}

impl CycleLog {
    /// Create a log whose `tracing` output is prefixed with `label`
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            lines: Mutex::new(Vec::new()),
            flush_path: None,
        }
    }

    /// Write the buffer to `path` every time it is cleared
    pub fn with_flush_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.flush_path = Some(path.into());
        self
    }

    /// Append a line
    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        info!("[{}] {}", self.label, message);
        self.lines().push(message);
    }

    /// Copy of everything logged since the last clear
    pub fn buffer(&self) -> Vec<String> {
        self.lines().clone()
    }

    /// Empty the buffer, flushing it to the configured file first
    pub fn clear(&self) {
        let mut lines = self.lines();
        if let Some(ref path) = self.flush_path {
            let mut contents = lines.join("\n");
            contents.push('\n');
            if let Err(e) = std::fs::write(path, contents) {
                warn!("Failed to flush cycle log to {}: {}", path.display(), e);
            }
        }
        lines.clear();
    }

    fn lines(&self) -> MutexGuard<'_, Vec<String>> {
        // A panic mid-push cannot leave the Vec inconsistent.
        self.lines.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_and_clear() {
        let log = CycleLog::new("test");
        log.log("first");
        log.log(String::from("second"));
        assert_eq!(log.buffer(), vec!["first", "second"]);

        log.clear();
        assert!(log.buffer().is_empty());
    }

    #[test]
    fn test_clear_flushes_to_file() {
        let path = std::env::temp_dir().join(format!("cycle-log-{}.txt", std::process::id()));
        let log = CycleLog::new("test").with_flush_file(&path);
        log.log("line one");
        log.log("line two");
        log.clear();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "line one\nline two\n");
        let _ = std::fs::remove_file(&path);
    }
}
