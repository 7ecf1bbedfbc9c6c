use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const LOG_FILE_RELATIVE_PATH: &str = "logs/repocraft.log";

pub fn event_log_path(state_root: &Path) -> PathBuf {
    state_root.join(LOG_FILE_RELATIVE_PATH)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    path: Option<PathBuf>,
}

impl EventLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    pub fn for_state_root(state_root: &Path) -> Self {
        Self::new(event_log_path(state_root))
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn info(&self, event: &str, message: &str) {
        self.append(LogLevel::Info, event, message, &[]);
    }

    pub fn warn(&self, event: &str, message: &str) {
        self.append(LogLevel::Warn, event, message, &[]);
    }

    pub fn error(&self, event: &str, message: &str) {
        self.append(LogLevel::Error, event, message, &[]);
    }

    pub fn append(&self, level: LogLevel, event: &str, message: &str, fields: &[(&str, Value)]) {
        let Some(path) = self.path.as_deref() else {
            return;
        };

        let mut payload = Map::new();
        payload.insert(
            "timestamp".to_string(),
            Value::String(chrono::Utc::now().to_rfc3339()),
        );
        payload.insert("level".to_string(), Value::from(level.as_str()));
        payload.insert("event".to_string(), Value::from(event));
        payload.insert("message".to_string(), Value::from(message));
        for (key, value) in fields {
            payload.insert((*key).to_string(), value.clone());
        }

        let Ok(line) = serde_json::to_string(&payload) else {
            return;
        };
        if let Some(parent) = path.parent() {
            if fs::create_dir_all(parent).is_err() {
                return;
            }
        }
        let Ok(mut file) = fs::OpenOptions::new().create(true).append(true).open(path) else {
            return;
        };
        let _ = writeln!(file, "{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn append_writes_one_json_object_per_line() {
        let dir = tempdir().expect("tempdir");
        let log = EventLog::for_state_root(dir.path());
        log.info("connection.linked", "account ca_1 linked");
        log.append(
            LogLevel::Warn,
            "parser.model_failed",
            "no json",
            &[("turn", Value::from(2))],
        );

        let raw = fs::read_to_string(event_log_path(dir.path())).expect("read log");
        let lines: Vec<Value> = raw
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["level"], "info");
        assert_eq!(lines[0]["event"], "connection.linked");
        assert_eq!(lines[1]["level"], "warn");
        assert_eq!(lines[1]["turn"], 2);
        assert!(lines[1]["timestamp"].as_str().is_some());
    }

    #[test]
    fn disabled_log_writes_nothing() {
        let log = EventLog::disabled();
        assert!(log.path().is_none());
        log.error("noop", "ignored");
    }
}
