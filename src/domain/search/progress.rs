use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// Receives human-readable progress while a query runs
pub trait ProgressReporter: Send + Sync {
    fn log(&self, level: LogLevel, component: &str, message: &str);

    fn info(&self, component: &str, message: &str) {
        self.log(LogLevel::Info, component, message);
    }

    fn warning(&self, component: &str, message: &str) {
        self.log(LogLevel::Warning, component, message);
    }
}

/// Reporter for callers without a live channel (REST)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn log(&self, _level: LogLevel, _component: &str, _message: &str) {}
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingReporter {
    lines: std::sync::Mutex<Vec<(LogLevel, String, String)>>,
}

#[cfg(test)]
impl RecordingReporter {
    pub fn lines(&self) -> Vec<(LogLevel, String, String)> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|(_, _, message)| message.contains(needle))
    }
}

#[cfg(test)]
impl ProgressReporter for RecordingReporter {
    fn log(&self, level: LogLevel, component: &str, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, component.to_string(), message.to_string()));
        }
    }
}
