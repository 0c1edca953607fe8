use chrono::{DateTime, Utc};

/// One appended log line. Sequence numbers are strictly increasing, gap-free
/// and start at 1 for each run, so a client can resume reading from any
/// cursor it has seen without deduplicating.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub text: String,
}
