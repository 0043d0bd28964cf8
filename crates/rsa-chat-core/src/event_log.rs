use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Math,
    System,
    Success,
    Secure,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    pub seq: u64,
    pub time: DateTime<Utc>,
    pub text: String,
    pub kind: LogKind,
}

impl LogEntry {
    /// `[HH:MM:SS] text`, the way the log panel prints it.
    pub fn render(&self) -> String {
        format!("[{}] {}", self.time.format("%H:%M:%S"), self.text)
    }
}

/// Append-only narration of everything the orchestrator does.
///
/// Order is call order. Entries are never edited, reordered or
/// deduplicated; the only way to empty the log is a key regeneration, which
/// goes through [`EventLog::reset`].
#[derive(Debug, Default)]
pub struct EventLog {
    entries: Vec<LogEntry>,
    last_seq: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, text: impl Into<String>, kind: LogKind) -> &LogEntry {
        let seq = self.last_seq + 1;
        self.last_seq = seq;
        self.entries.push(LogEntry {
            seq,
            time: Utc::now(),
            text: text.into(),
            kind,
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Trace lines returned by the service, kept in array order.
    pub fn extend_remote<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for line in lines {
            self.append(line, LogKind::Math);
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sequence numbers keep counting across resets.
    pub(crate) fn reset(&mut self) {
        self.entries.clear();
    }

    /// One JSON object per line.
    pub fn write_jsonl<W: Write>(&self, mut out: W) -> Result<()> {
        for entry in &self.entries {
            let line = serde_json::to_string(entry)?;
            writeln!(out, "{}", line)?;
        }
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use tempfile::tempdir;

    #[test]
    fn append_keeps_call_order_and_duplicates() {
        let mut log = EventLog::new();
        log.append("one", LogKind::Info);
        log.append("one", LogKind::Info);
        log.extend_remote(vec!["c = 104^65537 mod 3233", "c = 105^65537 mod 3233"]);
        let texts: Vec<_> = log.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(
            texts,
            ["one", "one", "c = 104^65537 mod 3233", "c = 105^65537 mod 3233"]
        );
        let seqs: Vec<_> = log.entries().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, [1, 2, 3, 4]);
        assert!(log.entries()[2..].iter().all(|e| e.kind == LogKind::Math));
    }

    #[test]
    fn reset_empties_but_seq_continues() {
        let mut log = EventLog::new();
        log.append("before", LogKind::System);
        assert_eq!(log.len(), 1);
        log.reset();
        assert!(log.is_empty());
        let e = log.append("after", LogKind::System);
        assert_eq!(e.seq, 2);
    }

    #[test]
    fn jsonl_export_round_trips_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let mut log = EventLog::new();
        log.append("Starting RSA server...", LogKind::System);
        log.append("Encryption failed.", LogKind::Error);
        log.write_jsonl(std::fs::File::create(&path).unwrap()).unwrap();

        let reader = BufReader::new(std::fs::File::open(&path).unwrap());
        let parsed: Vec<LogEntry> = reader
            .lines()
            .map(|l| serde_json::from_str(&l.unwrap()).unwrap())
            .collect();
        assert_eq!(parsed, log.entries());
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains(r#""kind":"error""#));
    }

    #[test]
    fn render_uses_clock_prefix() {
        let mut log = EventLog::new();
        let line = log.append("hello", LogKind::Info).render();
        assert!(line.starts_with('['));
        assert!(line.ends_with("] hello"));
        assert_eq!(line.len(), "[00:00:00] hello".len());
    }
}
