use serde::{Deserialize, Serialize};

/// Keys that never enter the log
pub const IGNORED_KEYS: &[&str] = &["Shift", "Control", "Alt", "Meta", "CapsLock", "Tab"];

/// One key event relative to the session start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keystroke {
    pub key: String,
    #[serde(rename = "timestamp")]
    pub timestamp_offset_ms: u64,
    #[serde(rename = "position")]
    pub cursor_position: usize,
}

/// Append-only, chronologically ordered key log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeystrokeLog {
    entries: Vec<Keystroke>,
}

impl KeystrokeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ignored(key: &str) -> bool {
        IGNORED_KEYS.contains(&key)
    }

    /// Append a key. Returns false when the key is a modifier and was skipped.
    /// Offsets earlier than the last entry are clamped so the log never goes
    /// backwards in time.
    pub fn push(&mut self, key: &str, timestamp_offset_ms: u64, cursor_position: usize) -> bool {
        if Self::is_ignored(key) {
            return false;
        }

        let floor = self.last_offset_ms().unwrap_or(0);
        self.entries.push(Keystroke {
            key: key.to_string(),
            timestamp_offset_ms: timestamp_offset_ms.max(floor),
            cursor_position,
        });
        true
    }

    pub fn last_offset_ms(&self) -> Option<u64> {
        self.entries.last().map(|k| k.timestamp_offset_ms)
    }

    pub fn entries(&self) -> &[Keystroke] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
