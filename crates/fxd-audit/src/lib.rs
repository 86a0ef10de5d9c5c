//! Append-only trade journal. Writes JSON Lines (one event per line).
//!
//! Each event carries the run id, a kind (`entry`, `exit`, `protective_exit`,
//! `risk_block`, `decision`, ...), the symbol it concerns, and a free-form
//! payload. With the hash chain enabled every event records `hash_prev` +
//! `hash_self`, so tampering with a line breaks verification of everything
//! after it. Event ids are derived deterministically from chain state,
//! payload, and a sequence counter — no RNG.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Namespace for deterministic event-id derivation.
const EVENT_ID_NAMESPACE: Uuid = Uuid::from_bytes(*b"fxd-journal-v1\0\0");

/// One journaled event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEvent {
    pub event_id: Uuid,
    pub run_id: Uuid,
    pub ts_utc: DateTime<Utc>,
    pub kind: String,
    pub symbol: String,
    pub payload: Value,
    pub hash_prev: Option<String>,
    pub hash_self: Option<String>,
}

/// Append-only journal writer.
pub struct JournalWriter {
    path: PathBuf,
    hash_chain: bool,
    last_hash: Option<String>,
    /// Monotonic sequence counter feeding event-id derivation. When resuming
    /// an existing journal, restore with [`JournalWriter::set_seq`] alongside
    /// [`JournalWriter::set_last_hash`].
    seq: u64,
}

impl JournalWriter {
    /// Create the writer and ensure parent dirs exist.
    pub fn new(path: impl AsRef<Path>, hash_chain: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create_dir_all {parent:?}"))?;
        }
        Ok(Self {
            path,
            hash_chain,
            last_hash: None,
            seq: 0,
        })
    }

    /// Set the chain tail explicitly (after reading the last line on restart).
    pub fn set_last_hash(&mut self, last_hash: Option<String>) {
        self.last_hash = last_hash;
    }

    /// Set the sequence counter when resuming (the number of events already
    /// written). Must be paired with [`JournalWriter::set_last_hash`].
    pub fn set_seq(&mut self, seq: u64) {
        self.seq = seq;
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Append one event.
    pub fn append(
        &mut self,
        run_id: Uuid,
        kind: &str,
        symbol: &str,
        payload: Value,
    ) -> Result<JournalEvent> {
        let event_id = derive_event_id(self.last_hash.as_deref(), &payload, self.seq)?;
        self.seq += 1;

        let mut ev = JournalEvent {
            event_id,
            run_id,
            ts_utc: Utc::now(),
            kind: kind.to_string(),
            symbol: symbol.to_string(),
            payload,
            hash_prev: None,
            hash_self: None,
        };

        if self.hash_chain {
            ev.hash_prev = self.last_hash.clone();
            let self_hash = compute_event_hash(&ev)?;
            ev.hash_self = Some(self_hash.clone());
            self.last_hash = Some(self_hash);
        }

        let line = canonical_json_line(&ev)?;
        append_line(&self.path, &line)?;

        Ok(ev)
    }
}

/// Deterministic event id: UUIDv5 over (chain tail, canonical payload, seq).
fn derive_event_id(last_hash: Option<&str>, payload: &Value, seq: u64) -> Result<Uuid> {
    let canonical_payload =
        serde_json::to_string(&sort_keys(payload)).context("canonicalize payload failed")?;
    let material = format!("{}|{}|{}", last_hash.unwrap_or(""), canonical_payload, seq);
    Ok(Uuid::new_v5(&EVENT_ID_NAMESPACE, material.as_bytes()))
}

/// Write a single line to the journal (with trailing newline).
fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open journal {path:?}"))?;
    f.write_all(line.as_bytes()).context("write journal line failed")?;
    f.write_all(b"\n").context("write newline failed")?;
    Ok(())
}

/// Canonicalize by sorting keys recursively and emitting compact JSON.
/// One event == one JSON line.
fn canonical_json_line<T: Serialize>(v: &T) -> Result<String> {
    let raw = serde_json::to_value(v).context("serialize journal event failed")?;
    let sorted = sort_keys(&raw);
    serde_json::to_string(&sorted).context("json stringify failed")
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}

/// Chain hash of an event, computed over its canonical JSON WITHOUT
/// `hash_self` (to avoid self-reference).
pub fn compute_event_hash(ev: &JournalEvent) -> Result<String> {
    let mut clone = ev.clone();
    clone.hash_self = None;

    let canonical = canonical_json_line(&clone)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Verify the hash-chain integrity of a journal file.
pub fn verify_hash_chain(path: impl AsRef<Path>) -> Result<VerifyResult> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("read journal {:?}", path.as_ref()))?;
    verify_hash_chain_str(&content)
}

/// Verify the hash chain of JSONL content held in memory.
pub fn verify_hash_chain_str(content: &str) -> Result<VerifyResult> {
    let mut prev_hash: Option<String> = None;
    let mut line_count = 0usize;

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let ev: JournalEvent = serde_json::from_str(trimmed)
            .with_context(|| format!("parse journal event at line {}", i + 1))?;
        line_count += 1;

        if ev.hash_prev != prev_hash {
            return Ok(VerifyResult::Broken {
                line: i + 1,
                reason: format!(
                    "hash_prev mismatch: expected {:?}, got {:?}",
                    prev_hash, ev.hash_prev
                ),
            });
        }

        if let Some(ref claimed) = ev.hash_self {
            let recomputed = compute_event_hash(&ev)?;
            if *claimed != recomputed {
                return Ok(VerifyResult::Broken {
                    line: i + 1,
                    reason: format!("hash_self mismatch: claimed {claimed}, recomputed {recomputed}"),
                });
            }
        }

        prev_hash = ev.hash_self.clone();
    }

    Ok(VerifyResult::Valid { lines: line_count })
}

/// Result of hash-chain verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Valid { lines: usize },
    Broken { line: usize, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn appends_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let mut w = JournalWriter::new(&path, false).unwrap();
        let run_id = Uuid::new_v4();

        w.append(run_id, "entry", "EURUSD", json!({"price": 1.1})).unwrap();
        w.append(run_id, "exit", "EURUSD", json!({"price": 1.2})).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert_eq!(w.seq(), 2);
    }

    #[test]
    fn event_ids_are_deterministic() {
        let a = derive_event_id(None, &json!({"b": 2, "a": 1}), 0).unwrap();
        let b = derive_event_id(None, &json!({"a": 1, "b": 2}), 0).unwrap();
        assert_eq!(a, b);

        let c = derive_event_id(None, &json!({"a": 1, "b": 2}), 1).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn hash_chain_links_and_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let mut w = JournalWriter::new(&path, true).unwrap();
        let run_id = Uuid::new_v4();

        let first = w.append(run_id, "entry", "EURUSD", json!({"n": 1})).unwrap();
        let second = w.append(run_id, "exit", "EURUSD", json!({"n": 2})).unwrap();
        assert_eq!(first.hash_prev, None);
        assert_eq!(second.hash_prev, first.hash_self);

        match verify_hash_chain(&path).unwrap() {
            VerifyResult::Valid { lines } => assert_eq!(lines, 2),
            broken => panic!("chain should verify: {broken:?}"),
        }
    }

    #[test]
    fn tampering_breaks_the_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let mut w = JournalWriter::new(&path, true).unwrap();
        let run_id = Uuid::new_v4();
        w.append(run_id, "entry", "EURUSD", json!({"n": 1})).unwrap();
        w.append(run_id, "exit", "EURUSD", json!({"n": 2})).unwrap();

        let tampered = fs::read_to_string(&path).unwrap().replace("\"n\":1", "\"n\":9");
        fs::write(&path, tampered).unwrap();

        assert!(matches!(
            verify_hash_chain(&path).unwrap(),
            VerifyResult::Broken { line: 1, .. }
        ));
    }
}
