//! Append-only JSONL activity log.

pub mod jsonl;
