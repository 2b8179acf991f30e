//! Ordered "first working candidate" evaluation.
//!
//! Each candidate is a label plus an attempt. Attempts run in order; the first
//! `Ok(Some(_))` wins. Misses and failures are logged with their label.

use anyhow::Result;

pub struct Candidate<'a, T> {
    label: String,
    attempt: Box<dyn FnOnce() -> Result<Option<T>> + 'a>,
}

impl<'a, T> Candidate<'a, T> {
    pub fn new(label: impl Into<String>, attempt: impl FnOnce() -> Result<Option<T>> + 'a) -> Self {
        Self {
            label: label.into(),
            attempt: Box::new(attempt),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Run `candidates` in order and return the first value produced, with its label.
pub fn first_match<'a, T>(
    candidates: impl IntoIterator<Item = Candidate<'a, T>>,
) -> Option<(String, T)> {
    for candidate in candidates {
        let Candidate { label, attempt } = candidate;
        match attempt() {
            Ok(Some(value)) => {
                tracing::debug!(candidate = %label, "candidate matched");
                return Some((label, value));
            }
            Ok(None) => tracing::debug!(candidate = %label, "candidate did not match"),
            Err(e) => tracing::debug!(candidate = %label, "candidate failed: {:#}", e),
        }
    }
    None
}
