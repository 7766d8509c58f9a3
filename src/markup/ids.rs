//! Element ids linking an `<img>` to its long description.
//!
//! Each render call that carries an HTML alt draws exactly one id and uses
//! it for both `aria-describedby` and the description `<div>`. Ids must
//! differ between calls on the same page; nothing else about them matters.

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random ids (`alt-` + UUID v4), unique across processes.
#[derive(Debug, Clone)]
pub struct RandomIdGenerator {
    prefix: String,
}

impl RandomIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for RandomIdGenerator {
    fn default() -> Self {
        Self::new("alt-")
    }
}

impl IdGenerator for RandomIdGenerator {
    fn next_id(&self) -> String {
        format!("{}{}", self.prefix, Uuid::new_v4().simple())
    }
}

/// Counter-based ids (`alt-1`, `alt-2`, …) for reproducible output.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new("alt-")
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}{}", self.prefix, n)
    }
}
