//! Per-task stage timings, reported through `tracing`.

use std::time::{Duration, Instant};

use tabfuse_core::id::TaskId;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageTimings {
    /// Loading and filtering every source.
    pub fetch: Duration,
    pub merge: Duration,
    pub persist: Duration,
}

impl StageTimings {
    pub fn total(&self) -> Duration {
        self.fetch + self.merge + self.persist
    }

    pub fn emit(&self, task_id: TaskId) {
        tracing::info!(
            task_id = %task_id,
            fetch_ms = self.fetch.as_millis() as u64,
            merge_ms = self.merge.as_millis() as u64,
            persist_ms = self.persist.as_millis() as u64,
            total_ms = self.total().as_millis() as u64,
            "stage timings"
        );
    }
}

/// Times a closure and adds the elapsed time to `slot`.
pub fn timed<T>(slot: &mut Duration, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    *slot += start.elapsed();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_accumulates() {
        let mut t = StageTimings::default();
        let v = timed(&mut t.merge, || 7);
        assert_eq!(v, 7);
        timed(&mut t.merge, || ());
        assert_eq!(t.total(), t.merge);
    }
}
