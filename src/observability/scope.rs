//! Begin/complete logging around a multi-step operation
//!
//! - `{NAME}_BEGIN` on creation
//! - `{NAME}_COMPLETE` with `elapsed_ms` on `complete`
//! - `{NAME}_FAILED` at ERROR on `fail`
//! - `{NAME}_INCOMPLETE` at WARN if dropped without either

use std::time::Instant;

use super::logger::Logger;

pub struct ObservationScope {
    name: String,
    fields: Vec<(String, String)>,
    started: Instant,
    finished: bool,
}

impl ObservationScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_fields(name, &[])
    }

    /// Creates a scope whose fields are repeated on every line it logs.
    pub fn with_fields(name: impl Into<String>, fields: &[(&str, &str)]) -> Self {
        let scope = Self {
            name: name.into(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            started: Instant::now(),
            finished: false,
        };
        Logger::info(&format!("{}_BEGIN", scope.name), &scope.field_refs(&[]));
        scope
    }

    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    pub fn complete_with_fields(mut self, extra: &[(&str, &str)]) {
        self.finished = true;
        let elapsed = self.elapsed_ms().to_string();
        let mut fields = self.field_refs(extra);
        fields.push(("elapsed_ms", &elapsed));
        Logger::info(&format!("{}_COMPLETE", self.name), &fields);
    }

    pub fn fail(mut self, reason: &str) {
        self.finished = true;
        let mut fields = self.field_refs(&[]);
        fields.push(("reason", reason));
        Logger::error(&format!("{}_FAILED", self.name), &fields);
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }

    fn field_refs<'a>(&'a self, extra: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
        self.fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(extra.iter().copied())
            .collect()
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.finished {
            let mut fields = self.field_refs(&[]);
            fields.push(("reason", "scope dropped without completion"));
            Logger::warn(&format!("{}_INCOMPLETE", self.name), &fields);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_complete() {
        let scope = ObservationScope::with_fields("TEST", &[("topic", "orders")]);
        scope.complete_with_fields(&[("entries", "3")]);
    }

    #[test]
    fn test_scope_fail() {
        let scope = ObservationScope::new("TEST");
        scope.fail("disk unavailable");
    }

    #[test]
    fn test_scope_tracks_elapsed() {
        let scope = ObservationScope::new("TEST");
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(scope.elapsed_ms() >= 5);
        scope.complete();
    }

    #[test]
    fn test_scope_drop_without_finish_does_not_panic() {
        let scope = ObservationScope::new("TEST");
        drop(scope);
    }
}
