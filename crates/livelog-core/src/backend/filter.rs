//! Predicate-list gate in front of another backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use super::{Backend, LiveRegion};
use crate::error::LogResult;
use crate::filter::{self, Predicate};
use crate::level::Level;

/// Forwards only the events accepted by its predicate list.
///
/// Live writes are gated like plain ones; the other live-region calls are
/// always forwarded to the base backend.
pub struct FilterBackend {
    base: Arc<dyn Backend>,
    predicates: RwLock<Vec<Predicate>>,
    allow_empty: AtomicBool,
}

impl FilterBackend {
    pub fn new(base: Arc<dyn Backend>, predicates: Vec<Predicate>) -> Self {
        Self {
            base,
            predicates: RwLock::new(predicates),
            allow_empty: AtomicBool::new(true),
        }
    }

    /// Build a filter from rule text, failing on the first malformed rule.
    pub fn from_rules<S: AsRef<str>>(base: Arc<dyn Backend>, rules: &[S]) -> LogResult<Self> {
        let predicates = rules
            .iter()
            .map(|rule| Predicate::parse(rule.as_ref()))
            .collect::<LogResult<Vec<_>>>()?;
        Ok(Self::new(base, predicates))
    }

    pub fn base(&self) -> &Arc<dyn Backend> {
        &self.base
    }

    /// Whether an empty predicate list lets everything through (the default).
    pub fn allow_empty(&self) -> bool {
        self.allow_empty.load(Ordering::Relaxed)
    }

    pub fn set_allow_empty(&self, allow: bool) {
        self.allow_empty.store(allow, Ordering::Relaxed);
    }

    pub fn predicates(&self) -> Vec<Predicate> {
        self.predicates.read().clone()
    }

    /// Append a predicate. With `distinct`, an equal predicate already in the
    /// list makes this a no-op. Returns whether the predicate was added.
    pub fn add(&self, predicate: Predicate, distinct: bool) -> bool {
        let mut predicates = self.predicates.write();
        if distinct && predicates.contains(&predicate) {
            return false;
        }
        predicates.push(predicate);
        true
    }

    /// Parse and append a rule.
    pub fn add_predicate(&self, rule: &str, distinct: bool) -> LogResult<bool> {
        Ok(self.add(Predicate::parse(rule)?, distinct))
    }

    /// Evaluate the predicate list for an event.
    pub fn test(&self, key: Option<&str>, level: Level) -> bool {
        filter::evaluate(&self.predicates.read(), key, level, self.allow_empty())
    }
}

impl Backend for FilterBackend {
    fn write(&self, key: Option<&str>, level: Level, message: &str, data: Option<&Value>) {
        if self.test(key, level) {
            self.base.write(key, level, message, data);
        }
    }

    fn write_live(
        &self,
        region: &Arc<dyn LiveRegion>,
        replace: bool,
        key: Option<&str>,
        level: Level,
        message: &str,
        data: Option<&Value>,
    ) {
        if self.test(key, level) {
            self.base.write_live(region, replace, key, level, message, data);
        }
    }

    fn create_live(&self) -> Option<Arc<dyn LiveRegion>> {
        self.base.create_live()
    }

    fn begin_live(&self, region: &Arc<dyn LiveRegion>) {
        self.base.begin_live(region);
    }

    fn end_live(&self, region: &Arc<dyn LiveRegion>) {
        self.base.end_live(region);
    }

    fn clear(&self, region: &Arc<dyn LiveRegion>) {
        self.base.clear(region);
    }
}
