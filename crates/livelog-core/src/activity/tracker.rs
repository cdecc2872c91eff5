use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use tokio::time::Instant;

use super::pool::{Keyer, PatternDescriptor, PatternPool};
use crate::error::LogResult;
use crate::live::LiveLogger;
use crate::logger::Logger;

/// How one kind of activity is keyed and rendered.
pub trait ActivityKind: Send + Sync {
    type Activity: Send + 'static;

    /// Text matched against the registered high-frequency patterns.
    fn shape<'a>(&self, activity: &'a Self::Activity) -> Cow<'a, str>;

    fn render_begin(&self, live: &LiveLogger, activity: &Self::Activity);

    fn render_end(&self, live: &LiveLogger, activity: &Self::Activity, elapsed: Duration);
}

/// Predicate selecting activities that are not tracked at all.
pub type SkipFn<A> = Box<dyn Fn(&A) -> bool + Send + Sync>;

/// An activity between [`ActivityTracker::begin`] and [`ActivityTracker::end`].
pub struct Tracked<A> {
    activity: A,
    live: Option<LiveLogger>,
    pooled: Option<(Arc<PatternDescriptor>, String)>,
    started: Instant,
}

impl<A> Tracked<A> {
    pub fn activity(&self) -> &A {
        &self.activity
    }

    pub fn activity_mut(&mut self) -> &mut A {
        &mut self.activity
    }

    /// Whether the activity was skipped at begin.
    pub fn is_skipped(&self) -> bool {
        self.live.is_none()
    }

    /// Logger for the activity's area; `None` when skipped.
    pub fn live(&self) -> Option<&LiveLogger> {
        self.live.as_ref()
    }

    /// Key of the pooled area holding this activity, if any.
    pub fn pool_key(&self) -> Option<&str> {
        self.pooled.as_ref().map(|(_, key)| key.as_str())
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn into_inner(self) -> A {
        self.activity
    }
}

/// Drives the begin/end lifecycle of activities of kind `K`.
///
/// Activities matching a registered pattern share a pooled live area per key;
/// all others get a live area of their own, closed at `end`.
///
/// Idle pooled areas are reclaimed by a timer on the current Tokio runtime.
/// Outside a runtime no timer can be armed, so an area is closed as soon as
/// its last activity ends: only overlapping activities share it, and the
/// next matching activity starts a new area.
pub struct ActivityTracker<K: ActivityKind> {
    kind: K,
    logger: Logger,
    pool: PatternPool,
    skip: Option<SkipFn<K::Activity>>,
}

impl<K: ActivityKind> ActivityTracker<K> {
    pub fn new(kind: K, logger: Logger) -> Self {
        Self {
            kind,
            logger,
            pool: PatternPool::new(),
            skip: None,
        }
    }

    /// Never track activities for which `skip` returns true.
    pub fn with_skip<F>(mut self, skip: F) -> Self
    where
        F: Fn(&K::Activity) -> bool + Send + Sync + 'static,
    {
        self.skip = Some(Box::new(skip));
        self
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn pool(&self) -> &PatternPool {
        &self.pool
    }

    /// Compile `pattern` and register it as a high-frequency pattern.
    pub fn register_pattern(
        &self,
        pattern: &str,
        keyer: Option<Keyer>,
        max_idle: Option<Duration>,
    ) -> LogResult<Arc<PatternDescriptor>> {
        let matcher = Regex::new(pattern)?;
        Ok(self.pool.register(matcher, keyer, max_idle))
    }

    pub fn begin(&self, activity: K::Activity) -> Tracked<K::Activity> {
        let started = Instant::now();

        if self.skip.as_ref().is_some_and(|skip| skip(&activity)) {
            return Tracked {
                activity,
                live: None,
                pooled: None,
                started,
            };
        }

        let pooled = {
            let shape = self.kind.shape(&activity);
            self.pool
                .find_match(&shape)
                .and_then(|descriptor| descriptor.key_for(&shape).map(|key| (descriptor, key)))
        };

        let live = match &pooled {
            Some((descriptor, key)) => self.pool.acquire(descriptor, key, || self.logger.live()),
            None => self.logger.live(),
        };

        self.kind.render_begin(&live, &activity);

        Tracked {
            activity,
            live: Some(live),
            pooled,
            started,
        }
    }

    /// Render the end of the activity and give up its area. Returns the
    /// activity. Skipped activities are returned untouched.
    pub fn end(&self, tracked: Tracked<K::Activity>) -> K::Activity {
        let Tracked {
            activity,
            live,
            pooled,
            started,
        } = tracked;

        let Some(live) = live else {
            return activity;
        };

        self.kind.render_end(&live, &activity, started.elapsed());

        match pooled {
            Some((descriptor, key)) => self.pool.release(&descriptor, &key),
            None => live.close(),
        }
        activity
    }
}
