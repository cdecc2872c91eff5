//! Pooled live areas for high-frequency activities.
//!
//! Activities whose shape matches a registered pattern share one live area per
//! derived key instead of each getting a fresh region. An area stays alive
//! while any activity holds it; once the last holder releases it, an idle
//! timer is armed and the area is closed only if nobody reacquires it before
//! the timer fires.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  PatternPool                                                  │
//! │  ├── patterns: Vec<Arc<PatternDescriptor>>  (first match wins)│
//! │  │   ├── matcher: Regex                                       │
//! │  │   ├── keyer: Option<Keyer>                                 │
//! │  │   └── areas: HashMap<key, PooledArea>                      │
//! │  │       ├── live: LiveLogger                                 │
//! │  │       ├── ref_count                                        │
//! │  │       └── pending: Option<PendingEviction>                 │
//! │  └── default_max_idle                                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Eviction
//!
//! Every armed timer carries a fresh id. When a timer fires it re-checks,
//! under the area table lock, that the area still exists, is unheld, and is
//! still waiting on that same id; any reacquire in between cancels the timer
//! and clears the id, so a stale timer can never close an area in use.
//!
//! Timers run as tokio tasks. Without a runtime, an area is evicted as soon as
//! it becomes unheld.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use regex::{Captures, Regex};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::live::LiveLogger;

/// Idle time before an unheld pooled area is closed, unless overridden.
pub const DEFAULT_MAX_IDLE: Duration = Duration::from_secs(60);

/// Derives a pool key from a pattern's captures.
pub type Keyer = Arc<dyn Fn(&Captures<'_>) -> String + Send + Sync>;

struct PendingEviction {
    id: u64,
    task: Option<JoinHandle<()>>,
}

impl PendingEviction {
    fn cancel(self) {
        if let Some(task) = self.task {
            task.abort();
        }
    }
}

struct PooledArea {
    live: LiveLogger,
    ref_count: usize,
    pending: Option<PendingEviction>,
}

/// A registered high-frequency pattern and the areas pooled under it.
pub struct PatternDescriptor {
    matcher: Regex,
    keyer: Option<Keyer>,
    max_idle: Option<Duration>,
    areas: Mutex<HashMap<String, PooledArea>>,
}

impl PatternDescriptor {
    pub fn new(matcher: Regex, keyer: Option<Keyer>, max_idle: Option<Duration>) -> Self {
        Self {
            matcher,
            keyer,
            max_idle,
            areas: Mutex::new(HashMap::new()),
        }
    }

    pub fn matcher(&self) -> &Regex {
        &self.matcher
    }

    pub fn max_idle(&self) -> Option<Duration> {
        self.max_idle
    }

    pub fn is_match(&self, shape: &str) -> bool {
        self.matcher.is_match(shape)
    }

    /// Pool key for `shape`, or `None` if `shape` does not match.
    ///
    /// Without a keyer the key is the first capture group when it captured
    /// some text, else the whole match.
    pub fn key_for(&self, shape: &str) -> Option<String> {
        let captures = self.matcher.captures(shape)?;
        Some(match &self.keyer {
            Some(keyer) => keyer(&captures),
            None => captures
                .get(1)
                .filter(|group| !group.as_str().is_empty())
                .unwrap_or_else(|| captures.get_match())
                .as_str()
                .to_string(),
        })
    }

    pub fn area_count(&self) -> usize {
        self.areas.lock().len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.areas.lock().contains_key(key)
    }

    /// Current holders of the area at `key`.
    pub fn ref_count(&self, key: &str) -> Option<usize> {
        self.areas.lock().get(key).map(|area| area.ref_count)
    }

    /// Whether the area at `key` is waiting on an idle timer.
    pub fn is_pending_eviction(&self, key: &str) -> bool {
        self.areas
            .lock()
            .get(key)
            .is_some_and(|area| area.pending.is_some())
    }

    /// Remove and close the area at `key` if timer `id` is still the current
    /// one and the area is unheld.
    fn evict_if_idle(&self, key: &str, id: u64) {
        let evicted = {
            let mut areas = self.areas.lock();
            let idle = areas.get(key).is_some_and(|area| {
                area.ref_count == 0 && area.pending.as_ref().is_some_and(|p| p.id == id)
            });
            if idle {
                areas.remove(key)
            } else {
                None
            }
        };

        match evicted {
            Some(area) => {
                debug!(%key, "Evicting idle pooled area");
                area.live.close();
            }
            None => trace!(%key, id, "Stale eviction timer ignored"),
        }
    }
}

impl fmt::Debug for PatternDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternDescriptor")
            .field("matcher", &self.matcher.as_str())
            .field("keyed", &self.keyer.is_some())
            .field("max_idle", &self.max_idle)
            .field("areas", &self.area_count())
            .finish()
    }
}

/// Registry of high-frequency patterns.
pub struct PatternPool {
    patterns: RwLock<Vec<Arc<PatternDescriptor>>>,
    default_max_idle: Mutex<Duration>,
    next_timer: AtomicU64,
}

impl PatternPool {
    pub fn new() -> Self {
        Self::with_default_max_idle(DEFAULT_MAX_IDLE)
    }

    pub fn with_default_max_idle(max_idle: Duration) -> Self {
        Self {
            patterns: RwLock::new(Vec::new()),
            default_max_idle: Mutex::new(max_idle),
            next_timer: AtomicU64::new(0),
        }
    }

    pub fn default_max_idle(&self) -> Duration {
        *self.default_max_idle.lock()
    }

    /// Change the idle time used by patterns without their own override.
    /// Takes effect for timers armed afterwards.
    pub fn set_default_max_idle(&self, max_idle: Duration) {
        *self.default_max_idle.lock() = max_idle;
    }

    /// Register a pattern. Patterns are tried in registration order.
    pub fn register(
        &self,
        matcher: Regex,
        keyer: Option<Keyer>,
        max_idle: Option<Duration>,
    ) -> Arc<PatternDescriptor> {
        debug!(pattern = %matcher, ?max_idle, "Registering high-frequency pattern");
        let descriptor = Arc::new(PatternDescriptor::new(matcher, keyer, max_idle));
        self.patterns.write().push(Arc::clone(&descriptor));
        descriptor
    }

    pub fn len(&self) -> usize {
        self.patterns.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.read().is_empty()
    }

    /// First registered pattern matching `shape`.
    pub fn find_match(&self, shape: &str) -> Option<Arc<PatternDescriptor>> {
        self.patterns
            .read()
            .iter()
            .find(|descriptor| descriptor.is_match(shape))
            .cloned()
    }

    /// Take a hold on the area at `key`, creating it with `create` if absent.
    ///
    /// Reacquiring an area that is waiting on its idle timer cancels the
    /// timer and hands back the same live logger.
    pub fn acquire(
        &self,
        descriptor: &PatternDescriptor,
        key: &str,
        create: impl FnOnce() -> LiveLogger,
    ) -> LiveLogger {
        let mut areas = descriptor.areas.lock();

        if let Some(area) = areas.get_mut(key) {
            area.ref_count += 1;
            if let Some(pending) = area.pending.take() {
                debug!(%key, "Reusing pooled area before eviction");
                pending.cancel();
            }
            return area.live.clone();
        }

        debug!(%key, "Creating pooled area");
        let live = create();
        areas.insert(
            key.to_string(),
            PooledArea {
                live: live.clone(),
                ref_count: 1,
                pending: None,
            },
        );
        live
    }

    /// Drop a hold on the area at `key`. When the last hold goes away, the
    /// area's idle timer is armed.
    pub fn release(&self, descriptor: &Arc<PatternDescriptor>, key: &str) {
        let idle = descriptor.max_idle.unwrap_or_else(|| self.default_max_idle());
        let mut areas = descriptor.areas.lock();

        let Some(area) = areas.get_mut(key) else {
            trace!(%key, "Release of unknown pooled area ignored");
            return;
        };
        if area.ref_count == 0 {
            return;
        }

        area.ref_count -= 1;
        if area.ref_count > 0 {
            return;
        }

        if let Some(pending) = area.pending.take() {
            pending.cancel();
        }
        let id = self.next_timer.fetch_add(1, Ordering::Relaxed);

        match Handle::try_current() {
            Ok(handle) => {
                let owner = Arc::clone(descriptor);
                let owned_key = key.to_string();
                let task = handle.spawn(async move {
                    tokio::time::sleep(idle).await;
                    owner.evict_if_idle(&owned_key, id);
                });
                area.pending = Some(PendingEviction {
                    id,
                    task: Some(task),
                });
                debug!(%key, ?idle, "Pooled area idle, eviction armed");
            }
            Err(_) => {
                area.pending = Some(PendingEviction { id, task: None });
                drop(areas);
                descriptor.evict_if_idle(key, id);
            }
        }
    }
}

impl Default for PatternPool {
    fn default() -> Self {
        Self::new()
    }
}
