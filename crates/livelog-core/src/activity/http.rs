//! HTTP request activities.
//!
//! The begin line is `METHOD url running...`; the end line replaces it with
//! `METHOD url status elapsed`. Requests whose URL matches a registered
//! pattern (a polling endpoint, say) share one live area per key instead of
//! each printing its own pair of lines.

use std::borrow::Cow;
use std::time::Duration;

use colored::Colorize;

use super::tracker::{ActivityKind, ActivityTracker, Tracked};
use crate::live::LiveLogger;
use crate::logger::{Log, Logger};

/// One HTTP request. `status` is set once the response is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpActivity {
    pub method: String,
    pub url: String,
    pub status: Option<u16>,
}

impl HttpActivity {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            status: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_some_and(|status| (200..300).contains(&status))
    }
}

/// [`ActivityKind`] for HTTP requests, keyed on the request URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpRequests;

pub type HttpRequestTracker = ActivityTracker<HttpRequests>;

impl ActivityKind for HttpRequests {
    type Activity = HttpActivity;

    fn shape<'a>(&self, activity: &'a HttpActivity) -> Cow<'a, str> {
        Cow::Borrowed(&activity.url)
    }

    fn render_begin(&self, live: &LiveLogger, activity: &HttpActivity) {
        live.info(&format!(
            "{} {} {}",
            activity.method.to_uppercase().bold(),
            activity.url,
            "running...".bright_black()
        ));
    }

    fn render_end(&self, live: &LiveLogger, activity: &HttpActivity, elapsed: Duration) {
        let status = match activity.status {
            Some(code) => code.to_string(),
            None => "---".to_string(),
        };
        let status = if activity.is_success() {
            status.green()
        } else {
            status.red()
        };

        live.info(&format!(
            "{} {} {} {}",
            activity.method.to_uppercase().bold(),
            activity.url,
            status,
            humanize(elapsed).bright_black()
        ));
    }
}

impl ActivityTracker<HttpRequests> {
    pub fn http(logger: Logger) -> Self {
        Self::new(HttpRequests, logger)
    }

    pub fn begin_request(&self, method: &str, url: &str) -> Tracked<HttpActivity> {
        self.begin(HttpActivity::new(method, url))
    }

    /// Record the response status and end the request.
    pub fn finish_request(&self, mut tracked: Tracked<HttpActivity>, status: u16) -> HttpActivity {
        tracked.activity_mut().status = Some(status);
        self.end(tracked)
    }
}

/// Short human-readable duration: `850µs`, `12ms`, `1.5s`, `2m 5s`.
pub fn humanize(elapsed: Duration) -> String {
    let micros = elapsed.as_micros();
    if micros < 1_000 {
        format!("{micros}µs")
    } else if micros < 1_000_000 {
        format!("{}ms", elapsed.as_millis())
    } else if elapsed.as_secs() < 60 {
        format!("{:.1}s", elapsed.as_secs_f64())
    } else {
        let secs = elapsed.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
