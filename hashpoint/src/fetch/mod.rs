//! Index value fetching across an ordered list of mirror endpoints.
//!
//! The daily index value is published on several mirrors; the fetcher
//! walks them in order until one answers with a parseable value. Each
//! attempt is bounded by the HTTP client's hard timeout. Outcomes are
//! typed, and a mirror's explicit "no such resource" (the value is not
//! posted yet) is remembered separately from server trouble: if every
//! mirror fails, an observed 404 outranks server errors in the final
//! verdict, because it is an authoritative statement that the day's value
//! does not exist yet.

mod http;

pub use http::{HttpClient, HttpError, HttpResponse, ReqwestClient, DEFAULT_TIMEOUT_SECS};

#[cfg(test)]
pub use http::tests::MockHttpClient;

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

/// The default mirror endpoints, tried in order. `%Y`, `%m` and `%d` are
/// replaced with the four-digit year and zero-padded month and day.
pub const DEFAULT_MIRRORS: [&str; 2] = [
    "http://irc.peeron.com/xkcd/map/data/%Y/%m/%d",
    "http://geo.crox.net/djia/%Y/%m/%d",
];

/// Lifecycle of a fetch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// No fetch has been run yet.
    Idle,
    /// A fetch is in flight.
    Busy,
    /// The last fetch produced a value.
    AllOkay,
    /// The last fetch found the value not posted yet.
    ErrorNotPosted,
    /// The last fetch failed against every mirror.
    ErrorServer,
}

/// Terminal failure of a fetch across all mirrors.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FetchError {
    /// At least one mirror stated the value is not posted yet.
    #[error("index value not posted yet")]
    NotPosted,

    /// Every mirror failed without an authoritative "not posted".
    #[error("all mirrors failed")]
    Server,
}

/// Fetches daily index values from an ordered mirror list.
///
/// Blocking: a call to [`fetch`] holds its caller until a terminal
/// outcome, so it must run on a worker context that may block.
///
/// [`fetch`]: IndexFetcher::fetch
pub struct IndexFetcher {
    mirrors: Vec<String>,
    client: Arc<dyn HttpClient>,
    status: Mutex<FetchStatus>,
}

impl IndexFetcher {
    /// Creates a fetcher over the given mirror templates. The caller is
    /// responsible for handing in at least one mirror (see
    /// `EngineConfig::validate`).
    pub fn new(mirrors: Vec<String>, client: Arc<dyn HttpClient>) -> Self {
        Self {
            mirrors,
            client,
            status: Mutex::new(FetchStatus::Idle),
        }
    }

    /// The state the most recent fetch left behind.
    pub fn status(&self) -> FetchStatus {
        *self.status.lock()
    }

    /// Fetches the index value for an effective date.
    ///
    /// Walks the mirrors in order; the first parseable value wins. A 404
    /// marks the value as not posted but later mirrors are still probed,
    /// since mirrors can lag each other in either direction.
    pub fn fetch(&self, effective_date: NaiveDate) -> Result<String, FetchError> {
        *self.status.lock() = FetchStatus::Busy;

        let mut not_posted_seen = false;

        for mirror in &self.mirrors {
            let url = mirror_url(mirror, effective_date);
            debug!(url = %url, "trying mirror");

            let response = match self.client.get(&url) {
                Ok(response) => response,
                Err(e) => {
                    debug!(url = %url, error = %e, "mirror unreachable");
                    continue;
                }
            };

            match response.status {
                404 => {
                    // An authoritative miss: the mirror knows the value is
                    // not there. The next mirror may still have it.
                    debug!(url = %url, "mirror reports value not posted");
                    not_posted_seen = true;
                    continue;
                }
                200 => {}
                status => {
                    debug!(url = %url, status, "mirror returned unexpected status");
                    continue;
                }
            }

            let body = match String::from_utf8(response.body) {
                Ok(body) => body,
                Err(_) => {
                    debug!(url = %url, "mirror body is not text");
                    continue;
                }
            };

            let value = body.trim();
            if value.parse::<f64>().is_err() {
                debug!(url = %url, "mirror body is not a numeric index value");
                continue;
            }

            debug!(url = %url, value = %value, "index value fetched");
            *self.status.lock() = FetchStatus::AllOkay;
            return Ok(value.to_string());
        }

        if not_posted_seen {
            *self.status.lock() = FetchStatus::ErrorNotPosted;
            Err(FetchError::NotPosted)
        } else {
            warn!(date = %effective_date, "all mirrors failed");
            *self.status.lock() = FetchStatus::ErrorServer;
            Err(FetchError::Server)
        }
    }
}

/// Substitutes the date into a mirror URL template.
fn mirror_url(template: &str, date: NaiveDate) -> String {
    template
        .replace("%Y", &format!("{:04}", date.year()))
        .replace("%m", &format!("{:02}", date.month()))
        .replace("%d", &format!("{:02}", date.day()))
}
