use crate::activity::{ActivityRecord, GraphMode};
use reqwest::{blocking::Client, Url};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

pub(crate) static DEFAULT_ENDPOINT: &str = "https://leetcode-sub-endpoint.vercel.app";

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Username value that is treated as "no username given"
static PLACEHOLDER_USERNAME: &str = "string";

/// Something that can look up a user's daily submission counts
pub(crate) trait SubmissionSource: Send + Sync + 'static {
    fn fetch(&self, username: &str) -> Result<Vec<ActivityRecord>, FetchError>;
}

#[derive(Debug, Error)]
pub(crate) enum FetchError {
    #[error("invalid endpoint URL {url:?}: {reason}")]
    Endpoint { url: String, reason: String },
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} returned {status}")]
    Status {
        url: Url,
        status: reqwest::StatusCode,
    },
}

impl FetchError {
    /// Renders the error and its chain of causes on one line
    pub(crate) fn into_message(self) -> String {
        format!("{:#}", anyhow::Error::new(self))
    }
}

/// Fetches submission calendars from `{endpoint}/leetcode/{username}`
#[derive(Clone, Debug)]
pub(crate) struct HttpSource {
    client: Client,
    endpoint: Url,
}

impl HttpSource {
    pub(crate) fn new(endpoint: &str, timeout: Duration) -> Result<HttpSource, FetchError> {
        let endpoint = Url::parse(endpoint).map_err(|e| FetchError::Endpoint {
            url: endpoint.to_owned(),
            reason: e.to_string(),
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(FetchError::Endpoint {
                url: endpoint.to_string(),
                reason: String::from("URL cannot be a base"),
            });
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(FetchError::Client)?;
        Ok(HttpSource { client, endpoint })
    }

    pub(crate) fn user_url(&self, username: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("leetcode").push(username);
        }
        url
    }
}

impl SubmissionSource for HttpSource {
    fn fetch(&self, username: &str) -> Result<Vec<ActivityRecord>, FetchError> {
        let url = self.user_url(username);
        debug!(%url, "fetching submission calendar");
        let response = match self.client.get(url.clone()).send() {
            Ok(r) => r,
            Err(source) => return Err(FetchError::Transport { url, source }),
        };
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url, status });
        }
        match response.text() {
            Ok(body) => Ok(parse_submissions(&body)),
            Err(source) => Err(FetchError::Transport { url, source }),
        }
    }
}

/// Converts a response body of the form `{"YYYY-MM-DD": count, ...}` into
/// records, keeping the body's key order.
///
/// Bodies that are not JSON objects yield no records, and entries whose value
/// is not a non-negative integer are skipped; both are logged, not reported.
pub(crate) fn parse_submissions(body: &str) -> Vec<ActivityRecord> {
    let value = match serde_json::from_str::<Value>(body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "submission response is not JSON; treating as empty");
            return Vec::new();
        }
    };
    let map = match value {
        Value::Object(map) => map,
        other => {
            warn!(response = %other, "unexpected submission response format; treating as empty");
            return Vec::new();
        }
    };
    map.into_iter()
        .filter_map(|(date, count)| {
            if let Some(n) = count.as_u64() {
                Some(ActivityRecord::new(date, n))
            } else {
                warn!(date = %date, value = %count, "skipping day with non-integer submission count");
                None
            }
        })
        .collect()
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) struct QueryKey {
    pub(crate) username: String,
    pub(crate) graph: GraphMode,
}

impl QueryKey {
    pub(crate) fn new<S: Into<String>>(username: S, graph: GraphMode) -> QueryKey {
        QueryKey {
            username: username.into(),
            graph,
        }
    }

    // Only the empty string and the exact placeholder count as "no
    // username"; anything else is sent as given.
    fn has_username(&self) -> bool {
        !self.username.is_empty() && self.username != PLACEHOLDER_USERNAME
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum QueryState {
    Loading,
    Failed(String),
    Ready(Vec<ActivityRecord>),
}

type FetchResult = Result<Vec<ActivityRecord>, FetchError>;

#[derive(Debug)]
struct Entry {
    state: QueryState,
    fetched_at: Option<Instant>,
    pending: Option<Receiver<FetchResult>>,
}

/// Runs fetches off of the UI thread and remembers their results.
///
/// Requests are keyed on `(username, graph)`; while a request for a key is in
/// flight, further requests for it are not dispatched.  A result older than
/// `stale_after` is refetched the next time its key is mounted; with the
/// default of zero, every mount refetches.
#[derive(Debug)]
pub(crate) struct FetchCache<S> {
    source: Arc<S>,
    stale_after: Duration,
    entries: HashMap<QueryKey, Entry>,
}

impl<S: SubmissionSource> FetchCache<S> {
    pub(crate) fn new(source: S) -> FetchCache<S> {
        FetchCache {
            source: Arc::new(source),
            stale_after: Duration::ZERO,
            entries: HashMap::new(),
        }
    }

    pub(crate) fn stale_after(mut self, stale_after: Duration) -> FetchCache<S> {
        self.stale_after = stale_after;
        self
    }

    /// Called when a view of `key` appears.  Starts a fetch unless one is
    /// already running or the last result is still fresh.
    pub(crate) fn mount(&mut self, key: &QueryKey) {
        if let Some(entry) = self.entries.get(key) {
            if entry.pending.is_some() {
                debug!(username = %key.username, graph = %key.graph, "fetch already in flight");
                return;
            }
            if entry
                .fetched_at
                .is_some_and(|t| t.elapsed() < self.stale_after)
            {
                return;
            }
        }
        self.dispatch(key);
    }

    /// Starts a fetch for `key` regardless of freshness, unless one is
    /// already running
    pub(crate) fn refetch(&mut self, key: &QueryKey) {
        if self.entries.get(key).is_some_and(|e| e.pending.is_some()) {
            return;
        }
        self.dispatch(key);
    }

    fn dispatch(&mut self, key: &QueryKey) {
        if !key.has_username() {
            info!(username = %key.username, "invalid or missing username; nothing to fetch");
            self.entries.insert(
                key.clone(),
                Entry {
                    state: QueryState::Ready(Vec::new()),
                    fetched_at: Some(Instant::now()),
                    pending: None,
                },
            );
            return;
        }
        debug!(username = %key.username, graph = %key.graph, "dispatching fetch");
        let (sender, receiver) = channel();
        let source = Arc::clone(&self.source);
        let username = key.username.clone();
        let spawned = thread::Builder::new()
            .name(String::from("fetch"))
            .spawn(move || {
                // The receiver is gone if the cache was dropped first.
                let _ = sender.send(source.fetch(&username));
            });
        let entry = self.entries.entry(key.clone()).or_insert(Entry {
            state: QueryState::Loading,
            fetched_at: None,
            pending: None,
        });
        match spawned {
            Ok(_) => entry.pending = Some(receiver),
            Err(e) => {
                warn!(error = %e, "failed to spawn fetch thread");
                entry.state = QueryState::Failed(format!("failed to start fetch: {e}"));
                entry.fetched_at = Some(Instant::now());
            }
        }
    }

    /// Collects the results of any finished fetches.  Returns `true` if any
    /// state changed.
    pub(crate) fn poll(&mut self) -> bool {
        let mut changed = false;
        for (key, entry) in &mut self.entries {
            let Some(receiver) = entry.pending.as_ref() else {
                continue;
            };
            let outcome = match receiver.try_recv() {
                Ok(r) => r.map_err(FetchError::into_message),
                Err(TryRecvError::Empty) => continue,
                Err(TryRecvError::Disconnected) => {
                    Err(String::from("fetch thread exited without a result"))
                }
            };
            entry.state = match outcome {
                Ok(records) => {
                    debug!(username = %key.username, days = records.len(), "fetch finished");
                    QueryState::Ready(records)
                }
                Err(msg) => {
                    warn!(username = %key.username, error = %msg, "fetch failed");
                    QueryState::Failed(msg)
                }
            };
            entry.fetched_at = Some(Instant::now());
            entry.pending = None;
            changed = true;
        }
        changed
    }

    pub(crate) fn state(&self, key: &QueryKey) -> Option<&QueryState> {
        self.entries.get(key).map(|e| &e.state)
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.entries.values().any(|e| e.pending.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread::JoinHandle;

    #[derive(Debug, Default)]
    struct CountingSource {
        calls: Arc<AtomicUsize>,
    }

    impl SubmissionSource for CountingSource {
        fn fetch(&self, username: &str) -> Result<Vec<ActivityRecord>, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(vec![
                ActivityRecord::new(format!("2023-06-{n:02}"), 3),
                ActivityRecord::new(format!("{username}-marker"), 0),
            ])
        }
    }

    #[derive(Debug)]
    struct FailingSource;

    impl SubmissionSource for FailingSource {
        fn fetch(&self, _username: &str) -> Result<Vec<ActivityRecord>, FetchError> {
            Err(FetchError::Endpoint {
                url: String::from("nowhere"),
                reason: String::from("connection refused"),
            })
        }
    }

    /// Answers a single HTTP request on a local port with `response`.  The
    /// thread yields the request line it received.
    fn serve_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
            }
            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            request_line.trim_end().to_owned()
        });
        (endpoint, handle)
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn settle<S: SubmissionSource>(cache: &mut FetchCache<S>) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while cache.is_pending() && Instant::now() < deadline {
            cache.poll();
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!cache.is_pending(), "fetch did not finish in time");
    }

    #[test]
    fn test_parse_submissions() {
        let records =
            parse_submissions(r#"{"2023-06-03": 2, "2023-06-01": 0, "2023-05-30": 11}"#);
        assert_eq!(
            records,
            [
                ActivityRecord::new("2023-06-03", 2),
                ActivityRecord::new("2023-06-01", 0),
                ActivityRecord::new("2023-05-30", 11),
            ]
        );
        assert_eq!(records[2].level, 4);
    }

    #[test]
    fn test_parse_malformed() {
        assert_eq!(parse_submissions("[1, 2, 3]"), []);
        assert_eq!(parse_submissions("null"), []);
        assert_eq!(parse_submissions("\"oops\""), []);
        assert_eq!(parse_submissions("<html>"), []);
        assert_eq!(parse_submissions(""), []);
    }

    #[test]
    fn test_parse_skips_bad_counts() {
        let records = parse_submissions(
            r#"{"2023-06-01": 1, "2023-06-02": -3, "2023-06-03": "4", "2023-06-04": 2.5, "2023-06-05": 5}"#,
        );
        assert_eq!(
            records,
            [
                ActivityRecord::new("2023-06-01", 1),
                ActivityRecord::new("2023-06-05", 5),
            ]
        );
    }

    #[test]
    fn test_user_url() {
        let source = HttpSource::new("https://example.com/api/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(
            source.user_url("some user").as_str(),
            "https://example.com/api/leetcode/some%20user"
        );
        let source = HttpSource::new(DEFAULT_ENDPOINT, DEFAULT_TIMEOUT).unwrap();
        assert_eq!(
            source.user_url("alice").as_str(),
            "https://leetcode-sub-endpoint.vercel.app/leetcode/alice"
        );
    }

    #[test]
    fn test_bad_endpoint() {
        assert!(matches!(
            HttpSource::new("not a url", DEFAULT_TIMEOUT),
            Err(FetchError::Endpoint { .. })
        ));
        assert!(matches!(
            HttpSource::new("mailto:someone@example.com", DEFAULT_TIMEOUT),
            Err(FetchError::Endpoint { .. })
        ));
    }

    #[test]
    fn test_empty_username_short_circuits() {
        let source = CountingSource::default();
        let calls = Arc::clone(&source.calls);
        let mut cache = FetchCache::new(source);
        for username in ["", "string"] {
            let key = QueryKey::new(username, GraphMode::Yearly);
            cache.mount(&key);
            assert!(!cache.is_pending());
            assert_eq!(cache.state(&key), Some(&QueryState::Ready(Vec::new())));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fetch_and_dedupe() {
        let source = CountingSource::default();
        let calls = Arc::clone(&source.calls);
        let mut cache = FetchCache::new(source);
        let key = QueryKey::new("alice", GraphMode::Default);
        assert_eq!(cache.state(&key), None);
        cache.mount(&key);
        cache.mount(&key);
        cache.refetch(&key);
        assert!(cache.is_pending());
        assert!(matches!(
            cache.state(&key),
            Some(QueryState::Loading | QueryState::Ready(_))
        ));
        settle(&mut cache);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            cache.state(&key),
            Some(&QueryState::Ready(vec![
                ActivityRecord::new("2023-06-01", 3),
                ActivityRecord::new("alice-marker", 0),
            ]))
        );
    }

    #[test]
    fn test_distinct_keys_fetch_separately() {
        let source = CountingSource::default();
        let calls = Arc::clone(&source.calls);
        let mut cache = FetchCache::new(source);
        cache.mount(&QueryKey::new("alice", GraphMode::Default));
        cache.mount(&QueryKey::new("alice", GraphMode::Yearly));
        cache.mount(&QueryKey::new("bob", GraphMode::Default));
        settle(&mut cache);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_zero_staleness_refetches_on_mount() {
        let source = CountingSource::default();
        let calls = Arc::clone(&source.calls);
        let mut cache = FetchCache::new(source);
        let key = QueryKey::new("alice", GraphMode::Yearly);
        cache.mount(&key);
        settle(&mut cache);
        cache.mount(&key);
        // The previous data stays visible while the refetch runs.
        assert!(matches!(cache.state(&key), Some(QueryState::Ready(_))));
        settle(&mut cache);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let Some(QueryState::Ready(records)) = cache.state(&key) else {
            panic!("expected data after refetch");
        };
        assert_eq!(records[0].date, "2023-06-02");
    }

    #[test]
    fn test_fresh_results_are_reused() {
        let source = CountingSource::default();
        let calls = Arc::clone(&source.calls);
        let mut cache = FetchCache::new(source).stale_after(Duration::from_secs(3600));
        let key = QueryKey::new("alice", GraphMode::Yearly);
        cache.mount(&key);
        settle(&mut cache);
        cache.mount(&key);
        assert!(!cache.is_pending());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        cache.refetch(&key);
        settle(&mut cache);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failure_surfaces_message() {
        let mut cache = FetchCache::new(FailingSource);
        let key = QueryKey::new("alice", GraphMode::Default);
        cache.mount(&key);
        settle(&mut cache);
        assert_eq!(
            cache.state(&key),
            Some(&QueryState::Failed(String::from(
                r#"invalid endpoint URL "nowhere": connection refused"#
            )))
        );
    }

    #[test]
    fn test_http_fetch_keeps_key_order() {
        let (endpoint, server) = serve_once(http_response(
            "200 OK",
            r#"{"2023-06-02": 1, "2023-06-01": 3, "2023-06-03": "many"}"#,
        ));
        let source = HttpSource::new(&endpoint, Duration::from_secs(5)).unwrap();
        let records = source.fetch("alice").unwrap();
        assert_eq!(
            records,
            [
                ActivityRecord::new("2023-06-02", 1),
                ActivityRecord::new("2023-06-01", 3),
            ]
        );
        assert_eq!(records[1].level, 3);
        assert_eq!(server.join().unwrap(), "GET /leetcode/alice HTTP/1.1");
    }

    #[test]
    fn test_http_error_status() {
        let (endpoint, server) = serve_once(http_response("500 Internal Server Error", ""));
        let source = HttpSource::new(&endpoint, Duration::from_secs(5)).unwrap();
        let e = source.fetch("alice").unwrap_err();
        assert!(matches!(
            e,
            FetchError::Status { status, .. } if status == reqwest::StatusCode::INTERNAL_SERVER_ERROR
        ));
        assert_eq!(
            e.into_message(),
            format!("request to {endpoint}/leetcode/alice returned 500 Internal Server Error")
        );
        server.join().unwrap();
    }

    #[test]
    fn test_http_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let source = HttpSource::new(&endpoint, Duration::from_secs(5)).unwrap();
        let e = source.fetch("alice").unwrap_err();
        assert!(matches!(e, FetchError::Transport { .. }));
        // The message carries the underlying cause, not just the URL.
        let msg = e.into_message();
        assert!(msg.starts_with(&format!("request to {endpoint}/leetcode/alice failed: ")));
    }

    #[test]
    fn test_http_failure_through_cache() {
        let (endpoint, server) = serve_once(http_response("404 Not Found", ""));
        let mut cache = FetchCache::new(HttpSource::new(&endpoint, Duration::from_secs(5)).unwrap());
        let key = QueryKey::new("nobody", GraphMode::Default);
        cache.mount(&key);
        settle(&mut cache);
        assert_eq!(
            cache.state(&key),
            Some(&QueryState::Failed(format!(
                "request to {endpoint}/leetcode/nobody returned 404 Not Found"
            )))
        );
        server.join().unwrap();
    }

    #[test]
    fn test_only_exact_placeholder_short_circuits() {
        assert!(!QueryKey::new("", GraphMode::Default).has_username());
        assert!(!QueryKey::new("string", GraphMode::Default).has_username());
        assert!(QueryKey::new(" string ", GraphMode::Default).has_username());
        assert!(QueryKey::new("   ", GraphMode::Default).has_username());
        assert!(QueryKey::new("alice", GraphMode::Default).has_username());
    }
}
