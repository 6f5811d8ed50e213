use std::env;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ApiSettings;

use super::cache::{Clock, Lookup, ResponseCache, SystemClock};
use super::curl_cmd::{CurlTransport, Request, Transport};
use super::endpoint::{Endpoint, events_path, languages_path, profile_path, repositories_path};
use super::records::{EventRecord, LanguageBreakdown, ProfileRecord, RepositoryRecord};
use super::FetchError;

const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";

/// GitHub REST client with a per-path TTL cache and stale fallback.
///
/// Safe to share between worker threads. When two requests for the same path
/// overlap, only the most recently issued one may update the cache; the older
/// one resolves to [`FetchError::Superseded`].
pub struct GithubClient<T = CurlTransport, C = SystemClock> {
    transport: T,
    clock: C,
    account: String,
    timeout: Duration,
    token_env: String,
    cache: Mutex<ResponseCache>,
}

impl GithubClient {
    pub fn from_settings(settings: &ApiSettings) -> Self {
        Self::with_parts(CurlTransport::new(&settings.base_url), SystemClock, settings)
    }
}

impl<T: Transport, C: Clock> GithubClient<T, C> {
    pub fn with_parts(transport: T, clock: C, settings: &ApiSettings) -> Self {
        Self {
            transport,
            clock,
            account: settings.account.clone(),
            timeout: settings.timeout(),
            token_env: settings.token_env.clone(),
            cache: Mutex::new(ResponseCache::default()),
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn profile(&self) -> Result<ProfileRecord, FetchError> {
        self.fetch_json(&profile_path(&self.account), Endpoint::Profile)
    }

    pub fn repositories(&self) -> Result<Vec<RepositoryRecord>, FetchError> {
        self.fetch_json(&repositories_path(&self.account), Endpoint::Repositories)
    }

    pub fn languages(&self, full_name: &str) -> Result<LanguageBreakdown, FetchError> {
        self.fetch_json(&languages_path(full_name), Endpoint::Languages)
    }

    pub fn events(&self) -> Result<Vec<EventRecord>, FetchError> {
        self.fetch_json(&events_path(&self.account), Endpoint::Events)
    }

    pub fn cached_entries(&self) -> usize {
        self.lock_cache().len()
    }

    fn fetch_json<D: DeserializeOwned>(&self, path: &str, endpoint: Endpoint) -> Result<D, FetchError> {
        let payload = self.fetch(path, endpoint)?;
        serde_json::from_str(&payload).map_err(|source| FetchError::Decode {
            path: path.to_owned(),
            source,
        })
    }

    /// Raw body for `path`, served from cache while it is younger than the endpoint's TTL.
    pub fn fetch(&self, path: &str, endpoint: Endpoint) -> Result<String, FetchError> {
        let ticket = {
            let mut cache = self.lock_cache();
            match cache.lookup(path, self.clock.now()) {
                Lookup::Fresh(payload) => {
                    debug!(path, endpoint = endpoint.label(), "cache hit");
                    return Ok(payload);
                }
                Lookup::Stale => debug!(path, endpoint = endpoint.label(), "cache expired"),
                Lookup::Missing => debug!(path, endpoint = endpoint.label(), "cache miss"),
            }
            cache.issue_ticket(path)
        };

        let headers = request_headers(env::var(&self.token_env).ok().as_deref());
        let result = self.transport.get(&Request {
            path,
            headers: &headers,
            timeout: self.timeout,
        });

        let mut cache = self.lock_cache();
        if !cache.is_latest(path, ticket) {
            debug!(path, ticket, "discarding superseded response");
            return Err(FetchError::Superseded {
                path: path.to_owned(),
            });
        }

        match result {
            Ok(payload) => {
                cache.store(path, payload.clone(), self.clock.now(), endpoint.ttl());
                Ok(payload)
            }
            Err(error) => match cache.stale_payload(path) {
                Some(payload) => {
                    warn!(path, %error, "request failed, serving stale cached response");
                    Ok(payload)
                }
                None => Err(error),
            },
        }
    }

    fn lock_cache(&self) -> MutexGuard<'_, ResponseCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn request_headers(token: Option<&str>) -> Vec<(String, String)> {
    let mut headers = vec![("Accept".to_owned(), ACCEPT_HEADER.to_owned())];
    if let Some(token) = token.map(str::trim).filter(|token| !token.is_empty()) {
        headers.push(("Authorization".to_owned(), format!("token {token}")));
    }
    headers
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    use super::*;

    struct ManualClock {
        base: Instant,
        offset: Mutex<Duration>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                base: Instant::now(),
                offset: Mutex::new(Duration::ZERO),
            }
        }

        fn advance(&self, by: Duration) {
            *self.offset.lock().unwrap() += by;
        }
    }

    impl Clock for Arc<ManualClock> {
        fn now(&self) -> Instant {
            self.base + *self.offset.lock().unwrap()
        }
    }

    #[derive(Default)]
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<String, FetchError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn with(responses: Vec<Result<String, FetchError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Transport for Arc<ScriptedTransport> {
        fn get(&self, request: &Request<'_>) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Err(FetchError::Status {
                        path: request.path.to_owned(),
                        status: 500,
                    })
                })
        }
    }

    fn client(
        transport: &Arc<ScriptedTransport>,
        clock: &Arc<ManualClock>,
    ) -> GithubClient<Arc<ScriptedTransport>, Arc<ManualClock>> {
        GithubClient::with_parts(
            Arc::clone(transport),
            Arc::clone(clock),
            &ApiSettings {
                account: "octocat".to_owned(),
                token_env: "REPO_CONSTELLATION_TEST_UNSET_TOKEN".to_owned(),
                ..ApiSettings::default()
            },
        )
    }

    fn network_down(path: &str) -> FetchError {
        FetchError::Transport {
            path: path.to_owned(),
            message: "connection refused".to_owned(),
        }
    }

    #[test]
    fn second_request_within_ttl_is_served_from_cache() {
        let transport = Arc::new(ScriptedTransport::with(vec![Ok(
            r#"{"login": "octocat", "public_repos": 8}"#.to_owned(),
        )]));
        let clock = Arc::new(ManualClock::new());
        let client = client(&transport, &clock);

        let first = client.profile().unwrap();
        clock.advance(Duration::from_secs(14 * 60));
        let second = client.profile().unwrap();

        assert_eq!(first.login, "octocat");
        assert_eq!(second.public_repos, 8);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn request_after_ttl_hits_the_network_again() {
        let transport = Arc::new(ScriptedTransport::with(vec![
            Ok("[]".to_owned()),
            Ok(r#"[{"id": "1", "type": "PushEvent", "repo": {"name": "octocat/x"}}]"#.to_owned()),
        ]));
        let clock = Arc::new(ManualClock::new());
        let client = client(&transport, &clock);

        assert!(client.events().unwrap().is_empty());
        clock.advance(Endpoint::Events.ttl());
        let refreshed = client.events().unwrap();

        assert_eq!(refreshed.len(), 1);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failed_refresh_falls_back_to_stale_payload() {
        let path = repositories_path("octocat");
        let transport = Arc::new(ScriptedTransport::with(vec![
            Ok(r#"[{"id": 1, "name": "a", "full_name": "octocat/a"}]"#.to_owned()),
            Err(network_down(&path)),
        ]));
        let clock = Arc::new(ManualClock::new());
        let client = client(&transport, &clock);

        client.repositories().unwrap();
        clock.advance(Endpoint::Repositories.ttl() + Duration::from_secs(1));
        let stale = client.repositories().unwrap();

        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].full_name, "octocat/a");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failure_without_cached_payload_propagates() {
        let path = profile_path("octocat");
        let transport = Arc::new(ScriptedTransport::with(vec![Err(network_down(&path))]));
        let clock = Arc::new(ManualClock::new());
        let client = client(&transport, &clock);

        let error = client.profile().unwrap_err();
        assert!(matches!(error, FetchError::Transport { .. }));
        assert_eq!(client.cached_entries(), 0);
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let transport = Arc::new(ScriptedTransport::with(vec![Ok("not json".to_owned())]));
        let clock = Arc::new(ManualClock::new());
        let client = client(&transport, &clock);

        assert!(matches!(
            client.languages("octocat/a"),
            Err(FetchError::Decode { .. })
        ));
    }

    #[test]
    fn headers_include_token_only_when_present() {
        let anonymous = request_headers(None);
        assert_eq!(
            anonymous,
            vec![("Accept".to_owned(), ACCEPT_HEADER.to_owned())]
        );
        assert_eq!(request_headers(Some("  ")), anonymous);

        let authed = request_headers(Some("abc123"));
        assert_eq!(authed.len(), 2);
        assert_eq!(
            authed[1],
            ("Authorization".to_owned(), "token abc123".to_owned())
        );
    }

    struct GatedTransport {
        entered: Mutex<Option<Sender<()>>>,
        gate: Mutex<Option<Receiver<()>>>,
    }

    impl Transport for GatedTransport {
        fn get(&self, _request: &Request<'_>) -> Result<String, FetchError> {
            let gate = self.gate.lock().unwrap().take();
            match gate {
                Some(gate) => {
                    if let Some(entered) = self.entered.lock().unwrap().take() {
                        entered.send(()).unwrap();
                    }
                    gate.recv().unwrap();
                    Ok(r#""old""#.to_owned())
                }
                None => Ok(r#""new""#.to_owned()),
            }
        }
    }

    #[test]
    fn late_response_from_older_request_is_discarded() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (gate_tx, gate_rx) = mpsc::channel();
        let client = Arc::new(GithubClient::with_parts(
            GatedTransport {
                entered: Mutex::new(Some(entered_tx)),
                gate: Mutex::new(Some(gate_rx)),
            },
            Arc::new(ManualClock::new()),
            &ApiSettings::default(),
        ));

        let slow_client = Arc::clone(&client);
        let slow = thread::spawn(move || slow_client.fetch("/users/x", Endpoint::Profile));

        entered_rx.recv().unwrap();
        let fast = client.fetch("/users/x", Endpoint::Profile).unwrap();
        gate_tx.send(()).unwrap();
        let late = slow.join().unwrap();

        assert_eq!(fast, r#""new""#);
        assert!(late.unwrap_err().is_superseded());
        assert_eq!(
            client.fetch("/users/x", Endpoint::Profile).unwrap(),
            r#""new""#
        );
    }
}
