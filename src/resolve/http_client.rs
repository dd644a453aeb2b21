//! Upstream HTTP client with per-call timeout, rate limiting and circuit breaker
//!
//! Every upstream call made by a sequence source goes through this client.
//! A timeout, a transport error, a 5xx response or an open circuit all surface
//! as a [`SourceError`], which the resolver treats as a provider failure.
//! 4xx responses are returned to the caller untouched: "identifier not
//! recognized" is routine for the registry and does not indicate an unhealthy
//! upstream.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::HeaderMap;
use reqwest::Client;
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::config::CircuitBreakerConfig;
use crate::resolve::SourceError;

/// Circuit breaker state
#[derive(Debug, Clone, PartialEq)]
pub enum CircuitState {
    Closed,
    Open { opened_at: Instant },
    HalfOpen,
}

/// HTTP client shared by all calls to one upstream provider
#[derive(Debug)]
pub struct UpstreamClient {
    client: Client,
    /// Provider name used in log lines
    provider: &'static str,
    /// Minimum spacing between request starts
    rate_limit_delay: Option<Duration>,
    /// Earliest instant the next request may start
    next_slot: Arc<Mutex<Option<Instant>>>,
    /// Circuit breaker state
    circuit_state: Arc<Mutex<CircuitState>>,
    /// Circuit breaker configuration
    circuit_config: CircuitBreakerConfig,
    /// Failure counter
    failure_count: Arc<AtomicU32>,
    /// Success counter (for half-open state)
    success_count: Arc<AtomicU32>,
    /// Total request counter
    request_count: Arc<AtomicU64>,
}

impl UpstreamClient {
    /// Create a client for one provider
    pub fn new(
        provider: &'static str,
        timeout: Duration,
        rate_limit_ms: Option<u64>,
        circuit_config: Option<&CircuitBreakerConfig>,
        default_headers: HeaderMap,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .default_headers(default_headers)
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(|e| SourceError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            provider,
            rate_limit_delay: rate_limit_ms.filter(|ms| *ms > 0).map(Duration::from_millis),
            next_slot: Arc::new(Mutex::new(None)),
            circuit_state: Arc::new(Mutex::new(CircuitState::Closed)),
            circuit_config: circuit_config.cloned().unwrap_or_default(),
            failure_count: Arc::new(AtomicU32::new(0)),
            success_count: Arc::new(AtomicU32::new(0)),
            request_count: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Issue a GET request
    ///
    /// Returns the response for any status below 500.
    pub async fn get(&self, url: &str) -> Result<reqwest::Response, SourceError> {
        self.check_circuit_breaker().await?;
        self.wait_for_slot().await;

        self.request_count.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(provider = self.provider, %url, "upstream request");

        match self.client.get(url).send().await {
            Ok(response) if response.status().is_server_error() => {
                self.record_failure().await;
                Err(SourceError::HttpStatus {
                    status: response.status().as_u16(),
                    url: url.to_string(),
                })
            }
            Ok(response) => {
                self.record_success().await;
                Ok(response)
            }
            Err(e) => {
                self.record_failure().await;
                if e.is_timeout() {
                    Err(SourceError::Timeout)
                } else {
                    Err(SourceError::Transport(e.to_string()))
                }
            }
        }
    }

    /// Wait for this caller's rate-limit slot
    ///
    /// The slot is reserved under the lock and the lock is released before
    /// sleeping, so requests overlap in flight and only their start times are
    /// spaced by `rate_limit_delay`.
    async fn wait_for_slot(&self) {
        let Some(delay) = self.rate_limit_delay else {
            return;
        };

        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(reserved) if reserved > now => reserved,
                _ => now,
            };
            *next = Some(slot + delay);
            slot
        };

        let wait = slot.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }

    /// GET and require a 2xx status
    pub async fn get_success(&self, url: &str) -> Result<reqwest::Response, SourceError> {
        let response = self.get(url).await?;
        if !response.status().is_success() {
            return Err(SourceError::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    /// Check circuit breaker state and potentially fail fast
    async fn check_circuit_breaker(&self) -> Result<(), SourceError> {
        let mut state = self.circuit_state.lock().await;

        match *state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open { opened_at } => {
                let recovery_timeout =
                    Duration::from_secs(self.circuit_config.recovery_timeout_seconds.unwrap_or(60));

                if opened_at.elapsed() >= recovery_timeout {
                    *state = CircuitState::HalfOpen;
                    self.success_count.store(0, Ordering::Relaxed);
                    tracing::info!(
                        provider = self.provider,
                        "Circuit breaker transitioning to half-open state"
                    );
                    Ok(())
                } else {
                    Err(SourceError::CircuitOpen)
                }
            }
            CircuitState::HalfOpen => Ok(()),
        }
    }

    /// Record a successful request
    async fn record_success(&self) {
        let mut state = self.circuit_state.lock().await;

        match *state {
            CircuitState::Closed => {
                self.failure_count.store(0, Ordering::Relaxed);
            }
            CircuitState::HalfOpen => {
                let success_count = self.success_count.fetch_add(1, Ordering::Relaxed) + 1;
                let success_threshold = self.circuit_config.success_threshold.unwrap_or(3);

                if success_count >= success_threshold {
                    *state = CircuitState::Closed;
                    self.failure_count.store(0, Ordering::Relaxed);
                    self.success_count.store(0, Ordering::Relaxed);
                    tracing::info!(
                        provider = self.provider,
                        "Circuit breaker closed after {} successful requests",
                        success_count
                    );
                }
            }
            CircuitState::Open { .. } => {
                *state = CircuitState::Closed;
                self.failure_count.store(0, Ordering::Relaxed);
            }
        }
    }

    /// Record a failed request
    async fn record_failure(&self) {
        let failure_count = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;
        let failure_threshold = self.circuit_config.failure_threshold.unwrap_or(5);

        let mut state = self.circuit_state.lock().await;
        match *state {
            // A failed probe reopens the circuit immediately
            CircuitState::HalfOpen => {
                *state = CircuitState::Open {
                    opened_at: Instant::now(),
                };
                tracing::warn!(provider = self.provider, "Circuit breaker reopened");
            }
            CircuitState::Closed if failure_count >= failure_threshold => {
                *state = CircuitState::Open {
                    opened_at: Instant::now(),
                };
                tracing::warn!(
                    provider = self.provider,
                    "Circuit breaker opened after {} failures",
                    failure_count
                );
            }
            _ => {}
        }
    }

    /// Get current circuit breaker state for monitoring
    pub async fn circuit_state(&self) -> CircuitState {
        self.circuit_state.lock().await.clone()
    }

    /// Get request statistics
    pub fn get_stats(&self) -> ClientStats {
        ClientStats {
            total_requests: self.request_count.load(Ordering::Relaxed),
            failure_count: self.failure_count.load(Ordering::Relaxed),
            success_count: self.success_count.load(Ordering::Relaxed),
        }
    }
}

/// HTTP client statistics
#[derive(Debug, Clone)]
pub struct ClientStats {
    pub total_requests: u64,
    pub failure_count: u32,
    pub success_count: u32,
}
