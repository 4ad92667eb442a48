// ABOUTME: Connection monitor deciding endpoint reachability and supervising the reconnect loop
// Owns the online flag, the retry task handle and the cancellation token of the current epoch

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::endpoint::{normalize_base_url, Endpoint, EndpointError, EndpointHandle, TokenUpdate, REQUEST_TIMEOUT};
use super::health;

pub const RETRY_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Online,
    Offline,
}

impl ConnectionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Connecting => "Connecting",
            Self::Online => "Online",
            Self::Offline => "Offline",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MonitorOptions {
    pub retry_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            retry_interval: RETRY_INTERVAL,
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

pub struct ConnectionMonitor {
    endpoint: EndpointHandle,
    options: MonitorOptions,
    status: watch::Sender<ConnectionStatus>,
    /// Cancellation token of the current configuration epoch.
    cancel: Mutex<CancellationToken>,
    /// At most one live retry loop; a finished handle counts as absent.
    retry_task: Mutex<Option<JoinHandle<()>>>,
    loops_started: AtomicUsize,
    /// Serializes reconfiguration requests.
    reconfigure: tokio::sync::Mutex<()>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ConnectionMonitor {
    pub fn new(endpoint: EndpointHandle, options: MonitorOptions) -> Arc<Self> {
        let (status, _) = watch::channel(ConnectionStatus::Connecting);
        Arc::new(Self {
            endpoint,
            options,
            status,
            cancel: Mutex::new(CancellationToken::new()),
            retry_task: Mutex::new(None),
            loops_started: AtomicUsize::new(0),
            reconfigure: tokio::sync::Mutex::new(()),
        })
    }

    pub const fn endpoint(&self) -> &EndpointHandle {
        &self.endpoint
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub fn is_online(&self) -> bool {
        self.status() == ConnectionStatus::Online
    }

    pub fn is_retrying(&self) -> bool {
        lock(&self.retry_task)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub fn retry_loops_started(&self) -> usize {
        self.loops_started.load(Ordering::SeqCst)
    }

    /// Returns true when the status actually changed.
    fn set_status(&self, next: ConnectionStatus) -> bool {
        self.status.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        })
    }

    /// Probe the currently configured endpoint.
    pub async fn check_connection(&self) -> bool {
        let endpoint = self.endpoint.current();
        health::check_connection(&endpoint, self.options.request_timeout).await
    }

    /// Initial check at startup; falls into the retry loop when unreachable.
    pub async fn initialize(self: &Arc<Self>) -> bool {
        self.set_status(ConnectionStatus::Connecting);
        let online = self.check_connection().await;
        if online {
            info!("Connected to {}", self.endpoint.current().base_url());
            self.set_status(ConnectionStatus::Online);
        } else {
            warn!("Server at {} is not reachable", self.endpoint.current().base_url());
            self.set_status(ConnectionStatus::Offline);
            self.start_retry_loop();
        }
        online
    }

    /// Spawn the reconnect loop unless one is already running. Returns true
    /// when a new loop was started.
    pub fn start_retry_loop(self: &Arc<Self>) -> bool {
        let mut slot = lock(&self.retry_task);
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            debug!("Retry loop already running");
            return false;
        }

        let cancel = lock(&self.cancel).clone();
        let monitor = Arc::clone(self);
        self.loops_started.fetch_add(1, Ordering::SeqCst);
        *slot = Some(tokio::spawn(async move {
            monitor.retry_loop(cancel).await;
        }));
        true
    }

    async fn retry_loop(self: Arc<Self>, cancel: CancellationToken) {
        info!("Retrying server connection every {:?}", self.options.retry_interval);

        while !self.is_online() && !cancel.is_cancelled() {
            tokio::select! {
                () = cancel.cancelled() => break,
                () = sleep(self.options.retry_interval) => {}
            }

            let online = tokio::select! {
                () = cancel.cancelled() => break,
                online = self.check_connection() => online,
            };

            if online {
                info!("Reconnected to {}", self.endpoint.current().base_url());
                self.set_status(ConnectionStatus::Online);
                break;
            }
            debug!("Reconnect attempt failed, next try in {:?}", self.options.retry_interval);
        }

        info!("Connection retry loop finished");
    }

    /// A transport failure was observed by a request made in `epoch`.
    /// Failures from a superseded configuration are ignored.
    pub fn connection_lost(self: &Arc<Self>, epoch: u64) {
        let current = self.endpoint.current().epoch();
        if epoch != current {
            debug!("Ignoring connection loss from epoch {} (current {})", epoch, current);
            return;
        }
        if self.set_status(ConnectionStatus::Offline) {
            warn!("Lost connection to {}", self.endpoint.current().base_url());
        }
        self.start_retry_loop();
    }

    /// Switch to a new base URL and token. Stops the retry loop of the old
    /// configuration before probing the new one, and returns the resulting
    /// online state.
    pub async fn apply_settings(
        self: &Arc<Self>,
        base_url: &str,
        token: TokenUpdate,
    ) -> Result<bool, EndpointError> {
        let _guard = self.reconfigure.lock().await;

        let url = normalize_base_url(base_url)?;
        let previous = self.endpoint.current();
        let token = token.apply(previous.token());
        let next = Endpoint::new(url, token, self.options.request_timeout, previous.epoch() + 1)?;
        info!(
            "Applying settings: base={} token_present={} epoch={}",
            next.base_url(),
            next.token().is_some(),
            next.epoch()
        );
        drop(previous);
        self.endpoint.replace(next);

        // Swap the token and take the old loop under the slot lock, so a loop
        // spawned concurrently is either bound to the new token or taken here.
        let old_task = {
            let mut slot = lock(&self.retry_task);
            let stale = std::mem::replace(&mut *lock(&self.cancel), CancellationToken::new());
            stale.cancel();
            slot.take()
        };
        if let Some(task) = old_task {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Retry loop ended abnormally: {}", e);
                }
            }
        }

        let online = self.check_connection().await;
        if online {
            self.set_status(ConnectionStatus::Online);
        } else {
            warn!("Server at {} is not reachable", self.endpoint.current().base_url());
            self.set_status(ConnectionStatus::Offline);
            self.start_retry_loop();
        }
        Ok(online)
    }

    /// Stop background work; used on application exit.
    pub fn shutdown(&self) {
        lock(&self.cancel).cancel();
        if let Some(task) = lock(&self.retry_task).take() {
            task.abort();
        }
    }
}
