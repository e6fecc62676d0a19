//! In-memory stand-ins for the identity provider and the realtime database,
//! plus a local HTTP server for exercising the Firebase adapters.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, Notify};

use crate::{
    session::{AuthenticatedUser, IdentityProvider},
    transport::{NodeUpdate, RealtimeTransport, Subscription},
};

// ---------------------------------------------------------------------------
// MockIdentity
// ---------------------------------------------------------------------------

/// Accepts exactly one email/password pair.
pub struct MockIdentity {
    email: String,
    password: String,
    attempts: AtomicUsize,
}

impl MockIdentity {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_owned(),
            password: password.to_owned(),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthenticatedUser> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if email == self.email && password == self.password {
            Ok(AuthenticatedUser {
                uid: format!("uid-{email}"),
                email: email.to_owned(),
                id_token: "mock-id-token".to_owned(),
                refresh_token: "mock-refresh-token".to_owned(),
                expires_at: i64::MAX,
            })
        } else {
            Err(anyhow!("INVALID_LOGIN_CREDENTIALS"))
        }
    }
}

// ---------------------------------------------------------------------------
// MockTransport
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Inner {
    subscribed: AtomicUsize,
    released: Arc<AtomicUsize>,
    paths: Mutex<Vec<String>>,
    listeners: Mutex<Vec<mpsc::UnboundedSender<NodeUpdate>>>,
    writes: Mutex<Vec<(String, Value)>>,
    write_attempts: AtomicUsize,
    write_error: Mutex<Option<String>>,
    written: Notify,
}

/// Records subscriptions and writes; updates are pushed with [`MockTransport::emit`].
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Inner>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `update` to every live subscription. Returns how many got it.
    pub fn emit(&self, update: NodeUpdate) -> usize {
        let mut listeners = self.inner.listeners.lock().unwrap();
        listeners.retain(|tx| tx.send(update.clone()).is_ok());
        listeners.len()
    }

    pub fn subscriptions(&self) -> usize {
        self.inner.subscribed.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.inner.released.load(Ordering::SeqCst)
    }

    pub fn subscribed_paths(&self) -> Vec<String> {
        self.inner.paths.lock().unwrap().clone()
    }

    /// Successful writes, in order.
    pub fn writes(&self) -> Vec<(String, Value)> {
        self.inner.writes.lock().unwrap().clone()
    }

    pub fn write_attempts(&self) -> usize {
        self.inner.write_attempts.load(Ordering::SeqCst)
    }

    /// Reject every following write with `reason`.
    pub fn fail_writes(&self, reason: &str) {
        *self.inner.write_error.lock().unwrap() = Some(reason.to_owned());
    }

    /// Wait until at least `n` write attempts were made.
    pub async fn wait_for_writes(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let notified = self.inner.written.notified();
                if self.write_attempts() >= n {
                    return;
                }
                notified.await;
            }
        })
        .await
        .expect("timed out waiting for relay writes");
    }
}

#[async_trait]
impl RealtimeTransport for MockTransport {
    fn subscribe(&self, path: &str) -> Subscription {
        self.inner.subscribed.fetch_add(1, Ordering::SeqCst);
        self.inner.paths.lock().unwrap().push(path.to_owned());

        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.listeners.lock().unwrap().push(tx);

        let released = Arc::clone(&self.inner.released);
        Subscription::new(rx, move || {
            released.fetch_add(1, Ordering::SeqCst);
        })
    }

    async fn write(&self, path: &str, value: Value) -> Result<()> {
        self.inner.write_attempts.fetch_add(1, Ordering::SeqCst);
        let failure = self.inner.write_error.lock().unwrap().clone();
        let result = match failure {
            Some(reason) => Err(anyhow!(reason)),
            None => {
                self.inner
                    .writes
                    .lock()
                    .unwrap()
                    .push((path.to_owned(), value));
                Ok(())
            }
        };
        self.inner.written.notify_waiters();
        result
    }
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Poll `check` until it holds or a second has passed.
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
