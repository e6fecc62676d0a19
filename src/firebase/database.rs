use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{header, Client};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{
    auth::TokenSource,
    models::StreamEvent,
    stream::{NodeTree, SseDecoder},
};
use crate::transport::{NodeUpdate, RealtimeTransport, Subscription};

/// Realtime Database REST client authorised as one user.
#[derive(Clone)]
pub struct FirebaseDatabase {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    database_url: String,
    tokens: TokenSource,
    retry: Duration,
}

impl FirebaseDatabase {
    pub(crate) fn new(http: Client, database_url: &str, tokens: TokenSource, retry: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                http,
                database_url: database_url.to_owned(),
                tokens,
                retry,
            }),
        }
    }

    /// REST URL of `path`, e.g. `https://x.firebaseio.com/SensorData.json`.
    fn url(&self, path: &str) -> String {
        node_url(&self.inner.database_url, path)
    }

    /// Keep a stream open on `path`, reconnecting after `retry` whenever it
    /// drops, until the subscriber goes away.
    async fn stream_loop(self, path: String, tx: mpsc::UnboundedSender<NodeUpdate>) {
        loop {
            match self.stream_once(&path, &tx).await {
                Ok(()) if tx.is_closed() => return,
                Ok(()) => {
                    warn!(path = %path, "Realtime Database stream ended");
                    let _ = tx.send(NodeUpdate::Error("stream closed by server".to_owned()));
                }
                Err(e) => {
                    let reason = format!("{e:#}");
                    warn!(path = %path, error = %reason, "Realtime Database stream failed");
                    let _ = tx.send(NodeUpdate::Error(reason));
                }
            }

            if tx.is_closed() {
                return;
            }
            tokio::time::sleep(self.inner.retry).await;
            info!(path = %path, "Reconnecting Realtime Database stream");
        }
    }

    /// One streaming connection. Returns `Ok` when the server ends the
    /// stream or the subscriber is gone.
    async fn stream_once(&self, path: &str, tx: &mpsc::UnboundedSender<NodeUpdate>) -> Result<()> {
        let token = self.inner.tokens.id_token().await?;
        let url = self.url(path);
        debug!(url = %url, "Opening Realtime Database stream");

        let response = self
            .inner
            .http
            .get(&url)
            .query(&[("auth", token.as_str())])
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await
            .context("Realtime Database stream request failed")?
            .error_for_status()
            .context("Realtime Database stream returned error status")?;

        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::new();
        let mut tree = NodeTree::new();

        while let Some(chunk) = body.next().await {
            let chunk = chunk.context("Realtime Database stream interrupted")?;

            for frame in decoder.push(&chunk) {
                match StreamEvent::parse(&frame.event, &frame.data)? {
                    StreamEvent::Put(event) => tree.put(&event.path, event.data),
                    StreamEvent::Patch(event) => tree.patch(&event.path, event.data),
                    StreamEvent::KeepAlive => continue,
                    StreamEvent::Cancel(reason) => {
                        bail!("stream cancelled by server: {reason}")
                    }
                    StreamEvent::AuthRevoked => {
                        self.inner.tokens.invalidate().await;
                        bail!("auth token revoked by server")
                    }
                    StreamEvent::Unknown(name) => {
                        debug!(event = %name, "Ignoring unknown stream event");
                        continue;
                    }
                }

                if tx.send(NodeUpdate::Value(tree.value())).is_err() {
                    return Ok(());
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl RealtimeTransport for FirebaseDatabase {
    fn subscribe(&self, path: &str) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.clone().stream_loop(path.to_owned(), tx));
        let path = path.to_owned();

        Subscription::new(rx, move || {
            task.abort();
            debug!(path = %path, "Realtime Database stream released");
        })
    }

    async fn write(&self, path: &str, value: Value) -> Result<()> {
        let token = self.inner.tokens.id_token().await?;
        let url = self.url(path);
        debug!(url = %url, value = %value, "Writing Realtime Database value");

        self.inner
            .http
            .put(&url)
            .query(&[("auth", token.as_str())])
            .json(&value)
            .send()
            .await
            .context("Realtime Database write request failed")?
            .error_for_status()
            .context("Realtime Database rejected the write")?;

        Ok(())
    }
}

fn node_url(database_url: &str, path: &str) -> String {
    let path = path.trim_matches('/');
    format!("{}/{}.json", database_url.trim_end_matches('/'), path)
}
