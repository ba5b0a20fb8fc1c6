//! The push side of the bridge.
//!
//! A [`GraphiteBridge`] owns the destination address, the per-attempt
//! timeout and the label templates. Every `push` is independent: collect a
//! fresh snapshot, encode it, write it over a new TCP connection, close.
//! Nothing is retained between calls and a failed push is never retried —
//! the next cycle sends fresh data instead.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, error};

use crate::clock::{Clock, SystemClock};
use crate::encode::encode;
use crate::error::PushError;
use crate::registry::Collect;
use crate::template::LabelTemplate;

/// Default per-attempt connect/write timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Pushes metric snapshots to a Carbon plaintext listener.
#[derive(Clone)]
pub struct GraphiteBridge {
    address: String,
    timeout: Duration,
    templates: HashMap<String, LabelTemplate>,
    registry: Arc<dyn Collect>,
    clock: Arc<dyn Clock>,
}

impl GraphiteBridge {
    /// Create a bridge for the given `host:port` destination.
    ///
    /// Timeout defaults to [`DEFAULT_TIMEOUT`], templates to an empty map and
    /// the clock to the system clock.
    pub fn new(address: impl Into<String>, registry: Arc<dyn Collect>) -> Self {
        Self {
            address: address.into(),
            timeout: DEFAULT_TIMEOUT,
            templates: HashMap::new(),
            registry,
            clock: Arc::new(SystemClock),
        }
    }

    /// Bound a single push attempt (connect plus write) by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the wire path for specific metric names.
    pub fn with_label_templates(mut self, templates: HashMap<String, LabelTemplate>) -> Self {
        self.templates = templates;
        self
    }

    /// Substitute the time source. Intended for tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The configured destination address.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Collect, encode and transmit one snapshot.
    ///
    /// Encoding and transport failures are both reported as `Err` (and
    /// logged with the destination address); neither aborts anything beyond
    /// this one attempt.
    pub async fn push(&self, prefix: &str) -> Result<(), PushError> {
        let result = self.try_push(prefix).await;
        if let Err(err) = &result {
            error!("Could not push metrics to graphite at {}: {}", self.address, err);
        }
        result
    }

    async fn try_push(&self, prefix: &str) -> Result<(), PushError> {
        let timestamp = self.clock.now().timestamp();
        let families = self.registry.collect();
        let sample_count: usize = families.iter().map(|family| family.samples.len()).sum();
        let payload = encode(&families, prefix, timestamp, &self.templates)?;

        self.send(&payload).await?;
        debug!(
            "Pushed {} samples ({} bytes) to graphite at {}",
            sample_count,
            payload.len(),
            self.address
        );
        Ok(())
    }

    async fn send(&self, payload: &[u8]) -> Result<(), PushError> {
        let mut stream = timeout(self.timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| PushError::Timeout {
                address: self.address.clone(),
                timeout: self.timeout,
            })?
            .map_err(|source| PushError::Connect {
                address: self.address.clone(),
                source,
            })?;

        let write = async {
            stream.write_all(payload).await?;
            stream.shutdown().await
        };
        timeout(self.timeout, write)
            .await
            .map_err(|_| PushError::Timeout {
                address: self.address.clone(),
                timeout: self.timeout,
            })?
            .map_err(|source| PushError::Write {
                address: self.address.clone(),
                source,
            })?;
        Ok(())
    }
}
