//! Push metrics to Graphite/Carbon over its plaintext TCP protocol.
//!
//! This crate is the reporting tail of a metrics stack: it owns no metrics
//! itself, it serializes whatever a [`Collect`] source yields and transmits
//! the result on a fixed cadence. An adapter is provided for
//! [`prometheus::Registry`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use graphite_bridge::GraphiteBridge;
//!
//! # async fn run() {
//! let registry = Arc::new(prometheus::Registry::new());
//! let bridge = GraphiteBridge::new("graphite.example.org:2003", registry);
//! let handle = bridge.start(Duration::from_secs(60), "myapp");
//! // ... the loop pushes in the background until `handle` is stopped.
//! # handle.stopped().await;
//! # }
//! ```

pub mod bridge;
pub mod clock;
pub mod config;
pub mod encode;
pub mod error;
pub mod registry;
pub mod scheduler;
pub mod template;

pub use bridge::{DEFAULT_TIMEOUT, GraphiteBridge};
pub use clock::{Clock, SystemClock};
pub use config::GraphiteConfig;
pub use encode::{encode, sanitize};
pub use error::{EncodeError, PushError, TemplateError};
pub use registry::{Collect, MetricFamily, Sample};
pub use scheduler::{DEFAULT_INTERVAL, PushHandle};
pub use template::LabelTemplate;
