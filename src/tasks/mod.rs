//! Embassy tasks module
//!
//! Contains the async tasks that run the node under an embassy executor.

pub mod node;

pub use node::{node_task, queue_sample, OutboxReceiver, OutboxSender, TelemetrySample, NODE_OUTBOX};
