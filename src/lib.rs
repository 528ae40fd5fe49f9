#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod manager;
pub mod protocol;
pub mod radio;

// The node task depends on embassy features only available with embedded feature
#[cfg(feature = "embedded")]
pub mod tasks;

pub use manager::{Message, MessageHandler, MessageManager, NodeConfig};
pub use radio::{Frequency, RadioConfig, RadioError, Rfm69Radio, RxFrame};
