//! Message, handler and node configuration types

use crate::config::node;
use crate::protocol::packet::Field;
use crate::radio::{Frequency, RadioConfig};

/// Decoded inbound telemetry message
///
/// An owned snapshot: the manager keeps its own copy in a single slot that
/// the next successful poll overwrites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Receiver-side count of decoded messages, assigned on arrival
    pub message_id: u32,
    /// Sender's sequence byte, if it tags packets
    pub packet_id: Option<u8>,
    pub sender_id: u8,
    pub target_id: u8,
    pub name: Field,
    pub value: Field,
    pub rssi: i16,
}

/// Result of checking the radio once
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// No frame was ready
    Idle,
    /// A frame arrived but could not be decoded
    Dropped,
    /// A frame was decoded into a message
    Received(Message),
}

/// Receives every decoded message
///
/// Implemented for any `FnMut(&Message)`, so a closure can be registered directly.
pub trait MessageHandler {
    fn on_message(&mut self, message: &Message);
}

impl<F> MessageHandler for F
where
    F: FnMut(&Message),
{
    fn on_message(&mut self, message: &Message) {
        self(message)
    }
}

/// Node identity and behaviour, fixed once the manager is initialised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    pub node_id: u8,
    pub network_id: u8,
    pub gateway_id: u8,
    pub frequency: Frequency,
    /// AES-128 key shared across the network
    pub encrypt_key: Option<[u8; 16]>,
    /// Auto transmission control target
    pub target_rssi: i16,
    /// RFM69HW/HCW PA boost
    pub high_power: bool,
    /// Retries used by [`report`](super::MessageManager::report)
    pub retries: u8,
    /// ACK request used by [`report`](super::MessageManager::report)
    pub request_ack: bool,
    /// Stamp outgoing payloads with a sequence byte and expect one on inbound payloads
    pub packet_ids: bool,
    /// Surface frames addressed to other nodes
    pub promiscuous: bool,
}

impl NodeConfig {
    /// Driver start-up settings derived from this config
    pub fn radio_config(&self) -> RadioConfig {
        RadioConfig {
            frequency: self.frequency,
            node_id: self.node_id,
            network_id: self.network_id,
            encrypt_key: self.encrypt_key,
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: node::NODE_ID,
            network_id: node::NETWORK_ID,
            gateway_id: node::GATEWAY_ID,
            frequency: node::FREQUENCY,
            encrypt_key: Some(*node::ENCRYPT_KEY),
            target_rssi: node::ATC_RSSI,
            high_power: node::IS_RFM69HW,
            retries: node::RETRIES,
            request_ack: node::REQUEST_ACK,
            packet_ids: node::SEND_PACKET_ID,
            promiscuous: false,
        }
    }
}
