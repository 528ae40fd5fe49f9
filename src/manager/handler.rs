//! Message manager
//!
//! Owns the node's addressing state, drives outbound sends over an
//! [`Rfm69Radio`] and decodes inbound frames when polled.

use crate::manager::types::{Message, MessageHandler, NodeConfig, PollOutcome};
use crate::protocol::packet;
use crate::radio::{RadioError, Rfm69Radio};
use log::{debug, info, trace, warn};

/// Telemetry message manager
///
/// Single-threaded: sends run to completion and inbound frames are decoded
/// only when [`poll`](Self::poll) is called from the main loop.
pub struct MessageManager<'h, R: Rfm69Radio> {
    radio: R,
    config: NodeConfig,
    handler: Option<&'h mut dyn MessageHandler>,
    /// Most recently decoded message
    message: Option<Message>,
    initialised: bool,
    receive_count: u32,
    ack_count: u32,
    sequence: u8,
}

impl<'h, R: Rfm69Radio> MessageManager<'h, R> {
    /// Create a manager around a radio; nothing is sent to the radio yet
    pub fn new(radio: R, config: NodeConfig) -> Self {
        Self {
            radio,
            config,
            handler: None,
            message: None,
            initialised: false,
            receive_count: 0,
            ack_count: 0,
            sequence: 0,
        }
    }

    /// Bring up the radio with the node's identity, power and filtering settings
    ///
    /// Can only succeed once.
    pub async fn initialize(&mut self) -> Result<(), RadioError> {
        if self.initialised {
            return Err(RadioError::AlreadyInitialised);
        }

        self.radio.init(&self.config.radio_config()).await?;
        self.radio.set_high_power(self.config.high_power).await?;
        self.radio.set_target_rssi(self.config.target_rssi).await?;
        self.radio.set_promiscuous(self.config.promiscuous).await?;
        self.initialised = true;

        info!(
            "RFM69: node {} on network {} at {} Hz, gateway {}",
            self.config.node_id,
            self.config.network_id,
            self.config.frequency.hz(),
            self.config.gateway_id
        );
        Ok(())
    }

    /// Register the handler for decoded messages, replacing any previous one
    ///
    /// Returns the handler that was replaced.
    pub fn on_message(
        &mut self,
        handler: &'h mut dyn MessageHandler,
    ) -> Option<&'h mut dyn MessageHandler> {
        self.handler.replace(handler)
    }

    /// Remove the registered handler
    pub fn clear_handler(&mut self) -> Option<&'h mut dyn MessageHandler> {
        self.handler.take()
    }

    /// Send a name/value pair to a node
    ///
    /// Returns true once the radio accepted the frame and, if `request_ack` is
    /// set, the destination acknowledged it within `retries` retries.
    pub async fn send(
        &mut self,
        destination: u8,
        name: &str,
        value: &str,
        retries: u8,
        request_ack: bool,
    ) -> bool {
        if !self.initialised {
            warn!("RFM69 TX to {}: radio not initialised", destination);
            return false;
        }

        // Every attempt consumes a sequence number, failed ones included.
        // 0 marks an untagged payload and is never stamped.
        let packet_id = if self.config.packet_ids {
            self.sequence = self.sequence.wrapping_add(1);
            if self.sequence == 0 {
                self.sequence = 1;
            }
            Some(self.sequence)
        } else {
            None
        };

        let payload = match packet::encode(name, value, packet_id) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("RFM69 TX to {}: cannot encode '{}' ({:?})", destination, name, e);
                return false;
            }
        };

        trace!(
            "RFM69 TX to {}: '{}:{}' (packet {:?}, ack {}, retries {})",
            destination,
            name,
            value,
            packet_id,
            request_ack,
            retries
        );

        match self
            .radio
            .send(destination, &payload, request_ack, retries)
            .await
        {
            Ok(()) => {
                if request_ack {
                    self.ack_count = self.ack_count.wrapping_add(1);
                }
                true
            }
            Err(e) => {
                warn!("RFM69 TX to {}: failed ({:?})", destination, e);
                false
            }
        }
    }

    /// Send a name/value pair to the gateway
    pub async fn send_to_gateway(
        &mut self,
        name: &str,
        value: &str,
        retries: u8,
        request_ack: bool,
    ) -> bool {
        let gateway = self.config.gateway_id;
        self.send(gateway, name, value, retries, request_ack).await
    }

    /// Send a name/value pair to the gateway with the configured retries and ACK setting
    pub async fn report(&mut self, name: &str, value: &str) -> bool {
        let retries = self.config.retries;
        let request_ack = self.config.request_ack;
        self.send_to_gateway(name, value, retries, request_ack).await
    }

    /// Check the radio for a received frame and decode it
    ///
    /// A decoded message is counted, stored in the message slot and handed to
    /// the registered handler before being returned. Malformed frames are
    /// dropped and yield `None`, as does an idle radio.
    pub async fn poll(&mut self) -> Option<Message> {
        match self.poll_outcome().await {
            PollOutcome::Received(message) => Some(message),
            PollOutcome::Dropped | PollOutcome::Idle => None,
        }
    }

    /// Decode every frame the radio has ready
    ///
    /// Keeps going past malformed frames. Returns the number of decoded messages.
    pub async fn drain(&mut self) -> u32 {
        let mut received = 0;
        loop {
            match self.poll_outcome().await {
                PollOutcome::Received(_) => received += 1,
                PollOutcome::Dropped => {}
                PollOutcome::Idle => return received,
            }
        }
    }

    /// Like [`poll`](Self::poll), but tells a dropped frame apart from an idle radio
    pub async fn poll_outcome(&mut self) -> PollOutcome {
        if !self.initialised {
            return PollOutcome::Idle;
        }

        let Some(frame) = self.radio.receive_done().await else {
            return PollOutcome::Idle;
        };

        // Only frames addressed to this node are acknowledged, promiscuous or not.
        // The ACK goes out before decoding so the sender stops retrying either way.
        if frame.ack_requested && frame.target_id == self.config.node_id {
            if let Err(e) = self.radio.send_ack().await {
                warn!("RFM69 ACK to {}: failed ({:?})", frame.sender_id, e);
            }
        }

        let decoded = match packet::decode(&frame.data, self.config.packet_ids) {
            Ok(decoded) => decoded,
            Err(e) => {
                debug!(
                    "RFM69 RX from {}: dropped {} bytes ({:?})",
                    frame.sender_id,
                    frame.data.len(),
                    e
                );
                return PollOutcome::Dropped;
            }
        };

        self.receive_count = self.receive_count.wrapping_add(1);

        let slot = self.message.insert(Message {
            message_id: self.receive_count,
            packet_id: decoded.packet_id,
            sender_id: frame.sender_id,
            target_id: frame.target_id,
            name: decoded.name,
            value: decoded.value,
            rssi: frame.rssi,
        });

        debug!(
            "RFM69 RX: message {} packet {:?} from {} to {}: '{}:{}' (RSSI: {})",
            slot.message_id,
            slot.packet_id,
            slot.sender_id,
            slot.target_id,
            slot.name,
            slot.value,
            slot.rssi
        );

        if let Some(handler) = self.handler.as_mut() {
            handler.on_message(slot);
        }

        PollOutcome::Received(slot.clone())
    }

    /// Toggle reception of frames addressed to other nodes
    pub async fn set_promiscuous(&mut self, enabled: bool) -> Result<(), RadioError> {
        if self.initialised {
            self.radio.set_promiscuous(enabled).await?;
        }
        self.config.promiscuous = enabled;
        Ok(())
    }

    /// Most recently decoded message
    pub fn last_message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    /// Number of decoded inbound messages
    pub fn received_count(&self) -> u32 {
        self.receive_count
    }

    /// Number of sends acknowledged by their destination
    pub fn ack_count(&self) -> u32 {
        self.ack_count
    }

    /// Last packet ID stamped on an outgoing payload
    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    pub fn node_id(&self) -> u8 {
        self.config.node_id
    }

    pub fn gateway_id(&self) -> u8 {
        self.config.gateway_id
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }
}
