//! Node settings for the RFM69 telemetry node

use crate::radio::Frequency;

/// Node identity and radio settings
pub mod node {
    use super::Frequency;

    /// This node's ID, unique within the network
    pub const NODE_ID: u8 = 11;

    /// Gateway that collects telemetry from this node
    pub const GATEWAY_ID: u8 = 2;

    /// Only nodes sharing a network ID see each other
    pub const NETWORK_ID: u8 = 200;

    /// Must match the radio module and local regulations
    pub const FREQUENCY: Frequency = Frequency::Mhz868;

    /// AES key shared between the node and the gateway (exactly 16 bytes)
    pub const ENCRYPT_KEY: &[u8; 16] = b"sampleEncryptKey";

    /// RFM69HW/HCW modules transmit at extra power
    pub const IS_RFM69HW: bool = true;

    /// Target RSSI for auto transmission control
    pub const ATC_RSSI: i16 = -75;

    /// Default transport retries per send
    pub const RETRIES: u8 = 2;

    /// Request an ACK by default
    pub const REQUEST_ACK: bool = true;

    /// Stamp each outgoing payload with a sequence byte
    pub const SEND_PACKET_ID: bool = true;
}

/// Protocol constants
pub mod protocol {
    /// Separates name from value in the payload
    pub const SEPARATOR: u8 = b':';

    /// Maximum payload the RFM69 packet engine carries after addressing
    pub const MAX_DATA_LEN: usize = 61;
}

/// Main-loop timing for the node task
pub mod task {
    /// Delay between receive polls
    pub const RX_POLL_INTERVAL_MS: u64 = 50;

    /// Cycles between heartbeat pings
    pub const PING_EVERY: u32 = 3;

    /// Length of one heartbeat cycle
    pub const PING_INTERVAL_MS: u64 = 10_000;

    /// Samples buffered for transmission
    pub const OUTBOX_SIZE: usize = 4;
}
