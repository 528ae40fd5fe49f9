//! RFM69 radio trait for abstraction and testability
//!
//! This trait defines the capabilities the message manager needs from the
//! RFM69 driver, allowing the hardware driver to be swapped with a mock for testing.
//! Addressing, retries, ACK timing, encryption and interrupt-driven reception
//! all live behind it.

use crate::config::protocol::MAX_DATA_LEN;
use core::future::Future;
use heapless::Vec;

/// Errors that can occur during RFM69 operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// No ACK arrived within the retry budget
    NoAck,
    /// Channel busy, could not transmit
    Busy,
    /// Payload does not fit in a single frame
    PayloadTooLarge,
    /// Operation timed out
    Timeout,
    /// SPI communication error
    SpiError,
    /// Radio not initialised
    NotInitialised,
    /// Radio already initialised
    AlreadyInitialised,
}

/// RFM69 frequency bands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Mhz315,
    Mhz433,
    Mhz868,
    Mhz915,
}

impl Frequency {
    /// Nominal centre frequency in Hz
    pub fn hz(&self) -> u32 {
        match self {
            Frequency::Mhz315 => 315_000_000,
            Frequency::Mhz433 => 433_000_000,
            Frequency::Mhz868 => 868_000_000,
            Frequency::Mhz915 => 915_000_000,
        }
    }
}

/// Start-up settings handed to the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioConfig {
    pub frequency: Frequency,
    pub node_id: u8,
    pub network_id: u8,
    /// AES-128 key, `None` leaves encryption off
    pub encrypt_key: Option<[u8; 16]>,
}

/// Fully received frame with metadata
#[derive(Debug, Clone, PartialEq)]
pub struct RxFrame {
    /// Node that sent the frame
    pub sender_id: u8,
    /// Node the frame was addressed to
    pub target_id: u8,
    /// Application payload (addressing bytes stripped)
    pub data: Vec<u8, MAX_DATA_LEN>,
    /// Received Signal Strength Indicator
    pub rssi: i16,
    /// Sender asked for an acknowledgement
    pub ack_requested: bool,
}

/// Abstract RFM69 radio interface
///
/// This trait allows the message manager to work with either a real RFM69
/// driver or a mock implementation for testing.
pub trait Rfm69Radio {
    /// Initialise the radio with band, addressing and key
    fn init(&mut self, config: &RadioConfig) -> impl Future<Output = Result<(), RadioError>>;

    /// Enable the PA boost of RFM69HW modules
    fn set_high_power(&mut self, enabled: bool) -> impl Future<Output = Result<(), RadioError>>;

    /// Enable auto transmission control towards a target RSSI
    fn set_target_rssi(&mut self, rssi: i16) -> impl Future<Output = Result<(), RadioError>>;

    /// Surface frames addressed to other nodes too
    fn set_promiscuous(&mut self, enabled: bool) -> impl Future<Output = Result<(), RadioError>>;

    /// Transmit a payload
    ///
    /// With `request_ack` set this resolves once an ACK arrives, retrying up to
    /// `retries` times before failing with [`RadioError::NoAck`].
    fn send(
        &mut self,
        destination: u8,
        data: &[u8],
        request_ack: bool,
        retries: u8,
    ) -> impl Future<Output = Result<(), RadioError>>;

    /// Acknowledge the frame most recently returned by `receive_done`
    fn send_ack(&mut self) -> impl Future<Output = Result<(), RadioError>>;

    /// Take a fully received frame, if one is ready
    ///
    /// Never waits: reception happens in the background and this only checks
    /// the ready flag.
    fn receive_done(&mut self) -> impl Future<Output = Option<RxFrame>>;
}

#[cfg(test)]
pub mod mock {
    //! Mock RFM69 radio for testing

    use super::*;
    use core::cell::RefCell;

    /// Record of a frame handed to `send()`
    #[derive(Debug, Clone, PartialEq)]
    pub struct TxRecord {
        pub destination: u8,
        pub data: Vec<u8, MAX_DATA_LEN>,
        pub request_ack: bool,
        pub retries: u8,
    }

    /// Mock RFM69 radio for unit testing
    pub struct MockRadio {
        /// Frames queued to be returned by receive_done()
        rx_queue: RefCell<Vec<RxFrame, 8>>,
        /// Record of transmitted frames
        tx_history: RefCell<Vec<TxRecord, 8>>,
        /// Configuration passed to init()
        config: RefCell<Option<RadioConfig>>,
        /// Error to return on next send
        next_tx_error: RefCell<Option<RadioError>>,
        /// Number of ACKs sent
        acks_sent: RefCell<u32>,
        high_power: RefCell<bool>,
        target_rssi: RefCell<Option<i16>>,
        promiscuous: RefCell<bool>,
    }

    impl MockRadio {
        /// Create a new mock radio
        pub fn new() -> Self {
            Self {
                rx_queue: RefCell::new(Vec::new()),
                tx_history: RefCell::new(Vec::new()),
                config: RefCell::new(None),
                next_tx_error: RefCell::new(None),
                acks_sent: RefCell::new(0),
                high_power: RefCell::new(false),
                target_rssi: RefCell::new(None),
                promiscuous: RefCell::new(false),
            }
        }

        /// Queue a frame to be returned by the next receive_done() call
        pub fn queue_rx_frame(&self, frame: RxFrame) {
            let _ = self.rx_queue.borrow_mut().push(frame);
        }

        /// Queue a frame built from its parts
        pub fn queue_rx(&self, sender_id: u8, target_id: u8, data: &[u8], rssi: i16, ack_requested: bool) {
            let mut payload = Vec::new();
            payload.extend_from_slice(data).unwrap();
            self.queue_rx_frame(RxFrame {
                sender_id,
                target_id,
                data: payload,
                rssi,
                ack_requested,
            });
        }

        /// Set an error to be returned by the next send() call
        pub fn set_next_tx_error(&self, error: RadioError) {
            *self.next_tx_error.borrow_mut() = Some(error);
        }

        /// Get all transmitted frames
        pub fn get_tx_history(&self) -> Vec<TxRecord, 8> {
            self.tx_history.borrow().clone()
        }

        pub fn get_config(&self) -> Option<RadioConfig> {
            self.config.borrow().clone()
        }

        pub fn acks_sent(&self) -> u32 {
            *self.acks_sent.borrow()
        }

        pub fn is_high_power(&self) -> bool {
            *self.high_power.borrow()
        }

        pub fn target_rssi(&self) -> Option<i16> {
            *self.target_rssi.borrow()
        }

        pub fn is_promiscuous(&self) -> bool {
            *self.promiscuous.borrow()
        }
    }

    impl Default for MockRadio {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Rfm69Radio for MockRadio {
        async fn init(&mut self, config: &RadioConfig) -> Result<(), RadioError> {
            *self.config.borrow_mut() = Some(config.clone());
            Ok(())
        }

        async fn set_high_power(&mut self, enabled: bool) -> Result<(), RadioError> {
            *self.high_power.borrow_mut() = enabled;
            Ok(())
        }

        async fn set_target_rssi(&mut self, rssi: i16) -> Result<(), RadioError> {
            *self.target_rssi.borrow_mut() = Some(rssi);
            Ok(())
        }

        async fn set_promiscuous(&mut self, enabled: bool) -> Result<(), RadioError> {
            *self.promiscuous.borrow_mut() = enabled;
            Ok(())
        }

        async fn send(
            &mut self,
            destination: u8,
            data: &[u8],
            request_ack: bool,
            retries: u8,
        ) -> Result<(), RadioError> {
            if self.config.borrow().is_none() {
                return Err(RadioError::NotInitialised);
            }

            let mut payload = Vec::new();
            payload
                .extend_from_slice(data)
                .map_err(|_| RadioError::PayloadTooLarge)?;
            let _ = self.tx_history.borrow_mut().push(TxRecord {
                destination,
                data: payload,
                request_ack,
                retries,
            });

            // Recorded even when failing, the frame did go on air
            if let Some(error) = self.next_tx_error.borrow_mut().take() {
                return Err(error);
            }

            Ok(())
        }

        async fn send_ack(&mut self) -> Result<(), RadioError> {
            *self.acks_sent.borrow_mut() += 1;
            Ok(())
        }

        async fn receive_done(&mut self) -> Option<RxFrame> {
            // Pop from front (FIFO order)
            let mut queue = self.rx_queue.borrow_mut();
            if queue.is_empty() {
                return None;
            }
            Some(queue.remove(0))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn radio_config() -> RadioConfig {
            RadioConfig {
                frequency: Frequency::Mhz868,
                node_id: 1,
                network_id: 100,
                encrypt_key: None,
            }
        }

        #[test]
        fn test_mock_send() {
            let mut radio = MockRadio::new();

            futures::executor::block_on(async {
                radio.init(&radio_config()).await.unwrap();

                radio.send(2, b"t:1", true, 3).await.unwrap();

                let history = radio.get_tx_history();
                assert_eq!(history.len(), 1);
                assert_eq!(history[0].destination, 2);
                assert_eq!(history[0].data.as_slice(), b"t:1");
                assert!(history[0].request_ack);
                assert_eq!(history[0].retries, 3);
            });
        }

        #[test]
        fn test_mock_send_before_init() {
            let mut radio = MockRadio::new();

            futures::executor::block_on(async {
                let result = radio.send(2, b"t:1", false, 0).await;
                assert_eq!(result, Err(RadioError::NotInitialised));
            });
        }

        #[test]
        fn test_mock_receive_fifo() {
            let mut radio = MockRadio::new();

            futures::executor::block_on(async {
                radio.queue_rx(3, 1, b"a:1", -40, false);
                radio.queue_rx(4, 1, b"b:2", -60, true);

                let first = radio.receive_done().await.unwrap();
                assert_eq!(first.sender_id, 3);
                assert_eq!(first.rssi, -40);

                let second = radio.receive_done().await.unwrap();
                assert_eq!(second.data.as_slice(), b"b:2");
                assert!(second.ack_requested);

                assert!(radio.receive_done().await.is_none());
            });
        }

        #[test]
        fn test_mock_tx_error() {
            let mut radio = MockRadio::new();

            futures::executor::block_on(async {
                radio.init(&radio_config()).await.unwrap();
                radio.set_next_tx_error(RadioError::NoAck);

                let result = radio.send(2, b"x:1", true, 2).await;
                assert_eq!(result, Err(RadioError::NoAck));

                // Error should be cleared, next call should succeed
                radio.send(2, b"x:2", true, 2).await.unwrap();
            });
        }

        #[test]
        fn test_frequency_hz() {
            assert_eq!(Frequency::Mhz433.hz(), 433_000_000);
            assert_eq!(Frequency::Mhz868.hz(), 868_000_000);
        }
    }
}
