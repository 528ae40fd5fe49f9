//! Node task driving the message manager from the main loop
//!
//! Polls the radio for inbound messages, transmits telemetry samples queued
//! by other tasks and sends a periodic heartbeat to the gateway.

use core::fmt::Write;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_time::{Duration, Instant, Timer};
use log::{error, info, warn};

use crate::config::task::{OUTBOX_SIZE, PING_EVERY, PING_INTERVAL_MS, RX_POLL_INTERVAL_MS};
use crate::manager::MessageManager;
use crate::protocol::packet::Field;
use crate::radio::Rfm69Radio;

/// Telemetry sample waiting to be sent to the gateway
#[derive(Debug, Clone)]
pub struct TelemetrySample {
    pub name: Field,
    pub value: Field,
}

/// Type alias for the outbox sender
pub type OutboxSender = Sender<'static, CriticalSectionRawMutex, TelemetrySample, OUTBOX_SIZE>;

/// Type alias for the outbox receiver
pub type OutboxReceiver = Receiver<'static, CriticalSectionRawMutex, TelemetrySample, OUTBOX_SIZE>;

/// Samples produced by sensor tasks, consumed by the node task
pub static NODE_OUTBOX: Channel<CriticalSectionRawMutex, TelemetrySample, OUTBOX_SIZE> =
    Channel::new();

/// Queue a sample without waiting
///
/// Returns false if the name or value is too long or the outbox is full.
pub fn queue_sample(sender: &OutboxSender, name: &str, value: &str) -> bool {
    let mut sample = TelemetrySample {
        name: Field::new(),
        value: Field::new(),
    };
    if sample.name.push_str(name).is_err() || sample.value.push_str(value).is_err() {
        return false;
    }
    sender.try_send(sample).is_ok()
}

/// Task that runs the node
///
/// Inbound messages reach the handler registered on `manager`. Samples are
/// sent with the configured retries and ACK setting; a failed sample is
/// dropped.
pub async fn node_task<R: Rfm69Radio>(mut manager: MessageManager<'_, R>, outbox: OutboxReceiver) {
    info!("Node: Initialising radio...");
    if let Err(e) = manager.initialize().await {
        error!("Node: Radio init failed ({:?})", e);
        return;
    }

    let mut last_cycle = Instant::now();
    let mut cycles: u32 = 0;

    loop {
        // Drain every frame that arrived since the last pass
        manager.drain().await;

        while let Ok(sample) = outbox.try_receive() {
            if !manager.report(&sample.name, &sample.value).await {
                warn!("Node: Sample '{}' lost", sample.name);
            }
        }

        if last_cycle.elapsed() >= Duration::from_millis(PING_INTERVAL_MS) {
            last_cycle = Instant::now();
            cycles = cycles.wrapping_add(1);

            if cycles % PING_EVERY == 0 {
                let mut value = Field::new();
                let _ = write!(value, "{}", cycles);
                if !manager.report("ping", &value).await {
                    warn!("Node: Ping {} not delivered", cycles);
                }
            }
        }

        Timer::after(Duration::from_millis(RX_POLL_INTERVAL_MS)).await;
    }
}
