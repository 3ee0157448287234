//! Upstream delivery
//!
//! Completed receptions and transmissions are handed to the upstream inspection engine as
//! [`Delivery`] values. A driver interrupt handler that must not run the engine itself can push
//! them through a [`DeliveryQueue`] and let the foreground drain it.

use core::sync::atomic::{AtomicU32, Ordering};

use canlink_driver::frame::Frame;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;

/// Notification for the upstream inspection engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Delivery {
    /// An accepted frame was received on `instance`
    Received { instance: usize, frame: Frame },
    /// A transfer finished on `instance`; the engine may supply its next queued frame
    TransmitComplete { instance: usize },
}

impl Delivery {
    pub fn instance(&self) -> usize {
        match self {
            Delivery::Received { instance, .. } => *instance,
            Delivery::TransmitComplete { instance } => *instance,
        }
    }
}

/// Bounded interrupt-to-foreground delivery handoff
///
/// A full queue drops the new delivery and counts it.
pub struct DeliveryQueue<M: RawMutex, const N: usize> {
    channel: Channel<M, Delivery, N>,
    dropped: AtomicU32,
}

impl<M: RawMutex, const N: usize> DeliveryQueue<M, N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Enqueues a delivery. Returns it back if the queue is full.
    pub fn push(&self, delivery: Delivery) -> Result<(), Delivery> {
        self.channel.try_send(delivery).map_err(|_| {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!("delivery queue full, instance {} dropped", delivery.instance());
            delivery
        })
    }

    pub fn pop(&self) -> Option<Delivery> {
        self.channel.try_receive().ok()
    }

    /// Drains the queue into `handler` in arrival order.
    pub fn drain(&self, mut handler: impl FnMut(Delivery)) -> usize {
        let mut count = 0;
        while let Some(delivery) = self.pop() {
            handler(delivery);
            count += 1;
        }
        count
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Deliveries lost to a full queue
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<M: RawMutex, const N: usize> Default for DeliveryQueue<M, N> {
    fn default() -> Self {
        Self::new()
    }
}
