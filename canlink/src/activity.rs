//! Bus activity indication
//!
//! The link latches a flag per direction whenever a frame is received or transmitted.
//! [`Activity::update`] is meant to be called from the foreground loop. Every `period` calls it
//! toggles the pin of each direction with a raised flag and turns the others off.

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::StatefulOutputPin;

/// Receive and transmit activity latches
#[derive(Debug, Default)]
pub struct ActivityFlags {
    rx: AtomicBool,
    tx: AtomicBool,
}

impl ActivityFlags {
    pub const fn new() -> Self {
        Self {
            rx: AtomicBool::new(false),
            tx: AtomicBool::new(false),
        }
    }

    pub fn mark_rx(&self) {
        self.rx.store(true, Ordering::Relaxed);
    }

    pub fn mark_tx(&self) {
        self.tx.store(true, Ordering::Relaxed);
    }

    /// Clears the receive latch and returns its previous state.
    pub fn take_rx(&self) -> bool {
        self.rx.swap(false, Ordering::Relaxed)
    }

    /// Clears the transmit latch and returns its previous state.
    pub fn take_tx(&self) -> bool {
        self.tx.swap(false, Ordering::Relaxed)
    }
}

/// Activity indicator driving one pin per direction
pub struct Activity<RX, TX> {
    rx_pin: RX,
    tx_pin: TX,
    period: u32,
    ticks: u32,
}

impl<RX: StatefulOutputPin, TX: StatefulOutputPin> Activity<RX, TX> {
    pub const DEFAULT_PERIOD: u32 = 1000;

    pub fn new(rx_pin: RX, tx_pin: TX, period: u32) -> Self {
        Self {
            rx_pin,
            tx_pin,
            period,
            ticks: 0,
        }
    }

    /// Advances the tick counter and refreshes the pins once per period.
    pub fn update(&mut self, flags: &ActivityFlags) -> Result<(), Error<RX::Error, TX::Error>> {
        if self.ticks < self.period {
            self.ticks += 1;
            return Ok(());
        }
        self.ticks = 0;

        if flags.take_rx() {
            self.rx_pin.toggle().map_err(Error::Rx)?;
        } else {
            self.rx_pin.set_low().map_err(Error::Rx)?;
        }
        if flags.take_tx() {
            self.tx_pin.toggle().map_err(Error::Tx)?;
        } else {
            self.tx_pin.set_low().map_err(Error::Tx)?;
        }
        Ok(())
    }

    pub fn release(self) -> (RX, TX) {
        (self.rx_pin, self.tx_pin)
    }
}

/// Pin error of an activity indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<RE, TE> {
    Rx(RE),
    Tx(TE),
}
