//! Port configuration

use canlink_core::{Bitrate, Error};
use canlink_driver::controller::{ControllerConfig, MailboxIdx};
use canlink_driver::time::Duration;

/// Default capacity of the receive ID filter table
pub const DEFAULT_FILTER_CAPACITY: usize = 48;

/// Bitrate autodetection parameters
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AutodetectConfig {
    /// Candidates in trial order. Ordered by deployment likelihood, not by speed.
    pub order: [Bitrate; Bitrate::KNOWN_COUNT],
    /// Blocking receive attempts per candidate during the passive phase
    pub listen_attempts: u8,
    /// Timeout of a single passive receive attempt
    pub listen_timeout: Duration,
    /// Transfer status polls of the probe frame
    pub probe_spin_budget: u32,
    /// Identifier of the probe frame (standard format)
    pub probe_id: u32,
    /// Single payload byte of the probe frame
    pub probe_payload: u8,
}

impl Default for AutodetectConfig {
    fn default() -> Self {
        Self {
            order: [
                Bitrate::Kbps500,
                Bitrate::Kbps125,
                Bitrate::Kbps250,
                Bitrate::Kbps800,
                Bitrate::Mbps1,
            ],
            listen_attempts: 5,
            listen_timeout: Duration::from_millis(20),
            probe_spin_budget: 10_000,
            probe_id: 0x001,
            probe_payload: 0xDC,
        }
    }
}

/// Per-port configuration
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortConfig {
    /// Controller configuration. The bit timing is overwritten on every (re)initialization.
    pub controller: ControllerConfig,
    /// First transmit mailbox. Mailboxes below it are reserved for receive filtering.
    pub tx_mailbox_start: u8,
    /// Transfer status polls per transmit mailbox
    pub tx_spin_budget: u32,
    pub autodetect: AutodetectConfig,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            controller: ControllerConfig::default(),
            tx_mailbox_start: DEFAULT_FILTER_CAPACITY as u8 - 1,
            tx_spin_budget: 10_000,
            autodetect: AutodetectConfig::default(),
        }
    }
}

impl PortConfig {
    /// Checks the mailbox layout: the transmit pool must not be empty.
    pub fn validate(&self) -> Result<(), Error> {
        if self.tx_mailbox_start >= self.controller.mailbox_count {
            return Err(Error::InvalidArgument);
        }
        if self.tx_spin_budget == 0 || self.autodetect.probe_spin_budget == 0 {
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }

    /// Transmit mailbox pool, `[tx_mailbox_start, mailbox_count)`
    pub fn tx_mailboxes(&self) -> impl Iterator<Item = MailboxIdx> + use<> {
        (self.tx_mailbox_start..self.controller.mailbox_count).map(MailboxIdx::new)
    }

    /// Highest-index mailbox, claimed by the autodetection probe
    pub fn probe_mailbox(&self) -> MailboxIdx {
        MailboxIdx::new(self.controller.mailbox_count.saturating_sub(1))
    }
}
