//! Controller driver collaborator

use canlink_core::{BitTiming, Error, IdType};

use crate::frame::{DataLength, Frame, Mtu};
use crate::time::Duration;

/// Controller configuration applied on (re)initialization
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    /// Nominal bit timing
    pub bit_timing: BitTiming,
    /// Payload width
    pub payload: Mtu,
    /// Number of hardware message buffers (mailboxes)
    pub mailbox_count: u8,
    /// Number of receive ID filter entries
    pub filter_count: u8,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            bit_timing: BitTiming::default(),
            payload: Mtu::Classic,
            mailbox_count: 48,
            filter_count: 48,
        }
    }
}

/// Hardware message buffer index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MailboxIdx(u8);

impl MailboxIdx {
    pub const fn new(value: u8) -> Self {
        Self(value)
    }
}

impl From<MailboxIdx> for u8 {
    fn from(idx: MailboxIdx) -> u8 {
        idx.0
    }
}

impl From<MailboxIdx> for usize {
    fn from(idx: MailboxIdx) -> usize {
        idx.0.into()
    }
}

/// Receive slot of the double buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxSlot {
    A,
    B,
}

impl RxSlot {
    pub const fn index(self) -> usize {
        match self {
            RxSlot::A => 0,
            RxSlot::B => 1,
        }
    }

    pub const fn other(self) -> Self {
        match self {
            RxSlot::A => RxSlot::B,
            RxSlot::B => RxSlot::A,
        }
    }
}

/// Transfer description used to configure a transmit mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataInfo {
    pub length: DataLength,
    pub id_type: IdType,
    pub fd: bool,
    pub bit_rate_switch: bool,
    pub remote: bool,
}

impl DataInfo {
    /// Classic data frame of the given length
    pub const fn classic(length: DataLength, id_type: IdType) -> Self {
        Self {
            length,
            id_type,
            fd: false,
            bit_rate_switch: false,
            remote: false,
        }
    }
}

/// Hardware completion reported from the interrupt context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// The armed receive slot was filled with the carried frame
    RxComplete(Frame),
    /// A mailbox transfer finished
    TxComplete,
}

/// A single CAN controller instance
///
/// Implementations must not block except in `blocking_receive`, which is bounded by its
/// timeout. All other long-running operations are expressed with `nb::Result`, where
/// `WouldBlock` means "in progress".
pub trait Controller {
    /// First-time initialization. Leaves the controller running with `config`.
    fn initialize(&mut self, config: &ControllerConfig) -> Result<(), Error>;

    /// Reinitialization with a new configuration. Pending transfers are dropped.
    fn reinitialize(&mut self, config: &ControllerConfig) -> Result<(), Error>;

    /// Replaces the bit timing of a running controller.
    fn set_bit_timing(&mut self, timing: &BitTiming) -> Result<(), Error>;

    /// Makes `slot` the target of the next received frame.
    fn arm_receive(&mut self, slot: RxSlot);

    /// Receives a single frame into `buffer`, waiting at most `timeout`.
    fn blocking_receive(&mut self, buffer: &mut Frame, timeout: Duration) -> Result<(), Error>;

    fn configure_tx_mailbox(
        &mut self,
        mailbox: MailboxIdx,
        info: &DataInfo,
        id: u32,
    ) -> Result<(), Error>;

    /// Starts a transfer. `WouldBlock` means the transfer was accepted and is in progress.
    fn transmit(
        &mut self,
        mailbox: MailboxIdx,
        info: &DataInfo,
        id: u32,
        data: &[u8],
    ) -> nb::Result<(), Error>;

    /// Transfer status of a mailbox. `Ok` once completed, `WouldBlock` while in progress.
    fn transfer_status(&mut self, mailbox: MailboxIdx) -> nb::Result<(), Error>;

    /// Aborts any transfer on a mailbox and releases it.
    fn abort_transfer(&mut self, mailbox: MailboxIdx);

    /// Sets the global receive acceptance mask. A zero mask accepts every frame.
    fn set_rx_mask(&mut self, id_type: IdType, mask: u32);

    /// Programs the receive ID filter entries.
    fn configure_rx_filter(&mut self, id_type: IdType, ids: &[u32]);
}
