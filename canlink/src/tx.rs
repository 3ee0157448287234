//! Transmit engine
//!
//! A frame is sent by claiming a mailbox from the transmit pool, polling it for completion with a
//! bounded spin budget and, on failure, aborting that mailbox and retrying on the next one. The
//! linear scan over the pool absorbs transient contention with other senders.

use core::sync::atomic::{AtomicU32, Ordering};

use canlink_core::{Error, IdType};
use canlink_driver::controller::{Controller, DataInfo, MailboxIdx};
use canlink_driver::frame::Frame;

use crate::port::Port;

/// Outcome of a bounded transfer status poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Poll {
    Complete,
    Failed(Error),
    Exhausted,
}

/// Polls the transfer status of `mailbox` at most `budget` times.
pub(crate) fn poll_transfer<C: Controller>(
    controller: &mut C,
    mailbox: MailboxIdx,
    budget: u32,
) -> Poll {
    for _ in 0..budget {
        match controller.transfer_status(mailbox) {
            Ok(()) => return Poll::Complete,
            Err(nb::Error::WouldBlock) => {}
            Err(nb::Error::Other(e)) => return Poll::Failed(e),
        }
    }
    Poll::Exhausted
}

/// Link-wide count of unrecoverable transmit failures
///
/// Monotonic. The link never resets it.
#[derive(Debug, Default)]
pub struct ErrorCounter(AtomicU32);

impl ErrorCounter {
    pub const fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }
}

impl<C: Controller> Port<C> {
    /// Checks that `frame` can be carried by this port as `id_type`.
    pub fn check_frame(&self, frame: &Frame, id_type: IdType) -> Result<DataInfo, Error> {
        if frame.typed_id(id_type).is_none() {
            return Err(Error::InvalidArgument);
        }
        let length = frame.data.length();
        if !length.fits(self.config.controller.payload) {
            return Err(Error::InvalidArgument);
        }
        Ok(DataInfo::classic(length, id_type))
    }

    /// Sends `frame` and waits for its completion, retrying over the mailbox pool.
    ///
    /// Returns the last mailbox error once every mailbox of the pool has failed. The error
    /// counter is incremented once per exhausted pool.
    pub fn send(&mut self, frame: &Frame, id_type: IdType, errors: &ErrorCounter) -> Result<(), Error> {
        let info = self.check_frame(frame, id_type)?;
        let budget = self.config.tx_spin_budget;
        let mut last_error = Error::Busy;

        for mailbox in self.config.tx_mailboxes() {
            match self.try_mailbox(mailbox, &info, frame, budget) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    debug!("send: mailbox {} failed: {:?}", u8::from(mailbox), e);
                    self.controller.abort_transfer(mailbox);
                    last_error = e;
                }
            }
        }

        errors.increment();
        warn!("send: id {:#x} failed on every mailbox: {:?}", frame.id, last_error);
        Err(last_error)
    }

    fn try_mailbox(
        &mut self,
        mailbox: MailboxIdx,
        info: &DataInfo,
        frame: &Frame,
        budget: u32,
    ) -> Result<(), Error> {
        self.controller.configure_tx_mailbox(mailbox, info, frame.id)?;
        match self.controller.transmit(mailbox, info, frame.id, &frame.data) {
            Ok(()) | Err(nb::Error::WouldBlock) => {}
            Err(nb::Error::Other(e)) => return Err(e),
        }
        match poll_transfer(&mut self.controller, mailbox, budget) {
            Poll::Complete => Ok(()),
            Poll::Failed(e) => Err(e),
            Poll::Exhausted => Err(Error::Timeout),
        }
    }

    /// Starts a transfer on the first pool mailbox without waiting for its completion.
    ///
    /// Completion is reported through a transmit-complete event.
    pub fn start_transmit(&mut self, frame: &Frame, id_type: IdType) -> Result<(), Error> {
        let info = self.check_frame(frame, id_type)?;
        let mailbox = MailboxIdx::new(self.config.tx_mailbox_start);
        self.controller.configure_tx_mailbox(mailbox, &info, frame.id)?;
        match self.controller.transmit(mailbox, &info, frame.id, &frame.data) {
            Ok(()) | Err(nb::Error::WouldBlock) => Ok(()),
            Err(nb::Error::Other(e)) => Err(e),
        }
    }
}
