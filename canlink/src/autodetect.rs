//! Bitrate autodetection
//!
//! Each candidate is tried in the configured order. The controller is reinitialized with the
//! candidate timing and the receive filter is opened, so that any traffic at the right bitrate
//! is observable. A candidate is confirmed either passively, by any successful reception, or
//! actively, by a probe frame that completes its transfer (i.e. was acknowledged by another
//! node).
//!
//! Detection reconfigures and silences the controller. It must not run concurrently with
//! normal traffic processing on the same port.

use canlink_core::{Bitrate, IdType};
use canlink_driver::controller::{Controller, DataInfo, MailboxIdx};
use canlink_driver::frame::{DataLength, Frame};

use crate::port::Port;
use crate::tx::{Poll, poll_transfer};

impl<C: Controller> Port<C> {
    /// Scans the candidate list and returns the first confirmed bitrate, or `Unknown`.
    ///
    /// On success the controller stays configured for the returned bitrate with an open
    /// receive filter. In listen-only mode no probe frame is transmitted.
    pub fn autodetect(&mut self, listen_only: bool) -> Bitrate {
        let order = self.config.autodetect.order;
        for candidate in order {
            if !candidate.is_known() {
                continue;
            }
            debug!("autodetect: trying {:?}", candidate);

            if let Err(e) = self.reinit(candidate) {
                warn!("autodetect: {:?} rejected by controller: {:?}", candidate, e);
                continue;
            }
            self.open_filter();

            if self.listen() || (!listen_only && self.probe()) {
                info!("autodetect: bitrate {:?} confirmed", candidate);
                self.bitrate = candidate;
                return candidate;
            }
        }

        self.bitrate = Bitrate::Unknown;
        warn!("autodetect: no candidate confirmed");
        Bitrate::Unknown
    }

    /// Passive phase. Any successful reception confirms the candidate.
    fn listen(&mut self) -> bool {
        let attempts = self.config.autodetect.listen_attempts;
        let timeout = self.config.autodetect.listen_timeout;
        let mut frame = Frame::empty();
        for _ in 0..attempts {
            if self.controller.blocking_receive(&mut frame, timeout).is_ok() {
                trace!("autodetect: received id {:#x}", frame.id);
                return true;
            }
        }
        false
    }

    /// Active phase. A completed probe transfer confirms the candidate.
    fn probe(&mut self) -> bool {
        let mailbox = self.config.probe_mailbox();
        let payload = [self.config.autodetect.probe_payload];
        let id = self.config.autodetect.probe_id;
        let info = DataInfo {
            length: unwrap!(DataLength::new(payload.len())),
            id_type: IdType::Standard,
            fd: false,
            bit_rate_switch: true,
            remote: false,
        };

        if self.controller.configure_tx_mailbox(mailbox, &info, id).is_err() {
            return false;
        }

        let budget = self.config.autodetect.probe_spin_budget;
        let confirmed = match self.controller.transmit(mailbox, &info, id, &payload) {
            Ok(()) | Err(nb::Error::WouldBlock) => {
                poll_transfer(&mut self.controller, mailbox, budget) == Poll::Complete
            }
            Err(nb::Error::Other(_)) => false,
        };

        if !confirmed {
            self.abort_probe(mailbox);
        }
        confirmed
    }

    fn abort_probe(&mut self, mailbox: MailboxIdx) {
        trace!("autodetect: probe aborted on mailbox {}", u8::from(mailbox));
        self.controller.abort_transfer(mailbox);
    }
}
