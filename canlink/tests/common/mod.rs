#![allow(dead_code)]

use std::collections::HashMap;
use std::vec::Vec;

use canlink::config::PortConfig;
use canlink::controller::{Controller, ControllerConfig, DataInfo, MailboxIdx, RxSlot};
use canlink::frame::{Data, Frame};
use canlink::time::Duration;
use canlink::{BitTiming, Bitrate, Error, IdType};

/// Scripted behavior of a transmit mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Completes on the first status poll
    Complete,
    /// Mailbox configuration is refused with `Busy`
    Busy,
    /// Accepted, then in progress forever
    Stalled,
    /// Accepted, then the status reports an error
    Fail(Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Initialize(BitTiming),
    Reinitialize(BitTiming),
    SetBitTiming(BitTiming),
    Arm(RxSlot),
    Receive,
    Configure(u8, u32),
    Transmit(u8, u32, Vec<u8>),
    Abort(u8),
    Mask(IdType, u32),
    Filter(IdType, Vec<u32>),
}

/// Simulated controller attached to a bus running at `bus` (`None`: no bus)
#[derive(Debug, Default)]
pub struct SimController {
    pub bus: Option<Bitrate>,
    /// Other nodes keep transmitting
    pub traffic: bool,
    /// Another node acknowledges transmitted frames
    pub peer: bool,
    /// Timings the controller refuses to initialize with
    pub rejected: Vec<BitTiming>,
    /// Mailbox outcomes overriding the bus behavior
    pub script: HashMap<u8, Outcome>,
    /// Mailbox configurations refused with `Busy` before the script applies
    pub refusals: u32,
    pub timing: Option<BitTiming>,
    pub armed: Option<RxSlot>,
    pub calls: Vec<Call>,
    pub polls: HashMap<u8, u32>,
    pending: HashMap<u8, Outcome>,
}

impl SimController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bus with other transmitting nodes
    pub fn busy_bus(bitrate: Bitrate) -> Self {
        Self {
            bus: Some(bitrate),
            traffic: true,
            peer: true,
            ..Self::default()
        }
    }

    /// Bus with a single silent node that acknowledges frames
    pub fn quiet_bus(bitrate: Bitrate) -> Self {
        Self {
            bus: Some(bitrate),
            peer: true,
            ..Self::default()
        }
    }

    pub fn with_script(mut self, mailbox: u8, outcome: Outcome) -> Self {
        self.script.insert(mailbox, outcome);
        self
    }

    fn on_bus(&self) -> bool {
        matches!((self.bus, self.timing), (Some(bus), Some(timing)) if bus.timing() == timing)
    }

    fn outcome(&self, mailbox: u8) -> Outcome {
        match self.script.get(&mailbox) {
            Some(outcome) => *outcome,
            None if self.peer && self.on_bus() => Outcome::Complete,
            None => Outcome::Stalled,
        }
    }

    /// Timings of every (re)initialization, in call order
    pub fn init_timings(&self) -> Vec<BitTiming> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Initialize(timing) | Call::Reinitialize(timing) => Some(*timing),
                _ => None,
            })
            .collect()
    }

    pub fn transmits(&self) -> Vec<(u8, u32, Vec<u8>)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Transmit(mailbox, id, data) => Some((*mailbox, *id, data.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn configured_mailboxes(&self) -> Vec<u8> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Configure(mailbox, _) => Some(*mailbox),
                _ => None,
            })
            .collect()
    }

    pub fn aborts(&self) -> Vec<u8> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Abort(mailbox) => Some(*mailbox),
                _ => None,
            })
            .collect()
    }

    pub fn receive_attempts(&self) -> usize {
        self.calls.iter().filter(|call| **call == Call::Receive).count()
    }

    fn init(&mut self, config: &ControllerConfig) -> Result<(), Error> {
        if self.rejected.contains(&config.bit_timing) {
            self.timing = None;
            return Err(Error::HardwareInit);
        }
        self.timing = Some(config.bit_timing);
        self.pending.clear();
        Ok(())
    }
}

impl Controller for SimController {
    fn initialize(&mut self, config: &ControllerConfig) -> Result<(), Error> {
        self.calls.push(Call::Initialize(config.bit_timing));
        self.init(config)
    }

    fn reinitialize(&mut self, config: &ControllerConfig) -> Result<(), Error> {
        self.calls.push(Call::Reinitialize(config.bit_timing));
        self.init(config)
    }

    fn set_bit_timing(&mut self, timing: &BitTiming) -> Result<(), Error> {
        self.calls.push(Call::SetBitTiming(*timing));
        self.timing = Some(*timing);
        Ok(())
    }

    fn arm_receive(&mut self, slot: RxSlot) {
        self.calls.push(Call::Arm(slot));
        self.armed = Some(slot);
    }

    fn blocking_receive(&mut self, buffer: &mut Frame, _timeout: Duration) -> Result<(), Error> {
        self.calls.push(Call::Receive);
        if self.traffic && self.on_bus() {
            *buffer = Frame::new(0x321, unwrap_data(&[0xAA, 0x55]));
            Ok(())
        } else {
            Err(Error::Timeout)
        }
    }

    fn configure_tx_mailbox(
        &mut self,
        mailbox: MailboxIdx,
        _info: &DataInfo,
        id: u32,
    ) -> Result<(), Error> {
        let mailbox = u8::from(mailbox);
        self.calls.push(Call::Configure(mailbox, id));
        if self.refusals > 0 {
            self.refusals -= 1;
            return Err(Error::Busy);
        }
        match self.outcome(mailbox) {
            Outcome::Busy => Err(Error::Busy),
            _ => Ok(()),
        }
    }

    fn transmit(
        &mut self,
        mailbox: MailboxIdx,
        _info: &DataInfo,
        id: u32,
        data: &[u8],
    ) -> nb::Result<(), Error> {
        let mailbox = u8::from(mailbox);
        self.calls.push(Call::Transmit(mailbox, id, data.to_vec()));
        let outcome = self.outcome(mailbox);
        self.pending.insert(mailbox, outcome);
        Err(nb::Error::WouldBlock)
    }

    fn transfer_status(&mut self, mailbox: MailboxIdx) -> nb::Result<(), Error> {
        let mailbox = u8::from(mailbox);
        *self.polls.entry(mailbox).or_default() += 1;
        match self.pending.get(&mailbox) {
            Some(Outcome::Complete) => {
                self.pending.remove(&mailbox);
                Ok(())
            }
            Some(Outcome::Fail(e)) => Err(nb::Error::Other(*e)),
            Some(Outcome::Stalled) => Err(nb::Error::WouldBlock),
            Some(Outcome::Busy) | None => Err(nb::Error::Other(Error::InvalidArgument)),
        }
    }

    fn abort_transfer(&mut self, mailbox: MailboxIdx) {
        let mailbox = u8::from(mailbox);
        self.calls.push(Call::Abort(mailbox));
        self.pending.remove(&mailbox);
    }

    fn set_rx_mask(&mut self, id_type: IdType, mask: u32) {
        self.calls.push(Call::Mask(id_type, mask));
    }

    fn configure_rx_filter(&mut self, id_type: IdType, ids: &[u32]) {
        self.calls.push(Call::Filter(id_type, ids.to_vec()));
    }
}

fn unwrap_data(bytes: &[u8]) -> Data {
    Data::new(bytes).unwrap()
}

pub fn frame(id: u32, bytes: &[u8]) -> Frame {
    Frame::new(id, unwrap_data(bytes))
}

/// Port configuration with a four mailbox transmit pool `[44, 48)` and short spin budgets
pub fn config() -> PortConfig {
    let mut config = PortConfig::default();
    config.tx_mailbox_start = 44;
    config.tx_spin_budget = 100;
    config.autodetect.probe_spin_budget = 100;
    config
}
