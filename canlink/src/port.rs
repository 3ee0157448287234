//! Per-instance controller handle

use canlink_core::{BitTiming, Bitrate, Error, IdType};
use canlink_driver::controller::{Controller, ControllerConfig};
use canlink_driver::frame::Frame;

use crate::config::PortConfig;
use crate::rx::RxSlots;

/// Acceptance mask that makes every identifier bit significant
pub const MATCH_ALL_BITS: u32 = IdType::EXTENDED_MASK;

/// One CAN controller instance with its active configuration and receive slots
///
/// The configuration is mutated only on (re)initialization. Every other component reads it.
pub struct Port<C> {
    pub(crate) controller: C,
    pub(crate) config: PortConfig,
    pub(crate) rx: RxSlots,
    pub(crate) bitrate: Bitrate,
}

impl<C: Controller> Port<C> {
    pub fn new(controller: C, config: PortConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self::with_config(controller, config))
    }

    /// Creates a port from an already validated configuration.
    pub(crate) fn with_config(controller: C, config: PortConfig) -> Self {
        Self {
            controller,
            config,
            rx: RxSlots::new(),
            bitrate: Bitrate::Unknown,
        }
    }

    pub fn config(&self) -> &PortConfig {
        &self.config
    }

    pub fn controller_config(&self) -> &ControllerConfig {
        &self.config.controller
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    pub fn rx_slots(&self) -> &RxSlots {
        &self.rx
    }

    /// Confirmed bitrate, `Unknown` until initialization or detection succeeds
    pub fn bitrate(&self) -> Bitrate {
        self.bitrate
    }

    pub fn bit_timing(&self) -> BitTiming {
        self.config.controller.bit_timing
    }

    /// First-time initialization. `Unknown` falls back to the default candidate.
    pub fn init(&mut self, bitrate: Bitrate) -> Result<(), Error> {
        self.config.controller.bit_timing = bitrate.timing();
        let result = self.controller.initialize(&self.config.controller);
        self.finish_init(bitrate, result)
    }

    /// Reinitialization with the timing of `bitrate`. `Unknown` falls back to the default
    /// candidate.
    pub fn reinit(&mut self, bitrate: Bitrate) -> Result<(), Error> {
        self.config.controller.bit_timing = bitrate.timing();
        let result = self.controller.reinitialize(&self.config.controller);
        self.finish_init(bitrate, result)
    }

    fn finish_init(&mut self, bitrate: Bitrate, result: Result<(), Error>) -> Result<(), Error> {
        // The receive slot is armed regardless, a failed controller ignores it
        self.rx.arm(&mut self.controller);
        match result {
            Ok(()) => {
                self.bitrate = if bitrate.is_known() {
                    bitrate
                } else {
                    Bitrate::DEFAULT
                };
                Ok(())
            }
            Err(e) => {
                self.bitrate = Bitrate::Unknown;
                Err(e)
            }
        }
    }

    /// Replaces the bit timing without reinitialization.
    pub fn set_bitrate(&mut self, bitrate: Bitrate) -> Result<(), Error> {
        let timing = bitrate.try_timing().ok_or(Error::InvalidArgument)?;
        self.controller.set_bit_timing(&timing)?;
        self.config.controller.bit_timing = timing;
        self.bitrate = bitrate;
        Ok(())
    }

    /// Arms the active receive slot.
    pub fn start_receive(&mut self) {
        self.rx.arm(&mut self.controller);
    }

    /// Accepts every frame regardless of its identifier.
    pub fn open_filter(&mut self) {
        self.controller.set_rx_mask(IdType::Extended, 0);
    }

    /// Programs `slots` as the receive ID filter with an exact-match mask.
    pub fn apply_filter(&mut self, slots: &[u32]) {
        self.controller.set_rx_mask(IdType::Extended, MATCH_ALL_BITS);
        self.controller.configure_rx_filter(IdType::Standard, slots);
    }

    /// Stores a completed reception in the armed slot and hands it over.
    pub(crate) fn complete_receive(&mut self, frame: Frame) -> Frame {
        *self.rx.active_mut() = frame;
        self.rx.take_message(&mut self.controller)
    }

    /// Takes the frame of the just-completed reception, see [`RxSlots::take_message`].
    pub fn take_message(&mut self) -> Frame {
        self.rx.take_message(&mut self.controller)
    }
}
