//! Double-buffered receive handoff

use core::sync::atomic::{AtomicBool, Ordering};

use canlink_driver::controller::{Controller, RxSlot};
use canlink_driver::frame::Frame;

/// Receive slot pair
///
/// Exactly one slot is active (armed for the controller to fill) and the other one is ready
/// (holds the last completed frame for the consumer). The roles swap with a single atomic
/// flag toggle on every completed reception.
#[derive(Debug)]
pub struct RxSlots {
    buffers: [Frame; 2],
    // false: slot A is active
    active_b: AtomicBool,
}

impl RxSlots {
    pub const fn new() -> Self {
        Self {
            buffers: [Frame::empty(); 2],
            active_b: AtomicBool::new(false),
        }
    }

    /// Slot currently owned by the controller
    pub fn active(&self) -> RxSlot {
        if self.active_b.load(Ordering::Acquire) {
            RxSlot::B
        } else {
            RxSlot::A
        }
    }

    /// Slot holding the last completed frame
    pub fn ready(&self) -> RxSlot {
        self.active().other()
    }

    /// Frame stored in `slot`
    pub fn get(&self, slot: RxSlot) -> &Frame {
        &self.buffers[slot.index()]
    }

    /// Fill target of the controller
    pub fn active_mut(&mut self) -> &mut Frame {
        let slot = self.active();
        &mut self.buffers[slot.index()]
    }

    /// Re-arms the controller on the active slot.
    pub fn arm<C: Controller>(&self, controller: &mut C) {
        controller.arm_receive(self.active());
    }

    /// Takes the frame of the just-completed reception.
    ///
    /// Captures the active slot, flips the roles and immediately re-arms the controller on the
    /// new active slot. Must run exactly once per receive-complete event, before the consumer
    /// touches the previously ready slot.
    pub fn take_message<C: Controller>(&mut self, controller: &mut C) -> Frame {
        let was_b = self.active_b.fetch_xor(true, Ordering::AcqRel);
        let filled = if was_b { RxSlot::B } else { RxSlot::A };
        controller.arm_receive(filled.other());
        self.buffers[filled.index()]
    }
}

impl Default for RxSlots {
    fn default() -> Self {
        Self::new()
    }
}
