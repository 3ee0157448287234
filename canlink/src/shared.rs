//! Link shared between interrupt and foreground contexts

use core::cell::RefCell;

use canlink_core::Error;
use canlink_driver::controller::{Controller, Event};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::config::DEFAULT_FILTER_CAPACITY;
use crate::delivery::{Delivery, DeliveryQueue};
use crate::link::Link;

/// [`Link`] behind a blocking mutex
///
/// With a critical-section mutex, a foreground operation cannot be preempted by the event path
/// of the same link. Long operations (autodetection, blocking send) hold the lock for their
/// entire duration.
pub struct SharedLink<M: RawMutex, C, const P: usize, const F: usize = DEFAULT_FILTER_CAPACITY> {
    inner: Mutex<M, RefCell<Link<C, P, F>>>,
}

impl<M: RawMutex, C: Controller, const P: usize, const F: usize> SharedLink<M, C, P, F> {
    pub fn new(link: Link<C, P, F>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(link)),
        }
    }

    /// Runs `f` with exclusive access to the link.
    pub fn lock<R>(&self, f: impl FnOnce(&mut Link<C, P, F>) -> R) -> R {
        self.inner.lock(|link| f(&mut link.borrow_mut()))
    }

    /// Interrupt entry point: handles `event` of `instance`.
    pub fn on_interrupt(&self, instance: usize, event: Event) -> Result<Delivery, Error> {
        self.lock(|link| link.handle_event(instance, event))
    }

    /// Interrupt entry point that defers the delivery to `queue`.
    ///
    /// A full queue drops the delivery, the slot swap has already happened.
    pub fn on_interrupt_queued<const N: usize>(
        &self,
        instance: usize,
        event: Event,
        queue: &DeliveryQueue<M, N>,
    ) -> Result<(), Error> {
        let delivery = self.on_interrupt(instance, event)?;
        // A rejected delivery is counted and logged by the queue
        queue.push(delivery).ok();
        Ok(())
    }

    pub fn into_inner(self) -> Link<C, P, F> {
        self.inner.into_inner().into_inner()
    }
}
