//! Frame forwarding between ports
//!
//! A gateway links every port to a peer. Frames received on a port and accepted by the
//! inspection engine are retransmitted on its peer. Each port has one transfer in flight at
//! most; the following frames wait in a per-port queue and are started from the
//! transmit-complete event of the previous one.

use canlink_core::{Error, IdType};
use canlink_driver::controller::Controller;
use canlink_driver::frame::Frame;
use heapless::Deque;

use crate::delivery::Delivery;
use crate::link::Link;

/// Inspection engine verdict
pub trait Policy {
    /// Whether a received frame must not be forwarded
    fn is_malicious(&mut self, id: u32, data: &[u8]) -> bool;
}

impl<T: FnMut(u32, &[u8]) -> bool> Policy for T {
    fn is_malicious(&mut self, id: u32, data: &[u8]) -> bool {
        self(id, data)
    }
}

/// Forwards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl Policy for AcceptAll {
    fn is_malicious(&mut self, _id: u32, _data: &[u8]) -> bool {
        false
    }
}

/// What a delivery caused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Forward {
    /// Rejected by the policy
    Blocked,
    /// Transfer started on the peer port
    Started { port: usize },
    /// Peer busy, the frame waits in its queue
    Queued { port: usize },
    /// Peer busy and its queue full
    Dropped { port: usize },
    /// Transfer complete and nothing left to send
    Idle { port: usize },
}

/// Two-way forwarding state over `P` ports with queues of depth `Q`
pub struct Gateway<const P: usize, const Q: usize> {
    routes: [usize; P],
    queues: [Deque<Frame, Q>; P],
    busy: [bool; P],
}

impl<const P: usize, const Q: usize> Gateway<P, Q> {
    /// Creates a gateway forwarding frames received on port `i` to `routes[i]`.
    pub fn new(routes: [usize; P]) -> Result<Self, Error> {
        if routes.iter().enumerate().any(|(i, &peer)| peer >= P || peer == i) {
            return Err(Error::InvalidArgument);
        }
        Ok(Self {
            routes,
            queues: core::array::from_fn(|_| Deque::new()),
            busy: [false; P],
        })
    }

    pub fn route(&self, port: usize) -> Option<usize> {
        self.routes.get(port).copied()
    }

    /// Whether `port` has a forwarded transfer in flight
    pub fn is_busy(&self, port: usize) -> bool {
        self.busy.get(port).copied().unwrap_or(false)
    }

    /// Frames waiting for `port`
    pub fn queued(&self, port: usize) -> usize {
        self.queues.get(port).map_or(0, Deque::len)
    }

    /// Applies a link delivery.
    pub fn on_delivery<C: Controller, const F: usize>(
        &mut self,
        link: &mut Link<C, P, F>,
        delivery: Delivery,
        policy: &mut impl Policy,
    ) -> Result<Forward, Error> {
        match delivery {
            Delivery::Received { instance, frame } => {
                if policy.is_malicious(frame.id, &frame.data) {
                    debug!("gateway: id {:#x} from port {} blocked", frame.id, instance);
                    return Ok(Forward::Blocked);
                }
                self.forward(link, instance, frame)
            }
            Delivery::TransmitComplete { instance } => self.transmit_complete(link, instance),
        }
    }

    fn forward<C: Controller, const F: usize>(
        &mut self,
        link: &mut Link<C, P, F>,
        from: usize,
        frame: Frame,
    ) -> Result<Forward, Error> {
        let port = *self.routes.get(from).ok_or(Error::InvalidArgument)?;

        if !self.busy[port] {
            link.start_transmit(port, &frame, IdType::for_id(frame.id))?;
            self.busy[port] = true;
            return Ok(Forward::Started { port });
        }

        match self.queues[port].push_back(frame) {
            Ok(()) => Ok(Forward::Queued { port }),
            Err(_) => {
                warn!("gateway: queue of port {} full, id {:#x} dropped", port, frame.id);
                Ok(Forward::Dropped { port })
            }
        }
    }

    fn transmit_complete<C: Controller, const F: usize>(
        &mut self,
        link: &mut Link<C, P, F>,
        port: usize,
    ) -> Result<Forward, Error> {
        if port >= P {
            return Err(Error::InvalidArgument);
        }

        // A failed start produces no completion, so the next queued frame is started right away.
        // The port stays busy until its queue is empty to keep the forwarding order.
        while let Some(frame) = self.queues[port].pop_front() {
            match link.start_transmit(port, &frame, IdType::for_id(frame.id)) {
                Ok(()) => return Ok(Forward::Started { port }),
                Err(e) => warn!("gateway: port {} dropped id {:#x}: {:?}", port, frame.id, e),
            }
        }

        self.busy[port] = false;
        Ok(Forward::Idle { port })
    }
}
