//! Link handle: all ports, the shared filter table and link-wide counters

use canlink_core::{Bitrate, Error, IdType};
use canlink_driver::controller::{Controller, Event};
use canlink_driver::frame::Frame;

use crate::activity::ActivityFlags;
use crate::config::{DEFAULT_FILTER_CAPACITY, PortConfig};
use crate::delivery::Delivery;
use crate::filter::FilterTable;
use crate::port::Port;
use crate::tx::ErrorCounter;

/// CAN link over `P` controller instances
///
/// Owns what the firmware kept as global state: the ports with their receive slots, the receive
/// ID filter table, the transmit error counter and the activity latches.
///
/// Foreground operations (`init_port`, `autodetect_bitrate`, `send`, filter mutation) and the
/// event path (`handle_event`) both need `&mut self`. Use [`crate::shared::SharedLink`] to
/// serialize them across execution contexts.
pub struct Link<C, const P: usize, const F: usize = DEFAULT_FILTER_CAPACITY> {
    ports: [Port<C>; P],
    filters: FilterTable<F>,
    errors: ErrorCounter,
    activity: ActivityFlags,
}

impl<C: Controller, const P: usize, const F: usize> Link<C, P, F> {
    /// Creates a link with the same configuration on every port.
    pub fn new(controllers: [C; P], config: PortConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self::from_ports(
            controllers.map(|controller| Port::with_config(controller, config)),
        ))
    }

    pub fn from_ports(ports: [Port<C>; P]) -> Self {
        Self {
            ports,
            filters: FilterTable::new(),
            errors: ErrorCounter::new(),
            activity: ActivityFlags::new(),
        }
    }

    pub fn port(&self, instance: usize) -> Result<&Port<C>, Error> {
        self.ports.get(instance).ok_or(Error::InvalidArgument)
    }

    pub fn port_mut(&mut self, instance: usize) -> Result<&mut Port<C>, Error> {
        self.ports.get_mut(instance).ok_or(Error::InvalidArgument)
    }

    pub fn ports(&self) -> &[Port<C>; P] {
        &self.ports
    }

    pub fn filter_table(&self) -> &FilterTable<F> {
        &self.filters
    }

    pub fn activity(&self) -> &ActivityFlags {
        &self.activity
    }

    /// Unrecoverable transmit failures since creation
    pub fn error_count(&self) -> u32 {
        self.errors.get()
    }

    /// Initializes a port. Clears the filter table.
    pub fn init_port(&mut self, instance: usize, bitrate: Bitrate) -> Result<(), Error> {
        let port = self.ports.get_mut(instance).ok_or(Error::InvalidArgument)?;
        self.filters.clear();
        let result = port.init(bitrate);
        info!("port {}: init at {:?}: {:?}", instance, bitrate, result);
        result
    }

    /// Reinitializes a port, keeping the filter table.
    pub fn reinit_port(&mut self, instance: usize, bitrate: Bitrate) -> Result<(), Error> {
        self.port_mut(instance)?.reinit(bitrate)
    }

    pub fn set_bitrate(&mut self, instance: usize, bitrate: Bitrate) -> Result<(), Error> {
        self.port_mut(instance)?.set_bitrate(bitrate)
    }

    /// Runs bitrate autodetection on a port, see [`Port::autodetect`].
    pub fn autodetect_bitrate(&mut self, instance: usize, listen_only: bool) -> Result<Bitrate, Error> {
        Ok(self.port_mut(instance)?.autodetect(listen_only))
    }

    /// Re-runs autodetection on every undetected port and starts reception on ports that get
    /// detected. Returns `true` once every port has a known bitrate.
    pub fn poll_autodetect(&mut self, listen_only: bool) -> bool {
        let mut all_detected = true;
        for port in self.ports.iter_mut().filter(|port| !port.bitrate().is_known()) {
            if port.autodetect(listen_only).is_known() {
                port.start_receive();
            } else {
                all_detected = false;
            }
        }
        all_detected
    }

    pub fn start_receive(&mut self, instance: usize) -> Result<(), Error> {
        self.port_mut(instance)?.start_receive();
        Ok(())
    }

    /// Disables receive filtering on a port.
    pub fn open_filter(&mut self, instance: usize) -> Result<(), Error> {
        self.port_mut(instance)?.open_filter();
        Ok(())
    }

    /// Programs the filter table into a port, padding slots included.
    pub fn apply_filter(&mut self, instance: usize) -> Result<(), Error> {
        let port = self.ports.get_mut(instance).ok_or(Error::InvalidArgument)?;
        port.apply_filter(self.filters.slots());
        Ok(())
    }

    /// Sends a frame and waits for its completion, see [`Port::send`].
    pub fn send(&mut self, instance: usize, frame: &Frame, id_type: IdType) -> Result<(), Error> {
        let port = self.ports.get_mut(instance).ok_or(Error::InvalidArgument)?;
        port.send(frame, id_type, &self.errors)?;
        self.activity.mark_tx();
        Ok(())
    }

    /// Starts a transfer without waiting, see [`Port::start_transmit`].
    pub fn start_transmit(&mut self, instance: usize, frame: &Frame, id_type: IdType) -> Result<(), Error> {
        self.port_mut(instance)?.start_transmit(frame, id_type)
    }

    /// Adds an identifier to the filter table. Must not race port initialization or detection.
    pub fn insert_filter_id(&mut self, id: u32) -> Result<usize, Error> {
        self.filters.insert(id)
    }

    pub fn lookup_filter_id(&self, id: u32) -> Option<usize> {
        self.filters.lookup(id)
    }

    pub fn clear_filter_table(&mut self) {
        self.filters.clear();
    }

    /// Handles a hardware completion of `instance`.
    ///
    /// A reception swaps the receive slots before anything else, so the controller always has a
    /// writable target. The result is the notification for the upstream inspection engine.
    pub fn handle_event(&mut self, instance: usize, event: Event) -> Result<Delivery, Error> {
        let port = self.ports.get_mut(instance).ok_or(Error::InvalidArgument)?;
        match event {
            Event::RxComplete(frame) => {
                let frame = port.complete_receive(frame);
                self.activity.mark_rx();
                Ok(Delivery::Received { instance, frame })
            }
            Event::TxComplete => {
                self.activity.mark_tx();
                Ok(Delivery::TransmitComplete { instance })
            }
        }
    }
}
