//! Raw CAN frame object

use canlink_core::IdType;
use embedded_can::{ExtendedId, Id, StandardId};

/// Payload width of a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mtu {
    Classic,
    Fd,
}

impl From<Mtu> for usize {
    fn from(value: Mtu) -> Self {
        match value {
            Mtu::Classic => 8,
            Mtu::Fd => 64,
        }
    }
}

/// CAN frame as exchanged with the controller and the inspection engine
///
/// The identifier format is not part of the frame. It is supplied separately on transmission,
/// the same way the controller mailboxes are configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    pub id: u32,
    pub data: Data,
}

impl Frame {
    pub const fn new(id: u32, data: Data) -> Self {
        Self { id, data }
    }

    /// An empty frame with identifier 0, the content of a never-filled receive slot.
    pub const fn empty() -> Self {
        Self {
            id: 0,
            data: Data::EMPTY,
        }
    }

    /// Typed identifier, if `id` fits into `id_type`
    pub fn typed_id(&self, id_type: IdType) -> Option<Id> {
        match id_type {
            IdType::Standard => u16::try_from(self.id)
                .ok()
                .and_then(StandardId::new)
                .map(Id::Standard),
            IdType::Extended => ExtendedId::new(self.id).map(Id::Extended),
        }
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::empty()
    }
}

/// CAN-FD-compatible data length
///
/// Data length code (DLC) of CAN-FD frames supports limited data length options.
/// Classic CAN frames support a subset of CAN-FD length options limited by MTU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataLength(u8);

impl DataLength {
    pub const fn new(value: usize) -> Option<Self> {
        let floor = Self::new_floor(value);
        if floor.as_usize() == value {
            Some(floor)
        } else {
            None
        }
    }

    pub const fn new_floor(value: usize) -> Self {
        let floor = match value {
            0..8 => value,
            8..24 => value / 4 * 4,
            24..32 => value / 8 * 8,
            32..64 => value / 16 * 16,
            64.. => 64,
        };
        Self(floor as u8)
    }

    pub const fn as_usize(&self) -> usize {
        self.0 as usize
    }

    /// Whether a payload of this length fits into `mtu`
    pub fn fits(&self, mtu: Mtu) -> bool {
        self.as_usize() <= usize::from(mtu)
    }
}

impl From<DataLength> for usize {
    fn from(value: DataLength) -> Self {
        value.as_usize()
    }
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidLength;

/// CAN-FD frame compatible data vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Data {
    length: DataLength,
    bytes: [u8; 64],
}

impl Data {
    pub const EMPTY: Self = Self {
        length: DataLength(0),
        bytes: [0; 64],
    };

    /// Creates a new vector from a slice of compatible length.
    pub fn new(data: &[u8]) -> Result<Self, InvalidLength> {
        let length = DataLength::new(data.len()).ok_or(InvalidLength)?;
        let mut bytes = [0; 64];
        bytes[..data.len()].copy_from_slice(data);

        Ok(Self { length, bytes })
    }

    pub fn length(&self) -> DataLength {
        self.length
    }
}

impl core::ops::Deref for Data {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.bytes[..usize::from(self.length)]
    }
}
