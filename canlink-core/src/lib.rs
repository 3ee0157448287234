//! CAN link core data types
//!
//! This crate provides basic data type definitions used by other canlink crates.
//! Users should not depend on this crate directly. Use the `canlink::core` reexport instead.
#![no_std]

/// Link error taxonomy
///
/// Success is expressed as `Ok`. `Busy` and `Timeout` are transient at the mailbox or candidate
/// level and only surface once a whole pool or candidate list is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Transient, a retry of the same call may succeed
    Busy,
    /// Polling budget exhausted
    Timeout,
    /// Controller rejected the configuration, the candidate is unusable
    HardwareInit,
    /// Filter table is full
    CapacityExceeded,
    /// Invalid frame, identifier or out-of-range instance
    InvalidArgument,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            Error::Busy => "controller busy",
            Error::Timeout => "polling budget exhausted",
            Error::HardwareInit => "controller initialization failed",
            Error::CapacityExceeded => "filter table full",
            Error::InvalidArgument => "invalid argument",
        };
        f.write_str(text)
    }
}

impl core::error::Error for Error {}

/// CAN identifier format
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IdType {
    /// 11-bit identifier
    Standard,
    /// 29-bit identifier
    Extended,
}

impl IdType {
    pub const STANDARD_MASK: u32 = 0x7FF;
    pub const EXTENDED_MASK: u32 = 0x1FFF_FFFF;

    /// Identifier mask of the format
    pub const fn mask(self) -> u32 {
        match self {
            IdType::Standard => Self::STANDARD_MASK,
            IdType::Extended => Self::EXTENDED_MASK,
        }
    }

    /// The narrowest format able to carry `id`.
    pub const fn for_id(id: u32) -> Self {
        if id <= Self::STANDARD_MASK {
            IdType::Standard
        } else {
            IdType::Extended
        }
    }

    pub const fn contains(self, id: u32) -> bool {
        id & !self.mask() == 0
    }
}

/// Bit timing segments in time quanta
///
/// Field values are stored as the controller expects them in its timing register,
/// i.e. without the implicit "+1" some controllers add.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitTiming {
    /// Propagation segment
    pub prop_seg: u8,
    /// Phase segment 1
    pub phase_seg1: u8,
    /// Phase segment 2
    pub phase_seg2: u8,
    /// Clock prescaler (pre-divider)
    pub prescaler: u16,
    /// Resynchronization jump width
    pub rjw: u8,
}

impl BitTiming {
    pub const fn new(prop_seg: u8, phase_seg1: u8, phase_seg2: u8, prescaler: u16, rjw: u8) -> Self {
        Self {
            prop_seg,
            phase_seg1,
            phase_seg2,
            prescaler,
            rjw,
        }
    }
}

impl Default for BitTiming {
    fn default() -> Self {
        Bitrate::DEFAULT.timing()
    }
}

/// Bitrate candidate
///
/// Variants are declared in speed order, so `Unknown` compares greater than every real
/// candidate. The timing table assumes a 40 MHz protocol engine clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Bitrate {
    Kbps125 = 0,
    Kbps250 = 1,
    Kbps500 = 2,
    Kbps800 = 3,
    Mbps1 = 4,
    Unknown = 5,
}

const TIMING_TABLE: [BitTiming; Bitrate::KNOWN_COUNT] = [
    BitTiming::new(7, 4, 1, 19, 1), // 125 kbit/s
    BitTiming::new(7, 4, 1, 9, 1),  // 250 kbit/s
    BitTiming::new(7, 4, 1, 4, 1),  // 500 kbit/s
    BitTiming::new(4, 1, 1, 4, 1),  // 800 kbit/s
    BitTiming::new(7, 6, 3, 1, 1),  // 1 Mbit/s
];

impl Bitrate {
    pub const KNOWN_COUNT: usize = 5;

    /// Candidate used when a caller asks for `Unknown`
    pub const DEFAULT: Bitrate = Bitrate::Kbps500;

    /// All real candidates in speed order
    pub const ALL: [Bitrate; Self::KNOWN_COUNT] = [
        Bitrate::Kbps125,
        Bitrate::Kbps250,
        Bitrate::Kbps500,
        Bitrate::Kbps800,
        Bitrate::Mbps1,
    ];

    pub const fn is_known(self) -> bool {
        !matches!(self, Bitrate::Unknown)
    }

    /// Timing segments of the candidate. `Unknown` maps to the default candidate.
    pub const fn timing(self) -> BitTiming {
        match self {
            Bitrate::Unknown => TIMING_TABLE[Self::DEFAULT as usize],
            known => TIMING_TABLE[known as usize],
        }
    }

    /// Timing segments of a real candidate
    pub const fn try_timing(self) -> Option<BitTiming> {
        if self.is_known() {
            Some(TIMING_TABLE[self as usize])
        } else {
            None
        }
    }

    pub const fn bits_per_second(self) -> Option<u32> {
        match self {
            Bitrate::Kbps125 => Some(125_000),
            Bitrate::Kbps250 => Some(250_000),
            Bitrate::Kbps500 => Some(500_000),
            Bitrate::Kbps800 => Some(800_000),
            Bitrate::Mbps1 => Some(1_000_000),
            Bitrate::Unknown => None,
        }
    }
}
