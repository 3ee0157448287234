//! # canlink
//!
//! This library manages the CAN link of an in-vehicle intrusion-detection/firewall agent: it
//! brings CAN controllers up, discovers the bus bitrate, keeps an ID acceptance filter, hands
//! received frames over to an upstream inspection engine and transmits frames with retry.
//! It is `no_std` and performs no dynamic memory allocation.
//!
//! ## Architecture
//!
//! ```text
//!  ┌────────────┐ Event  ┌──────────────────────────────┐ Delivery ┌────────────┐
//!  │ Controller ├───────►│ Link                         ├─────────►│ Inspection │
//!  │  driver    │◄───────┤ ┌──────┐ ┌──────┐ ┌────────┐ │          │   engine   │
//!  └────────────┘        │ │Port 0│ │Port 1│ │ Filter │ │          └─────┬──────┘
//!                        │ └──────┘ └──────┘ │ table  │ │                │ verdict
//!                        │                   └────────┘ │          ┌─────▼──────┐
//!                        └──────────────────────────────┘◄─────────┤  Gateway   │
//!                                                                  └────────────┘
//! ```
//! Components:
//! * _Port_ wraps one controller instance. It owns the active configuration, the receive slot
//!   pair and the confirmed bitrate.
//! * _Link_ holds every port together with the link-wide receive ID filter table, transmit
//!   error counter and activity latches.
//! * _Autodetection_ scans the candidate bitrates, confirming each one passively by listening
//!   for traffic or actively by a probe frame acknowledged by another node.
//! * _Transmit engine_ sends a frame on a pool of mailboxes with bounded status polling.
//! * _Gateway_ optionally forwards frames accepted by the inspection engine between ports.
//! * _Activity_ drives per-direction indicator pins from the link latches.
//!
//! ## Concurrency model
//!
//! The driver reports completions from interrupt context through [`Link::handle_event`].
//! The receive slot swap is the first thing it does, so the controller always has a writable
//! target. Foreground operations and the event path both take `&mut Link`; wrap the link into
//! a [`SharedLink`] to serialize them with an `embassy_sync` mutex. A
//! _CriticalSectionRawMutex_ lets the event path run in an interrupt handler, at the cost of
//! holding the critical section for the duration of a foreground operation.
//!
//! Every wait is a bounded spin budget or a bounded receive timeout. An abandoned transfer is
//! always explicitly aborted.
#![no_std]

pub use canlink_core as core;
pub use canlink_driver::{controller, frame, time};

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod activity;
mod autodetect;
pub mod config;
pub mod delivery;
pub mod filter;
pub mod gateway;
pub mod link;
pub mod port;
mod rx;
pub mod shared;
mod tx;

pub use canlink_core::{BitTiming, Bitrate, Error, IdType};
pub use delivery::{Delivery, DeliveryQueue};
pub use filter::FilterTable;
pub use link::Link;
pub use port::Port;
pub use rx::RxSlots;
pub use shared::SharedLink;
pub use tx::ErrorCounter;
