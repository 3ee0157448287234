//! canlink driver interface
//!
//! The crate provides the interface between a CAN controller driver and the canlink stack.
//! Limited scope facilitates compatibility across versions.
//! Driver crates should depend on this crate. Stack users should depend on the `canlink`
//! crate instead.
//!
//! A driver implements [`controller::Controller`] for one controller instance and reports
//! hardware completions as [`controller::Event`] values:
//! * `RxComplete` once the armed receive slot has been filled
//! * `TxComplete` once a mailbox transfer has finished
//!
//! Transmit and status calls follow the `nb` convention: `WouldBlock` means the transfer
//! was accepted and is still in progress.
//!
//! The stack never blocks indefinitely on a driver. `blocking_receive` takes an explicit
//! timeout, and all status polling is bounded by a caller-side spin budget.

#![no_std]

pub mod controller;
pub mod frame;

pub mod time {
    pub use embassy_time::Duration;
}
