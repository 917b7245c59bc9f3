//! RX888-class USB-3 SDR front-end firmware.
//!
//! # Architecture
//!
//! ```text
//! EP0 vendor dispatch (usbctl)         Application task (app)
//!         │                                    │
//!         ▼                                    ▼
//! Streaming supervisor (supervisor)  ◀──  Event queue (eventbus)
//!         │
//!         ▼
//! Clock generator (clockgen)   Platform traits (platform)
//! ```
//!
//! This crate wires the control-plane crates (`clockgen`, `eventbus`,
//! `supervisor`, `usbctl`) to a boot-time analog-front-end probe
//! ([`boot`]), a diagnostic console command parser ([`commands`]), and the
//! application task ([`app`]) that drains the event queue and runs the
//! streaming watchdog. [`usb_task`] (hardware-only) is the driver task
//! that feeds both [`app::step`] and [`usbctl::Dispatcher`] from a real USB
//! controller; there is no binary entry point yet, since that controller
//! has no implementation (see [`usb_task::UsbController`]'s docs).

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod app;
pub mod boot;
pub mod commands;

#[cfg(feature = "hardware")]
pub mod usb_task;

pub use boot::{probe_hw_config, HwConfig};
