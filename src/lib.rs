// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A diagnostic [Modbus](https://en.wikipedia.org/wiki/Modbus) RTU client
//! for the DZT 6001 single-phase energy meter.
//!
//! The probe opens the serial line, addresses one slave device, reads a
//! block of holding registers (function code 0x03) and dumps the raw
//! values. Framing, CRC and exception handling are done by
//! [tokio-modbus](https://docs.rs/tokio-modbus).
//!
//! ```no_run
//! use dzt6001_probe::{transport::rtu::RtuConnector, Probe, ProbeConfig};
//!
//! let mut probe = Probe::new(RtuConnector, ProbeConfig::default());
//! let registers = probe.run(&mut std::io::stdout(), &mut std::io::stderr())?;
//! assert_eq!(registers.len(), 0x2c);
//! # Ok::<(), dzt6001_probe::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod probe;
pub mod transport;

pub use self::{
    config::{Parity, ProbeConfig, SerialSettings, Timeouts},
    error::{Error, TransportError},
    probe::{Probe, RegisterBuffer, State},
    transport::{NewTransport, Transport},
};

/// Modbus register address.
pub type Address = u16;

/// Number of registers of a single request.
pub type Quantity = u16;

/// Raw 16-bit register value.
pub type Word = u16;

/// Modbus slave address, re-exported from `tokio-modbus`.
pub use tokio_modbus::Slave;

/// Convenience result type of the probe.
pub type Result<T> = std::result::Result<T, Error>;
