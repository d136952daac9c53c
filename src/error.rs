// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types.

use std::io;

use thiserror::Error;
use tokio_modbus::ExceptionCode;

use crate::{Quantity, Slave};

/// Failure reported by the Modbus transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The serial settings cannot be applied to a port.
    #[error("invalid serial settings: {0}")]
    InvalidSettings(String),

    /// The address is reserved and cannot select a single device.
    #[error("invalid slave address {0}")]
    InvalidSlave(Slave),

    /// A request was issued before the connection was opened.
    #[error("not connected")]
    NotConnected,

    /// I/O failure of the serial line.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Framing, CRC or header mismatch detected by the protocol layer.
    #[error(transparent)]
    Modbus(#[from] tokio_modbus::Error),

    /// The device answered with a _Modbus_ exception.
    #[error("exception: {0}")]
    Exception(#[from] ExceptionCode),
}

/// Error that terminates a probe run.
///
/// Every variant is fatal; the run never retries.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested register count doesn't fit the register buffer.
    #[error("Invalid register count {count}: expected 1..={capacity}")]
    Quantity { count: Quantity, capacity: usize },

    /// The transport handle could not be created.
    #[error("Unable to create the Modbus context: {0}")]
    Context(#[source] TransportError),

    /// The slave address was rejected.
    #[error("Unable to select slave {slave}: {source}")]
    Slave {
        slave: Slave,
        #[source]
        source: TransportError,
    },

    /// The serial line could not be opened.
    #[error("Connection failed: {0}")]
    Connect(#[source] TransportError),

    /// The read request failed.
    #[error("Error reading registers: {0}")]
    Read(#[source] TransportError),

    /// Writing the report failed.
    #[error("Unable to write output: {0}")]
    Output(#[from] io::Error),
}
