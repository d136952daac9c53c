// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus transport seam

use std::time::Duration;

use crate::{config::SerialSettings, error::TransportError, Address, Quantity, Slave, Word};

pub mod rtu;

/// Result type of transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// A blocking _Modbus_ RTU master bound to one serial line.
///
/// Dropping the transport releases the handle together with any
/// open connection. [`Transport::close`] must tolerate being called
/// when nothing is open.
pub trait Transport {
    /// Toggle logging of raw requests and responses.
    fn set_debug(&mut self, enabled: bool);

    /// Maximum time to wait for a response.
    fn set_response_timeout(&mut self, timeout: Duration);

    /// Maximum time between two bytes of a response.
    fn set_byte_timeout(&mut self, timeout: Duration);

    /// Select the slave device for all subsequent requests.
    ///
    /// Nothing is sent on the line.
    fn set_slave(&mut self, slave: Slave) -> Result<()>;

    /// Open the serial line.
    fn connect(&mut self) -> Result<()>;

    /// Read multiple holding registers (0x03) into `dest`.
    ///
    /// Returns the number of registers that have been stored.
    fn read_holding_registers(
        &mut self,
        addr: Address,
        cnt: Quantity,
        dest: &mut [Word],
    ) -> Result<usize>;

    /// Close the serial line.
    fn close(&mut self);
}

/// Trait for creating transport handles.
pub trait NewTransport {
    type Transport: Transport;

    /// Create a new, unconnected transport.
    fn new_transport(&self, settings: &SerialSettings) -> Result<Self::Transport>;
}

impl<C: NewTransport + ?Sized> NewTransport for &C {
    type Transport = C::Transport;

    fn new_transport(&self, settings: &SerialSettings) -> Result<Self::Transport> {
        (**self).new_transport(settings)
    }
}

/// Check that the slave address can be put on the line.
///
/// The broadcast address is accepted, reserved addresses are not.
pub fn check_slave(slave: Slave) -> Result<()> {
    if slave.is_reserved() {
        return Err(TransportError::InvalidSlave(slave));
    }
    Ok(())
}
