// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus RTU transport on top of the synchronous `tokio-modbus` client

use std::time::Duration;

use tokio_modbus::prelude::{sync, SlaveContext as _, SyncReader as _};
use tokio_serial::{DataBits, SerialPortBuilder, StopBits};

use super::{check_slave, NewTransport, Result, Transport};
use crate::{
    config::{Parity, SerialSettings},
    error::TransportError,
    Address, Quantity, Slave, Word,
};

/// Creates [`RtuTransport`] handles for a serial port.
#[derive(Debug, Clone, Copy, Default)]
pub struct RtuConnector;

impl NewTransport for RtuConnector {
    type Transport = RtuTransport;

    fn new_transport(&self, settings: &SerialSettings) -> Result<RtuTransport> {
        RtuTransport::new(settings)
    }
}

/// Modbus RTU master on a serial line.
///
/// Creating the transport only validates the settings, the port
/// is opened by [`Transport::connect`].
pub struct RtuTransport {
    builder: SerialPortBuilder,
    slave: Slave,
    response_timeout: Option<Duration>,
    byte_timeout: Option<Duration>,
    debug: bool,
    ctx: Option<sync::Context>,
}

impl std::fmt::Debug for RtuTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RtuTransport")
            .field("builder", &self.builder)
            .field("slave", &self.slave)
            .field("response_timeout", &self.response_timeout)
            .field("byte_timeout", &self.byte_timeout)
            .field("connected", &self.ctx.is_some())
            .finish()
    }
}

impl RtuTransport {
    pub fn new(settings: &SerialSettings) -> Result<Self> {
        settings.validate()?;
        let builder = tokio_serial::new(&settings.device, settings.baud_rate)
            .parity(serial_parity(settings.parity))
            .data_bits(serial_data_bits(settings.data_bits)?)
            .stop_bits(serial_stop_bits(settings.stop_bits)?);
        log::debug!(
            "Created RTU context for {} ({} baud, {:?}, {} data bits, {} stop bits)",
            settings.device,
            settings.baud_rate,
            settings.parity,
            settings.data_bits,
            settings.stop_bits,
        );
        Ok(Self {
            builder,
            slave: Slave::broadcast(),
            response_timeout: None,
            byte_timeout: None,
            debug: false,
            ctx: None,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.ctx.is_some()
    }
}

impl Transport for RtuTransport {
    fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }

    // Both timeouts are applied when the port is opened.
    fn set_response_timeout(&mut self, timeout: Duration) {
        self.response_timeout = Some(timeout);
    }

    fn set_byte_timeout(&mut self, timeout: Duration) {
        self.byte_timeout = Some(timeout);
    }

    fn set_slave(&mut self, slave: Slave) -> Result<()> {
        check_slave(slave)?;
        self.slave = slave;
        if let Some(ctx) = self.ctx.as_mut() {
            ctx.set_slave(slave);
        }
        Ok(())
    }

    fn connect(&mut self) -> Result<()> {
        if self.ctx.is_some() {
            return Ok(());
        }
        let timeout = request_timeout(self.response_timeout, self.byte_timeout);
        let ctx = sync::rtu::connect_slave_with_timeout(&self.builder, self.slave, timeout)?;
        log::debug!(
            "Opened {:?} for slave {} with request timeout {timeout:?}",
            self.builder,
            self.slave
        );
        self.ctx = Some(ctx);
        Ok(())
    }

    fn read_holding_registers(
        &mut self,
        addr: Address,
        cnt: Quantity,
        dest: &mut [Word],
    ) -> Result<usize> {
        let ctx = self.ctx.as_mut().ok_or(TransportError::NotConnected)?;
        if self.debug {
            log::debug!("{}", format_request(self.slave, addr, cnt));
        }
        let words = ctx.read_holding_registers(addr, cnt)??;
        if self.debug {
            log::debug!("{}", format_response(self.slave, &words));
        }
        if words.len() > dest.len() {
            log::warn!(
                "Response with {} registers exceeds buffer of {}",
                words.len(),
                dest.len()
            );
        }
        let len = words.len().min(dest.len());
        dest[..len].copy_from_slice(&words[..len]);
        Ok(len)
    }

    fn close(&mut self) {
        if self.ctx.take().is_some() {
            log::debug!("Closed connection to slave {}", self.slave);
        }
    }
}

/// Timeout of a whole request/response cycle.
///
/// The serial stream is non-blocking, so there is no per-byte read
/// timeout. A response must arrive within the shorter of both limits.
fn request_timeout(response: Option<Duration>, byte: Option<Duration>) -> Option<Duration> {
    match (response, byte) {
        (Some(response), Some(byte)) => {
            if response != byte {
                log::warn!(
                    "Byte timeout {byte:?} differs from response timeout {response:?}, \
                     using the shorter one for the whole response"
                );
            }
            Some(response.min(byte))
        }
        (response, byte) => response.or(byte),
    }
}

fn format_request(slave: Slave, addr: Address, cnt: Quantity) -> String {
    format!("[{slave}] read holding registers: addr = {addr:#06X}, cnt = {cnt}")
}

fn format_response(slave: Slave, words: &[Word]) -> String {
    format!("[{slave}] response: {words:04X?}")
}

fn serial_parity(parity: Parity) -> tokio_serial::Parity {
    match parity {
        Parity::None => tokio_serial::Parity::None,
        Parity::Even => tokio_serial::Parity::Even,
        Parity::Odd => tokio_serial::Parity::Odd,
    }
}

fn serial_data_bits(data_bits: u8) -> Result<DataBits> {
    match data_bits {
        5 => Ok(DataBits::Five),
        6 => Ok(DataBits::Six),
        7 => Ok(DataBits::Seven),
        8 => Ok(DataBits::Eight),
        n => Err(TransportError::InvalidSettings(format!(
            "unsupported number of data bits: {n}"
        ))),
    }
}

fn serial_stop_bits(stop_bits: u8) -> Result<StopBits> {
    match stop_bits {
        1 => Ok(StopBits::One),
        2 => Ok(StopBits::Two),
        n => Err(TransportError::InvalidSettings(format!(
            "unsupported number of stop bits: {n}"
        ))),
    }
}
