// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Probe configuration
//!
//! The defaults match the factory settings of a DZT 6001 meter:
//! 9600 baud, 8N1, slave address 1, registers 0x0000..0x002C.

use std::time::Duration;

use crate::{error::TransportError, Address, Quantity, Slave};

/// Serial device used when none is given.
#[cfg(not(windows))]
pub const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";

/// Serial device used when none is given.
#[cfg(windows)]
pub const DEFAULT_DEVICE: &str = "COM1";

pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Factory default line address of the meter.
pub const DEFAULT_SLAVE: Slave = Slave(1);

/// All registers of the meter fit into `0x0000..0x002C`.
pub const DEFAULT_START: Address = 0x0000;
pub const DEFAULT_COUNT: Quantity = 0x002C;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Parity checking mode of the serial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
}

/// Line settings of the serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub device: String,
    pub baud_rate: u32,
    pub parity: Parity,
    pub data_bits: u8,
    pub stop_bits: u8,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_owned(),
            baud_rate: DEFAULT_BAUD_RATE,
            parity: Parity::None,
            data_bits: 8,
            stop_bits: 1,
        }
    }
}

impl SerialSettings {
    /// Check that the settings describe a port that can be opened.
    ///
    /// Nothing is sent on the line and the device node is not probed.
    pub fn validate(&self) -> Result<(), TransportError> {
        if self.device.trim().is_empty() {
            return Err(TransportError::InvalidSettings(
                "empty device path".to_owned(),
            ));
        }
        if self.baud_rate == 0 {
            return Err(TransportError::InvalidSettings(
                "baud rate must not be zero".to_owned(),
            ));
        }
        if !(5..=8).contains(&self.data_bits) {
            return Err(TransportError::InvalidSettings(format!(
                "unsupported number of data bits: {}",
                self.data_bits
            )));
        }
        if !matches!(self.stop_bits, 1 | 2) {
            return Err(TransportError::InvalidSettings(format!(
                "unsupported number of stop bits: {}",
                self.stop_bits
            )));
        }
        Ok(())
    }
}

/// Protocol timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Maximum time to wait for the first byte of a response.
    pub response: Duration,

    /// Maximum silence between two bytes of a response.
    pub byte: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            response: DEFAULT_TIMEOUT,
            byte: DEFAULT_TIMEOUT,
        }
    }
}

/// Everything a single probe run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub serial: SerialSettings,
    pub timeouts: Timeouts,
    pub slave: Slave,
    pub start: Address,
    pub count: Quantity,
    /// Log raw requests and responses, on by default.
    pub debug: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            serial: SerialSettings::default(),
            timeouts: Timeouts::default(),
            slave: DEFAULT_SLAVE,
            start: DEFAULT_START,
            count: DEFAULT_COUNT,
            debug: true,
        }
    }
}
