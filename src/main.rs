// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dump the holding registers of a DZT 6001 energy meter.
//!
//! Without arguments the probe reads registers `0x0000..0x002C` of
//! slave 1 on the first USB serial adapter at 9600 baud, 8N1.

use std::{io, process::ExitCode, time::Duration};

use clap::Parser;
use log::LevelFilter;

use dzt6001_probe::{
    config::{DEFAULT_BAUD_RATE, DEFAULT_DEVICE},
    transport::rtu::RtuConnector,
    Address, Parity, Probe, ProbeConfig, Quantity, SerialSettings, Slave, Timeouts,
};

#[derive(Debug, Parser)]
#[command(name = "dzt6001-probe", version)]
#[command(about = "Read the holding registers of a DZT 6001 meter via Modbus RTU")]
struct Args {
    /// Serial port path (e.g. /dev/ttyUSB0 or COM3)
    #[arg(short, long, default_value = DEFAULT_DEVICE)]
    device: String,

    /// Baud rate
    #[arg(short, long, default_value_t = DEFAULT_BAUD_RATE)]
    baud_rate: u32,

    /// Parity
    #[arg(long, value_enum, default_value_t = Parity::None)]
    parity: Parity,

    /// Number of data bits
    #[arg(long, default_value_t = 8)]
    data_bits: u8,

    /// Number of stop bits
    #[arg(long, default_value_t = 1)]
    stop_bits: u8,

    /// Slave address (decimal or hex like 0x01)
    #[arg(short, long, value_parser = parse_number::<u8>, default_value = "1")]
    slave: u8,

    /// First register address (decimal or hex)
    #[arg(long, value_parser = parse_number::<Address>, default_value = "0")]
    start: Address,

    /// Number of registers to read (decimal or hex)
    #[arg(short = 'n', long, value_parser = parse_number::<Quantity>, default_value = "0x2c")]
    count: Quantity,

    /// Response timeout in milliseconds
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,

    /// Timeout between two bytes of a response in milliseconds
    #[arg(long, default_value_t = 2000)]
    byte_timeout_ms: u64,

    /// Don't log raw requests and responses
    #[arg(short, long)]
    quiet: bool,
}

impl From<Args> for ProbeConfig {
    fn from(args: Args) -> Self {
        Self {
            serial: SerialSettings {
                device: args.device,
                baud_rate: args.baud_rate,
                parity: args.parity,
                data_bits: args.data_bits,
                stop_bits: args.stop_bits,
            },
            timeouts: Timeouts {
                response: Duration::from_millis(args.timeout_ms),
                byte: Duration::from_millis(args.byte_timeout_ms),
            },
            slave: Slave(args.slave),
            start: args.start,
            count: args.count,
            debug: !args.quiet,
        }
    }
}

fn parse_number<T>(s: &str) -> Result<T, String>
where
    T: TryFrom<u32>,
{
    let s = s.trim();
    let value = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        s.parse()
    }
    .map_err(|e| e.to_string())?;
    T::try_from(value).map_err(|_| format!("{value} is out of range"))
}

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(if args.quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Debug
        })
        .init();

    let mut probe = Probe::new(RtuConnector, args.into());
    let stdout = io::stdout();
    let stderr = io::stderr();
    match probe.run(&mut stdout.lock(), &mut stderr.lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
