// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The diagnostic procedure
//!
//! A run walks through `Uninitialized → Configured → Connected →
//! Completed` or ends in `Failed`. There are no retries: the first
//! error terminates the run after all acquired resources have been
//! released.

use std::{fmt, io::Write, ops::Deref};

use crate::{
    config::ProbeConfig,
    error::Error,
    transport::{NewTransport, Transport},
    Result, Word,
};

/// Maximum number of registers a single run can read.
pub const REGISTER_CAPACITY: usize = 64;

/// Fixed-capacity buffer for the registers of one read.
#[derive(Clone, PartialEq, Eq)]
pub struct RegisterBuffer {
    words: [Word; REGISTER_CAPACITY],
    len: usize,
}

impl RegisterBuffer {
    pub const fn new() -> Self {
        Self {
            words: [0; REGISTER_CAPACITY],
            len: 0,
        }
    }

    pub fn as_slice(&self) -> &[Word] {
        &self.words[..self.len]
    }
}

impl Default for RegisterBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for RegisterBuffer {
    type Target = [Word];

    fn deref(&self) -> &[Word] {
        self.as_slice()
    }
}

impl fmt::Debug for RegisterBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// Lifecycle state of a probe run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Uninitialized,
    Configured,
    Connected,
    Completed,
    Failed,
}

/// Closes the connection when dropped.
struct Connection<'a, T: Transport> {
    transport: &'a mut T,
}

impl<'a, T: Transport> Connection<'a, T> {
    fn new(transport: &'a mut T) -> Self {
        Self { transport }
    }
}

impl<T: Transport> Drop for Connection<'_, T> {
    fn drop(&mut self) {
        self.transport.close();
    }
}

/// Reads and dumps a block of holding registers from one slave.
#[derive(Debug)]
pub struct Probe<C> {
    connector: C,
    config: ProbeConfig,
    state: State,
}

impl<C: NewTransport> Probe<C> {
    pub fn new(connector: C, config: ProbeConfig) -> Self {
        Self {
            connector,
            config,
            state: State::Uninitialized,
        }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Execute the probe.
    ///
    /// Status messages are written to `err` and the register dump,
    /// one `reg #<index>: <value>` line per register, to `out`.
    /// On failure the error message is written to `err` as well.
    pub fn run<O, E>(&mut self, out: &mut O, err: &mut E) -> Result<RegisterBuffer>
    where
        O: Write,
        E: Write,
    {
        match self.execute(out, err) {
            Ok(registers) => {
                self.state = State::Completed;
                Ok(registers)
            }
            Err(e) => {
                log::debug!("Probe failed in state {:?}", self.state);
                self.state = State::Failed;
                if let Err(write_err) = writeln!(err, "{e}") {
                    log::warn!("Unable to report \"{e}\": {write_err}");
                }
                Err(e)
            }
        }
    }

    fn execute<O, E>(&mut self, out: &mut O, err: &mut E) -> Result<RegisterBuffer>
    where
        O: Write,
        E: Write,
    {
        let ProbeConfig {
            timeouts,
            slave,
            start,
            count,
            debug,
            ..
        } = self.config;
        let len = usize::from(count);
        if len == 0 || len > REGISTER_CAPACITY {
            return Err(Error::Quantity {
                count,
                capacity: REGISTER_CAPACITY,
            });
        }

        let mut transport = self
            .connector
            .new_transport(&self.config.serial)
            .map_err(Error::Context)?;
        transport.set_debug(debug);
        transport.set_response_timeout(timeouts.response);
        transport.set_byte_timeout(timeouts.byte);
        transport
            .set_slave(slave)
            .map_err(|source| Error::Slave { slave, source })?;
        self.state = State::Configured;

        transport.connect().map_err(Error::Connect)?;
        let connection = Connection::new(&mut transport);
        self.state = State::Connected;
        writeln!(err, "Connected")?;

        let mut registers = RegisterBuffer::new();
        registers.len = connection
            .transport
            .read_holding_registers(start, count, &mut registers.words[..len])
            .map_err(Error::Read)?
            .min(len);
        log::debug!("Read {} of {count} registers from {slave}", registers.len);

        writeln!(err, "Register dump:")?;
        for (index, value) in registers.iter().enumerate() {
            writeln!(out, "reg #{index}: {value}")?;
        }
        out.flush()?;

        Ok(registers)
    }
}
