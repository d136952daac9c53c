// SPDX-FileCopyrightText: Copyright (c) 2017-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{cell::RefCell, io, rc::Rc, time::Duration};

use dzt6001_probe::{
    transport, Address, NewTransport, Quantity, SerialSettings, Slave, Transport, TransportError,
    Word,
};
use tokio_modbus::ExceptionCode;

/// Calls received by the mock, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create,
    SetDebug(bool),
    SetResponseTimeout(Duration),
    SetByteTimeout(Duration),
    SetSlave(Slave),
    Connect,
    ReadHoldingRegisters(Address, Quantity),
    Close,
    Free,
}

/// The step that should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Create,
    SetSlave,
    Connect,
    ReadTimeout,
    ReadException,
}

pub type Journal = Rc<RefCell<Vec<Call>>>;

#[derive(Debug, Default)]
pub struct MockConnector {
    pub journal: Journal,
    pub failure: Option<Failure>,
    pub registers: Vec<Word>,
    /// Count returned by reads instead of the number of stored registers.
    pub reported_len: Option<usize>,
}

impl MockConnector {
    pub fn new(registers: Vec<Word>) -> Self {
        Self {
            registers,
            ..Default::default()
        }
    }

    pub fn failing(failure: Failure) -> Self {
        Self {
            failure: Some(failure),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.journal.borrow().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.journal.borrow().iter().filter(|c| *c == call).count()
    }

    pub fn count_matching(&self, f: impl Fn(&Call) -> bool) -> usize {
        self.journal.borrow().iter().filter(|c| f(c)).count()
    }
}

impl NewTransport for MockConnector {
    type Transport = MockTransport;

    fn new_transport(&self, settings: &SerialSettings) -> transport::Result<MockTransport> {
        self.journal.borrow_mut().push(Call::Create);
        if self.failure == Some(Failure::Create) {
            return Err(TransportError::InvalidSettings(format!(
                "cannot open {}",
                settings.device
            )));
        }
        Ok(MockTransport {
            journal: Rc::clone(&self.journal),
            failure: self.failure,
            registers: self.registers.clone(),
            reported_len: self.reported_len,
            connected: false,
        })
    }
}

#[derive(Debug)]
pub struct MockTransport {
    journal: Journal,
    failure: Option<Failure>,
    registers: Vec<Word>,
    reported_len: Option<usize>,
    connected: bool,
}

impl MockTransport {
    fn record(&self, call: Call) {
        self.journal.borrow_mut().push(call);
    }
}

impl Transport for MockTransport {
    fn set_debug(&mut self, enabled: bool) {
        self.record(Call::SetDebug(enabled));
    }

    fn set_response_timeout(&mut self, timeout: Duration) {
        self.record(Call::SetResponseTimeout(timeout));
    }

    fn set_byte_timeout(&mut self, timeout: Duration) {
        self.record(Call::SetByteTimeout(timeout));
    }

    fn set_slave(&mut self, slave: Slave) -> transport::Result<()> {
        self.record(Call::SetSlave(slave));
        if self.failure == Some(Failure::SetSlave) {
            return Err(TransportError::InvalidSlave(slave));
        }
        Ok(())
    }

    fn connect(&mut self) -> transport::Result<()> {
        self.record(Call::Connect);
        if self.failure == Some(Failure::Connect) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "No such file or directory").into());
        }
        self.connected = true;
        Ok(())
    }

    fn read_holding_registers(
        &mut self,
        addr: Address,
        cnt: Quantity,
        dest: &mut [Word],
    ) -> transport::Result<usize> {
        self.record(Call::ReadHoldingRegisters(addr, cnt));
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        match self.failure {
            Some(Failure::ReadTimeout) => {
                return Err(
                    io::Error::new(io::ErrorKind::TimedOut, "Connection timed out").into(),
                );
            }
            Some(Failure::ReadException) => {
                return Err(ExceptionCode::IllegalDataAddress.into());
            }
            _ => (),
        }
        let len = self.registers.len().min(dest.len());
        dest[..len].copy_from_slice(&self.registers[..len]);
        Ok(self.reported_len.unwrap_or(len))
    }

    fn close(&mut self) {
        self.record(Call::Close);
        self.connected = false;
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        self.record(Call::Free);
    }
}

/// Writer that rejects every write.
#[derive(Debug, Default)]
pub struct BrokenPipe;

impl io::Write for BrokenPipe {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::ErrorKind::BrokenPipe.into())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Output captured from a probe run.
#[derive(Debug, Default)]
pub struct Captured {
    pub out: Vec<u8>,
    pub err: Vec<u8>,
}

impl Captured {
    pub fn out(&self) -> String {
        String::from_utf8_lossy(&self.out).into_owned()
    }

    pub fn err(&self) -> String {
        String::from_utf8_lossy(&self.err).into_owned()
    }
}
