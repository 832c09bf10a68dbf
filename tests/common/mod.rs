//! Scripted serial device for integration tests.
//!
//! Writes put the acknowledgement in the input buffer. After that, every
//! time the buffer is seen empty the next burst is armed and shows up on
//! the following poll, so the command drain never swallows file data.
//! `TricklingConnector` instead releases bytes on a wall-clock schedule.

#![allow(dead_code)]

use serialgrab::infrastructure::serial::{ConnectionSettings, Connector, SerialLink};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Default)]
pub struct Device {
    pub written: Vec<u8>,
    pub ack: Vec<u8>,
    pub bursts: VecDeque<Vec<u8>>,
    pub inbox: VecDeque<u8>,
    pub armed: bool,
    pub opens: usize,
    pub closes: usize,
    pub clears: usize,
    /// Successful reads left before the line breaks
    pub reads_before_failure: Option<usize>,
}

impl Device {
    pub fn new(ack: &[u8], bursts: Vec<Vec<u8>>) -> Self {
        Self {
            ack: ack.to_vec(),
            bursts: bursts.into(),
            ..Self::default()
        }
    }

    pub fn with_stale(mut self, stale: &[u8]) -> Self {
        self.inbox.extend(stale.iter().copied());
        self
    }

    pub fn shared(self) -> Arc<Mutex<Device>> {
        Arc::new(Mutex::new(self))
    }
}

pub struct ScriptedLink {
    device: Arc<Mutex<Device>>,
}

impl SerialLink for ScriptedLink {
    fn bytes_available(&mut self) -> io::Result<usize> {
        let mut device = self.device.lock().unwrap();
        if !device.inbox.is_empty() {
            return Ok(device.inbox.len());
        }
        if device.armed {
            if let Some(burst) = device.bursts.pop_front() {
                device.armed = false;
                device.inbox.extend(burst);
                return Ok(device.inbox.len());
            }
            return Ok(0);
        }
        if !device.written.is_empty() {
            device.armed = true;
        }
        Ok(0)
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut device = self.device.lock().unwrap();
        match device.reads_before_failure {
            Some(0) => return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged")),
            Some(left) => device.reads_before_failure = Some(left - 1),
            None => {}
        }
        let n = buf.len().min(device.inbox.len());
        for (slot, byte) in buf.iter_mut().zip(device.inbox.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        let mut device = self.device.lock().unwrap();
        device.written.extend_from_slice(data);
        let ack = device.ack.clone();
        device.inbox.extend(ack);
        device.armed = false;
        Ok(())
    }

    fn clear_input(&mut self) -> io::Result<()> {
        let mut device = self.device.lock().unwrap();
        device.inbox.clear();
        device.armed = false;
        device.clears += 1;
        Ok(())
    }
}

impl Drop for ScriptedLink {
    fn drop(&mut self) {
        if let Ok(mut device) = self.device.lock() {
            device.closes += 1;
        }
    }
}

pub struct ScriptedConnector {
    pub device: Arc<Mutex<Device>>,
}

impl Connector for ScriptedConnector {
    fn connect(
        &self,
        _port_path: &str,
        _settings: &ConnectionSettings,
    ) -> Result<Box<dyn SerialLink>, serialport::Error> {
        self.device.lock().unwrap().opens += 1;
        Ok(Box::new(ScriptedLink {
            device: Arc::clone(&self.device),
        }))
    }
}

/// Device that acknowledges at once, then lets out one payload byte
/// every `interval` after the command was written.
pub struct TricklingConnector {
    pub ack: Vec<u8>,
    pub payload: Vec<u8>,
    pub interval: Duration,
}

impl Connector for TricklingConnector {
    fn connect(
        &self,
        _port_path: &str,
        _settings: &ConnectionSettings,
    ) -> Result<Box<dyn SerialLink>, serialport::Error> {
        Ok(Box::new(TricklingLink {
            ack: self.ack.clone(),
            payload: self.payload.clone(),
            interval: self.interval,
            sent_at: None,
            released: 0,
            inbox: VecDeque::new(),
        }))
    }
}

pub struct TricklingLink {
    ack: Vec<u8>,
    payload: Vec<u8>,
    interval: Duration,
    sent_at: Option<Instant>,
    released: usize,
    inbox: VecDeque<u8>,
}

impl TricklingLink {
    fn release_due(&mut self) {
        let Some(sent_at) = self.sent_at else { return };
        let due = (sent_at.elapsed().as_nanos() / self.interval.as_nanos()) as usize;
        let due = due.min(self.payload.len());
        if due > self.released {
            self.inbox.extend(self.payload[self.released..due].iter().copied());
            self.released = due;
        }
    }
}

impl SerialLink for TricklingLink {
    fn bytes_available(&mut self) -> io::Result<usize> {
        self.release_due();
        Ok(self.inbox.len())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.inbox.len());
        for (slot, byte) in buf.iter_mut().zip(self.inbox.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write_bytes(&mut self, _data: &[u8]) -> io::Result<()> {
        self.sent_at = Some(Instant::now());
        self.inbox.extend(self.ack.iter().copied());
        Ok(())
    }

    fn clear_input(&mut self) -> io::Result<()> {
        self.inbox.clear();
        Ok(())
    }
}

pub struct RefusingConnector;

impl Connector for RefusingConnector {
    fn connect(
        &self,
        port_path: &str,
        _settings: &ConnectionSettings,
    ) -> Result<Box<dyn SerialLink>, serialport::Error> {
        Err(serialport::Error::new(
            serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied),
            format!("permission denied: {}", port_path),
        ))
    }
}
