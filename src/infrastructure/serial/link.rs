use serialport::{ClearBuffer, SerialPort};
use std::io::{self, Read, Write};
use std::time::Duration;

/// Byte-level transport under a [`SerialSession`](super::SerialSession).
///
/// Implemented for real serial ports; tests plug in scripted fakes.
pub trait SerialLink: Send {
    /// Number of bytes waiting in the input buffer
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Read up to `buf.len()` bytes
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write the whole buffer and flush it out
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()>;

    /// Discard anything sitting in the input buffer
    fn clear_input(&mut self) -> io::Result<()>;
}

impl SerialLink for Box<dyn SerialPort> {
    fn bytes_available(&mut self) -> io::Result<usize> {
        let pending = self.bytes_to_read().map_err(io::Error::from)?;
        Ok(pending as usize)
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf)
    }

    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.write_all(data)?;
        self.flush()
    }

    fn clear_input(&mut self) -> io::Result<()> {
        self.clear(ClearBuffer::Input).map_err(io::Error::from)
    }
}

/// Serial line parameters applied when a session opens.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSettings {
    pub baud_rate: u32,
    pub read_timeout: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            read_timeout: Duration::from_secs(1),
        }
    }
}

/// Opens links to port paths.
pub trait Connector: Send {
    fn connect(
        &self,
        port_path: &str,
        settings: &ConnectionSettings,
    ) -> Result<Box<dyn SerialLink>, serialport::Error>;
}

/// Connector backed by the operating system's serial driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConnector;

impl Connector for SystemConnector {
    fn connect(
        &self,
        port_path: &str,
        settings: &ConnectionSettings,
    ) -> Result<Box<dyn SerialLink>, serialport::Error> {
        let port = serialport::new(port_path, settings.baud_rate)
            .timeout(settings.read_timeout)
            .open()?;
        Ok(Box::new(port))
    }
}
