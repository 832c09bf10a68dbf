use super::link::{ConnectionSettings, Connector, SerialLink, SystemConnector};
use crate::domain::error::{GrabError, GrabResult};
use std::borrow::Cow;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default wait between writing a command and draining the reply.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(500);

/// Bytes a device returned right after a command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResponse {
    bytes: Vec<u8>,
}

impl CommandResponse {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Decoded text; invalid UTF-8 sequences become U+FFFD.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

/// A single serial connection with an explicit open/close lifecycle.
///
/// The session starts closed. Dropping it closes the link, so a caller
/// that opened it releases the port on every exit path.
pub struct SerialSession {
    connector: Box<dyn Connector>,
    settings: ConnectionSettings,
    port_path: Option<String>,
    link: Option<Box<dyn SerialLink>>,
}

impl SerialSession {
    /// Closed session that opens real serial ports.
    pub fn new(settings: ConnectionSettings) -> Self {
        Self::with_connector(Box::new(SystemConnector), settings)
    }

    pub fn with_connector(connector: Box<dyn Connector>, settings: ConnectionSettings) -> Self {
        Self {
            connector,
            settings,
            port_path: None,
            link: None,
        }
    }

    /// Path of the port the session was last opened on.
    pub fn port_path(&self) -> Option<&str> {
        self.port_path.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.link.is_some()
    }

    /// Open `port_path`. A session that is already open is closed first.
    pub fn open(&mut self, port_path: &str) -> GrabResult<()> {
        if self.is_open() {
            warn!("Session already open on {:?}, closing before reopening", self.port_path);
            self.close();
        }

        info!(
            "Connecting to {} at {} baud...",
            port_path, self.settings.baud_rate
        );
        match self.connector.connect(port_path, &self.settings) {
            Ok(link) => {
                self.link = Some(link);
                self.port_path = Some(port_path.to_string());
                info!("Connected to {}", port_path);
                Ok(())
            }
            Err(source) => {
                error!("Failed to connect to {}: {}", port_path, source);
                Err(GrabError::Connection {
                    port: port_path.to_string(),
                    source,
                })
            }
        }
    }

    /// Close the connection. Closing a closed session does nothing.
    pub fn close(&mut self) {
        if self.link.take().is_some() {
            info!(
                "Disconnected from {}",
                self.port_path.as_deref().unwrap_or("<unknown>")
            );
        }
    }

    /// Send a line-terminated command, wait `settle`, then drain whatever
    /// the device has put in the input buffer.
    pub fn send_command(&mut self, command: &str, settle: Duration) -> GrabResult<CommandResponse> {
        let line = normalize_command(command);
        let link = self.link_mut()?;

        link.write_bytes(line.as_bytes()).map_err(|e| {
            error!("Failed to send command: {}", e);
            GrabError::Io(e)
        })?;
        debug!("Sent command: {}", line.trim_end());

        thread::sleep(settle);

        let mut response = Vec::new();
        loop {
            let pending = link.bytes_available().map_err(|e| {
                error!("Failed to read command response: {}", e);
                GrabError::Io(e)
            })?;
            if pending == 0 {
                break;
            }
            let mut buf = vec![0u8; pending];
            let n = link.read_bytes(&mut buf).map_err(|e| {
                error!("Failed to read command response: {}", e);
                GrabError::Io(e)
            })?;
            if n == 0 {
                break;
            }
            response.extend_from_slice(&buf[..n]);
        }

        debug!("Command response: {} bytes", response.len());
        Ok(CommandResponse::new(response))
    }

    /// `send_command` with the default settle delay.
    pub fn send_line(&mut self, command: &str) -> GrabResult<CommandResponse> {
        self.send_command(command, DEFAULT_SETTLE)
    }

    /// Drop stale bytes from the input buffer.
    pub fn clear_input(&mut self) -> GrabResult<()> {
        self.link_mut()?.clear_input().map_err(GrabError::Io)
    }

    pub fn bytes_available(&mut self) -> GrabResult<usize> {
        self.link_mut()?.bytes_available().map_err(GrabError::Io)
    }

    /// Read up to `buf.len()` bytes.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> GrabResult<usize> {
        self.link_mut()?.read_bytes(buf).map_err(GrabError::Io)
    }

    fn link_mut(&mut self) -> GrabResult<&mut Box<dyn SerialLink>> {
        self.link.as_mut().ok_or_else(|| {
            error!("Not connected to any device");
            GrabError::NotConnected
        })
    }
}

impl Drop for SerialSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Append `\n` unless the command already ends with one.
pub fn normalize_command(command: &str) -> Cow<'_, str> {
    if command.ends_with('\n') {
        Cow::Borrowed(command)
    } else {
        Cow::Owned(format!("{}\n", command))
    }
}
