use crate::domain::{error::{GrabError, GrabResult}, port::PortInfo};
use serialport::{SerialPortInfo, SerialPortType, UsbPortInfo};
use tracing::{info, warn};

/// Query the platform for currently attached serial ports.
///
/// Every call hits the OS again; nothing is cached. An empty list is a
/// normal result, only a failing platform query is an error.
pub fn list_ports() -> GrabResult<Vec<PortInfo>> {
    info!("Scanning available serial ports...");
    let ports: Vec<PortInfo> = serialport::available_ports()
        .map_err(GrabError::Enumeration)?
        .into_iter()
        .map(PortInfo::from)
        .collect();

    if ports.is_empty() {
        warn!("No serial ports found");
        return Ok(ports);
    }

    info!("Found {} serial port(s)", ports.len());
    for port in &ports {
        info!(
            "Port: {}, description: {}, hardware ID: {}",
            port.device_path, port.description, port.hardware_id
        );
    }
    Ok(ports)
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        match info.port_type {
            SerialPortType::UsbPort(usb) => {
                let description = usb
                    .product
                    .clone()
                    .filter(|p| !p.is_empty())
                    .unwrap_or_else(|| "USB Serial Device".to_string());
                Self {
                    device_path: info.port_name,
                    description,
                    hardware_id: usb_hardware_id(&usb),
                    manufacturer: usb.manufacturer,
                    product: usb.product,
                    serial_number: usb.serial_number,
                }
            }
            SerialPortType::BluetoothPort => {
                PortInfo::new(info.port_name, "Bluetooth Serial Port", "BTHENUM")
            }
            SerialPortType::PciPort => PortInfo::new(info.port_name, "PCI Serial Port", "PCI"),
            SerialPortType::Unknown => PortInfo::new(info.port_name, "Serial Port", "n/a"),
        }
    }
}

/// Windows-style hardware ID, e.g. `USB\VID_0403&PID_6001\A50285BI`.
fn usb_hardware_id(usb: &UsbPortInfo) -> String {
    let mut hwid = format!("USB\\VID_{:04X}&PID_{:04X}", usb.vid, usb.pid);
    if let Some(serial) = usb.serial_number.as_deref().filter(|s| !s.is_empty()) {
        hwid.push('\\');
        hwid.push_str(serial);
    }
    hwid
}
