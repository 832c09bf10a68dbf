use serde::{Deserialize, Serialize};
use std::fmt;

/// One serial port as reported by the platform at enumeration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    /// OS-specific port identifier, e.g. `/dev/ttyUSB0` or `COM3`
    pub device_path: String,
    /// Human-readable description, may be empty
    pub description: String,
    /// Platform hardware ID, may embed `VID_xxxx` / `PID_xxxx` tokens
    pub hardware_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
}

/// USB vendor/product pair parsed out of a hardware ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsbIds {
    pub vid: String,
    pub pid: String,
}

impl fmt::Display for UsbIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.vid, self.pid)
    }
}

impl PortInfo {
    pub fn new(
        device_path: impl Into<String>,
        description: impl Into<String>,
        hardware_id: impl Into<String>,
    ) -> Self {
        Self {
            device_path: device_path.into(),
            description: description.into(),
            hardware_id: hardware_id.into(),
            manufacturer: None,
            product: None,
            serial_number: None,
        }
    }

    /// Vendor and product IDs embedded in the hardware ID, uppercased.
    /// `None` unless both tokens are present.
    pub fn usb_ids(&self) -> Option<UsbIds> {
        let hwid = self.hardware_id.to_ascii_lowercase();
        let vid = find_hex_token(&hwid, "vid_")?;
        let pid = find_hex_token(&hwid, "pid_")?;
        Some(UsbIds {
            vid: vid.to_ascii_uppercase(),
            pid: pid.to_ascii_uppercase(),
        })
    }
}

/// First `<prefix>XXXX` occurrence where XXXX is four hex digits.
fn find_hex_token<'a>(haystack: &'a str, prefix: &str) -> Option<&'a str> {
    haystack.match_indices(prefix).find_map(|(idx, _)| {
        let start = idx + prefix.len();
        let candidate = haystack.get(start..start + 4)?;
        candidate
            .chars()
            .all(|c| c.is_ascii_hexdigit())
            .then_some(candidate)
    })
}

/// How the target device is picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionCriterion {
    /// Match `vid_<vendor_id>` and `pid_<product_id>` in the hardware ID
    UsbIds { vendor_id: String, product_id: String },
    /// Case-insensitive substring of the port description
    DeviceName(String),
    /// Use this port path directly, no enumeration
    PortPath(String),
}

impl SelectionCriterion {
    /// Build a criterion from optional CLI-style inputs. VID and PID only
    /// count as a pair; precedence is USB IDs, then name, then explicit path.
    pub fn from_parts(
        vendor_id: Option<&str>,
        product_id: Option<&str>,
        device_name: Option<&str>,
        port_path: Option<&str>,
    ) -> Option<Self> {
        if let (Some(vid), Some(pid)) = (vendor_id, product_id) {
            return Some(Self::UsbIds {
                vendor_id: vid.to_string(),
                product_id: pid.to_string(),
            });
        }
        if let Some(name) = device_name.filter(|n| !n.is_empty()) {
            return Some(Self::DeviceName(name.to_string()));
        }
        port_path
            .filter(|p| !p.is_empty())
            .map(|p| Self::PortPath(p.to_string()))
    }
}

impl fmt::Display for SelectionCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UsbIds { vendor_id, product_id } => {
                write!(f, "VID:{} PID:{}", vendor_id, product_id)
            }
            Self::DeviceName(name) => write!(f, "name '{}'", name),
            Self::PortPath(path) => write!(f, "port {}", path),
        }
    }
}
