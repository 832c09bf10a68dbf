use crate::domain::port::{PortInfo, SelectionCriterion};
use tracing::{info, warn};

/// Pick the first port, in enumeration order, that satisfies `criterion`.
///
/// USB IDs match when the hardware ID contains both `vid_<vendor_id>` and
/// `pid_<product_id>` case-insensitively, anywhere and in any order. A
/// device name matches a case-insensitive substring of the description.
/// An explicit port path never matches an enumerated port; callers open
/// it directly.
pub fn find_device<'a>(ports: &'a [PortInfo], criterion: &SelectionCriterion) -> Option<&'a PortInfo> {
    let found = ports.iter().find(|port| matches(port, criterion));

    match found {
        Some(port) => info!("Found device matching {} on port {}", criterion, port.device_path),
        None => warn!("No device matching {} among {} port(s)", criterion, ports.len()),
    }
    found
}

/// Whether a single port satisfies `criterion`.
pub fn matches(port: &PortInfo, criterion: &SelectionCriterion) -> bool {
    match criterion {
        SelectionCriterion::UsbIds { vendor_id, product_id } => {
            let hwid = port.hardware_id.to_lowercase();
            hwid.contains(&format!("vid_{}", vendor_id.to_lowercase()))
                && hwid.contains(&format!("pid_{}", product_id.to_lowercase()))
        }
        SelectionCriterion::DeviceName(name) => {
            port.description.to_lowercase().contains(&name.to_lowercase())
        }
        SelectionCriterion::PortPath(_) => false,
    }
}
