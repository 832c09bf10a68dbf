use crate::cli::args::Args;
use crate::cli::output::{ConsoleWriter, OutputWriter, ProgressLine};
use crate::core::{extractor::{ExtractOptions, FileExtractor}, matcher::find_device};
use crate::domain::{
    config::GrabConfig,
    error::{GrabError, GrabResult},
    port::{PortInfo, SelectionCriterion},
};
use crate::infrastructure::config::ConfigManager;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::serial::{list_ports, ConnectionSettings, SerialSession};
use std::time::Duration;
use tracing::{error, info};

/// Execute CLI command
pub fn execute_command(args: Args) -> GrabResult<()> {
    let writer = ConsoleWriter::new(args.format);

    // Load configuration using ConfigManager
    let config_manager = ConfigManager::new();
    let loaded = match &args.config {
        Some(path) => config_manager.load_config_from_path(path),
        None => config_manager.load_config(),
    };

    // A broken config still gets logged, to the default sink.
    let logging = loaded
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_default();

    // The log file is a side channel; the run goes on without it.
    if let Err(e) = init_logging(&logging, args.verbose) {
        writer.write_error(&format!("Logging disabled: {}", e))?;
    }

    let config = loaded.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    let result = if args.init_config {
        init_config(&writer, &config_manager)
    } else if args.scan_all {
        scan_all_devices(&writer)
    } else {
        extract_from_device(&args, &config, &writer)
    };

    if let Err(e) = &result {
        error!("Run failed: {}", e);
    }
    result
}

fn init_config(writer: &ConsoleWriter, config_manager: &ConfigManager) -> GrabResult<()> {
    let current_dir = std::env::current_dir()?;
    let path = config_manager.init_project_config(&current_dir)?;
    writer.write_message(&format!("Project configuration initialized at '{}'", path.display()))?;
    Ok(())
}

/// List every port with its USB details. No ports is a failure.
pub fn scan_all_devices(writer: &dyn OutputWriter) -> GrabResult<()> {
    let ports = list_ports()?;
    if ports.is_empty() {
        return Err(GrabError::NoPortsFound);
    }
    writer.write_ports(&ports)?;
    Ok(())
}

fn extract_from_device(args: &Args, config: &GrabConfig, writer: &ConsoleWriter) -> GrabResult<()> {
    let criterion = args.selection().ok_or_else(|| {
        GrabError::InvalidInput("one of --vid and --pid, --name, or --port is required".to_string())
    })?;
    let (command, output) = match (&args.command, &args.output) {
        (Some(command), Some(output)) => (command, output),
        _ => {
            return Err(GrabError::InvalidInput(
                "--command and --output are required for file extraction".to_string(),
            ))
        }
    };

    let settings = ConnectionSettings {
        baud_rate: args.baud.unwrap_or(config.serial.baud_rate),
        read_timeout: Duration::from_secs(args.timeout.unwrap_or(config.serial.timeout_secs)),
    };

    let port_path = resolve_port(&criterion, list_ports)?;

    // Dropping the session on any early return closes the port.
    let mut session = SerialSession::new(settings);
    session.open(&port_path)?;

    let options = ExtractOptions::from(&config.transfer).with_expected_size(args.size);
    let progress = ProgressLine::new();
    let mut extractor = FileExtractor::new(options).with_progress(progress.callback());
    let result = extractor.extract(&mut session, command, output);
    session.close();
    progress.finish();

    let report = result?;
    writer.write_report(&report)?;
    info!("Extraction finished: {} bytes from {}", report.bytes_received, port_path);
    Ok(())
}

/// Turn a selection criterion into a concrete port path. An explicit path
/// is used as-is; anything else goes through enumeration and matching.
pub fn resolve_port<F>(criterion: &SelectionCriterion, enumerate: F) -> GrabResult<String>
where
    F: FnOnce() -> GrabResult<Vec<PortInfo>>,
{
    if let SelectionCriterion::PortPath(path) = criterion {
        info!("Using explicitly requested port {}", path);
        return Ok(path.clone());
    }

    let ports = enumerate()?;
    if ports.is_empty() {
        return Err(GrabError::NoPortsFound);
    }

    find_device(&ports, criterion)
        .map(|port| port.device_path.clone())
        .ok_or_else(|| GrabError::DeviceNotMatched {
            criterion: criterion.to_string(),
        })
}
