use crate::collectors::CollectError;
use crate::config::{CliConfig, HOST_PLACEHOLDER};
use crate::exec::{CommandOutput, RemoteExecutor};
use crate::state::DeviceStatuses;
use tracing::{debug, warn};

const CONTROLLERS_MARKER: &str = "controllers found";
const DEVICE_NAME_MARKER: &str = "device name";
const DEVICE_STATUS_MARKER: &str = "status of logical device";

// ESXi keeps arcconf on the host's ssd volume, not on PATH
pub fn resolve_cli_path(host: &str, cfg: &CliConfig) -> String {
    if host.contains(&cfg.esxi_marker) {
        cfg.esxi_path_template.replace(HOST_PLACEHOLDER, host)
    } else {
        cfg.default_path.clone()
    }
}

pub async fn count_controllers<E: RemoteExecutor>(
    executor: &E,
    user: &str,
    host: &str,
    cli_path: &str,
) -> Result<u32, CollectError> {
    let args = vec![cli_path.to_string(), "getversion".to_string()];
    let output = run(executor, user, host, &args).await?;
    parse_controller_count(&output.stdout)
}

pub async fn collect_logical_devices<E: RemoteExecutor>(
    executor: &E,
    user: &str,
    host: &str,
    cli_path: &str,
    controller_count: u32,
) -> Result<DeviceStatuses, CollectError> {
    let mut scan = LogicalDeviceScan::default();
    for controller in 1..=controller_count {
        let args = vec![
            cli_path.to_string(),
            "GETCONFIG".to_string(),
            controller.to_string(),
            "ld".to_string(),
        ];
        let output = run(executor, user, host, &args).await?;
        debug!(host, controller, "GETCONFIG ld получен");
        scan.feed(&output.stdout);
    }
    Ok(scan.finish())
}

async fn run<E: RemoteExecutor>(
    executor: &E,
    user: &str,
    host: &str,
    args: &[String],
) -> Result<CommandOutput, CollectError> {
    let output = executor.execute(user, host, args).await?;
    if !output.success() {
        warn!(
            host,
            user,
            command = %args.join(" "),
            status = ?output.status,
            "удалённая команда завершилась с ошибкой, используется полученный вывод"
        );
    }
    Ok(output)
}

pub fn parse_controller_count(text: &str) -> Result<u32, CollectError> {
    let mut count = 0;
    for line in text.lines() {
        if line.to_lowercase().contains(CONTROLLERS_MARKER) {
            count = count_from_line(line).ok_or_else(|| CollectError::InvalidControllerCount {
                line: line.trim().to_string(),
            })?;
        }
    }
    Ok(count)
}

// "Controllers found: 2" carries the value after the colon; some builds print
// "2 controllers found" with no colon at all. Negative counts mean none.
fn count_from_line(line: &str) -> Option<u32> {
    let tail = line.rsplit(':').next().unwrap_or(line).trim();
    let count: i64 = tail
        .parse()
        .ok()
        .or_else(|| line.split_whitespace().find_map(|token| token.parse().ok()))?;
    Some(u32::try_from(count.max(0)).unwrap_or(u32::MAX))
}

/// Current name and status persist across lines and controllers of one host;
/// the pair is written back after every line.
#[derive(Debug, Default)]
pub struct LogicalDeviceScan {
    name: String,
    status: String,
    devices: DeviceStatuses,
}

impl LogicalDeviceScan {
    pub fn feed(&mut self, text: &str) {
        for line in text.lines() {
            let lowered = line.to_lowercase();
            if lowered.contains(DEVICE_NAME_MARKER) {
                if let Some(token) = line.split_whitespace().last() {
                    self.name = token.to_string();
                }
            }
            if lowered.contains(DEVICE_STATUS_MARKER) {
                if let Some(token) = line.split_whitespace().last() {
                    self.status = token.to_string();
                }
            }
            // nothing to record before the first device name
            if !self.name.is_empty() {
                self.devices.insert(&self.name, &self.status);
            }
        }
    }

    pub fn finish(self) -> DeviceStatuses {
        self.devices
    }
}
