use crate::collectors::arcconf::{collect_logical_devices, count_controllers, resolve_cli_path};
use crate::collectors::CollectError;
use crate::config::{CliConfig, InventoryConfig};
use crate::exec::RemoteExecutor;
use crate::notify::{ReportSender, SendError};
use crate::render::render_report;
use crate::state::{DeviceStatuses, HostStatusReport};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("сбой опроса {host} (пользователь {user}): {source}")]
    Host {
        host: String,
        user: String,
        source: CollectError,
    },
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("отчёт не сформирован: {0}")]
    Collect(#[from] ReportError),
    #[error("отчёт не отправлен: {0}")]
    Send(#[from] SendError),
}

#[derive(Debug)]
pub enum RunOutcome {
    Report(String),
    Fault(ReportError),
}

pub struct ReportAggregator<'a, E> {
    executor: &'a E,
    inventory: &'a InventoryConfig,
    cli: &'a CliConfig,
}

impl<'a, E: RemoteExecutor> ReportAggregator<'a, E> {
    pub fn new(executor: &'a E, inventory: &'a InventoryConfig, cli: &'a CliConfig) -> Self {
        Self {
            executor,
            inventory,
            cli,
        }
    }

    // first failing host aborts the whole pass
    pub async fn build(&self) -> Result<HostStatusReport, ReportError> {
        let mut report = HostStatusReport::new();
        for group in self.inventory.groups() {
            for host in &group.hosts {
                let devices = self
                    .collect_host(&group.user, host)
                    .await
                    .map_err(|source| ReportError::Host {
                        host: host.clone(),
                        user: group.user.clone(),
                        source,
                    })?;
                if devices.is_empty() {
                    warn!(host = %host, user = %group.user, "логические устройства не найдены");
                } else {
                    info!(host = %host, user = %group.user, devices = devices.len(), "хост опрошен");
                }
                report.insert(host, devices);
            }
        }
        Ok(report)
    }

    async fn collect_host(
        &self,
        user: &str,
        host: &str,
    ) -> Result<DeviceStatuses, CollectError> {
        let cli_path = resolve_cli_path(host, self.cli);
        let controllers = count_controllers(self.executor, user, host, &cli_path).await?;
        info!(host, cli_path = %cli_path, controllers, "найдены контроллеры");
        collect_logical_devices(self.executor, user, host, &cli_path, controllers).await
    }

    pub async fn generate(&self) -> RunOutcome {
        match self.build().await {
            Ok(report) => RunOutcome::Report(render_report(&report)),
            Err(err) => RunOutcome::Fault(err),
        }
    }
}

pub async fn deliver<S: ReportSender>(
    outcome: RunOutcome,
    sender: &S,
    subject: &str,
) -> Result<(), RunError> {
    match outcome {
        RunOutcome::Report(html) => {
            sender.send(subject, &html).await?;
            Ok(())
        }
        RunOutcome::Fault(err) => Err(RunError::Collect(err)),
    }
}
