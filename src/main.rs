mod collectors;
mod config;
mod exec;
mod notify;
mod render;
mod report;
mod state;
mod telegram;
#[cfg(test)]
mod testing;

use clap::Parser;
use config::Config;
use exec::SshExecutor;
use notify::{DiscardSender, ReportSender, SmtpSender, StdoutSender};
use report::{deliver, ReportAggregator, RunError};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "adaptec-report")]
#[command(version)]
struct Cli {
    #[arg(long, default_value = "./config.yaml")]
    config: String,
    #[arg(long)]
    print_default_config: bool,
    /// Print the rendered report instead of mailing it.
    #[arg(long)]
    dry_run: bool,
    #[arg(long, conflicts_with = "email_off")]
    email_on: bool,
    #[arg(long, conflicts_with = "email_on")]
    email_off: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    if cli.print_default_config {
        println!("{}", Config::example_yaml());
        return ExitCode::SUCCESS;
    }

    let mut cfg = match Config::load_from_file(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(error = %err, "не удалось загрузить конфигурацию");
            return ExitCode::FAILURE;
        }
    };
    if cli.email_on {
        cfg.email.enabled = true;
    } else if cli.email_off {
        cfg.email.enabled = false;
    }
    if let Err(err) = cfg.validate() {
        error!(error = %err, "конфигурация не прошла проверку");
        return ExitCode::FAILURE;
    }

    info!(
        hosts = cfg.inventory.host_count(),
        email = cfg.email.enabled,
        dry_run = cli.dry_run,
        "запуск adaptec-report"
    );

    let result = if cli.dry_run {
        run(&cfg, &StdoutSender).await
    } else if cfg.email.enabled {
        match SmtpSender::new(&cfg.email) {
            Ok(sender) => run(&cfg, &sender).await,
            Err(err) => {
                error!(error = %err, "не удалось подготовить отправку почты");
                return ExitCode::FAILURE;
            }
        }
    } else {
        warn!("email.enabled=false: отчёт будет сформирован, но не отправлен");
        run(&cfg, &DiscardSender).await
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "запуск завершился сбоем");
            if let RunError::Collect(fault) = &err {
                notify_fault(&cfg, &fault.to_string()).await;
            }
            ExitCode::FAILURE
        }
    }
}

async fn run<S: ReportSender>(cfg: &Config, sender: &S) -> Result<(), RunError> {
    let started = Instant::now();
    let executor = SshExecutor::new(&cfg.ssh);
    let aggregator = ReportAggregator::new(&executor, &cfg.inventory, &cfg.cli);

    let outcome = aggregator.generate().await;
    info!(
        elapsed = %humantime::format_duration(started.elapsed()),
        "опрос хостов завершён"
    );
    deliver(outcome, sender, &cfg.email.subject).await
}

async fn notify_fault(cfg: &Config, fault: &str) {
    if !cfg.telegram.enabled {
        return;
    }
    match telegram::build_bot(&cfg.telegram) {
        Ok(bot) => {
            let sent = telegram::send_fault_notice(&bot, &cfg.telegram, fault).await;
            info!(chats = sent, "уведомление о сбое отправлено в Telegram");
        }
        Err(err) => warn!(error = %err, "уведомление о сбое не отправлено"),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
