use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const HOST_PLACEHOLDER: &str = "{host}";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub inventory: InventoryConfig,
    #[serde(default)]
    pub ssh: SshConfig,
    #[serde(default)]
    pub cli: CliConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InventoryConfig {
    #[serde(default)]
    pub linux: HostGroup,
    #[serde(default)]
    pub windows: HostGroup,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HostGroup {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub hosts: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SshConfig {
    #[serde(default = "default_ssh_program")]
    pub program: String,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default = "default_cli_path")]
    pub default_path: String,
    #[serde(default = "default_esxi_marker")]
    pub esxi_marker: String,
    #[serde(default = "default_esxi_path_template")]
    pub esxi_path_template: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default = "default_starttls")]
    pub starttls: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default = "default_password_env")]
    pub password_env: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default = "default_subject")]
    pub subject: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_bot_token_env")]
    pub bot_token_env: String,
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub chat_ids: Vec<i64>,
}

impl InventoryConfig {
    // linux first, then windows
    pub fn groups(&self) -> [&HostGroup; 2] {
        [&self.linux, &self.windows]
    }

    pub fn host_count(&self) -> usize {
        self.groups().iter().map(|g| g.hosts.len()).sum()
    }
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            program: default_ssh_program(),
            options: Vec::new(),
        }
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            default_path: default_cli_path(),
            esxi_marker: default_esxi_marker(),
            esxi_path_template: default_esxi_path_template(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            starttls: default_starttls(),
            username: None,
            password_env: default_password_env(),
            password: None,
            from: String::new(),
            to: Vec::new(),
            subject: default_subject(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bot_token_env: default_bot_token_env(),
            bot_token: None,
            chat_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("не удалось прочитать файл конфигурации {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("не удалось разобрать YAML в {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("ошибка валидации конфигурации: {0}")]
    Validation(String),
}

impl Config {
    // Parses only; callers apply CLI overrides and then call `validate`.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let path_display = path_ref.display().to_string();
        let text = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_display.clone(),
            source,
        })?;

        Self::from_yaml(&text).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path_display,
                source,
            },
            other => other,
        })
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: "<inline>".to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_inventory(&self.inventory)?;
        validate_ssh(&self.ssh)?;
        validate_cli(&self.cli)?;
        validate_email(&self.email)?;
        validate_telegram(&self.telegram)?;
        Ok(())
    }

    pub fn example_yaml() -> &'static str {
        include_str!("../config.yaml.example")
    }
}

fn validate_inventory(inventory: &InventoryConfig) -> Result<(), ConfigError> {
    if inventory.host_count() == 0 {
        return Err(ConfigError::Validation(
            "inventory не содержит ни одного хоста".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for (label, group) in [("linux", &inventory.linux), ("windows", &inventory.windows)] {
        if group.hosts.is_empty() {
            continue;
        }
        if group.user.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "inventory.{label}.user обязателен, если заданы hosts"
            )));
        }
        for host in &group.hosts {
            if host.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "inventory.{label}.hosts[*] не должен быть пустым"
                )));
            }
            if !seen.insert(host.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "хост '{host}' указан в inventory более одного раза"
                )));
            }
        }
    }
    Ok(())
}

fn validate_ssh(cfg: &SshConfig) -> Result<(), ConfigError> {
    if cfg.program.trim().is_empty() {
        return Err(ConfigError::Validation(
            "ssh.program не должен быть пустым".to_string(),
        ));
    }
    Ok(())
}

fn validate_cli(cfg: &CliConfig) -> Result<(), ConfigError> {
    if cfg.default_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "cli.default_path не должен быть пустым".to_string(),
        ));
    }
    if cfg.esxi_marker.is_empty() {
        return Err(ConfigError::Validation(
            "cli.esxi_marker не должен быть пустым".to_string(),
        ));
    }
    if !cfg.esxi_path_template.contains(HOST_PLACEHOLDER) {
        return Err(ConfigError::Validation(format!(
            "cli.esxi_path_template должен содержать {HOST_PLACEHOLDER}"
        )));
    }
    Ok(())
}

fn validate_email(cfg: &EmailConfig) -> Result<(), ConfigError> {
    if !cfg.enabled {
        return Ok(());
    }
    if cfg.smtp_host.trim().is_empty() {
        return Err(ConfigError::Validation(
            "email.smtp_host обязателен при email.enabled".to_string(),
        ));
    }
    if cfg.smtp_port == 0 {
        return Err(ConfigError::Validation(
            "email.smtp_port должен быть в диапазоне 1..65535".to_string(),
        ));
    }
    if cfg.from.trim().is_empty() {
        return Err(ConfigError::Validation(
            "email.from обязателен при email.enabled".to_string(),
        ));
    }
    if cfg.to.is_empty() {
        return Err(ConfigError::Validation(
            "email.to должен содержать хотя бы одного получателя".to_string(),
        ));
    }
    if cfg.to.iter().any(|r| r.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "email.to[*] не должен быть пустым".to_string(),
        ));
    }
    if cfg.subject.trim().is_empty() {
        return Err(ConfigError::Validation(
            "email.subject не должен быть пустым".to_string(),
        ));
    }
    Ok(())
}

fn validate_telegram(cfg: &TelegramConfig) -> Result<(), ConfigError> {
    if cfg.enabled && cfg.chat_ids.is_empty() {
        return Err(ConfigError::Validation(
            "telegram.chat_ids должен содержать хотя бы один chat id при telegram.enabled"
                .to_string(),
        ));
    }
    Ok(())
}

fn default_ssh_program() -> String {
    "ssh".to_string()
}

fn default_cli_path() -> String {
    "arcconf".to_string()
}

fn default_esxi_marker() -> String {
    "esxi".to_string()
}

fn default_esxi_path_template() -> String {
    "/vmfs/volumes/{host}_ssdvol/arcconf".to_string()
}

const fn default_smtp_port() -> u16 {
    587
}

const fn default_starttls() -> bool {
    true
}

fn default_password_env() -> String {
    "ADAPTEC_REPORT_SMTP_PASSWORD".to_string()
}

fn default_subject() -> String {
    "Adaptec report".to_string()
}

fn default_bot_token_env() -> String {
    "TELEGRAM_BOT_TOKEN".to_string()
}
