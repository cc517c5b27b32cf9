use crate::config::SshConfig;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

// ssh's own failures (connect, auth) exit with 255
const SSH_TRANSPORT_FAILURE: i32 = 255;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub status: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("не удалось запустить {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("ssh-сессия с {destination} не установлена: {stderr}")]
    Transport { destination: String, stderr: String },
}

pub trait RemoteExecutor {
    async fn execute(
        &self,
        user: &str,
        host: &str,
        args: &[String],
    ) -> Result<CommandOutput, ExecError>;
}

#[derive(Debug, Clone)]
pub struct SshExecutor {
    program: String,
    options: Vec<String>,
}

impl SshExecutor {
    pub fn new(cfg: &SshConfig) -> Self {
        Self {
            program: cfg.program.clone(),
            options: cfg.options.clone(),
        }
    }
}

impl RemoteExecutor for SshExecutor {
    async fn execute(
        &self,
        user: &str,
        host: &str,
        args: &[String],
    ) -> Result<CommandOutput, ExecError> {
        let destination = format!("{user}@{host}");
        debug!(program = %self.program, %destination, args = ?args, "remote command");

        let output = Command::new(&self.program)
            .args(&self.options)
            .arg(&destination)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ExecError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let status = output.status.code();
        if status == Some(SSH_TRANSPORT_FAILURE) {
            return Err(ExecError::Transport {
                destination,
                stderr: decode_output(&output.stderr).trim().to_string(),
            });
        }

        Ok(CommandOutput {
            stdout: decode_output(&output.stdout),
            status,
        })
    }
}

fn decode_output(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn executor(program: &str, options: &[&str]) -> SshExecutor {
        SshExecutor::new(&SshConfig {
            program: program.to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn forwards_destination_and_args_verbatim() {
        let exec = executor("echo", &["-n"]);
        let out = exec
            .execute("root", "esxi-1", &args(&["/vmfs/volumes/esxi-1_ssdvol/arcconf", "GETCONFIG", "1", "ld"]))
            .await
            .expect("echo должен выполниться");

        assert_eq!(
            out.stdout,
            "root@esxi-1 /vmfs/volumes/esxi-1_ssdvol/arcconf GETCONFIG 1 ld"
        );
        assert!(out.success());
    }

    #[tokio::test]
    async fn remote_nonzero_exit_is_not_a_fault() {
        let exec = executor("sh", &["-c", "echo partial; exit 3", "sh"]);
        let out = exec
            .execute("root", "srv", &args(&["arcconf", "getversion"]))
            .await
            .expect("ненулевой код удалённой команды не является ошибкой");

        assert_eq!(out.stdout, "partial\n");
        assert_eq!(out.status, Some(3));
        assert!(!out.success());
    }

    #[tokio::test]
    async fn ssh_exit_255_is_transport_fault() {
        let exec = executor("sh", &["-c", "echo 'Connection refused' >&2; exit 255", "sh"]);
        let err = exec
            .execute("root", "srv", &args(&["arcconf", "getversion"]))
            .await
            .expect_err("код 255 означает сбой ssh");

        match err {
            ExecError::Transport { destination, stderr } => {
                assert_eq!(destination, "root@srv");
                assert_eq!(stderr, "Connection refused");
            }
            other => panic!("неожиданная ошибка: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_client_is_spawn_fault() {
        let exec = executor("/nonexistent/ssh-client", &[]);
        let err = exec
            .execute("root", "srv", &args(&["arcconf"]))
            .await
            .expect_err("несуществующая программа не должна запускаться");
        assert!(matches!(err, ExecError::Spawn { .. }));
    }
}
