use crate::exec::{CommandOutput, ExecError, RemoteExecutor};
use crate::notify::{ReportSender, SendError};
use std::collections::HashMap;
use std::sync::Mutex;

enum Scripted {
    Output(String, i32),
    Transport,
}

/// In-memory executor answering by `(host, joined args)`.
/// Unscripted commands return empty output with status 0.
#[derive(Default)]
pub struct FakeExecutor {
    script: HashMap<(String, String), Scripted>,
    calls: Mutex<Vec<(String, String, String)>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, host: &str, command: &str, stdout: &str) -> Self {
        self.respond_with_status(host, command, stdout, 0)
    }

    pub fn respond_with_status(
        mut self,
        host: &str,
        command: &str,
        stdout: &str,
        status: i32,
    ) -> Self {
        self.script.insert(
            (host.to_string(), command.to_string()),
            Scripted::Output(stdout.to_string(), status),
        );
        self
    }

    pub fn fail(mut self, host: &str, command: &str) -> Self {
        self.script
            .insert((host.to_string(), command.to_string()), Scripted::Transport);
        self
    }

    /// `(user, host, command)` in call order.
    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl RemoteExecutor for FakeExecutor {
    async fn execute(
        &self,
        user: &str,
        host: &str,
        args: &[String],
    ) -> Result<CommandOutput, ExecError> {
        let command = args.join(" ");
        self.calls
            .lock()
            .unwrap()
            .push((user.to_string(), host.to_string(), command.clone()));

        match self.script.get(&(host.to_string(), command)) {
            Some(Scripted::Output(stdout, status)) => Ok(CommandOutput {
                stdout: stdout.clone(),
                status: Some(*status),
            }),
            Some(Scripted::Transport) => Err(ExecError::Transport {
                destination: format!("{user}@{host}"),
                stderr: "Connection refused".to_string(),
            }),
            None => Ok(CommandOutput {
                stdout: String::new(),
                status: Some(0),
            }),
        }
    }
}

#[derive(Default)]
pub struct FakeSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl FakeSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl ReportSender for FakeSender {
    async fn send(&self, subject: &str, html_body: &str) -> Result<(), SendError> {
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), html_body.to_string()));
        Ok(())
    }
}
