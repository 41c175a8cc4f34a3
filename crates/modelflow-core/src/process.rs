//! Process runner: executes one external command and folds its outcome into
//! a `ConversionStatus<()>`.
//!
//! The call does not return until the child has fully terminated, so no
//! orphaned processes survive a cancellation. Once cancellation has been
//! requested, `Cancelled` wins over a racing natural exit.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::connectors::{CommandConnectors, LineConnector};
use crate::status::{ConversionStatus, SPAWN_FAILURE_EXIT_CODE};

/// One external command invocation: program name plus argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    name: String,
    args: Vec<String>,
}

impl ProcessCommand {
    pub fn new<N, I, A>(name: N, args: I) -> Self
        where N: Into<String>,
              I: IntoIterator<Item = A>,
              A: Into<String>
    {
        Self { name: name.into(),
               args: args.into_iter().map(Into::into).collect() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Full command line as reported through the `command` connector.
    pub fn command_line(&self) -> String {
        let mut line = self.name.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Runs `command`, streaming output lines through the connectors as they
/// arrive.
///
/// - Exit code 0 maps to `Success`, any other exit code to `Failure`.
/// - A command that cannot be spawned maps to `Failure` with
///   [`SPAWN_FAILURE_EXIT_CODE`].
/// - If the shared cancel signal transitions to `true` while the child is
///   alive, the child is killed and reaped and the result is `Cancelled`,
///   even if the child happened to exit successfully a moment later.
pub async fn run(command: ProcessCommand, connectors: &CommandConnectors) -> ConversionStatus<()> {
    connectors.emit_command(&command.command_line());

    if connectors.is_cancelled() {
        return ConversionStatus::Cancelled;
    }

    let mut cmd = Command::new(command.name());
    cmd.args(command.args())
       .stdin(Stdio::null())
       .stdout(stdio_for(&connectors.stdout))
       .stderr(stdio_for(&connectors.stderr))
       .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            debug!(command = %command.command_line(), %err, "failed to spawn command");
            return ConversionStatus::Failure { exit_code: SPAWN_FAILURE_EXIT_CODE };
        }
    };

    let stdout_task = match (child.stdout.take(), connectors.stdout.clone()) {
        (Some(stdout), Some(connector)) => Some(tokio::spawn(forward_lines(stdout, connector))),
        _ => None,
    };
    let stderr_task = match (child.stderr.take(), connectors.stderr.clone()) {
        (Some(stderr), Some(connector)) => Some(tokio::spawn(forward_lines(stderr, connector))),
        _ => None,
    };

    // `biased` keeps the poll order deterministic: an issued cancel request
    // is observed before a completed natural exit.
    let wait = tokio::select! {
        biased;
        _ = connectors.cancelled() => {
            let _ = child.start_kill();
            let _ = child.wait().await;
            join(stdout_task).await;
            join(stderr_task).await;
            return ConversionStatus::Cancelled;
        }
        wait = child.wait() => wait,
    };

    // Drain the forwarders so every buffered line is delivered before we
    // report a terminal status.
    join(stdout_task).await;
    join(stderr_task).await;

    match wait {
        Ok(status) if status.success() => ConversionStatus::Success(()),
        Ok(status) => ConversionStatus::Failure { exit_code: status.code().unwrap_or(-1) },
        Err(_) => ConversionStatus::Failure { exit_code: SPAWN_FAILURE_EXIT_CODE },
    }
}

fn stdio_for(connector: &Option<LineConnector>) -> Stdio {
    if connector.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    }
}

async fn forward_lines<R>(reader: R, connector: LineConnector)
    where R: AsyncRead + Unpin
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        connector(&line);
    }
}

async fn join(task: Option<JoinHandle<()>>) {
    if let Some(task) = task {
        let _ = task.await;
    }
}
