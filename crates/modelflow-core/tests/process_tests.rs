//! Tests del process runner contra comandos reales del sistema.

#![cfg(unix)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use modelflow_core::{process, CancelSignal, CommandConnectors, ConversionStatus, LineConnector,
                     ProcessCommand, SPAWN_FAILURE_EXIT_CODE};

type Lines = Arc<Mutex<Vec<String>>>;

fn collector(into: &Lines) -> LineConnector {
    let into = Arc::clone(into);
    Arc::new(move |line: &str| into.lock().expect("lines lock").push(line.to_string()))
}

#[tokio::test]
async fn successful_command_streams_stdout_and_stderr_lines() {
    let command_lines: Lines = Arc::new(Mutex::new(Vec::new()));
    let stdout_lines: Lines = Arc::new(Mutex::new(Vec::new()));
    let stderr_lines: Lines = Arc::new(Mutex::new(Vec::new()));

    let connectors = CommandConnectors::new(Some(collector(&command_lines)),
                                            Some(collector(&stdout_lines)),
                                            Some(collector(&stderr_lines)),
                                            CancelSignal::new());

    let command = ProcessCommand::new("sh", ["-c", "echo uno; echo dos; echo err >&2"]);
    let status = process::run(command, &connectors).await;

    assert_eq!(status, ConversionStatus::Success(()));
    assert_eq!(*command_lines.lock().expect("lock"),
               vec!["sh -c echo uno; echo dos; echo err >&2".to_string()]);
    assert_eq!(*stdout_lines.lock().expect("lock"),
               vec!["uno".to_string(), "dos".to_string()]);
    assert_eq!(*stderr_lines.lock().expect("lock"), vec!["err".to_string()]);
}

#[tokio::test]
async fn non_zero_exit_maps_to_failure_with_the_exit_code() {
    let connectors = CommandConnectors::empty();
    let status = process::run(ProcessCommand::new("sh", ["-c", "exit 7"]), &connectors).await;
    assert_eq!(status, ConversionStatus::Failure { exit_code: 7 });
}

#[tokio::test]
async fn unspawnable_command_maps_to_failure_not_panic() {
    let connectors = CommandConnectors::empty();
    let command = ProcessCommand::new("definitely-not-a-real-binary-5f2f", Vec::<String>::new());
    let status = process::run(command, &connectors).await;
    assert_eq!(status,
               ConversionStatus::Failure { exit_code: SPAWN_FAILURE_EXIT_CODE });
}

#[tokio::test]
async fn cancellation_kills_a_long_running_child() {
    let signal = CancelSignal::new();
    let connectors = CommandConnectors::new(None, None, None, signal.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        signal.cancel();
    });

    let started = Instant::now();
    let status = process::run(ProcessCommand::new("sleep", ["5"]), &connectors).await;
    canceller.await.expect("canceller task");

    assert_eq!(status, ConversionStatus::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(3),
            "runner must not wait for the natural exit after a cancel");
}

#[tokio::test]
async fn cancellation_wins_over_a_racing_successful_exit() {
    // El proceso saldría con éxito a los ~300ms; cancelamos a los ~100ms.
    let signal = CancelSignal::new();
    let connectors = CommandConnectors::new(None, None, None, signal.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        signal.cancel();
    });

    let status = process::run(ProcessCommand::new("sh", ["-c", "sleep 0.3"]), &connectors).await;
    canceller.await.expect("canceller task");

    assert_eq!(status, ConversionStatus::Cancelled);
}

#[tokio::test]
async fn an_already_cancelled_signal_skips_the_spawn() {
    let stdout_lines: Lines = Arc::new(Mutex::new(Vec::new()));
    let signal = CancelSignal::new();
    signal.cancel();
    let connectors =
        CommandConnectors::new(None, Some(collector(&stdout_lines)), None, signal);

    let status = process::run(ProcessCommand::new("sh", ["-c", "echo never"]), &connectors).await;

    assert_eq!(status, ConversionStatus::Cancelled);
    assert!(stdout_lines.lock().expect("lock").is_empty());
}
