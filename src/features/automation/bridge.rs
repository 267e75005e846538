//! Bridge to the automation engine.
//!
//! The engine runs outside this crate. [`EngineBridge`] is the call surface
//! the facade needs; [`CommandBridge`] reaches the engine by running a
//! configured program once per call.

use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::events::RawEvent;
use crate::config::EngineConfig;

/// Failure reported by the bridge, carrying the engine's own message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BridgeError {
    pub message: String,
}

impl BridgeError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Calls the engine understands.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngineBridge: Send + Sync {
    /// Begin processing with the given JSON rule array.
    async fn start_service(&self, rules_json: &str) -> Result<(), BridgeError>;

    /// Stop processing.
    async fn stop_service(&self) -> Result<(), BridgeError>;

    /// One of `disabled`, `stopped`, `connected`, `running`.
    async fn get_status(&self) -> Result<String, BridgeError>;

    /// Ask the platform to show its accessibility settings screen.
    async fn open_accessibility_settings(&self) -> Result<(), BridgeError>;
}

/// A bridge that can stream engine events.
pub trait EventSource {
    /// Start streaming events into a channel of the given capacity.
    ///
    /// The returned task ends when the engine closes the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be opened.
    fn events(
        &self,
        capacity: usize,
    ) -> Result<(mpsc::Receiver<RawEvent>, JoinHandle<()>), BridgeError>;
}

/// Reaches the engine through an external program.
///
/// Every call runs `<program> <args...> <sub-command> [argument]`:
/// `start-service <rules-json>`, `stop-service`, `status`,
/// `open-accessibility-settings`, and the long-running `events`.
#[derive(Debug, Clone)]
pub struct CommandBridge {
    program: String,
    args: Vec<String>,
}

impl CommandBridge {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }

    fn command(&self, subcommand: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(subcommand)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    /// Run one sub-command to completion and return its trimmed stdout.
    async fn run(&self, subcommand: &str, argument: Option<&str>) -> Result<String, BridgeError> {
        let mut cmd = self.command(subcommand);
        if let Some(argument) = argument {
            cmd.arg(argument);
        }

        tracing::debug!(program = %self.program, subcommand, "calling engine");
        let output = cmd
            .output()
            .await
            .map_err(|e| BridgeError::new(format!("failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            let message = if stderr.is_empty() {
                format!("{} {subcommand} exited with {}", self.program, output.status)
            } else {
                stderr.to_string()
            };
            return Err(BridgeError::new(message));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl EventSource for CommandBridge {
    /// Each stdout line of `<program> events` is decoded as a [`RawEvent`].
    /// Undecodable lines are skipped. Aborting the task kills the program.
    fn events(
        &self,
        capacity: usize,
    ) -> Result<(mpsc::Receiver<RawEvent>, JoinHandle<()>), BridgeError> {
        let mut child = self
            .command("events")
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| BridgeError::new(format!("failed to run {}: {e}", self.program)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BridgeError::new("engine event stream has no stdout"))?;

        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                let next = tokio::select! {
                    next = lines.next_line() => next,
                    () = tx.closed() => {
                        tracing::debug!("event receiver dropped, stopping engine stream");
                        if let Err(e) = child.start_kill() {
                            tracing::warn!(error = %e, "failed to stop engine event process");
                        }
                        break;
                    }
                };

                match next {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<RawEvent>(line) {
                            Ok(event) => {
                                if tx.send(event).await.is_err() {
                                    if let Err(e) = child.start_kill() {
                                        tracing::warn!(error = %e, "failed to stop engine event process");
                                    }
                                    break;
                                }
                            }
                            Err(e) => tracing::warn!(error = %e, line, "skipping undecodable engine event"),
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "engine event stream failed");
                        break;
                    }
                }
            }

            drop(lines);
            if let Err(e) = child.wait().await {
                tracing::warn!(error = %e, "failed to reap engine event process");
            }
        });

        Ok((rx, handle))
    }
}

#[async_trait]
impl EngineBridge for CommandBridge {
    async fn start_service(&self, rules_json: &str) -> Result<(), BridgeError> {
        self.run("start-service", Some(rules_json)).await.map(|_| ())
    }

    async fn stop_service(&self) -> Result<(), BridgeError> {
        self.run("stop-service", None).await.map(|_| ())
    }

    async fn get_status(&self) -> Result<String, BridgeError> {
        self.run("status", None).await
    }

    async fn open_accessibility_settings(&self) -> Result<(), BridgeError> {
        self.run("open-accessibility-settings", None).await.map(|_| ())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    /// A fake engine written as a shell script; `$1` is the sub-command.
    fn script_bridge(script: &str) -> CommandBridge {
        CommandBridge::new(
            "sh",
            vec!["-c".to_string(), script.to_string(), "engine".to_string()],
        )
    }

    const FAKE_ENGINE: &str = r#"
case "$1" in
  status) echo "  running  " ;;
  start-service) printf '%s' "$2" > /dev/null; exit 0 ;;
  stop-service) echo "engine not bound" >&2; exit 3 ;;
  open-accessibility-settings) exit 1 ;;
  events)
    echo '{"event":"serviceConnected"}'
    echo 'not json'
    echo ''
    echo '{"event":"commentPosted","data":{"reply":"gm"}}'
    ;;
esac
"#;

    #[tokio::test]
    async fn test_status_is_trimmed() {
        let bridge = script_bridge(FAKE_ENGINE);
        assert_eq!(bridge.get_status().await.unwrap(), "running");
    }

    #[tokio::test]
    async fn test_start_passes_rules() {
        let bridge = script_bridge(r#"[ "$1" = start-service ] && [ "$2" = '[{"id":"1"}]' ]"#);
        bridge.start_service(r#"[{"id":"1"}]"#).await.unwrap();
        assert!(bridge.start_service("[]").await.is_err());
    }

    #[tokio::test]
    async fn test_failure_uses_stderr() {
        let bridge = script_bridge(FAKE_ENGINE);
        let err = bridge.stop_service().await.unwrap_err();
        assert_eq!(err.message, "engine not bound");
    }

    #[tokio::test]
    async fn test_failure_without_stderr() {
        let bridge = script_bridge(FAKE_ENGINE);
        let err = bridge.open_accessibility_settings().await.unwrap_err();
        assert!(err.message.contains("open-accessibility-settings exited"));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let bridge = CommandBridge::new("/nonexistent/engojee-engine", Vec::new());
        let err = bridge.get_status().await.unwrap_err();
        assert!(err.message.starts_with("failed to run"));
    }

    #[tokio::test]
    async fn test_event_stream_skips_garbage() {
        let bridge = script_bridge(FAKE_ENGINE);
        let (mut rx, handle) = bridge.events(8).unwrap();

        let mut names = Vec::new();
        while let Some(event) = rx.recv().await {
            names.push(event.name);
        }
        handle.await.unwrap();

        assert_eq!(names, vec!["serviceConnected", "commentPosted"]);
    }

    #[tokio::test]
    async fn test_dropping_receiver_stops_long_running_stream() {
        let bridge = script_bridge(
            r#"[ "$1" = events ] && echo '{"event":"postLiked"}' && exec sleep 1000"#,
        );
        let (mut rx, handle) = bridge.events(1).unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.name, "postLiked");
        drop(rx);

        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("event task kept running after the receiver was dropped")
            .unwrap();
    }
}
