//! esbuild engine
//!
//! esbuild plugins are JavaScript, so builds go through a small Node driver
//! script embedded in the binary. The request travels in an environment
//! variable and Node runs from the asset root so that esbuild and the plugins
//! resolve from the project's node_modules.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{BuildReport, BundleEngine, EngineError, WatchContext};
use crate::config::Config;
use crate::plugins::PluginSpec;
use crate::targets::{Target, TargetConfig};

const DRIVER: &str = include_str!("driver.mjs");
const REQUEST_ENV: &str = "TWINBUILD_REQUEST";
const READY_MARKER: &str = "twinbuild:ready";

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
enum Mode {
    Build,
    Watch,
}

#[derive(Serialize)]
struct DriverRequest<'a> {
    mode: Mode,
    options: Value,
    plugins: &'a [PluginSpec],
}

/// Runs esbuild through Node
#[derive(Debug, Clone)]
pub struct EsbuildEngine {
    node: String,
    root: PathBuf,
}

impl EsbuildEngine {
    pub fn new(node: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            node: node.into(),
            root: root.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.engine.node.clone(), config.root())
    }

    fn command(&self, mode: Mode, config: &TargetConfig) -> Result<Command, EngineError> {
        let request = DriverRequest {
            mode,
            options: config.to_esbuild_options(),
            plugins: &config.plugins,
        };
        let payload = serde_json::to_string(&request)?;

        let mut cmd = Command::new(&self.node);
        cmd.arg("--input-type=module")
            .arg("--eval")
            .arg(DRIVER)
            .env(REQUEST_ENV, payload)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        Ok(cmd)
    }

    fn spawn_error(&self, source: std::io::Error) -> EngineError {
        EngineError::Spawn {
            program: self.node.clone(),
            source,
        }
    }
}

#[async_trait]
impl BundleEngine for EsbuildEngine {
    async fn build(&self, config: &TargetConfig) -> Result<BuildReport, EngineError> {
        let start = Instant::now();
        debug!(bundle = %config.target, root = %self.root.display(), "Running esbuild");

        let status = self
            .command(Mode::Build, config)?
            .status()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !status.success() {
            return Err(EngineError::Failed {
                target: config.target,
                code: status.code(),
            });
        }

        Ok(BuildReport {
            target: config.target,
            elapsed: start.elapsed(),
        })
    }

    async fn context(&self, config: &TargetConfig) -> Result<Box<dyn WatchContext>, EngineError> {
        let mut command = self.command(Mode::Watch, config)?;
        command.stdout(Stdio::piped());

        Ok(Box::new(EsbuildContext {
            target: config.target,
            program: self.node.clone(),
            command,
            session: None,
        }))
    }
}

/// A watch session backed by one Node process
struct EsbuildContext {
    target: Target,
    program: String,
    command: Command,
    session: Option<JoinHandle<()>>,
}

#[async_trait]
impl WatchContext for EsbuildContext {
    fn target(&self) -> Target {
        self.target
    }

    async fn watch(&mut self) -> Result<(), EngineError> {
        let target = self.target;
        if let Some(session) = &self.session {
            if !session.is_finished() {
                debug!(bundle = %target, "Already watching");
                return Ok(());
            }
        }

        let mut child = self.command.spawn().map_err(|source| EngineError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("driver stdout was not captured"))?;
        let mut lines = BufReader::new(stdout).lines();

        loop {
            match lines.next_line().await? {
                Some(line) if line.trim() == READY_MARKER => break,
                Some(line) => debug!(bundle = %target, "{}", line),
                None => {
                    let status = child.wait().await?;
                    return Err(EngineError::Failed {
                        target,
                        code: status.code(),
                    });
                }
            }
        }

        info!(bundle = %target, "Watching for changes");

        // Rebuild errors are printed by esbuild itself and do not end the
        // session. Only the process going away does.
        self.session = Some(tokio::spawn(async move {
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(bundle = %target, "{}", line);
            }
            match child.wait().await {
                Ok(status) => warn!(bundle = %target, "Watch session exited ({})", status),
                Err(e) => warn!(bundle = %target, "Watch session lost: {}", e),
            }
        }));

        Ok(())
    }
}

impl Drop for EsbuildContext {
    fn drop(&mut self) {
        // Dropping the task drops the child, which kills it.
        if let Some(session) = self.session.take() {
            session.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::{build_configs, BuildFlags, PipelineSettings};

    fn client_config() -> TargetConfig {
        build_configs(BuildFlags::default(), &PipelineSettings::default()).0
    }

    #[test]
    fn test_request_payload() {
        let config = client_config();
        let request = DriverRequest {
            mode: Mode::Watch,
            options: config.to_esbuild_options(),
            plugins: &config.plugins,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["mode"], "watch");
        assert_eq!(json["options"]["entryPoints"][1], "js/sentry.js");
        assert_eq!(json["plugins"][1]["generate"], "client");
    }

    #[test]
    fn test_driver_contract() {
        assert!(DRIVER.contains(REQUEST_ENV));
        assert!(DRIVER.contains(READY_MARKER));
    }

    #[tokio::test]
    async fn test_missing_node_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = EsbuildEngine::new("/nonexistent/twinbuild-node", dir.path());

        let err = engine.build(&client_config()).await.unwrap_err();
        assert!(matches!(err, EngineError::Spawn { .. }), "{:?}", err);

        let mut ctx = engine.context(&client_config()).await.unwrap();
        let err = ctx.watch().await.unwrap_err();
        assert!(matches!(err, EngineError::Spawn { .. }), "{:?}", err);
    }

    /// Stand-in for node that ignores its arguments and runs `body`
    #[cfg(unix)]
    fn fake_node(dir: &std::path::Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-node");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_watch_established_on_ready_marker() {
        let dir = tempfile::tempdir().unwrap();
        let node = fake_node(
            dir.path(),
            "echo run >> runs.log\necho building\necho twinbuild:ready\nexec sleep 30",
        );
        let engine = EsbuildEngine::new(node.to_string_lossy(), dir.path());

        let mut ctx = engine.context(&client_config()).await.unwrap();
        ctx.watch().await.unwrap();
        assert_eq!(ctx.target(), Target::Client);

        // A live session is not replaced by a second watch call.
        ctx.watch().await.unwrap();
        let runs = std::fs::read_to_string(dir.path().join("runs.log")).unwrap();
        assert_eq!(runs.lines().count(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_engine_exit_code_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let node = fake_node(dir.path(), "exit 3");
        let engine = EsbuildEngine::new(node.to_string_lossy(), dir.path());

        let err = engine.build(&client_config()).await.unwrap_err();
        assert!(
            matches!(err, EngineError::Failed { target: Target::Client, code: Some(3) }),
            "{:?}",
            err
        );

        let mut ctx = engine.context(&client_config()).await.unwrap();
        let err = ctx.watch().await.unwrap_err();
        assert!(
            matches!(err, EngineError::Failed { target: Target::Client, code: Some(3) }),
            "{:?}",
            err
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_build_reports_target() {
        let dir = tempfile::tempdir().unwrap();
        let node = fake_node(dir.path(), "exit 0");
        let engine = EsbuildEngine::new(node.to_string_lossy(), dir.path());

        let report = engine.build(&client_config()).await.unwrap();
        assert_eq!(report.target, Target::Client);
    }
}
