//! Servers that documents are fetched from.
//!
//! The `DevServer` trait gives tests a uniform way to turn server-relative
//! paths into URLs. `StaticUrlServer` points at something already running;
//! `ServerProcess` launches a command, waits until its URI answers, and kills
//! it on `terminate()` or drop.

use crate::error::{MarkupError, Result};
use crate::http;
use crate::probe::{probe, ProbeConfig};
use async_trait::async_trait;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Somewhere documents can be fetched from by path.
#[async_trait]
pub trait DevServer: Send + Sync {
    /// Origin that paths are resolved against, such as `http://127.0.0.1:8080`.
    fn base_url(&self) -> &str;

    /// Fails when the server cannot serve documents right now.
    ///
    /// Servers that are known to be up can keep the default, which never fails.
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    /// Joins `path` onto [`base_url`](Self::base_url) with exactly one `/`
    /// between them.
    fn url(&self, path: &str) -> String {
        let base = self.base_url().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

impl fmt::Debug for dyn DevServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DevServer")
            .field("base_url", &self.base_url())
            .finish()
    }
}

/// A fixed origin that someone else keeps running.
///
/// Its health check always passes; a dead origin surfaces as a fetch error.
#[derive(Debug, Clone)]
pub struct StaticUrlServer {
    base_url: String,
}

impl StaticUrlServer {
    /// Points at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl DevServer for StaticUrlServer {
    fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// How to launch a server process.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Extra environment variables, layered over the current environment.
    pub env: HashMap<String, String>,

    /// Working directory (None = inherit).
    pub cwd: Option<PathBuf>,

    /// How to wait for the server to come up.
    pub probe: ProbeConfig,
}

impl LaunchOptions {
    /// Creates options with default probing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an environment variable for the child.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Sets the child's working directory.
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Sets the probe configuration.
    #[must_use]
    pub fn with_probe(mut self, probe: ProbeConfig) -> Self {
        self.probe = probe;
        self
    }
}

/// A server child process that answered its availability probe.
///
/// # Example
///
/// ```ignore
/// let server = ServerProcess::launch(
///     &["python3", "-m", "http.server", "3333", "--bind", "localhost"],
///     "http://localhost:3333",
///     LaunchOptions::new().with_cwd("tests/fixtures"),
/// )
/// .await?;
/// let doc = Document::from_server(&server, "/splash.html").await?;
/// server.terminate().await?;
/// ```
pub struct ServerProcess {
    child: Option<Child>,
    uri: String,
}

impl ServerProcess {
    /// Spawns `command` and waits until `uri` answers.
    ///
    /// The child inherits stdout and stderr, gets a piped stdin, and is
    /// killed if the handle is dropped.
    ///
    /// # Errors
    ///
    /// Returns `LaunchFailed` for an empty or unspawnable command,
    /// `ServerExited` if the child exits before the probe succeeds, and any
    /// probe error (the child is killed in that case).
    pub async fn launch<S: AsRef<OsStr>>(
        command: &[S],
        uri: impl Into<String>,
        options: LaunchOptions,
    ) -> Result<Self> {
        let uri = uri.into();
        let (program, args) = command.split_first().ok_or_else(|| MarkupError::LaunchFailed {
            reason: "empty command".to_string(),
            source: None,
        })?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .envs(&options.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|e| MarkupError::LaunchFailed {
            reason: format!(
                "failed to spawn `{}`",
                AsRef::<OsStr>::as_ref(program).to_string_lossy()
            ),
            source: Some(Box::new(e)),
        })?;
        info!(pid = ?child.id(), uri = %uri, "launched server process");

        let outcome = tokio::select! {
            probed = probe(&uri, &options.probe) => Ok(probed),
            status = child.wait() => Err(status),
        };

        match outcome {
            Ok(Ok(attempts)) => {
                info!(uri = %uri, attempts, "server is available");
                Ok(Self {
                    child: Some(child),
                    uri,
                })
            }
            Ok(Err(err)) => {
                if let Err(kill_err) = child.start_kill() {
                    debug!("failed to kill server after probe error: {}", kill_err);
                }
                Err(err)
            }
            Err(status) => Err(MarkupError::ServerExited { status: status? }),
        }
    }

    /// The URI the server was probed at.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// OS process id, if the child is still running.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Kills the server process and waits for it to exit.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if waiting on the child fails.
    pub async fn terminate(mut self) -> Result<()> {
        if let Some(mut child) = self.child.take() {
            debug!(uri = %self.uri, "terminating server process");
            if let Err(e) = child.start_kill() {
                debug!("server process already gone: {}", e);
            }
            child.wait().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl DevServer for ServerProcess {
    fn base_url(&self) -> &str {
        &self.uri
    }

    async fn health_check(&self) -> Result<()> {
        http::head(&self.uri).await
    }
}

impl fmt::Debug for ServerProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerProcess")
            .field("uri", &self.uri)
            .field("pid", &self.pid())
            .finish()
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        // kill_on_drop on the child does the actual cleanup
        if self.child.is_some() {
            warn!("ServerProcess dropped without terminate() - killing via Drop");
        }
    }
}
