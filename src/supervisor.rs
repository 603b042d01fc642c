//! CoreNLP server supervision
//!
//! Launches the CoreNLP server as a child JVM, waits until it answers its
//! liveness probe, and tears it down again. The child is killed when the
//! [`CoreNlpServer`] handle is dropped.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::{lookup_host, TcpListener};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// CoreNLP release the default artifact names refer to
pub const CORENLP_VERSION: &str = "3.9.2";

/// Main class of the CoreNLP HTTP server
const SERVER_CLASS: &str = "edu.stanford.nlp.pipeline.StanfordCoreNLPServer";

/// How long `stop` waits for the port to become bindable again
const PORT_RELEASE_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that prevent the parser service from starting
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("parser artifact not found: {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("port {port} on {host} is already in use")]
    PortInUse { host: String, port: u16 },

    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("parser server exited before becoming ready ({0})")]
    ExitedEarly(String),

    #[error("parser server not ready after {0:?}")]
    NotReady(Duration),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Configuration for launching the CoreNLP server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// CoreNLP code jar
    pub jar: PathBuf,
    /// CoreNLP models jar
    pub models_jar: PathBuf,
    /// Java executable
    pub java: String,
    pub host: String,
    pub port: u16,
    /// JVM heap size, passed as `-mx<memory>`
    pub memory: String,
    /// Server-side per-request timeout in milliseconds
    pub server_timeout_ms: u64,
    /// Annotators to load at startup instead of on first request
    pub preload: Option<String>,
    pub startup_timeout_secs: u64,
    /// Interval between liveness probes during startup
    pub poll_interval_ms: u64,
    /// File receiving the server's stderr; discarded when unset
    pub log_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::in_dir(Path::new("models/stanford-corenlp-full-2018-10-05"))
    }
}

impl ServerConfig {
    /// Default configuration with both jars expected inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            jar: dir.join(format!("stanford-corenlp-{}.jar", CORENLP_VERSION)),
            models_jar: dir.join(format!("stanford-corenlp-{}-models.jar", CORENLP_VERSION)),
            java: "java".to_string(),
            host: "localhost".to_string(),
            port: 9000,
            memory: "2g".to_string(),
            server_timeout_ms: 60_000,
            preload: Some("tokenize,ssplit,pos,parse".to_string()),
            startup_timeout_secs: 120,
            poll_interval_ms: 500,
            log_file: None,
        }
    }

    /// Address clients should use
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Arguments passed to the java executable
    fn command_args(&self) -> Result<Vec<OsString>, StartupError> {
        let classpath = std::env::join_paths([&self.jar, &self.models_jar])
            .map_err(|e| StartupError::Io(io::Error::new(io::ErrorKind::InvalidInput, e)))?;
        let mut args: Vec<OsString> = vec![
            format!("-mx{}", self.memory).into(),
            "-cp".into(),
            classpath,
            SERVER_CLASS.into(),
            "-port".into(),
            self.port.to_string().into(),
            "-timeout".into(),
            self.server_timeout_ms.to_string().into(),
        ];
        if let Some(preload) = &self.preload {
            args.push("-preload".into());
            args.push(preload.into());
        }
        Ok(args)
    }
}

/// A running, ready CoreNLP server
#[derive(Debug)]
pub struct CoreNlpServer {
    child: Child,
    host: String,
    port: u16,
}

impl CoreNlpServer {
    /// Launch the server and wait until it is ready for requests.
    ///
    /// Fails before spawning anything when an artifact is missing or the
    /// port is already taken.
    pub async fn start(config: &ServerConfig) -> Result<Self, StartupError> {
        for artifact in [&config.jar, &config.models_jar] {
            if !artifact.is_file() {
                return Err(StartupError::MissingArtifact(artifact.clone()));
            }
        }
        ensure_port_free(&config.host, config.port).await?;

        let stderr = match &config.log_file {
            Some(path) => Stdio::from(std::fs::File::create(path)?),
            None => Stdio::null(),
        };
        let mut cmd = Command::new(&config.java);
        cmd.args(config.command_args()?)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(stderr)
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| StartupError::Spawn {
            program: config.java.clone(),
            source,
        })?;
        info!(
            pid = child.id(),
            port = config.port,
            "launched CoreNLP server, waiting for readiness"
        );

        let mut server = Self {
            child,
            host: config.host.clone(),
            port: config.port,
        };
        server
            .wait_ready(
                Duration::from_secs(config.startup_timeout_secs),
                Duration::from_millis(config.poll_interval_ms),
            )
            .await?;
        info!(url = %server.base_url(), "CoreNLP server ready");
        Ok(server)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Poll `GET /live` until it succeeds, the child dies, or time runs out
    async fn wait_ready(&mut self, timeout: Duration, interval: Duration) -> Result<(), StartupError> {
        let deadline = Instant::now() + timeout;
        let http = reqwest::Client::builder()
            .timeout(interval.max(Duration::from_secs(1)))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let live = format!("{}/live", self.base_url());

        loop {
            if let Some(status) = self.child.try_wait()? {
                return Err(StartupError::ExitedEarly(status.to_string()));
            }
            match http.get(&live).send().await {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response) => debug!(status = %response.status(), "server not live yet"),
                Err(e) => debug!(error = %e, "server not reachable yet"),
            }
            if Instant::now() >= deadline {
                return Err(StartupError::NotReady(timeout));
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Terminate the server, reap it, and wait until its port is free.
    pub async fn stop(mut self) -> io::Result<()> {
        info!(pid = self.child.id(), "stopping CoreNLP server");
        if self.child.try_wait()?.is_none() {
            self.child.start_kill()?;
        }
        let status = self.child.wait().await?;
        debug!(%status, "CoreNLP server exited");

        let deadline = Instant::now() + PORT_RELEASE_TIMEOUT;
        loop {
            if !port_in_use(&self.host, self.port).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                warn!(port = self.port, "port still bound after server exit");
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("port {} not released", self.port),
                ));
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}

impl Drop for CoreNlpServer {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
    }
}

/// Whether any address the server would listen on is already bound.
///
/// The server binds every interface, so the wildcard address is checked
/// along with each address `host` resolves to.
async fn port_in_use(host: &str, port: u16) -> io::Result<bool> {
    let mut addrs: Vec<SocketAddr> = lookup_host((host, port)).await?.collect();
    addrs.push(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)));

    for addr in addrs {
        match TcpListener::bind(addr).await {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => return Ok(true),
            // e.g. ::1 on a host without IPv6
            Err(e) if e.kind() == io::ErrorKind::AddrNotAvailable => {}
            Err(e) => return Err(e),
        }
    }
    Ok(false)
}

async fn ensure_port_free(host: &str, port: u16) -> Result<(), StartupError> {
    if port_in_use(host, port).await? {
        return Err(StartupError::PortInUse {
            host: host.to_string(),
            port,
        });
    }
    Ok(())
}
