//! Viewer launch - detached spawn plus a one-shot startup probe
//!
//! The viewer is started in its own session so it outlives this server and
//! never shares its controlling terminal. After a fixed delay the child is
//! polled once; an early exit is reported with whatever it printed.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

use super::outcome::{InvocationOutcome, MessageTemplates, ModelFile};
use crate::error::{Result, ViewerError};

/// Viewer binary name without platform suffix
pub const VIEWER_EXECUTABLE: &str = "stl_viewer";

/// Default wait between spawn and liveness probe
pub const DEFAULT_PROBE_DELAY: Duration = Duration::from_millis(500);

/// Upper bound on collecting output from an exited viewer. Grandchildren can
/// keep the pipes open after the viewer itself is gone.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Executable to launch and the directory it runs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchTarget {
    pub executable: PathBuf,
    pub working_dir: PathBuf,
}

impl LaunchTarget {
    pub fn new(executable: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            working_dir: working_dir.into(),
        }
    }

    /// `<root>/build/Release/stl_viewer` with the root as working directory
    pub fn for_project_root(root: &Path) -> Self {
        let executable = root
            .join("build")
            .join("Release")
            .join(format!("{}{}", VIEWER_EXECUTABLE, std::env::consts::EXE_SUFFIX));
        Self::new(executable, root)
    }

    /// Project root is two levels above the directory holding `binary`
    pub fn from_install_location(binary: &Path) -> Result<Self> {
        let root = binary
            .parent()
            .and_then(Path::parent)
            .and_then(Path::parent)
            .ok_or_else(|| {
                ViewerError::Config(format!(
                    "Cannot derive project root from binary location: {}",
                    binary.display()
                ))
            })?;
        Ok(Self::for_project_root(root))
    }

    /// Resolve from the running binary's location
    pub fn from_current_exe() -> Result<Self> {
        let exe = std::env::current_exe()?;
        Self::from_install_location(&exe)
    }

    pub async fn executable_exists(&self) -> bool {
        tokio::fs::try_exists(&self.executable).await.unwrap_or(false)
    }
}

/// Starts the viewer for a model and reports how the start went
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self, model: &ModelFile) -> InvocationOutcome;
}

/// Launcher that spawns a detached viewer process
#[derive(Debug, Clone)]
pub struct DetachedLauncher {
    target: LaunchTarget,
    probe_delay: Duration,
    templates: MessageTemplates,
}

impl DetachedLauncher {
    pub fn new(target: LaunchTarget) -> Self {
        Self {
            target,
            probe_delay: DEFAULT_PROBE_DELAY,
            templates: MessageTemplates::default(),
        }
    }

    /// Set the delay before the liveness probe
    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = delay;
        self
    }

    /// Set the user-facing message templates
    pub fn with_templates(mut self, templates: MessageTemplates) -> Self {
        self.templates = templates;
        self
    }

    pub fn target(&self) -> &LaunchTarget {
        &self.target
    }

    pub fn probe_delay(&self) -> Duration {
        self.probe_delay
    }

    fn spawn(&self, model: &ModelFile) -> io::Result<Child> {
        let mut cmd = Command::new(&self.target.executable);
        cmd.arg(&model.path)
            .current_dir(&self.target.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        detach(&mut cmd)?;

        info!(
            "Running command: {} {}",
            self.target.executable.display(),
            model.path.display()
        );
        cmd.spawn()
    }

    async fn probe(&self, mut child: Child, model: &ModelFile) -> InvocationOutcome {
        tokio::time::sleep(self.probe_delay).await;

        match child.try_wait() {
            Ok(Some(status)) => {
                let (stdout, stderr) = drain_output(&mut child).await;
                warn!("Viewer exited during startup with {}", status);
                InvocationOutcome::exited_immediately(&stdout, &stderr)
            }
            Ok(None) => {
                info!("Viewer running for {} (pid {:?})", model.path.display(), child.id());
                // Dropping the handle abandons the pipes; the child is not killed.
                InvocationOutcome::success(self.templates.render_launched(&model.file_name()))
            }
            Err(e) => {
                error!("Error launching STL viewer: {}", e);
                InvocationOutcome::launch_error(&e)
            }
        }
    }
}

#[async_trait]
impl Launcher for DetachedLauncher {
    async fn launch(&self, model: &ModelFile) -> InvocationOutcome {
        if !self.target.executable_exists().await {
            debug!("Viewer executable missing: {}", self.target.executable.display());
            return InvocationOutcome::viewer_missing(&self.target.executable);
        }

        match self.spawn(model) {
            Ok(child) => self.probe(child, model).await,
            Err(e) => {
                error!("Error launching STL viewer: {}", e);
                InvocationOutcome::launch_error(&e)
            }
        }
    }
}

/// Put the child in a new session with no controlling terminal
#[cfg(unix)]
fn detach(cmd: &mut Command) -> io::Result<()> {
    unsafe {
        cmd.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }
    Ok(())
}

#[cfg(windows)]
fn detach(cmd: &mut Command) -> io::Result<()> {
    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
    Ok(())
}

#[cfg(not(any(unix, windows)))]
fn detach(_cmd: &mut Command) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "detached process launch is not supported on this platform",
    ))
}

async fn drain_output(child: &mut Child) -> (String, String) {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    tokio::join!(read_pipe(stdout), read_pipe(stderr))
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let Some(mut pipe) = pipe else {
        return String::new();
    };

    let mut buf = Vec::new();
    match tokio::time::timeout(DRAIN_TIMEOUT, pipe.read_to_end(&mut buf)).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => debug!("Failed to read viewer output: {}", e),
        Err(_) => debug!("Timed out reading viewer output after {:?}", DRAIN_TIMEOUT),
    }
    String::from_utf8_lossy(&buf).into_owned()
}
