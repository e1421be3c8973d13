//! Invocation outcomes and the user-facing message text

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default text reported after a successful launch. `{file}` is replaced by
/// the model's file name.
pub const DEFAULT_LAUNCHED_TEMPLATE: &str = "STLビューアーを起動しました: {file}\n\n利用可能な操作:\n- マウスホイール: ズームイン/アウト\n- ESCキー: ビューアー終了\n\n注意: モデルは静的表示です（回転や移動操作は未実装）";

/// Result of a single tool invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationOutcome {
    pub success: bool,
    pub message: String,
}

impl InvocationOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// Render as an MCP `tools/call` result
    pub fn to_call_result(&self) -> Value {
        serde_json::json!({
            "content": [
                {
                    "type": "text",
                    "text": self.message,
                }
            ],
            "isError": !self.success,
        })
    }

    pub(crate) fn file_not_found(file_path: &str) -> Self {
        Self::failure(format!("Error: File not found: {}", file_path))
    }

    pub(crate) fn viewer_missing(executable: &Path) -> Self {
        Self::failure(format!(
            "Error: STL Viewer executable not found at: {}\nPlease build the project first.",
            executable.display()
        ))
    }

    pub(crate) fn launch_error(err: &std::io::Error) -> Self {
        Self::failure(format!("Error launching STL viewer: {}", err))
    }

    pub(crate) fn exited_immediately(stdout: &str, stderr: &str) -> Self {
        let mut message = String::from("STL Viewer exited immediately. ");
        if !stderr.is_empty() {
            message.push_str(&format!("Error: {}", stderr));
        }
        if !stdout.is_empty() {
            message.push_str(&format!("Output: {}", stdout));
        }
        Self::failure(message)
    }
}

/// A model file supplied by the caller. Only its existence is inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFile {
    pub path: PathBuf,
}

impl ModelFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve a caller-supplied path against the server's working directory
    pub fn resolve(file_path: &str) -> std::io::Result<Self> {
        Ok(Self::new(std::path::absolute(file_path)?))
    }

    /// Final path component, falling back to the full path
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }
}

/// Configurable user-facing text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageTemplates {
    pub launched: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            launched: DEFAULT_LAUNCHED_TEMPLATE.to_string(),
        }
    }
}

impl MessageTemplates {
    pub fn render_launched(&self, file_name: &str) -> String {
        self.launched.replace("{file}", file_name)
    }
}
