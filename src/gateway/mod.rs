//! Invocation Gateway - validates tool calls and launches the viewer
//!
//! Malformed calls (unknown tool, missing argument) are returned as errors so
//! the host can reject them at the protocol level. Everything past validation
//! produces an `InvocationOutcome`, successful or not.

mod launch;
mod outcome;

pub use launch::{DEFAULT_PROBE_DELAY, DetachedLauncher, LaunchTarget, Launcher, VIEWER_EXECUTABLE};
pub use outcome::{DEFAULT_LAUNCHED_TEMPLATE, InvocationOutcome, MessageTemplates, ModelFile};

use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, ViewerError};
use crate::tools::{CapabilityRegistry, FILE_PATH, ToolDescriptor};

/// A single tool call as received from the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    #[serde(rename = "name")]
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Option<Map<String, Value>>,
}

impl InvocationRequest {
    pub fn new(tool_name: impl Into<String>, arguments: Option<Map<String, Value>>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }

    /// Convenience for a `display_3d_model` call
    pub fn display(file_path: impl Into<String>) -> Self {
        let mut arguments = Map::new();
        arguments.insert(FILE_PATH.to_string(), Value::String(file_path.into()));
        Self::new(crate::tools::DISPLAY_3D_MODEL, Some(arguments))
    }
}

/// Executes tool calls against the registry and a launcher
///
/// Holds only immutable state; share it behind an `Arc` across concurrent
/// calls.
pub struct InvocationGateway {
    registry: Arc<CapabilityRegistry>,
    launcher: Arc<dyn Launcher>,
}

impl InvocationGateway {
    pub fn new(registry: Arc<CapabilityRegistry>, launcher: Arc<dyn Launcher>) -> Self {
        Self { registry, launcher }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Run a tool call to completion
    pub async fn invoke(&self, request: InvocationRequest) -> Result<InvocationOutcome> {
        let tool = self
            .registry
            .get(&request.tool_name)
            .ok_or_else(|| ViewerError::UnknownTool(request.tool_name.clone()))?;
        validate_arguments(tool, request.arguments.as_ref())?;

        let file_path = request
            .arguments
            .as_ref()
            .and_then(|args| args.get(FILE_PATH))
            .and_then(Value::as_str)
            .ok_or_else(|| missing(FILE_PATH))?;
        debug!("Invoking {} with {}={}", request.tool_name, FILE_PATH, file_path);

        // Resolved once so the check and the viewer see the same file
        let model = ModelFile::resolve(file_path)?;
        if !model.exists().await {
            info!("Model file not found: {}", file_path);
            return Ok(InvocationOutcome::file_not_found(file_path));
        }

        Ok(self.launcher.launch(&model).await)
    }
}

/// Check the call against the tool's declared parameters.
///
/// A required string parameter must also be non-empty.
fn validate_arguments(tool: &ToolDescriptor, arguments: Option<&Map<String, Value>>) -> Result<()> {
    if tool.params().is_empty() {
        return Ok(());
    }

    let arguments = arguments
        .filter(|args| !args.is_empty())
        .ok_or_else(|| ViewerError::MissingArgument("Missing arguments".to_string()))?;

    for param in tool.params() {
        let valid = arguments
            .get(&param.name)
            .filter(|value| param.param_type.accepts(value))
            .is_some_and(|value| value.as_str() != Some(""));
        if !valid {
            return Err(missing(&param.name));
        }
    }
    Ok(())
}

fn missing(name: &str) -> ViewerError {
    ViewerError::MissingArgument(format!("{} is required", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Records launched paths instead of spawning anything
    #[derive(Default)]
    struct RecordingLauncher {
        launched: Mutex<Vec<ModelFile>>,
    }

    #[async_trait]
    impl Launcher for RecordingLauncher {
        async fn launch(&self, model: &ModelFile) -> InvocationOutcome {
            self.launched.lock().unwrap().push(model.clone());
            InvocationOutcome::success(format!("launched {}", model.file_name()))
        }
    }

    fn gateway() -> (InvocationGateway, Arc<RecordingLauncher>) {
        let launcher = Arc::new(RecordingLauncher::default());
        let gateway = InvocationGateway::new(Arc::new(CapabilityRegistry::standard()), launcher.clone());
        (gateway, launcher)
    }

    fn args(value: Value) -> Option<Map<String, Value>> {
        value.as_object().cloned()
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let (gateway, launcher) = gateway();
        for name in ["rotate_model", "", "DISPLAY_3D_MODEL", "display_3d_model "] {
            let request = InvocationRequest::new(name, args(serde_json::json!({"file_path": "a.stl"})));
            let result = gateway.invoke(request).await;
            assert!(matches!(result, Err(ViewerError::UnknownTool(ref n)) if n == name));
        }
        assert!(launcher.launched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_arguments() {
        let (gateway, _) = gateway();

        let result = gateway.invoke(InvocationRequest::new("display_3d_model", None)).await;
        assert!(matches!(result, Err(ViewerError::MissingArgument(_))));

        let result = gateway
            .invoke(InvocationRequest::new("display_3d_model", args(serde_json::json!({}))))
            .await;
        assert!(matches!(result, Err(ViewerError::MissingArgument(_))));
    }

    #[tokio::test]
    async fn test_missing_or_empty_file_path() {
        let (gateway, launcher) = gateway();
        let cases = [
            serde_json::json!({"other": "x"}),
            serde_json::json!({"file_path": ""}),
            serde_json::json!({"file_path": null}),
            serde_json::json!({"file_path": 42}),
        ];

        for case in cases {
            let result = gateway
                .invoke(InvocationRequest::new("display_3d_model", args(case.clone())))
                .await;
            match result {
                Err(ViewerError::MissingArgument(msg)) => assert!(msg.contains("file_path")),
                other => panic!("Expected MissingArgument for {}, got {:?}", case, other),
            }
        }
        assert!(launcher.launched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_not_found() {
        let (gateway, launcher) = gateway();
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.stl").display().to_string();

        let outcome = gateway.invoke(InvocationRequest::display(missing.clone())).await.unwrap();

        assert!(!outcome.success);
        assert!(outcome.message.contains(&missing));
        assert!(launcher.launched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_existing_file_is_launched() {
        let (gateway, launcher) = gateway();
        let dir = tempdir().unwrap();
        let model = dir.path().join("cube.stl");
        std::fs::write(&model, "solid cube\nendsolid cube\n").unwrap();

        let outcome = gateway
            .invoke(InvocationRequest::display(model.display().to_string()))
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.message, "launched cube.stl");
        let launched = launcher.launched.lock().unwrap();
        assert_eq!(launched.len(), 1);
        assert_eq!(launched[0].path, model);
    }

    #[test]
    fn test_validate_arguments_uses_descriptor() {
        let registry = CapabilityRegistry::standard();
        let tool = registry.get("display_3d_model").unwrap();

        let ok = args(serde_json::json!({"file_path": "a.stl", "extra": 1}));
        assert!(validate_arguments(tool, ok.as_ref()).is_ok());

        let wrong_type = args(serde_json::json!({"file_path": ["a.stl"]}));
        let err = validate_arguments(tool, wrong_type.as_ref()).unwrap_err();
        assert_eq!(err.to_string(), "Missing argument: file_path is required");

        let err = validate_arguments(tool, None).unwrap_err();
        assert_eq!(err.to_string(), "Missing argument: Missing arguments");
    }

    #[test]
    fn test_validate_arguments_no_params() {
        let tool = ToolDescriptor::new("noop", "Takes nothing");
        assert!(validate_arguments(&tool, None).is_ok());
    }

    #[tokio::test]
    async fn test_relative_path_is_resolved_before_launch() {
        let (gateway, launcher) = gateway();
        let dir = tempfile::tempdir_in(".").unwrap();
        std::fs::write(dir.path().join("part.stl"), "solid part\n").unwrap();
        let relative = std::path::Path::new(dir.path().file_name().unwrap()).join("part.stl");
        assert!(relative.is_relative());

        let outcome = gateway
            .invoke(InvocationRequest::display(relative.display().to_string()))
            .await
            .unwrap();

        assert!(outcome.success, "unexpected failure: {}", outcome.message);
        let launched = launcher.launched.lock().unwrap();
        assert!(launched[0].path.is_absolute());
        assert_eq!(launched[0].path, std::env::current_dir().unwrap().join(&relative));
    }

    #[tokio::test]
    async fn test_missing_viewer_reported_as_outcome() {
        let dir = tempdir().unwrap();
        let model = dir.path().join("cube.stl");
        std::fs::write(&model, "solid cube\n").unwrap();
        let target = LaunchTarget::for_project_root(dir.path());
        let gateway = InvocationGateway::new(
            Arc::new(CapabilityRegistry::standard()),
            Arc::new(DetachedLauncher::new(target.clone())),
        );

        let outcome = gateway
            .invoke(InvocationRequest::display(model.display().to_string()))
            .await
            .unwrap();

        assert!(!outcome.success);
        assert!(outcome.message.contains(&target.executable.display().to_string()));
        assert!(outcome.message.contains("build"));
    }

    #[test]
    fn test_request_deserialize() {
        let request: InvocationRequest = serde_json::from_value(serde_json::json!({
            "name": "display_3d_model",
            "arguments": {"file_path": "cube.stl"}
        }))
        .unwrap();
        assert_eq!(request, InvocationRequest::display("cube.stl"));

        let request: InvocationRequest = serde_json::from_value(serde_json::json!({"name": "x"})).unwrap();
        assert!(request.arguments.is_none());
    }
}
