use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::{OnceCell, oneshot};
use uuid::Uuid;

use crate::config::CompilerSettings;

pub const SUCCESS_BANNER: &str = "Compilation succeeded.\n\n";
pub const FAILURE_BANNER: &str = "Compilation failed with the following errors:\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileStatus {
    Succeeded,
    Failed { exit_code: Option<i32> },
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct CompileResult {
    pub status: CompileStatus,
    /// Interleaved stdout and stderr of the compiler
    pub output: String,
}

impl CompileResult {
    pub fn succeeded(&self) -> bool {
        self.status == CompileStatus::Succeeded
    }

    /// Response body: a banner line followed by the compiler output.
    pub fn render(&self) -> String {
        let banner = if self.succeeded() { SUCCESS_BANNER } else { FAILURE_BANNER };
        format!("{banner}{}", self.output)
    }
}

#[derive(Debug)]
pub struct Job {
    pub id: Uuid,
    pub source: Bytes,
    pub reply: oneshot::Sender<CompileResult>,
}

/////

#[derive(Debug, Deserialize, Serialize)]
pub struct ExtensionRequest {
    pub action: String,
    #[serde(default)]
    pub arg: serde_json::Value,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ExtensionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/////

#[derive(Clone)]
pub struct AppState {
    pub work_queue: async_channel::Sender<Job>,
    pub compiler: CompilerSettings,
    pub version: Arc<OnceCell<String>>,
}
