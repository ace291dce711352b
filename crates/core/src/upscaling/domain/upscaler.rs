use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum UpscaleError {
    #[error("upscaling tool not found at {0}")]
    ToolNotFound(PathBuf),
    #[error("could not create temporary {what}: {source}")]
    TempResource {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("could not write upscaler input: {0}")]
    EncodeInput(String),
    #[error("could not launch upscaling tool: {0}")]
    LaunchFailed(#[source] std::io::Error),
    #[error("upscaling tool failed with {status}")]
    ToolExecutionFailed {
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },
    #[error("upscaling tool did not finish within {0:?}")]
    Timeout(Duration),
    #[error("could not list upscaler output directory: {0}")]
    OutputDirUnreadable(#[source] std::io::Error),
    #[error("upscaling tool produced no output file")]
    NoOutputProduced,
    #[error("could not read upscaled image {path}: {reason}")]
    OutputUnreadable { path: PathBuf, reason: String },
}

/// Domain interface for super-resolution.
///
/// The production implementation shells out to an external tool; anything
/// that turns a frame into a larger frame fits here.
pub trait Upscaler: Send + Sync {
    fn upscale(&self, frame: &Frame) -> Result<Frame, UpscaleError>;
}
