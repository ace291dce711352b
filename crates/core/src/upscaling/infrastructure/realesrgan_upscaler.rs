//! Real-ESRGAN run as a child process.
//!
//! Each call writes the crop to a fresh temp file, points the tool at it and
//! a fresh temp directory, then reads back whatever file the tool left in the
//! directory. Both temp resources are released on drop, so every exit path
//! cleans up.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use crate::imaging::image_codec::{read_image, write_jpeg};
use crate::shared::constants::{
    DEFAULT_DEVICE_ID, DEFAULT_JPEG_QUALITY, DEFAULT_UPSCALE_MODEL, UPSCALE_INPUT_SUFFIX,
};
use crate::shared::frame::Frame;
use crate::upscaling::domain::upscaler::{UpscaleError, Upscaler};

use super::output_artifact::find_output_artifact;
use super::tool_process::run_captured;

/// How to invoke the upscaling tool.
#[derive(Clone, Debug)]
pub struct RealEsrganConfig {
    /// Script or executable that performs inference.
    pub tool_path: PathBuf,
    /// Interpreter to run `tool_path` with; `None` runs it directly.
    pub interpreter: Option<PathBuf>,
    pub model_name: String,
    pub device_id: String,
    pub fp32: bool,
    pub face_enhance: bool,
    pub timeout: Option<Duration>,
    /// JPEG quality of the temp file handed to the tool.
    pub input_quality: u8,
    /// Where per-request temp files go; `None` uses the system temp dir.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for RealEsrganConfig {
    fn default() -> Self {
        Self {
            tool_path: PathBuf::from("Real-ESRGAN/inference_realesrgan.py"),
            interpreter: Some(PathBuf::from("python3")),
            model_name: DEFAULT_UPSCALE_MODEL.to_string(),
            device_id: DEFAULT_DEVICE_ID.to_string(),
            fp32: true,
            face_enhance: false,
            timeout: None,
            input_quality: DEFAULT_JPEG_QUALITY,
            scratch_dir: None,
        }
    }
}

pub struct RealEsrganUpscaler {
    config: RealEsrganConfig,
}

impl RealEsrganUpscaler {
    pub fn new(config: RealEsrganConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RealEsrganConfig {
        &self.config
    }

    /// Tool arguments for one run, after any interpreter and script path.
    pub fn tool_args(&self, input: &Path, output_dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-n".into(),
            self.config.model_name.clone().into(),
            "-i".into(),
            input.into(),
            "-o".into(),
            output_dir.into(),
        ];
        if self.config.face_enhance {
            args.push("--face_enhance".into());
        }
        if self.config.fp32 {
            args.push("--fp32".into());
        }
        args.push("-g".into());
        args.push(self.config.device_id.clone().into());
        args
    }

    fn command(&self, input: &Path, output_dir: &Path) -> Command {
        let mut command = match &self.config.interpreter {
            Some(interpreter) => {
                let mut c = Command::new(interpreter);
                c.arg(&self.config.tool_path);
                c
            }
            None => Command::new(&self.config.tool_path),
        };
        command.args(self.tool_args(input, output_dir));
        command
    }
}

impl Upscaler for RealEsrganUpscaler {
    fn upscale(&self, frame: &Frame) -> Result<Frame, UpscaleError> {
        if !self.config.tool_path.is_file() {
            return Err(UpscaleError::ToolNotFound(self.config.tool_path.clone()));
        }
        let scratch = self
            .config
            .scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);

        let output_dir = tempfile::Builder::new()
            .prefix("face-upscale-out-")
            .tempdir_in(&scratch)
            .map_err(|source| UpscaleError::TempResource {
                what: "output directory",
                source,
            })?;

        let mut input_file = tempfile::Builder::new()
            .prefix("face-upscale-in-")
            .suffix(UPSCALE_INPUT_SUFFIX)
            .tempfile_in(&scratch)
            .map_err(|source| UpscaleError::TempResource {
                what: "input file",
                source,
            })?;
        write_jpeg(input_file.as_file_mut(), frame, self.config.input_quality)
            .map_err(|e| UpscaleError::EncodeInput(e.to_string()))?;
        // Close our handle; the path stays owned and is deleted on drop.
        let input_path = input_file.into_temp_path();

        log::debug!("Temporary input file: {}", input_path.display());
        log::debug!("Temporary output dir: {}", output_dir.path().display());

        let command = self.command(&input_path, output_dir.path());
        log::info!("Running upscaler: {command:?}");
        let started = Instant::now();
        let output = run_captured(command, self.config.timeout)?;
        log::debug!(
            "Upscaler exited with {} after {:.1}s",
            output.status,
            started.elapsed().as_secs_f64()
        );

        if !output.status.success() {
            log::error!("Upscaler failed with {}", output.status);
            log::error!("STDOUT: {}", output.stdout);
            log::error!("STDERR: {}", output.stderr);
            return Err(UpscaleError::ToolExecutionFailed {
                status: output.status,
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        let artifact = find_output_artifact(output_dir.path())
            .map_err(UpscaleError::OutputDirUnreadable)?
            .ok_or(UpscaleError::NoOutputProduced)?;
        log::debug!("Reading upscaled file: {}", artifact.display());

        let upscaled = read_image(&artifact).map_err(|e| UpscaleError::OutputUnreadable {
            path: artifact.clone(),
            reason: e.to_string(),
        })?;

        if let Err(e) = input_path.close() {
            log::warn!("Could not remove temporary input file: {e}");
        }
        Ok(upscaled)
    }
}
