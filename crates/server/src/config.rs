use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};

use face_upscaler_core::detection::domain::crop_geometry::{is_valid_padding, DEFAULT_PADDING};
use face_upscaler_core::detection::infrastructure::onnx_yolo_detector::DEFAULT_CONFIDENCE;
use face_upscaler_core::pipeline::upscale_face_use_case::UpscaleFaceOptions;
use face_upscaler_core::shared::constants::{
    DEFAULT_DEVICE_ID, DEFAULT_JPEG_QUALITY, DEFAULT_UPSCALE_MODEL,
};
use face_upscaler_core::upscaling::infrastructure::realesrgan_upscaler::RealEsrganConfig;

/// 20 MiB.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// HTTP service that crops the face out of an uploaded image and upscales it.
///
/// Every option can also be set through the environment variable shown in
/// its help text.
#[derive(Parser, Debug, Clone)]
#[command(name = "face-upscaler")]
pub struct ServerConfig {
    /// Address to listen on.
    #[arg(long, env = "FACE_UPSCALER_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "FACE_UPSCALER_PORT", default_value = "8000")]
    pub port: u16,

    /// Real-ESRGAN inference script (or executable with --direct).
    #[arg(
        long,
        env = "FACE_UPSCALER_TOOL",
        default_value = "Real-ESRGAN/inference_realesrgan.py"
    )]
    pub tool: PathBuf,

    /// Interpreter used to run the tool script.
    #[arg(long, env = "FACE_UPSCALER_INTERPRETER", default_value = "python3")]
    pub interpreter: PathBuf,

    /// Run the tool as an executable instead of through the interpreter.
    #[arg(long, env = "FACE_UPSCALER_DIRECT")]
    pub direct: bool,

    /// Super-resolution model name passed to the tool.
    #[arg(long, env = "FACE_UPSCALER_MODEL", default_value = DEFAULT_UPSCALE_MODEL)]
    pub model_name: String,

    /// Compute device passed to the tool's -g flag.
    #[arg(long, env = "FACE_UPSCALER_DEVICE", default_value = DEFAULT_DEVICE_ID)]
    pub device_id: String,

    /// Run the model in full precision (true/false).
    #[arg(long, env = "FACE_UPSCALER_FP32", default_value_t = true, action = ArgAction::Set)]
    pub fp32: bool,

    /// Ask the tool to run its face-enhancement stage as well.
    #[arg(long, env = "FACE_UPSCALER_FACE_ENHANCE")]
    pub face_enhance: bool,

    /// Kill the tool after this many seconds (no limit when unset).
    #[arg(long, env = "FACE_UPSCALER_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Margin around the face as a fraction of its size, in [0, 1).
    #[arg(long, env = "FACE_UPSCALER_PADDING", default_value_t = DEFAULT_PADDING)]
    pub padding: f64,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, env = "FACE_UPSCALER_CONFIDENCE", default_value_t = DEFAULT_CONFIDENCE)]
    pub confidence: f64,

    /// Directory for per-request temp files (system temp dir when unset).
    #[arg(long, env = "FACE_UPSCALER_SCRATCH_DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Directory holding a pre-downloaded detector model.
    #[arg(long, env = "FACE_UPSCALER_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Quality of the returned JPEG (1-100).
    #[arg(
        long,
        env = "FACE_UPSCALER_JPEG_QUALITY",
        default_value_t = DEFAULT_JPEG_QUALITY,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub jpeg_quality: u8,

    /// Largest accepted request body in bytes.
    #[arg(long, env = "FACE_UPSCALER_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_padding(self.padding) {
            return Err(format!("padding must be in [0, 1), got {}", self.padding));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!(
                "confidence must be between 0.0 and 1.0, got {}",
                self.confidence
            ));
        }
        if self.timeout_secs == Some(0) {
            return Err("timeout-secs must be at least 1".into());
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn upscaler_config(&self) -> RealEsrganConfig {
        RealEsrganConfig {
            tool_path: self.tool.clone(),
            interpreter: (!self.direct).then(|| self.interpreter.clone()),
            model_name: self.model_name.clone(),
            device_id: self.device_id.clone(),
            fp32: self.fp32,
            face_enhance: self.face_enhance,
            timeout: self.timeout_secs.map(Duration::from_secs),
            scratch_dir: self.scratch_dir.clone(),
            ..RealEsrganConfig::default()
        }
    }

    pub fn pipeline_options(&self) -> UpscaleFaceOptions {
        UpscaleFaceOptions {
            padding: self.padding,
            jpeg_quality: self.jpeg_quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(args: &[&str]) -> ServerConfig {
        let mut argv = vec!["face-upscaler"];
        argv.extend_from_slice(args);
        ServerConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_match_reference_invocation() {
        let config = parse(&[]);
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:8000");

        let upscaler = config.upscaler_config();
        assert_eq!(upscaler.model_name, "RealESRGAN_x4plus");
        assert_eq!(upscaler.device_id, "0");
        assert!(upscaler.fp32);
        assert!(!upscaler.face_enhance);
        assert_eq!(upscaler.interpreter, Some(PathBuf::from("python3")));
        assert_eq!(upscaler.timeout, None);
        assert_eq!(upscaler.scratch_dir, None);

        let options = config.pipeline_options();
        assert_eq!(options.padding, 0.25);
        assert_eq!(options.jpeg_quality, 95);
    }

    #[test]
    fn test_direct_drops_interpreter() {
        let config = parse(&["--direct", "--tool", "/opt/realesrgan"]);
        let upscaler = config.upscaler_config();
        assert_eq!(upscaler.interpreter, None);
        assert_eq!(upscaler.tool_path, PathBuf::from("/opt/realesrgan"));
    }

    #[test]
    fn test_fp32_can_be_disabled() {
        let config = parse(&["--fp32", "false"]);
        assert!(!config.upscaler_config().fp32);
    }

    #[test]
    fn test_timeout_is_converted() {
        let config = parse(&["--timeout-secs", "90"]);
        assert_eq!(
            config.upscaler_config().timeout,
            Some(Duration::from_secs(90))
        );
    }

    #[rstest]
    #[case::padding_one(&["--padding", "1.0"])]
    #[case::negative_padding(&["--padding=-0.1"])]
    #[case::confidence_above_one(&["--confidence", "1.5"])]
    #[case::zero_timeout(&["--timeout-secs", "0"])]
    fn test_validation_rejects(#[case] args: &[&str]) {
        assert!(parse(args).validate().is_err());
    }

    #[test]
    fn test_jpeg_quality_range_enforced_by_parser() {
        let argv = ["face-upscaler", "--jpeg-quality", "0"];
        assert!(ServerConfig::try_parse_from(argv).is_err());
    }
}
