pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

/// General-purpose 4x Real-ESRGAN weights.
pub const DEFAULT_UPSCALE_MODEL: &str = "RealESRGAN_x4plus";

/// GPU index passed to the upscaling tool.
pub const DEFAULT_DEVICE_ID: &str = "0";

/// Suffix of the temporary file handed to the upscaling tool.
pub const UPSCALE_INPUT_SUFFIX: &str = ".jpg";

pub const DEFAULT_JPEG_QUALITY: u8 = 95;
