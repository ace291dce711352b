mod output_artifact;
pub mod realesrgan_upscaler;
mod tool_process;
