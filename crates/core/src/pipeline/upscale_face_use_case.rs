use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::detection::domain::crop_geometry::{is_valid_padding, DEFAULT_PADDING};
use crate::detection::domain::face_locator::{FaceLocator, LocateError};
use crate::imaging::image_codec::{decode_image, encode_jpeg, CodecError};
use crate::shared::constants::DEFAULT_JPEG_QUALITY;
use crate::upscaling::domain::upscaler::{UpscaleError, Upscaler};

use super::pipeline_logger::PipelineLogger;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("upload is not a decodable image: {0}")]
    DecodeFailed(#[source] CodecError),
    #[error(transparent)]
    Locate(#[from] LocateError),
    #[error(transparent)]
    Upscale(#[from] UpscaleError),
    #[error("could not encode upscaled image: {0}")]
    EncodeFailed(#[source] CodecError),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpscaleFaceOptions {
    /// Margin around the face box, as a fraction of its size.
    pub padding: f64,
    pub jpeg_quality: u8,
}

impl Default for UpscaleFaceOptions {
    fn default() -> Self {
        Self {
            padding: DEFAULT_PADDING,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Upload-to-JPEG pipeline: decode → locate + crop → upscale → encode.
///
/// Stateless per call; one instance is shared by all requests.
pub struct UpscaleFaceUseCase {
    locator: Arc<FaceLocator>,
    upscaler: Arc<dyn Upscaler>,
    logger: Arc<dyn PipelineLogger>,
    options: UpscaleFaceOptions,
}

impl UpscaleFaceUseCase {
    pub fn new(
        locator: Arc<FaceLocator>,
        upscaler: Arc<dyn Upscaler>,
        logger: Arc<dyn PipelineLogger>,
        options: UpscaleFaceOptions,
    ) -> Self {
        debug_assert!(is_valid_padding(options.padding), "padding must be in [0, 1)");
        Self {
            locator,
            upscaler,
            logger,
            options,
        }
    }

    pub fn locator(&self) -> &FaceLocator {
        &self.locator
    }

    /// Runs the full pipeline on raw upload bytes and returns JPEG bytes.
    pub fn execute(&self, upload: &[u8]) -> Result<Vec<u8>, PipelineError> {
        let t = Instant::now();
        let frame = decode_image(upload).map_err(PipelineError::DecodeFailed)?;
        self.logger.timing("decode", elapsed_ms(t));

        let t = Instant::now();
        let located = self.locator.locate_and_crop(&frame, self.options.padding);
        self.logger.timing("detect", elapsed_ms(t));
        let located = located?;

        let t = Instant::now();
        let upscaled = self.upscaler.upscale(&located.crop);
        self.logger.timing("upscale", elapsed_ms(t));
        let upscaled = upscaled?;

        let t = Instant::now();
        let jpeg =
            encode_jpeg(&upscaled, self.options.jpeg_quality).map_err(PipelineError::EncodeFailed)?;
        self.logger.timing("encode", elapsed_ms(t));

        self.logger.info(&format!(
            "Upscaled {}x{} face crop to {}x{} ({} bytes)",
            located.crop.width(),
            located.crop.height(),
            upscaled.width(),
            upscaled.height(),
            jpeg.len()
        ));
        Ok(jpeg)
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
