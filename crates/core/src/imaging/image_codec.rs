//! Image decode/encode at the pipeline's I/O boundaries, via the `image` crate.
//!
//! Decoded frames are always RGB. Encoders accept either channel order and
//! convert to RGB first.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use crate::shared::frame::{ChannelOrder, Frame};

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("could not decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("could not read image {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("could not encode image: {0}")]
    Encode(#[source] image::ImageError),
    #[error("image has zero width or height")]
    EmptyImage,
    #[error("JPEG quality must be between 1 and 100, got {0}")]
    InvalidQuality(u8),
}

/// Decodes an in-memory upload of any format the `image` crate recognises.
pub fn decode_image(bytes: &[u8]) -> Result<Frame, CodecError> {
    let img = image::load_from_memory(bytes).map_err(CodecError::Decode)?;
    rgb_frame(img)
}

/// Reads and decodes an image file from disk.
pub fn read_image(path: &Path) -> Result<Frame, CodecError> {
    let img = image::open(path).map_err(|source| CodecError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    rgb_frame(img)
}

/// Encodes `frame` as a baseline JPEG into memory.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    write_jpeg(&mut buf, frame, quality)?;
    Ok(buf)
}

/// Encodes `frame` as JPEG into any writer (e.g. an open temp file).
pub fn write_jpeg<W: Write>(writer: W, frame: &Frame, quality: u8) -> Result<(), CodecError> {
    if !(1..=100).contains(&quality) {
        return Err(CodecError::InvalidQuality(quality));
    }
    if frame.is_empty() {
        return Err(CodecError::EmptyImage);
    }

    let rgb = frame.with_channel_order(ChannelOrder::Rgb);
    let mut writer = BufWriter::new(writer);
    JpegEncoder::new_with_quality(&mut writer, quality)
        .write_image(rgb.data(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(CodecError::Encode)?;
    writer
        .flush()
        .map_err(|e| CodecError::Encode(image::ImageError::IoError(e)))?;
    Ok(())
}

fn rgb_frame(img: image::DynamicImage) -> Result<Frame, CodecError> {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(CodecError::EmptyImage);
    }
    Ok(Frame::new(rgb.into_raw(), width, height, ChannelOrder::Rgb))
}
