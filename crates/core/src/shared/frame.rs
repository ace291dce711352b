use std::borrow::Cow;

use ndarray::{s, ArrayView3};

use super::region::CropRegion;

/// Byte order of the three colour channels within each pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

/// A decoded image: contiguous 3-channel bytes in row-major order.
///
/// Channel order is tracked explicitly so a frame can be handed to a
/// detector that expects a different order than the decoder produced.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    order: ChannelOrder,
}

pub const CHANNELS: usize = 3;

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, order: ChannelOrder) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            order,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channel_order(&self) -> ChannelOrder {
        self.order
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Returns this frame in the requested channel order, borrowing when
    /// no conversion is needed.
    pub fn with_channel_order(&self, order: ChannelOrder) -> Cow<'_, Frame> {
        if self.order == order {
            return Cow::Borrowed(self);
        }
        let mut data = self.data.clone();
        for pixel in data.chunks_exact_mut(CHANNELS) {
            pixel.swap(0, 2);
        }
        Cow::Owned(Frame::new(data, self.width, self.height, order))
    }

    /// Copies the `[y1..y2, x1..x2]` window out of this frame.
    ///
    /// The region must already be clamped to the frame bounds.
    pub fn crop(&self, region: &CropRegion) -> Frame {
        let CropRegion { x1, y1, x2, y2 } = *region;
        debug_assert!(x2 <= self.width && y2 <= self.height);

        let view = self.as_ndarray();
        let window = view.slice(s![y1 as usize..y2 as usize, x1 as usize..x2 as usize, ..]);
        let data: Vec<u8> = window.iter().copied().collect();
        Frame::new(data, region.width(), region.height(), self.order)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, CHANNELS)
    }
}
