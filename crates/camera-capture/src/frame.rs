//! Video frame types and processing

use image::{imageops::FilterType, RgbImage};

use crate::CameraError;

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (nanoseconds)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ns: u64, sequence: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
        }
    }

    /// Create an all-black frame
    pub fn blank(width: u32, height: u32, timestamp_ns: u64, sequence: u32) -> Self {
        let len = (width as usize) * (height as usize) * 3;
        Self::new(vec![0; len], width, height, timestamp_ns, sequence)
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        self.data.get(idx..idx + 3).map(|p| [p[0], p[1], p[2]])
    }

    /// Borrow the pixel buffer as an `image` RGB buffer.
    ///
    /// Fails when the buffer length does not match `width * height * 3`.
    pub fn to_rgb_image(&self) -> Result<RgbImage, CameraError> {
        RgbImage::from_raw(self.width, self.height, self.data.clone()).ok_or_else(|| {
            CameraError::Format(format!(
                "buffer of {} bytes does not hold a {}x{} RGB frame",
                self.data.len(),
                self.width,
                self.height
            ))
        })
    }

    /// Replace the pixel data with an RGB buffer, keeping timing metadata
    pub fn replace_pixels(&mut self, image: RgbImage) {
        self.width = image.width();
        self.height = image.height();
        self.data = image.into_raw();
    }

    /// Resize frame using triangle (bilinear) filtering
    pub fn resize(&self, new_width: u32, new_height: u32) -> Result<VideoFrame, CameraError> {
        if new_width == 0 || new_height == 0 {
            return Err(CameraError::Format(format!(
                "cannot resize to {}x{}",
                new_width, new_height
            )));
        }

        let img = self.to_rgb_image()?;
        let resized = image::imageops::resize(&img, new_width, new_height, FilterType::Triangle);

        Ok(VideoFrame {
            data: resized.into_raw(),
            width: new_width,
            height: new_height,
            timestamp_ns: self.timestamp_ns,
            sequence: self.sequence,
        })
    }

    /// Resize to a target width, keeping the aspect ratio
    pub fn resize_to_width(&self, target_width: u32) -> Result<VideoFrame, CameraError> {
        if target_width == self.width {
            return Ok(self.clone());
        }
        if self.width == 0 {
            return Err(CameraError::Format("frame has zero width".into()));
        }

        let scale = target_width as f64 / self.width as f64;
        let target_height = ((self.height as f64) * scale).round().max(1.0) as u32;
        self.resize(target_width, target_height)
    }
}
