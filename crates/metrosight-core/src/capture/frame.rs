use image::RgbImage;

/// A single captured screenshot with its position in the session.
pub struct Frame {
    /// RGB pixel data.
    pub image: RgbImage,
    /// Running index from the start of the session (0-based).
    pub frame_number: u32,
}

impl Frame {
    pub fn new(image: RgbImage, frame_number: u32) -> Self {
        Self {
            image,
            frame_number,
        }
    }

    /// Wrap a BGR-ordered capture buffer, reordering it to RGB once.
    /// Returns `None` if the buffer is not exactly `width * height * 3` bytes.
    pub fn from_bgr(width: u32, height: u32, mut bytes: Vec<u8>, frame_number: u32) -> Option<Self> {
        if bytes.len() != (width as usize) * (height as usize) * 3 {
            return None;
        }
        for px in bytes.chunks_exact_mut(3) {
            px.swap(0, 2);
        }
        let image = RgbImage::from_raw(width, height, bytes)?;
        Some(Self::new(image, frame_number))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgr_is_reordered() {
        let frame = Frame::from_bgr(2, 1, vec![1, 2, 3, 10, 20, 30], 7).unwrap();
        assert_eq!(frame.image.get_pixel(0, 0).0, [3, 2, 1]);
        assert_eq!(frame.image.get_pixel(1, 0).0, [30, 20, 10]);
        assert_eq!(frame.frame_number, 7);
    }

    #[test]
    fn short_buffer_is_rejected() {
        assert!(Frame::from_bgr(2, 2, vec![0; 11], 0).is_none());
    }
}
