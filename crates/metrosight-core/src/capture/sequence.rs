use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use super::frame::Frame;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to list screenshot directory {path}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode screenshot {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Screenshots in a directory, replayed in file-name order.
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    cursor: usize,
}

impl ImageSequence {
    /// List the images in `dir`. Files with other extensions are ignored.
    pub fn open(dir: &Path) -> Result<Self, SourceError> {
        let read_dir_error = |source| SourceError::ReadDir {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(read_dir_error)? {
            let path = entry.map_err(read_dir_error)?.path();
            if path.is_file() && is_image(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        info!(?dir, frames = paths.len(), "screenshot sequence opened");
        Ok(Self { paths, cursor: 0 })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Decode the next screenshot, or `None` once the sequence is exhausted.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        let Some(path) = self.paths.get(self.cursor) else {
            return Ok(None);
        };
        let image = image::open(path)
            .map_err(|source| SourceError::Decode {
                path: path.clone(),
                source,
            })?
            .into_rgb8();
        let frame_number = self.cursor as u32;
        self.cursor += 1;
        debug!(frame_number, ?path, "screenshot loaded");
        Ok(Some(Frame::new(image, frame_number)))
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn frames_come_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for (name, shade) in [("b.png", 20u8), ("a.png", 10), ("c.PNG", 30)] {
            RgbImage::from_pixel(4, 3, Rgb([shade, 0, 0]))
                .save(dir.path().join(name))
                .unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let mut seq = ImageSequence::open(dir.path()).unwrap();
        assert_eq!(seq.len(), 3);
        let mut shades = Vec::new();
        while let Some(frame) = seq.next_frame().unwrap() {
            assert_eq!(frame.frame_number as usize, shades.len());
            shades.push(frame.image.get_pixel(0, 0)[0]);
        }
        assert_eq!(shades, vec![10, 20, 30]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let err = ImageSequence::open(Path::new("/nonexistent/screens")).err().unwrap();
        assert!(matches!(err, SourceError::ReadDir { .. }));
    }

    #[test]
    fn corrupt_image_is_an_error_with_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.png"), b"not a png").unwrap();
        let mut seq = ImageSequence::open(dir.path()).unwrap();
        let err = seq.next_frame().err().unwrap();
        assert!(matches!(err, SourceError::Decode { ref path, .. } if path.ends_with("bad.png")));
    }
}
