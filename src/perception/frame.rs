use std::time::Instant;

use super::PerceptionError;
use crate::ipc::Point;

/// Single-channel 8-bit image, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub sequence: u64,
    pub captured_at: Instant,
}

impl Frame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>, sequence: u64) -> Result<Self, PerceptionError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(PerceptionError::MalformedFrame(format!(
                "{width}x{height} frame needs {expected} pixels, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
            sequence,
            captured_at: Instant::now(),
        })
    }

    pub fn blank(width: u32, height: u32, sequence: u64) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
            sequence,
            captured_at: Instant::now(),
        }
    }

    /// Frame dimensions halved, integer division.
    pub fn center(&self) -> Point {
        Point::new((self.width / 2) as i32, (self.height / 2) as i32)
    }

    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'_, u8> {
        self.pixels.chunks_exact(self.width.max(1) as usize)
    }

    /// Reverse row order in place, for cameras mounted upside down.
    pub fn flip_vertical(&mut self) {
        let w = self.width as usize;
        let h = self.height as usize;
        for top in 0..h / 2 {
            let bottom = h - 1 - top;
            let (upper, lower) = self.pixels.split_at_mut(bottom * w);
            upper[top * w..(top + 1) * w].swap_with_slice(&mut lower[..w]);
        }
    }
}

/// Source of successive frames. `read` blocks until the next frame is
/// available and must return within a bounded time.
pub trait FrameSource: Send {
    fn start(&mut self) -> Result<(), PerceptionError>;
    fn read(&mut self) -> Result<Frame, PerceptionError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn start(&mut self) -> Result<(), PerceptionError> {
        (**self).start()
    }

    fn read(&mut self) -> Result<Frame, PerceptionError> {
        (**self).read()
    }
}

/// Wraps a source and optionally flips every frame vertically.
pub struct Flipped<S> {
    inner: S,
    enabled: bool,
}

impl<S: FrameSource> Flipped<S> {
    pub fn new(inner: S, enabled: bool) -> Self {
        Self { inner, enabled }
    }
}

impl<S: FrameSource> FrameSource for Flipped<S> {
    fn start(&mut self) -> Result<(), PerceptionError> {
        self.inner.start()
    }

    fn read(&mut self) -> Result<Frame, PerceptionError> {
        let mut frame = self.inner.read()?;
        if self.enabled {
            frame.flip_vertical();
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_uses_integer_division() {
        assert_eq!(Frame::blank(321, 241, 0).center(), Point::new(160, 120));
    }

    #[test]
    fn flip_reverses_rows_and_keeps_middle_row() {
        let pixels = vec![1, 1, 2, 2, 3, 3];
        let mut frame = Frame::new(2, 3, pixels, 0).unwrap();
        frame.flip_vertical();
        assert_eq!(frame.pixels, vec![3, 3, 2, 2, 1, 1]);
    }

    #[test]
    fn wrong_pixel_count_is_rejected() {
        assert!(matches!(
            Frame::new(4, 4, vec![0; 15], 0),
            Err(PerceptionError::MalformedFrame(_))
        ));
    }
}
