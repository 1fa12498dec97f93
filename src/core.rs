use crate::error::{SonovizError, SonovizResult};

pub use kurbo::{Point, Rect, Vec2};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32, // must be > 0
}

impl Fps {
    pub fn new(num: u32, den: u32) -> SonovizResult<Self> {
        if den == 0 {
            return Err(SonovizError::configuration("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(SonovizError::configuration("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

/// Per-frame evaluation context handed to modifiers and vectorial generators.
#[derive(Clone, Copy, Debug)]
pub struct FrameCtx {
    pub frame: FrameIndex,
    pub total_frames: FrameIndex,
    pub fps: Fps,
    pub canvas: Canvas,
}

impl FrameCtx {
    pub fn elapsed_secs(self) -> f64 {
        self.fps.frames_to_secs(self.frame.0)
    }

    /// Render progress in `[0, 1]`; 1.0 for a zero-length render.
    pub fn progress(self) -> f64 {
        if self.total_frames.0 == 0 {
            return 1.0;
        }
        (self.frame.0 as f64 / self.total_frames.0 as f64).clamp(0.0, 1.0)
    }
}

/// Opaque RGBA8 framebuffer produced by the external canvas. The core never
/// inspects pixel content, it only hands buffers to the subprocess sinks.
#[derive(Clone, Debug)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>, // width * height * 4
}

impl FrameRgba {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> SonovizResult<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if data.len() != expected {
            return Err(SonovizError::configuration(format!(
                "FrameRgba data length {} does not match {}x{}x4",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_rejects_zero() {
        assert!(Fps::new(0, 1).is_err());
        assert!(Fps::new(30, 0).is_err());
    }

    #[test]
    fn frame_ctx_progress_boundaries() {
        let ctx = FrameCtx {
            frame: FrameIndex(0),
            total_frames: FrameIndex(120),
            fps: Fps::new(60, 1).unwrap(),
            canvas: Canvas {
                width: 1920,
                height: 1080,
            },
        };
        assert_eq!(ctx.progress(), 0.0);
        assert_eq!(ctx.elapsed_secs(), 0.0);

        let ctx = FrameCtx {
            frame: FrameIndex(60),
            ..ctx
        };
        assert_eq!(ctx.progress(), 0.5);
        assert_eq!(ctx.elapsed_secs(), 1.0);
    }

    #[test]
    fn frame_rgba_checks_length() {
        assert!(FrameRgba::new(2, 2, vec![0u8; 16]).is_ok());
        assert!(FrameRgba::new(2, 2, vec![0u8; 15]).is_err());
    }
}
