use rand::{Rng as _, SeedableRng as _, rngs::StdRng};

use crate::{
    audio::AudioFeatures,
    core::Vec2,
    error::SonovizResult,
    interpolation::Interpolation,
    vectorial::Vectorial,
};

/// Closed set of module slots an animation layer can hold. Re-adding a kind
/// overwrites the previous modifier under that slot (deliberate override
/// semantics for preset layering).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    Resize,
    Blur,
    Rotate,
    Vignetting,
    Video,
    Vectorial,
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Resize => "resize",
            Self::Blur => "blur",
            Self::Rotate => "rotate",
            Self::Vignetting => "vignetting",
            Self::Video => "video",
            Self::Vectorial => "vectorial",
        };
        f.write_str(s)
    }
}

/// Per-frame value-producing unit attached to an animation layer. Path
/// entries are `Point` and `Shake`; every other variant lives in the modules
/// table under its [`ModuleKind`] slot.
#[derive(Clone, Debug)]
pub enum Modifier {
    Point { x: f64, y: f64 },
    Constant { value: f64 },
    Shake(Shake),
    ScalarResize(ScalarResize),
    GaussianBlur(GaussianBlur),
    SineSwing(SineSwing),
    LinearSwing(LinearSwing),
    Vignetting(Vignetting),
    Video(VideoSource),
    Vectorial(Vectorial),
}

/// Pseudo-random positional jitter. Draws a fresh target inside the
/// `[-distance, distance]` square whenever the previous one is (nearly)
/// reached, and approaches it with an independent engine per axis. Seeded
/// explicitly so identical configurations replay identically.
#[derive(Clone, Debug)]
pub struct Shake {
    pub distance: f64,
    interp_x: Interpolation,
    interp_y: Interpolation,
    target: Vec2,
    rng: StdRng,
}

impl Shake {
    pub fn new(
        distance: f64,
        x_smoothness: f64,
        y_smoothness: f64,
        seed: u64,
    ) -> SonovizResult<Self> {
        Ok(Self {
            distance: distance.abs(),
            interp_x: Interpolation::remaining_approach(x_smoothness)?,
            interp_y: Interpolation::remaining_approach(y_smoothness)?,
            target: Vec2::ZERO,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    fn retarget_if_reached(&mut self) {
        let reach = (self.distance / 32.0).max(f64::EPSILON);
        let reached = (self.interp_x.current() - self.target.x).abs() <= reach
            && (self.interp_y.current() - self.target.y).abs() <= reach;
        if reached {
            let d = self.distance;
            self.target = if d > 0.0 {
                Vec2::new(self.rng.gen_range(-d..=d), self.rng.gen_range(-d..=d))
            } else {
                Vec2::ZERO
            };
        }
    }

    pub fn next_offset(&mut self) -> Vec2 {
        self.retarget_if_reached();
        Vec2::new(
            self.interp_x.advance(self.target.x),
            self.interp_y.advance(self.target.y),
        )
    }
}

/// Audio-reactive additive size offset: `base + approach(amplitude * scalar)`.
#[derive(Clone, Debug)]
pub struct ScalarResize {
    pub scalar: f64,
    pub base: f64,
    pub keep_center: bool,
    interp: Interpolation,
}

impl ScalarResize {
    pub fn new(smooth: f64, scalar: f64, base: f64, keep_center: bool) -> SonovizResult<Self> {
        Ok(Self {
            scalar,
            base,
            keep_center,
            interp: Interpolation::remaining_approach(smooth)?,
        })
    }

    pub fn next(&mut self, features: &AudioFeatures) -> f64 {
        self.base + self.interp.advance(features.average_amplitude * self.scalar)
    }
}

/// Audio-reactive blur kernel size, clamped to >= 0. Rounding to the nearest
/// odd integer is the canvas's concern.
#[derive(Clone, Debug)]
pub struct GaussianBlur {
    pub scalar: f64,
    interp: Interpolation,
}

impl GaussianBlur {
    pub fn new(smooth: f64, scalar: f64) -> SonovizResult<Self> {
        Ok(Self {
            scalar,
            interp: Interpolation::remaining_approach(smooth)?,
        })
    }

    pub fn next(&mut self, features: &AudioFeatures) -> f64 {
        self.interp
            .advance(features.average_amplitude * self.scalar)
            .max(0.0)
    }
}

/// Back-and-forth swing rotation, `max_angle * sin(...)` with a per-frame
/// phase step of `1 / smooth` radians.
#[derive(Clone, Debug)]
pub struct SineSwing {
    pub max_angle: f64,
    interp: Interpolation,
}

impl SineSwing {
    pub fn new(max_angle: f64, smooth: f64, phase: f64) -> SonovizResult<Self> {
        Ok(Self {
            max_angle,
            interp: Interpolation::sine(max_angle, step_from_smooth(smooth)?, phase)?,
        })
    }

    pub fn next(&mut self) -> f64 {
        self.interp.advance(0.0)
    }
}

/// Continuous one-direction rotation, `1 / smooth` radians per frame,
/// wrapped at 2π.
#[derive(Clone, Debug)]
pub struct LinearSwing {
    interp: Interpolation,
}

impl LinearSwing {
    pub fn new(smooth: f64, phase: f64) -> SonovizResult<Self> {
        Ok(Self {
            interp: Interpolation::linear(step_from_smooth(smooth)?)?.with_current(phase),
        })
    }

    pub fn next(&mut self) -> f64 {
        self.interp.advance(0.0)
    }
}

fn step_from_smooth(smooth: f64) -> SonovizResult<f64> {
    if !smooth.is_finite() || smooth <= 0.0 {
        return Err(crate::error::SonovizError::configuration(format!(
            "rotation smooth must be finite and > 0, got {smooth}"
        )));
    }
    Ok(1.0 / smooth)
}

/// Vignette radius shrinking as amplitude rises (scalar is typically
/// negative), floored at `minimum` so the vignette never collapses.
#[derive(Clone, Debug)]
pub struct Vignetting {
    pub start: f64,
    pub scalar: f64,
    pub minimum: f64,
    interp: Interpolation,
}

impl Vignetting {
    pub fn new(start: f64, scalar: f64, minimum: f64, smooth: f64) -> SonovizResult<Self> {
        Ok(Self {
            start,
            scalar,
            minimum,
            interp: Interpolation::remaining_approach(smooth)?,
        })
    }

    pub fn next(&mut self, features: &AudioFeatures) -> f64 {
        self.interp
            .advance(self.start + features.average_amplitude * self.scalar)
            .max(self.minimum)
    }
}

/// Frame-per-frame video texture source; not audio-reactive. The caller
/// decodes and draws, the core only carries the reference and target size.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct VideoSource {
    pub path: std::path::PathBuf,
    pub width: f64,
    pub height: f64,
}
