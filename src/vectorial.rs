use crate::{
    audio::AudioFeatures,
    core::{FrameCtx, Rect},
    error::{SonovizError, SonovizResult},
    interpolation::Interpolation,
};

/// Primitive geometry emitted by vectorial generators. The external canvas
/// turns these into pixels; the core never draws.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    /// One visualizer bar; `length` is the resolved bar size in pixels.
    Bar { index: usize, length: f64 },
    Rect { rect: Rect },
    Note { key: u8, channel: u8, rect: Rect },
    KeyPressed { key: u8 },
}

/// Drawable generators that sit in a layer's `vectorial` module slot and
/// consume the same feature stream as the modifiers.
#[derive(Clone, Debug)]
pub enum Vectorial {
    MusicBars(MusicBars),
    ProgressionBar(ProgressionBar),
    PianoRoll(PianoRoll),
}

impl Vectorial {
    pub fn next(&mut self, features: &AudioFeatures, ctx: FrameCtx) -> Vec<Shape> {
        match self {
            Self::MusicBars(v) => v.next(features),
            Self::ProgressionBar(v) => v.next(features, ctx),
            Self::PianoRoll(v) => v.next(ctx),
        }
    }
}

/// Frequency-bar visualizer: one bar per FFT band, each smoothed by its own
/// remaining-approach engine. Higher bands get a stronger response via a
/// linear ramp between the 20 Hz and 20 kHz multipliers, matching how banded
/// magnitudes fall off toward the treble.
#[derive(Clone, Debug)]
pub struct MusicBars {
    pub minimum_bar_size: f64,
    pub maximum_bar_size: f64,
    pub magnitude_multiplier: f64,
    pub fft_20hz_multiplier: f64,
    pub fft_20khz_multiplier: f64,
    engine_proto: Interpolation,
    bars: Vec<Interpolation>,
}

impl MusicBars {
    pub fn new(
        minimum_bar_size: f64,
        maximum_bar_size: f64,
        responsiveness: f64,
        magnitude_multiplier: f64,
        fft_20hz_multiplier: f64,
        fft_20khz_multiplier: f64,
    ) -> SonovizResult<Self> {
        if maximum_bar_size < minimum_bar_size {
            return Err(SonovizError::configuration(
                "maximum_bar_size must be >= minimum_bar_size",
            ));
        }
        // Engines are built lazily once the band count is known; validate the
        // ratio now and clone this prototype per bar.
        let engine_proto =
            Interpolation::remaining_approach(responsiveness)?.with_current(minimum_bar_size);
        Ok(Self {
            minimum_bar_size,
            maximum_bar_size,
            magnitude_multiplier,
            fft_20hz_multiplier,
            fft_20khz_multiplier,
            engine_proto,
            bars: Vec::new(),
        })
    }

    fn ensure_bars(&mut self, n: usize) {
        while self.bars.len() < n {
            self.bars.push(self.engine_proto.clone());
        }
    }

    pub fn next(&mut self, features: &AudioFeatures) -> Vec<Shape> {
        let n = features.bands.len();
        self.ensure_bars(n);

        let mut out = Vec::with_capacity(n);
        for (index, (band, engine)) in features.bands.iter().zip(&mut self.bars).enumerate() {
            let t = if n <= 1 { 0.0 } else { index as f64 / (n - 1) as f64 };
            let ramp =
                self.fft_20hz_multiplier + (self.fft_20khz_multiplier - self.fft_20hz_multiplier) * t;
            let target = self.minimum_bar_size + band * self.magnitude_multiplier * ramp;
            let length = engine
                .advance(target)
                .clamp(self.minimum_bar_size, self.maximum_bar_size);
            out.push(Shape::Bar { index, length });
        }
        out
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarPosition {
    Top,
    Bottom,
}

/// Horizontal bar filled proportionally to render progress, nudged
/// vertically by the audio amplitude.
#[derive(Clone, Debug)]
pub struct ProgressionBar {
    pub position: BarPosition,
    pub shake_scalar: f64,
    pub thickness: f64,
}

impl ProgressionBar {
    pub fn new(position: BarPosition, shake_scalar: f64, thickness: f64) -> SonovizResult<Self> {
        if !thickness.is_finite() || thickness <= 0.0 {
            return Err(SonovizError::configuration(
                "progression bar thickness must be finite and > 0",
            ));
        }
        Ok(Self {
            position,
            shake_scalar,
            thickness,
        })
    }

    pub fn next(&mut self, features: &AudioFeatures, ctx: FrameCtx) -> Vec<Shape> {
        let width = f64::from(ctx.canvas.width);
        let height = f64::from(ctx.canvas.height);
        let filled = width * ctx.progress();
        let nudge = self.shake_scalar * features.average_amplitude;

        let (y0, y1) = match self.position {
            BarPosition::Top => (nudge, nudge + self.thickness),
            BarPosition::Bottom => (height - self.thickness - nudge, height - nudge),
        };

        vec![Shape::Rect {
            rect: Rect::new(0.0, y0, filled, y1),
        }]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NoteEvent {
    pub key: u8,
    pub channel: u8,
    pub start_secs: f64,
    pub end_secs: f64,
}

/// Falling-notes view over a list of timed note events. Emits the notes
/// inside a sliding window of `seconds_of_content` ahead of the playhead,
/// plus pressed-key markers for notes sounding right now.
#[derive(Clone, Debug)]
pub struct PianoRoll {
    pub seconds_of_content: f64,
    notes: Vec<NoteEvent>,
}

impl PianoRoll {
    pub fn new(seconds_of_content: f64, mut notes: Vec<NoteEvent>) -> SonovizResult<Self> {
        if !seconds_of_content.is_finite() || seconds_of_content <= 0.0 {
            return Err(SonovizError::configuration(
                "piano roll seconds_of_content must be finite and > 0",
            ));
        }
        for n in &notes {
            if n.end_secs < n.start_secs {
                return Err(SonovizError::configuration(format!(
                    "piano roll note key={} ends before it starts",
                    n.key
                )));
            }
        }
        notes.sort_by(|a, b| a.start_secs.total_cmp(&b.start_secs));
        Ok(Self {
            seconds_of_content,
            notes,
        })
    }

    pub fn next(&mut self, ctx: FrameCtx) -> Vec<Shape> {
        let now = ctx.elapsed_secs();
        let window_end = now + self.seconds_of_content;
        let width = f64::from(ctx.canvas.width);
        let height = f64::from(ctx.canvas.height);
        let key_width = width / 128.0;

        let mut out = Vec::new();
        for n in &self.notes {
            if n.start_secs >= window_end {
                break; // sorted by start
            }
            if n.end_secs <= now {
                continue;
            }

            // y grows downward; a note hits the keyboard (bottom) at start.
            let y_of = |secs: f64| height - ((secs - now) / self.seconds_of_content) * height;
            let x0 = f64::from(n.key) * key_width;
            let y_top = y_of(n.end_secs).max(0.0);
            let y_bottom = y_of(n.start_secs).min(height);
            out.push(Shape::Note {
                key: n.key,
                channel: n.channel,
                rect: Rect::new(x0, y_top, x0 + key_width, y_bottom),
            });

            if n.start_secs <= now && now < n.end_secs {
                out.push(Shape::KeyPressed { key: n.key });
            }
        }
        out
    }
}
