use crate::{
    core::{Fps, FrameIndex},
    error::{SonovizError, SonovizResult},
};

/// One frame worth of precomputed audio analysis. Decoding and FFT slicing
/// happen upstream; the timeline engine only consumes the result.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct AudioFeatures {
    pub average_amplitude: f64,
    /// Banded FFT magnitudes, low frequencies first.
    pub bands: Vec<f64>,
}

/// Frame-indexed stream of [`AudioFeatures`], monotonically increasing by
/// construction (frame N is `frames[N]`).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct AudioFeatureTrack {
    pub fps: Fps,
    frames: Vec<AudioFeatures>,
}

impl AudioFeatureTrack {
    pub fn new(fps: Fps, frames: Vec<AudioFeatures>) -> Self {
        Self { fps, frames }
    }

    pub fn len_frames(&self) -> u64 {
        self.frames.len() as u64
    }

    pub fn get(&self, frame: FrameIndex) -> Option<&AudioFeatures> {
        self.frames.get(usize::try_from(frame.0).ok()?)
    }

    /// Scale every amplitude and band by `multiplier`, for under- or
    /// over-normalized source audio.
    pub fn amplify(mut self, multiplier: f64) -> SonovizResult<Self> {
        if !multiplier.is_finite() || multiplier < 0.0 {
            return Err(SonovizError::configuration(
                "audio amplitude multiplier must be finite and >= 0",
            ));
        }
        for f in &mut self.frames {
            f.average_amplitude *= multiplier;
            for b in &mut f.bands {
                *b *= multiplier;
            }
        }
        Ok(self)
    }

    /// Deterministic synthetic feature track, used by tests and the CLI when
    /// no analysis file is supplied. A slow amplitude swell plus per-band
    /// sinusoids, all derived from the frame index only.
    pub fn synthetic(fps: Fps, frames: u64, bands: usize) -> Self {
        let mut out = Vec::with_capacity(frames as usize);
        for n in 0..frames {
            let t = fps.frames_to_secs(n);
            let average_amplitude = 0.5 + 0.5 * (t * std::f64::consts::TAU * 0.25).sin().abs();
            let bands = (0..bands)
                .map(|b| {
                    let phase = b as f64 * 0.37;
                    0.5 + 0.5 * (t * std::f64::consts::TAU * (0.5 + b as f64 * 0.11) + phase).sin()
                })
                .collect();
            out.push(AudioFeatures {
                average_amplitude,
                bands,
            });
        }
        Self::new(fps, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_is_bounds_checked() {
        let track = AudioFeatureTrack::synthetic(Fps::new(30, 1).unwrap(), 10, 4);
        assert!(track.get(FrameIndex(9)).is_some());
        assert!(track.get(FrameIndex(10)).is_none());
    }

    #[test]
    fn amplify_scales_amplitude_and_bands() {
        let track = AudioFeatureTrack::new(
            Fps::new(30, 1).unwrap(),
            vec![AudioFeatures {
                average_amplitude: 0.5,
                bands: vec![1.0, 2.0],
            }],
        );
        let track = track.amplify(2.0).unwrap();
        let f = track.get(FrameIndex(0)).unwrap();
        assert_eq!(f.average_amplitude, 1.0);
        assert_eq!(f.bands, vec![2.0, 4.0]);
    }

    #[test]
    fn amplify_rejects_bad_multiplier() {
        let track = AudioFeatureTrack::synthetic(Fps::new(30, 1).unwrap(), 1, 1);
        assert!(track.clone().amplify(-1.0).is_err());
        assert!(track.amplify(f64::NAN).is_err());
    }

    #[test]
    fn synthetic_is_deterministic() {
        let fps = Fps::new(60, 1).unwrap();
        let a = AudioFeatureTrack::synthetic(fps, 5, 8);
        let b = AudioFeatureTrack::synthetic(fps, 5, 8);
        for n in 0..5 {
            let (fa, fb) = (a.get(FrameIndex(n)).unwrap(), b.get(FrameIndex(n)).unwrap());
            assert_eq!(fa.average_amplitude, fb.average_amplitude);
            assert_eq!(fa.bands, fb.bands);
        }
    }
}
