use crate::error::{SonovizError, SonovizResult};

use std::f64::consts::TAU;

/// Smoothing recurrence tracking a single scalar.
///
/// `advance(target)` returns the value the caller should use *this* frame and
/// then steps the internal state toward `target`, so frame 0 always observes
/// the starting value. The remaining-approach kind closes a fixed fraction of
/// the remaining distance per step (exponential approach, no overshoot); the
/// linear kind ignores the target and accumulates a fixed per-frame step,
/// wrapped at 2π for rotation use; the sine kind tracks a phase accumulator.
#[derive(Clone, Debug)]
pub struct Interpolation {
    current: f64,
    kind: Kind,
}

#[derive(Clone, Debug)]
enum Kind {
    RemainingApproach { ratio: f64 },
    Linear { step: f64 },
    Sine { amplitude: f64, step: f64, phase: f64, acc: f64 },
}

impl Interpolation {
    /// `current += (target - current) * ratio` per step. `ratio` must be
    /// finite and > 0; values above 1 are clamped to 1 (instant snap).
    pub fn remaining_approach(ratio: f64) -> SonovizResult<Self> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(SonovizError::configuration(format!(
                "remaining-approach ratio must be finite and > 0, got {ratio}"
            )));
        }
        Ok(Self {
            current: 0.0,
            kind: Kind::RemainingApproach {
                ratio: ratio.min(1.0),
            },
        })
    }

    /// Fixed per-step increment, wrapped into `[0, 2π)`.
    pub fn linear(step: f64) -> SonovizResult<Self> {
        if !step.is_finite() {
            return Err(SonovizError::configuration(
                "linear interpolation step must be finite",
            ));
        }
        Ok(Self {
            current: 0.0,
            kind: Kind::Linear { step },
        })
    }

    /// `amplitude * sin(acc + phase)` with `acc` advancing by `step` per call.
    pub fn sine(amplitude: f64, step: f64, phase: f64) -> SonovizResult<Self> {
        if !step.is_finite() || !phase.is_finite() {
            return Err(SonovizError::configuration(
                "sine interpolation step and phase must be finite",
            ));
        }
        Ok(Self {
            current: amplitude * phase.sin(),
            kind: Kind::Sine {
                amplitude,
                step,
                phase,
                acc: 0.0,
            },
        })
    }

    pub fn with_current(mut self, value: f64) -> Self {
        self.current = value;
        self
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    /// Return the current value, then step toward (or past) `target`.
    /// Non-finite targets propagate into the state; they never panic.
    pub fn advance(&mut self, target: f64) -> f64 {
        let out = self.current;
        match &mut self.kind {
            Kind::RemainingApproach { ratio } => {
                self.current += (target - self.current) * *ratio;
            }
            Kind::Linear { step } => {
                self.current = (self.current + *step).rem_euclid(TAU);
            }
            Kind::Sine {
                amplitude,
                step,
                phase,
                acc,
            } => {
                *acc = (*acc + *step).rem_euclid(TAU);
                self.current = *amplitude * (*acc + *phase).sin();
            }
        }
        out
    }
}
