#![forbid(unsafe_code)]

pub mod audio;
pub mod configure;
pub mod core;
pub mod encode_ffmpeg;
pub mod error;
pub mod eval;
pub mod interpolation;
pub mod model;
pub mod modifier;
pub mod preview_ffplay;
pub mod vectorial;

pub use audio::{AudioFeatureTrack, AudioFeatures};
pub use configure::Configure;
pub use core::{Canvas, Fps, FrameIndex, FrameRgba, Point, Rect, Vec2};
pub use error::{SonovizError, SonovizResult};
pub use eval::{Evaluator, ResolvedFrame, ResolvedObject};
pub use interpolation::Interpolation;
pub use model::{AnimationLayer, AnimationSet, Scene, SceneObject, Steps};
pub use modifier::{Modifier, ModuleKind};
pub use vectorial::{Shape, Vectorial};
