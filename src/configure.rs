use std::path::PathBuf;

use crate::{
    error::{SonovizError, SonovizResult},
    model::{ObjectKind, SceneObject, Steps},
    modifier::{
        GaussianBlur, LinearSwing, Modifier, ModuleKind, ScalarResize, Shake, SineSwing,
        VideoSource, Vignetting,
    },
    vectorial::{BarPosition, MusicBars, NoteEvent, PianoRoll, ProgressionBar, Vectorial},
};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ShakeConfig {
    pub shake_max_distance: f64,
    pub x_smoothness: f64,
    pub y_smoothness: f64,
    #[serde(default)]
    pub seed: u64,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ResizeConfig {
    pub smooth: f64,
    pub scalar: f64,
    #[serde(default)]
    pub base: f64,
    #[serde(default = "default_true")]
    pub keep_center: bool,
}

impl ResizeConfig {
    pub fn new(smooth: f64, scalar: f64) -> Self {
        Self {
            smooth,
            scalar,
            base: 0.0,
            keep_center: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct BlurConfig {
    pub smooth: f64,
    pub scalar: f64,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SwingRotationConfig {
    pub max_angle: f64,
    pub smooth: f64,
    #[serde(default)]
    pub phase: f64,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LinearRotationConfig {
    pub smooth: f64,
    #[serde(default)]
    pub phase: f64,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct VignettingConfig {
    pub start: f64,
    pub scalar: f64,
    pub minimum: f64,
    pub smooth: f64,
}

/// Named vignetting strength presets; parsed case-insensitively from the
/// strings users pass to [`Configure::simple_add_vignetting`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VignettingIntensity {
    Low,
    Medium,
    High,
}

impl VignettingIntensity {
    pub fn parse(name: &str) -> SonovizResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(SonovizError::configuration(format!(
                "unknown vignetting intensity {other:?}, expected low | medium | high"
            ))),
        }
    }

    fn scalar(self) -> f64 {
        match self {
            Self::Low => -600.0,
            Self::Medium => -1000.0,
            Self::High => -1500.0,
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct VideoConfig {
    pub path: PathBuf,
    pub width: f64,
    pub height: f64,
    /// Extra pixels on each dimension so shake never exposes the border.
    #[serde(default)]
    pub over_resize_width: f64,
    #[serde(default)]
    pub over_resize_height: f64,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct VisualizerConfig {
    pub minimum_bar_size: f64,
    pub maximum_bar_size: f64,
    pub bar_responsiveness: f64,
    pub bar_magnitude_multiplier: f64,
    pub fft_20hz_multiplier: f64,
    pub fft_20khz_multiplier: f64,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ProgressionBarConfig {
    pub position: BarPosition,
    pub shake_scalar: f64,
    pub thickness: f64,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PianoRollConfig {
    pub seconds_of_content: f64,
    pub notes: Vec<NoteEvent>,
}

/// Builder façade over one object's animation table. A cursor (persisted on
/// the object) selects which layer the `add_*` calls target; it only moves
/// forward through `next_animation_index`, or jumps via `set_animation_index`.
#[derive(Debug)]
pub struct Configure<'a> {
    object: &'a mut SceneObject,
}

impl<'a> Configure<'a> {
    pub fn new(object: &'a mut SceneObject) -> Self {
        Self { object }
    }

    pub fn animation_index(&self) -> u32 {
        self.object.cursor
    }

    /// Convenience: reset the layer at the cursor and mark it valid for the
    /// rest of the render.
    pub fn init_animation_layer(&mut self) -> &mut Self {
        self.start_or_reset_this_animation();
        self.set_this_animation_steps(Steps::Unbounded);
        self
    }

    /// Wipe the layer at the cursor back to empty. Destructive; used both for
    /// first-time init and explicit resets. The fresh layer has zero steps and
    /// stays inactive until steps are assigned.
    pub fn start_or_reset_this_animation(&mut self) -> &mut Self {
        tracing::debug!(object = %self.object.name, layer = self.object.cursor, "reset animation layer");
        self.object.animation.reset_layer(self.object.cursor);
        self
    }

    pub fn set_this_animation_steps(&mut self, steps: Steps) -> &mut Self {
        self.object.animation.layer_mut(self.object.cursor).steps = steps;
        self
    }

    /// Jump the cursor to an arbitrary index.
    pub fn set_animation_index(&mut self, index: u32) -> &mut Self {
        self.object.cursor = index;
        self
    }

    /// Move the cursor to the next layer index. Subsequent `add_*` calls
    /// target the new, still-empty layer.
    pub fn next_animation_index(&mut self) -> &mut Self {
        self.object.cursor = self.object.cursor.saturating_add(1);
        self
    }

    /// Attach a static image source to the object.
    pub fn load_image(&mut self, path: impl Into<PathBuf>) -> SonovizResult<&mut Self> {
        match &mut self.object.kind {
            ObjectKind::Image { source } => {
                *source = Some(path.into());
                Ok(self)
            }
            ObjectKind::Generator => Err(SonovizError::configuration(format!(
                "object {:?} is a generator and cannot load an image",
                self.object.name
            ))),
        }
    }

    pub fn add_path_point(&mut self, x: f64, y: f64) -> &mut Self {
        self.layer().path.push(Modifier::Point { x, y });
        self
    }

    pub fn simple_add_path_modifier_shake(&mut self, cfg: ShakeConfig) -> SonovizResult<&mut Self> {
        let shake = Shake::new(
            cfg.shake_max_distance,
            cfg.x_smoothness,
            cfg.y_smoothness,
            cfg.seed,
        )?;
        self.layer().path.push(Modifier::Shake(shake));
        Ok(self)
    }

    pub fn add_module_resize(&mut self, cfg: ResizeConfig) -> SonovizResult<&mut Self> {
        let m = ScalarResize::new(cfg.smooth, cfg.scalar, cfg.base, cfg.keep_center)?;
        self.insert_module(ModuleKind::Resize, Modifier::ScalarResize(m));
        Ok(self)
    }

    pub fn add_module_blur(&mut self, cfg: BlurConfig) -> SonovizResult<&mut Self> {
        let m = GaussianBlur::new(cfg.smooth, cfg.scalar)?;
        self.insert_module(ModuleKind::Blur, Modifier::GaussianBlur(m));
        Ok(self)
    }

    /// Back-and-forth rotation. Shares the `Rotate` slot with
    /// [`Self::add_module_linear_rotation`]; last write wins.
    pub fn add_module_swing_rotation(
        &mut self,
        cfg: SwingRotationConfig,
    ) -> SonovizResult<&mut Self> {
        let m = SineSwing::new(cfg.max_angle, cfg.smooth, cfg.phase)?;
        self.insert_module(ModuleKind::Rotate, Modifier::SineSwing(m));
        Ok(self)
    }

    pub fn add_module_linear_rotation(
        &mut self,
        cfg: LinearRotationConfig,
    ) -> SonovizResult<&mut Self> {
        let m = LinearSwing::new(cfg.smooth, cfg.phase)?;
        self.insert_module(ModuleKind::Rotate, Modifier::LinearSwing(m));
        Ok(self)
    }

    /// Pin a module slot to a fixed, non-audio-reactive value: a constant
    /// rotation angle, blur kernel, size offset, or vignette radius.
    pub fn add_module_constant(&mut self, kind: ModuleKind, value: f64) -> SonovizResult<&mut Self> {
        if !value.is_finite() {
            return Err(SonovizError::configuration(format!(
                "constant module value must be finite, got {value}"
            )));
        }
        if matches!(kind, ModuleKind::Video | ModuleKind::Vectorial) {
            return Err(SonovizError::configuration(format!(
                "module slot {kind} does not take a constant value"
            )));
        }
        self.insert_module(kind, Modifier::Constant { value });
        Ok(self)
    }

    pub fn add_module_vignetting(&mut self, cfg: VignettingConfig) -> SonovizResult<&mut Self> {
        let m = Vignetting::new(cfg.start, cfg.scalar, cfg.minimum, cfg.smooth)?;
        self.insert_module(ModuleKind::Vignetting, Modifier::Vignetting(m));
        Ok(self)
    }

    /// Preset vignetting keyed by intensity name (`low | medium | high`).
    /// Routes through [`Self::add_module_vignetting`] with the preset values.
    pub fn simple_add_vignetting(&mut self, intensity: &str) -> SonovizResult<&mut Self> {
        let intensity = VignettingIntensity::parse(intensity)?;
        self.add_module_vignetting(VignettingConfig {
            start: 900.0,
            scalar: intensity.scalar(),
            minimum: 450.0,
            smooth: 0.09,
        })
    }

    pub fn add_module_video(&mut self, cfg: VideoConfig) -> SonovizResult<&mut Self> {
        if cfg.width <= 0.0 || cfg.height <= 0.0 {
            return Err(SonovizError::configuration(
                "video module width/height must be > 0",
            ));
        }
        let m = VideoSource {
            path: cfg.path,
            width: cfg.width + cfg.over_resize_width,
            height: cfg.height + cfg.over_resize_height,
        };
        self.insert_module(ModuleKind::Video, Modifier::Video(m));
        Ok(self)
    }

    pub fn add_module_visualizer(&mut self, cfg: VisualizerConfig) -> SonovizResult<&mut Self> {
        let v = MusicBars::new(
            cfg.minimum_bar_size,
            cfg.maximum_bar_size,
            cfg.bar_responsiveness,
            cfg.bar_magnitude_multiplier,
            cfg.fft_20hz_multiplier,
            cfg.fft_20khz_multiplier,
        )?;
        self.insert_module(ModuleKind::Vectorial, Modifier::Vectorial(Vectorial::MusicBars(v)));
        Ok(self)
    }

    pub fn add_module_progression_bar(
        &mut self,
        cfg: ProgressionBarConfig,
    ) -> SonovizResult<&mut Self> {
        let v = ProgressionBar::new(cfg.position, cfg.shake_scalar, cfg.thickness)?;
        self.insert_module(
            ModuleKind::Vectorial,
            Modifier::Vectorial(Vectorial::ProgressionBar(v)),
        );
        Ok(self)
    }

    pub fn add_module_piano_roll(&mut self, cfg: PianoRollConfig) -> SonovizResult<&mut Self> {
        let v = PianoRoll::new(cfg.seconds_of_content, cfg.notes)?;
        self.insert_module(
            ModuleKind::Vectorial,
            Modifier::Vectorial(Vectorial::PianoRoll(v)),
        );
        Ok(self)
    }

    fn insert_module(&mut self, kind: ModuleKind, modifier: Modifier) {
        tracing::debug!(
            object = %self.object.name,
            layer = self.object.cursor,
            module = %kind,
            "add module"
        );
        self.layer().modules.insert(kind, modifier);
    }

    fn layer(&mut self) -> &mut crate::model::AnimationLayer {
        self.object.animation.layer_mut(self.object.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SceneObject;

    #[test]
    fn reset_is_idempotent() {
        let mut obj = SceneObject::image("bg");
        let mut c = obj.configure();
        c.start_or_reset_this_animation();
        c.add_path_point(1.0, 2.0);
        c.set_this_animation_steps(Steps::Finite(5));
        c.start_or_reset_this_animation();
        c.start_or_reset_this_animation();

        let layer = obj.animation.layer(0).unwrap();
        assert!(layer.path.is_empty());
        assert!(layer.modules.is_empty());
        assert_eq!(layer.steps, Steps::Finite(0));
    }

    #[test]
    fn cursor_is_monotonic_and_layers_stay_put() {
        let mut obj = SceneObject::image("bg");
        let mut c = obj.configure();
        c.init_animation_layer();
        c.add_path_point(10.0, 10.0);
        for _ in 0..3 {
            c.next_animation_index();
        }
        assert_eq!(c.animation_index(), 3);

        let layer0 = obj.animation.layer(0).unwrap();
        assert_eq!(layer0.path.len(), 1);
        assert_eq!(layer0.steps, Steps::Unbounded);
    }

    #[test]
    fn readding_a_module_kind_overwrites() {
        let mut obj = SceneObject::image("bg");
        let mut c = obj.configure();
        c.init_animation_layer();
        c.add_module_resize(ResizeConfig::new(0.1, 1.0)).unwrap();
        c.add_module_resize(ResizeConfig::new(0.1, 9.0)).unwrap();
        c.add_module_swing_rotation(SwingRotationConfig {
            max_angle: 0.1,
            smooth: 100.0,
            phase: 0.0,
        })
        .unwrap();
        c.add_module_linear_rotation(LinearRotationConfig {
            smooth: 100.0,
            phase: 0.0,
        })
        .unwrap();

        let layer = obj.animation.layer(0).unwrap();
        assert_eq!(layer.modules.len(), 2);
        let Some(Modifier::ScalarResize(resize)) = layer.modules.get(&ModuleKind::Resize) else {
            panic!("resize slot must hold the last resize");
        };
        assert_eq!(resize.scalar, 9.0);
        assert!(matches!(
            layer.modules.get(&ModuleKind::Rotate),
            Some(Modifier::LinearSwing(_))
        ));
    }

    #[test]
    fn unknown_vignetting_intensity_is_fatal() {
        let mut obj = SceneObject::image("bg");
        let err = obj.configure().simple_add_vignetting("extreme").unwrap_err();
        assert!(err.to_string().contains("extreme"));
    }

    #[test]
    fn generators_refuse_images() {
        let mut obj = SceneObject::generator("bars");
        assert!(obj.configure().load_image("logo.png").is_err());
    }

    #[test]
    fn invalid_smoothness_fails_at_setup() {
        let mut obj = SceneObject::image("bg");
        let mut c = obj.configure();
        assert!(c.add_module_resize(ResizeConfig::new(0.0, 1.0)).is_err());
        assert!(
            c.simple_add_path_modifier_shake(ShakeConfig {
                shake_max_distance: 10.0,
                x_smoothness: f64::NAN,
                y_smoothness: 0.1,
                seed: 0,
            })
            .is_err()
        );
    }

    #[test]
    fn constant_module_validates_slot_and_value() {
        let mut obj = SceneObject::image("bg");
        let mut c = obj.configure();
        c.init_animation_layer();
        assert!(c.add_module_constant(ModuleKind::Video, 1.0).is_err());
        assert!(c.add_module_constant(ModuleKind::Vectorial, 1.0).is_err());
        assert!(c.add_module_constant(ModuleKind::Blur, f64::NAN).is_err());
        c.add_module_constant(ModuleKind::Rotate, 0.5).unwrap();

        let layer = obj.animation.layer(0).unwrap();
        assert!(matches!(
            layer.modules.get(&ModuleKind::Rotate),
            Some(Modifier::Constant { value }) if *value == 0.5
        ));
    }

    #[test]
    fn set_animation_index_jumps_the_cursor() {
        let mut obj = SceneObject::image("bg");
        let mut c = obj.configure();
        c.set_animation_index(7);
        c.init_animation_layer();
        assert!(obj.animation.layer(7).is_some());
        assert!(obj.animation.layer(0).is_none());
    }
}
