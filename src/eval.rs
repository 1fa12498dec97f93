use crate::{
    audio::AudioFeatureTrack,
    core::{FrameCtx, FrameIndex, Point},
    error::{SonovizError, SonovizResult},
    model::Scene,
    modifier::{Modifier, ModuleKind, VideoSource},
    vectorial::Shape,
};

/// Fully resolved state of every active object at one frame, in draw order.
/// This is the engine's output contract: the external canvas turns it into
/// pixels without touching any animation state.
#[derive(Clone, Debug, serde::Serialize)]
pub struct ResolvedFrame {
    pub frame: FrameIndex,
    pub objects: Vec<ResolvedObject>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct ResolvedObject {
    pub name: String,
    pub layer: u32,
    pub animation_index: u32,
    pub position: Point,
    /// Additive size offset from the resize module, 0 when absent.
    pub size_off: f64,
    pub keep_center: bool,
    pub rotation_rad: f64,
    pub blur_kernel: Option<f64>,
    pub vignette: Option<f64>,
    pub shapes: Vec<Shape>,
    pub video: Option<VideoSource>,
}

/// Frame driver. Walks the scene's objects in draw order and resolves each
/// active animation layer against the feature stream. `&mut` throughout:
/// every resolved frame advances interpolation state and consumes one step
/// of each active layer, so frames must be requested in sequence.
#[derive(Debug, Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    #[tracing::instrument(skip(self, scene, features), fields(frame = frame.0))]
    pub fn resolve_frame(
        &mut self,
        scene: &mut Scene,
        features: &AudioFeatureTrack,
        frame: FrameIndex,
    ) -> SonovizResult<ResolvedFrame> {
        if frame.0 >= scene.duration.0 {
            return Err(SonovizError::evaluation(format!(
                "frame {} out of range, render is {} frames",
                frame.0, scene.duration.0
            )));
        }
        let frame_features = features.get(frame).ok_or_else(|| {
            SonovizError::evaluation(format!(
                "no audio features for frame {} (track has {})",
                frame.0,
                features.len_frames()
            ))
        })?;
        let ctx = FrameCtx {
            frame,
            total_frames: scene.duration,
            fps: scene.fps,
            canvas: scene.canvas,
        };

        let mut objects = Vec::new();
        for (z, object) in scene.objects_mut() {
            let Some((animation_index, layer)) = object.animation.active_layer_mut() else {
                // Exhausted table: the object simply does not appear.
                continue;
            };

            let mut resolved = ResolvedObject {
                name: object.name.clone(),
                layer: z,
                animation_index,
                position: Point::ZERO,
                size_off: 0.0,
                keep_center: true,
                rotation_rad: 0.0,
                blur_kernel: None,
                vignette: None,
                shapes: Vec::new(),
                video: None,
            };

            for entry in &mut layer.path {
                match entry {
                    Modifier::Point { x, y } => {
                        resolved.position = Point::new(*x, *y);
                    }
                    Modifier::Shake(shake) => {
                        resolved.position += shake.next_offset();
                    }
                    other => {
                        return Err(SonovizError::evaluation(format!(
                            "object {:?} path holds a non-positional modifier: {other:?}",
                            resolved.name
                        )));
                    }
                }
            }

            for (kind, modifier) in layer.modules.iter_mut() {
                match modifier {
                    Modifier::ScalarResize(m) => {
                        resolved.size_off = m.next(frame_features);
                        resolved.keep_center = m.keep_center;
                    }
                    Modifier::GaussianBlur(m) => {
                        resolved.blur_kernel = Some(m.next(frame_features));
                    }
                    Modifier::SineSwing(m) => {
                        resolved.rotation_rad = m.next();
                    }
                    Modifier::LinearSwing(m) => {
                        resolved.rotation_rad = m.next();
                    }
                    Modifier::Vignetting(m) => {
                        resolved.vignette = Some(m.next(frame_features));
                    }
                    Modifier::Video(m) => {
                        resolved.video = Some(m.clone());
                    }
                    Modifier::Vectorial(v) => {
                        resolved.shapes = v.next(frame_features, ctx);
                    }
                    // A constant pins its slot to a fixed value for the
                    // lifetime of the layer.
                    Modifier::Constant { value } => match *kind {
                        ModuleKind::Resize => resolved.size_off = *value,
                        ModuleKind::Blur => resolved.blur_kernel = Some(value.max(0.0)),
                        ModuleKind::Rotate => resolved.rotation_rad = *value,
                        ModuleKind::Vignetting => resolved.vignette = Some(*value),
                        ModuleKind::Video | ModuleKind::Vectorial => {
                            return Err(SonovizError::evaluation(format!(
                                "object {:?} holds a constant under the {kind} slot",
                                resolved.name
                            )));
                        }
                    },
                    Modifier::Point { .. } | Modifier::Shake(_) => {}
                }
            }

            object.animation.consume_step();
            objects.push(resolved);
        }

        Ok(ResolvedFrame { frame, objects })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        configure::{ResizeConfig, VignettingConfig},
        core::{Canvas, Fps},
        model::{Scene, SceneObject, Steps},
    };

    fn scene(frames: u64) -> Scene {
        Scene::new(
            Fps::new(60, 1).unwrap(),
            Canvas {
                width: 1280,
                height: 720,
            },
            FrameIndex(frames),
        )
        .unwrap()
    }

    fn unit_track(frames: u64) -> AudioFeatureTrack {
        let fps = Fps::new(60, 1).unwrap();
        AudioFeatureTrack::new(
            fps,
            (0..frames)
                .map(|_| crate::audio::AudioFeatures {
                    average_amplitude: 1.0,
                    bands: Vec::new(),
                })
                .collect(),
        )
    }

    #[test]
    fn out_of_range_frame_is_an_error() {
        let mut s = scene(10);
        let track = unit_track(10);
        assert!(
            Evaluator::new()
                .resolve_frame(&mut s, &track, FrameIndex(10))
                .is_err()
        );
    }

    #[test]
    fn missing_features_are_an_error() {
        let mut s = scene(10);
        let track = unit_track(5);
        assert!(
            Evaluator::new()
                .resolve_frame(&mut s, &track, FrameIndex(7))
                .is_err()
        );
    }

    #[test]
    fn object_without_steps_never_appears() {
        let mut s = scene(3);
        let mut obj = SceneObject::image("bg");
        obj.configure().start_or_reset_this_animation();
        s.add(obj, 0);
        let track = unit_track(3);

        let mut eval = Evaluator::new();
        for n in 0..3 {
            let frame = eval.resolve_frame(&mut s, &track, FrameIndex(n)).unwrap();
            assert!(frame.objects.is_empty());
        }
    }

    #[test]
    fn resize_sequence_is_frame_sequential() {
        let mut s = scene(5);
        let mut obj = SceneObject::image("bg");
        {
            let mut c = obj.configure();
            c.init_animation_layer();
            c.add_module_resize(ResizeConfig::new(0.5, 2.0)).unwrap();
        }
        s.add(obj, 0);
        let track = unit_track(5);

        let mut eval = Evaluator::new();
        let got: Vec<f64> = (0..5)
            .map(|n| {
                eval.resolve_frame(&mut s, &track, FrameIndex(n)).unwrap().objects[0].size_off
            })
            .collect();
        assert_eq!(got, vec![0.0, 1.0, 1.5, 1.75, 1.875]);
    }

    #[test]
    fn vignette_floor_holds_from_the_first_frame() {
        let mut s = scene(3);
        let mut obj = SceneObject::image("bg");
        obj.configure()
            .init_animation_layer()
            .add_module_vignetting(VignettingConfig {
                start: 100.0,
                scalar: -50.0,
                minimum: 20.0,
                smooth: 1.0,
            })
            .unwrap();
        s.add(obj, 0);

        let fps = Fps::new(60, 1).unwrap();
        let track = AudioFeatureTrack::new(
            fps,
            (0..3)
                .map(|_| crate::audio::AudioFeatures {
                    average_amplitude: 2.0,
                    bands: Vec::new(),
                })
                .collect(),
        );

        let mut eval = Evaluator::new();
        for n in 0..3 {
            let frame = eval.resolve_frame(&mut s, &track, FrameIndex(n)).unwrap();
            assert_eq!(frame.objects[0].vignette, Some(20.0));
        }
    }

    #[test]
    fn constant_modules_pin_their_slot_values() {
        let mut s = scene(3);
        let mut obj = SceneObject::image("logo");
        {
            let mut c = obj.configure();
            c.init_animation_layer();
            c.add_module_constant(ModuleKind::Rotate, 0.25).unwrap();
            c.add_module_constant(ModuleKind::Vignetting, 600.0).unwrap();
            c.add_module_constant(ModuleKind::Blur, -4.0).unwrap();
        }
        s.add(obj, 0);
        let track = unit_track(3);

        let mut eval = Evaluator::new();
        for n in 0..3 {
            let frame = eval.resolve_frame(&mut s, &track, FrameIndex(n)).unwrap();
            let obj = &frame.objects[0];
            assert_eq!(obj.rotation_rad, 0.25);
            assert_eq!(obj.vignette, Some(600.0));
            // Negative kernels clamp like the audio-reactive blur does.
            assert_eq!(obj.blur_kernel, Some(0.0));
        }
    }

    #[test]
    fn layer_handoff_mid_render() {
        let mut s = scene(4);
        let mut obj = SceneObject::image("bg");
        {
            let mut c = obj.configure();
            c.start_or_reset_this_animation();
            c.add_path_point(0.0, 0.0);
            c.set_this_animation_steps(Steps::Finite(2));
            c.next_animation_index();
            c.start_or_reset_this_animation();
            c.add_path_point(100.0, 100.0);
            c.set_this_animation_steps(Steps::Unbounded);
        }
        s.add(obj, 0);
        let track = unit_track(4);

        let mut eval = Evaluator::new();
        let indices: Vec<u32> = (0..4)
            .map(|n| {
                eval.resolve_frame(&mut s, &track, FrameIndex(n)).unwrap().objects[0]
                    .animation_index
            })
            .collect();
        assert_eq!(indices, vec![0, 0, 1, 1]);
    }
}
