use sonoviz::{
    Evaluator,
    audio::AudioFeatureTrack,
    configure::{
        BlurConfig, ProgressionBarConfig, ResizeConfig, ShakeConfig, SwingRotationConfig,
        VisualizerConfig,
    },
    core::{Canvas, Fps, FrameIndex},
    model::{Scene, SceneObject},
    vectorial::BarPosition,
};

const FRAMES: u64 = 90;

fn demo_scene(seed: u64) -> Scene {
    let fps = Fps::new(60, 1).unwrap();
    let canvas = Canvas {
        width: 1280,
        height: 720,
    };
    let mut scene = Scene::new(fps, canvas, FrameIndex(FRAMES)).unwrap();

    let mut background = SceneObject::image("background");
    {
        let mut c = background.configure();
        c.init_animation_layer();
        c.add_path_point(-20.0, -20.0);
        c.simple_add_path_modifier_shake(ShakeConfig {
            shake_max_distance: 20.0,
            x_smoothness: 0.01,
            y_smoothness: 0.02,
            seed,
        })
        .unwrap();
        c.add_module_resize(ResizeConfig::new(0.08, 30.0)).unwrap();
        c.add_module_blur(BlurConfig {
            smooth: 0.1,
            scalar: 20.0,
        })
        .unwrap();
    }
    scene.add(background, 0);

    let mut logo = SceneObject::image("logo");
    {
        let mut c = logo.configure();
        c.init_animation_layer();
        c.add_path_point(550.0, 270.0);
        c.add_module_resize(ResizeConfig::new(0.08, 100.0)).unwrap();
        c.add_module_swing_rotation(SwingRotationConfig {
            max_angle: 0.1,
            smooth: 100.0,
            phase: 0.0,
        })
        .unwrap();
    }
    scene.add(logo, 2);

    let mut bars = SceneObject::generator("music-bars");
    {
        let mut c = bars.configure();
        c.init_animation_layer();
        c.add_path_point(0.0, 360.0);
        c.add_module_visualizer(VisualizerConfig {
            minimum_bar_size: 14.0,
            maximum_bar_size: 288.0,
            bar_responsiveness: 0.25,
            bar_magnitude_multiplier: 86.0,
            fft_20hz_multiplier: 0.8,
            fft_20khz_multiplier: 12.0,
        })
        .unwrap();
    }
    scene.add(bars, 1);

    let mut progression = SceneObject::generator("progression-bar");
    {
        let mut c = progression.configure();
        c.init_animation_layer();
        c.add_module_progression_bar(ProgressionBarConfig {
            position: BarPosition::Bottom,
            shake_scalar: 14.0,
            thickness: 9.0,
        })
        .unwrap();
    }
    scene.add(progression, 3);

    let mut vignette = SceneObject::generator("vignetting");
    {
        let mut c = vignette.configure();
        c.init_animation_layer();
        c.simple_add_vignetting("medium").unwrap();
    }
    scene.add(vignette, 4);

    scene
}

fn resolve_all(scene: &mut Scene, track: &AudioFeatureTrack) -> Vec<String> {
    let mut eval = Evaluator::new();
    (0..FRAMES)
        .map(|n| {
            let frame = eval.resolve_frame(scene, track, FrameIndex(n)).unwrap();
            serde_json::to_string(&frame).unwrap()
        })
        .collect()
}

#[test]
fn identical_setups_resolve_identically() {
    let fps = Fps::new(60, 1).unwrap();
    let track = AudioFeatureTrack::synthetic(fps, FRAMES, 32);

    let a = resolve_all(&mut demo_scene(7), &track);
    let b = resolve_all(&mut demo_scene(7), &track);
    assert_eq!(a, b);
}

#[test]
fn shake_seed_changes_the_output() {
    let fps = Fps::new(60, 1).unwrap();
    let track = AudioFeatureTrack::synthetic(fps, FRAMES, 32);

    let a = resolve_all(&mut demo_scene(7), &track);
    let b = resolve_all(&mut demo_scene(8), &track);
    assert_ne!(a, b);
}

#[test]
fn every_frame_carries_all_five_objects() {
    let fps = Fps::new(60, 1).unwrap();
    let track = AudioFeatureTrack::synthetic(fps, FRAMES, 32);
    let mut scene = demo_scene(0);

    let mut eval = Evaluator::new();
    for n in 0..FRAMES {
        let frame = eval.resolve_frame(&mut scene, &track, FrameIndex(n)).unwrap();
        assert_eq!(frame.objects.len(), 5);
        // Draw order is z-layer ascending.
        let names: Vec<&str> = frame.objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "background",
                "music-bars",
                "logo",
                "progression-bar",
                "vignetting"
            ]
        );
    }
}
