use std::collections::BTreeMap;

use crate::{
    configure::Configure,
    core::{Canvas, Fps, FrameIndex},
    error::{SonovizError, SonovizResult},
    modifier::{Modifier, ModuleKind},
};

/// How many output frames an animation layer is valid for. `Unbounded` is
/// the "rest of the render" configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Steps {
    Finite(u64),
    Unbounded,
}

impl Steps {
    pub fn allows(self, consumed: u64) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Finite(n) => consumed < n,
        }
    }
}

impl Default for Steps {
    fn default() -> Self {
        Self::Finite(0)
    }
}

/// One animation phase of an object: an ordered position path (points and
/// shakes), a typed modules table, and a step bound. A freshly reset layer
/// has `Steps::Finite(0)` and is inactive until steps are assigned.
#[derive(Debug, Default)]
pub struct AnimationLayer {
    pub path: Vec<Modifier>,
    pub modules: BTreeMap<ModuleKind, Modifier>,
    pub steps: Steps,
}

impl AnimationLayer {
    pub fn is_empty(&self) -> bool {
        self.path.is_empty() && self.modules.is_empty() && self.steps == Steps::Finite(0)
    }
}

/// Index-keyed table of animation layers plus the runtime playback cursor.
/// Layers are addressed by the Configure cursor during setup; during render
/// the playback cursor walks them in index order, consuming one step per
/// resolved frame and skipping exhausted layers.
#[derive(Debug, Default)]
pub struct AnimationSet {
    layers: BTreeMap<u32, AnimationLayer>,
    current: u32,
    consumed: u64,
}

impl AnimationSet {
    pub fn layer_mut(&mut self, index: u32) -> &mut AnimationLayer {
        self.layers.entry(index).or_default()
    }

    pub fn layer(&self, index: u32) -> Option<&AnimationLayer> {
        self.layers.get(&index)
    }

    pub fn reset_layer(&mut self, index: u32) {
        self.layers.insert(index, AnimationLayer::default());
    }

    pub fn len_layers(&self) -> usize {
        self.layers.len()
    }

    /// Advance the playback cursor past exhausted layers and return the index
    /// of the active one, or `None` when every remaining layer is spent.
    pub fn advance_to_active(&mut self) -> Option<u32> {
        loop {
            let (&index, layer) = self.layers.range(self.current..).next()?;
            if index != self.current {
                self.current = index;
                self.consumed = 0;
            }
            if layer.steps.allows(self.consumed) {
                return Some(index);
            }
            self.current = index.checked_add(1)?;
            self.consumed = 0;
        }
    }

    pub fn active_layer_mut(&mut self) -> Option<(u32, &mut AnimationLayer)> {
        let index = self.advance_to_active()?;
        let layer = self.layers.get_mut(&index)?;
        Some((index, layer))
    }

    /// One resolved frame consumes one step of the active layer.
    pub fn consume_step(&mut self) {
        self.consumed = self.consumed.saturating_add(1);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    /// Static image (or procedurally generated texture) drawn by the canvas.
    Image { source: Option<std::path::PathBuf> },
    /// Emits drawables of its own (particles and the like); positioned and
    /// modified through the same animation table as images.
    Generator,
}

/// A canvas-bound entity the timeline engine animates. Pixel content is
/// opaque to the core; only the animation table is manipulated here.
#[derive(Debug)]
pub struct SceneObject {
    pub name: String,
    pub kind: ObjectKind,
    pub animation: AnimationSet,
    pub(crate) cursor: u32,
}

impl SceneObject {
    pub fn image(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Image { source: None },
            animation: AnimationSet::default(),
            cursor: 0,
        }
    }

    pub fn generator(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Generator,
            animation: AnimationSet::default(),
            cursor: 0,
        }
    }

    /// Builder façade addressing this object's animation table. The cursor
    /// persists on the object across `configure()` calls.
    pub fn configure(&mut self) -> Configure<'_> {
        Configure::new(self)
    }
}

/// The whole render: canvas geometry, timing, and objects grouped into
/// ascending z-layers (0 drawn first). Built once during setup, then read
/// frame-sequentially by the evaluator; the two phases never interleave.
#[derive(Debug)]
pub struct Scene {
    pub fps: Fps,
    pub canvas: Canvas,
    pub duration: FrameIndex,
    layers: BTreeMap<u32, Vec<SceneObject>>,
}

impl Scene {
    pub fn new(fps: Fps, canvas: Canvas, duration: FrameIndex) -> SonovizResult<Self> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(SonovizError::configuration(
                "canvas width/height must be > 0",
            ));
        }
        if duration.0 == 0 {
            return Err(SonovizError::configuration("duration must be > 0 frames"));
        }
        Ok(Self {
            fps,
            canvas,
            duration,
            layers: BTreeMap::new(),
        })
    }

    /// Add an object to a z-layer; ascending layers are resolved first-to-last,
    /// insertion order within a layer.
    pub fn add(&mut self, object: SceneObject, layer: u32) {
        tracing::debug!(object = %object.name, layer, "scene add");
        self.layers.entry(layer).or_default().push(object);
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = (u32, &mut SceneObject)> {
        self.layers
            .iter_mut()
            .flat_map(|(&z, objs)| objs.iter_mut().map(move |o| (z, o)))
    }

    pub fn objects(&self) -> impl Iterator<Item = (u32, &SceneObject)> {
        self.layers
            .iter()
            .flat_map(|(&z, objs)| objs.iter().map(move |o| (z, o)))
    }

    pub fn len_objects(&self) -> usize {
        self.layers.values().map(Vec::len).sum()
    }
}
