//! Drawer configuration.
//!
//! Every table deserializes from TOML with all fields defaulted:
//!
//! ```toml
//! count = 5000
//! always_update = true
//!
//! [draw]
//! material = 3
//! occlusion_culling = true
//! mesh = { index_count = 36, submesh_count = 1, triangle_count = 12 }
//!
//! [distribution]
//! kind = "disc"
//! radius = 20.0
//! seed = 1234
//! ```

use scatter_core::{DiscProperties, SphereProperties};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::culling::{CameraView, CullPolicy};
use crate::error::{DrawError, DrawResult};

/// Highest render layer index accepted.
pub const MAX_LAYER: u8 = 11;

/// Handle to a material owned by the host renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialId(pub u64);

/// Index range of the mesh (submesh) drawn per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshInfo {
    /// Indices per instance.
    pub index_count: u32,
    /// First index in the index buffer.
    pub index_start: u32,
    /// Vertex offset added to each index.
    pub base_vertex: i32,
    /// Number of submeshes in the mesh.
    pub submesh_count: u32,
    /// Triangle count, when the mesh data is CPU-readable.
    pub triangle_count: Option<u32>,
}

impl Default for MeshInfo {
    fn default() -> Self {
        Self {
            index_count: 0,
            index_start: 0,
            base_vertex: 0,
            submesh_count: 1,
            triangle_count: None,
        }
    }
}

/// How the backend issues the draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    /// Indexed indirect draw with GPU-side arguments.
    #[default]
    InstancedIndirect,
    /// Direct instanced primitive draw.
    RenderMeshPrimitives,
}

/// Shadow casting behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowCastingMode {
    /// No shadows.
    #[default]
    Off,
    /// Single-sided shadows.
    On,
    /// Double-sided shadows.
    TwoSided,
    /// Shadows only, the mesh itself is invisible.
    ShadowsOnly,
}

/// Light probe sampling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightProbeUsage {
    /// No probes.
    #[default]
    Off,
    /// Interpolated probes.
    BlendProbes,
    /// Probe proxy volume.
    UseProxyVolume,
}

/// Reflection probe sampling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReflectionProbeUsage {
    /// No probes.
    #[default]
    Off,
    /// Blend between probes.
    BlendProbes,
    /// Blend probes and skybox.
    BlendProbesAndSkybox,
    /// Nearest probe only.
    Simple,
}

/// Motion vector generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionVectorMode {
    /// Camera motion only.
    Camera,
    /// Per-object motion.
    Object,
    /// No motion vectors.
    #[default]
    ForceNoMotion,
}

/// Everything the backend needs to issue the draw besides instance data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawParams {
    /// Mesh drawn per instance.
    pub mesh: Option<MeshInfo>,
    /// Material drawn with.
    pub material: Option<MaterialId>,
    /// Mesh bounding radius used by culling.
    pub mesh_radius: f32,
    /// Draw mode.
    pub draw_mode: DrawMode,
    /// Submesh to draw.
    pub submesh_index: u32,
    /// Shadow casting.
    pub cast_shadows: ShadowCastingMode,
    /// Receive shadows.
    pub receive_shadows: bool,
    /// Render layer, `0..=MAX_LAYER`.
    pub layer: u8,
    /// Enables frustum culling when a camera is set.
    pub occlusion_culling: bool,
    /// Camera to cull against. Runtime only.
    #[serde(skip)]
    pub camera: Option<CameraView>,
    /// Light probe sampling.
    pub light_probe_usage: LightProbeUsage,
    /// Rendering layer mask.
    pub rendering_layer_mask: u32,
    /// Sorting priority.
    pub renderer_priority: i32,
    /// Reflection probe sampling.
    pub reflection_probe_usage: ReflectionProbeUsage,
    /// Motion vector generation.
    pub motion_vector_mode: MotionVectorMode,
    /// Planes used by the inside test.
    pub cull_policy: CullPolicy,
    /// Triangle count recorded by [`DrawParams::validate`].
    #[serde(skip)]
    pub mesh_triangle_count: Option<u32>,
}

impl Default for DrawParams {
    fn default() -> Self {
        Self {
            mesh: None,
            material: None,
            mesh_radius: 1.0,
            draw_mode: DrawMode::default(),
            submesh_index: 0,
            cast_shadows: ShadowCastingMode::default(),
            receive_shadows: false,
            layer: 0,
            occlusion_culling: false,
            camera: None,
            light_probe_usage: LightProbeUsage::default(),
            rendering_layer_mask: 1,
            renderer_priority: 0,
            reflection_probe_usage: ReflectionProbeUsage::default(),
            motion_vector_mode: MotionVectorMode::default(),
            cull_policy: CullPolicy::default(),
            mesh_triangle_count: None,
        }
    }
}

impl DrawParams {
    /// Mesh and material are both present.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.mesh.is_some() && self.material.is_some()
    }

    /// Culling runs only when requested and a camera is available.
    #[must_use]
    pub fn culling_enabled(&self) -> bool {
        self.occlusion_culling && self.camera.is_some()
    }

    /// Clamps out-of-range fields and records the mesh triangle count.
    pub fn validate(&mut self) {
        if self.layer > MAX_LAYER {
            warn!(layer = self.layer, "render layer clamped to {MAX_LAYER}");
            self.layer = MAX_LAYER;
        }

        let Some(mesh) = self.mesh else {
            self.mesh_triangle_count = None;
            return;
        };

        let last_submesh = mesh.submesh_count.saturating_sub(1);
        if self.submesh_index > last_submesh {
            warn!(
                submesh_index = self.submesh_index,
                submesh_count = mesh.submesh_count,
                "submesh index clamped"
            );
            self.submesh_index = last_submesh;
        }

        if mesh.triangle_count.is_none() {
            warn!("mesh is not CPU-readable, triangle statistics unavailable");
        }
        self.mesh_triangle_count = mesh.triangle_count;
    }
}

/// Which stock distribution feeds the drawer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DistributionConfig {
    /// Thick disc.
    Disc(DiscProperties),
    /// Sphere shell or volume.
    Sphere(SphereProperties),
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self::Disc(DiscProperties::default())
    }
}

/// Diagnostics switches and the last measured update time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugParams {
    /// Log every update at debug level.
    pub show_logs: bool,
    /// Measure update time even when logs are off.
    pub benchmark: bool,
    /// Duration of the last buffer update.
    #[serde(skip)]
    pub exec_time_ms: f64,
}

impl DebugParams {
    /// Last update time formatted for display.
    #[must_use]
    pub fn exec_time_label(&self) -> String {
        format!("{:.3} ms", self.exec_time_ms)
    }
}

/// Full configuration of one drawer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawerConfig {
    /// Requested instance count.
    pub count: usize,
    /// Regenerate every tick instead of on request.
    pub always_update: bool,
    /// Draw parameters.
    pub draw: DrawParams,
    /// Diagnostics.
    pub debug: DebugParams,
    /// Stock distribution, used by drawers built with
    /// [`InstancedDrawer::from_config`](crate::InstancedDrawer::from_config).
    pub distribution: DistributionConfig,
}

impl Default for DrawerConfig {
    fn default() -> Self {
        Self {
            count: 1000,
            always_update: true,
            draw: DrawParams::default(),
            debug: DebugParams::default(),
            distribution: DistributionConfig::default(),
        }
    }
}

impl DrawerConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::InvalidConfig`] when the document does not parse.
    pub fn from_toml_str(source: &str) -> DrawResult<Self> {
        toml::from_str(source).map_err(|e| DrawError::InvalidConfig(e.to_string()))
    }

    /// Serializes to a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::InvalidConfig`] when serialization fails.
    pub fn to_toml_string(&self) -> DrawResult<String> {
        toml::to_string(self).map_err(|e| DrawError::InvalidConfig(e.to_string()))
    }
}
