//! End-to-end generation of one plant instance: derive, interpret, assemble.

use crate::error::{FloraError, Result};
use crate::interpreter::{InterpreterConfig, TurtleInterpreter};
use crate::lsystem::LSystem;
use crate::mesh::{Mesh, assemble_tube, instance_sub_models};
use bevy_math::bounding::{Aabb3d, BoundingVolume};
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Per-species growth settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Fewest derivation steps an instance may receive.
    pub min_iterations: usize,
    /// Most derivation steps an instance may receive.
    pub max_iterations: usize,
    pub interpreter: InterpreterConfig,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            min_iterations: 4,
            max_iterations: 4,
            interpreter: InterpreterConfig::default(),
        }
    }
}

impl GrowthConfig {
    /// Parses a RON document, falling back to defaults for missing fields.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(FloraError::Config)
    }
}

/// Geometry of one generated plant.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlantMesh {
    /// Derivation steps that produced this instance.
    pub generations: usize,
    /// Length of the interpreted word.
    pub symbol_count: usize,
    /// Trunk and branches as one generalized-cylinder mesh.
    pub tube: Mesh,
    /// One combined mesh per injected sub-model index.
    pub sub_meshes: Vec<(usize, Mesh)>,
}

/// Extremal measurements a placement system can use to space instances.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    /// Widest tube vertex distance from the vertical axis near the base.
    pub base_radius: f32,
    /// Widest vertex distance from the vertical axis over the whole plant.
    pub canopy_radius: f32,
    pub height: f32,
}

impl PlantMesh {
    /// Bounds of the tube and every sub-mesh together.
    pub fn bounds(&self) -> Option<Aabb3d> {
        std::iter::once(&self.tube)
            .chain(self.sub_meshes.iter().map(|(_, m)| m))
            .filter_map(Mesh::bounds)
            .reduce(|a, b| a.merge(&b))
    }

    /// Measures the plant around the vertical axis through the origin.
    ///
    /// Tube vertices within `base_band` of the lowest point count toward
    /// `base_radius`.
    pub fn footprint(&self, base_band: f32) -> Footprint {
        let Some(bounds) = self.bounds() else {
            return Footprint {
                base_radius: 0.0,
                canopy_radius: 0.0,
                height: 0.0,
            };
        };
        let floor = bounds.min.y + base_band;
        let base = Mesh {
            positions: self
                .tube
                .positions
                .iter()
                .copied()
                .filter(|p| p.y <= floor)
                .collect(),
            ..Mesh::default()
        };
        let canopy_radius = std::iter::once(&self.tube)
            .chain(self.sub_meshes.iter().map(|(_, m)| m))
            .map(|m| m.radial_extent(Vec3::ZERO, Vec3::Y))
            .fold(0.0, f32::max);

        Footprint {
            base_radius: base.radial_extent(Vec3::ZERO, Vec3::Y),
            canopy_radius,
            height: bounds.max.y - bounds.min.y,
        }
    }
}

/// A species: grammar, turtle, reference sub-meshes and growth settings.
#[derive(Clone, Debug)]
pub struct PlantGenerator {
    lsystem: LSystem,
    interpreter: TurtleInterpreter,
    sub_models: Vec<Mesh>,
    config: GrowthConfig,
}

impl PlantGenerator {
    /// Creates a generator interpreting with the standard turtle symbols.
    pub fn new(lsystem: LSystem, config: GrowthConfig) -> Self {
        let interpreter = TurtleInterpreter::new(config.interpreter.clone()).with_standard_symbols();
        Self {
            lsystem,
            interpreter,
            sub_models: Vec::new(),
            config,
        }
    }

    /// Grammar-only symbols the turtle should skip.
    pub fn turtle_ignores(mut self, names: impl IntoIterator<Item = char>) -> Self {
        self.interpreter = self.interpreter.ignore(names);
        self
    }

    /// Registers a reference mesh for `~(index)`, indices counting from 0.
    pub fn with_sub_model(mut self, mesh: Mesh) -> Self {
        self.sub_models.push(mesh);
        self.interpreter = self.interpreter.with_sub_model_count(self.sub_models.len());
        self
    }

    pub fn config(&self) -> &GrowthConfig {
        &self.config
    }

    pub fn lsystem(&self) -> &LSystem {
        &self.lsystem
    }

    /// Grows one instance.
    ///
    /// The iteration count is the first draw from `rng`, followed by every
    /// production tie-break. Each call derives on its own copy of the grammar
    /// state, so the generator itself is never mutated. Any error aborts the
    /// instance before geometry is returned.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<PlantMesh> {
        let mut lsystem = self.lsystem.clone();
        lsystem.reset();
        lsystem.derive_range(self.config.min_iterations..=self.config.max_iterations, rng)?;

        let trace = self.interpreter.interpret(lsystem.state())?;
        let tube = assemble_tube(&trace);
        let sub_meshes = instance_sub_models(&trace.injections, &self.sub_models)?;

        info!(
            generations = lsystem.generation(),
            symbols = lsystem.state().len(),
            vertices = tube.vertex_count(),
            sub_meshes = sub_meshes.len(),
            "plant generated"
        );
        Ok(PlantMesh {
            generations: lsystem.generation(),
            symbol_count: lsystem.state().len(),
            tube,
            sub_meshes,
        })
    }
}
