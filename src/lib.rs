//! # symbios-flora
//!
//! Procedural plant geometry from stochastic, parametric L-Systems.
//!
//! The pipeline has three stages. An [`LSystem`] rewrites an axiom for a number
//! of generations, breaking production ties with a caller-supplied RNG. A
//! [`TurtleInterpreter`] walks the derived word and records a trace of tube
//! cross-sections plus sub-model placements. [`assemble_tube`] and
//! [`instance_sub_models`] turn that trace into indexed triangle meshes ready
//! for a renderer. [`PlantGenerator`] runs all three for one plant instance.
//!
//! Output depends only on the grammar and the order of RNG draws; give every
//! concurrently generated instance its own stream (see [`seed::instance_rng`]).

pub mod error;
pub mod interpreter;
pub mod lsystem;
pub mod mesh;
pub mod plant;
pub mod presets;
pub mod production;
pub mod sampling;
pub mod seed;
pub mod symbol;
pub mod turtle;

pub use error::*;
pub use interpreter::*;
pub use lsystem::*;
pub use mesh::*;
pub use plant::*;
pub use production::*;
pub use symbol::*;
pub use turtle::*;
