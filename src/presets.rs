//! Ready-made grammars and reference meshes.
//!
//! Species tables normally live with the scene builder; these presets cover
//! the textbook systems plus one parametric tree used by the demo binary.

use crate::interpreter::InterpreterConfig;
use crate::lsystem::LSystem;
use crate::mesh::Mesh;
use crate::plant::{GrowthConfig, PlantGenerator};
use crate::production::Production;
use crate::symbol::Symbol;
use glam::{Vec2, Vec3};

/// Lindenmayer's algae: `A -> AB`, `B -> A`.
pub fn algae() -> LSystem {
    LSystem::new([Symbol::atom('A')])
        .with_production(Production::new([Symbol::atom('A')], [Symbol::atom('A'), Symbol::atom('B')]))
        .with_production(Production::new([Symbol::atom('B')], [Symbol::atom('A')]))
}

/// Bracketed plant: `X -> F[+X][-X]FX`, `F -> FF`, branch symbols ignored.
pub fn fractal_plant() -> LSystem {
    let atoms = |s: &str| s.chars().map(Symbol::atom).collect::<Vec<_>>();
    LSystem::new(atoms("X"))
        .ignore(['[', ']', '+', '-'])
        .with_production(Production::new(atoms("X"), atoms("F[+X][-X]FX")))
        .with_production(Production::new(atoms("F"), atoms("FF")))
}

/// Default growth settings for [`fractal_plant`].
pub fn fractal_plant_growth() -> GrowthConfig {
    GrowthConfig {
        min_iterations: 4,
        max_iterations: 5,
        interpreter: InterpreterConfig {
            num_edges: 6,
            default_step: 0.5,
            default_angle: 25.7f32.to_radians(),
            default_radius: 1.0,
            ..InterpreterConfig::default()
        },
    }
}

/// Turtle for [`fractal_plant`] grown with `config`.
pub fn fractal_plant_generator(config: GrowthConfig) -> PlantGenerator {
    PlantGenerator::new(fractal_plant(), config).turtle_ignores(['X'])
}

/// Stochastic parametric tree with gravitropism and leaves.
///
/// `A(w)` is an apex of width `w` and `B(w)` a lateral bud. Apices either
/// fork into two buds (p = 0.7) or grow straight with a twist (p = 0.3).
/// Organs thinner than 0.05 turn into leaves. Internodes lengthen by 10%
/// per generation.
pub fn leafy_tree() -> LSystem {
    const THIN: f64 = 0.05;
    let w = |v: &crate::symbol::Variables| v["w"];

    LSystem::new([
        Symbol::value('T', [0.0, -1.0, 0.0, 0.12]),
        Symbol::value('!', [0.5]),
        Symbol::value('F', [1.5]),
        Symbol::value('A', [0.5]),
    ])
    .ignore(['[', ']', '+', '-', '&', '^', '/', '\\', '!', 'T', '~'])
    .with_production(
        Production::new(
            [Symbol::pattern('A', ["w"])],
            [
                Symbol::expr('!', ["w"], move |v| vec![w(v)]),
                Symbol::value('F', [1.0]),
                Symbol::atom('['),
                Symbol::value('&', [35.0]),
                Symbol::expr('B', ["w"], move |v| vec![w(v) * 0.6]),
                Symbol::atom(']'),
                Symbol::value('/', [137.5]),
                Symbol::atom('['),
                Symbol::value('&', [35.0]),
                Symbol::expr('B', ["w"], move |v| vec![w(v) * 0.6]),
                Symbol::atom(']'),
                Symbol::expr('A', ["w"], move |v| vec![w(v) * 0.8]),
            ],
        )
        .when(move |v| w(v) > THIN)
        .with_probability(0.7),
    )
    .with_production(
        Production::new(
            [Symbol::pattern('A', ["w"])],
            [
                Symbol::expr('!', ["w"], move |v| vec![w(v)]),
                Symbol::value('F', [1.2]),
                Symbol::value('/', [90.0]),
                Symbol::expr('A', ["w"], move |v| vec![w(v) * 0.85]),
            ],
        )
        .when(move |v| w(v) > THIN)
        .with_probability(0.3),
    )
    .with_production(
        Production::new([Symbol::pattern('A', ["w"])], [Symbol::value('~', [0.0])])
            .when(move |v| w(v) <= THIN),
    )
    .with_production(
        Production::new(
            [Symbol::pattern('B', ["w"])],
            [
                Symbol::expr('!', ["w"], move |v| vec![w(v)]),
                Symbol::value('F', [0.8]),
                Symbol::atom('['),
                Symbol::value('+', [30.0]),
                Symbol::expr('B', ["w"], move |v| vec![w(v) * 0.6]),
                Symbol::atom(']'),
                Symbol::atom('['),
                Symbol::value('-', [30.0]),
                Symbol::expr('B', ["w"], move |v| vec![w(v) * 0.6]),
                Symbol::atom(']'),
                Symbol::value('~', [0.0]),
            ],
        )
        .when(move |v| w(v) > THIN),
    )
    .with_production(
        Production::new([Symbol::pattern('B', ["w"])], [Symbol::value('~', [0.0])])
            .when(move |v| w(v) <= THIN),
    )
    .with_production(Production::new(
        [Symbol::pattern('F', ["l"])],
        [Symbol::expr('F', ["l"], |v| vec![v["l"] * 1.1])],
    ))
}

/// Default growth settings for [`leafy_tree`].
pub fn leafy_tree_growth() -> GrowthConfig {
    GrowthConfig {
        min_iterations: 5,
        max_iterations: 7,
        interpreter: InterpreterConfig {
            num_edges: 8,
            default_step: 1.0,
            default_angle: 30.0f32.to_radians(),
            default_radius: 1.0,
            ..InterpreterConfig::default()
        },
    }
}

/// Turtle and leaf mesh for [`leafy_tree`] grown with `config`.
pub fn leafy_tree_generator(config: GrowthConfig) -> PlantGenerator {
    PlantGenerator::new(leafy_tree(), config)
        .turtle_ignores(['A', 'B'])
        .with_sub_model(leaf_quad(0.3, 0.6))
}

/// A flat leaf of the given size growing along +Y with its face toward +Z.
pub fn leaf_quad(width: f32, length: f32) -> Mesh {
    let hw = width * 0.5;
    Mesh {
        positions: vec![
            Vec3::new(-hw, 0.0, 0.0),
            Vec3::new(hw, 0.0, 0.0),
            Vec3::new(hw, length, 0.0),
            Vec3::new(-hw, length, 0.0),
        ],
        normals: vec![Vec3::Z; 4],
        uvs: vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}
