// tests/mesh_assembly.rs
use glam::{Quat, Vec2, Vec3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use symbios_flora::presets;
use symbios_flora::{
    FloraError, InjectedModelReference, InterpreterConfig, Mesh, SubModelSite, TurtleInterpreter,
    TurtleTrace, assemble_tube, instance_sub_models, parse_word,
};

const EPS: f32 = 1e-5;

fn square_interpreter() -> TurtleInterpreter {
    TurtleInterpreter::new(InterpreterConfig {
        num_edges: 4,
        ..InterpreterConfig::default()
    })
    .with_standard_symbols()
}

fn trace_of(word: &str) -> TurtleTrace {
    square_interpreter()
        .interpret(&parse_word(word).unwrap())
        .unwrap()
}

#[test]
fn test_straight_tube_layout() {
    let mesh = assemble_tube(&trace_of("FFF"));

    assert!(mesh.is_valid());
    assert_eq!(mesh.vertex_count(), 16);
    // 3 segments x 4 quads x 2 triangles.
    assert_eq!(mesh.side_faces(), 12);
    assert_eq!(mesh.triangle_count(), 24);

    // Corners average their two adjacent side faces.
    let diagonal = Vec3::new(1.0, 0.0, 1.0).normalize();
    assert!(mesh.normals[0].abs_diff_eq(diagonal, EPS));
    assert!(mesh.normals[4].abs_diff_eq(diagonal, EPS));

    // Every normal points away from the axis.
    for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
        let radial = Vec3::new(p.x, 0.0, p.z);
        assert!(n.dot(radial) > 0.0);
        assert!((n.length() - 1.0).abs() < EPS);
    }

    assert_eq!(mesh.uvs[0], Vec2::new(0.0, 0.0));
    assert_eq!(mesh.uvs[3], Vec2::new(0.75, 0.0));
    assert!(mesh.uvs[4 * 3 + 2].abs_diff_eq(Vec2::new(0.5, 1.0), EPS));
    assert!(mesh.uvs[4 + 1].abs_diff_eq(Vec2::new(0.25, 1.0 / 3.0), EPS));
}

#[test]
fn test_first_triangles_wind_outward() {
    let mesh = assemble_tube(&trace_of("F"));
    assert_eq!(&mesh.indices[..6], &[0, 1, 5, 0, 5, 4]);

    let [a, b, c] = [0, 1, 2].map(|i| mesh.positions[mesh.indices[i] as usize]);
    let face = (b - a).cross(c - a);
    assert!(face.x > 0.0);
}

#[test]
fn test_sublists_are_never_joined() {
    let mut lsystem = presets::fractal_plant();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    lsystem.derive(3, &mut rng).unwrap();

    let interpreter = square_interpreter().ignore(['X']);
    let trace = interpreter.interpret(lsystem.state()).unwrap();
    assert!(trace.sublists.len() > 1);

    let mesh = assemble_tube(&trace);
    assert!(mesh.is_valid());

    let n = trace.num_edges;
    let expected_faces: usize = trace
        .sublists
        .iter()
        .map(|rings| n * rings.len().saturating_sub(1))
        .sum();
    assert_eq!(mesh.side_faces(), expected_faces);

    let mut vertex_base = 0usize;
    let mut index_base = 0usize;
    for rings in trace.sublists.iter().filter(|s| s.len() >= 2) {
        let vertices = rings.len() * n;
        let faces = n * (rings.len() - 1);
        let slice = &mesh.indices[index_base..index_base + faces * 6];
        assert!(
            slice
                .iter()
                .all(|&i| (vertex_base..vertex_base + vertices).contains(&(i as usize)))
        );
        vertex_base += vertices;
        index_base += faces * 6;
    }
    assert_eq!(index_base, mesh.indices.len());
    assert_eq!(vertex_base, mesh.vertex_count());
}

#[test]
fn test_normals_are_unit_length_around_coincident_rings() {
    // `!` at the seed ring, a roll re-appending its ring, and a lone roll
    // whose only segment has zero length.
    for word in ["!(0.5)F", "F/F", "/", "F!(0.5)F"] {
        let mesh = assemble_tube(&trace_of(word));
        assert!(mesh.is_valid());
        for (i, n) in mesh.normals.iter().enumerate() {
            assert!((n.length() - 1.0).abs() < EPS, "{word}: normal {i} is {n:?}");
        }
    }

    // A degenerate segment falls back to the outward radial direction.
    let mesh = assemble_tube(&trace_of("/"));
    let diagonal = Vec3::new(1.0, 0.0, 1.0).normalize();
    assert!(mesh.normals[0].abs_diff_eq(diagonal, EPS));
}

#[test]
fn test_bounds_and_radial_extent() {
    let mesh = assemble_tube(&trace_of("FFF"));
    let bounds = mesh.bounds().unwrap();
    assert!(Vec3::from_array(bounds.min.to_array()).abs_diff_eq(Vec3::new(-0.5, 0.0, -0.5), EPS));
    assert!(Vec3::from_array(bounds.max.to_array()).abs_diff_eq(Vec3::new(0.5, 3.0, 0.5), EPS));

    let r = mesh.radial_extent(Vec3::ZERO, Vec3::Y);
    assert!((r - 0.5f32.hypot(0.5)).abs() < EPS);

    assert!(Mesh::default().bounds().is_none());
    assert_eq!(Mesh::default().radial_extent(Vec3::ZERO, Vec3::Y), 0.0);
}

#[test]
fn test_sub_models_are_instanced_per_index() {
    let leaf = presets::leaf_quad(0.2, 1.0);
    let triangle = Mesh {
        positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        normals: vec![Vec3::Z; 3],
        uvs: vec![Vec2::ZERO; 3],
        indices: vec![0, 1, 2],
    };

    let refs = [
        InjectedModelReference {
            index: 0,
            position: Vec3::new(0.0, 2.0, 0.0),
            heading: Vec3::Y,
            up: Vec3::Z,
        },
        InjectedModelReference {
            index: 1,
            position: Vec3::ZERO,
            heading: Vec3::Y,
            up: Vec3::Z,
        },
        InjectedModelReference {
            index: 0,
            position: Vec3::new(1.0, 0.0, 0.0),
            heading: Vec3::X,
            up: Vec3::Z,
        },
    ];

    let combined = instance_sub_models(&refs, &[leaf.clone(), triangle]).unwrap();
    assert_eq!(combined.len(), 2);

    let (index, leaves) = &combined[0];
    assert_eq!(*index, 0);
    assert!(leaves.is_valid());
    assert_eq!(leaves.vertex_count(), 8);
    assert_eq!(&leaves.indices[6..], &[4, 5, 6, 4, 6, 7]);

    // First copy is only translated.
    assert!(leaves.positions[2].abs_diff_eq(Vec3::new(0.1, 3.0, 0.0), EPS));
    // Second copy grows along +X with its face still toward +Z.
    assert!(leaves.positions[7].abs_diff_eq(Vec3::new(2.0, 0.1, 0.0), EPS));
    assert!(leaves.normals[7].abs_diff_eq(Vec3::Z, EPS));

    let (index, triangles) = &combined[1];
    assert_eq!(*index, 1);
    assert_eq!(triangles.triangle_count(), 1);
}

#[test]
fn test_reference_rotation_matches_frame() {
    let reference = InjectedModelReference {
        index: 0,
        position: Vec3::ZERO,
        heading: Vec3::NEG_X,
        up: Vec3::Y,
    };
    let rot: Quat = reference.rotation();
    assert!((rot * Vec3::Y).abs_diff_eq(Vec3::NEG_X, EPS));
    assert!((rot * Vec3::Z).abs_diff_eq(Vec3::Y, EPS));
}

#[test]
fn test_unknown_sub_model_is_rejected() {
    let refs = [InjectedModelReference {
        index: 2,
        position: Vec3::ZERO,
        heading: Vec3::Y,
        up: Vec3::Z,
    }];
    assert!(matches!(
        instance_sub_models(&refs, &[Mesh::default()]),
        Err(FloraError::InvalidSubModelReference {
            index,
            available: 1,
            site: SubModelSite::Placement(0),
        }) if index == 2.0
    ));
}

#[test]
fn test_merge_offsets_indices() {
    let mut mesh = assemble_tube(&trace_of("F"));
    let other = assemble_tube(&trace_of("F"));
    let before = mesh.vertex_count() as u32;
    mesh.merge(&other);

    assert!(mesh.is_valid());
    assert_eq!(mesh.indices[other.indices.len()], before);
}
