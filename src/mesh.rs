//! Mesh assembly: generalized cylinders from a ring trace, and instanced
//! copies of reference sub-meshes at injected poses.

use crate::error::{FloraError, Result, SubModelSite};
use crate::interpreter::{InjectedModelReference, TurtleTrace};
use bevy_math::bounding::Aabb3d;
use bevy_math::{Isometry3d, Vec3A};
use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Indexed triangle mesh handed to the rendering side.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    /// Triangle list, 3 indices per triangle.
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Quad count of a mesh built by [`assemble_tube`]; each side face is
    /// two triangles.
    pub fn side_faces(&self) -> usize {
        self.indices.len() / 6
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// True when the attribute arrays agree in length and every index
    /// addresses an existing vertex.
    pub fn is_valid(&self) -> bool {
        let n = self.positions.len();
        self.normals.len() == n
            && self.uvs.len() == n
            && self.indices.len() % 3 == 0
            && self.indices.iter().all(|&i| (i as usize) < n)
    }

    /// Appends `other`, offsetting its indices past the existing vertices.
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.positions.len() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.uvs.extend_from_slice(&other.uvs);
        self.indices.extend(other.indices.iter().map(|i| i + offset));
    }

    /// Returns a copy rotated by `rotation` and then moved to `translation`.
    pub fn transformed(&self, rotation: Quat, translation: Vec3) -> Mesh {
        Mesh {
            positions: self
                .positions
                .iter()
                .map(|&p| translation + rotation * p)
                .collect(),
            normals: self.normals.iter().map(|&n| rotation * n).collect(),
            uvs: self.uvs.clone(),
            indices: self.indices.clone(),
        }
    }

    /// Axis-aligned bounds of all vertices, `None` for a vertexless mesh.
    pub fn bounds(&self) -> Option<Aabb3d> {
        if self.positions.is_empty() {
            return None;
        }
        Some(Aabb3d::from_point_cloud(
            Isometry3d::IDENTITY,
            self.positions.iter().map(|p| Vec3A::from_array(p.to_array())),
        ))
    }

    /// Greatest distance of any vertex from the line through `origin` along
    /// `axis`. Returns 0 for an empty mesh or a zero axis.
    pub fn radial_extent(&self, origin: Vec3, axis: Vec3) -> f32 {
        let Some(axis) = axis.try_normalize() else {
            return 0.0;
        };
        self.positions
            .iter()
            .map(|&p| {
                let d = p - origin;
                (d - axis * d.dot(axis)).length()
            })
            .fold(0.0, f32::max)
    }
}

/// Builds the smooth-shaded tube mesh for every sublist of `trace`.
///
/// Each ring contributes its `num_edges` perimeter points as vertices. Every
/// pair of consecutive rings in a sublist is joined by `num_edges` quads, each
/// split into the triangles `(a, b, c)` and `(a, c, d)`. Vertex normals are
/// the normalized sum of the face normals around them, or the direction away
/// from the ring centre where every surrounding face is degenerate. `u` runs
/// around the perimeter (`edge / num_edges`), `v` along the sublist
/// (`ring / (rings - 1)`).
pub fn assemble_tube(trace: &TurtleTrace) -> Mesh {
    let n = trace.num_edges;
    let mut mesh = Mesh::default();
    if n == 0 {
        return mesh;
    }

    for sublist in &trace.sublists {
        let rings = sublist.len();
        if rings < 2 {
            continue;
        }
        let base = mesh.positions.len();

        for (r, ring) in sublist.iter().enumerate() {
            let v = r as f32 / (rings - 1) as f32;
            for (e, &p) in ring.iter().skip(1).take(n).enumerate() {
                mesh.positions.push(p);
                mesh.uvs.push(Vec2::new(e as f32 / n as f32, v));
            }
        }

        let mut accumulated = vec![Vec3::ZERO; rings * n];
        for r in 0..rings - 1 {
            for e in 0..n {
                let a = r * n + e;
                let b = r * n + (e + 1) % n;
                let c = (r + 1) * n + (e + 1) % n;
                let d = (r + 1) * n + e;

                let pos = |i: usize| mesh.positions[base + i];
                // Diagonal cross product stays stable on twisted quads.
                let normal = (pos(c) - pos(a)).cross(pos(d) - pos(b)).normalize_or_zero();
                for i in [a, b, c, d] {
                    accumulated[i] += normal;
                }

                mesh.indices.extend(
                    [a, b, c, a, c, d]
                        .into_iter()
                        .map(|i| (base + i) as u32),
                );
            }
        }
        // Vertices touching only zero-area faces (coincident rings) face
        // straight out from their ring centre.
        for (i, normal) in accumulated.into_iter().enumerate() {
            let p = mesh.positions[base + i];
            let radial = p - sublist[i / n][0];
            mesh.normals
                .push(normal.try_normalize().unwrap_or_else(|| radial.normalize_or_zero()));
        }
    }

    debug!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "tube assembled"
    );
    mesh
}

/// Places a copy of the referenced sub-mesh at every injected pose.
///
/// Produces one combined mesh per referenced index, sorted by index, so each
/// sub-model costs a single renderable regardless of how many copies it has.
pub fn instance_sub_models(
    references: &[InjectedModelReference],
    sub_models: &[Mesh],
) -> Result<Vec<(usize, Mesh)>> {
    let mut combined: BTreeMap<usize, Mesh> = BTreeMap::new();

    for (slot, reference) in references.iter().enumerate() {
        let source = sub_models.get(reference.index).ok_or(
            FloraError::InvalidSubModelReference {
                index: reference.index as f64,
                available: sub_models.len(),
                site: SubModelSite::Placement(slot),
            },
        )?;
        let copy = source.transformed(reference.rotation(), reference.position);
        combined.entry(reference.index).or_default().merge(&copy);
    }

    Ok(combined.into_iter().collect())
}
