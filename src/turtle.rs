//! Turtle state and operations for generalized-cylinder interpretation.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// A cross-section of the tube: the centre followed by `num_edges` perimeter
/// points, always in the same winding order.
pub type Ring = Vec<Vec3>;

/// Offset of perimeter point 0 from the centre at radius 1, in the turtle's
/// local frame (heading along +Y).
const RING_TEMPLATE: Vec3 = Vec3::new(0.5, 0.0, 0.5);

/// The state of the Plant Turtle.
///
/// Tracks position, orientation, current radius, and the ring that the next
/// `F` will extrude. Snapshots pushed on `[` are plain deep copies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurtleState {
    /// Current world-space position of the "cursor".
    pub position: Vec3,

    /// Current world-space orientation.
    pub rotation: Quat,

    /// Current tube radius (modified by `!`).
    pub radius: f32,

    /// Current cross-section, positioned at `position`.
    pub ring: Ring,
}

impl TurtleState {
    /// Creates a turtle at `position` facing `+Y` with up `+Z`, carrying a
    /// ring of `num_edges` perimeter points at `radius`.
    pub fn new(position: Vec3, radius: f32, num_edges: usize) -> Self {
        let mut state = Self {
            position,
            rotation: Quat::IDENTITY,
            radius,
            ring: Vec::new(),
        };
        state.ring = state.build_ring(num_edges);
        state
    }

    /// Builds a fresh ring for the current pose and radius.
    pub fn build_ring(&self, num_edges: usize) -> Ring {
        let mut ring = Vec::with_capacity(num_edges + 1);
        ring.push(self.position);
        for i in 0..num_edges {
            let spin = Quat::from_rotation_y(TAU * i as f32 / num_edges as f32);
            let local = spin * (RING_TEMPLATE * self.radius);
            ring.push(self.position + self.rotation * local);
        }
        ring
    }

    /// Returns the turtle's growth direction (local Y) in world space.
    pub fn heading(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Returns the turtle's up direction (local Z) in world space.
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Returns `up × heading`, the axis of the pitch operations.
    pub fn left(&self) -> Vec3 {
        self.up().cross(self.heading())
    }

    /// Moves position and ring by `offset`.
    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
        for p in &mut self.ring {
            *p += offset;
        }
    }

    /// Rotates the frame and the ring by `angle` radians about a world-space
    /// `axis` passing through the current position.
    pub fn rotate(&mut self, axis: Vec3, angle: f32) {
        let Some(axis) = axis.try_normalize() else {
            return;
        };
        let rot = Quat::from_axis_angle(axis, angle);
        self.rotation = (rot * self.rotation).normalize();
        let centre = self.position;
        for p in &mut self.ring {
            *p = centre + rot * (*p - centre);
        }
    }

    /// Scales the ring about the current position.
    pub fn rescale(&mut self, ratio: f32) {
        let centre = self.position;
        for p in &mut self.ring {
            *p = centre + (*p - centre) * ratio;
        }
    }
}

/// Directional growth bias such as gravity or light.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tropism {
    /// Unit direction the heading bends toward.
    pub direction: Vec3,
    /// Fraction of the angular deviation corrected per adjustment.
    pub elasticity: f32,
}

impl Tropism {
    /// Returns `None` when `direction` has no length.
    pub fn new(direction: Vec3, elasticity: f32) -> Option<Self> {
        Some(Self {
            direction: direction.try_normalize()?,
            elasticity,
        })
    }

    /// Bends the turtle toward the tropism direction without emitting
    /// geometry. The bend angle is `elasticity` times the angle between
    /// heading and direction.
    pub fn apply(&self, turtle: &mut TurtleState) {
        let heading = turtle.heading();
        let axis = heading.cross(self.direction);
        if axis.length_squared() <= f32::EPSILON {
            return;
        }
        let deviation = heading.angle_between(self.direction);
        turtle.rotate(axis, self.elasticity * deviation);
    }
}

/// Normalizes an angle into `[-π, π]`, taking the shorter rotational path.
pub fn normalize_angle(angle: f32) -> f32 {
    let a = (angle + PI).rem_euclid(TAU) - PI;
    if a == -PI && angle > 0.0 { PI } else { a }
}

/// Operations that can be performed by the plant turtle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurtleOp {
    // --- Geometry ---
    /// Move forward extruding a tube segment (`F`).
    Forward,
    /// Move forward without geometry, breaking the tube (`f`).
    Move,

    // --- Orientation ---
    /// Rotate about up (`+`/`-`).
    Yaw(i8),
    /// Rotate about `up × heading` (`&`/`^`).
    Pitch(i8),
    /// Rotate about heading (`/`/`\`).
    Roll(i8),
    /// Turn 180 degrees about up (`|`).
    TurnAround,

    // --- Configuration ---
    /// Set the tube radius (`!`).
    SetRadius,
    /// Set or clear tropism (`T`).
    Tropism,

    // --- Attachments ---
    /// Record a sub-model placement (`~`).
    Inject,

    // --- Flow Control ---
    /// Save the full turtle state onto the stack (`[`).
    Push,
    /// Restore the most recently pushed turtle state (`]`).
    Pop,
}
