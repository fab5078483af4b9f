//! Interpreter that converts an L-System word into a ring trace.
//!
//! The entry point is [`TurtleInterpreter`]. Configure it with an
//! [`InterpreterConfig`], register symbol-to-operation mappings via
//! [`TurtleInterpreter::set_op`] or [`TurtleInterpreter::populate_standard_symbols`],
//! then call [`TurtleInterpreter::interpret`] with a derived word.

use crate::error::{FloraError, Result, SubModelSite};
use crate::symbol::Symbol;
use crate::turtle::{Ring, Tropism, TurtleOp, TurtleState, normalize_angle};
use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::f32::consts::PI;
use tracing::debug;

/// Configuration for plant interpretation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Polygon sides of the tube cross-section.
    pub num_edges: usize,
    /// Default length of `F` and `f` if no parameter is provided.
    pub default_step: f32,
    /// Default rotation angle (in radians) for Yaw/Pitch/Roll.
    pub default_angle: f32,
    /// Radius the turtle starts with; `!` appends a base ring when leaving it.
    pub default_radius: f32,
    /// Maximum stack depth for push/pop operations.
    pub max_stack_depth: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            num_edges: 8,
            default_step: 1.0,
            default_angle: 90.0f32.to_radians(),
            default_radius: 1.0,
            max_stack_depth: 1024,
        }
    }
}

/// Placement of an injected sub-model (e.g. a leaf) captured by `~`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InjectedModelReference {
    /// Index into the configured sub-model list.
    pub index: usize,
    pub position: Vec3,
    pub heading: Vec3,
    pub up: Vec3,
}

impl InjectedModelReference {
    /// Rotation taking model space (Y forward, Z up) into the captured frame.
    pub fn rotation(&self) -> Quat {
        let heading = self.heading.normalize_or(Vec3::Y);
        let up = self.up.normalize_or(Vec3::Z);
        Quat::from_mat3(&Mat3::from_cols(heading.cross(up), heading, up)).normalize()
    }
}

/// Output of a single interpretation pass.
///
/// Rings are grouped into contiguous sublists; consecutive rings within a
/// sublist form tube segments, rings in different sublists are never joined.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TurtleTrace {
    pub num_edges: usize,
    pub sublists: Vec<Vec<Ring>>,
    pub injections: Vec<InjectedModelReference>,
}

impl TurtleTrace {
    fn new(num_edges: usize, first: Ring) -> Self {
        Self {
            num_edges,
            sublists: vec![vec![first]],
            injections: Vec::new(),
        }
    }

    /// Appends a ring to the open sublist.
    fn extend(&mut self, ring: Ring) {
        match self.sublists.last_mut() {
            Some(open) => open.push(ring),
            None => self.sublists.push(vec![ring]),
        }
    }

    /// The most recently appended ring of the open sublist.
    fn last_ring(&self) -> Option<&Ring> {
        self.sublists.last().and_then(|open| open.last())
    }

    /// Closes the open sublist and starts a new one at `ring`. An open
    /// sublist that never grew past its seed ring is replaced instead.
    fn break_with(&mut self, ring: Ring) {
        match self.sublists.last_mut() {
            Some(open) if open.len() <= 1 => *open = vec![ring],
            _ => self.sublists.push(vec![ring]),
        }
    }

    /// Total number of rings over all sublists.
    pub fn ring_count(&self) -> usize {
        self.sublists.iter().map(Vec::len).sum()
    }
}

/// Interprets L-System output to build a [`TurtleTrace`].
#[derive(Clone, Debug)]
pub struct TurtleInterpreter {
    op_map: HashMap<char, TurtleOp>,
    ignored: HashSet<char>,
    sub_model_count: usize,
    config: InterpreterConfig,
}

impl TurtleInterpreter {
    /// Creates a new interpreter with the given configuration and an empty symbol map.
    ///
    /// Register operations with [`set_op`](Self::set_op) or
    /// [`populate_standard_symbols`](Self::populate_standard_symbols) before calling
    /// [`interpret`](Self::interpret).
    pub fn new(config: InterpreterConfig) -> Self {
        Self {
            op_map: HashMap::new(),
            ignored: HashSet::new(),
            sub_model_count: 0,
            config,
        }
    }

    /// Replaces the entire symbol-to-operation map in one step (builder pattern).
    pub fn with_map(mut self, map: HashMap<char, TurtleOp>) -> Self {
        self.op_map = map;
        self
    }

    /// Builder form of [`populate_standard_symbols`](Self::populate_standard_symbols).
    pub fn with_standard_symbols(mut self) -> Self {
        self.populate_standard_symbols();
        self
    }

    /// Symbols the turtle should skip silently (e.g. grammar-only markers).
    pub fn ignore(mut self, names: impl IntoIterator<Item = char>) -> Self {
        self.ignored.extend(names);
        self
    }

    /// Number of sub-models `~(index)` may reference.
    pub fn with_sub_model_count(mut self, count: usize) -> Self {
        self.sub_model_count = count;
        self
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Assigns a single [`TurtleOp`] to a symbol name.
    pub fn set_op(&mut self, name: char, op: TurtleOp) {
        self.op_map.insert(name, op);
    }

    /// Registers the conventional symbol-to-operation mappings.
    ///
    /// | symbol | operation |
    /// |--------|-----------|
    /// | `F` `f` | forward with / without geometry |
    /// | `+` `-` | yaw about up |
    /// | `&` `^` | pitch about `up × heading` |
    /// | `/` `\` | roll about heading |
    /// | `\|` | turn around |
    /// | `[` `]` | push / pop |
    /// | `!` `T` `~` | radius, tropism, sub-model |
    pub fn populate_standard_symbols(&mut self) {
        let mappings = [
            // Geometry
            ('F', TurtleOp::Forward),
            ('f', TurtleOp::Move),
            // Orientation
            ('+', TurtleOp::Yaw(1)),
            ('-', TurtleOp::Yaw(-1)),
            ('&', TurtleOp::Pitch(1)),
            ('^', TurtleOp::Pitch(-1)),
            ('/', TurtleOp::Roll(1)),
            ('\\', TurtleOp::Roll(-1)),
            ('|', TurtleOp::TurnAround),
            // Config
            ('!', TurtleOp::SetRadius),
            ('T', TurtleOp::Tropism),
            // Attachments
            ('~', TurtleOp::Inject),
            // Flow
            ('[', TurtleOp::Push),
            (']', TurtleOp::Pop),
        ];

        for (name, op) in mappings {
            self.set_op(name, op);
        }
    }

    /// Interprets `word` in a single left-to-right pass.
    ///
    /// The turtle starts at the origin heading `+Y` with up `+Z` and radius
    /// `default_radius`; its initial ring opens the first sublist.
    ///
    /// # Push / Pop
    ///
    /// `[` saves a deep copy of the turtle (position, rotation, radius, ring).
    /// `]` restores it and starts a new sublist seeded with the restored ring,
    /// so a finished branch never joins the geometry that follows it.
    /// Tropism is process state and survives both.
    pub fn interpret(&self, word: &[Symbol]) -> Result<TurtleTrace> {
        let n = self.config.num_edges;
        let mut turtle = TurtleState::new(Vec3::ZERO, self.config.default_radius, n);
        let mut trace = TurtleTrace::new(n, turtle.ring.clone());
        let mut stack: Vec<TurtleState> = Vec::new();
        let mut tropism: Option<Tropism> = None;
        let default_degrees = self.config.default_angle.to_degrees();

        for (position, symbol) in word.iter().enumerate() {
            let name = symbol.name();
            let Some(&op) = self.op_map.get(&name) else {
                if self.ignored.contains(&name) {
                    continue;
                }
                return Err(FloraError::UnknownInstruction { name, position });
            };

            // Param helpers
            let params = symbol.values();
            let p = |idx: usize, def: f32| -> f32 {
                params.get(idx).map(|&x| x as f32).unwrap_or(def)
            };
            let angle = |sign: i8| normalize_angle(p(0, default_degrees).to_radians() * sign as f32);

            match op {
                // --- GEOMETRY ---
                TurtleOp::Forward => {
                    let len = p(0, self.config.default_step);
                    turtle.translate(turtle.heading() * len);
                    trace.extend(turtle.ring.clone());
                    bend(&mut turtle, tropism.as_ref());
                }
                TurtleOp::Move => {
                    let len = p(0, self.config.default_step);
                    turtle.translate(turtle.heading() * len);
                    trace.break_with(turtle.ring.clone());
                }

                // --- ORIENTATION ---
                TurtleOp::Yaw(s) => {
                    turtle.rotate(turtle.up(), angle(s));
                    trace.extend(turtle.ring.clone());
                    bend(&mut turtle, tropism.as_ref());
                }
                TurtleOp::Pitch(s) => {
                    turtle.rotate(turtle.left(), angle(s));
                    trace.extend(turtle.ring.clone());
                    bend(&mut turtle, tropism.as_ref());
                }
                TurtleOp::Roll(s) => {
                    // A circular section is unchanged by spinning about its own axis.
                    let ring = std::mem::take(&mut turtle.ring);
                    turtle.rotate(turtle.heading(), angle(s));
                    turtle.ring = ring;
                    trace.extend(turtle.ring.clone());
                    bend(&mut turtle, tropism.as_ref());
                }
                TurtleOp::TurnAround => {
                    turtle.rotate(turtle.up(), PI);
                    trace.extend(turtle.ring.clone());
                    bend(&mut turtle, tropism.as_ref());
                }

                // --- CONFIG ---
                TurtleOp::SetRadius => {
                    let old = turtle.radius;
                    let new = p(0, old);
                    let at_default = (old - self.config.default_radius).abs() <= f32::EPSILON;
                    if at_default && trace.last_ring() != Some(&turtle.ring) {
                        trace.extend(turtle.ring.clone());
                    }
                    if old.abs() > f32::EPSILON {
                        turtle.rescale(new / old);
                        turtle.radius = new;
                    } else {
                        turtle.radius = new;
                        turtle.ring = turtle.build_ring(n);
                    }
                }
                TurtleOp::Tropism => {
                    tropism = match params {
                        [] => None,
                        [x] if *x == 0.0 => None,
                        [dx, dy, dz, e] => Tropism::new(
                            Vec3::new(*dx as f32, *dy as f32, *dz as f32),
                            *e as f32,
                        ),
                        _ => {
                            return Err(FloraError::MalformedInstruction {
                                name,
                                arity: params.len(),
                                position,
                            });
                        }
                    };
                }

                // --- ATTACHMENTS ---
                TurtleOp::Inject => {
                    let raw = params.first().copied().unwrap_or(0.0);
                    let integral = raw.is_finite() && raw >= 0.0 && raw.fract() == 0.0;
                    let index = raw as usize;
                    if !integral || index >= self.sub_model_count {
                        return Err(FloraError::InvalidSubModelReference {
                            index: raw,
                            available: self.sub_model_count,
                            site: SubModelSite::Word(position),
                        });
                    }
                    trace.injections.push(InjectedModelReference {
                        index,
                        position: turtle.position,
                        heading: turtle.heading(),
                        up: turtle.up(),
                    });
                }

                // --- FLOW ---
                TurtleOp::Push => {
                    if stack.len() >= self.config.max_stack_depth {
                        return Err(FloraError::BranchStackOverflow {
                            max: self.config.max_stack_depth,
                            position,
                        });
                    }
                    stack.push(turtle.clone());
                }
                TurtleOp::Pop => {
                    turtle = stack
                        .pop()
                        .ok_or(FloraError::UnbalancedBranch { position })?;
                    trace.break_with(turtle.ring.clone());
                }
            }
        }

        debug!(
            symbols = word.len(),
            sublists = trace.sublists.len(),
            rings = trace.ring_count(),
            injections = trace.injections.len(),
            "interpretation complete"
        );
        Ok(trace)
    }
}

/// Passive tropism adjustment; never emits a ring.
fn bend(turtle: &mut TurtleState, tropism: Option<&Tropism>) {
    if let Some(t) = tropism {
        t.apply(turtle);
    }
}
