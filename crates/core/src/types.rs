use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ── Geometry ────────────────────────────────────────────────────

/// Three-dimensional vector (positions, rates, accelerations, speeds).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Build a cartesian vector from polar coordinates.
    /// Angles are in degrees: `azimuth` around z, `elevation` above the xy-plane.
    pub fn from_polar_deg(distance: f64, azimuth: f64, elevation: f64) -> Self {
        let (alpha, delta) = (azimuth.to_radians(), elevation.to_radians());
        let cos_delta = delta.cos();
        Self {
            x: distance * alpha.cos() * cos_delta,
            y: distance * alpha.sin() * cos_delta,
            z: distance * delta.sin(),
        }
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Planar pose. Orientation kept in degrees, the unit simulators expect on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose2 {
    pub x: f64,
    pub y: f64,
    pub theta_deg: f64,
}

impl Pose2 {
    pub const fn new(x: f64, y: f64, theta_deg: f64) -> Self {
        Self { x, y, theta_deg }
    }
}

// ── Perception ──────────────────────────────────────────────────

/// A single point-like object seen by a vision sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDetection {
    pub name: String,
    pub position: Vec3,
}

/// A field line seen by a vision sensor, given by its two end points.
#[derive(Debug, Clone, PartialEq)]
pub struct LineDetection {
    pub start: Vec3,
    pub end: Vec3,
}

/// Another player seen by a vision sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerDetection {
    pub team_name: String,
    pub player_no: i64,
    pub body_parts: Vec<(String, Vec3)>,
}

/// One typed piece of sensed information.
#[derive(Debug, Clone, PartialEq)]
pub enum Perceptor {
    Time(f64),
    JointState {
        position: f64,
        velocity: f64,
        effort: f64,
    },
    GyroRate(Vec3),
    Accelerometer(Vec3),
    Bumper {
        active: bool,
    },
    ForceResistance {
        origin: Vec3,
        force: Vec3,
    },
    Vision {
        objects: Vec<ObjectDetection>,
        lines: Vec<LineDetection>,
        players: Vec<PlayerDetection>,
    },
    Hear {
        team: String,
        time: f64,
        direction: String,
        message: String,
    },
    Text(String),
    Error {
        severity: String,
        description: String,
    },
    GameState(GameStateInfo),
    AgentState {
        temperature: i64,
        battery: i64,
    },
}

/// Referee information shared by soccer simulators.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameStateInfo {
    pub play_time: f64,
    pub play_side: String,
    pub play_mode: String,
    pub player_no: i64,
    pub score_left: i64,
    pub score_right: i64,
}

/// Joint reading extracted from a `Perceptor::JointState`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointState {
    pub position: f64,
    pub velocity: f64,
    pub effort: f64,
}

/// Everything received in one message. Immutable once built; the shutdown
/// sentinel is a perception with no perceptors and the shutdown flag set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Perception {
    time: f64,
    perceptors: HashMap<String, Perceptor>,
    shutdown: bool,
}

impl Perception {
    pub fn builder() -> PerceptionBuilder {
        PerceptionBuilder::default()
    }

    /// The terminal signal pushed when a channel dies or an operator asks to stop.
    pub fn shutdown() -> Self {
        Self {
            shutdown: true,
            ..Self::default()
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown
    }

    pub fn get(&self, name: &str) -> Option<&Perceptor> {
        self.perceptors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.perceptors.contains_key(name)
    }

    pub fn joint_state(&self, name: &str) -> Option<JointState> {
        match self.perceptors.get(name)? {
            Perceptor::JointState {
                position,
                velocity,
                effort,
            } => Some(JointState {
                position: *position,
                velocity: *velocity,
                effort: *effort,
            }),
            _ => None,
        }
    }

    /// All joint readings, in no particular order.
    pub fn joint_states(&self) -> impl Iterator<Item = (&str, JointState)> + '_ {
        self.perceptors
            .keys()
            .filter_map(|name| self.joint_state(name).map(|js| (name.as_str(), js)))
    }

    pub fn game_state(&self) -> Option<&GameStateInfo> {
        self.perceptors.values().find_map(|p| match p {
            Perceptor::GameState(gs) => Some(gs),
            _ => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Perceptor)> + '_ {
        self.perceptors.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.perceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.perceptors.is_empty()
    }
}

/// Accumulates perceptors while a message is being translated.
#[derive(Debug, Default)]
pub struct PerceptionBuilder {
    time: f64,
    perceptors: HashMap<String, Perceptor>,
}

impl PerceptionBuilder {
    pub fn time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    /// Add a perceptor; a later perceptor with the same name replaces the earlier one.
    pub fn put(&mut self, name: impl Into<String>, perceptor: Perceptor) -> &mut Self {
        self.perceptors.insert(name.into(), perceptor);
        self
    }

    pub fn set_time(&mut self, time: f64) -> &mut Self {
        self.time = time;
        self
    }

    pub fn with(mut self, name: impl Into<String>, perceptor: Perceptor) -> Self {
        self.put(name, perceptor);
        self
    }

    pub fn build(self) -> Perception {
        Perception {
            time: self.time,
            perceptors: self.perceptors,
            shutdown: false,
        }
    }
}

// ── Action ──────────────────────────────────────────────────────

/// One commanded action addressed to a named effector.
#[derive(Debug, Clone, PartialEq)]
pub enum Effector {
    Motor {
        position: f64,
        velocity: f64,
        kp: f64,
        kd: f64,
        tau: f64,
    },
    OmniSpeed(Vec3),
    Create {
        scene: String,
        model_type: i64,
    },
    Init {
        team_name: String,
        player_no: i64,
        model_name: String,
    },
    Beam(Pose2),
    Say(String),
    Sync,
    PassMode,
}

/// Effector commands collected during one decide/act cycle.
/// Insertion order is kept because some simulators care about command order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Action {
    effectors: Vec<(String, Effector)>,
}

impl Action {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put an effector command. An existing command for the same name is replaced in place.
    pub fn put(&mut self, name: impl Into<String>, effector: Effector) {
        let name = name.into();
        match self.effectors.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = effector,
            None => self.effectors.push((name, effector)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Effector> {
        self.effectors
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, e)| e)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Effector)> + '_ {
        self.effectors.iter().map(|(n, e)| (n.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.effectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effectors.is_empty()
    }
}

// ── Telemetry ───────────────────────────────────────────────────

/// Snapshot of the control loop, published after each cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeStatus {
    pub decisions: u64,
    pub perceptions: u64,
    pub perception_time: f64,
    /// Active behaviors from the top-level behavior down to the running leaf.
    pub behavior_chain: Vec<String>,
    pub running: bool,
}
