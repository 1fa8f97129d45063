use std::fmt;
use std::marker::PhantomData;

use crate::types::{Action, Effector, Vec3};

/// Something that turns its pending command into an effector entry once per cycle.
pub trait Actuator: Send {
    fn name(&self) -> &str;

    fn effector_name(&self) -> &str;

    fn commit(&mut self, action: &mut Action);
}

// ── Typed handles ───────────────────────────────────────────────

/// Index of an actuator inside the [`ActuatorSet`] that issued it.
pub struct Handle<T> {
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub fn index(self) -> usize {
        self.index
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.index)
    }
}

/// Append-only collection of one actuator kind. Handles stay valid for the
/// lifetime of the set, so lookups by name happen once at construction.
#[derive(Debug)]
pub struct ActuatorSet<T> {
    actuators: Vec<T>,
}

impl<T> Default for ActuatorSet<T> {
    fn default() -> Self {
        Self {
            actuators: Vec::new(),
        }
    }
}

impl<T: Actuator> ActuatorSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, actuator: T) -> Handle<T> {
        self.actuators.push(actuator);
        Handle {
            index: self.actuators.len() - 1,
            _marker: PhantomData,
        }
    }

    pub fn find(&self, name: &str) -> Option<Handle<T>> {
        self.actuators
            .iter()
            .position(|a| a.name() == name)
            .map(|index| Handle {
                index,
                _marker: PhantomData,
            })
    }

    pub fn get(&self, handle: Handle<T>) -> &T {
        &self.actuators[handle.index]
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> &mut T {
        &mut self.actuators[handle.index]
    }

    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut T> {
        self.actuators.iter_mut().find(|a| a.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.actuators.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.actuators.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.actuators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actuators.is_empty()
    }

    /// Commit every actuator in insertion order.
    pub fn commit_all(&mut self, action: &mut Action) {
        for actuator in &mut self.actuators {
            actuator.commit(action);
        }
    }
}

// ── Motor ───────────────────────────────────────────────────────

/// Joint control targets.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotorTarget {
    pub position: f64,
    pub velocity: f64,
    pub kp: f64,
    pub kd: f64,
    pub tau: f64,
}

/// Drives one joint. Always commits; the committed targets are kept as the previous targets.
#[derive(Debug, Clone)]
pub struct Motor {
    name: String,
    effector_name: String,
    max_velocity: f64,
    max_effort: f64,
    target: MotorTarget,
    previous: MotorTarget,
}

impl Motor {
    pub fn new(
        name: impl Into<String>,
        effector_name: impl Into<String>,
        max_velocity: f64,
        max_effort: f64,
    ) -> Self {
        Self {
            name: name.into(),
            effector_name: effector_name.into(),
            max_velocity,
            max_effort,
            target: MotorTarget::default(),
            previous: MotorTarget::default(),
        }
    }

    pub fn set(&mut self, position: f64, velocity: f64, kp: f64, kd: f64) {
        self.target.position = position;
        self.target.velocity = velocity;
        self.target.kp = kp;
        self.target.kd = kd;
    }

    pub fn set_tau(&mut self, tau: f64) {
        self.target.tau = tau;
    }

    pub fn target(&self) -> MotorTarget {
        self.target
    }

    /// Targets of the last commit.
    pub fn previous_target(&self) -> MotorTarget {
        self.previous
    }

    pub fn max_velocity(&self) -> f64 {
        self.max_velocity
    }

    pub fn max_effort(&self) -> f64 {
        self.max_effort
    }
}

impl Actuator for Motor {
    fn name(&self) -> &str {
        &self.name
    }

    fn effector_name(&self) -> &str {
        &self.effector_name
    }

    fn commit(&mut self, action: &mut Action) {
        let t = self.target;
        action.put(
            self.effector_name.clone(),
            Effector::Motor {
                position: t.position,
                velocity: t.velocity,
                kp: t.kp,
                kd: t.kd,
                tau: t.tau,
            },
        );
        self.previous = t;
    }
}

// ── Omni-directional speed ──────────────────────────────────────

/// Commands a planar movement speed `(x, y, theta)`. Commits only when a speed
/// was set since the last commit.
#[derive(Debug, Clone)]
pub struct OmniSpeedActuator {
    name: String,
    effector_name: String,
    desired: Option<Vec3>,
}

impl OmniSpeedActuator {
    pub fn new(name: impl Into<String>, effector_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            effector_name: effector_name.into(),
            desired: None,
        }
    }

    pub fn set(&mut self, desired_speed: Vec3) {
        self.desired = Some(desired_speed);
    }

    pub fn desired_speed(&self) -> Option<Vec3> {
        self.desired
    }
}

impl Actuator for OmniSpeedActuator {
    fn name(&self) -> &str {
        &self.name
    }

    fn effector_name(&self) -> &str {
        &self.effector_name
    }

    fn commit(&mut self, action: &mut Action) {
        if let Some(speed) = self.desired.take() {
            action.put(self.effector_name.clone(), Effector::OmniSpeed(speed));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motor_commit_remembers_previous_target() {
        let mut motor = Motor::new("head_yaw", "he1", 7.0, 1.5);
        motor.set(0.5, 1.2, 10.0, 0.1);

        let mut action = Action::new();
        motor.commit(&mut action);
        assert_eq!(
            action.get("he1"),
            Some(&Effector::Motor {
                position: 0.5,
                velocity: 1.2,
                kp: 10.0,
                kd: 0.1,
                tau: 0.0
            })
        );
        assert_eq!(motor.previous_target(), motor.target());

        // a motor keeps commanding its last target every cycle
        let mut next = Action::new();
        motor.commit(&mut next);
        assert_eq!(next.len(), 1);
    }

    #[test]
    fn omni_speed_commits_once_per_set() {
        let mut omni = OmniSpeedActuator::new("move", "omni");
        let mut action = Action::new();
        omni.commit(&mut action);
        assert!(action.is_empty());

        omni.set(Vec3::new(0.2, 0.0, 5.0));
        omni.commit(&mut action);
        assert_eq!(
            action.get("omni"),
            Some(&Effector::OmniSpeed(Vec3::new(0.2, 0.0, 5.0)))
        );
        assert!(omni.desired_speed().is_none());

        let mut next = Action::new();
        omni.commit(&mut next);
        assert!(next.is_empty());
    }

    #[test]
    fn handles_resolve_by_name() {
        let mut set = ActuatorSet::new();
        let a = set.push(Motor::new("a", "ea", 1.0, 1.0));
        let b = set.push(Motor::new("b", "eb", 1.0, 1.0));

        assert_eq!(set.find("b"), Some(b));
        assert_ne!(a, b);
        assert!(set.find("c").is_none());

        set.get_mut(b).set(1.0, 0.0, 0.0, 0.0);
        assert_eq!(set.get(b).target().position, 1.0);

        let mut action = Action::new();
        set.commit_all(&mut action);
        let names: Vec<_> = action.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["ea", "eb"]);
    }
}
