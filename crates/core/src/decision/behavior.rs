use std::fmt;

use super::behaviors::Behaviors;
use crate::model::{Handle, OmniSpeedActuator, RobotModel};
use crate::types::Vec3;

/// Name of the inert behavior every registry starts with.
pub const NONE: &str = "none";
/// Default name of the omni-directional move behavior.
pub const MOVE: &str = "move";
/// Default name of the get-ready behavior.
pub const GET_READY: &str = "get_ready";

/// Handle of a behavior inside the [`Behaviors`] registry that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BehaviorId(pub(crate) usize);

impl BehaviorId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for BehaviorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A stateful, steppable unit of agent control logic.
///
/// "Not finished yet" is normal control flow: switching away from a running
/// behavior simply fails until it reports completion. Only [`abort`](Behavior::abort)
/// stops it forcibly.
pub trait Behavior<M>: Send {
    fn name(&self) -> &str;

    /// Perform the next step. `stop` asks cyclic behaviors to head for a safe
    /// stopping state.
    fn perform(&mut self, model: &mut M, stop: bool);

    fn is_finished(&self) -> bool;

    /// Reset the internal state machine.
    fn init(&mut self) {}

    /// Hard stop.
    fn abort(&mut self) {
        self.init();
    }

    /// Capability query for behaviors that accept a movement speed.
    fn as_move(&mut self) -> Option<&mut dyn MoveControl> {
        None
    }
}

/// Behaviors driven by a desired planar speed `(x, y, theta)`.
pub trait MoveControl {
    fn set_speed(&mut self, desired_speed: Vec3);
}

/// Preference function of a composite behavior: candidate children from most to
/// least preferred. An empty list means the inert behavior.
pub trait Decide<M>: Send {
    fn decide(&mut self, model: &M, behaviors: &mut Behaviors<M>) -> Vec<BehaviorId>;
}

impl<M, F> Decide<M> for F
where
    F: FnMut(&M, &mut Behaviors<M>) -> Vec<BehaviorId> + Send,
{
    fn decide(&mut self, model: &M, behaviors: &mut Behaviors<M>) -> Vec<BehaviorId> {
        self(model, behaviors)
    }
}

// ── Stock behaviors ─────────────────────────────────────────────

/// Does nothing and is always finished.
#[derive(Debug, Clone)]
pub struct NoneBehavior {
    name: String,
}

impl NoneBehavior {
    pub fn new() -> Self {
        Self::named(NONE)
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for NoneBehavior {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Behavior<M> for NoneBehavior {
    fn name(&self) -> &str {
        &self.name
    }

    fn perform(&mut self, _model: &mut M, _stop: bool) {}

    fn is_finished(&self) -> bool {
        true
    }
}

/// Commands a desired movement speed through an omni-speed actuator.
/// Without the actuator it is a no-op.
#[derive(Debug)]
pub struct MoveBehavior {
    name: String,
    desired_speed: Vec3,
    actuator: Option<Handle<OmniSpeedActuator>>,
}

impl MoveBehavior {
    pub fn new<M: RobotModel>(model: &M, actuator_name: &str) -> Self {
        Self::named(MOVE, model, actuator_name)
    }

    pub fn named<M: RobotModel>(name: impl Into<String>, model: &M, actuator_name: &str) -> Self {
        let name = name.into();
        let actuator = model.omni_speed_actuators().find(actuator_name);
        if actuator.is_none() {
            tracing::warn!(
                behavior = %name,
                actuator = %actuator_name,
                "robot model has no omni-speed actuator, behavior disabled"
            );
        }
        Self {
            name,
            desired_speed: Vec3::ZERO,
            actuator,
        }
    }

    pub fn desired_speed(&self) -> Vec3 {
        self.desired_speed
    }

    pub fn is_enabled(&self) -> bool {
        self.actuator.is_some()
    }
}

impl MoveControl for MoveBehavior {
    fn set_speed(&mut self, desired_speed: Vec3) {
        self.desired_speed = desired_speed;
    }
}

impl<M: RobotModel + Send> Behavior<M> for MoveBehavior {
    fn name(&self) -> &str {
        &self.name
    }

    fn perform(&mut self, model: &mut M, stop: bool) {
        let Some(handle) = self.actuator else {
            return;
        };
        if stop {
            self.desired_speed = Vec3::ZERO;
        }
        model
            .omni_speed_actuators_mut()
            .get_mut(handle)
            .set(self.desired_speed);
    }

    fn is_finished(&self) -> bool {
        true
    }

    fn as_move(&mut self) -> Option<&mut dyn MoveControl> {
        Some(self)
    }
}

/// Get-ready preference: stand still through the move behavior `move_id`.
/// Falls back to the inert behavior when `move_id` cannot take a speed.
pub fn move_ready<M>(move_id: BehaviorId) -> impl Decide<M> {
    move |_model: &M, behaviors: &mut Behaviors<M>| match behaviors.as_move(move_id) {
        Some(mover) => {
            mover.set_speed(Vec3::ZERO);
            vec![move_id]
        }
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::BehaviorsBuilder;
    use crate::model::{ActuatorSet, Motor};
    use crate::types::{Action, Effector};

    /// Robot with an optional omni-speed actuator named `move`.
    #[derive(Default)]
    struct Rig {
        motors: ActuatorSet<Motor>,
        omni: ActuatorSet<OmniSpeedActuator>,
    }

    impl Rig {
        fn walker() -> Self {
            let mut rig = Self::default();
            rig.omni.push(OmniSpeedActuator::new(MOVE, "omni"));
            rig
        }

        fn action(&mut self) -> Action {
            let mut action = Action::new();
            self.omni.commit_all(&mut action);
            action
        }
    }

    impl RobotModel for Rig {
        fn motors(&self) -> &ActuatorSet<Motor> {
            &self.motors
        }

        fn motors_mut(&mut self) -> &mut ActuatorSet<Motor> {
            &mut self.motors
        }

        fn omni_speed_actuators(&self) -> &ActuatorSet<OmniSpeedActuator> {
            &self.omni
        }

        fn omni_speed_actuators_mut(&mut self) -> &mut ActuatorSet<OmniSpeedActuator> {
            &mut self.omni
        }
    }

    #[test]
    fn move_commands_desired_speed_and_zeroes_on_stop() {
        let mut rig = Rig::walker();
        let mut walk = MoveBehavior::new(&rig, MOVE);
        assert!(walk.is_enabled());

        let speed = Vec3::new(0.3, -0.1, 10.0);
        walk.set_speed(speed);
        Behavior::<Rig>::perform(&mut walk, &mut rig, false);
        assert_eq!(rig.action().get("omni"), Some(&Effector::OmniSpeed(speed)));

        Behavior::<Rig>::perform(&mut walk, &mut rig, true);
        assert_eq!(walk.desired_speed(), Vec3::ZERO);
        assert_eq!(rig.action().get("omni"), Some(&Effector::OmniSpeed(Vec3::ZERO)));
        assert!(Behavior::<Rig>::is_finished(&walk));
    }

    #[test]
    fn move_without_actuator_is_disabled() {
        let mut rig = Rig::default();
        let mut walk = MoveBehavior::new(&rig, MOVE);
        assert!(!walk.is_enabled());

        walk.set_speed(Vec3::new(1.0, 0.0, 0.0));
        Behavior::<Rig>::perform(&mut walk, &mut rig, false);
        assert!(rig.action().is_empty());
    }

    #[test]
    fn move_ready_stands_still_through_the_mover() {
        let mut rig = Rig::walker();
        let mut b = BehaviorsBuilder::<Rig>::new();
        let walk = b.leaf(MoveBehavior::new(&rig, MOVE)).unwrap();
        let ready = b.composite(GET_READY, move_ready::<Rig>(walk)).unwrap();
        let mut behaviors = b.build();

        if let Some(mover) = behaviors.as_move(walk) {
            mover.set_speed(Vec3::new(0.5, 0.5, 0.0));
        }
        behaviors.perform(ready, &mut rig, false);

        assert_eq!(behaviors.chain_names(ready), vec![GET_READY, MOVE]);
        assert_eq!(rig.action().get("omni"), Some(&Effector::OmniSpeed(Vec3::ZERO)));
    }

    #[test]
    fn move_ready_falls_back_to_none_without_a_mover() {
        let mut rig = Rig::walker();
        let mut b = BehaviorsBuilder::<Rig>::new();
        let idle = b.leaf(NoneBehavior::named("idle")).unwrap();
        let ready = b.composite(GET_READY, move_ready::<Rig>(idle)).unwrap();
        let mut behaviors = b.build();

        assert!(behaviors.as_move(idle).is_none());
        behaviors.perform(ready, &mut rig, false);
        assert_eq!(behaviors.chain_names(ready), vec![GET_READY, NONE]);
        assert!(rig.action().is_empty());
    }
}
