//! The narrow seams between the control loop and a domain model.

pub mod actuators;

pub use actuators::{Actuator, ActuatorSet, Handle, Motor, MotorTarget, OmniSpeedActuator};

use crate::types::{Action, Perception};

/// World and robot state, updated from perceptions and materialised into actions.
pub trait AgentModel: Send {
    /// Fold one perception into the model.
    fn update(&mut self, perception: &Perception);

    /// Commit every actuator touched this cycle into a fresh action.
    fn generate_action(&mut self) -> Action;

    /// Simulation time of the last update.
    fn time(&self) -> f64;
}

/// Access to the generic actuator kinds, used by stock behaviors.
pub trait RobotModel {
    fn motors(&self) -> &ActuatorSet<Motor>;

    fn motors_mut(&mut self) -> &mut ActuatorSet<Motor>;

    fn omni_speed_actuators(&self) -> &ActuatorSet<OmniSpeedActuator>;

    fn omni_speed_actuators_mut(&mut self) -> &mut ActuatorSet<OmniSpeedActuator>;
}
