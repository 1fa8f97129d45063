//! Simulator handshake behaviors and a standing pose.
//!
//! `create`, `init` and `beam` are one-shot: they command their actuator on the
//! first perform and report finished from then on. Their completion survives
//! `init()` so a decision policy can read it as handshake progress.

use magma_core::decision::{Behavior, BehaviorError, Behaviors, GET_READY};
use magma_core::model::RobotModel;

use crate::model::RcssAgentModel;

pub const CREATE: &str = "create";
pub const INIT: &str = "init";
pub const BEAM: &str = "beam";
pub const STAND: &str = "stand";

/// Spawns the robot in the scene.
#[derive(Debug)]
pub struct CreateBehavior {
    completed: bool,
}

impl CreateBehavior {
    pub fn new(model: &RcssAgentModel) -> Self {
        let completed = !model.has_create();
        if completed {
            tracing::warn!(behavior = CREATE, "robot model has no create actuator, skipping scene creation");
        }
        Self { completed }
    }
}

impl Behavior<RcssAgentModel> for CreateBehavior {
    fn name(&self) -> &str {
        CREATE
    }

    fn perform(&mut self, model: &mut RcssAgentModel, _stop: bool) {
        if self.completed {
            return;
        }
        if let Some(create) = model.create_mut() {
            create.set(true);
        }
        self.completed = true;
    }

    fn is_finished(&self) -> bool {
        self.completed
    }
}

/// Registers team name and player number with the server.
#[derive(Debug)]
pub struct InitBehavior {
    completed: bool,
}

impl InitBehavior {
    pub fn new(model: &RcssAgentModel) -> Self {
        let completed = !model.has_init();
        if completed {
            tracing::warn!(behavior = INIT, "robot model has no init actuator, skipping initialisation");
        }
        Self { completed }
    }
}

impl Behavior<RcssAgentModel> for InitBehavior {
    fn name(&self) -> &str {
        INIT
    }

    fn perform(&mut self, model: &mut RcssAgentModel, _stop: bool) {
        if self.completed {
            return;
        }
        let (team, player_no) = (model.team_name().to_owned(), model.player_no());
        if let Some(init) = model.init_mut() {
            init.set(team, player_no);
        }
        self.completed = true;
    }

    fn is_finished(&self) -> bool {
        self.completed
    }
}

/// Moves the robot to its kick-off pose.
#[derive(Debug)]
pub struct BeamBehavior {
    completed: bool,
}

impl BeamBehavior {
    pub fn new(model: &RcssAgentModel) -> Self {
        let completed = !model.has_beam();
        if completed {
            tracing::warn!(behavior = BEAM, "robot model has no beam actuator, skipping beam");
        }
        Self { completed }
    }
}

impl Behavior<RcssAgentModel> for BeamBehavior {
    fn name(&self) -> &str {
        BEAM
    }

    fn perform(&mut self, model: &mut RcssAgentModel, _stop: bool) {
        if self.completed {
            return;
        }
        let pose = model.beam_pose();
        if let Some(beam) = model.beam_mut() {
            beam.set(pose);
        }
        self.completed = true;
    }

    fn is_finished(&self) -> bool {
        self.completed
    }
}

/// Holds every joint where it is: zero velocity, current targets kept.
#[derive(Debug, Default)]
pub struct StandBehavior;

impl StandBehavior {
    pub fn new() -> Self {
        Self
    }
}

impl<M: RobotModel + Send> Behavior<M> for StandBehavior {
    fn name(&self) -> &str {
        STAND
    }

    fn perform(&mut self, model: &mut M, _stop: bool) {
        for motor in model.motors_mut().iter_mut() {
            let t = motor.target();
            motor.set(t.position, 0.0, t.kp, t.kd);
        }
    }

    fn is_finished(&self) -> bool {
        true
    }
}

/// The behavior set of a soccer agent: the handshake steps, `stand`, and the
/// `get_ready` composite preferring `stand`.
pub fn behaviors(model: &RcssAgentModel) -> Result<Behaviors<RcssAgentModel>, BehaviorError> {
    let mut builder = Behaviors::builder();
    builder.leaf(CreateBehavior::new(model))?;
    builder.leaf(InitBehavior::new(model))?;
    builder.leaf(BeamBehavior::new(model))?;
    let stand = builder.leaf(StandBehavior::new())?;
    builder.composite(GET_READY, move |_: &RcssAgentModel, _: &mut Behaviors<RcssAgentModel>| {
        vec![stand]
    })?;
    Ok(builder.build())
}
