//! Virtual actuators of the soccer simulation server. Each one commits at most one
//! effector per cycle and resets afterwards.

use magma_core::model::Actuator;
use magma_core::types::{Action, Effector, Pose2};

/// Spawns the robot in the simulation scene.
#[derive(Debug, Clone)]
pub struct CreateActuator {
    name: String,
    effector_name: String,
    scene: String,
    model_type: i64,
    active: bool,
}

impl CreateActuator {
    pub fn new(
        name: impl Into<String>,
        effector_name: impl Into<String>,
        scene: impl Into<String>,
        model_type: i64,
    ) -> Self {
        Self {
            name: name.into(),
            effector_name: effector_name.into(),
            scene: scene.into(),
            model_type,
            active: false,
        }
    }

    pub fn set(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn scene(&self) -> &str {
        &self.scene
    }
}

impl Actuator for CreateActuator {
    fn name(&self) -> &str {
        &self.name
    }

    fn effector_name(&self) -> &str {
        &self.effector_name
    }

    fn commit(&mut self, action: &mut Action) {
        if self.active {
            action.put(
                self.effector_name.clone(),
                Effector::Create {
                    scene: self.scene.clone(),
                    model_type: self.model_type,
                },
            );
        }
        self.active = false;
    }
}

/// Registers the spawned robot with team name and player number.
#[derive(Debug, Clone)]
pub struct InitActuator {
    name: String,
    effector_name: String,
    model_name: String,
    request: Option<(String, i64)>,
}

impl InitActuator {
    pub fn new(
        name: impl Into<String>,
        effector_name: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            effector_name: effector_name.into(),
            model_name: model_name.into(),
            request: None,
        }
    }

    pub fn set(&mut self, team_name: impl Into<String>, player_no: i64) {
        self.request = Some((team_name.into(), player_no));
    }

    pub fn is_active(&self) -> bool {
        self.request.is_some()
    }
}

impl Actuator for InitActuator {
    fn name(&self) -> &str {
        &self.name
    }

    fn effector_name(&self) -> &str {
        &self.effector_name
    }

    fn commit(&mut self, action: &mut Action) {
        if let Some((team_name, player_no)) = self.request.take() {
            action.put(
                self.effector_name.clone(),
                Effector::Init {
                    team_name,
                    player_no,
                    model_name: self.model_name.clone(),
                },
            );
        }
    }
}

/// Places the robot on the field.
#[derive(Debug, Clone)]
pub struct BeamActuator {
    name: String,
    effector_name: String,
    pose: Option<Pose2>,
}

impl BeamActuator {
    pub fn new(name: impl Into<String>, effector_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            effector_name: effector_name.into(),
            pose: None,
        }
    }

    pub fn set(&mut self, pose: Pose2) {
        self.pose = Some(pose);
    }

    pub fn pose(&self) -> Option<Pose2> {
        self.pose
    }
}

impl Actuator for BeamActuator {
    fn name(&self) -> &str {
        &self.name
    }

    fn effector_name(&self) -> &str {
        &self.effector_name
    }

    fn commit(&mut self, action: &mut Action) {
        if let Some(pose) = self.pose.take() {
            action.put(self.effector_name.clone(), Effector::Beam(pose));
        }
    }
}

/// Synchronisation marker for servers running in sync mode. With `auto_sync`
/// it is re-armed after every commit.
#[derive(Debug, Clone)]
pub struct SyncActuator {
    name: String,
    effector_name: String,
    auto_sync: bool,
    active: bool,
}

impl SyncActuator {
    pub fn new(name: impl Into<String>, effector_name: impl Into<String>, auto_sync: bool) -> Self {
        Self {
            name: name.into(),
            effector_name: effector_name.into(),
            auto_sync,
            active: auto_sync,
        }
    }

    pub fn set(&mut self, active: bool) {
        self.active = active;
    }
}

impl Actuator for SyncActuator {
    fn name(&self) -> &str {
        &self.name
    }

    fn effector_name(&self) -> &str {
        &self.effector_name
    }

    fn commit(&mut self, action: &mut Action) {
        if self.active {
            action.put(self.effector_name.clone(), Effector::Sync);
        }
        self.active = self.auto_sync;
    }
}

/// Broadcasts a short message to nearby players.
#[derive(Debug, Clone)]
pub struct SayActuator {
    name: String,
    effector_name: String,
    message: Option<String>,
}

impl SayActuator {
    pub fn new(name: impl Into<String>, effector_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            effector_name: effector_name.into(),
            message: None,
        }
    }

    pub fn set(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }
}

impl Actuator for SayActuator {
    fn name(&self) -> &str {
        &self.name
    }

    fn effector_name(&self) -> &str {
        &self.effector_name
    }

    fn commit(&mut self, action: &mut Action) {
        if let Some(message) = self.message.take() {
            action.put(self.effector_name.clone(), Effector::Say(message));
        }
    }
}

/// Requests pass mode from the referee.
#[derive(Debug, Clone)]
pub struct PassModeActuator {
    name: String,
    effector_name: String,
    requested: bool,
}

impl PassModeActuator {
    pub fn new(name: impl Into<String>, effector_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            effector_name: effector_name.into(),
            requested: false,
        }
    }

    pub fn set(&mut self, requested: bool) {
        self.requested = requested;
    }
}

impl Actuator for PassModeActuator {
    fn name(&self) -> &str {
        &self.name
    }

    fn effector_name(&self) -> &str {
        &self.effector_name
    }

    fn commit(&mut self, action: &mut Action) {
        if self.requested {
            action.put(self.effector_name.clone(), Effector::PassMode);
        }
        self.requested = false;
    }
}
