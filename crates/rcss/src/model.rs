use std::collections::HashMap;

use magma_core::config::AgentCfg;
use magma_core::model::{Actuator, ActuatorSet, AgentModel, Motor, OmniSpeedActuator, RobotModel};
use magma_core::types::{Action, GameStateInfo, Perception, Pose2};

use crate::actuators::{
    BeamActuator, CreateActuator, InitActuator, PassModeActuator, SayActuator, SyncActuator,
};

/// One controllable hinge joint: the perceptor it reports under and the effector driving it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointSpec {
    pub perceptor: &'static str,
    pub effector: &'static str,
    pub max_velocity: f64,
    pub max_effort: f64,
}

const fn joint(perceptor: &'static str, effector: &'static str, max_velocity: f64, max_effort: f64) -> JointSpec {
    JointSpec {
        perceptor,
        effector,
        max_velocity,
        max_effort,
    }
}

// ── Robot tables ────────────────────────────────────────────────

const NAO_JOINTS: [JointSpec; 22] = [
    joint("hj1", "he1", 7.03, 0.0),
    joint("hj2", "he2", 7.03, 0.0),
    joint("raj1", "rae1", 7.03, 0.0),
    joint("raj2", "rae2", 7.03, 0.0),
    joint("raj3", "rae3", 7.03, 0.0),
    joint("raj4", "rae4", 7.03, 0.0),
    joint("rlj1", "rle1", 7.03, 0.0),
    joint("rlj2", "rle2", 7.03, 0.0),
    joint("rlj3", "rle3", 7.03, 0.0),
    joint("rlj4", "rle4", 7.03, 0.0),
    joint("rlj5", "rle5", 7.03, 0.0),
    joint("rlj6", "rle6", 7.03, 0.0),
    joint("laj1", "lae1", 7.03, 0.0),
    joint("laj2", "lae2", 7.03, 0.0),
    joint("laj3", "lae3", 7.03, 0.0),
    joint("laj4", "lae4", 7.03, 0.0),
    joint("llj1", "lle1", 7.03, 0.0),
    joint("llj2", "lle2", 7.03, 0.0),
    joint("llj3", "lle3", 7.03, 0.0),
    joint("llj4", "lle4", 7.03, 0.0),
    joint("llj5", "lle5", 7.03, 0.0),
    joint("llj6", "lle6", 7.03, 0.0),
];

const NAO_TOES: [JointSpec; 2] = [
    joint("rlj7", "rle7", 7.03, 0.0),
    joint("llj7", "lle7", 7.03, 0.0),
];

/// Heterogeneous Nao variant with toe joints.
const NAO_TOE_TYPE: i64 = 4;

const T1_JOINTS: [JointSpec; 23] = [
    joint("q_hj1", "he1", 10.0, 7.0),
    joint("q_hj2", "he2", 10.0, 7.0),
    joint("q_laj1", "lae1", 10.0, 18.0),
    joint("q_laj2", "lae2", 10.0, 18.0),
    joint("q_laj3", "lae3", 10.0, 18.0),
    joint("q_laj4", "lae4", 10.0, 18.0),
    joint("q_raj1", "rae1", 10.0, 18.0),
    joint("q_raj2", "rae2", 10.0, 18.0),
    joint("q_raj3", "rae3", 10.0, 18.0),
    joint("q_raj4", "rae4", 10.0, 18.0),
    joint("q_tj1", "te1", 10.0, 30.0),
    joint("q_llj1", "lle1", 10.0, 45.0),
    joint("q_llj2", "lle2", 10.0, 30.0),
    joint("q_llj3", "lle3", 10.0, 30.0),
    joint("q_llj4", "lle4", 10.0, 60.0),
    joint("q_llj5", "lle5", 10.0, 20.0),
    joint("q_llj6", "lle6", 10.0, 15.0),
    joint("q_rlj1", "rle1", 10.0, 45.0),
    joint("q_rlj2", "rle2", 10.0, 30.0),
    joint("q_rlj3", "rle3", 10.0, 30.0),
    joint("q_rlj4", "rle4", 10.0, 60.0),
    joint("q_rlj5", "rle5", 10.0, 20.0),
    joint("q_rlj6", "rle6", 10.0, 15.0),
];

/// Joints and virtual actuators of one simulated robot.
#[derive(Debug, Clone)]
pub struct RobotSpec {
    pub name: &'static str,
    pub joints: Vec<JointSpec>,
    /// Needs a scene-creation step before init.
    pub create: bool,
    pub say: bool,
    pub pass_mode: bool,
}

impl RobotSpec {
    /// SimSpark heterogeneous Nao. Type 4 adds the toe joints.
    pub fn nao(model_type: i64) -> Self {
        let mut joints = NAO_JOINTS.to_vec();
        if model_type == NAO_TOE_TYPE {
            joints.extend(NAO_TOES);
        }
        Self {
            name: "nao_hetero",
            joints,
            create: true,
            say: true,
            pass_mode: true,
        }
    }

    /// Booster T1 of the MuJoCo server.
    pub fn t1() -> Self {
        Self {
            name: "t1",
            joints: T1_JOINTS.to_vec(),
            create: false,
            say: false,
            pass_mode: false,
        }
    }
}

// ── Agent model ─────────────────────────────────────────────────

/// Minimal soccer agent state: simulation time, joint angles, referee state,
/// and the robot's actuators.
pub struct RcssAgentModel {
    robot: &'static str,
    team_name: String,
    player_no: i64,
    beam_pose: Pose2,

    time: f64,
    joints: HashMap<String, f64>,
    game_state: Option<GameStateInfo>,

    motors: ActuatorSet<Motor>,
    omni: ActuatorSet<OmniSpeedActuator>,
    create: Option<CreateActuator>,
    init: Option<InitActuator>,
    beam: Option<BeamActuator>,
    say: Option<SayActuator>,
    pass_mode: Option<PassModeActuator>,
    sync: SyncActuator,
}

impl RcssAgentModel {
    pub fn new(cfg: &AgentCfg, robot: RobotSpec) -> Self {
        let mut motors = ActuatorSet::new();
        for j in &robot.joints {
            motors.push(Motor::new(j.perceptor, j.effector, j.max_velocity, j.max_effort));
        }

        Self {
            robot: robot.name,
            team_name: cfg.team_name.clone(),
            player_no: i64::from(cfg.player_no),
            beam_pose: Pose2::new(cfg.beam_x, cfg.beam_y, cfg.beam_theta),
            time: 0.0,
            joints: HashMap::new(),
            game_state: None,
            motors,
            omni: ActuatorSet::new(),
            create: robot
                .create
                .then(|| CreateActuator::new("create", "scene", cfg.scene.clone(), cfg.model_type)),
            init: Some(InitActuator::new("init", "init", cfg.model_name.clone())),
            beam: Some(BeamActuator::new("beam", "beam")),
            say: robot.say.then(|| SayActuator::new("say", "say")),
            pass_mode: robot.pass_mode.then(|| PassModeActuator::new("pass_mode", "pass")),
            sync: SyncActuator::new("sync", "syn", true),
        }
    }

    pub fn robot(&self) -> &str {
        self.robot
    }

    pub fn team_name(&self) -> &str {
        &self.team_name
    }

    /// Requested number until the referee assigns one.
    pub fn player_no(&self) -> i64 {
        self.player_no
    }

    pub fn beam_pose(&self) -> Pose2 {
        self.beam_pose
    }

    pub fn joint_position(&self, perceptor: &str) -> Option<f64> {
        self.joints.get(perceptor).copied()
    }

    pub fn game_state(&self) -> Option<&GameStateInfo> {
        self.game_state.as_ref()
    }

    pub fn play_mode(&self) -> &str {
        self.game_state
            .as_ref()
            .map_or("", |gs| gs.play_mode.as_str())
    }

    pub fn create_mut(&mut self) -> Option<&mut CreateActuator> {
        self.create.as_mut()
    }

    pub fn init_mut(&mut self) -> Option<&mut InitActuator> {
        self.init.as_mut()
    }

    pub fn beam_mut(&mut self) -> Option<&mut BeamActuator> {
        self.beam.as_mut()
    }

    /// Team-talk hook for behaviors built on this model. The stock set never speaks.
    pub fn say_mut(&mut self) -> Option<&mut SayActuator> {
        self.say.as_mut()
    }

    /// Pass-mode hook for behaviors built on this model, like [`say_mut`](Self::say_mut).
    pub fn pass_mode_mut(&mut self) -> Option<&mut PassModeActuator> {
        self.pass_mode.as_mut()
    }

    pub fn has_create(&self) -> bool {
        self.create.is_some()
    }

    pub fn has_init(&self) -> bool {
        self.init.is_some()
    }

    pub fn has_beam(&self) -> bool {
        self.beam.is_some()
    }
}

impl AgentModel for RcssAgentModel {
    fn update(&mut self, perception: &Perception) {
        self.time = perception.time();
        for (name, state) in perception.joint_states() {
            self.joints.insert(name.to_owned(), state.position);
        }
        if let Some(gs) = perception.game_state() {
            if gs.player_no > 0 && gs.player_no != self.player_no {
                tracing::info!(player_no = gs.player_no, "player number assigned by referee");
                self.player_no = gs.player_no;
            }
            self.game_state = Some(gs.clone());
        }
    }

    fn generate_action(&mut self) -> Action {
        let mut action = Action::new();
        self.motors.commit_all(&mut action);
        self.omni.commit_all(&mut action);

        let one_shots: [Option<&mut dyn Actuator>; 5] = [
            self.create.as_mut().map(|a| a as &mut dyn Actuator),
            self.init.as_mut().map(|a| a as &mut dyn Actuator),
            self.beam.as_mut().map(|a| a as &mut dyn Actuator),
            self.say.as_mut().map(|a| a as &mut dyn Actuator),
            self.pass_mode.as_mut().map(|a| a as &mut dyn Actuator),
        ];
        for actuator in one_shots.into_iter().flatten() {
            actuator.commit(&mut action);
        }

        self.sync.commit(&mut action);
        action
    }

    fn time(&self) -> f64 {
        self.time
    }
}

impl RobotModel for RcssAgentModel {
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

#[cfg(test)]
mod tests {
    use magma_core::types::{Effector, Perceptor};

    use super::*;

    fn nao() -> RcssAgentModel {
        RcssAgentModel::new(&AgentCfg::default(), RobotSpec::nao(0))
    }

    #[test]
    fn robot_tables() {
        assert_eq!(RobotSpec::nao(0).joints.len(), 22);
        assert_eq!(RobotSpec::nao(NAO_TOE_TYPE).joints.len(), 24);
        let t1 = RobotSpec::t1();
        assert!(!t1.create);
        assert!(t1.joints.iter().any(|j| j.effector == "te1"));
    }

    #[test]
    fn update_tracks_time_joints_and_referee() {
        let mut model = nao();
        let p = Perception::builder()
            .time(3.5)
            .with(
                "hj1",
                Perceptor::JointState {
                    position: 12.0,
                    velocity: 0.0,
                    effort: 0.0,
                },
            )
            .with(
                "game_state",
                Perceptor::GameState(GameStateInfo {
                    play_mode: "BeforeKickOff".into(),
                    player_no: 9,
                    ..GameStateInfo::default()
                }),
            )
            .build();
        model.update(&p);

        assert_eq!(model.time(), 3.5);
        assert_eq!(model.joint_position("hj1"), Some(12.0));
        assert_eq!(model.joint_position("hj2"), None);
        assert_eq!(model.play_mode(), "BeforeKickOff");
        assert_eq!(model.player_no(), 9);
    }

    #[test]
    fn action_has_every_motor_then_sync() {
        let mut model = nao();
        let action = model.generate_action();
        assert_eq!(action.len(), 23);
        let names: Vec<_> = action.iter().map(|(n, _)| n).collect();
        assert_eq!(names[0], "he1");
        assert_eq!(names.last(), Some(&"syn"));
    }

    #[test]
    fn one_shot_actuators_commit_in_the_next_action_only() {
        let mut model = nao();
        if let Some(create) = model.create_mut() {
            create.set(true);
        }
        let action = model.generate_action();
        assert!(matches!(action.get("scene"), Some(Effector::Create { .. })));

        let action = model.generate_action();
        assert!(action.get("scene").is_none());
    }

    #[test]
    fn nao_can_talk_and_request_pass_mode() {
        let mut model = nao();
        if let Some(say) = model.say_mut() {
            say.set("pass");
        }
        if let Some(pass) = model.pass_mode_mut() {
            pass.set(true);
        }
        let action = model.generate_action();
        assert_eq!(action.get("say"), Some(&Effector::Say("pass".into())));
        assert_eq!(action.get("pass"), Some(&Effector::PassMode));
        let names: Vec<_> = action.iter().map(|(n, _)| n).collect();
        assert_eq!(&names[names.len() - 3..], ["say", "pass", "syn"]);

        let action = model.generate_action();
        assert!(action.get("say").is_none());
        assert!(action.get("pass").is_none());
    }

    #[test]
    fn t1_has_no_create_actuator() {
        let mut model = RcssAgentModel::new(&AgentCfg::default(), RobotSpec::t1());
        assert!(!model.has_create());
        assert!(model.create_mut().is_none());
        assert!(model.say_mut().is_none());
        assert!(model.has_init());
    }
}
