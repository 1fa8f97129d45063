use magma_core::codec::{MessageEncoder, SExpr, sexpr};
use magma_core::types::{Action, Effector};

/// Shortest round-trip form (`0.0`, `1.5`). Magnitudes below `1e-4` or from
/// `1e16` up use exponent notation without padding or sign (`1.5e-7`, `2e16`).
fn num(value: f64) -> SExpr {
    SExpr::atom(format!("{value:?}"))
}

/// Round up to three decimals.
fn round3(value: f64) -> f64 {
    (value * 1000.0).ceil() / 1000.0
}

// ── SimSpark ────────────────────────────────────────────────────

/// Effector messages for the SimSpark server.
///
/// A `Create` or `Init` command is a handshake step and is sent on its own; every
/// other command in the same action is dropped. Motors are velocity controlled.
#[derive(Debug, Default)]
pub struct SparkEncoder;

impl SparkEncoder {
    pub fn new() -> Self {
        Self
    }

    fn render(action: &Action) -> Vec<SExpr> {
        let mut out = Vec::with_capacity(action.len());
        for (name, effector) in action.iter() {
            match effector {
                Effector::Create { scene, model_type } => {
                    return vec![SExpr::tagged(
                        name,
                        [SExpr::atom(scene), SExpr::atom(model_type)],
                    )];
                }
                Effector::Init {
                    team_name,
                    player_no,
                    ..
                } => {
                    return vec![SExpr::tagged(
                        name,
                        [
                            SExpr::tagged("unum", [SExpr::atom(player_no)]),
                            SExpr::tagged("teamname", [SExpr::atom(team_name)]),
                        ],
                    )];
                }
                Effector::Beam(pose) => out.push(SExpr::tagged(
                    name,
                    [num(pose.x), num(pose.y), num(pose.theta_deg)],
                )),
                Effector::Motor { velocity, .. } => {
                    out.push(SExpr::tagged(name, [num(*velocity)]));
                }
                Effector::Say(message) => out.push(SExpr::tagged(name, [SExpr::atom(message)])),
                Effector::Sync | Effector::PassMode => out.push(SExpr::list([SExpr::atom(name)])),
                Effector::OmniSpeed(_) => {}
            }
        }
        out
    }
}

impl MessageEncoder for SparkEncoder {
    fn encode(&self, action: &Action) -> Vec<u8> {
        sexpr::encode(&Self::render(action)).into_bytes()
    }
}

// ── rcsssmj ─────────────────────────────────────────────────────

/// Effector messages for the MuJoCo based server. Motors carry the full PD target
/// and all numbers are rounded up to three decimals.
#[derive(Debug, Default)]
pub struct SmjEncoder;

impl SmjEncoder {
    pub fn new() -> Self {
        Self
    }

    fn render(action: &Action) -> Vec<SExpr> {
        let mut out = Vec::with_capacity(action.len());
        for (name, effector) in action.iter() {
            match effector {
                Effector::Init {
                    team_name,
                    player_no,
                    model_name,
                } => {
                    return vec![SExpr::tagged(
                        name,
                        [
                            SExpr::atom(model_name),
                            SExpr::atom(team_name),
                            SExpr::atom(player_no),
                        ],
                    )];
                }
                Effector::Beam(pose) => out.push(SExpr::tagged(
                    name,
                    [
                        num(round3(pose.x)),
                        num(round3(pose.y)),
                        num(round3(pose.theta_deg)),
                    ],
                )),
                Effector::Motor {
                    position,
                    velocity,
                    kp,
                    kd,
                    tau,
                } => out.push(SExpr::tagged(
                    name,
                    [position, velocity, kp, kd, tau].map(|v| num(round3(*v))),
                )),
                Effector::Sync => out.push(SExpr::list([SExpr::atom(name)])),
                _ => {}
            }
        }
        out
    }
}

impl MessageEncoder for SmjEncoder {
    fn encode(&self, action: &Action) -> Vec<u8> {
        sexpr::encode(&Self::render(action)).into_bytes()
    }
}
