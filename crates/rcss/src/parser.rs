use magma_core::codec::{CodecError, MessageParser, SExpr, sexpr};
use magma_core::types::{
    GameStateInfo, LineDetection, ObjectDetection, Perception, Perceptor, PlayerDetection, Vec3,
};

/// Name of the body part a bare `(pol ..)` inside a player detection refers to.
const TORSO: &str = "torso";

/// Reads the perceptor messages of the soccer simulation server.
///
/// Unknown top-level tags are skipped. A known tag with a malformed body fails the
/// whole message.
#[derive(Debug, Default)]
pub struct RcssParser;

impl RcssParser {
    pub fn new() -> Self {
        Self
    }
}

impl MessageParser for RcssParser {
    fn parse(&mut self, msg: &[u8]) -> Result<Perception, CodecError> {
        let mut perception = Perception::builder();

        for node in sexpr::parse_bytes(msg)? {
            let Some(tag) = node.tag() else {
                continue;
            };

            match tag {
                "time" => {
                    let now = node.list_at(1)?;
                    let time = now.f64_at(1)?;
                    perception.put(now.atom_at(0)?, Perceptor::Time(time));
                    perception.set_time(time);
                }
                "GS" => {
                    perception.put("game_state", Perceptor::GameState(game_state(&node)?));
                }
                "AgentState" => {
                    let (mut temperature, mut battery) = (0, 0);
                    for child in node.sublists() {
                        match child.tag() {
                            Some("temp") => temperature = child.i64_at(1)?,
                            Some("battery") => battery = child.i64_at(1)?,
                            _ => {}
                        }
                    }
                    perception.put("agent_state", Perceptor::AgentState { temperature, battery });
                }
                "HJ" => {
                    let mut name = String::new();
                    let mut position = 0.0;
                    for child in node.sublists() {
                        match child.tag() {
                            Some("n") => name = child.atom_at(1)?.to_owned(),
                            Some("ax") => position = child.f64_at(1)?,
                            _ => {}
                        }
                    }
                    perception.put(
                        name,
                        Perceptor::JointState {
                            position,
                            velocity: 0.0,
                            effort: 0.0,
                        },
                    );
                }
                "GYR" => {
                    let (name, rate) = named_vec3(&node, "rt")?;
                    perception.put(format!("{name}_gyro"), Perceptor::GyroRate(rate));
                }
                "ACC" => {
                    let (name, acc) = named_vec3(&node, "a")?;
                    perception.put(format!("{name}_acc"), Perceptor::Accelerometer(acc));
                }
                "TCH" => {
                    perception.put(
                        node.atom_at(2)?,
                        Perceptor::Bumper {
                            active: node.bool_at(4)?,
                        },
                    );
                }
                "FRP" => {
                    let mut name = String::new();
                    let (mut origin, mut force) = (Vec3::ZERO, Vec3::ZERO);
                    for child in node.sublists() {
                        match child.tag() {
                            Some("n") => name = child.atom_at(1)?.to_owned(),
                            Some("c") => origin = child.vec3_at(1)?,
                            Some("f") => force = child.vec3_at(1)?,
                            _ => {}
                        }
                    }
                    perception.put(name, Perceptor::ForceResistance { origin, force });
                }
                "See" => {
                    perception.put(tag, vision(&node)?);
                }
                "hear" => {
                    let message = (4..node.items().len())
                        .map(|i| node.atom_at(i))
                        .collect::<Result<Vec<_>, _>>()?
                        .join(" ");
                    perception.put(
                        tag,
                        Perceptor::Hear {
                            team: node.atom_at(1)?.to_owned(),
                            time: node.f64_at(2)?,
                            direction: node.atom_at(3)?.to_owned(),
                            message,
                        },
                    );
                }
                other => {
                    tracing::trace!(tag = %other, "ignoring unknown perceptor");
                }
            }
        }

        Ok(perception.build())
    }
}

/// `(GS (t <time>) (pm <mode>) (team <side>) (unum <n>) (sl <n>) (sr <n>))`, any subset, any order.
fn game_state(node: &SExpr) -> Result<GameStateInfo, CodecError> {
    let mut gs = GameStateInfo::default();
    for child in node.sublists() {
        match child.tag() {
            Some("t") => gs.play_time = child.f64_at(1)?,
            Some("team") => gs.play_side = child.atom_at(1)?.to_owned(),
            Some("pm") => gs.play_mode = child.atom_at(1)?.to_owned(),
            Some("unum") => gs.player_no = child.i64_at(1)?,
            Some("sl") => gs.score_left = child.i64_at(1)?,
            Some("sr") => gs.score_right = child.i64_at(1)?,
            _ => {}
        }
    }
    Ok(gs)
}

/// `(<tag> (n <name>) (<key> x y z))`
fn named_vec3(node: &SExpr, key: &str) -> Result<(String, Vec3), CodecError> {
    let mut name = String::new();
    let mut value = Vec3::ZERO;
    for child in node.sublists() {
        match child.tag() {
            Some("n") => name = child.atom_at(1)?.to_owned(),
            Some(k) if k == key => value = child.vec3_at(1)?,
            _ => {}
        }
    }
    Ok((name, value))
}

fn vision(node: &SExpr) -> Result<Perceptor, CodecError> {
    let mut objects = Vec::new();
    let mut lines = Vec::new();
    let mut players = Vec::new();

    for child in node.sublists() {
        match child.tag() {
            Some("P") => players.push(player(child)?),
            Some("L") => lines.push(LineDetection {
                start: pol(child.list_at(1)?)?,
                end: pol(child.list_at(2)?)?,
            }),
            _ => objects.push(ObjectDetection {
                name: child.atom_at(0)?.to_owned(),
                position: pol(child.list_at(1)?)?,
            }),
        }
    }

    Ok(Perceptor::Vision {
        objects,
        lines,
        players,
    })
}

fn player(node: &SExpr) -> Result<PlayerDetection, CodecError> {
    let mut detection = PlayerDetection {
        team_name: String::new(),
        player_no: 0,
        body_parts: Vec::new(),
    };

    for child in node.sublists() {
        match child.tag() {
            Some("team") => detection.team_name = child.atom_at(1)?.to_owned(),
            Some("id") => detection.player_no = child.i64_at(1)?,
            Some("pol") => detection.body_parts.push((TORSO.to_owned(), pol(child)?)),
            Some(part) => {
                if let Ok(p) = child.list_at(1) {
                    detection.body_parts.push((part.to_owned(), pol(p)?));
                }
            }
            None => {}
        }
    }

    Ok(detection)
}

/// `(pol <distance> <azimuth> <elevation>)`, angles in degrees.
fn pol(node: &SExpr) -> Result<Vec3, CodecError> {
    Ok(Vec3::from_polar_deg(
        node.f64_at(1)?,
        node.f64_at(2)?,
        node.f64_at(3)?,
    ))
}
