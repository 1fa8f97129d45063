use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Prefix of the environment variables read by [`AgentCfg::from_env`].
pub const ENV_PREFIX: &str = "MAGMA_";

/// Agent process parameters. Built from defaults, then overridden by
/// `MAGMA_*` environment variables and `key=value` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCfg {
    // simulator endpoint
    pub host: String,
    pub port: u16,

    // identity
    pub team_name: String,
    pub player_no: u32,

    // protocol dialect and robot model
    pub dialect: String,
    pub scene: String,
    pub model_type: i64,
    pub model_name: String,

    // kick-off placement, beamed once after init
    pub beam_x: f64,
    pub beam_y: f64,
    pub beam_theta: f64,

    // transport
    pub queue_capacity: usize,
    pub poll_timeout_ms: u64,
    pub receive_buffer_size: usize,
    pub max_frame_len: usize,
}

impl Default for AgentCfg {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3100,
            team_name: "magma".into(),
            player_no: 1,
            dialect: "spark".into(),
            scene: "rsg/agent/nao/nao_hetero.rsg".into(),
            model_type: 0,
            model_name: "T1".into(),
            beam_x: -5.0,
            beam_y: 0.0,
            beam_theta: 0.0,
            queue_capacity: 256,
            poll_timeout_ms: 100,
            receive_buffer_size: 8192,
            max_frame_len: 16 * 1024 * 1024,
        }
    }
}

impl AgentCfg {
    /// Read every `MAGMA_<KEY>` variable that is set; missing or unparsable keys keep defaults.
    pub fn from_env() -> Self {
        Self::from_map(&env_map())
    }

    /// Environment values overridden by `key=value` arguments.
    /// Arguments without `=` are returned as unrecognised.
    pub fn from_env_and_args<I, S>(args: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = env_map();
        let mut rejected = Vec::new();
        for arg in args {
            let arg = arg.as_ref();
            match arg.split_once('=') {
                Some((key, value)) => {
                    map.insert(key.trim().to_ascii_lowercase(), value.trim().to_owned());
                }
                None => rejected.push(arg.to_owned()),
            }
        }
        (Self::from_map(&map), rejected)
    }

    pub fn from_map(m: &HashMap<String, String>) -> Self {
        let d = Self::default();
        Self {
            host: get_or(m, "host", d.host),
            port: get_or(m, "port", d.port),
            team_name: get_or(m, "team_name", d.team_name),
            player_no: get_or(m, "player_no", d.player_no),
            dialect: get_or(m, "dialect", d.dialect),
            scene: get_or(m, "scene", d.scene),
            model_type: get_or(m, "model_type", d.model_type),
            model_name: get_or(m, "model_name", d.model_name),
            beam_x: get_or(m, "beam_x", d.beam_x),
            beam_y: get_or(m, "beam_y", d.beam_y),
            beam_theta: get_or(m, "beam_theta", d.beam_theta),
            queue_capacity: get_or(m, "queue_capacity", d.queue_capacity),
            poll_timeout_ms: get_or(m, "poll_timeout_ms", d.poll_timeout_ms),
            receive_buffer_size: get_or(m, "receive_buffer_size", d.receive_buffer_size),
            max_frame_len: get_or(m, "max_frame_len", d.max_frame_len),
        }
    }

    pub fn to_entries(&self) -> Vec<(&str, String, &str)> {
        vec![
            ("host", self.host.clone(), "Simulator host"),
            ("port", self.port.to_string(), "Simulator agent port"),
            ("team_name", self.team_name.clone(), "Team name sent on init"),
            ("player_no", self.player_no.to_string(), "Requested player number"),
            ("dialect", self.dialect.clone(), "Protocol dialect (spark | smj)"),
            ("scene", self.scene.clone(), "Robot scene file to spawn"),
            ("model_type", self.model_type.to_string(), "Robot model variant"),
            ("model_name", self.model_name.clone(), "Robot model name (smj)"),
            ("beam_x", self.beam_x.to_string(), "Kick-off position x"),
            ("beam_y", self.beam_y.to_string(), "Kick-off position y"),
            ("beam_theta", self.beam_theta.to_string(), "Kick-off heading in degrees"),
            ("queue_capacity", self.queue_capacity.to_string(), "Perception queue capacity"),
            ("poll_timeout_ms", self.poll_timeout_ms.to_string(), "Runtime queue wait ms"),
            ("receive_buffer_size", self.receive_buffer_size.to_string(), "Initial receive buffer bytes"),
            ("max_frame_len", self.max_frame_len.to_string(), "Largest accepted frame bytes"),
        ]
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms.max(1))
    }
}

fn env_map() -> HashMap<String, String> {
    std::env::vars()
        .filter_map(|(k, v)| {
            k.strip_prefix(ENV_PREFIX)
                .map(|key| (key.to_ascii_lowercase(), v))
        })
        .collect()
}

fn get_or<T: std::str::FromStr>(map: &HashMap<String, String>, key: &str, default: T) -> T {
    map.get(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
