use anyhow::Context;
use magma_core::channel::ChannelManager;
use magma_core::config::AgentCfg;
use magma_core::runtime::AgentRuntime;
use magma_rcss::{Dialect, RcssAgentModel};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Tracing: RUST_LOG overrides the default level; MAGMA_LOG_JSON=1 switches to json lines
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("MAGMA_LOG_JSON").is_ok_and(|v| v != "0");
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }

    // Config: defaults < MAGMA_* env < key=value args
    let (cfg, rejected) = AgentCfg::from_env_and_args(std::env::args().skip(1));
    for arg in &rejected {
        tracing::warn!(arg = %arg, "ignoring argument, expected key=value");
    }
    for (key, value, _) in cfg.to_entries() {
        tracing::debug!(key, value = %value, "config");
    }

    let dialect: Dialect = cfg.dialect.parse()?;
    tracing::info!(
        dialect = %dialect,
        server = %cfg.addr(),
        team = %cfg.team_name,
        player_no = cfg.player_no,
        "starting agent"
    );

    let model = RcssAgentModel::new(&cfg, dialect.robot(&cfg));
    let decision_maker =
        magma_rcss::decision_maker(&model).context("failed to build behavior set")?;

    let mut channels = ChannelManager::new();
    channels
        .register(Box::new(dialect.channel(&cfg)))
        .await
        .context("failed to register simulator channel")?;

    let mut runtime = AgentRuntime::new(&cfg, channels, model, decision_maker);
    let signals = runtime.shutdown_trigger().spawn_signal_listener();

    let result = runtime.run().await;
    signals.abort();
    let summary = result.with_context(|| format!("could not connect to simulator at {}", cfg.addr()))?;

    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
