use clap::{Parser, Subcommand};
use futures::future::join_all;
use simviator::bot_control::{BotControl, EventSink, LogSink};
use simviator::config::{AppConfig, NodeRole, OrchestratorConfig};
use simviator::engine::{EventOutlet, RemoteOutlet, run_forwarder};
use simviator::fatal;
use simviator::flight_control::run_ingest;
use simviator::http_handler::{node_routes, register_with_orchestrator, serve};
use simviator::keychain::EngineKeychain;
use simviator::logger;
use simviator::orchestrator::{HttpTransport, NodeDescriptor, Orchestrator, orchestrator_routes};
use std::{path::PathBuf, sync::Arc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "simviator", version, about = "Flight commentary engine and service orchestrator")]
struct Cli {
    /// TOML configuration; built-in defaults when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Bind address of the node being run.
    #[arg(long, global = true)]
    bind: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Commentary engine fed by the simulated flight.
    Engine,
    /// Service orchestrator.
    Orchestrator,
    /// Bot-platform sink.
    BotControl,
    /// All three nodes in one process.
    All,
    /// Writes the default configuration to PATH.
    SaveConfig { path: PathBuf },
}

impl Command {
    fn role(&self) -> Option<NodeRole> {
        match self {
            Command::Engine => Some(NodeRole::Engine),
            Command::Orchestrator | Command::All => Some(NodeRole::Orchestrator),
            Command::BotControl => Some(NodeRole::BotControl),
            Command::SaveConfig { .. } => None,
        }
    }
}

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    let cli = Cli::parse();
    let Some(role) = cli.command.role() else {
        logger::init(cli.log_level.as_deref().unwrap_or("info"));
        if let Command::SaveConfig { path } = &cli.command {
            match AppConfig::save_default(path) {
                Ok(()) => info!("Default configuration written to {}", path.display()),
                Err(e) => fatal!("{e}"),
            }
        }
        return;
    };

    let loaded = match &cli.config {
        Some(path) => AppConfig::load(path),
        None => Ok(AppConfig::default()),
    };
    let level = cli
        .log_level
        .clone()
        .or_else(|| loaded.as_ref().ok().map(|c| c.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());
    logger::init(&level);
    let mut config = loaded.unwrap_or_else(|e| fatal!("{e}"));
    config.apply_env(role);
    if let Some(bind) = &cli.bind {
        *config.bind_mut(role) = bind.clone();
    }
    if let Err(e) = config.validate() {
        fatal!("{e}");
    }

    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone());
    match cli.command {
        Command::Engine => run_engine(config, cancel).await,
        Command::Orchestrator => run_orchestrator(config, cancel).await,
        Command::BotControl => run_bot_control(config, cancel).await,
        Command::All => run_all(config, cancel).await,
        Command::SaveConfig { .. } => {}
    }
    info!("Shutdown complete");
}

fn spawn_shutdown_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested");
                cancel.cancel();
            }
            Err(e) => error!("Cannot listen for the shutdown signal: {e}"),
        }
    });
}

/// Serves `router` until `cancel` fires. A failed bind cancels the whole
/// process.
async fn serve_until_cancelled(router: axum::Router, bind: String, cancel: CancellationToken) {
    if let Err(e) = serve(router, &bind, cancel.clone()).await {
        error!("Server on {bind} failed: {e}");
        cancel.cancel();
    }
}

async fn announce(orchestrator: OrchestratorConfig, descriptor: NodeDescriptor, cancel: CancellationToken) {
    let node_id = descriptor.node_id().to_string();
    let result = register_with_orchestrator(
        &orchestrator.url,
        descriptor,
        orchestrator.register_attempts,
        orchestrator.delivery_timeout(),
        &cancel,
    )
    .await;
    if let Err(e) = result {
        warn!("Giving up registering {node_id}: {e}");
    }
}

/// Starts telemetry, tick loop and forwarder of an engine whose events leave
/// through `outlet`.
fn spawn_engine(
    config: &AppConfig,
    outlet: Arc<dyn EventOutlet>,
    cancel: &CancellationToken,
) -> (axum::Router, Vec<JoinHandle<()>>) {
    let draw = EngineKeychain::draw_for(config.engine.seed);
    let keychain = EngineKeychain::assemble(config, draw)
        .unwrap_or_else(|e| fatal!("Cannot load the character cast: {e}"));
    let router = node_routes(Arc::new(keychain.node()), config.orchestrator.probe_timeout());
    let (engine, writer, events, telemetry) = keychain.into_parts();
    let tasks = vec![
        tokio::spawn(run_ingest(telemetry, writer, cancel.clone())),
        tokio::spawn(engine.run(config.engine.tick_interval(), cancel.clone())),
        tokio::spawn(run_forwarder(events, outlet, cancel.clone())),
    ];
    (router, tasks)
}

fn build_bot_control(config: &AppConfig) -> Arc<BotControl> {
    let sinks: Vec<Arc<dyn EventSink>> = vec![Arc::new(LogSink)];
    Arc::new(BotControl::new(
        &config.bot_control.node.name,
        &config.bot_control.default_personality,
        sinks,
    ))
}

async fn run_engine(config: AppConfig, cancel: CancellationToken) {
    let outlet = RemoteOutlet::new(&config.orchestrator.url, config.orchestrator.publish_timeout())
        .unwrap_or_else(|e| fatal!("Cannot build the orchestrator client: {e}"));
    let (router, mut tasks) = spawn_engine(&config, Arc::new(outlet), &cancel);
    tasks.push(tokio::spawn(announce(
        config.orchestrator.clone(),
        config.engine.node.descriptor(),
        cancel.clone(),
    )));
    serve_until_cancelled(router, config.engine.node.bind.clone(), cancel.clone()).await;
    cancel.cancel();
    join_all(tasks).await;
}

async fn run_orchestrator(config: AppConfig, cancel: CancellationToken) {
    let settings = config.orchestrator;
    let transport = Arc::new(HttpTransport::new(settings.delivery_timeout()));
    let orchestrator = Arc::new(Orchestrator::new(settings.clone(), transport));
    orchestrator.seed().await;
    let health = tokio::spawn(Arc::clone(&orchestrator).run_health_loop(cancel.clone()));
    let router = orchestrator_routes(Arc::clone(&orchestrator), settings.probe_timeout());
    serve_until_cancelled(router, settings.bind.clone(), cancel.clone()).await;
    cancel.cancel();
    if let Err(e) = health.await {
        error!("Health monitor panicked: {e}");
    }
    orchestrator.teardown().await;
}

async fn run_bot_control(config: AppConfig, cancel: CancellationToken) {
    let bot = build_bot_control(&config);
    let registration = tokio::spawn(announce(
        config.orchestrator.clone(),
        config.bot_control.node.descriptor(),
        cancel.clone(),
    ));
    let router = node_routes(bot, config.orchestrator.probe_timeout());
    serve_until_cancelled(router, config.bot_control.node.bind.clone(), cancel.clone()).await;
    cancel.cancel();
    let _ = registration.await;
}

/// Runs the orchestrator with the engine and the bot sink attached. The
/// engine publishes in process; the bot sink is still reached over HTTP.
async fn run_all(config: AppConfig, cancel: CancellationToken) {
    let settings = config.orchestrator.clone();
    let transport = Arc::new(HttpTransport::new(settings.delivery_timeout()));
    let orchestrator = Arc::new(Orchestrator::new(settings.clone(), transport));
    orchestrator.seed().await;
    orchestrator.register(config.engine.node.descriptor()).await;
    orchestrator.register(config.bot_control.node.descriptor()).await;

    let outlet: Arc<dyn EventOutlet> = Arc::clone(&orchestrator) as Arc<dyn EventOutlet>;
    let (engine_router, mut tasks) = spawn_engine(&config, outlet, &cancel);
    tasks.push(tokio::spawn(Arc::clone(&orchestrator).run_health_loop(cancel.clone())));
    let bot_router = node_routes(build_bot_control(&config), settings.probe_timeout());

    tokio::join!(
        serve_until_cancelled(
            orchestrator_routes(Arc::clone(&orchestrator), settings.probe_timeout()),
            settings.bind.clone(),
            cancel.clone(),
        ),
        serve_until_cancelled(engine_router, config.engine.node.bind.clone(), cancel.clone()),
        serve_until_cancelled(bot_router, config.bot_control.node.bind.clone(), cancel.clone()),
    );
    cancel.cancel();
    join_all(tasks).await;
    orchestrator.teardown().await;
}
