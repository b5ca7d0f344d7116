//! Command-line harness for the AMAIMA core.
//!
//! A one-shot driver: route a query, load the module the router selected,
//! and optionally verify a candidate output against it. The HTTP surface
//! that would front this in production is an external collaborator (spec
//! §1) — this binary exists so the core is exercisable standalone.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use amaima_core::config::RuntimeConfig;
use amaima_core::loader::ProgressiveModelLoader;
use amaima_core::probes::{ConnectivityProbe, DeviceProbe, SystemConnectivityProbe, SystemDeviceProbe};
use amaima_core::router::{ModelSize, RouterConfig, SmartRouter};
use amaima_core::verify::{VerificationContext, VerificationEngine, VerificationOutput};

#[derive(Parser)]
#[command(name = "amaima-core", version, about = "AMAIMA decision-and-execution core")]
struct Cli {
    /// Path to a TOML config file; falls back to the platform config dir, then built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON instead of the default human-readable format.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Route a query and print the resulting decision as JSON.
    Route {
        /// The query text to route.
        #[arg(long)]
        query: String,

        /// The operation tag used for security classification (e.g. "code_generation").
        #[arg(long, default_value = "general")]
        operation: String,

        /// Also attempt to ready the module the router selected.
        #[arg(long)]
        load: bool,
    },

    /// Verify a candidate text output and print the resulting report as JSON.
    Verify {
        /// The candidate output text to check.
        #[arg(long)]
        output: String,

        /// The operation tag passed to the security scanner.
        #[arg(long, default_value = "general")]
        operation: String,
    },
}

// The core itself is synchronous end to end; the runtime is here so the HTTP
// shim that would front this in production (spec §1's external collaborator)
// can share this same entry point and `tokio::spawn` alongside the CLI paths.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    amaima_core::telemetry::init(cli.json_logs);

    let config = RuntimeConfig::load(cli.config.as_deref());

    match cli.command {
        Command::Route { query, operation, load } => run_route(&config, &query, &operation, load),
        Command::Verify { output, operation } => run_verify(&config, &output, &operation),
    }
}

fn run_route(config: &RuntimeConfig, query: &str, operation: &str, load: bool) -> anyhow::Result<()> {
    let router_config = RouterConfig { cache_ttl: std::time::Duration::from_secs(config.cache_ttl_s), history_ttl_days: config.history_ttl_days };
    let device_probe: Box<dyn DeviceProbe> = Box::new(SystemDeviceProbe);
    let connectivity_probe: Box<dyn ConnectivityProbe> = Box::new(SystemConnectivityProbe::default());
    let router = SmartRouter::new(router_config, device_probe, connectivity_probe);

    let decision = router.route(query, operation, None);
    println!("{}", serde_json::to_string_pretty(&decision)?);

    if load {
        let loader = ProgressiveModelLoader::new(
            config.max_memory_mb,
            config.reserved_mb,
            config.enable_quantization,
            config.preload_threshold,
        );
        let module_name = module_for_size(decision.model_size);
        match loader.load(module_name, false, None) {
            Ok(loaded) => eprintln!("loaded module '{}' ({:?})", loaded.spec.name, loaded.status),
            Err(err) => eprintln!("failed to load module '{module_name}': {err}"),
        }
        loader.shutdown_preloader();
    }

    Ok(())
}

fn run_verify(config: &RuntimeConfig, output: &str, operation: &str) -> anyhow::Result<()> {
    let engine = VerificationEngine::new(config.enabled_layers.clone(), config.verification_threshold);
    let context = VerificationContext { operation: Some(operation.to_string()), ..Default::default() };
    let result = engine.verify(&VerificationOutput::Text(output.to_string()), Some(&context), &[]);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// The router speaks in model *sizes*; the loader speaks in module
/// *names*. This harness maps a size to the registry's generalist module
/// for that tier; a production caller would consult a richer catalog.
fn module_for_size(size: ModelSize) -> &'static str {
    match size {
        ModelSize::Nano1B | ModelSize::Small3B => "embedding-base",
        ModelSize::Medium7B => "code-base",
        ModelSize::Large13B => "reasoning-base",
        ModelSize::XL34B | ModelSize::Ultra200B => "security-base",
    }
}
