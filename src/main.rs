// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! LumiSense - Luminosity Sensing Module
//!
//! Scans the light sensors found on the I2C bus and publishes their lux
//! values over MQTT whenever they change.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use lumisense::{Config, Engine, LogReporter, LuminosityManager, MqttReporter, RegisterBus, Reporter, VERSION};

/// LumiSense - Luminosity Sensing Module
#[derive(Parser, Debug)]
#[command(name = "lumisense")]
#[command(author = "LumiSense Project")]
#[command(version = VERSION)]
#[command(about = "Ambient light sensing with MQTT reporting")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// Demo mode with a simulated bus
    #[arg(long)]
    demo: bool,

    /// MQTT broker address
    #[arg(long)]
    mqtt_broker: Option<String>,

    /// Seconds between two acquisitions of a sensor
    #[arg(long)]
    cooldown: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load or create configuration
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        config.log_level.parse().unwrap_or(Level::INFO)
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("LumiSense v{} - Luminosity Sensing Module", VERSION);

    // Override with command line args
    if args.demo {
        config.demo_mode = true;
    }
    if let Some(mqtt) = args.mqtt_broker {
        config.streaming.mqtt_enabled = true;
        config.streaming.mqtt_broker = mqtt;
    }
    if let Some(cooldown) = args.cooldown {
        config.sensors.cooldown_secs = cooldown;
    }
    config.validate()?;

    info!("Configuration loaded from {:?}", config_path);
    info!("Demo mode: {}", config.demo_mode);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config, config_path))
}

async fn run(config: Config, config_path: PathBuf) -> Result<()> {
    if config.demo_mode {
        info!("Using simulated I2C bus");
        return run_with_bus(lumisense::SimulatedBus::new(), config, config_path).await;
    }

    #[cfg(feature = "hardware")]
    {
        let bus = lumisense::sensors::I2cdevBus::open(&config.sensors.bus_path)?;
        info!("Using I2C bus {:?}", config.sensors.bus_path);
        run_with_bus(bus, config, config_path).await
    }

    #[cfg(not(feature = "hardware"))]
    {
        let _ = config_path;
        anyhow::bail!("Hardware feature not enabled. Build with --features hardware or use --demo")
    }
}

async fn run_with_bus<B: RegisterBus>(bus: B, config: Config, config_path: PathBuf) -> Result<()> {
    let mut manager = LuminosityManager::new(bus, config.sensors.max_sensors)
        .with_cooldown(config.sensors.cooldown_secs)
        .with_auto_range(config.sensors.auto_range);

    let added = manager.discover(&config.sensors.addresses);
    if added.is_empty() {
        warn!("No light sensor found on the bus");
    } else {
        info!("{} light sensor(s) registered", added.len());
    }

    // Orders from the command topic
    let (orders_tx, mut orders_rx) = mpsc::channel(16);
    let reporter: Box<dyn Reporter> = if config.streaming.mqtt_enabled {
        Box::new(MqttReporter::new(&config.streaming, orders_tx.clone())?)
    } else {
        info!("MQTT disabled, values are only logged");
        Box::new(LogReporter)
    };

    let mut engine = Engine::new(manager, reporter, config).with_config_path(config_path);

    info!("LumiSense running");
    info!("   Press Ctrl+C to shutdown");

    let mut tick = tokio::time::interval(Duration::from_secs(1));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let now = Instant::now();
                tokio::task::block_in_place(|| engine.scan(now));
                if let Err(e) = engine.report(now).await {
                    warn!("Reporting interrupted: {}", e);
                }
            }
            Some(order) = orders_rx.recv() => {
                if let Err(e) = engine.handle_order(order, Instant::now()).await {
                    warn!("Order {:?} failed: {}", order, e);
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received, cleaning up...");
                break;
            }
        }
    }

    drop(orders_tx);
    if let Err(e) = engine.shutdown().await {
        warn!("Shutdown incomplete: {}", e);
    }

    info!("LumiSense shutdown complete");
    Ok(())
}
