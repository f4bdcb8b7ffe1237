use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tinydash::config::AppConfig;
use tinydash::core::{
    DeviceManager, HttpTransport, RetryPolicy, RunnerServices, ScreenComposer, SlotStatus,
    SnapshotFetcher, SystemClock,
};
use tinydash::sources::{HomeAssistantResolver, StaticResolver};
use tinydash_core::{compute_slot_rects, SharedResolver};
use tinydash_types::{LayoutType, Options, Resolution};

/// tinydash - entity-driven dashboards for small networked displays
#[derive(Parser, Debug)]
#[command(name = "tinydash")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0", global = true)]
    debug: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose one screen offline and write it as PNG
    Render {
        /// Config file (defaults to the user config)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Snapshot file with entity states and history
        #[arg(short, long)]
        snapshots: Option<PathBuf>,
        /// Device index in the config
        #[arg(long, default_value = "0")]
        device: usize,
        /// Screen index on the device
        #[arg(long, default_value = "0")]
        screen: usize,
        /// Output PNG path
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Print the slot rectangles of every layout
    Layouts {
        #[arg(long, default_value = "240")]
        width: u32,
        #[arg(long, default_value = "240")]
        height: u32,
    },
    /// List the available widgets and their options
    Widgets,
    /// Drive every configured device until interrupted
    Run {
        /// Config file (defaults to the user config)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from_path(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => AppConfig::load(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Level 0 (default): warn only
    // Level 1: info, 2: debug, 3+: trace
    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Command::Render {
            config,
            snapshots,
            device,
            screen,
            out,
        } => render(config.as_ref(), snapshots.as_ref(), device, screen, &out).await,
        Command::Layouts { width, height } => {
            print_layouts(Resolution::new(width, height));
            Ok(())
        }
        Command::Widgets => {
            print_widgets();
            Ok(())
        }
        Command::Run { config } => run(config.as_ref()).await,
    }
}

async fn render(
    config_path: Option<&PathBuf>,
    snapshots_path: Option<&PathBuf>,
    device_index: usize,
    screen_index: usize,
    out: &PathBuf,
) -> Result<()> {
    let config = load_config(config_path)?;
    let device = config
        .validated_devices()
        .into_iter()
        .nth(device_index)
        .ok_or_else(|| anyhow!("config has no device {}", device_index))?;
    let screen = device
        .screens
        .get(screen_index)
        .ok_or_else(|| anyhow!("device {} has no screen {}", device.address, screen_index))?;

    let resolver = match snapshots_path {
        Some(path) => StaticResolver::load(path)?,
        None => StaticResolver::new(),
    };
    let now = resolver
        .now()
        .unwrap_or_else(|| chrono::Local::now().fixed_offset());

    let composer = ScreenComposer::new();
    let theme = composer.theme_for(&device.theme, screen);
    let fetcher = SnapshotFetcher::new(Arc::new(resolver));
    let snapshots = fetcher
        .fetch(&composer.dependencies(screen), now, tokio::time::Instant::now())
        .await;
    let composition = composer.compose(screen, device.resolution, theme, &snapshots)?;

    for slot in &composition.slots {
        match &slot.status {
            SlotStatus::Rendered => info!("slot {}: rendered", slot.index),
            SlotStatus::Placeholder(reason) => warn!("slot {}: placeholder ({})", slot.index, reason),
            SlotStatus::Error(message) => warn!("slot {}: error ({})", slot.index, message),
        }
    }

    let png = composition.bitmap.encode_png()?;
    std::fs::write(out, &png).with_context(|| format!("writing {}", out.display()))?;
    println!(
        "Wrote {} ({}x{}, layout {}, {} bytes)",
        out.display(),
        device.resolution.width,
        device.resolution.height,
        composition.layout,
        png.len()
    );
    Ok(())
}

fn print_layouts(canvas: Resolution) {
    let options = Options::new();
    for layout in LayoutType::ALL {
        println!("{} ({}x{}):", layout, canvas.width, canvas.height);
        for (i, rect) in compute_slot_rects(layout, canvas, &options).iter().enumerate() {
            println!(
                "  {}: x={} y={} w={} h={}",
                i, rect.x, rect.y, rect.width, rect.height
            );
        }
    }
}

fn print_widgets() {
    for info in tinydash_widgets::global_registry().list() {
        let entity = if info.requires_entity { "entity" } else { "no entity" };
        println!("{} ({}): {}", info.kind, entity, info.option_keys.join(", "));
    }
}

fn build_resolver(config: &AppConfig) -> Result<SharedResolver> {
    if let Some(path) = &config.snapshot_file {
        return Ok(Arc::new(StaticResolver::load(path)?));
    }
    let ha = config
        .home_assistant
        .as_ref()
        .ok_or_else(|| anyhow!("config needs either home_assistant or snapshot_file"))?;
    let token = ha.token().ok_or_else(|| {
        anyhow!(
            "no Home Assistant token (set it in the config or {})",
            tinydash::config::TOKEN_ENV
        )
    })?;
    Ok(Arc::new(HomeAssistantResolver::new(&ha.url, &token)?))
}

async fn run(config_path: Option<&PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    if config.devices.is_empty() {
        return Err(anyhow!("no devices configured"));
    }

    let services = RunnerServices {
        composer: ScreenComposer::new(),
        resolver: build_resolver(&config)?,
        transport: Arc::new(HttpTransport::new()),
        retry: RetryPolicy::from(config.upload),
        clock: Arc::new(SystemClock),
    };
    warn!(
        "Starting tinydash v{} with {} device(s) via {}",
        env!("CARGO_PKG_VERSION"),
        config.devices.len(),
        services.resolver.name()
    );

    let mut manager = DeviceManager::new(services);
    manager.reload(config.devices.clone()).await?;

    tokio::signal::ctrl_c().await?;
    info!("Interrupted, stopping devices");
    manager.shutdown_all().await;
    Ok(())
}
