use std::collections::BTreeSet;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use space_indicator::actor;
use space_indicator::actor::menu_bar::{Event, Menu, Notice};
use space_indicator::common::config::Config;
use space_indicator::common::log;
use space_indicator::model::occupancy::{OccupancyCache, RefreshOutcome};
use space_indicator::model::preferences::SharedPreferences;
use space_indicator::model::snapshot::Snapshotter;
use space_indicator::model::style::PreviewState;
use space_indicator::sys::appearance::FixedAppearance;
use space_indicator::sys::clock::SystemClock;
use space_indicator::sys::probe::FixedOccupancy;
use space_indicator::sys::render::BlockRenderer;
use space_indicator::sys::screen::{SpaceId, StaticTopology, Topology, TopologyProvider};
use space_indicator::sys::worker::WorkerThread;
use space_indicator::ui::menu_bar::MenuIcon;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "space-indicator", version, about = "Space status-bar indicator")]
struct Cli {
    /// Config file; defaults to the user config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// TOML file describing the displays and their spaces.
    #[arg(long, global = true)]
    topology: Option<PathBuf>,

    /// Space ids that hold windows.
    #[arg(long, global = true, num_args = 1..)]
    occupied: Vec<u64>,

    /// Render with dark-mode defaults.
    #[arg(long, global = true)]
    dark: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the computed slot layout as JSON.
    Layout,
    /// Print the slot under an x offset as JSON.
    Hit { x: f64 },
    /// Draw the icon and print its size and content hash.
    Render,
    /// Drive the indicator from commands on stdin, printing what it asks the
    /// host to do.
    Serve,
}

struct Pipeline {
    icon: MenuIcon,
    preferences: SharedPreferences,
    topology: Arc<StaticTopology>,
    appearance: Arc<FixedAppearance>,
    completed_rx: actor::Receiver<RefreshOutcome>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    log::init_logging("warn");

    let config = Config::load(cli.config.as_deref())?;
    let topology_path = cli.topology.as_deref().context("--topology is required")?;
    let topology = read_topology(topology_path)?;
    let pipeline = build(&cli, &config, topology)?;

    match cli.command {
        Command::Layout => {
            let mut icon = pipeline.icon;
            icon.get_icon();
            println!("{}", serde_json::to_string_pretty(&icon.layout())?);
        }
        Command::Hit { x } => {
            let mut icon = pipeline.icon;
            icon.get_icon();
            println!("{}", serde_json::to_string_pretty(&icon.slot_at(x))?);
        }
        Command::Render => {
            let mut icon = pipeline.icon;
            let bitmap = icon.get_icon();
            println!("{}x{} {:016x}", bitmap.width(), bitmap.height(), bitmap.content_hash());
        }
        Command::Serve => serve(config, pipeline)?,
    }
    Ok(())
}

fn read_topology(path: &Path) -> anyhow::Result<Topology> {
    let buf = std::fs::read_to_string(path)
        .with_context(|| format!("reading topology {}", path.display()))?;
    toml::from_str(&buf).with_context(|| format!("parsing topology {}", path.display()))
}

fn build(cli: &Cli, config: &Config, topology: Topology) -> anyhow::Result<Pipeline> {
    let topology = Arc::new(StaticTopology::new(topology));
    let appearance = Arc::new(FixedAppearance::new(cli.dark));
    let prefs = SharedPreferences::new(config.settings.preferences.clone());
    let occupied: BTreeSet<SpaceId> = cli.occupied.iter().copied().map(SpaceId::new).collect();

    let worker = WorkerThread::new("occupancy-probe").context("starting probe worker")?;
    let (completed_tx, completed_rx) = actor::channel();
    let occupancy = OccupancyCache::new(
        Arc::new(FixedOccupancy(occupied)),
        Arc::new(worker),
        Arc::new(SystemClock),
        completed_tx,
    )
    .with_ttl(config.settings.menu_bar.occupancy_ttl());

    let snapshotter = Snapshotter::new(topology.clone(), Arc::new(prefs.clone()), appearance.clone());
    let icon = MenuIcon::new(
        snapshotter,
        Arc::new(BlockRenderer),
        occupancy,
        config.settings.menu_bar.metrics,
    );
    Ok(Pipeline { icon, preferences: prefs, topology, appearance, completed_rx })
}

fn serve(config: Config, pipeline: Pipeline) -> anyhow::Result<()> {
    let Pipeline { icon, preferences, topology, appearance, completed_rx } = pipeline;
    let (tx, rx) = actor::channel();
    let (notice_tx, mut notice_rx) = actor::channel();
    let menu = Menu::new(config, rx, completed_rx, icon, preferences, notice_tx);

    std::thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                match parse_command(&line, &topology, &appearance) {
                    Ok(Some(event)) => {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => eprintln!("{err:#}"),
                }
            }
            debug!("stdin closed");
        })
        .context("starting stdin reader")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("building runtime")?;
    runtime.block_on(async move {
        let print = async {
            while let Some((_, notice)) = notice_rx.recv().await {
                match notice {
                    Notice::Icon(bitmap) => println!(
                        "icon {}x{} {:016x}",
                        bitmap.width(),
                        bitmap.height(),
                        bitmap.content_hash()
                    ),
                    Notice::IconNeedsRefresh => println!("needs-refresh"),
                    Notice::SwitchToSpace(index) => println!("switch {index}"),
                    Notice::ActivateAppOnSpace(id) => println!("activate {id}"),
                    Notice::Hidden => println!("hidden"),
                }
            }
        };
        tokio::join!(menu.run(), print);
    });
    Ok(())
}

/// One stdin command: `tick`, `space <id>`, `click <x>`, `preview <symbol>`,
/// `end`, `close`, `dark <on|off>`.
fn parse_command(
    line: &str,
    topology: &StaticTopology,
    appearance: &FixedAppearance,
) -> anyhow::Result<Option<Event>> {
    let mut words = line.split_whitespace();
    let Some(cmd) = words.next() else { return Ok(None) };
    let arg = words.next();
    let event = match (cmd, arg) {
        ("tick", None) => Event::Tick,
        ("end", None) => Event::EndPreview,
        ("close", None) => Event::MenuClosed,
        ("click", Some(x)) => Event::Click(x.parse().context("click offset")?),
        ("preview", Some(symbol)) => Event::BeginPreview(PreviewState {
            symbol: Some(symbol.to_string()),
            ..Default::default()
        }),
        ("space", Some(id)) => {
            let id = SpaceId::new(id.parse().context("space id")?);
            let mut next = topology.current_topology();
            let Some(display_id) =
                next.displays.iter().find(|d| d.contains(id)).map(|d| d.display_id.clone())
            else {
                warn!(%id, "unknown space");
                return Ok(None);
            };
            next.current_display_id = display_id;
            next.current_space_id = id;
            topology.replace(next);
            Event::SpaceChanged
        }
        ("dark", Some(mode)) => {
            appearance.set_dark_mode(matches!(mode, "on" | "true" | "1"));
            Event::PreferencesChanged
        }
        _ => bail!("unrecognized command: {line}"),
    };
    Ok(Some(event))
}
