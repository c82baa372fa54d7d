//! # mapsync, the linked-group command line
//!
//! Loads a JSON map document (a serialised [`Scene`]), then either lists its
//! link sets or rebuilds every member of one link set from a chosen group
//! and writes the synchronized map back out.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mapsync_links::{LinkRegistry, LinkedGroups, LinkedGroupsConfig, is_linked_group};
use mapsync_scene::{NodeId, Scene};

#[derive(Parser, Debug)]
#[command(name = "mapsync", about = "Inspect and synchronize linked groups in a map")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List link ids and their member groups
    Links {
        /// Path to the JSON map document
        map: PathBuf,
    },
    /// Rebuild all members of a link set from one group
    Propagate {
        /// Path to the JSON map document
        map: PathBuf,

        /// Node index of the source group
        #[arg(long = "from")]
        source: u32,

        /// Output path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Game type; `q1` enables the Quake1 angles quirk
        #[arg(long, env = "MAPSYNC_GAME", default_value = "")]
        game: String,
    },
}

const DEFAULT_LOG_FILTER: &str = "mapsync_cli=info,mapsync_links=info";

/// `RUST_LOG` wins when set and valid; otherwise log this tool at info.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    match Args::parse().command {
        Command::Links { map } => {
            let scene = load_map(&map)?;
            print!("{}", describe_links(&scene));
        }
        Command::Propagate {
            map,
            source,
            output,
            game,
        } => {
            let mut scene = load_map(&map)?;
            let config = LinkedGroupsConfig::new().with_game_type(game);
            let targets = propagate(&mut scene, NodeId::from_raw(source), config)?;
            info!(source, targets, "propagation finished");

            let json = serde_json::to_string_pretty(&scene).context("serialising map")?;
            match output {
                Some(path) => fs::write(&path, json)
                    .with_context(|| format!("writing {}", path.display()))?,
                None => println!("{json}"),
            }
        }
    }
    Ok(())
}

fn load_map(path: &Path) -> Result<Scene> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let scene: Scene =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    info!(path = %path.display(), nodes = scene.node_count(), "map loaded");
    Ok(scene)
}

/// One line per link set: the link id followed by its member nodes.
fn describe_links(scene: &Scene) -> String {
    let registry = LinkRegistry::scan(scene);
    let mut out = String::new();
    for (link_id, members) in registry.iter() {
        let members: Vec<String> = members.iter().map(ToString::to_string).collect();
        out.push_str(&format!("{link_id}\t{}\n", members.join(" ")));
    }
    out
}

/// Mark `source` changed inside one command and return how many groups were
/// rebuilt.
fn propagate(scene: &mut Scene, source: NodeId, config: LinkedGroupsConfig) -> Result<usize> {
    if !is_linked_group(scene, source) || !scene.is_live(source) {
        bail!("{source} is not a placed linked group");
    }

    let mut links = LinkedGroups::new(config);
    let ((), report) = links.command(scene, "propagate", |links, scene| {
        links.mark_group_changed(scene, source);
    });
    for err in &report.skipped {
        warn!(%err, "link set skipped");
    }
    if let Some(err) = report.skipped.first() {
        bail!("propagation from {source} failed: {err}");
    }
    Ok(report.propagated.iter().map(|p| p.targets.len()).sum())
}
