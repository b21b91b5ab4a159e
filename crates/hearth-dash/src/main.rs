use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use hearth_core::DashboardEvent;
use hearth_manager::{
    DefinitionRegistry, HearthConfig, HttpPersistence, InMemoryPersistence, LogSurfaceFactory,
    PersistenceService, StaticDefinitionSource, TypeLoader, WidgetManager,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt};

/// Types bundled with the host; used when the server advertises nothing.
const BUILTIN_TYPES: &[&str] = &["clock", "swiss", "xkcd"];

#[derive(Parser)]
#[command(name = "hearth", about = "Hearth widget dashboard — terminal host")]
struct Cli {
    /// Base URL of the persistence service
    #[arg(long)]
    base_url: Option<String>,

    /// Path to a hearth.toml config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run against an in-memory store instead of a server
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they don't interleave with the command prompt
    fmt()
        .with_env_filter(EnvFilter::from_env("HEARTH_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => HearthConfig::from_file(path)?,
        None => HearthConfig::default(),
    };
    let base_url = cli
        .base_url
        .clone()
        .unwrap_or_else(|| config.persistence.base_url.clone());

    let persistence: Arc<dyn PersistenceService> = if cli.offline {
        tracing::info!("Running offline against an in-memory store");
        Arc::new(InMemoryPersistence::new(
            BUILTIN_TYPES
                .iter()
                .map(|id| hearth_core::WidgetTypeManifest {
                    id: (*id).to_string(),
                    name: display_name(id),
                    entrypoint: None,
                })
                .collect(),
            hearth_core::RegistrySnapshot::default(),
        ))
    } else {
        tracing::info!(base_url = %base_url, "Connecting to persistence service");
        Arc::new(HttpPersistence::new(base_url))
    };

    // Declare a load hook per advertised type. This host has no script
    // runtime, so every definition is a builtin that registers immediately;
    // if the server is unreachable, fall back to the bundled set.
    let definitions = Arc::new(DefinitionRegistry::new());
    let mut source = StaticDefinitionSource::new(Arc::clone(&definitions));
    let advertised = match persistence.list_manifests().await {
        Ok(manifests) => manifests.into_iter().map(|m| m.id).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Could not list widget types, using builtins");
            BUILTIN_TYPES.iter().map(|id| (*id).to_string()).collect::<Vec<_>>()
        }
    };
    for type_id in &advertised {
        source = source.with_builtin(type_id);
    }

    let loader = TypeLoader::new(Arc::new(source), definitions, config.loader_timing());

    let (settings_tx, mut settings_rx) = mpsc::unbounded_channel::<String>();
    let manager = Arc::new(
        WidgetManager::new(
            loader,
            persistence,
            Arc::new(LogSurfaceFactory),
            config.placement(),
        )
        .with_settings_sink(settings_tx),
    );

    tokio::spawn(async move {
        while let Some(instance_id) = settings_rx.recv().await {
            println!("settings requested for {instance_id}");
        }
    });

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let event_loop = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.run(event_rx).await })
    };

    let mounted = manager.load_all().await;
    println!("{} widgets mounted", mounted.len());

    command_loop(&manager, &event_tx).await?;

    drop(event_tx);
    event_loop.await?;
    tracing::info!("Hearth shutting down");
    Ok(())
}

/// Read commands from stdin until `quit` or EOF.
async fn command_loop(
    manager: &Arc<WidgetManager>,
    events: &mpsc::UnboundedSender<DashboardEvent>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("list") => {
                for instance in manager.instances().await {
                    let mounted = if manager.is_mounted(&instance.id).await {
                        "mounted"
                    } else {
                        "unmounted"
                    };
                    println!(
                        "{}  {}  \"{}\"  ({:.0},{:.0})  {mounted}",
                        instance.id,
                        instance.type_id,
                        instance.name,
                        instance.position.x,
                        instance.position.y,
                    );
                }
            }
            Some("types") => {
                for type_id in manager.available_types().await {
                    println!("{type_id}");
                }
            }
            Some("create") => match parts.next() {
                Some(type_id) => match manager.create(type_id).await {
                    Ok(instance) => println!("created {}", instance.id),
                    Err(e) => eprintln!("create failed: {e}"),
                },
                None => eprintln!("usage: create <type>"),
            },
            Some("remove") => match parts.next() {
                Some(instance_id) => {
                    let _ = events.send(DashboardEvent::InstanceRemoved {
                        instance_id: instance_id.to_string(),
                    });
                }
                None => eprintln!("usage: remove <id>"),
            },
            Some("reload") => {
                let _ = events.send(DashboardEvent::ReloadRequested {
                    instance_ids: parts.map(str::to_string).collect(),
                });
            }
            Some("quit") => break,
            Some(other) => {
                eprintln!("unknown command: {other} (try list, types, create, remove, reload, quit)");
            }
            None => {}
        }
    }
    Ok(())
}

fn display_name(type_id: &str) -> String {
    match type_id {
        "clock" => "Clock".to_string(),
        "swiss" => "Swiss Weather".to_string(),
        "xkcd" => "XKCD Viewer".to_string(),
        other => other.to_string(),
    }
}
