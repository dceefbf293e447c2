use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use tokio::sync::oneshot;
use tracing::{info, warn};
use wingroups::actor::reactor::{self, Command, Event, Reactor, ReactorError, Severity, Status};
use wingroups::actor::storage::StorageActor;
use wingroups::actor::window_host::HostActor;
use wingroups::actor;
use wingroups::common::config::{Config, config_file};
use wingroups::common::log;
use wingroups::layout_engine::{LayoutKind, TilingLimits, tile};
use wingroups::model::persistence::Persistence;
use wingroups::model::{GroupEdits, GroupId, ProfileId, Registry};
use wingroups::sys::geometry::Rect;
use wingroups::sys::process::CommandHost;
use wingroups::sys::storage::{JsonFileStore, MemoryStore, Store};

#[derive(Parser)]
#[command(version, about = "Open groups of URLs as tiled browser windows")]
struct Cli {
    /// Path to configuration file to use (overrides default).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Storage file to use instead of the configured one.
    #[arg(long, value_name = "PATH", global = true)]
    store: Option<PathBuf>,

    /// Keep everything in memory. Nothing is read from or written to disk.
    #[arg(long, global = true, conflicts_with = "store")]
    ephemeral: bool,

    /// Log debug output to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List profiles. The active one is marked with `*`.
    Profiles,
    /// List the groups of a profile.
    Groups {
        /// Defaults to the active profile.
        #[arg(long)]
        profile: Option<String>,
    },
    /// Create, rename or delete profiles.
    Profile {
        #[command(subcommand)]
        action: ProfileCommands,
    },
    /// Create, edit, open or close groups.
    Group {
        #[command(subcommand)]
        action: GroupCommands,
    },
    /// Print the frames a layout would produce, without opening anything.
    Tile {
        #[arg(long, default_value = "vertical")]
        layout: LayoutKind,
        #[arg(long)]
        count: usize,
        /// Host rectangle; defaults to the configured frame.
        #[arg(long, value_name = "LEFT,TOP,WIDTH,HEIGHT")]
        frame: Option<Rect>,
    },
    /// Check the configuration file.
    Validate,
    /// Write the default configuration file if none exists.
    Init,
}

#[derive(Subcommand)]
enum ProfileCommands {
    Create,
    Rename {
        id: String,
        name: String,
    },
    Delete {
        id: String,
        /// Confirm deletion of the profile and all of its groups.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum GroupCommands {
    Create {
        /// Defaults to the active profile.
        #[arg(long)]
        profile: Option<String>,
    },
    /// Replace a group's name, layout and URLs. Omitted fields keep their
    /// current value.
    Edit(EditArgs),
    /// Open one tiled window per URL.
    Open { id: String },
    /// Close the windows opened for the group.
    Close { id: String },
}

#[derive(Args)]
struct EditArgs {
    id: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    layout: Option<LayoutKind>,
    /// May be repeated. Replaces the current URLs.
    #[arg(long = "url", value_name = "URL")]
    urls: Vec<String>,
    /// File with one URL per line, appended after any `--url`.
    #[arg(long, value_name = "PATH")]
    urls_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    log::init_logging(cli.verbose);
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config_path = cli.config.clone().unwrap_or_else(config_file);
    let config = match &cli.command {
        Commands::Validate => return validate(&config_path),
        Commands::Init => return init(&config_path),
        _ => Config::read_or_default(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?,
    };
    if let Commands::Tile { layout, count, frame } = &cli.command {
        return preview(&config, *layout, *count, *frame);
    }

    let store: Box<dyn Store> = if cli.ephemeral {
        Box::new(MemoryStore::new())
    } else {
        let path = cli.store.clone().unwrap_or_else(|| config.settings.storage.path());
        Box::new(JsonFileStore::new(path))
    };

    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    runtime.block_on(session(config, store, cli.command))
}

fn validate(path: &Path) -> anyhow::Result<ExitCode> {
    let config =
        Config::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let issues = config.validate();
    if issues.is_empty() {
        println!("Config validation passed");
        return Ok(ExitCode::SUCCESS);
    }
    for issue in issues {
        eprintln!("{issue}");
    }
    Ok(ExitCode::FAILURE)
}

fn init(path: &Path) -> anyhow::Result<ExitCode> {
    if path.exists() {
        println!("{} already exists", path.display());
    } else {
        Config::built_in()?.save(path)?;
        println!("Wrote {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn preview(
    config: &Config,
    layout: LayoutKind,
    count: usize,
    frame: Option<Rect>,
) -> anyhow::Result<ExitCode> {
    let Some(frame) = frame.or(config.settings.host.frame) else {
        bail!("No --frame given and no host frame configured");
    };
    let limits = TilingLimits::from(&config.settings.layout);
    for (i, rect) in tile(frame, layout, count, &limits).iter().enumerate() {
        println!("{i}: {rect}");
    }
    Ok(ExitCode::SUCCESS)
}

/// Loads the collection, starts the actors and forwards one command.
async fn session(
    config: Config,
    store: Box<dyn Store>,
    command: Commands,
) -> anyhow::Result<ExitCode> {
    let mut persistence = Persistence::new(store, config.settings.storage.default_urls.clone());
    let loaded = persistence.load().context("Failed to load profiles")?;
    if let Some(migration) = loaded.migration {
        info!(?migration, "created initial profile");
    }
    if let Some(e) = &loaded.migration_write_error {
        warn!("Initial profile was not saved: {e}");
    }

    let (reactor_tx, reactor_rx) = actor::channel();
    let (host_tx, host_rx) = actor::channel();
    let (storage_tx, storage_rx) = actor::channel();
    let (status_tx, mut status_rx) = actor::channel();

    let reactor = Reactor::new(
        Registry::new(loaded.profiles),
        TilingLimits::from(&config.settings.layout),
        host_tx,
        storage_tx,
        status_tx,
    );
    let host = HostActor::new(CommandHost::from_settings(&config.settings.host), reactor_tx.clone());
    let storage = StorageActor::new(persistence, reactor_tx.clone());
    let actors = async {
        tokio::join!(reactor.run(reactor_rx), host.run(host_rx), storage.run(storage_rx));
    };

    let client = Client { tx: reactor_tx };
    tokio::select! {
        () = actors => bail!("Reactor stopped unexpectedly"),
        result = drive(&client, command, &mut status_rx) => result,
    }
}

struct Client {
    tx: reactor::Sender,
}

impl Client {
    async fn query<T>(&self, event: impl FnOnce(oneshot::Sender<T>) -> Event) -> anyhow::Result<T> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(event(tx));
        rx.await.context("Reactor went away")
    }

    async fn command(&self, command: Command) -> anyhow::Result<Result<(), ReactorError>> {
        self.query(|response| Event::Command { command, response: Some(response) }).await
    }
}

async fn drive(
    client: &Client,
    command: Commands,
    status_rx: &mut reactor::StatusReceiver,
) -> anyhow::Result<ExitCode> {
    let command = match command {
        Commands::Profiles => {
            let profiles = client.query(Event::QueryProfiles).await?;
            let selection = client.query(Event::QuerySelection).await?;
            for profile in &profiles {
                let marker = if selection.profile.as_ref() == Some(&profile.id) { '*' } else { ' ' };
                println!(
                    "{marker} {}  {}  ({} groups)",
                    profile.id,
                    profile.display_name(),
                    profile.groups.len()
                );
            }
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Groups { profile } => {
            let profile = profile.map(ProfileId::from);
            let groups = client.query(|response| Event::QueryGroups { profile, response }).await?;
            let groups = match groups {
                Ok(groups) => groups,
                Err(e) => {
                    print_status(&Status::new(e.to_string(), Severity::Error));
                    return Ok(ExitCode::FAILURE);
                }
            };
            for group in &groups {
                println!(
                    "{}  {}  {}  ({} windows)",
                    group.id,
                    group.display_name(),
                    group.layout,
                    group.window_ids.len()
                );
                for url in &group.urls {
                    println!("    {url}");
                }
            }
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Profile { action } => match action {
            ProfileCommands::Create => Command::CreateProfile,
            ProfileCommands::Rename { id, name } => {
                Command::RenameProfile { profile: id.into(), name }
            }
            ProfileCommands::Delete { id, yes } => {
                if !yes {
                    bail!("Deleting profile {id} removes all of its groups; pass --yes to confirm");
                }
                Command::DeleteProfile(id.into())
            }
        },
        Commands::Group { action } => match action {
            GroupCommands::Create { profile } => Command::CreateGroup(profile.map(ProfileId::from)),
            GroupCommands::Edit(args) => edit_command(client, args).await?,
            GroupCommands::Open { id } => Command::OpenGroup(id.into()),
            GroupCommands::Close { id } => Command::CloseGroup(id.into()),
        },
        Commands::Tile { .. } | Commands::Validate | Commands::Init => {
            bail!("Command does not run against the profile store")
        }
    };

    let result = client.command(command).await?;
    client.query(Event::WaitForIdle).await?;

    let mut failed = result.is_err();
    while let Ok((_, status)) = status_rx.try_recv() {
        failed |= status.severity == Severity::Error;
        print_status(&status);
    }
    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

/// Builds a full replacement from the arguments, filling gaps from the
/// group as it is now.
async fn edit_command(client: &Client, args: EditArgs) -> anyhow::Result<Command> {
    let group = GroupId::from(args.id);
    let current = client
        .query(|response| Event::QueryGroup { group: group.clone(), response })
        .await?;
    let Some(current) = current else {
        // Let the reactor report the unknown group.
        return Ok(Command::SaveGroup { group, edits: GroupEdits::default() });
    };

    let mut urls = args.urls;
    if let Some(path) = &args.urls_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        urls.extend(text.lines().map(str::to_string));
    }
    if urls.is_empty() && args.urls_file.is_none() {
        urls = current.urls;
    }

    let edits = GroupEdits {
        name: args.name.unwrap_or(current.name),
        layout: Some(args.layout.unwrap_or(current.layout)),
        urls_text: urls.join("\n"),
    };
    Ok(Command::SaveGroup { group, edits })
}

fn print_status(status: &Status) {
    match status.severity {
        Severity::Neutral => println!("{}", status.message),
        Severity::Ok => println!("ok: {}", status.message),
        Severity::Error => eprintln!("error: {}", status.message),
    }
}
