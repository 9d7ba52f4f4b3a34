//! Puppet CLI — inspect bridge permissions and exercise the command dispatcher.

mod console;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::{OfflineBridge, TerminalSink};
use puppet_commands::{CommandRegistry, Dispatcher, builtin::render_help};
use puppet_config::{BridgeConfig, CliOverrides};
use puppet_permissions::{MatchKind, PermissionResolver, Resolution};
use puppet_types::{Bridge, ReplySink};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Room name used for the console when acting as the management room.
const CONSOLE_MANAGEMENT_ROOM: &str = "!console-management";

/// Room name used for the console with `--portal`.
const CONSOLE_PORTAL_ROOM: &str = "!console-portal";

#[derive(Parser)]
#[command(name = "puppet", version, about = "Control-plane tooling for the Puppet chat bridge")]
struct Cli {
    /// Config file (overrides PUPPET_CONFIG, default ./config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Command prefix (overrides bridge.command_prefix)
    #[arg(long, global = true)]
    command_prefix: Option<String>,

    /// Enable verbose/debug logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the fully resolved configuration
    Config,
    /// Show the permissions each identity resolves to
    Resolve {
        #[arg(required = true)]
        identities: Vec<String>,
    },
    /// List the registered bridge commands
    Commands,
    /// Type bridge commands on stdin and dispatch them as the given identity
    Console {
        /// Identity to act as (e.g. @alice:example.org)
        #[arg(long)]
        identity: String,
        /// Act from a portal room instead of the management room
        #[arg(long)]
        portal: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let config = BridgeConfig::load(CliOverrides {
        config_path: cli.config,
        command_prefix: cli.command_prefix,
    })
    .context("Failed to load configuration")?;

    // Duplicate registrations abort startup here
    let registry = Arc::new(
        CommandRegistry::with_builtins().context("Failed to register bridge commands")?,
    );

    match cli.command {
        Command::Config => {
            let rendered = config.store.render()?;
            match &config.config_path {
                Some(path) => eprintln!("# Loaded from {}", path.display()),
                None => eprintln!("# No config file found, showing defaults"),
            }
            println!("{rendered}");
            println!("# command_prefix in effect: {}", config.command_prefix);
        }
        Command::Resolve { identities } => {
            let resolver = PermissionResolver::new(config.permissions.clone());
            for identity in &identities {
                print_resolution(identity, &resolver.explain(identity));
            }
        }
        Command::Commands => {
            println!("{}", render_help(&registry, true, &config.command_prefix));
        }
        Command::Console { identity, portal } => {
            console(config, registry, &identity, portal).await?;
        }
    }

    Ok(())
}

fn print_resolution(identity: &str, resolution: &Resolution) {
    let perms = &resolution.permissions;
    let matched = match &resolution.matched {
        MatchKind::Exact => "exact identity entry".to_string(),
        MatchKind::Domain(domain) => format!("domain entry '{domain}'"),
        MatchKind::Wildcard => "wildcard entry '*'".to_string(),
        MatchKind::Default => "no entry".to_string(),
    };
    let level = if perms.level.is_empty() {
        "(none)"
    } else {
        perms.level.as_str()
    };
    let flag = |b: bool| if b { "yes" } else { "no" };

    println!("{identity}");
    println!("  level: {level} (effective: {}, {matched})", perms.effective_level());
    println!(
        "  relaybot: {}  user: {}  puppeting: {}  matrix_puppeting: {}  admin: {}",
        flag(perms.relaybot),
        flag(perms.user),
        flag(perms.puppeting),
        flag(perms.matrix_puppeting),
        flag(perms.admin)
    );
}

async fn console(
    config: BridgeConfig,
    registry: Arc<CommandRegistry>,
    identity: &str,
    portal: bool,
) -> Result<()> {
    let bridge = Arc::new(OfflineBridge::default());
    let resolver = Arc::new(PermissionResolver::new(config.permissions.clone()));
    let dispatcher = Dispatcher::new(
        registry,
        resolver,
        Arc::clone(&bridge) as Arc<dyn Bridge>,
        config.command_prefix.clone(),
    );
    let sink: Arc<dyn ReplySink> = Arc::new(TerminalSink);

    let (room, is_management) = if portal {
        (CONSOLE_PORTAL_ROOM, false)
    } else {
        (CONSOLE_MANAGEMENT_ROOM, true)
    };

    eprintln!(
        "puppet v{} console (identity: {identity}, room: {room}, level: {})",
        env!("CARGO_PKG_VERSION"),
        dispatcher.permissions().resolve(identity).effective_level()
    );
    eprintln!("No remote account is connected; every identity is logged out.");
    eprintln!("Type bridge commands, /reload to re-read permissions, /status, or Ctrl+D to exit.\n");

    let stdin = io::stdin();
    loop {
        eprint!("> ");
        io::stderr().flush()?;

        let mut input = String::new();
        let bytes_read = stdin.lock().read_line(&mut input)?;
        if bytes_read == 0 {
            eprintln!();
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/quit" | "/exit" => break,
            "/reload" => {
                match config.reload_permissions() {
                    Ok(table) => {
                        let entries = table.len();
                        dispatcher.permissions().replace_table(table);
                        eprintln!("Permission table reloaded ({entries} entries).");
                    }
                    Err(e) => eprintln!("Reload failed, keeping current table: {e}"),
                }
                continue;
            }
            "/status" => {
                let perms = dispatcher.permissions().resolve(identity);
                eprintln!("Level: {}", perms.effective_level());
                match bridge.notice_room(identity) {
                    Some(notice) => eprintln!("Notice room: {notice}"),
                    None => eprintln!("Notice room: (not set)"),
                }
                continue;
            }
            _ => {}
        }

        let handled = dispatcher
            .handle_message(identity, room, is_management, input, Arc::clone(&sink))
            .await;
        if handled.is_none() {
            eprintln!(
                "Not a command. Prefix commands with `{}` outside the management room.",
                dispatcher.command_prefix()
            );
        }
    }

    Ok(())
}
