mod cmd_config;
mod cmd_hooks;
mod cmd_init;
mod cmd_install;
mod cmd_list;

use clap::{Parser, Subcommand};
use cmd_config::ConfigCmd;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "weft", version, about = "Weave module hooks into shared PHP classes")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize a .weft/ workspace in the current directory
    Init,
    /// Copy a module's files, promote its services and bind its hooks
    Install {
        /// Module name (e.g. Billing)
        module: String,
        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Unbind a module's hooks, remove its services and files
    Uninstall {
        /// Module name
        module: String,
        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List installed modules in install order
    List,
    /// Show dispatchers on the host class and who contributes to them
    Hooks {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Read or change .weft/config.json
    Config {
        #[command(subcommand)]
        cmd: ConfigCmd,
    },
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env("WEFT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let repo_root = std::env::current_dir()?;

    match cli.cmd {
        Command::Init => cmd_init::execute(&repo_root),
        Command::Install { module, json } => cmd_install::install(&repo_root, &module, json),
        Command::Uninstall { module, json } => cmd_install::uninstall(&repo_root, &module, json),
        Command::List => cmd_list::execute(&repo_root),
        Command::Hooks { json } => cmd_hooks::execute(&repo_root, json),
        Command::Config { cmd } => cmd_config::run(cmd, &repo_root),
    }
}
