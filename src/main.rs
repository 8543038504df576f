use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

use spotctl::{cli, config, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Log in, log out and inspect the stored token
    Auth(AuthOptions),

    /// Manage client credentials
    Config(ConfigOptions),

    /// Print a valid access token, refreshing it if needed
    Token,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct AuthOptions {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AuthSubcommand {
    /// Authorize in the browser (or with client credentials)
    Login(LoginOpts),

    /// Show authentication status
    Status,

    /// Forget the stored token
    Logout,

    /// Refresh the access token
    Refresh,
}

#[derive(Parser, Debug, Clone)]
pub struct LoginOpts {
    /// Application-only token, no browser and no user context
    #[clap(long)]
    pub client_credentials: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigOptions {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Store client id, client secret and redirect URI
    Setup(SetupOpts),

    /// Show the effective client credentials (masked)
    Show,
}

#[derive(Parser, Debug, Clone)]
pub struct SetupOpts {
    #[clap(long)]
    pub client_id: Option<String>,
    #[clap(long)]
    pub client_secret: Option<String>,
    #[clap(long)]
    pub redirect_uri: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config::log_filter()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Auth(opt) => match opt.command {
            AuthSubcommand::Login(l) => cli::login(l.client_credentials).await,
            AuthSubcommand::Status => cli::status().await,
            AuthSubcommand::Logout => cli::logout().await,
            AuthSubcommand::Refresh => cli::refresh().await,
        },
        Command::Config(opt) => match opt.command {
            ConfigSubcommand::Setup(s) => {
                cli::setup(s.client_id, s.client_secret, s.redirect_uri).await
            }
            ConfigSubcommand::Show => cli::show().await,
        },
        Command::Token => cli::token().await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
