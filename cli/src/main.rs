//! # Portal CLI
//!
//! Command-line shell over the Portal marketplace API.
//!
//! ## Usage
//!
//! ```bash
//! # Authenticate
//! portal login --email ada@example.com
//!
//! # Look around
//! portal wallet
//! portal jobs --category design
//! portal business select 7
//! ```

use clap::{Parser, Subcommand};
use portal::commands;

/// Initialize logger based on verbose flag
fn init_logger(verbose: bool) {
    let mut log_builder = env_logger::Builder::new();
    if verbose {
        log_builder.filter_level(log::LevelFilter::Debug);
    } else {
        log_builder.filter_level(log::LevelFilter::Info);
    }
    // RUST_LOG, when set, wins over the flag
    log_builder.parse_default_env();
    log_builder.init();
}

/// Main CLI structure
#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Command-line client for the Portal marketplace API", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        /// Account email
        #[arg(long, short = 'e')]
        email: String,
        /// Account password
        #[arg(long, short = 'p', env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        /// Display name
        #[arg(long, short = 'n')]
        name: String,
        /// Account email
        #[arg(long, short = 'e')]
        email: String,
        /// Account password
        #[arg(long, short = 'p', env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Phone number
        #[arg(long)]
        phone: Option<String>,
    },
    /// Clear the stored session
    Logout,
    /// Check connection and session status
    Status,
    /// Show the logged-in user
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the wallet balance or transactions
    Wallet {
        /// List transactions
        #[arg(long, short = 't')]
        transactions: bool,
        /// Transaction page
        #[arg(long, default_value = "1")]
        page: u32,
        /// Transactions per page
        #[arg(long, default_value = "20")]
        limit: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List jobs
    Jobs {
        /// Category filter (repeat with --summary for several)
        #[arg(long, short = 'c', value_name = "CATEGORY")]
        category: Vec<String>,
        /// Free-text search
        #[arg(long, short = 's')]
        search: Option<String>,
        /// Page to fetch
        #[arg(long)]
        page: Option<u32>,
        /// Jobs per page
        #[arg(long)]
        limit: Option<u32>,
        /// Show job counts instead of listings
        #[arg(long)]
        summary: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List and select businesses
    Business {
        #[command(subcommand)]
        command: BusinessCommands,
    },
    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Send a raw authenticated request
    Request {
        /// HTTP method (GET, POST, ...)
        #[arg(value_name = "METHOD")]
        method: String,
        /// Path relative to the base URL
        #[arg(value_name = "PATH")]
        path: String,
        /// Query parameter as key=value (can be repeated)
        #[arg(long, value_name = "KEY=VALUE")]
        param: Vec<String>,
        /// JSON request body
        #[arg(long, short = 'd', value_name = "JSON")]
        data: Option<String>,
    },
}

/// Business subcommands
#[derive(Subcommand)]
enum BusinessCommands {
    /// List your businesses
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Act on behalf of a business
    Select {
        /// Business ID
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Show the selected business
    Current {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Clear the business selection
    Clear,
}

/// Config subcommands
#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Send requests to an external API URL
    SetApiUrl {
        /// Base URL, e.g. https://api.portal.app/api/v1
        #[arg(value_name = "URL")]
        url: String,
    },
    /// Send requests through a same-origin proxy
    SetProxyPath {
        /// Proxy path (e.g. /api/proxy) or absolute URL
        #[arg(value_name = "PATH")]
        path: String,
        /// Origin the proxy path is served from
        #[arg(long, value_name = "URL")]
        origin: Option<String>,
    },
    /// Remove the configuration file
    Reset,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    let exit_code = run_command(cli.command).await;
    std::process::exit(exit_code);
}

async fn run_command(command: Commands) -> i32 {
    use portal::exit_codes::*;

    let (label, result) = match command {
        Commands::Login { email, password } => (
            "Login",
            commands::login::execute(commands::login::LoginArgs { email, password }).await,
        ),
        Commands::Register {
            name,
            email,
            password,
            phone,
        } => (
            "Register",
            commands::login::execute_register(commands::login::RegisterArgs {
                name,
                email,
                password,
                phone,
            })
            .await,
        ),
        Commands::Logout => ("Logout", commands::login::execute_logout()),
        Commands::Status => ("Status", commands::status::execute().await),
        Commands::Whoami { json } => ("Whoami", commands::status::execute_whoami(json).await),
        Commands::Wallet {
            transactions,
            page,
            limit,
            json,
        } => (
            "Wallet",
            commands::wallet::execute(commands::wallet::WalletArgs {
                transactions,
                page,
                limit,
                json,
            })
            .await,
        ),
        Commands::Jobs {
            category,
            search,
            page,
            limit,
            summary,
            json,
        } => (
            "Jobs",
            commands::jobs::execute(commands::jobs::JobsArgs {
                categories: category,
                search,
                page,
                limit,
                summary,
                json,
            })
            .await,
        ),
        Commands::Business { command } => {
            ("Business", commands::business::execute(business_action(command)).await)
        }
        Commands::Config { command } => {
            ("Config", commands::config::execute(config_action(command)))
        }
        Commands::Request {
            method,
            path,
            param,
            data,
        } => (
            "Request",
            commands::request::execute(commands::request::RequestArgs {
                method,
                path,
                params: param,
                data,
            })
            .await,
        ),
    };

    match result {
        Ok(exit_code) => exit_code,
        Err(e) => {
            portal::errors::display_config_error(&format!("{} failed: {:#}", label, e));
            EXIT_CONFIG_ERROR
        }
    }
}

fn business_action(command: BusinessCommands) -> commands::business::BusinessAction {
    use commands::business::BusinessAction;

    match command {
        BusinessCommands::List { json } => BusinessAction::List { json },
        BusinessCommands::Select { id } => BusinessAction::Select { id },
        BusinessCommands::Current { json } => BusinessAction::Current { json },
        BusinessCommands::Clear => BusinessAction::Clear,
    }
}

fn config_action(command: ConfigCommands) -> commands::config::ConfigAction {
    use commands::config::ConfigAction;

    match command {
        ConfigCommands::Show => ConfigAction::Show,
        ConfigCommands::SetApiUrl { url } => ConfigAction::SetApiUrl { url },
        ConfigCommands::SetProxyPath { path, origin } => {
            ConfigAction::SetProxyPath { path, origin }
        }
        ConfigCommands::Reset => ConfigAction::Reset,
    }
}
