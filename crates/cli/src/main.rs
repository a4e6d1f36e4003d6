//! CenterDesk CLI - Bootstrap and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Create a super-admin credential directly (bootstrap)
//! centerdesk-cli admin create -u root -p <password> --superadmin
//!
//! # Create a tenant admin bound to a center
//! centerdesk-cli admin create -u north-desk -p <password> -c <center-uuid>
//!
//! # List pending account requests
//! centerdesk-cli requests list
//! ```
//!
//! # Environment Variables
//!
//! - `DATASTORE_URL` - Base URL of the remote row API
//! - `DATASTORE_SERVICE_KEY` - Service key for the remote row API

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "centerdesk-cli")]
#[command(author, version, about = "CenterDesk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage admin credentials
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Review account requests
    Requests {
        #[command(subcommand)]
        action: RequestsAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin credential
    Create {
        /// Login username
        #[arg(short, long)]
        username: String,

        /// Password (hashed before it leaves this process)
        #[arg(short, long)]
        password: String,

        /// Center the credential is confined to
        #[arg(short, long)]
        center_id: Option<String>,

        /// Grant cross-tenant superadmin access
        #[arg(long, default_value_t = false)]
        superadmin: bool,
    },
}

#[derive(Subcommand)]
enum RequestsAction {
    /// List account requests
    List {
        /// Filter by status (`pending`, `approved`, `rejected`)
        #[arg(short, long)]
        status: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Admin { action } => match action {
            AdminAction::Create {
                username,
                password,
                center_id,
                superadmin,
            } => {
                let id =
                    commands::admin::create_user(&username, &password, center_id.as_deref(), superadmin)
                        .await?;
                tracing::info!("created admin credential {id}");
            }
        },
        Commands::Requests { action } => match action {
            RequestsAction::List { status } => {
                commands::requests::list(status.as_deref()).await?;
            }
        },
    }
    Ok(())
}
