//! Marigold CLI - Database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run admin database migrations
//! mg-cli migrate
//!
//! # Create admin user
//! mg-cli admin create -e admin@example.com -n "Admin Name" -r super_admin --password-stdin
//!
//! # Issue a trial code
//! mg-cli trial create --name "Jane Prospect" --days 14
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin` - Create, (de)activate, list admins and set passwords
//! - `trial` - Create and revoke trial users
//! - `sessions` - Clean up expired sessions, revoke an admin's sessions

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mg-cli")]
#[command(author, version, about = "Marigold CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Manage trial users
    Trial {
        #[command(subcommand)]
        action: TrialAction,
    },
    /// Maintain admin and trial sessions
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin role (`super_admin` or `admin`)
        #[arg(short, long, default_value = "admin")]
        role: String,

        /// Read an initial password from the first line of stdin
        #[arg(long)]
        password_stdin: bool,
    },
    /// Soft-deactivate an admin
    Deactivate {
        #[arg(short, long)]
        email: String,
    },
    /// Reactivate an admin
    Activate {
        #[arg(short, long)]
        email: String,
    },
    /// Set an admin's password (read from stdin)
    SetPassword {
        #[arg(short, long)]
        email: String,
    },
    /// List admin users
    List,
}

#[derive(Subcommand)]
enum TrialAction {
    /// Create a trial user and print its code
    Create {
        /// Name to greet the visitor with
        #[arg(short, long)]
        name: Option<String>,

        /// Contact email
        #[arg(short, long)]
        email: Option<String>,

        /// Days until the trial expires
        #[arg(short, long, default_value_t = 14)]
        days: u16,
    },
    /// Deactivate a trial user
    Revoke {
        #[arg(short, long)]
        token: String,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Delete expired admin and trial sessions
    Cleanup,
    /// Delete every session owned by an admin
    Revoke {
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                role,
                password_stdin,
            } => commands::admin::create(&email, &name, &role, password_stdin).await?,
            AdminAction::Deactivate { email } => {
                commands::admin::set_active(&email, false).await?;
            }
            AdminAction::Activate { email } => commands::admin::set_active(&email, true).await?,
            AdminAction::SetPassword { email } => commands::admin::set_password(&email).await?,
            AdminAction::List => commands::admin::list().await?,
        },
        Commands::Trial { action } => match action {
            TrialAction::Create { name, email, days } => {
                commands::trial::create(name, email.as_deref(), days).await?;
            }
            TrialAction::Revoke { token } => commands::trial::revoke(&token).await?,
        },
        Commands::Sessions { action } => match action {
            SessionAction::Cleanup => commands::sessions::cleanup().await?,
            SessionAction::Revoke { email } => commands::sessions::revoke(&email).await?,
        },
    }
    Ok(())
}
