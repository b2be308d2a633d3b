//! woo-bridge CLI - migrations, mirror push and an API client.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! woo-bridge migrate
//!
//! # Push local mirror rows to WooCommerce
//! woo-bridge mirror push [--id 12]
//!
//! # Talk to a running server
//! woo-bridge auth login -e ada@example.com -p 'correct horse'
//! woo-bridge products list
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `mirror push` - Push mirror rows to WooCommerce
//! - `auth` - Register, log in and out, show the current user
//! - `products` - List, fetch, create, update and delete products

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};

mod client;
mod commands;
mod token_store;

use client::{ApiClient, ClientError, DEFAULT_API_URL, ProductQuery, ProductRequest};
use token_store::{DEFAULT_TOKEN_FILE, TokenStore};

#[derive(Parser)]
#[command(name = "woo-bridge")]
#[command(author, version, about = "woo-bridge CLI tools")]
struct Cli {
    /// API base URL
    #[arg(long, global = true, env = "WOO_BRIDGE_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Where the session token is kept
    #[arg(long, global = true, env = "WOO_BRIDGE_TOKEN_FILE", default_value = DEFAULT_TOKEN_FILE)]
    token_file: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage the local product mirror
    Mirror {
        #[command(subcommand)]
        action: MirrorAction,
    },
    /// Account and session commands
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Product commands
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
}

#[derive(Subcommand)]
enum MirrorAction {
    /// Push mirror rows to WooCommerce (all rows unless --id is given)
    Push {
        /// Local mirror row id
        #[arg(long)]
        id: Option<i64>,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Create an account
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        /// Must match --password when given
        #[arg(long)]
        password_confirmation: Option<String>,
    },
    /// Log in and store the token
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Revoke the stored token
    Logout,
    /// Show the logged-in user
    Whoami,
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products
    List {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        per_page: Option<u32>,
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one product
    Get { id: i64 },
    /// Create a product
    Create(ProductFields),
    /// Update a product
    Update {
        id: i64,
        #[command(flatten)]
        fields: ProductFields,
    },
    /// Permanently delete a product
    Delete { id: i64 },
}

#[derive(Args)]
struct ProductFields {
    #[arg(short, long)]
    name: String,
    #[arg(short, long)]
    price: String,
    #[arg(short, long)]
    description: Option<String>,
    #[arg(long)]
    image_url: Option<String>,
    /// `draft` or `publish`
    #[arg(long)]
    status: Option<String>,
}

impl From<ProductFields> for ProductRequest {
    fn from(fields: ProductFields) -> Self {
        Self {
            name: fields.name,
            description: fields.description,
            price: fields.price,
            image_url: fields.image_url,
            status: fields.status,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Mirror { action } => match action {
            MirrorAction::Push { id } => commands::mirror::push(id).await?,
        },
        Commands::Auth { action } => {
            let client = api_client(&cli.api_url, &cli.token_file)?;
            let result = match action {
                AuthAction::Register {
                    name,
                    email,
                    password,
                    password_confirmation,
                } => {
                    commands::auth::register(
                        &client,
                        &name,
                        &email,
                        &password,
                        password_confirmation.as_deref(),
                    )
                    .await
                }
                AuthAction::Login { email, password } => {
                    commands::auth::login(&client, &email, &password).await
                }
                AuthAction::Logout => commands::auth::logout(&client).await,
                AuthAction::Whoami => commands::auth::whoami(&client).await,
            };
            result.map_err(report)?;
        }
        Commands::Products { action } => {
            let client = api_client(&cli.api_url, &cli.token_file)?;
            let result = match action {
                ProductAction::List {
                    page,
                    per_page,
                    search,
                } => {
                    let query = ProductQuery {
                        page,
                        per_page,
                        search,
                    };
                    commands::products::list(&client, &query).await
                }
                ProductAction::Get { id } => commands::products::get(&client, id).await,
                ProductAction::Create(fields) => {
                    commands::products::create(&client, &fields.into()).await
                }
                ProductAction::Update { id, fields } => {
                    commands::products::update(&client, id, &fields.into()).await
                }
                ProductAction::Delete { id } => commands::products::delete(&client, id).await,
            };
            result.map_err(report)?;
        }
    }
    Ok(())
}

fn api_client(api_url: &str, token_file: &str) -> Result<ApiClient, ClientError> {
    ApiClient::new(api_url, TokenStore::new(token_file))
}

/// Log the details an error message alone would hide, then pass it on.
fn report(err: ClientError) -> ClientError {
    match &err {
        ClientError::Unauthenticated(_) => {
            tracing::warn!("Session cleared. Log in again with `woo-bridge auth login`.");
        }
        ClientError::Validation { errors, .. } => {
            for (field, messages) in errors {
                for message in messages {
                    tracing::warn!("{field}: {message}");
                }
            }
        }
        _ => {}
    }
    err
}
