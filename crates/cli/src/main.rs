//! Catalog CLI - Product file management tools.
//!
//! Works directly on the product file the server uses. Run it while the
//! server is stopped; a running server does not see these changes until
//! it restarts.
//!
//! # Usage
//!
//! ```bash
//! # List the first five products
//! catalog-cli products list --limit 5
//!
//! # Add a product
//! catalog-cli products add --title Lamp --description "Desk lamp" \
//!     --price 12.50 --thumbnail lamp.png --code L1 --stock 4
//!
//! # Change some fields
//! catalog-cli products update 1 --stock 10
//!
//! # Delete a product
//! catalog-cli products delete 1
//!
//! # Add every product listed in a YAML file
//! catalog-cli seed products.yaml
//! ```
//!
//! # Commands
//!
//! - `products` - List, add, update and delete products
//! - `seed` - Add products from a YAML file, skipping rejected entries

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use catalog_core::{Price, ProductId};
use catalog_storefront::config::DEFAULT_PRODUCTS_FILE;
use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "catalog-cli")]
#[command(author, version, about = "Catalog CLI tools")]
struct Cli {
    /// Product list JSON file
    #[arg(
        short,
        long,
        global = true,
        env = "CATALOG_PRODUCTS_FILE",
        default_value = DEFAULT_PRODUCTS_FILE
    )]
    file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Add products from a YAML file
    Seed {
        /// YAML file holding a list of products
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products
    List {
        /// Show at most this many products
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Add a product
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        price: Price,
        #[arg(long)]
        thumbnail: String,
        #[arg(long)]
        code: String,
        #[arg(long)]
        stock: u32,
    },
    /// Change some fields of a product
    Update {
        /// Product ID
        id: ProductId,
        #[command(flatten)]
        fields: UpdateFields,
    },
    /// Delete a product
    Delete {
        /// Product ID
        id: ProductId,
    },
}

#[derive(Args)]
struct UpdateFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    price: Option<Price>,
    #[arg(long)]
    thumbnail: Option<String>,
    #[arg(long)]
    code: Option<String>,
    #[arg(long)]
    stock: Option<u32>,
}

#[tokio::main]
async fn main() {
    // Pick up CATALOG_PRODUCTS_FILE from .env before parsing
    dotenvy::dotenv().ok();

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
    let catalog = commands::open_catalog(cli.file).await;

    match cli.command {
        Commands::Products { action } => match action {
            ProductAction::List { limit } => commands::products::list(&catalog, limit).await,
            ProductAction::Add {
                title,
                description,
                price,
                thumbnail,
                code,
                stock,
            } => {
                let input = catalog_core::NewProduct {
                    title: Some(title),
                    description: Some(description),
                    price: Some(price),
                    thumbnail: Some(thumbnail),
                    code: Some(code),
                    stock: Some(stock),
                };
                commands::products::add(&catalog, input).await?;
            }
            ProductAction::Update { id, fields } => {
                let patch = catalog_core::ProductPatch {
                    title: fields.title,
                    description: fields.description,
                    price: fields.price,
                    thumbnail: fields.thumbnail,
                    code: fields.code,
                    stock: fields.stock,
                };
                commands::products::update(&catalog, id, patch).await?;
            }
            ProductAction::Delete { id } => {
                commands::products::delete(&catalog, id).await?;
            }
        },
        Commands::Seed { path } => {
            commands::seed::products(&catalog, &path).await?;
        }
    }
    Ok(())
}
