//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use storefront_core::api::types::{ProductForm, Role};
use storefront_core::catalog::SortBy;
use storefront_core::config;
use storefront_core::context::AppContext;
use tracing_subscriber::{EnvFilter, fmt};

mod commands;

const LOG_ENV: &str = "STOREFRONT_LOG";

#[derive(Parser)]
#[command(name = "storefront")]
#[command(version)]
#[command(about = "Storefront client: browse the catalog, manage your cart and the shop")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    #[command(flatten)]
    Api(ApiCommands),
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Commands that talk to the storefront API.
#[derive(clap::Subcommand)]
enum ApiCommands {
    /// Log in with email and password
    Login {
        #[arg(short, long)]
        email: String,
        /// Password (read from stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account and log in
    Register {
        #[arg(short, long)]
        email: String,
        /// Password (read from stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
        /// Password confirmation (read from stdin when omitted)
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Log out and remove stored tokens
    Logout,
    /// Exchange the stored refresh token for a new pair
    Refresh,
    /// Show the logged-in user
    Whoami,
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        command: ProductCommands,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        command: CartCommands,
    },
    /// Administer products and users (admin role required)
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(clap::Subcommand)]
enum ProductCommands {
    /// List one catalog page
    List {
        /// Page number (1-based)
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Case-insensitive match on name, description or category
        #[arg(short, long, default_value = "")]
        search: String,
        /// Exact category
        #[arg(short, long)]
        category: Option<String>,
        /// name, price-asc, price-desc, rating or newest
        #[arg(long, default_value = "name")]
        sort: SortBy,
    },
    /// Show one product
    Show {
        #[arg(value_name = "PRODUCT_ID")]
        id: i64,
    },
}

#[derive(clap::Subcommand)]
enum CartCommands {
    /// Show cart contents
    Show,
    /// Add a product
    Add {
        #[arg(value_name = "PRODUCT_ID")]
        product_id: i64,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of a cart line
    Update {
        #[arg(value_name = "ITEM_ID")]
        item_id: i64,
        #[arg(value_name = "QUANTITY")]
        quantity: u32,
    },
    /// Remove a cart line
    Remove {
        #[arg(value_name = "ITEM_ID")]
        item_id: i64,
    },
    /// Remove everything
    Clear,
}

/// Product fields for create/update.
#[derive(clap::Args, Debug, Clone, Default)]
struct ProductArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    price: Option<f64>,
    #[arg(long)]
    stock: Option<i64>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    sku: Option<String>,
    #[arg(long)]
    weight: Option<f64>,
    #[arg(long)]
    dimensions: Option<String>,
    /// Image file uploaded as-is
    #[arg(long, value_name = "PATH")]
    image: Option<PathBuf>,
}

#[derive(clap::Subcommand)]
enum AdminCommands {
    /// List all products, including inactive ones
    Products,
    /// List users
    Users,
    /// Product and category statistics
    Stats,
    /// Toggle a product's active flag
    Toggle {
        #[arg(value_name = "PRODUCT_ID")]
        id: i64,
    },
    /// Delete a product
    Delete {
        #[arg(value_name = "PRODUCT_ID")]
        id: i64,
    },
    /// Change a user's role
    SetRole {
        #[arg(value_name = "USER_ID")]
        id: i64,
        /// ADMIN or USER
        #[arg(value_name = "ROLE")]
        role: Role,
    },
    /// Create a product
    Create {
        #[command(flatten)]
        product: ProductArgs,
    },
    /// Update a product
    Update {
        #[arg(value_name = "PRODUCT_ID")]
        id: i64,
        #[command(flatten)]
        product: ProductArgs,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Print a config generated from defaults
    Generate,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

/// Logs go to stderr so command output stays pipeable.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be installed when embedded; keep it.
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Config { command } => config_command(&command),
        Commands::Api(command) => {
            let config = config::Config::load().context("load config")?;
            let ctx = commands::open(config)?;
            run_api(&ctx, command).await
        }
    }
}

async fn run_api(ctx: &AppContext, command: ApiCommands) -> Result<()> {
    match command {
        ApiCommands::Login { email, password } => {
            commands::auth::login(ctx, &email, password).await
        }
        ApiCommands::Register {
            email,
            password,
            confirm_password,
        } => commands::auth::register(ctx, &email, password, confirm_password).await,
        ApiCommands::Logout => commands::auth::logout(ctx).await,
        ApiCommands::Refresh => commands::auth::refresh(ctx).await,
        ApiCommands::Whoami => commands::auth::whoami(ctx).await,

        ApiCommands::Products { command } => match command {
            ProductCommands::List {
                page,
                search,
                category,
                sort,
            } => commands::products::list(ctx, page, search, category, sort).await,
            ProductCommands::Show { id } => commands::products::show(ctx, id).await,
        },

        ApiCommands::Cart { command } => match command {
            CartCommands::Show => commands::cart::show(ctx).await,
            CartCommands::Add {
                product_id,
                quantity,
            } => commands::cart::add(ctx, product_id, quantity).await,
            CartCommands::Update { item_id, quantity } => {
                commands::cart::update(ctx, item_id, quantity).await
            }
            CartCommands::Remove { item_id } => commands::cart::remove(ctx, item_id).await,
            CartCommands::Clear => commands::cart::clear(ctx).await,
        },

        ApiCommands::Admin { command } => match command {
            AdminCommands::Products => commands::admin::products(ctx).await,
            AdminCommands::Users => commands::admin::users(ctx).await,
            AdminCommands::Stats => commands::admin::stats(ctx).await,
            AdminCommands::Toggle { id } => commands::admin::toggle(ctx, id).await,
            AdminCommands::Delete { id } => commands::admin::delete(ctx, id).await,
            AdminCommands::SetRole { id, role } => commands::admin::set_role(ctx, id, role).await,
            AdminCommands::Create { product } => {
                commands::admin::create(ctx, product.into_form()?).await
            }
            AdminCommands::Update { id, product } => {
                commands::admin::update(ctx, id, product.into_form()?).await
            }
        },
    }
}

fn config_command(command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Path => {
            commands::config::path();
            Ok(())
        }
        ConfigCommands::Init => commands::config::init(),
        ConfigCommands::Generate => commands::config::generate(),
    }
}

impl ProductArgs {
    fn into_form(self) -> Result<commands::admin::ProductInput> {
        let image = self
            .image
            .as_deref()
            .map(commands::admin::read_image)
            .transpose()?;
        Ok(commands::admin::ProductInput {
            form: ProductForm {
                name: self.name.unwrap_or_default(),
                description: self.description,
                price: self.price,
                stock: self.stock,
                category: self.category,
                sku: self.sku,
                weight: self.weight,
                dimensions: self.dimensions,
                is_active: None,
            },
            image,
        })
    }
}
