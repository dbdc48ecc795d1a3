mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use pricelens_core::{ResultOrdering, SortKey};

const DEFAULT_PLATFORMS: &str = "shopee,pchome,momo,1688";

#[derive(Debug, Parser)]
#[command(name = "pricelens")]
#[command(about = "Multi-platform price comparison from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search platforms by keyword and compare prices
    Search {
        keyword: String,
        #[arg(long, value_delimiter = ',', default_value = DEFAULT_PLATFORMS)]
        platforms: Vec<String>,
        /// Server-side ordering requested from each platform
        #[arg(long)]
        sort: Option<SortArg>,
        /// Local ordering of the merged result list
        #[arg(long, value_enum, default_value = "price")]
        rank: RankArg,
        /// Per-platform result page size
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
    },
    /// Identify a product from its page URL and compare it across platforms
    Url {
        url: String,
        #[arg(long, value_delimiter = ',', default_value = DEFAULT_PLATFORMS)]
        platforms: Vec<String>,
    },
    /// Recognize a product photo and search with the top keyword
    Image {
        image_url: String,
        #[arg(long, value_delimiter = ',', default_value = DEFAULT_PLATFORMS)]
        platforms: Vec<String>,
    },
    /// Run many keyword searches from a file, one keyword per line
    Batch {
        file: PathBuf,
        #[arg(long, value_delimiter = ',', default_value = DEFAULT_PLATFORMS)]
        platforms: Vec<String>,
        #[arg(long, value_enum, default_value = "price")]
        rank: RankArg,
    },
    /// List the platforms with a registered crawler
    Platforms,
    /// Manage saved favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Manage price alerts
    Alerts {
        #[command(subcommand)]
        action: AlertsAction,
    },
    /// Show or clear search history
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },
    /// Manage vendor contacts
    Vendors {
        #[command(subcommand)]
        action: VendorsAction,
    },
}

#[derive(Debug, Subcommand)]
enum FavoritesAction {
    /// Save the product behind a URL
    Add { url: String },
    /// List saved favorites
    List,
    /// Remove a favorite by its product URL
    Remove { url: String },
}

#[derive(Debug, Subcommand)]
enum AlertsAction {
    /// Watch the product behind a URL for a target price
    Add {
        url: String,
        #[arg(long)]
        target: f64,
    },
    /// List alerts with their status
    List,
}

#[derive(Debug, Subcommand)]
enum HistoryAction {
    /// List recorded searches (default)
    List,
    /// Delete all recorded searches
    Clear,
}

#[derive(Debug, Subcommand)]
enum VendorsAction {
    /// Add a vendor contact
    Add {
        name: String,
        #[arg(long)]
        platform: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List vendor contacts
    List {
        #[arg(long)]
        platform: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Price,
    Sales,
    Rating,
    Relevance,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Price => SortKey::Price,
            SortArg::Sales => SortKey::Sales,
            SortArg::Rating => SortKey::Rating,
            SortArg::Relevance => SortKey::Relevance,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RankArg {
    Price,
    Sales,
    Rating,
    Discount,
}

impl From<RankArg> for ResultOrdering {
    fn from(arg: RankArg) -> Self {
        match arg {
            RankArg::Price => ResultOrdering::Price,
            RankArg::Sales => ResultOrdering::Sales,
            RankArg::Rating => ResultOrdering::Rating,
            RankArg::Discount => ResultOrdering::Discount,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = pricelens_core::load_app_config()?;
    init_tracing(&config.log_level);

    let cli = Cli::parse();
    let ctx = commands::AppContext::build(config).await?;

    match cli.command {
        Commands::Search {
            keyword,
            platforms,
            sort,
            rank,
            limit,
            min_price,
            max_price,
        } => {
            let filters = pricelens_core::SearchFilters {
                price_min: min_price,
                price_max: max_price,
                sort_by: sort.map(SortKey::from),
                limit,
                ..pricelens_core::SearchFilters::default()
            };
            commands::run_search(&ctx, &keyword, platforms, filters, rank.into()).await
        }
        Commands::Url { url, platforms } => commands::run_url(&ctx, &url, platforms).await,
        Commands::Image {
            image_url,
            platforms,
        } => commands::run_image(&ctx, &image_url, platforms).await,
        Commands::Batch {
            file,
            platforms,
            rank,
        } => commands::run_batch(&ctx, &file, platforms, rank.into()).await,
        Commands::Platforms => {
            for platform in ctx.service.registry().available_platforms() {
                println!("{platform}");
            }
            Ok(())
        }
        Commands::Favorites { action } => match action {
            FavoritesAction::Add { url } => commands::favorite_add(&ctx, &url).await,
            FavoritesAction::List => commands::favorite_list(&ctx),
            FavoritesAction::Remove { url } => commands::favorite_remove(&ctx, &url),
        },
        Commands::Alerts { action } => match action {
            AlertsAction::Add { url, target } => commands::alert_add(&ctx, &url, target).await,
            AlertsAction::List => commands::alert_list(&ctx),
        },
        Commands::History { action } => match action {
            Some(HistoryAction::Clear) => commands::history_clear(&ctx),
            _ => commands::history_list(&ctx),
        },
        Commands::Vendors { action } => match action {
            VendorsAction::Add {
                name,
                platform,
                email,
                phone,
                notes,
            } => commands::vendor_add(&ctx, &name, platform, email, phone, notes),
            VendorsAction::List { platform } => commands::vendor_list(&ctx, platform.as_deref()),
        },
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_owned()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
