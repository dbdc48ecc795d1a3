//! Command handlers: context wiring and the search-completion surface.

use std::path::Path;

use uuid::Uuid;

use pricelens_compare::{BatchRunner, BatchStatus, ComparisonService, ImageSearch, KeywordSearch, UrlSearch};
use pricelens_core::{AppConfig, ProductResult, ResultOrdering, SearchFilters};
use pricelens_crawler::{CrawlerConfig, CrawlerRegistry};
use pricelens_db::PoolConfig;
use pricelens_store::{Stores, VendorContact};
use pricelens_vision::{ImageRecognizer, VisionConfig};

use crate::output;

pub struct AppContext {
    pub config: AppConfig,
    pub service: ComparisonService,
    pub stores: Stores,
}

impl AppContext {
    /// Wires the registry, recognizer, stores, and (when configured and
    /// reachable) the hosted sink. A missing or failing backend logs a
    /// warning and leaves search fully functional.
    pub async fn build(config: AppConfig) -> anyhow::Result<Self> {
        let crawler_config = CrawlerConfig::from_app_config(&config);
        let registry = CrawlerRegistry::with_default_crawlers(&crawler_config)?;
        let recognizer = ImageRecognizer::new(VisionConfig::from_app_config(&config))?;
        let mut service = ComparisonService::new(registry, recognizer);

        if let Some(database_url) = &config.database_url {
            match pricelens_db::connect_pool(database_url, PoolConfig::from_app_config(&config))
                .await
            {
                Ok(pool) => match pricelens_db::run_migrations(&pool).await {
                    Ok(()) => {
                        let user_id = parse_user_id(config.user_id.as_deref());
                        service = service.with_sink(pool, user_id);
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "migrations failed — continuing without the hosted backend");
                    }
                },
                Err(err) => {
                    tracing::warn!(error = %err, "cannot reach the hosted backend — continuing without it");
                }
            }
        }

        let stores = Stores::open(&config.data_dir, config.history_max_entries);
        Ok(Self {
            config,
            service,
            stores,
        })
    }
}

fn parse_user_id(raw: Option<&str>) -> Uuid {
    match raw {
        Some(value) => value.parse().unwrap_or_else(|_| {
            tracing::warn!(value, "PRICELENS_USER_ID is not a UUID — using the nil id");
            Uuid::nil()
        }),
        None => Uuid::nil(),
    }
}

/// The presentation surface: invoked exactly once per completed search or
/// batch run. Ranks and prints, records history (when there are keywords to
/// record), checks price alerts, and feeds the sink.
async fn on_search_complete(
    ctx: &AppContext,
    results: &[ProductResult],
    keywords: &[String],
    platforms: &[String],
    ordering: ResultOrdering,
) -> anyhow::Result<()> {
    let ranked = pricelens_core::rank_results(results, ordering, None);
    output::print_results(&ranked);
    output::print_stats(&pricelens_core::ResultStats::compute(&ranked));

    if !keywords.is_empty() {
        if let Err(err) =
            ctx.stores
                .history
                .record(keywords.to_vec(), platforms.to_vec(), results.len())
        {
            tracing::warn!(error = %err, "failed to record search history");
        }
    }

    match ctx.stores.alerts.check(results) {
        Ok(fired) => {
            for alert in fired {
                println!(
                    "🔔 price alert: {} reached target {:.2}",
                    alert.product_name, alert.target_price
                );
            }
        }
        Err(err) => tracing::warn!(error = %err, "failed to check price alerts"),
    }

    let saved = ctx.service.persist_results(results).await;
    if saved > 0 {
        tracing::info!(saved, "persisted results to the hosted backend");
    }
    Ok(())
}

pub async fn run_search(
    ctx: &AppContext,
    keyword: &str,
    platforms: Vec<String>,
    filters: SearchFilters,
    ordering: ResultOrdering,
) -> anyhow::Result<()> {
    let results = ctx
        .service
        .search_by_keyword(&KeywordSearch {
            keyword: keyword.to_owned(),
            platforms: platforms.clone(),
            filters,
        })
        .await?;
    on_search_complete(ctx, &results, &[keyword.to_owned()], &platforms, ordering).await
}

pub async fn run_url(ctx: &AppContext, url: &str, platforms: Vec<String>) -> anyhow::Result<()> {
    let results = ctx
        .service
        .search_by_url(&UrlSearch {
            url: url.to_owned(),
            platforms: platforms.clone(),
        })
        .await?;
    // URL mode has no user-typed keyword; nothing is recorded as history.
    on_search_complete(ctx, &results, &[], &platforms, ResultOrdering::Price).await
}

pub async fn run_image(
    ctx: &AppContext,
    image_url: &str,
    platforms: Vec<String>,
) -> anyhow::Result<()> {
    let outcome = ctx
        .service
        .search_by_image(&ImageSearch {
            image_url: image_url.to_owned(),
            platforms: platforms.clone(),
        })
        .await?;
    println!("recognized keywords: {}", outcome.keywords.join(", "));

    let searched = outcome.keywords.first().cloned().into_iter().collect::<Vec<_>>();
    on_search_complete(
        ctx,
        &outcome.results,
        &searched,
        &platforms,
        ResultOrdering::Price,
    )
    .await
}

pub async fn run_batch(
    ctx: &AppContext,
    file: &Path,
    platforms: Vec<String>,
    ordering: ResultOrdering,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)?;
    let lines: Vec<String> = content.lines().map(str::to_owned).collect();

    let searcher = ctx.service.bound_to(platforms.clone());
    let runner = BatchRunner::new(
        &searcher,
        &lines,
        ctx.config.batch_inter_item_delay_ms,
    );
    let total = runner.items().len();
    anyhow::ensure!(total > 0, "no keywords found in {}", file.display());
    println!(
        "running a batch of {total} keywords across {} platforms",
        platforms.len()
    );

    // Mirror the run into a comparison_tasks row when the sink is attached.
    let task_id = match ctx.service.sink() {
        Some((pool, user_id)) => {
            let search_input = serde_json::json!(runner
                .items()
                .iter()
                .map(|item| serde_json::json!({"identifier": item.keyword, "type": "keyword"}))
                .collect::<Vec<_>>());
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let created = pricelens_db::create_comparison_task(
                pool,
                user_id,
                &format!("Batch comparison ({total} keywords)"),
                "keyword",
                &search_input,
                &platforms,
                total as i32,
            )
            .await;
            match created {
                Ok(row) => {
                    if let Err(err) = pricelens_db::start_comparison_task(pool, row.id).await {
                        tracing::warn!(error = %err, "failed to start comparison task row");
                    }
                    Some(row.id)
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to create comparison task row");
                    None
                }
            }
        }
        None => None,
    };

    // Per-item progress updates flow through a channel into an async drain,
    // keeping the runner's observer synchronous.
    let (progress_tx, mut progress_rx) =
        tokio::sync::mpsc::unbounded_channel::<(i32, i32)>();
    let drain = match (task_id, ctx.service.sink()) {
        (Some(id), Some((pool, _))) => {
            let pool = pool.clone();
            Some(tokio::spawn(async move {
                while let Some((completed, failed)) = progress_rx.recv().await {
                    if let Err(err) =
                        pricelens_db::update_task_progress(&pool, id, completed, failed).await
                    {
                        tracing::warn!(error = %err, "failed to mirror batch progress");
                    }
                }
            }))
        }
        _ => None,
    };

    let mut completed = 0i32;
    let mut failed = 0i32;
    let outcome = runner
        .run(|progress, item| {
            match item.status {
                BatchStatus::Completed => {
                    completed += 1;
                    println!(
                        "[{}/{}] {} — {} results",
                        progress.settled,
                        progress.total,
                        item.keyword,
                        item.results.len()
                    );
                }
                BatchStatus::Error => {
                    failed += 1;
                    println!(
                        "[{}/{}] {} — failed: {}",
                        progress.settled,
                        progress.total,
                        item.keyword,
                        item.error.as_deref().unwrap_or("unknown error")
                    );
                }
                BatchStatus::Pending | BatchStatus::Searching => {}
            }
            let _ = progress_tx.send((completed, failed));
        })
        .await;

    drop(progress_tx);
    if let Some(handle) = drain {
        let _ = handle.await;
    }

    if let (Some(id), Some((pool, _))) = (task_id, ctx.service.sink()) {
        let finalize = if outcome.keywords.is_empty() {
            pricelens_db::fail_comparison_task(pool, id, "all batch items failed").await
        } else {
            pricelens_db::complete_comparison_task(pool, id).await
        };
        if let Err(err) = finalize {
            tracing::warn!(error = %err, "failed to finalize comparison task row");
        }
    }

    on_search_complete(ctx, &outcome.results, &outcome.keywords, &platforms, ordering).await
}

pub async fn favorite_add(ctx: &AppContext, url: &str) -> anyhow::Result<()> {
    let product = ctx
        .service
        .registry()
        .product_from_url(url)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no product found at {url}"))?;
    let name = product.name.clone();
    if ctx.stores.favorites.add(product)? {
        println!("saved \"{name}\" to favorites");
    } else {
        println!("already in favorites");
    }
    Ok(())
}

pub fn favorite_list(ctx: &AppContext) -> anyhow::Result<()> {
    let favorites = ctx.stores.favorites.list()?;
    if favorites.is_empty() {
        println!("no favorites saved");
        return Ok(());
    }
    for item in favorites {
        println!(
            "{:<10} {:>10.2}  {}  {}",
            item.product.platform, item.product.price, item.product.name, item.product.product_url
        );
    }
    Ok(())
}

pub fn favorite_remove(ctx: &AppContext, url: &str) -> anyhow::Result<()> {
    if ctx.stores.favorites.remove(url)? {
        println!("removed from favorites");
    } else {
        println!("not in favorites");
    }
    Ok(())
}

pub async fn alert_add(ctx: &AppContext, url: &str, target: f64) -> anyhow::Result<()> {
    let product = ctx
        .service
        .registry()
        .product_from_url(url)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no product found at {url}"))?;

    let alert = ctx.stores.alerts.add(&product, target)?;
    println!(
        "watching \"{}\" for a price at or below {:.2} (currently {:.2})",
        alert.product_name, target, product.price
    );

    // Mirror into the hosted backend when attached.
    if let Some((pool, user_id)) = ctx.service.sink() {
        if let Err(err) = pricelens_db::upsert_price_alert(
            pool,
            user_id,
            &product.name,
            &product.product_url,
            &product.platform,
            target,
        )
        .await
        {
            tracing::warn!(error = %err, "failed to mirror price alert to the hosted backend");
        }
    }
    Ok(())
}

pub fn alert_list(ctx: &AppContext) -> anyhow::Result<()> {
    let alerts = ctx.stores.alerts.list()?;
    if alerts.is_empty() {
        println!("no price alerts set");
        return Ok(());
    }
    for alert in alerts {
        let status = if alert.is_triggered() {
            "triggered"
        } else {
            "watching"
        };
        println!(
            "{status:<9} target {:>10.2}  {}  {}",
            alert.target_price, alert.product_name, alert.product_url
        );
    }
    Ok(())
}

pub fn history_list(ctx: &AppContext) -> anyhow::Result<()> {
    let entries = ctx.stores.history.list()?;
    if entries.is_empty() {
        println!("no search history");
        return Ok(());
    }
    for entry in entries {
        println!(
            "{}  [{}]  {} results  — {}",
            entry.searched_at.format("%Y-%m-%d %H:%M"),
            entry.platforms.join(","),
            entry.result_count,
            entry.keywords.join(", ")
        );
    }
    Ok(())
}

pub fn history_clear(ctx: &AppContext) -> anyhow::Result<()> {
    ctx.stores.history.clear()?;
    println!("search history cleared");
    Ok(())
}

pub fn vendor_add(
    ctx: &AppContext,
    name: &str,
    platform: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    notes: Option<String>,
) -> anyhow::Result<()> {
    let mut vendor = VendorContact::new(name);
    vendor.platform = platform;
    vendor.email = email;
    vendor.phone = phone;
    vendor.notes = notes;
    ctx.stores.vendors.add(vendor)?;
    println!("vendor \"{name}\" saved");
    Ok(())
}

pub fn vendor_list(ctx: &AppContext, platform: Option<&str>) -> anyhow::Result<()> {
    let vendors = match platform {
        Some(p) => ctx.stores.vendors.by_platform(p)?,
        None => ctx.stores.vendors.list()?,
    };
    if vendors.is_empty() {
        println!("no vendor contacts");
        return Ok(());
    }
    for vendor in vendors {
        println!(
            "{:<20} {:<10} {}",
            vendor.name,
            vendor.platform.as_deref().unwrap_or("-"),
            vendor.email.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
