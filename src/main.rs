use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

use journalist::cli::{Cli, Commands, StoreCommands};
use journalist::config::{parse_duration, Config};
use journalist::domain::{Clock, SourceKind, SystemClock};
use journalist::errors::JournalistResult;
use journalist::render::parse_markdown_file;
use journalist::services::{CollectorService, DigestService, ForceOptions, PublishService, Publisher};
use journalist::sources::{HackerNewsSource, SourceRegistry, V2exSource};
use journalist::storage::sqlite::{SqliteChannelStateRepository, SqliteNewsRepository, SqliteStorage};
use journalist::storage::StoreMaintenance;
use journalist::summarizer::{OpenAiSummarizer, Summarizer};
use journalist::worker::janitor::sweep;
use journalist::worker::{cancel_on_shutdown, BuilderWorker, CollectorWorker, JanitorWorker, Manager};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> JournalistResult<()> {
    let cli = Cli::parse();

    // Inspecting a file needs neither configuration nor a runtime
    if let Commands::DebugParse { path } = &cli.command {
        return cmd_debug_parse(path);
    }

    let config = Config::from_file(&cli.config)?;
    init_tracing(&config.log_level);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match cli.command {
            Commands::Serve => cmd_serve(&config).await,
            Commands::Generate {
                channel,
                respect_skips,
                publish,
            } => cmd_generate(&config, &channel, respect_skips, publish).await,
            Commands::Publish { path, channel } => cmd_publish(&config, &path, &channel).await,
            Commands::Send {
                path_or_slug,
                channel,
            } => cmd_send(&config, &path_or_slug, &channel).await,
            Commands::Store { command } => cmd_store(&config, command),
            Commands::DebugParse { path } => cmd_debug_parse(&path),
        }
    })
}

/// RUST_LOG wins, then the configured level, then info
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn build_registry(config: &Config) -> JournalistResult<SourceRegistry> {
    let mut registry = SourceRegistry::new();

    if config.channels_for(SourceKind::V2ex).next().is_some() {
        registry.register(Arc::new(V2exSource::new(&config.v2ex.base_url, &config.v2ex.token)?));
    }
    if config.channels_for(SourceKind::HackerNews).next().is_some() {
        registry.register(Arc::new(HackerNewsSource::new(&config.hackernews.base_api)?));
    }

    Ok(registry)
}

fn build_summarizer(config: &Config) -> JournalistResult<Option<Arc<dyn Summarizer>>> {
    if !config.openai.enabled() {
        return Ok(None);
    }

    let summarizer = OpenAiSummarizer::new(
        &config.openai.api_key,
        &config.openai.model,
        &config.openai.base_url,
    )?;
    Ok(Some(Arc::new(summarizer)))
}

fn build_publisher(config: &Config) -> JournalistResult<Option<Arc<dyn Publisher>>> {
    if !config.quaily.enabled() {
        return Ok(None);
    }

    Ok(Some(Arc::new(PublishService::new(&config.quaily)?)))
}

async fn cmd_serve(config: &Config) -> JournalistResult<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let storage = SqliteStorage::new(&config.db_path)?.with_clock(clock.clone());
    let registry = build_registry(config)?;
    let summarizer = build_summarizer(config)?;
    let publisher = build_publisher(config)?;

    let mut manager = Manager::new();

    for kind in registry.kinds() {
        let categories = config.poll_categories(kind);
        if categories.is_empty() {
            warn!(source = %kind, "no categories configured, collector not started");
            continue;
        }

        let (interval, limit) = match kind {
            SourceKind::V2ex => (config.v2ex.fetch_interval, 0),
            SourceKind::HackerNews => (
                config.hackernews.fetch_interval,
                config.hackernews.limit_per_list,
            ),
        };

        info!(source = %kind, categories = ?categories, "collector configured");
        let service = CollectorService::new(
            registry.require(kind)?,
            SqliteNewsRepository::new(storage.clone()),
            categories,
            limit,
        );
        manager.add(Arc::new(CollectorWorker::new(service, interval, clock.clone())));
    }

    for channel in &config.channels {
        let service = DigestService::new(
            channel.clone(),
            SqliteNewsRepository::new(storage.clone()),
            SqliteChannelStateRepository::new(storage.clone()),
        )
        .with_summarizer(summarizer.clone())
        .with_publisher(publisher.clone());

        manager.add(Arc::new(BuilderWorker::new(
            service,
            config.build_interval,
            clock.clone(),
        )));
    }

    manager.add(Arc::new(JanitorWorker::new(
        storage.clone(),
        config.janitor.interval,
        config.janitor.ranked_retention,
        clock.clone(),
    )));

    info!(workers = ?manager.names(), "starting workers");

    let cancel = CancellationToken::new();
    let signals = cancel_on_shutdown(cancel.clone());
    let result = manager.run(cancel).await;
    signals.abort();

    info!("shutdown complete");
    result
}

async fn cmd_generate(
    config: &Config,
    channel: &str,
    respect_skips: bool,
    publish: bool,
) -> JournalistResult<()> {
    let channel = config.channel(channel)?.clone();
    let storage = SqliteStorage::new(&config.db_path)?;
    let publisher = if publish { build_publisher(config)? } else { None };

    let service = DigestService::new(
        channel,
        SqliteNewsRepository::new(storage.clone()),
        SqliteChannelStateRepository::new(storage),
    )
    .with_summarizer(build_summarizer(config)?)
    .with_publisher(publisher);

    let path = service
        .generate(
            Utc::now(),
            ForceOptions {
                respect_skips,
                publish,
            },
        )
        .await?;

    println!("Generated {}", path.display());
    if publish {
        println!("Published to Quaily channel {}", service.channel().name);
    }

    Ok(())
}

async fn cmd_publish(config: &Config, path: &str, channel: &str) -> JournalistResult<()> {
    let service = PublishService::new(&config.quaily)?;
    let post_id = service.publish_markdown(Path::new(path), channel).await?;

    println!("Published post {} to {}", post_id, channel);
    Ok(())
}

async fn cmd_send(config: &Config, path_or_slug: &str, channel: &str) -> JournalistResult<()> {
    let service = PublishService::new(&config.quaily)?;
    let slug = service.deliver(path_or_slug, channel).await?;

    println!("Delivered {} to {}", slug, channel);
    Ok(())
}

fn cmd_debug_parse(path: &str) -> JournalistResult<()> {
    let doc = parse_markdown_file(path)?;

    let keys = doc.keys();
    if keys.is_empty() {
        println!("No frontmatter.");
    } else {
        println!("Frontmatter keys: {}", keys.join(", "));
    }
    println!("Body length: {} bytes", doc.body.len());

    Ok(())
}

fn cmd_store(config: &Config, command: StoreCommands) -> JournalistResult<()> {
    let storage = SqliteStorage::new(&config.db_path)?;

    match command {
        StoreCommands::Stats => {
            let stats = storage.stats()?;
            println!("Store: {}\n", config.db_path);
            println!("  Items:            {}", stats.items);
            println!(
                "  Ranked entries:   {} ({} dangling)",
                stats.ranked_entries, stats.dangling_ranked_entries
            );
            println!("  Published flags:  {}", stats.published_flags);
            println!("  Skip markers:     {}", stats.skip_markers);
            println!("  Category titles:  {}", stats.category_titles);
        }
        StoreCommands::Purge { retention } => {
            let retention = match retention {
                Some(value) => parse_duration("--retention", &value)?,
                None => config.janitor.ranked_retention,
            };
            let removed = sweep(&storage, retention, Utc::now())?;
            println!("Removed {} rows.", removed);
        }
    }

    Ok(())
}
