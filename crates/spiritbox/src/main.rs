//! The `spiritbox` binary.
//!
//! `serve` wires the progression engine to a line-delimited JSON event
//! feed on stdin (the chat gateway adapter lives out of tree) and runs
//! the periodic jobs. The remaining subcommands are the operational
//! entry points for catalog administration.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use spiritbox::{
    AchievementManager, AchievementRepository, BotConfig, CatalogRefreshJob, ChallengeManager,
    ChallengeRepository, ChallengeRotationJob, ChallengeType, CounterResetJob, GreetingRepository,
    GreetingService, JobRunner, MemberEvent, MessageEvent, MessagePipeline, PrestigeManager,
    ProfileRepository, ResetPeriod, RoleRewardRepository, ScheduleType, TracingSink, create_pool,
    load_seed_catalog,
};
use spiritbox_interface::{AchievementStore, ChallengeStore, ProfileStore};

#[derive(Parser)]
#[command(name = "spiritbox", about = "Phasmophobia-themed community bot", version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot: consume gateway events from stdin, run periodic jobs
    Serve,
    /// Load achievement/challenge definitions from a TOML seed file
    SeedCatalogs {
        /// Seed file path
        #[arg(long)]
        file: PathBuf,
    },
    /// Delete expired challenges and generate the period's set
    RegenerateChallenges {
        /// Which cadence class to regenerate
        period: Period,
    },
    /// Zero a periodic XP counter across all profiles
    ResetCounters {
        /// Which boundary to reset
        period: Period,
    },
    /// Print a guild's XP and prestige standings
    Leaderboard {
        /// Guild to rank
        guild_id: i64,
        /// Number of rows
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Period {
    Daily,
    Weekly,
    Monthly,
}

impl From<Period> for ChallengeType {
    fn from(period: Period) -> Self {
        match period {
            Period::Daily => ChallengeType::Daily,
            Period::Weekly => ChallengeType::Weekly,
            Period::Monthly => ChallengeType::Monthly,
        }
    }
}

impl From<Period> for ResetPeriod {
    fn from(period: Period) -> Self {
        match period {
            Period::Daily => ResetPeriod::Daily,
            Period::Weekly => ResetPeriod::Weekly,
            Period::Monthly => ResetPeriod::Monthly,
        }
    }
}

/// One line of the stdin event feed.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Envelope {
    Message(MessageEvent),
    MemberJoined(MemberEvent),
    MemberLeft(MemberEvent),
}

fn init_tracing(json_logs: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = BotConfig::load(cli.config.as_deref()).context("loading configuration")?;
    init_tracing(config.json_logs);

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::SeedCatalogs { file } => seed_catalogs(config, &file).await,
        Commands::RegenerateChallenges { period } => regenerate(config, period).await,
        Commands::ResetCounters { period } => reset_counters(config, period).await,
        Commands::Leaderboard { guild_id, limit } => leaderboard(config, guild_id, limit).await,
    }
}

struct Engine {
    profiles: Arc<ProfileRepository>,
    achievements: Arc<AchievementManager>,
    challenges: Arc<ChallengeManager>,
    pipeline: Arc<MessagePipeline>,
    greetings: GreetingService,
}

fn build_engine(config: &BotConfig) -> anyhow::Result<Engine> {
    let pool = create_pool(config.database_pool_size).context("creating connection pool")?;

    let profiles = Arc::new(ProfileRepository::new(pool.clone()));
    let achievements = Arc::new(AchievementManager::new(
        Arc::new(AchievementRepository::new(pool.clone())),
        profiles.clone(),
    ));
    let challenges = Arc::new(ChallengeManager::new(
        Arc::new(ChallengeRepository::new(pool.clone())),
        profiles.clone(),
    ));
    let sink = Arc::new(TracingSink);

    let pipeline = Arc::new(MessagePipeline::new(
        config.pipeline_config(),
        profiles.clone(),
        achievements.clone(),
        challenges.clone(),
        Arc::new(RoleRewardRepository::new(pool.clone())),
        sink.clone(),
    ));
    let greetings = GreetingService::new(Arc::new(GreetingRepository::new(pool)), sink);

    Ok(Engine {
        profiles,
        achievements,
        challenges,
        pipeline,
        greetings,
    })
}

async fn serve(config: BotConfig) -> anyhow::Result<()> {
    let engine = build_engine(&config)?;
    let now = chrono::Utc::now();
    engine.achievements.reload(now).await?;
    engine.challenges.reload(now).await?;

    let mut runner = JobRunner::new();
    runner.register(Arc::new(ChallengeRotationJob::new(
        engine.challenges.clone(),
        ChallengeType::Daily,
        ScheduleType::daily(),
    )));
    runner.register(Arc::new(ChallengeRotationJob::new(
        engine.challenges.clone(),
        ChallengeType::Weekly,
        ScheduleType::weekly(),
    )));
    runner.register(Arc::new(ChallengeRotationJob::new(
        engine.challenges.clone(),
        ChallengeType::Monthly,
        ScheduleType::monthly(),
    )));
    runner.register(Arc::new(CounterResetJob::new(
        engine.profiles.clone(),
        ResetPeriod::Daily,
        ScheduleType::daily(),
    )));
    runner.register(Arc::new(CounterResetJob::new(
        engine.profiles.clone(),
        ResetPeriod::Weekly,
        ScheduleType::weekly(),
    )));
    runner.register(Arc::new(CounterResetJob::new(
        engine.profiles.clone(),
        ResetPeriod::Monthly,
        ScheduleType::monthly(),
    )));
    runner.register(Arc::new(CatalogRefreshJob::new(
        engine.achievements.clone(),
        engine.challenges.clone(),
        ScheduleType::Interval {
            seconds: config.catalog_refresh_secs,
        },
    )));
    tokio::spawn(runner.run_loop(std::time::Duration::from_secs(30)));

    let sweeper = engine.pipeline.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            sweeper.sweep_caches();
        }
    });

    info!("Serving; reading gateway events from stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let envelope: Envelope = match serde_json::from_str(&line) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "Unparseable event line");
                continue;
            }
        };
        match envelope {
            Envelope::Message(event) => match engine.pipeline.handle_message(&event).await {
                Ok(Some(outcome)) => info!(
                    user_id = event.user_id,
                    guild_id = event.guild_id,
                    xp_gained = outcome.xp_gained,
                    level_up = outcome.level_up.is_some(),
                    "Message processed"
                ),
                Ok(None) => {}
                // Individual messages are low-value; log and keep serving.
                Err(e) => error!(error = %e, "Message processing failed"),
            },
            Envelope::MemberJoined(event) => {
                if let Err(e) = engine.greetings.member_joined(&event).await {
                    error!(error = %e, "Welcome handling failed");
                }
            }
            Envelope::MemberLeft(event) => {
                if let Err(e) = engine.greetings.member_left(&event).await {
                    error!(error = %e, "Farewell handling failed");
                }
            }
        }
    }
    Ok(())
}

async fn seed_catalogs(config: BotConfig, file: &std::path::Path) -> anyhow::Result<()> {
    let catalog = load_seed_catalog(file)?;
    let pool = create_pool(config.database_pool_size).context("creating connection pool")?;
    let achievements = AchievementRepository::new(pool.clone());
    let challenges = ChallengeRepository::new(pool);

    for definition in &catalog.achievements {
        achievements.upsert_definition(definition).await?;
    }
    for challenge in &catalog.challenges {
        challenges.upsert_instance(challenge).await?;
    }
    info!(
        achievements = catalog.achievements.len(),
        challenges = catalog.challenges.len(),
        "Catalogs seeded"
    );
    Ok(())
}

async fn regenerate(config: BotConfig, period: Period) -> anyhow::Result<()> {
    let engine = build_engine(&config)?;
    let generated = engine
        .challenges
        .rotate(period.into(), chrono::Utc::now())
        .await?;
    for challenge in &generated {
        info!(id = %challenge.id, name = %challenge.name, "Generated challenge");
    }
    Ok(())
}

async fn reset_counters(config: BotConfig, period: Period) -> anyhow::Result<()> {
    let engine = build_engine(&config)?;
    let touched = engine
        .profiles
        .reset_periodic_counters(period.into())
        .await?;
    info!(touched, "Periodic counters reset");
    Ok(())
}

async fn leaderboard(config: BotConfig, guild_id: i64, limit: i64) -> anyhow::Result<()> {
    let engine = build_engine(&config)?;

    println!("Top {} by XP in guild {}", limit, guild_id);
    for (rank, profile) in engine
        .profiles
        .top_by_xp(guild_id, limit)
        .await?
        .iter()
        .enumerate()
    {
        println!(
            "{:>3}. user {:<20} level {:<4} xp {}",
            rank + 1,
            profile.user_id,
            profile.level,
            profile.xp
        );
    }

    let prestige = PrestigeManager::new(engine.profiles.clone());
    let standings = prestige.leaderboard(guild_id, limit).await?;
    if !standings.is_empty() {
        println!("\nPrestige standings");
        for (rank, row) in standings.iter().enumerate() {
            println!(
                "{:>3}. user {:<20} prestige {:<3} effective level {}",
                rank + 1,
                row.user_id,
                row.prestige,
                row.effective_level
            );
        }
    }
    Ok(())
}
