//! UPI Recommender: transaction amount recommendations for UPI payments.
//!
//! Loads the profile table and trained artifacts once, then either serves the
//! HTTP API or answers a single query from the command line.

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info, warn};
use upi_api::ApiServer;
use upi_core::config::AppConfig;
use upi_core::types::{InsightLookup, RecommendRequest, TransactionContext};
use upi_engine::fallback::NEW_USER_ID;
use upi_engine::{EngineConfig, RecommendationEngine, UniformJitter, UserInsightService};
use upi_store::TransactionLog;

#[derive(Parser, Debug)]
#[command(name = "upi-recommender")]
#[command(about = "Transaction amount recommendations for UPI payments")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true, env = "UPI_RECOMMENDER_CONFIG")]
    config: Option<String>,

    /// User profile table, CSV or JSON (overrides config)
    #[arg(long, global = true, env = "UPI_RECOMMENDER__DATA__PROFILES_PATH")]
    profiles: Option<String>,

    /// Historical transactions, CSV or JSON (overrides config)
    #[arg(long, global = true, env = "UPI_RECOMMENDER__DATA__TRANSACTIONS_PATH")]
    transactions: Option<String>,

    /// Trained model artifact (overrides config)
    #[arg(long, global = true, env = "UPI_RECOMMENDER__MODEL__MODEL_PATH")]
    model: Option<String>,

    /// Categorical encoder tables (overrides config)
    #[arg(long, global = true, env = "UPI_RECOMMENDER__MODEL__ENCODERS_PATH")]
    encoders: Option<String>,

    /// Seed for fallback jitter, for reproducible output
    #[arg(long, global = true, env = "UPI_RECOMMENDER__ENGINE__RANDOM_SEED")]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// HTTP port (overrides config)
        #[arg(long, env = "UPI_RECOMMENDER__API__HTTP_PORT")]
        http_port: Option<u16>,
    },

    /// Recommend an amount for one payment and print it as JSON
    Recommend {
        user_id: String,

        category: String,

        #[arg(long, default_value = "Merchant")]
        receiver_type: String,

        #[arg(long, default_value = "Mumbai")]
        location: String,

        #[arg(long, default_value = "PhonePe")]
        payment_method: String,

        /// Hour of day, 0-23
        #[arg(long, default_value_t = 14)]
        hour: i64,
    },

    /// Print spending and segment insights for a user as JSON
    Insights { user_id: String },

    /// Run the sample recommendations
    Demo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "upi_recommender=info,upi_engine=info,upi_store=info,upi_inference=info,upi_api=info,tower_http=info".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;

    // Apply CLI overrides
    if let Some(path) = cli.profiles {
        config.data.profiles_path = path;
    }
    if let Some(path) = cli.transactions {
        config.data.transactions_path = Some(path);
    }
    if let Some(path) = cli.model {
        config.model.model_path = Some(path);
    }
    if let Some(path) = cli.encoders {
        config.model.encoders_path = Some(path);
    }
    if let Some(seed) = cli.seed {
        config.engine.random_seed = Some(seed);
    }
    if let Commands::Serve { host, http_port } = &cli.command {
        if let Some(host) = host {
            config.api.host = host.clone();
        }
        if let Some(port) = http_port {
            config.api.http_port = *port;
        }
    }

    info!(
        node_id = %config.node_id,
        profiles = %config.data.profiles_path,
        model = ?config.model.model_path,
        seeded = config.engine.random_seed.is_some(),
        "Configuration loaded"
    );

    let engine = Arc::new(build_engine(&config)?);

    match cli.command {
        Commands::Serve { .. } => {
            let api_server = ApiServer::new(config.clone(), engine);

            if config.metrics.enabled {
                if let Err(e) = api_server.start_metrics() {
                    error!(error = %e, "Failed to start metrics exporter");
                }
            }

            info!("UPI Recommender is ready to serve traffic");
            api_server.start_http().await?;
        }
        Commands::Recommend {
            user_id,
            category,
            receiver_type,
            location,
            payment_method,
            hour,
        } => {
            let request = RecommendRequest::new(
                user_id,
                TransactionContext {
                    category,
                    receiver_type,
                    location,
                    payment_method,
                    hour,
                },
            );
            let recommendation = engine.recommend(&request).into_recommendation();
            println!("{}", serde_json::to_string_pretty(&recommendation)?);
        }
        Commands::Insights { user_id } => {
            let insights = UserInsightService::new(engine.shared_config());
            println!("{}", serde_json::to_string_pretty(&insights.insights(&user_id))?);
        }
        Commands::Demo => run_demo(&engine),
    }

    Ok(())
}

/// Load every configured source and assemble the engine. Missing or
/// malformed sources abort startup.
fn build_engine(config: &AppConfig) -> anyhow::Result<RecommendationEngine> {
    let engine_config = EngineConfig::load(config)?;

    if engine_config.profiles.malformed_count() > 0 {
        warn!(
            malformed = engine_config.profiles.malformed_count(),
            "Some profile rows could not be parsed; those users get fallback recommendations"
        );
    }

    if let Some(path) = &config.data.transactions_path {
        let transactions = TransactionLog::load(path)?;
        info!(
            transactions = transactions.len(),
            users = transactions.distinct_users(),
            profiles = engine_config.profiles.len(),
            "Loaded transactions and user profiles"
        );

        let unprofiled = transactions.users_without_profile(&engine_config.profiles);
        if unprofiled > 0 {
            warn!(
                users = unprofiled,
                "Users in the transaction log have no profile row; they get category-average recommendations"
            );
        }
    }

    Ok(RecommendationEngine::new(
        Arc::new(engine_config),
        UniformJitter::from_seed(config.engine.random_seed),
    ))
}

fn run_demo(engine: &Arc<RecommendationEngine>) {
    let sample = |user_id: &str, category: &str, location: &str, payment_method: &str, hour| {
        let mut context = TransactionContext::for_category(category);
        context.location = location.to_string();
        context.payment_method = payment_method.to_string();
        context.hour = hour;
        RecommendRequest::new(user_id, context)
    };
    let requests = [
        sample("USER_0001", "Food & Dining", "Mumbai", "PhonePe", 13),
        sample("USER_0002", "Transportation", "Delhi", "Google Pay", 8),
        sample("NEW_USER_123", "Shopping", "Bangalore", "Paytm", 15),
    ];
    let insights = UserInsightService::new(engine.shared_config());

    println!("UPI Transaction Amount Recommendation System");
    println!("{}", "=".repeat(55));
    println!("Sample Recommendations:");
    println!("{}", "-".repeat(50));

    for request in &requests {
        let rec = engine.recommend(request).into_recommendation();
        println!();
        println!("User:               {}", rec.user_id);
        println!("Recommended Amount: Rs {:.2}", rec.recommended_amount);
        println!("Confidence:         {:.1}%", rec.confidence * 100.0);
        println!("Category:           {}", rec.category);

        if rec.user_id != NEW_USER_ID {
            if let InsightLookup::Found(insight) = insights.insights(&rec.user_id) {
                println!("User Segment:       {}", insight.user_segment.cluster_name);
            }
        }
    }
}
