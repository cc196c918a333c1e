use anyhow::{Context, Result};
use rec_cache::RedisCache;
use recommendation_service::repository::{Neo4jGraphRepository, PostgresProductRepository};
use recommendation_service::Config;
use sqlx::PgPool;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rec_migrate=info,recommendation_service=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    if matches!(command, "help" | "-h" | "--help") {
        print_help();
        return Ok(());
    }

    let config = Config::from_env().context("Failed to load configuration")?;

    match command {
        "migrate" => {
            let pool = PgPool::connect(&config.database.url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run SQL migrations")?;
            info!("SQL migrations applied");

            let graph = connect_graph(&config).await?;
            graph
                .ensure_constraints()
                .await
                .context("Failed to create Neo4j constraints")?;
            info!("Neo4j constraints in place");
        }

        "check" => {
            let pool = PgPool::connect(&config.database.url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            PostgresProductRepository::new(pool)
                .health_check()
                .await
                .context("PostgreSQL check failed")?;
            info!("PostgreSQL connection OK");

            let graph = connect_graph(&config).await?;
            if graph.health_check().await? {
                info!("Neo4j connection OK");
            } else {
                error!("Neo4j health query returned no result");
            }

            let cache = RedisCache::connect(&config.redis.url)
                .await
                .context("Failed to connect to Redis")?;
            cache.ping().await.context("Redis check failed")?;
            info!("Redis connection OK");
        }

        "stats" => {
            let pool = PgPool::connect(&config.database.url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
                .fetch_one(&pool)
                .await?;
            let interactions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM interactions")
                .fetch_one(&pool)
                .await?;
            let purchases: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchases")
                .fetch_one(&pool)
                .await?;

            let graph = connect_graph(&config).await?;
            let (users, graph_products, edges) = graph.stats().await?;

            info!(products, interactions, purchases, "PostgreSQL");
            info!(users, products = graph_products, edges, "Neo4j");
        }

        other => {
            error!(command = %other, "Unknown command");
            print_help();
            std::process::exit(2);
        }
    }

    Ok(())
}

async fn connect_graph(config: &Config) -> Result<Neo4jGraphRepository> {
    Neo4jGraphRepository::new(
        &config.neo4j.uri,
        &config.neo4j.user,
        &config.neo4j.password,
    )
    .await
    .context("Failed to connect to Neo4j")
}

fn print_help() {
    println!("Recommendation storage tool");
    println!();
    println!("Usage: rec-migrate <command>");
    println!();
    println!("Commands:");
    println!("  migrate    - Apply SQL migrations and Neo4j constraints");
    println!("  check      - Check PostgreSQL, Neo4j and Redis connections");
    println!("  stats      - Show row and graph totals");
    println!("  help       - Show this help message");
    println!();
    println!("Environment Variables:");
    println!("  DATABASE_URL       - PostgreSQL connection string (required)");
    println!("  NEO4J_URI          - Neo4j URI (default: bolt://localhost:7687)");
    println!("  NEO4J_USER         - Neo4j username (default: neo4j)");
    println!("  NEO4J_PASSWORD     - Neo4j password");
    println!("  REDIS_URL          - Redis URL (default: redis://localhost:6379)");
}
