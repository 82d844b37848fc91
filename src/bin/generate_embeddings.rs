use crafters_market::{
    clients::embeddings::OpenAiEmbeddings,
    config::AppConfig,
    db::{create_pool, orm_from_pool},
    services::embedding_service,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,crafters_market=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let embeddings = config
        .embeddings
        .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY is not set"))?;
    let provider = OpenAiEmbeddings::new(embeddings.api_key, embeddings.api_base, embeddings.model);

    let pool = create_pool(&config.database_url).await?;
    let orm = orm_from_pool(&pool);

    let run = embedding_service::generate_missing(&orm, &provider).await?;
    println!(
        "Processed {} products: {} succeeded, {} failed",
        run.total, run.success_count, run.error_count
    );

    let status = embedding_service::embedding_status(&orm).await?;
    println!(
        "Coverage: {}/{} products ({}%)",
        status.with_embeddings, status.total, status.percent_complete
    );
    Ok(())
}
