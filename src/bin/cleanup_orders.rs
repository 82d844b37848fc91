use chrono::Duration;
use crafters_market::{
    config,
    db::{create_pool, orm_from_pool},
    services::{checkout_service::REUSE_WINDOW_MINUTES, order_service},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Removes pending orders that never got a payment intent. Orders younger
/// than the checkout reuse window are left alone.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = create_pool(&config::database_url()?).await?;
    let orm = orm_from_pool(&pool);

    let (deleted, remaining) =
        order_service::cleanup_abandoned(&orm, Duration::minutes(REUSE_WINDOW_MINUTES)).await?;

    println!("Deleted {deleted} pending orders without payment intents");
    println!("Remaining pending orders: {}", remaining.len());
    for order in remaining {
        println!(
            "  - {}: {} - {} minor units - intent: {}",
            order.order_number,
            order.customer_email,
            order.total,
            order.payment_intent_id.as_deref().unwrap_or("none")
        );
    }
    Ok(())
}
