use crafters_market::{
    config,
    db::{create_pool, run_migrations},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let pool = create_pool(&config::database_url()?).await?;
    run_migrations(&pool).await?;
    println!("Migrations applied");
    Ok(())
}
