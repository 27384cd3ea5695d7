use hero_service::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing(&config)?;

    let cache = build_entity_cache(&config).await?;

    #[cfg(feature = "database")]
    if let Some(database) = &config.database {
        let pool = hero_service::database::create_pool(database).await?;
        let state = AppState::new(config.clone(), PgSuperHeroRepository::new(pool), cache);
        return Server::new(config).serve(app(state)).await;
    }

    #[cfg(not(feature = "database"))]
    if config.database.is_some() {
        warn!("[database] is configured but the `database` feature is disabled");
    }

    info!("No database configured, keeping SuperHeroes in memory");
    let state = AppState::new(config.clone(), InMemorySuperHeroRepository::new(), cache);
    Server::new(config).serve(app(state)).await
}
