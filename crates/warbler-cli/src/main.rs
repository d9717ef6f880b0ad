mod config;

use tracing::info;

use warbler_db::Database;

use crate::config::Config;

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = Config::from_env();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .init();

    // Opening runs any pending migrations
    let db = Database::open(&config.db_path)?;

    let stats = serde_json::json!({
        "db_path": config.db_path.display().to_string(),
        "users": db.count_users()?,
        "messages": db.count_messages()?,
        "follows": db.count_follows()?,
    });

    info!("Warbler database ready");
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}
