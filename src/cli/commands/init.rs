use std::path::Path;

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_init(config_path: &Path) -> anyhow::Result<()> {
    if Config::create_default_if_missing(config_path)? {
        println!("✓ Created {}", config_path.display());
    } else {
        println!("Config already exists: {}", config_path.display());
    }

    let config = Config::load_from_path(config_path)?;
    config.validate()?;
    let store = Store::new(&config.general.database_path).await?;
    store.ping().await?;

    println!("✓ Database ready at {}", config.general.database_path);
    Ok(())
}
