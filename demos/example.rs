use std::sync::{Arc, Mutex};

use dragon_wire::config::{from_table, BoxError, Component, Config, Table, TomlScript};
use dragon_wire::{AppContext, ConfigStore};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct PoolSettings {
    size: u32,
    timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct Database {
    host: String,
    pool: PoolSettings,
}

impl Component for Database {}

#[derive(Debug)]
struct Reporter {
    region: String,
    app_name: Mutex<Option<String>>,
}

impl Component for Reporter {
    fn initialize_component(&self, config: &ConfigStore) -> Result<(), BoxError> {
        let name = config.lookup("app.name")?.as_str().map(str::to_string);
        *self.app_name.lock().map_err(|e| e.to_string())? = name;
        Ok(())
    }
}

fn make_database(props: Table) -> Result<Arc<dyn Component>, BoxError> {
    let db: Database = from_table(&props)?;
    Ok(Arc::new(db))
}

fn make_reporter(props: Table) -> Result<Arc<dyn Component>, BoxError> {
    let region = props
        .get("region")
        .and_then(|v| v.as_str())
        .ok_or("region is required")?
        .to_string();
    Ok(Arc::new(Reporter {
        region,
        app_name: Mutex::new(None),
    }))
}

fn main() -> Result<(), dragon_wire::Error> {
    let ctx = AppContext::builder()
        .with_config(
            Config::builder()
                .with_file("demos/default.toml", true)
                .with_files_from_env()
                .load()?,
        )
        .with_factory("demo.Database", make_database)
        .with_factory("demo.Reporter", make_reporter)
        .with_script_engine(TomlScript)
        .build()?;

    let config = ctx.config();

    if let Some(db) = config.get("database")?.component::<Database>() {
        println!(
            "Database: {} (pool size {}, timeout {}s)",
            db.host, db.pool.size, db.pool.timeout_secs
        );
    }
    if let Some(reporter) = config.get("reporting")?.component::<Reporter>() {
        let app_name = reporter.app_name.lock().ok().and_then(|n| n.clone());
        println!("Reporter: region {} for {:?}", reporter.region, app_name);
    }

    Ok(())
}
