mod categorize;
mod config;
mod db;
mod duplicates;
mod error;
mod import;
mod ledger;
mod models;
mod reconcile;
mod reports;
mod run;
mod service;
mod store;

use anyhow::Result;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let settings = config::Settings::load()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(settings.log_level.as_str())).init();

    let db_path = settings.database_path()?;
    let db = db::Database::open(&db_path)?;
    let books = service::Bookkeeper::new(db, settings.max_write_attempts);

    match args.len() {
        2.. => run::as_cli(&args, &books, &settings),
        _ => run::as_cli(&[args.first().cloned().unwrap_or_default(), "help".into()], &books, &settings),
    }
}
