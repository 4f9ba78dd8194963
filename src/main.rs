mod config;
mod errors;
mod files;
mod logging;
mod pg;
mod sandbox;
mod server;
mod web;


use crate::{config::Config, files::FileOps, pg::Console};
use anyhow::Context;
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path = PathBuf::from("filedesk.toml");
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                if i >= args.len() { eprintln!("--config requires a path"); std::process::exit(2); }
                config_path = PathBuf::from(&args[i]);
            }
            other => {
                eprintln!("unknown argument: {other}");
                std::process::exit(2);
            }
        }
        i += 1;
    }

    let cfg = Config::load(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    cfg.validate().context("validating config")?;

    let root = config::canonical_root(&cfg.root.root_dir).context("resolving root_dir")?;
    let files = FileOps::new(root);

    let console = match cfg.database_url() {
        Some(url) => Console::connect(url).context("configuring database pool")?,
        None => Console::disabled(),
    };

    let addr = format!("{}:{}", cfg.server.bind_addr, cfg.server.port);
    info!(
        addr = %addr,
        root = %files.sandbox().root().display(),
        sql_console = console.is_configured(),
        "filedesk ready"
    );

    server::serve(cfg, files, console).await
}
