use anyhow::{Context, Result};
use std::env;
use stockbook_backend::config::AppConfig;
use stockbook_backend::services::RestructureService;
use stockbook_backend::store::Store;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let store = Store::from_config(&config);
    let service = RestructureService::new(store.clone());

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("status");

    match command {
        "apply" => {
            info!("Restructuring every configured sheet...");
            let outcomes = service
                .apply_all()
                .await
                .context("Failed to restructure sheets")?;
            for outcome in &outcomes {
                println!("{:<14} {:>6} rows  {}", outcome.kind, outcome.rows, outcome.report);
                if !outcome.extra_columns.is_empty() {
                    println!("{:<14} kept extra columns: {}", "", outcome.extra_columns.join(", "));
                }
            }
            info!("Restructured {} sheet(s)", outcomes.len());
        }
        "status" => {
            for status in service.status_all().await {
                match (&status.error, status.missing_columns.is_empty()) {
                    (Some(e), _) => println!("{:<14} unavailable: {}", status.kind, e),
                    (None, true) => println!("{:<14} {:>6} rows  ok", status.kind, status.rows),
                    (None, false) => println!(
                        "{:<14} {:>6} rows  missing: {}",
                        status.kind,
                        status.rows,
                        status.missing_columns.join(", ")
                    ),
                }
            }
        }
        "verify" => {
            info!("Verifying configuration against the {} store", store.backend_name());
            if config.google_access_token.is_none() {
                warn!("GOOGLE_ACCESS_TOKEN is not set");
            }
            let statuses = service.status_all().await;
            let mut failures = 0;
            for status in &statuses {
                match &status.error {
                    Some(e) => {
                        failures += 1;
                        error!("{}: {}", status.kind, e);
                    }
                    None => info!(
                        "{}: reachable at {} ({} rows)",
                        status.kind,
                        status.table_ref.as_deref().unwrap_or("?"),
                        status.rows
                    ),
                }
            }
            if failures > 0 {
                anyhow::bail!("{} of {} sheets failed verification", failures, statuses.len());
            }
            info!("All sheets verified");
        }
        _ => {
            eprintln!("Usage: restructure [apply|status|verify]");
            eprintln!("  apply   - Rewrite every configured sheet into canonical column order");
            eprintln!("  status  - Show missing columns per sheet without writing (default)");
            eprintln!("  verify  - Check configuration and that every sheet can be read");
            std::process::exit(1);
        }
    }

    Ok(())
}
