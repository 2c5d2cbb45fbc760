//! Binary entrypoint for the pwgate API server.
use anyhow::Context;
use pwgate_api::{run, AppState};
use pwgate_core::PasswordConfig;
use pwgate_store::{default_policies, InMemoryPolicyStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::var("PWGATE_CONFIG").ok().map(PathBuf::from);
    let config = PasswordConfig::load(config_path.as_deref()).context("loading configuration")?;

    let store = InMemoryPolicyStore::with_records(default_policies())
        .context("seeding policy store")?;
    let mut state = AppState::new(config, Arc::new(store))?;

    if let Some(ms) = env_number("PWGATE_VALIDATION_TIMEOUT_MS")? {
        state = state.with_validation_timeout(Duration::from_millis(ms));
    }
    if let Some(segments) = env_number("PWGATE_PATCH_PREFIX_SEGMENTS")? {
        state = state.with_prefix_segments(segments as usize);
    }

    if state.config.breach_check_enabled {
        // Build the shared blocking HTTP client up front, off the async workers
        let warm = state.clone();
        tokio::task::spawn_blocking(move || warm.breach_checker().map(|_| ()))
            .await?
            .context("building breach client")?;
    }

    // Default listen address can be overridden with PWGATE_ADDR
    let addr = std::env::var("PWGATE_ADDR").unwrap_or_else(|_| "0.0.0.0:8787".to_string());
    run(&addr, state).await.context("serving API")?;
    Ok(())
}

fn env_number(name: &str) -> anyhow::Result<Option<u64>> {
    match std::env::var(name) {
        Ok(raw) => Ok(Some(raw.trim().parse().with_context(|| format!("{} must be a number", name))?)),
        Err(_) => Ok(None),
    }
}
