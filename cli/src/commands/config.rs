//! Config command - show and change the settings file.

use anyhow::Result;
use portsync_core::ConfigStore;

pub async fn show(json: bool) -> Result<()> {
    let store = ConfigStore::new()?;
    let settings = store.load().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    println!("Config file:     {}", store.path().display());
    println!("Base URL:        {}", settings.base_url);
    println!("Debounce:        {} ms", settings.debounce_ms);
    match settings.request_timeout_secs {
        Some(secs) => println!("Request timeout: {} s", secs),
        None => println!("Request timeout: default"),
    }
    println!("Memoize checks:  {}", settings.memoize_checks);
    Ok(())
}

pub async fn set_url(url: &str) -> Result<()> {
    ConfigStore::new()?.set_base_url(url).await?;
    println!("Base URL set to {}", url.trim_end_matches('/'));
    Ok(())
}

pub async fn set_debounce(millis: u64) -> Result<()> {
    ConfigStore::new()?.set_debounce_ms(millis).await?;
    println!("Debounce set to {} ms", millis);
    Ok(())
}

pub async fn set_timeout(secs: u64) -> Result<()> {
    let timeout = (secs > 0).then_some(secs);
    ConfigStore::new()?.set_request_timeout_secs(timeout).await?;
    match timeout {
        Some(secs) => println!("Request timeout set to {} s", secs),
        None => println!("Request timeout cleared"),
    }
    Ok(())
}

pub async fn set_memoize(enabled: bool) -> Result<()> {
    ConfigStore::new()?.set_memoize_checks(enabled).await?;
    println!("Memoized checks {}", if enabled { "enabled" } else { "disabled" });
    Ok(())
}
