use crate::commands::Out;
use crate::{Config, Result};

pub async fn theme_show(config: &Config) -> Result<Out<Option<String>>> {
    let theme = config.ledger().theme().await;
    let message = match &theme {
        Some(name) => format!("Theme: {name}"),
        None => "No theme has been chosen".to_string(),
    };
    Ok(Out::new(message, theme))
}

pub async fn theme_set(config: &Config, name: &str) -> Result<Out<()>> {
    config.ledger().set_theme(name).await?;
    Ok(format!("Theme set to {}", name.trim()).into())
}
