use {
    anyhow::{Context, Result},
    clap::Subcommand,
    parley_config::ParleyConfig,
    parley_store::{MessageStore, SqliteMessageStore},
};

#[derive(Subcommand)]
pub enum MessagesAction {
    /// Print the stored history as a JSON array, oldest first.
    List,
    /// Print how many messages are stored.
    Count,
}

pub async fn handle_messages(action: MessagesAction, config: &ParleyConfig) -> Result<()> {
    let store = SqliteMessageStore::connect(&config.store.url)
        .await
        .with_context(|| format!("failed to open message store at {}", config.store.url))?;

    match action {
        MessagesAction::List => {
            let messages = store.list_all().await?;
            println!("{}", serde_json::to_string_pretty(&messages)?);
        },
        MessagesAction::Count => println!("{}", store.count().await?),
    }
    Ok(())
}
