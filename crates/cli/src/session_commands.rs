use std::path::Path;

use {anyhow::Result, clap::Subcommand, switchboard_sessions::SessionStore};

use crate::setup;

#[derive(Subcommand)]
pub enum SessionAction {
    /// List live sessions, most recently active first.
    List,
    /// Delete one user's session so their next message starts afresh.
    Clear {
        /// User address (the `from_addr` of their messages).
        user_id: String,
    },
    /// Delete expired sessions.
    Purge,
}

pub async fn handle_sessions(action: SessionAction, path: Option<&Path>) -> Result<()> {
    let (config, _) = setup::load(path)?;
    let store = setup::open_sqlite(&config.store).await?;

    match action {
        SessionAction::List => {
            let sessions = store.list().await?;
            if sessions.is_empty() {
                println!("No live sessions.");
            }
            for s in &sessions {
                println!(
                    "{}\t{}\t{}\t{}",
                    s.user_id,
                    s.state,
                    s.state.active_endpoint().unwrap_or("-"),
                    s.updated_at
                );
            }
        },
        SessionAction::Clear { user_id } => {
            store.clear(&user_id).await?;
            println!("Cleared session for {user_id}.");
        },
        SessionAction::Purge => {
            let removed = store.purge_expired().await?;
            println!("Removed {removed} expired session(s).");
        },
    }

    store.close().await;
    Ok(())
}
