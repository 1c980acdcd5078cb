//! Thread management subcommands.

use anyhow::Result;
use clap::Subcommand;
use hearth_api::ApiClient;
use hearth_core::ids::ThreadId;
use hearth_core::thread::ThreadPatch;

/// Thread CRUD operations.
#[derive(Subcommand, Debug)]
pub enum ThreadsCommand {
    /// List all threads.
    List,
    /// Create a thread.
    New {
        /// Thread title.
        title: String,
    },
    /// Delete a thread.
    Rm {
        /// Thread ID.
        id: String,
    },
    /// Create a public share link for a thread.
    Share {
        /// Thread ID.
        id: String,
    },
    /// Ask the backend for a better title and apply it.
    Title {
        /// Thread ID.
        id: String,
    },
}

pub async fn run(api: &ApiClient, command: ThreadsCommand) -> Result<()> {
    match command {
        ThreadsCommand::List => {
            let threads = api.list_threads().await?;
            for thread in threads {
                let mut flags = String::new();
                if thread.pinned {
                    flags.push_str(" [pinned]");
                }
                if thread.archived {
                    flags.push_str(" [archived]");
                }
                println!("{}  {}{flags}", thread.id, thread.title);
            }
        }
        ThreadsCommand::New { title } => {
            let thread = api.create_thread(&title).await?;
            println!("{}  {}", thread.id, thread.title);
        }
        ThreadsCommand::Rm { id } => {
            api.delete_thread(&ThreadId::from(id)).await?;
            println!("deleted");
        }
        ThreadsCommand::Share { id } => {
            let url = api.share_thread(&ThreadId::from(id)).await?;
            println!("{url}");
        }
        ThreadsCommand::Title { id } => {
            let id = ThreadId::from(id);
            let title = api.suggest_title(&id).await?;
            api.update_thread(
                &id,
                &ThreadPatch {
                    title: Some(title.clone()),
                    ..Default::default()
                },
            )
            .await?;
            println!("{title}");
        }
    }
    Ok(())
}
