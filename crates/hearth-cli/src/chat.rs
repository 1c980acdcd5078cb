//! Interactive chat subcommand.
//!
//! Reads lines from stdin, streams each turn's answer to stdout as it
//! arrives, and prints the turn's enrichment once it completes. Ctrl-C
//! cancels the in-flight turn (discarding the partial answer); at the
//! prompt, `/quit` or end-of-input exits.

use std::io::Write as _;

use anyhow::Result;
use hearth_chat::{TurnInput, TurnOutcome};
use hearth_core::ids::ThreadId;
use hearth_core::message::{Message, Role};
use tokio::io::AsyncBufReadExt as _;

use crate::App;

pub async fn run(app: &App, thread: Option<String>, model: Option<String>) -> Result<()> {
    let thread_id = match thread {
        Some(id) => {
            let id = ThreadId::from(id);
            let history = app.session.load_messages(&id).await?;
            for message in &history {
                print_message(message);
            }
            id
        }
        None => {
            let thread = app.api.create_thread("New chat").await?;
            eprintln!("started thread {}", thread.id);
            thread.id
        }
    };

    let model = model.or_else(|| app.settings.stream.default_model.clone());
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let text = line.trim().to_string();
        if text.is_empty() {
            continue;
        }
        if text == "/quit" {
            break;
        }
        run_turn(app, &thread_id, text, model.clone()).await?;
    }
    Ok(())
}

async fn run_turn(
    app: &App,
    thread_id: &ThreadId,
    text: String,
    model: Option<String>,
) -> Result<()> {
    let input = TurnInput {
        text,
        model,
        ..Default::default()
    };

    let mut turn = {
        let session = app.session.clone();
        let thread_id = thread_id.clone();
        tokio::spawn(async move {
            let mut printed = String::new();
            session
                .send(&thread_id, input, move |buffer| {
                    render_stream(buffer, &mut printed);
                })
                .await
        })
    };

    let outcome = tokio::select! {
        joined = &mut turn => joined?,
        _ = tokio::signal::ctrl_c() => {
            // cancel the in-flight turn, then let it wind down cleanly
            app.session.cancel(thread_id);
            turn.await?
        }
    }?;

    match outcome {
        TurnOutcome::Completed(message) => {
            println!();
            let mut parts = Vec::new();
            if let Some(model) = &message.model {
                parts.push(model.clone());
            }
            if let Some(latency) = message.latency_ms {
                parts.push(format!("{latency}ms"));
            }
            if !message.tools_used.is_empty() {
                parts.push(format!("tools: {}", message.tools_used.join(", ")));
            }
            if !parts.is_empty() {
                eprintln!("[{}]", parts.join(" | "));
            }
        }
        TurnOutcome::Failed(message) => {
            println!();
            eprintln!("[error] {}", message.content);
        }
        TurnOutcome::TransportFailed { .. } => {
            // the notifier already reported the failure
            println!();
        }
        TurnOutcome::Cancelled => {
            println!();
            eprintln!("(cancelled)");
        }
    }
    Ok(())
}

/// Print the newly arrived part of the buffer.
///
/// Deltas extend the previous buffer, so only the suffix is written; a
/// content snapshot that rewrote history restarts the line instead.
fn render_stream(buffer: &str, printed: &mut String) {
    let mut stdout = std::io::stdout().lock();
    if buffer.starts_with(printed.as_str()) {
        let _ = write!(stdout, "{}", &buffer[printed.len()..]);
    } else {
        let _ = write!(stdout, "\n{buffer}");
    }
    let _ = stdout.flush();
    *printed = buffer.to_string();
}

fn print_message(message: &Message) {
    let who = match message.role {
        Role::User => "you",
        Role::Assistant => "agent",
    };
    println!("{who}: {}", message.content);
}

fn prompt() -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    write!(stdout, "> ")?;
    stdout.flush()?;
    Ok(())
}
