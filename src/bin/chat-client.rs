use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use rustyline::{DefaultEditor, error::ReadlineError};

use portfolio_chat::{
    config::ClientConfig,
    message::Role,
    services::{
        session_manager::ChatSession,
        transport::HttpTransport,
        view::{ChatView, Mood, Status},
    },
    telemetry,
};

/// Draws the chat widget as plain terminal lines. Input focus and the send
/// button belong to the line editor, so those calls do nothing here.
struct TerminalView {
    owner: String,
}

impl TerminalView {
    fn line(&self, text: &str) {
        let mut out = std::io::stdout().lock();
        if let Err(err) = writeln!(out, "{text}") {
            tracing::trace!(%err, "stdout write failed");
        }
    }
}

impl ChatView for TerminalView {
    fn render(&self, role: Role, text: &str) {
        if role == Role::Assistant {
            self.line(&format!("{}> {text}", self.owner.to_lowercase()));
        }
    }

    fn set_mood(&self, mood: Mood) {
        tracing::trace!(%mood, "avatar mood");
    }

    fn set_status(&self, status: Status) {
        if status == Status::Thinking {
            self.line(&format!("  [{}]", status.label()));
        }
    }

    fn show_typing(&self) {}

    fn hide_typing(&self) {}

    fn set_open(&self, open: bool) {
        let text = if open { "  [chat opened]" } else { "  [chat closed, type to reopen]" };
        self.line(text);
    }

    fn dismiss_hint(&self) {
        tracing::trace!("hint dismissed");
    }

    fn clear_input(&self) {}

    fn focus_input(&self) {}

    fn set_send_enabled(&self, _enabled: bool) {}
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init();

    let config = ClientConfig::from_env();
    let view = Arc::new(TerminalView { owner: config.contact.owner.clone() });
    let session = Arc::new(ChatSession::new(
        HttpTransport::new(config.proxy_url.clone()),
        view.clone(),
        config.contact.clone(),
    ));
    let _hint = session.spawn_hint_timer();

    view.line(&format!(
        "Ask about {}'s background. /close hides the chat, /quit exits.",
        config.contact.owner
    ));

    let mut editor = DefaultEditor::new().context("starting line editor")?;
    loop {
        let (returned, line) = tokio::task::spawn_blocking(move || {
            let line = editor.readline("you> ");
            (editor, line)
        })
        .await
        .context("line editor task")?;
        editor = returned;

        let line = match line {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => return Err(err).context("reading input"),
        };

        match line.trim() {
            "/quit" => break,
            "/close" => {
                if session.state().await.is_open {
                    session.toggle().await;
                }
            }
            text => {
                if !session.state().await.is_open {
                    session.toggle().await;
                }
                if !text.is_empty() {
                    if let Err(err) = editor.add_history_entry(text) {
                        tracing::debug!(%err, "line not added to editor history");
                    }
                }
                session.submit(text).await;
            }
        }
    }

    tracing::debug!(session = %session.id(), turns = session.history().await.len() / 2, "chat ended");
    Ok(())
}
