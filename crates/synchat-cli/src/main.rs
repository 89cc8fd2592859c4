//! synchat - terminal client for the SynGo streaming chatbot

mod renderer;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::style::Stylize;
use tokio::sync::mpsc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use synchat_core::auth::CredentialStore;
use synchat_core::chat::HttpTransport;
use synchat_core::{Attachment, ChatClient, ChatError, Config, OutboundMessage};

#[derive(Parser)]
#[command(name = "synchat", about = "Chat with the SynGo assistant from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store a bearer token for API calls
    Login { token: String },
    /// Remove the stored token
    Logout,
    /// Send a message and stream the response (ctrl-c cancels)
    Send {
        /// Message text; may be omitted when attachments are given
        message: Option<String>,
        /// Image files to attach (jpeg/png/gif/webp)
        #[arg(long = "attach", value_name = "FILE")]
        attach: Vec<PathBuf>,
    },
    /// One-shot generation without streaming
    Generate { message: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let credential_path = config
        .credential_path()
        .context("no config directory available for credential storage")?;
    let credentials = Arc::new(CredentialStore::new(credential_path));

    match cli.command {
        Command::Login { token } => {
            credentials.save(&token).await?;
            println!("Token stored.");
        }
        Command::Logout => {
            credentials.clear().await?;
            println!("Token removed.");
        }
        Command::Send { message, attach } => {
            run_send(&config, credentials, message, attach).await?;
        }
        Command::Generate { message } => {
            let transport = HttpTransport::new(config.base_url.clone(), credentials.clone());
            match transport.generate(&message).await {
                Ok(text) => println!("{}", text),
                Err(ChatError::AuthExpired) => {
                    credentials.clear().await?;
                    bail!("session expired - run `synchat login <token>` again");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}

async fn run_send(
    config: &Config,
    credentials: Arc<CredentialStore>,
    message: Option<String>,
    attach: Vec<PathBuf>,
) -> Result<()> {
    let mut attachments = Vec::with_capacity(attach.len());
    for path in &attach {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read attachment {:?}", path))?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("attachment")
            .to_string();
        attachments.push(Attachment::new(file_name, bytes)?);
    }

    let outbound = OutboundMessage {
        text: message.unwrap_or_default(),
        attachments,
    };

    let transport = Arc::new(HttpTransport::new(config.base_url.clone(), credentials.clone()));
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let client = Arc::new(
        ChatClient::new(transport, events_tx)
            .with_stream_timeout(Duration::from_secs(config.stream_timeout_secs)),
    );

    let renderer = tokio::spawn(renderer::run(events_rx));

    let ctrl_c = {
        let client = Arc::clone(&client);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("ctrl-c received");
                client.cancel();
            }
        })
    };

    let result = client.send(outbound).await;

    // release the event channel so the renderer can finish
    ctrl_c.abort();
    let _ = ctrl_c.await;
    drop(client);
    let _ = renderer.await;

    match result {
        Ok(()) => Ok(()),
        Err(ChatError::AuthExpired) => {
            credentials.clear().await?;
            bail!("session expired - run `synchat login <token>` again");
        }
        Err(ChatError::Transport(detail)) => {
            eprintln!("{} {}", "error>".bold().red(), detail);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
