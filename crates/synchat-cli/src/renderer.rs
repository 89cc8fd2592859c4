//! Terminal renderer for chat events
//!
//! Consumes the session's event channel and writes styled output. All
//! deltas of one session extend a single assistant block: the prefix is
//! printed on the first delta and the block stays open until a non-delta
//! event (or idle) closes it.

use std::io::Write;

use crossterm::style::Stylize;
use tokio::sync::mpsc;

use synchat_core::ChatEvent;

pub async fn run(mut events: mpsc::UnboundedReceiver<ChatEvent>) {
    let mut block_open = false;

    while let Some(event) = events.recv().await {
        match event {
            ChatEvent::UserMessage { text, attachments } => {
                if attachments > 0 {
                    println!(
                        "{} {} {}",
                        "you>".bold(),
                        text,
                        format!("[{} attachment(s)]", attachments).dim()
                    );
                } else {
                    println!("{} {}", "you>".bold(), text);
                }
            }
            ChatEvent::AssistantDelta { delta } => {
                if !block_open {
                    print!("{} ", "assistant>".bold().cyan());
                    block_open = true;
                }
                print!("{}", delta);
                let _ = std::io::stdout().flush();
            }
            ChatEvent::AssistantError { message } => {
                close_block(&mut block_open);
                println!("{} {}", "error>".bold().red(), message.red());
            }
            ChatEvent::Notice { text } => {
                close_block(&mut block_open);
                println!("{}", text.yellow());
            }
            ChatEvent::Idle => {
                close_block(&mut block_open);
            }
        }
    }
}

fn close_block(block_open: &mut bool) {
    if *block_open {
        println!();
        *block_open = false;
    }
}
