// Interactive terminal chat against a running relay server.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::render::{render_message, typing_indicator, ChatView};
use crate::session::{ChatSession, HttpRelayTransport};

/// A line typed at the chat prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum ChatCommand<'a> {
    Quit,
    Image(&'a str),
    Message(&'a str),
}

pub fn parse_command(line: &str) -> ChatCommand<'_> {
    let trimmed = line.trim();
    if trimmed == "/quit" || trimmed == "/exit" {
        return ChatCommand::Quit;
    }
    if let Some(path) = trimmed.strip_prefix("/image ") {
        return ChatCommand::Image(path.trim());
    }
    ChatCommand::Message(line)
}

/// Prints the messages appended since `printed`, returning the new count.
async fn print_new_messages(session: &ChatSession, printed: usize) -> usize {
    let conversation = session.snapshot().await;
    for message in conversation.messages().iter().skip(printed) {
        println!("{}", render_message(message));
    }
    conversation.len()
}

pub async fn run_chat(server_url: &str, view: ChatView) -> Result<()> {
    let transport = HttpRelayTransport::new(server_url);
    info!("Starting chat session against {}", transport.url());
    let session = ChatSession::new(Arc::new(transport));

    println!("== {} ==", view.title);
    println!("(/image <path> to attach an image, /quit to leave)");
    let mut printed = print_new_messages(&session, 0).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        println!("{}", view.placeholder);
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_command(&line) {
            ChatCommand::Quit => break,
            ChatCommand::Image(path) => match session.upload_image(Path::new(path)).await {
                Ok(reply) => {
                    printed = print_new_messages(&session, printed).await;
                    if let Err(e) = reply.await {
                        warn!("Image reply task failed: {:?}", e);
                    }
                }
                Err(e) => eprintln!("{}", e),
            },
            ChatCommand::Message(text) => {
                if text.trim().is_empty() {
                    continue;
                }
                session.set_input(text).await;
                println!("{}", typing_indicator());
                session.submit_input().await;
            }
        }
        printed = print_new_messages(&session, printed).await;
    }

    info!("Chat session finished.");
    Ok(())
}
