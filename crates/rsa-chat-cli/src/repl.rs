use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rsa_chat_core::{Conversation, MessageId, Party};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::render;

#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ReplLine {
    #[command(subcommand)]
    command: ReplCommand,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum ReplCommand {
    /// Generate (or regenerate) both key pairs; clears the chat
    Keys,

    /// Send a message from one party to the other
    Send {
        /// Sender
        from: Party,

        /// Message text, taken verbatim up to the end of the line
        #[arg(allow_hyphen_values = true)]
        text: String,
    },

    /// Decrypt a received message as its receiver
    Open {
        /// Receiver
        party: Party,

        /// Message id as shown in the inbox
        id: u64,
    },

    /// Toggle signature mode for subsequent messages
    Sign {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Show one party's chat
    Inbox { party: Party },

    /// Show the event log
    Log,

    /// Show key and mode status
    Status,

    /// Write the event log as JSON lines
    ExportLog { path: PathBuf },

    /// Exit
    #[command(alias = "exit")]
    Quit,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Toggle {
    On,
    Off,
}

enum Flow {
    Continue,
    Quit,
}

/// Splits a line into words, except that `send` keeps everything after the
/// party as a single argument with its inner whitespace untouched.
fn split_args(line: &str) -> Vec<&str> {
    let mut rest = line.trim();
    let head = if rest.split_whitespace().next() == Some("send") {
        2
    } else {
        usize::MAX
    };

    let mut args = Vec::new();
    while args.len() < head {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        args.push(&rest[..end]);
        rest = &rest[end..];
    }
    let tail = rest.trim_start();
    if !tail.is_empty() {
        args.push(tail);
    }
    args
}

fn parse(line: &str) -> Result<ReplCommand, clap::Error> {
    ReplLine::try_parse_from(split_args(line)).map(|l| l.command)
}

pub async fn run(conversation: Conversation) -> Result<()> {
    println!("{}", conversation.status_line());
    println!("Type `help` for commands, `keys` to start.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let command = match parse(line) {
            Ok(command) => command,
            Err(err) => {
                // help output and usage errors both render through clap
                println!("{}", err.render());
                continue;
            }
        };
        debug!(?command, "repl command");
        if let Flow::Quit = execute(&conversation, command).await? {
            break;
        }
    }
    Ok(())
}

async fn execute(conversation: &Conversation, command: ReplCommand) -> Result<Flow> {
    match command {
        ReplCommand::Keys => match conversation.generate_keys().await {
            Ok((alice, bob)) => {
                println!("Alice {}", alice.fingerprint());
                println!("Bob   {}", bob.fingerprint());
            }
            Err(err) => println!("{}", render::failure(&err)),
        },
        ReplCommand::Send { from, text } => {
            let signed = conversation.signature_mode();
            match conversation.send(from, &text, signed).await {
                Ok(message) => {
                    print!("{}", render::inbox(from, &conversation.inbox(from)));
                    debug!(id = %message.id, "message sent");
                }
                Err(err) => println!("{}", render::failure(&err)),
            }
        }
        ReplCommand::Open { party, id } => {
            match conversation.decrypt(party, MessageId(id)).await {
                Ok(_) => print!("{}", render::inbox(party, &conversation.inbox(party))),
                Err(err) => println!("{}", render::failure(&err)),
            }
        }
        ReplCommand::Sign { state } => {
            conversation.set_signature_mode(state == Toggle::On);
            println!("{}", conversation.status_line());
        }
        ReplCommand::Inbox { party } => {
            print!("{}", render::inbox(party, &conversation.inbox(party)));
        }
        ReplCommand::Log => print!("{}", render::log_panel(&conversation.log_panel())),
        ReplCommand::Status => println!("{}", conversation.status_line()),
        ReplCommand::ExportLog { path } => match export_log(conversation, &path) {
            Ok(()) => println!("log written to {}", path.display()),
            Err(err) => println!("error: {err:#}"),
        },
        ReplCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn export_log(conversation: &Conversation, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    conversation
        .export_log(BufWriter::new(file))
        .with_context(|| format!("failed to write {}", path.display()))
}
