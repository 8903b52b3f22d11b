//! A terminal chat for trying the campus assistant.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::time::Duration;

use campus_chat::model::{Feedback, Message, MessageId, Role};
use campus_chat::{AssistantChat, AssistantChatBuilder, QUICK_PROMPTS};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

enum ChatEvent {
    Idle,
    Message(Message),
    Rated(MessageId, Feedback),
}

enum CommandOutcome {
    Done,
    Submitted,
    Quit,
}

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let chat = AssistantChatBuilder::new()
        .on_message({
            let event_tx = event_tx.clone();
            move |message: &Message| {
                event_tx.send(ChatEvent::Message(message.clone())).ok();
            }
        })
        .on_feedback({
            let event_tx = event_tx.clone();
            move |id, feedback| {
                event_tx.send(ChatEvent::Rated(id, feedback)).ok();
            }
        })
        .on_idle({
            let event_tx = event_tx.clone();
            move || {
                event_tx.send(ChatEvent::Idle).ok();
            }
        })
        .build();

    for message in chat.snapshot().await.messages {
        print_assistant_message(&message);
    }
    print_help();

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    'outer: loop {
        print!("> ");
        std::io::stdout().flush().unwrap();

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim();

        match line.strip_prefix('/') {
            Some(command) => match run_command(&chat, command) {
                CommandOutcome::Quit => break,
                CommandOutcome::Submitted => {}
                CommandOutcome::Done => {
                    drain_events(&chat, &mut event_rx).await;
                    continue;
                }
            },
            None => {
                if line.is_empty() {
                    continue;
                }
                chat.send_message(line);
            }
        }

        // A submission was accepted; spin until the reply settles.
        let mut progress_bar = None;

        loop {
            progress_bar
                .get_or_insert_with(|| {
                    let progress_bar = ProgressBar::new_spinner();
                    progress_bar.set_style(progress_style.clone());
                    progress_bar.set_message("Thinking...");
                    progress_bar
                })
                .inc(1);

            let tick = sleep(Duration::from_millis(100));
            let event = select! {
                event = event_rx.recv() => {
                    let Some(event) = event else {
                        break 'outer;
                    };
                    event
                }
                _ = tick => {
                    continue;
                }
            };

            if let Some(progress_bar) = progress_bar.take() {
                progress_bar.finish_and_clear();
            }

            match event {
                ChatEvent::Message(message) => {
                    print_assistant_message(&message);
                }
                ChatEvent::Rated(..) => {}
                ChatEvent::Idle => {
                    break;
                }
            }
        }
    }
}

fn run_command(chat: &AssistantChat, command: &str) -> CommandOutcome {
    let mut parts = command.split_whitespace();
    match parts.next() {
        Some("quit") | Some("q") => CommandOutcome::Quit,
        Some("new") => {
            chat.new_conversation();
            println!("Started a new conversation.");
            CommandOutcome::Done
        }
        Some("rate") => {
            let (Some(id), Some(rating)) = (parts.next(), parts.next())
            else {
                println!("Usage: /rate <id> up|down");
                return CommandOutcome::Done;
            };
            let Ok(id) = id.parse::<u64>() else {
                println!("Usage: /rate <id> up|down");
                return CommandOutcome::Done;
            };
            let feedback = match rating {
                "up" => Feedback::Helpful,
                "down" => Feedback::NotHelpful,
                _ => {
                    println!("Usage: /rate <id> up|down");
                    return CommandOutcome::Done;
                }
            };
            chat.rate_message(MessageId::new(id), feedback);
            CommandOutcome::Done
        }
        Some("quick") => match parts.next() {
            None => {
                for (index, prompt) in QUICK_PROMPTS.iter().enumerate() {
                    println!("  {index}: {prompt}");
                }
                CommandOutcome::Done
            }
            Some(index) => {
                let Some(index) = index
                    .parse::<usize>()
                    .ok()
                    .filter(|index| *index < QUICK_PROMPTS.len())
                else {
                    println!(
                        "Pick a quick prompt between 0 and {}.",
                        QUICK_PROMPTS.len() - 1
                    );
                    return CommandOutcome::Done;
                };
                println!("> {}", QUICK_PROMPTS[index]);
                chat.apply_quick_prompt(index);
                chat.send_draft();
                CommandOutcome::Submitted
            }
        },
        _ => {
            print_help();
            CommandOutcome::Done
        }
    }
}

/// Prints everything the session produced for a fire-and-forget
/// command. The snapshot round-trip is a barrier: once it returns, the
/// session has applied every operation dispatched before it.
async fn drain_events(
    chat: &AssistantChat,
    event_rx: &mut mpsc::UnboundedReceiver<ChatEvent>,
) {
    let _ = chat.snapshot().await;
    while let Ok(event) = event_rx.try_recv() {
        match event {
            ChatEvent::Message(message) => print_assistant_message(&message),
            ChatEvent::Rated(id, _) => {
                println!("Noted, thanks for the feedback on reply {id}.");
            }
            ChatEvent::Idle => {}
        }
    }
}

fn print_assistant_message(message: &Message) {
    if message.role != Role::Assistant {
        return;
    }
    println!(
        "{}🎓 [{}] {}",
        BAR_CHAR.bright_cyan(),
        message.id,
        message.content.bright_white()
    );
}

fn print_help() {
    println!("Commands: /quick [n] for a quick prompt, /rate <id> up|down,");
    println!("/new to start over, /quit to leave. Anything else is sent");
    println!("to the assistant as-is.");
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
