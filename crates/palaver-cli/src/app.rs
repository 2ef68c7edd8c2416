use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use palaver_core::constants::EMPTY_PREVIEW_TEXT;
use palaver_core::events::{ClientCommand, ServerEvent};
use palaver_core::models::{Message, SenderKind, UserIdentity};
use palaver_core::store::SyncEngine;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::session::SessionStorage;
use crate::transport::{SocketClient, TransportEvent};

pub struct AppConfig {
    pub socket_path: PathBuf,
    pub data_dir: PathBuf,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
}

/// Interactive client loop: one task, cooperative, no shared state. All
/// engine mutation happens here, one transport event or input line at a
/// time.
pub async fn run(config: AppConfig) -> Result<()> {
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("failed to create data dir {:?}", config.data_dir))?;
    let mut session = SessionStorage::new(&config.data_dir);

    let user = resolve_identity(&mut session, config.display_name, config.avatar)?;
    info!("Running as {} ({})", user.display_name, user.id);

    let mut engine = SyncEngine::new(user);
    // Re-selected once the first snapshot confirms the chat still exists.
    let mut pending_restore = session.last_chat_id().map(str::to_string);

    let (event_tx, mut event_rx) = mpsc::channel(256);
    let (command_tx, command_rx) = mpsc::channel(256);
    tokio::spawn(SocketClient::with_path(config.socket_path).run(event_tx, command_rx));

    let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();
    println!("palaver — /help for commands");

    loop {
        tokio::select! {
            transport_event = event_rx.recv() => {
                let Some(transport_event) = transport_event else { break };
                on_transport_event(&mut engine, &mut pending_restore, transport_event);
                flush_commands(&mut engine, &command_tx).await;
            }
            line = stdin_lines.next_line() => {
                let Some(line) = line? else { break };
                if !on_input(&mut engine, &mut session, line.trim()) {
                    break;
                }
                flush_commands(&mut engine, &command_tx).await;
            }
        }
    }

    Ok(())
}

fn resolve_identity(
    session: &mut SessionStorage,
    display_name: Option<String>,
    avatar: Option<String>,
) -> Result<UserIdentity> {
    let mut user = match (session.user().cloned(), display_name) {
        (Some(user), None) => user,
        (Some(mut user), Some(name)) => {
            user.display_name = name;
            user
        }
        (None, Some(name)) => UserIdentity::new(name),
        (None, None) => anyhow::bail!("no saved identity; pass --name to create one"),
    };
    if let Some(avatar) = avatar {
        user.avatar = Some(avatar);
    }
    session.set_user(user.clone());
    Ok(user)
}

async fn flush_commands(engine: &mut SyncEngine, command_tx: &mpsc::Sender<ClientCommand>) {
    for command in engine.drain_commands() {
        if command_tx.send(command).await.is_err() {
            warn!("transport task is gone; dropping outbound command");
            return;
        }
    }
}

fn on_transport_event(
    engine: &mut SyncEngine,
    pending_restore: &mut Option<String>,
    transport_event: TransportEvent,
) {
    match transport_event {
        TransportEvent::Connected => {
            println!("* connected");
            engine.on_connected();
        }
        TransportEvent::Disconnected => {
            println!("* connection lost, retrying...");
        }
        TransportEvent::Event(event) => {
            let is_snapshot = matches!(event, ServerEvent::DirectorySnapshot { .. });
            let is_history = matches!(event, ServerEvent::HistoryResponse { .. });
            if let ServerEvent::ServerError { reason } = &event {
                println!("! server error: {reason}");
            }

            let update = engine.handle_event(event);

            if is_snapshot {
                restore_saved_chat(engine, pending_restore);
            }
            if is_history && update.active_chat_messages_changed {
                print_active_chat(engine);
            }
            if let Some(message) = update.new_message {
                print_incoming(engine, &message);
            }
        }
    }
}

/// Pre-select the chat that was open last session, if the refreshed
/// directory still contains it.
fn restore_saved_chat(engine: &mut SyncEngine, pending_restore: &mut Option<String>) {
    let Some(chat_id) = pending_restore.take() else {
        return;
    };
    if !engine.directory().contains(&chat_id) {
        info!(%chat_id, "saved chat no longer exists; skipping restore");
        return;
    }
    let name = engine
        .directory()
        .get(&chat_id)
        .map(|c| c.display_name.clone())
        .unwrap_or_default();
    if engine.select_chat(Some(&chat_id)).is_ok() {
        println!("* reopening {name}");
    }
}

fn on_input(engine: &mut SyncEngine, session: &mut SessionStorage, line: &str) -> bool {
    if line.is_empty() {
        return true;
    }

    let Some(rest) = line.strip_prefix('/') else {
        match engine.send_message(line) {
            Ok(update) => {
                if let Some(message) = update.new_message {
                    print_message(engine, &message);
                }
            }
            Err(e) => println!("! {e}"),
        }
        return true;
    };

    let (command, args) = match rest.split_once(' ') {
        Some((command, args)) => (command, args.trim()),
        None => (rest, ""),
    };

    match command {
        "help" => print_help(),
        "quit" | "q" => return false,
        "chats" => print_directory(engine, args),
        "select" => select_chat(engine, session, args),
        "close" => {
            if engine.select_chat(None).is_ok() {
                session.set_last_chat_id(None);
                println!("* chat closed");
            }
        }
        "new" => {
            if let Err(e) = engine.create_chat(args, None) {
                println!("! {e}");
            }
        }
        "rename" => {
            if let Err(e) = engine.update_active_chat_settings(args, None) {
                println!("! {e}");
            }
        }
        "nick" => {
            if args.is_empty() {
                println!("! usage: /nick <name>");
            } else {
                let mut user = engine.user().clone();
                user.display_name = args.to_string();
                session.set_user(user.clone());
                engine.set_user(user);
                println!("* you are now {args}");
            }
        }
        "refresh" => engine.request_directory(),
        other => println!("! unknown command: /{other}"),
    }
    true
}

fn select_chat(engine: &mut SyncEngine, session: &mut SessionStorage, args: &str) {
    if args.is_empty() {
        println!("! usage: /select <number|chat id>");
        return;
    }

    // A small number selects by position in the directory listing.
    let chat_id = match args.parse::<usize>() {
        Ok(n) if n >= 1 => engine.directory().iter().nth(n - 1).map(|c| c.id.clone()),
        _ => Some(args.to_string()),
    };
    let Some(chat_id) = chat_id else {
        println!("! no chat at position {args}");
        return;
    };

    match engine.select_chat(Some(&chat_id)) {
        Ok(_) => {
            session.set_last_chat_id(Some(&chat_id));
            if let Some(chat) = engine.directory().get(&chat_id) {
                println!("* opening {}...", chat.display_name);
            }
        }
        Err(e) => println!("! {e}"),
    }
}

fn print_help() {
    println!("  /chats [query]     list chats (query: substring, + for AND)");
    println!("  /select <n|id>     open a chat");
    println!("  /close             close the active chat");
    println!("  /new <name>        create a chat");
    println!("  /rename <name>     rename the active chat");
    println!("  /nick <name>       change display name");
    println!("  /refresh           re-request the chat directory");
    println!("  /quit              exit");
    println!("  anything else is sent to the active chat");
}

fn print_directory(engine: &SyncEngine, query: &str) {
    let matches: HashSet<&str> = engine.directory().filter(query).map(|c| c.id.as_str()).collect();
    let active_id = engine.view().active_chat.map(|c| c.id.clone());

    let mut shown = 0;
    for (index, chat) in engine.directory().iter().enumerate() {
        if !matches.contains(chat.id.as_str()) {
            continue;
        }
        let marker = if active_id.as_deref() == Some(chat.id.as_str()) {
            "*"
        } else {
            " "
        };
        let preview = chat
            .last_message_preview
            .as_deref()
            .unwrap_or(EMPTY_PREVIEW_TEXT);
        let time = chat
            .last_message_at
            .map(format_timestamp)
            .unwrap_or_default();
        println!("{marker} {:>3}. {:<24} {:<36} {}", index + 1, chat.display_name, preview, time);
        shown += 1;
    }
    if shown == 0 {
        println!("  (no chats)");
    }
}

fn print_active_chat(engine: &SyncEngine) {
    let view = engine.view();
    let Some(chat) = view.active_chat else {
        return;
    };
    println!("--- {} ---", chat.display_name);
    if view.messages.is_empty() {
        println!("  (no messages)");
        return;
    }
    for message in view.messages {
        print_message(engine, message);
    }
}

fn print_message(engine: &SyncEngine, message: &Message) {
    let name = sender_name(engine, message);
    let suffix = if message.streaming { " …" } else { "" };
    println!(
        "[{}] {}: {}{}",
        format_timestamp(message.created_at),
        name,
        message.content,
        suffix
    );
}

/// A confirmed message for a chat that is not on screen shows up as a
/// one-line notification instead.
fn print_incoming(engine: &SyncEngine, message: &Message) {
    let active = engine
        .view()
        .active_chat
        .is_some_and(|c| c.id == message.chat_id);
    if active {
        // Our own optimistic copy was already printed at send time.
        if message.sender_id != engine.user().id {
            print_message(engine, message);
        }
    } else if let Some(chat) = engine.directory().get(&message.chat_id) {
        println!("* [{}] {}", chat.display_name, message.preview());
    }
}

fn sender_name(engine: &SyncEngine, message: &Message) -> String {
    if message.sender_id == engine.user().id {
        return engine.user().display_name.clone();
    }
    match message.sender {
        SenderKind::Ai => "assistant".to_string(),
        SenderKind::User => {
            let mut short = message.sender_id.clone();
            short.truncate(8);
            short
        }
    }
}

fn format_timestamp(ts: u64) -> String {
    match chrono::DateTime::from_timestamp(ts as i64, 0) {
        Some(utc) => utc
            .with_timezone(&chrono::Local)
            .format("%d.%m %H:%M")
            .to_string(),
        None => String::new(),
    }
}
