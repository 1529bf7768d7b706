mod config;

use anyhow::Result;
use clap::Parser;
use client_core::{ChatClient, ChatClientOptions, ChatHandle, ClientEvent, LiveChannelOptions};
use shared::domain::Orientation;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    api_base: Option<String>,
    #[arg(long)]
    ws_base: Option<String>,
    #[arg(long)]
    allowed_host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut settings = config::load_settings();
    if let Some(api_base) = args.api_base {
        settings.api_base = api_base;
    }
    if let Some(ws_base) = args.ws_base {
        settings.ws_base = ws_base;
    }
    if let Some(allowed_host) = args.allowed_host {
        settings.allowed_host = Some(allowed_host);
    }
    config::validate_settings(&settings)?;

    let client = ChatClient::start(ChatClientOptions {
        api_base: settings.api_base,
        ws_base: settings.ws_base,
        live: LiveChannelOptions::default(),
    })?;
    println!("chatting as {} (type a message, /quit to leave)", client.identity());

    let identity = client.identity().clone();
    let mut events = client.subscribe_events();
    tokio::spawn(async move {
        // Snapshots are append-only, so printing the tail past the last
        // printed index renders each message exactly once.
        let mut printed = 0usize;
        loop {
            match events.recv().await {
                Ok(ClientEvent::TimelineUpdated(timeline)) => {
                    for message in &timeline[printed.min(timeline.len())..] {
                        let marker = match message.orientation(&identity) {
                            Orientation::Own => '>',
                            Orientation::Other => '<',
                        };
                        println!("{marker} {}: {}", message.sender, message.text);
                    }
                    printed = timeline.len();
                }
                Ok(ClientEvent::LiveStatusChanged(status)) => {
                    println!("[live: {status:?}]");
                }
                Ok(ClientEvent::Fault(fault)) => {
                    eprintln!("[fault] {fault}");
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "/quit" {
            break;
        }
        if let Err(err) = client.send_message(&line).await {
            eprintln!("send failed: {err}");
        }
    }

    client.shutdown().await;
    Ok(())
}
