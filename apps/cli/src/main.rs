use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::{
    pages::{InfantsPage, LingTestPage, ReportPage},
    spawn_event_stream, ClientEvent, GeneratedAudioCache, Notifier, PageContext, SelectionStore,
    TrackerClient,
};
use shared::domain::InfantId;
use tokio::sync::broadcast::{self, error::TryRecvError};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8443")]
    server_url: String,
    #[arg(long)]
    username: String,
    #[arg(long, default_value = "./data/selected_infant.json")]
    selection_file: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Report,
    Infants,
    AddInfant { name: String },
    Select { infant_id: i64 },
    /// Generates a clip for one Ling or environmental sound.
    GenerateAudio { sound_id: String },
    /// Prints server events until the connection closes.
    Watch,
}

fn print_notices(rx: &mut broadcast::Receiver<ClientEvent>) {
    loop {
        match rx.try_recv() {
            Ok(ClientEvent::Notice {
                title, description, ..
            }) => println!("[{title}] {description}"),
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let client = Arc::new(TrackerClient::new(args.server_url));
    let session = client.login(&args.username).await?;
    println!("Logged in as owner_id={}", session.owner_id.0);

    let notifier = Notifier::new();
    let mut notices = notifier.subscribe();
    let ctx = PageContext::new(client.clone(), notifier.clone());

    match args.command {
        Command::Report => {
            let mut page = ReportPage::new(ctx);
            page.load().await;
            for section in page.sections() {
                println!("== {} ==", section.title);
                for line in section.lines {
                    println!("{line}");
                }
            }
        }
        Command::Infants => {
            let mut page = InfantsPage::new(ctx, SelectionStore::new(&args.selection_file));
            page.load().await;
            let selected = page.selected().map(|s| s.id);
            for infant in page.infants() {
                let marker = if Some(infant.id) == selected { "*" } else { " " };
                println!("{marker} {}\t{}", infant.id.0, infant.name);
            }
        }
        Command::AddInfant { name } => {
            let mut page = InfantsPage::new(ctx, SelectionStore::new(&args.selection_file));
            let _ = page.add(&name).await;
        }
        Command::Select { infant_id } => {
            let mut page = InfantsPage::new(ctx, SelectionStore::new(&args.selection_file));
            page.load().await;
            let selected = page.select(InfantId(infant_id))?;
            println!("Selected {} ({})", selected.name, selected.id.0);
        }
        Command::GenerateAudio { sound_id } => {
            let mut page = LingTestPage::new(ctx, None, Arc::new(GeneratedAudioCache::new()));
            if page.generate_clip(&sound_id, None).await.is_ok() {
                if let Some(tile) = page.tiles().iter().find(|tile| tile.id() == sound_id) {
                    println!("{} bytes of media for {}", tile.source().len(), tile.label());
                }
            }
        }
        Command::Watch => {
            let mut events = notifier.subscribe();
            let handle = spawn_event_stream(&client, notifier.clone()).await?;
            tokio::select! {
                _ = handle => {}
                _ = async {
                    while let Ok(event) = events.recv().await {
                        match event {
                            ClientEvent::Server(event) => println!("event: {event:?}"),
                            ClientEvent::Error(message) => eprintln!("error: {message}"),
                            ClientEvent::Notice { .. } => {}
                        }
                    }
                } => {}
            }
        }
    }

    print_notices(&mut notices);
    Ok(())
}
