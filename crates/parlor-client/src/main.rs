mod console;
mod settings;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use parlor_config::{ConfigSettings, ConfigSource, ConfigValues, HttpConfigSource, RemoteConfig, StaticConfigSource};
use parlor_feed::{BlobStorage, Composer, FeedProjector, FeedSession, MediaResolver, MessageStore};
use parlor_media::{HttpMediaResolver, MemoryBlobStore};
use parlor_store::{MemoryStore, SqliteStore};
use parlor_types::models::SenderProfile;

use crate::console::Viewport;
use crate::settings::Settings;

enum Command {
    Continue,
    Quit,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parlor=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from_env()?;

    // Message store
    let store: Arc<dyn MessageStore> = match &settings.db_path {
        Some(path) => {
            info!("Using sqlite store at {}", path.display());
            Arc::new(SqliteStore::open(path)?)
        }
        None => {
            info!("Using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    // Blob storage, and the resolver for stored references
    let blobs = MemoryBlobStore::new(&settings.blob_bucket, &settings.blob_base_url);
    let resolver: Arc<dyn MediaResolver> = match &settings.media_endpoint {
        Some(endpoint) => Arc::new(HttpMediaResolver::new(endpoint.as_str())),
        None => Arc::new(blobs.clone()),
    };
    let blobs: Arc<dyn BlobStorage> = Arc::new(blobs);

    // Remote config
    let source: Arc<dyn ConfigSource> = match &settings.config_url {
        Some(url) => Arc::new(HttpConfigSource::new(url.as_str())),
        None => Arc::new(StaticConfigSource::new(ConfigValues::new())),
    };
    let mut remote = RemoteConfig::new(
        source,
        ConfigSettings {
            developer_mode: settings.developer_mode,
            ..Default::default()
        },
    );
    let limit = remote.fetch_and_activate().await;

    let sender = match &settings.username {
        Some(name) => SenderProfile::new(
            SenderProfile::anonymous().uid,
            name.as_str(),
            settings.photo_url.clone(),
        ),
        None => SenderProfile::anonymous(),
    };
    info!("Signed in as {} ({})", sender.name, sender.uid);

    let mut composer = Composer::new(store.clone(), blobs, sender, settings.collection.as_str());
    composer.set_text_length_limit(limit);

    let (mut projector, mut view_rx) = FeedProjector::new(store.clone(), resolver);
    projector.set_text_length_limit(limit);

    let (mut session, mut media_rx) = FeedSession::new(projector, settings.collection.as_str());
    session.start().await?;

    println!("Type a message, /image <path>, /delete <index>, /pause, /resume or /quit");

    let mut viewport = Viewport::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match handle_line(&line, &mut session, &composer, store.as_ref(), &settings.collection).await {
                    Ok(Command::Continue) => {}
                    Ok(Command::Quit) => break,
                    Err(e) => warn!("{:#}", e),
                }
            }
            Some(update) = view_rx.recv() => {
                console::render_update(&session, update, &mut viewport).await;
            }
            Some(update) = media_rx.recv() => {
                console::render_media(&update);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.stop().await;
    info!("Bye");
    Ok(())
}

async fn handle_line(
    line: &str,
    session: &mut FeedSession,
    composer: &Composer,
    store: &dyn MessageStore,
    collection: &str,
) -> anyhow::Result<Command> {
    let line = line.trim_end();

    if let Some(path) = line.strip_prefix("/image ") {
        let path = Path::new(path.trim());
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .context("image path has no file name")?;
        let id = composer.send_image(file_name, bytes).await?;
        info!("Sent image {}", id);
        return Ok(Command::Continue);
    }

    if let Some(index) = line.strip_prefix("/delete ") {
        let index: usize = index.trim().parse().context("expected a row index")?;
        let id = {
            let projector = session.projector();
            let projector = projector.read().await;
            projector.feed().get(index).and_then(|row| row.id().cloned())
        };
        let id = id.with_context(|| format!("no row {}", index))?;
        store.remove(collection, &id).await?;
        return Ok(Command::Continue);
    }

    match line {
        "/quit" => Ok(Command::Quit),
        "/pause" => {
            session.stop().await;
            info!("Listener paused");
            Ok(Command::Continue)
        }
        "/resume" => {
            session.start().await?;
            info!("Listener resumed");
            Ok(Command::Continue)
        }
        text => {
            if !Composer::can_send(text) {
                return Ok(Command::Continue);
            }
            let text = composer.clamp(text);
            let id = composer.send_text(&text).await?;
            info!("Sent {}", id);
            Ok(Command::Continue)
        }
    }
}
