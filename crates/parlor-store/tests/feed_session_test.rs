use std::sync::Arc;
use std::time::Duration;

use parlor_feed::{Composer, ComposeError, FeedProjector, FeedSession, MessageStore, RowBody};
use parlor_media::MemoryBlobStore;
use parlor_store::{MemoryStore, SqliteStore};
use parlor_types::events::{StoreMutation, ViewUpdate};
use parlor_types::models::{ImageRef, MessageId, SenderProfile};
use tokio::sync::mpsc;

const COLLECTION: &str = "messages";

async fn wait_for_len(session: &FeedSession, len: usize) {
    for _ in 0..200 {
        if session.projector().read().await.feed().len() == len {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("feed never reached {} rows", len);
}

fn drain(rx: &mut mpsc::UnboundedReceiver<ViewUpdate>) -> Vec<ViewUpdate> {
    let mut out = Vec::new();
    while let Ok(update) = rx.try_recv() {
        out.push(update);
    }
    out
}

fn session_for(store: Arc<dyn MessageStore>, blobs: &MemoryBlobStore) -> (FeedSession, mpsc::UnboundedReceiver<ViewUpdate>, mpsc::UnboundedReceiver<parlor_feed::MediaUpdate>) {
    let (projector, view_rx) = FeedProjector::new(store, Arc::new(blobs.clone()));
    let (session, media_rx) = FeedSession::new(projector, COLLECTION);
    (session, view_rx, media_rx)
}

#[tokio::test]
async fn test_stop_start_rebuilds_without_duplicates() {
    let store = MemoryStore::new();
    let blobs = MemoryBlobStore::new("chat", "https://cdn.local");
    let sender = SenderProfile::new("u1", "ada", None);
    let composer = Composer::new(Arc::new(store.clone()), Arc::new(blobs.clone()), sender, COLLECTION);

    composer.send_text("first").await.unwrap();
    composer.send_text("second").await.unwrap();

    let (mut session, mut view_rx, _media_rx) = session_for(Arc::new(store.clone()), &blobs);
    session.start().await.unwrap();
    wait_for_len(&session, 2).await;
    assert_eq!(drain(&mut view_rx), vec![
            ViewUpdate::Inserted { index: 0, count: 1 },
            ViewUpdate::Inserted { index: 1, count: 2 },
        ]);

    session.stop().await;
    assert_eq!(drain(&mut view_rx), vec![ViewUpdate::Removed(1), ViewUpdate::Removed(0)]);

    // Written while the screen was hidden.
    composer.send_text("third").await.unwrap();

    session.start().await.unwrap();
    // Second start while running does nothing.
    session.start().await.unwrap();
    wait_for_len(&session, 3).await;

    let projector = session.projector();
    let projector = projector.read().await;
    let texts: Vec<Option<String>> = projector.feed().iter().map(|r| r.record.text.clone()).collect();
    assert_eq!(
        texts,
        vec![Some("first".into()), Some("second".into()), Some("third".into())]
    );
    assert_eq!(store.subscriber_count(COLLECTION).await, 1);
}

#[tokio::test]
async fn test_image_message_goes_from_placeholder_to_resolved_url() {
    let store = MemoryStore::new();
    let blobs = MemoryBlobStore::new("chat", "https://cdn.local");
    let sender = SenderProfile::new("u1", "ada", Some("https://avatars/ada".into()));
    let composer = Composer::new(Arc::new(store.clone()), Arc::new(blobs.clone()), sender, COLLECTION);

    let mut watch = store.subscribe(COLLECTION).await.unwrap();
    let (mut session, mut view_rx, mut media_rx) = session_for(Arc::new(store.clone()), &blobs);
    session.start().await.unwrap();

    let id = composer.send_image("cat.png", vec![7; 16]).await.unwrap();

    // Placeholder first, then the same key pointing at the upload.
    match watch.next().await {
        Some(StoreMutation::Added { record, .. }) => {
            assert_eq!(record.id, Some(id.clone()));
            assert!(record.image_ref.unwrap().is_loading());
        }
        other => panic!("unexpected {:?}", other),
    }
    let expected_ref = ImageRef::new(format!("gs://chat/u1/{}/cat.png", id));
    match watch.next().await {
        Some(StoreMutation::Changed { record }) => assert_eq!(record.image_ref, Some(expected_ref.clone())),
        other => panic!("unexpected {:?}", other),
    }

    assert_eq!(view_rx.recv().await, Some(ViewUpdate::Inserted { index: 0, count: 1 }));
    assert_eq!(view_rx.recv().await, Some(ViewUpdate::Updated(0)));

    let row = session.projector().read().await.row_view(0).unwrap();
    assert_eq!(row.body, RowBody::Image(expected_ref));

    assert!(session.request_media(&id).await.unwrap());
    let update = tokio::time::timeout(Duration::from_secs(1), media_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(update.id, id);
    assert_eq!(update.result, Ok(format!("https://cdn.local/u1/{}/cat.png", id)));
}

#[tokio::test]
async fn test_composer_rejects_blank_and_clamps_length() {
    let store = MemoryStore::new();
    let blobs = MemoryBlobStore::new("chat", "https://cdn.local");
    let mut composer = Composer::new(
        Arc::new(store.clone()),
        Arc::new(blobs),
        SenderProfile::anonymous(),
        COLLECTION,
    );
    composer.set_text_length_limit(5);

    assert_eq!(composer.send_text("   ").await, Err(ComposeError::EmptyMessage));

    composer.send_text("hello world").await.unwrap();
    let records = store.records(COLLECTION).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].text.as_deref(), Some("hello"));
    assert_eq!(records[0].sender_name, "anonymous");
}

#[tokio::test]
async fn test_removed_message_leaves_sqlite_backed_feed() {
    let store = SqliteStore::open_in_memory().unwrap();
    let blobs = MemoryBlobStore::new("chat", "https://cdn.local");
    let composer = Composer::new(
        Arc::new(store.clone()),
        Arc::new(blobs.clone()),
        SenderProfile::new("u1", "ada", None),
        COLLECTION,
    );

    let a = composer.send_text("one").await.unwrap();
    let b = composer.send_text("two").await.unwrap();

    let (mut session, mut view_rx, _media_rx) = session_for(Arc::new(store.clone()), &blobs);
    session.start().await.unwrap();
    wait_for_len(&session, 2).await;
    drain(&mut view_rx);

    store.remove(COLLECTION, &a).await.unwrap();
    assert_eq!(view_rx.recv().await, Some(ViewUpdate::Removed(0)));

    let projector = session.projector();
    let projector = projector.read().await;
    assert_eq!(projector.feed().ids(), vec![b.clone()]);
    assert_eq!(projector.feed().position(&b), Some(0));
    assert!(!projector.feed().contains(&MessageId::from(a.as_str())));
}
