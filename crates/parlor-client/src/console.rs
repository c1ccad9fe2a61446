use tracing::{debug, warn};

use parlor_feed::{Avatar, FeedProjector, FeedSession, MediaUpdate, RowBody, RowView};
use parlor_types::events::ViewUpdate;

/// Tracks the part of the terminal "viewport" the auto-scroll policy needs.
#[derive(Debug, Default)]
pub struct Viewport {
    /// Last fully visible row, `None` before anything was drawn.
    pub last_visible: Option<usize>,
}

impl Viewport {
    /// Apply the auto-scroll decision for `update`. Returns whether the view
    /// jumped to the inserted row.
    pub fn follow(&mut self, update: ViewUpdate) -> bool {
        let follow = FeedProjector::should_auto_scroll(update, self.last_visible);
        if follow {
            self.last_visible = Some(update.index());
        }
        follow
    }

    /// Keep the tracked row inside a feed of `len` rows after a removal.
    pub fn clamp(&mut self, len: usize) {
        self.last_visible = match self.last_visible {
            Some(last) if last >= len => len.checked_sub(1),
            other => other,
        };
    }
}

pub fn format_row(index: usize, row: &RowView) -> String {
    let avatar = match &row.avatar {
        Avatar::Default => "(o)".to_string(),
        Avatar::Url(url) => format!("<{}>", url),
    };
    let body = match &row.body {
        RowBody::Text(text) => text.clone(),
        RowBody::Image(reference) if reference.is_loading() => "[uploading image]".to_string(),
        RowBody::Image(reference) => format!("[image {}]", reference),
        RowBody::Placeholder => "[...]".to_string(),
    };
    format!("[{}] {} {}: {}", index, avatar, row.sender_name, body)
}

/// Print the affected row and kick off image resolution where needed.
pub async fn render_update(session: &FeedSession, update: ViewUpdate, viewport: &mut Viewport) {
    let projector = session.projector();
    let (row, len) = {
        let projector = projector.read().await;
        (projector.row_view(update.index()), projector.feed().len())
    };

    if viewport.follow(update) {
        debug!("Scrolled to {}", update.index());
    }

    match update {
        ViewUpdate::Inserted { index, .. } | ViewUpdate::Updated(index) => {
            let Some(row) = row else {
                // Row already gone again; a later notification covers it.
                return;
            };
            println!("{}", format_row(index, &row));

            if let (Some(id), Some(_)) = (row.id.as_ref(), row.image()) {
                if let Err(e) = session.request_media(id).await {
                    warn!("Could not request image for {}: {}", id, e);
                }
            }
        }
        ViewUpdate::Removed(index) => {
            println!("[{}] (removed)", index);
            viewport.clamp(len);
        }
    }
}

pub fn render_media(update: &MediaUpdate) {
    match &update.result {
        Ok(url) => println!("[{}] image ready: {}", update.index, url),
        Err(e) => println!("[{}] image unavailable: {}", update.index, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_types::models::{ImageRef, MessageRecord};

    #[test]
    fn viewport_follows_tail_inserts_in_a_burst() {
        let mut viewport = Viewport::default();
        assert!(viewport.follow(ViewUpdate::Inserted { index: 0, count: 1 }));
        // Both arrive after the feed already grew to three rows.
        assert!(viewport.follow(ViewUpdate::Inserted { index: 1, count: 2 }));
        assert!(viewport.follow(ViewUpdate::Inserted { index: 2, count: 3 }));
        assert_eq!(viewport.last_visible, Some(2));

        assert!(!viewport.follow(ViewUpdate::Inserted { index: 0, count: 4 }));
        assert!(!viewport.follow(ViewUpdate::Updated(2)));

        viewport.clamp(1);
        assert_eq!(viewport.last_visible, Some(0));
        viewport.clamp(0);
        assert_eq!(viewport.last_visible, None);
    }

    #[test]
    fn formats_each_row_kind() {
        let mut record = MessageRecord {
            sender_name: "ada".into(),
            text: Some("hi".into()),
            ..Default::default()
        };
        assert_eq!(format_row(0, &RowView::from(&record)), "[0] (o) ada: hi");

        record.text = None;
        record.image_ref = Some(ImageRef::loading());
        record.sender_photo_ref = Some("https://a/p.png".into());
        assert_eq!(
            format_row(1, &RowView::from(&record)),
            "[1] <https://a/p.png> ada: [uploading image]"
        );

        record.image_ref = Some(ImageRef::new("gs://b/x.png"));
        assert_eq!(
            format_row(2, &RowView::from(&record)),
            "[2] <https://a/p.png> ada: [image gs://b/x.png]"
        );

        record.image_ref = None;
        assert_eq!(format_row(3, &RowView::from(&record)), "[3] <https://a/p.png> ada: [...]");
    }
}
