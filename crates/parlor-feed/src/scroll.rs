/// Decide whether the list should jump to a freshly inserted row.
///
/// `item_count` is the number of rows after the insertion and `last_visible`
/// the index of the last fully visible row the view reports right now
/// (`None` when nothing is laid out yet). The viewer is only followed to the
/// bottom when they were already sitting there.
pub fn should_auto_scroll(inserted_index: usize, item_count: usize, last_visible: Option<usize>) -> bool {
    match last_visible {
        None => true,
        Some(last) => {
            inserted_index + 1 >= item_count && inserted_index > 0 && last == inserted_index - 1
        }
    }
}
