//! Like and bookmark toggles kept on the client only.

use std::collections::HashSet;

use uuid::Uuid;

/// Per-post like/bookmark state for one client session.
///
/// Nothing here is sent to the server; the state is gone once the value is
/// dropped.
#[derive(Debug, Clone, Default)]
pub struct PostInteractions {
    liked: HashSet<Uuid>,
    bookmarked: HashSet<Uuid>,
}

impl PostInteractions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the like on `post_id` and return the new state.
    pub fn toggle_like(&mut self, post_id: Uuid) -> bool {
        toggle(&mut self.liked, post_id)
    }

    /// Flip the bookmark on `post_id` and return the new state.
    pub fn toggle_bookmark(&mut self, post_id: Uuid) -> bool {
        toggle(&mut self.bookmarked, post_id)
    }

    pub fn is_liked(&self, post_id: Uuid) -> bool {
        self.liked.contains(&post_id)
    }

    pub fn is_bookmarked(&self, post_id: Uuid) -> bool {
        self.bookmarked.contains(&post_id)
    }

    /// Like count to display: the server's count plus this client's like.
    pub fn displayed_likes(&self, post_id: Uuid, server_likes: i32) -> i32 {
        server_likes + i32::from(self.is_liked(post_id))
    }
}

fn toggle(set: &mut HashSet<Uuid>, id: Uuid) -> bool {
    if set.remove(&id) {
        false
    } else {
        set.insert(id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggles_are_independent() {
        let mut state = PostInteractions::new();
        let post = Uuid::new_v4();

        assert!(state.toggle_like(post));
        assert!(state.is_liked(post));
        assert!(!state.is_bookmarked(post));
        assert_eq!(state.displayed_likes(post, 4), 5);

        assert!(!state.toggle_like(post));
        assert_eq!(state.displayed_likes(post, 4), 4);

        assert!(state.toggle_bookmark(post));
        assert!(state.is_bookmarked(post));
    }

    #[test]
    fn test_fresh_state_is_empty() {
        let state = PostInteractions::default();
        assert!(!state.is_liked(Uuid::nil()));
    }
}
