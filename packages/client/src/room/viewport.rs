//! Line-based scroll model of the message list.

use std::ops::Range;

/// Scroll position over the rendered transcript, in lines.
///
/// `scroll_height` is never smaller than `client_height`, so an empty or
/// short transcript is at its bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    scroll_top: usize,
    client_height: usize,
    content_height: usize,
}

impl Viewport {
    pub fn new(client_height: usize) -> Self {
        Self {
            scroll_top: 0,
            client_height: client_height.max(1),
            content_height: 0,
        }
    }

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub fn client_height(&self) -> usize {
        self.client_height
    }

    pub fn content_height(&self) -> usize {
        self.content_height
    }

    pub fn scroll_height(&self) -> usize {
        self.content_height.max(self.client_height)
    }

    pub fn max_scroll_top(&self) -> usize {
        self.scroll_height() - self.client_height
    }

    /// Exactly at the bottom; one line above does not count.
    pub fn is_scrolled_to_bottom(&self) -> bool {
        self.scroll_height() - self.scroll_top == self.client_height
    }

    /// Content grew by `lines`; the scroll position is not touched.
    pub fn grow(&mut self, lines: usize) {
        self.content_height += lines;
    }

    pub fn set_content_height(&mut self, lines: usize) {
        self.content_height = lines;
        self.scroll_top = self.scroll_top.min(self.max_scroll_top());
    }

    pub fn scroll_to(&mut self, top: usize) {
        self.scroll_top = top.min(self.max_scroll_top());
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_to(self.scroll_top.saturating_sub(lines));
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_to(self.scroll_top.saturating_add(lines));
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_top = self.max_scroll_top();
    }

    /// Transcript lines currently in view.
    pub fn visible_range(&self) -> Range<usize> {
        let end = (self.scroll_top + self.client_height).min(self.content_height);
        self.scroll_top.min(end)..end
    }
}
