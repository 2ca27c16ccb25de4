//! Status message box for the pathway tab.
//!
//! Three states: the default welcome text, a loading notice while non-query
//! genes are being fetched, or a custom message supplied by the diagram
//! collaborator. Dismissal is delayed by a fixed two seconds so the toast
//! can animate out; a message set during that window cancels the pending
//! clear.

use std::time::{Duration, Instant};

pub const WELCOME_MESSAGE: &str =
    "Select a pathway from the table to overlay alteration frequencies.";
pub const LOADING_MESSAGE: &str = "Loading alteration data for pathway genes...";
pub const DISMISS_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageState {
    Default,
    Loading,
    Custom(String),
}

#[derive(Debug)]
pub struct MessageBox {
    state: MessageState,
    clear_at: Option<Instant>,
}

impl Default for MessageBox {
    fn default() -> Self {
        Self {
            state: MessageState::Default,
            clear_at: None,
        }
    }
}

impl MessageBox {
    pub fn state(&self) -> &MessageState {
        &self.state
    }

    pub fn text(&self) -> &str {
        match &self.state {
            MessageState::Default => WELCOME_MESSAGE,
            MessageState::Loading => LOADING_MESSAGE,
            MessageState::Custom(text) => text,
        }
    }

    pub fn is_default(&self) -> bool {
        self.state == MessageState::Default
    }

    pub fn set_loading(&mut self) {
        self.state = MessageState::Loading;
        self.clear_at = None;
    }

    /// External show-message hook; overrides any state and any pending clear.
    pub fn show(&mut self, text: &str) {
        self.state = MessageState::Custom(text.to_string());
        self.clear_at = None;
    }

    /// Immediate return to the default text, e.g. when the tab is left.
    pub fn reset(&mut self) {
        self.state = MessageState::Default;
        self.clear_at = None;
    }

    /// Schedule a clear after the fixed delay. The displayed text stays put
    /// until the delay elapses.
    pub fn dismiss(&mut self, now: Instant) {
        if self.state != MessageState::Default {
            self.clear_at = Some(now + DISMISS_DELAY);
        }
    }

    /// Apply a pending clear once its time has come.
    pub fn tick(&mut self, now: Instant) {
        if let Some(clear_at) = self.clear_at {
            if now >= clear_at {
                self.reset();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_default() {
        let message = MessageBox::default();
        assert!(message.is_default());
        assert_eq!(message.text(), WELCOME_MESSAGE);
    }

    #[test]
    fn test_custom_replaces_loading_immediately() {
        let mut message = MessageBox::default();
        message.set_loading();
        assert_eq!(message.text(), LOADING_MESSAGE);
        message.show("3 genes could not be matched");
        assert_eq!(message.text(), "3 genes could not be matched");
    }

    #[test]
    fn test_dismiss_clears_after_exact_delay() {
        let mut message = MessageBox::default();
        message.show("warning");
        let now = Instant::now();
        message.dismiss(now);

        message.tick(now + DISMISS_DELAY - Duration::from_millis(1));
        assert_eq!(message.text(), "warning");

        message.tick(now + DISMISS_DELAY);
        assert!(message.is_default());
    }

    #[test]
    fn test_new_message_cancels_pending_clear() {
        let mut message = MessageBox::default();
        message.show("first");
        let now = Instant::now();
        message.dismiss(now);

        message.show("second");
        message.tick(now + DISMISS_DELAY * 2);
        // The newer text survives the old clear deadline.
        assert_eq!(message.text(), "second");
    }

    #[test]
    fn test_dismiss_in_default_is_a_no_op() {
        let mut message = MessageBox::default();
        let now = Instant::now();
        message.dismiss(now);
        message.tick(now + DISMISS_DELAY);
        assert!(message.is_default());
    }

    #[test]
    fn test_loading_dismiss_then_tick() {
        let mut message = MessageBox::default();
        message.set_loading();
        let now = Instant::now();
        message.dismiss(now);
        message.tick(now + DISMISS_DELAY);
        assert!(message.is_default());
    }
}
