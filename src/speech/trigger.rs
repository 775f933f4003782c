use super::text::{collapse_whitespace, direct_text};
use std::time::Duration;
use tokio::time::Instant;

/// A request to read some text aloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    pub text: String,
    pub language: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Idle,
    Pressed { since: Instant },
}

/// Long-press filter for press-to-speak.
///
/// A press followed by a release at least `min_delay` later produces a
/// [`SpeechRequest`]; shorter presses are ordinary clicks. Leaving the
/// target before releasing cancels the gesture.
#[derive(Debug, Clone)]
pub struct SpeechTrigger {
    min_delay: Duration,
    language: String,
    state: GestureState,
}

impl SpeechTrigger {
    pub fn new(min_delay: Duration, language: impl Into<String>) -> Self {
        Self {
            min_delay,
            language: language.into(),
            state: GestureState::Idle,
        }
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_pressed(&self) -> bool {
        matches!(self.state, GestureState::Pressed { .. })
    }

    /// Pointer went down over the target. A second press restarts the timer.
    pub fn press(&mut self, now: Instant) {
        self.state = GestureState::Pressed { since: now };
    }

    /// Pointer left the target; any pending gesture is dropped.
    pub fn leave(&mut self) {
        if self.is_pressed() {
            tracing::trace!("Speech gesture cancelled");
        }
        self.state = GestureState::Idle;
    }

    /// Pointer released over the target whose content is `inner_html`.
    ///
    /// Returns the text to speak when the press lasted long enough and the
    /// target has text of its own.
    pub fn release(&mut self, now: Instant, inner_html: &str) -> Option<SpeechRequest> {
        if !self.held_long_enough(now) {
            return None;
        }
        self.request(direct_text(inner_html))
    }

    /// Like [`release`](Self::release) for a target holding plain text with
    /// no markup, such as a terminal row. The text is spoken as shown.
    pub fn release_text(&mut self, now: Instant, text: &str) -> Option<SpeechRequest> {
        if !self.held_long_enough(now) {
            return None;
        }
        self.request(collapse_whitespace(text))
    }

    /// End the gesture and report whether it was a long press.
    fn held_long_enough(&mut self, now: Instant) -> bool {
        let state = std::mem::replace(&mut self.state, GestureState::Idle);
        let GestureState::Pressed { since } = state else {
            return false;
        };

        let held = now.saturating_duration_since(since);
        if held < self.min_delay {
            tracing::trace!(held_ms = held.as_millis() as u64, "Short click, not speaking");
            return false;
        }
        true
    }

    fn request(&self, text: String) -> Option<SpeechRequest> {
        if text.is_empty() {
            tracing::debug!("Long press on target without own text");
            return None;
        }
        Some(SpeechRequest {
            text,
            language: self.language.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DELAY: Duration = Duration::from_millis(500);
    const TARGET: &str = "Hallo <span class=\"translation\">hello</span> Welt";

    fn trigger() -> SpeechTrigger {
        SpeechTrigger::new(DELAY, "de")
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_short_click_is_ignored() {
        let mut trigger = trigger();
        let t0 = Instant::now();
        trigger.press(t0);

        assert_eq!(trigger.release(t0 + DELAY - ms(1), TARGET), None);
        assert!(!trigger.is_pressed());
    }

    #[test]
    fn test_long_press_speaks_direct_text() {
        let mut trigger = trigger();
        let t0 = Instant::now();
        trigger.press(t0);

        let request = trigger.release(t0 + DELAY + ms(1), TARGET);
        assert_eq!(
            request,
            Some(SpeechRequest {
                text: "Hallo Welt".to_string(),
                language: "de".to_string(),
            })
        );
    }

    #[test]
    fn test_release_exactly_at_delay_speaks() {
        let mut trigger = trigger();
        let t0 = Instant::now();
        trigger.press(t0);
        assert!(trigger.release(t0 + DELAY, TARGET).is_some());
    }

    #[test]
    fn test_leave_cancels_gesture() {
        let mut trigger = trigger();
        let t0 = Instant::now();
        trigger.press(t0);
        trigger.leave();

        assert_eq!(trigger.release(t0 + DELAY / 2, TARGET), None);
        assert_eq!(trigger.release(t0 + DELAY * 4, TARGET), None);
    }

    #[test]
    fn test_leave_then_long_wait_still_cancelled() {
        let mut trigger = trigger();
        let t0 = Instant::now();
        trigger.press(t0);
        trigger.leave();
        assert_eq!(trigger.release(t0 + DELAY * 10, TARGET), None);
    }

    #[test]
    fn test_release_without_press_is_ignored() {
        let mut trigger = trigger();
        assert_eq!(trigger.release(Instant::now() + DELAY * 2, TARGET), None);
    }

    #[test]
    fn test_second_press_restarts_timer() {
        let mut trigger = trigger();
        let t0 = Instant::now();
        trigger.press(t0);
        trigger.press(t0 + ms(400));

        assert_eq!(trigger.release(t0 + ms(600), TARGET), None);
    }

    #[test]
    fn test_gesture_is_single_use() {
        let mut trigger = trigger();
        let t0 = Instant::now();
        trigger.press(t0);
        assert!(trigger.release(t0 + DELAY, TARGET).is_some());
        assert_eq!(trigger.release(t0 + DELAY * 2, TARGET), None);
    }

    #[test]
    fn test_target_without_own_text_is_silent() {
        let mut trigger = trigger();
        let t0 = Instant::now();
        trigger.press(t0);
        assert_eq!(trigger.release(t0 + DELAY, "<span>inner</span>"), None);
    }

    #[test]
    fn test_plain_text_release_keeps_angle_brackets() {
        let mut trigger = trigger();
        let t0 = Instant::now();
        trigger.press(t0);

        let request = trigger.release_text(t0 + DELAY, "Inflation a<b erwartet");
        assert_eq!(request.map(|r| r.text).as_deref(), Some("Inflation a<b erwartet"));
    }

    #[test]
    fn test_plain_text_release_respects_delay() {
        let mut trigger = trigger();
        let t0 = Instant::now();
        trigger.press(t0);
        assert_eq!(trigger.release_text(t0 + DELAY - ms(1), "Kurz"), None);
        assert!(!trigger.is_pressed());
    }
}
