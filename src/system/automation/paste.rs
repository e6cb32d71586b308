//! Paste injection into the previously focused application
//!
//! The selector window belongs to this process, so showing it steals focus.
//! To paste, the text is written to the pasteboard, the host app gives up
//! focus, and after a settle delay a Cmd+V chord is posted into the global
//! event stream. Focus restoration is asynchronous on macOS and has no
//! completion callback, hence the fixed delay. There is no acknowledgement:
//! if the target has no text field the paste silently does nothing.

use std::sync::Arc;
use std::time::Duration;

use crate::shared::error::AppResult;
use crate::system::pasteboard::Pasteboard;

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(300);

/// Posts the platform paste chord
pub trait KeySynthesizer: Send + Sync {
    fn post_paste_chord(&self) -> AppResult<()>;
}

/// Makes the host app give focus back to the previous application
pub trait FocusHandoff: Send + Sync {
    fn release_focus(&self) -> AppResult<()>;
}

pub struct PasteInjector {
    pasteboard: Arc<dyn Pasteboard>,
    focus: Arc<dyn FocusHandoff>,
    keys: Arc<dyn KeySynthesizer>,
    settle_delay: Duration,
}

impl PasteInjector {
    pub fn new(
        pasteboard: Arc<dyn Pasteboard>,
        focus: Arc<dyn FocusHandoff>,
        keys: Arc<dyn KeySynthesizer>,
    ) -> Self {
        Self {
            pasteboard,
            focus,
            keys,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Write -> release focus -> wait -> Cmd+V.
    ///
    /// Only a failed pasteboard write is reported; the later steps are best effort.
    pub async fn inject(&self, text: &str) -> AppResult<()> {
        self.pasteboard.write_text(text)?;

        if let Err(e) = self.focus.release_focus() {
            log::warn!("[PasteInjector] Failed to release focus: {}", e);
        }

        tokio::time::sleep(self.settle_delay).await;

        match self.keys.post_paste_chord() {
            Ok(()) => log::debug!("[PasteInjector] Posted paste chord ({} chars)", text.chars().count()),
            Err(e) => log::warn!("[PasteInjector] Paste chord not delivered: {}", e),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::error::AppError;
    use crate::system::pasteboard::testing::FakePasteboard;
    use std::sync::Mutex;
    use std::time::Instant;

    #[derive(Default)]
    struct Recorder {
        steps: Mutex<Vec<(&'static str, Instant)>>,
    }

    impl Recorder {
        fn names(&self) -> Vec<&'static str> {
            self.steps.lock().unwrap().iter().map(|(name, _)| *name).collect()
        }
    }

    struct RecordingFocus(Arc<Recorder>, bool);

    impl FocusHandoff for RecordingFocus {
        fn release_focus(&self) -> AppResult<()> {
            self.0.steps.lock().unwrap().push(("release_focus", Instant::now()));
            if self.1 {
                Err(AppError::System("window gone".to_string()))
            } else {
                Ok(())
            }
        }
    }

    struct RecordingKeys(Arc<Recorder>, bool);

    impl KeySynthesizer for RecordingKeys {
        fn post_paste_chord(&self) -> AppResult<()> {
            self.0.steps.lock().unwrap().push(("paste_chord", Instant::now()));
            if self.1 {
                Err(AppError::Permission)
            } else {
                Ok(())
            }
        }
    }

    fn injector(recorder: &Arc<Recorder>, pasteboard: Arc<FakePasteboard>, fail: bool) -> PasteInjector {
        PasteInjector::new(
            pasteboard,
            Arc::new(RecordingFocus(Arc::clone(recorder), fail)),
            Arc::new(RecordingKeys(Arc::clone(recorder), fail)),
        )
    }

    #[tokio::test]
    async fn writes_then_releases_focus_then_pastes_after_delay() {
        let recorder = Arc::new(Recorder::default());
        let pasteboard = Arc::new(FakePasteboard::new());
        let injector = injector(&recorder, Arc::clone(&pasteboard), false)
            .with_settle_delay(Duration::from_millis(40));

        injector.inject("hello world").await.unwrap();

        assert_eq!(pasteboard.contents().as_deref(), Some("hello world"));
        assert_eq!(recorder.names(), vec!["release_focus", "paste_chord"]);

        let steps = recorder.steps.lock().unwrap();
        assert!(steps[1].1.duration_since(steps[0].1) >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn focus_and_keystroke_failures_are_swallowed() {
        let recorder = Arc::new(Recorder::default());
        let pasteboard = Arc::new(FakePasteboard::new());
        let injector = injector(&recorder, Arc::clone(&pasteboard), true)
            .with_settle_delay(Duration::ZERO);

        assert!(injector.inject("still pasted").await.is_ok());
        assert_eq!(recorder.names(), vec!["release_focus", "paste_chord"]);
        assert_eq!(pasteboard.contents().as_deref(), Some("still pasted"));
    }

    #[test]
    fn default_settle_delay_is_300ms() {
        let recorder = Arc::new(Recorder::default());
        let injector = injector(&recorder, Arc::new(FakePasteboard::new()), false);
        assert_eq!(injector.settle_delay(), Duration::from_millis(300));
    }
}
