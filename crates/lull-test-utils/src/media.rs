//! Scriptable [`MediaElement`].

use std::sync::Arc;

use lull_agent::{CanPlay, MediaElement, MediaError, MediaEvent, MediaResult};
use lull_hls::Fragment;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use url::Url;

/// A call the element received, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum MediaCall {
    SetSource(Url),
    AttachBuffer,
    Append(u64),
    ResetBuffer,
    EndOfStream,
    Detach,
    Play,
    Pause,
    Seek(f64),
    SetVolume(f64),
}

#[derive(Default)]
struct Behavior {
    native: bool,
    reject_play: bool,
    fail_append: bool,
    duration: Option<f64>,
    attached: bool,
}

/// Media element double.
///
/// Clones share state, so a test keeps one handle while the agent owns
/// another. `play`/`pause` on an attached element answer with
/// [`MediaEvent::Playing`]/[`MediaEvent::Pause`] like a real element would.
#[derive(Clone)]
pub struct FakeMediaElement {
    behavior: Arc<Mutex<Behavior>>,
    calls: Arc<Mutex<Vec<MediaCall>>>,
    events: broadcast::Sender<MediaEvent>,
}

impl FakeMediaElement {
    /// Element that plays HLS natively.
    #[must_use]
    pub fn native() -> Self {
        Self::new(true)
    }

    /// Element that needs a software client.
    #[must_use]
    pub fn software() -> Self {
        Self::new(false)
    }

    fn new(native: bool) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(Behavior {
                native,
                ..Behavior::default()
            })),
            calls: Arc::default(),
            events: broadcast::channel(64).0,
        }
    }

    #[must_use]
    pub fn rejecting_play(self) -> Self {
        self.behavior.lock().reject_play = true;
        self
    }

    #[must_use]
    pub fn failing_append(self) -> Self {
        self.behavior.lock().fail_append = true;
        self
    }

    /// Raise `event` to every subscriber.
    pub fn emit(&self, event: MediaEvent) {
        let _ = self.events.send(event);
    }

    /// Change the duration and raise [`MediaEvent::DurationChange`].
    pub fn change_duration(&self, duration: Option<f64>) {
        self.behavior.lock().duration = duration;
        self.emit(MediaEvent::DurationChange { duration });
    }

    #[must_use]
    pub fn calls(&self) -> Vec<MediaCall> {
        self.calls.lock().clone()
    }

    #[must_use]
    pub fn count(&self, call: &MediaCall) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    #[must_use]
    pub fn subscribers(&self) -> usize {
        self.events.receiver_count()
    }

    fn record(&self, call: MediaCall) {
        self.calls.lock().push(call);
    }
}

impl MediaElement for FakeMediaElement {
    fn can_play_type(&self, _mime: &str) -> CanPlay {
        if self.behavior.lock().native {
            CanPlay::Probably
        } else {
            CanPlay::No
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<MediaEvent> {
        self.events.subscribe()
    }

    fn set_source(&self, url: &Url) {
        self.behavior.lock().attached = true;
        self.record(MediaCall::SetSource(url.clone()));
    }

    fn attach_buffer(&self) {
        self.behavior.lock().attached = true;
        self.record(MediaCall::AttachBuffer);
    }

    fn append(&self, fragment: &Fragment) -> MediaResult<()> {
        self.record(MediaCall::Append(fragment.sequence));
        if self.behavior.lock().fail_append {
            return Err(MediaError::Append("QuotaExceededError".into()));
        }
        Ok(())
    }

    fn reset_buffer(&self) {
        self.record(MediaCall::ResetBuffer);
    }

    fn end_of_stream(&self) {
        self.record(MediaCall::EndOfStream);
    }

    fn detach(&self) {
        {
            let mut behavior = self.behavior.lock();
            behavior.attached = false;
            behavior.duration = None;
        }
        self.record(MediaCall::Detach);
    }

    fn play(&self) -> MediaResult<()> {
        self.record(MediaCall::Play);
        let (rejected, attached) = {
            let behavior = self.behavior.lock();
            (behavior.reject_play, behavior.attached)
        };
        if rejected {
            return Err(MediaError::PlayRejected("NotAllowedError".into()));
        }
        if attached {
            self.emit(MediaEvent::Playing);
        }
        Ok(())
    }

    fn pause(&self) {
        self.record(MediaCall::Pause);
        if self.behavior.lock().attached {
            self.emit(MediaEvent::Pause);
        }
    }

    fn seek(&self, time: f64) {
        self.record(MediaCall::Seek(time));
    }

    fn set_volume(&self, volume: f64) {
        self.record(MediaCall::SetVolume(volume));
    }

    fn duration(&self) -> Option<f64> {
        self.behavior.lock().duration
    }
}
