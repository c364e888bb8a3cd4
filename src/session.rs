// Recording session controller
// Orchestrates count-in, start/stop, mode semantics and live feedback, and
// delegates note events to the capture state machine.
//
// Single-threaded cooperative model: device events, `poll` ticks and UI
// reads interleave on one execution context. Every handler is short and
// non-blocking, and nothing in here panics out of the event path - a panic
// there would desynchronize the device subscription.

use crate::capture::{NoteCapture, PendingNote};
use crate::clock::StepClock;
use crate::error::CaptureError;
use crate::event::{DeviceEvent, TimedDeviceEvent};
use crate::feedback::FeedbackTicker;
use crate::messaging::channels::{EventConsumer, NotificationProducer};
use crate::messaging::notification::{Notification, NotificationCategory};
use crate::metronome::{ClickType, CountInScheduler};
use crate::note::{MIN_NOTE_STEPS, RecordedNote};
use crate::pattern::{InstrumentId, PatternId, PatternStore};
use crate::timeline::{DEFAULT_STEPS_PER_BEAT, Tempo, TimeSignature};
use crate::transport::TimeSource;
use ringbuf::traits::{Consumer, Producer};
use std::time::Instant;

/// What happens to notes already in the target region
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RecordMode {
    /// Clear the recorded region of pre-existing notes (once, at the first
    /// finalized note of the session)
    Replace,
    /// Layer new notes alongside existing ones
    Overdub,
    /// Wrap positions into the loop region; successive passes overdub
    Loop,
}

/// Half-open loop region [start, end) in steps
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LoopRegion {
    pub start_step: f64,
    pub end_step: f64,
}

impl LoopRegion {
    pub fn new(start_step: f64, end_step: f64) -> Self {
        assert!(end_step > start_step, "Loop end must be after start");
        Self {
            start_step,
            end_step,
        }
    }

    pub fn width(&self) -> f64 {
        self.end_step - self.start_step
    }

    /// Wrap a step position back into the region
    pub fn wrap(&self, step: f64) -> f64 {
        self.start_step + (step - self.start_step).rem_euclid(self.width())
    }
}

/// Configuration accepted at session start
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SessionConfig {
    pub mode: RecordMode,
    /// 0 = no snapping, 1 = full snap
    pub quantize_strength: f64,
    pub count_in_bars: u32,
    /// Quantize grid size in steps
    pub grid_steps: f64,
    pub steps_per_beat: u32,
    pub time_signature: TimeSignature,
    /// Required for `RecordMode::Loop`, ignored otherwise
    pub loop_region: Option<LoopRegion>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: RecordMode::Overdub,
            quantize_strength: 1.0,
            count_in_bars: 0,
            grid_steps: 1.0,
            steps_per_beat: DEFAULT_STEPS_PER_BEAT,
            time_signature: TimeSignature::default(),
            loop_region: None,
        }
    }
}

/// Where recorded notes land
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Target {
    pub pattern: PatternId,
    pub instrument: InstrumentId,
}

/// Statistics returned by `Recorder::stop`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    pub notes_recorded: usize,
    pub elapsed_seconds: f64,
}

/// Recorder lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    CountingIn,
    Recording,
}

/// Count-in bookkeeping: elapsed time is measured on the audio clock when one
/// was live at start, on the wall clock otherwise
#[derive(Debug)]
struct CountIn {
    scheduler: CountInScheduler,
    start_audio: Option<f64>,
    start_wall: Instant,
}

/// State that only exists once recording has actually begun
#[derive(Debug)]
struct ActiveRecording {
    clock: StepClock,
    capture: NoteCapture,
    ticker: FeedbackTicker,
    replace_applied: bool,
}

/// One start/stop cycle
#[derive(Debug)]
struct ActiveSession {
    config: SessionConfig,
    target: Target,
    /// Captured once at start() and fixed for the session, so live tempo
    /// changes never retroactively move already-computed positions
    tempo: Tempo,
    started_wall: Instant,
    count_in: Option<CountIn>,
    rec: Option<ActiveRecording>,
    /// Loop-enable flag the session overrode, restored at stop
    prev_loop_enabled: Option<bool>,
}

/// The recording session controller
///
/// Constructed with its transport collaborator; the pattern store is passed
/// into each call so the caller keeps ownership of pattern data. The host
/// feeds decoded device events through `handle_event` (or `pump_events`) and
/// calls `poll` from its UI timer; once `stop` returns, further events are
/// ignored until the next `start`.
pub struct Recorder<T: TimeSource> {
    transport: T,
    notifications: NotificationProducer,
    state: RecorderState,
    session: Option<ActiveSession>,
}

impl<T: TimeSource> Recorder<T> {
    pub fn new(transport: T, notifications: NotificationProducer) -> Self {
        Self {
            transport,
            notifications,
            state: RecorderState::Idle,
            session: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Snapshot of the pending-note table, for UI display
    pub fn pending_notes(&self) -> Vec<PendingNote> {
        self.session
            .as_ref()
            .and_then(|s| s.rec.as_ref())
            .map(|rec| rec.capture.pending().copied().collect())
            .unwrap_or_default()
    }

    /// Start a recording session
    ///
    /// Fails without state change when a session is already in progress or a
    /// loop session has no region. With a count-in the controller stays in
    /// `CountingIn` until the count-in duration has elapsed on the clock.
    pub fn start(&mut self, config: SessionConfig, target: Target) -> Result<(), CaptureError> {
        if self.state != RecorderState::Idle {
            return Err(CaptureError::AlreadyRecording);
        }
        if config.mode == RecordMode::Loop && config.loop_region.is_none() {
            return Err(CaptureError::MissingLoopRegion);
        }

        let tempo = Tempo::from_reading(self.transport.current_tempo());

        let mut session = ActiveSession {
            config,
            target,
            tempo,
            started_wall: Instant::now(),
            count_in: None,
            rec: None,
            prev_loop_enabled: None,
        };

        if session.config.mode == RecordMode::Loop {
            session.prev_loop_enabled = Some(self.transport.is_loop_enabled());
            self.transport.set_loop_enabled(true);
        }

        if session.config.count_in_bars > 0 {
            session.count_in = Some(CountIn {
                scheduler: CountInScheduler::new(
                    session.config.count_in_bars,
                    tempo,
                    session.config.time_signature,
                ),
                start_audio: self.transport.audio_clock(),
                start_wall: Instant::now(),
            });
            self.state = RecorderState::CountingIn;
        } else {
            session.rec = Some(Self::spin_up(
                &self.transport,
                &mut self.notifications,
                &session.config,
                tempo,
            ));
            self.state = RecorderState::Recording;
        }

        self.session = Some(session);
        Ok(())
    }

    /// Handle one decoded device event
    ///
    /// Ignored outside the `Recording` state. Never panics and never returns
    /// an error: everything recoverable becomes a notification.
    pub fn handle_event(&mut self, event: TimedDeviceEvent, store: &mut dyn PatternStore) {
        self.promote_if_count_in_elapsed();

        if self.state != RecorderState::Recording {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(rec) = session.rec.as_mut() else {
            return;
        };

        let (pitch, velocity) = match event.event {
            DeviceEvent::NoteOn { pitch, velocity } if velocity > 0 => (pitch, Some(velocity)),
            // Some controllers signal release as note-on with velocity 0
            DeviceEvent::NoteOn { pitch, .. } => (pitch, None),
            DeviceEvent::NoteOff { pitch } => (pitch, None),
            DeviceEvent::Other => return,
        };

        let audio_now = event.audio_time.or_else(|| self.transport.audio_clock());
        let reading = rec
            .clock
            .current_step(audio_now, self.transport.current_step());
        if reading.clamped {
            push_warning(
                &mut self.notifications,
                NotificationCategory::Clock,
                "clock reading clamped to step 0".to_string(),
            );
        }

        let loop_region = match session.config.mode {
            RecordMode::Loop => session.config.loop_region,
            _ => None,
        };
        let raw_step = match loop_region {
            Some(region) => region.wrap(reading.step),
            None => reading.step,
        };

        match velocity {
            Some(velocity) => {
                let Some(pending) = rec.capture.begin(pitch, velocity, raw_step, audio_now) else {
                    return; // duplicate down-event or out-of-range data
                };

                // Live preview: the note appears immediately at minimum
                // length and grows while the key is held
                let preview = RecordedNote::new(
                    pending.note_id,
                    pending.pitch,
                    pending.velocity,
                    pending.start_step,
                    MIN_NOTE_STEPS,
                );
                if let Err(e) =
                    store.append_or_replace_note(session.target.pattern, session.target.instrument, preview)
                {
                    push_warning(
                        &mut self.notifications,
                        NotificationCategory::Pattern,
                        format!("live preview dropped: {e}"),
                    );
                }
            }
            None => {
                // Unmatched release: the key was already down before
                // recording started
                let Some(note) = rec.capture.complete(pitch, raw_step, audio_now) else {
                    return;
                };
                Self::finalize_into_store(
                    &mut self.notifications,
                    session.target,
                    session.config.mode,
                    rec,
                    note,
                    store,
                );
            }
        }
    }

    /// Drain a device event channel into the engine
    pub fn pump_events(&mut self, events: &mut EventConsumer, store: &mut dyn PatternStore) {
        while let Some(event) = events.try_pop() {
            self.handle_event(event, store);
        }
    }

    /// Cooperative tick, called from the host's UI timer
    ///
    /// Promotes `CountingIn` to `Recording` when the count-in timer elapses,
    /// reports count-in clicks for the host's metronome, and refreshes the
    /// growing previews of held notes.
    pub fn poll(&mut self, store: &mut dyn PatternStore) -> Option<ClickType> {
        match self.state {
            RecorderState::Idle => None,
            RecorderState::CountingIn => {
                let click = {
                    let Some(session) = self.session.as_mut() else {
                        return None;
                    };
                    let Some(ci) = session.count_in.as_mut() else {
                        return None;
                    };
                    let elapsed = count_in_elapsed(&self.transport, ci);
                    ci.scheduler.poll(elapsed)
                };
                self.promote_if_count_in_elapsed();
                click
            }
            RecorderState::Recording => {
                self.refresh_previews(store);
                None
            }
        }
    }

    /// Stop the session
    ///
    /// Safe from any non-idle state: mid-count-in it cancels cleanly with
    /// zero notes; while recording it finalizes every hanging note against
    /// the stop-time position, restores the transport state the session
    /// overrode, and returns summary statistics.
    pub fn stop(&mut self, store: &mut dyn PatternStore) -> Result<SessionSummary, CaptureError> {
        if self.state == RecorderState::Idle {
            return Err(CaptureError::NotRecording);
        }
        let Some(mut session) = self.session.take() else {
            self.state = RecorderState::Idle;
            return Err(CaptureError::NotRecording);
        };
        self.state = RecorderState::Idle;

        if let Some(prev) = session.prev_loop_enabled {
            self.transport.set_loop_enabled(prev);
        }

        let Some(mut rec) = session.rec.take() else {
            // Cancelled during count-in: no notes were captured
            return Ok(SessionSummary {
                notes_recorded: 0,
                elapsed_seconds: session.started_wall.elapsed().as_secs_f64(),
            });
        };

        let audio_now = self.transport.audio_clock();
        let reading = rec
            .clock
            .current_step(audio_now, self.transport.current_step());
        let stop_step = match (session.config.mode, session.config.loop_region) {
            (RecordMode::Loop, Some(region)) => region.wrap(reading.step),
            _ => reading.step,
        };

        for note in rec.capture.finalize_hanging(stop_step, audio_now) {
            Self::finalize_into_store(
                &mut self.notifications,
                session.target,
                session.config.mode,
                &mut rec,
                note,
                store,
            );
        }

        let elapsed_steps = (reading.step - rec.clock.start_step()).max(0.0);
        Ok(SessionSummary {
            notes_recorded: rec.capture.finalized().len(),
            elapsed_seconds: session
                .tempo
                .steps_to_seconds(elapsed_steps, session.config.steps_per_beat),
        })
    }

    fn spin_up(
        transport: &T,
        notifications: &mut NotificationProducer,
        config: &SessionConfig,
        tempo: Tempo,
    ) -> ActiveRecording {
        let start_audio = transport.audio_clock();
        let mut start_step = transport.current_step().unwrap_or(0.0);
        if !start_step.is_finite() || start_step < 0.0 {
            push_warning(
                notifications,
                NotificationCategory::Clock,
                "transport position invalid at session start, using step 0".to_string(),
            );
            start_step = 0.0;
        }

        let clock = StepClock::new(start_step, start_audio, tempo, config.steps_per_beat);
        let capture = NoteCapture::new(config.quantize_strength, config.grid_steps, clock.clone());

        ActiveRecording {
            clock,
            capture,
            ticker: FeedbackTicker::default(),
            replace_applied: false,
        }
    }

    fn promote_if_count_in_elapsed(&mut self) {
        if self.state != RecorderState::CountingIn {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(ci) = session.count_in.as_ref() else {
            return;
        };

        if !ci.scheduler.finished(count_in_elapsed(&self.transport, ci)) {
            return;
        }

        session.count_in = None;
        session.rec = Some(Self::spin_up(
            &self.transport,
            &mut self.notifications,
            &session.config,
            session.tempo,
        ));
        self.state = RecorderState::Recording;
    }

    fn refresh_previews(&mut self, store: &mut dyn PatternStore) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(rec) = session.rec.as_mut() else {
            return;
        };

        if rec.capture.pending_count() == 0 {
            // Nothing held: the loop re-arms so the next hold refreshes
            // immediately
            rec.ticker.reset();
            return;
        }
        if !rec.ticker.due(Instant::now()) {
            return;
        }

        let audio_now = self.transport.audio_clock();
        let reading = rec
            .clock
            .current_step(audio_now, self.transport.current_step());
        let current_step = match (session.config.mode, session.config.loop_region) {
            (RecordMode::Loop, Some(region)) => region.wrap(reading.step),
            _ => reading.step,
        };

        let pending: Vec<PendingNote> = rec.capture.pending().copied().collect();
        for p in pending {
            let length = rec.capture.preview_length(&p, current_step, audio_now);
            let preview = RecordedNote::new(p.note_id, p.pitch, p.velocity, p.start_step, length);
            // Best-effort: a failed preview update is simply retried on the
            // next tick; finalization is what warns
            let _ = store.append_or_replace_note(
                session.target.pattern,
                session.target.instrument,
                preview,
            );
        }
    }

    fn finalize_into_store(
        notifications: &mut NotificationProducer,
        target: Target,
        mode: RecordMode,
        rec: &mut ActiveRecording,
        note: RecordedNote,
        store: &mut dyn PatternStore,
    ) {
        // Mode semantics are applied once, at the first finalized note of
        // the session - not at start, so a session that never produces a
        // note never destructively clears the region
        if mode == RecordMode::Replace && !rec.replace_applied {
            rec.replace_applied = true;
            let start = rec.clock.start_step();
            match store.remove_notes_in_range(target.pattern, target.instrument, start, note.end_step())
            {
                Ok(_) => {
                    // The clear also swept this session's live previews;
                    // re-emit one per still-held key
                    let held: Vec<PendingNote> = rec.capture.pending().copied().collect();
                    for p in held {
                        let preview = RecordedNote::new(
                            p.note_id,
                            p.pitch,
                            p.velocity,
                            p.start_step,
                            MIN_NOTE_STEPS,
                        );
                        let _ = store.append_or_replace_note(target.pattern, target.instrument, preview);
                    }
                }
                Err(e) => push_warning(
                    notifications,
                    NotificationCategory::Pattern,
                    format!("replace clear failed: {e}"),
                ),
            }
        }

        match store.append_or_replace_note(target.pattern, target.instrument, note) {
            Ok(()) => rec.capture.commit(note),
            // Recoverable: the note is dropped, recording continues
            Err(e) => push_warning(
                notifications,
                NotificationCategory::Pattern,
                format!("recorded note dropped: {e}"),
            ),
        }
    }
}

fn count_in_elapsed<T: TimeSource>(transport: &T, ci: &CountIn) -> f64 {
    match (transport.audio_clock(), ci.start_audio) {
        (Some(now), Some(start)) => now - start,
        _ => ci.start_wall.elapsed().as_secs_f64(),
    }
}

fn push_warning(
    notifications: &mut NotificationProducer,
    category: NotificationCategory,
    message: String,
) {
    // A full buffer drops the notification; warnings never block the
    // event path
    let _ = notifications.try_push(Notification::warning(category, message));
}
