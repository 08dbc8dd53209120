use spine2d::{AnimationState, AnimationStateEvent, AnimationStateListener, TrackEntrySnapshot};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum EventKind {
    Start,
    Interrupt,
    End,
    Dispose,
    Complete,
    Event,
}

/// Animation state notification forwarded to the drawable's event callback.
///
/// Payload fields (`name`, values, audio) are only populated for [`EventKind::Event`].
#[derive(Clone, Debug, PartialEq)]
pub struct SpineEvent {
    pub kind: EventKind,
    pub track_index: usize,
    pub animation_name: String,
    pub name: String,
    pub time: f32,
    pub int_value: i32,
    pub float_value: f32,
    pub string_value: String,
    pub audio_path: String,
    pub volume: f32,
    pub balance: f32,
}

impl SpineEvent {
    fn from_state_event(entry: &TrackEntrySnapshot, event: &AnimationStateEvent) -> Self {
        let kind = match event {
            AnimationStateEvent::Start => EventKind::Start,
            AnimationStateEvent::Interrupt => EventKind::Interrupt,
            AnimationStateEvent::End => EventKind::End,
            AnimationStateEvent::Dispose => EventKind::Dispose,
            AnimationStateEvent::Complete => EventKind::Complete,
            AnimationStateEvent::Event(_) => EventKind::Event,
        };

        let mut out = SpineEvent {
            kind,
            track_index: entry.track_index,
            animation_name: entry.animation_name.clone(),
            name: String::new(),
            time: 0.0,
            int_value: 0,
            float_value: 0.0,
            string_value: String::new(),
            audio_path: String::new(),
            volume: 0.0,
            balance: 0.0,
        };

        if let AnimationStateEvent::Event(ev) = event {
            out.name = ev.name.clone();
            out.time = ev.time;
            out.int_value = ev.int_value;
            out.float_value = ev.float_value;
            out.string_value = ev.string.clone();
            out.audio_path = ev.audio_path.clone();
            out.volume = ev.volume;
            out.balance = ev.balance;
        }
        out
    }
}

/// Listener installed on the animation state. Events are buffered here and drained by the
/// drawable once the state call that produced them has returned.
#[derive(Clone, Default)]
pub(crate) struct EventQueue {
    events: Rc<RefCell<VecDeque<SpineEvent>>>,
    muted: Rc<Cell<bool>>,
}

impl EventQueue {
    pub(crate) fn set_muted(&self, muted: bool) {
        self.muted.set(muted);
    }

    pub(crate) fn drain(&self) -> Vec<SpineEvent> {
        self.events.borrow_mut().drain(..).collect()
    }
}

impl AnimationStateListener for EventQueue {
    fn on_event(
        &mut self,
        _state: &mut AnimationState,
        entry: &TrackEntrySnapshot,
        event: &AnimationStateEvent,
    ) {
        if self.muted.get() {
            return;
        }
        self.events
            .borrow_mut()
            .push_back(SpineEvent::from_state_event(entry, event));
    }
}
