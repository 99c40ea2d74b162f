// src/services/session_manager.rs
use std::{
    fmt::Debug,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{
    sync::RwLock,
    task::JoinHandle,
};
use uuid::Uuid;

use crate::{
    config::Contact,
    message::{ChatRequest, Message, Role, recent},
    services::{
        transport::ChatTransport,
        view::{ChatView, Mood, Status},
    },
};

pub const OPEN_HAPPY_FOR: Duration = Duration::from_millis(1200);
pub const REPLY_HAPPY_FOR: Duration = Duration::from_millis(1000);
pub const HINT_DELAY: Duration = Duration::from_millis(6000);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub is_open: bool,
    pub is_typing: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Empty input, or a request was already in flight.
    Ignored,
    Replied(String),
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Enter,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub shift: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Submit,
    InsertNewline,
    Nothing,
}

impl KeyPress {
    pub fn action(self) -> KeyAction {
        match (self.key, self.shift) {
            (Key::Enter, false) => KeyAction::Submit,
            (Key::Enter, true) => KeyAction::InsertNewline,
            (Key::Other, _) => KeyAction::Nothing,
        }
    }
}

/// Avatar mood with delayed reverts. A revert only lands if nothing else
/// changed the mood since it was scheduled.
struct MoodClock {
    view: Arc<dyn ChatView>,
    generation: AtomicU64,
}

impl MoodClock {
    fn set(&self, mood: Mood) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.view.set_mood(mood);
        generation
    }

    fn flash(self: &Arc<Self>, mood: Mood, revert_after: Duration) {
        let generation = self.set(mood);
        let clock = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(revert_after).await;
            if clock.generation.load(Ordering::SeqCst) == generation {
                clock.view.set_mood(Mood::Normal);
            }
        });
    }
}

/// Marks a request in flight. Dropping it clears `is_typing` and, when the
/// turn was abandoned midway, puts the widget back into its idle look.
struct PendingTurn<'a> {
    state: &'a Mutex<SessionState>,
    view: &'a dyn ChatView,
    finished: bool,
}

impl PendingTurn<'_> {
    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for PendingTurn<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.view.hide_typing();
            self.view.set_status(Status::Online);
            self.view.set_send_enabled(true);
        }
        lock(self.state).is_typing = false;
    }
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One visitor's conversation with the portfolio assistant.
///
/// History lives only as long as the session and is append-only; only the
/// last twelve entries travel with each request. Timed mood changes spawn
/// tokio tasks, so methods must run inside a runtime.
pub struct ChatSession<T> {
    id: Uuid,
    transport: T,
    view: Arc<dyn ChatView>,
    mood: Arc<MoodClock>,
    contact: Contact,
    state: Mutex<SessionState>,
    history: RwLock<Vec<Message>>,
}

impl<T> Debug for ChatSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("contact", &self.contact)
            .finish_non_exhaustive()
    }
}

impl<T: ChatTransport> ChatSession<T> {
    pub fn new(transport: T, view: Arc<dyn ChatView>, contact: Contact) -> Self {
        let mood = Arc::new(MoodClock { view: Arc::clone(&view), generation: AtomicU64::new(0) });
        Self {
            id: Uuid::new_v4(),
            transport,
            view,
            mood,
            contact,
            state: Mutex::new(SessionState::default()),
            history: RwLock::new(Vec::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    /// Copy of the full conversation, oldest first.
    pub async fn history(&self) -> Vec<Message> {
        self.history.read().await.clone()
    }

    // Open or close the chat window; returns the new open flag.
    pub async fn toggle(&self) -> bool {
        let is_open = {
            let mut state = lock(&self.state);
            state.is_open = !state.is_open;
            state.is_open
        };

        self.view.set_open(is_open);
        if is_open {
            self.view.dismiss_hint();
            self.view.focus_input();
            self.mood.flash(Mood::Happy, OPEN_HAPPY_FOR);
        } else {
            self.mood.set(Mood::Normal);
        }

        tracing::debug!(session = %self.id, is_open, "chat toggled");
        is_open
    }

    // Send one user turn to the proxy and render whatever comes back.
    // Dropping the future early releases the in-flight guard.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Ignored;
        }

        {
            let mut state = lock(&self.state);
            if state.is_typing {
                tracing::debug!(session = %self.id, "submit ignored while a reply is pending");
                return SubmitOutcome::Ignored;
            }
            state.is_typing = true;
        }
        let turn = PendingTurn { state: &self.state, view: self.view.as_ref(), finished: false };

        self.view.render(Role::User, text);
        self.view.clear_input();
        self.view.set_send_enabled(false);
        self.mood.set(Mood::Thinking);
        self.view.set_status(Status::Thinking);
        self.view.show_typing();

        let request = {
            let history = self.history.read().await;
            ChatRequest { message: text.to_string(), history: recent(&history).to_vec() }
        };

        let result = self.transport.send(&request).await;
        self.view.hide_typing();

        let outcome = match result {
            Ok(response) => {
                let reply = response
                    .reply
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| self.contact.empty_reply_fallback());
                self.view.render(Role::Assistant, &reply);

                {
                    let mut history = self.history.write().await;
                    history.push(Message::user(text));
                    history.push(Message::assistant(reply.clone()));
                }

                self.mood.flash(Mood::Happy, REPLY_HAPPY_FOR);
                tracing::debug!(session = %self.id, context = request.history.len(), "reply received");
                SubmitOutcome::Replied(reply)
            }
            Err(err) => {
                tracing::warn!(session = %self.id, %err, "chat request failed");
                self.view.render(Role::Assistant, &self.contact.connection_fallback());
                self.mood.set(Mood::Normal);
                SubmitOutcome::Failed
            }
        };

        self.view.set_status(Status::Online);
        self.view.set_send_enabled(true);
        turn.finish();
        self.view.focus_input();
        outcome
    }

    /// Submit on a bare Enter. Shift+Enter and other keys are left to the
    /// input field; `None` means nothing was submitted.
    pub async fn on_key(&self, press: KeyPress, input: &str) -> Option<SubmitOutcome> {
        match press.action() {
            KeyAction::Submit => Some(self.submit(input).await),
            KeyAction::InsertNewline | KeyAction::Nothing => None,
        }
    }
}

impl<T: ChatTransport + 'static> ChatSession<T> {
    /// Fade the attention hint if the chat is still closed after [`HINT_DELAY`].
    pub fn spawn_hint_timer(self: &Arc<Self>) -> JoinHandle<()> {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(HINT_DELAY).await;
            if !session.state().await.is_open {
                session.view.dismiss_hint();
            }
        })
    }
}
