// src/services/view.rs
use std::fmt;

use crate::message::Role;

/// Expression shown on the avatar face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mood {
    #[default]
    Normal,
    Thinking,
    Happy,
}

impl Mood {
    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Normal => "normal",
            Mood::Thinking => "thinking",
            Mood::Happy => "happy",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text of the status line under the avatar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Online,
    Thinking,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Online => "Online",
            Status::Thinking => "Thinking...",
        }
    }
}

/// Everything the chat session needs from whatever draws the widget.
///
/// Methods take `&self` because delayed mood reverts run on spawned tasks;
/// implementations use interior mutability.
pub trait ChatView: Send + Sync {
    fn render(&self, role: Role, text: &str);
    fn set_mood(&self, mood: Mood);
    fn set_status(&self, status: Status);
    fn show_typing(&self);
    fn hide_typing(&self);
    fn set_open(&self, open: bool);
    fn dismiss_hint(&self);
    fn clear_input(&self);
    fn focus_input(&self);
    fn set_send_enabled(&self, enabled: bool);
}
