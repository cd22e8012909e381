//! Presence descriptors shown for the bot account.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel value that disables the displayed activity.
pub const NO_ACTIVITY: &str = "none";

/// Kind of activity shown next to the bot's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Playing,
    Streaming,
    Listening,
    Watching,
    Competing,
}

impl ActivityKind {
    /// Keyword prefixes accepted in the configured activity text, longest first.
    const PREFIXES: &'static [(&'static str, ActivityKind)] = &[
        ("listening to ", ActivityKind::Listening),
        ("competing in ", ActivityKind::Competing),
        ("listening ", ActivityKind::Listening),
        ("competing ", ActivityKind::Competing),
        ("streaming ", ActivityKind::Streaming),
        ("watching ", ActivityKind::Watching),
        ("playing ", ActivityKind::Playing),
    ];
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityKind::Playing => write!(f, "Playing"),
            ActivityKind::Streaming => write!(f, "Streaming"),
            ActivityKind::Listening => write!(f, "Listening to"),
            ActivityKind::Watching => write!(f, "Watching"),
            ActivityKind::Competing => write!(f, "Competing in"),
        }
    }
}

/// A presence descriptor: what the bot is "doing".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Activity {
    pub kind: ActivityKind,
    pub name: String,
}

impl Activity {
    pub fn new(kind: ActivityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn playing(name: impl Into<String>) -> Self {
        Self::new(ActivityKind::Playing, name)
    }

    pub fn listening(name: impl Into<String>) -> Self {
        Self::new(ActivityKind::Listening, name)
    }

    /// Parse a configured activity string such as `"listening to jazz"`.
    ///
    /// Returns `None` for an empty string or the `none` sentinel (any case).
    /// Text without a recognised keyword is treated as `Playing`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() || text.eq_ignore_ascii_case(NO_ACTIVITY) {
            return None;
        }

        let lower = text.to_ascii_lowercase();
        for (prefix, kind) in ActivityKind::PREFIXES {
            if lower.starts_with(prefix) {
                let name = text[prefix.len()..].trim();
                if name.is_empty() || name.eq_ignore_ascii_case(NO_ACTIVITY) {
                    return None;
                }
                return Some(Self::new(*kind, name));
            }
        }

        Some(Self::playing(text))
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

/// Online status of the bot account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnlineStatus {
    #[default]
    Online,
    Idle,
    DoNotDisturb,
    Invisible,
}
