use serde::{Deserialize, Serialize};

/// Direction of a vote on a report.
///
/// Serialized as `"up"` / `"down"` on the wire and stored as the same
/// strings in the votes table, so the enum is the single source of truth
/// for the polarity vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Up,
    Down,
}

impl Polarity {
    pub fn as_str(self) -> &'static str {
        match self {
            Polarity::Up => "up",
            Polarity::Down => "down",
        }
    }

    /// The opposite polarity, used when a vote is switched.
    pub fn flipped(self) -> Self {
        match self {
            Polarity::Up => Polarity::Down,
            Polarity::Down => Polarity::Up,
        }
    }
}

/// What a cast-vote call did to the caller's vote on the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteStatus {
    /// No prior vote existed; an up vote was created.
    Upvoted,
    /// No prior vote existed; a down vote was created.
    Downvoted,
    /// The prior vote had the same polarity and was toggled off.
    Removed,
    /// The prior vote had the opposite polarity and was replaced.
    Switched,
}
