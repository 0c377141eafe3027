//! Database record types (entities).
//!
//! Status and reason columns are stored as upper-case text and parsed back
//! into closed enums when a row is read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{EngineError, Result};

// ============================================================================
// Closed enumerations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Active,
    Dissolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevealStatus {
    Pending,
    Revealed,
    Dismissed,
}

/// Why a match was dissolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DissolutionReason {
    /// One participant unmatched the other
    UserUnmatch,
    /// One participant reported the other
    Report,
    /// Moderation or support closed the match
    AdminAction,
    /// Both participants went idle
    Inactivity,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Active => "ACTIVE",
            MatchStatus::Dissolved => "DISSOLVED",
        }
    }
}

impl RevealStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevealStatus::Pending => "PENDING",
            RevealStatus::Revealed => "REVEALED",
            RevealStatus::Dismissed => "DISMISSED",
        }
    }

    /// DISMISSED has no outgoing transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RevealStatus::Dismissed)
    }
}

impl DissolutionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DissolutionReason::UserUnmatch => "USER_UNMATCH",
            DissolutionReason::Report => "REPORT",
            DissolutionReason::AdminAction => "ADMIN_ACTION",
            DissolutionReason::Inactivity => "INACTIVITY",
        }
    }
}

impl FromStr for MatchStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ACTIVE" => Ok(MatchStatus::Active),
            "DISSOLVED" => Ok(MatchStatus::Dissolved),
            other => Err(EngineError::decode(
                "status",
                format!("unknown match status '{}'", other),
            )),
        }
    }
}

impl FromStr for RevealStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(RevealStatus::Pending),
            "REVEALED" => Ok(RevealStatus::Revealed),
            "DISMISSED" => Ok(RevealStatus::Dismissed),
            other => Err(EngineError::decode(
                "status",
                format!("unknown reveal status '{}'", other),
            )),
        }
    }
}

impl FromStr for DissolutionReason {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "USER_UNMATCH" => Ok(DissolutionReason::UserUnmatch),
            "REPORT" => Ok(DissolutionReason::Report),
            "ADMIN_ACTION" => Ok(DissolutionReason::AdminAction),
            "INACTIVITY" => Ok(DissolutionReason::Inactivity),
            other => Err(EngineError::decode(
                "dissolved_reason",
                format!("unknown dissolution reason '{}'", other),
            )),
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RevealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for DissolutionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Pair key
// ============================================================================

/// An unordered pair of users stored as `(user_id_1, user_id_2)` with
/// `user_id_1 < user_id_2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalPair {
    user_id_1: String,
    user_id_2: String,
}

impl CanonicalPair {
    pub fn new(a: &str, b: &str) -> Result<Self> {
        if a == b {
            return Err(EngineError::InvalidPair {
                user_id: a.to_string(),
            });
        }

        let (first, second) = if a < b { (a, b) } else { (b, a) };
        Ok(Self {
            user_id_1: first.to_string(),
            user_id_2: second.to_string(),
        })
    }

    pub fn user_id_1(&self) -> &str {
        &self.user_id_1
    }

    pub fn user_id_2(&self) -> &str {
        &self.user_id_2
    }
}

impl fmt::Display for CanonicalPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user_id_1, self.user_id_2)
    }
}

// ============================================================================
// Match and reveal entities
// ============================================================================

/// Point-in-time copy of a member's video, frozen when the match is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSnapshot {
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: String,
    pub user_id_1: String,
    pub user_id_2: String,
    pub status: MatchStatus,
    pub user1_video_snapshot: Option<VideoSnapshot>,
    pub user2_video_snapshot: Option<VideoSnapshot>,
    pub dissolved_at: Option<DateTime<Utc>>,
    pub dissolved_by: Option<String>,
    pub dissolved_reason: Option<DissolutionReason>,
    pub created_at: DateTime<Utc>,
}

impl MatchRecord {
    pub fn involves(&self, user_id: &str) -> bool {
        self.user_id_1 == user_id || self.user_id_2 == user_id
    }

    /// The other participant, or `None` if `user_id` is not part of the match.
    pub fn counterpart_of(&self, user_id: &str) -> Option<&str> {
        if self.user_id_1 == user_id {
            Some(&self.user_id_2)
        } else if self.user_id_2 == user_id {
            Some(&self.user_id_1)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealRecord {
    pub id: String,
    pub match_id: String,
    pub user_id: String,
    /// The counterpart's video as it was at match time
    pub video_snapshot: Option<VideoSnapshot>,
    pub status: RevealStatus,
    pub created_at: DateTime<Utc>,
    pub revealed_at: Option<DateTime<Utc>>,
    pub last_shown_at: Option<DateTime<Utc>>,
    pub dismissed_at: Option<DateTime<Utc>>,
}

/// Public profile fields of the counterpart shown next to a reveal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub user_id: String,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealWithCounterpart {
    pub reveal: RevealRecord,
    pub counterpart: ProfileSummary,
}

// ============================================================================
// Collaborator entities (like and member stores)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeRecord {
    pub source_user_id: String,
    pub target_user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub city: Option<String>,
    pub video_url: Option<String>,
    pub video_thumbnail_url: Option<String>,
    pub last_active_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl MemberRecord {
    /// Freeze the member's current video. Members without a video have no snapshot.
    pub fn snapshot_video(&self, captured_at: DateTime<Utc>) -> Option<VideoSnapshot> {
        self.video_url.as_ref().map(|url| VideoSnapshot {
            video_url: url.clone(),
            thumbnail_url: self.video_thumbnail_url.clone(),
            captured_at,
        })
    }
}
