//! Reward policy and ledger models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::tournament::{ParticipantId, TournamentId};

/// Placement bucket a final rank falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlacementBucket {
    First,
    Second,
    Third,
    Participant,
}

impl PlacementBucket {
    pub fn for_rank(rank: u32) -> Self {
        match rank {
            1 => PlacementBucket::First,
            2 => PlacementBucket::Second,
            3 => PlacementBucket::Third,
            _ => PlacementBucket::Participant,
        }
    }
}

impl std::fmt::Display for PlacementBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlacementBucket::First => write!(f, "FIRST"),
            PlacementBucket::Second => write!(f, "SECOND"),
            PlacementBucket::Third => write!(f, "THIRD"),
            PlacementBucket::Participant => write!(f, "PARTICIPANT"),
        }
    }
}

/// Reward for one placement bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementReward {
    pub xp: i64,
    pub credits: i64,
}

/// Rewards earned by taking part, independent of placement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationRewards {
    /// XP per completed session played
    pub session_attendance: i64,
}

/// Live, named and editable reward policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPolicy {
    pub name: String,
    pub placements: BTreeMap<PlacementBucket, PlacementReward>,
    pub participation_rewards: ParticipationRewards,
}

/// Name of the policy used when a tournament names none
pub const DEFAULT_POLICY_NAME: &str = "default";

impl Default for RewardPolicy {
    fn default() -> Self {
        let placements = [
            (PlacementBucket::First, 500, 100),
            (PlacementBucket::Second, 300, 50),
            (PlacementBucket::Third, 200, 25),
            (PlacementBucket::Participant, 50, 0),
        ]
        .into_iter()
        .map(|(bucket, xp, credits)| (bucket, PlacementReward { xp, credits }))
        .collect();

        Self {
            name: DEFAULT_POLICY_NAME.to_string(),
            placements,
            participation_rewards: ParticipationRewards {
                session_attendance: 10,
            },
        }
    }
}

/// Deep copy of a policy frozen onto a tournament at creation
///
/// Fields are private: once captured, a snapshot can be read but not edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPolicySnapshot {
    policy: RewardPolicy,
    captured_at: DateTime<Utc>,
}

impl RewardPolicySnapshot {
    pub fn capture(policy: &RewardPolicy, captured_at: DateTime<Utc>) -> Self {
        Self {
            policy: policy.clone(),
            captured_at,
        }
    }

    pub fn policy_name(&self) -> &str {
        &self.policy.name
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Reward for a bucket; buckets missing from the policy pay nothing
    pub fn placement_reward(&self, bucket: PlacementBucket) -> PlacementReward {
        self.policy
            .placements
            .get(&bucket)
            .copied()
            .unwrap_or_default()
    }

    pub fn session_attendance_xp(&self) -> i64 {
        self.policy.participation_rewards.session_attendance
    }
}

/// Ledger currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardCurrency {
    Xp,
    Credits,
}

impl std::fmt::Display for RewardCurrency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RewardCurrency::Xp => write!(f, "xp"),
            RewardCurrency::Credits => write!(f, "credits"),
        }
    }
}

impl FromStr for RewardCurrency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xp" => Ok(RewardCurrency::Xp),
            "credits" => Ok(RewardCurrency::Credits),
            other => Err(format!("unknown reward currency: {other}")),
        }
    }
}

/// Why a ledger entry was paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RewardReason {
    Placement(PlacementBucket),
    SessionAttendance,
}

impl std::fmt::Display for RewardReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RewardReason::Placement(bucket) => write!(f, "placement:{bucket}"),
            RewardReason::SessionAttendance => write!(f, "session_attendance"),
        }
    }
}

impl FromStr for RewardReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "session_attendance" => Ok(RewardReason::SessionAttendance),
            "placement:FIRST" => Ok(RewardReason::Placement(PlacementBucket::First)),
            "placement:SECOND" => Ok(RewardReason::Placement(PlacementBucket::Second)),
            "placement:THIRD" => Ok(RewardReason::Placement(PlacementBucket::Third)),
            "placement:PARTICIPANT" => Ok(RewardReason::Placement(PlacementBucket::Participant)),
            other => Err(format!("unknown reward reason: {other}")),
        }
    }
}

impl From<RewardReason> for String {
    fn from(reason: RewardReason) -> Self {
        reason.to_string()
    }
}

impl TryFrom<String> for RewardReason {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Ledger entry waiting to be committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLedgerEntry {
    pub tournament_id: TournamentId,
    pub participant_id: ParticipantId,
    pub currency: RewardCurrency,
    pub amount: i64,
    pub reason: RewardReason,
    pub idempotency_key: String,
}

impl NewLedgerEntry {
    pub fn new(
        tournament_id: TournamentId,
        participant_id: ParticipantId,
        currency: RewardCurrency,
        amount: i64,
        reason: RewardReason,
    ) -> Self {
        Self {
            tournament_id,
            participant_id,
            currency,
            amount,
            reason,
            idempotency_key: format!(
                "tournament:{tournament_id}:participant:{participant_id}:{reason}:{currency}"
            ),
        }
    }
}

/// Committed ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub tournament_id: TournamentId,
    pub participant_id: ParticipantId,
    pub currency: RewardCurrency,
    pub amount: i64,
    pub reason: RewardReason,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
}
