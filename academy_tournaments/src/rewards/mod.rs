//! Reward policies and the one-shot payout of a completed tournament.
//!
//! Payouts always read the policy snapshot frozen onto the tournament when
//! it was created. Editing the live policy afterwards changes nothing for
//! tournaments that already exist.

pub mod distributor;
pub mod models;

pub use distributor::{RewardDistributor, build_ledger_entries};
pub use models::{
    DEFAULT_POLICY_NAME, LedgerEntry, NewLedgerEntry, ParticipationRewards, PlacementBucket,
    PlacementReward, RewardCurrency, RewardPolicy, RewardPolicySnapshot, RewardReason,
};
