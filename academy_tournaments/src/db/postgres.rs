//! PostgreSQL implementation of `TournamentRepository`.
#![allow(clippy::needless_raw_string_hashes)]

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use super::repository::{RecomputeFn, TournamentRepository};
use crate::ranking::{RecomputeOutcome, TournamentRanking};
use crate::rewards::{LedgerEntry, NewLedgerEntry, RewardPolicy};
use crate::sessions::{ByeRecord, GameResult, NewSession, Session};
use crate::tournament::{
    ParticipantId, SessionId, StatusChange, Tournament, TournamentDraft, TournamentError,
    TournamentId, TournamentResult, TournamentSnapshot, TournamentStatus,
};

const TOURNAMENT_COLUMNS: &str = "id, name, format, status, start_date, sessions_generated, \
     sessions_generated_at, reward_policy_snapshot::text AS reward_policy_snapshot, created_at";

const SESSION_COLUMNS: &str = "id, tournament_id, title, date_start, date_end, tournament_phase, \
     tournament_round, tournament_match_number, group_index, is_tournament_game, auto_generated, \
     home_slot::text AS home_slot, away_slot::text AS away_slot, home_participant, \
     away_participant, game_result::text AS game_result";

const LEDGER_COLUMNS: &str =
    "id, tournament_id, participant_id, currency, amount, reason, idempotency_key, created_at";

/// Stored text that no longer parses into its enum
fn decode_error(message: String) -> sqlx::Error {
    sqlx::Error::Decode(message.into())
}

fn tournament_from_row(row: &PgRow) -> TournamentResult<Tournament> {
    let format: String = row.get("format");
    let status: String = row.get("status");
    let policy: String = row.get("reward_policy_snapshot");

    Ok(Tournament {
        id: row.get("id"),
        name: row.get("name"),
        format: format.parse()?,
        status: status.parse().map_err(decode_error)?,
        start_date: row.get::<NaiveDateTime, _>("start_date").and_utc(),
        sessions_generated: row.get("sessions_generated"),
        sessions_generated_at: row
            .get::<Option<NaiveDateTime>, _>("sessions_generated_at")
            .map(|dt| dt.and_utc()),
        reward_policy_snapshot: serde_json::from_str(&policy)?,
        created_at: row.get::<NaiveDateTime, _>("created_at").and_utc(),
    })
}

fn session_from_row(row: &PgRow) -> TournamentResult<Session> {
    let phase: String = row.get("tournament_phase");
    let home_slot: String = row.get("home_slot");
    let away_slot: String = row.get("away_slot");
    let game_result = row
        .get::<Option<String>, _>("game_result")
        .map(|json| serde_json::from_str::<GameResult>(&json))
        .transpose()?;

    Ok(Session {
        id: row.get("id"),
        tournament_id: row.get("tournament_id"),
        title: row.get("title"),
        date_start: row.get::<NaiveDateTime, _>("date_start").and_utc(),
        date_end: row.get::<NaiveDateTime, _>("date_end").and_utc(),
        tournament_phase: phase.parse().map_err(decode_error)?,
        tournament_round: row.get::<i32, _>("tournament_round") as u32,
        tournament_match_number: row.get::<i32, _>("tournament_match_number") as u32,
        group_index: row.get::<Option<i32>, _>("group_index").map(|g| g as u32),
        is_tournament_game: row.get("is_tournament_game"),
        auto_generated: row.get("auto_generated"),
        home_slot: serde_json::from_str(&home_slot)?,
        away_slot: serde_json::from_str(&away_slot)?,
        home_participant: row.get("home_participant"),
        away_participant: row.get("away_participant"),
        game_result,
    })
}

fn ledger_entry_from_row(row: &PgRow) -> TournamentResult<LedgerEntry> {
    let currency: String = row.get("currency");
    let reason: String = row.get("reason");

    Ok(LedgerEntry {
        id: row.get("id"),
        tournament_id: row.get("tournament_id"),
        participant_id: row.get("participant_id"),
        currency: currency.parse().map_err(decode_error)?,
        amount: row.get("amount"),
        reason: reason.parse().map_err(decode_error)?,
        idempotency_key: row.get("idempotency_key"),
        created_at: row.get::<NaiveDateTime, _>("created_at").and_utc(),
    })
}

/// Default PostgreSQL implementation of `TournamentRepository`
#[derive(Clone)]
pub struct PgTournamentRepository {
    pool: PgPool,
}

impl PgTournamentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lock the tournament row for the rest of the transaction
    async fn lock_tournament(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tournament_id: TournamentId,
    ) -> TournamentResult<Tournament> {
        let row = sqlx::query(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1 FOR UPDATE"
        ))
        .bind(tournament_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(TournamentError::NotFound(tournament_id))?;

        tournament_from_row(&row)
    }

    /// Roster, sessions and byes read inside an open transaction
    async fn snapshot_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tournament: Tournament,
    ) -> TournamentResult<TournamentSnapshot> {
        let participants = sqlx::query(
            "SELECT participant_id FROM tournament_participants
             WHERE tournament_id = $1
             ORDER BY enrolment_position",
        )
        .bind(tournament.id)
        .fetch_all(&mut **tx)
        .await?
        .iter()
        .map(|row| row.get::<ParticipantId, _>("participant_id"))
        .collect();

        let sessions = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE tournament_id = $1
             ORDER BY id"
        ))
        .bind(tournament.id)
        .fetch_all(&mut **tx)
        .await?
        .iter()
        .map(session_from_row)
        .collect::<TournamentResult<Vec<_>>>()?;

        let byes = sqlx::query(
            "SELECT phase, round, participant_id FROM tournament_byes
             WHERE tournament_id = $1
             ORDER BY round, phase",
        )
        .bind(tournament.id)
        .fetch_all(&mut **tx)
        .await?
        .iter()
        .map(|row| -> TournamentResult<ByeRecord> {
            let phase: String = row.get("phase");
            Ok(ByeRecord {
                tournament_id: tournament.id,
                phase: phase.parse().map_err(decode_error)?,
                round: row.get::<i32, _>("round") as u32,
                participant_id: row.get("participant_id"),
            })
        })
        .collect::<TournamentResult<Vec<_>>>()?;

        Ok(TournamentSnapshot {
            tournament,
            participants,
            sessions,
            byes,
        })
    }

    async fn insert_byes(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        byes: &[ByeRecord],
    ) -> TournamentResult<()> {
        for bye in byes {
            sqlx::query(
                "INSERT INTO tournament_byes (tournament_id, phase, round, participant_id)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(bye.tournament_id)
            .bind(bye.phase.as_str())
            .bind(bye.round as i32)
            .bind(bye.participant_id)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl TournamentRepository for PgTournamentRepository {
    async fn health_check(&self) -> TournamentResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_tournament(&self, draft: TournamentDraft) -> TournamentResult<Tournament> {
        let policy = serde_json::to_string(&draft.reward_policy_snapshot)?;
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "INSERT INTO tournaments (name, format, status, start_date, reward_policy_snapshot)
             VALUES ($1, $2, $3, $4, $5::jsonb)
             RETURNING {TOURNAMENT_COLUMNS}"
        ))
        .bind(&draft.name)
        .bind(draft.format.as_str())
        .bind(TournamentStatus::Draft.as_str())
        .bind(draft.start_date.naive_utc())
        .bind(policy)
        .fetch_one(&mut *tx)
        .await?;
        let tournament = tournament_from_row(&row)?;

        sqlx::query(
            "INSERT INTO tournament_status_history (tournament_id, from_status, to_status)
             VALUES ($1, NULL, $2)",
        )
        .bind(tournament.id)
        .bind(TournamentStatus::Draft.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(tournament)
    }

    async fn load_tournament(&self, tournament_id: TournamentId) -> TournamentResult<Tournament> {
        let row = sqlx::query(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1"
        ))
        .bind(tournament_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(TournamentError::NotFound(tournament_id))?;

        tournament_from_row(&row)
    }

    async fn enroll_participant(
        &self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
    ) -> TournamentResult<()> {
        let mut tx = self.pool.begin().await?;
        let tournament = self.lock_tournament(&mut tx, tournament_id).await?;
        if tournament.sessions_generated {
            return Err(TournamentError::InvalidState {
                tournament_id,
                status: tournament.status,
                action: "enroll after sessions were generated",
            });
        }

        let inserted = sqlx::query(
            "INSERT INTO tournament_participants (tournament_id, participant_id, enrolment_position)
             SELECT $1, $2, COALESCE(MAX(enrolment_position), 0) + 1
             FROM tournament_participants WHERE tournament_id = $1
             ON CONFLICT (tournament_id, participant_id) DO NOTHING",
        )
        .bind(tournament_id)
        .bind(participant_id)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(TournamentError::DuplicateParticipant(participant_id));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn load_participants(&self, tournament_id: TournamentId) -> TournamentResult<Vec<ParticipantId>> {
        let tournament = self.load_tournament(tournament_id).await?;
        let rows = sqlx::query(
            "SELECT participant_id FROM tournament_participants
             WHERE tournament_id = $1
             ORDER BY enrolment_position",
        )
        .bind(tournament.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("participant_id")).collect())
    }

    async fn load_status_history(&self, tournament_id: TournamentId) -> TournamentResult<Vec<StatusChange>> {
        self.load_tournament(tournament_id).await?;
        let rows = sqlx::query(
            "SELECT from_status, to_status, changed_at FROM tournament_status_history
             WHERE tournament_id = $1
             ORDER BY changed_at, id",
        )
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> TournamentResult<StatusChange> {
                let from_status = row
                    .get::<Option<String>, _>("from_status")
                    .map(|s| s.parse::<TournamentStatus>().map_err(decode_error))
                    .transpose()?;
                let to_status: String = row.get("to_status");
                Ok(StatusChange {
                    tournament_id,
                    from_status,
                    to_status: to_status.parse().map_err(decode_error)?,
                    changed_at: row.get::<NaiveDateTime, _>("changed_at").and_utc(),
                })
            })
            .collect()
    }

    async fn append_status_change(
        &self,
        tournament_id: TournamentId,
        to_status: TournamentStatus,
    ) -> TournamentResult<StatusChange> {
        let mut tx = self.pool.begin().await?;
        let tournament = self.lock_tournament(&mut tx, tournament_id).await?;

        sqlx::query("UPDATE tournaments SET status = $1 WHERE id = $2")
            .bind(to_status.as_str())
            .bind(tournament_id)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query(
            "INSERT INTO tournament_status_history (tournament_id, from_status, to_status)
             VALUES ($1, $2, $3)
             RETURNING changed_at",
        )
        .bind(tournament_id)
        .bind(tournament.status.as_str())
        .bind(to_status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(StatusChange {
            tournament_id,
            from_status: Some(tournament.status),
            to_status,
            changed_at: row.get::<NaiveDateTime, _>("changed_at").and_utc(),
        })
    }

    async fn find_reward_policy(&self, name: &str) -> TournamentResult<Option<RewardPolicy>> {
        let row = sqlx::query("SELECT policy::text AS policy FROM reward_policies WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let policy: String = row.get("policy");
                Ok(Some(serde_json::from_str(&policy)?))
            }
            None => Ok(None),
        }
    }

    async fn save_reward_policy(&self, policy: &RewardPolicy) -> TournamentResult<()> {
        sqlx::query(
            "INSERT INTO reward_policies (name, policy) VALUES ($1, $2::jsonb)
             ON CONFLICT (name) DO UPDATE SET policy = EXCLUDED.policy, updated_at = NOW()",
        )
        .bind(&policy.name)
        .bind(serde_json::to_string(policy)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn commit_schedule(
        &self,
        tournament_id: TournamentId,
        sessions: Vec<NewSession>,
        byes: Vec<ByeRecord>,
    ) -> TournamentResult<Vec<Session>> {
        let mut tx = self.pool.begin().await?;

        // Re-check the latch under the row lock
        let tournament = self.lock_tournament(&mut tx, tournament_id).await?;
        if tournament.sessions_generated {
            return Err(TournamentError::AlreadyGenerated(tournament_id));
        }

        let mut stored = Vec::with_capacity(sessions.len());
        for row in sessions {
            let inserted = sqlx::query(
                "INSERT INTO sessions (
                    tournament_id, title, date_start, date_end, tournament_phase,
                    tournament_round, tournament_match_number, group_index,
                    is_tournament_game, auto_generated, home_slot, away_slot,
                    home_participant, away_participant
                 )
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11::jsonb, $12::jsonb, $13, $14)
                 RETURNING id",
            )
            .bind(row.tournament_id)
            .bind(&row.title)
            .bind(row.date_start.naive_utc())
            .bind(row.date_end.naive_utc())
            .bind(row.tournament_phase.as_str())
            .bind(row.tournament_round as i32)
            .bind(row.tournament_match_number as i32)
            .bind(row.group_index.map(|g| g as i32))
            .bind(row.is_tournament_game)
            .bind(row.auto_generated)
            .bind(serde_json::to_string(&row.home_slot)?)
            .bind(serde_json::to_string(&row.away_slot)?)
            .bind(row.home_participant)
            .bind(row.away_participant)
            .fetch_one(&mut *tx)
            .await;

            let id: SessionId = match inserted {
                Ok(r) => r.get("id"),
                Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                    return Err(TournamentError::AlreadyGenerated(tournament_id));
                }
                Err(e) => return Err(e.into()),
            };
            stored.push(row.into_session(id));
        }

        self.insert_byes(&mut tx, &byes).await?;

        sqlx::query(
            "UPDATE tournaments
             SET sessions_generated = TRUE, sessions_generated_at = NOW()
             WHERE id = $1",
        )
        .bind(tournament_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(stored)
    }

    async fn load_session(&self, session_id: SessionId) -> TournamentResult<Session> {
        let row = sqlx::query(&format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1"))
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(TournamentError::SessionNotFound(session_id))?;

        session_from_row(&row)
    }

    async fn load_snapshot(&self, tournament_id: TournamentId) -> TournamentResult<TournamentSnapshot> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1 FOR SHARE"
        ))
        .bind(tournament_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(TournamentError::NotFound(tournament_id))?;
        let tournament = tournament_from_row(&row)?;

        let snapshot = self.snapshot_in(&mut tx, tournament).await?;
        tx.commit().await?;
        Ok(snapshot)
    }

    async fn record_result(&self, session_id: SessionId, result: GameResult) -> TournamentResult<Session> {
        let row = sqlx::query(&format!(
            "UPDATE sessions SET game_result = $1::jsonb WHERE id = $2
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(serde_json::to_string(&result)?)
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(TournamentError::SessionNotFound(session_id))?;

        session_from_row(&row)
    }

    async fn recompute_locked(
        &self,
        tournament_id: TournamentId,
        compute: &RecomputeFn,
    ) -> TournamentResult<RecomputeOutcome> {
        let mut tx = self.pool.begin().await?;
        let tournament = self.lock_tournament(&mut tx, tournament_id).await?;
        let snapshot = self.snapshot_in(&mut tx, tournament).await?;

        let outcome = compute(&snapshot)?;

        for binding in &outcome.bindings {
            sqlx::query(
                "UPDATE sessions SET home_participant = $1, away_participant = $2
                 WHERE id = $3 AND game_result IS NULL",
            )
            .bind(binding.home_participant)
            .bind(binding.away_participant)
            .bind(binding.session_id)
            .execute(&mut *tx)
            .await?;
        }

        self.insert_byes(&mut tx, &outcome.byes).await?;

        sqlx::query("DELETE FROM tournament_rankings WHERE tournament_id = $1")
            .bind(tournament_id)
            .execute(&mut *tx)
            .await?;

        for (position, ranking) in outcome.rankings.iter().enumerate() {
            sqlx::query(
                "INSERT INTO tournament_rankings (
                    tournament_id, participant_id, rank, ranking_position, points, wins,
                    losses, draws, goals_for, goals_against
                 )
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(tournament_id)
            .bind(ranking.participant_id)
            .bind(ranking.rank as i32)
            .bind(position as i32)
            .bind(ranking.points)
            .bind(ranking.wins as i32)
            .bind(ranking.losses as i32)
            .bind(ranking.draws as i32)
            .bind(ranking.goals_for as i32)
            .bind(ranking.goals_against as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(outcome)
    }

    async fn load_rankings(&self, tournament_id: TournamentId) -> TournamentResult<Vec<TournamentRanking>> {
        self.load_tournament(tournament_id).await?;
        let rows = sqlx::query(
            "SELECT participant_id, rank, points, wins, losses, draws, goals_for, goals_against
             FROM tournament_rankings
             WHERE tournament_id = $1
             ORDER BY rank, ranking_position",
        )
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| TournamentRanking {
                tournament_id,
                participant_id: row.get("participant_id"),
                rank: row.get::<i32, _>("rank") as u32,
                points: row.get("points"),
                wins: row.get::<i32, _>("wins") as u32,
                losses: row.get::<i32, _>("losses") as u32,
                draws: row.get::<i32, _>("draws") as u32,
                goals_for: row.get::<i32, _>("goals_for") as u32,
                goals_against: row.get::<i32, _>("goals_against") as u32,
            })
            .collect())
    }

    async fn commit_rewards(
        &self,
        tournament_id: TournamentId,
        entries: Vec<NewLedgerEntry>,
    ) -> TournamentResult<Vec<LedgerEntry>> {
        let mut tx = self.pool.begin().await?;

        let marker = sqlx::query(
            "INSERT INTO tournament_reward_distributions (tournament_id) VALUES ($1)
             ON CONFLICT (tournament_id) DO NOTHING",
        )
        .bind(tournament_id)
        .execute(&mut *tx)
        .await?;
        if marker.rows_affected() == 0 {
            return Err(TournamentError::AlreadyDistributed(tournament_id));
        }

        let mut committed = Vec::with_capacity(entries.len());
        for entry in entries {
            // Check for duplicate entry (idempotency)
            let existing = sqlx::query("SELECT id FROM reward_ledger_entries WHERE idempotency_key = $1")
                .bind(&entry.idempotency_key)
                .fetch_optional(&mut *tx)
                .await?;
            if existing.is_some() {
                log::warn!("Skipping duplicate ledger entry {}", entry.idempotency_key);
                continue;
            }

            let row = sqlx::query(&format!(
                "INSERT INTO reward_ledger_entries
                    (tournament_id, participant_id, currency, amount, reason, idempotency_key)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING {LEDGER_COLUMNS}"
            ))
            .bind(entry.tournament_id)
            .bind(entry.participant_id)
            .bind(entry.currency.to_string())
            .bind(entry.amount)
            .bind(entry.reason.to_string())
            .bind(&entry.idempotency_key)
            .fetch_one(&mut *tx)
            .await?;
            committed.push(ledger_entry_from_row(&row)?);
        }

        tx.commit().await?;
        Ok(committed)
    }

    async fn load_ledger_entries(&self, tournament_id: TournamentId) -> TournamentResult<Vec<LedgerEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {LEDGER_COLUMNS} FROM reward_ledger_entries
             WHERE tournament_id = $1
             ORDER BY id"
        ))
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(ledger_entry_from_row).collect()
    }
}
