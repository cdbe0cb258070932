//! Reputation aggregation: rating ingestion, running statistics, and a
//! bounded rating history.
//!
//! Averages are integer fixed-point with two implied decimals
//! (`950` means 9.50) and always truncate. They are recomputed from the
//! running `total_score`/`total_ratings` counters, never from the history,
//! so the final state depends only on the order operations were applied in.
//!
//! Category scores are a last-write-wins snapshot: each category holds the
//! most recent score submitted for it, not an average.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use trustledger_core::{
    Address, CallContext, Epoch, EventPayload, EventSink, LedgerError, LedgerEvent, ObjectId,
    Result,
};

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;

/// Ratings kept in history; the oldest is evicted first.
pub const RATINGS_HISTORY_CAPACITY: usize = 100;

/// One peer rating.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rating {
    pub reviewer: Address,
    pub score: u8,
    pub comment: Option<String>,
    pub timestamp: Epoch,
    pub category: String,
}

/// Latest score submitted for a category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryScore {
    pub category_name: String,
    pub score: u8,
}

/// Snapshot of the running counters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReputationStats {
    pub total_ratings: u64,
    pub total_score: u64,
    /// Fixed-point x100.
    pub average_score: u64,
    pub version: u64,
}

/// Aggregated peer ratings for one registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentReputation {
    id: ObjectId,
    registration_ref: ObjectId,
    agent_owner: Address,
    total_ratings: u64,
    total_score: u64,
    average_score: u64,
    category_scores: Vec<CategoryScore>,
    ratings_history: VecDeque<Rating>,
    version: u64,
}

fn validate_score(score: u8) -> Result<()> {
    if (MIN_SCORE..=MAX_SCORE).contains(&score) {
        Ok(())
    } else {
        Err(LedgerError::InvalidScore(score))
    }
}

/// `floor(total_score * 100 / total_ratings)`, zero when there are no ratings.
fn fixed_point_average(total_score: u64, total_ratings: u64) -> u64 {
    if total_ratings == 0 {
        return 0;
    }
    total_score * 100 / total_ratings
}

impl AgentReputation {
    /// `create_agent_reputation`. Not owner-gated: anyone may open a
    /// reputation record for a registration.
    pub fn create(
        ctx: &CallContext,
        registration_ref: ObjectId,
        agent_owner: Address,
        sink: &mut impl EventSink,
    ) -> Self {
        let reputation = Self {
            id: ObjectId::new(),
            registration_ref,
            agent_owner,
            total_ratings: 0,
            total_score: 0,
            average_score: 0,
            category_scores: Vec::new(),
            ratings_history: VecDeque::with_capacity(RATINGS_HISTORY_CAPACITY),
            version: 1,
        };

        tracing::debug!(
            reputation_id = %reputation.id,
            registration_ref = %registration_ref,
            "Reputation record created"
        );
        sink.emit(LedgerEvent::new(
            ctx,
            EventPayload::ReputationCreated {
                reputation_id: reputation.id,
                registration_ref,
                agent_owner: reputation.agent_owner.clone(),
            },
        ));
        reputation
    }

    /// Ingest a rating from the caller.
    pub fn add_rating(
        &mut self,
        ctx: &CallContext,
        score: u8,
        comment: Option<String>,
        category: impl Into<String>,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        validate_score(score)?;
        let category = category.into();

        if self.ratings_history.len() >= RATINGS_HISTORY_CAPACITY {
            self.ratings_history.pop_front();
        }
        self.ratings_history.push_back(Rating {
            reviewer: ctx.caller.clone(),
            score,
            comment,
            timestamp: ctx.epoch,
            category: category.clone(),
        });

        self.total_ratings += 1;
        self.total_score += u64::from(score);
        self.average_score = fixed_point_average(self.total_score, self.total_ratings);
        self.record_category_score(&category, score);
        self.version += 1;

        tracing::debug!(
            reputation_id = %self.id,
            reviewer = %ctx.caller,
            score,
            category = %category,
            average = self.average_score,
            "Rating added"
        );
        sink.emit(LedgerEvent::new(
            ctx,
            EventPayload::RatingAdded {
                reputation_id: self.id,
                reviewer: ctx.caller.clone(),
                score,
                category,
                new_average: self.average_score,
            },
        ));
        Ok(())
    }

    /// Revise the caller's first rating (oldest first) whose score is
    /// `old_score`. The comment is replaced only when `new_comment` is given;
    /// the original timestamp is kept.
    pub fn update_rating(
        &mut self,
        ctx: &CallContext,
        old_score: u8,
        new_score: u8,
        new_comment: Option<String>,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        validate_score(new_score)?;

        let index = self
            .ratings_history
            .iter()
            .position(|r| r.reviewer == ctx.caller && r.score == old_score)
            .ok_or_else(|| LedgerError::RatingNotFound {
                reviewer: ctx.caller.clone(),
                score: old_score,
            })?;

        let rating = &mut self.ratings_history[index];
        rating.score = new_score;
        if let Some(comment) = new_comment {
            rating.comment = Some(comment);
        }
        let category = rating.category.clone();

        // old_score is part of total_score, so this never underflows.
        self.total_score = self.total_score + u64::from(new_score) - u64::from(old_score);
        self.average_score = fixed_point_average(self.total_score, self.total_ratings);
        self.record_category_score(&category, new_score);
        self.version += 1;

        tracing::debug!(
            reputation_id = %self.id,
            reviewer = %ctx.caller,
            old_score,
            new_score,
            average = self.average_score,
            "Rating updated"
        );
        sink.emit(LedgerEvent::new(
            ctx,
            EventPayload::RatingUpdated {
                reputation_id: self.id,
                reviewer: ctx.caller.clone(),
                old_score,
                new_score,
                new_average: self.average_score,
            },
        ));
        Ok(())
    }

    /// Overwrite the category's score, or append it if unseen.
    fn record_category_score(&mut self, category: &str, score: u8) {
        match self
            .category_scores
            .iter_mut()
            .find(|c| c.category_name == category)
        {
            Some(existing) => existing.score = score,
            None => self.category_scores.push(CategoryScore {
                category_name: category.to_string(),
                score,
            }),
        }
    }

    // ── Reads ─────────────────────────────────────────────────

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn registration_ref(&self) -> ObjectId {
        self.registration_ref
    }

    pub fn agent_owner(&self) -> &Address {
        &self.agent_owner
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn stats(&self) -> ReputationStats {
        ReputationStats {
            total_ratings: self.total_ratings,
            total_score: self.total_score,
            average_score: self.average_score,
            version: self.version,
        }
    }

    /// The average split into `(whole, hundredths)`; 950 becomes `(9, 50)`.
    pub fn average_score(&self) -> (u64, u64) {
        (self.average_score / 100, self.average_score % 100)
    }

    pub fn category_scores(&self) -> &[CategoryScore] {
        &self.category_scores
    }

    pub fn category_score(&self, category: &str) -> Option<u8> {
        self.category_scores
            .iter()
            .find(|c| c.category_name == category)
            .map(|c| c.score)
    }

    /// Oldest first.
    pub fn ratings_history(&self) -> &VecDeque<Rating> {
        &self.ratings_history
    }

    /// The last `count` ratings, oldest first. Returns the whole history when
    /// `count` exceeds it.
    pub fn recent_ratings(&self, count: usize) -> Vec<&Rating> {
        let skip = self.ratings_history.len().saturating_sub(count);
        self.ratings_history.iter().skip(skip).collect()
    }

    /// Every retained rating by `reviewer`, in insertion order.
    pub fn reviewer_ratings(&self, reviewer: &Address) -> Vec<&Rating> {
        self.ratings_history
            .iter()
            .filter(|r| &r.reviewer == reviewer)
            .collect()
    }

    pub fn rating_count_for(&self, reviewer: &Address) -> usize {
        self.ratings_history
            .iter()
            .filter(|r| &r.reviewer == reviewer)
            .count()
    }
}
