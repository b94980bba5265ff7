//! Reviewer selection over a candidate pool.
//!
//! Selection is uniform random without replacement: every candidate is
//! equally likely to land in any output slot. The random source is injected
//! so tests can pin outcomes with a seed.

use crate::review::domain::{User, UserId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Picks reviewers from a pool of eligible users.
pub trait ReviewerSelector: Send + Sync {
    /// Returns at most `count` distinct user IDs drawn from `candidates`.
    ///
    /// An empty pool yields an empty selection.
    fn select(&self, candidates: &[User], count: usize) -> Vec<UserId>;
}

/// Shuffles the distinct candidates and keeps the first `count`.
pub fn select_reviewers<R>(candidates: &[User], count: usize, rng: &mut R) -> Vec<UserId>
where
    R: Rng + ?Sized,
{
    let mut seen = HashSet::with_capacity(candidates.len());
    let mut pool: Vec<&UserId> = candidates
        .iter()
        .map(User::user_id)
        .filter(|user_id| seen.insert(*user_id))
        .collect();
    let amount = count.min(pool.len());
    let (chosen, _) = pool.partial_shuffle(rng, amount);
    chosen.iter().map(|user_id| (*user_id).clone()).collect()
}

/// [`ReviewerSelector`] backed by a standard RNG.
#[derive(Debug)]
pub struct RandomReviewerSelector {
    rng: Mutex<StdRng>,
}

impl RandomReviewerSelector {
    /// Creates a selector seeded from the operating system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Creates a selector with a fixed seed for reproducible picks.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomReviewerSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewerSelector for RandomReviewerSelector {
    fn select(&self, candidates: &[User], count: usize) -> Vec<UserId> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        select_reviewers(candidates, count, &mut *rng)
    }
}
