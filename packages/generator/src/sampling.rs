// ABOUTME: Random draws shared by every generator
// ABOUTME: All helpers take the caller's RNG explicitly; nothing touches thread-local randomness

use std::collections::HashSet;

use chrono::Duration;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Builder;

pub const AUTHORS: &[&str] = &[
    "dev1@example.com",
    "dev2@example.com",
    "dev3@example.com",
    "dev4@example.com",
    "dev5@example.com",
];

pub const REVIEWERS: &[&str] = &[
    "reviewer1@example.com",
    "reviewer2@example.com",
    "reviewer3@example.com",
];

/// Bernoulli draw; probabilities outside [0, 1] are clamped
pub fn chance<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> bool {
    rng.gen_bool(probability.clamp(0.0, 1.0))
}

/// Uniform pick from a non-empty slice
pub fn pick<'a, R: Rng + ?Sized, T>(rng: &mut R, items: &'a [T]) -> Option<&'a T> {
    items.choose(rng)
}

/// Weighted pick; `None` when the weights are empty or all zero
pub fn weighted<'a, R: Rng + ?Sized, T>(rng: &mut R, choices: &'a [(T, f64)]) -> Option<&'a T> {
    let dist = WeightedIndex::new(choices.iter().map(|(_, w)| *w)).ok()?;
    Some(&choices[dist.sample(rng)].0)
}

pub fn minutes<R: Rng + ?Sized>(rng: &mut R, low: i64, high: i64) -> Duration {
    Duration::minutes(rng.gen_range(low..=high))
}

pub fn hours<R: Rng + ?Sized>(rng: &mut R, low: i64, high: i64) -> Duration {
    Duration::hours(rng.gen_range(low..=high))
}

pub fn days<R: Rng + ?Sized>(rng: &mut R, low: i64, high: i64) -> Duration {
    Duration::days(rng.gen_range(low..=high))
}

pub fn author<R: Rng + ?Sized>(rng: &mut R) -> String {
    pick(rng, AUTHORS).copied().unwrap_or(AUTHORS[0]).to_string()
}

pub fn reviewer<R: Rng + ?Sized>(rng: &mut R) -> String {
    pick(rng, REVIEWERS).copied().unwrap_or(REVIEWERS[0]).to_string()
}

/// 40-character hex digest shaped like a git object id
pub fn commit_hash<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{:032x}{:08x}", rng.gen::<u128>(), rng.gen::<u32>())
}

/// Issues `{prefix}{hex8}` identifiers that are unique for the lifetime of the mint
#[derive(Debug, Default)]
pub struct IdMint {
    issued: HashSet<String>,
}

impl IdMint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hex<R: Rng + ?Sized>(&mut self, rng: &mut R, prefix: &str) -> String {
        loop {
            let uuid = Builder::from_random_bytes(rng.gen()).into_uuid();
            let simple = uuid.simple().to_string();
            let id = format!("{}{}", prefix, &simple[..8]);
            if self.issued.insert(id.clone()) {
                return id;
            }
        }
    }

    pub fn issued(&self) -> usize {
        self.issued.len()
    }
}
