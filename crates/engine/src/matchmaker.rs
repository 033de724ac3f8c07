//! Heuristic tutor ranking.
//!
//! The score is not a learned model: a fixed base plus boosts for rating,
//! experience and verification, capped at 100.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{Category, Tutor};

pub const BASE_SCORE: f64 = 70.0;
pub const MAX_SCORE: f64 = 100.0;
pub const MAX_RECOMMENDATIONS: usize = 10;

/// Free-text and structured filters for a recommendation request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchQuery {
    pub query: Option<String>,
    pub category: Option<Category>,
    pub skills: Vec<String>,
}

impl MatchQuery {
    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    #[must_use]
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn skill(mut self, skill: impl Into<String>) -> Self {
        self.skills.push(skill.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub tutor: Tutor,
    pub match_score: u8,
    pub reason: String,
}

/// Score a tutor in `[0, 100]`.
pub fn match_score(tutor: &Tutor) -> u8 {
    let mut score = BASE_SCORE;
    score += tutor.rating.average * 5.0;
    score += (tutor.total_sessions as f64 / 10.0).min(10.0);
    if tutor.is_verified {
        score += 5.0;
    }
    score.round().clamp(0.0, MAX_SCORE) as u8
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Case-insensitive match of `needle` against expertise names or the bio.
pub fn text_matches(tutor: &Tutor, needle: &str) -> bool {
    let needle = needle.trim();
    if needle.is_empty() {
        return true;
    }
    tutor.expertise.iter().any(|e| contains_ci(&e.name, needle)) || contains_ci(&tutor.bio, needle)
}

/// Whether `tutor` is a candidate for `query`.
pub fn is_candidate(tutor: &Tutor, query: &MatchQuery) -> bool {
    if !tutor.is_active || !tutor.availability.is_available {
        return false;
    }
    if let Some(category) = query.category
        && !tutor.expertise.iter().any(|e| e.category == category)
    {
        return false;
    }
    let skills: Vec<&str> = query
        .skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if !skills.is_empty()
        && !skills
            .iter()
            .any(|skill| tutor.expertise.iter().any(|e| contains_ci(&e.name, skill)))
    {
        return false;
    }
    match query.query.as_deref() {
        Some(q) => text_matches(tutor, q),
        None => true,
    }
}

/// Best-first ordering used before scoring: rating, then sessions taught.
pub fn by_reputation(a: &Tutor, b: &Tutor) -> Ordering {
    b.rating
        .average
        .total_cmp(&a.rating.average)
        .then_with(|| b.total_sessions.cmp(&a.total_sessions))
}

/// Filter, pre-rank, limit and score `tutors` for `query`.
pub fn recommend(tutors: Vec<Tutor>, query: &MatchQuery) -> Vec<Recommendation> {
    let mut candidates: Vec<Tutor> = tutors
        .into_iter()
        .filter(|t| is_candidate(t, query))
        .collect();
    candidates.sort_by(by_reputation);
    candidates.truncate(MAX_RECOMMENDATIONS);

    let mut recommendations: Vec<Recommendation> = candidates
        .into_iter()
        .map(|tutor| {
            let reason = format!(
                "Highly rated {} with {} completed sessions",
                tutor.primary_skill().unwrap_or("tutor"),
                tutor.total_sessions
            );
            Recommendation {
                match_score: match_score(&tutor),
                tutor,
                reason,
            }
        })
        .collect();
    recommendations.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    recommendations
}
