//! Filter, score and rank catalog records for discovery.
//!
//! The pipeline is deterministic: for a given catalog snapshot and criteria
//! the output is fully defined, with catalog iteration order as the final
//! tie-break between records of equal score and equal tier.

use crate::domain::model::{
    QueryCriteria, RankedResult, ScoredService, ServiceRecord, MAX_RESULTS,
};
use std::cmp::Reverse;

const NAME_MATCH_POINTS: u32 = 3;
const DESCRIPTION_MATCH_POINTS: u32 = 2;
const CAPABILITY_MATCH_POINTS: u32 = 5;

/// Keep records that satisfy every active criterion (price, quality, capability).
pub fn filter(records: Vec<ServiceRecord>, criteria: &QueryCriteria) -> Vec<ServiceRecord> {
    let capability = criteria.normalized_capability();

    records
        .into_iter()
        .filter(|record| record.effective_price() <= criteria.max_price_usd)
        .filter(|record| record.quality_tier.meets(criteria.min_quality))
        .filter(|record| match capability {
            // tag 與 category 視為同一種分類軸
            Some(cap) => record.has_tag(cap) || record.category.as_deref() == Some(cap),
            None => true,
        })
        .collect()
}

/// Case-insensitive substring match of `query` against name or description.
/// A blank query matches everything.
pub fn matches_query(record: &ServiceRecord, query: &str) -> bool {
    let q = query.trim().to_lowercase();
    q.is_empty()
        || record.name.to_lowercase().contains(&q)
        || record.description.to_lowercase().contains(&q)
}

/// Relevance of `record`; the query is compared case-insensitively.
pub fn score(record: &ServiceRecord, query: Option<&str>, capability: Option<&str>) -> u32 {
    let mut points = 0;

    let query = query.map(|q| q.trim().to_lowercase()).filter(|q| !q.is_empty());
    if let Some(q) = query.as_deref() {
        if record.name.to_lowercase().contains(q) {
            points += NAME_MATCH_POINTS;
        }
        if record.description.to_lowercase().contains(q) {
            points += DESCRIPTION_MATCH_POINTS;
        }
    }

    if let Some(cap) = capability {
        if record.has_tag(cap) {
            points += CAPABILITY_MATCH_POINTS;
        }
    }

    points
}

/// Order by score descending then quality rank ascending and keep the top
/// [`MAX_RESULTS`]. `sort_by` is stable, so input order settles full ties.
pub fn rank(mut scored: Vec<ScoredService>) -> RankedResult {
    let total_matches = scored.len();
    scored.sort_by_key(|s| (Reverse(s.score), s.record.quality_tier.rank()));
    scored.truncate(MAX_RESULTS);

    RankedResult {
        entries: scored,
        total_matches,
    }
}

/// Full discovery path: filter, drop records the query text does not
/// match, score, then rank. The capability bonus only orders results.
pub fn discover(records: Vec<ServiceRecord>, criteria: &QueryCriteria) -> RankedResult {
    let query = criteria.normalized_query();
    let capability = criteria.normalized_capability().map(str::to_string);

    let scored: Vec<ScoredService> = filter(records, criteria)
        .into_iter()
        .filter(|record| query.as_deref().map_or(true, |q| matches_query(record, q)))
        .map(|record| {
            let score = score(&record, query.as_deref(), capability.as_deref());
            ScoredService { record, score }
        })
        .collect();

    tracing::debug!(
        "Ranking {} candidate services (query={:?}, capability={:?})",
        scored.len(),
        query,
        capability
    );

    rank(scored)
}
