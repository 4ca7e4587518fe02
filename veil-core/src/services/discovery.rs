use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

use super::scoring::{self, ScoreInput};

pub const PAGE_SIZE: usize = 9;
/// Minimum relevance threshold; lower-scoring candidates are dropped.
pub const MIN_SCORE: f64 = 10.0;
pub const MIN_AGE: i32 = 18;
pub const COMPLETION_THRESHOLD: i32 = 80;

/// Latest birth date that still makes someone 18 today. When today is
/// Feb 29 the anniversary 18 years back does not exist; Feb 28 is used.
pub fn adult_birth_cutoff(today: NaiveDate) -> NaiveDate {
    today.with_year(today.year() - MIN_AGE).unwrap_or_else(|| {
        NaiveDate::from_ymd_opt(today.year() - MIN_AGE, 2, 28)
            .expect("Feb 28 exists in every year")
    })
}

pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

pub fn is_adult(birth_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    birth_date
        .map(|dob| age_on(dob, today) >= MIN_AGE)
        .unwrap_or(false)
}

/// Binary-gender viewers are restricted to the opposite binary gender;
/// anyone else sees the full pool.
pub fn target_gender(viewer_gender: Option<&str>) -> Option<&'static str> {
    match viewer_gender {
        Some("M") => Some("F"),
        Some("F") => Some("M"),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct CandidateInput {
    pub id: Uuid,
    pub score_input: ScoreInput,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub id: Uuid,
    pub score: f64,
    pub distance_km: Option<f64>,
}

/// Score an already-filtered candidate set from the viewer's perspective
/// and order it: score descending, id ascending on ties. The (score, id)
/// key is a total order, so pages never duplicate or skip a candidate.
pub fn rank(viewer: &ScoreInput, mut candidates: Vec<CandidateInput>) -> Vec<RankedCandidate> {
    // Deterministic iteration regardless of how storage returned the rows.
    candidates.sort_by_key(|c| c.id);

    let mut ranked: Vec<RankedCandidate> = candidates
        .into_iter()
        .map(|c| {
            let distance = scoring::distance_km(viewer.location, c.score_input.location)
                .map(scoring::round1);
            RankedCandidate {
                id: c.id,
                score: scoring::compatibility_score(viewer, &c.score_input),
                distance_km: distance,
            }
        })
        .filter(|r| r.score >= MIN_SCORE)
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    ranked
}

/// Fixed-size page over the ranked list (1-based; page 0 is treated as 1).
/// Returns the slice plus whether a further page exists.
pub fn page(ranked: &[RankedCandidate], page_number: u32) -> (Vec<RankedCandidate>, bool) {
    let page_number = page_number.max(1) as usize;
    let start = (page_number - 1) * PAGE_SIZE;
    let items: Vec<RankedCandidate> = ranked.iter().skip(start).take(PAGE_SIZE).cloned().collect();
    let has_next = ranked.len() > start + PAGE_SIZE;
    (items, has_next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::scoring::GeoPoint;
    use std::collections::HashSet;

    fn uid(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn candidate(n: u128, interests: &[Uuid], location: Option<GeoPoint>) -> CandidateInput {
        CandidateInput {
            id: uid(n),
            score_input: ScoreInput {
                interests: interests.iter().copied().collect(),
                location,
            },
        }
    }

    #[test]
    fn age_boundaries() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let eighteen_today = NaiveDate::from_ymd_opt(2007, 6, 15).unwrap();
        let eighteen_tomorrow = NaiveDate::from_ymd_opt(2007, 6, 16).unwrap();

        assert_eq!(age_on(eighteen_today, today), 18);
        assert_eq!(age_on(eighteen_tomorrow, today), 17);
        assert!(is_adult(Some(eighteen_today), today));
        assert!(!is_adult(Some(eighteen_tomorrow), today));
        assert!(!is_adult(None, today));
    }

    #[test]
    fn cutoff_matches_age_gate() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let cutoff = adult_birth_cutoff(today);
        assert_eq!(cutoff, NaiveDate::from_ymd_opt(2007, 6, 15).unwrap());
        assert!(is_adult(Some(cutoff), today));
        assert!(!is_adult(cutoff.succ_opt(), today));
    }

    #[test]
    fn cutoff_handles_leap_day() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            adult_birth_cutoff(today),
            NaiveDate::from_ymd_opt(2006, 2, 28).unwrap()
        );
    }

    #[test]
    fn gender_restriction_is_binary_only() {
        assert_eq!(target_gender(Some("M")), Some("F"));
        assert_eq!(target_gender(Some("F")), Some("M"));
        assert_eq!(target_gender(Some("X")), None);
        assert_eq!(target_gender(None), None);
    }

    #[test]
    fn rank_drops_irrelevant_candidates() {
        let shared: Vec<Uuid> = (100..103).map(uid).collect();
        let here = GeoPoint { latitude: 48.85, longitude: 2.35 };
        let far = GeoPoint { latitude: 40.71, longitude: -74.0 };

        let viewer = ScoreInput {
            interests: shared.iter().copied().collect(),
            location: Some(here),
        };

        let ranked = rank(
            &viewer,
            vec![
                // No shared interests, ~5800 km away: location 0, interest 0.
                candidate(1, &[uid(999)], Some(far)),
                // All interests shared, same spot: 70 + 30.
                candidate(2, &shared, Some(here)),
            ],
        );

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, uid(2));
        assert_eq!(ranked[0].score, 100.0);
        assert_eq!(ranked[0].distance_km, Some(0.0));
    }

    #[test]
    fn rank_reports_distance_only_when_both_located() {
        let viewer = ScoreInput {
            interests: HashSet::new(),
            location: Some(GeoPoint { latitude: 48.85, longitude: 2.35 }),
        };
        let ranked = rank(&viewer, vec![candidate(1, &[], None)]);
        assert_eq!(ranked[0].distance_km, None);
        // Neutral location score keeps the candidate above threshold.
        assert_eq!(ranked[0].score, 15.0);
    }

    #[test]
    fn ties_break_by_id_ascending() {
        let viewer = ScoreInput::default();
        let ranked = rank(
            &viewer,
            vec![candidate(3, &[], None), candidate(1, &[], None), candidate(2, &[], None)],
        );
        let ids: Vec<Uuid> = ranked.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![uid(1), uid(2), uid(3)]);
    }

    #[test]
    fn pagination_is_disjoint_and_stable_under_ties() {
        // 20 candidates, all scoring the same flat 15.
        let viewer = ScoreInput::default();
        let ranked = rank(
            &viewer,
            (1..=20).map(|n| candidate(n, &[], None)).collect(),
        );

        let (page1, more1) = page(&ranked, 1);
        let (page2, more2) = page(&ranked, 2);
        let (page3, more3) = page(&ranked, 3);

        assert_eq!(page1.len(), PAGE_SIZE);
        assert_eq!(page2.len(), PAGE_SIZE);
        assert_eq!(page3.len(), 2);
        assert!(more1);
        assert!(more2);
        assert!(!more3);

        let mut seen: Vec<Uuid> = Vec::new();
        seen.extend(page1.iter().map(|r| r.id));
        seen.extend(page2.iter().map(|r| r.id));
        seen.extend(page3.iter().map(|r| r.id));

        let full: Vec<Uuid> = ranked.iter().map(|r| r.id).collect();
        assert_eq!(seen, full);
    }

    #[test]
    fn out_of_range_page_is_empty() {
        let viewer = ScoreInput::default();
        let ranked = rank(&viewer, vec![candidate(1, &[], None)]);
        let (items, has_next) = page(&ranked, 5);
        assert!(items.is_empty());
        assert!(!has_next);
    }

    #[test]
    fn page_zero_is_treated_as_first() {
        let viewer = ScoreInput::default();
        let ranked = rank(&viewer, vec![candidate(1, &[], None)]);
        let (items, _) = page(&ranked, 0);
        assert_eq!(items.len(), 1);
    }
}
