use std::collections::HashSet;

use uuid::Uuid;

const EARTH_RADIUS_KM: f64 = 6371.0;

const INTEREST_WEIGHT: f64 = 70.0;
const LOCATION_WEIGHT: f64 = 30.0;
// Applied when either side has no coordinates.
const LOCATION_NEUTRAL: f64 = 15.0;
const KM_PENALTY: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// One side of a compatibility comparison: interest-tag ids plus an
/// optional location.
#[derive(Debug, Clone, Default)]
pub struct ScoreInput {
    pub interests: HashSet<Uuid>,
    pub location: Option<GeoPoint>,
}

fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Great-circle distance in km; None when either point is missing.
pub fn distance_km(from: Option<GeoPoint>, to: Option<GeoPoint>) -> Option<f64> {
    match (from, to) {
        (Some(a), Some(b)) => Some(haversine_km(a.latitude, a.longitude, b.latitude, b.longitude)),
        _ => None,
    }
}

/// Location contribution: decays with distance, floors at 0, and falls back
/// to a neutral midpoint when distance is unknown.
pub fn location_score(distance: Option<f64>) -> f64 {
    match distance {
        Some(km) => (LOCATION_WEIGHT - km * KM_PENALTY).max(0.0),
        None => LOCATION_NEUTRAL,
    }
}

/// Compatibility score in [0, 100] from `a`'s perspective.
///
/// The interest denominator counts only `a`'s interests, so the score is
/// not symmetric when the two sides have different interest counts.
pub fn compatibility_score(a: &ScoreInput, b: &ScoreInput) -> f64 {
    let shared = a.interests.intersection(&b.interests).count();
    let interest_score = (shared as f64 / a.interests.len().max(1) as f64) * INTEREST_WEIGHT;
    let loc_score = location_score(distance_km(a.location, b.location));

    round2((interest_score + loc_score).min(100.0))
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARIS: GeoPoint = GeoPoint { latitude: 48.8566, longitude: 2.3522 };
    const LONDON: GeoPoint = GeoPoint { latitude: 51.5074, longitude: -0.1278 };

    fn tags(n: usize) -> Vec<Uuid> {
        (0..n).map(|i| Uuid::from_u128(i as u128 + 1)).collect()
    }

    #[test]
    fn distance_is_symmetric_and_plausible() {
        let d1 = distance_km(Some(PARIS), Some(LONDON)).unwrap();
        let d2 = distance_km(Some(LONDON), Some(PARIS)).unwrap();
        assert!((d1 - d2).abs() < 1e-9);
        // Paris-London is roughly 344 km as the crow flies.
        assert!((d1 - 344.0).abs() < 10.0, "got {d1}");
    }

    #[test]
    fn distance_requires_both_points() {
        assert_eq!(distance_km(None, Some(PARIS)), None);
        assert_eq!(distance_km(Some(PARIS), None), None);
        assert_eq!(distance_km(None, None), None);
    }

    #[test]
    fn zero_distance_is_zero() {
        let d = distance_km(Some(PARIS), Some(PARIS)).unwrap();
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn location_score_decays_and_floors() {
        assert_eq!(location_score(Some(0.0)), 30.0);
        assert_eq!(location_score(Some(50.0)), 15.0);
        assert_eq!(location_score(Some(100.0)), 0.0);
        assert_eq!(location_score(Some(500.0)), 0.0);
        assert_eq!(location_score(None), 15.0);
    }

    #[test]
    fn worked_example_from_reference() {
        // A has {x, y, z}, B has {y, z}: shared = 2, |A| = 3, no coordinates.
        let t = tags(3);
        let a = ScoreInput {
            interests: t.iter().copied().collect(),
            location: None,
        };
        let b = ScoreInput {
            interests: t[1..].iter().copied().collect(),
            location: None,
        };
        assert_eq!(compatibility_score(&a, &b), 61.67);
    }

    #[test]
    fn score_is_asymmetric_when_interest_counts_differ() {
        let t = tags(3);
        let a = ScoreInput {
            interests: t.iter().copied().collect(),
            location: None,
        };
        let b = ScoreInput {
            interests: t[1..].iter().copied().collect(),
            location: None,
        };
        // From B's side both shared tags cover B's whole set.
        assert_eq!(compatibility_score(&b, &a), 85.0);
        assert_ne!(compatibility_score(&a, &b), compatibility_score(&b, &a));
    }

    #[test]
    fn no_interests_scores_only_location() {
        let a = ScoreInput::default();
        let b = ScoreInput {
            interests: tags(2).into_iter().collect(),
            location: None,
        };
        assert_eq!(compatibility_score(&a, &b), 15.0);
    }

    #[test]
    fn identical_profiles_hit_the_cap() {
        let a = ScoreInput {
            interests: tags(4).into_iter().collect(),
            location: Some(PARIS),
        };
        assert_eq!(compatibility_score(&a, &a.clone()), 100.0);
    }
}
