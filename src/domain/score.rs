use chrono::{DateTime, Utc};

const GRAVITY: f64 = 1.8;
const AGE_OFFSET_HOURS: f64 = 2.0;

/// Time-decayed popularity: `(count - 1) / (age_hours + 2)^1.8`.
///
/// `count` is the single engagement metric of the item's source. Counts of
/// zero or less, and any non-finite or negative result, score 0.
pub fn popularity_score(count: i64, created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    if count <= 0 {
        return 0.0;
    }

    let age_seconds = (now - created_at).num_seconds().max(0) as f64;
    let age_hours = age_seconds / 3600.0;

    let score = (count - 1) as f64 / (age_hours + AGE_OFFSET_HOURS).powf(GRAVITY);
    if score.is_finite() && score >= 0.0 {
        score
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_non_positive_count_scores_zero() {
        for count in [-5, -1, 0] {
            assert_eq!(popularity_score(count, now(), now()), 0.0);
        }
    }

    #[test]
    fn test_single_engagement_scores_zero_at_any_age() {
        for hours in [0, 1, 5, 48, 1000] {
            let created = now() - Duration::hours(hours);
            assert_eq!(popularity_score(1, created, now()), 0.0);
        }
    }

    #[test]
    fn test_reference_values() {
        let fresh = popularity_score(10, now(), now());
        assert!((fresh - 2.5852).abs() < 0.01, "got {fresh}");

        let day_old = popularity_score(10, now() - Duration::hours(22), now());
        assert!((day_old - 0.0296).abs() < 0.005, "got {day_old}");
    }

    #[test]
    fn test_decays_monotonically_with_age() {
        let mut previous = f64::INFINITY;
        for hours in 0..72 {
            let score = popularity_score(50, now() - Duration::hours(hours), now());
            assert!(score < previous, "score did not decay at {hours}h");
            previous = score;
        }
    }

    #[test]
    fn test_future_timestamps_count_as_zero_age() {
        let future = now() + Duration::hours(3);
        assert_eq!(popularity_score(10, future, now()), popularity_score(10, now(), now()));
    }
}
