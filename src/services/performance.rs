use serde::Serialize;

/// Performance tier assigned from completion rate and average quiz score,
/// both on a 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct PerformanceTier {
    pub(crate) label: &'static str,
    pub(crate) color: &'static str,
}

pub(crate) fn tier(completion_rate: f64, average_score: f64) -> PerformanceTier {
    if completion_rate >= 90.0 && average_score >= 85.0 {
        PerformanceTier { label: "excellent", color: "gold" }
    } else if completion_rate >= 75.0 && average_score >= 70.0 {
        PerformanceTier { label: "very_good", color: "blue" }
    } else if completion_rate >= 50.0 && average_score >= 60.0 {
        PerformanceTier { label: "good", color: "green" }
    } else if completion_rate >= 25.0 {
        PerformanceTier { label: "acceptable", color: "orange" }
    } else {
        PerformanceTier { label: "needs_improvement", color: "red" }
    }
}

/// Per-enrollment rating: completion weighted 0.6, quiz average 0.4.
pub(crate) fn enrollment_rating(completion_rate: f64, average_score: f64) -> i32 {
    (completion_rate * 0.6 + average_score * 0.4).round() as i32
}

/// Platform-wide rating: completion 0.3, quiz success 0.3, average score 0.2,
/// student activity 0.2.
pub(crate) fn platform_rating(
    completion_rate: f64,
    quiz_success_rate: f64,
    average_score: f64,
    activity_rate: f64,
) -> i32 {
    (completion_rate * 0.3 + quiz_success_rate * 0.3 + average_score * 0.2 + activity_rate * 0.2)
        .round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_thresholds() {
        assert_eq!(tier(90.0, 85.0).label, "excellent");
        assert_eq!(tier(89.9, 85.0).label, "very_good");
        assert_eq!(tier(90.0, 84.9).label, "very_good");
        assert_eq!(tier(75.0, 70.0).label, "very_good");
        assert_eq!(tier(50.0, 60.0).label, "good");
        assert_eq!(tier(50.0, 59.9).label, "acceptable");
        assert_eq!(tier(25.0, 0.0).label, "acceptable");
        assert_eq!(tier(24.9, 100.0).label, "needs_improvement");
    }

    #[test]
    fn tier_colors_match_labels() {
        assert_eq!(tier(95.0, 90.0).color, "gold");
        assert_eq!(tier(0.0, 0.0).color, "red");
    }

    #[test]
    fn enrollment_rating_weights() {
        assert_eq!(enrollment_rating(100.0, 100.0), 100);
        assert_eq!(enrollment_rating(100.0, 0.0), 60);
        assert_eq!(enrollment_rating(0.0, 100.0), 40);
        assert_eq!(enrollment_rating(50.0, 75.0), 60);
    }

    #[test]
    fn platform_rating_weights() {
        assert_eq!(platform_rating(100.0, 100.0, 100.0, 100.0), 100);
        assert_eq!(platform_rating(100.0, 0.0, 0.0, 0.0), 30);
        assert_eq!(platform_rating(0.0, 0.0, 100.0, 100.0), 40);
    }
}
