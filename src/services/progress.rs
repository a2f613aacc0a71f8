/// Progress percentage over the totals snapshotted at enrollment time.
/// A course with no content reports 0, never a division error.
pub(crate) fn overall_progress(
    completed_videos: i32,
    completed_quizzes: i32,
    total_videos: i32,
    total_quizzes: i32,
) -> i32 {
    let total = total_videos + total_quizzes;
    if total <= 0 {
        return 0;
    }
    let completed = completed_videos + completed_quizzes;
    let percent = ((100.0 * completed as f64) / total as f64).round() as i32;
    percent.clamp(0, 100)
}

/// Completion requires both counters to meet their snapshot totals. An empty
/// course never auto-completes.
pub(crate) fn is_complete(
    completed_videos: i32,
    completed_quizzes: i32,
    total_videos: i32,
    total_quizzes: i32,
) -> bool {
    total_videos + total_quizzes > 0
        && completed_videos >= total_videos
        && completed_quizzes >= total_quizzes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_content_reports_zero_progress() {
        assert_eq!(overall_progress(0, 0, 0, 0), 0);
    }

    #[test]
    fn zero_content_never_completes() {
        assert!(!is_complete(0, 0, 0, 0));
    }

    #[test]
    fn progress_rounds_to_nearest_integer() {
        // 1 of 3 items: 33.33 -> 33
        assert_eq!(overall_progress(1, 0, 2, 1), 33);
        // 2 of 3 items: 66.67 -> 67
        assert_eq!(overall_progress(1, 1, 2, 1), 67);
    }

    #[test]
    fn progress_stays_within_bounds() {
        // completions past the snapshot (content removed later) cap at 100
        assert_eq!(overall_progress(5, 3, 4, 2), 100);
    }

    #[test]
    fn completion_requires_both_counters() {
        assert!(!is_complete(2, 0, 2, 1));
        assert!(!is_complete(1, 1, 2, 1));
        assert!(is_complete(2, 1, 2, 1));
    }

    #[test]
    fn videos_only_course_completes_on_videos() {
        assert!(is_complete(3, 0, 3, 0));
        assert_eq!(overall_progress(3, 0, 3, 0), 100);
    }
}
