//! Time-based typing animation.
//!
//! Progress is derived from elapsed wall-clock time rather than from the
//! number of frames, so a slow or janky frame rate only lowers the sampling
//! resolution, never the overall duration.

use std::time::Duration;

use super::model::TypingProgress;

/// Quadratic ease-in: slow start, accelerating toward the end.
pub fn ease_in_quad(t: f64) -> f64 {
    t * t
}

/// Advances a displayed-character count from `initial_length` to the total
/// over a fixed duration.
#[derive(Debug, Clone)]
pub struct TypingAnimator {
    total_length: usize,
    initial_length: usize,
    duration: Duration,
    displayed_length: usize,
    completed: bool,
}

impl TypingAnimator {
    /// Creates an animator for `total_length` characters.
    ///
    /// With `reduced_motion` the animator starts out complete.
    pub fn new(total_length: usize, duration: Duration, reduced_motion: bool) -> Self {
        Self::with_initial_length(total_length, 0, duration, reduced_motion)
    }

    /// Creates an animator that resumes from `initial_length` characters.
    pub fn with_initial_length(
        total_length: usize,
        initial_length: usize,
        duration: Duration,
        reduced_motion: bool,
    ) -> Self {
        let initial_length = initial_length.min(total_length);
        let mut animator = Self {
            total_length,
            initial_length,
            duration,
            displayed_length: initial_length,
            completed: false,
        };
        if reduced_motion {
            animator.finish();
        }
        animator
    }

    /// Samples the animation at `elapsed` since it started.
    ///
    /// Returns true exactly once: on the sample that completes the animation.
    pub fn sample(&mut self, elapsed: Duration) -> bool {
        if self.completed {
            return false;
        }

        let progress = if self.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
        };

        if progress >= 1.0 {
            self.finish();
            return true;
        }

        let remaining = (self.total_length - self.initial_length) as f64;
        let count = self.initial_length + (ease_in_quad(progress) * remaining).floor() as usize;
        self.displayed_length = self.displayed_length.max(count.min(self.total_length));
        false
    }

    /// Jumps straight to the end. Returns true if this call completed it.
    pub fn finish(&mut self) -> bool {
        if self.completed {
            return false;
        }
        self.displayed_length = self.total_length;
        self.completed = true;
        true
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn progress(&self) -> TypingProgress {
        TypingProgress {
            total_length: self.total_length,
            displayed_length: self.displayed_length,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// Prefix of `text` holding the first `chars` characters.
pub fn char_prefix(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_quadratic_progress() {
        let mut animator = TypingAnimator::new(100, ms(1000), false);

        animator.sample(ms(0));
        assert_eq!(animator.progress().displayed_length, 0);

        animator.sample(ms(500));
        assert_eq!(animator.progress().displayed_length, 25);

        animator.sample(ms(900));
        assert_eq!(animator.progress().displayed_length, 81);
    }

    #[test]
    fn test_completion_fires_once() {
        let mut animator = TypingAnimator::new(10, ms(100), false);

        assert!(!animator.sample(ms(50)));
        assert!(animator.sample(ms(100)));
        assert!(!animator.sample(ms(150)));
        assert!(animator.is_complete());
        assert_eq!(animator.progress().displayed_length, 10);
    }

    #[test]
    fn test_monotonic_across_uneven_frames() {
        let mut animator = TypingAnimator::new(523, ms(3500), false);
        let mut last = 0;
        let mut completions = 0;
        let mut t = 0;

        while t <= 4000 {
            if animator.sample(ms(t)) {
                completions += 1;
            }
            let shown = animator.progress().displayed_length;
            assert!(shown >= last);
            assert!(shown <= 523);
            last = shown;
            // Alternate short and long frames
            t += if t % 2 == 0 { 7 } else { 33 };
        }

        assert_eq!(completions, 1);
        assert_eq!(last, 523);
    }

    #[test]
    fn test_reduced_motion_starts_complete() {
        let mut animator = TypingAnimator::new(42, ms(3500), true);
        assert!(animator.is_complete());
        assert_eq!(animator.progress().displayed_length, 42);
        assert!(!animator.sample(ms(0)));
    }

    #[test]
    fn test_initial_length_is_respected_and_clamped() {
        let mut animator = TypingAnimator::with_initial_length(100, 20, ms(1000), false);
        animator.sample(ms(500));
        assert_eq!(animator.progress().displayed_length, 40);

        let clamped = TypingAnimator::with_initial_length(5, 50, ms(1000), false);
        assert_eq!(clamped.progress().displayed_length, 5);
    }

    #[test]
    fn test_zero_duration_completes_on_first_sample() {
        let mut animator = TypingAnimator::new(8, Duration::ZERO, false);
        assert!(animator.sample(Duration::ZERO));
        assert_eq!(animator.progress().displayed_length, 8);
    }

    #[test]
    fn test_char_prefix_respects_char_boundaries() {
        assert_eq!(char_prefix("₹90,000", 2), "₹9");
        assert_eq!(char_prefix("abc", 10), "abc");
        assert_eq!(char_prefix("abc", 0), "");
    }
}
