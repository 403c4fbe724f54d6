//! Hour-of-day activation window.

/// Hours during which automatic activation is permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub enabled: bool,
    pub invert: bool,
    pub start: u8,
    pub end: u8,
}

/// Outcome of evaluating a [`TimeWindow`] against the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowCheck {
    Disabled,
    Inside,
    Outside,
    /// No wall-clock time; activation is permitted.
    ClockUnavailable,
}

impl WindowCheck {
    pub fn permits(self) -> bool {
        !matches!(self, WindowCheck::Outside)
    }
}

impl TimeWindow {
    /// Whether `hour` falls in `[start, end)`, wrapping past midnight when
    /// `start > end`. Equal bounds cover the whole day. Ignores `invert`.
    pub fn covers(&self, hour: u8) -> bool {
        use std::cmp::Ordering;
        match self.start.cmp(&self.end) {
            Ordering::Less => self.start <= hour && hour < self.end,
            Ordering::Greater => hour >= self.start || hour < self.end,
            Ordering::Equal => true,
        }
    }

    /// Evaluate the window for the current hour, if known.
    pub fn check(&self, hour: Option<u8>) -> WindowCheck {
        if !self.enabled {
            return WindowCheck::Disabled;
        }
        let Some(hour) = hour else {
            return WindowCheck::ClockUnavailable;
        };
        if self.covers(hour) != self.invert {
            WindowCheck::Inside
        } else {
            WindowCheck::Outside
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn window(start: u8, end: u8, invert: bool) -> TimeWindow {
        TimeWindow {
            enabled: true,
            invert,
            start,
            end,
        }
    }

    #[test]
    fn test_overnight_window() {
        let w = window(22, 6, false);
        assert_eq!(w.check(Some(23)), WindowCheck::Inside);
        assert_eq!(w.check(Some(0)), WindowCheck::Inside);
        assert_eq!(w.check(Some(5)), WindowCheck::Inside);
        assert_eq!(w.check(Some(6)), WindowCheck::Outside);
        assert_eq!(w.check(Some(10)), WindowCheck::Outside);
        assert_eq!(w.check(Some(22)), WindowCheck::Inside);
    }

    #[test]
    fn test_overnight_window_inverted() {
        let w = window(22, 6, true);
        assert_eq!(w.check(Some(23)), WindowCheck::Outside);
        assert_eq!(w.check(Some(10)), WindowCheck::Inside);
    }

    #[test]
    fn test_daytime_window_is_half_open() {
        let w = window(8, 17, false);
        assert!(w.check(Some(8)).permits());
        assert!(w.check(Some(16)).permits());
        assert!(!w.check(Some(17)).permits());
        assert!(!w.check(Some(7)).permits());
    }

    #[test]
    fn test_disabled_window_always_permits() {
        let w = TimeWindow {
            enabled: false,
            ..window(8, 9, false)
        };
        assert_eq!(w.check(Some(20)), WindowCheck::Disabled);
        assert!(w.check(None).permits());
    }

    #[test]
    fn test_missing_clock_permits_even_inverted() {
        assert_eq!(window(22, 6, false).check(None), WindowCheck::ClockUnavailable);
        assert!(window(22, 6, true).check(None).permits());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_invert_is_exact_negation(start in 0u8..24, end in 0u8..24, hour in 0u8..24) {
            let plain = window(start, end, false).check(Some(hour)).permits();
            let inverted = window(start, end, true).check(Some(hour)).permits();
            prop_assert_ne!(plain, inverted);
        }

        #[test]
        fn prop_equal_bounds_cover_whole_day(bound in 0u8..24, hour in 0u8..24) {
            prop_assert!(window(bound, bound, false).covers(hour));
        }

        #[test]
        fn prop_wrapping_window_is_complement_of_day_range(
            start in 1u8..24, end in 0u8..23, hour in 0u8..24,
        ) {
            prop_assume!(start > end);
            // Overnight [start, end) is everything outside daytime [end, start).
            let overnight = window(start, end, false).covers(hour);
            let daytime = window(end, start, false).covers(hour);
            prop_assert_ne!(overnight, daytime);
        }
    }
}
