//! Shared constants for the adaptive practice algorithms.

/// Lowest question difficulty.
pub const MIN_DIFFICULTY: u8 = 1;

/// Highest question difficulty.
pub const MAX_DIFFICULTY: u8 = 10;

/// Bounded size of the per-skill rolling attempt window.
pub const ROLLING_WINDOW_SIZE: usize = 10;

/// Clamp an arbitrary difficulty value into the valid 1-10 range.
pub fn clamp_difficulty(value: i32) -> u8 {
    value.clamp(MIN_DIFFICULTY as i32, MAX_DIFFICULTY as i32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_difficulty_bounds() {
        assert_eq!(clamp_difficulty(0), 1);
        assert_eq!(clamp_difficulty(-3), 1);
        assert_eq!(clamp_difficulty(5), 5);
        assert_eq!(clamp_difficulty(11), 10);
        assert_eq!(clamp_difficulty(100), 10);
    }
}
