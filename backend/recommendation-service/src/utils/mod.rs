/// Round to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Clamp a caller-supplied result limit to the engine maximum
pub fn clamp_limit(limit: usize) -> usize {
    limit.min(MAX_LIMIT)
}

pub const MAX_LIMIT: usize = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.625), 0.63);
        assert_eq!(round2(0.3333), 0.33);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(10), 10);
        assert_eq!(clamp_limit(1000), MAX_LIMIT);
    }
}
