use std::time::Duration;
use tokio::time::Instant;

/// Token bucket applied to inbound client messages.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    tokens: u32,
    max_tokens: u32,
    refill_rate: Duration,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new() -> Self {
        // 30 message burst, one token back every 500ms
        Self::new_with_limits(30, Duration::from_millis(500))
    }

    pub fn new_with_limits(max_tokens: u32, refill_rate: Duration) -> Self {
        Self {
            tokens: max_tokens,
            max_tokens,
            refill_rate: refill_rate.max(Duration::from_millis(1)),
            last_refill: Instant::now(),
        }
    }

    pub fn check_rate_limit(&mut self) -> bool {
        self.refill_tokens();

        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    fn refill_tokens(&mut self) {
        let elapsed = self.last_refill.elapsed();
        let earned = elapsed.as_millis() / self.refill_rate.as_millis();
        if earned == 0 {
            return;
        }

        let earned = u32::try_from(earned).unwrap_or(u32::MAX);
        self.tokens = self.tokens.saturating_add(earned).min(self.max_tokens);
        if self.tokens == self.max_tokens {
            self.last_refill = Instant::now();
        } else {
            // keep the fractional remainder so refills don't drift
            self.last_refill += self.refill_rate * earned;
        }
    }

    pub fn remaining_tokens(&mut self) -> u32 {
        self.refill_tokens();
        self.tokens
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_bucket_drains_and_refills() {
        let mut limiter = RateLimiter::new_with_limits(3, Duration::from_secs(1));

        assert!(limiter.check_rate_limit());
        assert!(limiter.check_rate_limit());
        assert!(limiter.check_rate_limit());
        assert!(!limiter.check_rate_limit());

        tokio::time::advance(Duration::from_millis(2500)).await;
        assert_eq!(limiter.remaining_tokens(), 2);

        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(limiter.remaining_tokens(), 3);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(limiter.remaining_tokens(), 3);
    }

    #[test]
    fn test_zero_refill_rate_is_clamped() {
        let mut limiter = RateLimiter::new_with_limits(1, Duration::ZERO);
        assert!(limiter.check_rate_limit());
        assert!(limiter.remaining_tokens() <= 1);
    }
}
