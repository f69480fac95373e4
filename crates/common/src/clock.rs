//! 时钟抽象
//!
//! 所有过期计算通过注入的 Clock 读取时间，测试可以固定时间。

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// 时钟 trait
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 固定时钟（测试用）
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + duration;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_is_pinned() {
        let t0 = Utc::now();
        let clock = FixedClock::new(t0);

        assert_eq!(clock.now(), t0);
        assert_eq!(clock.now(), t0);
    }

    #[test]
    fn test_fixed_clock_advance() {
        let t0 = Utc::now();
        let clock = FixedClock::new(t0);

        clock.advance(Duration::minutes(61));
        assert_eq!(clock.now(), t0 + Duration::minutes(61));
    }
}
