use std::time::{Duration, Instant};

/// How long a blocking fifo call may wait.
///
/// Replaces the signed-millisecond overload (`< 0` forever, `0` immediate, `> 0` bounded) with
/// three explicit cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Block until the operation can complete.
    Infinite,
    /// Block for at most this long.
    After(Duration),
    /// Never block; fail with a timeout if the operation cannot complete right away.
    Immediate,
}

impl Timeout {
    pub const fn from_millis(ms: u64) -> Self {
        Timeout::After(Duration::from_millis(ms))
    }

    /// Absolute deadline for a call starting at `now`, `None` meaning "no deadline".
    ///
    /// A zero `After` is the same as `Immediate`. A duration too large to represent as an
    /// `Instant` is treated as infinite.
    pub fn deadline(self, now: Instant) -> Option<Instant> {
        match self {
            Timeout::Infinite => None,
            Timeout::Immediate => Some(now),
            Timeout::After(d) => now.checked_add(d),
        }
    }
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Timeout::After(d)
    }
}

impl From<Option<Duration>> for Timeout {
    fn from(d: Option<Duration>) -> Self {
        d.map_or(Timeout::Infinite, Timeout::After)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_per_variant() {
        let now = Instant::now();
        assert_eq!(Timeout::Infinite.deadline(now), None);
        assert_eq!(Timeout::Immediate.deadline(now), Some(now));
        assert_eq!(
            Timeout::from_millis(50).deadline(now),
            Some(now + Duration::from_millis(50))
        );
        assert_eq!(Timeout::After(Duration::ZERO).deadline(now), Some(now));
    }

    #[test]
    fn huge_duration_saturates_to_no_deadline() {
        let now = Instant::now();
        assert_eq!(Timeout::After(Duration::MAX).deadline(now), None);
    }

    #[test]
    fn optional_duration_maps_none_to_infinite() {
        assert_eq!(Timeout::from(None), Timeout::Infinite);
        assert_eq!(
            Timeout::from(Some(Duration::from_secs(1))),
            Timeout::After(Duration::from_secs(1))
        );
    }
}
