//! Current network epoch, used to check token lifetimes.
use chrono::{DateTime, Utc};

pub trait EpochSource: Send + Sync + 'static {
    fn current_epoch(&self) -> u64;
}

/// Epoch derived from wall-clock time: epochs of fixed length counted from
/// `genesis`. Before genesis the epoch is 0.
#[derive(Debug, Clone, Copy)]
pub struct ClockEpoch {
    genesis: DateTime<Utc>,
    duration_seconds: u64,
}

impl ClockEpoch {
    pub fn new(genesis: DateTime<Utc>, duration_seconds: u64) -> Self {
        Self {
            genesis,
            duration_seconds: duration_seconds.max(1),
        }
    }

    pub fn epoch_at(&self, at: DateTime<Utc>) -> u64 {
        let elapsed = (at - self.genesis).num_seconds();
        u64::try_from(elapsed).map_or(0, |secs| secs / self.duration_seconds)
    }
}

impl EpochSource for ClockEpoch {
    fn current_epoch(&self) -> u64 {
        self.epoch_at(Utc::now())
    }
}

/// Constant epoch, for tests and offline tools.
#[derive(Debug, Clone, Copy)]
pub struct FixedEpoch(pub u64);

impl EpochSource for FixedEpoch {
    fn current_epoch(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn counts_whole_epochs_since_genesis() {
        let genesis = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = ClockEpoch::new(genesis, 3600);

        assert_eq!(clock.epoch_at(genesis), 0);
        assert_eq!(clock.epoch_at(genesis + chrono::Duration::seconds(3599)), 0);
        assert_eq!(clock.epoch_at(genesis + chrono::Duration::hours(5)), 5);
        assert_eq!(clock.epoch_at(genesis - chrono::Duration::hours(1)), 0);
    }

    #[test]
    fn zero_duration_is_clamped() {
        let genesis = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = ClockEpoch::new(genesis, 0);
        assert_eq!(clock.epoch_at(genesis + chrono::Duration::seconds(3)), 3);
    }
}
