//! Wall-clock snapshots.

use chrono::Timelike;
use chrono::offset::Local;

/// Hour, minute and second of the current day.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
    second: u8,
}

impl TimeOfDay {
    /// Create a new time, returning `None` for out of range fields.
    pub fn new(hour: u8, minute: u8, second: u8) -> Option<Self> {
        (hour < 24 && minute < 60 && second < 60).then_some(Self { hour, minute, second })
    }

    /// Snapshot of any [`Timelike`] value.
    ///
    /// Leap seconds are folded into the 59th second.
    pub fn from_timelike<T: Timelike>(time: &T) -> Self {
        let second = time.second().min(59) as u8;
        Self::new(time.hour() as u8, time.minute() as u8, second).unwrap_or_default()
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }
}

/// Source for the current time.
pub trait TimeSource {
    fn now(&self) -> TimeOfDay;
}

/// System clock in the local timezone.
#[derive(Copy, Clone, Default, Debug)]
pub struct LocalClock;

impl TimeSource for LocalClock {
    fn now(&self) -> TimeOfDay {
        TimeOfDay::from_timelike(&Local::now())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;

    #[test]
    fn rejects_out_of_range() {
        assert!(TimeOfDay::new(23, 59, 59).is_some());
        assert!(TimeOfDay::new(24, 0, 0).is_none());
        assert!(TimeOfDay::new(0, 60, 0).is_none());
        assert!(TimeOfDay::new(0, 0, 60).is_none());
    }

    #[test]
    fn from_naive_time() {
        let naive = NaiveTime::from_hms_opt(3, 15, 45).unwrap();
        let time = TimeOfDay::from_timelike(&naive);
        assert_eq!(time, TimeOfDay::new(3, 15, 45).unwrap());
    }

    #[test]
    fn leap_second_folds() {
        let naive = NaiveTime::from_hms_milli_opt(23, 59, 59, 1_500).unwrap();
        let time = TimeOfDay::from_timelike(&naive);
        assert_eq!(time.second(), 59);
    }

    #[test]
    fn local_clock_in_range() {
        let time = LocalClock.now();
        assert!(time.hour() < 24 && time.minute() < 60 && time.second() < 60);
    }
}
