use crate::{RecorderError, RecorderResult};
use std::time::Duration;

/// Fixed-count, fixed-interval sampling plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSchedule {
    duration: Duration,
    frame_count: u32,
}

impl SampleSchedule {
    pub fn new(duration: Duration, frame_count: u32) -> RecorderResult<Self> {
        if frame_count == 0 {
            return Err(RecorderError::InvalidConfig(
                "frame count must be positive".to_string(),
            ));
        }

        if duration / frame_count == Duration::ZERO {
            return Err(RecorderError::InvalidConfig(format!(
                "sample interval is zero ({duration:?} / {frame_count})"
            )));
        }

        Ok(Self {
            duration,
            frame_count,
        })
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn interval(&self) -> Duration {
        self.duration / self.frame_count
    }

    /// Percentage after `done` ticks, `0..=100`.
    pub fn progress(&self, done: u32) -> u8 {
        (done.min(self.frame_count) as u64 * 100 / self.frame_count as u64) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval() {
        let schedule = SampleSchedule::new(Duration::from_millis(1000), 20).unwrap();
        assert_eq!(schedule.interval(), Duration::from_millis(50));
        assert_eq!(schedule.frame_count(), 20);
    }

    #[test]
    fn test_progress() {
        let schedule = SampleSchedule::new(Duration::from_millis(1000), 20).unwrap();
        assert_eq!(schedule.progress(0), 0);
        assert_eq!(schedule.progress(1), 5);
        assert_eq!(schedule.progress(20), 100);
        assert_eq!(schedule.progress(25), 100);

        let odd = SampleSchedule::new(Duration::from_millis(900), 3).unwrap();
        assert_eq!(odd.progress(1), 33);
    }

    #[test]
    fn test_rejects_degenerate_plans() {
        assert!(matches!(
            SampleSchedule::new(Duration::from_millis(1000), 0),
            Err(RecorderError::InvalidConfig(_))
        ));
        assert!(matches!(
            SampleSchedule::new(Duration::ZERO, 20),
            Err(RecorderError::InvalidConfig(_))
        ));
    }
}
