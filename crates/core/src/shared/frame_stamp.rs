use std::time::{SystemTime, UNIX_EPOCH};

/// Per-frame values every face record of that frame shares.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStamp {
    pub index: usize,
    /// Capture time in seconds since the Unix epoch.
    pub timestamp: f64,
    pub width: u32,
    pub height: u32,
}

impl FrameStamp {
    pub fn new(index: usize, timestamp: f64, width: u32, height: u32) -> Self {
        Self {
            index,
            timestamp,
            width,
            height,
        }
    }

    /// Stamps a frame with the current wall-clock time.
    pub fn now(index: usize, width: u32, height: u32) -> Self {
        Self::new(index, unix_seconds(), width, height)
    }
}

fn unix_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_uses_epoch_seconds() {
        let stamp = FrameStamp::now(3, 640, 360);
        assert_eq!(stamp.index, 3);
        assert_eq!((stamp.width, stamp.height), (640, 360));
        // Any clock after 2001 is past one billion seconds.
        assert!(stamp.timestamp > 1.0e9);
    }
}
