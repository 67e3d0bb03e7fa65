use crate::error::DetectionError;
use std::path::Path;

/// 一個場景的幀範圍，`end_frame` 不包含在內
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneBoundary {
    pub start_frame: u64,
    pub end_frame: u64,
}

impl SceneBoundary {
    #[must_use]
    pub const fn new(start_frame: u64, end_frame: u64) -> Self {
        Self {
            start_frame,
            end_frame,
        }
    }

    #[must_use]
    pub fn start_time(&self, frame_rate: f64) -> f64 {
        self.start_frame as f64 / frame_rate
    }

    #[must_use]
    pub fn end_time(&self, frame_rate: f64) -> f64 {
        self.end_frame as f64 / frame_rate
    }
}

/// 偵測結果：依序排列的場景與偵測時使用的幀率
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub boundaries: Vec<SceneBoundary>,
    pub frame_rate: f64,
}

impl Detection {
    /// 場景必須非空、依序排列且不重疊
    pub fn validate(&self) -> Result<(), DetectionError> {
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(DetectionError::InvalidBoundaries(format!(
                "幀率不合法: {}",
                self.frame_rate
            )));
        }

        for (i, boundary) in self.boundaries.iter().enumerate() {
            if boundary.end_frame <= boundary.start_frame {
                return Err(DetectionError::InvalidBoundaries(format!(
                    "場景 {} 為空: [{}, {})",
                    i + 1,
                    boundary.start_frame,
                    boundary.end_frame
                )));
            }
        }

        if let Some(pair) = self
            .boundaries
            .windows(2)
            .find(|pair| pair[1].start_frame < pair[0].end_frame)
        {
            return Err(DetectionError::InvalidBoundaries(format!(
                "場景重疊或未排序: [{}, {}) 之後為 [{}, {})",
                pair[0].start_frame, pair[0].end_frame, pair[1].start_frame, pair[1].end_frame
            )));
        }

        Ok(())
    }
}

/// 場景邊界偵測模型
///
/// 實作可以有狀態，且不保證能同時處理多部影片，因此以 `&mut self` 呼叫。
pub trait SceneDetector {
    fn detect(&mut self, video: &Path) -> Result<Detection, DetectionError>;
}

/// 延遲載入偵測模型，只在確實有影片需要處理時才呼叫一次
pub trait DetectorLoader {
    type Detector: SceneDetector;

    fn load(self) -> Result<Self::Detector, DetectionError>;
}

impl<F, D> DetectorLoader for F
where
    F: FnOnce() -> Result<D, DetectionError>,
    D: SceneDetector,
{
    type Detector = D;

    fn load(self) -> Result<D, DetectionError> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(ranges: &[(u64, u64)]) -> Detection {
        Detection {
            boundaries: ranges
                .iter()
                .map(|&(start, end)| SceneBoundary::new(start, end))
                .collect(),
            frame_rate: 25.0,
        }
    }

    #[test]
    fn test_contiguous_boundaries_are_valid() {
        assert!(detection(&[(0, 10), (10, 30), (30, 31)]).validate().is_ok());
        assert!(detection(&[]).validate().is_ok());
    }

    #[test]
    fn test_overlap_is_rejected() {
        let err = detection(&[(0, 10), (5, 20)]).validate().unwrap_err();
        assert!(matches!(err, DetectionError::InvalidBoundaries(_)));
    }

    #[test]
    fn test_unsorted_is_rejected() {
        assert!(detection(&[(10, 20), (0, 10)]).validate().is_err());
    }

    #[test]
    fn test_empty_scene_is_rejected() {
        assert!(detection(&[(0, 10), (10, 10)]).validate().is_err());
    }

    #[test]
    fn test_bad_frame_rate_is_rejected() {
        let mut d = detection(&[(0, 10)]);
        d.frame_rate = 0.0;
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_boundary_times() {
        let b = SceneBoundary::new(50, 75);
        assert!((b.start_time(25.0) - 2.0).abs() < 1e-9);
        assert!((b.end_time(25.0) - 3.0).abs() < 1e-9);
    }
}
