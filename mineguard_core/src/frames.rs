//! Frame Sequencer - a replayable animation of a hazard's spread.
//!
//! Frame `k` sits at `time = k / fps` and every frame with
//! `time < total_seconds` is produced. Each frame is computed from scratch
//! (zones, then classification) at its own time, so the sequence:
//!
//! - is lazy: nothing is computed until a frame is pulled
//! - is restartable: clone the iterator, or call [`Frames::frame_at`]
//! - can be split across threads by index range
//!
//! Degenerate inputs (non-positive or non-finite duration or rate) give an
//! empty sequence.

use crate::hazard::{Hazard, Location};
use crate::proximity::{AffectedWorkers, ProximityClassifier, WorkerPosition};
use crate::zones::{compute_zones, DangerZones};
use serde::{Deserialize, Serialize};

/// Default animation length in seconds.
pub const DEFAULT_DURATION_SECS: f64 = 30.0;

/// Default frame rate.
pub const DEFAULT_FPS: f64 = 2.0;

/// One snapshot of the hazard at `time` seconds after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationFrame {
    pub time: f64,
    pub danger_zones: DangerZones,
    pub affected_workers: AffectedWorkers,
    pub hazard_center: Location,
}

/// Number of frames in `[0, total_seconds)` at `fps`.
pub fn frame_count(total_seconds: f64, fps: f64) -> usize {
    if !(total_seconds.is_finite() && fps.is_finite()) || total_seconds <= 0.0 || fps <= 0.0 {
        return 0;
    }

    // ceil(total * fps), corrected for rounding so the last frame stays
    // strictly before `total_seconds` and none is missed.
    let mut count = (total_seconds * fps).ceil() as usize;
    while count > 0 && (count - 1) as f64 / fps >= total_seconds {
        count -= 1;
    }
    while count < usize::MAX && (count as f64) / fps < total_seconds {
        count += 1;
    }
    count
}

/// Lazy, finite sequence of [`SimulationFrame`]s.
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    hazard: &'a Hazard,
    workers: &'a [WorkerPosition],
    classifier: ProximityClassifier,
    fps: f64,
    count: usize,
    front: usize,
    back: usize,
}

impl<'a> Frames<'a> {
    pub fn new(
        hazard: &'a Hazard,
        workers: &'a [WorkerPosition],
        total_seconds: f64,
        fps: f64,
    ) -> Self {
        let count = frame_count(total_seconds, fps);
        Self {
            hazard,
            workers,
            classifier: ProximityClassifier::default(),
            fps,
            count,
            front: 0,
            back: count,
        }
    }

    /// Uses `classifier` (e.g. a different missing-coordinate policy).
    pub fn with_classifier(mut self, classifier: ProximityClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Time of frame `index`.
    pub fn time_of(&self, index: usize) -> f64 {
        index as f64 / self.fps
    }

    /// Computes frame `index` of the full sequence, regardless of how far
    /// this iterator has advanced.
    pub fn frame_at(&self, index: usize) -> Option<SimulationFrame> {
        (index < self.count).then(|| self.compute(index))
    }

    fn compute(&self, index: usize) -> SimulationFrame {
        let time = self.time_of(index);
        let danger_zones = compute_zones(&self.hazard.hazard_type, time);
        let affected_workers = self.classifier.classify(
            &self.hazard.location,
            &danger_zones,
            self.workers,
            &self.hazard.hazard_type,
        );

        SimulationFrame {
            time,
            danger_zones,
            affected_workers,
            hazard_center: self.hazard.location.clone(),
        }
    }
}

impl Iterator for Frames<'_> {
    type Item = SimulationFrame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let frame = self.compute(self.front);
        self.front += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back.saturating_sub(self.front);
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl DoubleEndedIterator for Frames<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.compute(self.back))
    }
}

impl ExactSizeIterator for Frames<'_> {}

impl std::iter::FusedIterator for Frames<'_> {}

/// Frames for `hazard` over `[0, total_seconds)` at `fps` frames per second.
pub fn generate_frames<'a>(
    hazard: &'a Hazard,
    workers: &'a [WorkerPosition],
    total_seconds: f64,
    fps: f64,
) -> Frames<'a> {
    Frames::new(hazard, workers, total_seconds, fps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hazard::HazardType;
    use crate::zones::ZoneLevel;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};
    use mineguard_env::HazardId;

    fn fire() -> Hazard {
        Hazard::new(
            HazardId::from_seed(11),
            HazardType::Fire,
            Location::new(23.045, 81.325, "A"),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    fn roster() -> Vec<WorkerPosition> {
        vec![
            WorkerPosition::new("W001", "John Smith", "Miner", "A", 23.0455, 81.3240),
            WorkerPosition::new("W002", "Mike Johnson", "Driller", "B", 23.0480, 81.3275),
            WorkerPosition::new("W003", "Sarah Williams", "Engineer", "A", 23.0425, 81.3260),
            WorkerPosition::new("W004", "Tom Brown", "Supervisor", "C", 23.0465, 81.3250),
        ]
    }

    #[test]
    fn test_frame_count() {
        assert_eq!(frame_count(30.0, 2.0), 60);
        assert_eq!(frame_count(30.0, 1.0), 30);
        assert_eq!(frame_count(1.0, 3.0), 3);
        assert_eq!(frame_count(2.5, 1.0), 3);
        assert_eq!(frame_count(0.1, 30.0), 3);
        assert_eq!(frame_count(0.0, 2.0), 0);
        assert_eq!(frame_count(-5.0, 2.0), 0);
        assert_eq!(frame_count(10.0, 0.0), 0);
        assert_eq!(frame_count(10.0, f64::NAN), 0);
    }

    #[test]
    fn test_frames_are_evenly_spaced_and_end_exclusive() {
        let hazard = fire();
        let workers = roster();
        let times: Vec<f64> = generate_frames(&hazard, &workers, 3.0, 2.0).map(|f| f.time).collect();
        assert_eq!(times, vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5]);
    }

    #[test]
    fn test_first_frame_has_zero_radii() {
        let hazard = fire();
        let workers = roster();
        let first = generate_frames(&hazard, &workers, 10.0, 1.0).next().unwrap();

        assert_eq!(first.time, 0.0);
        assert_eq!(first.danger_zones.max_radius(), 0.0);
        assert!(first.affected_workers.is_empty());
        assert_eq!(first.hazard_center, hazard.location);
    }

    #[test]
    fn test_frame_matches_direct_computation() {
        let hazard = fire();
        let workers = roster();
        let frames = generate_frames(&hazard, &workers, 30.0, 2.0);
        let frame = frames.frame_at(20).unwrap();

        assert_relative_eq!(frame.time, 10.0);
        assert_eq!(frame.danger_zones, compute_zones(&HazardType::Fire, 10.0));
        assert!(frames.frame_at(60).is_none());
    }

    #[test]
    fn test_workers_enter_as_hazard_grows() {
        let hazard = fire();
        let workers = roster();
        let frames: Vec<SimulationFrame> = generate_frames(&hazard, &workers, 30.0, 1.0).collect();

        // Tom Brown is 0.0015 from the origin: outside at t=0, inside by t=1
        assert_eq!(frames[0].affected_workers.level_of("W004"), None);
        assert!(frames[1].affected_workers.level_of("W004").is_some());
        assert_eq!(frames[29].affected_workers.level_of("W004"), Some(ZoneLevel::Critical));
        assert_eq!(frames[29].affected_workers.total(), 4);
    }

    #[test]
    fn test_sequence_is_deterministic_and_restartable() {
        let hazard = fire();
        let workers = roster();
        let frames = generate_frames(&hazard, &workers, 30.0, 2.0);

        let first: Vec<SimulationFrame> = frames.clone().collect();
        let second: Vec<SimulationFrame> = frames.collect();
        assert_eq!(first, second);

        let json_a = serde_json::to_string(&first).unwrap();
        let json_b = serde_json::to_string(&generate_frames(&hazard, &workers, 30.0, 2.0).collect::<Vec<_>>()).unwrap();
        assert_eq!(json_a, json_b);
    }

    #[test]
    fn test_iterator_traits() {
        let hazard = fire();
        let workers = roster();
        let mut frames = generate_frames(&hazard, &workers, 5.0, 2.0);
        assert_eq!(frames.len(), 10);

        let last = frames.next_back().unwrap();
        assert_relative_eq!(last.time, 4.5);
        assert_eq!(frames.len(), 9);

        let third = frames.nth(2).unwrap();
        assert_relative_eq!(third.time, 1.0);
        assert_eq!(frames.len(), 6);
    }

    #[test]
    fn test_empty_for_degenerate_input() {
        let hazard = fire();
        let workers = roster();
        assert_eq!(generate_frames(&hazard, &workers, 0.0, 2.0).count(), 0);
        assert_eq!(generate_frames(&hazard, &workers, -1.0, 2.0).count(), 0);
        assert_eq!(generate_frames(&hazard, &workers, 30.0, -2.0).count(), 0);
    }
}
