//! Frame Recording
//!
//! Recorders receive one read-only [`FrameSnapshot`] per tick after every
//! animat has acted. A failing recorder never stops the simulation.

use animat_events::{AnimatSnapshot, FrameSnapshot, RunManifest};
use bevy_ecs::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::components::{Grid, Population};
use crate::error::RecorderError;

/// Consumer of per-tick frames
pub trait FrameRecorder: Send + Sync {
    fn capture_frame(&mut self, frame: &FrameSnapshot) -> Result<(), RecorderError>;

    /// Called once after the last tick.
    fn finish(&mut self) -> Result<(), RecorderError> {
        Ok(())
    }
}

/// Discards every frame
#[derive(Debug, Default)]
pub struct NullRecorder;

impl FrameRecorder for NullRecorder {
    fn capture_frame(&mut self, _frame: &FrameSnapshot) -> Result<(), RecorderError> {
        Ok(())
    }
}

/// Keeps frames in memory behind a shared handle, so callers can inspect
/// them after handing the recorder to a simulation.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecorder {
    frames: Arc<Mutex<Vec<FrameSnapshot>>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything captured so far.
    pub fn frames(&self) -> Vec<FrameSnapshot> {
        self.frames.lock().map(|f| f.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().map(|f| f.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FrameRecorder for MemoryRecorder {
    fn capture_frame(&mut self, frame: &FrameSnapshot) -> Result<(), RecorderError> {
        let mut frames = self
            .frames
            .lock()
            .map_err(|_| RecorderError::Unavailable("frame buffer poisoned".into()))?;
        frames.push(frame.clone());
        Ok(())
    }
}

/// Writes the run manifest as the first line, then one frame per line.
pub struct JsonlRecorder {
    writer: BufWriter<File>,
    path: PathBuf,
    frames_written: u64,
}

impl JsonlRecorder {
    pub fn create(path: impl AsRef<Path>, manifest: &RunManifest) -> Result<Self, RecorderError> {
        let path = path.as_ref().to_path_buf();
        let mut writer = BufWriter::new(File::create(&path)?);
        writeln!(writer, "{}", serde_json::to_string(manifest)?)?;
        Ok(Self {
            writer,
            path,
            frames_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl FrameRecorder for JsonlRecorder {
    fn capture_frame(&mut self, frame: &FrameSnapshot) -> Result<(), RecorderError> {
        writeln!(self.writer, "{}", frame.to_json()?)?;
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), RecorderError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Recorder plus the window of ticks it should see
#[derive(Resource)]
pub struct FrameSink {
    recorder: Box<dyn FrameRecorder>,
    first_tick: u64,
    captured: u64,
    failures: u64,
}

impl FrameSink {
    pub fn new(recorder: Box<dyn FrameRecorder>) -> Self {
        Self {
            recorder,
            first_tick: 0,
            captured: 0,
            failures: 0,
        }
    }

    /// Records only the last `last_ticks` of a run of `total_ticks`.
    pub fn limited(recorder: Box<dyn FrameRecorder>, total_ticks: u64, last_ticks: Option<u64>) -> Self {
        let mut sink = Self::new(recorder);
        if let Some(last) = last_ticks {
            sink.first_tick = total_ticks.saturating_sub(last);
        }
        sink
    }

    pub fn null() -> Self {
        Self::new(Box::new(NullRecorder))
    }

    pub fn should_record(&self, tick: u64) -> bool {
        tick >= self.first_tick
    }

    /// Builds and hands over the frame for `tick` if it is in the window.
    pub fn record_from(&mut self, tick: u64, grid: &Grid, population: &Population) -> Result<bool, RecorderError> {
        if !self.should_record(tick) {
            return Ok(false);
        }
        let frame = build_frame(tick, grid, population);
        match self.recorder.capture_frame(&frame) {
            Ok(()) => {
                self.captured += 1;
                Ok(true)
            }
            Err(e) => {
                self.failures += 1;
                Err(e)
            }
        }
    }

    pub fn finish(&mut self) -> Result<(), RecorderError> {
        self.recorder.finish()
    }

    pub fn captured(&self) -> u64 {
        self.captured
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }
}

/// Renderable snapshot of the board.
pub fn build_frame(tick: u64, grid: &Grid, population: &Population) -> FrameSnapshot {
    let animats = grid
        .occupied()
        .into_iter()
        .filter_map(|(pos, id)| {
            let animat = population.get(id)?;
            Some(AnimatSnapshot {
                animat_id: id.0,
                x: pos.x as u32,
                y: pos.y as u32,
                facing: animat.facing.name().to_string(),
                group: animat.group.0,
                health: animat.health,
                energy: animat.energy,
            })
        })
        .collect();
    FrameSnapshot::new(tick, grid.size() as u32, grid.food_layer(), animats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::ScriptedBrain;
    use crate::components::{Animat, AnimatId, Direction, GroupMarker, Position};
    use std::io::BufRead;

    fn board() -> (Grid, Population) {
        let mut grid = Grid::new(3, 4).unwrap();
        let mut population = Population::new();
        grid.set_food(Position::new(2, 1), 3);
        grid.place_animat(Position::new(1, 2), AnimatId(7)).unwrap();
        population.insert(Animat::new(
            AnimatId(7),
            GroupMarker(2),
            Direction::Down,
            90,
            12,
            Box::new(ScriptedBrain::stay()),
        ));
        (grid, population)
    }

    struct FailingRecorder;

    impl FrameRecorder for FailingRecorder {
        fn capture_frame(&mut self, _frame: &FrameSnapshot) -> Result<(), RecorderError> {
            Err(RecorderError::Unavailable("disk gone".into()))
        }
    }

    #[test]
    fn test_build_frame() {
        let (grid, population) = board();
        let frame = build_frame(5, &grid, &population);
        assert_eq!(frame.frame_id, "frame_000005");
        assert_eq!(frame.food_at(2, 1), Some(3));
        let a = frame.animat_at(1, 2).unwrap();
        assert_eq!(a.animat_id, 7);
        assert_eq!(a.facing, "down");
        assert_eq!((a.group, a.health, a.energy), (2, 90, 12));
    }

    #[test]
    fn test_memory_recorder_shares_frames() {
        let (grid, population) = board();
        let recorder = MemoryRecorder::new();
        let mut sink = FrameSink::new(Box::new(recorder.clone()));
        sink.record_from(0, &grid, &population).unwrap();
        sink.record_from(1, &grid, &population).unwrap();
        assert_eq!(recorder.len(), 2);
        assert_eq!(recorder.frames()[1].tick, 1);
    }

    #[test]
    fn test_limited_sink_skips_early_ticks() {
        let (grid, population) = board();
        let recorder = MemoryRecorder::new();
        let mut sink = FrameSink::limited(Box::new(recorder.clone()), 10, Some(3));
        for tick in 0..10 {
            sink.record_from(tick, &grid, &population).unwrap();
        }
        let ticks: Vec<u64> = recorder.frames().iter().map(|f| f.tick).collect();
        assert_eq!(ticks, vec![7, 8, 9]);
        assert_eq!(sink.captured(), 3);
    }

    #[test]
    fn test_failures_are_counted() {
        let (grid, population) = board();
        let mut sink = FrameSink::new(Box::new(FailingRecorder));
        assert!(sink.record_from(0, &grid, &population).is_err());
        assert_eq!(sink.failures(), 1);
        assert_eq!(sink.captured(), 0);
    }

    #[test]
    fn test_jsonl_recorder_writes_manifest_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames.jsonl");
        let (grid, population) = board();
        let manifest = RunManifest::new(1, 3, 2, 1, "scripted_stay");

        let mut recorder = JsonlRecorder::create(&path, &manifest).unwrap();
        recorder.capture_frame(&build_frame(0, &grid, &population)).unwrap();
        recorder.capture_frame(&build_frame(1, &grid, &population)).unwrap();
        recorder.finish().unwrap();
        assert_eq!(recorder.frames_written(), 2);

        let lines: Vec<String> = std::io::BufReader::new(File::open(&path).unwrap())
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        let header: RunManifest = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(header.run_id, manifest.run_id);
        let frame: FrameSnapshot = serde_json::from_str(&lines[2]).unwrap();
        assert_eq!(frame.tick, 1);
    }
}
