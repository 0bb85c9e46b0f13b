use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::analyzer::{FrameAnalyzer, Snapshot};
use crate::capture::{Frame, ImageSequence};
use crate::config::AnalyzerConfig;
use crate::debug::DebugRenderer;
use crate::history::{SnapshotHistory, DEFAULT_HISTORY_CAPACITY};
use crate::ocr::DigitRecognizer;

/// Parameters for an offline run over captured screenshots.
pub struct PipelineConfig {
    /// Directory of screenshots, replayed in file-name order.
    pub input_dir: PathBuf,
    pub analyzer: AnalyzerConfig,
    /// Number of recent live snapshots to keep.
    pub history_capacity: usize,
    /// Maximum number of frames to process, or None for all of them.
    pub max_frames: Option<u32>,
    /// Directory to write debug overlay images, or None to skip.
    pub debug_frames_dir: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            analyzer: AnalyzerConfig::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            max_frames: None,
            debug_frames_dir: None,
        }
    }
}

/// Result of a session run.
pub struct SessionReport {
    /// One snapshot per processed frame, in order.
    pub snapshots: Vec<Snapshot>,
    /// The most recent snapshots taken while the game was live.
    pub history: SnapshotHistory,
}

/// Analyze every screenshot in `config.input_dir` through one analyzer, so
/// station and train ids carry across the session.
pub fn run_pipeline<R: DigitRecognizer>(config: &PipelineConfig, recognizer: R) -> Result<SessionReport> {
    if !config.input_dir.is_dir() {
        bail!("input directory does not exist: {}", config.input_dir.display());
    }

    info!(
        input_dir = ?config.input_dir,
        max_frames = ?config.max_frames,
        history_capacity = config.history_capacity,
        "pipeline starting"
    );

    let mut sequence =
        ImageSequence::open(&config.input_dir).context("failed to open screenshot directory")?;
    if sequence.is_empty() {
        warn!(input_dir = ?config.input_dir, "no screenshots found");
    }

    let debug_renderer = prepare_debug_output(config.debug_frames_dir.as_deref())?;
    let mut analyzer = FrameAnalyzer::new(config.analyzer.clone(), recognizer);
    let mut history = SnapshotHistory::new(config.history_capacity);
    let mut snapshots = Vec::new();

    while let Some(frame) = sequence.next_frame().context("failed to read screenshot")? {
        if let Some(max) = config.max_frames {
            if snapshots.len() >= max as usize {
                break;
            }
        }

        let snapshot = analyzer.analyze(&frame);
        if let (Some(renderer), Some(dir)) = (&debug_renderer, &config.debug_frames_dir) {
            renderer
                .save_frame(&frame, &analyzer, &snapshot, dir)
                .context("failed to save debug frame")?;
        }
        history.push(snapshot.clone());
        snapshots.push(snapshot);
    }

    info!(
        frames = snapshots.len(),
        live_frames_kept = history.len(),
        "pipeline complete"
    );
    Ok(SessionReport { snapshots, history })
}

/// Analyze a single screenshot with a fresh analyzer.
pub fn analyze_image<R: DigitRecognizer>(
    input: &Path,
    config: AnalyzerConfig,
    recognizer: R,
    debug_frames_dir: Option<&Path>,
) -> Result<Snapshot> {
    if !input.exists() {
        bail!("input image does not exist: {}", input.display());
    }
    let image = image::open(input)
        .with_context(|| format!("failed to decode {}", input.display()))?
        .into_rgb8();
    let frame = Frame::new(image, 0);

    let debug_renderer = prepare_debug_output(debug_frames_dir)?;
    let mut analyzer = FrameAnalyzer::new(config, recognizer);
    let snapshot = analyzer.analyze(&frame);

    if let (Some(renderer), Some(dir)) = (&debug_renderer, debug_frames_dir) {
        renderer
            .save_frame(&frame, &analyzer, &snapshot, dir)
            .context("failed to save debug frame")?;
    }
    Ok(snapshot)
}

fn prepare_debug_output(dir: Option<&Path>) -> Result<Option<DebugRenderer>> {
    let Some(dir) = dir else {
        return Ok(None);
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create debug frames directory {}", dir.display()))?;
    info!(?dir, "debug frames directory ready");
    Ok(Some(DebugRenderer::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Outcome;
    use crate::ocr::OcrError;
    use image::{GrayImage, Rgb, RgbImage};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;
    use tracing_test::traced_test;

    struct NoDigits;

    impl DigitRecognizer for NoDigits {
        fn recognize_digits(&self, _image: &GrayImage) -> Result<String, OcrError> {
            Ok(String::new())
        }
    }

    fn write_frames(dir: &Path, count: usize) {
        for i in 0..count {
            let mut img = RgbImage::from_pixel(200, 150, Rgb([240, 238, 230]));
            draw_filled_rect_mut(&mut img, Rect::at(40 + i as i32 * 3, 60).of_size(30, 30), Rgb([40, 40, 40]));
            img.save(dir.join(format!("shot_{i:03}.png"))).unwrap();
        }
    }

    #[test]
    #[traced_test]
    fn runs_over_a_session() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), 3);

        let config = PipelineConfig::new(dir.path());
        let report = run_pipeline(&config, NoDigits).unwrap();

        assert_eq!(report.snapshots.len(), 3);
        let ids: Vec<u64> = report
            .snapshots
            .iter()
            .flat_map(|s| s.stations.iter().map(|t| t.id))
            .collect();
        assert_eq!(ids, vec![0, 0, 0]);
        assert_eq!(report.snapshots[2].stations[0].age, 3);
        // No score was readable, so nothing counts as live.
        assert!(report.snapshots.iter().all(|s| s.score == Outcome::Nothing));
        assert!(report.history.is_empty());
        assert!(logs_contain("pipeline complete"));
    }

    #[test]
    fn max_frames_limits_the_run() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), 4);

        let mut config = PipelineConfig::new(dir.path());
        config.max_frames = Some(2);
        let report = run_pipeline(&config, NoDigits).unwrap();
        assert_eq!(report.snapshots.len(), 2);
    }

    #[test]
    fn writes_debug_frames() {
        let input = tempfile::tempdir().unwrap();
        let debug = tempfile::tempdir().unwrap();
        write_frames(input.path(), 1);

        let mut config = PipelineConfig::new(input.path());
        config.debug_frames_dir = Some(debug.path().join("overlay"));
        run_pipeline(&config, NoDigits).unwrap();
        assert!(debug.path().join("overlay/frame_00000000.png").exists());
    }

    #[test]
    fn missing_input_is_an_error() {
        let config = PipelineConfig::new("/nonexistent/session");
        assert!(run_pipeline(&config, NoDigits).is_err());
    }

    #[test]
    fn analyzes_one_image() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), 1);
        let snap = analyze_image(
            &dir.path().join("shot_000.png"),
            AnalyzerConfig::default(),
            NoDigits,
            None,
        )
        .unwrap();
        assert_eq!(snap.stations.len(), 1);
    }
}
