use image::{ImageBuffer, Rgb, RgbImage, Rgba, RgbaImage};
use palette_recon::config::Configuration;
use palette_recon::error::AppError;
use palette_recon::pipeline::orchestration::{
    PipelineStage, ProgressRecorder, ReconciliationPipeline, RunError,
};
use palette_recon::pipeline::ReportOutcome;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Writes a PNG whose pixels cycle through `colors`.
    fn image(&self, colors: &[[u8; 3]]) -> PathBuf {
        let path = self.path("regions.png");
        let image: RgbImage = ImageBuffer::from_fn(32, 16, |x, y| {
            Rgb(colors[((x + y * 32) as usize) % colors.len()])
        });
        image.save(&path).unwrap();
        path
    }

    fn table(&self, contents: &str) -> PathBuf {
        let path = self.path("regions.csv");
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn configuration(&self) -> Configuration {
        Configuration::builder()
            .image_path(self.path("regions.png"))
            .table_path(self.path("regions.csv"))
            .output_path(self.path("missing.csv"))
            .color_column("REGION_ID")
            .build()
            .unwrap()
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn scenario_reports_only_missing_colors() {
    let fixture = Fixture::new();
    fixture.image(&[[255, 0, 0], [0, 255, 0]]);
    fixture.table("name,REGION_ID\nNorth,#FF0000\nSouth,#0000FF\n");

    let outcome = ReconciliationPipeline::new(fixture.configuration())
        .unwrap()
        .run()
        .await
        .unwrap();

    let missing: Vec<(&str, &str)> = outcome
        .result
        .iter()
        .map(|r| (r.name.as_str(), r.raw_code.as_str()))
        .collect();
    assert_eq!(missing, vec![("South", "0000FF")]);
    assert_eq!(read(&fixture.path("missing.csv")), "name,REGION_ID\nSouth,0000FF\n");

    let counts = outcome.counts();
    assert_eq!(counts.total_records, 2);
    assert_eq!(counts.decoded_records, 2);
    assert_eq!(counts.dropped_records, 0);
    assert_eq!(counts.matched_records, 1);
    assert_eq!(counts.missing_records, 1);
    assert_eq!(outcome.summary.palette_size, 2);
}

#[tokio::test]
async fn scenario_invalid_code_is_dropped_and_counted() {
    let fixture = Fixture::new();
    fixture.image(&[[255, 0, 0]]);
    fixture.table("name,REGION_ID\nNorth,#FF0000\nNowhere,ZZZZZZ\n");

    let outcome = ReconciliationPipeline::new(fixture.configuration())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.counts().dropped_records, 1);
    assert_eq!(outcome.counts().decoded_records, 1);
    assert_eq!(outcome.dropped[0].name, "Nowhere");
    assert_eq!(outcome.dropped[0].raw_value, "ZZZZZZ");
    assert_eq!(outcome.summary.dropped_samples.len(), 1);
}

#[tokio::test]
async fn scenario_missing_name_column_is_a_schema_error() {
    let fixture = Fixture::new();
    fixture.image(&[[255, 0, 0]]);
    fixture.table("REGION_NAME,REGION_ID\nNorth,#FF0000\n");

    let err = ReconciliationPipeline::new(fixture.configuration())
        .unwrap()
        .run()
        .await
        .unwrap_err();

    match err {
        RunError::Aborted(AppError::Schema { missing, .. }) => assert_eq!(missing, vec!["name"]),
        other => panic!("expected schema error, got {other:?}"),
    }
    assert!(!fixture.path("missing.csv").exists());
}

#[tokio::test]
async fn scenario_all_present_reports_no_missing() {
    let fixture = Fixture::new();
    fixture.image(&[[255, 0, 0], [0, 255, 0]]);
    fixture.table("name,REGION_ID\nNorth,#FF0000\nWest,00ff00\nBad,12\n");

    let outcome = ReconciliationPipeline::new(fixture.configuration())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(outcome.result.is_empty());
    assert!(!outcome.has_missing());
    assert_eq!(outcome.summary.report, Some(ReportOutcome::NoMissing));
    assert!(!fixture.path("missing.csv").exists());
    // the dropped row is still visible even though nothing is missing
    assert_eq!(outcome.counts().dropped_records, 1);
    assert_eq!(outcome.counts().matched_records, 2);
}

#[tokio::test]
async fn strict_mode_fails_without_writing_output() {
    let fixture = Fixture::new();
    fixture.image(&[[255, 0, 0]]);
    fixture.table("name,REGION_ID\nA,ZZZZZZ\nB,#0000FF\nC,#12\n");

    let configuration = Configuration {
        drop_invalid_rows: false,
        ..fixture.configuration()
    };
    let err = ReconciliationPipeline::new(configuration)
        .unwrap()
        .run()
        .await
        .unwrap_err();

    match err.app_error() {
        AppError::ColorDecode { failures, .. } => {
            let rows: Vec<usize> = failures.iter().map(|f| f.row).collect();
            assert_eq!(rows, vec![1, 3]);
        }
        other => panic!("expected color decode error, got {other:?}"),
    }
    assert!(err.outcome().is_none());
    assert!(!fixture.path("missing.csv").exists());
}

#[tokio::test]
async fn image_failure_aborts_before_the_table_is_read() {
    let fixture = Fixture::new();
    fixture.table("name,REGION_ID\nNorth,#FF0000\n");

    let recorder = Arc::new(ProgressRecorder::new());
    let err = ReconciliationPipeline::builder(fixture.configuration())
        .observer(recorder.clone())
        .build()
        .unwrap()
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err.app_error(), AppError::ImageDecode { .. }));
    assert!(recorder
        .events()
        .iter()
        .all(|e| e.stage == PipelineStage::PaletteExtraction));
}

#[tokio::test]
async fn parallel_load_matches_sequential_load() {
    let fixture = Fixture::new();
    fixture.image(&[[255, 0, 0], [0, 255, 0], [10, 20, 30]]);
    fixture.table(
        "name,REGION_ID\nNorth,#FF0000\nSouth,#0000FF\nSouth,#0000FF\nEast,0a141e\nWest,#0000FE\n",
    );

    let sequential = ReconciliationPipeline::new(fixture.configuration())
        .unwrap()
        .run()
        .await
        .unwrap();
    let parallel = ReconciliationPipeline::new(Configuration {
        parallel_load: true,
        ..fixture.configuration()
    })
    .unwrap()
    .run()
    .await
    .unwrap();

    assert_eq!(sequential.result, parallel.result);
    assert_eq!(sequential.counts(), parallel.counts());
    assert_eq!(parallel.counts().missing_records, 3);
    assert_eq!(parallel.counts().reported_records, 2);
}

#[tokio::test]
async fn alpha_channel_is_ignored_when_matching() {
    let fixture = Fixture::new();
    let image = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 0]));
    image.save(fixture.path("regions.png")).unwrap();
    fixture.table("name,REGION_ID\nSouth,#0000FF\n");

    let outcome = ReconciliationPipeline::new(fixture.configuration())
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(outcome.counts().matched_records, 1);
}

#[tokio::test]
async fn write_failure_keeps_the_computed_result() {
    let fixture = Fixture::new();
    fixture.image(&[[255, 0, 0]]);
    fixture.table("name,REGION_ID\nSouth,#0000FF\n");

    let configuration = Configuration {
        output_path: fixture.path("no-such-dir").join("missing.csv"),
        ..fixture.configuration()
    };
    let err = ReconciliationPipeline::new(configuration)
        .unwrap()
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err.app_error(), AppError::OutputWrite { .. }));
    let outcome = err.outcome().expect("computed outcome is kept");
    assert_eq!(outcome.result.len(), 1);
    assert_eq!(outcome.summary.report, None);
}

#[tokio::test]
async fn writes_json_summary() {
    let fixture = Fixture::new();
    fixture.image(&[[255, 0, 0]]);
    fixture.table("name,REGION_ID\nNorth,#FF0000\nSouth,#0000FF\nBad,nope\n");

    let configuration = Configuration {
        summary_path: Some(fixture.path("summary.json")),
        ..fixture.configuration()
    };
    ReconciliationPipeline::new(configuration)
        .unwrap()
        .run()
        .await
        .unwrap();

    let summary: serde_json::Value = serde_json::from_str(&read(&fixture.path("summary.json"))).unwrap();
    assert_eq!(summary["total_records"], 3);
    assert_eq!(summary["decoded_records"], 2);
    assert_eq!(summary["dropped_records"], 1);
    assert_eq!(summary["matched_records"], 1);
    assert_eq!(summary["missing_records"], 1);
    assert_eq!(summary["report"]["outcome"], "written");
    assert_eq!(summary["dropped_samples"][0]["raw_value"], "nope");
    assert!(summary["stage_timings_ms"]["reconciliation"].is_number());
}

#[tokio::test]
async fn progress_covers_every_stage_in_order() {
    let fixture = Fixture::new();
    fixture.image(&[[255, 0, 0]]);
    fixture.table("name,REGION_ID\nSouth,#0000FF\n");

    let recorder = Arc::new(ProgressRecorder::new());
    ReconciliationPipeline::builder(fixture.configuration())
        .observer(recorder.clone())
        .build()
        .unwrap()
        .run()
        .await
        .unwrap();

    let mut stages: Vec<PipelineStage> = recorder.events().iter().map(|e| e.stage).collect();
    stages.dedup();
    assert_eq!(stages, PipelineStage::ALL.to_vec());
}
