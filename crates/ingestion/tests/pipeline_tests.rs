//! End-to-end conversion tests on synthetic GeoTIFFs.

use std::path::Path;
use std::sync::Arc;

use ingestion::{
    ConvertOptions, Converter, IngestionError, InputKind, OutputMode, PipelineConfig,
    RecordingOptimizer, SeriesStacker,
};
use netcdf_archive::ArchiveInfo;
use projection::AxisMode;
use test_utils::fixtures::names::{CLASSIFICATION_DAY1, CLASSIFICATION_DAY2, RGB_DAY1, STACKED};
use test_utils::fixtures::tiles::{TileSpec, UTM_37S_100, WGS84_SMALL};
use test_utils::fixtures::{PSEUDO_MERCATOR_WKT1, UTM_37S_WKT1, WGS84_WKT1};
use test_utils::{
    assert_approx_eq, create_classification_grid, create_constant_grid, create_sparse_grid,
    scratch_dir, write_classification_tile,
};

fn converter() -> Converter {
    Converter::new(PipelineConfig::default(), Box::new(RecordingOptimizer::new()))
}

fn options(input: &Path, output: &Path, mode: OutputMode) -> ConvertOptions {
    ConvertOptions {
        input_dir: input.to_path_buf(),
        output_dir: output.to_path_buf(),
        input_kind: InputKind::Classification,
        mode,
    }
}

fn write_two_days(dir: &Path) {
    write_classification_tile(
        dir,
        CLASSIFICATION_DAY1,
        &UTM_37S_100,
        UTM_37S_WKT1,
        create_constant_grid(100, 100, 3),
    );
    write_classification_tile(
        dir,
        CLASSIFICATION_DAY2,
        &UTM_37S_100,
        UTM_37S_WKT1,
        create_constant_grid(100, 100, 5),
    );
}

#[test]
fn test_stacked_conversion_two_dates() {
    let input = scratch_dir();
    let output = scratch_dir();
    write_two_days(input.path());

    let summary = converter()
        .run(&options(input.path(), output.path(), OutputMode::Stacked))
        .unwrap();

    assert_eq!(
        summary.written,
        vec![output.path().join("20230101-20230102_classification.nc")]
    );
    assert!(output.path().join(STACKED).exists());

    let info = ArchiveInfo::open(&summary.written[0]).unwrap();
    assert_eq!(info.slices(), 2);
    assert!(info.time[0] < info.time[1]);
    assert_eq!(info.time[1] - info.time[0], 24.0);
    assert!(info.slice(0).unwrap().iter().all(|&v| v == 3));
    assert!(info.slice(1).unwrap().iter().all(|&v| v == 5));
    assert_eq!(info.global("time_coverage_duration"), Some("2 days"));
    assert_eq!(info.global("time_coverage_end"), Some("20230102"));
}

#[test]
fn test_stacking_reuses_existing_artifact() {
    let input = scratch_dir();
    let output = scratch_dir();
    write_two_days(input.path());
    let inputs = vec![
        input.path().join(CLASSIFICATION_DAY1),
        input.path().join(CLASSIFICATION_DAY2),
    ];

    let stacker = SeriesStacker::new();
    let first = stacker.stack(&inputs, output.path()).unwrap();
    assert!(!first.reused);
    assert_eq!(first.coordinates.len(), inputs.len());
    assert!(first.coordinates[0].hours() < first.coordinates[1].hours());
    let modified = std::fs::metadata(&first.path).unwrap().modified().unwrap();

    let second = stacker.stack(&inputs, output.path()).unwrap();
    assert!(second.reused);
    assert_eq!(second.path, first.path);
    assert_eq!(second.coordinates, first.coordinates);
    assert_eq!(
        std::fs::metadata(&second.path).unwrap().modified().unwrap(),
        modified
    );
}

#[test]
fn test_stacking_rejects_mismatched_dimensions() {
    let input = scratch_dir();
    let output = scratch_dir();
    write_classification_tile(
        input.path(),
        CLASSIFICATION_DAY1,
        &UTM_37S_100,
        UTM_37S_WKT1,
        create_constant_grid(100, 100, 1),
    );
    write_classification_tile(
        input.path(),
        CLASSIFICATION_DAY2,
        &WGS84_SMALL,
        WGS84_WKT1,
        create_constant_grid(WGS84_SMALL.rows, WGS84_SMALL.cols, 1),
    );

    let err = converter()
        .run(&options(input.path(), output.path(), OutputMode::Stacked))
        .unwrap_err();
    assert!(matches!(err, IngestionError::UnreadableRaster { .. }));
    assert!(!output.path().join(STACKED).exists());
}

#[test]
fn test_per_file_conversion_single_date() {
    let input = scratch_dir();
    let output = scratch_dir();
    write_classification_tile(
        input.path(),
        CLASSIFICATION_DAY1,
        &UTM_37S_100,
        UTM_37S_WKT1,
        create_sparse_grid(100, 100, &[(50, 50, 200)]),
    );

    let summary = converter()
        .run(&options(input.path(), output.path(), OutputMode::PerFile))
        .unwrap();
    assert!(summary.failed.is_empty());

    let info = ArchiveInfo::open(&output.path().join("20230101_classification.nc")).unwrap();
    assert_eq!(info.slices(), 1);
    assert_eq!((info.y0.len(), info.x0.len()), (100, 100));
    let slice = info.slice(0).unwrap();
    assert_eq!(slice[50 * 100 + 50], 200);
    assert_eq!(slice.iter().filter(|&&v| v == 200).count(), 1);
    assert_eq!(info.crs_str("grid_mapping_name"), Some("transverse_mercator"));
    assert_eq!(info.crs_f64("longitude_of_central_meridian"), Some(39.0));
}

#[test]
fn test_per_file_geographic_input_uses_identity_axes() {
    let input = scratch_dir();
    let output = scratch_dir();
    write_classification_tile(
        input.path(),
        CLASSIFICATION_DAY1,
        &WGS84_SMALL,
        WGS84_WKT1,
        create_classification_grid(WGS84_SMALL.rows, WGS84_SMALL.cols, 5),
    );

    converter()
        .run(&options(input.path(), output.path(), OutputMode::PerFile))
        .unwrap();

    let info = ArchiveInfo::open(&output.path().join("20230101_classification.nc")).unwrap();
    assert_eq!(info.lon.len(), WGS84_SMALL.cols);
    assert_eq!(info.lat.len(), WGS84_SMALL.rows);
    assert_approx_eq!(info.lon[0], 36.0, 1e-9);
    assert_approx_eq!(info.lat[0], -3.5, 1e-9);
    assert_eq!(info.crs_str("grid_mapping_name"), Some("latitude_longitude"));
}

#[test]
fn test_per_file_web_mercator_input() {
    let input = scratch_dir();
    let output = scratch_dir();
    let tile = TileSpec {
        rows: 20,
        cols: 30,
        transform: [4_000_000.0, 100.0, 0.0, -400_000.0, 0.0, -100.0],
    };
    write_classification_tile(
        input.path(),
        CLASSIFICATION_DAY1,
        &tile,
        PSEUDO_MERCATOR_WKT1,
        create_constant_grid(tile.rows, tile.cols, 4),
    );

    let summary = converter()
        .run(&options(input.path(), output.path(), OutputMode::PerFile))
        .unwrap();
    assert!(summary.failed.is_empty(), "{:?}", summary.failed);

    let info = ArchiveInfo::open(&output.path().join("20230101_classification.nc")).unwrap();
    // Metres per degree of longitude on the Web Mercator sphere.
    let metres_per_degree = 111_319.490_793_273_6;
    assert_approx_eq!(info.lon[0], 4_000_000.0 / metres_per_degree, 1e-6);
    assert_approx_eq!(info.lon[29], 4_003_000.0 / metres_per_degree, 1e-6);
    assert!(info.lat.iter().all(|&lat| lat < 0.0));
    assert_eq!(info.crs_str("grid_mapping_name"), Some("mercator"));
}

#[test]
fn test_per_file_failures_do_not_abort_batch() {
    let input = scratch_dir();
    let output = scratch_dir();
    write_classification_tile(
        input.path(),
        CLASSIFICATION_DAY1,
        &UTM_37S_100,
        UTM_37S_WKT1,
        create_constant_grid(100, 100, 2),
    );
    std::fs::write(input.path().join(CLASSIFICATION_DAY2), b"corrupt").unwrap();

    let summary = converter()
        .run(&options(input.path(), output.path(), OutputMode::PerFile))
        .unwrap();
    assert_eq!(summary.written.len(), 1);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, input.path().join(CLASSIFICATION_DAY2));
    assert!(!output.path().join("20230102_classification.nc").exists());
}

#[test]
fn test_exact_axes_mode() {
    let input = scratch_dir();
    let output = scratch_dir();
    write_classification_tile(
        input.path(),
        CLASSIFICATION_DAY1,
        &UTM_37S_100,
        UTM_37S_WKT1,
        create_constant_grid(100, 100, 1),
    );

    let config = PipelineConfig {
        axis_mode: AxisMode::Exact,
        ..Default::default()
    };
    Converter::new(config, Box::new(RecordingOptimizer::new()))
        .run(&options(input.path(), output.path(), OutputMode::PerFile))
        .unwrap();

    let info = ArchiveInfo::open(&output.path().join("20230101_classification.nc")).unwrap();
    assert_eq!(info.lon.len(), 100);
    assert!(info.lon.windows(2).all(|w| w[0] <= w[1]));
    assert!(info.lat.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_optimize_mode_uses_optimizer() {
    let input = scratch_dir();
    let output = scratch_dir();
    write_two_days(input.path());

    let recorder = Arc::new(RecordingOptimizer::new());
    let converter = Converter::new(PipelineConfig::default(), Box::new(Arc::clone(&recorder)));
    let summary = converter
        .run(&options(input.path(), output.path(), OutputMode::Optimize))
        .unwrap();

    let calls = recorder.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, input.path().join(CLASSIFICATION_DAY1));
    assert_eq!(calls[0].1, output.path().join(CLASSIFICATION_DAY1));
    assert_eq!(summary.optimized.len(), 2);
    assert!(summary.written.is_empty());
}

#[test]
fn test_rgb_inputs_selected_separately() {
    let input = scratch_dir();
    let output = scratch_dir();
    write_two_days(input.path());
    write_classification_tile(
        input.path(),
        RGB_DAY1,
        &UTM_37S_100,
        UTM_37S_WKT1,
        create_constant_grid(100, 100, 9),
    );

    let summary = converter()
        .run(&ConvertOptions {
            input_kind: InputKind::Rgb,
            ..options(input.path(), output.path(), OutputMode::PerFile)
        })
        .unwrap();
    assert_eq!(
        summary.written,
        vec![output.path().join("20230101_rgb_classification.nc")]
    );
}

#[test]
fn test_no_inputs() {
    let input = scratch_dir();
    let output = scratch_dir();
    std::fs::write(input.path().join("readme.txt"), b"").unwrap();

    let nested = output.path().join("nested/out");
    let err = converter()
        .run(&options(input.path(), &nested, OutputMode::PerFile))
        .unwrap_err();
    assert!(matches!(err, IngestionError::NoInputs(_)));
    assert!(nested.is_dir());
}
