//! Tests for the batch geocoding run.

use super::*;
use crate::dataset::load_path;
use crate::domain::RawStationRecord;
use crate::lines::{ColorScheme, PALETTE};
use crate::stations::mock::{MockGeocoder, Reply};
use crate::stations::{CacheFileConfig, GeocodeConfig, SkipReason};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

fn group(line: &str, names: &[&str]) -> StationGroup {
    StationGroup {
        line_id: line.to_string(),
        records: names
            .iter()
            .map(|name| RawStationRecord::new(line, *name))
            .collect(),
        malformed_rows: 0,
    }
}

fn resolver(geocoder: MockGeocoder) -> StationResolver<MockGeocoder> {
    build_resolver(geocoder, StationCache::new(), &PipelineConfig::default())
}

fn berlin() -> MockGeocoder {
    MockGeocoder::new()
        .found("S+U Alexanderplatz", 52.5219, 13.4132)
        .found("U Klosterstraße", 52.5172, 13.4124)
        .found("U Märkisches Museum", 52.5123, 13.4090)
        .found("S+U Friedrichstraße", 52.5201, 13.3869)
        .found("S Hackescher Markt", 52.5225, 13.4024)
        .found("S Jannowitzbrücke", 52.5150, 13.4180)
}

fn station_names(line: &crate::domain::Line) -> Vec<&str> {
    line.stations().iter().map(|s| s.name.as_str()).collect()
}

fn write_list(dir: &Path, line: &str, names: &[&str]) {
    let contents: String = names.iter().map(|n| format!("{n}\n")).collect();
    std::fs::write(dir.join(format!("{line}.csv")), contents).unwrap();
}

#[tokio::test]
async fn two_lines_of_three() {
    let groups = [
        group("u2", &["S+U Alexanderplatz", "U Klosterstraße", "U Märkisches Museum"]),
        group("s5", &["S+U Friedrichstraße", "S Hackescher Markt", "S Jannowitzbrücke"]),
    ];
    let resolver = resolver(berlin());

    let report = run(&groups, &resolver, &PipelineConfig::default()).await;

    assert_eq!(report.lines.len(), 2);
    assert_eq!(report.lines[0].name(), "u2");
    assert_eq!(report.lines[0].color(), PALETTE[0]);
    assert_eq!(
        station_names(&report.lines[0]),
        ["S+U Alexanderplatz", "U Klosterstraße", "U Märkisches Museum"]
    );
    assert_eq!(report.lines[1].name(), "s5");
    assert_eq!(report.lines[1].color(), PALETTE[1]);
    assert_eq!(report.lines[1].stations().len(), 3);

    assert_eq!(report.rows.len(), 6);
    assert!(report.skipped.is_empty());
    assert_eq!(report.stats.records, 6);
    assert_eq!(report.stats.resolved, 6);
    assert_eq!(report.stats.lookups, 6);
    assert_eq!(report.stats.cache_hits, 0);
}

#[tokio::test]
async fn rows_follow_input_order() {
    let groups = [
        group("s5", &["S Jannowitzbrücke", "S+U Alexanderplatz", "S Hackescher Markt"]),
        group("u2", &["U Klosterstraße", "S+U Alexanderplatz"]),
    ];
    let resolver = resolver(berlin());

    let report = run(&groups, &resolver, &PipelineConfig::default()).await;

    let rows: Vec<(&str, &str)> = report
        .rows
        .iter()
        .map(|r| (r.line_name.as_str(), r.station_name.as_str()))
        .collect();
    assert_eq!(
        rows,
        [
            ("s5", "S Jannowitzbrücke"),
            ("s5", "S+U Alexanderplatz"),
            ("s5", "S Hackescher Markt"),
            ("u2", "U Klosterstraße"),
            ("u2", "S+U Alexanderplatz"),
        ]
    );
}

#[tokio::test]
async fn spelling_variants_share_one_lookup() {
    let groups = [
        group("u2", &["S+U Alexanderplatz", "U Klosterstraße"]),
        group("u5", &["S+U  Alexanderplatz", "s+u alexanderplatz"]),
    ];
    let resolver = resolver(berlin());

    let report = run(&groups, &resolver, &PipelineConfig::default()).await;

    assert_eq!(
        resolver.geocoder().calls(),
        ["S+U Alexanderplatz", "U Klosterstraße"]
    );
    assert_eq!(report.stats.lookups, 2);
    assert_eq!(report.stats.cache_hits, 2);

    // Each row keeps the name as written in its source list.
    let u5 = &report.lines[1];
    assert_eq!(station_names(u5), ["S+U  Alexanderplatz", "s+u alexanderplatz"]);
    assert_eq!(u5.stations()[0].lat, u5.stations()[1].lat);
}

#[tokio::test]
async fn failed_station_is_left_out_and_run_continues() {
    let groups = [group(
        "u2",
        &["S+U Alexanderplatz", "Nirgendwo", "U Klosterstraße"],
    )];
    let resolver = resolver(berlin());

    let report = run(&groups, &resolver, &PipelineConfig::default()).await;

    assert_eq!(
        station_names(&report.lines[0]),
        ["S+U Alexanderplatz", "U Klosterstraße"]
    );
    assert!(report.rows.iter().all(|r| r.station_name != "Nirgendwo"));
    assert!(report.rows.iter().all(|r| r.lat != 0.0 || r.lng != 0.0));

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].line_id, "u2");
    assert_eq!(report.skipped[0].raw_name, "Nirgendwo");
    assert!(matches!(report.skipped[0].reason, SkipReason::LookupFailed(_)));
}

#[tokio::test]
async fn failed_key_is_not_retried_on_later_lines() {
    let groups = [
        group("u2", &["Nirgendwo"]),
        group("u5", &["NIRGENDWO"]),
    ];
    let resolver = resolver(berlin());

    let report = run(&groups, &resolver, &PipelineConfig::default()).await;

    assert_eq!(resolver.geocoder().call_count(), 1);
    assert!(report.lines.is_empty());
    assert_eq!(report.skipped.len(), 2);
    assert!(matches!(
        report.skipped[1].reason,
        SkipReason::PreviouslyFailed(_)
    ));
}

#[tokio::test]
async fn transient_failure_retried_when_configured() {
    let geocoder = MockGeocoder::new().with(
        "S+U Alexanderplatz",
        &[Reply::Unavailable, Reply::Found(52.5219, 13.4132)],
    );
    let config = PipelineConfig::default().with_max_retries(2);
    let resolver = build_resolver(geocoder, StationCache::new(), &config);

    let report = run(&[group("u2", &["S+U Alexanderplatz"])], &resolver, &config).await;

    assert_eq!(report.stats.resolved, 1);
    assert_eq!(report.stats.lookups, 2);
}

#[tokio::test]
async fn concurrency_does_not_change_output() {
    let groups = [
        group(
            "u2",
            &["S+U Alexanderplatz", "U Klosterstraße", "Nirgendwo", "U Märkisches Museum"],
        ),
        group(
            "s5",
            &["S+U Friedrichstraße", "S+U Alexanderplatz", "S Hackescher Markt", "S Jannowitzbrücke"],
        ),
    ];

    let serial = run(&groups, &resolver(berlin()), &PipelineConfig::default()).await;

    let config = PipelineConfig::default().with_concurrency(4);
    let parallel_resolver = build_resolver(berlin(), StationCache::new(), &config);
    let parallel = run(&groups, &parallel_resolver, &config).await;

    assert_eq!(serial.lines, parallel.lines);
    assert_eq!(serial.rows, parallel.rows);
    assert_eq!(serial.skipped.len(), parallel.skipped.len());

    let mut calls = parallel_resolver.geocoder().calls();
    calls.sort();
    calls.dedup();
    assert_eq!(calls.len(), parallel_resolver.geocoder().call_count());
}

#[tokio::test(start_paused = true)]
async fn same_key_in_flight_is_looked_up_once() {
    let groups = [group(
        "u2",
        &[
            "S+U Alexanderplatz",
            "s+u alexanderplatz",
            "U Klosterstraße",
            "U Klosterstrasse",
        ],
    )];
    let config = PipelineConfig::default().with_concurrency(4);
    let geocoder = berlin().with_latency(Duration::from_millis(50));
    let resolver = build_resolver(geocoder, StationCache::new(), &config);

    let report = run(&groups, &resolver, &config).await;

    assert_eq!(
        resolver.geocoder().calls(),
        ["S+U Alexanderplatz", "U Klosterstraße"]
    );
    assert_eq!(report.rows.len(), 4);
    assert_eq!(report.stats.lookups, 2);
    assert_eq!(report.stats.cache_hits, 2);
    assert_eq!(
        station_names(&report.lines[0]),
        [
            "S+U Alexanderplatz",
            "s+u alexanderplatz",
            "U Klosterstraße",
            "U Klosterstrasse",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn deadline_leaves_later_stations_out() {
    let groups = [group(
        "u2",
        &["S+U Alexanderplatz", "U Klosterstraße", "U Märkisches Museum"],
    )];
    let config = PipelineConfig::default().with_deadline(Duration::from_millis(150));
    let geocoder = berlin().with_latency(Duration::from_millis(100));
    let resolver = build_resolver(geocoder, StationCache::new(), &config);

    let report = run(&groups, &resolver, &config).await;

    assert_eq!(report.stats.resolved, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].raw_name, "U Märkisches Museum");
    assert_eq!(report.skipped[0].reason, SkipReason::DeadlineExceeded);
}

#[tokio::test]
async fn hashed_colors_are_stable_across_input_order() {
    let config = PipelineConfig::default().with_color_scheme(ColorScheme::Hashed);

    let forward = [group("u2", &["U Klosterstraße"]), group("s5", &["S Hackescher Markt"])];
    let backward = [group("s5", &["S Hackescher Markt"]), group("u2", &["U Klosterstraße"])];

    let a = run(&forward, &build_resolver(berlin(), StationCache::new(), &config), &config).await;
    let b = run(&backward, &build_resolver(berlin(), StationCache::new(), &config), &config).await;

    let colors = |report: &RunReport| -> HashMap<String, String> {
        report
            .lines
            .iter()
            .map(|l| (l.name().to_string(), l.color().to_string()))
            .collect()
    };
    assert_eq!(colors(&a), colors(&b));
}

#[tokio::test]
async fn malformed_rows_are_counted() {
    let mut u2 = group("u2", &["S+U Alexanderplatz"]);
    u2.malformed_rows = 2;
    let resolver = resolver(berlin());

    let report = run(&[u2], &resolver, &PipelineConfig::default()).await;

    assert_eq!(report.stats.malformed_rows, 2);
    assert_eq!(report.stats.records, 1);
}

#[tokio::test]
async fn geocode_dir_writes_loadable_dataset() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_list(input.path(), "u2", &["S+U Alexanderplatz", "U Klosterstraße", "Nirgendwo"]);
    write_list(input.path(), "s5", &["S Hackescher Markt", "S+U Alexanderplatz"]);
    let output = out.path().join("stations.csv");

    let report = geocode_dir_with(berlin(), input.path(), &output, &PipelineConfig::default())
        .await
        .unwrap();
    assert_eq!(report.stats.resolved, 4);

    // Files are read in name order, so s5 comes first.
    let loaded = load_path(&output, ColorScheme::Palette).unwrap();
    assert_eq!(loaded.malformed_rows, 0);
    assert_eq!(loaded.lines.len(), 2);
    assert_eq!(loaded.lines[0].name(), "s5");
    assert_eq!(
        station_names(&loaded.lines[1]),
        ["S+U Alexanderplatz", "U Klosterstraße"]
    );
}

#[tokio::test]
async fn rerun_with_cache_file_does_no_lookups() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_list(input.path(), "u2", &["S+U Alexanderplatz", "U Klosterstraße"]);
    let cache_path = out.path().join("cache").join("geocode.json");
    let config = PipelineConfig::default().with_cache_file(CacheFileConfig::new(&cache_path));

    let first_output = out.path().join("first.csv");
    let first = geocode_dir_with(berlin(), input.path(), &first_output, &config)
        .await
        .unwrap();
    assert_eq!(first.stats.lookups, 2);
    assert!(cache_path.exists());

    let second_output = out.path().join("second.csv");
    let second = geocode_dir_with(MockGeocoder::new(), input.path(), &second_output, &config)
        .await
        .unwrap();
    assert_eq!(second.stats.lookups, 0);
    assert_eq!(second.stats.cache_hits, 2);
    assert_eq!(
        std::fs::read_to_string(&first_output).unwrap(),
        std::fs::read_to_string(&second_output).unwrap()
    );
}

#[tokio::test]
async fn missing_input_dir_aborts() {
    let out = tempfile::tempdir().unwrap();
    let missing: PathBuf = out.path().join("nope");

    let result = geocode_dir_with(
        MockGeocoder::new(),
        &missing,
        &out.path().join("stations.csv"),
        &PipelineConfig::default(),
    )
    .await;

    assert!(matches!(
        result,
        Err(PipelineError::Dataset(DatasetError::SourceUnavailable { .. }))
    ));
    assert!(!out.path().join("stations.csv").exists());
}

#[tokio::test]
async fn geocode_dir_against_http_endpoint() {
    use axum::extract::Query;
    use axum::routing::get;
    use axum::{Json, Router};

    async fn search(Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
        let q = params.get("q").cloned().unwrap_or_default();
        if q.starts_with("S+U Alexanderplatz") {
            Json(serde_json::json!([{ "lat": "52.5219", "lon": "13.4132" }]))
        } else {
            Json(serde_json::json!([]))
        }
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, Router::new().route("/search", get(search)))
            .await
            .unwrap();
    });

    let input = tempfile::tempdir().unwrap();
    write_list(input.path(), "u2", &["S+U Alexanderplatz", "Nirgendwo"]);
    let output = input.path().join("out").join("stations.csv");
    std::fs::create_dir_all(output.parent().unwrap()).unwrap();

    let geocode = GeocodeConfig::new()
        .with_base_url(format!("http://{addr}/search"))
        .with_min_interval(Duration::from_millis(1));
    let report = geocode_dir(input.path(), &output, &PipelineConfig::new(geocode))
        .await
        .unwrap();

    assert_eq!(report.stats.resolved, 1);
    assert_eq!(report.skipped.len(), 1);
    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.starts_with("line_name,station_name,lat,lng"));
    assert!(written.contains("u2,S+U Alexanderplatz,52.5219,13.4132"));
}
