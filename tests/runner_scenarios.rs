//! End-to-end runs against the simulated arm

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use waypoint_runner::{
    ArmCall, FailurePolicy, LibraryConfig, Pose, RunnerConfig, RunnerError, SimulatedArm,
    WaypointRunner, WaypointSet,
};

const TWO_POINTS: &str = r#"{"home": [0,0,0,0,0,0], "p1": [100,50,75,0,0,0]}"#;

fn write_workspace(dir: &Path, waypoints: &str) -> PathBuf {
    fs::write(dir.join("waypoints.json"), waypoints).unwrap();
    let config_path = dir.join("runner.yaml");
    fs::write(
        &config_path,
        "library:\n  path: lib/libRM_Base.so\nconnection:\n  host: 10.0.0.7\n  port: 8080\nwaypoints:\n  path: waypoints.json\n",
    )
    .unwrap();
    config_path
}

fn moves(arm: &SimulatedArm) -> Vec<Pose> {
    arm.commanded_poses()
}

fn closes(arm: &SimulatedArm) -> usize {
    arm.calls()
        .iter()
        .filter(|c| matches!(c, ArmCall::SocketClose { .. }))
        .count()
}

#[test]
fn test_two_waypoints_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunnerConfig::load_from_path(&write_workspace(dir.path(), TWO_POINTS)).unwrap();
    let waypoints = WaypointSet::load(&config.waypoints.path).unwrap();

    let arm = SimulatedArm::new();
    let report = WaypointRunner::new(&config)
        .execute(&waypoints, |_| Ok(&arm))
        .unwrap();

    assert_eq!(
        moves(&arm),
        vec![Pose::default(), Pose::new(100.0, 50.0, 75.0, 0.0, 0.0, 0.0)]
    );
    assert_eq!(closes(&arm), 1);
    assert_eq!(arm.calls().last(), Some(&ArmCall::SocketClose { handle: 1 }));
    assert_eq!(report.completed, vec!["home", "p1"]);
    assert!(matches!(
        &arm.calls()[0],
        ArmCall::SocketStart { host, .. } if host == "10.0.0.7"
    ));
}

#[test]
fn test_close_once_regardless_of_motion_status() {
    let waypoints = WaypointSet::from_json_str(TWO_POINTS).unwrap();
    let mut config = RunnerConfig::default();
    config.motion.on_failure = FailurePolicy::Continue;

    for statuses in [[0, 0], [1, 0], [0, 1], [2, 3]] {
        let arm = SimulatedArm::new().with_motion_statuses(statuses);
        let report = WaypointRunner::new(&config).run(&arm, &waypoints).unwrap();

        assert_eq!(moves(&arm).len(), 2, "statuses {:?}", statuses);
        assert_eq!(moves(&arm)[0], Pose::default());
        assert_eq!(closes(&arm), 1, "statuses {:?}", statuses);
        assert!(matches!(arm.calls().last(), Some(ArmCall::SocketClose { .. })));
        assert_eq!(
            report.failed.len(),
            statuses.iter().filter(|&&s| s != 0).count()
        );
    }
}

#[test]
fn test_execution_order_matches_file_order() {
    let orderings = [
        r#"{"a": [1,0,0,0,0,0], "b": [2,0,0,0,0,0], "c": [3,0,0,0,0,0]}"#,
        r#"{"c": [3,0,0,0,0,0], "a": [1,0,0,0,0,0], "b": [2,0,0,0,0,0]}"#,
        r#"{"b": [2,0,0,0,0,0], "c": [3,0,0,0,0,0], "a": [1,0,0,0,0,0]}"#,
    ];
    let config = RunnerConfig::default();

    for json in orderings {
        let waypoints = WaypointSet::from_json_str(json).unwrap();
        let arm = SimulatedArm::new();
        let report = WaypointRunner::new(&config).run(&arm, &waypoints).unwrap();

        let sent: Vec<f32> = moves(&arm).iter().map(|p| p.px).collect();
        let expected: Vec<f32> = waypoints.iter().map(|w| w.pose.px).collect();
        assert_eq!(sent, expected);
        assert_eq!(report.completed, waypoints.labels());
    }
}

#[test]
fn test_short_entry_never_reaches_the_arm() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_workspace(
        dir.path(),
        r#"{"home": [0,0,0,0,0,0], "p1": [100,50,75,0,0]}"#,
    );
    let config = RunnerConfig::load_from_path(&config_path).unwrap();

    let err = WaypointSet::load(&config.waypoints.path).unwrap_err();
    assert!(matches!(err, RunnerError::DataFormat(_)));
    assert_eq!(err.exit_code(), 5);
}

#[test]
fn test_refused_connection_sends_nothing_else() {
    let waypoints = WaypointSet::from_json_str(TWO_POINTS).unwrap();
    let config = RunnerConfig::default();
    let arm = SimulatedArm::new().with_connect_result(-3);

    let err = WaypointRunner::new(&config)
        .execute(&waypoints, |_| Ok(&arm))
        .unwrap_err();

    assert!(matches!(err, RunnerError::Connection { code: -3, .. }));
    assert_eq!(arm.calls().len(), 1);
    assert!(matches!(arm.calls()[0], ArmCall::SocketStart { .. }));
}

#[test]
fn test_library_failure_sends_nothing() {
    let waypoints = WaypointSet::from_json_str(TWO_POINTS).unwrap();
    let mut config = RunnerConfig::default();
    config.library.path = PathBuf::from("/nonexistent/libRM_Base.so");
    let arm = SimulatedArm::new();

    let mut load_attempts = 0;

    // The arm is only handed to the runner if the library loads.
    let err = WaypointRunner::new(&config)
        .execute(&waypoints, |lib: &LibraryConfig| {
            load_attempts += 1;
            waypoint_runner::library::acquire(&lib.path, lib.init_mode).map(|_| &arm)
        })
        .unwrap_err();

    assert_eq!(load_attempts, 1);
    assert!(matches!(err, RunnerError::LibraryLoad { .. }));
    assert_ne!(err.exit_code(), 0);
    assert!(arm.calls().is_empty());
}

#[test]
fn test_stop_signal_before_run() {
    let waypoints = WaypointSet::from_json_str(TWO_POINTS).unwrap();
    let config = RunnerConfig::default();
    let stop = AtomicBool::new(true);
    let arm = SimulatedArm::new();

    let report = WaypointRunner::new(&config)
        .with_stop_signal(&stop)
        .run(&arm, &waypoints)
        .unwrap();

    assert!(report.stopped);
    assert!(!report.is_success());
    assert!(moves(&arm).is_empty());
    assert_eq!(closes(&arm), 1);
}

#[test]
fn test_bundled_config_and_waypoints_load() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let config = RunnerConfig::load_from_path(&root.join("config/default_config.yaml")).unwrap();
    let waypoints = WaypointSet::load(&config.waypoints.path).unwrap();

    assert_eq!(waypoints.labels(), vec!["home", "p1"]);
    assert!(WaypointRunner::new(&config).preflight(&waypoints).is_ok());
}
