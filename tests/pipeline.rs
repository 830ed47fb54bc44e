//! End-to-end pipeline tests.
//!
//! Record an episode in the builtin kinematic environment, push it through
//! the store, and verify that retrieval at other control frequencies and
//! observation modes rebuilds equivalent demonstrations.

use demoforge::demo::{Demo, DemoRecorder, ObservationMode};
use demoforge::env::kinematic::{self, ENV_NAME, ROBOT_NAME};
use demoforge::env::{ActionModeConfig, Environment, CONTROL_FREQUENCY_MAX};
use demoforge::store::DemoStore;
use demoforge::StoreError;
use ndarray::Array1;
use tempfile::TempDir;

fn build_env(frequency: u32) -> Box<dyn Environment> {
    kinematic::builtin_registry()
        .build_env(
            ENV_NAME,
            ROBOT_NAME,
            ActionModeConfig::joint_position(false),
            vec![],
            frequency,
        )
        .expect("environment should build")
}

fn build_store(root: &TempDir) -> DemoStore {
    DemoStore::new(root.path(), kinematic::builtin_registry()).expect("store should open")
}

/// Record `steps` environment steps with a slow sweep on the limb joints.
fn record_demo(seed: u64, steps: usize) -> Demo {
    let mut env = build_env(CONTROL_FREQUENCY_MAX);
    env.reset(seed).expect("reset");
    let mut recorder = DemoRecorder::new(None).expect("recorder");
    recorder.record(env.as_ref(), false);

    let layout = env.robot().layout(env.action_mode());
    for i in 0..steps {
        let mut action = Array1::zeros(layout.dim());
        for dim in layout.limb_range() {
            action[dim] = 0.002 * ((i % 3) as f64);
        }
        action[layout.gripper_range().start] = if i < steps / 2 { 0.0 } else { 1.0 };
        let outcome = env.step(&action).expect("step");
        recorder.add_timestep(outcome, action);
    }
    recorder.stop();
    recorder.demo().expect("demo").clone()
}

#[test]
fn test_store_round_trip_preserves_episode() {
    let root = TempDir::new().expect("temp dir");
    let store = build_store(&root);
    let demo = record_demo(42, 30);
    store.cache_demo(&demo, None).expect("cache");

    let demos = store
        .get_demos(demo.metadata(), Some(1), CONTROL_FREQUENCY_MAX)
        .expect("retrieval");
    assert_eq!(demos.len(), 1);
    let loaded = &demos[0];
    assert_eq!(loaded.uuid(), demo.uuid());
    assert_eq!(loaded.seed(), demo.seed());
    assert_eq!(loaded.duration(), demo.duration());
    for (a, b) in loaded.timesteps().iter().zip(demo.timesteps()) {
        assert_eq!(a.executed_action(), b.executed_action());
        assert_eq!(a.observation, b.observation);
    }
}

#[test]
fn test_repeated_caching_never_duplicates() {
    let root = TempDir::new().expect("temp dir");
    let store = build_store(&root);
    let demo = record_demo(7, 10);

    store.cache_demo(&demo, None).expect("cache");
    store.cache_demo(&demo, None).expect("cache");
    store.cache_demo(&demo.lighten(), None).expect("cache");

    let paths = store.list_demo_paths(demo.metadata()).expect("list");
    assert_eq!(paths.len(), 1);
    let light = demo
        .metadata()
        .with_observation_mode(ObservationMode::Lightweight);
    assert_eq!(store.list_demo_paths(&light).expect("list").len(), 1);
}

#[test]
fn test_resampled_retrieval_backfills_cache() {
    let root = TempDir::new().expect("temp dir");
    let store = build_store(&root);
    let demo = record_demo(3, 1000);
    store.cache_demo(&demo, None).expect("cache");

    let demos = store.get_demos(demo.metadata(), None, 50).expect("retrieval");
    assert_eq!(demos.len(), 1);
    assert_eq!(demos[0].duration(), 100);
    assert_eq!(demos[0].uuid(), demo.uuid());

    // Second request is a pure cache hit: the file now exists at the
    // resampled key and is bitwise stable across requests
    let path = store
        .demo_path(demos[0].metadata(), Some(50))
        .expect("path");
    assert!(path.exists());
    let before = std::fs::read(&path).expect("read");
    let again = store.get_demos(demo.metadata(), None, 50).expect("retrieval");
    assert_eq!(again[0].duration(), 100);
    let after = std::fs::read(&path).expect("read");
    assert_eq!(before, after);
}

#[test]
fn test_lightweight_only_cache_serves_full_requests() {
    let root = TempDir::new().expect("temp dir");
    let store = build_store(&root);
    let demo = record_demo(12, 200);
    // Simulate a distribution that ships only raw actions
    store.cache_demo(&demo.lighten(), None).expect("cache");

    let demos = store.get_demos(demo.metadata(), None, 100).expect("retrieval");
    assert_eq!(demos.len(), 1);
    let rebuilt = &demos[0];
    assert!(!rebuilt.is_lightweight());
    assert_eq!(rebuilt.duration(), 40);
    assert_eq!(rebuilt.uuid(), demo.uuid());
    for step in rebuilt.timesteps() {
        assert!(step.observation.contains_key("proprioception_qpos"));
        assert!(step.reward.is_some());
    }

    // Second identical request is served from the backfilled cache: the
    // stored file does not change
    let path = store
        .demo_path(rebuilt.metadata(), Some(100))
        .expect("path");
    let before = std::fs::read(&path).expect("read");
    store.get_demos(demo.metadata(), None, 100).expect("retrieval");
    assert_eq!(before, std::fs::read(&path).expect("read"));
}

#[test]
fn test_missing_key_reports_not_found() {
    let root = TempDir::new().expect("temp dir");
    let store = build_store(&root);
    let demo = record_demo(1, 5);
    let result = store.get_demos(demo.metadata(), None, 50);
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}
