//! Submission limits, auto-destroy and configuration loading.

use std::rc::Rc;

use btmesh_conf::mesh::models::{SigModelInfo, SIG_MODELS};
use btmesh_conf::{Config, Configurator, Error, Job, MemoryNodeDb, Task, TaskTree};
use tempfile::TempDir;

use crate::fixtures::{self, RecordingStack};

fn tracked_job(marker: &Rc<()>, auto_destroy: bool) -> Box<Job> {
    let held = Rc::clone(marker);
    Job::new(
        0,
        0x0042,
        TaskTree::with_root(Task::reset_node()),
        Some(Box::new(move |_job: &Job| {
            assert!(Rc::strong_count(&held) >= 2);
        })),
        0,
        auto_destroy,
    )
}

#[test]
fn test_full_queue_destroys_job_once() {
    let config = Config {
        wait_queue_limit: 0,
        ..Config::default()
    };
    let mut conf = fixtures::configurator(config);
    let marker = Rc::new(());

    let err = conf.submit_job(tracked_job(&marker, true)).unwrap_err();
    assert_eq!(err.error, Error::NoMoreResource);
    assert!(err.job.is_none());
    assert_eq!(Rc::strong_count(&marker), 1);
    assert!(conf.stack().sent.is_empty());
}

#[test]
fn test_full_queue_hands_job_back_without_auto_destroy() {
    let config = Config {
        wait_queue_limit: 0,
        auto_destroy_on_submit_failure: false,
        ..Config::default()
    };
    let mut conf = fixtures::configurator(config);
    let marker = Rc::new(());

    let err = conf.submit_job(tracked_job(&marker, true)).unwrap_err();
    let job = err.job.expect("job should be handed back");
    assert_eq!(Rc::strong_count(&marker), 2);
    drop(job);
    assert_eq!(Rc::strong_count(&marker), 1);
}

#[test]
fn test_convenience_jobs_always_destroyed_on_failure() {
    let config = Config {
        wait_queue_limit: 0,
        auto_destroy_on_submit_failure: false,
        ..Config::default()
    };
    let mut conf = fixtures::configurator(config);
    let marker = Rc::new(());
    let held = Rc::clone(&marker);

    let result = conf.dcd_get(
        0,
        0x0042,
        0,
        Some(Box::new(move |_job: &Job| {
            assert!(Rc::strong_count(&held) >= 2);
        })),
    );
    assert_eq!(result, Err(Error::NoMoreResource));
    assert_eq!(Rc::strong_count(&marker), 1);
    assert_eq!(conf.reset_node(0, 0x0042, None), Err(Error::NoMoreResource));
}

#[test]
fn test_submit_before_init_fails() {
    let mut conf = Configurator::new(
        Config::default(),
        RecordingStack::default(),
        MemoryNodeDb::new(),
    );
    let marker = Rc::new(());
    let err = conf.submit_job(tracked_job(&marker, true)).unwrap_err();
    assert_eq!(err.error, Error::InvalidState);
    assert_eq!(Rc::strong_count(&marker), 1);
    assert_eq!(conf.reset_node(0, 1, None), Err(Error::InvalidState));
}

#[test]
fn test_deinit_drops_running_jobs() {
    let mut conf = fixtures::configurator(Config::default());
    let marker = Rc::new(());
    conf.submit_job(tracked_job(&marker, true)).unwrap();
    assert_eq!(Rc::strong_count(&marker), 2);

    conf.deinit().unwrap();
    assert!(!conf.is_initialized());
    assert_eq!(Rc::strong_count(&marker), 1);
    assert_eq!(conf.active_job_count(), 0);
}

#[test]
fn test_prov_initialized_pushes_timeouts() {
    let config = Config {
        request_timeout_ms: 2500,
        lpn_request_timeout_ms: 30_000,
        ..Config::default()
    };
    let conf = fixtures::configurator(config);
    assert!(conf.is_initialized());
    assert_eq!(conf.stack().timeouts, vec![(2500, 30_000)]);
}

#[test]
fn test_unsorted_model_table_blocks_init() {
    static TABLE: [SigModelInfo; 2] = [
        SigModelInfo {
            model_id: 0x1001,
            name: "GenericOnOffClient",
            attributes: 7,
        },
        SigModelInfo {
            model_id: 0x1000,
            name: "GenericOnOffServer",
            attributes: 7,
        },
    ];
    let mut conf = Configurator::new(
        Config::default(),
        RecordingStack::default(),
        MemoryNodeDb::new(),
    )
    .with_model_table(&TABLE);
    assert_eq!(conf.init(), Err(Error::InvalidConfiguration));

    let mut conf = Configurator::new(
        Config::default(),
        RecordingStack::default(),
        MemoryNodeDb::new(),
    )
    .with_model_table(SIG_MODELS);
    assert_eq!(conf.init(), Ok(()));
    assert_eq!(conf.sig_model_id_to_string(0x1300), "LightLightnessServer");
}

#[test]
fn test_config_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("btmesh-conf.toml");

    let config = Config {
        executor_count: 2,
        busy_retry_limit: 9,
        ..Config::default()
    };
    config.save_to(&path).unwrap();
    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);

    let mut conf = Configurator::new(loaded, RecordingStack::default(), MemoryNodeDb::new());
    conf.init().unwrap();
    assert_eq!(conf.config().executor_count, 2);
}
