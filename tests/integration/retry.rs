//! Busy back-off and timeout re-requests.

use btmesh_conf::{ConfRequest, Config, Error, Job, MeshEvent, Task, TaskResult, TaskTree};

use crate::fixtures::{self, recorder};

fn immediate_retry_config() -> Config {
    Config {
        busy_retry_limit: 2,
        busy_retry_interval_ms: 0,
        timeout_retry_limit: 2,
        ..Config::default()
    }
}

#[test]
fn test_busy_stack_is_retried_on_step() {
    let mut conf = fixtures::configurator(immediate_retry_config());
    conf.stack_mut().reject_next(Error::NoMoreResource);
    let (seen, callback) = recorder();
    conf.reset_node(0, 0x0042, Some(callback)).unwrap();
    assert_eq!(conf.stack().sent.len(), 1);
    assert_eq!(conf.stack().sent[0].handle, None);

    conf.step();
    assert_eq!(conf.stack().sent.len(), 2);
    let handle = conf.stack().last_handle();
    conf.on_event(&MeshEvent::ResetStatus { handle, result: Ok(()) })
        .unwrap();
    assert_eq!(*seen.borrow(), vec![(0x0042, TaskResult::Ok)]);
}

#[test]
fn test_busy_limit_fails_job() {
    let mut conf = fixtures::configurator(immediate_retry_config());
    for _ in 0..3 {
        conf.stack_mut().reject_next(Error::NoMoreResource);
    }
    let (seen, callback) = recorder();
    conf.reset_node(0, 0x0042, Some(callback)).unwrap();
    conf.step();
    conf.step();

    assert_eq!(conf.stack().sent.len(), 3);
    assert_eq!(
        *seen.borrow(),
        vec![(0x0042, TaskResult::Failed(Error::NoMoreResource))]
    );
    conf.step();
    assert_eq!(conf.stack().sent.len(), 3);
}

#[test]
fn test_backoff_waits_for_interval() {
    let config = Config {
        busy_retry_interval_ms: 60_000,
        ..Config::default()
    };
    let mut conf = fixtures::configurator(config);
    conf.stack_mut().reject_next(Error::NoMoreResource);
    conf.reset_node(0, 0x0042, None).unwrap();
    conf.step();
    assert_eq!(conf.stack().sent.len(), 1);
    assert_eq!(conf.active_job_count(), 1);
}

#[test]
fn test_rejected_request_fails_without_retry() {
    let mut conf = fixtures::configurator(immediate_retry_config());
    conf.stack_mut().reject_next(Error::InvalidParameter);
    let (seen, callback) = recorder();
    conf.reset_node(0, 0x0042, Some(callback)).unwrap();

    assert_eq!(conf.stack().sent.len(), 1);
    assert_eq!(
        *seen.borrow(),
        vec![(0x0042, TaskResult::Failed(Error::InvalidParameter))]
    );
}

#[test]
fn test_timeout_is_retried_then_fails() {
    let mut conf = fixtures::configurator(immediate_retry_config());
    let (seen, callback) = recorder();
    conf.reset_node(0, 0x0042, Some(callback)).unwrap();

    for _ in 0..3 {
        let handle = conf.stack().last_handle();
        conf.on_event(&MeshEvent::ResetStatus {
            handle,
            result: Err(Error::Timeout),
        })
        .unwrap();
    }

    assert_eq!(conf.stack().requests(), vec![ConfRequest::ResetNode; 3]);
    assert_eq!(
        *seen.borrow(),
        vec![(0x0042, TaskResult::Failed(Error::Timeout))]
    );
}

#[test]
fn test_retried_list_starts_from_empty() {
    let mut conf = fixtures::configurator(immediate_retry_config());
    let job = Job::new(
        0,
        0x0042,
        TaskTree::with_root(Task::appkey_list(0)),
        None,
        0,
        false,
    );
    let id = conf.submit_job(job).unwrap();

    let handle = conf.stack().last_handle();
    conf.on_event(&MeshEvent::AppkeyList {
        handle,
        appkey_indices: vec![0x09, 0x00],
    })
    .unwrap();
    conf.on_event(&MeshEvent::AppkeyListEnd {
        handle,
        result: Err(Error::Timeout),
    })
    .unwrap();

    let handle = conf.stack().last_handle();
    conf.on_event(&MeshEvent::AppkeyList {
        handle,
        appkey_indices: vec![0x01, 0x00],
    })
    .unwrap();
    conf.on_event(&MeshEvent::AppkeyListEnd { handle, result: Ok(()) })
        .unwrap();

    let job = conf.take_finished_job(id).unwrap();
    assert_eq!(job.current_task().unwrap().collected(), Some(&[1u16][..]));
}
