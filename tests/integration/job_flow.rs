//! Task chains driven through the configurator.

use std::cell::Cell;
use std::rc::Rc;

use btmesh_conf::{
    ConfRequest, Config, Error, Job, MeshEvent, ModelTarget, Task, TaskResult, TaskTree,
};

use crate::fixtures::{self, recorder};

#[test]
fn test_appkey_add_then_bind_completes() {
    let mut conf = fixtures::configurator(Config::default());
    let calls = Rc::new(Cell::new(0));
    let marker = Rc::new(());

    let mut tree = TaskTree::new();
    let add = tree.add_task(Task::appkey_add(0, 0));
    let bind = tree.add_task(Task::model_bind(ModelTarget::sig(0, 0x1000), 0));
    tree.set_next_on_success(add, bind).unwrap();

    let seen = Rc::clone(&calls);
    let held = Rc::clone(&marker);
    let job = Job::new(
        0,
        0x0042,
        tree,
        Some(Box::new(move |job: &Job| {
            assert!(Rc::strong_count(&held) >= 2);
            assert_eq!(job.result(), TaskResult::Ok);
            seen.set(seen.get() + 1);
        })),
        0,
        true,
    );
    conf.submit_job(job).unwrap();

    let sent = &conf.stack().sent;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].server_address, 0x0042);
    assert_eq!(
        sent[0].request,
        ConfRequest::AddAppkey {
            appkey_index: 0,
            netkey_index: 0
        }
    );

    let handle = conf.stack().last_handle();
    conf.on_event(&MeshEvent::AppkeyStatus { handle, result: Ok(()) })
        .unwrap();
    assert_eq!(
        conf.stack().requests()[1],
        ConfRequest::BindModel {
            target: ModelTarget::sig(0, 0x1000),
            appkey_index: 0
        }
    );
    assert_eq!(calls.get(), 0);

    let handle = conf.stack().last_handle();
    conf.on_event(&MeshEvent::BindingStatus { handle, result: Ok(()) })
        .unwrap();
    assert_eq!(calls.get(), 1);
    assert_eq!(Rc::strong_count(&marker), 1);
    assert_eq!(conf.active_job_count(), 0);
}

#[test]
fn test_failure_branch_is_followed() {
    let mut conf = fixtures::configurator(Config::default());
    let (seen, callback) = recorder();

    let mut tree = TaskTree::new();
    let add = tree.add_task(Task::appkey_add(1, 0));
    let bind = tree.add_task(Task::model_bind(ModelTarget::sig(0, 0x1000), 1));
    let reset = tree.add_task(Task::reset_node());
    tree.set_next_on_success(add, bind).unwrap();
    tree.set_next_on_failure(add, reset).unwrap();
    conf.submit_job(Job::new(0, 0x0042, tree, Some(callback), 0, true))
        .unwrap();

    let handle = conf.stack().last_handle();
    conf.on_event(&MeshEvent::AppkeyStatus {
        handle,
        result: Err(Error::Stack(0x0005)),
    })
    .unwrap();
    assert_eq!(conf.stack().requests()[1], ConfRequest::ResetNode);

    let handle = conf.stack().last_handle();
    conf.on_event(&MeshEvent::ResetStatus { handle, result: Ok(()) })
        .unwrap();
    assert_eq!(*seen.borrow(), vec![(0x0042, TaskResult::Ok)]);
}

#[test]
fn test_failure_without_branch_reports_task_error() {
    let mut conf = fixtures::configurator(Config::default());
    let (seen, callback) = recorder();

    let mut tree = TaskTree::new();
    let add = tree.add_task(Task::appkey_add(1, 0));
    let bind = tree.add_task(Task::model_bind(ModelTarget::sig(0, 0x1000), 1));
    tree.set_next_on_success(add, bind).unwrap();
    conf.submit_job(Job::new(0, 0x0042, tree, Some(callback), 0, true))
        .unwrap();

    let handle = conf.stack().last_handle();
    conf.on_event(&MeshEvent::AppkeyStatus {
        handle,
        result: Err(Error::Stack(0x0004)),
    })
    .unwrap();
    assert_eq!(conf.stack().sent.len(), 1);
    assert_eq!(
        *seen.borrow(),
        vec![(0x0042, TaskResult::Failed(Error::Stack(0x0004)))]
    );
}

#[test]
fn test_unrelated_handle_is_ignored() {
    let mut conf = fixtures::configurator(Config::default());
    let (seen, callback) = recorder();
    conf.submit_job(Job::new(
        0,
        0x0042,
        TaskTree::with_root(Task::reset_node()),
        Some(callback),
        0,
        true,
    ))
    .unwrap();

    let handle = conf.stack().last_handle();
    conf.on_event(&MeshEvent::ResetStatus {
        handle: handle + 100,
        result: Ok(()),
    })
    .unwrap();
    conf.on_event(&MeshEvent::Other { id: 0x1234_00A8 }).unwrap();
    assert!(seen.borrow().is_empty());
    assert_eq!(conf.active_job_count(), 1);
}

#[test]
fn test_list_results_kept_on_parked_job() {
    let mut conf = fixtures::configurator(Config::default());
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
        appkey_indices: vec![0x01, 0x00, 0x02, 0x00],
    })
    .unwrap();
    conf.on_event(&MeshEvent::AppkeyList {
        handle,
        appkey_indices: vec![0x03, 0x00],
    })
    .unwrap();
    conf.on_event(&MeshEvent::AppkeyListEnd { handle, result: Ok(()) })
        .unwrap();

    let job = conf.take_finished_job(id).expect("job should be parked");
    assert_eq!(job.result(), TaskResult::Ok);
    let task = job.current_task().unwrap();
    assert_eq!(task.collected(), Some(&[1u16, 2, 3][..]));
    assert_eq!(
        task.to_string(),
        "appkey list (netkey_idx=0,appkey_cnt=3,appkey_idxs=1,2,3)"
    );
    assert!(conf.take_finished_job(id).is_none());
}

#[test]
fn test_malformed_list_aborts_to_failure() {
    let mut conf = fixtures::configurator(Config::default());
    let (seen, callback) = recorder();
    conf.submit_job(Job::new(
        0,
        0x0042,
        TaskTree::with_root(Task::model_sub_list(ModelTarget::sig(0, 0x1000))),
        Some(callback),
        0,
        true,
    ))
    .unwrap();

    let handle = conf.stack().last_handle();
    conf.on_event(&MeshEvent::SubsList {
        handle,
        addresses: vec![0x01, 0xC0, 0x02],
    })
    .unwrap();
    assert_eq!(
        *seen.borrow(),
        vec![(0x0042, TaskResult::Failed(Error::InvalidCount))]
    );
}

#[test]
fn test_get_task_copies_values() {
    let mut conf = fixtures::configurator(Config::default());
    let job = Job::new(
        0,
        0x0042,
        TaskTree::with_root(Task::default_ttl_get()),
        None,
        0,
        false,
    );
    let id = conf.submit_job(job).unwrap();
    let handle = conf.stack().last_handle();
    conf.on_event(&MeshEvent::DefaultTtlStatus {
        handle,
        result: Ok(()),
        value: 7,
    })
    .unwrap();

    let job = conf.take_finished_job(id).unwrap();
    assert_eq!(job.current_task().unwrap().to_string(), "default ttl get (ttl=7)");
}
