//! Per-node serialization and parallel execution across nodes.

use btmesh_conf::{Config, Job, MeshEvent, Task, TaskResult, TaskTree};

use crate::fixtures::{self, recorder};

fn reset_job(address: u16, callback: btmesh_conf::JobNotification) -> Box<Job> {
    Job::new(
        0,
        address,
        TaskTree::with_root(Task::reset_node()),
        Some(callback),
        0,
        true,
    )
}

#[test]
fn test_jobs_for_same_node_run_in_submission_order() {
    let mut conf = fixtures::configurator(Config::default());
    let (seen, _) = recorder();

    for status_param in 0..3u64 {
        let sink = std::rc::Rc::clone(&seen);
        let job = Job::new(
            0,
            0x0042,
            TaskTree::with_root(Task::friend_get()),
            Some(Box::new(move |job: &Job| {
                sink.borrow_mut()
                    .push((job.status_param as u16, job.result()));
            })),
            status_param,
            true,
        );
        conf.submit_job(job).unwrap();
    }
    assert_eq!(conf.stack().sent.len(), 1);
    assert_eq!(conf.active_job_count(), 1);
    assert_eq!(conf.waiting_job_count(), 2);

    for _ in 0..3 {
        let handle = conf.stack().last_handle();
        conf.on_event(&MeshEvent::FriendStatus {
            handle,
            result: Ok(()),
            value: 1,
        })
        .unwrap();
    }

    assert_eq!(
        *seen.borrow(),
        vec![
            (0, TaskResult::Ok),
            (1, TaskResult::Ok),
            (2, TaskResult::Ok)
        ]
    );
    assert_eq!(conf.stack().sent.len(), 3);
    assert_eq!(conf.waiting_job_count(), 0);
}

#[test]
fn test_different_nodes_run_in_parallel() {
    let mut conf = fixtures::configurator(Config::default());
    let (seen, _) = recorder();

    for address in [0x0010, 0x0011, 0x0012] {
        let sink = std::rc::Rc::clone(&seen);
        let job = reset_job(
            address,
            Box::new(move |job: &Job| {
                sink.borrow_mut().push((job.server_address(), job.result()));
            }),
        );
        conf.submit_job(job).unwrap();
    }
    assert_eq!(conf.stack().addresses(), vec![0x0010, 0x0011, 0x0012]);
    assert_eq!(conf.active_job_count(), 3);

    let handles: Vec<u32> = conf
        .stack()
        .sent
        .iter()
        .filter_map(|sent| sent.handle)
        .collect();
    for handle in handles.into_iter().rev() {
        conf.on_event(&MeshEvent::ResetStatus { handle, result: Ok(()) })
            .unwrap();
    }
    let order: Vec<u16> = seen.borrow().iter().map(|(address, _)| *address).collect();
    assert_eq!(order, vec![0x0012, 0x0011, 0x0010]);
}

#[test]
fn test_busy_node_does_not_block_other_nodes() {
    let config = Config {
        executor_count: 2,
        ..Config::default()
    };
    let mut conf = fixtures::configurator(config);
    let (seen, callback) = recorder();

    conf.submit_job(reset_job(0x0010, callback)).unwrap();
    let (_, second) = recorder();
    conf.submit_job(reset_job(0x0010, second)).unwrap();
    let (_, third) = recorder();
    conf.submit_job(reset_job(0x0020, third)).unwrap();

    assert_eq!(conf.stack().addresses(), vec![0x0010, 0x0020]);
    assert_eq!(conf.waiting_job_count(), 1);

    let first_handle = conf.stack().sent[0].handle.unwrap();
    conf.on_event(&MeshEvent::ResetStatus {
        handle: first_handle,
        result: Ok(()),
    })
    .unwrap();
    assert_eq!(*seen.borrow(), vec![(0x0010, TaskResult::Ok)]);
    assert_eq!(conf.stack().addresses(), vec![0x0010, 0x0020, 0x0010]);
    assert_eq!(conf.waiting_job_count(), 0);
}

#[test]
fn test_executor_limit_queues_extra_nodes() {
    let config = Config {
        executor_count: 1,
        ..Config::default()
    };
    let mut conf = fixtures::configurator(config);
    let (seen, callback) = recorder();
    conf.submit_job(reset_job(0x0010, callback)).unwrap();
    let (later, callback) = recorder();
    conf.submit_job(reset_job(0x0011, callback)).unwrap();

    assert_eq!(conf.stack().addresses(), vec![0x0010]);
    let handle = conf.stack().last_handle();
    conf.on_event(&MeshEvent::ResetStatus { handle, result: Ok(()) })
        .unwrap();
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(conf.stack().addresses(), vec![0x0010, 0x0011]);
    assert!(later.borrow().is_empty());
}
