// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build numbers are dense per job, never reused, and unique under
//! concurrent creation.

use crate::prelude::*;
use std::collections::BTreeSet;

#[tokio::test]
async fn builds_are_numbered_from_one() {
    let (_dir, frontend) = local_frontend();
    let job = frontend.create_job(named_config("seq")).unwrap().job_id;

    let first = frontend.create_build(&job).await.unwrap();
    let second = frontend.create_build(&job).await.unwrap();

    assert_eq!(first.build_number, BuildNumber(1));
    assert_eq!(second.build_number, BuildNumber(2));
    assert_eq!(second.job_id, job);
}

#[tokio::test]
async fn each_job_has_its_own_sequence() {
    let (_dir, frontend) = local_frontend();
    let a = frontend.create_job(named_config("a")).unwrap().job_id;
    let b = frontend.create_job(named_config("b")).unwrap().job_id;
    assert_ne!(a, b);

    frontend.create_build(&a).await.unwrap();
    frontend.create_build(&a).await.unwrap();

    assert_eq!(frontend.create_build(&b).await.unwrap().build_number, BuildNumber(1));
    assert_eq!(frontend.create_build(&a).await.unwrap().build_number, BuildNumber(3));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_builds_get_distinct_numbers() {
    init_tracing();
    const TASKS: u64 = 8;
    const PER_TASK: u64 = 10;

    let (_dir, frontend) = local_frontend();
    let frontend = Arc::new(frontend);
    let job = frontend.create_job(named_config("race")).unwrap().job_id;

    let mut handles = Vec::new();
    for _ in 0..TASKS {
        let (frontend, job) = (Arc::clone(&frontend), job.clone());
        handles.push(tokio::spawn(async move {
            let mut numbers = Vec::new();
            for _ in 0..PER_TASK {
                numbers.push(frontend.create_build(&job).await.unwrap().build_number.get());
            }
            numbers
        }));
    }

    let mut all = BTreeSet::new();
    for handle in handles {
        let numbers = handle.await.unwrap();
        assert!(numbers.windows(2).all(|w| w[0] < w[1]), "not increasing within a caller: {:?}", numbers);
        all.extend(numbers);
    }
    assert_eq!(all, (1..=TASKS * PER_TASK).collect::<BTreeSet<_>>());
    assert_eq!(frontend.list_builds(&job).unwrap().len() as u64, TASKS * PER_TASK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_jobs_get_distinct_ids() {
    let (_dir, frontend) = local_frontend();
    let frontend = Arc::new(frontend);

    let mut handles = Vec::new();
    for i in 0..16 {
        let frontend = Arc::clone(&frontend);
        handles.push(tokio::spawn(async move { frontend.create_job(named_config(&format!("job{}", i))).unwrap() }));
    }

    let mut ids = BTreeSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap().job_id.to_string());
    }
    assert_eq!(ids.len(), 16);
    assert_eq!(frontend.list_jobs().unwrap().len(), 16);
}

#[tokio::test]
async fn deleted_build_numbers_are_not_reissued() {
    let (_dir, frontend) = local_frontend();
    let job = frontend.create_job(named_config("gaps")).unwrap().job_id;
    frontend.create_build(&job).await.unwrap();
    let second = frontend.create_build(&job).await.unwrap().build_number;

    frontend.delete_build(&job, second).await.unwrap();
    let err = frontend.get_build(&job, second).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert_eq!(frontend.create_build(&job).await.unwrap().build_number, BuildNumber(3));
    let numbers: Vec<_> = frontend.list_builds(&job).unwrap().iter().map(|b| b.number).collect();
    assert_eq!(numbers, vec![BuildNumber(1), BuildNumber(3)]);
}

#[tokio::test]
async fn builds_of_unknown_jobs_are_not_allocated() {
    let (_dir, frontend) = local_frontend();

    let err = frontend.create_build(&JobId::from_seq(9)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let job = frontend.create_job(named_config("first")).unwrap().job_id;
    assert_eq!(job, "job-1");
    assert_eq!(frontend.create_build(&job).await.unwrap().build_number, BuildNumber(1));
}
