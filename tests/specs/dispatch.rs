// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Forwarding builds to task frontends over HTTP. Every peer here is a
//! real frontend served by the prelude, so these tests also cover a
//! frontend acting as another frontend's task frontend.

use crate::prelude::*;
use tokio::net::TcpListener;

const PATIENT: Duration = Duration::from_secs(5);

/// A served local frontend, kept alive with its data directory.
struct Peer {
    _dir: TempDir,
    frontend: Arc<Frontend>,
    url: String,
}

async fn peer() -> Peer {
    let (dir, frontend) = local_frontend();
    let frontend = Arc::new(frontend);
    let url = serve(Arc::clone(&frontend)).await;
    Peer { _dir: dir, frontend, url }
}

/// Accepts connections and never answers.
async fn silent_peer_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    url
}

#[tokio::test]
async fn demo_scenario_runs_on_a_peer_frontend() {
    init_tracing();
    let peer = peer().await;
    let (_dir, front) = forwarding_frontend(&[peer.url.clone()], PATIENT);

    let job = front.create_job(named_config("demo")).unwrap().job_id;
    let n = front.create_build(&job).await.unwrap().build_number;
    assert_eq!(n, BuildNumber(1));

    let build = front.get_build(&job, n).unwrap();
    assert_eq!(build.status, BuildStatus::Running);
    assert_eq!(build.assigned_frontend.as_deref(), Some(peer.url.as_str()));
    let remote = build.remote.unwrap();
    assert_eq!(peer.frontend.get_job(&remote.job_id).unwrap().config, named_config("demo"));

    let id = front.put_artifact(&job, n, b"test_content", Some("text/plain")).await.unwrap().artifact_id;
    let (meta, payload) = front.get_artifact(&job, n, &id).await.unwrap();
    assert_eq!(payload, b"test_content");
    assert!(meta.is_remote());
    assert_eq!(meta.content_type, "text/plain");

    front.replace_artifact(&job, n, &id, b"test_content_modified", None).await.unwrap();
    let (_, payload) = front.get_artifact(&job, n, &id).await.unwrap();
    assert_eq!(payload, b"test_content_modified");

    // Payloads live only on the peer
    let held = peer.frontend.list_artifacts(&remote.job_id, remote.build_number).unwrap();
    assert_eq!(held.len(), 1);
    assert_eq!(held[0].size, 21);

    front.delete_artifact(&job, n, &id).await.unwrap();
    let err = front.get_artifact(&job, n, &id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(peer.frontend.list_artifacts(&remote.job_id, remote.build_number).unwrap().is_empty());
}

#[tokio::test]
async fn frontends_chain_through_each_other() {
    let leaf = peer().await;
    let (_mid_dir, mid) = forwarding_frontend(&[leaf.url.clone()], PATIENT);
    let mid_url = serve(Arc::new(mid)).await;
    let (_dir, front) = forwarding_frontend(&[mid_url], PATIENT);

    let job = front.create_job(named_config("chained")).unwrap().job_id;
    let n = front.create_build(&job).await.unwrap().build_number;
    let id = front.put_artifact(&job, n, b"deep", None).await.unwrap().artifact_id;

    let (_, payload) = front.get_artifact(&job, n, &id).await.unwrap();
    assert_eq!(payload, b"deep");

    let leaf_jobs = leaf.frontend.list_jobs().unwrap();
    assert_eq!(leaf_jobs.len(), 1);
    assert_eq!(leaf.frontend.get_job(&leaf_jobs[0]).unwrap().config, named_config("chained"));
    let leaf_builds = leaf.frontend.list_builds(&leaf_jobs[0]).unwrap();
    assert_eq!(leaf_builds.len(), 1);
    let stored = leaf.frontend.list_artifacts(&leaf_jobs[0], leaf_builds[0].number).unwrap();
    assert_eq!(stored.len(), 1);
    assert!(!stored[0].is_remote());
}

#[tokio::test]
async fn builds_stay_on_their_assigned_frontend() {
    let (a, b) = (peer().await, peer().await);
    let (_dir, front) = forwarding_frontend(&[a.url.clone(), b.url.clone()], PATIENT);
    let job = front.create_job(named_config("spread")).unwrap().job_id;

    for _ in 0..3 {
        front.create_build(&job).await.unwrap();
    }
    let assigned: Vec<_> =
        front.list_builds(&job).unwrap().into_iter().map(|b| b.assigned_frontend.unwrap()).collect();
    assert_eq!(assigned, vec![a.url.clone(), b.url.clone(), a.url.clone()]);

    front.put_artifact(&job, BuildNumber(2), b"on b", None).await.unwrap();

    let a_jobs = a.frontend.list_jobs().unwrap();
    let b_jobs = b.frontend.list_jobs().unwrap();
    assert_eq!((a_jobs.len(), b_jobs.len()), (1, 1));
    assert_eq!(a.frontend.list_builds(&a_jobs[0]).unwrap().len(), 2);
    let b_build = b.frontend.list_builds(&b_jobs[0]).unwrap().remove(0);
    assert_eq!(b.frontend.list_artifacts(&b_jobs[0], b_build.number).unwrap().len(), 1);
    for build in a.frontend.list_builds(&a_jobs[0]).unwrap() {
        assert!(a.frontend.list_artifacts(&a_jobs[0], build.number).unwrap().is_empty());
    }
}

#[tokio::test]
async fn unreachable_frontend_is_unavailable_and_writes_nothing() {
    let url = dead_peer_url().await;
    let (_dir, front) = forwarding_frontend(&[url], PATIENT);
    let job = front.create_job(named_config("down")).unwrap().job_id;

    let err = front.create_build(&job).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unavailable);

    let build = front.get_build(&job, BuildNumber(1)).unwrap();
    assert_eq!(build.status, BuildStatus::Pending);
    let err = front.put_artifact(&job, BuildNumber(1), b"lost", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unavailable);
    assert!(front.list_artifacts(&job, BuildNumber(1)).unwrap().is_empty());
}

#[tokio::test]
async fn silent_frontend_times_out_as_unavailable() {
    let url = silent_peer_url().await;
    let (_dir, front) = forwarding_frontend(&[url], Duration::from_millis(200));
    let job = front.create_job(named_config("slow")).unwrap().job_id;

    let err = front.create_build(&job).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unavailable);
    assert_eq!(front.get_build(&job, BuildNumber(1)).unwrap().status, BuildStatus::Pending);
}

#[tokio::test]
async fn remote_error_kinds_are_preserved() {
    let peer = peer().await;
    let (_dir, front) = forwarding_frontend(&[peer.url.clone()], PATIENT);
    let job = front.create_job(named_config("kinds")).unwrap().job_id;
    let n = front.create_build(&job).await.unwrap().build_number;
    let id = front.put_artifact(&job, n, b"gone soon", None).await.unwrap().artifact_id;

    // Remove the payload behind the front's back
    let remote = front.get_build(&job, n).unwrap().remote.unwrap();
    let held = peer.frontend.list_artifacts(&remote.job_id, remote.build_number).unwrap();
    peer.frontend.delete_artifact(&remote.job_id, remote.build_number, &held[0].id).await.unwrap();

    let err = front.get_artifact(&job, n, &id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(err, FrontendError::Dispatch(_)));
}

#[tokio::test]
async fn deleting_a_build_removes_it_from_the_peer() {
    let peer = peer().await;
    let (_dir, front) = forwarding_frontend(&[peer.url.clone()], PATIENT);
    let job = front.create_job(named_config("cleanup")).unwrap().job_id;
    let n = front.create_build(&job).await.unwrap().build_number;
    front.put_artifact(&job, n, b"payload", None).await.unwrap();
    let remote = front.get_build(&job, n).unwrap().remote.unwrap();

    front.delete_build(&job, n).await.unwrap();

    let err = peer.frontend.get_build(&remote.job_id, remote.build_number).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(front.get_build(&job, n).unwrap_err().kind(), ErrorKind::NotFound);
}
