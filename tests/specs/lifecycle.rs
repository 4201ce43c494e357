// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job, build and artifact lifecycle on a local frontend.

use crate::prelude::*;

#[tokio::test]
async fn demo_job_build_artifact_scenario() {
    init_tracing();
    let (_dir, frontend) = local_frontend();

    let job = frontend.create_job_from_slice(br#"{"name":"demo"}"#).unwrap();
    assert_eq!(job.job_id, "job-1");
    assert_eq!(job.config, named_config("demo"));

    let build = frontend.create_build(&job.job_id).await.unwrap();
    assert_eq!(build.build_number, BuildNumber(1));

    let artifact = frontend.put_artifact(&job.job_id, build.build_number, b"test_content", None).await.unwrap();
    assert_eq!(artifact.artifact_id, "art-1");
    let (_, payload) = frontend.get_artifact(&job.job_id, build.build_number, &artifact.artifact_id).await.unwrap();
    assert_eq!(payload, b"test_content");

    let replaced = frontend
        .replace_artifact(&job.job_id, build.build_number, &artifact.artifact_id, b"test_content_modified", None)
        .await
        .unwrap();
    assert_eq!(replaced.artifact_id, artifact.artifact_id);
    let (_, payload) = frontend.get_artifact(&job.job_id, build.build_number, &artifact.artifact_id).await.unwrap();
    assert_eq!(payload, b"test_content_modified");

    frontend.delete_artifact(&job.job_id, build.build_number, &artifact.artifact_id).await.unwrap();
    let err = frontend.get_artifact(&job.job_id, build.build_number, &artifact.artifact_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn job_configuration_is_returned_verbatim() {
    let (_dir, frontend) = local_frontend();
    let raw = serde_json::json!({
        "name": "nightly",
        "steps": [{"run": "make"}, {"run": "make test"}],
        "env": {"Z_LAST": "1", "A_FIRST": "2"},
    });

    let created = frontend.create_job_from_slice(raw.to_string().as_bytes()).unwrap();
    let stored = frontend.get_job(&created.job_id).unwrap();

    similar_asserts::assert_eq!(stored.config.to_value().to_string(), raw.to_string());
}

#[tokio::test]
async fn round_trip_keeps_payload_and_content_type() {
    let (_dir, frontend) = local_frontend();
    let job = frontend.create_job(named_config("types")).unwrap().job_id;
    let n = frontend.create_build(&job).await.unwrap().build_number;
    let payload: Vec<u8> = (0..=255).collect();

    let put = frontend.put_artifact(&job, n, &payload, Some("application/x-tar")).await.unwrap();

    for _ in 0..3 {
        let (meta, read) = frontend.get_artifact(&job, n, &put.artifact_id).await.unwrap();
        assert_eq!(read, payload);
        assert_eq!(meta.content_type, "application/x-tar");
    }
}

#[tokio::test]
async fn deleting_one_artifact_leaves_its_siblings() {
    let (_dir, frontend) = local_frontend();
    let job = frontend.create_job(named_config("siblings")).unwrap().job_id;
    let n = frontend.create_build(&job).await.unwrap().build_number;
    let a = frontend.put_artifact(&job, n, b"a", None).await.unwrap();
    let b = frontend.put_artifact(&job, n, b"b", None).await.unwrap();

    frontend.delete_artifact(&job, n, &a.artifact_id).await.unwrap();

    let (_, payload) = frontend.get_artifact(&job, n, &b.artifact_id).await.unwrap();
    assert_eq!(payload, b"b");
    assert_eq!(frontend.list_artifacts(&job, n).unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reads_during_replace_see_whole_payloads() {
    let (_dir, frontend) = local_frontend();
    let frontend = Arc::new(frontend);
    let job = frontend.create_job(named_config("atomic")).unwrap().job_id;
    let n = frontend.create_build(&job).await.unwrap().build_number;
    let old = vec![b'o'; 256 * 1024];
    let new = vec![b'n'; 512 * 1024];
    let id = frontend.put_artifact(&job, n, &old, None).await.unwrap().artifact_id;

    let writer = {
        let (frontend, job, id, old, new) = (Arc::clone(&frontend), job.clone(), id.clone(), old.clone(), new.clone());
        tokio::spawn(async move {
            for i in 0..20 {
                let payload = if i % 2 == 0 { &new } else { &old };
                frontend.replace_artifact(&job, n, &id, payload, None).await.unwrap();
            }
        })
    };
    for _ in 0..50 {
        let (meta, payload) = frontend.get_artifact(&job, n, &id).await.unwrap();
        assert!(payload == old || payload == new, "observed a mixed payload");
        assert_eq!(meta.size, payload.len() as u64);
    }
    writer.await.unwrap();
}

#[tokio::test]
async fn state_survives_restart() {
    let dir = tempdir().unwrap();
    let (job, n, artifact) = {
        let frontend = Frontend::open(&Config::new(dir.path())).unwrap();
        let job = frontend.create_job(named_config("durable")).unwrap().job_id;
        let n = frontend.create_build(&job).await.unwrap().build_number;
        let artifact = frontend.put_artifact(&job, n, b"kept", None).await.unwrap().artifact_id;
        (job, n, artifact)
    };

    let frontend = Frontend::open(&Config::new(dir.path())).unwrap();
    assert_eq!(frontend.get_job(&job).unwrap().config, named_config("durable"));
    let (_, payload) = frontend.get_artifact(&job, n, &artifact).await.unwrap();
    assert_eq!(payload, b"kept");
    assert_eq!(frontend.create_build(&job).await.unwrap().build_number, BuildNumber(2));
    assert_eq!(frontend.create_job(named_config("next")).unwrap().job_id, "job-2");
    assert_eq!(frontend.put_artifact(&job, n, b"more", None).await.unwrap().artifact_id, "art-2");
}

#[tokio::test]
async fn build_status_moves_forward_only() {
    let (_dir, frontend) = local_frontend();
    let job = frontend.create_job(named_config("status")).unwrap().job_id;
    let n = frontend.create_build(&job).await.unwrap().build_number;

    frontend.update_build_status(&job, n, BuildStatus::Running).unwrap();
    frontend.update_build_status(&job, n, BuildStatus::Failed).unwrap();
    let err = frontend.update_build_status(&job, n, BuildStatus::Running).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(frontend.get_build(&job, n).unwrap().status, BuildStatus::Failed);
}
