mod common;

use common::{address, confirm, Fixture, ADMIN_PARAMS, BYTECODE};
use kiln_core::{
    ConfirmRequest, DeploymentFilter, DeploymentId, DeploymentRepository, DeploymentStatus,
    DeploymentView, VersionId,
};

async fn current(fixture: &Fixture) -> Vec<DeploymentView> {
    DeploymentRepository::list(
        &fixture.db,
        DeploymentFilter {
            current_only: true,
            ..Default::default()
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_prepare_builds_unsigned_payload() {
    let fixture = Fixture::new().await;

    let prepared = fixture
        .deployments
        .prepare(
            fixture.version.id,
            fixture.network.id,
            fixture.deployer.id,
            ADMIN_PARAMS,
        )
        .await
        .unwrap();

    let tx = &prepared.transaction;
    assert_eq!(tx.chain_id.0, 31337);
    assert_eq!(tx.from, fixture.deployer.address);
    assert!(tx.data.starts_with(BYTECODE));
    // bytecode (5 bytes) followed by one 32-byte word
    assert_eq!(tx.data.len(), 2 + 2 * (5 + 32));
    assert!(tx.data.ends_with("a1"));

    let deployment = DeploymentRepository::get_by_id(&fixture.db, prepared.deployment_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(deployment.status, DeploymentStatus::PendingSignature);
    assert!(!deployment.is_current);
    assert!(deployment.address.is_none());
    assert!(deployment.params.unwrap().contains("admin"));
}

#[tokio::test]
async fn test_prepare_rejects_bad_input_without_writing() {
    let fixture = Fixture::new().await;
    let svc = &fixture.deployments;
    let (version, network, deployer) = (fixture.version.id, fixture.network.id, fixture.deployer.id);

    let err = svc
        .prepare(VersionId(999), network, deployer, ADMIN_PARAMS)
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = svc.prepare(version, network, deployer, "").await.unwrap_err();
    assert!(err.is_validation(), "missing constructor argument");

    let err = svc
        .prepare(version, network, deployer, r#"["0x01"]"#)
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = svc
        .prepare(
            version,
            network,
            deployer,
            r#"{"admin": "0x00000000000000000000000000000000000000a1", "owner": "x"}"#,
        )
        .await
        .unwrap_err();
    assert!(err.is_validation(), "unknown constructor argument");

    fixture
        .registry
        .set_deployer_active(deployer, false)
        .await
        .unwrap();
    let err = svc
        .prepare(version, network, deployer, ADMIN_PARAMS)
        .await
        .unwrap_err();
    assert!(err.is_validation(), "inactive deployer");

    let all = DeploymentRepository::list(&fixture.db, DeploymentFilter::default())
        .await
        .unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn test_confirm_makes_deployment_current() {
    let fixture = Fixture::new().await;
    let id = fixture.prepare().await;

    let tx_hash = format!("0x{}", "ab".repeat(32));
    let confirmed = fixture
        .deployments
        .confirm_final(
            id,
            &ConfirmRequest {
                address: Some(address("c1")),
                gas_used: Some(543210),
                transaction_hash: Some(tx_hash.clone()),
            },
        )
        .await
        .unwrap();

    assert_eq!(confirmed.status, DeploymentStatus::Confirmed);
    assert!(confirmed.is_current);
    assert_eq!(confirmed.address, Some(address("c1")));
    assert_eq!(confirmed.gas_used, Some(543210));
    assert_eq!(confirmed.transaction_hash, Some(tx_hash));

    let view = fixture
        .deployments
        .current("Token", "local")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.id, id);
    assert_eq!(view.version_label, "v1");
}

#[tokio::test]
async fn test_second_confirmation_demotes_first() {
    let fixture = Fixture::new().await;
    let first = fixture.deploy_at(&fixture.network, &address("c1")).await;
    let second = fixture.deploy_at(&fixture.network, &address("c2")).await;

    let first = DeploymentRepository::get_by_id(&fixture.db, first)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.status, DeploymentStatus::Confirmed);
    assert!(!first.is_current);

    let current = current(&fixture).await;
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, second);
}

#[tokio::test]
async fn test_current_is_scoped_per_network() {
    let fixture = Fixture::new().await;
    let other = fixture
        .registry
        .add_network("other", "wss://other.example", 5)
        .await
        .unwrap();

    let a = fixture.deploy_at(&fixture.network, &address("c1")).await;
    // same address is fine on another network
    let b = fixture.deploy_at(&other, &address("c1")).await;

    let mut ids: Vec<DeploymentId> = current(&fixture).await.iter().map(|d| d.id).collect();
    ids.sort();
    assert_eq!(ids, vec![a, b]);
}

#[tokio::test]
async fn test_malformed_confirmation_leaves_deployment_pending() {
    let fixture = Fixture::new().await;
    let id = fixture.prepare().await;

    let err = fixture
        .deployments
        .confirm_final(id, &confirm("0xabc", 21000))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = fixture
        .deployments
        .confirm_final(
            id,
            &ConfirmRequest {
                address: Some(address("c1")),
                gas_used: None,
                transaction_hash: None,
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let deployment = DeploymentRepository::get_by_id(&fixture.db, id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(deployment.status, DeploymentStatus::PendingSignature);
    assert!(!deployment.is_current);
}

#[tokio::test]
async fn test_address_conflict_keeps_previous_current() {
    let fixture = Fixture::new().await;
    let first = fixture.deploy_at(&fixture.network, &address("c1")).await;
    let second = fixture.prepare().await;

    let err = fixture
        .deployments
        .confirm_final(second, &confirm(&address("c1"), 21000))
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    let second = DeploymentRepository::get_by_id(&fixture.db, second)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.status, DeploymentStatus::PendingSignature);

    let current = current(&fixture).await;
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, first);
}

#[tokio::test]
async fn test_address_conflict_rolls_back_demotion() {
    let fixture = Fixture::new().await;
    let first = fixture.deploy_at(&fixture.network, &address("c1")).await;
    let second = fixture.prepare().await;

    // Bypass the service pre-check so the unique constraint fires mid-transaction.
    let err = DeploymentRepository::confirm(
        &fixture.db,
        second,
        &kiln_core::Confirmation {
            address: address("c1"),
            gas_used: 1,
            transaction_hash: None,
        },
    )
    .await
    .unwrap_err();
    assert!(err.is_conflict());

    let first = DeploymentRepository::get_by_id(&fixture.db, first)
        .await
        .unwrap()
        .unwrap();
    assert!(first.is_current, "demotion must be rolled back");
}

#[tokio::test]
async fn test_terminal_deployments_reject_transitions() {
    let fixture = Fixture::new().await;
    let confirmed = fixture.deploy_at(&fixture.network, &address("c1")).await;

    let err = fixture
        .deployments
        .confirm_final(confirmed, &confirm(&address("c2"), 1))
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    let err = fixture.deployments.mark_failed(confirmed).await.unwrap_err();
    assert!(err.is_conflict());

    let failed = fixture.prepare().await;
    let deployment = fixture.deployments.mark_failed(failed).await.unwrap();
    assert_eq!(deployment.status, DeploymentStatus::Failed);
    assert!(!deployment.is_current);

    let err = fixture
        .deployments
        .confirm_final(failed, &confirm(&address("c3"), 1))
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_unknown_deployment_is_not_found() {
    let fixture = Fixture::new().await;

    let err = fixture
        .deployments
        .confirm_final(DeploymentId(404), &confirm(&address("c1"), 1))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = fixture
        .deployments
        .mark_failed(DeploymentId(404))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_duplicate_transaction_hash_is_a_conflict() {
    let fixture = Fixture::new().await;
    let tx_hash = format!("0x{}", "cd".repeat(32));

    let first = fixture.prepare().await;
    fixture
        .deployments
        .confirm_final(
            first,
            &ConfirmRequest {
                address: Some(address("c1")),
                gas_used: Some(1),
                transaction_hash: Some(tx_hash.clone()),
            },
        )
        .await
        .unwrap();

    let second = fixture.prepare().await;
    let err = fixture
        .deployments
        .confirm_final(
            second,
            &ConfirmRequest {
                address: Some(address("c2")),
                gas_used: Some(1),
                transaction_hash: Some(tx_hash),
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_concurrent_confirmations_leave_one_current() {
    let (fixture, _dir) = Fixture::on_disk().await;

    let mut ids = Vec::new();
    for _ in 0..16 {
        ids.push(fixture.prepare().await);
    }

    let mut tasks = tokio::task::JoinSet::new();
    for (i, id) in ids.iter().copied().enumerate() {
        let svc = fixture.deployments.clone();
        tasks.spawn(async move {
            svc.confirm_final(id, &confirm(&address(&format!("{:02x}", i + 1)), 21000))
                .await
                .map(|d| d.id)
        });
    }

    let mut confirmed = Vec::new();
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Ok(id) => confirmed.push(id),
            Err(e) => assert!(e.is_conflict(), "unexpected error: {}", e),
        }
    }
    assert!(!confirmed.is_empty());

    let current = current(&fixture).await;
    assert_eq!(current.len(), 1);
    assert!(confirmed.contains(&current[0].id));

    for id in &confirmed {
        let row = DeploymentRepository::get_by_id(&fixture.db, *id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status, DeploymentStatus::Confirmed);
        assert_eq!(row.is_current, row.id == current[0].id);
    }
}

#[tokio::test]
async fn test_add_version_constructor_args_info() {
    let fixture = Fixture::new().await;

    let derived: serde_json::Value =
        serde_json::from_str(&fixture.version.constructor_args_info).unwrap();
    assert_eq!(
        derived,
        serde_json::json!([{"name": "admin", "type": "address"}])
    );

    let explicit = fixture
        .registry
        .add_version(
            "Token",
            "v2",
            BYTECODE,
            common::TOKEN_ABI,
            Some(r#"[{"name": "owner", "type": "address"}]"#),
        )
        .await
        .unwrap();
    let stored: serde_json::Value =
        serde_json::from_str(&explicit.constructor_args_info).unwrap();
    assert_eq!(
        stored,
        serde_json::json!([{"name": "owner", "type": "address"}])
    );

    let err = fixture
        .registry
        .add_version("Token", "v3", BYTECODE, common::TOKEN_ABI, Some("{}"))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = fixture
        .registry
        .add_version("Token", "v1", BYTECODE, common::TOKEN_ABI, None)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_constructor_schema() {
    let fixture = Fixture::new().await;

    let schema = fixture
        .deployments
        .constructor_schema(fixture.version.id)
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_value(&schema).unwrap(),
        serde_json::json!([{"name": "admin", "type": "address"}])
    );

    let bare = fixture
        .registry
        .add_version(
            "Token",
            "v0",
            BYTECODE,
            r#"[{"type":"function","name":"f","inputs":[],"outputs":[],"stateMutability":"view"}]"#,
            None,
        )
        .await
        .unwrap();
    assert!(fixture
        .deployments
        .constructor_schema(bare.id)
        .await
        .unwrap()
        .is_empty());

    let err = fixture
        .deployments
        .constructor_schema(VersionId(999))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_network_in_use_cannot_be_deleted() {
    let fixture = Fixture::new().await;
    fixture.prepare().await;

    let err = fixture
        .registry
        .delete_network("local")
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    let unused = fixture
        .registry
        .add_network("spare", "https://spare.example", 77)
        .await
        .unwrap();
    fixture.registry.delete_network(&unused.name).await.unwrap();
    assert_eq!(fixture.registry.list_networks().await.unwrap().len(), 1);
}
