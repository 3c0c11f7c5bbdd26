//! Unit tests for the ClusterOperator status tracker

#[cfg(test)]
mod tests {
    use crate::status::{StatusReason, StatusTracker, CLUSTER_OPERATOR_NAME, OPERATOR_COMPONENT};
    use crds::ClusterStatusConditionType as Type;
    use crds::{
        ClusterOperator, ClusterOperatorSpec, ClusterOperatorStatus, ClusterOperatorStatusCondition,
        ConditionStatus, OperandVersion,
    };
    use resource_store::{Failure, MockResourceStore, StoreError, StoreOp};
    use std::sync::Arc;

    fn tracker(store: &MockResourceStore) -> StatusTracker {
        StatusTracker::new(Arc::new(store.clone()), "openshift-baremetal")
    }

    fn status_of(store: &MockResourceStore) -> ClusterOperatorStatus {
        store.cluster_operator(CLUSTER_OPERATOR_NAME).unwrap().status.unwrap()
    }

    fn condition_status(status: &ClusterOperatorStatus, type_: Type) -> ConditionStatus {
        status.condition(type_).unwrap().status
    }

    /// ClusterOperator already on the server, with the given operator version.
    fn existing_cluster_operator(store: &MockResourceStore, version: Option<&str>) {
        let mut co = tracker(store).default_cluster_operator();
        if let (Some(status), Some(version)) = (co.status.as_mut(), version) {
            status.set_operand_version(OperandVersion::new(OPERATOR_COMPONENT, version));
        }
        store.add_cluster_operator(co);
    }

    #[tokio::test]
    async fn test_get_or_create_creates_default() {
        let store = MockResourceStore::new();

        let co = tracker(&store).get_or_create().await.unwrap();

        let ops: Vec<StoreOp> = store.calls().iter().map(|c| c.op).collect();
        assert_eq!(
            ops,
            vec![
                StoreOp::GetClusterOperator,
                StoreOp::CreateClusterOperator,
                StoreOp::UpdateClusterOperatorStatus,
            ]
        );

        let status = co.status.unwrap();
        assert_eq!(status.conditions.len(), 5);
        for type_ in Type::ALL {
            assert_eq!(condition_status(&status, type_.clone()), ConditionStatus::False, "{type_}");
        }
        assert!(status.versions.is_empty());
        assert_eq!(status.related_objects.len(), 1);
        assert_eq!(status.related_objects[0].resource, "namespaces");
        assert_eq!(status.related_objects[0].name, "openshift-baremetal");
        assert_eq!(status_of(&store), status);
    }

    #[tokio::test]
    async fn test_get_or_create_returns_existing() {
        let store = MockResourceStore::new();
        existing_cluster_operator(&store, Some("4.4.0"));

        let co = tracker(&store).get_or_create().await.unwrap();

        assert!(store.write_calls().is_empty());
        assert_eq!(co.status.unwrap().operand_version(OPERATOR_COMPONENT), Some("4.4.0"));
    }

    #[tokio::test]
    async fn test_get_or_create_seeds_object_created_concurrently() {
        let store = MockResourceStore::new();
        // the competing writer has created the object but not pushed its status yet
        store.create_cluster_operator_concurrently(ClusterOperator::new(CLUSTER_OPERATOR_NAME, ClusterOperatorSpec {}));

        let co = tracker(&store).get_or_create().await.unwrap();

        assert_eq!(store.count(StoreOp::GetClusterOperator), 2);
        let status = co.status.unwrap();
        assert_eq!(status.conditions.len(), 5);
        for type_ in Type::ALL {
            assert_eq!(condition_status(&status, type_.clone()), ConditionStatus::False, "{type_}");
        }
        assert_eq!(status_of(&store), status);
    }

    #[tokio::test]
    async fn test_get_or_create_keeps_status_of_concurrent_winner() {
        let store = MockResourceStore::new();
        let mut winner = tracker(&store).default_cluster_operator();
        winner
            .status
            .as_mut()
            .unwrap()
            .set_operand_version(OperandVersion::new(OPERATOR_COMPONENT, "4.4.0"));
        store.create_cluster_operator_concurrently(winner);

        let co = tracker(&store).get_or_create().await.unwrap();

        assert_eq!(store.count(StoreOp::UpdateClusterOperatorStatus), 0);
        assert_eq!(co.status.unwrap().operand_version(OPERATOR_COMPONENT), Some("4.4.0"));
    }

    #[tokio::test]
    async fn test_progressing_after_concurrent_create_keeps_all_conditions() {
        let store = MockResourceStore::new();
        store.create_cluster_operator_concurrently(ClusterOperator::new(CLUSTER_OPERATOR_NAME, ClusterOperatorSpec {}));

        tracker(&store).status_progressing("4.5.0").await.unwrap();

        let status = status_of(&store);
        assert_eq!(status.conditions.len(), 5);
        assert_eq!(condition_status(&status, Type::Progressing), ConditionStatus::True);
        assert_eq!(condition_status(&status, Type::Available), ConditionStatus::False);
        assert_eq!(condition_status(&status, Type::Degraded), ConditionStatus::False);
        assert_eq!(condition_status(&status, Type::Disabled), ConditionStatus::False);
    }

    #[tokio::test]
    async fn test_get_or_create_surfaces_failed_reread() {
        let store = MockResourceStore::new();
        store.fail_on(StoreOp::CreateClusterOperator, Failure::AlreadyExists);

        // nothing was actually stored, so the re-read misses
        let err = tracker(&store).get_or_create().await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.count(StoreOp::GetClusterOperator), 2);
        assert_eq!(store.count(StoreOp::UpdateClusterOperatorStatus), 0);
    }

    #[tokio::test]
    async fn test_foreign_conditions_survive_updates() {
        let store = MockResourceStore::new();
        let foreign_type = Type::Other("EvaluationConditionsDetected".to_string());
        let foreign = ClusterOperatorStatusCondition::new(foreign_type.clone(), ConditionStatus::False, "AsExpected", "");
        let mut co = tracker(&store).default_cluster_operator();
        co.status.as_mut().unwrap().conditions.push(foreign.clone());
        store.add_cluster_operator(co);
        let tracker = tracker(&store);

        tracker.status_progressing("4.5.0").await.unwrap();
        tracker.status_available("4.5.0").await.unwrap();
        tracker.status_degraded("boom").await.unwrap();

        let status = status_of(&store);
        assert_eq!(status.conditions.len(), 6);
        assert_eq!(status.condition(foreign_type), Some(&foreign));
    }

    #[tokio::test]
    async fn test_default_conditions_exist_before_first_update() {
        let store = MockResourceStore::new();

        tracker(&store).status_progressing("4.5.0").await.unwrap();

        let status = status_of(&store);
        assert_eq!(status.conditions.len(), 5);
        assert_eq!(condition_status(&status, Type::Progressing), ConditionStatus::True);
        assert_eq!(condition_status(&status, Type::Upgradeable), ConditionStatus::True);
        assert_eq!(condition_status(&status, Type::Available), ConditionStatus::False);
        assert_eq!(condition_status(&status, Type::Degraded), ConditionStatus::False);
        assert_eq!(condition_status(&status, Type::Disabled), ConditionStatus::False);
    }

    #[tokio::test]
    async fn test_progressing_when_versions_differ() {
        let store = MockResourceStore::new();
        existing_cluster_operator(&store, Some("4.4.0"));

        tracker(&store).status_progressing("4.5.0").await.unwrap();

        let status = status_of(&store);
        let progressing = status.condition(Type::Progressing).unwrap();
        assert_eq!(progressing.status, ConditionStatus::True);
        assert_eq!(progressing.reason.as_deref(), Some("SyncingResources"));
        assert_eq!(condition_status(&status, Type::Upgradeable), ConditionStatus::True);
        // progressing does not record the new version
        assert_eq!(status.operand_version(OPERATOR_COMPONENT), Some("4.4.0"));
    }

    #[tokio::test]
    async fn test_not_progressing_when_versions_match() {
        let store = MockResourceStore::new();
        existing_cluster_operator(&store, Some("4.5.0"));

        tracker(&store).status_progressing("4.5.0").await.unwrap();

        let status = status_of(&store);
        assert_eq!(condition_status(&status, Type::Progressing), ConditionStatus::False);
        assert_eq!(condition_status(&status, Type::Upgradeable), ConditionStatus::True);
    }

    #[tokio::test]
    async fn test_condition_merge_leaves_other_types_untouched() {
        let store = MockResourceStore::new();
        let mut co = tracker(&store).default_cluster_operator();
        let available = ClusterOperatorStatusCondition::new(Type::Available, ConditionStatus::True, "AsExpected", "all good");
        co.status.as_mut().unwrap().set_condition(available.clone());
        store.add_cluster_operator(co);

        tracker(&store).status_progressing("4.5.0").await.unwrap();

        let status = status_of(&store);
        assert_eq!(status.condition(Type::Available), Some(&available));
        assert_eq!(status.conditions.len(), 5);
    }

    #[tokio::test]
    async fn test_every_update_writes() {
        let store = MockResourceStore::new();
        existing_cluster_operator(&store, Some("4.5.0"));
        let tracker = tracker(&store);

        tracker.status_progressing("4.5.0").await.unwrap();
        let first = status_of(&store);
        tracker.status_progressing("4.5.0").await.unwrap();

        // no equality short-circuit: identical conditions are written again
        assert_eq!(store.count(StoreOp::UpdateClusterOperatorStatus), 2);
        let second = status_of(&store);
        assert_eq!(
            condition_status(&first, Type::Progressing),
            condition_status(&second, Type::Progressing)
        );
    }

    #[tokio::test]
    async fn test_available_upserts_operator_version() {
        let store = MockResourceStore::new();
        existing_cluster_operator(&store, Some("4.4.0"));
        let tracker = tracker(&store);

        tracker.status_available("4.5.0").await.unwrap();
        tracker.status_available("4.5.0").await.unwrap();

        let status = status_of(&store);
        assert_eq!(status.versions, vec![OperandVersion::new(OPERATOR_COMPONENT, "4.5.0")]);
        assert_eq!(condition_status(&status, Type::Available), ConditionStatus::True);
        assert_eq!(condition_status(&status, Type::Progressing), ConditionStatus::False);
        assert_eq!(condition_status(&status, Type::Degraded), ConditionStatus::False);
        assert_eq!(
            status.condition(Type::Available).unwrap().reason.as_deref(),
            Some("DeployComplete")
        );
    }

    #[tokio::test]
    async fn test_degraded_only_touches_degraded() {
        let store = MockResourceStore::new();
        existing_cluster_operator(&store, Some("4.5.0"));
        let tracker = tracker(&store);
        tracker.status_available("4.5.0").await.unwrap();

        tracker.status_degraded("Store error: timeout").await.unwrap();

        let status = status_of(&store);
        let degraded = status.condition(Type::Degraded).unwrap();
        assert_eq!(degraded.status, ConditionStatus::True);
        assert_eq!(degraded.reason.as_deref(), Some("SyncingFailed"));
        assert_eq!(degraded.message.as_deref(), Some("Store error: timeout"));
        assert_eq!(condition_status(&status, Type::Available), ConditionStatus::True);
    }

    #[tokio::test]
    async fn test_store_failures_are_returned() {
        let store = MockResourceStore::new();
        existing_cluster_operator(&store, None);
        store.fail_on(StoreOp::UpdateClusterOperatorStatus, Failure::Conflict);

        let err = tracker(&store).status_progressing("4.5.0").await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        store.clear_failures();
        store.fail_on(StoreOp::GetClusterOperator, Failure::Unavailable);
        let err = tracker(&store).status_available("4.5.0").await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn test_reason_strings() {
        assert_eq!(StatusReason::Empty.as_str(), "");
        assert_eq!(StatusReason::Syncing.to_string(), "SyncingResources");
        assert_eq!(StatusReason::SyncFailed.to_string(), "SyncingFailed");
    }
}
