//! Integration tests for the full role pipeline.
//!
//! Tests: Stores → RoleRegistry / ResolverRegistry → RoleEngine → Acl
//!
//! Verifies:
//! - Role records, mappings and typed relations stay consistent
//! - Built-in and custom strategies answer membership questions
//! - Principal references resolve through every alternate key
//! - Collaborator and strategy failures reach the caller unchanged

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use proptest::prelude::*;
    use serde_json::json;

    use rolegate_auth::{
        APPLICATION, AUTHENTICATED, Application, EVERYONE, NewApplication, NewUser, OWNER, ROLE,
        Role, RoleContext, RoleIdentifier, RoleMapping, UNAUTHENTICATED, USER, User,
    };
    use rolegate_core::{Entity, Query, RecordId, UNIQUENESS};

    use crate::config::{IdStrategy, RolegateConfig};
    use crate::gate::{Rolegate, Stores};
    use crate::model::{ModelDefinition, ModelRegistry};
    use crate::resolver::Completion;
    use crate::store::{InMemoryEntityStore, InMemoryRecordStore, RecordStore};
    use crate::{ResolveError, StoreError};

    fn setup() -> Rolegate {
        rolegate_observability::init_test();
        Rolegate::in_memory(RolegateConfig::default())
    }

    /// Rolegate whose OWNER checks read from the returned entity store.
    fn setup_with_entities() -> (Rolegate, Arc<InMemoryEntityStore>) {
        rolegate_observability::init_test();
        let entities = Arc::new(InMemoryEntityStore::default());
        let stores = Stores::in_memory(IdStrategy::Sequential).with_entities(entities.clone());
        let models = Arc::new(ModelRegistry::with_builtin_models());
        models.define(
            ModelDefinition::new("Album")
                .belongs_to("user", "User", "userId")
                .belongs_to("customer", "User", "customerId"),
        );
        (Rolegate::new(stores, models, RolegateConfig::default()), entities)
    }

    fn set(roles: Vec<RoleIdentifier>) -> HashSet<RoleIdentifier> {
        roles.into_iter().collect()
    }

    /// Record store that remembers every query passed to `find`.
    struct SpyStore<R> {
        inner: InMemoryRecordStore<R>,
        queries: Mutex<Vec<Query>>,
    }

    impl<R> SpyStore<R> {
        fn new() -> Self {
            Self {
                inner: InMemoryRecordStore::default(),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn queries(&self) -> Vec<Query> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl<R: Entity> RecordStore<R> for SpyStore<R> {
        async fn create(&self, draft: R::Draft) -> Result<R, StoreError> {
            self.inner.create(draft).await
        }

        async fn find(&self, query: &Query) -> Result<Vec<R>, StoreError> {
            self.queries.lock().unwrap().push(query.clone());
            self.inner.find(query).await
        }

        async fn find_by_id(&self, id: &RecordId) -> Result<Option<R>, StoreError> {
            self.inner.find_by_id(id).await
        }
    }

    /// Record store whose backend is unreachable.
    struct UnavailableStore;

    #[async_trait::async_trait]
    impl<R: Entity> RecordStore<R> for UnavailableStore {
        async fn create(&self, _draft: R::Draft) -> Result<R, StoreError> {
            Err(StoreError::storage("connection refused"))
        }

        async fn find(&self, _query: &Query) -> Result<Vec<R>, StoreError> {
            Err(StoreError::storage("connection refused"))
        }

        async fn find_by_id(&self, _id: &RecordId) -> Result<Option<R>, StoreError> {
            Err(StoreError::storage("connection refused"))
        }
    }

    #[tokio::test]
    async fn duplicate_role_name_fails_with_uniqueness() {
        let gate = setup();
        gate.roles().create("userRole").await.unwrap();

        let err = gate.roles().create("userRole").await.unwrap_err();
        let validation = err.validation().expect("validation error");
        assert_eq!(validation.status_code(), 422);
        assert_eq!(validation.codes["name"], vec![UNIQUENESS.to_string()]);
        assert!(err.to_string().ends_with("the `Role` instance is not valid: `name` is not unique"));
    }

    #[tokio::test]
    async fn role_and_user_relations() {
        let gate = setup();
        let user = gate
            .stores()
            .users
            .create(NewUser::new().username("raymond").email("x@y.com"))
            .await
            .unwrap();
        let user_role = gate.roles().create("userRole").await.unwrap();
        let admin = gate.roles().create("admin").await.unwrap();

        gate.roles().assign(&user_role.id, USER, user.id.clone()).await.unwrap();
        gate.roles().assign(&user_role.id, ROLE, admin.id.clone()).await.unwrap();

        let users = gate.roles().users(&user_role.id, None).await.unwrap();
        assert_eq!(users, vec![user.clone()]);
        let roles = gate.roles().roles(&user_role.id, None).await.unwrap();
        assert_eq!(roles.iter().map(|r| &r.name).collect::<Vec<_>>(), vec!["admin"]);
        assert_eq!(gate.roles().principals(&user_role.id).await.unwrap().len(), 2);

        let ctx = RoleContext::principal(USER, user.id.clone());
        assert!(gate.is_in_role("userRole", &ctx).await.unwrap());
        assert!(!gate.is_in_role("admin", &ctx).await.unwrap());
        assert!(gate.is_in_role("userRole", &RoleContext::principal(ROLE, admin.id)).await.unwrap());
    }

    #[tokio::test]
    async fn get_roles_by_principal_kind() {
        let gate = setup();
        let role = gate.roles().create("userRole").await.unwrap();
        gate.roles().assign(&role.id, USER, 1).await.unwrap();

        let mapped = gate.get_roles(&RoleContext::principal(USER, 1)).await.unwrap();
        assert_eq!(
            set(mapped),
            set(vec![EVERYONE, AUTHENTICATED, RoleIdentifier::Id(role.id.clone())])
        );

        let anonymous = gate.get_roles(&RoleContext::anonymous(USER)).await.unwrap();
        assert_eq!(set(anonymous), set(vec![EVERYONE, UNAUTHENTICATED]));

        let app = gate.get_roles(&RoleContext::principal(APPLICATION, 1)).await.unwrap();
        assert_eq!(set(app), set(vec![EVERYONE, AUTHENTICATED]));
    }

    #[tokio::test]
    async fn unauthenticated_only_without_principal_id() {
        let gate = setup();
        assert!(!gate.is_in_role(UNAUTHENTICATED, &RoleContext::principal(USER, 1)).await.unwrap());
        assert!(!gate.is_in_role(UNAUTHENTICATED, &RoleContext::principal(APPLICATION, 1)).await.unwrap());
        assert!(gate.is_in_role(UNAUTHENTICATED, &RoleContext::anonymous(USER)).await.unwrap());
        assert!(gate.is_in_role("$unauthenticated", &RoleContext::anonymous(APPLICATION)).await.unwrap());
    }

    #[tokio::test]
    async fn owner_through_either_foreign_key() {
        let (gate, entities) = setup_with_entities();
        let album1 = entities
            .insert("Album", json!({"name": "Album 1", "userId": 1, "customerId": 2}))
            .unwrap();
        let album2 = entities.insert("Album", json!({"name": "Album 2"})).unwrap();

        assert!(gate.is_owner("Album", album1.id.clone(), 1).await.unwrap());
        assert!(gate.is_owner("Album", album1.id.clone(), "2").await.unwrap());
        assert!(!gate.is_owner("Album", album1.id.clone(), 3).await.unwrap());
        assert!(!gate.is_owner("Album", album2.id.clone(), 1).await.unwrap());

        let ctx = RoleContext::principal(USER, 1).with_model("Album", album1.id);
        assert!(gate.is_in_role(OWNER, &ctx).await.unwrap());
        assert!(gate.get_roles(&ctx).await.unwrap().iter().all(|r| *r != OWNER));
    }

    #[tokio::test]
    async fn user_owns_own_record() {
        let gate = setup();
        let user = gate
            .stores()
            .users
            .create(NewUser::new().username("self"))
            .await
            .unwrap();
        assert!(gate.is_owner(User::MODEL, user.id.clone(), user.id.clone()).await.unwrap());
        assert!(!gate.is_owner(User::MODEL, user.id, 999).await.unwrap());
    }

    #[tokio::test]
    async fn resolve_principal_by_every_key() {
        let gate = setup();
        let user = gate
            .stores()
            .users
            .create(NewUser::new().username("john").email("john@example.com"))
            .await
            .unwrap();
        let app = gate
            .stores()
            .applications
            .create(NewApplication::new("demo app"))
            .await
            .unwrap();

        for key in [user.id.clone(), "john".into(), "john@example.com".into()] {
            let found = gate.acl().resolve_principal(USER, key.clone()).await.unwrap();
            assert_eq!(found.map(|p| p.id().clone()), Some(user.id.clone()), "key {key}");
        }

        let found = gate.acl().resolve_principal(APPLICATION, "demo app").await.unwrap();
        assert_eq!(found.map(|p| p.id().clone()), Some(app.id));

        assert!(gate.acl().resolve_principal(USER, "mary").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn is_mapped_to_role_resolves_keys_first() {
        let gate = setup();
        let users = &gate.stores().users;
        let john = users
            .create(NewUser::new().username("john").email("john@example.com"))
            .await
            .unwrap();
        users
            .create(NewUser::new().username("mary").email("mary@example.com"))
            .await
            .unwrap();
        let app = gate
            .stores()
            .applications
            .create(NewApplication::new("demo app"))
            .await
            .unwrap();

        let admin = gate.roles().create("admin").await.unwrap();
        gate.roles().assign(&admin.id, USER, john.id.clone()).await.unwrap();
        gate.roles().assign(&admin.id, APPLICATION, app.id.clone()).await.unwrap();

        let acl = gate.acl();
        assert!(acl.is_mapped_to_role(USER, "john", "admin").await.unwrap());
        assert!(acl.is_mapped_to_role(USER, "john@example.com", "admin").await.unwrap());
        assert!(acl.is_mapped_to_role(USER, john.id, "admin").await.unwrap());
        assert!(!acl.is_mapped_to_role(USER, "mary", "admin").await.unwrap());
        assert!(!acl.is_mapped_to_role(USER, "nobody", "admin").await.unwrap());
        assert!(acl.is_mapped_to_role(APPLICATION, "demo app", "admin").await.unwrap());
        assert!(!acl.is_mapped_to_role(APPLICATION, "demo app", "userRole").await.unwrap());
    }

    #[tokio::test]
    async fn deferred_and_callback_strategies_behave_like_direct_ones() {
        let gate = setup();
        let resolvers = gate.resolvers();
        resolvers.register_fn("direct", |_, ctx| Ok(ctx.principal_id.is_some()));
        resolvers.register_async("deferred", |_, ctx| async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(ctx.principal_id.is_some())
        });
        resolvers.register_callback("callback", |_, ctx, done: Completion| {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                done.complete(Ok(ctx.principal_id.is_some()));
            });
        });

        let user = RoleContext::principal(USER, 1);
        let anonymous = RoleContext::anonymous(USER);
        for role in ["direct", "deferred", "callback"] {
            assert!(gate.is_in_role(role, &user).await.unwrap(), "{role}");
            assert!(!gate.is_in_role(role, &anonymous).await.unwrap(), "{role}");
        }
    }

    #[tokio::test]
    async fn strategy_failures_propagate() {
        let gate = setup();
        gate.resolvers()
            .register_fn("flaky", |_, _| Err(anyhow::anyhow!("directory offline")));
        gate.resolvers().register_callback("silent", |_, _, done| drop(done));

        let ctx = RoleContext::principal(USER, 1);
        let err = gate.is_in_role("flaky", &ctx).await.unwrap_err();
        assert!(matches!(&err, ResolveError::Strategy { role, .. } if role == "flaky"));

        let err = gate.is_in_role("silent", &ctx).await.unwrap_err();
        assert!(matches!(err, ResolveError::Abandoned(_)));
    }

    #[tokio::test]
    async fn typed_view_forwards_refinement_verbatim() {
        let users = Arc::new(SpyStore::<User>::new());
        let mut stores = Stores::in_memory(IdStrategy::Sequential);
        stores.users = users.clone();
        let gate = Rolegate::new(
            stores,
            Arc::new(ModelRegistry::with_builtin_models()),
            RolegateConfig::default(),
        );

        let role = gate.roles().create("staff").await.unwrap();
        let mut ids = Vec::new();
        for name in ["john", "mary"] {
            let user = users.create(NewUser::new().username(name)).await.unwrap();
            gate.roles().assign(&role.id, USER, user.id.clone()).await.unwrap();
            ids.push(user.id.to_json());
        }

        let refine = Query::new().eq("username", "mary").fields(["username"]).limit(5);
        let found = gate.roles().users(&role.id, Some(refine.clone())).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username.as_deref(), Some("mary"));

        let seen = users.queries();
        assert_eq!(seen.last(), Some(&refine.any_of("id", ids)));
    }

    #[tokio::test]
    async fn roles_of_lists_static_assignments() {
        let gate = setup();
        let a = gate.roles().create("a").await.unwrap();
        let b = gate.roles().create("b").await.unwrap();
        gate.roles().create("c").await.unwrap();
        gate.roles().assign(&a.id, APPLICATION, 7).await.unwrap();
        gate.roles().assign(&b.id, APPLICATION, 7).await.unwrap();
        gate.roles().assign(&b.id, USER, 7).await.unwrap();

        let roles: Vec<Role> = gate.roles().roles_of(APPLICATION, &RecordId::Int(7)).await.unwrap();
        assert_eq!(roles.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn store_failures_reach_the_caller() {
        let mut stores = Stores::in_memory(IdStrategy::Sequential);
        stores.mappings = Arc::new(UnavailableStore);
        let gate = Rolegate::new(
            stores,
            Arc::new(ModelRegistry::with_builtin_models()),
            RolegateConfig::default(),
        );
        gate.roles().create("admin").await.unwrap();

        let ctx = RoleContext::principal(USER, 1);
        let err = gate.is_in_role("admin", &ctx).await.unwrap_err();
        assert!(matches!(err, ResolveError::Store(StoreError::Storage(_))));

        let err = gate.get_roles(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));

        // Built-ins never touch the mapping store.
        assert!(gate.is_in_role(EVERYONE, &ctx).await.unwrap());

        let err = gate.roles().assign(&RecordId::Int(1), USER, 1).await.unwrap_err();
        assert_eq!(err, StoreError::storage("connection refused"));
    }

    #[tokio::test]
    async fn role_principals_are_unauthenticated() {
        let gate = setup();
        let admin = gate.roles().create("admin").await.unwrap();
        let ctx = RoleContext::principal(ROLE, admin.id.clone());

        assert!(gate.is_in_role(UNAUTHENTICATED, &ctx).await.unwrap());
        assert!(!gate.is_in_role(AUTHENTICATED, &ctx).await.unwrap());
        let roles = set(gate.get_roles(&ctx).await.unwrap());
        assert!(roles.contains(&UNAUTHENTICATED));
        assert!(!roles.contains(&AUTHENTICATED));
    }

    #[test]
    fn gate_installs_tracing_from_its_config() {
        let gate = Rolegate::in_memory(RolegateConfig {
            log_filter: "rolegate_infra=debug".to_string(),
            ..Default::default()
        });
        gate.init_tracing();
        tracing::info!(filter = %gate.config().log_filter, "gate tracing ready");
    }

    #[tokio::test]
    async fn uuid_identifiers_end_to_end() {
        let gate = Rolegate::in_memory(RolegateConfig {
            id_strategy: IdStrategy::Uuid,
            ..Default::default()
        });
        let app = gate
            .stores()
            .applications
            .create(NewApplication::new("svc"))
            .await
            .unwrap();
        let role = gate.roles().create("reader").await.unwrap();
        assert!(matches!(role.id, RecordId::Text(_)));
        gate.roles().assign(&role.id, APPLICATION, app.id.clone()).await.unwrap();

        assert!(gate.acl().is_mapped_to_role(APPLICATION, "svc", role.id.clone()).await.unwrap());
        let roles = gate.get_roles(&RoleContext::principal(APPLICATION, app.id)).await.unwrap();
        assert_eq!(roles.last(), Some(&RoleIdentifier::Id(role.id)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_checks_and_registration() {
        let gate = Arc::new(setup());
        let role = gate.roles().create("ops").await.unwrap();
        gate.roles().assign(&role.id, USER, 1).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let gate = gate.clone();
            handles.push(tokio::spawn(async move {
                if i % 4 == 0 {
                    gate.resolvers().register_fn(format!("custom{i}"), |_, _| Ok(true));
                }
                gate.is_in_role("ops", &RoleContext::principal(USER, 1)).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap());
        }
        assert_eq!(gate.resolvers().identifiers().len(), 4 + 4);
    }

    #[tokio::test]
    async fn instances_do_not_share_strategies() {
        let first = setup();
        let second = setup();
        first.resolvers().register_fn("vip", |_, _| Ok(true));

        let ctx = RoleContext::principal(USER, 1);
        assert!(first.is_in_role("vip", &ctx).await.unwrap());
        assert!(!second.is_in_role("vip", &ctx).await.unwrap());
    }

    proptest! {
        #[test]
        fn role_names_are_unique_under_any_creation_sequence(
            names in proptest::collection::vec("[a-c]{1,2}", 1..12)
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let gate = setup();
                let mut accepted = HashSet::new();
                for name in &names {
                    let created = gate.roles().create(name.as_str()).await;
                    prop_assert_eq!(created.is_ok(), accepted.insert(name.clone()));
                }
                let stored = gate.roles().find(&Query::new()).await.unwrap();
                prop_assert_eq!(stored.len(), accepted.len());
                Ok(())
            })?;
        }
    }

    #[allow(dead_code)]
    fn assert_send_sync() {
        fn check<T: Send + Sync>() {}
        check::<Rolegate>();
        check::<Stores>();
        check::<Application>();
        check::<RoleMapping>();
    }
}
