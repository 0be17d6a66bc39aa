//! End-to-end convergence scenarios against an in-memory project API.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cadre_reconcile::ExecutionPolicy;
use cadre_remote::{RateLimit, RateLimiterRegistry, RemoteError, RemoteResult};

use cadre_project::{
    Member, MemberKind, ProjectApi, ProjectManifest, ProjectReconciler, RepositoryAttachment,
    Role, REPO_ATTACH_BUCKET, REPO_DETACH_BUCKET,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[derive(Default)]
struct RemoteState {
    users: Vec<Member>,
    groups: Vec<Member>,
    roles: Vec<Role>,
    repositories: Vec<RepositoryAttachment>,
}

/// In-memory project API with a call log and optional detach races.
#[derive(Default)]
struct InMemoryApi {
    state: Mutex<RemoteState>,
    calls: Mutex<Vec<String>>,
    detach_races_with_deletion: bool,
}

impl InMemoryApi {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn count_of(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl ProjectApi for InMemoryApi {
    async fn list_members(&self, _project: &str, kind: MemberKind) -> RemoteResult<Vec<Member>> {
        self.record(format!("list_members:{kind}"));
        let state = self.state.lock().unwrap();
        Ok(match kind {
            MemberKind::User => state.users.clone(),
            MemberKind::Group => state.groups.clone(),
        })
    }

    async fn put_member(
        &self,
        _project: &str,
        kind: MemberKind,
        member: &Member,
    ) -> RemoteResult<()> {
        self.record(format!("put_member:{kind}:{}", member.name));
        let mut state = self.state.lock().unwrap();
        let members = match kind {
            MemberKind::User => &mut state.users,
            MemberKind::Group => &mut state.groups,
        };
        members.retain(|m| m.name != member.name);
        members.push(member.clone());
        Ok(())
    }

    async fn delete_member(
        &self,
        _project: &str,
        kind: MemberKind,
        name: &str,
    ) -> RemoteResult<()> {
        self.record(format!("delete_member:{kind}:{name}"));
        let mut state = self.state.lock().unwrap();
        let members = match kind {
            MemberKind::User => &mut state.users,
            MemberKind::Group => &mut state.groups,
        };
        members.retain(|m| m.name != name);
        Ok(())
    }

    async fn list_roles(&self, _project: &str) -> RemoteResult<Vec<Role>> {
        self.record("list_roles".to_string());
        Ok(self.state.lock().unwrap().roles.clone())
    }

    async fn create_role(&self, _project: &str, role: &Role) -> RemoteResult<()> {
        self.record(format!("create_role:{}", role.name));
        self.state.lock().unwrap().roles.push(role.clone());
        Ok(())
    }

    async fn update_role(&self, _project: &str, role: &Role) -> RemoteResult<()> {
        self.record(format!("update_role:{}", role.name));
        let mut state = self.state.lock().unwrap();
        state.roles.retain(|r| r.name != role.name);
        state.roles.push(role.clone());
        Ok(())
    }

    async fn delete_role(&self, _project: &str, name: &str) -> RemoteResult<()> {
        self.record(format!("delete_role:{name}"));
        self.state.lock().unwrap().roles.retain(|r| r.name != name);
        Ok(())
    }

    async fn list_repositories(&self, _project: &str) -> RemoteResult<Vec<RepositoryAttachment>> {
        self.record("list_repositories".to_string());
        Ok(self.state.lock().unwrap().repositories.clone())
    }

    async fn attach_repository(&self, _project: &str, repo_key: &str) -> RemoteResult<()> {
        self.record(format!("attach_repository:{repo_key}"));
        let mut state = self.state.lock().unwrap();
        state.repositories.retain(|r| r.repo_key != repo_key);
        state.repositories.push(RepositoryAttachment::new(repo_key));
        Ok(())
    }

    async fn detach_repository(&self, _project: &str, repo_key: &str) -> RemoteResult<()> {
        self.record(format!("detach_repository:{repo_key}"));
        let mut state = self.state.lock().unwrap();
        state.repositories.retain(|r| r.repo_key != repo_key);
        if self.detach_races_with_deletion {
            // The repository was deleted out-of-band between the listing and
            // this call; the remote answers 404.
            return Err(RemoteError::not_found(repo_key));
        }
        Ok(())
    }
}

fn manifest() -> ProjectManifest {
    let mut m = ProjectManifest::new("skynet");
    m.roles = vec![
        Role::new(
            "developer",
            vec!["READ_REPOSITORY".to_string(), "ANNOTATE_REPOSITORY".to_string()],
            vec!["DEV".to_string()],
        ),
        Role::new(
            "release manager",
            vec!["DEPLOY".to_string()],
            vec!["DEV".to_string(), "PROD".to_string()],
        ),
    ];
    m.users = vec![
        Member::new("alice", vec!["developer".to_string()]),
        Member::new("bob", vec!["release manager".to_string()]),
    ];
    m.groups = vec![Member::new("release-eng", vec!["release manager".to_string()])];
    m.repositories = vec![
        "skynet-docker-local".to_string(),
        "skynet-npm-local".to_string(),
    ];
    m
}

fn fast_limits() -> Arc<RateLimiterRegistry> {
    Arc::new(
        RateLimiterRegistry::builder()
            .bucket(REPO_ATTACH_BUCKET, RateLimit::per_second(1000))
            .bucket(REPO_DETACH_BUCKET, RateLimit::per_second(1000))
            .build(),
    )
}

fn reconciler(policy: ExecutionPolicy) -> ProjectReconciler {
    ProjectReconciler::new(policy).with_limiters(fast_limits())
}

#[tokio::test]
async fn converge_from_empty_builds_the_declared_project() {
    init_tracing();
    let api = InMemoryApi::default();

    let report = reconciler(ExecutionPolicy::Sequential)
        .converge(&manifest(), &api)
        .await
        .unwrap();

    let mut roles: Vec<_> = report.roles.ids().collect();
    roles.sort_unstable();
    assert_eq!(roles, vec!["developer", "release manager"]);

    let mut users: Vec<_> = report.users.ids().collect();
    users.sort_unstable();
    assert_eq!(users, vec!["alice", "bob"]);

    assert_eq!(report.groups.ids().collect::<Vec<_>>(), vec!["release-eng"]);
    assert_eq!(report.repositories.len(), 2);
    assert_eq!(api.count_of("delete_"), 0);
    assert_eq!(api.count_of("detach_"), 0);
}

#[tokio::test]
async fn second_pass_issues_no_adds_or_removes() {
    init_tracing();
    let api = InMemoryApi::default();
    let engine = reconciler(ExecutionPolicy::Sequential);
    let m = manifest();

    engine.converge(&m, &api).await.unwrap();
    api.clear_calls();

    engine.converge(&m, &api).await.unwrap();

    // No creations, no deletions.
    assert_eq!(api.count_of("create_role"), 0);
    assert_eq!(api.count_of("delete_"), 0);
    assert_eq!(api.count_of("detach_"), 0);

    // Matched entities are still pushed: identity-only bucketing re-issues
    // the same updates every pass, even with unchanged payloads.
    assert_eq!(api.count_of("put_member"), 3);
    assert_eq!(api.count_of("update_role"), 2);
    // Repositories re-attach through the update bucket.
    assert_eq!(api.count_of("attach_repository"), 2);
}

#[tokio::test]
async fn out_of_band_drift_is_repaired() {
    init_tracing();
    let api = InMemoryApi::default();
    let engine = reconciler(ExecutionPolicy::Sequential);
    let m = manifest();

    engine.converge(&m, &api).await.unwrap();

    // Someone edits the project behind our back.
    {
        let mut state = api.state.lock().unwrap();
        state.users.push(Member::new("mallory", vec!["developer".to_string()]));
        state.repositories.retain(|r| r.repo_key != "skynet-npm-local");
    }
    api.clear_calls();

    let report = engine.converge(&m, &api).await.unwrap();

    assert_eq!(api.count_of("delete_member:users:mallory"), 1);
    let mut users: Vec<_> = report.users.ids().collect();
    users.sort_unstable();
    assert_eq!(users, vec!["alice", "bob"]);
    assert_eq!(report.repositories.len(), 2, "missing repository re-attached");
}

#[tokio::test]
async fn detach_racing_an_out_of_band_deletion_is_success() {
    init_tracing();
    let api = InMemoryApi {
        detach_races_with_deletion: true,
        ..InMemoryApi::default()
    };
    api.state
        .lock()
        .unwrap()
        .repositories
        .push(RepositoryAttachment::new("orphan-repo"));

    let report = reconciler(ExecutionPolicy::Sequential)
        .converge(&manifest(), &api)
        .await
        .unwrap();

    assert_eq!(api.count_of("detach_repository:orphan-repo"), 1);
    assert_eq!(report.repositories.len(), 2);
}

#[tokio::test]
async fn concurrent_policy_converges_to_the_same_state() {
    init_tracing();
    let api = InMemoryApi::default();

    let report = reconciler(ExecutionPolicy::Concurrent { max_in_flight: 4 })
        .converge(&manifest(), &api)
        .await
        .unwrap();

    assert_eq!(report.roles.len(), 2);
    assert_eq!(report.users.len(), 2);
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.repositories.len(), 2);
}
