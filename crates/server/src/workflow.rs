//! Account request workflow.
//!
//! Turns a self-service `(center name, username, password)` submission into
//! either a live credential (approved) or a closed record (rejected). The
//! state machine is `pending → approved` or `pending → rejected`, both
//! terminal; no other transition exists.
//!
//! The two writes of an approval (create the credential, finalize the
//! request) are sequential, not transactional. Recovery from partial
//! completion is by convergence: user creation is idempotent-by-username
//! against this request's own hash, and the request update carries the
//! `pending` precondition, so a retried approve finishes the job instead of
//! duplicating it.

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;

use centerdesk_core::{AdminUserId, CenterId, RequestId, RequestStatus, Username};

use crate::auth::hash_password;
use crate::error::ErrorKind;
use crate::models::{AdminRequest, AdminUser, NewAdminRequest, NewAdminUser, RequestDecision};
use crate::store::{CredentialStore, StoreError};

/// The reviewer's decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionAction {
    Approve,
    Reject,
}

/// The outcome of a decision: the finalized request, plus the credential
/// created on approval.
#[derive(Debug)]
pub struct Decision {
    pub request: AdminRequest,
    pub created_user: Option<AdminUser>,
}

/// Workflow failures.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    /// Duplicate username, or the request was already decided.
    #[error("{0}")]
    Conflict(String),

    /// No request with the given id.
    #[error("account request not found")]
    NotFound,

    /// Password could not be hashed.
    #[error("password hashing failed")]
    PasswordHash,

    /// The credential store call failed. The request stays pending and the
    /// decision is safe to retry.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<WorkflowError> for ErrorKind {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Validation(msg) => Self::Validation(msg),
            WorkflowError::Conflict(msg) => Self::Conflict(msg),
            WorkflowError::NotFound => Self::NotFound("account request not found".to_string()),
            WorkflowError::PasswordHash => Self::Internal("password hashing failed".to_string()),
            WorkflowError::Store(e) => Self::Store(e),
        }
    }
}

/// The account request workflow.
///
/// Borrowed per request; all state lives in the credential store. The
/// decision path is superadmin-gated by the authorization guard upstream.
pub struct RequestWorkflow<'a> {
    store: &'a dyn CredentialStore,
}

impl<'a> RequestWorkflow<'a> {
    /// Create a workflow over the given store.
    #[must_use]
    pub const fn new(store: &'a dyn CredentialStore) -> Self {
        Self { store }
    }

    /// Submit a new account request.
    ///
    /// The password is hashed before anything is stored; plaintext never
    /// reaches the store, not even transiently.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Validation`] when any field is empty or the
    /// username is malformed.
    pub async fn submit(
        &self,
        center_name: &str,
        username: &str,
        password: &str,
    ) -> Result<AdminRequest, WorkflowError> {
        let center_name = center_name.trim();
        if center_name.is_empty() {
            return Err(WorkflowError::Validation(
                "centerName is required".to_string(),
            ));
        }
        let username = Username::parse(username)
            .map_err(|e| WorkflowError::Validation(e.to_string()))?;
        if password.is_empty() {
            return Err(WorkflowError::Validation(
                "password is required".to_string(),
            ));
        }

        let password_hash = hash_password(password).map_err(|_| WorkflowError::PasswordHash)?;

        let request = self
            .store
            .insert_request(NewAdminRequest {
                username,
                password_hash,
                center_name: center_name.to_string(),
                status: RequestStatus::Pending,
                requested_at: Utc::now(),
            })
            .await?;

        tracing::info!(request_id = %request.id, username = %request.username, "account request submitted");
        Ok(request)
    }

    /// Decide a pending request.
    ///
    /// `decided_by` is the superadmin credential the guard resolved; the
    /// requester only supplied a free-text center *name*, so approval binds
    /// the request to a real center chosen by the reviewer.
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::NotFound`] if no request has this id.
    /// - [`WorkflowError::Conflict`] if the request was already decided, or
    ///   the username is taken by an unrelated credential.
    /// - [`WorkflowError::Validation`] if approval lacks a valid center.
    pub async fn decide(
        &self,
        decided_by: AdminUserId,
        id: RequestId,
        action: DecisionAction,
        center_id: Option<CenterId>,
    ) -> Result<Decision, WorkflowError> {
        let request = self
            .store
            .request_by_id(id)
            .await?
            .ok_or(WorkflowError::NotFound)?;

        if request.status.is_terminal() {
            return Err(WorkflowError::Conflict(
                "request has already been decided".to_string(),
            ));
        }

        match action {
            DecisionAction::Approve => self.approve(decided_by, request, center_id).await,
            DecisionAction::Reject => self.reject(decided_by, request).await,
        }
    }

    async fn approve(
        &self,
        decided_by: AdminUserId,
        request: AdminRequest,
        center_id: Option<CenterId>,
    ) -> Result<Decision, WorkflowError> {
        let center_id = center_id.ok_or_else(|| {
            WorkflowError::Validation("centerId is required for approval".to_string())
        })?;

        self.store
            .center_by_id(center_id)
            .await?
            .ok_or_else(|| {
                WorkflowError::Validation("centerId does not name a known center".to_string())
            })?;

        // The uniqueness check must complete and observe no conflicting row
        // before the insert is issued.
        let existing = self.store.admin_user_by_username(&request.username).await?;
        let created_user = match existing {
            Some(user)
                if user.password_hash == request.password_hash
                    && user.center_id == Some(center_id) =>
            {
                // Remnant of an earlier approve that crashed between the two
                // writes: the credential exists but the request stayed
                // pending. Converge instead of re-creating.
                tracing::warn!(
                    request_id = %request.id,
                    username = %request.username,
                    "approve retry found matching credential; finalizing request"
                );
                user
            }
            Some(_) => {
                return Err(WorkflowError::Conflict(format!(
                    "username '{}' is already taken",
                    request.username
                )));
            }
            None => {
                self.store
                    .insert_admin_user(NewAdminUser {
                        username: request.username.clone(),
                        // Reuse the hash from submission time; the plaintext
                        // is long gone.
                        password_hash: request.password_hash.clone(),
                        center_id: Some(center_id),
                        is_active: true,
                        is_superadmin: false,
                    })
                    .await?
            }
        };

        let finalized = self
            .store
            .finalize_request(
                request.id,
                RequestDecision {
                    status: RequestStatus::Approved,
                    approved_at: Utc::now(),
                    approved_by: decided_by,
                    center_id: Some(center_id),
                },
            )
            .await?
            .ok_or_else(|| {
                WorkflowError::Conflict("request has already been decided".to_string())
            })?;

        tracing::info!(
            request_id = %finalized.id,
            user_id = %created_user.id,
            center_id = %center_id,
            "account request approved"
        );
        Ok(Decision {
            request: finalized,
            created_user: Some(created_user),
        })
    }

    async fn reject(
        &self,
        decided_by: AdminUserId,
        request: AdminRequest,
    ) -> Result<Decision, WorkflowError> {
        let finalized = self
            .store
            .finalize_request(
                request.id,
                RequestDecision {
                    status: RequestStatus::Rejected,
                    approved_at: Utc::now(),
                    approved_by: decided_by,
                    center_id: None,
                },
            )
            .await?
            .ok_or_else(|| {
                WorkflowError::Conflict("request has already been decided".to_string())
            })?;

        tracing::info!(request_id = %finalized.id, "account request rejected");
        Ok(Decision {
            request: finalized,
            created_user: None,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::scope::TenantScope;
    use crate::store::MemoryStore;

    async fn submit(store: &MemoryStore, username: &str) -> AdminRequest {
        RequestWorkflow::new(store)
            .submit("North", username, "p1")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_submit_hashes_immediately() {
        let store = MemoryStore::new();
        let request = submit(&store, "alice").await;

        assert_eq!(request.status, RequestStatus::Pending);
        assert_ne!(request.password_hash, "p1");
        assert!(verify_password("p1", &request.password_hash).is_ok());
    }

    #[tokio::test]
    async fn test_submit_rejects_missing_fields() {
        let store = MemoryStore::new();
        let workflow = RequestWorkflow::new(&store);

        for (center, username, password) in
            [("", "alice", "p1"), ("North", "", "p1"), ("North", "alice", "")]
        {
            let err = workflow.submit(center, username, password).await.unwrap_err();
            assert!(matches!(err, WorkflowError::Validation(_)), "{center}/{username}");
        }
    }

    #[tokio::test]
    async fn test_approve_creates_bound_credential() {
        let store = MemoryStore::new();
        let center_id = store.seed_center("North", "N01");
        let reviewer = store.seed_admin_user("root", "rootpw", None, true, true);
        let request = submit(&store, "alice").await;

        let decision = RequestWorkflow::new(&store)
            .decide(reviewer.id, request.id, DecisionAction::Approve, Some(center_id))
            .await
            .unwrap();

        assert_eq!(decision.request.status, RequestStatus::Approved);
        assert_eq!(decision.request.center_id, Some(center_id));
        assert_eq!(decision.request.approved_by, Some(reviewer.id));
        assert!(decision.request.approved_at.is_some());

        let user = decision.created_user.unwrap();
        assert_eq!(user.center_id, Some(center_id));
        assert!(user.is_active);
        assert!(!user.is_superadmin);
        // The submission-time hash was reused, no re-hash round trip.
        assert_eq!(user.password_hash, request.password_hash);
    }

    #[tokio::test]
    async fn test_approve_requires_center() {
        let store = MemoryStore::new();
        let reviewer = store.seed_admin_user("root", "rootpw", None, true, true);
        let request = submit(&store, "alice").await;

        let err = RequestWorkflow::new(&store)
            .decide(reviewer.id, request.id, DecisionAction::Approve, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));

        let unknown = CenterId::random();
        let err = RequestWorkflow::new(&store)
            .decide(reviewer.id, request.id, DecisionAction::Approve, Some(unknown))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));

        // Both failures left the request pending.
        let reloaded = store.request_by_id(request.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn test_approve_duplicate_username_conflicts() {
        let store = MemoryStore::new();
        let center_id = store.seed_center("North", "N01");
        let reviewer = store.seed_admin_user("root", "rootpw", None, true, true);
        store.seed_admin_user("alice", "other-password", Some(center_id), true, false);
        let request = submit(&store, "alice").await;

        let err = RequestWorkflow::new(&store)
            .decide(reviewer.id, request.id, DecisionAction::Approve, Some(center_id))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Conflict(_)));

        // No second credential, request still pending.
        let users = store.admin_user_by_username(&Username::parse("alice").unwrap())
            .await
            .unwrap();
        assert!(users.is_some());
        let reloaded = store.request_by_id(request.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn test_approve_converges_after_partial_failure() {
        let store = MemoryStore::new();
        let center_id = store.seed_center("North", "N01");
        let reviewer = store.seed_admin_user("root", "rootpw", None, true, true);
        let request = submit(&store, "alice").await;

        // Simulate the first approve crashing after the credential insert:
        // the user row exists with the request's own hash, the request is
        // still pending.
        store
            .insert_admin_user(NewAdminUser {
                username: request.username.clone(),
                password_hash: request.password_hash.clone(),
                center_id: Some(center_id),
                is_active: true,
                is_superadmin: false,
            })
            .await
            .unwrap();

        let decision = RequestWorkflow::new(&store)
            .decide(reviewer.id, request.id, DecisionAction::Approve, Some(center_id))
            .await
            .unwrap();

        assert_eq!(decision.request.status, RequestStatus::Approved);
        // The existing credential was reused, not duplicated.
        let user = decision.created_user.unwrap();
        assert_eq!(user.password_hash, request.password_hash);
    }

    #[tokio::test]
    async fn test_reject_never_creates_credential() {
        let store = MemoryStore::new();
        let reviewer = store.seed_admin_user("root", "rootpw", None, true, true);
        let request = submit(&store, "alice").await;

        let decision = RequestWorkflow::new(&store)
            .decide(reviewer.id, request.id, DecisionAction::Reject, None)
            .await
            .unwrap();

        assert_eq!(decision.request.status, RequestStatus::Rejected);
        assert!(decision.request.approved_at.is_some());
        assert!(decision.created_user.is_none());
        assert!(
            store
                .admin_user_by_username(&Username::parse("alice").unwrap())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_second_decision_conflicts() {
        let store = MemoryStore::new();
        let center_id = store.seed_center("North", "N01");
        let reviewer = store.seed_admin_user("root", "rootpw", None, true, true);
        let request = submit(&store, "alice").await;
        let workflow = RequestWorkflow::new(&store);

        workflow
            .decide(reviewer.id, request.id, DecisionAction::Approve, Some(center_id))
            .await
            .unwrap();

        for action in [DecisionAction::Approve, DecisionAction::Reject] {
            let err = workflow
                .decide(reviewer.id, request.id, action, Some(center_id))
                .await
                .unwrap_err();
            assert!(matches!(err, WorkflowError::Conflict(_)));
        }

        // Exactly one terminal state, no flip-flop.
        let reloaded = store.request_by_id(request.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, RequestStatus::Approved);
    }

    #[tokio::test]
    async fn test_decide_unknown_request_is_not_found() {
        let store = MemoryStore::new();
        let reviewer = store.seed_admin_user("root", "rootpw", None, true, true);

        let err = RequestWorkflow::new(&store)
            .decide(reviewer.id, RequestId::random(), DecisionAction::Reject, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound));
    }

    #[tokio::test]
    async fn test_store_failure_leaves_request_pending() {
        let store = MemoryStore::new();
        let center_id = store.seed_center("North", "N01");
        let reviewer = store.seed_admin_user("root", "rootpw", None, true, true);
        let request = submit(&store, "alice").await;

        store.set_unavailable(true);
        let err = RequestWorkflow::new(&store)
            .decide(reviewer.id, request.id, DecisionAction::Approve, Some(center_id))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Store(_)));

        store.set_unavailable(false);
        let reloaded = store.request_by_id(request.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, RequestStatus::Pending);

        // The retry converges.
        let decision = RequestWorkflow::new(&store)
            .decide(reviewer.id, request.id, DecisionAction::Approve, Some(center_id))
            .await
            .unwrap();
        assert_eq!(decision.request.status, RequestStatus::Approved);
    }

    #[tokio::test]
    async fn test_scope_is_not_consulted_by_workflow() {
        // The workflow is superadmin-gated upstream; a sanity check that the
        // created credential lands under the reviewer-chosen center.
        let store = MemoryStore::new();
        let center_id = store.seed_center("North", "N01");
        let reviewer = store.seed_admin_user("root", "rootpw", None, true, true);
        let request = submit(&store, "alice").await;

        let decision = RequestWorkflow::new(&store)
            .decide(reviewer.id, request.id, DecisionAction::Approve, Some(center_id))
            .await
            .unwrap();

        let scope = decision
            .created_user
            .unwrap()
            .center_id
            .map(TenantScope::Center)
            .unwrap();
        assert!(scope.permits(center_id));
    }
}
