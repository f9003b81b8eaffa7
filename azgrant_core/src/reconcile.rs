//! Convergence of granted app roles toward a declared permission list.
//!
//! A reconcile run is two phases: `plan` resolves the requested
//! permissions and classifies each one against the assignee's current
//! assignments without mutating anything, and `execute` issues only the
//! creates or deletes the plan calls for. The CLI shows the plan and
//! gates `execute` behind confirmation; `reconcile` is the two phases
//! back to back.
//!
//! No re-read happens between the phases, so two concurrent runs against
//! the same principal can still race between list and create. A duplicate
//! create the directory rejects surfaces as a `Failed` outcome, not a
//! crash.

use std::fmt::Display;

use colored::Colorize;
use indexmap::IndexSet;

use crate::directory::types::{AssignmentId, NewAppRoleAssignment, Principal, Resource};
use crate::directory::DirectoryApi;
use crate::error::DirectoryError;
use crate::lookup::resolve_app_role;

/// Which direction to converge in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Create assignments that are desired but absent.
    Grant,
    /// Delete assignments that are present but undesired.
    Revoke,
}

/// The terminal state of one requested permission after a reconcile run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// An assignment was created.
    Granted {
        /// The permission's symbolic name.
        permission: String,
    },
    /// The assignment already existed; no API call was made.
    AlreadyGranted {
        /// The permission's symbolic name.
        permission: String,
    },
    /// An assignment was deleted.
    Revoked {
        /// The permission's symbolic name.
        permission: String,
    },
    /// No assignment existed to revoke; no API call was made.
    AlreadyAbsent {
        /// The permission's symbolic name.
        permission: String,
    },
    /// The permission name failed to resolve to an application role.
    /// Non-fatal to the batch.
    Skipped {
        /// The permission's symbolic name.
        permission: String,
        /// Why resolution failed.
        reason: DirectoryError,
    },
    /// The directory rejected the create or delete.
    Failed {
        /// The permission's symbolic name.
        permission: String,
        /// The backend error.
        reason: DirectoryError,
    },
}

impl Outcome {
    /// The permission this outcome describes.
    pub fn permission(&self) -> &str {
        match self {
            Outcome::Granted { permission }
            | Outcome::AlreadyGranted { permission }
            | Outcome::Revoked { permission }
            | Outcome::AlreadyAbsent { permission }
            | Outcome::Skipped { permission, .. }
            | Outcome::Failed { permission, .. } => permission,
        }
    }

    /// Whether this outcome should make the overall run exit non-zero.
    /// Skips count: automation callers need to see that a requested
    /// permission was not applied.
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Skipped { .. } | Outcome::Failed { .. })
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Granted { permission } => {
                write!(f, "{}", format!("+ granted: {permission}").green())
            }
            Outcome::AlreadyGranted { permission } => {
                write!(f, "= already granted: {permission}")
            }
            Outcome::Revoked { permission } => {
                write!(f, "{}", format!("- revoked: {permission}").red())
            }
            Outcome::AlreadyAbsent { permission } => {
                write!(f, "= already absent: {permission}")
            }
            Outcome::Skipped { permission, reason } => write!(
                f,
                "{}",
                format!("~ skipped: {permission} ({reason})").yellow()
            ),
            Outcome::Failed { permission, reason } => {
                write!(f, "{}", format!("! failed: {permission} ({reason})").red())
            }
        }
    }
}

/// One entry of an [`AssignmentPlan`].
#[derive(Clone, Debug)]
pub enum PlannedStep {
    /// Create an assignment from the three-field body.
    Create {
        /// The permission's symbolic name.
        permission: String,
        /// The typed create body.
        new: NewAppRoleAssignment,
    },
    /// Delete an existing assignment by its server-assigned id.
    Delete {
        /// The permission's symbolic name.
        permission: String,
        /// The id of the assignment to delete.
        assignment_id: AssignmentId,
    },
    /// Nothing to do; the outcome is already known at plan time.
    Settled(Outcome),
}

/// The read-only classification of a reconcile run: what `execute` would
/// do for each requested permission, in request order.
#[derive(Clone, Debug)]
pub struct AssignmentPlan {
    /// The grantee.
    pub principal: Principal,
    /// Display name of the API provider, for messages.
    pub resource_name: String,
    /// Grant or revoke.
    pub mode: Mode,
    /// Per-permission steps, in request order.
    pub steps: Vec<PlannedStep>,
}

impl AssignmentPlan {
    /// Whether executing the plan would issue any create or delete.
    pub fn has_changes(&self) -> bool {
        self.steps
            .iter()
            .any(|s| !matches!(s, PlannedStep::Settled(_)))
    }
}

impl Display for AssignmentPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} on {} for {}:",
            match self.mode {
                Mode::Grant => "grant",
                Mode::Revoke => "revoke",
            },
            self.resource_name,
            self.principal.display_name,
        )?;
        for step in &self.steps {
            match step {
                PlannedStep::Create { permission, .. } => {
                    writeln!(f, "{}", format!("  + {permission}").green())?
                }
                PlannedStep::Delete { permission, .. } => {
                    writeln!(f, "{}", format!("  - {permission}").red())?
                }
                PlannedStep::Settled(outcome) => writeln!(f, "  {outcome}")?,
            }
        }
        Ok(())
    }
}

/// Converges the assignment set for a (principal, resource) pair toward a
/// desired permission list. Read-only inputs (principal, resource, roles)
/// are never mutated; the only state touched is the principal's
/// assignment collection.
pub struct AssignmentReconciler<'a> {
    directory: &'a (dyn DirectoryApi + Send + Sync),
}

impl<'a> AssignmentReconciler<'a> {
    /// Wrap an authenticated directory client.
    pub fn new(directory: &'a (dyn DirectoryApi + Send + Sync)) -> Self {
        Self { directory }
    }

    /// Resolve and classify each desired permission against the
    /// principal's current assignments. Read-only: issues one assignment
    /// list call and no mutations.
    ///
    /// A permission that fails role resolution becomes a settled
    /// `Skipped` step; the rest of the batch proceeds. A failure to list
    /// the current assignments aborts the whole plan, since every
    /// classification depends on it.
    pub async fn plan(
        &self,
        principal: &Principal,
        resource: &Resource,
        desired: &IndexSet<String>,
        mode: Mode,
    ) -> Result<AssignmentPlan, DirectoryError> {
        // Always scoped to the assignee: a resource can carry assignments
        // from many principals.
        let existing = self
            .directory
            .assignments_for_principal(&principal.id)
            .await?;

        let mut steps = Vec::with_capacity(desired.len());
        for permission in desired {
            let role = match resolve_app_role(resource, permission) {
                Ok(role) => role,
                Err(reason) => {
                    steps.push(PlannedStep::Settled(Outcome::Skipped {
                        permission: permission.clone(),
                        reason,
                    }));
                    continue;
                }
            };

            let current = existing.iter().find(|a| a.matches(&resource.id, &role.id));
            let step = match (mode, current) {
                (Mode::Grant, Some(_)) => PlannedStep::Settled(Outcome::AlreadyGranted {
                    permission: permission.clone(),
                }),
                (Mode::Grant, None) => PlannedStep::Create {
                    permission: permission.clone(),
                    new: NewAppRoleAssignment::new(principal, resource, role),
                },
                (Mode::Revoke, Some(assignment)) => PlannedStep::Delete {
                    permission: permission.clone(),
                    assignment_id: assignment.id.clone(),
                },
                (Mode::Revoke, None) => PlannedStep::Settled(Outcome::AlreadyAbsent {
                    permission: permission.clone(),
                }),
            };
            steps.push(step);
        }

        Ok(AssignmentPlan {
            principal: principal.clone(),
            resource_name: resource.display_name.clone(),
            mode,
            steps,
        })
    }

    /// Issue the creates and deletes a plan calls for, sequentially and in
    /// plan order. A failed call becomes that permission's `Failed`
    /// outcome; the rest of the batch still runs.
    pub async fn execute(&self, plan: AssignmentPlan) -> Vec<Outcome> {
        let mut outcomes = Vec::with_capacity(plan.steps.len());
        for step in plan.steps {
            let outcome = match step {
                PlannedStep::Settled(outcome) => outcome,
                PlannedStep::Create { permission, new } => {
                    match self.directory.create_assignment(&new).await {
                        Ok(_) => Outcome::Granted { permission },
                        Err(reason) => Outcome::Failed { permission, reason },
                    }
                }
                PlannedStep::Delete {
                    permission,
                    assignment_id,
                } => {
                    match self
                        .directory
                        .delete_assignment(&plan.principal.id, &assignment_id)
                        .await
                    {
                        Ok(()) => Outcome::Revoked { permission },
                        Err(reason) => Outcome::Failed { permission, reason },
                    }
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Plan and execute in one call.
    pub async fn reconcile(
        &self,
        principal: &Principal,
        resource: &Resource,
        desired: &IndexSet<String>,
        mode: Mode,
    ) -> Result<Vec<Outcome>, DirectoryError> {
        let plan = self.plan(principal, resource, desired, mode).await?;
        Ok(self.execute(plan).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::test_util::{resource_with_role, FakeDirectory};
    use crate::directory::types::{AppRole, ApplicationId, Resource};
    use uuid::Uuid;

    fn desired(permissions: &[&str]) -> IndexSet<String> {
        permissions.iter().map(|p| p.to_string()).collect()
    }

    fn setup(permission: &str) -> (FakeDirectory, Principal, Resource, Uuid) {
        let role_id = Uuid::new_v4();
        let resource = resource_with_role("G1", role_id, permission);
        let directory = FakeDirectory::new()
            .with_principal("P1", "adf-01")
            .with_resource(resource.clone());
        let principal = directory.principals[0].clone();
        (directory, principal, resource, role_id)
    }

    #[tokio::test]
    async fn grant_then_grant_is_idempotent() {
        let (directory, principal, resource, _) = setup("Sites.Selected");
        let reconciler = AssignmentReconciler::new(&directory);
        let wanted = desired(&["Sites.Selected"]);

        let first = reconciler
            .reconcile(&principal, &resource, &wanted, Mode::Grant)
            .await
            .unwrap();
        assert_eq!(
            first,
            vec![Outcome::Granted {
                permission: "Sites.Selected".to_owned()
            }]
        );

        let second = reconciler
            .reconcile(&principal, &resource, &wanted, Mode::Grant)
            .await
            .unwrap();
        assert_eq!(
            second,
            vec![Outcome::AlreadyGranted {
                permission: "Sites.Selected".to_owned()
            }]
        );

        // Exactly one create across both runs, exactly one assignment.
        assert_eq!(directory.create_calls(), 1);
        assert_eq!(directory.assignment_count(), 1);
    }

    #[tokio::test]
    async fn revoking_an_absent_assignment_is_a_noop() {
        let (directory, principal, resource, _) = setup("Sites.Selected");
        let reconciler = AssignmentReconciler::new(&directory);

        let outcomes = reconciler
            .reconcile(&principal, &resource, &desired(&["Sites.Selected"]), Mode::Revoke)
            .await
            .unwrap();
        assert_eq!(
            outcomes,
            vec![Outcome::AlreadyAbsent {
                permission: "Sites.Selected".to_owned()
            }]
        );
        assert_eq!(directory.delete_calls(), 0);
    }

    #[tokio::test]
    async fn grant_then_revoke_round_trips() {
        let (directory, principal, resource, _) = setup("Sites.Selected");
        let reconciler = AssignmentReconciler::new(&directory);
        let wanted = desired(&["Sites.Selected"]);

        reconciler
            .reconcile(&principal, &resource, &wanted, Mode::Grant)
            .await
            .unwrap();
        assert_eq!(directory.assignment_count(), 1);

        let outcomes = reconciler
            .reconcile(&principal, &resource, &wanted, Mode::Revoke)
            .await
            .unwrap();
        assert_eq!(
            outcomes,
            vec![Outcome::Revoked {
                permission: "Sites.Selected".to_owned()
            }]
        );
        assert_eq!(directory.assignment_count(), 0);
    }

    #[tokio::test]
    async fn one_bad_permission_does_not_block_the_others() {
        let (directory, principal, resource, _) = setup("Valid.Permission");
        let reconciler = AssignmentReconciler::new(&directory);

        let outcomes = reconciler
            .reconcile(
                &principal,
                &resource,
                &desired(&["Valid.Permission", "Nonexistent.Permission"]),
                Mode::Grant,
            )
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(
            outcomes[0],
            Outcome::Granted {
                permission: "Valid.Permission".to_owned()
            }
        );
        assert!(matches!(
            &outcomes[1],
            Outcome::Skipped { permission, reason: DirectoryError::RoleNotFound { .. } }
                if permission == "Nonexistent.Permission"
        ));
        // The valid permission's assignment exists despite the skip.
        assert_eq!(directory.assignment_count(), 1);
    }

    #[tokio::test]
    async fn create_failure_is_per_item_and_batch_continues() {
        let role_a = Uuid::new_v4();
        let role_b = Uuid::new_v4();
        let mut resource = resource_with_role("G1", role_a, "First.Permission");
        resource.app_roles.push(AppRole {
            id: role_b,
            value: Some("Second.Permission".to_owned()),
            allowed_member_types: vec!["Application".to_owned()],
        });
        let mut directory = FakeDirectory::new()
            .with_principal("P1", "adf-01")
            .with_resource(resource.clone());
        directory.fail_creates = Some(DirectoryError::Api {
            status: 403,
            code: "Authorization_RequestDenied".to_owned(),
            message: "insufficient privileges".to_owned(),
        });
        let principal = directory.principals[0].clone();

        let reconciler = AssignmentReconciler::new(&directory);
        let outcomes = reconciler
            .reconcile(
                &principal,
                &resource,
                &desired(&["First.Permission", "Second.Permission"]),
                Mode::Grant,
            )
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| matches!(
            o,
            Outcome::Failed { reason: DirectoryError::Api { status: 403, .. }, .. }
        )));
        // Both creates were attempted; the first failure did not stop the run.
        assert_eq!(directory.create_calls(), 2);
    }

    #[tokio::test]
    async fn plan_is_read_only() {
        let (directory, principal, resource, role_id) = setup("Sites.Selected");
        let reconciler = AssignmentReconciler::new(&directory);

        let plan = reconciler
            .plan(&principal, &resource, &desired(&["Sites.Selected"]), Mode::Grant)
            .await
            .unwrap();

        assert!(plan.has_changes());
        assert!(matches!(
            &plan.steps[0],
            PlannedStep::Create { new, .. }
                if new.principal_id == principal.id
                    && new.resource_id == resource.id
                    && new.app_role_id == role_id
        ));
        assert_eq!(directory.create_calls(), 0);
        assert_eq!(directory.assignment_count(), 0);
    }

    #[tokio::test]
    async fn concrete_grant_scenario() {
        // Principal adf-01 (P1), resource Graph (G1) exposing
        // Sites.Selected (R1) to applications, no pre-existing grants.
        let r1 = Uuid::new_v4();
        let graph = Resource {
            id: "G1".into(),
            app_id: ApplicationId(Uuid::new_v4()),
            display_name: "Microsoft Graph".to_owned(),
            app_roles: vec![AppRole {
                id: r1,
                value: Some("Sites.Selected".to_owned()),
                allowed_member_types: vec!["Application".to_owned()],
            }],
        };
        let directory = FakeDirectory::new()
            .with_principal("P1", "adf-01")
            .with_resource(graph.clone());
        let principal = directory.principals[0].clone();
        let reconciler = AssignmentReconciler::new(&directory);
        let wanted = desired(&["Sites.Selected"]);

        let first = reconciler
            .reconcile(&principal, &graph, &wanted, Mode::Grant)
            .await
            .unwrap();
        assert_eq!(
            first,
            vec![Outcome::Granted {
                permission: "Sites.Selected".to_owned()
            }]
        );
        assert_eq!(directory.create_calls(), 1);
        {
            let assignments = directory.assignments.lock().unwrap();
            assert_eq!(assignments.len(), 1);
            assert_eq!(assignments[0].principal_id, "P1".into());
            assert_eq!(assignments[0].resource_id, "G1".into());
            assert_eq!(assignments[0].app_role_id, r1);
        }

        let second = reconciler
            .reconcile(&principal, &graph, &wanted, Mode::Grant)
            .await
            .unwrap();
        assert_eq!(
            second,
            vec![Outcome::AlreadyGranted {
                permission: "Sites.Selected".to_owned()
            }]
        );
        // Re-running issued zero additional creates.
        assert_eq!(directory.create_calls(), 1);
    }

    #[test]
    fn skips_and_failures_fail_the_run() {
        assert!(Outcome::Skipped {
            permission: "x".to_owned(),
            reason: DirectoryError::Timeout
        }
        .is_failure());
        assert!(Outcome::Failed {
            permission: "x".to_owned(),
            reason: DirectoryError::Timeout
        }
        .is_failure());
        assert!(!Outcome::AlreadyGranted {
            permission: "x".to_owned()
        }
        .is_failure());
        assert!(!Outcome::Granted {
            permission: "x".to_owned()
        }
        .is_failure());
    }
}
