//! Authorization rules.
//!
//! Every rule is a pure function of the caller's [`Identity`] and the target.
//! Handlers evaluate the rule first and only then touch the store, so a denied
//! call never has side effects.

use uuid::Uuid;

use crate::auth::Identity;
use crate::error::AppError;
use crate::models::{Project, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(&'static str),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// `Deny` becomes `AppError::Forbidden` carrying the reason.
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(AppError::Forbidden(reason.to_string())),
        }
    }

    fn from_bool(allowed: bool, reason: &'static str) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny(reason)
        }
    }
}

/// What the caller wants to do to a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Read,
    Update,
    Delete,
}

pub fn admin_only(identity: &Identity) -> Decision {
    Decision::from_bool(identity.is_admin(), "Admin access required")
}

/// The caller may act on their own account, an admin on any account.
///
/// Deleting one's own account is refused for everybody, admins included.
pub fn self_or_admin(identity: &Identity, target: Uuid, action: UserAction) -> Decision {
    let is_self = identity.id == target;
    match action {
        UserAction::Delete if is_self => Decision::Deny("You cannot delete your own account"),
        UserAction::Delete => admin_only(identity),
        UserAction::Read | UserAction::Update => {
            Decision::from_bool(is_self || identity.is_admin(), "Access denied")
        }
    }
}

pub fn project_owner(identity: &Identity, project: &Project) -> Decision {
    Decision::from_bool(
        project.owner_id == identity.id,
        "Only the project owner can manage members",
    )
}

pub fn project_member(identity: &Identity, project: &Project) -> Decision {
    Decision::from_bool(
        project.is_member(identity.id),
        "You are not a member of this project",
    )
}

/// Tasks are only visible to and mutable by whoever created them, even inside
/// a shared project.
pub fn resource_creator(identity: &Identity, task: &Task) -> Decision {
    Decision::from_bool(
        task.user_id == identity.id,
        "Only the task creator can access this task",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProjectInput, Role, TaskInput, UserProfile};
    use chrono::Utc;

    fn identity(role: Role) -> Identity {
        Identity(UserProfile {
            id: Uuid::new_v4(),
            name: "Someone".into(),
            email: "someone@example.com".into(),
            role,
            created_at: Utc::now(),
        })
    }

    fn project_of(owner: Uuid) -> Project {
        Project::new(
            ProjectInput {
                name: "Launch".into(),
                description: None,
            },
            owner,
            Utc::now(),
        )
    }

    fn task_by(creator: Uuid, project_id: Uuid) -> Task {
        Task::new(
            TaskInput {
                title: "Write docs".into(),
                description: None,
                project_id,
                status: None,
                priority: None,
                assignee_ids: vec![],
                due_date: None,
                tags: vec![],
            },
            creator,
            Utc::now(),
        )
    }

    #[test]
    fn test_admin_only() {
        assert_eq!(
            admin_only(&identity(Role::User)),
            Decision::Deny("Admin access required")
        );
        assert!(admin_only(&identity(Role::Admin)).is_allowed());
    }

    #[test]
    fn test_self_or_admin_read_and_update() {
        let user = identity(Role::User);
        let admin = identity(Role::Admin);
        let stranger = Uuid::new_v4();

        for action in [UserAction::Read, UserAction::Update] {
            assert!(self_or_admin(&user, user.id, action).is_allowed());
            assert!(!self_or_admin(&user, stranger, action).is_allowed());
            assert!(self_or_admin(&admin, stranger, action).is_allowed());
        }
    }

    #[test]
    fn test_self_delete_is_denied_even_for_admins() {
        let admin = identity(Role::Admin);
        let user = identity(Role::User);

        assert_eq!(
            self_or_admin(&admin, admin.id, UserAction::Delete),
            Decision::Deny("You cannot delete your own account")
        );
        assert!(!self_or_admin(&user, user.id, UserAction::Delete).is_allowed());
        assert!(self_or_admin(&admin, user.id, UserAction::Delete).is_allowed());
        assert!(!self_or_admin(&user, admin.id, UserAction::Delete).is_allowed());
    }

    #[test]
    fn test_project_rules() {
        let owner = identity(Role::User);
        let member = identity(Role::User);
        let outsider = identity(Role::Admin);
        let mut project = project_of(owner.id);
        project.add_member(member.id);

        assert!(project_owner(&owner, &project).is_allowed());
        assert!(!project_owner(&member, &project).is_allowed());

        assert!(project_member(&owner, &project).is_allowed());
        assert!(project_member(&member, &project).is_allowed());
        assert!(!project_member(&outsider, &project).is_allowed());
    }

    #[test]
    fn test_resource_creator_ignores_membership_and_role() {
        let creator = identity(Role::User);
        let member = identity(Role::User);
        let admin = identity(Role::Admin);
        let task = task_by(creator.id, Uuid::new_v4());

        assert!(resource_creator(&creator, &task).is_allowed());
        assert!(!resource_creator(&member, &task).is_allowed());
        assert!(!resource_creator(&admin, &task).is_allowed());
    }

    #[test]
    fn test_deny_becomes_forbidden() {
        match Decision::Deny("nope").into_result() {
            Err(AppError::Forbidden(reason)) => assert_eq!(reason, "nope"),
            other => panic!("expected forbidden, got {:?}", other),
        }
        assert!(Decision::Allow.into_result().is_ok());
    }
}
