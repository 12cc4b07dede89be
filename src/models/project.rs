use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Input structure for creating a project.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ProjectInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

/// A project: one owner and the set of users allowed to see its tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    /// Always contains `owner_id` on creation.
    pub member_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn new(input: ProjectInput, owner_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            description: input.description,
            owner_id,
            member_ids: vec![owner_id],
            created_at: now,
        }
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.member_ids.contains(&user_id)
    }

    /// Adds a member. Returns `false` if they were already one.
    pub fn add_member(&mut self, user_id: Uuid) -> bool {
        if self.is_member(user_id) {
            return false;
        }
        self.member_ids.push(user_id);
        true
    }

    /// Removes a member. Returns `false` if they were not one.
    pub fn remove_member(&mut self, user_id: Uuid) -> bool {
        let before = self.member_ids.len();
        self.member_ids.retain(|id| *id != user_id);
        self.member_ids.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str) -> ProjectInput {
        ProjectInput {
            name: name.to_string(),
            description: None,
        }
    }

    #[test]
    fn test_project_creation_includes_owner_as_member() {
        let owner = Uuid::new_v4();
        let project = Project::new(input("  Launch "), owner, Utc::now());

        assert_eq!(project.name, "Launch");
        assert_eq!(project.owner_id, owner);
        assert_eq!(project.member_ids, vec![owner]);
        assert!(project.is_member(owner));
    }

    #[test]
    fn test_membership_changes_are_idempotent() {
        let owner = Uuid::new_v4();
        let member = Uuid::new_v4();
        let mut project = Project::new(input("Launch"), owner, Utc::now());

        assert!(project.add_member(member));
        assert!(!project.add_member(member));
        assert_eq!(project.member_ids.len(), 2);

        assert!(project.remove_member(member));
        assert!(!project.remove_member(member));
        assert!(!project.is_member(member));
    }

    #[test]
    fn test_project_input_validation() {
        assert!(input("Valid").validate().is_ok());
        assert!(input("").validate().is_err());
        assert!(input(&"p".repeat(201)).validate().is_err());
    }
}
