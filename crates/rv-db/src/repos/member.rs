//! Project membership repository.

use rv_core::entities::ProjectMember;

use crate::error::DatabaseError;
use crate::helpers::{parse_json, to_json};
use crate::service::VaultService;

impl VaultService {
    /// Add or replace a membership.
    pub async fn add_member(
        &self,
        project_id: &str,
        member: &ProjectMember,
    ) -> Result<(), DatabaseError> {
        self.db()
            .execute(
                "INSERT INTO project_members (project_id, user_id, roles) VALUES (?1, ?2, ?3)
                 ON CONFLICT (project_id, user_id) DO UPDATE SET roles = excluded.roles",
                libsql::params![project_id, member.user_id.as_str(), to_json(&member.roles)?],
            )
            .await?;
        Ok(())
    }

    pub async fn list_members(&self, project_id: &str) -> Result<Vec<ProjectMember>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                "SELECT user_id, roles FROM project_members WHERE project_id = ?1 ORDER BY user_id",
                [project_id],
            )
            .await?;
        let mut members = Vec::new();
        while let Some(row) = rows.next().await? {
            members.push(ProjectMember {
                user_id: row.get::<String>(0)?,
                roles: parse_json(&row.get::<String>(1)?)?,
            });
        }
        Ok(members)
    }

    pub async fn remove_member(&self, project_id: &str, user_id: &str) -> Result<bool, DatabaseError> {
        let changed = self
            .db()
            .execute(
                "DELETE FROM project_members WHERE project_id = ?1 AND user_id = ?2",
                [project_id, user_id],
            )
            .await?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{create_project_type, create_user, test_service};

    #[tokio::test]
    async fn members_follow_user_deletion() {
        let svc = test_service().await;
        let alice = create_user(&svc, "alice").await;
        let bob = create_user(&svc, "bob").await;
        let pt = create_project_type(&svc).await;
        let members = [
            ProjectMember {
                user_id: alice.id.clone(),
                roles: vec!["pentester".into()],
            },
            ProjectMember {
                user_id: bob.id.clone(),
                roles: vec!["reviewer".into()],
            },
        ];
        let project = svc.create_project("P", &pt.id, &members).await.unwrap();
        assert_eq!(svc.list_members(&project.id).await.unwrap().len(), 2);

        svc.delete_user(&alice.id).await.unwrap();
        let left = svc.list_members(&project.id).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].user_id, bob.id);
        assert_eq!(left[0].roles, vec!["reviewer"]);
    }

    #[tokio::test]
    async fn add_member_replaces_roles() {
        let svc = test_service().await;
        let alice = create_user(&svc, "alice").await;
        let pt = create_project_type(&svc).await;
        let project = svc.create_project("P", &pt.id, &[]).await.unwrap();

        let mut member = ProjectMember {
            user_id: alice.id.clone(),
            roles: vec!["pentester".into()],
        };
        svc.add_member(&project.id, &member).await.unwrap();
        member.roles.push("lead".into());
        svc.add_member(&project.id, &member).await.unwrap();

        let members = svc.list_members(&project.id).await.unwrap();
        assert_eq!(members, vec![member]);
        assert!(svc.remove_member(&project.id, &alice.id).await.unwrap());
        assert!(!svc.remove_member(&project.id, &alice.id).await.unwrap());
    }
}
