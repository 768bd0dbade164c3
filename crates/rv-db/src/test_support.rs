//! Shared fixtures for rv-db unit tests.

#[cfg(test)]
pub(crate) mod helpers {
    use std::sync::Arc;

    use chrono::{DateTime, Utc};
    use rv_core::clock::FixedClock;
    use rv_core::entities::{FindingTemplate, Project, ProjectMember, ProjectType, User};
    use rv_core::enums::LinkedObject;
    use rv_core::fields::{FieldData, FieldMap};
    use rv_files::FileStore;
    use serde_json::json;

    use crate::VaultDb;
    use crate::repos::project_type::NewProjectType;
    use crate::repos::template::NewTemplate;
    use crate::repos::user::NewUser;
    use crate::service::VaultService;

    /// In-memory database and blob store.
    pub async fn test_service() -> VaultService {
        let db = VaultDb::open_local(":memory:").await.unwrap();
        VaultService::from_db(db, FileStore::in_memory())
    }

    /// In-memory service whose clock is pinned at `start`.
    pub async fn test_service_with_clock(start: DateTime<Utc>) -> (VaultService, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(start));
        let svc = test_service().await.with_clock(clock.clone());
        (svc, clock)
    }

    pub fn data(value: serde_json::Value) -> FieldData {
        value.as_object().cloned().unwrap()
    }

    /// Extra fields covering every field type.
    pub fn additional_fields() -> FieldMap {
        serde_json::from_value(json!({
            "field_string": {"type": "string", "label": "String Field", "default": "test"},
            "field_int": {"type": "number", "label": "Number Field", "default": 10},
            "field_enum": {
                "type": "enum",
                "choices": [{"value": "enum1", "label": "Enum Value 1"}, {"value": "enum2", "label": "Enum Value 2"}],
                "default": "enum2"
            },
            "field_user": {"type": "user", "label": "User Field"},
            "field_list": {"type": "list", "items": {"type": "string"}}
        }))
        .unwrap()
    }

    pub async fn create_user(svc: &VaultService, username: &str) -> User {
        svc.create_user(
            NewUser::new(username)
                .email(format!("{username}@example.com"))
                .name("Herbert", "Testinger"),
        )
        .await
        .unwrap()
    }

    pub async fn create_template(svc: &VaultService) -> FindingTemplate {
        svc.create_template(NewTemplate {
            language: "en-US".into(),
            tags: vec!["web".into(), "dev".into()],
            data: data(json!({
                "title": "Template Title",
                "description": "Template Description",
                "undefined_field": "test"
            })),
        })
        .await
        .unwrap()
    }

    /// Project type with extra fields and two assets.
    pub async fn create_project_type(svc: &VaultService) -> ProjectType {
        let mut new = NewProjectType::new("Project Type");
        new.report_fields.extend(additional_fields());
        new.finding_fields.extend(additional_fields());
        let pt = svc.create_project_type(new).await.unwrap();
        let owner = LinkedObject::ProjectType(pt.id.clone());
        svc.upload_file(&owner, "file1.png", b"asset1").await.unwrap();
        svc.upload_file(&owner, "file2.png", b"asset2").await.unwrap();
        pt
    }

    /// Project with the given members, two findings, and two images.
    pub async fn create_project(
        svc: &VaultService,
        project_type: &ProjectType,
        members: &[&User],
    ) -> Project {
        let members: Vec<ProjectMember> = members
            .iter()
            .map(|u| ProjectMember {
                user_id: u.id.clone(),
                roles: vec!["pentester".into()],
            })
            .collect();
        let project = svc
            .create_project("Pentest Project", &project_type.id, &members)
            .await
            .unwrap();
        svc.update_project_data(
            &project.id,
            &data(json!({"title": "Report title", "undefined_field": "test"})),
        )
        .await
        .unwrap();

        for title in ["Finding 1", "Finding 2"] {
            svc.create_finding(&project.id, data(json!({"title": title})), None)
                .await
                .unwrap();
        }

        let owner = LinkedObject::Project(project.id.clone());
        svc.upload_file(&owner, "image1.png", b"image1").await.unwrap();
        svc.upload_file(&owner, "image2.png", b"image2").await.unwrap();
        svc.get_project(&project.id).await.unwrap()
    }
}
