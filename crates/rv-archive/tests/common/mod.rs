//! Fixtures shared by rv-archive integration tests.

#![allow(dead_code)]

use futures_util::TryStreamExt;
use rv_archive::{ArchiveError, ArchiveStream};
use rv_core::entities::{FindingTemplate, Project, ProjectMember, ProjectType, User};
use rv_core::enums::LinkedObject;
use rv_core::fields::{FieldData, FieldMap};
use rv_db::repos::project_type::NewProjectType;
use rv_db::repos::template::NewTemplate;
use rv_db::repos::user::NewUser;
use rv_db::{VaultDb, VaultService};
use rv_files::FileStore;
use serde_json::json;

pub async fn service() -> VaultService {
    let db = VaultDb::open_local(":memory:").await.unwrap();
    VaultService::from_db(db, FileStore::in_memory())
}

pub async fn collect(stream: Result<ArchiveStream, ArchiveError>) -> Vec<u8> {
    stream.unwrap().try_concat().await.unwrap()
}

pub fn data(value: serde_json::Value) -> FieldData {
    value.as_object().cloned().unwrap()
}

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
        "field_list": {"type": "list", "items": {"type": "string"}},
        "field_list_objects": {
            "type": "list",
            "items": {"type": "object", "properties": {"nested1": {"type": "string", "default": "nested"}}}
        }
    }))
    .unwrap()
}

pub async fn user(svc: &VaultService, username: &str) -> User {
    svc.create_user(
        NewUser::new(username)
            .email(format!("{username}@example.com"))
            .phone("+43 1 234")
            .name("Herbert", "Testinger")
            .titles("Dr.", "BSc"),
    )
    .await
    .unwrap()
}

pub async fn template(svc: &VaultService) -> FindingTemplate {
    svc.create_template(NewTemplate {
        language: "de-DE".into(),
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

/// Project type with extra report and finding fields and two assets.
pub async fn project_type(svc: &VaultService) -> ProjectType {
    let mut new = NewProjectType::new("Project Type");
    new.report_fields.extend(additional_fields());
    new.finding_fields.extend(additional_fields());
    new.report_template = "<section>{{ report.title }}</section>".into();
    new.report_styles = "@page { size: A4; }".into();
    new.report_preview_data = data(json!({"report": {"title": "Preview"}}));
    let pt = svc.create_project_type(new).await.unwrap();
    let owner = LinkedObject::ProjectType(pt.id.clone());
    svc.upload_file(&owner, "file1.png", b"asset1").await.unwrap();
    svc.upload_file(&owner, "file2.png", b"asset2").await.unwrap();
    pt
}

/// Project with the given members, two findings assigned to the first member,
/// and two images.
pub async fn project(svc: &VaultService, pt: &ProjectType, members: &[&User]) -> Project {
    let project_members: Vec<ProjectMember> = members
        .iter()
        .map(|u| ProjectMember {
            user_id: u.id.clone(),
            roles: vec!["pentester".into()],
        })
        .collect();
    let project = svc
        .create_project("Pentest Project", &pt.id, &project_members)
        .await
        .unwrap();
    svc.update_project_data(
        &project.id,
        &data(json!({"title": "Report title", "undefined_field": "test"})),
    )
    .await
    .unwrap();

    let assignee = members.first().map(|u| u.id.clone());
    for title in ["Finding 1", "Finding 2"] {
        let finding = svc
            .create_finding(
                &project.id,
                data(json!({"title": title, "field_list_objects": [{"nested1": "a"}, {}]})),
                None,
            )
            .await
            .unwrap();
        if assignee.is_some() {
            svc.update_finding(
                &finding.id,
                rv_db::updates::finding::FindingUpdateBuilder::new()
                    .assignee(assignee.clone())
                    .build(),
            )
            .await
            .unwrap();
        }
    }
    if let Some(assignee) = assignee {
        let section = svc.list_sections(&project.id).await.unwrap().remove(0);
        svc.update_section(
            &section.id,
            rv_db::updates::section::SectionUpdateBuilder::new()
                .assignee(Some(assignee))
                .build(),
        )
        .await
        .unwrap();
    }

    let owner = LinkedObject::Project(project.id.clone());
    svc.upload_file(&owner, "image1.png", b"image1").await.unwrap();
    svc.upload_file(&owner, "image2.png", b"image2").await.unwrap();
    svc.get_project(&project.id).await.unwrap()
}
