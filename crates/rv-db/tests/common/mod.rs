//! Fixtures shared by rv-db integration tests.

#![allow(dead_code)]

use rv_core::entities::{Project, ProjectMember, ProjectType, User};
use rv_core::enums::LinkedObject;
use rv_db::repos::project_type::NewProjectType;
use rv_db::repos::user::NewUser;
use rv_db::{VaultDb, VaultService};
use rv_files::FileStore;

pub async fn service() -> VaultService {
    let db = VaultDb::open_local(":memory:").await.unwrap();
    VaultService::from_db(db, FileStore::in_memory())
}

pub async fn user(svc: &VaultService, username: &str) -> User {
    svc.create_user(NewUser::new(username).email(format!("{username}@example.com")))
        .await
        .unwrap()
}

/// Project type with one asset whose content is unique to `name`.
pub async fn project_type(svc: &VaultService, name: &str) -> ProjectType {
    let pt = svc
        .create_project_type(NewProjectType::new(name))
        .await
        .unwrap();
    svc.upload_file(
        &LinkedObject::ProjectType(pt.id.clone()),
        "logo.png",
        format!("asset of {name}").as_bytes(),
    )
    .await
    .unwrap();
    pt
}

pub async fn project(svc: &VaultService, pt: &ProjectType, members: &[&User]) -> Project {
    let members: Vec<ProjectMember> = members
        .iter()
        .map(|u| ProjectMember {
            user_id: u.id.clone(),
            roles: vec!["pentester".into()],
        })
        .collect();
    svc.create_project("Linked Project", &pt.id, &members)
        .await
        .unwrap()
}
