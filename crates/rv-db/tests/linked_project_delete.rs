//! Deleting a project takes its linked, otherwise unused project types with it.

mod common;

use pretty_assertions::assert_eq;
use rv_db::error::DatabaseError;

#[tokio::test]
async fn linked_type_used_only_by_the_project_is_deleted() {
    let svc = common::service().await;
    let pt = common::project_type(&svc, "Design").await;
    let project = common::project(&svc, &pt, &[]).await;
    svc.set_linked_project(&pt.id, Some(&project.id)).await.unwrap();
    let asset = svc.list_assets(&pt.id).await.unwrap().remove(0);

    svc.delete_project(&project.id).await.unwrap();

    assert!(!svc.project_type_exists(&pt.id).await.unwrap());
    assert!(svc.list_assets(&pt.id).await.unwrap().is_empty());
    assert!(!svc.files().exists(&asset.file).await.unwrap());
}

#[tokio::test]
async fn unused_type_linked_to_the_project_is_deleted() {
    let svc = common::service().await;
    let pt = common::project_type(&svc, "Design").await;
    let unused = common::project_type(&svc, "Unused").await;
    let project = common::project(&svc, &pt, &[]).await;
    svc.set_linked_project(&pt.id, Some(&project.id)).await.unwrap();
    svc.set_linked_project(&unused.id, Some(&project.id)).await.unwrap();

    svc.delete_project(&project.id).await.unwrap();

    assert!(!svc.project_type_exists(&pt.id).await.unwrap());
    assert!(!svc.project_type_exists(&unused.id).await.unwrap());
}

#[tokio::test]
async fn linked_type_used_elsewhere_is_unlinked() {
    let svc = common::service().await;
    let pt = common::project_type(&svc, "Shared").await;
    let project = common::project(&svc, &pt, &[]).await;
    let other = common::project(&svc, &pt, &[]).await;
    svc.set_linked_project(&pt.id, Some(&project.id)).await.unwrap();

    svc.delete_project(&project.id).await.unwrap();

    let survivor = svc.get_project_type(&pt.id).await.unwrap();
    assert_eq!(survivor.linked_project, None);
    assert_eq!(svc.list_assets(&pt.id).await.unwrap().len(), 1);
    assert_eq!(
        svc.get_project(&other.id).await.unwrap().project_type_id,
        pt.id
    );
}

#[tokio::test]
async fn unlinked_type_survives_project_deletion() {
    let svc = common::service().await;
    let pt = common::project_type(&svc, "Global").await;
    let project = common::project(&svc, &pt, &[]).await;

    svc.delete_project(&project.id).await.unwrap();

    assert!(svc.project_type_exists(&pt.id).await.unwrap());
}

#[tokio::test]
async fn type_in_use_cannot_be_deleted() {
    let svc = common::service().await;
    let pt = common::project_type(&svc, "Busy").await;
    common::project(&svc, &pt, &[]).await;

    let err = svc.delete_project_type(&pt.id).await.unwrap_err();
    assert!(matches!(err, DatabaseError::InUse { entity: "project type", .. }));
    assert_eq!(svc.list_assets(&pt.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn deleting_a_member_user_keeps_the_project() {
    let svc = common::service().await;
    let alice = common::user(&svc, "alice").await;
    let bob = common::user(&svc, "bob").await;
    let pt = common::project_type(&svc, "Design").await;
    let project = common::project(&svc, &pt, &[&alice, &bob]).await;

    svc.delete_user(&alice.id).await.unwrap();

    let members = svc.list_members(&project.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, bob.id);
}
