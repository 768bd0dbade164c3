//! Uploaded file repository: images of projects and assets of project types.
//!
//! A record owns a sanitized name; its bytes live in the blob store under
//! the record's `file` key. Several records may share one blob. The blob is
//! physically removed only once no record references it, which is decided by
//! counting rows at release time.

use rv_core::entities::UploadedFile;
use rv_core::enums::{LinkedObject, LinkedKind};
use rv_core::ids::PREFIX_FILE;
use rv_files::{name_hash, numbered_filename, sanitize_filename};

use crate::error::DatabaseError;
use crate::helpers::{parse_datetime, parse_enum};
use crate::service::VaultService;

const FILE_COLUMNS: &str = "id, linked_kind, linked_id, name, name_hash, file, created_at";

fn row_to_file(row: &libsql::Row) -> Result<UploadedFile, DatabaseError> {
    let kind: LinkedKind = parse_enum(&row.get::<String>(1)?)?;
    Ok(UploadedFile {
        id: row.get::<String>(0)?,
        linked_object: LinkedObject::from_parts(kind, row.get::<String>(2)?),
        name: row.get::<String>(3)?,
        name_hash: row.get::<String>(4)?,
        file: row.get::<String>(5)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

impl VaultService {
    /// Store `content` and attach it to `owner` under a sanitized, owner-unique name.
    ///
    /// A clashing name gets `-N` inserted before its extension.
    pub async fn upload_file(
        &self,
        owner: &LinkedObject,
        name: &str,
        content: &[u8],
    ) -> Result<UploadedFile, DatabaseError> {
        let stored = self.files().store(name, content).await?;
        self.link_file(owner, &stored.name, &stored.key).await
    }

    /// Attach an already stored blob to `owner`.
    ///
    /// Used by copies and imports, which reuse blobs instead of duplicating bytes.
    pub async fn link_file(
        &self,
        owner: &LinkedObject,
        name: &str,
        key: &str,
    ) -> Result<UploadedFile, DatabaseError> {
        let name = self.unique_file_name(owner, &sanitize_filename(name)).await?;
        let file = UploadedFile {
            id: self.db().generate_id(PREFIX_FILE).await?,
            linked_object: owner.clone(),
            name_hash: name_hash(&name),
            name,
            file: key.to_string(),
            created_at: self.now(),
        };
        self.insert_file_record(&file).await?;
        tracing::debug!(owner = %owner, name = %file.name, key = %file.file, "linked file");
        Ok(file)
    }

    async fn insert_file_record(&self, file: &UploadedFile) -> Result<(), DatabaseError> {
        self.db()
            .execute(
                &format!("INSERT INTO uploaded_files ({FILE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
                libsql::params![
                    file.id.as_str(),
                    file.linked_object.kind().as_str(),
                    file.linked_object.id(),
                    file.name.as_str(),
                    file.name_hash.as_str(),
                    file.file.as_str(),
                    file.created_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    async fn unique_file_name(
        &self,
        owner: &LinkedObject,
        name: &str,
    ) -> Result<String, DatabaseError> {
        let mut candidate = name.to_string();
        let mut n = 1;
        while self.file_name_taken(owner, &candidate).await? {
            candidate = numbered_filename(name, n);
            n += 1;
        }
        Ok(candidate)
    }

    async fn file_name_taken(&self, owner: &LinkedObject, name: &str) -> Result<bool, DatabaseError> {
        let n = self
            .db()
            .count(
                "SELECT COUNT(*) FROM uploaded_files
                 WHERE linked_kind = ?1 AND linked_id = ?2 AND name_hash = ?3",
                libsql::params![owner.kind().as_str(), owner.id(), name_hash(name)],
            )
            .await?;
        Ok(n > 0)
    }

    pub async fn get_file(&self, id: &str) -> Result<UploadedFile, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                &format!("SELECT {FILE_COLUMNS} FROM uploaded_files WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("file", id))?;
        row_to_file(&row)
    }

    /// Look up a file of `owner` by its sanitized name.
    pub async fn find_file_by_name(
        &self,
        owner: &LinkedObject,
        name: &str,
    ) -> Result<Option<UploadedFile>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                &format!(
                    "SELECT {FILE_COLUMNS} FROM uploaded_files
                     WHERE linked_kind = ?1 AND linked_id = ?2 AND name_hash = ?3"
                ),
                libsql::params![owner.kind().as_str(), owner.id(), name_hash(name)],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_file(&row)?)),
            None => Ok(None),
        }
    }

    /// Files of `owner`, ordered by name.
    pub async fn list_files(&self, owner: &LinkedObject) -> Result<Vec<UploadedFile>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                &format!(
                    "SELECT {FILE_COLUMNS} FROM uploaded_files
                     WHERE linked_kind = ?1 AND linked_id = ?2 ORDER BY name"
                ),
                libsql::params![owner.kind().as_str(), owner.id()],
            )
            .await?;
        let mut files = Vec::new();
        while let Some(row) = rows.next().await? {
            files.push(row_to_file(&row)?);
        }
        Ok(files)
    }

    /// Read the bytes of a file record.
    pub async fn read_file(&self, file: &UploadedFile) -> Result<Vec<u8>, DatabaseError> {
        Ok(self.files().read(&file.file).await?)
    }

    /// Number of records pointing at blob `key`.
    pub async fn file_ref_count(&self, key: &str) -> Result<u64, DatabaseError> {
        self.db()
            .count("SELECT COUNT(*) FROM uploaded_files WHERE file = ?1", [key])
            .await
    }

    /// Remove blob `key` if no record references it any more.
    ///
    /// Returns `true` if the blob was removed. Must run after the deleting
    /// transaction committed, otherwise a rollback would resurrect records
    /// pointing at nothing.
    pub async fn release_blob(&self, key: &str) -> Result<bool, DatabaseError> {
        if self.file_ref_count(key).await? > 0 {
            return Ok(false);
        }
        Ok(self.files().remove(key).await?)
    }

    /// Release every key in `keys`, returning how many blobs were removed.
    pub async fn release_blobs(&self, keys: &[String]) -> Result<usize, DatabaseError> {
        let mut removed = 0;
        for key in keys {
            if self.release_blob(key).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Delete a single file record and release its blob. Inside a
    /// transaction the blob is released by [`VaultService::commit`].
    pub async fn delete_file(&self, id: &str) -> Result<(), DatabaseError> {
        let file = self.get_file(id).await?;
        self.db()
            .execute("DELETE FROM uploaded_files WHERE id = ?1", [id])
            .await?;
        self.release_blob_after_commit(&file.file).await
    }

    /// Delete all records of `owner` and return the blob keys they used.
    ///
    /// Blobs are not released here; the caller releases them once its
    /// transaction committed.
    pub(crate) async fn delete_files_of(
        &self,
        owner: &LinkedObject,
    ) -> Result<Vec<String>, DatabaseError> {
        let keys: Vec<String> = self
            .list_files(owner)
            .await?
            .into_iter()
            .map(|f| f.file)
            .collect();
        self.db()
            .execute(
                "DELETE FROM uploaded_files WHERE linked_kind = ?1 AND linked_id = ?2",
                libsql::params![owner.kind().as_str(), owner.id()],
            )
            .await?;
        Ok(keys)
    }

    /// Point one record at new content, leaving other records that shared the
    /// old blob untouched.
    pub async fn replace_file_content(
        &self,
        id: &str,
        content: &[u8],
    ) -> Result<UploadedFile, DatabaseError> {
        let file = self.get_file(id).await?;
        let stored = self.files().store(&file.name, content).await?;
        if stored.key == file.file {
            return Ok(file);
        }

        self.db()
            .execute(
                "UPDATE uploaded_files SET file = ?1 WHERE id = ?2",
                [stored.key.as_str(), id],
            )
            .await?;
        self.release_blob_after_commit(&file.file).await?;
        self.get_file(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{create_project, create_project_type, test_service};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn upload_sanitizes_and_numbers_names() {
        let svc = test_service().await;
        let pt = create_project_type(&svc).await;
        let owner = LinkedObject::ProjectType(pt.id.clone());

        let a = svc.upload_file(&owner, "../lo_go.png", b"one").await.unwrap();
        let b = svc.upload_file(&owner, "lo_go.png", b"two").await.unwrap();
        let c = svc.upload_file(&owner, "lo-go.png", b"three").await.unwrap();

        assert_eq!(a.name, "lo-go.png");
        assert_eq!(b.name, "lo-go-1.png");
        assert_eq!(c.name, "lo-go-2.png");
        assert_eq!(a.name_hash, name_hash("lo-go.png"));
        assert_eq!(svc.read_file(&b).await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn delete_file_referenced_only_once() {
        let svc = test_service().await;
        let pt = create_project_type(&svc).await;
        let project = create_project(&svc, &pt, &[]).await;

        let image = svc.list_images(&project.id).await.unwrap().remove(0);
        svc.delete_file(&image.id).await.unwrap();
        assert!(!svc.files().exists(&image.file).await.unwrap());

        let asset = svc.list_assets(&pt.id).await.unwrap().remove(0);
        svc.delete_file(&asset.id).await.unwrap();
        assert!(!svc.files().exists(&asset.file).await.unwrap());
    }

    #[tokio::test]
    async fn delete_file_referenced_multiple_times() {
        let svc = test_service().await;
        let pt = create_project_type(&svc).await;
        let project = create_project(&svc, &pt, &[]).await;
        let owner = LinkedObject::Project(project.id.clone());

        let image = svc.list_images(&project.id).await.unwrap().remove(0);
        let twin = svc.link_file(&owner, "new.png", &image.file).await.unwrap();
        assert_eq!(svc.file_ref_count(&image.file).await.unwrap(), 2);

        svc.delete_file(&image.id).await.unwrap();
        assert!(svc.files().exists(&image.file).await.unwrap());
        assert_eq!(svc.read_file(&twin).await.unwrap(), b"image1");

        svc.delete_file(&twin.id).await.unwrap();
        assert!(!svc.files().exists(&image.file).await.unwrap());
    }

    #[tokio::test]
    async fn replace_content_is_copy_on_write() {
        let svc = test_service().await;
        let pt = create_project_type(&svc).await;
        let owner = LinkedObject::ProjectType(pt.id.clone());

        let original = svc.upload_file(&owner, "shared.png", b"v1").await.unwrap();
        let sibling = svc.link_file(&owner, "copy.png", &original.file).await.unwrap();

        let replaced = svc.replace_file_content(&original.id, b"v2").await.unwrap();
        assert_ne!(replaced.file, original.file);
        assert_eq!(svc.read_file(&replaced).await.unwrap(), b"v2");
        assert_eq!(svc.read_file(&sibling).await.unwrap(), b"v1");

        let lone = svc.upload_file(&owner, "lone.png", b"lone").await.unwrap();
        svc.replace_file_content(&lone.id, b"lone v2").await.unwrap();
        assert!(!svc.files().exists(&lone.file).await.unwrap());
    }

    #[tokio::test]
    async fn delete_inside_transaction_releases_blob_on_commit() {
        let svc = test_service().await;
        let pt = create_project_type(&svc).await;
        let project = create_project(&svc, &pt, &[]).await;
        let image = svc.list_images(&project.id).await.unwrap().remove(0);

        svc.db().begin().await.unwrap();
        svc.delete_file(&image.id).await.unwrap();
        assert!(svc.files().exists(&image.file).await.unwrap());
        svc.commit().await.unwrap();

        assert_eq!(svc.file_ref_count(&image.file).await.unwrap(), 0);
        assert!(!svc.files().exists(&image.file).await.unwrap());
    }

    #[tokio::test]
    async fn replace_inside_transaction_releases_old_blob_on_commit() {
        let svc = test_service().await;
        let pt = create_project_type(&svc).await;
        let owner = LinkedObject::ProjectType(pt.id.clone());
        let lone = svc.upload_file(&owner, "lone.png", b"lone").await.unwrap();

        svc.db().begin().await.unwrap();
        let result = svc.replace_file_content(&lone.id, b"lone v2").await;
        svc.finish_transaction(result).await.unwrap();

        assert!(!svc.files().exists(&lone.file).await.unwrap());
    }

    #[tokio::test]
    async fn rolled_back_delete_keeps_blob() {
        let svc = test_service().await;
        let pt = create_project_type(&svc).await;
        let asset = svc.list_assets(&pt.id).await.unwrap().remove(0);

        svc.db().begin().await.unwrap();
        svc.delete_file(&asset.id).await.unwrap();
        svc.rollback().await.unwrap();

        assert_eq!(svc.file_ref_count(&asset.file).await.unwrap(), 1);
        assert!(svc.files().exists(&asset.file).await.unwrap());

        // A later commit must not release a key queued by the rolled-back work.
        svc.db().begin().await.unwrap();
        svc.commit().await.unwrap();
        assert!(svc.files().exists(&asset.file).await.unwrap());
    }

    #[tokio::test]
    async fn missing_blob_is_a_storage_error() {
        let svc = test_service().await;
        let pt = create_project_type(&svc).await;
        let asset = svc.list_assets(&pt.id).await.unwrap().remove(0);
        svc.files().remove(&asset.file).await.unwrap();

        assert!(matches!(
            svc.read_file(&asset).await,
            Err(DatabaseError::Files(rv_files::StoreError::MissingBlob { .. }))
        ));
    }
}
