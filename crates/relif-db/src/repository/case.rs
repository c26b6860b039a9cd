//! Hosted implementation of [`CaseRepository`]: cases, their notes and the
//! documents kept in the documents bucket.

use chrono::{DateTime, Utc};
use relif_core::error::RelifResult;
use relif_core::models::case::{
    Case, CaseDocument, CaseNote, CaseStats, CaseStatus, CreateCase, CreateCaseDocument,
    CreateCaseNote, DownloadLink, UpdateCase, UpdateCaseDocument, UpdateCaseNote, UploadLink,
};
use relif_core::repository::{CaseRepository, PaginatedResult, Pagination};
use reqwest::Url;
use serde_json::{Value, json};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{changes, first_row, page, search};
use crate::backend::Backend;
use crate::client::SupabaseClient;
use crate::error::DbError;
use crate::fallback::after_commit;
use crate::legacy::{LegacyApi, LegacyRequest};
use crate::query::{Embed, QueryBuilder};
use crate::{stats, transform};

const TABLE: &str = "cases";
const NOTES: &str = "case_notes";
const DOCUMENTS: &str = "case_documents";

/// Lifetime of a document download link, in seconds.
const DOWNLOAD_TTL: u64 = 3600;

/// Object key of a storage URL: its path without the leading slash.
pub fn extract_file_key(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().trim_start_matches('/').to_string(),
        Err(_) => url.trim_start_matches('/').to_string(),
    }
}

/// `CASE-YYYYMMDD-NNNNNN`, the suffix being the last six digits of the
/// epoch milliseconds.
fn case_number(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().unsigned_abs() % 1_000_000;
    format!("CASE-{}-{millis:06}", now.format("%Y%m%d"))
}

/// Budget text as a number; blank or unparsable input is stored as null.
fn budget(raw: Option<&str>) -> Value {
    raw.map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .map_or(Value::Null, |amount| json!(amount))
}

/// Storage key of a document row inside `bucket`.
fn document_key(row: &Value, bucket: &str) -> Option<String> {
    if let Some(key) = row.get("file_key").and_then(Value::as_str) {
        return Some(key.to_string());
    }
    let url = row.get("file_url").and_then(Value::as_str)?;
    let path = extract_file_key(url);
    let marker = format!("{bucket}/");
    Some(match path.find(&marker) {
        Some(at) => path[at + marker.len()..].to_string(),
        None => path,
    })
}

fn author_embed(foreign_key: &str) -> Embed {
    Embed::new("users", "users", foreign_key, &["id", "first_name", "last_name"])
}

fn case_query<B: Backend>(client: &SupabaseClient<B>) -> QueryBuilder<'_, B> {
    client
        .from(TABLE)
        .embed(Embed::new(
            "beneficiaries",
            "beneficiaries",
            "beneficiary_id",
            &["id", "full_name", "email", "phones", "image_url", "address"],
        ))
        .embed(Embed::new(
            "assigned_to",
            "users",
            "assigned_to_id",
            &["id", "first_name", "last_name", "email"],
        ))
}

super::hosted_repository! {
    /// Cases with their notes and documents.
    SupabaseCaseRepository
}

impl<B: Backend, L: LegacyApi> SupabaseCaseRepository<B, L> {
    /// Bumps `last_activity` and recounts the case's notes and documents.
    /// Runs after the triggering write committed, so failures only warn.
    async fn touch(&self, case_id: Uuid) {
        after_commit("cases.touch", self.recount(case_id).await);
    }

    async fn recount(&self, case_id: Uuid) -> Result<(), DbError> {
        let count = |table: &'static str| async move {
            let output = self
                .client
                .from(table)
                .select("id")
                .eq("case_id", case_id)
                .count()
                .execute()
                .await?;
            Ok::<_, DbError>(output.count.unwrap_or(output.rows.len() as u64))
        };
        let notes = count(NOTES).await?;
        let documents = count(DOCUMENTS).await?;
        self.client
            .from(TABLE)
            .update(json!({
                "last_activity": Utc::now(),
                "notes_count": notes,
                "documents_count": documents,
            }))
            .eq("id", case_id)
            .execute()
            .await?;
        Ok(())
    }

    async fn insert_note(&self, case_id: Uuid, input: &CreateCaseNote) -> Result<CaseNote, DbError> {
        let author_id = self.client.current_user_id()?;
        let row = json!({
            "case_id": case_id,
            "author_id": author_id,
            "title": input.title.as_deref().unwrap_or("Note"),
            "content": input.content,
            "tags": input.tags,
            "note_type": input.note_type,
            "is_important": input.is_important,
            "is_private": false,
        });
        let output = self
            .client
            .from(NOTES)
            .insert(row)
            .embed(author_embed("author_id"))
            .execute()
            .await?;
        let note = transform::case_note(&first_row(output, NOTES, case_id)?);
        self.touch(case_id).await;
        info!(%case_id, note_id = %note.id, "Case note created");
        Ok(note)
    }

    async fn document_row(&self, case_id: Uuid, document_id: Uuid) -> Result<Value, DbError> {
        self.client
            .from(DOCUMENTS)
            .eq("case_id", case_id)
            .eq("id", document_id)
            .single()
            .await
    }
}

impl<B: Backend, L: LegacyApi> CaseRepository for SupabaseCaseRepository<B, L> {
    async fn list_by_organization(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
        term: &str,
    ) -> RelifResult<PaginatedResult<Case>> {
        debug!(%organization_id, offset = pagination.offset, search = term, "Listing cases");
        let legacy = LegacyRequest::get(format!("organizations/{organization_id}/{TABLE}"))
            .page(pagination)
            .query("search", term);
        let hosted = async {
            let output = case_query(&self.client)
                .eq("organization_id", organization_id)
                .or(search(&["title", "description"], term))
                .order("created_at", false)
                .page(pagination)
                .execute()
                .await?;
            Ok::<_, DbError>(page(output, transform::case))
        };
        Ok(self.fallback.run("cases.list", hosted, legacy).await?)
    }

    async fn get_by_id(&self, id: Uuid) -> RelifResult<Case> {
        let legacy = LegacyRequest::get(format!("{TABLE}/{id}"));
        let hosted = async {
            let row = case_query(&self.client).eq("id", id).single().await?;
            Ok::<_, DbError>(transform::case(&row))
        };
        Ok(self.fallback.run("cases.get", hosted, legacy).await?)
    }

    async fn create(&self, input: CreateCase) -> RelifResult<Case> {
        let legacy = LegacyRequest::post(TABLE).json(&input);
        let hosted = async {
            let organization_id = self.client.current_organization_id().await?;
            let now = Utc::now();
            let row = json!({
                "organization_id": organization_id,
                "case_number": case_number(now),
                "title": input.title,
                "description": input.description,
                "status": CaseStatus::Pending,
                "priority": input.priority,
                "urgency_level": input.urgency_level,
                "service_types": input.service_types,
                "beneficiary_id": input.beneficiary_id,
                "assigned_to_id": input.assigned_to_id,
                "due_date": input.due_date,
                "estimated_duration": input.estimated_duration,
                "budget_allocated": budget(input.budget_allocated.as_deref()),
                "tags": input.tags,
                "notes_count": 0,
                "documents_count": 0,
                "last_activity": now,
            });
            let output = case_query(&self.client).insert(row).execute().await?;
            let mut created = transform::case(&first_row(output, TABLE, &input.title)?);
            info!(
                case_id = %created.id,
                case_number = %created.case_number,
                %organization_id,
                "Case created"
            );
            if let Some(note) = &input.initial_note {
                let inserted = self.insert_note(created.id, note).await;
                if after_commit("cases.create.initial_note", inserted).is_some() {
                    created.notes_count += 1;
                }
            }
            Ok::<_, DbError>(created)
        };
        Ok(self.fallback.run("cases.create", hosted, legacy).await?)
    }

    async fn update(&self, id: Uuid, input: UpdateCase) -> RelifResult<Case> {
        let legacy = LegacyRequest::put(format!("{TABLE}/{id}")).json(&input);
        let hosted = async {
            let mut patch = changes(&input)?;
            if let Some(object) = patch.as_object_mut() {
                if input.budget_allocated.is_some() {
                    object.insert(
                        "budget_allocated".into(),
                        budget(input.budget_allocated.as_deref()),
                    );
                }
                object.insert("last_activity".into(), json!(Utc::now()));
            }
            let row = case_query(&self.client)
                .update(patch)
                .eq("id", id)
                .single()
                .await?;
            info!(case_id = %id, "Case updated");
            Ok::<_, DbError>(transform::case(&row))
        };
        Ok(self.fallback.run("cases.update", hosted, legacy).await?)
    }

    async fn delete(&self, id: Uuid) -> RelifResult<()> {
        let legacy = LegacyRequest::delete(format!("{TABLE}/{id}"));
        let hosted = async {
            self.client.from(TABLE).delete().eq("id", id).execute().await?;
            info!(case_id = %id, "Case deleted");
            Ok::<_, DbError>(())
        };
        Ok(self.fallback.run_void("cases.delete", hosted, legacy).await?)
    }

    async fn stats(&self, organization_id: Uuid) -> RelifResult<CaseStats> {
        let legacy = LegacyRequest::get(format!("organizations/{organization_id}/{TABLE}/stats"));
        let hosted = async {
            let rows = stats::organization_rows(
                &self.client,
                TABLE,
                "id,status,due_date,updated_at",
                organization_id,
            )
            .await?;
            Ok::<_, DbError>(stats::case_stats(&rows, Utc::now()))
        };
        Ok(self.fallback.run("cases.stats", hosted, legacy).await?)
    }

    async fn list_notes(&self, case_id: Uuid) -> RelifResult<Vec<CaseNote>> {
        let legacy = LegacyRequest::get(format!("{TABLE}/{case_id}/notes"));
        let hosted = async {
            let output = self
                .client
                .from(NOTES)
                .embed(author_embed("author_id"))
                .eq("case_id", case_id)
                .order("created_at", false)
                .execute()
                .await?;
            Ok::<_, DbError>(output.rows.iter().map(transform::case_note).collect())
        };
        Ok(self.fallback.run("cases.notes", hosted, legacy).await?)
    }

    async fn create_note(&self, case_id: Uuid, input: CreateCaseNote) -> RelifResult<CaseNote> {
        let legacy = LegacyRequest::post(format!("{TABLE}/{case_id}/notes")).json(&input);
        let hosted = self.insert_note(case_id, &input);
        Ok(self.fallback.run("cases.create_note", hosted, legacy).await?)
    }

    async fn update_note(
        &self,
        case_id: Uuid,
        note_id: Uuid,
        input: UpdateCaseNote,
    ) -> RelifResult<CaseNote> {
        let legacy =
            LegacyRequest::put(format!("{TABLE}/{case_id}/notes/{note_id}")).json(&input);
        let hosted = async {
            let row = self
                .client
                .from(NOTES)
                .update(changes(&input)?)
                .eq("case_id", case_id)
                .eq("id", note_id)
                .embed(author_embed("author_id"))
                .single()
                .await?;
            self.touch(case_id).await;
            info!(%case_id, %note_id, "Case note updated");
            Ok::<_, DbError>(transform::case_note(&row))
        };
        Ok(self.fallback.run("cases.update_note", hosted, legacy).await?)
    }

    async fn delete_note(&self, case_id: Uuid, note_id: Uuid) -> RelifResult<()> {
        let legacy = LegacyRequest::delete(format!("{TABLE}/{case_id}/notes/{note_id}"));
        let hosted = async {
            self.client
                .from(NOTES)
                .delete()
                .eq("case_id", case_id)
                .eq("id", note_id)
                .execute()
                .await?;
            self.touch(case_id).await;
            info!(%case_id, %note_id, "Case note deleted");
            Ok::<_, DbError>(())
        };
        Ok(self.fallback.run_void("cases.delete_note", hosted, legacy).await?)
    }

    async fn list_documents(&self, case_id: Uuid) -> RelifResult<Vec<CaseDocument>> {
        let legacy = LegacyRequest::get(format!("{TABLE}/{case_id}/documents"));
        let hosted = async {
            let output = self
                .client
                .from(DOCUMENTS)
                .embed(author_embed("uploaded_by_id"))
                .eq("case_id", case_id)
                .order("created_at", false)
                .execute()
                .await?;
            Ok::<_, DbError>(output.rows.iter().map(transform::case_document).collect())
        };
        Ok(self.fallback.run("cases.documents", hosted, legacy).await?)
    }

    async fn document_upload_link(&self, case_id: Uuid, file_type: &str) -> RelifResult<UploadLink> {
        let legacy = LegacyRequest::post(format!("{TABLE}/{case_id}/documents/upload-link"))
            .json(&json!({ "file_type": file_type }));
        let hosted = async {
            let extension = file_type
                .rsplit('/')
                .next()
                .filter(|ext| !ext.is_empty())
                .unwrap_or("bin");
            let file_key = format!("{TABLE}/{case_id}/{}.{extension}", Uuid::new_v4());
            let link = self
                .client
                .create_signed_upload_url(&self.client.config().documents_bucket, &file_key)
                .await?;
            debug!(%case_id, file_key = %file_key, "Document upload link issued");
            Ok::<_, DbError>(UploadLink { link, file_key })
        };
        Ok(self.fallback.run("cases.document_upload_link", hosted, legacy).await?)
    }

    async fn document_download_link(
        &self,
        case_id: Uuid,
        document_id: Uuid,
    ) -> RelifResult<DownloadLink> {
        let legacy =
            LegacyRequest::get(format!("{TABLE}/{case_id}/documents/{document_id}/download-link"));
        let hosted = async {
            let bucket = &self.client.config().documents_bucket;
            let row = self.document_row(case_id, document_id).await?;
            let key = document_key(&row, bucket)
                .ok_or_else(|| DbError::not_found("case document file", document_id))?;
            let link = self.client.create_signed_url(bucket, &key, DOWNLOAD_TTL).await?;
            Ok::<_, DbError>(DownloadLink { link })
        };
        Ok(self.fallback.run("cases.document_download_link", hosted, legacy).await?)
    }

    async fn create_document(
        &self,
        case_id: Uuid,
        input: CreateCaseDocument,
    ) -> RelifResult<CaseDocument> {
        let legacy = LegacyRequest::post(format!("{TABLE}/{case_id}/documents")).json(&input);
        let hosted = async {
            let uploaded_by_id = self.client.current_user_id()?;
            let bucket = &self.client.config().documents_bucket;
            let row = json!({
                "case_id": case_id,
                "document_name": input.document_name,
                "document_type": input.document_type,
                "description": input.description,
                "tags": input.tags,
                "file_name": input.file_name,
                "file_size": input.file_size,
                "file_type": input.mime_type,
                "file_key": input.file_key,
                "file_url": self.client.get_public_url(bucket, &input.file_key),
                "uploaded_by_id": uploaded_by_id,
            });
            let output = self
                .client
                .from(DOCUMENTS)
                .insert(row)
                .embed(author_embed("uploaded_by_id"))
                .execute()
                .await?;
            let document = transform::case_document(&first_row(output, DOCUMENTS, case_id)?);
            self.touch(case_id).await;
            info!(%case_id, document_id = %document.id, "Case document registered");
            Ok::<_, DbError>(document)
        };
        Ok(self.fallback.run("cases.create_document", hosted, legacy).await?)
    }

    async fn update_document(
        &self,
        case_id: Uuid,
        document_id: Uuid,
        input: UpdateCaseDocument,
    ) -> RelifResult<CaseDocument> {
        let legacy = LegacyRequest::put(format!("{TABLE}/{case_id}/documents/{document_id}"))
            .json(&input);
        let hosted = async {
            let row = self
                .client
                .from(DOCUMENTS)
                .update(changes(&input)?)
                .eq("case_id", case_id)
                .eq("id", document_id)
                .embed(author_embed("uploaded_by_id"))
                .single()
                .await?;
            info!(%case_id, %document_id, "Case document updated");
            Ok::<_, DbError>(transform::case_document(&row))
        };
        Ok(self.fallback.run("cases.update_document", hosted, legacy).await?)
    }

    async fn delete_document(&self, case_id: Uuid, document_id: Uuid) -> RelifResult<()> {
        let legacy = LegacyRequest::delete(format!("{TABLE}/{case_id}/documents/{document_id}"));
        let hosted = async {
            let bucket = &self.client.config().documents_bucket;
            let row = self.document_row(case_id, document_id).await?;
            if let Some(key) = document_key(&row, bucket) {
                if let Err(err) = self.client.remove_files(bucket, vec![key]).await {
                    warn!(%document_id, error = %err, "Document file could not be removed");
                }
            }
            self.client
                .from(DOCUMENTS)
                .delete()
                .eq("id", document_id)
                .execute()
                .await?;
            self.touch(case_id).await;
            info!(%case_id, %document_id, "Case document deleted");
            Ok::<_, DbError>(())
        };
        Ok(self.fallback.run_void("cases.delete_document", hosted, legacy).await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn file_key_is_the_url_path() {
        assert_eq!(
            extract_file_key("https://bucket.s3.amazonaws.com/cases/1/a.pdf"),
            "cases/1/a.pdf"
        );
        assert_eq!(extract_file_key("/cases/1/a.pdf"), "cases/1/a.pdf");
    }

    #[test]
    fn document_key_prefers_stored_key() {
        let row = json!({"file_key": "cases/1/a.pdf", "file_url": "https://x/y/z"});
        assert_eq!(document_key(&row, "docs").as_deref(), Some("cases/1/a.pdf"));

        let row = json!({
            "file_url": "https://h/storage/v1/object/public/docs/cases/1/a.pdf"
        });
        assert_eq!(document_key(&row, "docs").as_deref(), Some("cases/1/a.pdf"));
        assert_eq!(document_key(&json!({}), "docs"), None);
    }

    #[test]
    fn case_number_uses_date_and_millis() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).single().unwrap();
        let number = case_number(at);
        let expected_suffix = at.timestamp_millis() % 1_000_000;
        assert_eq!(number, format!("CASE-20240307-{expected_suffix:06}"));
    }

    #[test]
    fn budget_is_numeric_or_null() {
        assert_eq!(budget(Some(" 1500.50 ")), json!(1500.5));
        assert_eq!(budget(Some("")), Value::Null);
        assert_eq!(budget(Some("abc")), Value::Null);
        assert_eq!(budget(None), Value::Null);
    }
}
