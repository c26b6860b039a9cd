//! Hosted implementation of [`UserRepository`].

use relif_core::error::RelifResult;
use relif_core::models::user::{PlatformRole, UpdateUser, User, UserSearch, UserStatus};
use relif_core::repository::{PaginatedResult, Pagination, UserRepository};
use serde_json::{Value, json};
use tracing::{debug, info};
use uuid::Uuid;

use super::{changes, page, search};
use crate::backend::Backend;
use crate::error::DbError;
use crate::legacy::{LegacyApi, LegacyRequest};
use crate::query::{Embed, QueryBuilder};
use crate::transform;

const TABLE: &str = "users";

fn organization_embed() -> Embed {
    Embed::new("organization", "organizations", "organization_id", &[])
}

super::hosted_repository! {
    /// Users of every organization plus the platform staff.
    SupabaseUserRepository
}

impl<B: Backend, L: LegacyApi> SupabaseUserRepository<B, L> {
    fn users(&self) -> QueryBuilder<'_, B> {
        self.client.from(TABLE).embed(organization_embed())
    }

    /// Applies `patch` to one user and returns the updated row.
    async fn patch(&self, id: Uuid, patch: Value) -> Result<User, DbError> {
        let row = self
            .client
            .from(TABLE)
            .update(patch)
            .eq("id", id)
            .embed(organization_embed())
            .single()
            .await?;
        Ok(transform::user(&row))
    }
}

impl<B: Backend, L: LegacyApi> UserRepository for SupabaseUserRepository<B, L> {
    async fn list_by_organization(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
    ) -> RelifResult<PaginatedResult<User>> {
        debug!(%organization_id, offset = pagination.offset, "Listing organization users");
        let legacy = LegacyRequest::get(format!("organizations/{organization_id}/users"))
            .page(pagination);
        let hosted = async {
            let output = self
                .users()
                .eq("organization_id", organization_id)
                .order("created_at", false)
                .page(pagination)
                .execute()
                .await?;
            Ok::<_, DbError>(page(output, transform::user))
        };
        Ok(self.fallback.run("users.list_by_organization", hosted, legacy).await?)
    }

    async fn list_platform_staff(&self, pagination: Pagination) -> RelifResult<PaginatedResult<User>> {
        let legacy = LegacyRequest::get(TABLE)
            .query("platform_role", PlatformRole::RelifMember)
            .page(pagination);
        let hosted = async {
            let output = self
                .users()
                .eq("platform_role", PlatformRole::RelifMember)
                .order("created_at", false)
                .page(pagination)
                .execute()
                .await?;
            Ok::<_, DbError>(page(output, transform::user))
        };
        Ok(self.fallback.run("users.list_platform_staff", hosted, legacy).await?)
    }

    async fn get_by_id(&self, id: Uuid) -> RelifResult<User> {
        let legacy = LegacyRequest::get(format!("{TABLE}/{id}"));
        let hosted = async {
            let row = self.users().eq("id", id).single().await?;
            Ok::<_, DbError>(transform::user(&row))
        };
        Ok(self.fallback.run("users.get", hosted, legacy).await?)
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> RelifResult<User> {
        let legacy = LegacyRequest::put(format!("{TABLE}/{id}")).json(&input);
        let hosted = async {
            let user = self.patch(id, changes(&input)?).await?;
            info!(user_id = %id, "User updated");
            Ok::<_, DbError>(user)
        };
        Ok(self.fallback.run("users.update", hosted, legacy).await?)
    }

    async fn reactivate(&self, id: Uuid) -> RelifResult<User> {
        let legacy = LegacyRequest::put(format!("{TABLE}/{id}/reactivate"));
        let hosted = async {
            let user = self.patch(id, json!({ "status": UserStatus::Active })).await?;
            info!(user_id = %id, "User reactivated");
            Ok::<_, DbError>(user)
        };
        Ok(self.fallback.run("users.reactivate", hosted, legacy).await?)
    }

    async fn delete(&self, id: Uuid) -> RelifResult<()> {
        let legacy = LegacyRequest::delete(format!("{TABLE}/{id}"));
        let hosted = async {
            self.client.from(TABLE).delete().eq("id", id).execute().await?;
            info!(user_id = %id, "User deleted");
            Ok::<_, DbError>(())
        };
        Ok(self.fallback.run_void("users.delete", hosted, legacy).await?)
    }

    async fn update_status(&self, id: Uuid, status: UserStatus) -> RelifResult<User> {
        let legacy = LegacyRequest::put(format!("{TABLE}/{id}/status"))
            .json(&json!({ "status": status }));
        let hosted = async {
            let user = self.patch(id, json!({ "status": status })).await?;
            info!(user_id = %id, %status, "User status updated");
            Ok::<_, DbError>(user)
        };
        Ok(self.fallback.run("users.update_status", hosted, legacy).await?)
    }

    async fn update_platform_role(&self, id: Uuid, role: PlatformRole) -> RelifResult<User> {
        let legacy = LegacyRequest::put(format!("{TABLE}/{id}/platform-role"))
            .json(&json!({ "platform_role": role }));
        let hosted = async {
            let user = self.patch(id, json!({ "platform_role": role })).await?;
            info!(user_id = %id, platform_role = %role, "User platform role updated");
            Ok::<_, DbError>(user)
        };
        Ok(self.fallback.run("users.update_platform_role", hosted, legacy).await?)
    }

    async fn search(
        &self,
        filter: UserSearch,
        pagination: Pagination,
    ) -> RelifResult<PaginatedResult<User>> {
        debug!(term = %filter.term, "Searching users");
        let mut legacy = LegacyRequest::get(format!("{TABLE}/search"))
            .query("search", &filter.term)
            .page(pagination);
        if let Some(organization_id) = filter.organization_id {
            legacy = legacy.query("organization_id", organization_id);
        }
        if let Some(role) = filter.platform_role {
            legacy = legacy.query("platform_role", role);
        }
        let hosted = async {
            let mut query = self
                .users()
                .or(search(&["first_name", "last_name", "email"], &filter.term));
            if let Some(organization_id) = filter.organization_id {
                query = query.eq("organization_id", organization_id);
            }
            if let Some(role) = filter.platform_role {
                query = query.eq("platform_role", role);
            }
            let output = query
                .order("created_at", false)
                .page(pagination)
                .execute()
                .await?;
            Ok::<_, DbError>(page(output, transform::user))
        };
        Ok(self.fallback.run("users.search", hosted, legacy).await?)
    }
}
