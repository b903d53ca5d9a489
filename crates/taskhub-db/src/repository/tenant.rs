//! SurrealDB implementation of [`TenantRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use taskhub_core::error::{TaskhubError, TaskhubResult};
use taskhub_core::models::tenant::{CreateTenant, Tenant, slugify};
use taskhub_core::repository::TenantRepository;
use uuid::Uuid;

use super::{deleted_filter, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct TenantRow {
    name: String,
    slug: String,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TenantRow {
    fn into_tenant(self, id: Uuid) -> Tenant {
        Tenant {
            id,
            name: self.name,
            slug: self.slug,
            is_deleted: self.is_deleted,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
        }
    }
}

/// Row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TenantRowWithId {
    record_id: String,
    name: String,
    slug: String,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TenantRowWithId {
    fn try_into_tenant(self) -> Result<Tenant, DbError> {
        Ok(Tenant {
            id: parse_uuid(&self.record_id, "tenant")?,
            name: self.name,
            slug: self.slug,
            is_deleted: self.is_deleted,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Tenant repository.
#[derive(Clone)]
pub struct SurrealTenantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TenantRepository for SurrealTenantRepository<C> {
    async fn create(&self, input: CreateTenant) -> TaskhubResult<Tenant> {
        let slug = input.slug.unwrap_or_else(|| slugify(&input.name));
        if slug.is_empty() || slug != slugify(&slug) {
            return Err(TaskhubError::validation(format!(
                "slug must be lowercase and URL-safe: {slug:?}"
            )));
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('tenant', $id) SET \
                 name = $name, slug = $slug, is_deleted = false",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("slug", slug))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("tenant", e))?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.into_tenant(id))
    }

    async fn get_by_id(&self, id: Uuid, include_deleted: bool) -> TaskhubResult<Tenant> {
        let id_str = id.to_string();
        let query = format!(
            "SELECT * FROM type::record('tenant', $id) WHERE true{}",
            deleted_filter(include_deleted)
        );

        let mut result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.into_tenant(id))
    }

    async fn get_by_slug(&self, slug: &str, include_deleted: bool) -> TaskhubResult<Tenant> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM tenant \
             WHERE slug = $slug{}",
            deleted_filter(include_deleted)
        );

        let mut result = self
            .db
            .query(query)
            .bind(("slug", slug.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: format!("slug={slug}"),
        })?;

        Ok(row.try_into_tenant()?)
    }

    async fn delete(&self, id: Uuid) -> TaskhubResult<()> {
        self.db
            .query(
                "UPDATE type::record('tenant', $id) SET \
                 is_deleted = true, deleted_at = time::now() \
                 WHERE is_deleted = false",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
