//! SurrealDB implementation of [`MemberRepository`].
//!
//! Password hashing uses Argon2id with OWASP-recommended parameters
//! (memory: 19 MiB, iterations: 2, parallelism: 1) and a random salt
//! per hash. An optional pepper can be supplied at construction time.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use taskhub_core::error::{TaskhubError, TaskhubResult};
use taskhub_core::models::member::{CreateMember, Member, MemberRole};
use taskhub_core::repository::MemberRepository;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{CountRow, deleted_filter, parse_enum, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct MemberRow {
    tenant_id: String,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MemberRow {
    fn into_member(self, id: Uuid) -> Result<Member, DbError> {
        Ok(Member {
            id,
            tenant_id: parse_uuid(&self.tenant_id, "tenant")?,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role: parse_enum(&self.role)?,
            is_deleted: self.is_deleted,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct SeatRow {
    member_id: String,
}

#[derive(Debug, SurrealValue)]
struct MemberRowWithId {
    record_id: String,
    tenant_id: String,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MemberRowWithId {
    fn try_into_member(self) -> Result<Member, DbError> {
        let id = parse_uuid(&self.record_id, "member")?;
        MemberRow {
            tenant_id: self.tenant_id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            is_deleted: self.is_deleted,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_member(id)
    }
}

fn peppered<'a>(password: &'a str, pepper: Option<&str>, buf: &'a mut String) -> &'a [u8] {
    match pepper {
        Some(p) => {
            *buf = format!("{p}{password}");
            buf.as_bytes()
        }
        None => password.as_bytes(),
    }
}

/// Hash a password with Argon2id (m=19456, t=2, p=1).
///
/// If a pepper is provided it is prepended to the password first.
pub fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, DbError> {
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Hash(format!("argon2 params: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut buf = String::new();
    let input = peppered(password, pepper, &mut buf);

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input, &salt)
        .map_err(|e| DbError::Hash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verify a password against an Argon2id PHC hash.
pub fn verify_password(password: &str, hash: &str, pepper: Option<&str>) -> Result<bool, DbError> {
    use argon2::PasswordVerifier;

    let mut buf = String::new();
    let input = peppered(password, pepper, &mut buf);

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| DbError::Hash(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(DbError::Hash(format!("verify error: {e}"))),
    }
}

/// SurrealDB implementation of the Member repository.
#[derive(Clone)]
pub struct SurrealMemberRepository<C: Connection> {
    db: Surreal<C>,
    pepper: Option<String>,
}

impl<C: Connection> SurrealMemberRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }

    async fn count_in_tenant(&self, tenant_id: Uuid) -> Result<u64, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM member \
                 WHERE tenant_id = $tenant_id GROUP ALL",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    /// Try to become the tenant's first member. The seat record is keyed
    /// by tenant id, so of several concurrent signups exactly one create
    /// succeeds.
    async fn claim_admin_seat(&self, tenant_id: Uuid, member_id: Uuid) -> Result<bool, DbError> {
        let claimed = self
            .db
            .query("CREATE type::record('admin_seat', $tenant_id) SET member_id = $member_id")
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("member_id", member_id.to_string()))
            .await?
            .check();
        let err = match claimed {
            Ok(_) => return Ok(true),
            Err(e) => e,
        };

        // A duplicate id and a commit conflict both mean someone else
        // holds the seat; anything else surfaces.
        let mut result = self
            .db
            .query("SELECT member_id FROM type::record('admin_seat', $tenant_id)")
            .bind(("tenant_id", tenant_id.to_string()))
            .await?;
        let seats: Vec<SeatRow> = result.take(0)?;
        match seats.first() {
            Some(seat) => {
                debug!(%tenant_id, holder = %seat.member_id, "Admin seat already taken");
                Ok(false)
            }
            None => Err(DbError::Query(err.to_string())),
        }
    }

    /// Give the seat back after the member create that claimed it failed.
    async fn release_admin_seat(&self, tenant_id: Uuid, member_id: Uuid) {
        let released = self
            .db
            .query("DELETE type::record('admin_seat', $tenant_id) WHERE member_id = $member_id")
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("member_id", member_id.to_string()))
            .await
            .and_then(|result| result.check());
        if let Err(e) = released {
            warn!(%tenant_id, error = %e, "Failed to release admin seat");
        }
    }
}

impl<C: Connection> MemberRepository for SurrealMemberRepository<C> {
    async fn create(&self, input: CreateMember) -> TaskhubResult<Member> {
        if input.name.trim().is_empty() {
            return Err(TaskhubError::validation("member name must not be empty"));
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let password_hash = hash_password(&input.password, self.pepper.as_deref())?;

        let existing = self.count_in_tenant(input.tenant_id).await?;
        let seated = existing == 0 && self.claim_admin_seat(input.tenant_id, id).await?;
        let role = if seated {
            MemberRole::Admin
        } else {
            MemberRole::for_signup(existing.max(1), input.role)?
        };

        let created = self
            .db
            .query(
                "CREATE type::record('member', $id) SET \
                 tenant_id = $tenant_id, \
                 name = $name, email = $email, \
                 password_hash = $password_hash, \
                 role = $role, is_deleted = false",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("name", input.name))
            .bind(("email", input.email.to_lowercase()))
            .bind(("password_hash", password_hash))
            .bind(("role", role.as_str().to_string()))
            .await
            .map_err(DbError::from)
            .and_then(|result| {
                result
                    .check()
                    .map_err(|e| DbError::from_check("member", e))
            });

        let mut result = match created {
            Ok(result) => result,
            Err(e) => {
                if seated {
                    self.release_admin_seat(input.tenant_id, id).await;
                }
                return Err(e.into());
            }
        };

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "member".into(),
            id: id_str,
        })?;

        Ok(row.into_member(id)?)
    }

    async fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        include_deleted: bool,
    ) -> TaskhubResult<Member> {
        let id_str = id.to_string();
        let query = format!(
            "SELECT * FROM type::record('member', $id) \
             WHERE tenant_id = $tenant_id{}",
            deleted_filter(include_deleted)
        );

        let mut result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "member".into(),
            id: id_str,
        })?;

        Ok(row.into_member(id)?)
    }

    async fn get_by_email(&self, email: &str, include_deleted: bool) -> TaskhubResult<Member> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM member \
             WHERE email = $email{}",
            deleted_filter(include_deleted)
        );

        let mut result = self
            .db
            .query(query)
            .bind(("email", email.to_lowercase()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "member".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_member()?)
    }

    async fn list_by_tenant(
        &self,
        tenant_id: Uuid,
        include_deleted: bool,
    ) -> TaskhubResult<Vec<Member>> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM member \
             WHERE tenant_id = $tenant_id{} \
             ORDER BY created_at ASC",
            deleted_filter(include_deleted)
        );

        let mut result = self
            .db
            .query(query)
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberRowWithId> = result.take(0).map_err(DbError::from)?;
        let members = rows
            .into_iter()
            .map(MemberRowWithId::try_into_member)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(members)
    }

    async fn update_role(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        role: MemberRole,
    ) -> TaskhubResult<Member> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('member', $id) SET \
                 role = $role, updated_at = time::now() \
                 WHERE tenant_id = $tenant_id AND is_deleted = false",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("role", role.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "member".into(),
            id: id_str,
        })?;

        Ok(row.into_member(id)?)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> TaskhubResult<()> {
        self.db
            .query(
                "UPDATE type::record('member', $id) SET \
                 is_deleted = true, deleted_at = time::now(), \
                 updated_at = time::now() \
                 WHERE tenant_id = $tenant_id AND is_deleted = false",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
