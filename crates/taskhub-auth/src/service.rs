//! Authentication service: signup and login orchestration.

use taskhub_core::error::{TaskhubError, TaskhubResult};
use taskhub_core::models::member::{CreateMember, Member, MemberRole};
use taskhub_core::models::tenant::{CreateTenant, Tenant, slugify};
use taskhub_core::repository::{MemberRepository, TenantRepository};
use tracing::info;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Input for the signup flow.
#[derive(Debug)]
pub struct SignupInput {
    /// Company display name; an existing tenant with the same slug is
    /// joined, otherwise a new one is created.
    pub company_name: String,
    pub name: String,
    pub email: String,
    pub password: String,
    /// Ignored for the first member of a tenant, who is always ADMIN.
    pub role: MemberRole,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed JWT access token.
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    pub member: Member,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
pub struct AuthService<T: TenantRepository, M: MemberRepository> {
    tenant_repo: T,
    member_repo: M,
    config: AuthConfig,
}

impl<T: TenantRepository, M: MemberRepository> AuthService<T, M> {
    pub fn new(tenant_repo: T, member_repo: M, config: AuthConfig) -> Self {
        Self {
            tenant_repo,
            member_repo,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Register a member, creating the tenant on first use of its name.
    pub async fn signup(&self, input: SignupInput) -> TaskhubResult<Member> {
        password::check_policy(&input.password, self.config.min_password_length)?;

        let tenant = self.find_or_create_tenant(&input.company_name).await?;
        let member = self
            .member_repo
            .create(CreateMember {
                tenant_id: tenant.id,
                name: input.name,
                email: input.email,
                password: input.password,
                role: input.role,
            })
            .await?;

        info!(
            member_id = %member.id,
            tenant_id = %tenant.id,
            role = %member.role,
            "member signed up"
        );
        Ok(member)
    }

    async fn find_or_create_tenant(&self, company_name: &str) -> TaskhubResult<Tenant> {
        let slug = slugify(company_name);
        if slug.is_empty() {
            return Err(TaskhubError::validation(
                "company name must contain letters or digits",
            ));
        }

        match self.tenant_repo.get_by_slug(&slug, false).await {
            Ok(tenant) => return Ok(tenant),
            Err(TaskhubError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let created = self
            .tenant_repo
            .create(CreateTenant {
                name: company_name.trim().to_string(),
                slug: Some(slug.clone()),
            })
            .await;

        match created {
            Ok(tenant) => {
                info!(tenant_id = %tenant.id, slug = %tenant.slug, "tenant created");
                Ok(tenant)
            }
            // Lost a race with a concurrent signup for the same name.
            Err(TaskhubError::AlreadyExists { .. }) => {
                self.tenant_repo.get_by_slug(&slug, false).await
            }
            Err(e) => Err(e),
        }
    }

    /// Exchange email + password for an access token.
    ///
    /// Unknown emails, wrong passwords and members of a deleted tenant
    /// all fail with the same `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: &str) -> TaskhubResult<LoginOutput> {
        let member = match self.member_repo.get_by_email(email, false).await {
            Ok(m) => m,
            Err(TaskhubError::NotFound { .. }) => {
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        let valid = password::verify_password(
            password,
            &member.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        match self.tenant_repo.get_by_id(member.tenant_id, false).await {
            Ok(_) => {}
            Err(TaskhubError::NotFound { .. }) => {
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        }

        let access_token = token::issue_access_token(&member, &self.config)?;
        info!(member_id = %member.id, tenant_id = %member.tenant_id, "login succeeded");

        Ok(LoginOutput {
            access_token,
            expires_in: self.config.access_token_lifetime_secs,
            member,
        })
    }
}
