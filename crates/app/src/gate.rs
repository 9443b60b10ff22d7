use std::path::PathBuf;

use sha2::{Digest, Sha256};
use thiserror::Error;

use pulse_db::Db;

/// Identity resolution failures. Everything here is raised before any
/// ledger write happens; the core never partially processes an
/// unauthenticated submission.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credential")]
    InvalidCredential,
    #[error("credential revoked")]
    Revoked,
    #[error("linking code invalid, expired, or already used")]
    CodeInvalid,
    #[error("identity source unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub user_id: String,
    pub org_id: Option<String>,
    pub org_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgMemberProfile {
    pub user_id: String,
    pub name: String,
    pub email: String,
}

/// Collaborator resolving raw collector credentials to a canonical
/// (user, org) pair, and enumerating an org's current members for the
/// best-effort membership sync.
pub trait IdentityGate: Send + Sync {
    fn resolve_submission(&self, credential: &str)
    -> std::result::Result<ResolvedIdentity, AuthError>;

    fn list_org_members(
        &self,
        org_id: &str,
    ) -> std::result::Result<Vec<OrgMemberProfile>, AuthError>;
}

/// Production gate backed by the `device_tokens` table: tokens are
/// SHA-256 hashed at rest and looked up by hash.
pub struct TokenGate {
    db_path: PathBuf,
}

impl TokenGate {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    fn db(&self) -> std::result::Result<Db, AuthError> {
        Db::open(&self.db_path).map_err(|err| AuthError::Unavailable(err.to_string()))
    }
}

impl IdentityGate for TokenGate {
    fn resolve_submission(
        &self,
        credential: &str,
    ) -> std::result::Result<ResolvedIdentity, AuthError> {
        let db = self.db()?;
        let hash = hash_token(credential);
        let token = db
            .find_device_token(&hash)
            .map_err(|err| AuthError::Unavailable(err.to_string()))?
            .ok_or(AuthError::InvalidCredential)?;
        if token.revoked_at.is_some() {
            return Err(AuthError::Revoked);
        }
        if let Err(err) = db.touch_device_token(&hash) {
            tracing::warn!(error = %err, "failed to bump device token last_used_at");
        }
        let org_name = match &token.org_id {
            Some(org_id) => db
                .get_org(org_id)
                .map_err(|err| AuthError::Unavailable(err.to_string()))?
                .map(|org| org.name),
            None => None,
        };
        Ok(ResolvedIdentity {
            user_id: token.user_id,
            org_id: token.org_id,
            org_name,
        })
    }

    fn list_org_members(
        &self,
        org_id: &str,
    ) -> std::result::Result<Vec<OrgMemberProfile>, AuthError> {
        let db = self.db()?;
        let users = db
            .users_in_org(org_id)
            .map_err(|err| AuthError::Unavailable(err.to_string()))?;
        Ok(users
            .into_iter()
            .map(|user| OrgMemberProfile {
                user_id: user.id,
                name: user.name,
                email: user.email,
            })
            .collect())
    }
}

pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().map(|byte| format!("{:02x}", byte)).collect()
}
