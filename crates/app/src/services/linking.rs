use chrono::{Duration, SecondsFormat, Utc};
use rand::RngCore;

use crate::error::{AppError, Result};
use crate::gate::{AuthError, hash_token};
use crate::services::{SharedConfig, open_db};

/// Linking codes expire 15 minutes after issue.
const CODE_TTL_MINUTES: i64 = 15;
const CODE_LEN: usize = 6;
// No 0/O/1/I/L: codes get read aloud and retyped.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkProfile {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub org_id: Option<String>,
    pub org_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCode {
    pub code: String,
    pub expires_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedToken {
    pub token: String,
}

#[derive(Clone)]
pub struct LinkingService {
    config: SharedConfig,
}

impl LinkingService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    /// Issue a single-use linking code for a dashboard-authenticated
    /// user, creating the user/org/membership rows on first sight.
    pub fn begin_link(&self, profile: &LinkProfile) -> Result<IssuedCode> {
        if profile.user_id.is_empty() {
            return Err(AppError::InvalidInput("user_id is required".to_string()));
        }
        let db = open_db(&self.config)?;
        if let Some(org_id) = &profile.org_id {
            db.upsert_org(org_id, profile.org_name.as_deref().unwrap_or(""))?;
            db.upsert_membership(&profile.user_id, org_id)?;
        }
        db.upsert_user(
            &profile.user_id,
            &profile.name,
            &profile.email,
            profile.org_id.as_deref(),
        )?;

        let expires_at = (Utc::now() + Duration::minutes(CODE_TTL_MINUTES))
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        // Retry on the off chance two concurrent issues collide on the
        // 6-character code.
        let mut last_err = None;
        for _ in 0..4 {
            let code = generate_code();
            match db.insert_linking_code(
                &code,
                &profile.user_id,
                profile.org_id.as_deref(),
                &expires_at,
            ) {
                Ok(()) => {
                    return Ok(IssuedCode { code, expires_at });
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(AppError::Message(format!(
            "could not allocate linking code: {}",
            last_err.map(|err| err.to_string()).unwrap_or_default()
        )))
    }

    /// Exchange a linking code for a long-lived device token. Only the
    /// token hash is stored; the plaintext is returned once and never
    /// recoverable.
    pub fn claim_link(&self, code: &str, label: Option<&str>) -> Result<ClaimedToken> {
        let db = open_db(&self.config)?;
        let row = db
            .claim_linking_code(code)?
            .ok_or(AppError::Auth(AuthError::CodeInvalid))?;
        let token = generate_token();
        db.insert_device_token(&hash_token(&token), &row.user_id, row.org_id.as_deref(), label)?;
        Ok(ClaimedToken { token })
    }
}

fn generate_code() -> String {
    let mut bytes = [0u8; CODE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes
        .iter()
        .map(|byte| CODE_ALPHABET[*byte as usize % CODE_ALPHABET.len()] as char)
        .collect()
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
}
