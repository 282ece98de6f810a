//! CSRF tokens for console forms.
//!
//! Each rendered form gets a fresh token stored in the session. Tokens are
//! single-use and expire after an hour; at most [`MAX_TOKENS`] are kept so
//! several open tabs keep working.

use anyhow::{Result, anyhow};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tower_sessions::Session;

/// Form field carrying the token.
pub const CSRF_FIELD: &str = "csrf_token";

/// Session key for storing CSRF tokens.
const CSRF_SESSION_KEY: &str = "csrf_tokens";

/// Maximum number of tokens to store per session.
const MAX_TOKENS: usize = 10;

/// Token validity period in seconds (1 hour).
const TOKEN_VALIDITY_SECS: i64 = 3600;

/// A stored token with its issue time.
struct StoredToken<'a> {
    token: &'a str,
    issued_at: i64,
}

fn parse(entry: &str) -> Option<StoredToken<'_>> {
    let (token, issued_at) = entry.split_once(':')?;
    Some(StoredToken {
        token,
        issued_at: issued_at.parse().ok()?,
    })
}

fn is_fresh(issued_at: i64, now: i64) -> bool {
    now - issued_at <= TOKEN_VALIDITY_SECS
}

async fn stored_tokens(session: &Session) -> Vec<String> {
    session
        .get(CSRF_SESSION_KEY)
        .await
        .unwrap_or(None)
        .unwrap_or_default()
}

/// Generate a CSRF token and store it in the session.
pub async fn generate_csrf_token(session: &Session) -> Result<String> {
    let mut random_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut random_bytes);
    let now = chrono::Utc::now().timestamp();

    let mut hasher = Sha256::new();
    hasher.update(random_bytes);
    hasher.update(now.to_le_bytes());
    let token = hex::encode(hasher.finalize());

    let mut tokens = stored_tokens(session).await;
    tokens.push(format!("{token}:{now}"));
    if tokens.len() > MAX_TOKENS {
        let skip = tokens.len() - MAX_TOKENS;
        tokens.drain(..skip);
    }

    session
        .insert(CSRF_SESSION_KEY, tokens)
        .await
        .map_err(|e| anyhow!("failed to store CSRF token: {e}"))?;

    Ok(token)
}

/// Verify and consume a submitted token.
///
/// Returns false for empty, unknown, reused or expired tokens.
pub async fn verify_csrf_token(session: &Session, submitted: &str) -> Result<bool> {
    if submitted.is_empty() {
        return Ok(false);
    }

    let tokens = stored_tokens(session).await;
    if tokens.is_empty() {
        return Ok(false);
    }

    let now = chrono::Utc::now().timestamp();
    let matched = tokens.iter().any(|entry| {
        parse(entry).is_some_and(|stored| stored.token == submitted && is_fresh(stored.issued_at, now))
    });
    if !matched {
        return Ok(false);
    }

    // Consume the token and drop expired ones
    let remaining: Vec<String> = tokens
        .iter()
        .filter(|entry| {
            parse(entry).is_some_and(|stored| stored.token != submitted && is_fresh(stored.issued_at, now))
        })
        .cloned()
        .collect();

    session
        .insert(CSRF_SESSION_KEY, remaining)
        .await
        .map_err(|e| anyhow!("failed to update CSRF tokens: {e}"))?;

    Ok(true)
}
