use anyhow::{bail, Context, Result};
use gasto_api::AuthContext;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::state::ensure_gasto_home;

/// Overrides the stored token when set and non-blank
pub const TOKEN_ENV: &str = "GASTO_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthState {
    pub token: Option<String>,
}

fn auth_path() -> Result<PathBuf> {
    Ok(ensure_gasto_home()?.join("auth.json"))
}

pub fn load_auth() -> Result<AuthState> {
    let p = auth_path()?;
    if !p.exists() {
        return Ok(AuthState::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    Ok(serde_json::from_str(&s)?)
}

pub fn save_auth(auth: &AuthState) -> Result<()> {
    let p = auth_path()?;
    let s = serde_json::to_string_pretty(auth)?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

/// Session credentials for the API client. A missing token yields an anonymous context.
pub fn load_auth_context() -> Result<AuthContext> {
    let env_token = std::env::var(TOKEN_ENV).ok();
    let stored = load_auth()?.token;
    Ok(resolve(env_token, stored))
}

fn resolve(env_token: Option<String>, stored: Option<String>) -> AuthContext {
    match env_token.filter(|t| !t.trim().is_empty()).or(stored) {
        Some(token) => AuthContext::bearer(token),
        None => AuthContext::anonymous(),
    }
}

fn prompt_secret(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

pub fn set_token() -> Result<()> {
    let token = prompt_secret("Paste GastoSmart session token")?;
    if token.is_empty() {
        bail!("empty token; nothing saved");
    }
    if token.chars().any(char::is_whitespace) {
        bail!("token must not contain whitespace");
    }
    save_auth(&AuthState { token: Some(token) })?;
    println!("Saved token to {}", auth_path()?.display());
    Ok(())
}

pub fn clear_token() -> Result<()> {
    save_auth(&AuthState::default())?;
    println!("Cleared stored token");
    Ok(())
}
