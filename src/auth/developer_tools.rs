//! Credentials backed by locally signed-in developer CLIs.

use super::{AccessToken, AuthError, TokenCredential};
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;

/// Run a CLI tool and return its stdout.
///
/// Windows installs `az`/`azd` as batch shims, so they go through `cmd /C`.
async fn run_tool(
    source_name: &'static str,
    program: &str,
    args: &[&str],
) -> Result<String, AuthError> {
    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(program);
        c
    } else {
        Command::new(program)
    };

    let output = command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| AuthError::Unavailable {
            source_name,
            reason: if e.kind() == std::io::ErrorKind::NotFound {
                format!("'{program}' is not installed")
            } else {
                format!("failed to run '{program}': {e}")
            },
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = match stderr.trim() {
            "" => format!("'{program}' exited with {}", output.status),
            msg => msg.to_string(),
        };
        return Err(AuthError::Unavailable {
            source_name,
            reason,
        });
    }

    String::from_utf8(output.stdout).map_err(|_| AuthError::InvalidToken {
        source_name,
        reason: "output is not valid UTF-8".into(),
    })
}

/// Token from `az account get-access-token`.
pub struct AzureCliCredential {
    tenant_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzCliToken {
    access_token: String,
    /// Local time, e.g. `2025-01-01 12:00:00.000000`.
    expires_on: Option<String>,
    /// Unix seconds; only emitted by newer CLI versions.
    #[serde(rename = "expires_on")]
    expires_on_unix: Option<i64>,
}

impl AzureCliCredential {
    pub fn new(tenant_id: Option<String>) -> Self {
        Self { tenant_id }
    }

    fn args<'a>(&'a self, scope: &'a str) -> Vec<&'a str> {
        let mut args = vec![
            "account",
            "get-access-token",
            "--output",
            "json",
            "--scope",
            scope,
        ];
        if let Some(tenant) = self.tenant_id.as_deref() {
            args.extend(["--tenant", tenant]);
        }
        args
    }

    fn parse(&self, stdout: &str) -> Result<AccessToken, AuthError> {
        let raw: AzCliToken = serde_json::from_str(stdout).map_err(|e| AuthError::InvalidToken {
            source_name: self.name(),
            reason: format!("unexpected output: {e}"),
        })?;

        let expires_at = match (raw.expires_on_unix, raw.expires_on.as_deref()) {
            (Some(secs), _) => DateTime::<Utc>::from_timestamp(secs, 0),
            (None, Some(local)) => parse_local_timestamp(local),
            (None, None) => None,
        };

        Ok(AccessToken::new(raw.access_token, expires_at))
    }
}

fn parse_local_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait]
impl TokenCredential for AzureCliCredential {
    fn name(&self) -> &'static str {
        "Azure CLI"
    }

    async fn get_token(&self, scope: &str) -> Result<AccessToken, AuthError> {
        let stdout = run_tool(self.name(), "az", &self.args(scope)).await?;
        self.parse(&stdout)
    }
}

/// Token from `azd auth token`.
pub struct AzureDeveloperCliCredential {
    tenant_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzdToken {
    token: String,
    expires_on: Option<DateTime<Utc>>,
}

impl AzureDeveloperCliCredential {
    pub fn new(tenant_id: Option<String>) -> Self {
        Self { tenant_id }
    }

    fn args<'a>(&'a self, scope: &'a str) -> Vec<&'a str> {
        let mut args = vec!["auth", "token", "--output", "json", "--scope", scope];
        if let Some(tenant) = self.tenant_id.as_deref() {
            args.extend(["--tenant-id", tenant]);
        }
        args
    }

    fn parse(&self, stdout: &str) -> Result<AccessToken, AuthError> {
        let raw: AzdToken = serde_json::from_str(stdout).map_err(|e| AuthError::InvalidToken {
            source_name: self.name(),
            reason: format!("unexpected output: {e}"),
        })?;
        Ok(AccessToken::new(raw.token, raw.expires_on))
    }
}

#[async_trait]
impl TokenCredential for AzureDeveloperCliCredential {
    fn name(&self) -> &'static str {
        "Azure Developer CLI"
    }

    async fn get_token(&self, scope: &str) -> Result<AccessToken, AuthError> {
        let stdout = run_tool(self.name(), "azd", &self.args(scope)).await?;
        self.parse(&stdout)
    }
}
