//! # Credential Subcommands
//!
//! The HTTP subcommands mirroring the registry's five operations. Each
//! builds the request JSON, calls the API, and pretty-prints the
//! response.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::json;

use crate::client::{print_json, ApiClient};

/// Arguments for the `credential` subcommand tree.
#[derive(Args, Debug)]
pub struct CredentialArgs {
    #[command(subcommand)]
    command: CredentialCommand,
}

#[derive(Subcommand, Debug)]
enum CredentialCommand {
    /// Issue a credential to a subject wallet (institution callers only).
    Issue {
        /// Subject's wallet address.
        #[arg(long)]
        subject: String,

        /// Credential type: degree, transcript, skill_certificate,
        /// internship_proof, or micro_credential.
        #[arg(long = "type")]
        credential_type: String,

        /// Credential title.
        #[arg(long)]
        title: String,

        /// Optional description.
        #[arg(long)]
        description: Option<String>,

        /// Optional metadata as a JSON object string.
        #[arg(long)]
        metadata: Option<String>,

        /// Optional expiry timestamp (RFC 3339).
        #[arg(long)]
        valid_until: Option<String>,
    },

    /// Verify a credential by hash or identifier.
    Verify {
        /// Credential hash (64 hex chars).
        #[arg(long, conflicts_with = "id")]
        hash: Option<String>,

        /// Human-readable credential identifier.
        #[arg(long)]
        id: Option<String>,
    },

    /// Share an owned credential via an opaque token.
    Share {
        /// Human-readable credential identifier.
        #[arg(long)]
        id: String,

        /// Recipient wallet address.
        #[arg(long)]
        with: Option<String>,

        /// Share lifetime in hours.
        #[arg(long)]
        expires_in_hours: Option<i64>,

        /// Maximum number of views.
        #[arg(long)]
        max_views: Option<i32>,

        /// Access type: view, verify, or download.
        #[arg(long)]
        access: Option<String>,
    },

    /// Revoke an issued credential (issuer callers only).
    Revoke {
        /// Human-readable credential identifier.
        #[arg(long)]
        id: String,

        /// Revocation reason.
        #[arg(long)]
        reason: String,
    },

    /// List credential history for the caller.
    History {
        /// View role: student (default) or institution.
        #[arg(long)]
        role: Option<String>,

        /// Page size.
        #[arg(long)]
        limit: Option<i64>,

        /// Page offset.
        #[arg(long)]
        offset: Option<i64>,
    },
}

/// Run a credential subcommand against the API.
pub async fn run_credentials(args: &CredentialArgs, client: &ApiClient) -> Result<u8> {
    match &args.command {
        CredentialCommand::Issue {
            subject,
            credential_type,
            title,
            description,
            metadata,
            valid_until,
        } => {
            let metadata: Option<serde_json::Value> = metadata
                .as_deref()
                .map(serde_json::from_str)
                .transpose()
                .map_err(|e| anyhow::anyhow!("--metadata is not valid JSON: {e}"))?;
            let mut body = json!({
                "subjectWalletAddress": subject,
                "credentialType": credential_type,
                "title": title,
            });
            let fields = body.as_object_mut().expect("body is an object");
            if let Some(description) = description {
                fields.insert("description".into(), json!(description));
            }
            if let Some(metadata) = metadata {
                fields.insert("metadata".into(), metadata);
            }
            if let Some(valid_until) = valid_until {
                fields.insert("validUntil".into(), json!(valid_until));
            }
            let response = client.post("/v1/credentials/issue", &body).await?;
            print_json(&response);
        }
        CredentialCommand::Verify { hash, id } => {
            let mut body = json!({});
            let fields = body.as_object_mut().expect("body is an object");
            if let Some(hash) = hash {
                fields.insert("credentialHash".into(), json!(hash));
            }
            if let Some(id) = id {
                fields.insert("credentialId".into(), json!(id));
            }
            let response = client.post("/v1/credentials/verify", &body).await?;
            let verified = response["verified"].as_bool().unwrap_or(false);
            print_json(&response);
            if !verified {
                return Ok(1);
            }
        }
        CredentialCommand::Share {
            id,
            with,
            expires_in_hours,
            max_views,
            access,
        } => {
            let mut body = json!({"credentialId": id});
            let fields = body.as_object_mut().expect("body is an object");
            if let Some(with) = with {
                fields.insert("sharedWithWalletAddress".into(), json!(with));
            }
            if let Some(hours) = expires_in_hours {
                fields.insert("expiresInHours".into(), json!(hours));
            }
            if let Some(max_views) = max_views {
                fields.insert("maxViews".into(), json!(max_views));
            }
            if let Some(access) = access {
                fields.insert("accessType".into(), json!(access));
            }
            let response = client.post("/v1/credentials/share", &body).await?;
            print_json(&response);
        }
        CredentialCommand::Revoke { id, reason } => {
            let body = json!({"credentialId": id, "reason": reason});
            let response = client.post("/v1/credentials/revoke", &body).await?;
            print_json(&response);
        }
        CredentialCommand::History {
            role,
            limit,
            offset,
        } => {
            let mut query = Vec::new();
            if let Some(role) = role {
                query.push(format!("role={role}"));
            }
            if let Some(limit) = limit {
                query.push(format!("limit={limit}"));
            }
            if let Some(offset) = offset {
                query.push(format!("offset={offset}"));
            }
            let path = if query.is_empty() {
                "/v1/credentials/history".to_string()
            } else {
                format!("/v1/credentials/history?{}", query.join("&"))
            };
            let response = client.get(&path).await?;
            print_json(&response);
        }
    }
    Ok(0)
}
