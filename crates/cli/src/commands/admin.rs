//! Admin credential management commands.

use centerdesk_core::{AdminUserId, CenterId, Username};
use centerdesk_server::auth::hash_password;
use centerdesk_server::models::NewAdminUser;
use centerdesk_server::store::CredentialStore;

use super::CliError;

/// Create a new admin credential.
///
/// The password is hashed locally; plaintext never leaves this process. A
/// tenant admin must be bound to a center; a superadmin may go unbound.
///
/// # Errors
///
/// Returns an error when the username is taken, the center is unknown, or
/// the datastore is unreachable.
pub async fn create_user(
    username: &str,
    password: &str,
    center_id: Option<&str>,
    superadmin: bool,
) -> Result<AdminUserId, CliError> {
    let username = Username::parse(username)
        .map_err(|e| CliError::InvalidInput(e.to_string()))?;
    if password.is_empty() {
        return Err(CliError::InvalidInput("password is required".to_string()));
    }

    let center_id = center_id
        .map(str::parse::<CenterId>)
        .transpose()
        .map_err(|e| CliError::InvalidInput(format!("invalid center id: {e}")))?;
    if center_id.is_none() && !superadmin {
        return Err(CliError::InvalidInput(
            "a tenant admin must be bound to a center (pass --center-id or --superadmin)"
                .to_string(),
        ));
    }

    let store = super::store_from_env()?;

    if let Some(center_id) = center_id {
        store
            .center_by_id(center_id)
            .await?
            .ok_or_else(|| CliError::InvalidInput(format!("unknown center: {center_id}")))?;
    }

    // Check if the username is already taken
    if store.admin_user_by_username(&username).await?.is_some() {
        return Err(CliError::InvalidInput(format!(
            "admin credential already exists for username: {username}"
        )));
    }

    let password_hash = hash_password(password)
        .map_err(|e| CliError::InvalidInput(e.to_string()))?;

    tracing::info!("Creating admin credential: {} (superadmin: {})", username, superadmin);

    let user = store
        .insert_admin_user(NewAdminUser {
            username,
            password_hash,
            center_id,
            is_active: true,
            is_superadmin: superadmin,
        })
        .await?;

    Ok(user.id)
}
