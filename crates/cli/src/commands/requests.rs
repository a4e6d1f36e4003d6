//! Account request review commands.

use centerdesk_core::RequestStatus;
use centerdesk_server::store::CredentialStore;

use super::CliError;

/// List account requests, optionally filtered by status.
///
/// # Errors
///
/// Returns an error when the status filter is invalid or the datastore is
/// unreachable.
pub async fn list(status: Option<&str>) -> Result<(), CliError> {
    let status = status
        .map(str::parse::<RequestStatus>)
        .transpose()
        .map_err(CliError::InvalidInput)?;

    let store = super::store_from_env()?;
    let requests = store.list_requests(status).await?;

    if requests.is_empty() {
        tracing::info!("no account requests found");
        return Ok(());
    }

    for request in requests {
        tracing::info!(
            "{}  {:<10}  {:<24}  center: {}",
            request.id,
            request.status,
            request.username,
            request.center_name,
        );
    }

    Ok(())
}
