//! Category catalogue commands.
//!
//! # Usage
//!
//! ```bash
//! vm-cli categories list
//! ```

use super::backend::{BackendCommandError, client};

/// Print every category as `<id>\t<name>`.
///
/// # Errors
///
/// Returns an error if the backend cannot be reached.
pub async fn list() -> Result<(), BackendCommandError> {
    let (client, _) = client()?;
    let categories = client.list_categories().await?;

    if categories.is_empty() {
        tracing::warn!("The backend has no categories");
        return Ok(());
    }

    #[allow(clippy::print_stdout)]
    for category in &categories {
        println!("{}\t{}", category.external_id, category.name);
    }

    tracing::info!("{} categories", categories.len());
    Ok(())
}
