//! Audit file of the pending claims found in a run.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::MultiTokenPendingClaims;
use crate::error::Result;

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `pending` as JSON to `path`.
///
/// The document goes to a sibling temp file first and is renamed into place,
/// so readers see either the previous file or the complete new one.
pub async fn write_pending_claims(path: &Path, pending: &[MultiTokenPendingClaims]) -> Result<()> {
    let json = serde_json::to_vec(pending)?;
    let tmp = temp_path(path);

    debug!("Writing {} bytes to {}", json.len(), tmp.display());
    tokio::fs::write(&tmp, &json).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    info!("Pending claims written to {}", path.display());
    Ok(())
}
