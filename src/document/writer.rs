//! Generated site persistence

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::constants::document as doc_constants;
use crate::types::{Document, Result};

/// Write `document` into `output_dir` and return the directory path
///
/// Produces `index.html`, `styles.css` and `script.js`, then copies every
/// asset that still exists next to them by file name. Later assets with the
/// same name overwrite earlier ones.
pub async fn save_website(document: &Document, output_dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(output_dir).await?;

    tokio::fs::write(output_dir.join(doc_constants::OUTPUT_HTML), &document.html).await?;
    tokio::fs::write(output_dir.join(doc_constants::OUTPUT_CSS), &document.css).await?;
    tokio::fs::write(output_dir.join(doc_constants::OUTPUT_JS), &document.js).await?;

    let mut copied = 0usize;
    for asset in &document.assets {
        let Some(name) = asset.file_name() else {
            continue;
        };

        if !tokio::fs::try_exists(asset).await.unwrap_or(false) {
            warn!(asset = %asset.display(), "Asset no longer exists, skipping");
            continue;
        }

        let dest = output_dir.join(name);
        debug!(from = %asset.display(), to = %dest.display(), "Copying asset");
        tokio::fs::copy(asset, &dest).await?;
        copied += 1;
    }

    info!(
        output = %output_dir.display(),
        assets = copied,
        "Saved generated site"
    );
    Ok(output_dir.to_path_buf())
}
