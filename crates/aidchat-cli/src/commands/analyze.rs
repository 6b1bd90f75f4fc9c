use std::path::Path;

use anyhow::{bail, Result};

use aidchat_lib::services::api::SUPPORTED_EXTENSIONS;
use aidchat_lib::services::view::render_message;
use aidchat_lib::{DocumentOutcome, DocumentUpload, IgnoreReason};

use super::{Context, LOGIN_HINT};

/// Read a file for upload, warning when its extension is outside the soft
/// filter. The file is sent either way.
pub async fn load_upload(path: &Path) -> Result<DocumentUpload> {
    let upload = DocumentUpload::from_path(path).await?;
    if !upload.has_supported_extension() {
        eprintln!(
            "Warning: {} is not one of {}; sending anyway",
            upload.file_name,
            SUPPORTED_EXTENSIONS.join(", ")
        );
    }
    Ok(upload)
}

pub async fn run(ctx: &Context, file: &Path) -> Result<()> {
    let session = ctx.session();
    if !session.mount() {
        bail!(LOGIN_HINT);
    }

    let upload = load_upload(file).await?;
    match session.submit_file(upload).await {
        DocumentOutcome::Analyzed(message) => {
            println!("{}", render_message(&message));
            Ok(())
        }
        DocumentOutcome::Failed { message, .. } => bail!(message),
        DocumentOutcome::AuthRequired => bail!(LOGIN_HINT),
        DocumentOutcome::Ignored(IgnoreReason::Busy) => {
            bail!("A document is already being analyzed")
        }
        DocumentOutcome::Ignored(IgnoreReason::BlankInput) => bail!("Nothing to send"),
    }
}
