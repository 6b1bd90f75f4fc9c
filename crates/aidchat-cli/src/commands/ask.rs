use anyhow::{bail, Result};

use aidchat_lib::services::view::render_message;
use aidchat_lib::{ChatOutcome, IgnoreReason};

use super::{Context, LOGIN_HINT};

pub async fn run(ctx: &Context, text: &str) -> Result<()> {
    let session = ctx.session();
    if !session.mount() {
        bail!(LOGIN_HINT);
    }

    match session.submit_text(text).await {
        ChatOutcome::Replied(_) => {
            for message in session.snapshot().messages {
                println!("{}", render_message(&message));
            }
            Ok(())
        }
        ChatOutcome::Failed { message, code } => {
            log::debug!("[chat] Failed with {}", code.as_str());
            bail!(message)
        }
        ChatOutcome::AuthRequired => bail!(LOGIN_HINT),
        ChatOutcome::Ignored(IgnoreReason::BlankInput) => bail!("Nothing to send"),
        ChatOutcome::Ignored(IgnoreReason::Busy) => bail!("A question is already being sent"),
    }
}
