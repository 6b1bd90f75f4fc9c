use anyhow::{bail, Result};

use aidchat_lib::services::auth::login_failure_text;

use super::Context;

pub async fn run(ctx: &Context, email: &str, password: Option<String>) -> Result<()> {
    let password = resolve_password(password).await?;

    match ctx.auth().login(email, &password).await {
        Ok(_) => {
            println!("Logged in as {}", email.trim().to_lowercase());
            Ok(())
        }
        Err(err) => bail!(login_failure_text(&err)),
    }
}

/// Use the password from the command line, or read it from the terminal
/// with echo off.
async fn resolve_password(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    let typed = tokio::task::spawn_blocking(|| rpassword::prompt_password("Password: ")).await??;
    Ok(typed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_password_flag_skips_prompt() {
        assert_eq!(
            resolve_password(Some("hunter2".to_string())).await.unwrap(),
            "hunter2"
        );
    }

    #[tokio::test]
    async fn test_login_failure_leaves_store_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::from_config(aidchat_lib::ClientConfig {
            data_dir: Some(dir.path().to_path_buf()),
            ..aidchat_lib::ClientConfig::default()
        })
        .unwrap();

        let err = run(&ctx, "  ", Some("pw".to_string())).await.unwrap_err();
        assert_eq!(err.to_string(), "Email and password are required");
        assert!(!ctx.auth().is_logged_in());
    }
}
