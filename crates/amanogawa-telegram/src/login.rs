// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-time interactive authorization of the Telegram user session.

use amanogawa_config::model::TelegramConfig;
use amanogawa_core::AmanogawaError;
use grammers_client::SignInError;
use tracing::info;

use crate::{channel_error, open_client};

/// Source of the answers the login flow asks for.
pub trait LoginPrompt {
    /// Phone number in international format.
    fn phone(&self) -> Result<String, AmanogawaError>;

    /// The code Telegram sent to the account.
    fn code(&self) -> Result<String, AmanogawaError>;

    /// Two-factor password, shown with its hint when the account has one.
    fn password(&self, hint: Option<&str>) -> Result<String, AmanogawaError>;
}

/// Signs in and persists the session file. Returns the signed-in account's name.
///
/// Does nothing beyond reporting the account when the session is already authorized.
pub async fn login(
    config: &TelegramConfig,
    prompt: &dyn LoginPrompt,
) -> Result<String, AmanogawaError> {
    let client = open_client(config).await?;

    let authorized = client
        .is_authorized()
        .await
        .map_err(|e| channel_error("authorization check failed", e))?;

    if !authorized {
        let phone = prompt.phone()?;
        let token = client
            .request_login_code(phone.trim())
            .await
            .map_err(|e| channel_error("requesting login code failed", e))?;
        let code = prompt.code()?;

        match client.sign_in(&token, code.trim()).await {
            Ok(_) => {}
            Err(SignInError::PasswordRequired(password_token)) => {
                let password = prompt.password(password_token.hint())?;
                client
                    .check_password(password_token, password.trim())
                    .await
                    .map_err(|e| channel_error("password check failed", e))?;
            }
            Err(e) => return Err(channel_error("sign in failed", e)),
        }

        client
            .session()
            .save_to_file(&config.session_file)
            .map_err(|e| channel_error("saving session file failed", e))?;
        info!(session_file = %config.session_file, "telegram session saved");
    }

    let me = client
        .get_me()
        .await
        .map_err(|e| channel_error("fetching account failed", e))?;
    Ok(me.full_name())
}
