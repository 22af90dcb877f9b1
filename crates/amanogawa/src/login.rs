// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `amanogawa login`: interactive Telegram authorization on the terminal.

use std::io::{self, BufRead, Write};

use amanogawa_config::AmanogawaConfig;
use amanogawa_core::AmanogawaError;
use amanogawa_telegram::LoginPrompt;

/// Reads answers from stdin; the 2FA password is read without echo.
struct TerminalPrompt;

fn read_line(label: &str) -> Result<String, AmanogawaError> {
    let mut stdout = io::stdout();
    write!(stdout, "{label}: ")
        .and_then(|()| stdout.flush())
        .map_err(|e| AmanogawaError::Internal(format!("failed to write prompt: {e}")))?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| AmanogawaError::Internal(format!("failed to read {label}: {e}")))?;
    let line = line.trim().to_string();
    if line.is_empty() {
        return Err(AmanogawaError::Config(format!("{label} is required")));
    }
    Ok(line)
}

impl LoginPrompt for TerminalPrompt {
    fn phone(&self) -> Result<String, AmanogawaError> {
        read_line("Phone number (international format)")
    }

    fn code(&self) -> Result<String, AmanogawaError> {
        read_line("Login code")
    }

    fn password(&self, hint: Option<&str>) -> Result<String, AmanogawaError> {
        let label = match hint {
            Some(hint) => format!("2FA password (hint: {hint}): "),
            None => "2FA password: ".to_string(),
        };
        rpassword::prompt_password(label)
            .map_err(|e| AmanogawaError::Internal(format!("failed to read password: {e}")))
    }
}

pub async fn run_login(config: AmanogawaConfig) -> Result<(), AmanogawaError> {
    crate::serve::init_tracing(&config.server.log_level);

    if !config.telegram.has_credentials() {
        return Err(AmanogawaError::Config(
            "set telegram.api_id and telegram.api_hash before logging in".into(),
        ));
    }

    let name = amanogawa_telegram::login(&config.telegram, &TerminalPrompt).await?;
    println!(
        "Signed in as {name}. Session saved to {}.",
        config.telegram.session_file
    );
    Ok(())
}
