// src/utils/mail.rs

use async_trait::async_trait;

use crate::error::AppError;

/// Delivers verification codes to users.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_code(&self, email: &str, code: &str) -> Result<(), AppError>;
}

/// Writes the code to the log instead of sending mail. Used in development
/// and tests.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_code(&self, email: &str, code: &str) -> Result<(), AppError> {
        tracing::info!(email, "Verification code issued: {}", code);
        Ok(())
    }
}
