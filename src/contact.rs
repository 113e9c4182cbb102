use serde::Deserialize;

use crate::{
    config::MailConfig,
    mail::{is_valid_address, Email, MailError, Mailer},
};

pub const SENT: &str = "Message sent successfully";

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub budget: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ContactError {
    #[error("All fields are required")]
    MissingFields,
    #[error("Invalid email format")]
    InvalidEmail,
    #[error(transparent)]
    #[diagnostic(transparent)]
    Mail(#[from] MailError),
}

impl ContactForm {
    pub fn check(&self) -> Result<(), ContactError> {
        if [&self.name, &self.email, &self.message]
            .iter()
            .any(|field| field.is_empty())
        {
            return Err(ContactError::MissingFields);
        }
        if !is_valid_address(&self.email) {
            return Err(ContactError::InvalidEmail);
        }
        Ok(())
    }

    /// The notification the studio receives; replies go to the visitor.
    pub fn to_email(&self, config: &MailConfig) -> Email {
        let budget = self
            .budget
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or("Not specified");
        Email {
            from: config.from.clone(),
            to: vec![config.to.clone()],
            reply_to: Some(self.email.clone()),
            subject: format!("New contact form submission from {}", self.name),
            text: format!(
                "New Contact Form Submission\n\nFrom: {} ({})\nBudget Range: {}\n\nMessage:\n{}\n",
                self.name, self.email, budget, self.message
            ),
        }
    }
}

/// Validates the form and forwards it by email. Nothing is stored.
pub async fn send(
    mailer: &dyn Mailer,
    config: &MailConfig,
    form: &ContactForm,
) -> Result<String, ContactError> {
    form.check()?;
    let id = mailer.send(&form.to_email(config)).await?;
    tracing::info!(%id, "contact message forwarded");
    Ok(id)
}
