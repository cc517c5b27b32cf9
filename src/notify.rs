use crate::config::EmailConfig;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("некорректный адрес '{address}': {source}")]
    Address {
        address: String,
        source: lettre::address::AddressError,
    },
    #[error("не удалось сформировать письмо: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("ошибка SMTP: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("не найден пароль SMTP: задайте '{0}' в окружении или email.password в config")]
    MissingPassword(String),
}

pub trait ReportSender {
    async fn send(&self, subject: &str, html_body: &str) -> Result<(), SendError>;
}

pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl SmtpSender {
    pub fn new(cfg: &EmailConfig) -> Result<Self, SendError> {
        let from = parse_mailbox(&cfg.from)?;
        let to = cfg
            .to
            .iter()
            .map(|r| parse_mailbox(r))
            .collect::<Result<Vec<_>, _>>()?;

        let builder = if cfg.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&cfg.smtp_host)
        };
        let mut builder = builder.port(cfg.smtp_port);

        if let Some(username) = cfg.username.as_deref().filter(|u| !u.trim().is_empty()) {
            let password = resolve_password(cfg)
                .ok_or_else(|| SendError::MissingPassword(cfg.password_env.clone()))?;
            builder = builder.credentials(Credentials::new(username.to_string(), password));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }

    fn build_message(&self, subject: &str, html_body: &str) -> Result<Message, SendError> {
        let mut builder = Message::builder().from(self.from.clone()).subject(subject);
        for recipient in &self.to {
            builder = builder.to(recipient.clone());
        }
        Ok(builder
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())?)
    }
}

impl ReportSender for SmtpSender {
    async fn send(&self, subject: &str, html_body: &str) -> Result<(), SendError> {
        let message = self.build_message(subject, html_body)?;
        self.transport.send(message).await?;
        info!(recipients = self.to.len(), subject, "отчёт отправлен по почте");
        Ok(())
    }
}

pub struct StdoutSender;

impl ReportSender for StdoutSender {
    async fn send(&self, _subject: &str, html_body: &str) -> Result<(), SendError> {
        println!("{html_body}");
        Ok(())
    }
}

// email switched off: the report is built, logged and dropped
pub struct DiscardSender;

impl ReportSender for DiscardSender {
    async fn send(&self, subject: &str, html_body: &str) -> Result<(), SendError> {
        info!(
            subject,
            bytes = html_body.len(),
            "отчёт сформирован, отправка выключена"
        );
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, SendError> {
    address.trim().parse().map_err(|source| SendError::Address {
        address: address.to_string(),
        source,
    })
}

fn resolve_password(cfg: &EmailConfig) -> Option<String> {
    if let Ok(v) = std::env::var(&cfg.password_env) {
        if !v.trim().is_empty() {
            return Some(v);
        }
    }
    cfg.password
        .as_ref()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email_config() -> EmailConfig {
        EmailConfig {
            enabled: true,
            smtp_host: "smtp.example.com".to_string(),
            starttls: false,
            password_env: "ADAPTEC_REPORT_TEST_PASSWORD_UNSET".to_string(),
            from: "Adaptec report <reports@example.com>".to_string(),
            to: vec![
                "storage@example.com".to_string(),
                "oncall@example.com".to_string(),
            ],
            ..EmailConfig::default()
        }
    }

    #[test]
    fn message_is_html_with_all_recipients() {
        let sender = SmtpSender::new(&email_config()).expect("конфиг почты валиден");
        let message = sender
            .build_message("Adaptec report", "<h2>Adaptec report</h2>")
            .expect("письмо должно собираться");
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Subject: Adaptec report"));
        assert!(raw.contains("Content-Type: text/html"));
        assert!(raw.contains("storage@example.com"));
        assert!(raw.contains("oncall@example.com"));
    }

    #[test]
    fn bad_recipient_is_rejected() {
        let mut cfg = email_config();
        cfg.to = vec!["not an address".to_string()];
        let err = SmtpSender::new(&cfg).err().expect("адрес должен отклоняться");
        assert!(matches!(err, SendError::Address { .. }));
    }

    #[test]
    fn username_without_password_is_rejected() {
        let mut cfg = email_config();
        cfg.username = Some("reports".to_string());
        std::env::remove_var(&cfg.password_env);
        let err = SmtpSender::new(&cfg).err().expect("пароль обязателен");
        assert!(matches!(err, SendError::MissingPassword(_)));
    }

    #[tokio::test]
    async fn discard_sender_accepts_report() {
        DiscardSender
            .send("Adaptec report", "<h2>Adaptec report</h2>")
            .await
            .expect("выключенная почта не является ошибкой");
    }

    #[test]
    fn password_from_config_is_accepted() {
        let mut cfg = email_config();
        cfg.username = Some("reports".to_string());
        cfg.password = Some("secret".to_string());
        assert_eq!(resolve_password(&cfg).as_deref(), Some("secret"));
        assert!(SmtpSender::new(&cfg).is_ok());
    }
}
