use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use lettre::message::{Mailbox, Message, MultiPart};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::ReportDelivery;
use crate::config::{resolve_secret, EmailConfig};

pub struct EmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
    subject: String,
    offset: FixedOffset,
}

impl EmailSender {
    pub fn from_config(cfg: &EmailConfig) -> Result<Self> {
        let user = resolve_secret(&cfg.username, "EMAIL_USER")?;
        let pass = resolve_secret(&cfg.password, "EMAIL_PASSWORD")?;
        let receivers = resolve_secret(&cfg.receivers, "EMAIL_RECEIVERS")?;

        let to = parse_receivers(&receivers)?;
        let from_addr = cfg.from.clone().unwrap_or_else(|| user.clone());
        let from: Mailbox = from_addr
            .parse()
            .with_context(|| format!("invalid sender address {from_addr:?}"))?;

        // `relay` uses implicit TLS.
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)
            .with_context(|| format!("invalid SMTP host {:?}", cfg.smtp_host))?
            .port(cfg.smtp_port)
            .credentials(Credentials::new(user, pass))
            .build();

        let offset = FixedOffset::east_opt(cfg.utc_offset_hours * 3600)
            .ok_or_else(|| anyhow!("utc_offset_hours out of range: {}", cfg.utc_offset_hours))?;

        Ok(Self {
            mailer,
            from,
            to,
            subject: cfg.subject.clone(),
            offset,
        })
    }

    pub fn receivers(&self) -> &[Mailbox] {
        &self.to
    }

    pub async fn send_report(&self, report: &str) -> Result<()> {
        let subject = subject_line(&self.subject, Utc::now(), self.offset);

        let mut builder = Message::builder().from(self.from.clone()).subject(subject);
        for rcpt in &self.to {
            builder = builder.to(rcpt.clone());
        }
        let msg = builder
            .multipart(MultiPart::alternative_plain_html(
                report.to_string(),
                render_html(report),
            ))
            .context("build email")?;

        self.mailer.send(msg).await.context("send email")?;
        Ok(())
    }
}

#[async_trait]
impl ReportDelivery for EmailSender {
    async fn deliver(&self, report: &str) -> bool {
        match self.send_report(report).await {
            Ok(()) => {
                tracing::info!(target: "notify", receivers = self.to.len(), "report emailed");
                true
            }
            Err(e) => {
                tracing::error!(target: "notify", error = ?e, "email delivery failed");
                false
            }
        }
    }

    fn name(&self) -> &'static str {
        "email"
    }
}

/// `[YYYY-MM-DD HH:MM] subject`, local to `offset`.
pub fn subject_line(subject: &str, now: DateTime<Utc>, offset: FixedOffset) -> String {
    format!(
        "[{}] {}",
        now.with_timezone(&offset).format("%Y-%m-%d %H:%M"),
        subject
    )
}

/// Escaped report text inside a pre-wrap container.
pub fn render_html(report: &str) -> String {
    format!(
        "<html><body><div style=\"white-space: pre-wrap; font-family: sans-serif; line-height: 1.5;\">{}</div></body></html>",
        html_escape::encode_text(report)
    )
}

fn parse_receivers(list: &str) -> Result<Vec<Mailbox>> {
    let mut out = Vec::new();
    for addr in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let mb: Mailbox = addr
            .parse()
            .with_context(|| format!("invalid receiver address {addr:?}"))?;
        out.push(mb);
    }
    if out.is_empty() {
        bail!("no email receivers configured");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn subject_uses_configured_offset() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 23, 30, 0).unwrap();
        let kst = FixedOffset::east_opt(9 * 3600).unwrap();
        assert_eq!(
            subject_line("News Briefing", now, kst),
            "[2026-10-18 08:30] News Briefing"
        );
    }

    #[test]
    fn html_body_escapes_markup() {
        let html = render_html("A <b>bold</b> & claim [1]");
        assert!(html.contains("A &lt;b&gt;bold&lt;/b&gt; &amp; claim [1]"));
        assert!(html.contains("pre-wrap"));
    }

    #[test]
    fn receivers_are_split_and_trimmed() {
        let rs = parse_receivers("a@example.com, b@example.com ,,").unwrap();
        assert_eq!(rs.len(), 2);
        assert_eq!(rs[1].email.to_string(), "b@example.com");
        assert!(parse_receivers(" , ").is_err());
        assert!(parse_receivers("not-an-address").is_err());
    }
}
