#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::missing_crate_level_docs
)]

//! Command-line front end for bulk deliveries

use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use bulk_mailer::{
    domain::campaigns::{BulkMailer, CampaignSettings, CampaignSummary, Recipient, Template},
    infrastructure::{
        email::smtp::{SMTPConfig, SmtpTransport},
        logs::CsvDeliveryLog,
    },
};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Command-line arguments / environment variables
#[derive(Debug, Parser)]
pub struct Args {
    /// JSON file holding an array of recipients
    #[clap(long)]
    pub recipients: PathBuf,

    /// Subject template
    #[clap(long)]
    pub subject: String,

    /// File holding the HTML body template
    #[clap(long)]
    pub body: PathBuf,

    /// File holding a plain text body template
    #[clap(long)]
    pub plain_body: Option<PathBuf>,

    /// Render and log without sending anything
    #[clap(long)]
    pub dry_run: bool,

    /// Render for the first recipient, print it, and exit
    #[clap(long)]
    pub preview: bool,

    /// CSV file delivery results are appended to
    #[clap(long, env = "DELIVERY_LOG", default_value = "sent_log.csv")]
    pub log_file: PathBuf,

    /// Delivery settings
    #[clap(flatten)]
    pub campaign: CampaignSettings,

    /// SMTP connection options
    #[clap(flatten)]
    pub smtp: SMTPConfig,
}

impl Args {
    fn template(&self) -> Result<Template> {
        let body = fs::read_to_string(&self.body)
            .with_context(|| format!("failed to read {}", self.body.display()))?;

        let mut template = Template::new(&self.subject, body);

        if let Some(path) = &self.plain_body {
            let plain = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            template = template.with_plain_body(plain);
        }

        Ok(template)
    }

    fn recipients(&self) -> Result<Vec<Recipient>> {
        let raw = fs::read_to_string(&self.recipients)
            .with_context(|| format!("failed to read {}", self.recipients.display()))?;

        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", self.recipients.display()))
    }
}

#[mutants::skip]
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let template = args.template()?;
    let recipients = args.recipients()?;

    if args.preview {
        println!("{}", preview(&recipients, &template)?);

        return Ok(());
    }

    let mailer = BulkMailer::new(
        Arc::new(SmtpTransport::new(args.smtp.clone())),
        Arc::new(CsvDeliveryLog::new(&args.log_file)),
        &args.campaign,
    )?;

    let cancel = CancellationToken::new();

    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    info!(
        recipients = recipients.len(),
        dry_run = args.dry_run,
        log_file = %args.log_file.display(),
        "starting bulk delivery"
    );

    let results = mailer
        .send_bulk_until_cancelled(&recipients, &template, args.dry_run, &cancel)
        .await;

    let summary = CampaignSummary::from_results(&results);

    info!(%summary, "bulk delivery finished");

    if results.len() < recipients.len() {
        warn!(
            skipped = recipients.len() - results.len(),
            "bulk delivery was cancelled before every recipient was processed"
        );
    }

    println!("{summary}");

    Ok(())
}

/// Renders the template for the first recipient. Needs no SMTP settings.
fn preview(recipients: &[Recipient], template: &Template) -> Result<String> {
    let Some(recipient) = recipients.first() else {
        bail!("no recipients to preview");
    };

    let rendered = template.render(&recipient.template_fields())?;

    Ok(format!("Subject: {}\n\n{}", rendered.subject, rendered.body))
}

#[mutants::skip]
async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if signal::ctrl_c().await.is_ok() {
        warn!("received Ctrl-C, stopping after the current recipient");
        cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn test_preview_renders_first_recipient() -> TestResult {
        let recipients = vec![
            Recipient::new("ana@x.com", "Ana"),
            Recipient::new("bia@x.com", "Bia"),
        ];
        let template = Template::new("Olá, {nome}!", "<p>{email}</p>");

        let output = preview(&recipients, &template)?;

        assert_eq!(output, "Subject: Olá, Ana!\n\n<p>ana@x.com</p>");

        Ok(())
    }

    #[test]
    fn test_preview_without_recipients() {
        let template = Template::new("Olá, {nome}!", "<p>Oi</p>");

        assert!(preview(&[], &template).is_err());
    }

    #[test]
    fn test_preview_reports_missing_variable() {
        let recipients = vec![Recipient::new("ana@x.com", "Ana")];
        let template = Template::new("Olá, {nome}!", "<p>{cidade}</p>");

        let error = preview(&recipients, &template).unwrap_err();

        assert!(error.to_string().contains("cidade"));
    }

    #[test]
    fn test_preview_args_need_no_credentials() -> TestResult {
        let args = Args::try_parse_from([
            "bulk-mailer",
            "--recipients",
            "contatos.json",
            "--subject",
            "Olá",
            "--body",
            "corpo.html",
            "--preview",
        ])?;

        assert!(args.preview);

        Ok(())
    }
}
