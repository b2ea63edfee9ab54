use anyhow::Result;
use clap::Parser;
use postmark_mailer::{
    domain::communication::{MailerSettings, ViewSelector},
    infrastructure::{
        email::postmark::PostmarkConfig, mailer::build_postmark_mailer, views::TemplateRegistry,
    },
};
use serde_json::json;

#[derive(Debug, Parser)]
pub struct Args {
    #[clap(flatten)]
    pub mailer: MailerSettings,

    #[clap(flatten)]
    pub postmark: PostmarkConfig,

    /// Sender of the report
    #[clap(long, env = "MAIL_FROM")]
    pub from: String,

    /// One line description of the failure
    #[clap(long, default_value = "Something went wrong")]
    pub summary: String,
}

#[mutants::skip]
#[tokio::main]
pub async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let view_root = args.mailer.view_path.clone().unwrap_or_default();
    let views = TemplateRegistry::with_bundled_templates(&view_root);

    let mut mailer = build_postmark_mailer(&args.mailer, &args.postmark, Some(views), None)?;

    let error_address = args.mailer.error_email_address.clone().unwrap_or_default();
    let environment = args.mailer.current_environment.clone().unwrap_or_default();

    let sent = mailer
        .set_from(&args.from, Some("Error Reporter"))
        .set_to(&error_address, None)
        .set_subject(&args.summary)
        .compose_from_views(
            &ViewSelector::html("error_report.html").with_text("error_report.txt"),
            &json!({
                "summary": args.summary,
                "environment": environment,
                "details": format!("reported by {}", env!("CARGO_PKG_NAME")),
            }),
        )
        .send()
        .await;

    println!("Error report sent: {sent}");

    Ok(())
}
