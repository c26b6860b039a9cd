//! relif-check: verifies that the hosted backend configuration is usable.

use std::fmt::Display;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use relif_core::error::RelifError;
use relif_db::{
    ClientConfig, DbError, HttpLegacyApi, LegacyApi, LegacyRequest, RestBackend, SupabaseClient,
    connect, connect_legacy, migration_script,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "relif-check", version, about = "Relif backend diagnostics")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Account used to verify sign-in; the check is skipped when unset.
    #[arg(long, env = "RELIF_CHECK_EMAIL")]
    email: Option<String>,

    #[arg(long, env = "RELIF_CHECK_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the connectivity checks (default).
    Check,
    /// Print the SQL migrations for the server-side procedures.
    Schema,
}

#[derive(Default)]
struct Report {
    passed: usize,
    failed: usize,
    warnings: usize,
}

impl Report {
    fn pass(&mut self, check: &str, detail: impl Display) {
        self.passed += 1;
        println!("PASS  {check}: {detail}");
    }

    fn fail(&mut self, check: &str, detail: impl Display) {
        self.failed += 1;
        println!("FAIL  {check}: {detail}");
    }

    fn warn(&mut self, check: &str, detail: impl Display) {
        self.warnings += 1;
        println!("WARN  {check}: {detail}");
    }

    fn ok(&self) -> bool {
        self.failed == 0
    }

    fn finish(&self) -> ExitCode {
        println!(
            "\n{} passed, {} failed, {} warnings",
            self.passed, self.failed, self.warnings
        );
        if self.ok() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("relif=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if std::env::var("RELIF_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn check_rest(client: &SupabaseClient<RestBackend>, report: &mut Report) -> bool {
    match client.from("organizations").select("id").range(0, 0).execute().await {
        Ok(output) => {
            debug!(rows = output.rows.len(), "REST probe answered");
            report.pass("rest", client.config().rest_url());
            true
        }
        Err(err) => {
            report.fail("rest", RelifError::from(err));
            false
        }
    }
}

async fn check_sign_in(
    client: &SupabaseClient<RestBackend>,
    email: &str,
    password: &str,
    report: &mut Report,
) {
    match client.sign_in(email, password).await {
        Ok(session) => {
            report.pass("auth", format!("signed in as {}", session.user.id));
            if let Err(err) = client.sign_out().await {
                report.warn("auth", format!("sign-out failed: {}", RelifError::from(err)));
            }
        }
        Err(err) => report.fail("auth", RelifError::from(err)),
    }
}

/// Any HTTP answer counts as reachable; only transport failures fail.
async fn check_legacy(api: &HttpLegacyApi, url: &str, report: &mut Report) {
    match api.request(LegacyRequest::get("")).await {
        Ok(_) => report.pass("legacy", url),
        Err(DbError::Legacy { status, .. }) => {
            report.pass("legacy", format!("{url} (HTTP {status})"))
        }
        Err(err) => report.fail("legacy", RelifError::from(err)),
    }
}

async fn run_checks(cli: &Cli) -> ExitCode {
    let mut report = Report::default();

    let config = match ClientConfig::from_env() {
        Ok(config) => {
            report.pass("config", format!("SUPABASE_URL={}", config.url));
            config
        }
        Err(err) => {
            report.fail("config", err);
            return report.finish();
        }
    };

    let client = match connect(config) {
        Ok(client) => client,
        Err(err) => {
            report.fail("connect", err);
            return report.finish();
        }
    };

    if check_rest(&client, &mut report).await {
        match (cli.email.as_deref(), cli.password.as_deref()) {
            (Some(email), Some(password)) => {
                check_sign_in(&client, email, password, &mut report).await
            }
            _ => report.warn("auth", "RELIF_CHECK_EMAIL/RELIF_CHECK_PASSWORD not set, skipped"),
        }
    }

    match connect_legacy(client.config(), client.session_store()) {
        Ok(Some(api)) => {
            let url = client.config().legacy_url.clone().unwrap_or_default();
            check_legacy(&api, &url, &mut report).await
        }
        Ok(None) => report.warn("legacy", "RELIF_LEGACY_API_URL not set, fallback disabled"),
        Err(err) => report.fail("legacy", err),
    }

    info!(
        passed = report.passed,
        failed = report.failed,
        warnings = report.warnings,
        "Checks finished"
    );
    report.finish()
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match &cli.command {
        Some(Command::Schema) => {
            println!("{}", migration_script());
            ExitCode::SUCCESS
        }
        Some(Command::Check) | None => run_checks(&cli).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_fails_only_on_failures() {
        let mut report = Report::default();
        report.pass("config", "ok");
        report.warn("legacy", "unset");
        assert!(report.ok());

        report.fail("rest", "unreachable");
        assert!(!report.ok());
        assert_eq!((report.passed, report.failed, report.warnings), (1, 1, 1));
    }

    #[test]
    fn schema_subcommand_parses() {
        let cli = Cli::parse_from(["relif-check", "schema"]);
        assert!(matches!(cli.command, Some(Command::Schema)));
        let cli = Cli::parse_from(["relif-check"]);
        assert!(cli.command.is_none());
    }
}
