//! Doctor command - verify API keys, directories, and provider configuration.

use crate::cli::Output;
use crate::config::Settings;
use crate::transcription::is_api_key_configured;
use console::style;
use url::Url;

/// Check result for a single item.
#[derive(Debug)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    message: String,
    hint: Option<String>,
}

#[derive(Debug, PartialEq)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Fortell Doctor");
    println!();
    println!("Checking configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Configuration").bold());
    checks.push(check_openai_key());
    checks.push(check_production(settings));
    for check in &checks {
        check.print();
    }

    println!();
    println!("{}", style("Directories").bold());
    let dir_check = check_temp_dir(settings);
    dir_check.print();
    checks.push(dir_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks
        .iter()
        .filter(|c| c.status == CheckStatus::Warning)
        .count();

    if errors > 0 {
        Output::error(&format!("{errors} error(s), {warnings} warning(s)"));
    } else if warnings > 0 {
        Output::warning(&format!("All required checks passed, {warnings} warning(s)"));
    } else {
        Output::success("All checks passed");
    }

    Ok(())
}

fn check_openai_key() -> CheckResult {
    if is_api_key_configured() {
        CheckResult::ok("OPENAI_API_KEY", "configured")
    } else {
        CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "export OPENAI_API_KEY=sk-... (required for transcription and enrichment)",
        )
    }
}

fn check_production(settings: &Settings) -> CheckResult {
    if Url::parse(&settings.production.endpoint).is_err() {
        return CheckResult::error(
            "Production endpoint",
            "not a valid URL",
            "set [production] endpoint in the config file",
        );
    }

    if settings.production.resolve_api_key().is_some() {
        CheckResult::ok("Production API", "endpoint and key configured")
    } else {
        CheckResult::warning(
            "Production API",
            "no API key",
            "set PRODUCTION_API_KEY or [production] api_key to enable /clean",
        )
    }
}

fn check_temp_dir(settings: &Settings) -> CheckResult {
    let dir = settings.temp_dir();

    if let Err(e) = std::fs::create_dir_all(&dir) {
        return CheckResult::error(
            "Temp directory",
            &format!("cannot create {}: {e}", dir.display()),
            "set [general] temp_dir to a writable path",
        );
    }

    let probe = dir.join(".fortell-doctor-probe");
    match std::fs::write(&probe, b"ok") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            CheckResult::ok("Temp directory", &format!("{} is writable", dir.display()))
        }
        Err(e) => CheckResult::error(
            "Temp directory",
            &format!("{} is not writable: {e}", dir.display()),
            "set [general] temp_dir to a writable path",
        ),
    }
}
