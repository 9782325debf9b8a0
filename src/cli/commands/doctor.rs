//! Doctor command - verify configuration and credentials.

use crate::cli::Output;
use crate::config::{Settings, VocabularyProvider};
use crate::dictionary::FileDictionary;
use crate::scheduler::{parse_timezone, DailySchedule};
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
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
    Output::header("Wordcast Doctor");
    println!();

    let sections = [
        ("Credentials", check_credentials(settings)),
        ("Schedule", vec![check_schedule(settings)]),
        ("Files", check_files(settings)),
    ];

    let mut errors = 0;
    let mut warnings = 0;
    for (title, checks) in &sections {
        println!("{}", style(title).bold());
        for check in checks {
            check.print();
            match check.status {
                CheckStatus::Error => errors += 1,
                CheckStatus::Warning => warnings += 1,
                CheckStatus::Ok => {}
            }
        }
        println!();
    }

    if errors > 0 {
        Output::error(&format!("{} error(s) found. Fix them before running the bot.", errors));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Wordcast is ready.");
    }

    Ok(())
}

fn check_credentials(settings: &Settings) -> Vec<CheckResult> {
    let mut results = vec![check_secret(
        "Telegram bot token",
        settings.telegram.bot_token.as_deref(),
        "Set with: export TG_BOT_TOKEN='123:abc'",
    )];

    results.push(if settings.telegram.allowed_user_ids.is_empty() {
        CheckResult::warning(
            "Allowed users",
            "none",
            "Privileged commands are refused. Set with: export TG_IDS='12345,67890'",
        )
    } else {
        CheckResult::ok(
            "Allowed users",
            &format!("{} user(s)", settings.telegram.allowed_user_ids.len()),
        )
    });

    results.push(match settings.vocabulary.provider {
        VocabularyProvider::Eudic => check_secret(
            "Eudic token",
            settings.vocabulary.token.as_deref(),
            "Set with: export EUDIC_TOKEN='NIS ...'",
        ),
        VocabularyProvider::Memory => CheckResult::warning(
            "Vocabulary",
            "in-memory list",
            "Words are lost on restart; set vocabulary.provider = \"eudic\"",
        ),
    });

    results.push(check_secret(
        "OpenAI API key",
        settings.llm.api_key.as_deref(),
        "Set with: export OPENAI_API_KEY='sk-...'",
    ));

    results.push(match settings.publish.access_token.as_deref() {
        Some(token) if !token.is_empty() => {
            CheckResult::ok("Telegraph token", &format!("configured ({})", mask(token)))
        }
        _ => CheckResult::ok("Telegraph token", "an account is created on first publish"),
    });

    results
}

fn check_secret(name: &str, value: Option<&str>, hint: &str) -> CheckResult {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => CheckResult::ok(name, &format!("configured ({})", mask(v))),
        Some(_) => CheckResult::error(name, "empty", hint),
        None => CheckResult::error(name, "not set", hint),
    }
}

fn check_schedule(settings: &Settings) -> CheckResult {
    let schedule = &settings.schedule;
    if let Err(e) = parse_timezone(&schedule.timezone) {
        return CheckResult::error("Timezone", &e.to_string(), "Use an IANA name such as Asia/Shanghai");
    }
    match DailySchedule::random(schedule, &mut rand::rng()) {
        Ok(daily) => CheckResult::ok(
            "Daily runs",
            &format!(
                "{} per day between {}:{:02} and {}:{:02} ({})",
                daily.times().len(),
                schedule.start_hour,
                schedule.minute_min,
                schedule.end_hour,
                schedule.minute_max,
                schedule.timezone
            ),
        ),
        Err(e) => CheckResult::error("Daily runs", &e.to_string(), "Check the [schedule] section"),
    }
}

fn check_files(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let temp_dir = settings.temp_dir();
    let writable = std::fs::create_dir_all(&temp_dir)
        .and_then(|_| tempfile::tempfile_in(&temp_dir))
        .map(|_| ());
    results.push(match writable {
        Ok(()) => CheckResult::ok("Temp directory", &temp_dir.display().to_string()),
        Err(e) => CheckResult::error(
            "Temp directory",
            &format!("{} ({})", temp_dir.display(), e),
            "Audio files are written here; set general.temp_dir",
        ),
    });

    results.push(match settings.dictionary_path() {
        None => CheckResult::ok("Dictionary", "not configured"),
        Some(path) => match FileDictionary::load(&path) {
            Ok(dict) => CheckResult::ok(
                "Dictionary",
                &format!("{} ({} entries)", path.display(), dict.len()),
            ),
            Err(e) => CheckResult::error(
                "Dictionary",
                &format!("{}: {}", path.display(), e),
                "Expected a TSV file of word<TAB>definition lines",
            ),
        },
    });

    let config_path = Settings::default_config_path();
    results.push(if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: wordcast config init",
        )
    });

    results
}

/// Show only the ends of a secret.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
