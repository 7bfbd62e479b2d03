use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use rand_chacha::ChaCha8Rng;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;

use timefill_core::{WeekPlanner, plan_rng};
use timefill_driver::artifacts::{artifacts_dir, capture_artifacts};
use timefill_driver::{
    BrowserConfig, BrowserKind, EntryDriver, EntryReport, PlanReport, ReportFormat,
    TimefillConfig, WebDriverSession, get_password, new_session, write_report,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RunMode {
    /// Generate and print the weekly plan (no browser)
    Plan,
    /// Generate the plan and enter it through the browser
    Submit,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum HeadlessMode {
    /// Run browsers in headless mode
    Headless,
    /// Run browsers with visible windows
    Windowed,
}

impl HeadlessMode {
    const fn is_headless(self) -> bool {
        matches!(self, Self::Headless)
    }
}

#[derive(Debug, Parser)]
#[command(name = "timefill", version = "0.1.0")]
#[command(about = "Generate plausible weekly timesheets and enter them through the browser")]
struct Args {
    /// JSON settings file; omitted fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run mode: plan (print only) or submit (drive the browser)
    #[arg(long, value_enum, default_value_t = RunMode::Plan)]
    mode: RunMode,

    /// Seed for a reproducible plan; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Number of days to generate
    #[arg(long)]
    days: Option<u32>,

    /// Minimum hours per day
    #[arg(long)]
    min_hours: Option<f64>,

    /// Maximum hours per day
    #[arg(long)]
    max_hours: Option<f64>,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Browser to drive in submit mode
    #[arg(long, value_enum, default_value_t = BrowserKind::Chrome)]
    browser: BrowserKind,

    /// Connect to a Selenium Grid hub instead of a local driver
    #[arg(long)]
    hub: Option<String>,

    /// Run headless where supported
    #[arg(long, value_enum, default_value_t = HeadlessMode::Headless)]
    headless: HeadlessMode,

    /// Login URL template; `{user}` and `{password}` are substituted
    #[arg(long)]
    base_url: Option<String>,

    /// SSO user name (defaults to $USER)
    #[arg(long)]
    user: Option<String>,

    /// Artifacts directory for screenshots and DOM dumps of failed submissions
    #[arg(long, default_value = "target/timefill-artifacts")]
    artifacts_dir: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = build_config(&args)?;
    if matches!(args.report, ReportFormat::Console) {
        announce_banner();
    }

    let planner = WeekPlanner::new(&config.allocation, &config.week)
        .context("invalid allocation settings")?;
    let mut rng = plan_rng(args.seed);

    match args.mode {
        RunMode::Plan => {
            let days = planner
                .plan_week(&mut rng)
                .context("generating the weekly plan")?;
            write_reports(&args, &PlanReport::new(&days, args.seed, false))
        }
        RunMode::Submit => {
            let entered = run_submission(&args, &config, &planner, &mut rng).await?;
            write_reports(&args, &PlanReport::new(&entered.days, args.seed, true))
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn announce_banner() {
    println!("{}", "⏱️  Timefill".bright_cyan().bold());
    println!("{}", "============".cyan());
}

fn build_config(args: &Args) -> Result<TimefillConfig> {
    let mut config = match &args.config {
        Some(path) => TimefillConfig::load(path)?,
        None => TimefillConfig::default(),
    };
    apply_overrides(args, &mut config);
    config.validate().context("invalid settings")?;
    Ok(config)
}

fn apply_overrides(args: &Args, config: &mut TimefillConfig) {
    if let Some(days) = args.days {
        config.week.days_in_week = days;
    }
    if let Some(min) = args.min_hours {
        config.week.min_daily_hours = min;
    }
    if let Some(max) = args.max_hours {
        config.week.max_daily_hours = max;
    }
    if let Some(url) = &args.base_url {
        config.selectors.login_url.clone_from(url);
    }
}

fn resolve_user(args: &Args) -> Result<String> {
    match &args.user {
        Some(user) => Ok(user.clone()),
        None => std::env::var("USER").context("--user not given and $USER is unset"),
    }
}

fn build_browser_config(args: &Args) -> BrowserConfig {
    BrowserConfig {
        headless: args.headless.is_headless(),
        remote_hub: args.hub.clone(),
        ..BrowserConfig::default()
    }
}

fn browser_label(kind: BrowserKind) -> String {
    format!("{kind:?}").to_lowercase()
}

async fn run_submission(
    args: &Args,
    config: &TimefillConfig,
    planner: &WeekPlanner,
    rng: &mut ChaCha8Rng,
) -> Result<EntryReport> {
    let user = resolve_user(args)?;
    let password = get_password(&user).context("looking up the SSO password")?;

    println!("{}", "🌐 Submitting timesheet".bright_blue().bold());
    println!("{}", "-".repeat(30).blue());

    let login_url = config
        .selectors
        .login_url(&user, &password)
        .context("building the login URL")?;
    let cfg = build_browser_config(args);
    let session = new_session(args.browser, &cfg)
        .await
        .with_context(|| format!("could not start {:?}", args.browser))?;

    match drive_session(&session, config, planner, rng, &login_url).await {
        Ok(report) => {
            close_session(session).await;
            println!("✅ Entered {} day(s)", report.days.len());
            Ok(report)
        }
        Err(e) => {
            eprintln!("❌ Submission failed: {e:#}");
            let dir = artifacts_dir(&args.artifacts_dir, &browser_label(args.browser), args.seed);
            match capture_artifacts(&session, &dir, &e).await {
                Ok(()) => eprintln!("Artifacts written to {}", dir.yellow()),
                Err(capture) => log::warn!("could not capture artifacts: {capture:#}"),
            }
            close_session(session).await;
            Err(e)
        }
    }
}

async fn close_session(session: WebDriverSession) {
    if let Err(e) = session.close().await {
        log::warn!("could not close the browser session: {e:#}");
    }
}

async fn drive_session(
    session: &WebDriverSession,
    config: &TimefillConfig,
    planner: &WeekPlanner,
    rng: &mut ChaCha8Rng,
    login_url: &str,
) -> Result<EntryReport> {
    log::info!("Opening the login page");
    session
        .navigate(login_url)
        .await
        .context("opening the login page")?;
    let mut driver = EntryDriver::new(session, config);
    let report = driver.submit_week(planner.days(rng)).await?;
    Ok(report)
}

fn write_reports(args: &Args, report: &PlanReport) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    write_report(output_target.writer(), args.report, report)?;
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
