use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::{self, Write};
use timefill_core::{Category, CategoryMap, DailyDistribution, Quarters};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayReport {
    pub day: usize,
    pub target_hours: Quarters,
    pub total_hours: Quarters,
    pub hours: CategoryMap,
}

/// A generated (or submitted) week, ready for output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub submitted: bool,
    pub total_hours: Quarters,
    pub days: Vec<DayReport>,
}

impl PlanReport {
    #[must_use]
    pub fn new(days: &[DailyDistribution], seed: Option<u64>, submitted: bool) -> Self {
        let days: Vec<DayReport> = days
            .iter()
            .enumerate()
            .map(|(index, day)| DayReport {
                day: index + 1,
                target_hours: day.target_hours,
                total_hours: day.total_hours(),
                hours: day.hours.clone(),
            })
            .collect();
        Self {
            seed,
            submitted,
            total_hours: days.iter().map(|d| d.total_hours).sum(),
            days,
        }
    }

    /// Every category appearing in the week, sorted.
    #[must_use]
    pub fn categories(&self) -> Vec<&Category> {
        self.days
            .iter()
            .flat_map(|day| day.hours.iter().map(|(category, _)| category))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn category_total(&self, category: &Category) -> Quarters {
        self.days
            .iter()
            .filter_map(|day| day.hours.get(category))
            .sum()
    }
}

/// Write `report` to `out` in the requested format.
///
/// # Errors
///
/// Returns an error if writing or JSON serialization fails.
pub fn write_report(out: &mut dyn Write, format: ReportFormat, report: &PlanReport) -> io::Result<()> {
    match format {
        ReportFormat::Console => generate_console_report(out, report),
        ReportFormat::Json => generate_json_report(out, report),
        ReportFormat::Markdown => generate_markdown_report(out, report),
        ReportFormat::Csv => generate_csv_report(out, report),
    }
}

pub fn generate_console_report(out: &mut dyn Write, report: &PlanReport) -> io::Result<()> {
    writeln!(out)?;
    let title = if report.submitted {
        "📝 Submitted Timesheet"
    } else {
        "📅 Weekly Timesheet Plan"
    };
    writeln!(out, "{}", title.bright_cyan().bold())?;
    writeln!(out, "{}", "========================".cyan())?;
    if let Some(seed) = report.seed {
        writeln!(out, "Seed: {seed}")?;
    }
    writeln!(out, "Days: {}", report.days.len())?;
    writeln!(out, "Total hours: {}", report.total_hours.to_string().green())?;
    writeln!(out)?;

    if report.days.is_empty() {
        writeln!(out, "No days planned.")?;
        return Ok(());
    }

    for day in &report.days {
        writeln!(
            out,
            "{} {} (target {})",
            format!("Day {}", day.day).bold(),
            day.total_hours.to_string().green(),
            day.target_hours
        )?;
        for (category, hours) in day.hours.iter() {
            writeln!(out, "   • {category}: {hours}")?;
        }
    }

    writeln!(out)?;
    writeln!(out, "{}", "⚖️  Category Totals".bright_yellow().bold())?;
    writeln!(out, "{}", "==================".yellow())?;
    for category in report.categories() {
        writeln!(out, "{category}: {}", report.category_total(category))?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, report: &PlanReport) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)
}

pub fn generate_markdown_report(out: &mut dyn Write, report: &PlanReport) -> io::Result<()> {
    writeln!(out, "# Timefill Weekly Plan\n")?;
    writeln!(out, "## Summary\n")?;
    if let Some(seed) = report.seed {
        writeln!(out, "- **Seed**: {seed}")?;
    }
    writeln!(out, "- **Days**: {}", report.days.len())?;
    writeln!(out, "- **Total hours**: {}", report.total_hours)?;
    writeln!(out, "- **Submitted**: {}\n", if report.submitted { "yes" } else { "no" })?;

    if report.days.is_empty() {
        writeln!(out, "_No days planned._")?;
        return Ok(());
    }

    let categories = report.categories();
    writeln!(out, "## Days\n")?;
    write!(out, "| Day | Target |")?;
    for category in &categories {
        write!(out, " {category} |")?;
    }
    writeln!(out, " Total |")?;
    write!(out, "|---|---|")?;
    for _ in &categories {
        write!(out, "---|")?;
    }
    writeln!(out, "---|")?;

    for day in &report.days {
        write!(out, "| {} | {} |", day.day, day.target_hours)?;
        for category in &categories {
            match day.hours.get(category) {
                Some(hours) => write!(out, " {hours} |")?,
                None => write!(out, " - |")?,
            }
        }
        writeln!(out, " {} |", day.total_hours)?;
    }
    Ok(())
}

pub fn generate_csv_report(out: &mut dyn Write, report: &PlanReport) -> io::Result<()> {
    writeln!(out, "day,category,hours,target_hours")?;
    for day in &report.days {
        for (category, hours) in day.hours.iter() {
            writeln!(out, "{},{},{},{}", day.day, category, hours, day.target_hours)?;
        }
    }
    Ok(())
}
