//! Rendering analyses as text, JSON or CSV reports.

use anyhow::Result;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::models::{classify, LensType};
use crate::stats::{Analysis, FrequencyCounter, ReportSection, Scope};

/// Report format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReportFormat::Text => "Text",
            ReportFormat::Json => "JSON",
            ReportFormat::Csv => "CSV",
        }
    }
}

pub fn render(analysis: &Analysis, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(format_text(analysis)),
        ReportFormat::Json => Ok(serde_json::to_string_pretty(analysis)?),
        ReportFormat::Csv => format_csv(analysis),
    }
}

/// Render `analysis` into `output_path`, creating parent directories.
pub fn write_report(analysis: &Analysis, format: ReportFormat, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = render(analysis, format)?;
    let mut file = File::create(output_path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// `analysis_<name>.<ext>` under `output_dir`, with spaces and slashes in
/// the name replaced.
pub fn default_report_path(output_dir: &Path, analysis: &Analysis, format: ReportFormat) -> PathBuf {
    let safe_name = analysis.name.replace([' ', '/'], "_");
    output_dir.join(format!("analysis_{}.{}", safe_name, format.extension()))
}

fn percent(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

fn push_distribution(
    lines: &mut Vec<String>,
    title: &str,
    entries: Vec<(String, u64)>,
    total: u64,
    label: impl Fn(&str) -> String,
) {
    if entries.is_empty() {
        return;
    }
    lines.push(title.to_string());
    for (value, count) in entries {
        lines.push(format!(
            "  {}: {} times ({:.1}%)",
            label(&value),
            count,
            percent(count, total)
        ));
    }
}

fn by_key(counter: &FrequencyCounter) -> Vec<(String, u64)> {
    counter.iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// Plain-text report in the classic layout.
pub fn format_text(analysis: &Analysis) -> String {
    let stats = &analysis.statistics;
    let total = stats.total_photos;
    let rule = "=".repeat(80);
    let thin = "-".repeat(80);
    let mut lines = Vec::new();

    lines.push(format!("Analysis: {}", analysis.name));
    lines.push(rule.clone());

    for section in &analysis.sections {
        if let ReportSection::Scope { scope } = section {
            match scope {
                Scope::Category { name } => lines.push(format!("Category: {}", name)),
                Scope::Group { name, category } => {
                    if let Some(category) = category {
                        lines.push(format!("Category: {}", category));
                    }
                    lines.push(format!("Group: {}", name));
                }
                Scope::All | Scope::Sessions { .. } => {}
            }
        }
    }
    if let Some(filters) = analysis.active_filters() {
        for (field, values) in filters.iter() {
            lines.push(format!("Filter {}: {}", field, values.join(", ")));
        }
    }

    lines.push(format!("\nTotal photos analyzed: {}", total));
    lines.push(format!("\n{}", rule));

    lines.push("\nOVERALL METRICS".to_string());
    lines.push(thin.clone());

    match (analysis.hit_rate, analysis.total_raw_photos) {
        (Some(rate), Some(raw)) => {
            lines.push(format!("\nHit Rate: {:.2}%", rate));
            lines.push(format!("  Total: {}", total));
            lines.push(format!("  RAW: {}", raw));
            lines.push(format!("  Edited: {}", total));
        }
        _ => {
            lines.push("\nHit Rate: Unable to calculate".to_string());
            lines.push(format!("  Total: {}", total));
            lines.push("  RAW: N/A".to_string());
            lines.push(format!("  Edited: {}", total));
        }
    }

    // Same classifier as prime_count/zoom_count, so each list sums to its headline
    if !stats.lens_freq.is_empty() {
        let mut primes = Vec::new();
        let mut zooms = Vec::new();
        let mut unknown = Vec::new();
        for (lens, n) in stats.lens_freq.most_common(None) {
            match classify(&lens) {
                LensType::Prime => primes.push((lens, n)),
                LensType::Zoom => zooms.push((lens, n)),
                LensType::Unknown => unknown.push((lens, n)),
            }
        }
        let unknown_count: u64 = unknown.iter().map(|(_, n)| n).sum();

        lines.push("\nLens Type Distribution:".to_string());
        for (label, count, lenses) in [
            ("Prime", stats.prime_count, primes),
            ("Zoom", stats.zoom_count, zooms),
            ("Unclassified", unknown_count, unknown),
        ] {
            if count == 0 {
                continue;
            }
            lines.push(format!(
                "  {} Lenses: {} photos ({:.1}%)",
                label,
                count,
                percent(count, total)
            ));
            for (lens, n) in lenses {
                lines.push(format!("    - {}: {} photos", lens, n));
            }
        }
    }

    push_distribution(
        &mut lines,
        "\nOverall Shutter Speed Distribution:",
        stats.shutter_speed_freq.sorted_numerically(),
        total,
        |v| v.to_string(),
    );
    push_distribution(
        &mut lines,
        "\nOverall Aperture Distribution:",
        stats.aperture_freq.sorted_numerically(),
        total,
        |v| format!("f/{}", v),
    );
    push_distribution(
        &mut lines,
        "\nOverall ISO Distribution:",
        stats.iso_freq.sorted_numerically(),
        total,
        |v| format!("ISO {}", v),
    );
    push_distribution(
        &mut lines,
        "\nOverall Exposure Program Distribution:",
        by_key(&stats.exposure_program_freq),
        total,
        |v| v.to_string(),
    );
    push_distribution(
        &mut lines,
        "\nOverall Flash Mode Distribution:",
        by_key(&stats.flash_mode_freq),
        total,
        |v| v.to_string(),
    );

    if !stats.lens_breakdown.is_empty() {
        lines.push(format!("\n{}", rule));
        lines.push("DETAILED BREAKDOWN BY LENS".to_string());
        lines.push(rule.clone());

        for (lens, breakdown) in &stats.lens_breakdown {
            let count = breakdown.count;
            lines.push(format!("\n{}", thin));
            lines.push(format!("Lens: {} (Used {} times)", lens, count));
            lines.push(thin.clone());

            push_distribution(
                &mut lines,
                "Shutter Speeds:",
                breakdown.shutter_speed.sorted_numerically(),
                count,
                |v| v.to_string(),
            );
            push_distribution(
                &mut lines,
                "Apertures:",
                breakdown.aperture.sorted_numerically(),
                count,
                |v| format!("f/{}", v),
            );
            push_distribution(
                &mut lines,
                "ISOs:",
                breakdown.iso.sorted_numerically(),
                count,
                |v| format!("ISO {}", v),
            );
            push_distribution(
                &mut lines,
                "Exposure Programs:",
                by_key(&breakdown.exposure_program),
                count,
                |v| v.to_string(),
            );
            push_distribution(
                &mut lines,
                "Flash Modes:",
                by_key(&breakdown.flash_mode),
                count,
                |v| v.to_string(),
            );
        }
    }

    lines.join("\n")
}

/// One `table,value,count` row per counter entry.
pub fn format_csv(analysis: &Analysis) -> Result<String> {
    let stats = &analysis.statistics;
    let tables: [(&str, &FrequencyCounter); 10] = [
        ("lens", &stats.lens_freq),
        ("camera", &stats.camera_freq),
        ("shutter_speed", &stats.shutter_speed_freq),
        ("aperture", &stats.aperture_freq),
        ("iso", &stats.iso_freq),
        ("exposure_program", &stats.exposure_program_freq),
        ("flash_mode", &stats.flash_mode_freq),
        ("focal_length", &stats.focal_length_freq),
        ("exposure_bias", &stats.exposure_bias_freq),
        ("time_of_day", &stats.time_of_day_freq),
    ];

    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["table", "value", "count"])?;
    for (table, counter) in tables {
        for (value, count) in counter.sorted_numerically() {
            wtr.write_record([table, value.as_str(), count.to_string().as_str()])?;
        }
    }
    wtr.flush()?;

    let bytes = wtr.into_inner().map_err(|e| anyhow::anyhow!("{}", e))?;
    Ok(String::from_utf8(bytes)?)
}
