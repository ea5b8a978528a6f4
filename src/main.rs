use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use photowrapped::config::Config;
use photowrapped::db::{Database, SessionUpdate};
use photowrapped::logging::{self, LogTarget};
use photowrapped::report::{self, ReportFormat};
use photowrapped::scanner::{self, CrawlRequest, ExtractRequest};
use photowrapped::stats::{
    monthly_trends, AnalysisRequest, Analyzer, FilterSpec, LensUsageSummary, Scope,
};
use photowrapped::tasks::{NoProgress, ProgressSink, TaskUpdate};

#[derive(Debug, Parser)]
#[command(name = "photowrapped", version, about = "EXIF statistics for photography sessions")]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/photowrapped/config.toml)
    #[arg(short, long, global = true, env = "PHOTOWRAPPED_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ingest one folder of edited photos as a session
    Extract {
        folder: PathBuf,
        /// Session name (default: the folder name)
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Session date, YYYY-MM-DD (default: earliest photo date)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// RAW folder (default: a sibling named like one)
        #[arg(long)]
        raw_folder: Option<PathBuf>,
    },

    /// Ingest every folder with a given name below a parent directory
    Crawl {
        parent_dir: PathBuf,
        #[arg(long, default_value = scanner::DEFAULT_TARGET_FOLDER)]
        target: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Analyse sessions and print or save a report
    Analyze {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        group: Option<String>,
        /// Session ids; takes precedence over category/group
        #[arg(long = "session", value_name = "ID", num_args = 1..)]
        sessions: Vec<i64>,
        /// Filter as key=value, repeatable (e.g. --filter aperture=1.4)
        #[arg(long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,
        /// Analysis name (default: derived from the scope)
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_enum, default_value = "text")]
        format: ReportFormat,
        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Write the report into the configured reports directory
        #[arg(long, conflicts_with = "output")]
        save: bool,
    },

    /// List sessions
    Sessions {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        group: Option<String>,
    },

    /// Update a session's name, category, group or RAW count
    UpdateSession {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        raw: Option<i64>,
    },

    /// Totals plus category and group rollups, as JSON
    Overview,

    /// Lens usage summary, as JSON (all sessions unless scoped)
    Lenses {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        group: Option<String>,
    },

    /// Month-by-month trends for a category and group, as JSON
    Trends {
        #[arg(long)]
        category: String,
        #[arg(long)]
        group: String,
    },

    /// Delete one session and its photos
    DeleteSession { id: i64 },

    /// Delete all sessions in the given categories
    DeleteCategory {
        #[arg(required = true)]
        categories: Vec<String>,
    },

    /// Delete all sessions in the given groups
    DeleteGroup {
        #[arg(required = true)]
        groups: Vec<String>,
    },

    /// Delete every session, photo and lens
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

/// Progress reported through the log.
struct LogProgress;

impl ProgressSink for LogProgress {
    fn send(&self, update: TaskUpdate) {
        match update {
            TaskUpdate::Started { total } => info!("Started ({} steps)", total),
            TaskUpdate::Progress(p) => info!(
                "[{}/{}] {}",
                p.current,
                p.total,
                p.message.unwrap_or_default()
            ),
            TaskUpdate::Completed { message } => info!("{}", message),
            TaskUpdate::Failed { error } => tracing::error!("{}", error),
        }
    }
}

fn scope_from_args(category: Option<String>, group: Option<String>, sessions: Vec<i64>) -> Scope {
    if !sessions.is_empty() {
        Scope::Sessions { ids: sessions }
    } else if let Some(name) = group {
        Scope::Group { name, category }
    } else if let Some(name) = category {
        Scope::Category { name }
    } else {
        Scope::All
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_rate(rate: Option<f64>) -> String {
    rate.map(|r| format!("{:.1}%", r))
        .unwrap_or_else(|| "-".to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(LogTarget::Stderr)?;

    let config = Config::load(cli.config.as_deref())?;
    let db = Database::open(&config.db_path)?;
    db.initialize().context("initializing database schema")?;

    match cli.command {
        Command::Extract {
            folder,
            name,
            category,
            group,
            description,
            date,
            raw_folder,
        } => {
            let request = ExtractRequest {
                folder,
                session_name: name,
                category,
                group,
                description,
                date,
                raw_folder,
            };
            let outcome = scanner::extract_folder(&db, &config.scanner, &request, &LogProgress)?;
            let session = &outcome.session;
            if outcome.created {
                println!(
                    "Created session {} (ID {}): {} photos, hit rate {}",
                    session.name,
                    session.id,
                    session.total_photos,
                    format_rate(session.hit_rate)
                );
            } else {
                println!("Session {} already exists (ID {})", session.name, session.id);
            }
        }

        Command::Crawl {
            parent_dir,
            target,
            category,
            group,
            description,
            date,
        } => {
            let request = CrawlRequest {
                parent_dir,
                target_folder: target,
                category,
                group,
                description,
                date,
            };
            let summary = scanner::crawl(&db, &config.scanner, &request, &LogProgress)?;
            for result in &summary.sessions {
                match (&result.session_name, &result.error) {
                    (Some(name), _) => println!(
                        "  ok    {} ({} photos, hit rate {})",
                        name,
                        result.total_photos.unwrap_or(0),
                        format_rate(result.hit_rate)
                    ),
                    (None, error) => println!(
                        "  fail  {}: {}",
                        result.folder,
                        error.as_deref().unwrap_or("unknown error")
                    ),
                }
            }
            println!(
                "{} folders: {} extracted, {} failed",
                summary.total, summary.successful, summary.failed
            );
        }

        Command::Analyze {
            category,
            group,
            sessions,
            filters,
            name,
            format,
            output,
            save,
        } => {
            let mut spec = FilterSpec::new();
            for pair in &filters {
                spec.push_pair(pair)?;
            }
            let request = AnalysisRequest {
                scope: scope_from_args(category, group, sessions),
                filters: spec,
                name,
            };
            let analysis = Analyzer::new(&db).analyze(&request, &LogProgress)?;

            let output = if save {
                Some(report::default_report_path(
                    &config.reports.output_dir,
                    &analysis,
                    format,
                ))
            } else {
                output
            };
            match output {
                Some(path) => {
                    report::write_report(&analysis, format, &path)?;
                    println!("{} report written to {}", format.name(), path.display());
                }
                None => println!("{}", report::render(&analysis, format)?),
            }
        }

        Command::Sessions { category, group } => {
            let sessions = db.list_sessions(category.as_deref(), group.as_deref())?;
            println!(
                "{:>5}  {:<32} {:<16} {:<16} {:>10} {:>6} {:>7} {:>8}",
                "ID", "NAME", "CATEGORY", "GROUP", "DATE", "PHOTOS", "RAW", "HIT"
            );
            for s in &sessions {
                println!(
                    "{:>5}  {:<32} {:<16} {:<16} {:>10} {:>6} {:>7} {:>8}",
                    s.id,
                    s.name,
                    s.effective_category(),
                    s.effective_group(),
                    s.date.map(|d| d.to_string()).unwrap_or_default(),
                    s.total_photos,
                    s.total_raw_photos
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    format_rate(s.hit_rate)
                );
            }
            println!("{} sessions", sessions.len());
        }

        Command::UpdateSession {
            id,
            name,
            category,
            group,
            raw,
        } => {
            let update = SessionUpdate {
                name,
                category,
                group,
                total_raw_photos: raw,
            };
            match db.update_session(id, &update)? {
                Some(session) => println!(
                    "Updated session {} (ID {}), hit rate {}",
                    session.name,
                    session.id,
                    format_rate(session.hit_rate)
                ),
                None => bail!("Session {} not found", id),
            }
        }

        Command::Overview => print_json(&db.overview()?)?,

        Command::Lenses { category, group } => {
            if category.is_none() && group.is_none() {
                print_json(&db.lens_usage_summary()?)?;
            } else {
                let request = AnalysisRequest::new(scope_from_args(category, group, Vec::new()));
                let analysis = Analyzer::new(&db).analyze(&request, &NoProgress)?;
                print_json(&LensUsageSummary::from_analysis(&analysis))?;
            }
        }

        Command::Trends { category, group } => {
            let sessions = db.list_sessions(Some(&category), Some(&group))?;
            if sessions.is_empty() {
                bail!("No sessions found for {} / {}", category, group);
            }
            let ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
            let photos = db.get_photos_for_sessions(&ids)?;
            print_json(&monthly_trends(&sessions, &photos))?;
        }

        Command::DeleteSession { id } => {
            if !db.delete_session(id)? {
                bail!("Session {} not found", id);
            }
            println!("Deleted session {}", id);
        }

        Command::DeleteCategory { categories } => {
            let deleted = db.delete_sessions_by_categories(&categories)?;
            println!(
                "Deleted {} sessions ({} photos)",
                deleted.sessions, deleted.photos
            );
        }

        Command::DeleteGroup { groups } => {
            let deleted = db.delete_sessions_by_groups(&groups)?;
            println!(
                "Deleted {} sessions ({} photos)",
                deleted.sessions, deleted.photos
            );
        }

        Command::Reset { yes } => {
            if !yes {
                bail!("Refusing to reset without --yes");
            }
            let deleted = db.reset()?;
            println!(
                "Deleted {} sessions, {} photos, {} lenses",
                deleted.sessions, deleted.photos, deleted.lenses
            );
        }
    }

    Ok(())
}
