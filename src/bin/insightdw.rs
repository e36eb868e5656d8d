use std::fs::File;
use std::io::BufReader;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use insightdw::{AnalyticsResult, InsightDW, InsightQuery, InsightType, Period, Priority, Status};

#[derive(Parser)]
#[command(name = "insightdw", about = "Insight store and analytics CLI")]
struct Cli {
    /// Database path (default: ~/.insightdw/insightdw.db)
    #[arg(long)]
    db: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import insights from a JSON array file
    Import {
        /// Path to the JSON file
        file: String,
    },
    /// Run the analytics engine over a period
    Analyze {
        /// Period (e.g. 30d, 2025-Q1, 2025-06, ytd); defaults to default_period
        #[arg(long)]
        period: Option<String>,
        /// Restrict to one project (exact name); defaults to default_project
        #[arg(long)]
        project: Option<String>,
        /// Evaluate as of this RFC 3339 instant instead of the current time
        #[arg(long)]
        now: Option<String>,
        /// Reject records with unknown type, priority, or status
        #[arg(long)]
        strict: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Query insights with filters
    Query {
        /// Filter by project (case-insensitive partial match)
        #[arg(long)]
        project: Option<String>,
        /// Filter by insight type (repeatable)
        #[arg(long = "type", value_name = "TYPE")]
        types: Vec<String>,
        /// Filter by priority (repeatable)
        #[arg(long = "priority", value_name = "PRIORITY")]
        priorities: Vec<String>,
        /// Filter by status (repeatable)
        #[arg(long = "status", value_name = "STATUS")]
        statuses: Vec<String>,
        /// Filter by assignee
        #[arg(long)]
        assignee: Option<String>,
        /// Only insights created within this period; defaults to default_period
        #[arg(long)]
        period: Option<String>,
        /// Maximum results
        #[arg(long, default_value = "100")]
        limit: u32,
        /// Skip this many results (for paging)
        #[arg(long, default_value = "0")]
        offset: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Output as CSV
        #[arg(long)]
        csv: bool,
        /// Count only (no output rows)
        #[arg(long)]
        count: bool,
    },
    /// List projects with insight counts
    Projects,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show store status
    Status,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let db = match &cli.db {
        Some(path) => insightdw::Database::open_at(path).await?,
        None => insightdw::Database::open().await?,
    };
    let dw = InsightDW::new(db);

    match cli.command {
        Commands::Import { file } => {
            let reader = BufReader::new(File::open(&file)?);
            let n = dw.import_json(reader).await?;
            println!("Imported {n} insights from {file}.");
        }
        Commands::Analyze {
            period,
            project,
            now,
            strict,
            json,
        } => {
            handle_analyze(&dw, period.as_deref(), project.as_deref(), now.as_deref(), strict, json)
                .await?;
        }
        Commands::Query {
            project,
            types,
            priorities,
            statuses,
            assignee,
            period,
            limit,
            offset,
            json,
            csv,
            count,
        } => {
            let mut builder = InsightQuery::new().limit(limit).offset(offset);
            if let Some(p) = project {
                builder = builder.project_contains(&p);
            }
            for t in &types {
                builder = builder.insight_type(InsightType::parse(t));
            }
            for p in &priorities {
                builder = builder.priority(Priority::parse(p));
            }
            for s in &statuses {
                builder = builder.status(Status::parse(s));
            }
            if let Some(a) = assignee {
                builder = builder.assignee(&a);
            }
            let period = match period {
                Some(p) => p,
                None => dw.settings().await?.default_period,
            };
            let (start, end) = Period::parse(&period, Utc::now().date_naive())?.window()?;
            builder = builder.created_between(start, end);
            handle_query(&dw, builder, json, csv, count).await?;
        }
        Commands::Projects => {
            let projects = dw.projects().await?;
            if projects.is_empty() {
                println!("No projects found.");
            }
            for (name, count) in projects {
                println!("{count:>6}  {name}");
            }
        }
        Commands::Config { action } => {
            handle_config(&dw, action).await?;
        }
        Commands::Status => {
            let count = dw.insight_count().await?;
            let projects = dw.projects().await?.len();
            let range = dw.created_range().await?;
            let last = dw.last_imported_at().await?;
            println!("Insight Store Status");
            println!("  Insights:    {count}");
            println!("  Projects:    {projects}");
            match range {
                Some((first, latest)) => println!("  Created:     {first} .. {latest}"),
                None => println!("  Created:     n/a"),
            }
            println!(
                "  Last import: {}",
                last.unwrap_or_else(|| "never".to_string())
            );
        }
    }

    Ok(())
}

async fn handle_analyze(
    dw: &InsightDW,
    period: Option<&str>,
    project: Option<&str>,
    now: Option<&str>,
    strict: bool,
    json: bool,
) -> anyhow::Result<()> {
    // The clock is read once here and threaded through.
    let now = match now {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| insightdw::Error::InvalidTimestamp(format!("{s}: {e}")))?,
        None => Utc::now(),
    };
    let period = match period {
        Some(p) => p.to_string(),
        None => dw.settings().await?.default_period,
    };
    let period = Period::parse(&period, now.date_naive())?;

    let result = dw.analyze(&period, project, now, strict).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Insight Analytics: {period} (as of {})", now.format("%Y-%m-%d %H:%M UTC"));
        print_report(&result);
    }
    Ok(())
}

async fn handle_query(
    dw: &InsightDW,
    builder: InsightQuery,
    json: bool,
    csv: bool,
    count: bool,
) -> anyhow::Result<()> {
    let db = dw.db();
    if count {
        let n = builder.count(db).await?;
        println!("{n}");
    } else if json {
        let output = builder.to_json(db).await?;
        println!("{output}");
    } else if csv {
        let output = builder.to_csv(db).await?;
        print!("{output}");
    } else {
        let rows = builder.records(db).await?;
        if rows.is_empty() {
            println!("No insights found.");
        } else {
            for row in &rows {
                let assignee = row.assignee().unwrap_or("unassigned");
                let project = row.project().unwrap_or("");
                let due = row
                    .due_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "no due date".to_string());
                println!(
                    "[{}/{}] {} ({}) - {} | {assignee} | {project} | due: {due}",
                    row.status, row.priority, row.title, row.id, row.insight_type
                );
            }
            println!("\n{} insights", rows.len());
        }
    }
    Ok(())
}

async fn handle_config(dw: &InsightDW, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => match dw.config_get(&key).await? {
            Some(v) => println!("{key} = {v}"),
            None => println!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            dw.config_set(&key, &value).await?;
            println!("Config updated.");
        }
        ConfigAction::List => {
            let items = dw.config_list().await?;
            if items.is_empty() {
                println!("No configuration set.");
            } else {
                for (k, v) in items {
                    println!("{k} = {v}");
                }
            }
        }
    }
    Ok(())
}

fn print_report(r: &AnalyticsResult) {
    let s = &r.summary;
    println!("  Summary:");
    println!("    Insights:        {}", s.total_insights);
    println!("    Critical (open): {}", s.critical_items);
    println!("    Overdue:         {}", s.overdue_items);
    println!("    Completion:      {:.1}%", s.completion_rate);
    println!("    Avg resolution:  {:.1} days", s.avg_resolution_time);
    println!("    Growth:          {:+.1}% week, {:+.1}% month", s.weekly_growth, s.monthly_growth);

    let b = &r.category_breakdown;
    println!("  Breakdown:");
    print_counts("By type", b.by_type.iter().map(|(k, v)| (k.to_string(), *v)));
    print_counts("By priority", b.by_priority.iter().map(|(k, v)| (k.to_string(), *v)));
    print_counts("By status", b.by_status.iter().map(|(k, v)| (k.to_string(), *v)));
    print_counts("By project", b.by_project.iter().map(|(k, v)| (k.clone(), *v)));

    println!("  Recent weeks:");
    let weekly = &r.trends.weekly;
    if weekly.is_empty() {
        println!("    No activity");
    }
    for w in &weekly[weekly.len().saturating_sub(4)..] {
        println!(
            "    {}  {:>4} created  {:>5.1}% done",
            w.week_start, w.count, w.completion_rate
        );
    }

    let p = &r.predictions;
    println!("  Predictions:");
    println!("    Velocity:   {}", p.velocity_trend.as_str());
    if p.expected_completion_time > 0.0 {
        println!("    Drain time: {:.1} days", p.expected_completion_time);
    } else {
        println!("    Drain time: n/a");
    }
    println!("    Risk score: {:.1}", p.risk_score);
    for bottleneck in &p.bottlenecks {
        println!("    Bottleneck: {bottleneck}");
    }

    if !r.team_metrics.is_empty() {
        println!("  Team:");
        for m in &r.team_metrics {
            println!(
                "    {:<20} {:>3} assigned {:>3} done {:>3} active {:>3} overdue  {:.1}d avg  {:.0}% eff",
                m.assignee, m.total_assigned, m.completed, m.in_progress, m.overdue,
                m.avg_completion_time, m.efficiency
            );
        }
    }

    if !r.project_health.is_empty() {
        println!("  Project Health:");
        for h in &r.project_health {
            let eta = h
                .estimated_completion_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!(
                "    {:<20} {:>5.1} health  {:<6} risk  {:>5.1}% done  {} blockers  {} critical  eta {eta}",
                h.project_name, h.health_score, h.risk_level.as_str(), h.completion_percentage,
                h.blockers, h.critical_issues
            );
        }
    }
}

fn print_counts(label: &str, counts: impl Iterator<Item = (String, u64)>) {
    let parts: Vec<String> = counts.map(|(k, v)| format!("{k}={v}")).collect();
    if !parts.is_empty() {
        println!("    {label}: {}", parts.join(", "));
    }
}
