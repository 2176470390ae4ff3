use anyhow::Context;
use clap::{Parser, Subcommand};
use chrono::NaiveDate;

use chronos_cli::api::{CreateEntryRequest, EntriesQuery, UpdateUserRequest};
use chronos_cli::date_util::{end_of_day, start_of_day};
use chronos_cli::{
    Chronos, Database, DashboardData, DateRange, Direction, Period, PeriodKind, WeekDay,
};

#[derive(Parser)]
#[command(name = "chronos", about = "Chronos time tracking CLI")]
struct Cli {
    /// Database path (default: ~/.chronos/chronos.db)
    #[arg(long)]
    db: Option<String>,

    /// API base URL (default: $CHRONOS_API_URL, stored config, or http://127.0.0.1:8000)
    #[arg(long)]
    api_url: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session locally
    Login {
        /// Account email
        #[arg(long)]
        username: String,
        /// Account password (or set $CHRONOS_PASSWORD)
        #[arg(long, env = "CHRONOS_PASSWORD")]
        password: String,
    },
    /// Create an account and log in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CHRONOS_PASSWORD")]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// Birth date (YYYY-MM-DD)
        #[arg(long)]
        birth_date: String,
    },
    /// Clear the stored session
    Logout,
    /// Set work-hour goals and working days (first-run setup)
    Onboarding {
        /// Monthly goal in hours
        #[arg(long)]
        monthly_goal: f64,
        /// Daily goal in hours
        #[arg(long)]
        daily_goal: f64,
        /// Comma-separated working days, e.g. monday,tuesday,friday
        #[arg(long)]
        work_days: String,
    },
    /// Show the cached profile
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update profile settings (only the flags you pass are changed)
    Settings {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        /// Monthly goal in hours
        #[arg(long)]
        monthly_goal: Option<f64>,
        /// Daily goal in hours
        #[arg(long)]
        daily_goal: Option<f64>,
        /// Comma-separated working days
        #[arg(long)]
        work_days: Option<String>,
        /// UI theme name stored on the account
        #[arg(long)]
        theme: Option<String>,
    },
    /// Show the dashboard for a period
    Dashboard {
        /// Period: daily, weekly, biweekly, monthly, quarterly, yearly,
        /// or an explicit anchor like 2025, 2025-02, 2025-Q3
        #[arg(default_value = "monthly")]
        period: String,
        /// Navigate N periods forward (negative = back)
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        shift: i32,
        /// Custom range start (YYYY-MM-DD); requires --to
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Custom range end (YYYY-MM-DD); requires --from
        #[arg(long, requires = "from")]
        to: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage time entries
    Entries {
        #[command(subcommand)]
        action: EntriesAction,
    },
    /// Manage projects
    Projects {
        #[command(subcommand)]
        action: ProjectsAction,
    },
    /// Manage client configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum EntriesAction {
    /// List entries, optionally filtered to a period or range
    List {
        /// Period filter (same formats as `dashboard`)
        #[arg(long)]
        period: Option<String>,
        /// Range start (YYYY-MM-DD); requires --to
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Range end (YYYY-MM-DD); requires --from
        #[arg(long, requires = "from")]
        to: Option<String>,
        /// Search in title/description
        #[arg(long)]
        search: Option<String>,
        /// Maximum results
        #[arg(long, default_value = "10")]
        limit: u32,
        /// Results offset for pagination
        #[arg(long, default_value = "0")]
        offset: u32,
        /// Include the total entry count
        #[arg(long)]
        total: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a new entry
    Add {
        /// Entry date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Start time (HH:MM)
        #[arg(long)]
        start: String,
        /// End time (HH:MM)
        #[arg(long)]
        end: String,
        /// Break start time (HH:MM)
        #[arg(long, requires = "break_end")]
        break_start: Option<String>,
        /// Break end time (HH:MM)
        #[arg(long, requires = "break_start")]
        break_end: Option<String>,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Project id (see `projects list`)
        #[arg(long)]
        project: i64,
    },
    /// Replace an existing entry
    Edit {
        /// Entry id
        id: i64,
        #[arg(long)]
        date: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long, requires = "break_end")]
        break_start: Option<String>,
        #[arg(long, requires = "break_start")]
        break_end: Option<String>,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        project: i64,
    },
    /// Delete an entry
    Delete {
        /// Entry id
        id: i64,
    },
}

#[derive(Subcommand)]
enum ProjectsAction {
    /// List projects
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a project
    Add { name: String },
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
        Some(path) => Database::open_at(path).await?,
        None => Database::open().await?,
    };

    let base_url = resolve_api_url(cli.api_url.as_deref(), &db).await?;
    let mut app = Chronos::connect(db, &base_url).await?;

    match cli.command {
        Commands::Login { username, password } => {
            let profile = app.login(&username, &password).await?;
            println!("Logged in as {} <{}>", profile.display_name(), profile.email);
            if app.is_first_access().await? {
                println!("First access: run 'chronos onboarding' to set your goals.");
            }
        }
        Commands::Register {
            email,
            password,
            first_name,
            last_name,
            birth_date,
        } => {
            parse_date(&birth_date)?;
            let profile = app
                .register(&chronos_cli::api::RegisterRequest {
                    birth_date,
                    first_name,
                    last_name,
                    email,
                    password,
                })
                .await?;
            println!("Registered and logged in as {}", profile.email);
            println!("Run 'chronos onboarding' to set your goals.");
        }
        Commands::Logout => {
            app.logout().await?;
            println!("Logged out.");
        }
        Commands::Onboarding {
            monthly_goal,
            daily_goal,
            work_days,
        } => {
            let days = parse_work_days(&work_days)?;
            app.complete_onboarding(monthly_goal, daily_goal, &days)
                .await?;
            println!(
                "Goals saved: {monthly_goal}h/month, {daily_goal}h/day on {}",
                work_days
            );
        }
        Commands::Whoami { json } => {
            let profile = app
                .profile()
                .await?
                .context("not logged in; run 'chronos login' first")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                println!("{} <{}>", profile.display_name(), profile.email);
                if let Some(goal) = profile.monthly_goal {
                    println!("  Monthly goal: {goal}h");
                }
                if let Some(goal) = profile.daily_goal {
                    println!("  Daily goal:   {goal}h");
                }
                if let Some(days) = &profile.week_days_list {
                    println!("  Work days:    {}", days.join(", "));
                }
            }
        }
        Commands::Settings {
            first_name,
            last_name,
            monthly_goal,
            daily_goal,
            work_days,
            theme,
        } => {
            let week_days_list = work_days
                .as_deref()
                .map(parse_work_days)
                .transpose()?
                .map(|days| days.iter().map(|d| d.as_str().to_string()).collect());
            let req = UpdateUserRequest {
                first_name,
                last_name,
                monthly_goal,
                daily_goal,
                week_days_list,
                theme,
            };
            app.update_user(&req).await?;
            println!("Settings updated.");
        }
        Commands::Dashboard {
            period,
            shift,
            from,
            to,
            json,
        } => {
            let now = chrono::Local::now().naive_local();
            let period = match (&from, &to) {
                (Some(from), Some(to)) => Period::Custom(DateRange::new(
                    start_of_day(parse_date(from)?),
                    end_of_day(parse_date(to)?),
                )?),
                _ => Period::parse(&period, now.date())?,
            };
            let mut range = period.date_range(now);
            let direction = if shift < 0 {
                Direction::Prev
            } else {
                Direction::Next
            };
            for _ in 0..shift.unsigned_abs() {
                range = range.navigate(direction);
            }

            let data = app.dashboard(&range, now.date()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                print_dashboard(&period, &range, &data);
            }
        }
        Commands::Entries { action } => handle_entries(&app, action).await?,
        Commands::Projects { action } => handle_projects(&app, action).await?,
        Commands::Config { action } => match action {
            ConfigAction::Get { key } => match app.db().get_config(&key).await? {
                Some(value) => println!("{value}"),
                None => println!("(not set)"),
            },
            ConfigAction::Set { key, value } => {
                app.db().set_config(&key, &value).await?;
            }
            ConfigAction::List => {
                let all = app
                    .db()
                    .reader()
                    .call(|conn| chronos_cli::storage::repository::list_config(conn))
                    .await
                    .map_err(chronos_cli::Error::from)?;
                for (key, value) in all {
                    println!("{key} = {value}");
                }
            }
        },
    }

    Ok(())
}

/// Flag > environment > stored config > default.
async fn resolve_api_url(flag: Option<&str>, db: &Database) -> anyhow::Result<String> {
    if let Some(url) = flag {
        return Ok(url.to_string());
    }
    if let Ok(url) = std::env::var("CHRONOS_API_URL") {
        if !url.is_empty() {
            return Ok(url);
        }
    }
    if let Some(url) = db.get_config("api_url").await? {
        return Ok(url);
    }
    Ok(chronos_cli::api::DEFAULT_BASE_URL.to_string())
}

fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date: {s}"))
}

fn parse_time(s: &str) -> anyhow::Result<chrono::NaiveTime> {
    chrono::NaiveTime::parse_from_str(s, "%H:%M").with_context(|| format!("invalid time: {s}"))
}

fn parse_work_days(s: &str) -> anyhow::Result<Vec<WeekDay>> {
    s.split(',')
        .filter(|p| !p.trim().is_empty())
        .map(|p| p.parse::<WeekDay>().map_err(Into::into))
        .collect()
}

/// Combine a date and an HH:MM time into the backend's datetime format.
fn entry_datetime(date: &str, time: &str) -> anyhow::Result<String> {
    let date = parse_date(date)?;
    let time = parse_time(time)?;
    Ok(format!("{date}T{}", time.format("%H:%M:%S")))
}

#[allow(clippy::too_many_arguments)]
fn build_entry_request(
    date: &str,
    start: &str,
    end: &str,
    break_start: Option<&str>,
    break_end: Option<&str>,
    title: String,
    description: String,
    project: i64,
) -> anyhow::Result<CreateEntryRequest> {
    Ok(CreateEntryRequest {
        date: parse_date(date)?.to_string(),
        datm_start: entry_datetime(date, start)?,
        datm_end: entry_datetime(date, end)?,
        datm_interval_start: break_start
            .map(|t| entry_datetime(date, t))
            .transpose()?,
        datm_interval_end: break_end.map(|t| entry_datetime(date, t)).transpose()?,
        title,
        description,
        project_id: project,
    })
}

async fn handle_entries(app: &Chronos, action: EntriesAction) -> anyhow::Result<()> {
    match action {
        EntriesAction::List {
            period,
            from,
            to,
            search,
            limit,
            offset,
            total,
            json,
        } => {
            let range = match (&from, &to, &period) {
                (Some(from), Some(to), _) => Some(DateRange::new(
                    start_of_day(parse_date(from)?),
                    end_of_day(parse_date(to)?),
                )?),
                (_, _, Some(p)) => {
                    let now = chrono::Local::now().naive_local();
                    Some(Period::parse(p, now.date())?.date_range(now))
                }
                _ => None,
            };
            let query = EntriesQuery {
                dat_start: range.map(|r| r.start.date().to_string()),
                dat_end: range.map(|r| r.end.date().to_string()),
                search,
                limit: Some(limit),
                offset: Some(offset),
                require_total_count: total,
            };
            let (entries, total_count) = app.entries(&query).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                if entries.is_empty() {
                    println!("No entries.");
                }
                for e in &entries {
                    println!(
                        "{:>6}  {}  {:>6.1}h  {:<20}  {}",
                        e.id,
                        e.entry_date,
                        e.duration as f64 / 3600.0,
                        truncate(&e.project_name, 20),
                        e.title
                    );
                }
                if let Some(count) = total_count {
                    println!("Total entries: {count}");
                }
            }
        }
        EntriesAction::Add {
            date,
            start,
            end,
            break_start,
            break_end,
            title,
            description,
            project,
        } => {
            let req = build_entry_request(
                &date,
                &start,
                &end,
                break_start.as_deref(),
                break_end.as_deref(),
                title,
                description,
                project,
            )?;
            app.create_entry(&req).await?;
            println!("Entry logged for {date}.");
        }
        EntriesAction::Edit {
            id,
            date,
            start,
            end,
            break_start,
            break_end,
            title,
            description,
            project,
        } => {
            let req = build_entry_request(
                &date,
                &start,
                &end,
                break_start.as_deref(),
                break_end.as_deref(),
                title,
                description,
                project,
            )?;
            app.update_entry(id, &req).await?;
            println!("Entry {id} updated.");
        }
        EntriesAction::Delete { id } => {
            app.delete_entry(id).await?;
            println!("Entry {id} deleted.");
        }
    }
    Ok(())
}

async fn handle_projects(app: &Chronos, action: ProjectsAction) -> anyhow::Result<()> {
    match action {
        ProjectsAction::List { json } => {
            let projects = app.projects().await?;
            if json {
                let value: Vec<serde_json::Value> = projects
                    .iter()
                    .map(|p| serde_json::json!({"id": p.id, "name": p.name}))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else if projects.is_empty() {
                println!("No projects. Create one with 'chronos projects add <name>'.");
            } else {
                for p in &projects {
                    println!("{:>6}  {}", p.id, p.name);
                }
            }
        }
        ProjectsAction::Add { name } => {
            app.create_project(&name).await?;
            println!("Project '{name}' created.");
        }
    }
    Ok(())
}

/// Scale the profile goals to the selected period for the progress line.
fn period_goal_hours(kind: PeriodKind, cards: &chronos_cli::api::CardsData) -> Option<f64> {
    let goal = match kind {
        PeriodKind::Daily => cards.daily_goal,
        PeriodKind::Weekly => cards.daily_goal * 7.0,
        PeriodKind::Biweekly => cards.daily_goal * 14.0,
        PeriodKind::Monthly => cards.monthly_goal,
        PeriodKind::Quarterly => cards.monthly_goal * 3.0,
        PeriodKind::Yearly => cards.monthly_goal * 12.0,
        PeriodKind::Custom => return None,
    };
    (goal > 0.0).then_some(goal)
}

fn print_dashboard(period: &Period, range: &DateRange, data: &DashboardData) {
    println!(
        "Dashboard {} ({} to {})",
        period,
        range.start.date(),
        range.end.date()
    );

    let logged_hours = data.cards.total_logged.unwrap_or(0) as f64 / 3600.0;
    match period_goal_hours(period.kind(), &data.cards) {
        Some(goal) => {
            let pct = logged_hours / goal * 100.0;
            println!("  Logged:   {logged_hours:.1}h of {goal:.0}h ({pct:.0}%)");
        }
        None => println!("  Logged:   {logged_hours:.1}h"),
    }
    println!("  Streak:   {} day(s)", data.streak);
    println!("  Missing:  {} day(s) without entries", data.stats.missing_days);
    println!("  Tracked:  {:.1}h across the range", data.stats.total_hours);

    println!("  Recent days:");
    for day in &data.stats.recent_days {
        let marker = if day.have_entries { "✓" } else { "·" };
        let hours = day.daily_duration.unwrap_or(0) as f64 / 3600.0;
        let weekday = NaiveDate::parse_from_str(&day.day, "%Y-%m-%d")
            .map(|d| WeekDay::of(d).as_str())
            .unwrap_or("?");
        println!("    {marker} {}  {:<9}  {hours:>5.1}h", day.day, weekday);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
