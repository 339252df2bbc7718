use std::fmt;
use std::io;
use std::sync::Arc;

use services::{AlQuranCloudLoader, Clock, ProgressStore, SessionError, SessionLoopService};
use storage::repository::Storage;
use tarteel_core::model::{LessonSize, ProgressDraft};
use tarteel_core::quran::StaticSurahIndex;
use tracing_subscriber::EnvFilter;

mod terminal;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidLessonSize { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidLessonSize { raw } => {
                write!(f, "invalid --lesson-size value: {raw} (expected 3, 5, 7 or 10)")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number(raw: String, flag: &'static str) -> Result<u32, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  tarteel [session] [--db <sqlite_url>] [--lesson-size <3|5|7|10>]");
    eprintln!("  tarteel setup --surah <1-114> --verse <n> [--force] [--db <sqlite_url>]");
    eprintln!("  tarteel status [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://tarteel.sqlite3");
    eprintln!("  --lesson-size 5");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TARTEEL_DB_URL, TARTEEL_LESSON_SIZE, TARTEEL_CONTENT_URL, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Session,
    Setup,
    Status,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "session" => Some(Self::Session),
            "setup" => Some(Self::Setup),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct SetupArgs {
    surah: u32,
    verse: u32,
    force: bool,
}

#[derive(Debug)]
struct Args {
    command: Command,
    db_url: String,
    lesson_size: LessonSize,
    setup: Option<SetupArgs>,
}

impl Args {
    fn parse(command: Command, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("TARTEEL_DB_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| "sqlite://tarteel.sqlite3".into(), normalize_sqlite_url);
        let mut lesson_size = match std::env::var("TARTEEL_LESSON_SIZE") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ArgsError::InvalidLessonSize { raw })?,
            Err(_) => LessonSize::default(),
        };
        let mut surah = None;
        let mut verse = None;
        let mut force = false;

        while let Some(arg) = args.next() {
            match (command, arg.as_str()) {
                (_, "--db") => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                (Command::Session, "--lesson-size") => {
                    let value = require_value(args, "--lesson-size")?;
                    lesson_size = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLessonSize { raw: value.clone() })?;
                }
                (Command::Setup, "--surah") => {
                    surah = Some(parse_number(require_value(args, "--surah")?, "--surah")?);
                }
                (Command::Setup, "--verse") => {
                    verse = Some(parse_number(require_value(args, "--verse")?, "--verse")?);
                }
                (Command::Setup, "--force") => force = true,
                (_, "--help" | "-h") => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let setup = if command == Command::Setup {
            Some(SetupArgs {
                surah: surah.ok_or(ArgsError::MissingFlag { flag: "--surah" })?,
                verse: verse.unwrap_or(1),
                force,
            })
        } else {
            None
        };

        Ok(Self {
            command,
            db_url,
            lesson_size,
            setup,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn parse_args() -> Result<Args, ArgsError> {
    let mut argv = std::env::args().skip(1).peekable();

    // No subcommand means a session.
    let command = match argv.peek().map(String::as_str) {
        None => Command::Session,
        Some(first) if first.starts_with('-') => Command::Session,
        Some(first) => {
            Command::from_arg(first).ok_or_else(|| ArgsError::UnknownArg(first.to_string()))?
        }
    };
    if argv.peek().is_some_and(|first| !first.starts_with('-')) {
        argv.next();
    }

    Args::parse(command, &mut argv)
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    let storage = Storage::sqlite(&args.db_url).await?;
    tracing::debug!(db = %args.db_url, "storage ready");

    let clock = Clock::default_clock();
    let service = SessionLoopService::new(
        clock,
        ProgressStore::new(Arc::clone(&storage.progress)),
        Arc::new(AlQuranCloudLoader::from_env()),
        Arc::new(StaticSurahIndex),
    )
    .with_lesson_size(args.lesson_size);

    match args.command {
        Command::Session => match terminal::run_session(&service).await {
            Err(err)
                if matches!(
                    err.downcast_ref::<SessionError>(),
                    Some(SessionError::NotInitialized)
                ) =>
            {
                eprintln!("No progress yet. Start with: tarteel setup --surah <n> --verse <n>");
                Ok(())
            }
            other => other,
        },
        Command::Setup => {
            let Some(setup) = args.setup else {
                return Err(ArgsError::MissingFlag { flag: "--surah" }.into());
            };
            let draft = ProgressDraft::new(setup.surah, setup.verse);
            let progress = if setup.force {
                service.reset(draft).await?
            } else {
                service.begin(draft).await?
            };
            println!(
                "Starting at surah {}, verse {}.",
                progress.current_surah(),
                progress.current_ayah_index() + 1
            );
            Ok(())
        }
        Command::Status => {
            match service.load_progress().await {
                Some(progress) => {
                    print!(
                        "{}",
                        terminal::describe_progress(&progress, clock.today())?
                    );
                }
                None => println!("No progress yet."),
            }
            Ok(())
        }
    }
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Parse before logging so usage errors print cleanly.
    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            print_usage();
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    if let Err(err) = run(args).await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
