//! Line-based front end for a daily session.

use std::error::Error;
use std::fmt::{self, Write as _};

use chrono::NaiveDate;
use services::{SessionLoopService, SessionPhase, SessionView};
use tarteel_core::model::{PortionRange, Progress, ReviewScore};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Rate(ReviewScore),
    Recitation(bool),
    Approve,
    Reload,
    Quit,
}

impl Action {
    fn parse(phase: SessionPhase, input: &str) -> Option<Self> {
        match (phase, input) {
            (_, "q" | "quit") => Some(Self::Quit),
            (_, "r" | "reload") => Some(Self::Reload),
            (SessionPhase::Dhor, raw) => raw
                .parse::<u8>()
                .ok()
                .and_then(|n| ReviewScore::from_u8(n).ok())
                .map(Self::Rate),
            (SessionPhase::Sabaqi, "y" | "yes") => Some(Self::Recitation(true)),
            (SessionPhase::Sabaqi, "n" | "no") => Some(Self::Recitation(false)),
            (SessionPhase::Sabaqi, "0") => Some(Self::Rate(ReviewScore::Missed)),
            (SessionPhase::Sabaqi, "2") => Some(Self::Rate(ReviewScore::Clean)),
            (SessionPhase::Sabaq, "a" | "approve") => Some(Self::Approve),
            _ => None,
        }
    }
}

/// Runs today's session until it is done or the learner quits.
///
/// # Errors
///
/// Returns an error if the session cannot be built or stdin fails.
pub async fn run_session(service: &SessionLoopService) -> Result<(), Box<dyn Error>> {
    let mut session = service.start_session().await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let view = SessionView::from_session(&session);
        render(&view);
        if view.progress.is_complete {
            println!("Session complete. Your next lesson is ready tomorrow.");
            return Ok(());
        }
        println!("{}", prompt(&view));

        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        let Some(action) = Action::parse(view.phase, line.trim()) else {
            println!("unrecognised input: {}", line.trim());
            continue;
        };

        let result = match action {
            Action::Quit => return Ok(()),
            Action::Reload => {
                service.reload_content(&mut session).await;
                continue;
            }
            Action::Rate(score) => service.rate(&mut session, score).await,
            Action::Recitation(passed) => service.rate_recitation(&mut session, passed).await,
            Action::Approve => service.approve(&mut session).await,
        };
        if let Err(err) = result {
            println!("{err}");
        }
    }
}

fn render(view: &SessionView) {
    println!();
    match view.phase {
        SessionPhase::Dhor => println!(
            "== Dhor: review {} of {} ==",
            view.progress.queue_position + 1,
            view.progress.queue_len
        ),
        SessionPhase::Sabaqi => println!("== Sabaqi: recite yesterday's lesson =="),
        SessionPhase::Sabaq => println!("== Sabaq: today's new lesson =="),
        SessionPhase::Done => {
            println!("== Done: {} portion(s) reviewed ==", view.progress.reviewed);
            return;
        }
    }

    if let Some(range) = &view.range {
        println!("{}", describe_range(range));
    }
    if let Some(review) = &view.review {
        println!(
            "reviewed {} time(s), last score {}",
            review.review_count(),
            review.last_score().as_u8()
        );
    }

    let Some(content) = &view.content else {
        println!("(content still loading; r to retry)");
        return;
    };
    println!(
        "{} ({})",
        content.surah_english_name, content.surah_arabic_name
    );
    for verse in &content.verses {
        println!("[{}] {}", verse.number_in_surah, verse.arabic);
        println!("    {}", verse.english);
        println!("    {}", verse.audio_url());
    }
}

fn prompt(view: &SessionView) -> &'static str {
    match view.phase {
        SessionPhase::Dhor => "rate recall: 0 missed, 1 shaky, 2 clean (r reload, q quit)",
        SessionPhase::Sabaqi => "recited from memory? y/n (r reload, q quit)",
        SessionPhase::Sabaq => "a to approve the lesson (r reload, q quit)",
        SessionPhase::Done => "",
    }
}

/// One-based, inclusive verse reference such as `surah 2, verses 6-10`.
fn describe_range(range: &PortionRange) -> String {
    let first = range.start() + 1;
    let last = range.end();
    if first == last {
        format!("surah {}, verse {first}", range.surah())
    } else {
        format!("surah {}, verses {first}-{last}", range.surah())
    }
}

/// Plain-text summary for the `status` command.
///
/// # Errors
///
/// Returns `fmt::Error` if formatting fails.
pub fn describe_progress(progress: &Progress, today: NaiveDate) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "position: surah {}, verse {}",
        progress.current_surah(),
        progress.current_ayah_index() + 1
    )?;
    writeln!(out, "started: {}", progress.started_at())?;
    match progress.pending_sabaqi() {
        Some(pending) => writeln!(out, "pending recitation: {}", describe_range(pending))?,
        None => out.push_str("pending recitation: none\n"),
    }
    let due = progress.due_portions(today).count();
    writeln!(
        out,
        "review pool: {} portion(s), {due} due today",
        progress.approved_portions().len()
    )?;
    for portion in progress.approved_portions() {
        writeln!(
            out,
            "  {} next {} (reviews {}, last {})",
            describe_range(portion.range()),
            portion.next_review(),
            portion.review_count(),
            portion.last_score().as_u8()
        )?;
    }
    Ok(out)
}
