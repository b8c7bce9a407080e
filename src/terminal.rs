//! Terminal front end
//!
//! Each line read from stdin is the new content of the search box. The panel
//! is redrawn on stdout whenever the rendered text changes. EOF or Ctrl-C
//! ends the session.

use std::fmt::Write as _;
use std::future::Future;
use std::io::BufRead;

use anyhow::{Context, Result};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::movies::MovieRecord;
use crate::session::SearchSession;
use crate::state::{DiscoveryState, LoadState};

const SPINNER: &str = "  ⠋ loading…";

fn movie_line(movie: &MovieRecord) -> String {
    let mut line = format!("  - {}", movie.title);
    if let Some(year) = movie.release_year() {
        let _ = write!(line, " ({})", year);
    }
    match movie.vote_average {
        Some(rating) if rating > 0.0 => {
            let _ = write!(line, "  ★ {:.1}", rating);
        }
        _ => line.push_str("  ★ N/A"),
    }
    if let Some(lang) = movie.original_language.as_deref() {
        let _ = write!(line, " · {}", lang);
    }
    line
}

/// Render the whole panel as text
pub fn render(state: &DiscoveryState) -> String {
    let mut out = String::new();

    match &state.trending {
        LoadState::Loading => {
            out.push_str(SPINNER);
            out.push('\n');
        }
        LoadState::Failure(msg) => {
            let _ = writeln!(out, "  ! {}", msg);
        }
        LoadState::Success(records) if !records.is_empty() => {
            out.push_str("Trending\n");
            for (i, record) in records.iter().enumerate() {
                let _ = writeln!(out, "  {}. {} ({})", i + 1, record.search_term, record.count);
            }
        }
        _ => {}
    }

    if state.committed_query.is_empty() {
        out.push_str("Popular\n");
    } else {
        let _ = writeln!(out, "Results for {:?}", state.committed_query);
    }

    match &state.movies {
        LoadState::Idle => {}
        LoadState::Loading => {
            out.push_str(SPINNER);
            out.push('\n');
        }
        LoadState::Failure(msg) => {
            let _ = writeln!(out, "  ! {}", msg);
        }
        LoadState::Success(movies) if movies.is_empty() => out.push_str("  No movies found.\n"),
        LoadState::Success(movies) => {
            for movie in movies {
                out.push_str(&movie_line(movie));
                out.push('\n');
            }
        }
    }

    out
}

async fn write_frame<W: AsyncWrite + Unpin>(out: &mut W, frame: &str) -> Result<()> {
    out.write_all(format!("\n{}", frame).as_bytes())
        .await
        .context("Failed to write to stdout")?;
    out.flush().await.context("Failed to flush stdout")
}

/// Read stdin line by line on a plain thread.
///
/// The channel closes on EOF or a read error. A read still blocked when the
/// session ends is abandoned along with the thread.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::error!("Failed to read line: {}", e);
                    break;
                }
            }
        }
    });

    rx
}

async fn interrupted() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Interrupted"),
        Err(e) => {
            log::warn!("Ctrl-C handler unavailable: {}", e);
            std::future::pending::<()>().await
        }
    }
}

/// Drive a session from stdin until EOF or Ctrl-C
pub async fn run_terminal(session: SearchSession) -> Result<()> {
    drive(session, spawn_stdin_reader(), tokio::io::stdout(), interrupted()).await
}

/// Feed input lines to the session and redraw into `out` until the input
/// closes or `stop` resolves. The session is shut down either way.
async fn drive<W, S>(
    session: SearchSession,
    mut input: mpsc::UnboundedReceiver<String>,
    mut out: W,
    stop: S,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
    S: Future<Output = ()>,
{
    let mut state_rx = session.subscribe();
    let mut last_frame = String::new();
    tokio::pin!(stop);

    let result: Result<()> = loop {
        let frame = render(&state_rx.borrow_and_update());
        if frame != last_frame {
            if let Err(e) = write_frame(&mut out, &frame).await {
                break Err(e);
            }
            last_frame = frame;
        }

        tokio::select! {
            line = input.recv() => match line {
                Some(line) => session.set_search_term(line),
                None => break Ok(()),
            },
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
            }
            _ = &mut stop => break Ok(()),
        }
    };

    session.shutdown().await;
    result
}
