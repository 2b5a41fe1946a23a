use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use orbit_graph::Session;

const FRAME: Duration = Duration::from_micros(16_667);

/// Ticks the session `ticks` times and prints the final snapshot to stdout.
pub(crate) fn run(mut session: Session, ticks: u64, churn_per_tick: bool) -> Result<()> {
    let mut settled_at = None;
    for tick in 0..ticks {
        if churn_per_tick {
            session.churn().context("churn step failed")?;
        }
        let report = session
            .tick(FRAME)
            .with_context(|| format!("layout tick {tick} failed"))?;

        for event in session.drain_engine_events() {
            tracing::debug!(tick, ?event, "engine event");
        }
        session.drain_graph_events().for_each(drop);

        if report.idle && settled_at.is_none() {
            settled_at = Some(tick);
        } else if !report.idle {
            settled_at = None;
        }
    }

    let snapshot = session.snapshot();
    tracing::info!(
        ticks,
        settled_at,
        bodies = snapshot.bodies.len(),
        lines = snapshot.lines.len(),
        "headless run finished"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &snapshot).context("failed to write snapshot")?;
    writeln!(out).context("failed to write snapshot")?;
    Ok(())
}
