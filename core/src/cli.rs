use std::fmt::Write;

use crate::types::SessionReport;
use crate::units::format_clock;

pub fn print_report(report: &SessionReport) {
    print!("{}", render_report(report));
}

/// Tekstrapport for terminalen.
pub fn render_report(report: &SessionReport) -> String {
    let mut out = String::new();
    // skriving til String feiler ikke
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &SessionReport) -> std::fmt::Result {
    let meta = &report.meta;
    let title = meta.name.as_deref().unwrap_or("Session");
    match meta.start_time_utc {
        Some(t) => writeln!(out, "--- {title} ({}) ---", t.format("%Y-%m-%d %H:%M"))?,
        None => writeln!(out, "--- {title} ---")?,
    }
    writeln!(out, "Samples: {}", report.sample_count)?;

    if report.is_empty() {
        writeln!(out, "No efforts detected.")?;
        return Ok(());
    }

    writeln!(out, "\nIntervals:")?;
    for b in &report.blocks {
        writeln!(
            out,
            "  {} - {}  {:>4.0} s  {:>5.0} m  {:>5.1} km/h  [{}]",
            format_clock(b.start_s),
            format_clock(b.end_s),
            b.duration_s,
            b.distance_m,
            b.mean_speed_kmh,
            b.scale
        )?;
    }

    writeln!(out, "\nGroups:")?;
    for g in &report.groups {
        let s = &g.summary;
        let bpm = s.mean_bpm.map(|h| format!("{h:.0} bpm")).unwrap_or_else(|| "-".into());
        writeln!(
            out,
            "  {:<12} {:>4.0} s  {:>14}  {}",
            s.label, s.mean_duration_s, s.pace_display, bpm
        )?;
    }

    if let Some(classified) = &report.classified {
        writeln!(out, "\nClassification:")?;
        for c in classified {
            writeln!(out, "  {:<14} {}", c.class.title(), c.group.summary.label)?;
        }
    }

    if !report.recoveries.is_empty() {
        writeln!(out, "\nRecoveries:")?;
        for r in &report.recoveries {
            writeln!(
                out,
                "  {} - {}  {:>4.0} s  {}",
                format_clock(r.start_s),
                format_clock(r.end_s),
                r.duration_s,
                r.pace_display
            )?;
        }
    }

    if let Some(p) = &report.pattern {
        writeln!(out, "\nPattern: {}", p.label)?;
    }
    writeln!(
        out,
        "\nInterval session: {}",
        if report.is_interval_session { "yes" } else { "no" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_says_so() {
        let text = render_report(&SessionReport::default());
        assert!(text.starts_with("--- Session ---"));
        assert!(text.contains("No efforts detected."));
    }
}
