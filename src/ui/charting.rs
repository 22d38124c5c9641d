use crate::store::SessionRecord;

/// Points for the history chart: x is the session number (1-based), y the percentage
pub fn history_points(history: &[SessionRecord]) -> Vec<(f64, f64)> {
    history
        .iter()
        .enumerate()
        .map(|(i, r)| ((i + 1) as f64, r.percentage as f64))
        .collect()
}

/// Compute X (session count) and Y (percentage) bounds for the history chart
pub fn compute_chart_params(points: &[(f64, f64)]) -> (f64, f64) {
    let mut highest = 0.0;
    for &(_, pct) in points {
        if pct > highest {
            highest = pct;
        }
    }

    let mut sessions = points.last().map_or(1.0, |p| p.0);
    if sessions < 2.0 {
        sessions = 2.0;
    }

    // keep the y axis readable when every session scored zero
    (sessions, highest.round().max(10.0))
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
