//! Output formatting for candidate panels, directions, and session status.
//!
//! Every renderer returns a `String` so the command handlers decide where it
//! goes and tests can assert on it directly.

use std::fmt::Write as _;

use clap::ValueEnum;

use campusnav_lib::{
    FeatureKind, FeatureTable, NavState, NavigationSession, NavigationSnapshot, RouteCandidate,
    StepView, TurnStep,
};

use crate::terminal::ColorPalette;

const METERS_PER_MILE: f64 = 1609.344;

/// Output format for one-shot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Route distance, e.g. `0.14 km`.
pub fn format_route_distance(km: f64) -> String {
    format!("{km:.2} km")
}

/// Route duration in whole minutes, e.g. `2 min`.
pub fn format_route_duration(minutes: f64) -> String {
    format!("{:.0} min", minutes.round())
}

/// Step distance, e.g. `0.04 mi`.
pub fn format_step_distance(meters: f64) -> String {
    format!("{:.2} mi", meters / METERS_PER_MILE)
}

/// Step duration, e.g. `0.7 min`.
pub fn format_step_duration(seconds: f64) -> String {
    format!("{:.1} min", seconds / 60.0)
}

/// Per-candidate decorations for [`render_candidates`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PanelMarks {
    pub selected: Option<usize>,
    pub preview: Option<usize>,
}

/// One line per candidate: rank, distance, duration, and markers.
pub fn render_candidates(
    candidates: &[RouteCandidate],
    marks: PanelMarks,
    is_bookmarked: impl Fn(&RouteCandidate) -> bool,
    palette: &ColorPalette,
) -> String {
    let mut out = String::new();
    let Some(first) = candidates.first() else {
        return out;
    };
    let _ = writeln!(
        out,
        "Routes from {}{}{} to {}{}{} ({}):",
        palette.white_bold,
        first.origin_label,
        palette.reset,
        palette.white_bold,
        first.destination_label,
        palette.reset,
        first.mode
    );

    for candidate in candidates {
        let cursor = if marks.selected == Some(candidate.id) {
            ">"
        } else {
            " "
        };
        let _ = write!(
            out,
            " {} {}{}{}  {}{}{}  {}{}{}",
            cursor,
            palette.white_bold,
            candidate.summary,
            palette.reset,
            palette.cyan,
            format_route_distance(candidate.distance_km()),
            palette.reset,
            palette.green,
            format_route_duration(candidate.duration_minutes()),
            palette.reset,
        );
        if is_bookmarked(candidate) {
            let _ = write!(out, "  {}*{}", palette.yellow, palette.reset);
        }
        if marks.preview == Some(candidate.id) {
            let _ = write!(out, "  {}(preview){}", palette.gray, palette.reset);
        }
        out.push('\n');
    }
    out
}

/// Candidate panel for the current snapshot, or an empty string when closed.
pub fn render_panel(snapshot: &NavigationSnapshot, palette: &ColorPalette) -> String {
    if !snapshot.panel_open {
        return String::new();
    }
    render_candidates(
        &snapshot.candidates,
        PanelMarks {
            selected: snapshot.selected_id,
            preview: snapshot.preview_id,
        },
        |candidate| {
            snapshot
                .bookmarks
                .iter()
                .any(|entry| entry.route.same_route(candidate))
        },
        palette,
    )
}

fn step_line(step: &TurnStep) -> String {
    format!(
        "{} ({}, {})",
        step.instruction,
        format_step_distance(step.distance_meters),
        format_step_duration(step.duration_seconds)
    )
}

/// Full numbered step list with the current step highlighted.
pub fn render_steps(steps: &[TurnStep], current: Option<usize>, palette: &ColorPalette) -> String {
    let mut out = String::new();
    for (index, step) in steps.iter().enumerate() {
        if current == Some(index) {
            let _ = writeln!(
                out,
                "{}>{} {:>2}. {}",
                palette.tag_current,
                palette.reset,
                index + 1,
                step_line(step)
            );
        } else {
            let _ = writeln!(
                out,
                "  {}{:>2}.{} {}",
                palette.gray,
                index + 1,
                palette.reset,
                step_line(step)
            );
        }
    }
    out
}

/// Directions for an active session in the chosen view.
pub fn render_directions(
    session: &NavigationSession,
    view: StepView,
    palette: &ColorPalette,
) -> String {
    if session.steps.is_empty() {
        return "No directions available.\n".to_string();
    }
    match view {
        StepView::AllSteps => render_steps(&session.steps, Some(session.step_cursor), palette),
        StepView::OneAtATime => match session.current_step() {
            Some(step) => format!(
                "{}Step {} of {}:{} {}\n",
                palette.gray,
                session.step_cursor + 1,
                session.steps.len(),
                palette.reset,
                step_line(step)
            ),
            None => String::new(),
        },
    }
}

/// One-line summary of the navigation state.
pub fn render_status(snapshot: &NavigationSnapshot) -> String {
    let state = match snapshot.state {
        NavState::Idle => "idle",
        NavState::CandidatesOpen => "choosing a route",
        NavState::RouteActive => "navigating",
    };
    let origin = match (&snapshot.inputs.origin_text, snapshot.inputs.live_fix) {
        (text, Some(fix)) if text.is_empty() => format!("my location {fix}"),
        (text, _) if text.is_empty() => "-".to_string(),
        (text, _) => text.clone(),
    };
    let destination = if snapshot.inputs.destination_text.is_empty() {
        "-"
    } else {
        snapshot.inputs.destination_text.as_str()
    };

    let mut out = format!(
        "State: {state} | from: {origin} | to: {destination} | mode: {} | layer: {}",
        snapshot.inputs.mode,
        layer_name(snapshot),
    );
    if snapshot.session.is_active {
        let _ = write!(
            out,
            " | step {} of {}",
            snapshot.session.step_cursor + 1,
            snapshot.session.steps.len()
        );
    }
    out.push('\n');
    out
}

fn layer_name(snapshot: &NavigationSnapshot) -> &'static str {
    match snapshot.base_layer {
        campusnav_lib::BaseLayer::Standard => "standard",
        campusnav_lib::BaseLayer::Satellite => "satellite",
    }
}

/// Bookmarked routes, one per line.
pub fn render_bookmarks(snapshot: &NavigationSnapshot) -> String {
    if snapshot.bookmarks.is_empty() {
        return "No bookmarked routes.\n".to_string();
    }
    let mut out = String::new();
    for entry in &snapshot.bookmarks {
        let _ = writeln!(
            out,
            "* {} to {} ({}, {}, {})",
            entry.origin_label(),
            entry.destination_label(),
            entry.mode(),
            format_route_distance(entry.route.distance_km()),
            format_route_duration(entry.route.duration_minutes())
        );
    }
    out
}

/// Feature counts per kind for a rendered scene.
pub fn render_scene(scene: &FeatureTable) -> String {
    let kinds = [
        FeatureKind::AccessibilityMarker,
        FeatureKind::UserLocation,
        FeatureKind::Marker,
        FeatureKind::RouteLine,
        FeatureKind::Preview,
    ];
    let parts: Vec<String> = kinds
        .iter()
        .map(|kind| format!("{kind}: {}", scene.count(*kind)))
        .collect();
    format!("Map features: {}\n", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusnav_lib::{Coordinates, TravelMode};

    fn step(instruction: &str, meters: f64, seconds: f64) -> TurnStep {
        TurnStep {
            kind: "straight".to_string(),
            instruction: instruction.to_string(),
            distance_meters: meters,
            duration_seconds: seconds,
        }
    }

    fn candidate(id: usize, meters: f64, seconds: f64) -> RouteCandidate {
        RouteCandidate {
            id,
            summary: format!("Route {}", id + 1),
            distance_meters: meters,
            duration_seconds: seconds,
            path: vec![
                Coordinates::new(-84.5847, 34.0379),
                Coordinates::new(-84.5835, 34.0381),
            ],
            steps: vec![step("Head east on Campus Loop Road", 58.2, 41.9)],
            origin_label: "Kennesaw Hall".to_string(),
            destination_label: "Sturgis Library".to_string(),
            mode: TravelMode::Walking,
        }
    }

    #[test]
    fn units_follow_panel_conventions() {
        let route = candidate(0, 142.6, 102.7);
        assert_eq!(format_route_distance(route.distance_km()), "0.14 km");
        assert_eq!(format_route_duration(route.duration_minutes()), "2 min");
        assert_eq!(format_step_distance(58.2), "0.04 mi");
        assert_eq!(format_step_duration(41.9), "0.7 min");
    }

    #[test]
    fn panel_marks_selection_and_bookmarks() {
        let candidates = vec![candidate(0, 142.6, 102.7), candidate(1, 171.9, 123.8)];
        let text = render_candidates(
            &candidates,
            PanelMarks {
                selected: Some(1),
                preview: Some(0),
            },
            |c| c.id == 1,
            &ColorPalette::plain(),
        );

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Routes from Kennesaw Hall to Sturgis Library (walking):"
        );
        assert_eq!(lines[1], "   Route 1  0.14 km  2 min  (preview)");
        assert_eq!(lines[2], " > Route 2  0.17 km  2 min  *");
    }

    #[test]
    fn current_step_is_highlighted() {
        let steps = vec![
            step("Head east on Campus Loop Road", 58.2, 41.9),
            step("Turn right onto Library Walk", 84.4, 60.8),
        ];
        let text = render_steps(&steps, Some(1), &ColorPalette::plain());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "   1. Head east on Campus Loop Road (0.04 mi, 0.7 min)"
        );
        assert_eq!(lines[1], ">  2. Turn right onto Library Walk (0.05 mi, 1.0 min)");
    }

    #[test]
    fn single_step_view_shows_counter() {
        let session = NavigationSession {
            active_candidate_id: Some(0),
            steps: vec![step("Depart", 10.0, 6.0), step("Arrive", 0.0, 0.0)],
            step_cursor: 1,
            mode: TravelMode::Walking,
            is_active: true,
            destination_label: "Sturgis Library".to_string(),
        };
        let text = render_directions(&session, StepView::OneAtATime, &ColorPalette::plain());
        assert_eq!(text, "Step 2 of 2: Arrive (0.00 mi, 0.0 min)\n");
    }

    #[test]
    fn status_reports_live_fix_origin() {
        let mut snapshot = NavigationSnapshot::default();
        snapshot.inputs.live_fix = Some(Coordinates::new(-84.58, 34.04));
        snapshot.inputs.destination_text = "Library".to_string();
        let text = render_status(&snapshot);
        assert!(text.starts_with("State: idle | from: my location (-84.58000, 34.04000)"));
        assert!(text.contains("to: Library"));
        assert!(text.contains("layer: standard"));
    }
}
