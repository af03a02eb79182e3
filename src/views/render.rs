//! Terminal rendering of the view models

use std::fmt::Write;

use crate::vitals::CardState;

use super::dashboard::{DashboardView, HistoryView, ReadyView, SampleRow};
use super::{Notification, NotificationLevel, UserRow};

/// Format a reading without trailing zeros
fn number(value: f64) -> String {
    value.to_string()
}

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One block character per reading, scaled between the series min and max
fn sparkline(values: &[f64]) -> String {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let span = max - min;
    let top = (SPARK_LEVELS.len() - 1) as f64;

    values
        .iter()
        .map(|v| {
            let level = if span > 0.0 { ((v - min) / span * top).round() as usize } else { 0 };
            SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

/// Per-series trend lines over the page, in row order
fn trends(out: &mut String, rows: &[SampleRow]) {
    if rows.len() < 2 {
        return;
    }

    let series: [(&str, fn(&SampleRow) -> f64); 3] = [
        ("Heart Rate", |r| r.heart_rate),
        ("Temperature", |r| r.temperature),
        ("SpO2", |r| r.spo2),
    ];
    for (label, value) in series {
        let values: Vec<f64> = rows.iter().map(value).collect();
        let _ = writeln!(out, "{:<14} {}", label, sparkline(&values));
    }
    out.push('\n');
}

pub fn dashboard(view: &DashboardView) -> String {
    match view {
        DashboardView::Loading => "Loading...\n".to_string(),
        DashboardView::Terminated { message } => format!("{}\n", message),
        DashboardView::Error { message } => format!("{}\n", message),
        DashboardView::Empty { message, admin_link } => {
            let mut out = format!("{}\n\n", message);
            if *admin_link {
                out.push_str("Open the admin panel with:\n  vitalwatch admin seed\n");
            }
            out.push_str("Log out with:\n  vitalwatch logout\n");
            out
        }
        DashboardView::Ready(ready) => ready_view(ready),
    }
}

fn ready_view(view: &ReadyView) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Patient {}  (signed in as {})", view.patient, view.role);
    if let Some(selector) = &view.patient_selector {
        let options: Vec<&str> = selector.options.iter().map(|p| p.as_str()).collect();
        let _ = writeln!(out, "Patients: {}", options.join(", "));
    }
    if view.admin_link {
        let _ = writeln!(out, "Admin: vitalwatch admin users");
    }
    out.push('\n');

    for card in &view.cards {
        let marker = match card.state {
            CardState::Normal => "ok",
            CardState::Abnormal => "ALERT",
        };
        let _ = writeln!(
            out,
            "{:<14} {:>8} {:<4} [{}]",
            card.label,
            number(card.value),
            card.unit,
            marker
        );
    }
    if !view.cards.is_empty() {
        out.push('\n');
    }

    match &view.history {
        HistoryView::Loading => out.push_str("Loading history...\n"),
        HistoryView::Error { message } => {
            let _ = writeln!(out, "{}", message);
        }
        HistoryView::Loaded { rows } if rows.is_empty() => out.push_str("No samples on this page.\n"),
        HistoryView::Loaded { rows } => {
            trends(&mut out, rows);
            let _ = writeln!(
                out,
                "{:<10} {:>10} {:>12} {:>6}",
                "Time", "Heart Rate", "Temperature", "SpO2"
            );
            let _ = writeln!(out, "{}", "-".repeat(41));
            for row in rows {
                let _ = writeln!(
                    out,
                    "{:<10} {:>10} {:>12} {:>6}",
                    row.time,
                    number(row.heart_rate),
                    number(row.temperature),
                    number(row.spo2)
                );
            }
        }
    }

    if let Some(p) = &view.pagination {
        let previous = if p.previous_enabled { "< prev" } else { "      " };
        let next = if p.next_enabled { "next >" } else { "" };
        let _ = writeln!(out, "\n{}  page {}  {}", previous, p.page + 1, next);
    }

    out
}

pub fn users(rows: &[UserRow]) -> String {
    if rows.is_empty() {
        return "No users.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{:<6} {:<20} {:<8} {}", "ID", "Username", "Role", "Actions");
    let _ = writeln!(out, "{}", "-".repeat(44));
    for row in rows {
        let action = if row.delete_action { "delete" } else { "" };
        let _ = writeln!(
            out,
            "{:<6} {:<20} {:<8} {}",
            row.id, row.username, row.role, action
        );
    }
    out
}

pub fn notification(n: &Notification) -> String {
    match n.level {
        NotificationLevel::Success => format!("✓ {}", n.message),
        NotificationLevel::Error => format!("✗ {}", n.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;
    use crate::views::dashboard::{CardView, Pagination, PatientSelector};
    use crate::vitals::PatientId;

    fn ready(role: Role) -> ReadyView {
        let full = role != Role::Nurse;
        ReadyView {
            role,
            admin_link: role == Role::Admin,
            patient: PatientId::from("P001"),
            patient_selector: full.then(|| PatientSelector {
                options: vec![PatientId::from("P001"), PatientId::from("P002")],
                selected: PatientId::from("P001"),
            }),
            pagination: full.then_some(Pagination {
                page: 0,
                previous_enabled: false,
                next_enabled: true,
            }),
            cards: vec![CardView {
                label: "Heart Rate",
                value: 120.0,
                unit: "bpm",
                threshold: 100.0,
                state: CardState::Abnormal,
            }],
            history: HistoryView::Loaded {
                rows: vec![SampleRow {
                    time: "10:00:00".to_string(),
                    heart_rate: 120.0,
                    temperature: 36.6,
                    spo2: 98.0,
                }],
            },
        }
    }

    #[test]
    fn test_ready_doctor() {
        let out = dashboard(&DashboardView::Ready(ready(Role::Doctor)));
        assert!(out.contains("Patients: P001, P002"));
        assert!(out.contains("[ALERT]"));
        assert!(out.contains("10:00:00"));
        assert!(out.contains("36.6"));
        assert!(out.contains("page 1  next >"));
        assert!(!out.contains("Admin:"));
    }

    fn row(time: &str, heart_rate: f64, temperature: f64, spo2: f64) -> SampleRow {
        SampleRow {
            time: time.to_string(),
            heart_rate,
            temperature,
            spo2,
        }
    }

    #[test]
    fn test_sparkline_scales_to_range() {
        assert_eq!(sparkline(&[60.0, 80.0, 100.0]), "▁▅█");
        assert_eq!(sparkline(&[98.0, 98.0]), "▁▁");
        assert_eq!(sparkline(&[]), "");
    }

    #[test]
    fn test_ready_shows_trend_per_series() {
        let mut view = ready(Role::Doctor);
        view.history = HistoryView::Loaded {
            rows: vec![
                row("10:00:00", 70.0, 36.5, 99.0),
                row("10:01:00", 90.0, 37.0, 97.0),
                row("10:02:00", 110.0, 38.5, 95.0),
            ],
        };

        let out = dashboard(&DashboardView::Ready(view));
        let trend = |label: &str| {
            out.lines()
                .find(|l| l.starts_with(label) && l.contains('▁'))
                .map(|l| l[14..].trim().to_string())
        };
        assert_eq!(trend("Heart Rate").as_deref(), Some("▁▅█"));
        assert_eq!(trend("Temperature").as_deref(), Some("▁▃█"));
        assert_eq!(trend("SpO2").as_deref(), Some("█▅▁"));

        let trend_at = out.find("▁▅█").unwrap();
        assert!(trend_at < out.find("Time").unwrap());
    }

    #[test]
    fn test_single_row_has_no_trend() {
        let out = dashboard(&DashboardView::Ready(ready(Role::Doctor)));
        assert!(!out.contains('▁'));
        assert!(!out.contains('█'));
    }

    #[test]
    fn test_ready_nurse_has_no_controls() {
        let out = dashboard(&DashboardView::Ready(ready(Role::Nurse)));
        assert!(!out.contains("Patients:"));
        assert!(!out.contains("page"));
    }

    #[test]
    fn test_empty_admin() {
        let out = dashboard(&DashboardView::Empty {
            message: "No patient data found.".to_string(),
            admin_link: true,
        });
        assert!(out.contains("admin seed"));
        assert!(out.contains("logout"));
    }

    #[test]
    fn test_users_table() {
        let rows = vec![
            UserRow {
                id: 1,
                username: "admin".to_string(),
                role: Role::Admin,
                delete_action: false,
            },
            UserRow {
                id: 2,
                username: "dana".to_string(),
                role: Role::Doctor,
                delete_action: true,
            },
        ];
        let out = users(&rows);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(!lines[2].contains("delete"));
        assert!(lines[3].ends_with("delete"));
    }
}
