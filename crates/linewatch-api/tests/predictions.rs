//! Outlook aggregation over synthetic report rows with known dates.
//! 2026-08-17 is a Monday; the window in these tests runs from Sunday
//! noon back one week.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use linewatch_api::predictions::{WEEKDAYS, build_outlook};
use linewatch_db::models::ReportRow;

fn row(line: Option<i64>, created_at: &str) -> ReportRow {
    ReportRow {
        id: Uuid::new_v4().to_string(),
        author_id: None,
        location: "Central Station".into(),
        line_number: line,
        description: "train held".into(),
        created_at: created_at.into(),
    }
}

fn sunday_noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap()
}

#[test]
fn groups_by_line_and_weekday() {
    let rows = vec![
        row(Some(4), "2026-08-17 09:00:00"), // Monday
        row(Some(4), "2026-08-17 10:30:00"), // Monday again
        row(Some(4), "2026-08-18 08:15:00"), // Tuesday
        row(Some(9), "2026-08-23 09:00:00"), // Sunday
        row(None, "2026-08-17 20:00:00"),    // Monday, no line
    ];

    let outlook = build_outlook(&rows, sunday_noon());
    assert_eq!(outlook.len(), 3);

    // Busiest line first, then the tied buckets with the no-line group ahead
    assert_eq!(outlook[0].line_number, Some(4));
    assert_eq!(outlook[0].total_reports, 3);
    assert_eq!(outlook[1].line_number, None);
    assert_eq!(outlook[1].total_reports, 1);
    assert_eq!(outlook[2].line_number, Some(9));
    assert_eq!(outlook[2].total_reports, 1);

    let line4 = &outlook[0];
    assert_eq!(line4.days.len(), 7);
    let labels: Vec<&str> = line4.days.iter().map(|d| d.weekday).collect();
    assert_eq!(labels, WEEKDAYS.to_vec());

    assert_eq!(line4.days[0].count, 2); // Mon
    assert_eq!(line4.days[0].percent, 100);
    assert_eq!(line4.days[1].count, 1); // Tue
    assert_eq!(line4.days[1].percent, 100);
    assert_eq!(line4.days[2].count, 0); // Wed
    assert_eq!(line4.days[2].percent, 0);
}

#[test]
fn percent_flags_any_activity() {
    let rows = vec![
        row(Some(2), "2026-08-19 07:00:00"), // Wednesday
        row(Some(2), "2026-08-19 07:05:00"),
        row(Some(2), "2026-08-19 07:10:00"),
    ];

    let outlook = build_outlook(&rows, sunday_noon());
    let line2 = &outlook[0];

    // Three reports on one weekday still project the same 100, every
    // other weekday stays at 0
    for (i, day) in line2.days.iter().enumerate() {
        if i == 2 {
            assert_eq!(day.count, 3);
            assert_eq!(day.percent, 100);
        } else {
            assert_eq!(day.count, 0);
            assert_eq!(day.percent, 0);
        }
    }
}

#[test]
fn stale_future_and_corrupt_rows_skipped() {
    let rows = vec![
        row(Some(4), "2026-08-10 09:00:00"), // Monday a week too early
        row(Some(4), "2026-08-23 13:00:00"), // an hour past `now`
        row(Some(4), "last tuesday"),        // unparsable
        row(Some(4), "2026-08-20 09:00:00"), // Thursday, in window
    ];

    let outlook = build_outlook(&rows, sunday_noon());
    assert_eq!(outlook.len(), 1);
    assert_eq!(outlook[0].total_reports, 1);
    assert_eq!(outlook[0].days[3].count, 1); // Thu
}

#[test]
fn no_reports_means_no_outlooks() {
    assert!(build_outlook(&[], sunday_noon()).is_empty());
}

#[test]
fn no_line_bucket_serializes_as_null() {
    let rows = vec![row(None, "2026-08-18 07:45:00")];

    let outlook = build_outlook(&rows, sunday_noon());
    let json = serde_json::to_value(&outlook).unwrap();

    assert_eq!(json[0]["line_number"], serde_json::Value::Null);
    assert_eq!(json[0]["total_reports"], 1);
    assert_eq!(json[0]["days"][1]["weekday"], "Tue");
    assert_eq!(json[0]["days"][1]["percent"], 100);
}
