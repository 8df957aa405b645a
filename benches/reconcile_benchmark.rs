use criterion::{criterion_group, criterion_main, Criterion};
use chrono::NaiveDate;
use fitbuddy_sync::models::{DailyProgress, ManualEdit};
use fitbuddy_sync::services::fitbit;
use serde_json::json;
use std::hint::black_box;

fn benchmark_reconcile(c: &mut Criterion) {
    let activity = json!({
        "activities": [],
        "summary": {
            "steps": 12000,
            "caloriesOut": 2450,
            "fairlyActiveMinutes": 15,
            "veryActiveMinutes": 30,
            "floors": 9,
            "distances": [
                {"activity": "tracker", "distance": 8.1},
                {"activity": "loggedActivities", "distance": 0.0},
                {"activity": "total", "distance": 8.4}
            ]
        }
    });
    let sleep = json!({
        "sleep": [],
        "summary": {
            "totalMinutesAsleep": 437,
            "stages": {"deep": 70, "light": 240, "rem": 95, "wake": 33}
        }
    });
    let heart = json!({
        "activities-heart": [{"dateTime": "2024-05-01", "value": {"restingHeartRate": 58}}]
    });

    let metrics = fitbit::synced_metrics(
        fitbit::parse_activity_day(&activity).expect("activity fixture parses"),
        fitbit::parse_sleep_day(&sleep).expect("sleep fixture parses"),
        fitbit::parse_resting_heart_rate(&heart).expect("heart fixture parses"),
    );

    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let mut locked = DailyProgress::new(date);
    locked.apply_manual_edit(
        &ManualEdit {
            steps: Some(500),
            sleep_hours: Some(6.0),
            ..Default::default()
        },
        "2024-05-01T09:00:00Z",
    );

    let mut group = c.benchmark_group("reconcile");

    group.bench_function("parse_fitbit_day", |b| {
        b.iter(|| {
            fitbit::synced_metrics(
                fitbit::parse_activity_day(black_box(&activity)).unwrap(),
                fitbit::parse_sleep_day(black_box(&sleep)).unwrap(),
                fitbit::parse_resting_heart_rate(black_box(&heart)).unwrap(),
            )
        })
    });

    group.bench_function("merge_into_empty_day", |b| {
        b.iter(|| {
            let mut day = DailyProgress::new(date);
            day.merge_synced(black_box(&metrics), "2024-05-01T20:00:00Z")
        })
    });

    group.bench_function("merge_into_locked_day", |b| {
        b.iter(|| {
            let mut day = locked.clone();
            day.merge_synced(black_box(&metrics), "2024-05-01T20:00:00Z")
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_reconcile);
criterion_main!(benches);
