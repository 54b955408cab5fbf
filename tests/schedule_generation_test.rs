mod common;

use std::collections::HashMap;

use assert_matches::assert_matches;
use chrono::Timelike;
use common::{at, date, time, TestApp};
use kinoplex_api::entities::{booking, schedule};
use kinoplex_api::errors::ServiceError;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use uuid::Uuid;

fn start_minutes(s: &schedule::Model) -> u32 {
    s.start_time.hour() * 60 + s.start_time.minute()
}

#[tokio::test]
async fn generate_fills_the_range_with_valid_showtimes() {
    let app = TestApp::new().await;
    app.seed_movie("First", 90, None, 0.9).await;
    app.seed_movie("Second", 120, Some("12+"), 0.6).await;
    app.seed_movie("Third", 105, None, 0.4).await;
    app.seed_hall("Hall 1", &[("Parterre", dec!(10))], &[(1, 10, "Parterre")])
        .await;
    app.seed_hall("Hall 2", &[("Parterre", dec!(12))], &[(1, 8, "Parterre")])
        .await;

    let generator = app.generator_at(at(2026, 9, 1, 9, 0), 42);
    let summary = generator
        .generate("2026-09-02", "2026-09-04")
        .await
        .expect("generation should succeed");

    assert!(summary.count > 0);
    assert_eq!(summary.start_date, date(2026, 9, 2));
    assert_eq!(summary.end_date, date(2026, 9, 4));

    let rows = schedule::Entity::find().all(&*app.db()).await.unwrap();
    assert_eq!(rows.len(), summary.count);

    for row in &rows {
        assert!(row.is_active);
        assert!(row.show_date >= date(2026, 9, 2) && row.show_date <= date(2026, 9, 4));
        // Future days open at 10:00 and slots snap to quarter hours.
        assert!(start_minutes(row) >= 10 * 60);
        assert_eq!(start_minutes(row) % 15, 0);
    }
}

#[tokio::test]
async fn generated_showtimes_never_overlap_within_a_hall_day() {
    let app = TestApp::new().await;
    let movies = [
        app.seed_movie("A", 80, None, 0.9).await,
        app.seed_movie("B", 95, None, 0.8).await,
        app.seed_movie("C", 110, None, 0.7).await,
        app.seed_movie("D", 135, None, 0.6).await,
        app.seed_movie("E", 70, None, 0.5).await,
    ];
    let durations: HashMap<Uuid, u32> = movies
        .iter()
        .map(|m| (m.id, m.duration_minutes as u32))
        .collect();
    app.seed_hall("Hall 1", &[("Parterre", dec!(10))], &[(1, 10, "Parterre")])
        .await;
    app.seed_hall("Hall 2", &[("Parterre", dec!(10))], &[(1, 10, "Parterre")])
        .await;

    let generator = app.generator_at(at(2026, 9, 1, 9, 0), 7);
    generator
        .generate("2026-09-02", "2026-09-05")
        .await
        .expect("generation should succeed");

    let mut by_hall_day: HashMap<(Uuid, chrono::NaiveDate), Vec<schedule::Model>> = HashMap::new();
    for row in schedule::Entity::find().all(&*app.db()).await.unwrap() {
        by_hall_day
            .entry((row.hall_id, row.show_date))
            .or_default()
            .push(row);
    }

    for rows in by_hall_day.values_mut() {
        rows.sort_by_key(start_minutes);
        for pair in rows.windows(2) {
            let prev_end = start_minutes(&pair[0]) + durations[&pair[0].movie_id] + 20;
            assert!(
                start_minutes(&pair[1]) >= prev_end,
                "showtime at {} starts before {} (previous end with cleaning gap)",
                pair[1].start_time,
                prev_end
            );
        }
        if let Some(last) = rows.last() {
            assert!(start_minutes(last) + durations[&last.movie_id] + 20 <= 23 * 60 + 59);
        }
    }
}

#[tokio::test]
async fn generated_showtimes_respect_age_windows() {
    let app = TestApp::new().await;
    let kids = app.seed_movie("Cartoon", 75, Some("0+"), 0.9).await;
    let family = app.seed_movie("Family", 85, Some("6+"), 0.85).await;
    let adult = app.seed_movie("Noir", 115, Some("18+"), 0.95).await;
    app.seed_movie("Drama", 100, Some("12+"), 0.5).await;
    app.seed_hall("Hall 1", &[("Parterre", dec!(10))], &[(1, 10, "Parterre")])
        .await;

    let generator = app.generator_at(at(2026, 9, 1, 9, 0), 3);
    generator
        .generate("2026-09-02", "2026-09-06")
        .await
        .expect("generation should succeed");

    for row in schedule::Entity::find().all(&*app.db()).await.unwrap() {
        let minutes = start_minutes(&row);
        if row.movie_id == kids.id || row.movie_id == family.id {
            assert!(minutes < 20 * 60, "kids showtime at {}", row.start_time);
        }
        if row.movie_id == adult.id {
            assert!(minutes >= 16 * 60, "adult showtime at {}", row.start_time);
        }
    }
}

#[tokio::test]
async fn same_day_generation_starts_after_now() {
    let app = TestApp::new().await;
    app.seed_movie("A", 90, None, 0.9).await;
    app.seed_movie("B", 80, None, 0.8).await;
    app.seed_hall("Hall 1", &[("Parterre", dec!(10))], &[(1, 10, "Parterre")])
        .await;

    // 14:07 rounds up to the 14:15 boundary.
    let generator = app.generator_at(at(2026, 9, 1, 14, 7), 11);
    generator
        .generate("2026-09-01", "2026-09-01")
        .await
        .expect("generation should succeed");

    for row in schedule::Entity::find().all(&*app.db()).await.unwrap() {
        assert!(
            start_minutes(&row) >= 14 * 60 + 15,
            "showtime at {} is in the past",
            row.start_time
        );
    }
}

#[tokio::test]
async fn regeneration_replaces_schedules_and_clears_bookings() {
    let app = TestApp::new().await;
    let movie = app.seed_movie("A", 90, None, 0.9).await;
    app.seed_movie("B", 100, None, 0.5).await;
    let hall = app
        .seed_hall("Hall 1", &[("Parterre", dec!(10))], &[(1, 10, "Parterre")])
        .await;
    let old_schedule = app
        .seed_schedule(movie.id, hall.hall.id, date(2026, 9, 2), time(19, 0))
        .await;
    let ticket = app.seed_ticket_type("adult", dec!(1)).await;

    booking::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(Uuid::new_v4()),
        schedule_id: Set(old_schedule.id),
        zone_id: Set(hall.zones[0].id),
        ticket_type_id: Set(ticket.id),
        seat_row: Set(1),
        seat_number: Set(3),
        price: Set(dec!(10)),
        status: Set("confirmed".to_string()),
        created_at: Set(chrono::Utc::now()),
        updated_at: Set(None),
        cancelled_at: Set(None),
        cancelled_by: Set(None),
    }
    .insert(&*app.db())
    .await
    .expect("failed to seed booking");

    let generator = app.generator_at(at(2026, 9, 1, 9, 0), 5);
    generator
        .generate("2026-09-02", "2026-09-03")
        .await
        .expect("generation should succeed");

    assert_eq!(booking::Entity::find().count(&*app.db()).await.unwrap(), 0);
    assert!(schedule::Entity::find_by_id(old_schedule.id)
        .one(&*app.db())
        .await
        .unwrap()
        .is_none());
    assert!(schedule::Entity::find().count(&*app.db()).await.unwrap() > 0);
}

#[tokio::test]
async fn empty_generation_rolls_back_and_keeps_previous_data() {
    let app = TestApp::new().await;
    let movie = app.seed_movie("A", 90, None, 0.9).await;
    let hall = app
        .seed_hall("Hall 1", &[("Parterre", dec!(10))], &[(1, 10, "Parterre")])
        .await;
    let old_schedule = app
        .seed_schedule(movie.id, hall.hall.id, date(2026, 9, 2), time(19, 0))
        .await;

    // 23:50 rounds to 00:00 of the next day in minutes, so nothing fits
    // into what remains of today.
    let generator = app.generator_at(at(2026, 9, 1, 23, 50), 13);
    let err = generator
        .generate("2026-09-01", "2026-09-01")
        .await
        .expect_err("late-night same-day generation should find no room");
    assert_matches!(err, ServiceError::NoCapacity(_));

    assert!(schedule::Entity::find_by_id(old_schedule.id)
        .one(&*app.db())
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn generate_validates_the_date_range() {
    let app = TestApp::new().await;
    app.seed_movie("A", 90, None, 0.9).await;
    app.seed_hall("Hall 1", &[("Parterre", dec!(10))], &[(1, 10, "Parterre")])
        .await;

    let generator = app.generator_at(at(2026, 9, 10, 9, 0), 1);

    let err = generator.generate("tuesday", "2026-09-12").await.unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));

    let err = generator
        .generate("2026-09-14", "2026-09-12")
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));

    let err = generator
        .generate("2026-09-09", "2026-09-12")
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));
}

#[tokio::test]
async fn generate_requires_movies_and_open_halls() {
    let app = TestApp::new().await;
    let generator = app.generator_at(at(2026, 9, 1, 9, 0), 1);

    let err = generator
        .generate("2026-09-02", "2026-09-03")
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NoCapacity(_));

    app.seed_movie("A", 90, None, 0.9).await;
    let hall = app
        .seed_hall("Hall 1", &[("Parterre", dec!(10))], &[(1, 10, "Parterre")])
        .await;
    app.state
        .services
        .catalog
        .toggle_hall_closed(hall.hall.id)
        .await
        .expect("toggle should succeed");

    let err = generator
        .generate("2026-09-02", "2026-09-03")
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NoCapacity(_));
}
