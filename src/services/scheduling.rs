//! Automated showtime planning.
//!
//! [`ScheduleGeneratorService::generate`] replaces the entire schedule for a
//! date range in one transaction: every booking and every schedule row is
//! deleted, then freshly packed showtimes are inserted. The packing itself
//! is a pure function ([`plan_range`]) over movies, halls and an RNG, which
//! keeps the slot arithmetic testable without a database.
//!
//! All in-day arithmetic uses minutes since midnight. `NaiveTime` cannot
//! represent 24:00, so clock values are produced only for slots that are
//! known to end before closing.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Timelike, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::db::DbPool;
use crate::entities::{booking, hall, movie, schedule};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Doors open at 10:00 on any day other than today.
pub const OPENING_MINUTES: u32 = 10 * 60;
/// No showtime may run past 23:59.
pub const CLOSING_MINUTES: u32 = 23 * 60 + 59;
/// Cleaning gap appended to every screening.
pub const INTERMISSION_MINUTES: u32 = 20;
/// Showtimes snap to quarter-hour boundaries.
pub const SLOT_QUANTUM_MINUTES: u32 = 15;

const EVENING_CUTOFF_MINUTES: u32 = 20 * 60;
const ADULT_EARLIEST_MINUTES: u32 = 16 * 60;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One placed showtime, before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSlot {
    pub movie_id: Uuid,
    pub hall_id: Uuid,
    pub show_date: NaiveDate,
    pub start_minutes: u32,
    /// Screening plus intermission, used for overlap checks.
    pub total_minutes: u32,
}

impl PlannedSlot {
    pub fn start_time(&self) -> NaiveTime {
        NaiveTime::from_num_seconds_from_midnight_opt(self.start_minutes * 60, 0)
            .unwrap_or(NaiveTime::MIN)
    }

    pub fn end_minutes(&self) -> u32 {
        self.start_minutes + self.total_minutes
    }
}

/// Result of one generation run.
#[derive(Debug, Clone)]
pub struct GenerationSummary {
    pub count: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Rounds up to the next quarter-hour; values already on a boundary stay put.
pub fn round_up_to_quantum(minutes: u32) -> u32 {
    minutes.div_ceil(SLOT_QUANTUM_MINUTES) * SLOT_QUANTUM_MINUTES
}

/// Whether a movie with the given age rating may start at this cursor.
///
/// Kids ratings ("0+", "6+") must start before 20:00, adult ("18+") not
/// before 16:00. Unknown or missing ratings are unrestricted.
pub fn age_window_allows(age_rating: Option<&str>, cursor_minutes: u32) -> bool {
    match age_rating {
        Some("0+") | Some("6+") => cursor_minutes < EVENING_CUTOFF_MINUTES,
        Some("18+") => cursor_minutes >= ADULT_EARLIEST_MINUTES,
        _ => true,
    }
}

fn overlaps(a_start: u32, a_total: u32, b_start: u32, b_total: u32) -> bool {
    a_start < b_start + b_total && b_start < a_start + a_total
}

fn minutes_of(time: NaiveTime) -> u32 {
    let mut minutes = time.hour() * 60 + time.minute();
    if time.second() > 0 {
        minutes += 1;
    }
    minutes
}

/// Draws a working subset of movies for one hall-day.
///
/// Sample size is uniform in `2..=min(5, n)`; with fewer than two movies the
/// whole catalogue is returned. Each movie is keyed by
/// `uniform(0,1) * popularity_score` and the highest keys are drawn first,
/// so popular titles appear more often without starving the rest.
fn weighted_sample<'a>(movies: &'a [movie::Model], rng: &mut StdRng) -> Vec<&'a movie::Model> {
    if movies.len() < 2 {
        return movies.iter().collect();
    }
    let count = rng.gen_range(2..=movies.len().min(5));
    let mut keyed: Vec<(&movie::Model, f64)> = movies
        .iter()
        .map(|m| (m, rng.gen::<f64>() * m.popularity_score))
        .collect();
    keyed.sort_by(|a, b| b.1.total_cmp(&a.1));
    keyed.into_iter().take(count).map(|(m, _)| m).collect()
}

fn plan_hall_day(
    date: NaiveDate,
    hall_id: Uuid,
    candidates: &[&movie::Model],
    open_minutes: u32,
    slots: &mut Vec<PlannedSlot>,
) {
    let mut cursor = open_minutes;
    let mut placed: Vec<(u32, u32)> = Vec::new();

    for movie in candidates {
        if !age_window_allows(movie.age_rating.as_deref(), cursor) {
            continue;
        }
        if movie.duration_minutes <= 0 {
            warn!(
                movie_id = %movie.id,
                title = %movie.title,
                duration_minutes = movie.duration_minutes,
                "Movie has a non-positive duration, skipping"
            );
            continue;
        }
        let total = movie.duration_minutes as u32 + INTERMISSION_MINUTES;
        if cursor + total > CLOSING_MINUTES {
            // The remaining window cannot hold this screening; the
            // hall-day is exhausted.
            break;
        }
        if placed.iter().any(|&(s, t)| overlaps(cursor, total, s, t)) {
            continue;
        }

        placed.push((cursor, total));
        slots.push(PlannedSlot {
            movie_id: movie.id,
            hall_id,
            show_date: date,
            start_minutes: cursor,
            total_minutes: total,
        });
        cursor = round_up_to_quantum(cursor + total);
    }
}

/// Packs showtimes for every day in `[start_date, end_date]` across the
/// given halls. Hall order is re-shuffled and the movie subset re-sampled
/// for every day, so no ordering guarantee is offered to callers.
///
/// For `today` the cursor starts at the current time rounded up to the next
/// quarter-hour instead of the fixed opening time, so a run never plans a
/// showtime in the past.
pub fn plan_range(
    movies: &[movie::Model],
    halls: &[hall::Model],
    start_date: NaiveDate,
    end_date: NaiveDate,
    today: NaiveDate,
    now: NaiveTime,
    rng: &mut StdRng,
) -> Vec<PlannedSlot> {
    let mut slots = Vec::new();
    let mut date = start_date;

    while date <= end_date {
        let open_minutes = if date == today {
            round_up_to_quantum(minutes_of(now))
        } else {
            OPENING_MINUTES
        };

        let mut day_halls: Vec<&hall::Model> = halls.iter().collect();
        day_halls.shuffle(rng);

        for hall in day_halls {
            let candidates = weighted_sample(movies, rng);
            plan_hall_day(date, hall.id, &candidates, open_minutes, &mut slots);
        }

        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }

    slots
}

/// Generates and persists the showtime schedule.
pub struct ScheduleGeneratorService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    clock: Arc<dyn Clock>,
    // Held for the whole generation run, which also serializes concurrent
    // generate calls within this process.
    rng: Mutex<StdRng>,
}

impl ScheduleGeneratorService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self::with_clock_and_rng(
            db_pool,
            event_sender,
            Arc::new(SystemClock),
            StdRng::from_entropy(),
        )
    }

    /// Test constructor with an injected clock and a seeded RNG.
    pub fn with_clock_and_rng(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        clock: Arc<dyn Clock>,
        rng: StdRng,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            clock,
            rng: Mutex::new(rng),
        }
    }

    /// Replaces the entire schedule with freshly packed showtimes for the
    /// inclusive date range.
    ///
    /// Destructive by design: all bookings and all schedules are deleted
    /// inside the same transaction that inserts the new rows. If packing
    /// produces no slots the transaction is rolled back and the previous
    /// data stays untouched.
    #[instrument(skip(self))]
    pub async fn generate(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<GenerationSummary, ServiceError> {
        let start = NaiveDate::parse_from_str(start_date, DATE_FORMAT).map_err(|_| {
            ServiceError::InvalidInput(format!(
                "Invalid start date '{}', expected YYYY-MM-DD",
                start_date
            ))
        })?;
        let end = NaiveDate::parse_from_str(end_date, DATE_FORMAT).map_err(|_| {
            ServiceError::InvalidInput(format!(
                "Invalid end date '{}', expected YYYY-MM-DD",
                end_date
            ))
        })?;
        if start > end {
            return Err(ServiceError::InvalidInput(
                "Start date must not be after end date".to_string(),
            ));
        }
        let today = self.clock.today();
        if start < today {
            return Err(ServiceError::InvalidInput(
                "Start date must not be in the past".to_string(),
            ));
        }

        let movies = movie::Entity::find().all(&*self.db_pool).await?;
        let halls = hall::Entity::find()
            .filter(hall::Column::IsClosed.eq(false))
            .all(&*self.db_pool)
            .await?;
        if movies.is_empty() {
            return Err(ServiceError::NoCapacity(
                "No movies available for scheduling".to_string(),
            ));
        }
        if halls.is_empty() {
            return Err(ServiceError::NoCapacity(
                "No open halls available for scheduling".to_string(),
            ));
        }

        let mut rng = self.rng.lock().await;

        let txn = self.db_pool.begin().await.map_err(|e| {
            error!(error = %e, "Failed to begin schedule generation transaction");
            ServiceError::GenerationFailed(format!("Failed to begin transaction: {}", e))
        })?;

        booking::Entity::delete_many().exec(&txn).await.map_err(|e| {
            error!(error = %e, "Failed to clear bookings during regeneration");
            ServiceError::GenerationFailed(format!("Failed to clear bookings: {}", e))
        })?;
        schedule::Entity::delete_many().exec(&txn).await.map_err(|e| {
            error!(error = %e, "Failed to clear schedules during regeneration");
            ServiceError::GenerationFailed(format!("Failed to clear schedules: {}", e))
        })?;

        let slots = plan_range(
            &movies,
            &halls,
            start,
            end,
            today,
            self.clock.time_of_day(),
            &mut rng,
        );
        if slots.is_empty() {
            txn.rollback().await.map_err(|e| {
                error!(error = %e, "Failed to roll back empty generation");
                ServiceError::GenerationFailed(format!("Failed to roll back: {}", e))
            })?;
            warn!(%start, %end, "Generation produced no showtimes, previous schedule kept");
            return Err(ServiceError::NoCapacity(
                "No showtimes could be scheduled for the requested range".to_string(),
            ));
        }

        // insert_many bypasses ActiveModelBehavior, so timestamps are set here.
        let now = Utc::now();
        let count = slots.len();
        let models: Vec<schedule::ActiveModel> = slots
            .iter()
            .map(|slot| schedule::ActiveModel {
                id: Set(Uuid::new_v4()),
                movie_id: Set(slot.movie_id),
                hall_id: Set(slot.hall_id),
                show_date: Set(slot.show_date),
                start_time: Set(slot.start_time()),
                is_active: Set(true),
                created_at: Set(now),
                updated_at: Set(None),
            })
            .collect();
        schedule::Entity::insert_many(models).exec(&txn).await.map_err(|e| {
            error!(error = %e, "Failed to insert generated schedules");
            ServiceError::GenerationFailed(format!("Failed to insert schedules: {}", e))
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit schedule generation");
            ServiceError::GenerationFailed(format!("Failed to commit: {}", e))
        })?;

        info!(count, %start, %end, "Schedule generated");

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender
                .send(Event::ScheduleGenerated {
                    count,
                    start_date: start,
                    end_date: end,
                })
                .await
            {
                warn!(error = %e, "Failed to send schedule generated event");
            }
        }

        Ok(GenerationSummary {
            count,
            start_date: start,
            end_date: end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn make_movie(title: &str, duration: i32, rating: Option<&str>, popularity: f64) -> movie::Model {
        movie::Model {
            id: Uuid::new_v4(),
            title: title.to_string(),
            duration_minutes: duration,
            age_rating: rating.map(str::to_string),
            popularity_score: popularity,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn make_hall(name: &str) -> hall::Model {
        hall::Model {
            id: Uuid::new_v4(),
            name: name.to_string(),
            capacity: 100,
            hall_type: "standard".to_string(),
            is_closed: false,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn quantum_rounding_snaps_up_and_keeps_boundaries() {
        assert_eq!(round_up_to_quantum(14 * 60 + 7), 14 * 60 + 15);
        assert_eq!(round_up_to_quantum(14 * 60 + 15), 14 * 60 + 15);
        assert_eq!(round_up_to_quantum(14 * 60 + 16), 14 * 60 + 30);
        assert_eq!(round_up_to_quantum(0), 0);
    }

    #[test]
    fn age_windows() {
        assert!(age_window_allows(Some("0+"), 19 * 60 + 59));
        assert!(!age_window_allows(Some("0+"), 20 * 60));
        assert!(!age_window_allows(Some("6+"), 21 * 60));
        assert!(age_window_allows(Some("18+"), 16 * 60));
        assert!(!age_window_allows(Some("18+"), 15 * 60 + 59));
        assert!(age_window_allows(Some("12+"), 23 * 60));
        assert!(age_window_allows(None, 8 * 60));
    }

    #[test]
    fn hall_day_slots_never_overlap_and_keep_the_gap() {
        let movies: Vec<movie::Model> = (0..5)
            .map(|i| make_movie(&format!("m{}", i), 90 + 10 * i, None, 0.5))
            .collect();
        let refs: Vec<&movie::Model> = movies.iter().collect();
        let mut slots = Vec::new();
        plan_hall_day(date(2026, 9, 1), Uuid::new_v4(), &refs, OPENING_MINUTES, &mut slots);

        assert!(slots.len() >= 2);
        for pair in slots.windows(2) {
            // Placed in cursor order, so each slot starts at or after the
            // previous one's end (screening plus intermission).
            assert!(pair[1].start_minutes >= pair[0].end_minutes());
        }
        for slot in &slots {
            assert_eq!(slot.start_minutes % SLOT_QUANTUM_MINUTES, 0);
            assert!(slot.end_minutes() <= CLOSING_MINUTES);
        }
    }

    #[test]
    fn hall_day_skips_non_positive_durations() {
        let broken = make_movie("broken", 0, None, 0.9);
        let fine = make_movie("fine", 100, None, 0.9);
        let refs = vec![&broken, &fine];
        let mut slots = Vec::new();
        plan_hall_day(date(2026, 9, 1), Uuid::new_v4(), &refs, OPENING_MINUTES, &mut slots);

        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].movie_id, fine.id);
    }

    #[test]
    fn today_cursor_rounds_up_from_now() {
        let movies = vec![make_movie("a", 90, None, 0.9), make_movie("b", 100, None, 0.8)];
        let halls = vec![make_hall("hall 1")];
        let today = date(2026, 9, 1);
        let mut rng = StdRng::seed_from_u64(7);

        let slots = plan_range(&movies, &halls, today, today, today, time(14, 7), &mut rng);

        assert!(!slots.is_empty());
        for slot in &slots {
            assert!(slot.start_minutes >= 14 * 60 + 15);
        }
    }

    #[test]
    fn late_evening_today_yields_no_slots() {
        let movies = vec![make_movie("a", 90, None, 0.9), make_movie("b", 100, None, 0.8)];
        let halls = vec![make_hall("hall 1")];
        let today = date(2026, 9, 1);
        let mut rng = StdRng::seed_from_u64(7);

        let slots = plan_range(&movies, &halls, today, today, today, time(23, 50), &mut rng);
        assert!(slots.is_empty());
    }

    #[test]
    fn plan_range_is_deterministic_for_a_seed() {
        let movies: Vec<movie::Model> = (0..6)
            .map(|i| make_movie(&format!("m{}", i), 80 + 15 * i, None, 0.1 + 0.15 * i as f64))
            .collect();
        let halls = vec![make_hall("hall 1"), make_hall("hall 2")];
        let start = date(2026, 9, 1);
        let end = date(2026, 9, 3);
        let today = date(2026, 8, 25);

        let a = plan_range(&movies, &halls, start, end, today, time(9, 0), &mut StdRng::seed_from_u64(42));
        let b = plan_range(&movies, &halls, start, end, today, time(9, 0), &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn plan_range_respects_age_windows_across_seeds() {
        let movies = vec![
            make_movie("kids", 60, Some("0+"), 0.9),
            make_movie("family", 80, Some("6+"), 0.8),
            make_movie("teen", 100, Some("16+"), 0.7),
            make_movie("adult", 110, Some("18+"), 0.95),
        ];
        let by_id: std::collections::HashMap<Uuid, &movie::Model> =
            movies.iter().map(|m| (m.id, m)).collect();
        let halls = vec![make_hall("hall 1"), make_hall("hall 2")];
        let start = date(2026, 9, 1);
        let end = date(2026, 9, 2);
        let today = date(2026, 8, 25);

        for seed in 0..25 {
            let mut rng = StdRng::seed_from_u64(seed);
            let slots = plan_range(&movies, &halls, start, end, today, time(9, 0), &mut rng);
            for slot in &slots {
                let rating = by_id[&slot.movie_id].age_rating.as_deref();
                match rating {
                    Some("0+") | Some("6+") => assert!(slot.start_minutes < 20 * 60),
                    Some("18+") => assert!(slot.start_minutes >= 16 * 60),
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn plan_range_never_overlaps_within_a_hall_day() {
        let movies: Vec<movie::Model> = (0..8)
            .map(|i| make_movie(&format!("m{}", i), 70 + 12 * i, None, 0.2 + 0.1 * i as f64))
            .collect();
        let halls = vec![make_hall("hall 1"), make_hall("hall 2"), make_hall("hall 3")];
        let start = date(2026, 9, 1);
        let end = date(2026, 9, 4);
        let today = date(2026, 8, 25);

        for seed in 0..25 {
            let mut rng = StdRng::seed_from_u64(seed);
            let slots = plan_range(&movies, &halls, start, end, today, time(9, 0), &mut rng);
            for (i, a) in slots.iter().enumerate() {
                for b in slots.iter().skip(i + 1) {
                    if a.hall_id == b.hall_id && a.show_date == b.show_date {
                        assert!(
                            !overlaps(a.start_minutes, a.total_minutes, b.start_minutes, b.total_minutes),
                            "overlap between {:?} and {:?}",
                            a,
                            b
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn touching_intervals_do_not_conflict() {
        assert!(!overlaps(600, 120, 720, 90));
        assert!(overlaps(600, 121, 720, 90));
        assert!(overlaps(600, 120, 600, 120));
    }

    #[test]
    fn weighted_sample_size_bounds() {
        let one = vec![make_movie("only", 90, None, 0.5)];
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(weighted_sample(&one, &mut rng).len(), 1);

        let many: Vec<movie::Model> = (0..9)
            .map(|i| make_movie(&format!("m{}", i), 90, None, 0.5))
            .collect();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let sample = weighted_sample(&many, &mut rng);
            assert!((2..=5).contains(&sample.len()));
        }
    }
}
