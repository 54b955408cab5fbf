//! Showtime listing and admin edits.
//!
//! Listing embeds the related movie and hall (with its zones) so the
//! storefront can render a showtime card from a single call. Admin
//! operations cover per-showtime edits, visibility toggles and deletion;
//! bulk creation belongs to the generator.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::booking::{self, BookingStatus};
use crate::entities::{hall, movie, schedule, zone};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Optional filters for the public showtime listing.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ScheduleFilters {
    pub movie_id: Option<Uuid>,
    pub hall_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// Partial update for a single showtime. Absent fields are left unchanged.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateScheduleRequest {
    pub movie_id: Option<Uuid>,
    pub hall_id: Option<Uuid>,
    pub show_date: Option<NaiveDate>,
    /// "HH:MM" or "HH:MM:SS".
    pub start_time: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MovieSummary {
    pub id: Uuid,
    pub title: String,
    pub duration_minutes: i32,
    pub age_rating: Option<String>,
    pub popularity_score: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ZoneSummary {
    pub id: Uuid,
    pub name: String,
    pub base_price: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HallSummary {
    pub id: Uuid,
    pub name: String,
    pub hall_type: String,
    pub is_closed: bool,
    pub zones: Vec<ZoneSummary>,
}

/// A showtime with its embedded movie and hall data.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScheduleResponse {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub hall_id: Uuid,
    pub show_date: NaiveDate,
    pub start_time: NaiveTime,
    pub is_active: bool,
    pub movie: Option<MovieSummary>,
    pub hall: Option<HallSummary>,
}

fn assemble_responses(
    schedules: Vec<schedule::Model>,
    movies: Vec<movie::Model>,
    halls: Vec<hall::Model>,
    zones: Vec<zone::Model>,
) -> Vec<ScheduleResponse> {
    let movies_by_id: HashMap<Uuid, movie::Model> =
        movies.into_iter().map(|m| (m.id, m)).collect();
    let mut zones_by_hall: HashMap<Uuid, Vec<ZoneSummary>> = HashMap::new();
    for z in zones {
        zones_by_hall.entry(z.hall_id).or_default().push(ZoneSummary {
            id: z.id,
            name: z.name,
            base_price: z.base_price,
        });
    }
    let halls_by_id: HashMap<Uuid, hall::Model> = halls.into_iter().map(|h| (h.id, h)).collect();

    schedules
        .into_iter()
        .map(|s| {
            let movie = movies_by_id.get(&s.movie_id).map(|m| MovieSummary {
                id: m.id,
                title: m.title.clone(),
                duration_minutes: m.duration_minutes,
                age_rating: m.age_rating.clone(),
                popularity_score: m.popularity_score,
            });
            let hall = halls_by_id.get(&s.hall_id).map(|h| HallSummary {
                id: h.id,
                name: h.name.clone(),
                hall_type: h.hall_type.clone(),
                is_closed: h.is_closed,
                zones: zones_by_hall.get(&h.id).cloned().unwrap_or_default(),
            });
            ScheduleResponse {
                id: s.id,
                movie_id: s.movie_id,
                hall_id: s.hall_id,
                show_date: s.show_date,
                start_time: s.start_time,
                is_active: s.is_active,
                movie,
                hall,
            }
        })
        .collect()
}

fn parse_start_time(raw: &str) -> Result<NaiveTime, ServiceError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| {
            ServiceError::InvalidInput(format!("Invalid start time '{}', expected HH:MM", raw))
        })
}

/// Read and admin operations over persisted showtimes.
pub struct ScheduleService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl ScheduleService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Lists showtimes ordered by date and start time, with embedded
    /// movie and hall data.
    #[instrument(skip(self))]
    pub async fn list(&self, filters: ScheduleFilters) -> Result<Vec<ScheduleResponse>, ServiceError> {
        let mut query = schedule::Entity::find();
        if let Some(movie_id) = filters.movie_id {
            query = query.filter(schedule::Column::MovieId.eq(movie_id));
        }
        if let Some(hall_id) = filters.hall_id {
            query = query.filter(schedule::Column::HallId.eq(hall_id));
        }
        if let Some(is_active) = filters.is_active {
            query = query.filter(schedule::Column::IsActive.eq(is_active));
        }
        if let Some(from) = filters.date_from {
            query = query.filter(schedule::Column::ShowDate.gte(from));
        }
        if let Some(to) = filters.date_to {
            query = query.filter(schedule::Column::ShowDate.lte(to));
        }

        let schedules = query
            .order_by_asc(schedule::Column::ShowDate)
            .order_by_asc(schedule::Column::StartTime)
            .all(&*self.db_pool)
            .await?;
        if schedules.is_empty() {
            return Ok(Vec::new());
        }

        let movie_ids: Vec<Uuid> = schedules.iter().map(|s| s.movie_id).collect();
        let hall_ids: Vec<Uuid> = schedules.iter().map(|s| s.hall_id).collect();

        let movies = movie::Entity::find()
            .filter(movie::Column::Id.is_in(movie_ids))
            .all(&*self.db_pool)
            .await?;
        let halls = hall::Entity::find()
            .filter(hall::Column::Id.is_in(hall_ids.clone()))
            .all(&*self.db_pool)
            .await?;
        let zones = zone::Entity::find()
            .filter(zone::Column::HallId.is_in(hall_ids))
            .all(&*self.db_pool)
            .await?;

        Ok(assemble_responses(schedules, movies, halls, zones))
    }

    /// Applies a partial edit to one showtime.
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        schedule_id: Uuid,
        request: UpdateScheduleRequest,
    ) -> Result<schedule::Model, ServiceError> {
        let existing = schedule::Entity::find_by_id(schedule_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                warn!(%schedule_id, "Schedule not found for update");
                ServiceError::NotFound(format!("Schedule {} not found", schedule_id))
            })?;

        if let Some(movie_id) = request.movie_id {
            movie::Entity::find_by_id(movie_id)
                .one(&*self.db_pool)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Movie {} not found", movie_id)))?;
        }
        if let Some(hall_id) = request.hall_id {
            hall::Entity::find_by_id(hall_id)
                .one(&*self.db_pool)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Hall {} not found", hall_id)))?;
        }
        let start_time = request
            .start_time
            .as_deref()
            .map(parse_start_time)
            .transpose()?;

        let mut active: schedule::ActiveModel = existing.into();
        if let Some(movie_id) = request.movie_id {
            active.movie_id = Set(movie_id);
        }
        if let Some(hall_id) = request.hall_id {
            active.hall_id = Set(hall_id);
        }
        if let Some(show_date) = request.show_date {
            active.show_date = Set(show_date);
        }
        if let Some(start_time) = start_time {
            active.start_time = Set(start_time);
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(&*self.db_pool).await?;
        info!(%schedule_id, "Schedule updated");

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(Event::ScheduleUpdated(schedule_id)).await {
                warn!(error = %e, "Failed to send schedule updated event");
            }
        }

        Ok(updated)
    }

    /// Flips a showtime's public visibility and returns the new state.
    #[instrument(skip(self))]
    pub async fn toggle_active(&self, schedule_id: Uuid) -> Result<bool, ServiceError> {
        let existing = schedule::Entity::find_by_id(schedule_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                warn!(%schedule_id, "Schedule not found for toggle");
                ServiceError::NotFound(format!("Schedule {} not found", schedule_id))
            })?;

        let next = !existing.is_active;
        let mut active: schedule::ActiveModel = existing.into();
        active.is_active = Set(next);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db_pool).await?;

        info!(%schedule_id, is_active = next, "Schedule visibility toggled");

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender
                .send(Event::ScheduleVisibilityToggled {
                    schedule_id,
                    is_active: next,
                })
                .await
            {
                warn!(error = %e, "Failed to send schedule visibility event");
            }
        }

        Ok(next)
    }

    /// Deletes one showtime.
    ///
    /// Refused while confirmed bookings reference it; cancelled bookings
    /// are removed together with the schedule in one transaction.
    #[instrument(skip(self))]
    pub async fn delete(&self, schedule_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;

        let existing = schedule::Entity::find_by_id(schedule_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                warn!(%schedule_id, "Schedule not found for delete");
                ServiceError::NotFound(format!("Schedule {} not found", schedule_id))
            })?;

        let confirmed = booking::Entity::find()
            .filter(booking::Column::ScheduleId.eq(schedule_id))
            .filter(booking::Column::Status.eq(BookingStatus::Confirmed.as_str()))
            .count(&txn)
            .await?;
        if confirmed > 0 {
            warn!(%schedule_id, confirmed, "Refusing to delete schedule with confirmed bookings");
            return Err(ServiceError::InvalidState(format!(
                "Schedule {} has {} confirmed booking(s), cancel them first",
                schedule_id, confirmed
            )));
        }

        booking::Entity::delete_many()
            .filter(booking::Column::ScheduleId.eq(schedule_id))
            .exec(&txn)
            .await?;
        schedule::Entity::delete_by_id(existing.id).exec(&txn).await?;
        txn.commit().await?;

        info!(%schedule_id, "Schedule deleted");

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(Event::ScheduleDeleted(schedule_id)).await {
                warn!(error = %e, "Failed to send schedule deleted event");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_schedule(movie_id: Uuid, hall_id: Uuid) -> schedule::Model {
        schedule::Model {
            id: Uuid::new_v4(),
            movie_id,
            hall_id,
            show_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn assembly_embeds_movie_hall_and_zones() {
        let movie = movie::Model {
            id: Uuid::new_v4(),
            title: "Solaris".to_string(),
            duration_minutes: 167,
            age_rating: Some("12+".to_string()),
            popularity_score: 0.7,
            created_at: Utc::now(),
            updated_at: None,
        };
        let hall = hall::Model {
            id: Uuid::new_v4(),
            name: "Hall 1".to_string(),
            capacity: 80,
            hall_type: "standard".to_string(),
            is_closed: false,
            created_at: Utc::now(),
            updated_at: None,
        };
        let zone = zone::Model {
            id: Uuid::new_v4(),
            hall_id: hall.id,
            name: "Parterre".to_string(),
            base_price: dec!(10),
        };
        let schedule = sample_schedule(movie.id, hall.id);

        let out = assemble_responses(vec![schedule], vec![movie], vec![hall], vec![zone]);
        assert_eq!(out.len(), 1);

        let embedded_movie = out[0].movie.as_ref().unwrap();
        assert_eq!(embedded_movie.title, "Solaris");
        let embedded_hall = out[0].hall.as_ref().unwrap();
        assert_eq!(embedded_hall.zones.len(), 1);
        assert_eq!(embedded_hall.zones[0].base_price, dec!(10));
    }

    #[test]
    fn assembly_tolerates_missing_relations() {
        let schedule = sample_schedule(Uuid::new_v4(), Uuid::new_v4());
        let out = assemble_responses(vec![schedule], vec![], vec![], vec![]);
        assert_eq!(out.len(), 1);
        assert!(out[0].movie.is_none());
        assert!(out[0].hall.is_none());
    }

    #[test]
    fn start_time_accepts_short_and_long_forms() {
        assert_eq!(
            parse_start_time("19:00").unwrap(),
            NaiveTime::from_hms_opt(19, 0, 0).unwrap()
        );
        assert_eq!(
            parse_start_time("19:00:30").unwrap(),
            NaiveTime::from_hms_opt(19, 0, 30).unwrap()
        );
        assert!(parse_start_time("7pm").is_err());
    }
}
