//! Seat reservation with conflict protection.
//!
//! `reserve` is the single-seat-contention hot path. The application-level
//! check runs inside the insert transaction, and the store backs it with a
//! partial unique index on `(schedule_id, seat_row, seat_number)` for
//! confirmed rows, so two racing requests for the same seat cannot both
//! win: the loser surfaces as [`ServiceError::Conflict`] either way.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::booking::{self, BookingStatus};
use crate::entities::{hall, hall_row, movie, price_modifier, schedule, ticket_type, zone};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::pricing::{self, PriceQuote};

static SEAT_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)-([0-9]+)$").expect("valid seat id pattern"));

/// Request body for reserving one seat.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ReserveSeatRequest {
    pub schedule_id: Uuid,
    pub zone_id: Uuid,
    pub ticket_type_id: Uuid,
    /// "{row}-{seat}", both positive, e.g. "3-7".
    #[validate(length(min = 3, message = "Seat id must look like '3-7'"))]
    pub seat_id: String,
    pub user_id: Uuid,
}

/// One cell of the per-showtime seat map with its price breakdown.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SeatMapEntry {
    pub seat_id: String,
    pub is_taken: bool,
    pub zone_id: Uuid,
    pub base_price: Decimal,
    pub popularity_price: Decimal,
    pub time_slot_price: Decimal,
    pub final_price: Decimal,
}

/// Splits a seat id into `(row, seat)`, both strictly positive.
fn parse_seat_id(raw: &str) -> Result<(i32, i32), ServiceError> {
    let invalid = || {
        ServiceError::InvalidInput(format!(
            "Invalid seat id '{}', expected '{{row}}-{{seat}}' with positive numbers",
            raw
        ))
    };
    let caps = SEAT_ID_PATTERN.captures(raw).ok_or_else(invalid)?;
    let row: i32 = caps[1].parse().map_err(|_| invalid())?;
    let seat: i32 = caps[2].parse().map_err(|_| invalid())?;
    if row < 1 || seat < 1 {
        return Err(invalid());
    }
    Ok((row, seat))
}

/// Booking creation, cancellation and the seat map view.
pub struct BookingService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl BookingService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    async fn load_active_rules(&self) -> Result<Vec<pricing::PriceRule>, ServiceError> {
        let modifiers = price_modifier::Entity::find()
            .filter(price_modifier::Column::IsActive.eq(true))
            .order_by_asc(price_modifier::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;
        Ok(pricing::decode_active_rules(&modifiers))
    }

    /// Reserves a seat on a showtime, freezing its price.
    #[instrument(skip(self, request))]
    pub async fn reserve(&self, request: ReserveSeatRequest) -> Result<booking::Model, ServiceError> {
        request.validate()?;

        let schedule = schedule::Entity::find_by_id(request.schedule_id)
            .one(&*self.db_pool)
            .await?
            .filter(|s| s.is_active)
            .ok_or_else(|| {
                warn!(schedule_id = %request.schedule_id, "Schedule missing or inactive");
                ServiceError::NotFound(format!("Schedule {} not found", request.schedule_id))
            })?;

        let hall = hall::Entity::find_by_id(schedule.hall_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidState(format!("Hall {} is unavailable", schedule.hall_id))
            })?;
        if hall.is_closed {
            return Err(ServiceError::InvalidState(format!(
                "Hall '{}' is closed",
                hall.name
            )));
        }

        let zone = zone::Entity::find_by_id(request.zone_id)
            .one(&*self.db_pool)
            .await?
            .filter(|z| z.hall_id == schedule.hall_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Zone {} not found in hall {}",
                    request.zone_id, schedule.hall_id
                ))
            })?;

        let ticket_type = ticket_type::Entity::find_by_id(request.ticket_type_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Ticket type {} not found", request.ticket_type_id))
            })?;

        let (seat_row, seat_number) = parse_seat_id(&request.seat_id)?;

        let movie = movie::Entity::find_by_id(schedule.movie_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Movie {} not found", schedule.movie_id))
            })?;
        let rules = self.load_active_rules().await?;
        let quote = pricing::quote(
            zone.base_price,
            schedule.start_time,
            movie.popularity_score,
            &rules,
        );
        let price = pricing::round_money(quote.ticket_price(ticket_type.multiplier));

        let txn = self.db_pool.begin().await?;

        let already_taken = booking::Entity::find()
            .filter(booking::Column::ScheduleId.eq(schedule.id))
            .filter(booking::Column::SeatRow.eq(seat_row))
            .filter(booking::Column::SeatNumber.eq(seat_number))
            .filter(booking::Column::Status.eq(BookingStatus::Confirmed.as_str()))
            .one(&txn)
            .await?;
        if already_taken.is_some() {
            warn!(
                schedule_id = %schedule.id,
                seat_id = %request.seat_id,
                "Seat already booked"
            );
            return Err(ServiceError::Conflict(format!(
                "Seat {} is already booked",
                request.seat_id
            )));
        }

        let model = booking::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(request.user_id),
            schedule_id: Set(schedule.id),
            zone_id: Set(zone.id),
            ticket_type_id: Set(ticket_type.id),
            seat_row: Set(seat_row),
            seat_number: Set(seat_number),
            price: Set(price),
            status: Set(BookingStatus::Confirmed.as_str().to_string()),
            ..Default::default()
        };
        let saved = match model.insert(&txn).await {
            Ok(saved) => saved,
            // A racing reservation can slip past the check above; the
            // partial unique index turns it into a conflict here.
            Err(e) => {
                if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    warn!(
                        schedule_id = %schedule.id,
                        seat_id = %request.seat_id,
                        "Concurrent reservation lost the seat"
                    );
                    return Err(ServiceError::Conflict(format!(
                        "Seat {} is already booked",
                        request.seat_id
                    )));
                }
                return Err(ServiceError::DatabaseError(e));
            }
        };
        txn.commit().await?;

        info!(
            booking_id = %saved.id,
            schedule_id = %schedule.id,
            seat_id = %saved.seat_id(),
            price = %saved.price,
            "Seat reserved"
        );

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender
                .send(Event::BookingCreated {
                    booking_id: saved.id,
                    schedule_id: schedule.id,
                })
                .await
            {
                warn!(error = %e, "Failed to send booking created event");
            }
        }

        Ok(saved)
    }

    /// Cancels a confirmed booking. Terminal: a cancelled booking can never
    /// be re-confirmed or cancelled again.
    #[instrument(skip(self))]
    pub async fn cancel(
        &self,
        booking_id: Uuid,
        cancelled_by: Uuid,
    ) -> Result<booking::Model, ServiceError> {
        let existing = booking::Entity::find_by_id(booking_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                warn!(%booking_id, "Booking not found for cancellation");
                ServiceError::NotFound(format!("Booking {} not found", booking_id))
            })?;

        match existing.status() {
            Some(BookingStatus::Confirmed) => {}
            Some(BookingStatus::Cancelled) => {
                return Err(ServiceError::InvalidState(format!(
                    "Booking {} is already cancelled",
                    booking_id
                )));
            }
            None => {
                return Err(ServiceError::InvalidState(format!(
                    "Booking {} has unrecognized status '{}'",
                    booking_id, existing.status
                )));
            }
        }

        let mut active: booking::ActiveModel = existing.into();
        active.status = Set(BookingStatus::Cancelled.as_str().to_string());
        active.cancelled_at = Set(Some(Utc::now()));
        active.cancelled_by = Set(Some(cancelled_by));
        let updated = active.update(&*self.db_pool).await?;

        info!(%booking_id, %cancelled_by, "Booking cancelled");

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender
                .send(Event::BookingCancelled {
                    booking_id,
                    cancelled_by,
                })
                .await
            {
                warn!(error = %e, "Failed to send booking cancelled event");
            }
        }

        Ok(updated)
    }

    /// Builds the seat map for a showtime: occupancy plus the price
    /// breakdown per seat. Ticket type multipliers are not applied here;
    /// those depend on the ticket the buyer picks.
    #[instrument(skip(self))]
    pub async fn seat_map(&self, schedule_id: Uuid) -> Result<Vec<SeatMapEntry>, ServiceError> {
        let schedule = schedule::Entity::find_by_id(schedule_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                warn!(%schedule_id, "Schedule not found for seat map");
                ServiceError::NotFound(format!("Schedule {} not found", schedule_id))
            })?;
        if !schedule.is_active {
            return Err(ServiceError::InvalidState(format!(
                "Schedule {} is not active",
                schedule_id
            )));
        }

        let movie = movie::Entity::find_by_id(schedule.movie_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Movie {} not found", schedule.movie_id))
            })?;

        let rows = hall_row::Entity::find()
            .filter(hall_row::Column::HallId.eq(schedule.hall_id))
            .order_by_asc(hall_row::Column::RowNumber)
            .all(&*self.db_pool)
            .await?;
        let zones: HashMap<Uuid, zone::Model> = zone::Entity::find()
            .filter(zone::Column::HallId.eq(schedule.hall_id))
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|z| (z.id, z))
            .collect();
        let taken: HashSet<(i32, i32)> = booking::Entity::find()
            .filter(booking::Column::ScheduleId.eq(schedule_id))
            .filter(booking::Column::Status.eq(BookingStatus::Confirmed.as_str()))
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|b| (b.seat_row, b.seat_number))
            .collect();

        let rules = self.load_active_rules().await?;
        let mut quotes: HashMap<Uuid, PriceQuote> = HashMap::new();
        let mut map = Vec::new();

        for row in rows {
            let Some(zone) = zones.get(&row.zone_id) else {
                warn!(
                    row_id = %row.id,
                    zone_id = %row.zone_id,
                    "Row references a missing zone, skipping"
                );
                continue;
            };
            let quote = quotes.entry(zone.id).or_insert_with(|| {
                pricing::quote(
                    zone.base_price,
                    schedule.start_time,
                    movie.popularity_score,
                    &rules,
                )
            });

            for seat in 1..=row.seats_count.max(0) {
                map.push(SeatMapEntry {
                    seat_id: format!("{}-{}", row.row_number, seat),
                    is_taken: taken.contains(&(row.row_number, seat)),
                    zone_id: zone.id,
                    base_price: pricing::round_money(quote.base_price),
                    popularity_price: pricing::round_money(quote.popularity_price()),
                    time_slot_price: pricing::round_money(quote.time_slot_price()),
                    final_price: pricing::round_money(quote.final_price()),
                });
            }
        }

        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_id_accepts_positive_pairs() {
        assert_eq!(parse_seat_id("3-7").unwrap(), (3, 7));
        assert_eq!(parse_seat_id("12-1").unwrap(), (12, 1));
    }

    #[test]
    fn seat_id_rejects_zero_components() {
        assert!(parse_seat_id("0-5").is_err());
        assert!(parse_seat_id("3-0").is_err());
    }

    #[test]
    fn seat_id_rejects_malformed_input() {
        for bad in ["x-1", "1-2-3", "", "1_2", "-1-2", "3-", " 3-7"] {
            assert!(parse_seat_id(bad).is_err(), "accepted {:?}", bad);
        }
    }
}
