//! Catalogue management: movies, halls with their seating layout,
//! ticket types and price modifiers.
//!
//! Halls are created together with their zones and rows in one request so
//! a layout can never be half-persisted. Hall capacity is derived from the
//! rows rather than accepted from the client.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::hall::{self, HallType};
use crate::entities::hall_row::{self, SeatType};
use crate::entities::price_modifier::{self, ModifierKind};
use crate::entities::{movie, ticket_type, zone};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::pricing;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateMovieRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(range(min = 1, message = "Duration must be positive"))]
    pub duration_minutes: i32,
    pub age_rating: Option<String>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub popularity_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateZoneRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub base_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateRowRequest {
    pub row_number: i32,
    pub seats_count: i32,
    /// Name of one of the zones in the same request.
    pub zone: String,
    pub seat_type: Option<String>,
    pub spacing: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateHallRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// "standard", "comfort" or "vip".
    pub hall_type: String,
    #[validate(length(min = 1, message = "At least one zone is required"))]
    pub zones: Vec<CreateZoneRequest>,
    #[validate(length(min = 1, message = "At least one row is required"))]
    pub rows: Vec<CreateRowRequest>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateTicketTypeRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub multiplier: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreatePriceModifierRequest {
    /// "time_slot" or "popularity".
    pub kind: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub multiplier: Decimal,
    /// JSON payload matching the kind: `{"startTime","endTime"}` for
    /// time_slot, `{"minScore"}` for popularity.
    pub condition: serde_json::Value,
    pub is_active: Option<bool>,
}

/// A hall with its full seating layout.
#[derive(Debug, Clone, Serialize)]
pub struct HallDetailResponse {
    #[serde(flatten)]
    pub hall: hall::Model,
    pub zones: Vec<zone::Model>,
    pub rows: Vec<hall_row::Model>,
}

/// Cross-field checks for a hall layout. Returns the derived capacity.
fn validate_hall_layout(request: &CreateHallRequest) -> Result<i32, ServiceError> {
    let mut zone_names = HashSet::new();
    for z in &request.zones {
        if z.base_price <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(format!(
                "Zone '{}' must have a positive base price",
                z.name
            )));
        }
        if !zone_names.insert(z.name.as_str()) {
            return Err(ServiceError::InvalidInput(format!(
                "Duplicate zone name '{}'",
                z.name
            )));
        }
    }

    let mut row_numbers = HashSet::new();
    let mut capacity = 0i32;
    for r in &request.rows {
        if r.row_number < 1 {
            return Err(ServiceError::InvalidInput(format!(
                "Row number {} is invalid, rows are numbered from 1",
                r.row_number
            )));
        }
        if !row_numbers.insert(r.row_number) {
            return Err(ServiceError::InvalidInput(format!(
                "Duplicate row number {}",
                r.row_number
            )));
        }
        if r.seats_count < 1 {
            return Err(ServiceError::InvalidInput(format!(
                "Row {} must have at least one seat",
                r.row_number
            )));
        }
        if !zone_names.contains(r.zone.as_str()) {
            return Err(ServiceError::InvalidInput(format!(
                "Row {} references unknown zone '{}'",
                r.row_number, r.zone
            )));
        }
        if let Some(seat_type) = &r.seat_type {
            if seat_type.parse::<SeatType>().is_err() {
                return Err(ServiceError::InvalidInput(format!(
                    "Unknown seat type '{}'",
                    seat_type
                )));
            }
        }
        capacity += r.seats_count;
    }

    Ok(capacity)
}

/// CRUD over the scheduling inputs.
pub struct CatalogService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request))]
    pub async fn create_movie(
        &self,
        request: CreateMovieRequest,
    ) -> Result<movie::Model, ServiceError> {
        request.validate()?;

        let model = movie::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(request.title),
            duration_minutes: Set(request.duration_minutes),
            age_rating: Set(request.age_rating),
            popularity_score: Set(request.popularity_score),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        let saved = model.insert(&*self.db_pool).await?;
        info!(movie_id = %saved.id, title = %saved.title, "Movie created");

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(Event::MovieCreated(saved.id)).await {
                warn!(error = %e, "Failed to send movie created event");
            }
        }

        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn list_movies(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<movie::Model>, u64), ServiceError> {
        let paginator = movie::Entity::find()
            .order_by_asc(movie::Column::Title)
            .paginate(&*self.db_pool, limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn get_movie(&self, movie_id: Uuid) -> Result<movie::Model, ServiceError> {
        movie::Entity::find_by_id(movie_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Movie {} not found", movie_id)))
    }

    /// Creates a hall together with its zones and rows in one transaction.
    #[instrument(skip(self, request))]
    pub async fn create_hall(
        &self,
        request: CreateHallRequest,
    ) -> Result<HallDetailResponse, ServiceError> {
        request.validate()?;
        let hall_type = request.hall_type.parse::<HallType>().map_err(|_| {
            ServiceError::InvalidInput(format!(
                "Unknown hall type '{}', expected 'standard', 'comfort' or 'vip'",
                request.hall_type
            ))
        })?;
        let capacity = validate_hall_layout(&request)?;

        let hall_id = Uuid::new_v4();
        let zone_ids: HashMap<&str, Uuid> = request
            .zones
            .iter()
            .map(|z| (z.name.as_str(), Uuid::new_v4()))
            .collect();

        let zone_models: Vec<zone::ActiveModel> = request
            .zones
            .iter()
            .map(|z| zone::ActiveModel {
                id: Set(zone_ids[z.name.as_str()]),
                hall_id: Set(hall_id),
                name: Set(z.name.clone()),
                base_price: Set(z.base_price),
            })
            .collect();
        let row_models: Vec<hall_row::ActiveModel> = request
            .rows
            .iter()
            .map(|r| hall_row::ActiveModel {
                id: Set(Uuid::new_v4()),
                hall_id: Set(hall_id),
                zone_id: Set(zone_ids[r.zone.as_str()]),
                row_number: Set(r.row_number),
                seats_count: Set(r.seats_count),
                seat_type: Set(r
                    .seat_type
                    .clone()
                    .unwrap_or_else(|| SeatType::Standard.to_string())),
                spacing: Set(r.spacing.clone()),
            })
            .collect();

        let txn = self.db_pool.begin().await?;
        let hall_model = hall::ActiveModel {
            id: Set(hall_id),
            name: Set(request.name.clone()),
            capacity: Set(capacity),
            hall_type: Set(hall_type.to_string()),
            is_closed: Set(false),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        let saved_hall = hall_model.insert(&txn).await?;
        zone::Entity::insert_many(zone_models).exec(&txn).await?;
        hall_row::Entity::insert_many(row_models).exec(&txn).await?;
        txn.commit().await?;

        info!(%hall_id, name = %saved_hall.name, capacity, "Hall created");

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(Event::HallCreated(hall_id)).await {
                warn!(error = %e, "Failed to send hall created event");
            }
        }

        self.get_hall(hall_id).await
    }

    #[instrument(skip(self))]
    pub async fn list_halls(&self) -> Result<Vec<HallDetailResponse>, ServiceError> {
        let halls = hall::Entity::find()
            .order_by_asc(hall::Column::Name)
            .all(&*self.db_pool)
            .await?;
        if halls.is_empty() {
            return Ok(Vec::new());
        }

        let hall_ids: Vec<Uuid> = halls.iter().map(|h| h.id).collect();
        let mut zones_by_hall: HashMap<Uuid, Vec<zone::Model>> = HashMap::new();
        for z in zone::Entity::find()
            .filter(zone::Column::HallId.is_in(hall_ids.clone()))
            .all(&*self.db_pool)
            .await?
        {
            zones_by_hall.entry(z.hall_id).or_default().push(z);
        }
        let mut rows_by_hall: HashMap<Uuid, Vec<hall_row::Model>> = HashMap::new();
        for r in hall_row::Entity::find()
            .filter(hall_row::Column::HallId.is_in(hall_ids))
            .order_by_asc(hall_row::Column::RowNumber)
            .all(&*self.db_pool)
            .await?
        {
            rows_by_hall.entry(r.hall_id).or_default().push(r);
        }

        Ok(halls
            .into_iter()
            .map(|h| {
                let zones = zones_by_hall.remove(&h.id).unwrap_or_default();
                let rows = rows_by_hall.remove(&h.id).unwrap_or_default();
                HallDetailResponse {
                    hall: h,
                    zones,
                    rows,
                }
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_hall(&self, hall_id: Uuid) -> Result<HallDetailResponse, ServiceError> {
        let hall = hall::Entity::find_by_id(hall_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Hall {} not found", hall_id)))?;
        let zones = zone::Entity::find()
            .filter(zone::Column::HallId.eq(hall_id))
            .all(&*self.db_pool)
            .await?;
        let rows = hall_row::Entity::find()
            .filter(hall_row::Column::HallId.eq(hall_id))
            .order_by_asc(hall_row::Column::RowNumber)
            .all(&*self.db_pool)
            .await?;
        Ok(HallDetailResponse { hall, zones, rows })
    }

    /// Flips a hall between open and closed and returns the new state.
    /// Closed halls are skipped by the generator and refuse reservations.
    #[instrument(skip(self))]
    pub async fn toggle_hall_closed(&self, hall_id: Uuid) -> Result<bool, ServiceError> {
        let existing = hall::Entity::find_by_id(hall_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Hall {} not found", hall_id)))?;

        let next = !existing.is_closed;
        let mut active: hall::ActiveModel = existing.into();
        active.is_closed = Set(next);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db_pool).await?;

        info!(%hall_id, is_closed = next, "Hall closure toggled");

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender
                .send(Event::HallClosureToggled {
                    hall_id,
                    is_closed: next,
                })
                .await
            {
                warn!(error = %e, "Failed to send hall closure event");
            }
        }

        Ok(next)
    }

    #[instrument(skip(self, request))]
    pub async fn create_ticket_type(
        &self,
        request: CreateTicketTypeRequest,
    ) -> Result<ticket_type::Model, ServiceError> {
        request.validate()?;
        if request.multiplier <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "Ticket type multiplier must be positive".to_string(),
            ));
        }

        let model = ticket_type::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.clone()),
            multiplier: Set(request.multiplier),
            created_at: Set(Utc::now()),
        };
        let saved = match model.insert(&*self.db_pool).await {
            Ok(saved) => saved,
            Err(e) => {
                if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    return Err(ServiceError::Conflict(format!(
                        "Ticket type '{}' already exists",
                        request.name
                    )));
                }
                return Err(ServiceError::DatabaseError(e));
            }
        };
        info!(ticket_type_id = %saved.id, name = %saved.name, "Ticket type created");

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(Event::TicketTypeCreated(saved.id)).await {
                warn!(error = %e, "Failed to send ticket type created event");
            }
        }

        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn list_ticket_types(&self) -> Result<Vec<ticket_type::Model>, ServiceError> {
        Ok(ticket_type::Entity::find()
            .order_by_asc(ticket_type::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    /// Creates a price modifier after checking that the condition payload
    /// decodes against the declared kind, so pricing never has to reject it.
    #[instrument(skip(self, request))]
    pub async fn create_price_modifier(
        &self,
        request: CreatePriceModifierRequest,
    ) -> Result<price_modifier::Model, ServiceError> {
        request.validate()?;
        let kind = ModifierKind::from_str(&request.kind).ok_or_else(|| {
            ServiceError::InvalidInput(format!(
                "Unknown modifier kind '{}', expected 'time_slot' or 'popularity'",
                request.kind
            ))
        })?;
        if request.multiplier <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "Modifier multiplier must be positive".to_string(),
            ));
        }

        let condition = request.condition.to_string();
        match kind {
            ModifierKind::TimeSlot => {
                let (start, end) = pricing::parse_time_window(&condition)
                    .map_err(|reason| {
                        ServiceError::InvalidInput(format!("Invalid time slot condition: {}", reason))
                    })?;
                if start > end {
                    warn!(
                        name = %request.name,
                        %start,
                        %end,
                        "Time window starts after it ends and will never match"
                    );
                }
            }
            ModifierKind::Popularity => {
                pricing::parse_popularity_threshold(&condition).map_err(|reason| {
                    ServiceError::InvalidInput(format!("Invalid popularity condition: {}", reason))
                })?;
            }
        }

        let model = price_modifier::ActiveModel {
            id: Set(Uuid::new_v4()),
            kind: Set(kind.as_str().to_string()),
            name: Set(request.name),
            multiplier: Set(request.multiplier),
            condition: Set(condition),
            is_active: Set(request.is_active.unwrap_or(true)),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        let saved = model.insert(&*self.db_pool).await?;
        info!(modifier_id = %saved.id, kind = %saved.kind, name = %saved.name, "Price modifier created");

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(Event::PriceModifierCreated(saved.id)).await {
                warn!(error = %e, "Failed to send price modifier created event");
            }
        }

        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn list_price_modifiers(
        &self,
    ) -> Result<Vec<price_modifier::Model>, ServiceError> {
        Ok(price_modifier::Entity::find()
            .order_by_asc(price_modifier::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn layout() -> CreateHallRequest {
        CreateHallRequest {
            name: "Hall 1".to_string(),
            hall_type: "standard".to_string(),
            zones: vec![
                CreateZoneRequest {
                    name: "Parterre".to_string(),
                    base_price: dec!(10),
                },
                CreateZoneRequest {
                    name: "Balcony".to_string(),
                    base_price: dec!(15),
                },
            ],
            rows: vec![
                CreateRowRequest {
                    row_number: 1,
                    seats_count: 12,
                    zone: "Parterre".to_string(),
                    seat_type: None,
                    spacing: None,
                },
                CreateRowRequest {
                    row_number: 2,
                    seats_count: 10,
                    zone: "Balcony".to_string(),
                    seat_type: Some("sofa".to_string()),
                    spacing: Some("wide".to_string()),
                },
            ],
        }
    }

    #[test]
    fn layout_capacity_is_the_seat_sum() {
        assert_eq!(validate_hall_layout(&layout()).unwrap(), 22);
    }

    #[test]
    fn layout_rejects_duplicate_row_numbers() {
        let mut request = layout();
        request.rows[1].row_number = 1;
        assert!(matches!(
            validate_hall_layout(&request),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn layout_rejects_unknown_zone_reference() {
        let mut request = layout();
        request.rows[0].zone = "Royal Box".to_string();
        assert!(matches!(
            validate_hall_layout(&request),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn layout_rejects_non_positive_prices_and_seats() {
        let mut request = layout();
        request.zones[0].base_price = dec!(0);
        assert!(validate_hall_layout(&request).is_err());

        let mut request = layout();
        request.rows[0].seats_count = 0;
        assert!(validate_hall_layout(&request).is_err());
    }

    #[test]
    fn layout_rejects_unknown_seat_type() {
        let mut request = layout();
        request.rows[0].seat_type = Some("throne".to_string());
        assert!(validate_hall_layout(&request).is_err());
    }
}
