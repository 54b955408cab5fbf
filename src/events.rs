use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};
use uuid::Uuid;

/// Cloneable handle for publishing domain events onto the in-process channel.
/// Services treat delivery as best-effort and log failures instead of
/// propagating them.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("event channel closed: {}", e))
    }
}

/// Domain events emitted after state changes commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Catalogue events
    MovieCreated(Uuid),
    HallCreated(Uuid),
    HallClosureToggled {
        hall_id: Uuid,
        is_closed: bool,
    },
    TicketTypeCreated(Uuid),
    PriceModifierCreated(Uuid),

    // Schedule events
    ScheduleGenerated {
        count: usize,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    ScheduleUpdated(Uuid),
    ScheduleVisibilityToggled {
        schedule_id: Uuid,
        is_active: bool,
    },
    ScheduleDeleted(Uuid),

    // Booking events
    BookingCreated {
        booking_id: Uuid,
        schedule_id: Uuid,
    },
    BookingCancelled {
        booking_id: Uuid,
        cancelled_by: Uuid,
    },

    /// Generic event with free-form payload
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

/// Consumes events off the channel and dispatches them. Today every handler
/// just logs; downstream integrations (notification fan-out, analytics) hang
/// off this loop without touching the request path.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        info!("Received event: {:?}", event);

        match event {
            Event::ScheduleGenerated {
                count,
                start_date,
                end_date,
            } => {
                if let Err(e) = handle_schedule_generated(count, start_date, end_date).await {
                    error!(
                        "Failed to handle schedule generated event: count={}, error={}",
                        count, e
                    );
                }
            }
            Event::BookingCreated {
                booking_id,
                schedule_id,
            } => {
                if let Err(e) = handle_booking_created(booking_id, schedule_id).await {
                    error!(
                        "Failed to handle booking created event: booking_id={}, error={}",
                        booking_id, e
                    );
                }
            }
            Event::BookingCancelled {
                booking_id,
                cancelled_by,
            } => {
                if let Err(e) = handle_booking_cancelled(booking_id, cancelled_by).await {
                    error!(
                        "Failed to handle booking cancelled event: booking_id={}, error={}",
                        booking_id, e
                    );
                }
            }
            other => {
                info!("Event recorded: {:?}", other);
            }
        }
    }

    info!("Event processing loop stopped");
}

async fn handle_schedule_generated(
    count: usize,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<(), String> {
    info!(
        "Schedule regenerated: {} showtimes between {} and {}",
        count, start_date, end_date
    );
    Ok(())
}

async fn handle_booking_created(booking_id: Uuid, schedule_id: Uuid) -> Result<(), String> {
    info!(
        "Processing booking created event for booking {} on schedule {}",
        booking_id, schedule_id
    );
    Ok(())
}

async fn handle_booking_cancelled(booking_id: Uuid, cancelled_by: Uuid) -> Result<(), String> {
    info!(
        "Processing booking cancelled event for booking {} (cancelled by {})",
        booking_id, cancelled_by
    );
    Ok(())
}
