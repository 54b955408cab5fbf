pub mod booking;
pub mod hall;
pub mod hall_row;
pub mod movie;
pub mod price_modifier;
pub mod schedule;
pub mod ticket_type;
pub mod zone;
