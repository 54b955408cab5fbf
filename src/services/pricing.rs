//! Seat pricing engine.
//!
//! A quoted seat price is the zone base price scaled by up to two
//! multipliers, one per modifier kind:
//!
//! ```text
//! final = base * popularity_multiplier * time_slot_multiplier
//! ```
//!
//! Modifier conditions are stored as JSON and decoded into [`PriceRule`]s
//! up front. A modifier whose condition cannot be decoded is logged and
//! treated as inactive rather than failing the quote. All arithmetic is
//! exact `Decimal`; rounding happens once, at the storage boundary, via
//! [`round_money`].

use chrono::NaiveTime;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use tracing::warn;

use crate::entities::price_modifier::{self, ModifierKind};

/// A decoded, ready-to-evaluate pricing rule.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceRule {
    /// Applies when the showtime start falls inside the window,
    /// both ends inclusive.
    TimeWindow {
        start: NaiveTime,
        end: NaiveTime,
        multiplier: Decimal,
    },
    /// Applies when the movie's popularity score reaches the threshold.
    PopularityThreshold {
        min_score: f64,
        multiplier: Decimal,
    },
}

#[derive(Debug, Deserialize)]
struct TimeWindowCondition {
    #[serde(rename = "startTime")]
    start_time: String,
    #[serde(rename = "endTime")]
    end_time: String,
}

#[derive(Debug, Deserialize)]
struct PopularityCondition {
    #[serde(rename = "minScore")]
    min_score: f64,
}

fn parse_rule_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

/// Parses a `time_slot` condition payload into its window bounds.
pub fn parse_time_window(condition: &str) -> Result<(NaiveTime, NaiveTime), String> {
    let parsed: TimeWindowCondition = serde_json::from_str(condition)
        .map_err(|e| format!("expected {{\"startTime\",\"endTime\"}}: {}", e))?;
    let start = parse_rule_time(&parsed.start_time)
        .ok_or_else(|| format!("unparseable startTime '{}'", parsed.start_time))?;
    let end = parse_rule_time(&parsed.end_time)
        .ok_or_else(|| format!("unparseable endTime '{}'", parsed.end_time))?;
    Ok((start, end))
}

/// Parses a `popularity` condition payload into its score threshold.
pub fn parse_popularity_threshold(condition: &str) -> Result<f64, String> {
    let parsed: PopularityCondition = serde_json::from_str(condition)
        .map_err(|e| format!("expected {{\"minScore\"}}: {}", e))?;
    Ok(parsed.min_score)
}

/// Decodes a single modifier row into a rule.
///
/// Returns `None` when the kind is unknown or the condition JSON does not
/// match the kind's shape. Callers treat `None` as "modifier inactive".
pub fn decode_rule(modifier: &price_modifier::Model) -> Option<PriceRule> {
    let Some(kind) = ModifierKind::from_str(&modifier.kind) else {
        warn!(
            modifier_id = %modifier.id,
            kind = %modifier.kind,
            "Unknown price modifier kind, skipping"
        );
        return None;
    };

    match kind {
        ModifierKind::TimeSlot => match parse_time_window(&modifier.condition) {
            Ok((start, end)) => Some(PriceRule::TimeWindow {
                start,
                end,
                multiplier: modifier.multiplier,
            }),
            Err(reason) => {
                warn!(
                    modifier_id = %modifier.id,
                    name = %modifier.name,
                    reason,
                    "Malformed time slot condition, modifier treated as inactive"
                );
                None
            }
        },
        ModifierKind::Popularity => match parse_popularity_threshold(&modifier.condition) {
            Ok(min_score) => Some(PriceRule::PopularityThreshold {
                min_score,
                multiplier: modifier.multiplier,
            }),
            Err(reason) => {
                warn!(
                    modifier_id = %modifier.id,
                    name = %modifier.name,
                    reason,
                    "Malformed popularity condition, modifier treated as inactive"
                );
                None
            }
        },
    }
}

/// Decodes every active modifier, dropping inactive and malformed rows.
///
/// Row order is preserved; when several rules of the same kind match,
/// the first one in this slice wins.
pub fn decode_active_rules(modifiers: &[price_modifier::Model]) -> Vec<PriceRule> {
    modifiers
        .iter()
        .filter(|m| m.is_active)
        .filter_map(decode_rule)
        .collect()
}

/// The exact (unrounded) price breakdown for one seat at one showtime.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub base_price: Decimal,
    pub popularity_multiplier: Decimal,
    pub time_slot_multiplier: Decimal,
}

impl PriceQuote {
    /// Base price scaled by the popularity multiplier alone.
    pub fn popularity_price(&self) -> Decimal {
        self.base_price * self.popularity_multiplier
    }

    /// Base price scaled by the time slot multiplier alone.
    pub fn time_slot_price(&self) -> Decimal {
        self.base_price * self.time_slot_multiplier
    }

    /// The composed seat price, both multipliers applied.
    pub fn final_price(&self) -> Decimal {
        self.base_price * self.popularity_multiplier * self.time_slot_multiplier
    }

    /// Purchase price for a given ticket type.
    pub fn ticket_price(&self, ticket_multiplier: Decimal) -> Decimal {
        self.final_price() * ticket_multiplier
    }
}

/// Computes the price quote for one seat.
///
/// For each rule kind, the first rule whose condition holds supplies the
/// multiplier; kinds with no matching rule contribute `1.0`. Pure and
/// deterministic: same inputs, same quote.
pub fn quote(
    base_price: Decimal,
    show_time: NaiveTime,
    popularity_score: f64,
    rules: &[PriceRule],
) -> PriceQuote {
    let mut popularity: Option<Decimal> = None;
    let mut time_slot: Option<Decimal> = None;

    for rule in rules {
        match rule {
            PriceRule::PopularityThreshold {
                min_score,
                multiplier,
            } => {
                if popularity.is_none() && popularity_score >= *min_score {
                    popularity = Some(*multiplier);
                }
            }
            PriceRule::TimeWindow {
                start,
                end,
                multiplier,
            } => {
                if time_slot.is_none() && show_time >= *start && show_time <= *end {
                    time_slot = Some(*multiplier);
                }
            }
        }
    }

    PriceQuote {
        base_price,
        popularity_multiplier: popularity.unwrap_or(Decimal::ONE),
        time_slot_multiplier: time_slot.unwrap_or(Decimal::ONE),
    }
}

/// Rounds a computed price to cents, half away from zero.
///
/// Applied exactly once per price, when it is persisted or rendered.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn modifier(kind: &str, multiplier: Decimal, condition: &str, active: bool) -> price_modifier::Model {
        price_modifier::Model {
            id: Uuid::new_v4(),
            kind: kind.to_string(),
            name: format!("{} test rule", kind),
            multiplier,
            condition: condition.to_string(),
            is_active: active,
            created_at: chrono::Utc::now(),
            updated_at: None,
        }
    }

    fn evening_and_popular_rules() -> Vec<PriceRule> {
        vec![
            PriceRule::TimeWindow {
                start: time(18, 0),
                end: time(22, 0),
                multiplier: dec!(1.2),
            },
            PriceRule::PopularityThreshold {
                min_score: 0.8,
                multiplier: dec!(1.3),
            },
        ]
    }

    #[test]
    fn composed_quote_and_ticket_price() {
        let rules = evening_and_popular_rules();
        let q = quote(dec!(10), time(19, 0), 0.9, &rules);

        assert_eq!(q.popularity_multiplier, dec!(1.3));
        assert_eq!(q.time_slot_multiplier, dec!(1.2));
        assert_eq!(q.popularity_price(), dec!(13));
        assert_eq!(q.time_slot_price(), dec!(12));
        assert_eq!(q.final_price(), dec!(15.6));
        assert_eq!(q.ticket_price(dec!(0.8)), dec!(12.48));
    }

    #[test]
    fn quote_is_deterministic() {
        let rules = evening_and_popular_rules();
        let a = quote(dec!(10), time(19, 0), 0.9, &rules);
        let b = quote(dec!(10), time(19, 0), 0.9, &rules);
        assert_eq!(a, b);
        assert_eq!(a.final_price(), b.final_price());
    }

    #[test]
    fn time_window_bounds_are_inclusive() {
        let rules = evening_and_popular_rules();

        let at_open = quote(dec!(10), time(18, 0), 0.0, &rules);
        assert_eq!(at_open.time_slot_multiplier, dec!(1.2));

        let at_close = quote(dec!(10), time(22, 0), 0.0, &rules);
        assert_eq!(at_close.time_slot_multiplier, dec!(1.2));

        let before = quote(dec!(10), time(17, 59), 0.0, &rules);
        assert_eq!(before.time_slot_multiplier, Decimal::ONE);

        let after = quote(dec!(10), time(22, 1), 0.0, &rules);
        assert_eq!(after.time_slot_multiplier, Decimal::ONE);
    }

    #[test]
    fn popularity_threshold_is_inclusive() {
        let rules = evening_and_popular_rules();

        let at_threshold = quote(dec!(10), time(12, 0), 0.8, &rules);
        assert_eq!(at_threshold.popularity_multiplier, dec!(1.3));

        let below = quote(dec!(10), time(12, 0), 0.79, &rules);
        assert_eq!(below.popularity_multiplier, Decimal::ONE);
        assert_eq!(below.final_price(), dec!(10));
    }

    #[test]
    fn first_matching_rule_per_kind_wins() {
        let rules = vec![
            PriceRule::PopularityThreshold {
                min_score: 0.5,
                multiplier: dec!(1.1),
            },
            PriceRule::PopularityThreshold {
                min_score: 0.5,
                multiplier: dec!(2.0),
            },
        ];
        let q = quote(dec!(10), time(12, 0), 0.9, &rules);
        assert_eq!(q.popularity_multiplier, dec!(1.1));
    }

    #[test]
    fn non_matching_first_rule_does_not_shadow_later_ones() {
        let rules = vec![
            PriceRule::PopularityThreshold {
                min_score: 0.95,
                multiplier: dec!(2.0),
            },
            PriceRule::PopularityThreshold {
                min_score: 0.5,
                multiplier: dec!(1.1),
            },
        ];
        let q = quote(dec!(10), time(12, 0), 0.9, &rules);
        assert_eq!(q.popularity_multiplier, dec!(1.1));
    }

    #[test]
    fn decode_skips_inactive_and_malformed_rows() {
        let rows = vec![
            modifier("time_slot", dec!(1.2), r#"{"startTime":"18:00","endTime":"22:00"}"#, false),
            modifier("time_slot", dec!(1.5), r#"{"start":"18:00"}"#, true),
            modifier("popularity", dec!(1.3), r#"{"minScore":0.8}"#, true),
            modifier("loyalty", dec!(0.9), r#"{}"#, true),
        ];
        let rules = decode_active_rules(&rows);

        assert_eq!(
            rules,
            vec![PriceRule::PopularityThreshold {
                min_score: 0.8,
                multiplier: dec!(1.3),
            }]
        );
    }

    #[test]
    fn malformed_condition_contributes_unit_multiplier() {
        let rows = vec![modifier("time_slot", dec!(1.2), "not json at all", true)];
        let rules = decode_active_rules(&rows);
        let q = quote(dec!(10), time(19, 0), 0.9, &rules);
        assert_eq!(q.final_price(), dec!(10));
    }

    #[test]
    fn decode_accepts_seconds_in_window_bounds() {
        let rows = vec![modifier(
            "time_slot",
            dec!(1.2),
            r#"{"startTime":"18:00:00","endTime":"22:00:00"}"#,
            true,
        )];
        let rules = decode_active_rules(&rows);
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn rounding_happens_only_at_the_boundary() {
        let rules = vec![
            PriceRule::TimeWindow {
                start: time(10, 0),
                end: time(23, 0),
                multiplier: dec!(1.1),
            },
            PriceRule::PopularityThreshold {
                min_score: 0.0,
                multiplier: dec!(1.15),
            },
        ];
        let q = quote(dec!(9.99), time(12, 0), 0.5, &rules);

        assert_eq!(q.final_price(), dec!(12.637350));
        assert_eq!(round_money(q.final_price()), dec!(12.64));
    }

    #[test]
    fn round_money_is_half_up() {
        assert_eq!(round_money(dec!(12.125)), dec!(12.13));
        assert_eq!(round_money(dec!(12.124)), dec!(12.12));
    }
}
