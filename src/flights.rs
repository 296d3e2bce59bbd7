use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// One row of the upstream flight board.
///
/// Field names follow our domain vocabulary; the `rename` attributes carry
/// the upstream datastore column names (`CHOPER`, `CHSTOL`, ...). All columns
/// are strings on the wire except `_id`; a few arrive as `null` for some rows
/// and are normalized to empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    /// Upstream-assigned row index. Positive, but not stable across
    /// refetches: the dataset is a rolling window.
    #[serde(rename = "_id")]
    pub id: i64,
    /// Operator code; together with `flight_number` forms the human-facing
    /// flight identifier (e.g. "LY" + "315").
    #[serde(rename = "CHOPER")]
    pub operator_code: String,
    #[serde(rename = "CHFLTN")]
    pub flight_number: String,
    #[serde(rename = "CHOPERD")]
    pub airline_name: String,
    #[serde(rename = "CHSTOL")]
    pub scheduled_time: String,
    #[serde(rename = "CHPTOL")]
    pub actual_time: String,
    #[serde(rename = "CHAORD", default, deserialize_with = "nullable_string")]
    pub gate: String,
    #[serde(rename = "CHLOC1")]
    pub destination_code_short: String,
    #[serde(rename = "CHLOC1D")]
    pub destination_name_full: String,
    #[serde(rename = "CHLOC1CH")]
    pub city_name_local: String,
    #[serde(rename = "CHLOC1T")]
    pub city_name_english: String,
    #[serde(rename = "CHLOC1TH")]
    pub country_name_local: String,
    #[serde(rename = "CHLOCCT")]
    pub country_name_english: String,
    #[serde(rename = "CHTERM", default, deserialize_with = "nullable_string")]
    pub terminal: String,
    /// Check-in counter. Together with `check_in_zone` this is the only
    /// direction signal the upstream exposes: both set for outbound flights,
    /// both empty (or null) for inbound ones.
    #[serde(rename = "CHCINT", default, deserialize_with = "nullable_string")]
    pub check_in_counter: String,
    #[serde(rename = "CHCKZN", default, deserialize_with = "nullable_string")]
    pub check_in_zone: String,
    #[serde(rename = "CHRMINE", default, deserialize_with = "nullable_string")]
    pub status_english: String,
    #[serde(rename = "CHRMINH", default, deserialize_with = "nullable_string")]
    pub status_local: String,
}

/// Upstream sends `null` for several columns on some rows; treat it as an
/// empty string so the emptiness-based derivations below stay uniform.
fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl FlightRecord {
    /// Derived direction: outbound iff both check-in fields are non-empty.
    /// Kept as a pure derivation so an explicit direction column upstream
    /// could replace it without touching callers.
    pub fn is_outbound(&self) -> bool {
        !self.check_in_counter.is_empty() && !self.check_in_zone.is_empty()
    }

    /// Inbound is the stricter complement: both check-in fields empty.
    /// A row with exactly one field set matches neither direction.
    pub fn is_inbound(&self) -> bool {
        self.check_in_counter.is_empty() && self.check_in_zone.is_empty()
    }

    /// A flight is delayed iff the scheduled and actual timestamps differ as
    /// raw strings. Not a time comparison: two renderings of the same
    /// instant count as delayed.
    pub fn is_delayed(&self) -> bool {
        self.scheduled_time != self.actual_time
    }

    /// Human-facing flight identifier, e.g. "LY315".
    pub fn flight_code(&self) -> String {
        format!("{}{}", self.operator_code, self.flight_number)
    }

    /// Scheduled time parsed as a naive local timestamp. The board renders
    /// `2024-01-01T10:00:00`; some revisions drop the seconds.
    pub fn scheduled(&self) -> Option<NaiveDateTime> {
        parse_board_time(&self.scheduled_time)
    }
}

fn parse_board_time(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
}

/// Direction of travel relative to the local airport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Outbound,
    Inbound,
    #[default]
    Any,
}

/// Per-request filter configuration. Built by each handler, handed to the
/// data fetcher, discarded with the request.
#[derive(Debug, Clone, Default)]
pub struct FlightFilter {
    pub direction: Direction,
    pub country: Option<String>,
}

impl FlightFilter {
    pub fn direction(direction: Direction) -> Self {
        Self {
            direction,
            country: None,
        }
    }

    pub fn country(direction: Direction, country: impl Into<String>) -> Self {
        Self {
            direction,
            country: Some(country.into()),
        }
    }

    /// Apply the filter, preserving upstream order.
    ///
    /// The country predicate matches the English country name OR the local
    /// city-name column; the coupling is inherited from the upstream
    /// consumers of this dataset and is part of the contract.
    pub fn apply(&self, mut records: Vec<FlightRecord>) -> Vec<FlightRecord> {
        if let Some(country) = &self.country {
            records
                .retain(|r| &r.country_name_english == country || &r.city_name_local == country);
        }

        match self.direction {
            Direction::Outbound => records.retain(FlightRecord::is_outbound),
            Direction::Inbound => records.retain(FlightRecord::is_inbound),
            Direction::Any => {}
        }

        records
    }
}

/// City (English name) with the most flights in `records`, intended to be
/// called on an outbound-filtered set.
///
/// Ties break to the first city encountered with the maximum count during a
/// left-to-right scan of the records, so the result is a function of
/// upstream order, never of map iteration order. Rows with an empty city
/// name are skipped. Returns `None` for an empty set.
pub fn most_popular_destination(records: &[FlightRecord]) -> Option<&str> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        let city = record.city_name_english.as_str();
        if !city.is_empty() {
            *counts.entry(city).or_insert(0) += 1;
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for record in records {
        let city = record.city_name_english.as_str();
        if city.is_empty() {
            continue;
        }
        let count = counts[city];
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((city, count));
        }
    }

    best.map(|(city, _)| city)
}

/// Find a same-city round trip: an outbound flight to a city followed by an
/// inbound flight from that city with a later scheduled time.
///
/// This is a full cross-product scan with an unconditional overwrite on
/// every match, so the LAST matching pair in scan order wins, not the
/// earliest-return one. That is the shipped contract of the endpoint and
/// callers rely on it. A record whose timestamp fails to parse never
/// matches.
pub fn find_quick_getaway<'a>(
    outbound: &'a [FlightRecord],
    inbound: &'a [FlightRecord],
) -> Option<(&'a FlightRecord, &'a FlightRecord)> {
    let mut matched = None;

    for departure in outbound {
        for arrival in inbound {
            if departure.city_name_english != arrival.city_name_english {
                continue;
            }
            if let (Some(out_time), Some(in_time)) = (departure.scheduled(), arrival.scheduled())
                && out_time < in_time
            {
                matched = Some((departure, arrival));
            }
        }
    }

    matched
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, city: &str, counter: &str, zone: &str) -> FlightRecord {
        FlightRecord {
            id,
            operator_code: "LY".to_string(),
            flight_number: format!("{id:03}"),
            airline_name: "EL AL".to_string(),
            scheduled_time: "2024-01-01T10:00:00".to_string(),
            actual_time: "2024-01-01T10:00:00".to_string(),
            gate: String::new(),
            destination_code_short: "XXX".to_string(),
            destination_name_full: format!("{city} Intl"),
            city_name_local: String::new(),
            city_name_english: city.to_string(),
            country_name_local: String::new(),
            country_name_english: "France".to_string(),
            terminal: "3".to_string(),
            check_in_counter: counter.to_string(),
            check_in_zone: zone.to_string(),
            status_english: "ON TIME".to_string(),
            status_local: String::new(),
        }
    }

    fn outbound(id: i64, city: &str) -> FlightRecord {
        record(id, city, "110-117", "B")
    }

    fn inbound(id: i64, city: &str) -> FlightRecord {
        record(id, city, "", "")
    }

    #[test]
    fn direction_is_derived_from_check_in_fields() {
        assert!(outbound(1, "Paris").is_outbound());
        assert!(!outbound(1, "Paris").is_inbound());
        assert!(inbound(2, "Paris").is_inbound());
        assert!(!inbound(2, "Paris").is_outbound());
    }

    #[test]
    fn inconsistent_check_in_pairing_matches_neither_direction() {
        let odd = record(3, "Rome", "110", "");
        assert!(!odd.is_outbound());
        assert!(!odd.is_inbound());

        let records = vec![outbound(1, "Paris"), inbound(2, "Paris"), odd];
        let all = records.len();
        let out = FlightFilter::direction(Direction::Outbound)
            .apply(records.clone())
            .len();
        let inb = FlightFilter::direction(Direction::Inbound)
            .apply(records)
            .len();
        assert_eq!(out, 1);
        assert_eq!(inb, 1);
        assert!(out + inb < all);
    }

    #[test]
    fn delay_is_raw_string_inequality() {
        let mut r = outbound(1, "Paris");
        assert!(!r.is_delayed());

        r.actual_time = "2024-01-01T10:25:00".to_string();
        assert!(r.is_delayed());

        // Same instant, different rendering: still "delayed".
        r.actual_time = "2024-01-01T10:00".to_string();
        assert!(r.is_delayed());
    }

    #[test]
    fn country_filter_matches_english_country_or_local_city_column() {
        let mut by_country = outbound(1, "Paris");
        by_country.country_name_english = "France".to_string();

        let mut by_local = outbound(2, "Paris");
        by_local.country_name_english = "Italy".to_string();
        by_local.city_name_local = "France".to_string();

        let mut neither = outbound(3, "Rome");
        neither.country_name_english = "Italy".to_string();

        let filter = FlightFilter::country(Direction::Any, "France");
        let kept = filter.apply(vec![by_country, by_local, neither]);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].id, 1);
        assert_eq!(kept[1].id, 2);
    }

    #[test]
    fn country_and_direction_filters_commute() {
        let records = vec![
            outbound(1, "Paris"),
            inbound(2, "Paris"),
            outbound(3, "Rome"),
            record(4, "Paris", "110", ""),
        ];

        let combined = FlightFilter::country(Direction::Outbound, "France").apply(records.clone());

        let country_first = FlightFilter::direction(Direction::Outbound)
            .apply(FlightFilter::country(Direction::Any, "France").apply(records.clone()));
        let direction_first = FlightFilter::country(Direction::Any, "France")
            .apply(FlightFilter::direction(Direction::Outbound).apply(records));

        assert_eq!(combined, country_first);
        assert_eq!(combined, direction_first);
    }

    #[test]
    fn most_popular_destination_picks_highest_count() {
        let records = vec![
            outbound(1, "Paris"),
            outbound(2, "Paris"),
            outbound(3, "Rome"),
        ];
        assert_eq!(most_popular_destination(&records), Some("Paris"));
    }

    #[test]
    fn most_popular_destination_tie_breaks_to_first_encountered() {
        let records = vec![
            outbound(1, "Rome"),
            outbound(2, "Paris"),
            outbound(3, "Paris"),
            outbound(4, "Rome"),
        ];
        // Rome and Paris both count 2; Rome was seen first.
        assert_eq!(most_popular_destination(&records), Some("Rome"));
    }

    #[test]
    fn most_popular_destination_skips_empty_city_and_empty_set() {
        assert_eq!(most_popular_destination(&[]), None);
        let records = vec![outbound(1, ""), outbound(2, "")];
        assert_eq!(most_popular_destination(&records), None);
    }

    #[test]
    fn quick_getaway_last_match_wins() {
        let mut o = outbound(1, "London");
        o.scheduled_time = "2024-01-01T10:00".to_string();

        let mut i1 = inbound(2, "London");
        i1.scheduled_time = "2024-01-01T12:00".to_string();
        let mut i2 = inbound(3, "London");
        i2.scheduled_time = "2024-01-01T15:00".to_string();

        let outbounds = vec![o];
        let inbounds = vec![i1, i2];
        let (dep, arr) = find_quick_getaway(&outbounds, &inbounds).unwrap();
        assert_eq!(dep.id, 1);
        // The 15:00 inbound is scanned last and overwrites the 12:00 match.
        assert_eq!(arr.id, 3);
    }

    #[test]
    fn quick_getaway_requires_same_city_and_later_inbound() {
        let mut o = outbound(1, "London");
        o.scheduled_time = "2024-01-01T10:00:00".to_string();

        let mut earlier = inbound(2, "London");
        earlier.scheduled_time = "2024-01-01T08:00:00".to_string();
        let mut other_city = inbound(3, "Paris");
        other_city.scheduled_time = "2024-01-01T12:00:00".to_string();

        let outbounds = vec![o];
        let inbounds = vec![earlier, other_city];
        assert!(find_quick_getaway(&outbounds, &inbounds).is_none());
    }

    #[test]
    fn quick_getaway_skips_unparseable_timestamps() {
        let mut o = outbound(1, "London");
        o.scheduled_time = "not a time".to_string();
        let mut i = inbound(2, "London");
        i.scheduled_time = "2024-01-01T12:00:00".to_string();

        assert!(find_quick_getaway(&[o], &[i]).is_none());
    }

    #[test]
    fn board_time_parses_with_and_without_seconds() {
        let mut r = outbound(1, "Paris");
        r.scheduled_time = "2024-01-01T10:00:00".to_string();
        assert!(r.scheduled().is_some());
        r.scheduled_time = "2024-01-01T10:00".to_string();
        assert!(r.scheduled().is_some());
        r.scheduled_time = "01/01/2024 10:00".to_string();
        assert!(r.scheduled().is_none());
    }

    #[test]
    fn record_parses_upstream_columns_and_nulls() {
        let json = r#"{
            "_id": 7,
            "CHOPER": "LY",
            "CHFLTN": "315",
            "CHOPERD": "EL AL",
            "CHSTOL": "2024-01-01T10:00:00",
            "CHPTOL": "2024-01-01T10:25:00",
            "CHAORD": null,
            "CHLOC1": "LHR",
            "CHLOC1D": "Heathrow",
            "CHLOC1CH": "לונדון",
            "CHLOC1T": "London",
            "CHLOC1TH": "בריטניה",
            "CHLOCCT": "United Kingdom",
            "CHTERM": "3",
            "CHCINT": null,
            "CHCKZN": null,
            "CHRMINE": "LANDED",
            "CHRMINH": null
        }"#;

        let record: FlightRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(record.flight_code(), "LY315");
        assert_eq!(record.gate, "");
        assert!(record.is_inbound());
        assert!(record.is_delayed());
        assert_eq!(record.city_name_english, "London");
    }
}
