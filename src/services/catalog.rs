//! Каталог автобусов: фильтр поиска, популярные маршруты, длительность
//! поездки.

use chrono::{NaiveTime, TimeDelta};
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::Bus;

/// Сколько популярных маршрутов показывать.
pub const POPULAR_ROUTES_LIMIT: usize = 5;

/// Цена, выше которой автобус считается премиальным.
pub const PREMIUM_PRICE: f64 = 1000.0;

/// Параметры поиска (`?from=&to=&max_price=`). Пустое поле - без ограничения.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BusFilter {
    #[serde(default, rename = "from")]
    pub origin: String,
    #[serde(default, rename = "to")]
    pub destination: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub max_price: Option<f64>,
}

// Форма присылает max_price= пустой строкой
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl BusFilter {
    pub fn matches(&self, bus: &Bus) -> bool {
        let price_ok = match self.max_price {
            None => true,
            // автобус без цены под ограничение не попадает
            Some(max) => bus.price.is_some_and(|price| price <= max),
        };

        contains_ignore_case(&bus.origin, &self.origin)
            && contains_ignore_case(&bus.destination, &self.destination)
            && price_ok
    }

    pub fn apply<'a>(&self, buses: &'a [Bus]) -> Vec<&'a Bus> {
        buses.iter().filter(|bus| self.matches(bus)).collect()
    }
}

/// Маршрут в виде "Откуда → Куда".
pub fn route_label(bus: &Bus) -> String {
    format!("{} → {}", bus.origin, bus.destination)
}

/// Различные маршруты в порядке первого появления, не больше
/// `POPULAR_ROUTES_LIMIT`.
pub fn popular_routes(buses: &[Bus]) -> Vec<String> {
    let mut routes: Vec<String> = Vec::new();
    for route in buses.iter().map(route_label) {
        if routes.len() == POPULAR_ROUTES_LIMIT {
            break;
        }
        if !routes.contains(&route) {
            routes.push(route);
        }
    }
    routes
}

/// Длительность поездки. Прибытие раньше отправления считается
/// прибытием на следующий день.
pub fn journey_duration(start: NaiveTime, reach: NaiveTime) -> TimeDelta {
    let delta = reach - start;
    if delta < TimeDelta::zero() {
        delta + TimeDelta::days(1)
    } else {
        delta
    }
}

/// "5h 30m"
pub fn format_duration(duration: TimeDelta) -> String {
    format!("{}h {}m", duration.num_hours(), duration.num_minutes() % 60)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BusTier {
    Standard,
    Premium,
}

impl BusTier {
    pub fn for_price(price: Option<f64>) -> Self {
        match price {
            Some(price) if price > PREMIUM_PRICE => BusTier::Premium,
            _ => BusTier::Standard,
        }
    }
}

/// Строка списка автобусов с производными полями для карточки.
#[derive(Debug, Clone, Serialize)]
pub struct BusListing {
    #[serde(flatten)]
    pub bus: Bus,
    pub route: String,
    pub tier: BusTier,
    pub duration: Option<String>,
}

impl BusListing {
    pub fn from_bus(bus: &Bus) -> Self {
        let duration = bus
            .start_time
            .zip(bus.reach_time)
            .map(|(start, reach)| format_duration(journey_duration(start, reach)));

        Self {
            route: route_label(bus),
            tier: BusTier::for_price(bus.price),
            duration,
            bus: bus.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BusId;
    use fake::faker::address::en::CityName;
    use fake::Fake;

    fn bus(id: i64, origin: &str, destination: &str, price: Option<f64>) -> Bus {
        Bus {
            id: BusId(id),
            bus_name: format!("Bus {id}"),
            bus_number: format!("NUM-{id}"),
            origin: origin.to_string(),
            destination: destination.to_string(),
            features: String::new(),
            start_time: None,
            reach_time: None,
            no_of_seats: 40,
            price,
        }
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let buses = vec![
            bus(1, "Bengaluru", "Chennai", Some(800.0)),
            bus(2, "Mumbai", "Pune", Some(400.0)),
        ];
        let filter = BusFilter {
            origin: "BENGAL".into(),
            ..Default::default()
        };
        let found = filter.apply(&buses);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, BusId(1));
    }

    #[test]
    fn blank_search_field_matches_everything() {
        let buses = vec![bus(1, "Bengaluru", "Chennai", None), bus(2, "Mumbai", "Pune", None)];
        let filter = BusFilter {
            origin: "   ".into(),
            destination: " pune ".into(),
            ..Default::default()
        };
        let ids: Vec<BusId> = filter.apply(&buses).iter().map(|b| b.id).collect();
        assert_eq!(ids, [BusId(2)]);
        assert!(contains_ignore_case("Goa", " "));
    }

    #[test]
    fn max_price_excludes_expensive_and_unpriced() {
        let buses = vec![
            bus(1, "A", "B", Some(800.0)),
            bus(2, "A", "B", Some(400.0)),
            bus(3, "A", "B", None),
        ];
        let filter = BusFilter {
            max_price: Some(500.0),
            ..Default::default()
        };
        let ids: Vec<BusId> = filter.apply(&buses).iter().map(|b| b.id).collect();
        assert_eq!(ids, [BusId(2)]);
    }

    #[test]
    fn empty_max_price_query_means_no_limit() {
        let filter: BusFilter = serde_json::from_str(r#"{"from": "", "max_price": ""}"#).unwrap();
        assert_eq!(filter.max_price, None);
        let filter: BusFilter = serde_json::from_str(r#"{"max_price": "750"}"#).unwrap();
        assert_eq!(filter.max_price, Some(750.0));
    }

    #[test]
    fn popular_routes_are_distinct_and_capped() {
        let mut buses = vec![bus(1, "A", "B", None), bus(2, "A", "B", None)];
        for i in 0..10 {
            let from: String = CityName().fake();
            buses.push(bus(100 + i, &format!("{from}-{i}"), "Z", None));
        }
        let routes = popular_routes(&buses);
        assert_eq!(routes.len(), POPULAR_ROUTES_LIMIT);
        assert_eq!(routes[0], "A → B");
        assert_ne!(routes[1], "A → B");
    }

    #[test]
    fn overnight_journey_wraps_midnight() {
        let start = NaiveTime::from_hms_opt(22, 15, 0).unwrap();
        let reach = NaiveTime::from_hms_opt(5, 45, 0).unwrap();
        assert_eq!(format_duration(journey_duration(start, reach)), "7h 30m");

        let start = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let reach = NaiveTime::from_hms_opt(13, 5, 0).unwrap();
        assert_eq!(format_duration(journey_duration(start, reach)), "5h 5m");
    }

    #[test]
    fn tier_by_price() {
        assert_eq!(BusTier::for_price(Some(1000.0)), BusTier::Standard);
        assert_eq!(BusTier::for_price(Some(1000.5)), BusTier::Premium);
        assert_eq!(BusTier::for_price(None), BusTier::Standard);
    }
}
