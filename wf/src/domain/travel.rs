//! Flight and hotel search payloads
//!
//! These mirror the provider's result shapes closely enough to render and
//! select from, while passing unknown provider fields through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Flight search results as returned by the search backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightResult {
    #[serde(default)]
    pub best_flights: Vec<FlightOption>,

    #[serde(default)]
    pub other_flights: Vec<FlightOption>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_metadata: Option<FlightSearchMetadata>,
}

impl FlightResult {
    /// True when neither result set contains an option
    pub fn is_empty(&self) -> bool {
        self.best_flights.is_empty() && self.other_flights.is_empty()
    }

    /// Total number of options across both result sets
    pub fn option_count(&self) -> usize {
        self.best_flights.len() + self.other_flights.len()
    }

    /// Lowest priced option, if any option carries a price
    pub fn cheapest(&self) -> Option<&FlightOption> {
        self.best_flights
            .iter()
            .chain(self.other_flights.iter())
            .filter(|o| o.price.is_some())
            .min_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal))
    }
}

/// One bookable itinerary: one or more legs plus layovers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightOption {
    #[serde(default)]
    pub flights: Vec<FlightLeg>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layovers: Vec<Layover>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub trip_type: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightLeg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_airport: Option<Airport>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_airport: Option<Airport>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airline: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_class: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layover {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overnight: Option<bool>,
}

/// Echo of the flight search parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightSearchMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passengers: Option<u32>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Hotel search results as returned by the search backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HotelResult {
    #[serde(default)]
    pub properties: Vec<HotelProperty>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_metadata: Option<HotelSearchMetadata>,
}

impl HotelResult {
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HotelProperty {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_per_night: Option<Rate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rate: Option<Rate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_rating: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotel_class: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub amenities: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lowest: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_lowest: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Echo of the hotel search parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HotelSearchMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_in: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_out: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guests: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rooms: Option<u32>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flight_result_tolerates_missing_sets() {
        let flights: FlightResult = serde_json::from_value(json!({
            "best_flights": [{ "price": 420.0, "flights": [{ "airline": "TAP", "flight_number": "TP 202" }] }]
        }))
        .unwrap();

        assert_eq!(flights.best_flights.len(), 1);
        assert!(flights.other_flights.is_empty());
        assert!(!flights.is_empty());
        assert_eq!(flights.best_flights[0].flights[0].airline.as_deref(), Some("TAP"));
    }

    #[test]
    fn test_unknown_provider_fields_pass_through() {
        let value = json!({
            "flights": [],
            "price": 300.0,
            "carbon_emissions": { "this_flight": 120000 },
            "airline_logo": "https://example.com/logo.png"
        });

        let option: FlightOption = serde_json::from_value(value).unwrap();
        assert!(option.extra.contains_key("carbon_emissions"));

        let back = serde_json::to_value(&option).unwrap();
        assert_eq!(back["airline_logo"], "https://example.com/logo.png");
    }

    #[test]
    fn test_cheapest_spans_both_sets() {
        let flights = FlightResult {
            best_flights: vec![FlightOption {
                price: Some(500.0),
                ..Default::default()
            }],
            other_flights: vec![
                FlightOption {
                    price: Some(350.0),
                    ..Default::default()
                },
                FlightOption::default(),
            ],
            search_metadata: None,
        };

        assert_eq!(flights.option_count(), 3);
        assert_eq!(flights.cheapest().and_then(|o| o.price), Some(350.0));
    }

    #[test]
    fn test_empty_hotel_result() {
        let hotels: HotelResult = serde_json::from_value(json!({ "properties": [] })).unwrap();
        assert!(hotels.is_empty());

        let hotels: HotelResult = serde_json::from_value(json!({
            "properties": [{ "name": "Hotel Avenida", "overall_rating": 4.4 }],
            "search_metadata": { "location": "Lisbon" }
        }))
        .unwrap();
        assert!(!hotels.is_empty());
        assert_eq!(hotels.search_metadata.unwrap().location.as_deref(), Some("Lisbon"));
    }
}
