//! Plain terminal summaries of conversation messages

use colored::Colorize;

use crate::domain::{ContentItem, FlightOption, FlightResult, HotelProperty, HotelResult, Message};

/// Options listed per result set before eliding the rest
const MAX_LISTED: usize = 5;

/// Print one message with a role label
pub fn print_message(message: &Message) {
    let role = if message.is_user {
        "You".bright_green()
    } else {
        "Wayfinder".bright_blue()
    };
    println!("{} {}", role.bold(), message.timestamp.format("%Y-%m-%d %H:%M").to_string().dimmed());
    for item in &message.contents {
        for line in describe_item(item) {
            println!("  {}", line);
        }
    }
    println!();
}

/// Lines describing one content item
pub fn describe_item(item: &ContentItem) -> Vec<String> {
    match item {
        ContentItem::Text { content, citations } => {
            let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
            for (i, citation) in citations.iter().enumerate() {
                let label = citation.title.as_deref().unwrap_or(&citation.url);
                lines.push(format!("[{}] {} {}", i + 1, label, citation.url.dimmed()));
            }
            lines
        }
        ContentItem::Flight { content } => describe_flights(content),
        ContentItem::Hotel { content } => describe_hotels(content),
    }
}

pub fn describe_flights(flights: &FlightResult) -> Vec<String> {
    let mut lines = vec![format!("{} flight option(s)", flights.option_count())];
    let options = flights.best_flights.iter().chain(flights.other_flights.iter());
    lines.extend(options.take(MAX_LISTED).map(describe_flight_option));
    if flights.option_count() > MAX_LISTED {
        lines.push(format!("... and {} more", flights.option_count() - MAX_LISTED));
    }
    lines
}

fn describe_flight_option(option: &FlightOption) -> String {
    let route = match (option.flights.first(), option.flights.last()) {
        (Some(first), Some(last)) => {
            let from = first.departure_airport.as_ref().and_then(|a| a.id.as_deref()).unwrap_or("?");
            let to = last.arrival_airport.as_ref().and_then(|a| a.id.as_deref()).unwrap_or("?");
            format!("{} -> {}", from, to)
        }
        _ => "route unknown".to_string(),
    };

    let airline = option
        .flights
        .first()
        .and_then(|leg| leg.airline.as_deref())
        .unwrap_or("unknown airline");
    let stops = match option.flights.len().saturating_sub(1) {
        0 => "nonstop".to_string(),
        1 => "1 stop".to_string(),
        n => format!("{} stops", n),
    };
    let price = option.price.map(|p| format!("${:.0}", p)).unwrap_or_else(|| "price n/a".to_string());

    format!("- {} {} ({}) {}", route, airline, stops, price)
}

pub fn describe_hotels(hotels: &HotelResult) -> Vec<String> {
    let mut lines = vec![format!("{} hotel(s)", hotels.properties.len())];
    lines.extend(hotels.properties.iter().take(MAX_LISTED).map(describe_property));
    if hotels.properties.len() > MAX_LISTED {
        lines.push(format!("... and {} more", hotels.properties.len() - MAX_LISTED));
    }
    lines
}

fn describe_property(property: &HotelProperty) -> String {
    let mut line = format!("- {}", property.name);
    if let Some(rate) = property.rate_per_night.as_ref().and_then(|r| r.lowest.as_deref()) {
        line.push_str(&format!(" {}/night", rate));
    }
    if let Some(rating) = property.overall_rating {
        line.push_str(&format!(" rated {:.1}", rating));
    }
    line
}
