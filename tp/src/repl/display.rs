//! Terminal rendering of planning artifacts

use colored::Colorize;

use crate::domain::{Attraction, CityHotelBundle, Itinerary, TransportLeg};
use crate::error::PlannerError;
use crate::summary::TripSummary;

pub fn print_error(err: &PlannerError) {
    if err.is_client_error() {
        println!("{} {}", "!".yellow(), err);
    } else {
        println!("{} {}", "error:".red().bold(), err);
    }
}

pub fn print_itinerary(position: usize, itinerary: &Itinerary) {
    println!("{} {}", format!("[{}]", position + 1).bright_cyan(), itinerary.name.bold());
    for (city, days, notes) in itinerary.rows() {
        let days = days.map(|d| format!("{} days", d)).unwrap_or_else(|| "? days".to_string());
        println!("    {} ({})", city.green(), days);
        if let Some(notes) = notes {
            println!("      {}", notes.dimmed());
        }
    }
}

pub fn print_itineraries(itineraries: &[Itinerary]) {
    println!();
    if itineraries.is_empty() {
        println!(
            "{}",
            "No itineraries could be generated. Type /retry to try again.".yellow()
        );
        return;
    }
    for (i, itinerary) in itineraries.iter().enumerate() {
        print_itinerary(i, itinerary);
        println!();
    }
}

pub fn print_attractions(city: &str, attractions: &[Attraction]) {
    println!();
    if attractions.is_empty() {
        println!("{}", format!("No attractions found for {}.", city).yellow());
        return;
    }
    println!("{}", format!("Attractions in {}", city).bright_cyan().bold());
    for (i, a) in attractions.iter().enumerate() {
        println!("  {} {} {}", format!("{}.", i + 1).dimmed(), a.name.bold(), format!("({})", a.category).dimmed());
        println!("     {}", a.description);
    }
    println!("Save one with {}", format!("/save {} <n>", city).yellow());
}

pub fn print_bundle(bundle: &CityHotelBundle) {
    println!();
    println!(
        "{} {}",
        bundle.city_name.bright_cyan().bold(),
        format!("(staying near {})", bundle.optimal_location).dimmed()
    );
    if bundle.hotels.is_empty() {
        println!("  {}", "No hotels available.".yellow());
    }
    for (i, hotel) in bundle.hotels.iter().enumerate() {
        println!(
            "  {} {} {} {} {}",
            format!("{}.", i + 1).dimmed(),
            hotel.name.bold(),
            "*".repeat(hotel.stars as usize).yellow(),
            hotel.rating,
            hotel.cost.green()
        );
        println!("     {}", hotel.address.dimmed());
    }
}

pub fn print_leg(leg: &TransportLeg) {
    println!();
    println!("{} -> {}", leg.origin.bright_cyan().bold(), leg.destination.bright_cyan().bold());
    if leg.options.is_empty() {
        println!("  {}", "No transport options available.".yellow());
    }
    for (i, option) in leg.options.iter().enumerate() {
        println!(
            "  {} {} {:>6} h  {:>8} USD  {:>8} kg CO2",
            format!("{}.", i + 1).dimmed(),
            format!("{:<10}", option.mode).bold(),
            option.time,
            option.cost,
            option.emissions
        );
    }
}

pub fn print_summary(summary: &TripSummary) {
    println!();
    println!("{}", "Trip summary".bright_cyan().bold());
    print_itinerary(0, &summary.itinerary);

    if !summary.hotels.is_empty() {
        println!();
        println!("{}", "Hotels".bold());
        for lodging in &summary.lodging {
            println!(
                "  {}: {} ({} nights x ${:.2} = ${:.2})",
                lodging.city.green(),
                lodging.hotel,
                lodging.nights,
                lodging.nightly_cost,
                lodging.cost
            );
        }
    }

    if !summary.attractions.is_empty() {
        println!();
        println!("{}", "Saved attractions".bold());
        for city in summary.attractions.cities() {
            for a in summary.attractions_in(city) {
                println!("  {}: {}", city.green(), a.name);
            }
        }
    }

    println!();
    println!("{}", "Transport".bold());
    for leg in &summary.transport.legs {
        println!(
            "  {} -> {} by {}: ${:.2}, {:.1} kg CO2",
            leg.origin, leg.destination, leg.mode, leg.cost, leg.emissions
        );
    }
    for m in &summary.transport.mismatches {
        println!(
            "  {} {} -> {} by {} has no matching option and is not counted",
            "!".yellow(),
            m.origin,
            m.destination,
            m.mode
        );
    }

    println!();
    println!("Transport cost:  ${:.2}", summary.transport.total_cost);
    println!("Lodging cost:    ${:.2}", summary.lodging_cost);
    println!("{} ${:.2}", "Total cost:     ".bold(), summary.grand_total);
    println!("Emissions:       {:.1} kg CO2", summary.transport.total_emissions);
}
