//! Interactive planning session

use std::collections::BTreeMap;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use super::command::{ReplCommand, parse_command, split_city};
use super::display;
use crate::domain::{Attraction, Itinerary};
use crate::error::PlannerError;
use crate::state::SessionId;
use crate::workflow::{Stage, StageDecision, TripPlanner};

/// What the user asked for at a prompt
enum Input {
    Line(String),
    Quit,
}

/// Walks one session through every stage in order
pub struct PlanSession {
    planner: TripPlanner,
    editor: DefaultEditor,
    /// Last attractions listed per city, for `/save`
    listed: BTreeMap<String, Vec<Attraction>>,
}

impl PlanSession {
    pub fn new(planner: TripPlanner) -> Result<Self> {
        let editor = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;
        Ok(Self {
            planner,
            editor,
            listed: BTreeMap::new(),
        })
    }

    /// Run the session until the summary is shown or the user quits
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();
        let id = self.planner.start_session().await?;
        debug!(%id, "run: session started");

        let mut stage = Stage::Intake;
        loop {
            let next = match stage {
                Stage::Intake => self.intake(&id).await?,
                Stage::Preferences => self.preferences(&id).await?,
                Stage::ItinerarySelection => self.choose_itinerary(&id).await?,
                Stage::HotelSelection => self.choose_hotels(&id).await?,
                Stage::TransportSelection => self.choose_transport(&id).await?,
                Stage::Summary => {
                    match self.planner.summary(&id).await {
                        Ok(summary) => display::print_summary(&summary),
                        Err(e) => display::print_error(&e),
                    }
                    None
                }
            };
            match next {
                Some(next) => stage = next,
                None => break,
            }
        }

        self.planner.clear_session(&id).await?;
        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Trip Planner".bright_cyan().bold());
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Commands".bold());
        println!("  {}  choose an itinerary", "/select <n>".yellow());
        println!("  {}  rework an itinerary", "/regen <n> <suggestions>".yellow());
        println!("  {}  generate itineraries again", "/retry".yellow());
        println!("  {}  list attractions in a city", "/attractions <city> [request]".yellow());
        println!("  {}  save a listed attraction", "/save <city> <n>".yellow());
        println!("  {}  continue to the next stage (or press enter)", "/done".yellow());
        println!("  {}  leave", "/quit".yellow());
        println!();
    }

    fn read(&mut self, prompt: &str) -> Result<Input> {
        loop {
            match self.editor.readline(&format!("{} ", prompt.bright_green())) {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if !line.is_empty() {
                        let _ = self.editor.add_history_entry(line.as_str());
                    }
                    if matches!(parse_command(&line), ReplCommand::Quit) {
                        return Ok(Input::Quit);
                    }
                    return Ok(Input::Line(line));
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    return Ok(Input::Quit);
                }
                Err(err) => return Err(eyre::eyre!("Readline error: {}", err)),
            }
        }
    }

    async fn intake(&mut self, id: &SessionId) -> Result<Option<Stage>> {
        loop {
            let Input::Line(location) = self.read("Destination:")? else {
                return Ok(None);
            };
            let Input::Line(party) = self.read("Party size:")? else {
                return Ok(None);
            };
            let Input::Line(days) = self.read("Trip length (days):")? else {
                return Ok(None);
            };
            match self.planner.intake_form(id, &location, &party, &days).await {
                Ok(_) => return Ok(Some(Stage::Preferences)),
                Err(e) => display::print_error(&e),
            }
        }
    }

    async fn preferences(&mut self, id: &SessionId) -> Result<Option<Stage>> {
        let Input::Line(line) = self.read("Preferences (comma separated):")? else {
            return Ok(None);
        };
        let preferences: Vec<String> = line.split(',').map(|p| p.trim().to_string()).collect();
        println!("{}", "Generating itineraries...".dimmed());
        match self.planner.submit_preferences(id, preferences).await {
            Ok(itineraries) => {
                display::print_itineraries(&itineraries);
                Ok(Some(Stage::ItinerarySelection))
            }
            Err(e) => {
                display::print_error(&e);
                Ok(Some(self.recover(id, Stage::ItinerarySelection).await?))
            }
        }
    }

    /// Where to go after a failed step: stay if the stage is reachable,
    /// otherwise follow the controller
    async fn recover(&mut self, id: &SessionId, wanted: Stage) -> Result<Stage> {
        match self.planner.enter_stage(id, wanted).await? {
            StageDecision::Serve => Ok(wanted),
            StageDecision::Redirect(_) => {
                let state = self.planner.session(id).await?;
                if state.trip().is_some_and(|t| t.has_preferences()) {
                    Ok(wanted)
                } else if state.trip().is_some() {
                    Ok(Stage::Preferences)
                } else {
                    Ok(Stage::Intake)
                }
            }
        }
    }

    /// Report a failed step at `current` and pick where to go next
    fn after_error(&mut self, err: &PlannerError, current: Stage) -> Result<Option<Stage>> {
        display::print_error(err);
        let stage = stage_after_error(err, current);
        if stage != current {
            return Ok(Some(stage));
        }
        match self.read("Press enter to try again:")? {
            Input::Line(_) => Ok(Some(current)),
            Input::Quit => Ok(None),
        }
    }

    async fn choose_itinerary(&mut self, id: &SessionId) -> Result<Option<Stage>> {
        loop {
            let Input::Line(line) = self.read("itinerary>")? else {
                return Ok(None);
            };
            match parse_command(&line) {
                ReplCommand::Select(index) => match self.planner.select_itinerary(id, index).await {
                    Ok(itinerary) => {
                        println!("Selected {}", itinerary.name.bold());
                        return self.browse_attractions(id, &itinerary).await;
                    }
                    Err(e) => display::print_error(&e),
                },
                ReplCommand::Regen { index, suggestions } => {
                    println!("{}", "Regenerating...".dimmed());
                    match self.planner.regenerate_itinerary(id, index, &suggestions).await {
                        Ok(itinerary) => display::print_itinerary(index, &itinerary),
                        Err(e) => display::print_error(&e),
                    }
                }
                ReplCommand::Retry => match self.planner.generate_itineraries(id).await {
                    Ok(itineraries) => display::print_itineraries(&itineraries),
                    Err(e) => display::print_error(&e),
                },
                ReplCommand::Attractions(text) => {
                    let cities = self.all_cities(id).await?;
                    self.list_attractions(id, &text, &cities).await;
                }
                ReplCommand::Done => match self.planner.itineraries(id).await {
                    Ok(itineraries) => display::print_itineraries(&itineraries),
                    Err(e) => display::print_error(&e),
                },
                ReplCommand::Help => self.print_help(),
                ReplCommand::Invalid(msg) => println!("{}", msg.yellow()),
                ReplCommand::Save { .. } => println!("{}", "Select an itinerary before saving attractions".yellow()),
                ReplCommand::Text(_) => println!("Type {} to choose an itinerary", "/select <n>".yellow()),
                ReplCommand::Quit => return Ok(None),
            }
        }
    }

    async fn all_cities(&self, id: &SessionId) -> Result<Vec<String>> {
        let state = self.planner.session(id).await?;
        Ok(state
            .itineraries()
            .iter()
            .flat_map(|it| it.cities.iter().cloned())
            .collect())
    }

    async fn list_attractions(&mut self, id: &SessionId, text: &str, cities: &[String]) {
        let (city, request) = split_city(text, cities);
        match self.planner.list_attractions(id, &city, request).await {
            Ok(attractions) => {
                display::print_attractions(&city, &attractions);
                self.listed.insert(city, attractions);
            }
            Err(e) => display::print_error(&e),
        }
    }

    async fn browse_attractions(&mut self, id: &SessionId, itinerary: &Itinerary) -> Result<Option<Stage>> {
        println!(
            "Browse attractions with {}, then press enter to find hotels",
            "/attractions <city> [request]".yellow()
        );
        loop {
            let Input::Line(line) = self.read("attractions>")? else {
                return Ok(None);
            };
            match parse_command(&line) {
                ReplCommand::Attractions(text) => self.list_attractions(id, &text, &itinerary.cities).await,
                ReplCommand::Save { city, index } => {
                    let (city, _) = split_city(&city, &itinerary.cities);
                    let Some(attraction) = self.listed.get(&city).and_then(|list| list.get(index)).cloned() else {
                        println!("{}", format!("List attractions for {} first", city).yellow());
                        continue;
                    };
                    let name = attraction.name.clone();
                    match self.planner.save_attraction(id, attraction).await {
                        Ok(()) => println!("Saved {}", name.bold()),
                        Err(e) => display::print_error(&e),
                    }
                }
                ReplCommand::Done => return Ok(Stage::ItinerarySelection.next()),
                ReplCommand::Help => self.print_help(),
                ReplCommand::Invalid(msg) => println!("{}", msg.yellow()),
                ReplCommand::Quit => return Ok(None),
                _ => println!("Press enter to continue to hotels"),
            }
        }
    }

    async fn choose_hotels(&mut self, id: &SessionId) -> Result<Option<Stage>> {
        println!("{}", "Finding hotels...".dimmed());
        let bundles = match self.planner.discover_hotels(id).await {
            Ok(bundles) => bundles,
            Err(e) => return self.after_error(&e, Stage::HotelSelection),
        };

        let mut choices = BTreeMap::new();
        for bundle in &bundles {
            display::print_bundle(bundle);
            if bundle.hotels.is_empty() {
                continue;
            }
            loop {
                let prompt = format!("Hotel for {} [1-{}, enter to skip]:", bundle.city_name, bundle.hotels.len());
                let Input::Line(line) = self.read(&prompt)? else {
                    return Ok(None);
                };
                if line.is_empty() {
                    break;
                }
                match line.parse::<usize>() {
                    Ok(n) if (1..=bundle.hotels.len()).contains(&n) => {
                        choices.insert(bundle.city_name.clone(), n - 1);
                        break;
                    }
                    _ => println!("{}", "Enter a listed number".yellow()),
                }
            }
        }

        match self.planner.select_hotels(id, choices).await {
            Ok(_) => Ok(Stage::HotelSelection.next()),
            Err(e) => {
                display::print_error(&e);
                Ok(Some(Stage::HotelSelection))
            }
        }
    }

    async fn choose_transport(&mut self, id: &SessionId) -> Result<Option<Stage>> {
        println!("{}", "Loading transport options...".dimmed());
        let legs = match self.planner.load_transport_options(id).await {
            Ok(legs) => legs,
            Err(e) => return self.after_error(&e, Stage::TransportSelection),
        };

        let mut modes = Vec::with_capacity(legs.len());
        for leg in &legs {
            display::print_leg(leg);
            let mode = loop {
                let prompt = if leg.options.is_empty() {
                    "Mode (type one):".to_string()
                } else {
                    format!("Mode [1-{} or type one]:", leg.options.len())
                };
                let Input::Line(line) = self.read(&prompt)? else {
                    return Ok(None);
                };
                if line.is_empty() {
                    continue;
                }
                match line.parse::<usize>() {
                    Ok(n) if (1..=leg.options.len()).contains(&n) => break leg.options[n - 1].mode.clone(),
                    Ok(_) => println!("{}", "Enter a listed number".yellow()),
                    Err(_) => break line,
                }
            };
            modes.push(mode);
        }

        match self.planner.select_transport(id, modes).await {
            Ok(()) => Ok(Stage::TransportSelection.next()),
            Err(e) => {
                display::print_error(&e);
                Ok(Some(Stage::TransportSelection))
            }
        }
    }
}

/// Stay on `current` unless the error names a stage to redirect to
fn stage_after_error(err: &PlannerError, current: Stage) -> Stage {
    err.redirect().unwrap_or(current)
}
