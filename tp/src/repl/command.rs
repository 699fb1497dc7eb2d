//! Slash command parsing for the planning REPL
//!
//! Numbers typed by the user are 1-based; parsed commands carry 0-based
//! indices.

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// `/select <n>`
    Select(usize),
    /// `/regen <n> <suggestions>`
    Regen { index: usize, suggestions: String },
    /// `/attractions <city> [request]`; city and request are split later
    Attractions(String),
    /// `/save <city> <n>`
    Save { city: String, index: usize },
    /// `/retry`: generate the itinerary set again
    Retry,
    /// `/done` or an empty line: move on to the next stage
    Done,
    Help,
    Quit,
    /// Anything that is not a command
    Text(String),
    /// A command with bad arguments
    Invalid(String),
}

fn parse_position(raw: &str) -> Option<usize> {
    raw.parse::<usize>().ok().filter(|n| *n >= 1).map(|n| n - 1)
}

pub fn parse_command(line: &str) -> ReplCommand {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Done;
    }
    if !line.starts_with('/') {
        return ReplCommand::Text(line.to_string());
    }

    let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    match cmd {
        "/select" | "/s" => match parse_position(rest) {
            Some(index) => ReplCommand::Select(index),
            None => ReplCommand::Invalid("usage: /select <n>".to_string()),
        },
        "/regen" | "/r" => {
            let (n, suggestions) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            match parse_position(n) {
                Some(index) => ReplCommand::Regen {
                    index,
                    suggestions: suggestions.trim().to_string(),
                },
                None => ReplCommand::Invalid("usage: /regen <n> <suggestions>".to_string()),
            }
        }
        "/attractions" | "/a" => {
            if rest.is_empty() {
                ReplCommand::Invalid("usage: /attractions <city> [request]".to_string())
            } else {
                ReplCommand::Attractions(rest.to_string())
            }
        }
        "/save" => {
            let parsed = rest
                .rsplit_once(char::is_whitespace)
                .and_then(|(city, n)| Some((city.trim(), parse_position(n)?)))
                .filter(|(city, _)| !city.is_empty());
            match parsed {
                Some((city, index)) => ReplCommand::Save {
                    city: city.to_string(),
                    index,
                },
                None => ReplCommand::Invalid("usage: /save <city> <n>".to_string()),
            }
        }
        "/retry" => ReplCommand::Retry,
        "/done" | "/next" => ReplCommand::Done,
        "/help" | "/h" | "/?" => ReplCommand::Help,
        "/quit" | "/q" | "/exit" => ReplCommand::Quit,
        other => ReplCommand::Invalid(format!("unknown command: {}", other)),
    }
}

/// Split `<city> [request]` using the known city names
///
/// The longest city name that prefixes the text wins, so multi-word cities
/// work. Falls back to the first word.
pub fn split_city<'a>(text: &'a str, cities: &[String]) -> (String, Option<&'a str>) {
    let lower = text.to_lowercase();
    let known = cities
        .iter()
        .filter(|city| {
            let city = city.to_lowercase();
            lower.starts_with(&city)
                && text
                    .get(city.len()..)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
        })
        .max_by_key(|city| city.len());

    let (city, rest) = match known {
        Some(city) => (city.clone(), text.get(city.len()..).unwrap_or("")),
        None => {
            let (first, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
            (first.to_string(), rest)
        }
    };
    let request = Some(rest.trim()).filter(|r| !r.is_empty());
    (city, request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_is_one_based() {
        assert_eq!(parse_command("/select 2"), ReplCommand::Select(1));
        assert!(matches!(parse_command("/select 0"), ReplCommand::Invalid(_)));
        assert!(matches!(parse_command("/select x"), ReplCommand::Invalid(_)));
    }

    #[test]
    fn test_regen_keeps_suggestion_text() {
        assert_eq!(
            parse_command("/regen 1   more beaches, fewer museums "),
            ReplCommand::Regen {
                index: 0,
                suggestions: "more beaches, fewer museums".to_string(),
            }
        );
        assert_eq!(
            parse_command("/regen 3"),
            ReplCommand::Regen {
                index: 2,
                suggestions: String::new(),
            }
        );
    }

    #[test]
    fn test_save_allows_multi_word_city() {
        assert_eq!(
            parse_command("/save New York 2"),
            ReplCommand::Save {
                city: "New York".to_string(),
                index: 1,
            }
        );
        assert!(matches!(parse_command("/save 2"), ReplCommand::Invalid(_)));
    }

    #[test]
    fn test_plain_input() {
        assert_eq!(parse_command("   "), ReplCommand::Done);
        assert_eq!(parse_command("hello"), ReplCommand::Text("hello".to_string()));
        assert_eq!(parse_command("/quit"), ReplCommand::Quit);
        assert!(matches!(parse_command("/fly"), ReplCommand::Invalid(_)));
    }

    #[test]
    fn test_split_city() {
        let cities = vec!["New York".to_string(), "New".to_string(), "Boston".to_string()];
        assert_eq!(
            split_city("new york rooftop bars", &cities),
            ("New York".to_string(), Some("rooftop bars"))
        );
        assert_eq!(split_city("Boston", &cities), ("Boston".to_string(), None));
        assert_eq!(split_city("Newark airport", &cities), ("Newark".to_string(), Some("airport")));
    }
}
