//! Spoken phrase templates, English and Dutch.

use serde::{Deserialize, Serialize};
use stroll_route::{ManeuverKind, ManeuverStep, Modifier, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Nl,
}

// Base mood for "in 90 m, turn right"; infinitive for "prepare to ...".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mood {
    Base,
    Infinitive,
}

/// "In 120 meters, turn right on Damrak."
pub fn early_line(lang: Language, step: &ManeuverStep, distance_m: f64) -> String {
    let dist = format_distance(lang, distance_m);
    match (lang, step.kind) {
        (Language::En, ManeuverKind::Arrive) => format!("In {}, you will arrive at your destination.", dist),
        (Language::Nl, ManeuverKind::Arrive) => format!("Over {} bereik je je bestemming.", dist),
        (Language::En, _) => format!("In {}, {}{}.", dist, turn_word(lang, step, Mood::Base), road_suffix(lang, step)),
        (Language::Nl, _) => format!("{}, {}{}.", dist, turn_word(lang, step, Mood::Base), road_suffix(lang, step)),
    }
}

/// "Prepare to turn right on Damrak."
pub fn prepare_line(lang: Language, step: &ManeuverStep) -> String {
    match lang {
        Language::En => match step.kind {
            ManeuverKind::Arrive => "You are arriving at your destination.".to_string(),
            _ => format!("Prepare to {}{}.", turn_word(lang, step, Mood::Infinitive), road_suffix(lang, step)),
        },
        Language::Nl => match step.kind {
            ManeuverKind::Arrive => "Je nadert je bestemming.".to_string(),
            k if k.is_roundabout() => "Bereid je voor om de rotonde te nemen.".to_string(),
            _ => format!("Bereid je voor om {}{}.", turn_word(lang, step, Mood::Infinitive), road_suffix(lang, step)),
        },
    }
}

/// "Now, turn right on Damrak. Then turn left on Spui."
pub fn now_line(lang: Language, step: &ManeuverStep, next: Option<&ManeuverStep>) -> String {
    match lang {
        Language::En => {
            if step.kind == ManeuverKind::Arrive {
                return "You have arrived at your destination.".to_string();
            }
            if step.kind.is_roundabout() {
                return match step.exit {
                    Some(n) => format!("Now, take the {} exit at the roundabout.", ordinal_en(n)),
                    None => "Now, enter the roundabout.".to_string(),
                };
            }
            let mut text = format!("Now, {}{}.", turn_word(lang, step, Mood::Base), road_suffix(lang, step));
            if let Some(n) = next {
                text.push_str(&format!(" Then {}{}.", turn_word(lang, n, Mood::Base), road_suffix(lang, n)));
            }
            text
        }
        Language::Nl => {
            if step.kind == ManeuverKind::Arrive {
                return "Je hebt je bestemming bereikt.".to_string();
            }
            if step.kind.is_roundabout() {
                return match step.exit {
                    Some(n) => format!("Neem nu de {}e afslag op de rotonde.", n),
                    None => "Rijd nu de rotonde op.".to_string(),
                };
            }
            let (action, direction) = match (step.modifier, step.modifier.side()) {
                (_, Some(Side::Right)) => ("Sla", "rechtsaf"),
                (_, Some(Side::Left)) => ("Sla", "linksaf"),
                (Modifier::Straight, _) => ("Ga", "rechtdoor"),
                (Modifier::UTurn, _) => ("Keer", "om"),
                _ => ("Sla", "af"),
            };
            let mut text = format!("{} nu {}{}.", action, direction, road_suffix(lang, step));
            if let Some(n) = next {
                text.push_str(&format!(" Daarna {}{}.", turn_word(lang, n, Mood::Base), road_suffix(lang, n)));
            }
            text
        }
    }
}

pub fn recalculating(lang: Language) -> &'static str {
    match lang {
        Language::En => "Recalculating route.",
        Language::Nl => "Route wordt herberekend.",
    }
}

/// Announcement for the `index`-th stop (0-based) being reached.
pub fn stop_reached(lang: Language, index: usize, name: &str) -> String {
    match lang {
        Language::En => format!("POI {}, {} reached", index + 1, name),
        Language::Nl => format!("POI {}, {} bereikt", index + 1, name),
    }
}

/// Metres below a kilometre, one-decimal kilometres above.
pub fn format_distance(lang: Language, meters: f64) -> String {
    let m = meters.round();
    if m < 1000.0 {
        return match lang {
            Language::En => format!("{} meters", m as i64),
            Language::Nl => format!("{} meter", m as i64),
        };
    }
    let km = format!("{:.1}", m / 1000.0);
    match lang {
        Language::En => format!("{} kilometers", km),
        Language::Nl => format!("{} kilometer", km.replace('.', ",")),
    }
}

fn turn_word(lang: Language, step: &ManeuverStep, mood: Mood) -> String {
    if step.kind.is_roundabout() {
        return match (lang, step.exit) {
            (Language::En, Some(n)) => format!("take the {} exit at the roundabout", ordinal_en(n)),
            (Language::En, None) => "enter the roundabout".to_string(),
            (Language::Nl, Some(n)) => format!("neem de {}e afslag op de rotonde", n),
            (Language::Nl, None) => "neem de rotonde".to_string(),
        };
    }

    let word = match lang {
        Language::En => match (step.kind, step.modifier) {
            (ManeuverKind::Arrive, _) => "arrive at your destination",
            (_, m) if m.side() == Some(Side::Right) => "turn right",
            (_, m) if m.side() == Some(Side::Left) => "turn left",
            (_, Modifier::Straight) => "continue straight",
            (_, Modifier::UTurn) => "make a U-turn",
            (ManeuverKind::Depart, _) => "head out",
            _ => "turn",
        },
        Language::Nl => match (step.kind, step.modifier, mood) {
            (ManeuverKind::Arrive, _, Mood::Base) => "bereik je je bestemming",
            (ManeuverKind::Arrive, _, Mood::Infinitive) => "je bestemming te bereiken",
            (_, m, Mood::Base) if m.side() == Some(Side::Right) => "rechtsaf",
            (_, m, Mood::Infinitive) if m.side() == Some(Side::Right) => "rechtsaf te slaan",
            (_, m, Mood::Base) if m.side() == Some(Side::Left) => "linksaf",
            (_, m, Mood::Infinitive) if m.side() == Some(Side::Left) => "linksaf te slaan",
            (_, Modifier::Straight, Mood::Base) => "rechtdoor blijven gaan",
            (_, Modifier::Straight, Mood::Infinitive) => "rechtdoor te blijven gaan",
            (_, Modifier::UTurn, Mood::Base) => "keer om",
            (_, Modifier::UTurn, Mood::Infinitive) => "om te keren",
            (ManeuverKind::Depart, _, Mood::Base) => "vertrek",
            (ManeuverKind::Depart, _, Mood::Infinitive) => "te vertrekken",
            (_, _, Mood::Base) => "sla af",
            (_, _, Mood::Infinitive) => "af te slaan",
        },
    };
    word.to_string()
}

fn road_suffix(lang: Language, step: &ManeuverStep) -> String {
    if step.kind == ManeuverKind::Arrive {
        return String::new();
    }
    match (&step.road_name, lang) {
        (Some(road), Language::En) => format!(" on {}", road),
        (Some(road), Language::Nl) => format!(" naar {}", road),
        (None, _) => String::new(),
    }
}

fn ordinal_en(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn right_on(road: &str) -> ManeuverStep {
        ManeuverStep::new(ManeuverKind::Turn, Modifier::SlightRight).on(road)
    }

    #[test]
    fn english_stages() {
        let s = right_on("Damrak");
        assert_eq!(early_line(Language::En, &s, 120.0), "In 120 meters, turn right on Damrak.");
        assert_eq!(prepare_line(Language::En, &s), "Prepare to turn right on Damrak.");
        assert_eq!(now_line(Language::En, &s, None), "Now, turn right on Damrak.");
    }

    #[test]
    fn dutch_stages() {
        let s = right_on("Damrak");
        assert_eq!(early_line(Language::Nl, &s, 120.0), "120 meter, rechtsaf naar Damrak.");
        assert_eq!(prepare_line(Language::Nl, &s), "Bereid je voor om rechtsaf te slaan naar Damrak.");
        assert_eq!(now_line(Language::Nl, &s, None), "Sla nu rechtsaf naar Damrak.");
    }

    #[test]
    fn now_line_chains_next_maneuver() {
        let s = ManeuverStep::new(ManeuverKind::Turn, Modifier::Left);
        let next = right_on("Spui");
        assert_eq!(now_line(Language::En, &s, Some(&next)), "Now, turn left. Then turn right on Spui.");
        assert_eq!(now_line(Language::Nl, &s, Some(&next)), "Sla nu linksaf. Daarna rechtsaf naar Spui.");
    }

    #[test]
    fn roundabout_uses_ordinal_exit() {
        let s = ManeuverStep::new(ManeuverKind::Roundabout, Modifier::Right).exit(2);
        assert_eq!(early_line(Language::En, &s, 80.0), "In 80 meters, take the 2nd exit at the roundabout.");
        assert_eq!(now_line(Language::En, &s, None), "Now, take the 2nd exit at the roundabout.");
        assert_eq!(now_line(Language::Nl, &s, None), "Neem nu de 2e afslag op de rotonde.");
        assert_eq!(prepare_line(Language::Nl, &s), "Bereid je voor om de rotonde te nemen.");

        let plain = ManeuverStep::new(ManeuverKind::Rotary, Modifier::None);
        assert_eq!(now_line(Language::En, &plain, None), "Now, enter the roundabout.");
        assert_eq!(now_line(Language::Nl, &plain, None), "Rijd nu de rotonde op.");
    }

    #[test]
    fn arrival_lines() {
        let s = ManeuverStep::new(ManeuverKind::Arrive, Modifier::None).on("Dam");
        assert_eq!(early_line(Language::En, &s, 95.0), "In 95 meters, you will arrive at your destination.");
        assert_eq!(prepare_line(Language::En, &s), "You are arriving at your destination.");
        assert_eq!(now_line(Language::En, &s, None), "You have arrived at your destination.");
        assert_eq!(prepare_line(Language::Nl, &s), "Je nadert je bestemming.");
        assert_eq!(now_line(Language::Nl, &s, None), "Je hebt je bestemming bereikt.");
    }

    #[test]
    fn straight_and_uturn() {
        let straight = ManeuverStep::new(ManeuverKind::Turn, Modifier::Straight);
        let uturn = ManeuverStep::new(ManeuverKind::Turn, Modifier::UTurn);
        assert_eq!(now_line(Language::En, &straight, None), "Now, continue straight.");
        assert_eq!(now_line(Language::Nl, &straight, None), "Ga nu rechtdoor.");
        assert_eq!(now_line(Language::En, &uturn, None), "Now, make a U-turn.");
        assert_eq!(now_line(Language::Nl, &uturn, None), "Keer nu om.");
    }

    #[test]
    fn distances() {
        assert_eq!(format_distance(Language::En, 40.4), "40 meters");
        assert_eq!(format_distance(Language::En, 1240.0), "1.2 kilometers");
        assert_eq!(format_distance(Language::Nl, 1240.0), "1,2 kilometer");
    }

    #[test]
    fn ordinals() {
        let got: Vec<String> = [1, 2, 3, 4, 11, 12, 13, 21, 22].iter().map(|n| ordinal_en(*n)).collect();
        assert_eq!(got, ["1st", "2nd", "3rd", "4th", "11th", "12th", "13th", "21st", "22nd"]);
    }

    #[test]
    fn recalculating_lines() {
        assert_eq!(recalculating(Language::En), "Recalculating route.");
        assert_eq!(stop_reached(Language::Nl, 0, "Dam"), "POI 1, Dam bereikt");
    }
}
