//! Radiotelephony pronunciation (ICAO Annex 10 / CAP 413 conventions).

use itertools::Itertools;

/// Altitude from which levels are read as flight levels.
const TRANSITION_ALTITUDE: i64 = 18_000;

fn phonetic_letter(c: char) -> Option<&'static str> {
    let word = match c.to_ascii_uppercase() {
        'A' => "Alpha",
        'B' => "Bravo",
        'C' => "Charlie",
        'D' => "Delta",
        'E' => "Echo",
        'F' => "Foxtrot",
        'G' => "Golf",
        'H' => "Hotel",
        'I' => "India",
        'J' => "Juliet",
        'K' => "Kilo",
        'L' => "Lima",
        'M' => "Mike",
        'N' => "November",
        'O' => "Oscar",
        'P' => "Papa",
        'Q' => "Quebec",
        'R' => "Romeo",
        'S' => "Sierra",
        'T' => "Tango",
        'U' => "Uniform",
        'V' => "Victor",
        'W' => "Whiskey",
        'X' => "X-ray",
        'Y' => "Yankee",
        'Z' => "Zulu",
        _ => return None,
    };
    Some(word)
}

fn digit_word(c: char) -> Option<&'static str> {
    let word = match c {
        '0' => "Zero",
        '1' => "One",
        '2' => "Two",
        '3' => "Three",
        '4' => "Four",
        '5' => "Five",
        '6' => "Six",
        '7' => "Seven",
        '8' => "Eight",
        '9' => "Niner",
        _ => return None,
    };
    Some(word)
}

/// Reads every digit of `value` individually ("Two Five Zero").
fn digits(value: i64) -> String {
    value.unsigned_abs().to_string().chars().filter_map(digit_word).join(" ")
}

/// Spells a callsign or identifier phonetically, dropping separators.
pub fn phonetic(text: &str) -> String {
    text.chars()
        .filter_map(|c| phonetic_letter(c).or_else(|| digit_word(c)))
        .join(" ")
}

/// Spoken altitude: flight levels above the transition altitude, thousands
/// and hundreds of feet below it. Values are rounded to the nearest hundred.
#[allow(clippy::cast_possible_truncation)]
pub fn spoken_altitude(feet: f64) -> String {
    let rounded = ((feet.max(0.0) / 100.0).round() as i64) * 100;
    if rounded >= TRANSITION_ALTITUDE {
        return format!("Flight Level {}", digits(rounded / 100));
    }
    if rounded == 0 {
        return "Zero feet".to_string();
    }
    let thousands = rounded / 1000;
    let hundreds = (rounded % 1000) / 100;
    let mut parts = Vec::new();
    if thousands > 0 {
        parts.push(format!("{} Thousand", digits(thousands)));
    }
    if hundreds > 0 {
        parts.push(format!("{} Hundred", digits(hundreds)));
    }
    format!("{} feet", parts.join(" "))
}

/// Spoken heading, always three digits ("Zero Niner Zero").
#[allow(clippy::cast_possible_truncation)]
pub fn spoken_heading(degrees: f64) -> String {
    let heading = (degrees.round() as i64).rem_euclid(360);
    format!("{heading:03}").chars().filter_map(digit_word).join(" ")
}

/// Spoken speed in knots ("Two Five Zero knots").
#[allow(clippy::cast_possible_truncation)]
pub fn spoken_speed(knots: f64) -> String {
    format!("{} knots", digits(knots.max(0.0).round() as i64))
}
