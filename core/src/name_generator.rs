//! Curated word lists for demo patients, staff, doctors and places.
//!
//! All generation is deterministic (same RNG seed = same names).

use crate::rng::DemoRng;

pub struct NameGenerator;

impl NameGenerator {
    pub fn first_name(rng: &mut DemoRng) -> &'static str {
        Self::draw(rng, FIRST_NAMES)
    }

    pub fn last_name(rng: &mut DemoRng) -> &'static str {
        Self::draw(rng, LAST_NAMES)
    }

    pub fn full_name(rng: &mut DemoRng) -> String {
        format!("{} {}", Self::first_name(rng), Self::last_name(rng))
    }

    pub fn doctor_name(rng: &mut DemoRng) -> String {
        format!("Dr. {}", Self::last_name(rng))
    }

    pub fn facility_name(rng: &mut DemoRng) -> String {
        format!("{} {}", Self::draw(rng, FACILITY_PREFIXES), Self::draw(rng, FACILITY_KINDS))
    }

    pub fn street_address(rng: &mut DemoRng) -> String {
        format!("{} {} St", 1 + rng.below(9_899), Self::draw(rng, STREETS))
    }

    /// (city, state, zip prefix)
    pub fn place(rng: &mut DemoRng) -> (&'static str, &'static str, &'static str) {
        rng.pick(PLACES).copied().unwrap_or(PLACES[0])
    }

    /// Staff handles are single lowercase words, so a manager's name doubles
    /// as a team name.
    pub fn staff_handle(rng: &mut DemoRng) -> String {
        Self::first_name(rng).to_lowercase()
    }

    fn draw(rng: &mut DemoRng, list: &'static [&'static str]) -> &'static str {
        rng.pick(list).copied().unwrap_or("")
    }
}

const FIRST_NAMES: &[&str] = &[
    "Mary", "Patricia", "Linda", "Barbara", "Elizabeth", "Jennifer", "Maria", "Susan",
    "Margaret", "Dorothy", "Lisa", "Nancy", "Karen", "Betty", "Helen", "Sandra",
    "Donna", "Carol", "Ruth", "Sharon", "James", "John", "Robert", "Michael",
    "William", "David", "Richard", "Charles", "Joseph", "Thomas", "Donald", "George",
    "Kenneth", "Steven", "Edward", "Ronald", "Anthony", "Kevin", "Harold", "Walter",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis",
    "Rodriguez", "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson",
    "Thomas", "Taylor", "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson",
    "White", "Harris", "Sanchez", "Clark", "Ramirez", "Lewis", "Robinson", "Walker",
    "Young", "Allen", "King", "Wright", "Scott", "Torres", "Nguyen", "Hill", "Flores",
];

const FACILITY_PREFIXES: &[&str] = &[
    "Riverside", "Lakeview", "Summit", "Cedar", "Maple", "Oakwood", "Harbor", "Valley",
];

const FACILITY_KINDS: &[&str] = &[
    "Clinic", "Medical", "Health", "Ortho", "Care",
];

const STREETS: &[&str] = &[
    "Elm", "Oak", "Pine", "Maple", "Cedar", "Walnut", "Chestnut", "Spruce", "Birch", "Main",
];

const PLACES: &[(&str, &str, &str)] = &[
    ("Dayton", "OH", "454"),
    ("Tampa", "FL", "336"),
    ("Mesa", "AZ", "852"),
    ("Tulsa", "OK", "741"),
    ("Fresno", "CA", "937"),
    ("Omaha", "NE", "681"),
    ("Raleigh", "NC", "276"),
    ("El Paso", "TX", "799"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::DemoStream;

    #[test]
    fn name_generation_is_deterministic() {
        let mut a = DemoRng::new(12345, DemoStream::Roster);
        let mut b = DemoRng::new(12345, DemoStream::Roster);
        assert_eq!(NameGenerator::full_name(&mut a), NameGenerator::full_name(&mut b));
    }

    #[test]
    fn generates_valid_full_names() {
        let mut rng = DemoRng::new(12345, DemoStream::Leads);
        for _ in 0..100 {
            let name = NameGenerator::full_name(&mut rng);
            let parts: Vec<&str> = name.split(' ').collect();
            assert_eq!(parts.len(), 2, "full name should be two words: {name}");
            assert!(parts.iter().all(|p| !p.is_empty()));
        }
    }

    #[test]
    fn facility_names_fit_the_form() {
        let mut rng = DemoRng::new(9, DemoStream::Leads);
        for _ in 0..100 {
            assert!(NameGenerator::facility_name(&mut rng).len() <= 20);
        }
    }

    #[test]
    fn staff_handles_are_lowercase_words() {
        let mut rng = DemoRng::new(3, DemoStream::Roster);
        for _ in 0..50 {
            let handle = NameGenerator::staff_handle(&mut rng);
            assert!(!handle.contains(' '));
            assert_eq!(handle, handle.to_lowercase());
        }
    }
}
