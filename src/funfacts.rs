//! # Fun Facts
//!
//! Playful comparisons of the total listening time: what else those hours
//! could have been spent on, and how far a road trip of the same length
//! would go from the user's city.
//!
//! All randomness comes from the caller's [`Rng`], so a seeded generator
//! gives repeatable output.

use lazy_static::lazy_static;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Road speed used by the driving facts, km/h.
pub const DRIVING_SPEED_KMH: f64 = 80.0;

const SAGA_HOURS: f64 = 17.2;
const BOOK_HOURS: f64 = 5.0;
const NIGHT_HOURS: f64 = 8.0;
const MARATHON_HOURS: f64 = 4.5;
const EPISODE_HOURS: f64 = 0.75;
const EARTH_CIRCUMFERENCE_KM: f64 = 40_000.0;
const MOON_DISTANCE_KM: f64 = 384_400.0;
const FOOTBALL_MATCH_HOURS: f64 = 1.5;
const SUPERHERO_MOVIE_HOURS: f64 = 2.5;
const HAIR_MM_PER_HOUR: f64 = 0.017;
const HEARTBEATS_PER_MINUTE: f64 = 70.0;
const BREATHS_PER_MINUTE: f64 = 16.0;
const RESTING_KCAL_PER_HOUR: f64 = 70.0;

const FLIGHT_ORIGIN: &str = "São Paulo";
const FLIGHT_DESTINATIONS: [&str; 5] = ["Tokyo", "New York", "London", "Paris", "Sydney"];

/// One entry of the fun fact pool.
#[derive(Clone, Copy)]
pub struct FunFact {
    pub topic: &'static str,
    render: fn(f64, &mut dyn RngCore) -> String,
}

impl FunFact {
    /// Render the fact for `hours` of listening.
    pub fn render(&self, hours: f64, rng: &mut dyn RngCore) -> String {
        (self.render)(hours, rng)
    }
}

impl fmt::Debug for FunFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunFact").field("topic", &self.topic).finish()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole(value: f64) -> u64 {
    value.floor() as u64
}

/// `1234567` → `"1,234,567"`.
#[must_use]
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

fn saga(hours: f64, _: &mut dyn RngCore) -> String {
    format!(
        "With the {hours:.1} hours you spent listening to music, you could have watched the whole Lord of the Rings and Hobbit saga {} times.",
        whole(hours / SAGA_HOURS)
    )
}

fn books(hours: f64, _: &mut dyn RngCore) -> String {
    format!(
        "In the {hours:.1} hours you spent listening to music, you could have read about {} books.",
        whole(hours / BOOK_HOURS)
    )
}

fn sleep(hours: f64, _: &mut dyn RngCore) -> String {
    format!(
        "The {hours:.1} hours you spent listening to music add up to {:.1} nights of sleep (8 hours each).",
        hours / NIGHT_HOURS
    )
}

fn marathons(hours: f64, _: &mut dyn RngCore) -> String {
    format!(
        "You could have run {} marathons in the {hours:.1} hours you spent listening to music.",
        whole(hours / MARATHON_HOURS)
    )
}

fn episodes(hours: f64, _: &mut dyn RngCore) -> String {
    format!(
        "You could have watched {} 45-minute episodes in the {hours:.1} hours you spent listening to music.",
        whole(hours / EPISODE_HOURS)
    )
}

fn around_the_world(hours: f64, _: &mut dyn RngCore) -> String {
    let km = hours * DRIVING_SPEED_KMH;
    format!(
        "Driving nonstop at 80 km/h for the {hours:.1} hours you spent listening to music, you would cover {km:.0} km, or {:.2} laps around the Earth.",
        km / EARTH_CIRCUMFERENCE_KM
    )
}

fn to_the_moon(hours: f64, _: &mut dyn RngCore) -> String {
    format!(
        "The distance you could drive in the {hours:.1} hours you spent listening to music is {:.1}% of the way to the Moon.",
        hours * DRIVING_SPEED_KMH / MOON_DISTANCE_KM * 100.0
    )
}

fn lectures(hours: f64, _: &mut dyn RngCore) -> String {
    format!(
        "You could have attended {} one-hour lectures in the {hours:.1} hours you spent listening to music.",
        whole(hours)
    )
}

fn football(hours: f64, _: &mut dyn RngCore) -> String {
    format!(
        "The {hours:.1} hours you spent listening to music equal {} full football matches.",
        whole(hours / FOOTBALL_MATCH_HOURS)
    )
}

fn superhero_movies(hours: f64, _: &mut dyn RngCore) -> String {
    format!(
        "With the {hours:.1} hours you spent listening to music, you could have watched {} superhero movies.",
        whole(hours / SUPERHERO_MOVIE_HOURS)
    )
}

fn flight(hours: f64, rng: &mut dyn RngCore) -> String {
    let destination = FLIGHT_DESTINATIONS.choose(rng).copied().unwrap_or("Tokyo");
    format!(
        "The {hours:.1} hours you spent listening to music equal a flight from {FLIGHT_ORIGIN} to {destination}."
    )
}

fn hair(hours: f64, _: &mut dyn RngCore) -> String {
    format!(
        "While you listened to music for {hours:.1} hours, your hair grew about {:.1} mm (at roughly 1 cm a month).",
        hours * HAIR_MM_PER_HOUR
    )
}

fn heartbeats(hours: f64, _: &mut dyn RngCore) -> String {
    format!(
        "While you listened to music for {hours:.1} hours, your heart beat about {} times (at 70 beats per minute).",
        group_thousands(whole(hours * 60.0 * HEARTBEATS_PER_MINUTE))
    )
}

fn breaths(hours: f64, _: &mut dyn RngCore) -> String {
    format!(
        "While you listened to music for {hours:.1} hours, you took about {} breaths (at 16 breaths per minute).",
        group_thousands(whole(hours * 60.0 * BREATHS_PER_MINUTE))
    )
}

fn calories(hours: f64, _: &mut dyn RngCore) -> String {
    format!(
        "While you listened to music for {hours:.1} hours, your body burned about {} calories at rest.",
        group_thousands(whole(hours * RESTING_KCAL_PER_HOUR))
    )
}

/// The fact pool.
pub static FUN_FACTS: [FunFact; 15] = [
    FunFact { topic: "movie saga", render: saga },
    FunFact { topic: "books", render: books },
    FunFact { topic: "sleep", render: sleep },
    FunFact { topic: "marathons", render: marathons },
    FunFact { topic: "episodes", render: episodes },
    FunFact { topic: "around the world", render: around_the_world },
    FunFact { topic: "moon", render: to_the_moon },
    FunFact { topic: "lectures", render: lectures },
    FunFact { topic: "football", render: football },
    FunFact { topic: "superhero movies", render: superhero_movies },
    FunFact { topic: "flight", render: flight },
    FunFact { topic: "hair growth", render: hair },
    FunFact { topic: "heartbeats", render: heartbeats },
    FunFact { topic: "breaths", render: breaths },
    FunFact { topic: "calories", render: calories },
];

/// Render `count` distinct facts picked at random (all of them if `count`
/// exceeds the pool).
pub fn pick_fun_facts<R: Rng>(hours: f64, count: usize, rng: &mut R) -> Vec<String> {
    let picked: Vec<&FunFact> = FUN_FACTS.choose_multiple(rng, count).collect();
    picked.into_iter().map(|fact| fact.render(hours, rng)).collect()
}

/// Destination table a city is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Region {
    Brazil,
    UnitedStates,
    Europe,
    Asia,
}

/// A city and its distance from the user, km.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Destination {
    pub city: &'static str,
    pub distance_km: f64,
}

const fn dest(city: &'static str, distance_km: f64) -> Destination {
    Destination { city, distance_km }
}

static BRAZIL: [Destination; 15] = [
    dest("São Paulo", 960.0),
    dest("Rio de Janeiro", 1260.0),
    dest("Brasília", 140.0),
    dest("Salvador", 1800.0),
    dest("Fortaleza", 2100.0),
    dest("Belo Horizonte", 800.0),
    dest("Manaus", 2500.0),
    dest("Curitiba", 1200.0),
    dest("Recife", 2300.0),
    dest("Porto Alegre", 2000.0),
    dest("Belém", 2200.0),
    dest("Goiânia", 70.0),
    dest("Florianópolis", 1600.0),
    dest("Natal", 2500.0),
    dest("Vitória", 1400.0),
];

static UNITED_STATES: [Destination; 15] = [
    dest("New York", 8500.0),
    dest("Los Angeles", 9800.0),
    dest("Chicago", 8900.0),
    dest("Houston", 8200.0),
    dest("Phoenix", 9000.0),
    dest("Philadelphia", 8600.0),
    dest("San Antonio", 8300.0),
    dest("San Diego", 9700.0),
    dest("Dallas", 8100.0),
    dest("San Jose", 9900.0),
    dest("Austin", 8200.0),
    dest("Jacksonville", 8000.0),
    dest("Fort Worth", 8100.0),
    dest("Columbus", 8700.0),
    dest("Charlotte", 8400.0),
];

static EUROPE: [Destination; 15] = [
    dest("London", 9300.0),
    dest("Paris", 9500.0),
    dest("Madrid", 8800.0),
    dest("Rome", 9700.0),
    dest("Berlin", 10200.0),
    dest("Athens", 10500.0),
    dest("Amsterdam", 9800.0),
    dest("Vienna", 10100.0),
    dest("Brussels", 9700.0),
    dest("Lisbon", 8500.0),
    dest("Stockholm", 10800.0),
    dest("Prague", 10300.0),
    dest("Budapest", 10400.0),
    dest("Warsaw", 10600.0),
    dest("Dublin", 9200.0),
];

static ASIA: [Destination; 15] = [
    dest("Tokyo", 18000.0),
    dest("Beijing", 17500.0),
    dest("Seoul", 17800.0),
    dest("Mumbai", 14500.0),
    dest("Shanghai", 17300.0),
    dest("Delhi", 14300.0),
    dest("Singapore", 16800.0),
    dest("Bangkok", 16500.0),
    dest("Hong Kong", 17000.0),
    dest("Dubai", 12500.0),
    dest("Kuala Lumpur", 16700.0),
    dest("Taipei", 17500.0),
    dest("Jakarta", 16900.0),
    dest("Manila", 17200.0),
    dest("Osaka", 18100.0),
];

/// Lowercase spellings recognized per region, in matching priority.
const CITY_ALIASES: [(Region, &[&str]); 4] = [
    (
        Region::Brazil,
        &[
            "são paulo", "rio de janeiro", "brasília", "brasilia", "salvador", "fortaleza",
            "belo horizonte", "manaus", "curitiba", "recife", "porto alegre", "belém", "belem",
            "goiânia", "goiania", "anápolis", "anapolis", "florianópolis", "florianopolis",
            "natal", "vitória", "vitoria",
        ],
    ),
    (
        Region::UnitedStates,
        &[
            "new york", "nova york", "los angeles", "chicago", "houston", "phoenix",
            "philadelphia", "filadélfia", "filadelfia", "san antonio", "san diego", "dallas",
            "san jose", "austin", "jacksonville", "fort worth", "columbus", "charlotte", "denver",
            "seattle", "boston", "las vegas", "miami",
        ],
    ),
    (
        Region::Europe,
        &[
            "london", "londres", "paris", "madrid", "madri", "rome", "roma", "berlin", "berlim",
            "athens", "atenas", "amsterdam", "amsterdã", "vienna", "viena", "brussels",
            "bruxelas", "lisbon", "lisboa", "stockholm", "estocolmo", "prague", "praga",
            "budapest", "budapeste", "warsaw", "varsóvia", "varsovia", "dublin",
        ],
    ),
    (
        Region::Asia,
        &[
            "tokyo", "tóquio", "toquio", "beijing", "pequim", "seoul", "seul", "mumbai",
            "shanghai", "xangai", "delhi", "singapore", "singapura", "bangkok", "hong kong",
            "dubai", "kuala lumpur", "taipei", "jakarta", "manila", "osaka",
        ],
    ),
];

lazy_static! {
    /// Exact alias lookup.
    static ref ALIAS_INDEX: HashMap<&'static str, Region> = CITY_ALIASES
        .iter()
        .flat_map(|(region, aliases)| aliases.iter().map(move |alias| (*alias, *region)))
        .collect();
}

impl Region {
    pub const ALL: [Self; 4] = [Self::Brazil, Self::UnitedStates, Self::Europe, Self::Asia];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Brazil => "Brazil",
            Self::UnitedStates => "United States",
            Self::Europe => "Europe",
            Self::Asia => "Asia",
        }
    }

    #[must_use]
    pub fn destinations(self) -> &'static [Destination] {
        match self {
            Self::Brazil => &BRAZIL,
            Self::UnitedStates => &UNITED_STATES,
            Self::Europe => &EUROPE,
            Self::Asia => &ASIA,
        }
    }
}

/// Classify a city name.
///
/// Tries an exact (case-insensitive) alias match, then a substring match in
/// either direction, region by region. Unknown cities fall back to Brazil.
#[must_use]
pub fn identify_region(city: &str) -> Region {
    let city = city.trim().to_lowercase();

    if let Some(region) = ALIAS_INDEX.get(city.as_str()) {
        return *region;
    }

    CITY_ALIASES
        .iter()
        .find(|(_, aliases)| {
            aliases
                .iter()
                .any(|alias| alias.contains(city.as_str()) || city.contains(alias))
        })
        .map_or(Region::Brazil, |(region, _)| *region)
}

/// Up to `count` distinct destinations of `region`, at random.
pub fn sample_destinations<R: Rng>(region: Region, count: usize, rng: &mut R) -> Vec<Destination> {
    let all = region.destinations();
    if count >= all.len() {
        return all.to_vec();
    }
    all.choose_multiple(rng, count).copied().collect()
}

/// How often a trip fits in the driving distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum TripOutcome {
    /// Whole there-and-back trips.
    RoundTrips(u64),
    /// Whole one-way trips, when not even one round trip fits.
    OneWayTrips(u64),
    /// Percentage of a single one-way trip.
    PartialTrip(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TravelComparison {
    pub hours: f64,
    pub origin: String,
    pub destination: String,
    pub outcome: TripOutcome,
}

/// Compare listening time with driving from `origin` to `destination` at
/// `speed_kmh`.
#[must_use]
pub fn compare_travel(
    hours: f64,
    origin: &str,
    destination: &Destination,
    speed_kmh: f64,
) -> TravelComparison {
    let reachable_km = hours * speed_kmh;
    let one_way = reachable_km / destination.distance_km;
    let round = reachable_km / (destination.distance_km * 2.0);

    let outcome = if round >= 1.0 {
        TripOutcome::RoundTrips(whole(round))
    } else if one_way >= 1.0 {
        TripOutcome::OneWayTrips(whole(one_way))
    } else {
        TripOutcome::PartialTrip(one_way * 100.0)
    };

    TravelComparison {
        hours,
        origin: origin.to_string(),
        destination: destination.city.to_string(),
        outcome,
    }
}

/// Travel comparisons from `city` to `count` random destinations of its
/// region.
pub fn travel_comparisons<R: Rng>(
    hours: f64,
    city: &str,
    count: usize,
    speed_kmh: f64,
    rng: &mut R,
) -> Vec<TravelComparison> {
    let region = identify_region(city);
    log::debug!("City '{city}' classified as {}", region.label());

    sample_destinations(region, count, rng)
        .iter()
        .map(|destination| compare_travel(hours, city, destination, speed_kmh))
        .collect()
}

impl fmt::Display for TravelComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hours, from, to) = (self.hours, &self.origin, &self.destination);
        match self.outcome {
            TripOutcome::RoundTrips(n) => write!(
                f,
                "With the {hours:.1} hours you spent listening to music, you could drive from {from} to {to} and back {n} times."
            ),
            TripOutcome::OneWayTrips(n) => write!(
                f,
                "With the {hours:.1} hours you spent listening to music, you could drive from {from} to {to} {n} times."
            ),
            TripOutcome::PartialTrip(percent) => write!(
                f,
                "The {hours:.1} hours you spent listening to music are {percent:.1}% of the time needed to drive from {from} to {to}."
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_pool_has_fifteen_distinct_topics() {
        let topics: HashSet<_> = FUN_FACTS.iter().map(|f| f.topic).collect();
        assert_eq!(topics.len(), 15);
    }

    #[test]
    fn test_pick_is_distinct_and_seeded() {
        let picks = pick_fun_facts(100.0, 4, &mut StdRng::seed_from_u64(7));
        let again = pick_fun_facts(100.0, 4, &mut StdRng::seed_from_u64(7));

        assert_eq!(picks.len(), 4);
        assert_eq!(picks, again, "same seed, same facts");
        let unique: HashSet<_> = picks.iter().collect();
        assert_eq!(unique.len(), 4);

        let everything = pick_fun_facts(1.0, 50, &mut StdRng::seed_from_u64(1));
        assert_eq!(everything.len(), FUN_FACTS.len());
    }

    #[test]
    fn test_fact_arithmetic() {
        let mut rng = StdRng::seed_from_u64(0);

        assert!(saga(35.0, &mut rng).contains(" 2 times"));
        assert!(lectures(3.9, &mut rng).contains("attended 3 one-hour"));
        assert!(around_the_world(500.0, &mut rng).contains("40000 km, or 1.00 laps"));
        assert!(heartbeats(1.0, &mut rng).contains("4,200 times"));
        assert!(calories(100.0, &mut rng).contains("7,000 calories"));

        let flown = flight(12.0, &mut rng);
        assert!(FLIGHT_DESTINATIONS.iter().any(|city| flown.contains(city)));
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_identify_region() {
        assert_eq!(identify_region("London"), Region::Europe);
        assert_eq!(identify_region("TÓQUIO"), Region::Asia);
        assert_eq!(identify_region("Greater Boston"), Region::UnitedStates, "alias inside input");
        assert_eq!(identify_region("Tok"), Region::Asia, "input inside alias");
        assert_eq!(identify_region("Atlantis"), Region::Brazil);
    }

    #[test]
    fn test_region_tables() {
        for region in Region::ALL {
            assert_eq!(region.destinations().len(), 15, "{}", region.label());
        }
    }

    #[test]
    fn test_sample_destinations() {
        let mut rng = StdRng::seed_from_u64(42);

        let two = sample_destinations(Region::Europe, 2, &mut rng);
        assert_eq!(two.len(), 2);
        assert_ne!(two[0].city, two[1].city);
        assert!(two.iter().all(|d| EUROPE.contains(d)));

        assert_eq!(sample_destinations(Region::Asia, 40, &mut rng).len(), 15);
    }

    #[test]
    fn test_compare_travel_outcomes() {
        let goiania = dest("Goiânia", 70.0);

        // 10 h at 80 km/h = 800 km: 5 round trips of 140 km.
        let round = compare_travel(10.0, "Brasília", &goiania, 80.0);
        assert_eq!(round.outcome, TripOutcome::RoundTrips(5));
        assert!(round.to_string().contains("and back 5 times"));

        // 1 h = 80 km: one way fits, a round trip does not.
        let one_way = compare_travel(1.0, "Brasília", &goiania, 80.0);
        assert_eq!(one_way.outcome, TripOutcome::OneWayTrips(1));

        let far = dest("Tokyo", 18000.0);
        let partial = compare_travel(112.5, "São Paulo", &far, 80.0);
        assert_eq!(partial.outcome, TripOutcome::PartialTrip(50.0));
        assert!(partial.to_string().contains("50.0%"));
    }

    #[test]
    fn test_travel_comparisons_use_city_region() {
        let mut rng = StdRng::seed_from_u64(3);
        let trips = travel_comparisons(100.0, "Paris", 2, 80.0, &mut rng);

        assert_eq!(trips.len(), 2);
        assert!(trips.iter().all(|t| t.origin == "Paris"));
        assert!(trips
            .iter()
            .all(|t| EUROPE.iter().any(|d| d.city == t.destination)));
    }
}
