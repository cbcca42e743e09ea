//! Terminal rendering of views, one `print_*` function per command.

use crate::aggregate::{bucket_by_hour_period, Dimension};
use crate::funfacts::{group_thousands, TravelComparison};
use crate::ingest::IngestReport;
use crate::record::{weekday_name, WEEKDAYS};
use crate::recommend::Recommendations;
use crate::sequence::{AdjacentTrack, SequenceFlow};
use crate::views::{
    ArtistProfile, Evolution, Heatmap, HourProfile, Overview, TrendMetric, YearComparison,
    YearTrend,
};

const BAR_WIDTH: usize = 30;
const SHADES: [char; 5] = [' ', '░', '▒', '▓', '█'];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn heading(title: &str) -> String {
    format!("{title}\n{}", "═".repeat(title.chars().count()))
}

/// Horizontal bar proportional to `value / max`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let filled = ((value / max) * width as f64).round() as usize;
    "█".repeat(filled.clamp(1, width))
}

/// One heatmap cell as a shade character.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn shade(value: f64, max: f64) -> char {
    if max <= 0.0 || value <= 0.0 {
        return SHADES[0];
    }
    let level = ((value / max) * (SHADES.len() - 1) as f64).ceil() as usize;
    SHADES[level.clamp(1, SHADES.len() - 1)]
}

fn print_ranking(title: &str, rows: &[(String, f64)], unit: &str) {
    println!("{title}");
    if rows.is_empty() {
        println!("  (no data)");
        return;
    }
    for (rank, (name, value)) in rows.iter().enumerate() {
        println!("  {:>2}. {name} ({value:.1} {unit})", rank + 1);
    }
}

pub fn print_ingest_report(report: &IngestReport) {
    for batch in &report.accepted {
        println!("✓ {} ({} records)", batch.name, batch.records.len());
    }
    for batch in &report.rejected {
        println!("✗ {}: {}", batch.name, batch.reason);
    }
    println!(
        "Loaded {} records from {} of {} files",
        report.accepted_records(),
        report.accepted.len(),
        report.accepted.len() + report.rejected.len()
    );
}

pub fn print_overview(view: &Overview) {
    println!("{}", heading("Listening Overview"));
    println!(
        "⏱  {:.0} minutes ({:.1} hours, {:.1} days)",
        view.total_minutes, view.total_hours, view.total_days
    );
    println!(
        "♫  {} plays: {} completed, {} skipped",
        group_thousands(view.plays as u64),
        view.completed,
        view.skipped
    );
    println!(
        "   {} distinct tracks by {} artists",
        view.distinct_tracks, view.distinct_artists
    );
    println!();
    print_ranking("Top artists", &view.top_artists, "min");
    print_ranking("Top tracks", &view.top_tracks, "min");
    print_ranking("Top albums", &view.top_albums, "min");

    println!("Platforms");
    for (platform, plays) in &view.top_platforms {
        println!("  {platform}: {plays} plays");
    }
}

pub fn print_top_minutes(dimension: Dimension, ranked: &[(String, f64)]) {
    print_ranking(&heading(&format!("Top {} by minutes", dimension.label())), ranked, "min");
}

pub fn print_top_plays(dimension: Dimension, ranked: &[(String, usize)]) {
    println!("{}", heading(&format!("Top {} by plays", dimension.label())));
    if ranked.is_empty() {
        println!("  (no data)");
    }
    for (rank, (name, plays)) in ranked.iter().enumerate() {
        println!("  {:>2}. {name} ({plays} plays)", rank + 1);
    }
}

pub fn print_hour_profile(profile: &HourProfile) {
    println!("{}", heading("Listening by Hour"));
    let max = profile.minutes_by_hour.iter().copied().fold(0.0, f64::max);
    for (hour, minutes) in profile.minutes_by_hour.iter().enumerate() {
        println!(
            "  {hour:02}h {:<width$} {minutes:.1} min",
            bar(*minutes, max, BAR_WIDTH),
            width = BAR_WIDTH
        );
    }
    println!();

    match (profile.peak_hour, profile.peak_period()) {
        (Some(hour), Some(period)) => {
            println!("Peak hour: {hour:02}h ({})", period.label());
        }
        _ => println!("No timestamped plays."),
    }
    for (period, minutes) in &profile.minutes_by_period {
        println!("  {:<20} {minutes:.1} min", period.label());
    }
}

pub fn print_heatmap(map: &Heatmap) {
    println!("{}", heading("Weekday × Hour"));
    let max = map.max();
    println!("            0         6         12        18      23");
    for weekday in WEEKDAYS {
        let row: String = (0..24u32)
            .map(|hour| shade(map.cell(weekday, hour), max))
            .flat_map(|c| [c, c])
            .collect();
        println!("  {:<9} {row}", weekday_name(weekday));
    }

    let hot = map.hot_cells();
    if !hot.is_empty() {
        println!();
        println!("Hot spots:");
        for (weekday, hour, minutes) in hot {
            println!("  {} {hour:02}h: {minutes:.1} min", weekday_name(weekday));
        }
    }
}

pub fn print_years(comparison: Option<&YearComparison>) {
    println!("{}", heading("Year Comparison"));
    let Some(comparison) = comparison else {
        println!("Only one year of data; nothing to compare.");
        return;
    };

    let max = comparison
        .minutes_by_year
        .iter()
        .map(|(_, minutes)| *minutes)
        .fold(0.0, f64::max);
    for (year, minutes) in &comparison.minutes_by_year {
        println!(
            "  {year} {:<width$} {minutes:.0} min",
            bar(*minutes, max, BAR_WIDTH),
            width = BAR_WIDTH
        );
    }

    for snapshot in &comparison.recent {
        println!();
        println!("{}", snapshot.year);
        println!(
            "  {} completed, {} skipped",
            snapshot.completed, snapshot.skipped
        );
        if let Some((hour, _)) = snapshot
            .minutes_by_hour
            .iter()
            .fold(None, |best: Option<(&u32, &f64)>, entry| match best {
                Some((_, top)) if *top >= *entry.1 => best,
                _ => Some(entry),
            })
        {
            println!("  Busiest hour: {hour:02}h");
        }
        print_ranking("  Top artists", &snapshot.top_artists, "min");
    }
}

pub fn print_evolution(view: &Evolution) {
    println!("{}", heading("Monthly Evolution"));
    if view.monthly.is_empty() {
        println!("No timestamped plays.");
        return;
    }

    println!("  Month     Minutes  3-month avg  Offline  Skipped");
    for (i, point) in view.monthly.iter().enumerate() {
        let offline = view.offline_share.get(i).map_or(0.0, |(_, share)| *share);
        let skipped = view.skipped_share.get(i).map_or(0.0, |(_, share)| *share);
        println!(
            "  {}  {:>7.0}  {:>11.1}  {offline:>6.1}%  {skipped:>6.1}%",
            point.month, point.minutes, point.moving_average
        );
    }

    for trend in &view.artist_trends {
        println!();
        println!("{}", trend.artist);
        for (month, minutes) in &trend.monthly {
            println!("  {month}  {minutes:.0} min");
        }
    }
}

pub fn print_monthly_by_year(metric: TrendMetric, trends: &[YearTrend]) {
    println!("{}", heading(&format!("{} per Month", metric.label())));
    if trends.is_empty() {
        println!("No plays in the selected years.");
        return;
    }

    let max = trends
        .iter()
        .flat_map(|trend| trend.months.iter().map(|(_, value)| *value))
        .fold(0.0, f64::max);
    let unit = match metric {
        TrendMetric::Minutes => " min",
        TrendMetric::Plays => "",
        TrendMetric::SkippedShare => "%",
    };

    for trend in trends {
        println!();
        println!("{}", trend.year);
        for &(month, value) in &trend.months {
            let name = (month as usize)
                .checked_sub(1)
                .and_then(|index| MONTHS.get(index))
                .copied()
                .unwrap_or("?");
            let value_text = format!("{value:.1}{unit}");
            println!("  {name}  {value_text:>11}  {}", bar(value, max, BAR_WIDTH));
        }
    }
}

pub fn print_artist_suggestions(query: &str, suggestions: &[&str]) {
    if suggestions.is_empty() {
        println!("No artist matches '{query}'.");
        return;
    }
    println!("Artists matching '{query}':");
    for name in suggestions {
        println!("  {name}");
    }
}

pub fn print_artist_profile(profile: &ArtistProfile) {
    println!("{}", heading(&profile.artist));
    println!(
        "{} tracks, {:.1} minutes total, {:.1} minutes per track on average",
        profile.track_count(),
        profile.total_minutes,
        profile.mean_minutes_per_track
    );
    print_ranking("Tracks", &profile.tracks, "min");
}

fn print_neighbors(title: &str, neighbors: &[AdjacentTrack]) {
    println!("{title}");
    if neighbors.is_empty() {
        println!("  (none)");
    }
    for neighbor in neighbors {
        let artist = neighbor.artist.as_deref().unwrap_or("unknown artist");
        let times = if neighbor.count == 1 { "time" } else { "times" };
        println!("  {} - {artist} ({} {times})", neighbor.track, neighbor.count);
    }
}

pub fn print_flow(flow: &SequenceFlow) {
    let title = match &flow.artist {
        Some(artist) => format!("{} - {artist}", flow.track),
        None => flow.track.clone(),
    };
    println!("{}", heading(&title));
    if flow.is_empty() {
        println!("No plays found around '{}'.", flow.track);
        return;
    }
    print_neighbors("Played before", &flow.before);
    print_neighbors("Played after", &flow.after);
}

pub fn print_recommendations(recs: &Recommendations) {
    println!("{}", heading("Recommendations"));

    println!("Artists you rarely skip");
    for pick in &recs.underplayed_artists {
        println!(
            "  {} ({:.0}% completed over {} plays)",
            pick.artist,
            pick.completion_rate * 100.0,
            pick.plays
        );
    }

    println!("Tracks you always finish");
    for pick in &recs.favorite_tracks {
        let artist = pick.artist.as_deref().unwrap_or("unknown artist");
        println!("  {} - {artist} ({:.0}%)", pick.track, pick.completion_rate * 100.0);
    }

    println!("Explore next");
    for similar in &recs.similar_artists {
        println!("  Because you listen to {}: {}", similar.artist, similar.suggestions.join(", "));
    }

    if let Some(picks) = &recs.favorite_hour {
        println!(
            "Your favorite hour is {:02}h ({}): {}",
            picks.hour,
            bucket_by_hour_period(picks.hour).label(),
            picks.artists.join(", ")
        );
    }
    if let Some(picks) = &recs.favorite_weekday {
        println!(
            "Your favorite day is {}: {}",
            weekday_name(picks.weekday),
            picks.artists.join(", ")
        );
    }
}

pub fn print_facts(hours: f64, travel: &[TravelComparison], facts: &[String]) {
    println!("{}", heading("Fun Facts"));
    println!("You spent {hours:.1} hours listening to music.");
    if !travel.is_empty() {
        println!();
        println!("🚗 Travel");
        for comparison in travel {
            println!("  {comparison}");
        }
    }
    println!();
    for fact in facts {
        println!("  • {fact}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_underline_matches_title() {
        assert_eq!(heading("Año"), "Año\n═══");
    }

    #[test]
    fn test_bar_scales_and_keeps_small_values_visible() {
        assert_eq!(bar(10.0, 10.0, 10).chars().count(), 10);
        assert_eq!(bar(5.0, 10.0, 10).chars().count(), 5);
        assert_eq!(bar(0.01, 10.0, 10).chars().count(), 1);
        assert!(bar(0.0, 10.0, 10).is_empty());
        assert!(bar(3.0, 0.0, 10).is_empty());
    }

    #[test]
    fn test_shade_levels() {
        assert_eq!(shade(0.0, 10.0), ' ');
        assert_eq!(shade(0.1, 10.0), '░');
        assert_eq!(shade(10.0, 10.0), '█');
    }
}
