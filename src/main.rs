mod config;
mod logging;
mod source;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use futures::executor::block_on;
use trajectory_core::{
    CoordinateIndex, LocationDescriptor, Locale, MergedDataset, TrajectoryStats,
    group_events_by_location, load_index, load_trajectory,
};

use config::Config;
use source::FsSource;

#[derive(Parser)]
#[command(
    name = "trajectory_map",
    about = "Resolve and merge a life trajectory dataset for the map viewer"
)]
struct Cli {
    #[command(flatten)]
    config: Config,

    /// Only log warnings and errors
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the merged, coordinate-resolved dataset as JSON
    Merge {
        #[arg(long, default_value = "zh", value_parser = parse_locale)]
        locale: Locale,
    },
    /// Print the events as a readable list
    Timeline {
        #[arg(long, default_value = "zh", value_parser = parse_locale)]
        locale: Locale,
    },
    /// Resolve a single location descriptor
    Resolve {
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        province: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        district: Option<String>,
        /// Direct coordinates, "lng,lat"; overrides the lookup
        #[arg(long, value_parser = parse_coord)]
        at: Option<[f64; 2]>,
    },
    /// Group events by location up to an event index
    Locations {
        #[arg(long, default_value = "zh", value_parser = parse_locale)]
        locale: Locale,
        /// Last event index to include (default: all)
        #[arg(long)]
        upto: Option<usize>,
    },
    /// Print trajectory statistics up to an event index
    Stats {
        #[arg(long, default_value = "zh", value_parser = parse_locale)]
        locale: Locale,
        #[arg(long)]
        upto: Option<usize>,
    },
    /// Load every language and report unresolved locations
    Check,
}

fn parse_locale(s: &str) -> Result<Locale, String> {
    Locale::from_tag(s).ok_or_else(|| {
        let known: Vec<&str> = Locale::ALL.iter().map(|l| l.tag()).collect();
        format!("unsupported locale `{s}` (known: {})", known.join(", "))
    })
}

fn parse_coord(s: &str) -> Result<[f64; 2], String> {
    let (lng, lat) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `lng,lat`, got `{s}`"))?;
    let parse = |v: &str| {
        let n = v.trim().parse::<f64>().map_err(|e| format!("`{v}`: {e}"))?;
        if n.is_finite() {
            Ok(n)
        } else {
            Err(format!("`{v}` is not a finite number"))
        }
    };
    Ok([parse(lng)?, parse(lat)?])
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::configure_logging(cli.quiet);

    let app = App::new(cli.config);

    match cli.command {
        Command::Merge { locale } => app.run_merge(locale),
        Command::Timeline { locale } => app.run_timeline(locale),
        Command::Resolve {
            country,
            province,
            city,
            district,
            at,
        } => app.run_resolve(LocationDescriptor {
            country,
            province,
            city,
            district,
            coordinates: at.map(|c| serde_json::Value::from(c.to_vec())),
        }),
        Command::Locations { locale, upto } => app.run_locations(locale, upto),
        Command::Stats { locale, upto } => app.run_stats(locale, upto),
        Command::Check => app.run_check(),
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  LOADING
// ═══════════════════════════════════════════════════════════════════════

struct App {
    config: Config,
    source: FsSource,
}

impl App {
    fn new(config: Config) -> Self {
        let source = FsSource::new(&config.data_dir);
        App { config, source }
    }

    fn index(&self) -> CoordinateIndex {
        block_on(load_index(&self.source, &self.config.layout()))
    }

    fn dataset(&self, locale: Locale, index: &CoordinateIndex) -> Result<MergedDataset> {
        block_on(load_trajectory(
            &self.source,
            &self.config.layout(),
            locale,
            index,
        ))
        .with_context(|| format!("loading {locale} trajectory from {}", self.config.data_dir.display()))
    }

    fn load(&self, locale: Locale) -> Result<MergedDataset> {
        let index = self.index();
        self.dataset(locale, &index)
    }
}

fn print_json<T: serde::Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("JSON serialization")?;
    println!("{json}");
    Ok(())
}

fn upto_or_last(upto: Option<usize>, dataset: &MergedDataset) -> usize {
    upto.unwrap_or_else(|| dataset.last_index().unwrap_or(0))
}

// ═══════════════════════════════════════════════════════════════════════
//  MERGE / RESOLVE / LOCATIONS / STATS: JSON to stdout
// ═══════════════════════════════════════════════════════════════════════

impl App {
    fn run_merge(&self, locale: Locale) -> Result<()> {
        let dataset = self.load(locale)?;
        print_json(&dataset)
    }

    fn run_resolve(&self, descriptor: LocationDescriptor) -> Result<()> {
        let index = self.index();
        let resolution = index.resolve(&descriptor);
        if !resolution.is_resolved() {
            eprintln!("No coordinates for: {}", resolution.label);
        }
        print_json(&resolution)
    }

    fn run_locations(&self, locale: Locale, upto: Option<usize>) -> Result<()> {
        let dataset = self.load(locale)?;
        let groups = group_events_by_location(&dataset.events, upto_or_last(upto, &dataset), locale);
        eprintln!("{} location(s)", groups.len());

        #[derive(serde::Serialize)]
        struct GroupOut<'a> {
            #[serde(flatten)]
            group: &'a trajectory_core::LocationGroup,
            summary: trajectory_core::VisitSummary,
        }
        let out: Vec<GroupOut> = groups
            .iter()
            .map(|group| GroupOut {
                group,
                summary: group.summary(),
            })
            .collect();
        print_json(&out)
    }

    fn run_stats(&self, locale: Locale, upto: Option<usize>) -> Result<()> {
        let dataset = self.load(locale)?;
        let stats = TrajectoryStats::compute(&dataset.events, upto_or_last(upto, &dataset));
        print_json(&stats)
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  TIMELINE: readable event list
// ═══════════════════════════════════════════════════════════════════════

impl App {
    fn run_timeline(&self, locale: Locale) -> Result<()> {
        let dataset = self.load(locale)?;

        println!("{}", dataset.title);
        println!();
        for e in &dataset.events {
            let age = e
                .raw
                .age
                .as_ref()
                .map(|a| format!(" ({a})"))
                .unwrap_or_default();

            let place = match (&e.start_location, &e.end_location) {
                (Some(s), Some(t)) if s != t => {
                    let via = if e.transit_locations.is_empty() {
                        String::new()
                    } else {
                        format!(" via {}", e.transit_locations.join(", "))
                    };
                    format!("{s} → {t}{via}")
                }
                (_, Some(t)) => t.clone(),
                (Some(s), None) => s.clone(),
                (None, None) => String::new(),
            };
            let marker = if e.is_plotted() { "" } else { "  [unplotted]" };

            println!(
                "[{:>3}] {}{}  {}  {}{}",
                e.index, e.raw.date, age, e.raw.movement_type, place, marker
            );
            println!("      {}", e.raw.event);
        }

        let stats = TrajectoryStats::compute(&dataset.events, upto_or_last(None, &dataset));
        eprintln!(
            "\nTotal: {} events, {} distinct locations, {} unplotted",
            stats.total_events, stats.visited_locations, stats.unresolved_events
        );
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  CHECK: load every language, report diagnostics
// ═══════════════════════════════════════════════════════════════════════

impl App {
    fn run_check(&self) -> Result<()> {
        let index = self.index();
        let index_stats = index.stats();

        eprintln!("══════════════════════════════════════════");
        eprintln!("  COORDINATE INDEX");
        eprintln!("══════════════════════════════════════════");
        eprintln!("  Entries:        {}", index.len());
        eprintln!("  Reference:      {}", index_stats.reference_entries);
        eprintln!("  International:  {}", index_stats.international_entries);
        eprintln!("  Skipped:        {}", index_stats.skipped_entries);
        eprintln!("  Duplicate keys: {}", index_stats.duplicate_keys);

        let mut failed = Vec::new();

        for locale in Locale::ALL {
            eprintln!("\n══════════════════════════════════════════");
            eprintln!("  DATASET [{}] {}", locale, locale.native_name());
            eprintln!("══════════════════════════════════════════");

            let dataset = match self.dataset(locale, &index) {
                Ok(d) => d,
                Err(e) => {
                    eprintln!("  FAILED: {e:#}");
                    failed.push(locale);
                    continue;
                }
            };

            let diag = &dataset.diagnostics;
            eprintln!("  Title:      {}", dataset.title);
            eprintln!("  Events:     {}", dataset.len());
            eprintln!("  Unresolved: {}", diag.resolution_misses.len());
            if let Some(m) = diag.length_mismatch {
                eprintln!(
                    "  Length mismatch: {} base events vs {} translated",
                    m.primary, m.secondary
                );
            }
            for miss in diag.resolution_misses.iter().take(30) {
                eprintln!(
                    "    #{:<4} {:<12} {}",
                    miss.event_index,
                    miss.role.to_string(),
                    miss.label
                );
            }
            if diag.resolution_misses.len() > 30 {
                eprintln!("    ... and {} more", diag.resolution_misses.len() - 30);
            }
        }

        if !failed.is_empty() {
            let tags: Vec<&str> = failed.iter().map(|l| l.tag()).collect();
            bail!("failed to load: {}", tags.join(", "));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locale() {
        assert_eq!(parse_locale("en-US"), Ok(Locale::En));
        assert!(parse_locale("fr").unwrap_err().contains("zh, en"));
    }

    #[test]
    fn test_parse_coord() {
        assert_eq!(parse_coord("112.94, 28.23"), Ok([112.94, 28.23]));
        assert!(parse_coord("112.94").is_err());
        assert!(parse_coord("a,b").is_err());
        assert!(parse_coord("NaN,1").is_err());
        assert!(parse_coord("112.9,inf").is_err());
    }

    fn app_over(dir: &std::path::Path) -> App {
        App::new(Config {
            data_dir: dir.to_path_buf(),
            regions_file: "regions.json".into(),
            events_stem: "events".into(),
        })
    }

    #[test]
    fn test_app_loads_and_checks_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("regions.json"),
            r#"{ "regions": [ { "ext_path": "湖南省 长沙市", "coordinates": [112.94, 28.23] } ] }"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("events.json"),
            r#"{ "title": "轨迹", "events": [ { "event": "到长沙", "movementType": "原地活动",
                 "coordinates": { "start": { "province": "湖南省", "city": "长沙市" } } } ] }"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("events_en.json"),
            r#"{ "title": "Trajectory", "events": [ { "event": "In Changsha", "movementType": "Local Activity" } ] }"#,
        )
        .unwrap();

        let app = app_over(dir.path());
        let dataset = app.load(Locale::En).unwrap();
        assert_eq!(dataset.events[0].raw.event, "In Changsha");
        assert_eq!(dataset.events[0].end_coords, Some([112.94, 28.23]));
        assert!(app.run_check().is_ok());
    }

    #[test]
    fn test_check_fails_without_translation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("events.json"),
            r#"{ "events": [ { "event": "出生", "movementType": "出生" } ] }"#,
        )
        .unwrap();

        let app = app_over(dir.path());
        assert!(app.load(Locale::Zh).is_ok());
        let err = app.run_check().unwrap_err();
        assert!(err.to_string().contains("en"), "{err}");
    }

    #[test]
    fn test_cli_accepts_global_config() {
        let cli = Cli::try_parse_from([
            "trajectory_map",
            "locations",
            "--locale",
            "en",
            "--upto",
            "3",
            "--data-dir",
            "/tmp/data",
        ])
        .unwrap();
        assert_eq!(cli.config.data_dir, std::path::PathBuf::from("/tmp/data"));
        assert!(matches!(
            cli.command,
            Command::Locations {
                locale: Locale::En,
                upto: Some(3)
            }
        ));
    }
}
