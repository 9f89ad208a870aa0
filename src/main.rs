use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tastemap::analysis::{self, Report, skip::ArtistSkipStat};
use tastemap::chart::{self, ChartSink, JsonFileSink};
use tastemap::config::AppConfig;
use tastemap::dataset::Dataset;
use tastemap::dataset::schema::ColumnRef;

#[derive(Parser)]
#[command(name = "tastemap", version, about = "Personal music listening-history analyzer")]
struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a listening-history export and print your music personality
    Analyze {
        /// Export files or directories (defaults to config file data_path)
        paths: Vec<PathBuf>,

        /// Write the listening-pattern chart spec (JSON) to this file
        #[arg(long)]
        chart: Option<PathBuf>,

        /// Print the full report as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show which columns were detected in an export
    Schema {
        /// Export files or directories (defaults to config file data_path)
        paths: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = AppConfig::load();

    match cli.command {
        Commands::Analyze { paths, chart, json } => {
            let ds = load_dataset(&paths, &config)?;
            let report = analysis::run(&ds, &config.skip);

            if json {
                let out = serde_json::to_string_pretty(&report.to_json())
                    .context("Failed to serialize report")?;
                println!("{}", out);
            } else {
                println!("🎵 SPOTIFY PERSONAL KNOWLEDGE MAP ANALYSIS");
                println!("{}", "=".repeat(60));
                println!("Discovering the patterns that make your music taste unique...");
                println!();
                println!("✅ Loaded {} listening records", thousands(ds.len() as i64));
                if let Some((first, last)) = ds.time_range() {
                    println!("⏰ Date range: {} to {}", first, last);
                }
                print_report(&report);
            }

            // Resolve chart path: CLI > config
            if let Some(chart_path) = chart.or(config.chart_path.clone()) {
                match chart::build(&report) {
                    Some(spec) => {
                        let mut sink = JsonFileSink::new(chart_path);
                        sink.emit(&spec).context("Failed to write chart")?;
                        if !json {
                            println!();
                            println!("📈 Chart written to {}", sink.path().display());
                        }
                    }
                    None => {
                        println!("⚠️ No timestamp data available for visualizations");
                    }
                }
            }
        }

        Commands::Schema { paths } => {
            let ds = load_dataset(&paths, &config)?;
            let schema = &ds.schema;

            println!("Rows: {}", thousands(ds.len() as i64));
            println!();
            println!("{:<12} {}", "Field", "Source column");
            println!("{}", "-".repeat(50));
            print_column("timestamp", schema.timestamp.as_ref());
            print_column("trackName", schema.track.as_ref());
            print_column("artistName", schema.artist.as_ref());
            print_column("albumName", schema.album.as_ref());
            match &schema.skip {
                Some(skip) => println!(
                    "{:<12} {} ({})",
                    "skip",
                    skip.column.name,
                    skip.indicator.label()
                ),
                None => println!("{:<12} -", "skip"),
            }
            println!();

            if schema.timestamp.is_some() {
                println!("Malformed timestamps: {}", thousands(ds.malformed_timestamps as i64));
            } else {
                println!("No timestamp column found - temporal analysis will be limited");
            }
            if let Some((first, last)) = ds.time_range() {
                println!("Date range: {} to {}", first, last);
            }
        }
    }

    Ok(())
}

/// Resolve input paths (CLI > config data_path) and build the dataset.
fn load_dataset(paths: &[PathBuf], config: &AppConfig) -> Result<Dataset> {
    let paths = if !paths.is_empty() {
        paths.to_vec()
    } else if !config.data_path.is_empty() {
        config.data_path.clone()
    } else {
        anyhow::bail!(
            "No input data. Pass export files as arguments or set data_path in config."
        );
    };
    log::info!(
        "Input: {}",
        paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let table = tastemap::loader::load_paths(&paths).context("Failed to load listening history")?;
    Dataset::from_table(&table).context("Failed to build dataset")
}

fn print_column(field: &str, column: Option<&ColumnRef>) {
    match column {
        Some(c) => println!("{:<12} {}", field, c.name),
        None => println!("{:<12} -", field),
    }
}

fn section(title: &str) {
    println!();
    println!("{}", title);
    println!("{}", "=".repeat(50));
}

/// Print every analyzer section, the personality profile and the summary.
fn print_report(report: &Report) {
    section("🕐 ANALYZING TEMPORAL PATTERNS");
    match &report.temporal {
        Some(t) => {
            println!(
                "{} You're a {} (peak at {}:00)",
                t.personality.emoji(),
                t.personality.label(),
                t.peak_hour
            );
            println!("📅 {} is your biggest music day", t.peak_day_name());
        }
        None => println!("⚠️ No timestamp data available for temporal analysis"),
    }

    section("🎵 ANALYZING MUSIC PREFERENCES");
    match &report.preferences {
        Some(p) => {
            println!(
                "⭐ Your #1 artist: {} ({} plays, {:.1}%)",
                p.top_artist, p.top_artist_plays, p.top_artist_percentage
            );
            println!("{} You're a {}", p.exploration.emoji(), p.exploration.description());
            println!(
                "   {} artists, top 10% account for {:.1}% of plays",
                thousands(p.total_artists as i64),
                p.concentration_ratio
            );
        }
        None => println!("⚠️ No artist data available"),
    }

    section("🎧 ANALYZING LISTENING INTENSITY");
    match &report.intensity {
        Some(i) => {
            println!(
                "{} You're a {} ({:.0} songs/day average)",
                i.level.emoji(),
                i.level.label(),
                i.avg_daily_plays
            );
            println!("   Busiest day: {} plays", thousands(i.max_daily_plays as i64));
        }
        None => println!("⚠️ No timestamp data available for intensity analysis"),
    }

    section("🚫 ANALYZING SKIP BEHAVIOR");
    match &report.skips {
        Some(s) => {
            println!("📊 Overall skip rate: {:.1}%", s.overall_skip_rate);
            if let Some(most) = &s.most_skipped {
                println!();
                println!("Most skipped artists:");
                print_skip_table(most);
            }
            if let Some(least) = &s.least_skipped {
                println!();
                println!("Least skipped artists:");
                print_skip_table(least);
            }
        }
        None => println!("⚠️ No skip data available"),
    }

    println!();
    println!("🗺️ GENERATING YOUR PERSONAL MUSIC KNOWLEDGE MAP");
    println!("{}", "=".repeat(60));

    println!();
    println!("🎵 YOUR MUSICAL PERSONALITY PROFILE:");
    for (i, insight) in report.insights.iter().enumerate() {
        println!("{:2}. {}", i + 1, insight);
    }

    let summary = &report.summary;
    println!();
    println!("📊 SUMMARY STATISTICS:");
    println!("   🎵 Total tracks played: {}", thousands(summary.total_plays as i64));
    if let Some(artists) = summary.unique_artists {
        println!("   🎤 Unique artists discovered: {}", thousands(artists as i64));
    }
    if let Some(days) = summary.days_span {
        println!("   📅 Days of listening data: {}", thousands(days));
    }
    if let Some(avg) = summary.avg_daily_plays {
        println!("   📈 Average daily plays: {:.1}", avg);
    }
    if let Some(ratio) = summary.repeat_ratio {
        println!("   🔄 Repeat listening rate: {:.1}%", ratio);
    }

    println!();
    println!("🎉 Your music tells a unique story - these patterns make you who you are!");
    println!("🎵 Thanks for exploring your musical personality! 🎵");
}

/// Print a table of per-artist skip rates.
fn print_skip_table(stats: &[ArtistSkipStat]) {
    println!("{:<30} {:>6} {:>6} {:>7}", "Artist", "Plays", "Skips", "Rate");
    println!("{}", "-".repeat(52));

    for s in stats {
        // Truncate long names
        let artist: String = if s.artist.chars().count() > 30 {
            format!("{}...", s.artist.chars().take(27).collect::<String>())
        } else {
            s.artist.clone()
        };

        println!(
            "{:<30} {:>6} {:>6} {:>6.1}%",
            artist, s.total_plays, s.skip_count, s.skip_rate
        );
    }
}

/// Format a count with comma thousands separators.
fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}
