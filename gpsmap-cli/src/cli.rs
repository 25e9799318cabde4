use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use gpsmap_core::{
    Config, Marker, MarkerColor, ViewState, ViewStatus, Viewer,
    render::{RenderOptions, render_svg},
    source::source_from_config,
};
use tracing::debug;

use crate::prompt;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "gpsmap", version, about = "Map viewer for reported GPS locations")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render the locations of one day to an SVG map.
    Show {
        /// Day to show as YYYY-MM-DD; defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Where to write the map.
        #[arg(short, long, default_value = "map.svg")]
        output: PathBuf,

        /// Location API URL, overriding the configured one.
        #[arg(long)]
        endpoint: Option<String>,

        /// Draw the calendar overlay collapsed.
        #[arg(long)]
        no_calendar: bool,
    },

    /// Pick days from a calendar and re-render the map after each pick.
    Pick {
        #[arg(short, long, default_value = "map.svg")]
        output: PathBuf,

        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Print the locations of one day.
    List {
        /// Day to list as YYYY-MM-DD; defaults to today.
        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Print the marker color assigned to each known user.
    Colors,

    /// Interactively edit endpoint, tiles, zoom and user colors.
    Configure,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let today = Local::now().date_naive();

        match self.command {
            Command::Show { date, output, endpoint, no_calendar } => {
                let config = Config::load()?;
                let day = parse_day(date.as_deref(), today)?;
                let mut viewer = new_viewer(&config, endpoint.as_deref(), today)?;
                if no_calendar {
                    viewer.toggle_calendar();
                }

                let state = viewer.show_day(day).await;
                write_map(state, &config, today, &output)?;
                print_summary(state);
                println!("Map written to {}", output.display());
            }
            Command::Pick { output, endpoint } => {
                let config = Config::load()?;
                let mut viewer = new_viewer(&config, endpoint.as_deref(), today)?;
                prompt::pick_days(&mut viewer, today, |state| {
                    write_map(state, &config, today, &output)?;
                    print_summary(state);
                    println!("Map written to {}", output.display());
                    Ok(())
                })
                .await?;
            }
            Command::List { date, endpoint } => {
                let config = Config::load()?;
                let day = parse_day(date.as_deref(), today)?;
                let mut viewer = new_viewer(&config, endpoint.as_deref(), today)?;
                let state = viewer.show_day(day).await;
                print_records(state);
            }
            Command::Colors => {
                let config = Config::load()?;
                let table = config.color_table()?;
                for (user, color) in table.entries() {
                    println!("{user:<28} {color}");
                }
                println!("{:<28} {}", "(anyone else)", MarkerColor::DEFAULT);
            }
            Command::Configure => {
                let mut config = Config::load()?;
                prompt::configure(&mut config)?;
                // Fail before saving if the endpoint can't be used.
                source_from_config(&config, None)?;
                config.color_table()?;
                let path = config.save()?;
                println!("Configuration saved to {}", path.display());
            }
        }

        Ok(())
    }
}

fn new_viewer(config: &Config, endpoint: Option<&str>, today: NaiveDate) -> Result<Viewer<Local>> {
    let source = source_from_config(config, endpoint)?;
    debug!(?source, "using location source");
    Ok(Viewer::new(Arc::from(source), today, Local, config.color_table()?))
}

/// Parse a `YYYY-MM-DD` day, defaulting to `today`. Days after `today` are rejected.
fn parse_day(input: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    let Some(raw) = input else {
        return Ok(today);
    };

    let day = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{raw}', expected YYYY-MM-DD"))?;

    if day > today {
        return Err(anyhow!("Date {day} is in the future; the latest selectable day is {today}."));
    }

    Ok(day)
}

fn write_map(
    state: &ViewState<Local>,
    config: &Config,
    today: NaiveDate,
    output: &Path,
) -> Result<()> {
    let svg = render_svg(state, &RenderOptions::from_config(config, Some(today)));
    fs::write(output, svg)
        .with_context(|| format!("Failed to write map to {}", output.display()))
}

fn print_summary(state: &ViewState<Local>) {
    match state.status() {
        ViewStatus::Map(snap) => {
            println!(
                "{} location(s) on {}, centered at ({:.6}, {:.6})",
                snap.markers.len(),
                snap.day,
                snap.center.latitude,
                snap.center.longitude
            );
            if snap.skipped > 0 {
                println!("{} record(s) skipped because of unreadable coordinates", snap.skipped);
            }
        }
        ViewStatus::NoData(day) => {
            println!("No location data available for {day}.");
        }
        ViewStatus::Loading => {
            println!("Loading...");
        }
    }
}

fn print_records(state: &ViewState<Local>) {
    let ViewStatus::Map(snap) = state.status() else {
        print_summary(state);
        return;
    };

    println!(
        "{:<24} {:>12} {:>12}  {:<30} {}",
        "User", "Latitude", "Longitude", "Time", "Color"
    );
    for m in &snap.markers {
        println!("{}", record_row(m));
    }
    println!();
    print_summary(state);
}

fn record_row(m: &Marker) -> String {
    format!(
        "{:<24} {:>12} {:>12}  {:<30} {}",
        m.username, m.latitude, m.longitude, m.timestamp, m.color
    )
}
