//! Self-contained SVG rendering of a [`ViewState`].
//!
//! The map uses Web Mercator tiles around the snapshot center. Each marker
//! is a pin in its user's color with a popup that opens on hover. A calendar
//! overlay sits in the top-right corner, and loading / no-data messages are
//! drawn over the map.

use std::f64::consts::PI;

use chrono::{Datelike, Months, NaiveDate, TimeZone};

use crate::{
    config::{Config, MAX_ZOOM},
    model::Coordinates,
    snapshot::{Marker, Snapshot},
    state::{ViewState, ViewStatus},
};

const TILE_SIZE: f64 = 256.0;
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

const NO_DATA_MESSAGE: &str = "No location data available for selected date.";
const LOADING_MESSAGE: &str = "Loading...";
const ATTRIBUTION: &str = "© OpenStreetMap contributors";

// Calendar panel geometry, anchored to the top-right corner.
const CAL_RIGHT: f64 = 80.0;
const CAL_TOP: f64 = 10.0;
const CAL_CELL: f64 = 30.0;
const CAL_PAD: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub width: f64,
    pub height: f64,
    pub zoom: u8,
    pub tile_url: String,
    /// Latest selectable day; later days are greyed out in the calendar.
    pub max_day: Option<NaiveDate>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            zoom: crate::config::DEFAULT_ZOOM,
            tile_url: crate::config::DEFAULT_TILE_URL.to_string(),
            max_day: None,
        }
    }
}

impl RenderOptions {
    pub fn from_config(config: &Config, max_day: Option<NaiveDate>) -> Self {
        Self {
            zoom: config.zoom(),
            tile_url: config.tile_url().to_string(),
            max_day,
            ..Self::default()
        }
    }
}

/// World pixel coordinates of `c` at `zoom`.
fn project(c: Coordinates, zoom: u8) -> (f64, f64) {
    let scale = TILE_SIZE * f64::from(1u32 << zoom);
    let lat = c.latitude.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let sin = lat.to_radians().sin();
    let x = (c.longitude + 180.0) / 360.0 * scale;
    let y = (0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * PI)) * scale;
    (x, y)
}

fn tile_href(template: &str, zoom: u8, x: i64, y: i64) -> String {
    template
        .replace("{s}", "a")
        .replace("{z}", &zoom.to_string())
        .replace("{x}", &x.to_string())
        .replace("{y}", &y.to_string())
}

pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_svg<Tz: TimeZone>(state: &ViewState<Tz>, opts: &RenderOptions) -> String {
    let (w, h) = (opts.width, opts.height);
    let status = state.status();
    let center = match status {
        ViewStatus::Map(snap) => snap.center,
        _ => state.snapshot().center,
    };

    // Tile servers stop at MAX_ZOOM.
    let zoom = opts.zoom.min(MAX_ZOOM);
    let (cx, cy) = project(center, zoom);
    let origin = (cx - w / 2.0, cy - h / 2.0);

    let mut s = String::with_capacity(64 << 10);
    s.push_str(&format!(
        r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">
  <title>Locations on {day}</title>
  <style>
    .marker .popup {{ visibility: hidden; }}
    .marker:hover .popup {{ visibility: visible; }}
    .marker:hover .pin {{ stroke: #ffffff; stroke-width: 2; }}
  </style>
  <rect width="{w}" height="{h}" fill="#aad3df"/>
"##,
        day = state.selected_day(),
    ));

    render_tiles(&mut s, opts, zoom, origin);

    if let ViewStatus::Map(snap) = status {
        render_markers(&mut s, snap, zoom, origin);
    }

    match status {
        ViewStatus::Loading => render_message(&mut s, w, h, LOADING_MESSAGE),
        ViewStatus::NoData(_) => render_message(&mut s, w, h, NO_DATA_MESSAGE),
        ViewStatus::Map(_) => {}
    }

    if state.calendar_open() {
        render_calendar(&mut s, w, state.selected_day(), opts.max_day);
    } else {
        render_calendar_button(&mut s, w);
    }

    s.push_str(&format!(
        "  <text x='{:.1}' y='{:.1}' font-size='11' text-anchor='end' fill='#333333'>{}</text>\n",
        w - 6.0,
        h - 6.0,
        escape_xml(ATTRIBUTION)
    ));
    s.push_str("</svg>\n");
    s
}

fn render_tiles(s: &mut String, opts: &RenderOptions, zoom: u8, (left, top): (f64, f64)) {
    let n = 1i64 << zoom;
    let tx0 = (left / TILE_SIZE).floor() as i64;
    let tx1 = ((left + opts.width - 1.0) / TILE_SIZE).floor() as i64;
    let ty0 = ((top / TILE_SIZE).floor() as i64).max(0);
    let ty1 = (((top + opts.height - 1.0) / TILE_SIZE).floor() as i64).min(n - 1);

    s.push_str("  <g class='tiles'>\n");
    for ty in ty0..=ty1 {
        for tx in tx0..=tx1 {
            let x = tx as f64 * TILE_SIZE - left;
            let y = ty as f64 * TILE_SIZE - top;
            let href = escape_xml(&tile_href(&opts.tile_url, zoom, tx.rem_euclid(n), ty));
            s.push_str(&format!(
                "    <image x='{x:.1}' y='{y:.1}' width='{TILE_SIZE}' height='{TILE_SIZE}' href='{href}' xlink:href='{href}'/>\n"
            ));
        }
    }
    s.push_str("  </g>\n");
}

fn render_markers(s: &mut String, snap: &Snapshot, zoom: u8, (left, top): (f64, f64)) {
    s.push_str("  <g class='markers'>\n");
    for marker in &snap.markers {
        let (px, py) = project(marker.position, zoom);
        render_marker(s, marker, px - left, py - top);
    }
    s.push_str("  </g>\n");
}

fn render_marker(s: &mut String, marker: &Marker, x: f64, y: f64) {
    let lines = [
        format!("User: {}", marker.username),
        format!("Latitude: {}", marker.latitude),
        format!("Longitude: {}", marker.longitude),
        format!("Time: {}", marker.timestamp),
    ];
    let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as f64;
    let pw = longest * 7.0 + 20.0;
    let ph = lines.len() as f64 * 18.0 + 14.0;

    s.push_str(&format!("    <g class='marker' transform='translate({x:.1},{y:.1})'>\n"));
    // 25x41 pin with its tip on the position.
    s.push_str(&format!(
        "      <path class='pin' d='M0,0 C-3,-12 -12,-19 -12,-28 A12,12 0 1 1 12,-28 C12,-19 3,-12 0,0 Z' fill='{}' stroke='#1f1f1f' stroke-width='1'/>\n",
        marker.color.hex()
    ));
    s.push_str("      <circle cx='0' cy='-28' r='4.5' fill='#ffffff'/>\n");

    // Popup opens above the pin.
    s.push_str(&format!(
        "      <g class='popup' transform='translate({:.1},{:.1})'>\n",
        1.0 - pw / 2.0,
        -34.0 - ph - 8.0
    ));
    s.push_str(&format!(
        "        <rect width='{pw:.1}' height='{ph:.1}' rx='8' fill='#ffffff' stroke='#999999'/>\n"
    ));
    for (i, line) in lines.iter().enumerate() {
        let weight = if i == 0 { " font-weight='bold'" } else { "" };
        s.push_str(&format!(
            "        <text x='10' y='{:.1}' font-size='12'{weight}>{}</text>\n",
            24.0 + i as f64 * 18.0,
            escape_xml(line)
        ));
    }
    s.push_str("      </g>\n");
    s.push_str("    </g>\n");
}

fn render_message(s: &mut String, w: f64, h: f64, message: &str) {
    let bw = message.chars().count() as f64 * 8.0 + 24.0;
    s.push_str(&format!(
        "  <g class='message'>\n    <rect x='{:.1}' y='{:.1}' width='{bw:.1}' height='36' rx='6' fill='#ffffff' fill-opacity='0.9'/>\n",
        (w - bw) / 2.0,
        h / 2.0 - 18.0
    ));
    s.push_str(&format!(
        "    <text x='{:.1}' y='{:.1}' font-size='15' text-anchor='middle'>{}</text>\n  </g>\n",
        w / 2.0,
        h / 2.0 + 5.0,
        escape_xml(message)
    ));
}

fn render_calendar_button(s: &mut String, w: f64) {
    let bw = 120.0;
    let x = w - CAL_RIGHT - bw;
    s.push_str(&format!(
        "  <g class='calendar closed'>\n    <rect x='{x:.1}' y='{CAL_TOP:.1}' width='{bw:.1}' height='30' rx='5' fill='#f0ad4e'/>\n"
    ));
    s.push_str(&format!(
        "    <text x='{:.1}' y='{:.1}' font-size='13' fill='#ffffff' text-anchor='middle'>Open Calendar</text>\n  </g>\n",
        x + bw / 2.0,
        CAL_TOP + 20.0
    ));
}

/// Day-of-month rows for the month containing `day`, Sunday first.
pub(crate) fn month_grid(day: NaiveDate) -> Vec<[Option<NaiveDate>; 7]> {
    let Some(first) = day.with_day(1) else {
        return Vec::new();
    };
    let lead = first.weekday().num_days_from_sunday() as usize;
    let days_in_month = first
        .checked_add_months(Months::new(1))
        .map(|next| (next - first).num_days() as usize)
        .unwrap_or(31);

    let mut rows = Vec::new();
    let mut row = [None; 7];
    let mut col = lead;
    for offset in 0..days_in_month {
        row[col] = first.checked_add_days(chrono::Days::new(offset as u64));
        col += 1;
        if col == 7 {
            rows.push(row);
            row = [None; 7];
            col = 0;
        }
    }
    if col > 0 {
        rows.push(row);
    }
    rows
}

fn render_calendar(s: &mut String, w: f64, selected: NaiveDate, max_day: Option<NaiveDate>) {
    let grid = month_grid(selected);
    let pw = CAL_CELL * 7.0 + CAL_PAD * 2.0;
    let ph = 78.0 + grid.len() as f64 * CAL_CELL + CAL_PAD;
    let x0 = w - CAL_RIGHT - pw;
    let y0 = CAL_TOP;

    s.push_str("  <g class='calendar open' font-size='12'>\n");
    s.push_str(&format!(
        "    <rect x='{x0:.1}' y='{y0:.1}' width='{pw:.1}' height='{ph:.1}' rx='8' fill='#ffffff' stroke='#dddddd'/>\n"
    ));
    s.push_str(&format!(
        "    <text x='{:.1}' y='{:.1}' font-size='16' font-weight='bold'>Calendar</text>\n",
        x0 + CAL_PAD,
        y0 + 24.0
    ));
    s.push_str(&format!(
        "    <text x='{:.1}' y='{:.1}' text-anchor='end' fill='#555555'>Close Calendar</text>\n",
        x0 + pw - CAL_PAD,
        y0 + 24.0
    ));
    s.push_str(&format!(
        "    <text x='{:.1}' y='{:.1}' text-anchor='middle' font-weight='bold'>{}</text>\n",
        x0 + pw / 2.0,
        y0 + 48.0,
        selected.format("%B %Y")
    ));

    for (i, name) in ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"].iter().enumerate() {
        s.push_str(&format!(
            "    <text x='{:.1}' y='{:.1}' text-anchor='middle' fill='#757575'>{name}</text>\n",
            x0 + CAL_PAD + (i as f64 + 0.5) * CAL_CELL,
            y0 + 70.0
        ));
    }

    for (r, row) in grid.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let Some(date) = cell else { continue };
            let cx = x0 + CAL_PAD + c as f64 * CAL_CELL;
            let cy = y0 + 78.0 + r as f64 * CAL_CELL;
            let disabled = max_day.is_some_and(|max| *date > max);

            let fill = if *date == selected {
                s.push_str(&format!(
                    "    <rect x='{cx:.1}' y='{cy:.1}' width='{CAL_CELL}' height='{CAL_CELL}' rx='4' fill='#006edc'/>\n"
                ));
                "#ffffff"
            } else if disabled {
                "#c8c8c8"
            } else {
                "#1a1a1a"
            };

            s.push_str(&format!(
                "    <text x='{:.1}' y='{:.1}' text-anchor='middle' fill='{fill}'>{}</text>\n",
                cx + CAL_CELL / 2.0,
                cy + CAL_CELL / 2.0 + 4.0,
                date.day()
            ));
        }
    }
    s.push_str("  </g>\n");
}
