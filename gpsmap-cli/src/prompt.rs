use std::fmt;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use gpsmap_core::{
    Config, MarkerColor, ViewState, Viewer,
    config::{DEFAULT_ENDPOINT, DEFAULT_TILE_URL, MAX_ZOOM},
};
use inquire::{Confirm, CustomType, DateSelect, InquireError, Select, Text};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    PickDate,
    OpenCalendar,
    CloseCalendar,
    Quit,
}

impl fmt::Display for MenuChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MenuChoice::PickDate => "Pick a date",
            MenuChoice::OpenCalendar => "Open calendar",
            MenuChoice::CloseCalendar => "Close calendar",
            MenuChoice::Quit => "Quit",
        })
    }
}

fn menu(calendar_open: bool) -> Vec<MenuChoice> {
    if calendar_open {
        vec![MenuChoice::PickDate, MenuChoice::CloseCalendar, MenuChoice::Quit]
    } else {
        vec![MenuChoice::OpenCalendar, MenuChoice::Quit]
    }
}

/// `Ok(None)` when the user backs out of a prompt.
fn cancellable<T>(res: Result<T, InquireError>) -> Result<Option<T>> {
    match res {
        Ok(v) => Ok(Some(v)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Show today, then keep asking for days until the user quits.
///
/// `on_change` runs after every update of the view.
pub async fn pick_days<F>(viewer: &mut Viewer<Local>, today: NaiveDate, mut on_change: F) -> Result<()>
where
    F: FnMut(&ViewState<Local>) -> Result<()>,
{
    on_change(viewer.show_day(today).await)?;

    loop {
        let choice = Select::new("Calendar:", menu(viewer.state().calendar_open())).prompt();
        let Some(choice) = cancellable(choice)? else {
            break;
        };

        match choice {
            MenuChoice::PickDate => {
                let day = DateSelect::new("Date:")
                    .with_default(viewer.state().selected_day())
                    .with_max_date(today)
                    .prompt();
                let Some(day) = cancellable(day)? else {
                    continue;
                };
                on_change(viewer.show_day(day).await)?;
            }
            MenuChoice::OpenCalendar | MenuChoice::CloseCalendar => {
                viewer.toggle_calendar();
                on_change(viewer.state())?;
            }
            MenuChoice::Quit => break,
        }
    }

    Ok(())
}

/// Ask for each configurable value, keeping the current one as the default.
pub fn configure(config: &mut Config) -> Result<()> {
    let endpoint = Text::new("Location API URL:")
        .with_default(config.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT))
        .prompt()?;
    config.endpoint = Some(endpoint.trim().to_string()).filter(|e| e != DEFAULT_ENDPOINT);

    let tile_url = Text::new("Tile URL template:")
        .with_default(config.tile_url.as_deref().unwrap_or(DEFAULT_TILE_URL))
        .with_help_message("Use {z}, {x} and {y} placeholders")
        .prompt()?;
    config.tile_url = Some(tile_url.trim().to_string()).filter(|t| t != DEFAULT_TILE_URL);

    let zoom = CustomType::<u8>::new("Zoom level:")
        .with_default(config.zoom())
        .with_error_message("Please enter a whole number")
        .with_help_message(&format!("0 to {MAX_ZOOM}"))
        .prompt()?;
    config.zoom = Some(zoom.min(MAX_ZOOM));

    while Confirm::new("Assign a marker color to a user?").with_default(false).prompt()? {
        let user = Text::new("User name:").prompt()?;
        if user.trim().is_empty() {
            continue;
        }
        let color = Select::new("Color:", MarkerColor::all().to_vec()).prompt()?;
        config.set_user_color(user.trim(), color);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_follows_calendar_state() {
        assert_eq!(
            menu(true),
            vec![MenuChoice::PickDate, MenuChoice::CloseCalendar, MenuChoice::Quit]
        );
        assert_eq!(menu(false), vec![MenuChoice::OpenCalendar, MenuChoice::Quit]);
    }

    #[test]
    fn cancelled_prompt_is_not_an_error() {
        assert_eq!(cancellable::<u8>(Err(InquireError::OperationCanceled)).ok(), Some(None));
        assert_eq!(cancellable(Ok(3u8)).ok(), Some(Some(3)));
        assert!(cancellable::<u8>(Err(InquireError::NotTTY)).is_err());
    }
}
