use crate::types::Year;
use serde::{Deserialize, Serialize};

/// Province clicked on the map.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "estado", content = "provincia", rename_all = "snake_case")]
pub enum Selection {
    #[default]
    Unselected,
    Selected(String),
}

impl Selection {
    pub fn province(&self) -> Option<&str> {
        match self {
            Selection::Unselected => None,
            Selection::Selected(name) => Some(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    YearChanged(Year),
    /// Click carrying the feature's `nombre` property.
    Clicked(String),
}

/// Per-visitor state of the province map page. Travels with each request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub year: Year,
    pub selection: Selection,
}

impl Session {
    pub fn new(year: Year) -> Self {
        Self { year, selection: Selection::Unselected }
    }

    /// Rebuilds a session from query parameters; an empty province means unselected.
    /// The name is kept verbatim so it matches the map join exactly.
    pub fn from_parts(year: Year, provincia: Option<&str>) -> Self {
        let selection = match provincia {
            Some(name) if !name.is_empty() => Selection::Selected(name.to_string()),
            _ => Selection::Unselected,
        };
        Self { year, selection }
    }

    /// A year change clears the selection; any click replaces it.
    pub fn apply(self, event: Event) -> Self {
        match event {
            Event::YearChanged(year) if year == self.year => self,
            Event::YearChanged(year) => Session::new(year),
            Event::Clicked(name) => Session { selection: Selection::Selected(name), ..self },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn y(v: u16) -> Year {
        Year::new(v).unwrap()
    }

    #[test]
    fn click_selects_and_reselects() {
        let s = Session::new(y(2020)).apply(Event::Clicked("Salta".into()));
        assert_eq!(s.selection, Selection::Selected("Salta".into()));
        let s = s.apply(Event::Clicked("Jujuy".into()));
        assert_eq!(s.selection.province(), Some("Jujuy"));
    }

    #[test]
    fn year_change_resets_selection() {
        let s = Session::new(y(2020))
            .apply(Event::Clicked("Salta".into()))
            .apply(Event::YearChanged(y(2012)));
        assert_eq!(s, Session::new(y(2012)));
    }

    #[test]
    fn same_year_keeps_selection() {
        let s = Session::new(y(2020))
            .apply(Event::Clicked("Salta".into()))
            .apply(Event::YearChanged(y(2020)));
        assert_eq!(s.selection.province(), Some("Salta"));
    }

    #[test]
    fn empty_province_is_unselected() {
        assert_eq!(Session::from_parts(y(2020), Some("")).selection, Selection::Unselected);
        assert_eq!(Session::from_parts(y(2020), None).selection, Selection::Unselected);
    }

    #[test]
    fn province_name_is_not_trimmed() {
        let s = Session::from_parts(y(2020), Some("Salta "));
        assert_eq!(s.selection.province(), Some("Salta "));
    }
}
