use crate::city::error::CityError;

/// Separates the station code from the place name in IRCELINE labels.
const LABEL_SEPARATOR: &str = " - ";

/// Labels whose parsed place name is not the city the station belongs to.
/// Keys are matched as substrings of the full label.
const BUILTIN_OVERRIDES: [(&str, &str); 7] = [
    ("48R236 - Aeroport 2", "Liège"),
    ("48R516 - Aeroport 2", "Charleroi"),
    ("48R237 - Aeroport 1", "Liège"),
    ("48R515 - Aeroport 1", "Charleroi"),
    ("Arts-Loi", "Brussel"),
    ("Bruxelles", "Brussel"),
    ("Maerlant", "Antwerpen"),
];

/// Maps raw IRCELINE station labels to canonical city names.
///
/// Labels look like `"44R701 - Gent (Baudelostraat)"`. The default city is the
/// text between the first `" - "` and the first `(`, trimmed and capitalized.
/// An override table of label substrings takes precedence over the parsed name.
///
/// When several override keys occur in the same label, the **longest key wins**;
/// between keys of equal length the one listed first wins.
///
/// # Examples
///
/// ```
/// use irceline::CityResolver;
///
/// let resolver = CityResolver::default();
/// assert_eq!(resolver.resolve_city("XYZ123 - Gentbrugge (sensor A)").unwrap(), "Gentbrugge");
/// assert_eq!(resolver.resolve_city("48R236 - Aeroport 2 (something)").unwrap(), "Liège");
/// ```
#[derive(Debug, Clone)]
pub struct CityResolver {
    overrides: Vec<(String, String)>,
}

impl Default for CityResolver {
    fn default() -> Self {
        Self::new(
            BUILTIN_OVERRIDES
                .iter()
                .map(|(key, city)| (key.to_string(), city.to_string())),
        )
    }
}

impl CityResolver {
    /// Creates a resolver with a custom, ordered override table of
    /// `(label substring, canonical city)` pairs.
    pub fn new(overrides: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            overrides: overrides.into_iter().collect(),
        }
    }

    pub fn overrides(&self) -> &[(String, String)] {
        &self.overrides
    }

    /// Resolves `label` to a city name.
    ///
    /// # Errors
    ///
    /// Returns [`CityError::MalformedLabel`] if the label has no `" - "` separator,
    /// and [`CityError::EmptyCity`] if nothing usable follows it and no override applies.
    pub fn resolve_city(&self, label: &str) -> Result<String, CityError> {
        let (_, name_part) = label
            .split_once(LABEL_SEPARATOR)
            .ok_or_else(|| CityError::MalformedLabel(label.to_string()))?;

        if let Some(city) = self.matching_override(label) {
            return Ok(city.to_string());
        }

        let place = name_part.split('(').next().unwrap_or_default().trim();
        if place.is_empty() {
            return Err(CityError::EmptyCity(label.to_string()));
        }
        Ok(capitalize(place))
    }

    fn matching_override(&self, label: &str) -> Option<&str> {
        let mut best: Option<&(String, String)> = None;
        for entry in self.overrides.iter().filter(|(key, _)| label.contains(key.as_str())) {
            // Strictly longer only, so earlier entries win ties.
            if best.map_or(true, |(key, _)| entry.0.len() > key.len()) {
                best = Some(entry);
            }
        }
        best.map(|(_, city)| city.as_str())
    }
}

/// Upper-cases the first character and lower-cases the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
