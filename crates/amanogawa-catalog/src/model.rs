// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog API records.
//!
//! The API is loosely typed: numbers sometimes arrive as strings and most
//! fields may be missing, so every field is defaulted and numeric fields go
//! through lenient deserializers.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One page of a paginated listing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Page<T> {
    /// Total number of pages.
    #[serde(default = "one")]
    pub pages: u32,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

fn one() -> u32 {
    1
}

/// A title (series or movie) as returned by `/api/titles` and `/api/title/{id}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Title {
    pub id: i64,
    /// Ukrainian name.
    pub name: Option<String>,
    /// Romanized or English name.
    pub en_jp_name: Option<String>,
    pub is_movie: bool,
    #[serde(deserialize_with = "lenient_int")]
    pub year: Option<i64>,
    #[serde(deserialize_with = "lenient_int")]
    pub season: Option<i64>,
    #[serde(deserialize_with = "lenient_int")]
    pub part: Option<i64>,
    #[serde(deserialize_with = "lenient_int")]
    pub episodes_total: Option<i64>,
    pub schedule: Option<String>,
    pub poster: Option<String>,
    pub poster_thumb: Option<String>,
    pub poster_mini: Option<String>,
    /// The API spells this field `descrition`.
    #[serde(rename = "descrition", alias = "description")]
    pub description: Option<String>,
    /// Screenshot pairs, full size first.
    pub screens_f: Vec<Vec<String>>,
    /// Genre pairs of `[id, name]`.
    pub genres_f: Vec<Vec<Value>>,
    pub director: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub duration: Option<String>,
    pub torrent_url: Option<String>,
    pub torrent_4k_url: Option<String>,
}

impl Title {
    /// Preferred display name: Ukrainian, then romanized.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.en_jp_name.as_deref())
            .unwrap_or("Unknown")
    }

    /// Genre names from the `[id, name]` pairs.
    pub fn genre_names(&self) -> Vec<String> {
        self.genres_f
            .iter()
            .filter_map(|pair| pair.get(1))
            .filter_map(|name| name.as_str().map(str::to_string))
            .collect()
    }

    /// Case-insensitive substring match on either name.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        [self.name.as_deref(), self.en_jp_name.as_deref()]
            .into_iter()
            .flatten()
            .any(|name| name.to_lowercase().contains(&query))
    }
}

/// An episode as returned by `/api/episodes/{title_id}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Episode {
    #[serde(deserialize_with = "lenient_int_or_zero")]
    pub number: i64,
    pub name: Option<String>,
    pub is_ova: bool,
    pub is_extra: bool,
    /// Thumbnail path.
    pub screen: Option<String>,
    pub post_date: Option<String>,
    /// Identifier the content bot understands.
    #[serde(deserialize_with = "lenient_int")]
    pub bot_id: Option<i64>,
}

fn int_from(value: Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(int_from(Value::deserialize(deserializer)?))
}

fn lenient_int_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(int_from(Value::deserialize(deserializer)?).unwrap_or(0))
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_tolerates_string_numbers_and_missing_fields() {
        let title: Title = serde_json::from_value(serde_json::json!({
            "id": 133,
            "name": "Провідник",
            "year": "2024",
            "season": 2,
            "descrition": "Опис",
            "duration": 24,
            "genres_f": [[1, "Екшн"], [2, "Драма"], [3]]
        }))
        .unwrap();

        assert_eq!(title.year, Some(2024));
        assert_eq!(title.season, Some(2));
        assert_eq!(title.part, None);
        assert!(!title.is_movie);
        assert_eq!(title.description.as_deref(), Some("Опис"));
        assert_eq!(title.duration.as_deref(), Some("24"));
        assert_eq!(title.genre_names(), vec!["Екшн", "Драма"]);
    }

    #[test]
    fn null_numbers_become_none() {
        let episode: Episode =
            serde_json::from_value(serde_json::json!({"number": null, "bot_id": null})).unwrap();
        assert_eq!(episode.number, 0);
        assert_eq!(episode.bot_id, None);
    }

    #[test]
    fn display_name_falls_back() {
        let mut title = Title {
            en_jp_name: Some("Frieren".into()),
            ..Title::default()
        };
        assert_eq!(title.display_name(), "Frieren");
        title.en_jp_name = None;
        assert_eq!(title.display_name(), "Unknown");
    }

    #[test]
    fn search_matches_either_name_case_insensitively() {
        let title = Title {
            name: Some("Фрірен".into()),
            en_jp_name: Some("Sousou no Frieren".into()),
            ..Title::default()
        };
        assert!(title.matches("frieren"));
        assert!(title.matches("ФРІ"));
        assert!(!title.matches("naruto"));
    }

    #[test]
    fn page_defaults_to_single_page() {
        let page: Page<Title> = serde_json::from_str(r#"{"data": [{"id": 1}]}"#).unwrap();
        assert_eq!(page.pages, 1);
        assert_eq!(page.data.len(), 1);
    }
}
