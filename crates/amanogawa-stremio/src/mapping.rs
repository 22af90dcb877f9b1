// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure mapping of catalog records to Stremio objects. No I/O.

use amanogawa_catalog::{Episode, Title};

use crate::ids;
use crate::protocol::{
    BehaviorHints, CatalogDescriptor, ContentType, ExtraField, Manifest, Meta, MetaPreview, Stream,
    Video,
};

pub const ADDON_ID: &str = "com.amonogawa.stremio";
pub const SERIES_CATALOG_ID: &str = "amonogawa-series";
pub const MOVIES_CATALOG_ID: &str = "amonogawa-movies";

/// Builds the addon manifest. `catalog_base` is the catalog site URL used for the logo.
pub fn manifest(catalog_base: &str) -> Manifest {
    let extra = || vec![ExtraField { name: "search" }, ExtraField { name: "skip" }];
    Manifest {
        id: ADDON_ID,
        version: env!("CARGO_PKG_VERSION"),
        name: "Amonogawa UA",
        description: "Українське аніме від Амоногава",
        logo: format!("{catalog_base}/media/images/posters/2025/posters_mini/133.jpg"),
        types: vec![ContentType::Series, ContentType::Movie],
        catalogs: vec![
            CatalogDescriptor {
                content_type: ContentType::Series,
                id: SERIES_CATALOG_ID,
                name: "Amonogawa — Серіали",
                extra: extra(),
            },
            CatalogDescriptor {
                content_type: ContentType::Movie,
                id: MOVIES_CATALOG_ID,
                name: "Amonogawa — Фільми",
                extra: extra(),
            },
        ],
        resources: vec!["catalog", "meta", "stream"],
        id_prefixes: vec![ids::ID_PREFIX],
    }
}

/// Catalog entry for a title.
pub fn to_catalog_meta(title: &Title, catalog_base: &str) -> MetaPreview {
    let content_type = ContentType::for_title(title.is_movie);
    let year = title.year.filter(|y| *y != 0);

    let mut parts = Vec::new();
    if let Some(year) = year {
        parts.push(year.to_string());
    }
    if let Some(total) = title.episodes_total.filter(|n| *n > 0)
        && !content_type.is_movie()
    {
        parts.push(format!("{total} еп."));
    }
    if let Some(schedule) = title.schedule.as_deref().filter(|s| !s.is_empty()) {
        parts.push(schedule.to_string());
    }

    let poster = non_empty(&title.poster_thumb)
        .or(non_empty(&title.poster_mini))
        .map(|p| absolute(p, catalog_base))
        .unwrap_or_default();

    MetaPreview {
        id: ids::title_id(title.id),
        content_type,
        name: display_name(title),
        poster,
        description: parts.join(" • "),
        year,
    }
}

/// Full detail object for a title and its episodes.
pub fn to_meta(title: &Title, episodes: &[Episode], catalog_base: &str) -> Meta {
    let content_type = ContentType::for_title(title.is_movie);
    let season = title.season.unwrap_or(1);
    let year = title.year.filter(|y| *y != 0);

    let background = title
        .screens_f
        .first()
        .and_then(|pair| pair.first())
        .filter(|s| !s.is_empty())
        .map(|s| absolute(s, catalog_base));

    let mut release = Vec::new();
    if let Some(year) = year {
        release.push(year.to_string());
    }
    if season > 0 {
        release.push(format!("Сезон {season}"));
    }
    if let Some(part) = title.part.filter(|p| *p > 0) {
        release.push(format!("Ч.{part}"));
    }

    let videos = if content_type.is_movie() {
        Vec::new()
    } else {
        episodes
            .iter()
            .map(|episode| to_video(title.id, season, episode, catalog_base))
            .collect()
    };

    Meta {
        id: ids::title_id(title.id),
        content_type,
        name: display_name(title),
        description: title.description.clone().unwrap_or_default(),
        year,
        poster: non_empty(&title.poster)
            .map(|p| absolute(p, catalog_base))
            .unwrap_or_default(),
        genres: title.genre_names(),
        runtime: title.duration.clone().unwrap_or_default(),
        release_info: (!release.is_empty()).then(|| release.join(" • ")),
        background,
        director: non_empty(&title.director).map(str::to_string).into_iter().collect(),
        videos,
    }
}

fn to_video(title_id: i64, season: i64, episode: &Episode, catalog_base: &str) -> Video {
    let number = episode.number;
    let label = match non_empty(&episode.name) {
        _ if episode.is_ova => with_name("OVA", episode),
        _ if episode.is_extra => with_name("Екстра", episode),
        Some(name) => format!("Серія {number} — {name}"),
        None => format!("Серія {number}"),
    };
    Video {
        id: ids::episode_id(title_id, number),
        title: label,
        season,
        episode: number,
        thumbnail: non_empty(&episode.screen).map(|s| absolute(s, catalog_base)),
        released: non_empty(&episode.post_date).map(str::to_string),
    }
}

fn with_name(kind: &str, episode: &Episode) -> String {
    match non_empty(&episode.name) {
        Some(name) => format!("{kind} — {name}"),
        None => kind.to_string(),
    }
}

/// Streams for a title: the proxied video when the episode's bot id is known,
/// then any torrent links.
pub fn to_streams(title: &Title, episode_bot_id: Option<i64>, addon_base_url: &str) -> Vec<Stream> {
    let mut streams = Vec::new();

    if let Some(bot_id) = episode_bot_id
        && !addon_base_url.is_empty()
    {
        streams.push(Stream {
            title: "🇺🇦 Amonogawa (Telegram)".to_string(),
            url: Some(format!(
                "{}/stream-proxy/{bot_id}",
                addon_base_url.trim_end_matches('/')
            )),
            external_url: None,
            behavior_hints: Some(BehaviorHints {
                not_web_ready: true,
            }),
        });
    }

    let torrents = [
        (&title.torrent_url, "🇺🇦 Toloka torrent (весь сезон)"),
        (&title.torrent_4k_url, "🇺🇦 Toloka torrent 4K (весь сезон)"),
    ];
    for (url, label) in torrents {
        if let Some(url) = non_empty(url) {
            streams.push(Stream {
                title: label.to_string(),
                url: None,
                external_url: Some(url.to_string()),
                behavior_hints: None,
            });
        }
    }

    streams
}

/// Display name disambiguated by season, part, or failing both, year.
pub fn display_name(title: &Title) -> String {
    let mut suffix = Vec::new();
    if let Some(season) = title.season.filter(|s| *s > 1) {
        suffix.push(format!("Сезон {season}"));
    }
    if let Some(part) = title.part.filter(|p| *p > 0) {
        suffix.push(format!("Ч.{part}"));
    }
    if suffix.is_empty()
        && let Some(year) = title.year.filter(|y| *y != 0)
    {
        suffix.push(year.to_string());
    }

    let name = title.display_name();
    if suffix.is_empty() {
        name.to_string()
    } else {
        format!("{name} ({})", suffix.join(", "))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn absolute(path: &str, base: &str) -> String {
    if path.starts_with("http") {
        path.to_string()
    } else {
        format!("{}{path}", base.trim_end_matches('/'))
    }
}
