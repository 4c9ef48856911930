//! Indexed CSV loading with content-hash cache invalidation (C6). Grounded on
//! `repositories/indexed_csv_handler.py`'s `IndexedCSVHandler`, with two deliberate
//! substitutions noted in DESIGN.md: `blake3` instead of MD5 for the content hash, and a
//! JSON sidecar instead of `pickle` for the on-disk index.

use crate::domain::{CommentType, PastComment};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentIndex {
    schema_version: u32,
    pub all_comments: Vec<PastComment>,
    pub by_weather: HashMap<String, Vec<usize>>,
    pub by_count: HashMap<u32, Vec<usize>>,
    pub by_season: HashMap<String, Vec<usize>>,
}

impl CommentIndex {
    fn build(comments: Vec<PastComment>) -> Self {
        let mut by_weather: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_count: HashMap<u32, Vec<usize>> = HashMap::new();
        let mut by_season: HashMap<String, Vec<usize>> = HashMap::new();

        for (i, c) in comments.iter().enumerate() {
            by_weather.entry(c.weather_condition_text.clone()).or_default().push(i);
            by_count.entry(c.usage_count).or_default().push(i);
            if let Some(season) = &c.season {
                by_season.entry(season.clone()).or_default().push(i);
            }
        }

        Self {
            schema_version: SCHEMA_VERSION,
            all_comments: comments,
            by_weather,
            by_count,
            by_season,
        }
    }

    pub fn search_by_weather(&self, weather_condition: &str) -> Vec<&PastComment> {
        self.by_weather
            .iter()
            .filter(|(key, _)| key.contains(weather_condition) || weather_condition.contains(key.as_str()))
            .flat_map(|(_, indices)| indices.iter().map(|&i| &self.all_comments[i]))
            .collect()
    }

    pub fn search_by_usage_count(&self, min_count: u32, max_count: u32) -> Vec<&PastComment> {
        self.by_count
            .iter()
            .filter(|(count, _)| **count >= min_count && **count <= max_count)
            .flat_map(|(_, indices)| indices.iter().map(|&i| &self.all_comments[i]))
            .collect()
    }
}

fn file_hash(path: &Path) -> std::io::Result<String> {
    let contents = std::fs::read(path)?;
    Ok(blake3::hash(&contents).to_hex().to_string())
}

fn index_sidecar_path(cache_dir: &Path, csv_path: &Path, hash: &str) -> PathBuf {
    let stem = csv_path.file_stem().and_then(|s| s.to_str()).unwrap_or("index");
    cache_dir.join(format!("{stem}_{hash}.json"))
}

fn parse_row(
    row: &csv::StringRecord,
    headers: &csv::StringRecord,
    comment_type: CommentType,
    season: &str,
) -> Option<PastComment> {
    let get = |name: &str| -> Option<&str> {
        headers.iter().position(|h| h == name).and_then(|i| row.get(i))
    };

    let comment_text = match comment_type {
        CommentType::WeatherComment => get("weather_comment")?.trim(),
        CommentType::Advice => get("advice")?.trim(),
    };
    if comment_text.is_empty() {
        return None;
    }

    Some(PastComment {
        location: String::new(),
        datetime: chrono::Utc::now(),
        weather_condition_text: get("weather_condition").unwrap_or("").to_string(),
        comment_text: comment_text.to_string(),
        comment_type,
        temperature: get("temperature").and_then(|s| s.parse().ok()),
        usage_count: get("usage_count").and_then(|s| s.parse().ok()).unwrap_or(0),
        season: Some(season.to_string()),
        region: get("region").map(|s| s.to_string()),
    })
}

/// Loads and caches per-CSV comment indexes, rebuilding whenever the file's content hash
/// changes or the on-disk sidecar is missing/schema-mismatched.
pub struct IndexedCsvRepository {
    cache_dir: PathBuf,
    memory: std::sync::Mutex<HashMap<PathBuf, (String, CommentIndex)>>,
}

impl IndexedCsvRepository {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = cache_dir.into();
        let _ = std::fs::create_dir_all(&cache_dir);
        Self {
            cache_dir,
            memory: std::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn load(
        &self,
        csv_path: &Path,
        comment_type: CommentType,
        season: &str,
    ) -> Vec<PastComment> {
        match self.load_index(csv_path, comment_type, season) {
            Some(index) => index.all_comments,
            None => Vec::new(),
        }
    }

    pub fn load_index(
        &self,
        csv_path: &Path,
        comment_type: CommentType,
        season: &str,
    ) -> Option<CommentIndex> {
        let Ok(hash) = file_hash(csv_path) else {
            tracing::warn!("comment corpus file not readable: {}", csv_path.display());
            return None;
        };

        {
            let memory = self.memory.lock().unwrap();
            if let Some((cached_hash, index)) = memory.get(csv_path) {
                if cached_hash == &hash {
                    return Some(index.clone());
                }
            }
        }

        let sidecar = index_sidecar_path(&self.cache_dir, csv_path, &hash);
        if let Some(index) = self.load_sidecar(&sidecar) {
            self.memory.lock().unwrap().insert(csv_path.to_path_buf(), (hash, index.clone()));
            return Some(index);
        }

        let index = self.build_index(csv_path, comment_type, season)?;
        self.save_sidecar(&sidecar, &index);
        self.memory.lock().unwrap().insert(csv_path.to_path_buf(), (hash, index.clone()));
        Some(index)
    }

    fn build_index(&self, csv_path: &Path, comment_type: CommentType, season: &str) -> Option<CommentIndex> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(csv_path)
            .map_err(|err| tracing::warn!("failed to open corpus CSV {}: {err}", csv_path.display()))
            .ok()?;

        let headers = reader.headers().cloned().ok()?;
        let mut comments = Vec::new();
        for result in reader.records() {
            let Ok(row) = result else { continue };
            if let Some(comment) = parse_row(&row, &headers, comment_type, season) {
                comments.push(comment);
            }
        }

        Some(CommentIndex::build(comments))
    }

    fn load_sidecar(&self, path: &Path) -> Option<CommentIndex> {
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str::<CommentIndex>(&contents) {
            Ok(index) if index.schema_version == SCHEMA_VERSION => Some(index),
            Ok(_) => {
                tracing::info!("index sidecar {} has a stale schema version, rebuilding", path.display());
                None
            }
            Err(err) => {
                tracing::warn!("failed to parse index sidecar {}: {err}", path.display());
                None
            }
        }
    }

    fn save_sidecar(&self, path: &Path, index: &CommentIndex) {
        let Ok(json) = serde_json::to_string(index) else {
            return;
        };
        let tmp_path = path.with_extension("json.tmp");
        if std::fs::write(&tmp_path, json).is_ok() {
            if let Err(err) = std::fs::rename(&tmp_path, path) {
                tracing::warn!("failed to finalize index sidecar {}: {err}", path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TempDir(PathBuf);
    impl TempDir {
        fn new(tag: &str) -> Self {
            let p = std::env::temp_dir().join(format!("weather-comment-gen-test-{tag}-{}", std::process::id()));
            let _ = std::fs::remove_dir_all(&p);
            std::fs::create_dir_all(&p).unwrap();
            TempDir(p)
        }
    }
    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    fn write_corpus(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn builds_index_and_caches_sidecar() {
        let dir = TempDir::new("indexed-csv");
        let csv_path = write_corpus(
            &dir.0,
            "夏_weather_comment_enhanced100.csv",
            "weather_comment,weather_condition,temperature,usage_count\n爽やかな朝です,clear,22,3\n",
        );
        let repo = IndexedCsvRepository::new(dir.0.join("idx"));
        let comments = repo.load(&csv_path, CommentType::WeatherComment, "夏");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].comment_text, "爽やかな朝です");

        let sidecar_exists = std::fs::read_dir(dir.0.join("idx")).unwrap().count() > 0;
        assert!(sidecar_exists);
    }

    #[test]
    fn rebuilds_when_file_content_changes() {
        let dir = TempDir::new("indexed-csv-rebuild");
        let csv_path = write_corpus(
            &dir.0,
            "夏_advice_enhanced100.csv",
            "advice,usage_count\n日焼け止めを,1\n",
        );
        let repo = IndexedCsvRepository::new(dir.0.join("idx"));
        let first = repo.load(&csv_path, CommentType::Advice, "夏");
        assert_eq!(first.len(), 1);

        std::fs::write(&csv_path, "advice,usage_count\n日焼け止めを,1\n水分補給を,2\n").unwrap();
        let second = repo.load(&csv_path, CommentType::Advice, "夏");
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn missing_file_returns_empty_not_panic() {
        let dir = TempDir::new("indexed-csv-missing");
        let repo = IndexedCsvRepository::new(dir.0.join("idx"));
        let comments = repo.load(Path::new("/nonexistent/corpus.csv"), CommentType::WeatherComment, "夏");
        assert!(comments.is_empty());
    }

    #[test]
    fn search_by_weather_matches_substring() {
        let dir = TempDir::new("indexed-csv-search");
        let csv_path = write_corpus(
            &dir.0,
            "夏_weather_comment_enhanced100.csv",
            "weather_comment,weather_condition,usage_count\n雨が続きます,heavy_rain,0\n",
        );
        let repo = IndexedCsvRepository::new(dir.0.join("idx"));
        let index = repo.load_index(&csv_path, CommentType::WeatherComment, "夏").unwrap();
        assert_eq!(index.search_by_weather("rain").len(), 1);
    }
}
