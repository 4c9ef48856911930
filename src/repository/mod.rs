//! Comment repository (C6): fixed corpus of CSV files keyed by (season, type), wrapped by
//! an indexed-CSV loader and a multi-level query cache. Grounded on
//! `repositories/{indexed_csv_handler,multilevel_comment_cache}.py`.

pub mod indexed_csv;
pub mod multilevel_cache;

use crate::domain::{CommentType, PastComment};
use indexed_csv::IndexedCsvRepository;
use multilevel_cache::MultiLevelCommentCache;
use std::path::PathBuf;

pub const SEASONS: &[&str] = &["春", "夏", "秋", "冬", "梅雨", "台風"];

pub struct CommentRepository {
    corpus_dir: PathBuf,
    csv: IndexedCsvRepository,
    cache: MultiLevelCommentCache,
}

fn corpus_filename(season: &str, comment_type: CommentType) -> String {
    let type_part = match comment_type {
        CommentType::WeatherComment => "weather_comment",
        CommentType::Advice => "advice",
    };
    format!("{season}_{type_part}_enhanced100.csv")
}

impl CommentRepository {
    pub fn new(corpus_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            corpus_dir: corpus_dir.into(),
            csv: IndexedCsvRepository::new(cache_dir),
            cache: MultiLevelCommentCache::new(100, 60),
        }
    }

    fn load_season_type(&self, season: &str, comment_type: CommentType) -> Vec<PastComment> {
        let path = self.corpus_dir.join(corpus_filename(season, comment_type));
        self.csv.load(&path, comment_type, season)
    }

    /// All comments of a type, capped per (season, type) bucket so one overrepresented
    /// season can't dominate candidate pools.
    pub fn get_all_available_comments(&self, comment_type: CommentType, cap_per_bucket: usize) -> Vec<PastComment> {
        if let Some(cached) = self.cache.get(Some(comment_type), None, None) {
            return cached;
        }

        let mut all = Vec::new();
        for &season in SEASONS {
            let mut bucket = self.load_season_type(season, comment_type);
            bucket.truncate(cap_per_bucket);
            all.extend(bucket);
        }
        self.cache.set(all.clone(), Some(comment_type), None, None);
        all
    }

    pub fn get_comments_by_season(&self, comment_type: CommentType, seasons: &[&str]) -> Vec<PastComment> {
        let mut all = Vec::new();
        for &season in seasons {
            if let Some(cached) = self.cache.get(Some(comment_type), Some(season), None) {
                all.extend(cached);
                continue;
            }
            let bucket = self.load_season_type(season, comment_type);
            self.cache.set(bucket.clone(), Some(comment_type), Some(season), None);
            all.extend(bucket);
        }
        all
    }

    pub fn search_by_weather(&self, comment_type: CommentType, condition_text: &str) -> Vec<PastComment> {
        let mut results = Vec::new();
        for &season in SEASONS {
            let path = self.corpus_dir.join(corpus_filename(season, comment_type));
            if let Some(index) = self.csv.load_index(&path, comment_type, season) {
                results.extend(index.search_by_weather(condition_text).into_iter().cloned());
            }
        }
        results
    }

    pub fn get_least_used(&self, comment_type: CommentType, limit: usize) -> Vec<PastComment> {
        let mut all = self.get_all_available_comments(comment_type, usize::MAX);
        all.sort_by_key(|c| c.usage_count);
        all.truncate(limit);
        all
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

    fn setup_corpus(dir: &PathBuf) {
        std::fs::write(
            dir.join("夏_weather_comment_enhanced100.csv"),
            "weather_comment,weather_condition,usage_count\n夏の青空です,clear,1\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("冬_weather_comment_enhanced100.csv"),
            "weather_comment,weather_condition,usage_count\n雪が降っています,snow,5\n",
        )
        .unwrap();
    }

    #[test]
    fn get_all_available_comments_spans_all_seasons() {
        let corpus_dir = TempDir::new("repo-corpus");
        let cache_dir = TempDir::new("repo-cache");
        setup_corpus(&corpus_dir.0);
        let repo = CommentRepository::new(corpus_dir.0.clone(), cache_dir.0.clone());
        let all = repo.get_all_available_comments(CommentType::WeatherComment, 10);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn get_least_used_sorts_ascending_by_usage_count() {
        let corpus_dir = TempDir::new("repo-least-used");
        let cache_dir = TempDir::new("repo-least-used-cache");
        setup_corpus(&corpus_dir.0);
        let repo = CommentRepository::new(corpus_dir.0.clone(), cache_dir.0.clone());
        let least = repo.get_least_used(CommentType::WeatherComment, 1);
        assert_eq!(least.len(), 1);
        assert_eq!(least[0].comment_text, "夏の青空です");
    }

    #[test]
    fn missing_season_file_is_skipped_not_fatal() {
        let corpus_dir = TempDir::new("repo-missing");
        let cache_dir = TempDir::new("repo-missing-cache");
        // Only write one season's file; the rest don't exist.
        std::fs::write(
            corpus_dir.0.join("夏_advice_enhanced100.csv"),
            "advice,usage_count\n水分補給を,0\n",
        )
        .unwrap();
        let repo = CommentRepository::new(corpus_dir.0.clone(), cache_dir.0.clone());
        let all = repo.get_all_available_comments(CommentType::Advice, 10);
        assert_eq!(all.len(), 1);
    }
}
