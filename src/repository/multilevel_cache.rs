//! Multi-level query cache for comment lookups (C6). Grounded on
//! `repositories/multilevel_comment_cache.py`'s `MultiLevelCommentCache`: L1=type+season+
//! region, L2=type+season, L3=type, each progressively larger/longer-TTL'd, with
//! fall-through-and-populate on a broader-level hit.

use crate::domain::{CommentType, PastComment};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

struct LevelEntry {
    comments: Vec<PastComment>,
    inserted_at: DateTime<Utc>,
}

struct Level {
    max_size: usize,
    ttl: chrono::Duration,
    map: HashMap<String, LevelEntry>,
    order: std::collections::VecDeque<String>,
}

impl Level {
    fn new(max_size: usize, ttl_minutes: i64) -> Self {
        Self {
            max_size,
            ttl: chrono::Duration::minutes(ttl_minutes),
            map: HashMap::new(),
            order: std::collections::VecDeque::new(),
        }
    }

    fn get(&mut self, key: &str) -> Option<Vec<PastComment>> {
        let now = Utc::now();
        let expired = self.map.get(key).map(|e| now - e.inserted_at > self.ttl).unwrap_or(false);
        if expired {
            self.map.remove(key);
            self.order.retain(|k| k != key);
        }
        if let Some(entry) = self.map.get(key) {
            let comments = entry.comments.clone();
            self.order.retain(|k| k != key);
            self.order.push_back(key.to_string());
            Some(comments)
        } else {
            None
        }
    }

    fn set(&mut self, key: &str, comments: Vec<PastComment>) {
        if !self.map.contains_key(key) && self.map.len() >= self.max_size {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
            }
        }
        self.order.retain(|k| k != key);
        self.order.push_back(key.to_string());
        self.map.insert(
            key.to_string(),
            LevelEntry {
                comments,
                inserted_at: Utc::now(),
            },
        );
    }

    fn invalidate_prefix(&mut self, prefix: &str) -> usize {
        let keys: Vec<String> = self.map.keys().filter(|k| k.starts_with(prefix)).cloned().collect();
        for k in &keys {
            self.map.remove(k);
            self.order.retain(|o| o != k);
        }
        keys.len()
    }

    fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MultiLevelStats {
    pub l1_hits: u64,
    pub l2_hits: u64,
    pub l3_hits: u64,
    pub misses: u64,
    pub total_requests: u64,
}

impl MultiLevelStats {
    pub fn hit_rate(&self) -> f64 {
        let hits = self.l1_hits + self.l2_hits + self.l3_hits;
        if self.total_requests == 0 {
            0.0
        } else {
            hits as f64 / self.total_requests as f64
        }
    }
}

struct Inner {
    l1: Level,
    l2: Level,
    l3: Level,
    stats: MultiLevelStats,
}

pub struct MultiLevelCommentCache {
    inner: Mutex<Inner>,
}

fn cache_keys(comment_type: Option<CommentType>, season: Option<&str>, region: Option<&str>) -> (String, String, String) {
    let type_part = match comment_type {
        Some(CommentType::WeatherComment) => "weather_comment",
        Some(CommentType::Advice) => "advice",
        None => "all",
    };
    let l3 = format!("type:{type_part}");
    let l2 = format!("{l3}:season:{}", season.unwrap_or("all"));
    let l1 = format!("{l2}:region:{}", region.unwrap_or("all"));
    (l1, l2, l3)
}

fn filter_by_season<'a>(comments: &'a [PastComment], season: &str) -> Vec<PastComment> {
    comments
        .iter()
        .filter(|c| c.season.as_deref() == Some(season))
        .cloned()
        .collect()
}

fn filter_by_region(comments: &[PastComment], region: &str) -> Vec<PastComment> {
    comments
        .iter()
        .filter(|c| c.region.as_deref() == Some(region))
        .cloned()
        .collect()
}

impl MultiLevelCommentCache {
    pub fn new(max_size_per_level: usize, ttl_minutes: i64) -> Self {
        Self {
            inner: Mutex::new(Inner {
                l1: Level::new(max_size_per_level, ttl_minutes),
                l2: Level::new(max_size_per_level * 2, ttl_minutes * 2),
                l3: Level::new(max_size_per_level * 3, ttl_minutes * 3),
                stats: MultiLevelStats::default(),
            }),
        }
    }

    pub fn get(
        &self,
        comment_type: Option<CommentType>,
        season: Option<&str>,
        region: Option<&str>,
    ) -> Option<Vec<PastComment>> {
        let (l1_key, l2_key, l3_key) = cache_keys(comment_type, season, region);
        let mut inner = self.inner.lock().unwrap();
        inner.stats.total_requests += 1;

        if region.is_some() {
            if let Some(result) = inner.l1.get(&l1_key) {
                inner.stats.l1_hits += 1;
                return Some(result);
            }
        }

        if season.is_some() {
            if let Some(result) = inner.l2.get(&l2_key) {
                inner.stats.l2_hits += 1;
                if let Some(region) = region {
                    let filtered = filter_by_region(&result, region);
                    inner.l1.set(&l1_key, filtered.clone());
                    return Some(filtered);
                }
                return Some(result);
            }
        }

        if comment_type.is_some() {
            if let Some(result) = inner.l3.get(&l3_key) {
                inner.stats.l3_hits += 1;
                let mut filtered = result;
                if let Some(season) = season {
                    filtered = filter_by_season(&filtered, season);
                }
                if let Some(region) = region {
                    filtered = filter_by_region(&filtered, region);
                }
                if season.is_some() {
                    inner.l2.set(&l2_key, filtered.clone());
                }
                if region.is_some() {
                    inner.l1.set(&l1_key, filtered.clone());
                }
                return Some(filtered);
            }
        }

        inner.stats.misses += 1;
        None
    }

    pub fn set(
        &self,
        comments: Vec<PastComment>,
        comment_type: Option<CommentType>,
        season: Option<&str>,
        region: Option<&str>,
    ) {
        let (l1_key, l2_key, l3_key) = cache_keys(comment_type, season, region);
        let mut inner = self.inner.lock().unwrap();

        if region.is_some() {
            inner.l1.set(&l1_key, comments);
        } else if season.is_some() {
            inner.l2.set(&l2_key, comments);
        } else if comment_type.is_some() {
            inner.l3.set(&l3_key, comments);
        }
    }

    pub fn invalidate(
        &self,
        comment_type: Option<CommentType>,
        season: Option<&str>,
        region: Option<&str>,
    ) -> usize {
        let (l1_key, l2_key, l3_key) = cache_keys(comment_type, season, region);
        let mut inner = self.inner.lock().unwrap();
        let mut count = 0;

        if region.is_some() {
            if inner.l1.map.remove(&l1_key).is_some() {
                inner.l1.order.retain(|k| k != &l1_key);
                count += 1;
            }
        }
        if season.is_some() {
            count += inner.l2.invalidate_prefix(&l2_key);
        }
        if comment_type.is_some() {
            count += inner.l3.invalidate_prefix(&l3_key);
        }
        count
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.l1.clear();
        inner.l2.clear();
        inner.l3.clear();
        inner.stats = MultiLevelStats::default();
    }

    pub fn stats(&self) -> MultiLevelStats {
        self.inner.lock().unwrap().stats
    }
}
