//! Submission Context - Genre Catalog

/// 题材目录
///
/// 会话开始时从后端拉取一次，之后只读
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenreCatalog {
    genres: Vec<String>,
}

impl GenreCatalog {
    pub fn new(genres: Vec<String>) -> Self {
        Self { genres }
    }

    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    pub fn is_empty(&self) -> bool {
        self.genres.is_empty()
    }

    pub fn contains(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g == genre)
    }

    /// 推导当前应选中的题材
    ///
    /// 目录非空且不包含 `current` 时取第一项，否则保持 `current`
    pub fn resolve_selection(&self, current: &str) -> String {
        match self.genres.first() {
            Some(first) if !self.contains(current) => first.clone(),
            _ => current.to_string(),
        }
    }
}
