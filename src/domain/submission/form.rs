//! Submission Context - Form

use super::{AudioFile, GenreCatalog, SubmissionError, TargetMinutes};

/// 提交表单
///
/// 不变量:
/// - genre 属于当前题材目录，或等于默认题材
/// - target_minutes 在合法范围内
/// - 最多选择一个文件
#[derive(Debug, Clone)]
pub struct SubmissionForm {
    genre: String,
    default_genre: String,
    target_minutes: TargetMinutes,
    file: Option<AudioFile>,
}

impl SubmissionForm {
    pub fn new(default_genre: impl Into<String>, target_minutes: TargetMinutes) -> Self {
        let default_genre = default_genre.into();
        Self {
            genre: default_genre.clone(),
            default_genre,
            target_minutes,
            file: None,
        }
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn target_minutes(&self) -> TargetMinutes {
        self.target_minutes
    }

    pub fn file(&self) -> Option<&AudioFile> {
        self.file.as_ref()
    }

    /// 选择题材，必须是目录中的题材或默认题材
    pub fn set_genre(&mut self, genre: &str, catalog: &GenreCatalog) -> Result<(), SubmissionError> {
        if genre != self.default_genre && !catalog.contains(genre) {
            return Err(SubmissionError::UnknownGenre(genre.to_string()));
        }
        self.genre = genre.to_string();
        Ok(())
    }

    pub fn set_target_minutes(&mut self, minutes: u32) -> Result<(), SubmissionError> {
        self.target_minutes = TargetMinutes::new(minutes)?;
        Ok(())
    }

    /// 选择文件，`None` 表示清空选择
    pub fn select_file(&mut self, file: Option<AudioFile>) {
        self.file = file;
    }

    /// 目录加载完成后重新推导题材选择
    pub fn apply_catalog(&mut self, catalog: &GenreCatalog) {
        self.genre = catalog.resolve_selection(&self.genre);
    }

    /// 取出待上传的文件，未选择时返回校验错误
    pub fn require_file(&self) -> Result<&AudioFile, SubmissionError> {
        self.file.as_ref().ok_or(SubmissionError::MissingFile)
    }
}
