//! Submission Context - Value Objects

use std::path::Path;

use super::SubmissionError;

/// 目标时长（分钟）
///
/// 不变量: MIN..=MAX
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetMinutes(u32);

impl TargetMinutes {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 120;
    pub const DEFAULT: TargetMinutes = TargetMinutes(3);

    pub fn new(value: u32) -> Result<Self, SubmissionError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(SubmissionError::InvalidTargetMinutes {
                value,
                min: Self::MIN,
                max: Self::MAX,
            });
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for TargetMinutes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 音频格式（按扩展名识别，用于上传时附带 MIME 类型）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Flac,
    Ogg,
    M4a,
    Webm,
}

impl AudioFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "wav" => Some(Self::Wav),
            "mp3" => Some(Self::Mp3),
            "flac" => Some(Self::Flac),
            "ogg" | "oga" => Some(Self::Ogg),
            "m4a" | "mp4" => Some(Self::M4a),
            "webm" => Some(Self::Webm),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mpeg",
            Self::Flac => "audio/flac",
            Self::Ogg => "audio/ogg",
            Self::M4a => "audio/mp4",
            Self::Webm => "audio/webm",
        }
    }
}

/// 用户选择的音频文件
///
/// 对控制器而言是不透明的句柄，只有网关会读取其内容
#[derive(Clone, PartialEq, Eq)]
pub struct AudioFile {
    file_name: String,
    format: Option<AudioFormat>,
    data: Vec<u8>,
}

impl AudioFile {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let format = Path::new(&file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(AudioFormat::from_extension);
        Self {
            file_name,
            format,
            data,
        }
    }

    /// 从磁盘读取音频文件
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, SubmissionError> {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| SubmissionError::FileRead {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());

        tracing::debug!(path = %path.display(), size = data.len(), "Audio file loaded");
        Ok(Self::new(file_name, data))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn format(&self) -> Option<AudioFormat> {
        self.format
    }

    /// MIME 类型，无法识别扩展名时为 None（由传输层决定）
    pub fn mime_type(&self) -> Option<&'static str> {
        self.format.map(|f| f.mime_type())
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// 不打印文件内容
impl std::fmt::Debug for AudioFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioFile")
            .field("file_name", &self.file_name)
            .field("format", &self.format)
            .field("size", &self.data.len())
            .finish()
    }
}
