//! 파일시스템 차트 이미지 저장소.

use crate::error::{DataError, Result};
use crate::store::ChartStore;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// 로컬 디렉토리에 차트 PNG를 기록하는 blob 저장소.
///
/// 키는 루트 디렉토리 기준의 상대 경로이며, 반환 위치는 `file://` URI입니다.
#[derive(Debug, Clone)]
pub struct FsChartStore {
    root: PathBuf,
}

impl FsChartStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 키를 루트 아래 경로로 변환합니다. 루트를 벗어나는 키는 거부합니다.
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if key.is_empty() || escapes {
            return Err(DataError::InvalidData(format!("invalid chart key: {key}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ChartStore for FsChartStore {
    async fn put_chart(&self, key: &str, png: &[u8]) -> Result<String> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, png).await?;

        debug!(path = %path.display(), bytes = png.len(), "Chart stored");
        Ok(format!("file://{}", path.display()))
    }
}
