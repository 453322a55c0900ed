use crate::utils::error::Result;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Settings the analysis pipeline needs, whatever surface supplied them.
pub trait ConfigProvider: Send + Sync {
    fn allowed_extensions(&self) -> &[String];
    fn max_upload_mb(&self) -> usize;
    fn preview_rows(&self) -> usize;
    fn export_label(&self) -> &str;
    fn sheet_name(&self) -> &str;
}

/// Source of export timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> chrono::NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> chrono::NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}
