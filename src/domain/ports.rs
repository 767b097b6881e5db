use crate::core::sampler::QuotaTable;
use crate::domain::model::{Continent, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatchFailurePolicy {
    /// 照樣寫回已標記的內容，只印出診斷訊息
    #[default]
    Write,
    /// 整個流程失敗，不寫檔
    Abort,
}

pub trait ConfigProvider: Send + Sync {
    fn target_path(&self) -> &str;
    fn function_name(&self) -> &str;
    fn quotas(&self) -> QuotaTable;
    fn markers(&self) -> Vec<(Continent, String)>;
    fn patch_failure_policy(&self) -> PatchFailurePolicy;
    fn exact_match(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<String>;
    async fn transform(&self, content: String) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
