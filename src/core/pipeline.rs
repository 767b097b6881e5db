use crate::core::patcher::{legacy_function, patch_exact, patch_function, render_quota_function};
use crate::core::tagger::ContinentTagger;
use crate::core::{ConfigProvider, Pipeline, Storage, TransformResult};
use crate::domain::model::PatchOutcome;
use crate::domain::ports::PatchFailurePolicy;
use crate::utils::error::{EtlError, Result};
use std::io::Write;
use std::sync::{Arc, Mutex};

pub const PATCH_MISMATCH_MESSAGE: &str = "Function replace failed due to mismatch";

/// 診斷訊息的輸出端，預設是 stdout
pub type DiagnosticSink = Arc<Mutex<dyn Write + Send>>;

/// 讀檔 → 補洲別 → 換抽樣函式 → 寫回同一個檔案
pub struct MigrationPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    tagger: ContinentTagger,
    dry_run: bool,
    diagnostics: DiagnosticSink,
}

impl<S: Storage, C: ConfigProvider> MigrationPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        let tagger = ContinentTagger::new(config.markers());
        Self {
            storage,
            config,
            tagger,
            dry_run: false,
            diagnostics: Arc::new(Mutex::new(std::io::stdout())),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: DiagnosticSink) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    fn report_mismatch(&self) {
        match self.diagnostics.lock() {
            Ok(mut out) => {
                if let Err(e) = writeln!(out, "{}", PATCH_MISMATCH_MESSAGE).and_then(|_| out.flush()) {
                    tracing::warn!("Could not write diagnostic: {}", e);
                }
            }
            Err(_) => tracing::warn!("Diagnostic output is unavailable"),
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn patch(&self, text: &str) -> (String, PatchOutcome) {
        let function_name = self.config.function_name();
        let replacement = render_quota_function(function_name, &self.config.quotas());

        if self.config.exact_match() {
            patch_exact(text, &legacy_function(function_name), &replacement)
        } else {
            patch_function(text, function_name, &replacement)
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for MigrationPipeline<S, C> {
    async fn extract(&self) -> Result<String> {
        let path = self.config.target_path();
        tracing::debug!("Reading {}", path);

        let bytes = self.storage.read_file(path).await?;
        String::from_utf8(bytes).map_err(|e| EtlError::ProcessingError {
            message: format!("{} is not valid UTF-8: {}", path, e),
        })
    }

    async fn transform(&self, content: String) -> Result<TransformResult> {
        let report = self.tagger.tag_text(&content);
        let stats = report.stats.clone();
        tracing::debug!(
            "Tagged {} records, {} already tagged, {} without id, {} before any marker",
            stats.tagged,
            stats.already_tagged,
            stats.skipped_no_id,
            stats.skipped_no_context
        );

        let tagged = report.into_text();
        let (patched, patch) = self.patch(&tagged);

        if patch == PatchOutcome::NotFound {
            self.report_mismatch();
            tracing::warn!(
                "⚠️ Could not locate '{}' in {}",
                self.config.function_name(),
                self.config.target_path()
            );

            if self.config.patch_failure_policy() == PatchFailurePolicy::Abort {
                return Err(EtlError::PatchError {
                    function: self.config.function_name().to_string(),
                    path: self.config.target_path().to_string(),
                });
            }
        }

        Ok(TransformResult {
            changed: patched != content,
            content: patched,
            stats,
            patch,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let path = self.config.target_path().to_string();

        if self.dry_run {
            tracing::info!("🔍 Dry run, {} left untouched", path);
            return Ok(path);
        }

        if !result.changed {
            tracing::info!("Nothing to change in {}", path);
            return Ok(path);
        }

        tracing::debug!("Writing {} bytes to {}", result.content.len(), path);
        self.storage.write_file(&path, result.content.as_bytes()).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::TomlConfig;
    use std::collections::HashMap;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<tokio::sync::Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn with_file(path: &str, content: &str) -> Self {
            let mut files = HashMap::new();
            files.insert(path.to_string(), content.as_bytes().to_vec());
            Self {
                files: Arc::new(tokio::sync::Mutex::new(files)),
            }
        }

        async fn get_file(&self, path: &str) -> Option<String> {
            let files = self.files.lock().await;
            files
                .get(path)
                .map(|data| String::from_utf8_lossy(data).into_owned())
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    const DATA: &str = "export const COUNTRIES = [\n    // Asia (1)\n    { id: \"JPN\", name: \"Japonya\" },\n];\n\nexport function getRandomCountries(count = 32) {\n    const shuffled = [...COUNTRIES].sort(() => Math.random() - 0.5);\n    return shuffled.slice(0, count);\n}\n";

    fn config(toml: &str) -> TomlConfig {
        TomlConfig::from_toml_str(toml).unwrap()
    }

    #[tokio::test]
    async fn test_transform_tags_and_patches() {
        let storage = MockStorage::with_file("js/countries.js", DATA);
        let pipeline = MigrationPipeline::new(storage, config(""));

        let content = pipeline.extract().await.unwrap();
        let result = pipeline.transform(content).await.unwrap();

        assert_eq!(result.stats.tagged, 1);
        assert_eq!(result.patch, PatchOutcome::Replaced);
        assert!(result.changed);
        assert!(result.content.contains(r#"{ id: "JPN", continent: "Asia", name: "Japonya" }"#));
        assert!(result.content.contains("const quotas = {"));
    }

    #[tokio::test]
    async fn test_missing_function_still_writes_tagging_by_default() {
        let data = DATA.replace("getRandomCountries", "pickTeams");
        let storage = MockStorage::with_file("js/countries.js", &data);
        let pipeline = MigrationPipeline::new(storage.clone(), config(""));

        let content = pipeline.extract().await.unwrap();
        let result = pipeline.transform(content).await.unwrap();
        assert_eq!(result.patch, PatchOutcome::NotFound);
        assert!(result.changed);

        pipeline.load(result).await.unwrap();
        let written = storage.get_file("js/countries.js").await.unwrap();
        assert!(written.contains(r#"continent: "Asia""#));
        assert!(written.contains("export function pickTeams(count = 32) {"));
    }

    #[tokio::test]
    async fn test_mismatch_message_goes_to_diagnostics() {
        let data = DATA.replace("getRandomCountries", "pickTeams");
        let storage = MockStorage::with_file("js/countries.js", &data);
        let buffer = Arc::new(Mutex::new(Vec::<u8>::new()));
        let pipeline =
            MigrationPipeline::new(storage, config("")).with_diagnostics(buffer.clone());

        let content = pipeline.extract().await.unwrap();
        pipeline.transform(content).await.unwrap();

        let printed = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert_eq!(printed, "Function replace failed due to mismatch\n");
    }

    #[tokio::test]
    async fn test_no_diagnostic_when_function_replaced() {
        let storage = MockStorage::with_file("js/countries.js", DATA);
        let buffer = Arc::new(Mutex::new(Vec::<u8>::new()));
        let pipeline =
            MigrationPipeline::new(storage, config("")).with_diagnostics(buffer.clone());

        let content = pipeline.extract().await.unwrap();
        pipeline.transform(content).await.unwrap();

        assert!(buffer.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_function_aborts_when_strict() {
        let data = DATA.replace("getRandomCountries", "pickTeams");
        let storage = MockStorage::with_file("js/countries.js", &data);
        let pipeline = MigrationPipeline::new(
            storage,
            config("[error_handling]\non_patch_failure = \"abort\"\n"),
        );

        let content = pipeline.extract().await.unwrap();
        let err = pipeline.transform(content).await.unwrap_err();
        assert!(matches!(err, EtlError::PatchError { .. }));
    }

    #[tokio::test]
    async fn test_dry_run_does_not_write() {
        let storage = MockStorage::with_file("js/countries.js", DATA);
        let pipeline = MigrationPipeline::new(storage.clone(), config("")).with_dry_run(true);

        let content = pipeline.extract().await.unwrap();
        let result = pipeline.transform(content).await.unwrap();
        pipeline.load(result).await.unwrap();

        assert_eq!(storage.get_file("js/countries.js").await.unwrap(), DATA);
    }

    #[tokio::test]
    async fn test_exact_match_mode() {
        let storage = MockStorage::with_file("js/countries.js", DATA);
        let pipeline =
            MigrationPipeline::new(storage, config("[target]\nexact_match = true\n"));

        let content = pipeline.extract().await.unwrap();
        let drifted = content.replace("    return shuffled", "  return shuffled");
        let result = pipeline.transform(drifted).await.unwrap();
        assert_eq!(result.patch, PatchOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_extract_missing_file() {
        let storage = MockStorage::with_file("other.js", DATA);
        let pipeline = MigrationPipeline::new(storage, config(""));
        assert!(matches!(
            pipeline.extract().await,
            Err(EtlError::IoError(_))
        ));
    }
}
