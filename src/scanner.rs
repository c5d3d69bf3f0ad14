use crate::cache::ResultCache;
use crate::detector::Detector;
use crate::error::{Result, ScanError};
use crate::model::Match;
use crate::pool::WorkerPool;
use globset::{Glob, GlobMatcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use walkdir::WalkDir;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

const RESULT_CACHE_CAPACITY: usize = 4096;

/// 扫描编排器
///
/// 持有检测器集合与并发/增量/置信度配置；遍历目录、按排除模式与
/// 扩展名过滤文件、分发到检测器并聚合结果。
pub struct Scanner {
    detectors: Vec<Arc<dyn Detector>>,
    parallel: bool,
    incremental: bool,
    confidence_threshold: f64,
    cache: ResultCache,
}

/// 单次扫描使用的配置快照，可跨 worker 共享
#[derive(Clone)]
struct ScanContext {
    detectors: Vec<Arc<dyn Detector>>,
    incremental: bool,
    confidence_threshold: f64,
    cache: ResultCache,
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
            parallel: false,
            incremental: false,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            cache: ResultCache::new(RESULT_CACHE_CAPACITY),
        }
    }

    /// 注册检测器；不去重，重复注册会导致同一行产生重复命中
    pub fn register_detector<D: Detector + 'static>(&mut self, detector: D) {
        self.detectors.push(Arc::new(detector));
    }

    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel;
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    pub fn set_incremental(&mut self, incremental: bool) {
        self.incremental = incremental;
    }

    pub fn is_incremental(&self) -> bool {
        self.incremental
    }

    pub fn set_confidence_threshold(&mut self, threshold: f64) {
        self.confidence_threshold = threshold;
    }

    /// 所有已注册检测器支持的语言标签并集（允许重复）
    pub fn supported_languages(&self) -> Vec<String> {
        self.detectors
            .iter()
            .flat_map(|d| d.supported_languages().iter().map(|s| s.to_string()))
            .collect()
    }

    /// 清空结果缓存，可作为内存治理器的回收回调
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// 扫描单个文件，返回通过置信度阈值的命中
    pub async fn scan_file(&self, path: impl AsRef<Path>) -> Result<Vec<Match>> {
        self.context().scan_file(path.as_ref()).await
    }

    /// 扫描目录树；无命中的文件不出现在结果里
    pub async fn scan_directory(
        &self,
        root: impl AsRef<Path>,
        exclude_patterns: &[String],
    ) -> Result<HashMap<String, Vec<Match>>> {
        let root = root.as_ref();
        if !root.exists() {
            return Err(ScanError::TargetNotFound(root.to_path_buf()));
        }

        let excludes = compile_excludes(exclude_patterns);
        let files = self.collect_files(root, &excludes)?;
        let ctx = self.context();

        if self.parallel {
            scan_parallel(ctx, files).await
        } else {
            Ok(scan_sequential(ctx, files).await)
        }
    }

    fn context(&self) -> ScanContext {
        ScanContext {
            detectors: self.detectors.clone(),
            incremental: self.incremental,
            confidence_threshold: self.confidence_threshold,
            cache: self.cache.clone(),
        }
    }

    /// 枚举待扫描文件：排除目录整体剪枝，排除文件跳过，
    /// 其余文件要求扩展名被至少一个检测器声明支持
    fn collect_files(&self, root: &Path, excludes: &[GlobMatcher]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
            entry.depth() == 0 || !excludes.iter().any(|m| m.is_match(entry.file_name()))
        });

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let ext = match entry.path().extension().and_then(|e| e.to_str()) {
                Some(ext) => ext.to_lowercase(),
                None => continue,
            };

            let supported = self
                .detectors
                .iter()
                .any(|d| d.supported_languages().contains(&ext.as_str()));
            if supported {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanContext {
    async fn scan_file(&self, path: &Path) -> Result<Vec<Match>> {
        if !path.exists() {
            return Err(ScanError::TargetNotFound(path.to_path_buf()));
        }

        let key = path.to_string_lossy().into_owned();
        if self.incremental {
            if let Some(matches) = self.cache.get(&key) {
                tracing::debug!(file = %key, "cache hit");
                return Ok(matches);
            }
        }

        // 按注册顺序依次调用检测器，保证单文件内命中顺序确定
        let mut all_matches = Vec::new();
        for detector in &self.detectors {
            let matches = detector.detect_file(path).await?;
            all_matches.extend(
                matches
                    .into_iter()
                    .filter(|m| m.confidence >= self.confidence_threshold),
            );
        }

        if self.incremental {
            self.cache.put(key, all_matches.clone());
        }

        Ok(all_matches)
    }
}

async fn scan_sequential(ctx: ScanContext, files: Vec<PathBuf>) -> HashMap<String, Vec<Match>> {
    let mut results = HashMap::new();

    for file in files {
        match ctx.scan_file(&file).await {
            Ok(matches) if !matches.is_empty() => {
                results.insert(file.to_string_lossy().into_owned(), matches);
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(file = %file.display(), error = %err, "error scanning file, skipping");
            }
        }
    }

    results
}

async fn scan_parallel(
    ctx: ScanContext,
    files: Vec<PathBuf>,
) -> Result<HashMap<String, Vec<Match>>> {
    let workers = num_cpus::get().max(1);
    let pool = WorkerPool::new(workers, workers * 2);
    let results = Arc::new(Mutex::new(HashMap::new()));
    let ctx = Arc::new(ctx);

    for file in files {
        let ctx = Arc::clone(&ctx);
        let results = Arc::clone(&results);
        pool.submit(async move {
            match ctx.scan_file(&file).await {
                Ok(matches) if !matches.is_empty() => {
                    results
                        .lock()
                        .unwrap()
                        .insert(file.to_string_lossy().into_owned(), matches);
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(file = %file.display(), error = %err, "error scanning file, skipping");
                }
            }
        })
        .await?;
    }

    // 停池即批次完成屏障：返回时所有任务都已执行
    pool.stop().await;

    let results = std::mem::take(&mut *results.lock().unwrap());
    Ok(results)
}

/// 无法编译的排除模式按 PatternError 策略静默跳过
fn compile_excludes(patterns: &[String]) -> Vec<GlobMatcher> {
    patterns
        .iter()
        .filter_map(|pattern| match Glob::new(pattern) {
            Ok(glob) => Some(glob.compile_matcher()),
            Err(err) => {
                tracing::debug!(pattern = %pattern, error = %err, "skipping malformed exclude pattern");
                None
            }
        })
        .collect()
}
