// Detector module - 检测器模块
// 定义检测器的核心接口与按行匹配的公共逻辑

pub mod javascript;
pub mod python;

use crate::error::Result;
use crate::model::{Match, Signature};
use async_trait::async_trait;
use regex::Regex;
use std::path::Path;

/// 检测器 trait - 每种语言一个实现
///
/// 实现必须满足：`detect_file` 对不支持的扩展名返回 `Ok(vec![])` 而不是错误；
/// `Detect*` 期间不得修改内部状态，以便跨任务共享。
#[async_trait]
pub trait Detector: Send + Sync {
    /// 返回检测器名称
    fn name(&self) -> &str;

    /// 返回支持的语言/扩展名标签
    fn supported_languages(&self) -> &[&str];

    /// 扫描磁盘上的单个文件
    async fn detect_file(&self, path: &Path) -> Result<Vec<Match>>;

    /// 扫描内存中的代码缓冲区
    async fn detect_code(&self, code: &str, file_path: &str) -> Result<Vec<Match>>;
}

/// 预编译后的特征：无效模式在编译期丢弃，不会中断扫描
pub(crate) struct CompiledSignature {
    pub signature: Signature,
    pub patterns: Vec<Regex>,
}

pub(crate) fn compile_signatures(signatures: Vec<Signature>) -> Vec<CompiledSignature> {
    signatures
        .into_iter()
        .map(|signature| {
            let patterns = signature
                .code_patterns
                .iter()
                .filter_map(|pattern| match Regex::new(pattern) {
                    Ok(re) => Some(re),
                    Err(err) => {
                        tracing::debug!(
                            signature = %signature.id,
                            pattern = %pattern,
                            error = %err,
                            "skipping malformed pattern"
                        );
                        None
                    }
                })
                .collect();
            CompiledSignature { signature, patterns }
        })
        .collect()
}

/// 逐行匹配：每个 (特征, 模式, 行) 命中产生一个 Match
pub(crate) fn scan_lines<F>(
    compiled: &[CompiledSignature],
    code: &str,
    file_path: &str,
    confidence: F,
) -> Vec<Match>
where
    F: Fn(&str, &str) -> f64,
{
    let mut matches = Vec::new();

    for (index, line) in code.lines().enumerate() {
        for sig in compiled {
            for re in &sig.patterns {
                if re.is_match(line) {
                    matches.push(Match {
                        signature: sig.signature.clone(),
                        file_path: file_path.to_string(),
                        line_number: index + 1,
                        matched_code: line.to_string(),
                        confidence: confidence(line, re.as_str()),
                    });
                }
            }
        }
    }

    matches
}

/// 将全文偏移换算为 1-based 行号，供整文件结构检查使用
pub(crate) fn line_number_at(code: &str, offset: usize) -> usize {
    1 + code[..offset].matches('\n').count()
}
