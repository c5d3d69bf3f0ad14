use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 漏洞特征：一条命名的模式描述，加载后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub id: String,
    pub name: String,
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
    pub code_patterns: Vec<String>,
    #[serde(default)]
    pub references: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// 单次命中结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub signature: Signature,
    pub file_path: String,
    /// 1-based line number
    pub line_number: usize,
    pub matched_code: String,
    pub confidence: f64,
}

/// 扫描结果汇总，由结果集派生
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_files: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub vulnerabilities: HashMap<String, usize>,
}

impl Summary {
    pub fn from_results(results: &HashMap<String, Vec<Match>>) -> Self {
        let mut summary = Summary {
            total_files: results.len(),
            ..Summary::default()
        };

        for matches in results.values() {
            for m in matches {
                match m.signature.severity {
                    Severity::High => summary.high += 1,
                    Severity::Medium => summary.medium += 1,
                    Severity::Low => summary.low += 1,
                }

                *summary
                    .vulnerabilities
                    .entry(m.signature.name.clone())
                    .or_insert(0) += 1;
            }
        }

        summary
    }
}
