use crate::model::Signature;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// 特征数据文件顶层结构：`{ "signatures": [...] }`
#[derive(Debug, Deserialize)]
struct SignatureFile {
    #[serde(default)]
    signatures: Vec<Signature>,
}

pub fn load_signatures_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<Signature>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read signature file: {:?}", path))?;

    let file: SignatureFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse signature file: {:?}", path))?;

    Ok(file.signatures)
}

/// 遍历目录加载所有 .json 特征文件；解析失败的文件记日志后跳过
pub fn load_signatures_from_dir<P: AsRef<Path>>(path: P) -> Result<Vec<Signature>> {
    let mut signatures = Vec::new();

    for entry in WalkDir::new(path) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        if entry.path().extension().and_then(|e| e.to_str()) == Some("json") {
            match load_signatures_from_file(entry.path()) {
                Ok(loaded) => signatures.extend(loaded),
                Err(err) => {
                    tracing::warn!(file = %entry.path().display(), error = %err, "skipping signature file");
                }
            }
        }
    }

    Ok(signatures)
}
