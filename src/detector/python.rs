use super::{compile_signatures, line_number_at, scan_lines, CompiledSignature, Detector};
use crate::error::Result;
use crate::model::{Match, Severity, Signature};
use async_trait::async_trait;
use regex::Regex;
use std::path::Path;

/// Python 检测器：内置特征集 + 异常处理结构检查
pub struct PythonDetector {
    compiled: Vec<CompiledSignature>,
    empty_except: Regex,
    bare_except: Regex,
}

impl PythonDetector {
    pub fn new() -> Self {
        Self::with_signatures(builtin_signatures())
    }

    /// 使用外部加载的特征集（例如来自 JSON 特征文件）
    pub fn with_signatures(signatures: Vec<Signature>) -> Self {
        Self {
            compiled: compile_signatures(signatures),
            empty_except: Regex::new(r"(?m)^(\s*)except(\s+\w+)?:\s*$").unwrap(),
            bare_except: Regex::new(r"(?m)^(\s*)except:\s*").unwrap(),
        }
    }

    fn calculate_confidence(&self, matched_code: &str, pattern: &str) -> f64 {
        let mut confidence: f64 = 0.8;

        if matched_code.len() > 10 {
            confidence += 0.05;
        }
        if matched_code.contains("import") {
            confidence += 0.05;
        }
        if pattern.len() > 20 {
            confidence += 0.05;
        }
        if matched_code.contains('(') && matched_code.contains(')') {
            confidence += 0.05;
        }

        confidence.min(1.0)
    }

    /// 整文件检查：空 except 块与裸 except 块无法归约为单行模式
    fn check_python_specific_issues(&self, code: &str, file_path: &str) -> Vec<Match> {
        let mut matches = Vec::new();

        for m in self.empty_except.find_iter(code) {
            matches.push(Match {
                signature: Signature {
                    id: "PY011".to_string(),
                    name: "Empty except block".to_string(),
                    severity: Severity::Medium,
                    description: "Empty except blocks can hide errors and make debugging difficult"
                        .to_string(),
                    code_patterns: vec![r"except(\s+\w+)?:\s*$".to_string()],
                    references: vec![],
                },
                file_path: file_path.to_string(),
                line_number: line_number_at(code, m.start()),
                matched_code: m.as_str().to_string(),
                confidence: 0.85,
            });
        }

        for m in self.bare_except.find_iter(code) {
            matches.push(Match {
                signature: Signature {
                    id: "PY012".to_string(),
                    name: "Bare except block".to_string(),
                    severity: Severity::Medium,
                    description:
                        "Bare except blocks can catch unexpected exceptions and hide errors"
                            .to_string(),
                    code_patterns: vec![r"except:\s*".to_string()],
                    references: vec![],
                },
                file_path: file_path.to_string(),
                line_number: line_number_at(code, m.start()),
                matched_code: m.as_str().to_string(),
                confidence: 0.9,
            });
        }

        matches
    }
}

impl Default for PythonDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Detector for PythonDetector {
    fn name(&self) -> &str {
        "python"
    }

    fn supported_languages(&self) -> &[&str] {
        &["python", "py"]
    }

    async fn detect_file(&self, path: &Path) -> Result<Vec<Match>> {
        if path.extension().and_then(|e| e.to_str()) != Some("py") {
            return Ok(vec![]);
        }

        let content = tokio::fs::read_to_string(path).await?;
        self.detect_code(&content, &path.to_string_lossy()).await
    }

    async fn detect_code(&self, code: &str, file_path: &str) -> Result<Vec<Match>> {
        let mut matches = scan_lines(&self.compiled, code, file_path, |line, pattern| {
            self.calculate_confidence(line, pattern)
        });

        matches.extend(self.check_python_specific_issues(code, file_path));

        Ok(matches)
    }
}

fn builtin_signatures() -> Vec<Signature> {
    let sig = |id: &str,
               name: &str,
               severity: Severity,
               description: &str,
               patterns: &[&str],
               references: &[&str]| Signature {
        id: id.to_string(),
        name: name.to_string(),
        severity,
        description: description.to_string(),
        code_patterns: patterns.iter().map(|p| p.to_string()).collect(),
        references: references.iter().map(|r| r.to_string()).collect(),
    };

    vec![
        sig(
            "PY001",
            "Dangerous eval() usage",
            Severity::High,
            "Using eval() can execute arbitrary code and is a security risk",
            &[r"eval\s*\([^)]*\)"],
            &["https://docs.python.org/3/library/functions.html#eval"],
        ),
        sig(
            "PY002",
            "Dangerous exec() usage",
            Severity::High,
            "Using exec() can execute arbitrary code and is a security risk",
            &[r"exec\s*\([^)]*\)"],
            &["https://docs.python.org/3/library/functions.html#exec"],
        ),
        sig(
            "PY003",
            "Insecure pickle usage",
            Severity::High,
            "Using pickle with untrusted data can lead to arbitrary code execution",
            &[r"pickle\.loads\s*\([^)]*\)", r"pickle\.load\s*\([^)]*\)"],
            &["https://docs.python.org/3/library/pickle.html"],
        ),
        sig(
            "PY004",
            "SQL Injection risk",
            Severity::High,
            "String formatting in SQL queries can lead to SQL injection",
            &[
                r#"execute\s*\(['"][^'"]*%[^'"]*['"]"#,
                r#"execute\s*\(['"][^'"]*\{\s*[^}]*\}[^'"]*['"]\.format"#,
                r#"execute\s*\(['"][^'"]*\+[^'"]*['"]"#,
            ],
            &["https://owasp.org/www-community/attacks/SQL_Injection"],
        ),
        sig(
            "PY005",
            "Insecure random number generation",
            Severity::Medium,
            "Using random module for security purposes is not recommended",
            &[r"random\.(?:random|randint|choice|randrange)"],
            &["https://docs.python.org/3/library/random.html"],
        ),
        sig(
            "PY006",
            "Hardcoded credentials",
            Severity::High,
            "Hardcoded credentials are a security risk",
            &[
                r#"password\s*=\s*['"][^'"]{3,}['"]"#,
                r#"passwd\s*=\s*['"][^'"]{3,}['"]"#,
                r#"pwd\s*=\s*['"][^'"]{3,}['"]"#,
                r#"secret\s*=\s*['"][^'"]{3,}['"]"#,
                r#"api_key\s*=\s*['"][^'"]{3,}['"]"#,
            ],
            &["https://owasp.org/www-community/vulnerabilities/Use_of_hard-coded_credentials"],
        ),
        sig(
            "PY007",
            "Insecure hash function",
            Severity::Medium,
            "Using weak hash functions like MD5 or SHA1",
            &[r"hashlib\.md5", r"hashlib\.sha1"],
            &["https://owasp.org/www-community/vulnerabilities/Insufficient_entropy"],
        ),
        sig(
            "PY008",
            "Temporary file creation risk",
            Severity::Medium,
            "Insecure temporary file creation can lead to race conditions",
            &[r#"open\s*\(['"][^'"]*\/tmp[^'"]*['"]"#, r"tempfile\.mktemp"],
            &["https://docs.python.org/3/library/tempfile.html"],
        ),
        sig(
            "PY009",
            "Insecure deserialization",
            Severity::High,
            "Deserializing untrusted data can lead to arbitrary code execution",
            &[r"yaml\.load\s*\([^)]*\)", r"json\.loads\s*\([^)]*\)"],
            &["https://owasp.org/www-community/vulnerabilities/Deserialization_of_untrusted_data"],
        ),
        sig(
            "PY010",
            "Debug mode enabled",
            Severity::Medium,
            "Running applications in debug mode can expose sensitive information",
            &[r"debug\s*=\s*True", r"app\.run\s*\([^)]*debug\s*=\s*True[^)]*\)"],
            &["https://flask.palletsprojects.com/en/2.0.x/config/#DEBUG"],
        ),
    ]
}
