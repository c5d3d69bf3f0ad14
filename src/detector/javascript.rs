use super::{compile_signatures, line_number_at, scan_lines, CompiledSignature, Detector};
use crate::error::Result;
use crate::model::{Match, Severity, Signature};
use async_trait::async_trait;
use regex::Regex;
use std::path::Path;

/// JavaScript/TypeScript 检测器
pub struct JavaScriptDetector {
    compiled: Vec<CompiledSignature>,
    console_log: Regex,
    alert: Regex,
}

impl JavaScriptDetector {
    pub fn new() -> Self {
        Self::with_signatures(builtin_signatures())
    }

    pub fn with_signatures(signatures: Vec<Signature>) -> Self {
        Self {
            compiled: compile_signatures(signatures),
            console_log: Regex::new(r"console\.log\s*\(").unwrap(),
            alert: Regex::new(r"alert\s*\(").unwrap(),
        }
    }

    fn calculate_confidence(&self, matched_code: &str, pattern: &str) -> f64 {
        let mut confidence: f64 = 0.8;

        if matched_code.len() > 10 {
            confidence += 0.05;
        }
        if matched_code.contains("import") || matched_code.contains("require") {
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

    /// 整文件检查：生产代码中的 console.log / alert 调用
    fn check_javascript_specific_issues(&self, code: &str, file_path: &str) -> Vec<Match> {
        let mut matches = Vec::new();

        for m in self.console_log.find_iter(code) {
            matches.push(Match {
                signature: Signature {
                    id: "JS011".to_string(),
                    name: "Console logging in production".to_string(),
                    severity: Severity::Low,
                    description: "Console logging should be removed from production code"
                        .to_string(),
                    code_patterns: vec![r"console\.log\s*\(".to_string()],
                    references: vec![],
                },
                file_path: file_path.to_string(),
                line_number: line_number_at(code, m.start()),
                matched_code: format!("{}...)", m.as_str()),
                confidence: 0.7,
            });
        }

        for m in self.alert.find_iter(code) {
            matches.push(Match {
                signature: Signature {
                    id: "JS012".to_string(),
                    name: "Alert in production".to_string(),
                    severity: Severity::Low,
                    description: "Alert dialogs should be removed from production code".to_string(),
                    code_patterns: vec![r"alert\s*\(".to_string()],
                    references: vec![],
                },
                file_path: file_path.to_string(),
                line_number: line_number_at(code, m.start()),
                matched_code: format!("{}...)", m.as_str()),
                confidence: 0.7,
            });
        }

        matches
    }
}

impl Default for JavaScriptDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Detector for JavaScriptDetector {
    fn name(&self) -> &str {
        "javascript"
    }

    fn supported_languages(&self) -> &[&str] {
        &["javascript", "js", "jsx", "ts", "tsx"]
    }

    async fn detect_file(&self, path: &Path) -> Result<Vec<Match>> {
        let supported = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("js") | Some("jsx") | Some("ts") | Some("tsx")
        );
        if !supported {
            return Ok(vec![]);
        }

        let content = tokio::fs::read_to_string(path).await?;
        self.detect_code(&content, &path.to_string_lossy()).await
    }

    async fn detect_code(&self, code: &str, file_path: &str) -> Result<Vec<Match>> {
        let mut matches = scan_lines(&self.compiled, code, file_path, |line, pattern| {
            self.calculate_confidence(line, pattern)
        });

        matches.extend(self.check_javascript_specific_issues(code, file_path));

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
            "JS001",
            "Dangerous eval() usage",
            Severity::High,
            "Using eval() can execute arbitrary code and is a security risk",
            &[r"eval\s*\([^)]*\)"],
            &["https://developer.mozilla.org/en-US/docs/Web/JavaScript/Reference/Global_Objects/eval"],
        ),
        sig(
            "JS002",
            "Dangerous Function() constructor",
            Severity::High,
            "Using Function() constructor can execute arbitrary code and is a security risk",
            &[r"new\s+Function\s*\([^)]*\)", r"Function\s*\([^)]*\)"],
            &["https://developer.mozilla.org/en-US/docs/Web/JavaScript/Reference/Global_Objects/Function"],
        ),
        sig(
            "JS003",
            "DOM-based XSS risk",
            Severity::High,
            "Manipulating innerHTML with user input can lead to XSS",
            &[
                r"\.innerHTML\s*=",
                r"\.outerHTML\s*=",
                r"document\.write\s*\(",
                r"document\.writeln\s*\(",
            ],
            &["https://owasp.org/www-community/attacks/xss/"],
        ),
        sig(
            "JS004",
            "Insecure random number generation",
            Severity::Medium,
            "Using Math.random() for security purposes is not recommended",
            &[r"Math\.random\s*\(\)"],
            &["https://developer.mozilla.org/en-US/docs/Web/JavaScript/Reference/Global_Objects/Math/random"],
        ),
        sig(
            "JS005",
            "Hardcoded credentials",
            Severity::High,
            "Hardcoded credentials are a security risk",
            &[
                r#"password\s*=\s*['"][^'"]{3,}['"]"#,
                r#"passwd\s*=\s*['"][^'"]{3,}['"]"#,
                r#"pwd\s*=\s*['"][^'"]{3,}['"]"#,
                r#"secret\s*=\s*['"][^'"]{3,}['"]"#,
                r#"apiKey\s*=\s*['"][^'"]{3,}['"]"#,
            ],
            &["https://owasp.org/www-community/vulnerabilities/Use_of_hard-coded_credentials"],
        ),
        sig(
            "JS006",
            "Insecure HTTP protocol",
            Severity::Medium,
            "Using HTTP instead of HTTPS can expose data to eavesdropping",
            &[r#"http://[^'"]*['"]"#],
            &["https://owasp.org/www-project-top-ten/2017/A3_2017-Sensitive_Data_Exposure"],
        ),
        sig(
            "JS007",
            "Potential prototype pollution",
            Severity::High,
            "Modifying Object.prototype can lead to prototype pollution vulnerabilities",
            &[r"Object\.prototype\.[^=]+=", r"__proto__\.[^=]+="],
            &["https://github.com/HoLyVieR/prototype-pollution-nsec18/blob/master/paper/JavaScript_prototype_pollution_attack_in_NodeJS.pdf"],
        ),
        sig(
            "JS008",
            "Insecure JWT verification",
            Severity::High,
            "Not verifying JWT signatures can lead to authentication bypass",
            &[r#"jwt\.verify\s*\([^,]*,\s*['"]?none['"]?[^)]*\)"#],
            &["https://auth0.com/blog/critical-vulnerabilities-in-json-web-token-libraries/"],
        ),
        // regex crate 不支持环视断言，这里使用无断言的简化模式
        sig(
            "JS009",
            "Insecure cookie settings",
            Severity::Medium,
            "Cookies without secure or httpOnly flags can be vulnerable to theft",
            &[r"document\.cookie\s*="],
            &["https://owasp.org/www-community/controls/SecureCookieAttribute"],
        ),
        sig(
            "JS010",
            "Debug mode enabled",
            Severity::Medium,
            "Running applications in debug mode can expose sensitive information",
            &[r"debug\s*:\s*true", r"debugMode\s*=\s*true"],
            &["https://expressjs.com/en/advanced/best-practice-security.html"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn detects_inner_html_assignment() {
        let detector = JavaScriptDetector::new();
        let matches = detector
            .detect_code("el.innerHTML = userInput;", "app.js")
            .await
            .unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].signature.id, "JS003");
        assert_eq!(matches[0].signature.severity, Severity::High);
    }

    #[tokio::test]
    async fn flags_console_log_as_structural_issue() {
        let detector = JavaScriptDetector::new();
        let code = "function f() {\n  console.log(secret);\n}\n";
        let matches = detector.detect_code(code, "app.js").await.unwrap();

        let js011: Vec<_> = matches
            .iter()
            .filter(|m| m.signature.id == "JS011")
            .collect();
        assert_eq!(js011.len(), 1);
        assert_eq!(js011[0].line_number, 2);
        assert_eq!(js011[0].matched_code, "console.log(...)");
    }

    #[tokio::test]
    async fn unsupported_extension_returns_empty() {
        let detector = JavaScriptDetector::new();
        let matches = detector.detect_file(Path::new("main.py")).await.unwrap();
        assert!(matches.is_empty());
    }
}
