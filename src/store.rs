//! Saved tests on disk, keyed by `(project id, test id)`.
//!
//! Layout: `<root>/project-<project>/test-<test>/{test-config.json,test.spec.ts}`.

use crate::dispatch::TRIGGERS;
use crate::error::{ProbeError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "test-config.json";
const CODE_FILE: &str = "test.spec.ts";

/// Stored description of one test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConfig {
    pub test_id: String,
    pub test_name: String,
    pub url: String,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    /// Caller-supplied settings kept alongside the record
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Listing entry for a stored test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestInfo {
    pub project_id: String,
    pub test_id: String,
    pub test_name: String,
    pub url: String,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub has_test_code: bool,
    pub has_config: bool,
}

/// Everything needed to save a newly generated test
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub test_id: String,
    pub test_name: String,
    pub url: String,
    pub prompt: String,
    pub generated_code: String,
    #[serde(default)]
    pub test_config: serde_json::Map<String, serde_json::Value>,
}

/// Filesystem-backed store of test configs and instruction texts
#[derive(Debug, Clone)]
pub struct TestStore {
    root: PathBuf,
}

impl TestStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn project_dir(&self, project_id: &str) -> Result<PathBuf> {
        check_id("project", project_id)?;
        Ok(self.root.join(format!("project-{}", project_id)))
    }

    fn test_dir(&self, project_id: &str, test_id: &str) -> Result<PathBuf> {
        check_id("test", test_id)?;
        Ok(self.project_dir(project_id)?.join(format!("test-{}", test_id)))
    }

    /// Save a generated test; returns the path of the written instruction text
    pub fn save(&self, project_id: &str, request: &SaveRequest) -> Result<PathBuf> {
        let required = [
            ("projectId", project_id),
            ("testId", request.test_id.as_str()),
            ("testName", request.test_name.as_str()),
            ("url", request.url.as_str()),
            ("prompt", request.prompt.as_str()),
            ("generatedCode", request.generated_code.as_str()),
        ];
        if let Some((name, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ProbeError::Store(format!("missing required field {}", name)));
        }

        let dir = self.test_dir(project_id, &request.test_id)?;
        fs::create_dir_all(dir.join("screenshots"))?;

        let code = extract_code_block(&request.generated_code);
        let script = compose_script(&request.test_name, &request.url, code);
        let code_path = dir.join(CODE_FILE);
        fs::write(&code_path, script)?;

        let now = Utc::now();
        let config = TestConfig {
            test_id: request.test_id.clone(),
            test_name: request.test_name.clone(),
            url: request.url.clone(),
            prompt: request.prompt.clone(),
            created_at: now,
            last_modified: now,
            extra: request.test_config.clone(),
        };
        fs::write(dir.join(CONFIG_FILE), serde_json::to_string_pretty(&config)?)?;

        ::log::info!("Saved test {}/{} to {}", project_id, request.test_id, dir.display());
        Ok(code_path)
    }

    /// Stored config and instruction text
    pub fn load(&self, project_id: &str, test_id: &str) -> Result<(TestConfig, String)> {
        let dir = self.test_dir(project_id, test_id)?;
        let code = read_existing(&dir.join(CODE_FILE), project_id, test_id)?;
        let config = read_existing(&dir.join(CONFIG_FILE), project_id, test_id)?;
        Ok((serde_json::from_str(&config)?, code))
    }

    /// Replace the instruction text of an existing test
    pub fn update_code(&self, project_id: &str, test_id: &str, code: &str) -> Result<()> {
        if code.trim().is_empty() {
            return Err(ProbeError::Store("missing required field testCode".into()));
        }
        let dir = self.test_dir(project_id, test_id)?;
        if !dir.join(CODE_FILE).is_file() {
            return Err(not_found(project_id, test_id));
        }
        fs::write(dir.join(CODE_FILE), code)?;

        let config_path = dir.join(CONFIG_FILE);
        if config_path.is_file() {
            let mut config: TestConfig = serde_json::from_str(&fs::read_to_string(&config_path)?)?;
            config.last_modified = Utc::now();
            fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
        }
        Ok(())
    }

    /// Remove a test and everything stored with it
    pub fn delete(&self, project_id: &str, test_id: &str) -> Result<()> {
        let dir = self.test_dir(project_id, test_id)?;
        if !dir.is_dir() {
            return Err(not_found(project_id, test_id));
        }
        fs::remove_dir_all(&dir)?;
        ::log::info!("Deleted test {}/{}", project_id, test_id);
        Ok(())
    }

    /// Stored tests, newest first. `None` lists every project.
    pub fn list(&self, project_id: Option<&str>) -> Result<Vec<TestInfo>> {
        let projects = match project_id {
            Some(id) => vec![id.to_string()],
            None => prefixed_entries(&self.root, "project-")?,
        };

        let mut tests = Vec::new();
        for project in projects {
            let project_dir = self.project_dir(&project)?;
            if !project_dir.is_dir() {
                ::log::debug!("Project {} has no tests", project);
                continue;
            }
            for test_id in prefixed_entries(&project_dir, "test-")? {
                match self.info(&project, &test_id) {
                    Ok(info) => tests.push(info),
                    Err(e) => ::log::warn!("Skipping {}/{}: {}", project, test_id, e),
                }
            }
        }

        tests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tests)
    }

    fn info(&self, project_id: &str, test_id: &str) -> Result<TestInfo> {
        let dir = self.test_dir(project_id, test_id)?;
        let config_path = dir.join(CONFIG_FILE);
        let has_config = config_path.is_file();
        let config = if has_config {
            serde_json::from_str(&fs::read_to_string(&config_path)?)?
        } else {
            let now = Utc::now();
            TestConfig {
                test_id: test_id.to_string(),
                test_name: format!("Test {}", test_id),
                url: String::new(),
                prompt: String::new(),
                created_at: now,
                last_modified: now,
                extra: Default::default(),
            }
        };

        Ok(TestInfo {
            project_id: project_id.to_string(),
            test_id: test_id.to_string(),
            test_name: config.test_name,
            url: config.url,
            prompt: config.prompt,
            created_at: config.created_at,
            last_modified: config.last_modified,
            has_test_code: dir.join(CODE_FILE).is_file(),
            has_config,
        })
    }
}

/// Ids become single path components; anything that could leave the store root is refused
fn check_id(kind: &str, id: &str) -> Result<()> {
    let invalid = id.trim().is_empty()
        || id.contains(['/', '\\', '\0'])
        || id == "."
        || id == "..";
    if invalid {
        return Err(ProbeError::Store(format!("invalid {} id {:?}", kind, id)));
    }
    Ok(())
}

fn not_found(project_id: &str, test_id: &str) -> ProbeError {
    ProbeError::NotFound(format!("test {}/{}", project_id, test_id))
}

fn read_existing(path: &Path, project_id: &str, test_id: &str) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found(project_id, test_id)),
        Err(e) => Err(e.into()),
    }
}

/// Directory names under `dir` starting with `prefix`, with the prefix stripped
fn prefixed_entries(dir: &Path, prefix: &str) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(id) = entry.file_name().to_str().and_then(|n| n.strip_prefix(prefix)) {
            names.push(id.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Body of the first fenced code block, or the whole text when there is none
pub fn extract_code_block(generated: &str) -> &str {
    for fence in ["```typescript", "```ts", "```javascript", "```"] {
        if let Some(start) = generated.find(fence) {
            let body = &generated[start + fence.len()..];
            if let Some(end) = body.find("```") {
                return body[..end].trim();
            }
        }
    }
    generated
}

/// Instruction script stored for a test.
///
/// The labelled-button block is included when `code` mentions a registered
/// button label or one of its aliases.
pub fn compose_script(test_name: &str, url: &str, code: &str) -> String {
    let button_block = TRIGGERS
        .buttons
        .iter()
        .find(|b| b.is_mentioned(code))
        .map(|b| {
            format!(
                r#"
  // Button check
  const button = page.locator('{locator}');
  await expect(button).toBeVisible();
  {click};
  await page.waitForLoadState('networkidle');

  // After navigation
  await page.screenshot({{ path: 'result-page.png', fullPage: true }});
"#,
                locator = b.locator(),
                click = format!("await {}", TRIGGERS.click_phrase),
            )
        })
        .unwrap_or_default();

    format!(
        r#"import {{ test, expect }} from '@playwright/test';

test('{name}', async ({{ page }}) => {{
  const targetUrl = '{url}';

  await page.goto(targetUrl);
  await page.waitForLoadState('networkidle');
  await expect(page).toHaveTitle(/.*/);

  await page.screenshot({{ path: 'screenshot.png', fullPage: true }});
{button_block}
  // Landmarks
  const header = page.locator('header');
  const main = page.locator('main');
  const footer = page.locator('footer');

  if (await header.count() > 0) {{
    await expect(header).toBeVisible();
  }}
  if (await main.count() > 0) {{
    await expect(main).toBeVisible();
  }}
  if (await footer.count() > 0) {{
    await expect(footer).toBeVisible();
  }}
}});
"#,
        name = test_name.replace('\'', "\\'"),
        url = url.replace('\'', "\\'"),
        button_block = button_block,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Intent, classify};

    fn request(test_id: &str, code: &str) -> SaveRequest {
        SaveRequest {
            test_id: test_id.into(),
            test_name: "Top page reading".into(),
            url: "https://example.test/".into(),
            prompt: "Click the free reading button".into(),
            generated_code: code.into(),
            test_config: Default::default(),
        }
    }

    #[test]
    fn test_extract_code_block() {
        let text = "Purpose: check\n```typescript\nawait page.goto(url);\n```\nExpected: ok";
        assert_eq!(extract_code_block(text), "await page.goto(url);");
        assert_eq!(extract_code_block("plain text"), "plain text");
    }

    #[test]
    fn test_composed_script_triggers_scripted_click() {
        let script = compose_script("t", "https://example.test/", "press Free Reading");
        let intents = classify(&script);
        assert!(intents.contains(&Intent::ClickButton {
            label: "Free Reading".into(),
            scripted: true
        }));
        assert!(
            !intents
                .iter()
                .any(|i| matches!(i, Intent::CaptureScreenshot { .. }))
        );
    }

    #[test]
    fn test_composed_script_without_button_extracts_screenshots() {
        let script = compose_script("t", "https://example.test/", "check the headline");
        assert_eq!(
            classify(&script),
            vec![Intent::CaptureScreenshot {
                names: vec!["screenshot.png".into()]
            }]
        );
    }

    #[test]
    fn test_save_load_roundtrip_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = TestStore::new(dir.path());

        let path = store.save("dev", &request("1", "```ts\nclick\n```")).unwrap();
        assert!(path.ends_with("project-dev/test-1/test.spec.ts"));

        let (config, code) = store.load("dev", "1").unwrap();
        assert_eq!(config.test_name, "Top page reading");
        assert!(code.contains("await page.goto(targetUrl);"));

        store.save("dev", &request("2", "code")).unwrap();
        store.save("other", &request("3", "code")).unwrap();

        let all = store.list(None).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));
        assert!(all.iter().all(|t| t.has_config && t.has_test_code));

        assert_eq!(store.list(Some("dev")).unwrap().len(), 2);
        assert!(store.list(Some("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_save_rejects_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = TestStore::new(dir.path());
        let mut req = request("1", "code");
        req.prompt = String::new();
        let err = store.save("dev", &req).unwrap_err();
        assert!(matches!(err, ProbeError::Store(msg) if msg.contains("prompt")));
    }

    #[test]
    fn test_update_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = TestStore::new(dir.path());
        store.save("dev", &request("1", "code")).unwrap();
        let (before, _) = store.load("dev", "1").unwrap();

        store.update_code("dev", "1", "new instructions").unwrap();
        let (after, code) = store.load("dev", "1").unwrap();
        assert_eq!(code, "new instructions");
        assert!(after.last_modified >= before.last_modified);
        assert_eq!(after.created_at, before.created_at);

        store.delete("dev", "1").unwrap();
        assert!(matches!(store.load("dev", "1"), Err(ProbeError::NotFound(_))));
        assert!(matches!(store.delete("dev", "1"), Err(ProbeError::NotFound(_))));
        assert!(matches!(
            store.update_code("dev", "1", "x"),
            Err(ProbeError::NotFound(_))
        ));
    }

    #[test]
    fn test_ids_cannot_leave_the_store_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("store");
        let outside = dir.path().join("precious");
        std::fs::create_dir_all(&outside).unwrap();
        let store = TestStore::new(&root);
        store.save("dev", &request("1", "code")).unwrap();

        for test_id in ["1/../../../precious", "..", "a\\b", " "] {
            assert!(matches!(store.delete("dev", test_id), Err(ProbeError::Store(_))));
            assert!(matches!(store.load("dev", test_id), Err(ProbeError::Store(_))));
            let updated = store.update_code("dev", test_id, "x");
            assert!(matches!(updated, Err(ProbeError::Store(_))));
        }
        assert!(matches!(
            store.save("../escape", &request("2", "code")),
            Err(ProbeError::Store(_))
        ));
        assert!(matches!(store.list(Some("a/b")), Err(ProbeError::Store(_))));

        assert!(outside.is_dir());
        assert!(store.load("dev", "1").is_ok());
    }
}
