//! Playwright browser automation
//!
//! A page session is rendered as one Node script so cookies, storage and the
//! current URL carry over from step to step. The script prints one JSON line
//! per finished step and a failure line before exiting non-zero.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::process::Command as TokioCommand;
use tracing::{debug, warn};

use serverest_common::SuiteConfig;

use crate::error::{E2eError, E2eResult};
use crate::spec::TestStep;

/// Playwright browser handle
#[derive(Debug, Clone)]
pub struct PlaywrightHandle {
    config: PlaywrightConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }

    pub fn from_name(name: &str) -> E2eResult<Self> {
        match name {
            "chromium" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" => Ok(Browser::Webkit),
            other => Err(E2eError::Playwright(format!(
                "unknown browser '{}' (expected chromium, firefox or webkit)",
                other
            ))),
        }
    }
}

/// Result of executing a test step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub step_name: String,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub screenshot_path: Option<PathBuf>,
}

/// Outcome of one browser session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptRun {
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
    pub failure_screenshot: Option<PathBuf>,
}

/// One line of script progress on stdout
#[derive(Debug, Default, Deserialize)]
struct ProgressLine {
    step: Option<usize>,
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    elapsed_ms: u64,
    error: Option<String>,
}

impl PlaywrightHandle {
    /// Create a new Playwright handle
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed()?;
        std::fs::create_dir_all(&config.screenshot_dir)?;
        Ok(Self { config })
    }

    /// Check if Playwright is installed
    fn check_playwright_installed() -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    pub fn config(&self) -> &PlaywrightConfig {
        &self.config
    }

    /// Run a page session and collect per-step results
    pub async fn run_steps(&self, session: &str, steps: &[TestStep]) -> E2eResult<ScriptRun> {
        let script = build_script(&self.config, session, steps);
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("session.js");
        std::fs::write(&script_path, &script)?;

        debug!("Running Playwright session '{}': {}", session, script_path.display());

        let start = Instant::now();
        let mut cmd = TokioCommand::new("node");
        cmd.arg(&script_path);
        if let Some(node_path) = &self.config.node_path {
            cmd.env("NODE_PATH", node_path);
        }
        let output = cmd.output().await?;
        let duration_ms = start.elapsed().as_millis() as u64;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut run = parse_progress(&stdout, steps, &self.config.screenshot_dir);
        run.duration_ms = duration_ms;

        if !output.status.success() {
            run.success = false;
            if run.error.is_none() {
                // The script died before reaching its own error handler.
                run.error = Some(format!("node exited with {}: {}", output.status, stderr.trim()));
            }
            if self.config.screenshot_on_failure {
                let path = failure_screenshot_path(&self.config, session);
                if path.exists() {
                    run.failure_screenshot = Some(path);
                }
            }
            warn!("Session '{}' failed: {}", session, run.error.as_deref().unwrap_or("unknown"));
        }

        Ok(run)
    }
}

/// Build the Node script for a page session
pub fn build_script(config: &PlaywrightConfig, session: &str, steps: &[TestStep]) -> String {
    let mut script = String::new();

    script.push_str(&format!(
        r#"
const {{ chromium, firefox, webkit }} = require('playwright');
const {{ expect }} = require('@playwright/test');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  page.setDefaultTimeout({timeout});
  const baseUrl = {base_url};
  let current = 0;
  let started = Date.now();
  const done = () => {{
    console.log(JSON.stringify({{ step: current, ok: true, elapsed_ms: Date.now() - started }}));
    current += 1;
    started = Date.now();
  }};

  try {{
"#,
        browser = config.browser.as_str(),
        headless = config.headless,
        width = config.viewport_width,
        height = config.viewport_height,
        timeout = config.command_timeout_ms,
        base_url = js_str(&config.base_url),
    ));

    for (i, step) in steps.iter().enumerate() {
        script.push_str(&format!("\n    // Step {}: {}\n", i + 1, step.name()));
        script.push_str(&step_to_js(config, step));
        script.push_str("\n    done();\n");
    }

    let on_failure = if config.screenshot_on_failure {
        format!(
            "    await page.screenshot({{ path: {}, fullPage: true }}).catch(() => {{}});\n",
            js_str(&failure_screenshot_path(config, session).to_string_lossy())
        )
    } else {
        String::new()
    };

    script.push_str(&format!(
        r#"
  }} catch (error) {{
    console.log(JSON.stringify({{ step: current, ok: false, error: error.message }}));
{on_failure}    process.exitCode = 1;
  }} finally {{
    await browser.close();
  }}
}})();
"#
    ));

    script
}

/// Convert a step to JavaScript code
fn step_to_js(config: &PlaywrightConfig, step: &TestStep) -> String {
    let timeout = config.command_timeout_ms;
    match step {
        TestStep::Navigate { url, timeout_ms } => {
            format!(
                "    await page.goto(baseUrl + {}, {{ timeout: {} }});",
                js_str(url),
                timeout_ms.unwrap_or(config.page_load_timeout_ms)
            )
        }
        TestStep::Clear { selector } => {
            format!("    await page.locator({}).fill('');", js_str(selector))
        }
        TestStep::Type { selector, text, delay_ms } => {
            format!(
                "    await page.type({}, {}, {{ delay: {} }});",
                js_str(selector),
                js_str(text),
                delay_ms.unwrap_or(20)
            )
        }
        TestStep::Click { selector, timeout_ms } => {
            format!(
                "    await page.click({}, {{ timeout: {} }});",
                js_str(selector),
                timeout_ms.unwrap_or(timeout)
            )
        }
        TestStep::AssertUrl { contains, not_contains } => {
            let mut lines = Vec::new();
            if let Some(fragment) = contains {
                lines.push(format!(
                    "    await page.waitForURL((url) => url.href.includes({}), {{ timeout: {} }});",
                    js_str(fragment),
                    timeout
                ));
            }
            if let Some(fragment) = not_contains {
                lines.push(format!(
                    "    await page.waitForURL((url) => !url.href.includes({}), {{ timeout: {} }});",
                    js_str(fragment),
                    timeout
                ));
            }
            lines.join("\n")
        }
        TestStep::Assert { selector, visible, enabled, text_contains } => {
            let locator = match text_contains {
                Some(text) => format!(
                    "page.locator({}).filter({{ hasText: {} }}).first()",
                    js_str(selector),
                    js_str(text)
                ),
                None => format!("page.locator({}).first()", js_str(selector)),
            };

            let mut assertions = Vec::new();
            match visible {
                Some(false) => assertions.push("toBeHidden"),
                // Text assertions imply the matching element is shown.
                Some(true) => assertions.push("toBeVisible"),
                None if text_contains.is_some() => assertions.push("toBeVisible"),
                None => {}
            }
            match enabled {
                Some(true) => assertions.push("toBeEnabled"),
                Some(false) => assertions.push("toBeDisabled"),
                None => {}
            }

            assertions
                .iter()
                .map(|matcher| {
                    format!(
                        "    await expect({}).{}({{ timeout: {} }});",
                        locator, matcher, timeout
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
        TestStep::Screenshot { name, full_page } => {
            let path = config.screenshot_dir.join(format!("{}.png", name));
            format!(
                "    await page.screenshot({{ path: {}, fullPage: {} }});",
                js_str(&path.to_string_lossy()),
                full_page
            )
        }
        TestStep::Log { message } => {
            format!("    console.error('[TEST] ' + {});", js_str(message))
        }
    }
}

/// Quote a string as a JavaScript literal
fn js_str(value: &str) -> String {
    // A JSON string literal is a valid JS string literal.
    serde_json::Value::String(value.to_string()).to_string()
}

fn failure_screenshot_path(config: &PlaywrightConfig, session: &str) -> PathBuf {
    let slug: String = session
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    config.screenshot_dir.join(format!("{}-failure.png", slug))
}

/// Turn the script's stdout into per-step results
fn parse_progress(stdout: &str, steps: &[TestStep], screenshot_dir: &Path) -> ScriptRun {
    let mut results = Vec::new();
    let mut error = None;

    for line in stdout.lines() {
        let Ok(progress) = serde_json::from_str::<ProgressLine>(line.trim()) else {
            continue;
        };
        let Some(index) = progress.step else {
            continue;
        };
        let step_name = steps
            .get(index)
            .map(TestStep::name)
            .unwrap_or_else(|| format!("step-{}", index + 1));
        let screenshot_path = match steps.get(index) {
            Some(TestStep::Screenshot { name, .. }) if progress.ok => {
                Some(screenshot_dir.join(format!("{}.png", name)))
            }
            _ => None,
        };

        if !progress.ok {
            error = Some(format!(
                "{}: {}",
                step_name,
                progress.error.clone().unwrap_or_else(|| "unknown error".to_string())
            ));
        }
        results.push(StepResult {
            success: progress.ok,
            step_name,
            duration_ms: progress.elapsed_ms,
            error: progress.error,
            screenshot_path,
        });
    }

    let success = error.is_none() && results.len() == steps.len();
    ScriptRun {
        success,
        duration_ms: 0,
        steps: results,
        error,
        failure_screenshot: None,
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub base_url: String,
    pub screenshot_dir: PathBuf,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub browser: Browser,
    pub headless: bool,
    pub command_timeout_ms: u64,
    pub page_load_timeout_ms: u64,
    pub screenshot_on_failure: bool,
    /// `NODE_PATH` for resolving the `playwright` packages
    pub node_path: Option<PathBuf>,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self::from(&SuiteConfig::default())
    }
}

impl From<&SuiteConfig> for PlaywrightConfig {
    fn from(suite: &SuiteConfig) -> Self {
        Self {
            base_url: suite.front_url.trim_end_matches('/').to_string(),
            screenshot_dir: suite.output_dir.join("screenshots"),
            viewport_width: suite.viewport_width,
            viewport_height: suite.viewport_height,
            browser: Browser::Chromium,
            headless: true,
            command_timeout_ms: suite.command_timeout_ms,
            page_load_timeout_ms: suite.page_load_timeout_ms,
            screenshot_on_failure: suite.screenshot_on_failure,
            node_path: None,
        }
    }
}
