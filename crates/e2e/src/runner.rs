//! Main test runner that sequences scenarios and YAML specs

use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use serverest_client::{ApiClient, ClientConfig, UserService};
use serverest_common::{SuiteConfig, UsersFixture};

use crate::error::{E2eError, E2eResult};
use crate::playwright::{PlaywrightConfig, PlaywrightHandle, StepResult};
use crate::scenarios::{Scenario, ScenarioContext};
use crate::spec::TestSpec;

/// Result of running a single test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub skipped: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
}

/// Result of running all tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

/// Something the runner can execute
#[derive(Debug, Clone)]
pub enum TestEntry {
    Scenario(Scenario),
    Spec(TestSpec),
}

impl TestEntry {
    pub fn name(&self) -> &str {
        match self {
            TestEntry::Scenario(s) => s.name(),
            TestEntry::Spec(s) => &s.name,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        match self {
            TestEntry::Scenario(s) => s.tags().contains(&tag),
            TestEntry::Spec(s) => s.tags.iter().any(|t| t == tag),
        }
    }

    fn needs_browser(&self) -> bool {
        match self {
            TestEntry::Scenario(s) => s.is_ui(),
            TestEntry::Spec(_) => true,
        }
    }
}

/// Main E2E test runner
pub struct TestRunner {
    context: ScenarioContext,

    /// Extra YAML specs directory
    specs_dir: Option<PathBuf>,

    /// Output directory for results
    output_dir: PathBuf,
}

impl TestRunner {
    /// Build a runner, loading the fixture from `suite.fixture_path`
    pub fn new(config: RunnerConfig) -> E2eResult<Self> {
        let fixture = UsersFixture::from_file(&config.suite.fixture_path)?;
        Self::with_fixture(config, fixture)
    }

    /// Build a runner around an already loaded fixture
    pub fn with_fixture(config: RunnerConfig, fixture: UsersFixture) -> E2eResult<Self> {
        config.suite.validate()?;

        let client = ApiClient::new(ClientConfig::from(&config.suite))?
            .with_credentials(fixture.valid_user.credentials());
        let service = UserService::new(client);

        let browser = if config.skip_ui {
            info!("UI scenarios disabled");
            None
        } else {
            match PlaywrightHandle::new(config.playwright.clone()) {
                Ok(handle) => Some(handle),
                Err(E2eError::PlaywrightNotFound) => {
                    warn!("Playwright not found; UI scenarios will be skipped");
                    None
                }
                Err(e) => return Err(e),
            }
        };

        Ok(Self {
            context: ScenarioContext {
                service,
                fixture,
                browser,
            },
            specs_dir: config.specs_dir,
            output_dir: config.suite.output_dir,
        })
    }

    /// Built-in scenarios followed by any YAML specs
    pub fn entries(&self) -> E2eResult<Vec<TestEntry>> {
        let mut entries: Vec<TestEntry> = Scenario::ALL.into_iter().map(TestEntry::Scenario).collect();
        if let Some(dir) = &self.specs_dir {
            if dir.exists() {
                entries.extend(TestSpec::load_all(dir)?.into_iter().map(TestEntry::Spec));
            } else {
                debug!("Specs directory {} not found", dir.display());
            }
        }
        Ok(entries)
    }

    /// Run every scenario and spec
    pub async fn run_all(&self) -> E2eResult<TestSuiteResult> {
        let entries = self.entries()?;
        Ok(self.run_entries(&entries).await)
    }

    /// Run entries carrying a tag
    pub async fn run_tagged(&self, tag: &str) -> E2eResult<TestSuiteResult> {
        let entries: Vec<TestEntry> = self
            .entries()?
            .into_iter()
            .filter(|e| e.has_tag(tag))
            .collect();
        Ok(self.run_entries(&entries).await)
    }

    /// Run a specific entry by name
    pub async fn run_test(&self, name: &str) -> E2eResult<TestResult> {
        let entry = self
            .entries()?
            .into_iter()
            .find(|e| e.name() == name)
            .ok_or_else(|| E2eError::ScenarioNotFound(name.to_string()))?;
        Ok(self.run_entry(&entry).await)
    }

    /// Run entries one after another
    pub async fn run_entries(&self, entries: &[TestEntry]) -> TestSuiteResult {
        let start = Instant::now();
        let mut results = Vec::new();
        let mut passed = 0;
        let mut failed = 0;
        let mut skipped = 0;

        info!("Running {} test(s)...", entries.len());

        for entry in entries {
            let result = self.run_entry(entry).await;
            if result.skipped {
                skipped += 1;
                info!("- {} (skipped)", result.name);
            } else if result.success {
                passed += 1;
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                failed += 1;
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Test Results: {} passed, {} failed, {} skipped ({} ms)",
            passed, failed, skipped, duration_ms
        );

        TestSuiteResult {
            total: entries.len(),
            passed,
            failed,
            skipped,
            duration_ms,
            results,
        }
    }

    /// Run one entry; failures are folded into the result
    pub async fn run_entry(&self, entry: &TestEntry) -> TestResult {
        let start = Instant::now();
        debug!("Running test: {}", entry.name());

        if entry.needs_browser() && self.context.browser.is_none() {
            return TestResult {
                name: entry.name().to_string(),
                success: false,
                skipped: true,
                duration_ms: 0,
                steps: vec![],
                error: Some("browser unavailable".to_string()),
            };
        }

        let outcome = match entry {
            TestEntry::Scenario(scenario) => scenario.run(&self.context).await,
            TestEntry::Spec(spec) => self.run_spec(spec).await,
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(steps) => TestResult {
                name: entry.name().to_string(),
                success: true,
                skipped: false,
                duration_ms,
                steps,
                error: None,
            },
            Err(e) => TestResult {
                name: entry.name().to_string(),
                success: false,
                skipped: false,
                duration_ms,
                steps: vec![],
                error: Some(e.to_string()),
            },
        }
    }

    async fn run_spec(&self, spec: &TestSpec) -> E2eResult<Vec<StepResult>> {
        let browser = self
            .context
            .browser
            .as_ref()
            .ok_or(E2eError::PlaywrightNotFound)?;
        let run = browser.run_steps(&spec.name, &spec.steps).await?;
        if run.success {
            Ok(run.steps)
        } else {
            Err(E2eError::StepFailed {
                step: spec.name.clone(),
                reason: run.error.unwrap_or_else(|| "browser session failed".to_string()),
            })
        }
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub suite: SuiteConfig,
    pub playwright: PlaywrightConfig,
    pub specs_dir: Option<PathBuf>,
    /// Skip browser scenarios without probing for Playwright
    pub skip_ui: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::from_suite(SuiteConfig::default())
    }
}

impl RunnerConfig {
    /// Derive the browser settings from the suite config
    pub fn from_suite(suite: SuiteConfig) -> Self {
        Self {
            playwright: PlaywrightConfig::from(&suite),
            suite,
            specs_dir: Some(PathBuf::from("specs")),
            skip_ui: false,
        }
    }
}
