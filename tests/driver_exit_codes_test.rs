//! End-to-end runs through `RunDriver` with a fake toolchain.

mod common;

use common::{cargo_workspace, source_folder, FakeToolchain};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use wsfmt::config::{AnalyzerConfig, RunConfig};
use wsfmt::driver::exit_code::{
    BUILD_ENGINE_NOT_FOUND, CHECK_FAILED, CLI_NOT_FOUND, SUCCESS, UNHANDLED_EXCEPTION,
};
use wsfmt::driver::{Passes, RunTarget};
use wsfmt::observability::{get_current_context, RunPhase};
use wsfmt::workspace::{CargoWorkspaceLoader, WorkspaceLoader, WorkspaceTarget};
use wsfmt::{
    AnalyzerRule, CancellationToken, Compilation, Diagnostic, DiagnosticDescriptor, FaultPolicy,
    RuleSet, RunDriver, RunOptions, RunOutcome, Severity, Workspace, WsfmtConfig,
};

fn driver(toolchain: FakeToolchain) -> RunDriver {
    RunDriver::new()
        .with_toolchain(Arc::new(toolchain))
        .with_config(WsfmtConfig::default())
}

fn manifest_options(dir: &Path) -> RunOptions {
    RunOptions::new(RunTarget::Manifest(PathBuf::from("Cargo.toml")), dir)
}

async fn run(driver: &RunDriver, options: &RunOptions) -> RunOutcome {
    driver.run(options, &CancellationToken::new()).await
}

const CLEAN: &str = "pub fn clean() -> u8 {\n    1\n}\n";
const TRAILING: &str = "pub fn messy() -> u8 {   \n    1\n}\n";

#[tokio::test]
async fn test_clean_workspace_passes_check() {
    let dir = cargo_workspace(&[("core", &[("src/lib.rs", CLEAN)])]);
    let options = RunOptions {
        check: true,
        ..manifest_options(dir.path())
    };

    let outcome = run(&driver(FakeToolchain::present()), &options).await;
    assert_eq!(outcome.exit_code, SUCCESS);
    assert_eq!(outcome.file_count, 1);
    assert_eq!(outcome.files_formatted, 0);
}

#[tokio::test]
async fn test_check_fails_when_files_would_change() {
    let dir = cargo_workspace(&[("core", &[("src/lib.rs", TRAILING)])]);
    let options = RunOptions {
        check: true,
        ..manifest_options(dir.path())
    };

    let outcome = run(&driver(FakeToolchain::present()), &options).await;
    assert_eq!(outcome.exit_code, CHECK_FAILED);
    assert_eq!(outcome.files_formatted, 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("crates/core/src/lib.rs")).unwrap(),
        TRAILING
    );
}

#[tokio::test]
async fn test_apply_mode_fixes_files_and_succeeds() {
    let dir = cargo_workspace(&[("core", &[("src/lib.rs", TRAILING)])]);
    let outcome = run(&driver(FakeToolchain::present()), &manifest_options(dir.path())).await;

    assert_eq!(outcome.exit_code, SUCCESS);
    assert_eq!(outcome.files_formatted, 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("crates/core/src/lib.rs")).unwrap(),
        "pub fn messy() -> u8 {\n    1\n}\n"
    );
}

#[tokio::test]
async fn test_missing_cli_exits_with_4() {
    let dir = cargo_workspace(&[("core", &[("src/lib.rs", CLEAN)])]);
    let toolchain = FakeToolchain {
        cli: false,
        build_engine: false,
    };
    let outcome = run(&driver(toolchain), &manifest_options(dir.path())).await;
    assert_eq!(outcome.exit_code, CLI_NOT_FOUND);
}

#[tokio::test]
async fn test_missing_build_engine_exits_with_3() {
    let dir = cargo_workspace(&[("core", &[("src/lib.rs", TRAILING)])]);
    let toolchain = FakeToolchain {
        cli: true,
        build_engine: false,
    };
    let outcome = run(&driver(toolchain), &manifest_options(dir.path())).await;

    assert_eq!(outcome.exit_code, BUILD_ENGINE_NOT_FOUND);
    // nothing was formatted before the toolchain check failed
    assert_eq!(
        fs::read_to_string(dir.path().join("crates/core/src/lib.rs")).unwrap(),
        TRAILING
    );
}

#[tokio::test]
async fn test_missing_manifest_exits_with_1() {
    let dir = source_folder(&[("lib.rs", CLEAN)]);
    let outcome = run(&driver(FakeToolchain::present()), &manifest_options(dir.path())).await;
    assert_eq!(outcome.exit_code, UNHANDLED_EXCEPTION);
}

#[tokio::test]
async fn test_folder_mode_and_deprecated_workspace_option() {
    let folder = source_folder(&[("src/main.rs", TRAILING)]);
    let options = RunOptions {
        check: true,
        ..RunOptions::new(RunTarget::Folder(None), folder.path())
    };
    assert_eq!(run(&driver(FakeToolchain::present()), &options).await.exit_code, CHECK_FAILED);

    let workspace = cargo_workspace(&[("core", &[("src/lib.rs", CLEAN)])]);
    let options = RunOptions {
        check: true,
        ..RunOptions::new(RunTarget::DeprecatedWorkspace(PathBuf::from(".")), workspace.path())
    };
    assert_eq!(run(&driver(FakeToolchain::present()), &options).await.exit_code, SUCCESS);
}

#[tokio::test]
async fn test_analyzer_warnings_fail_check_above_threshold() {
    let source = "pub fn noisy(x: u8) -> u8 {\n    dbg!(x)\n}\n";
    let dir = cargo_workspace(&[("core", &[("src/lib.rs", source)])]);
    let options = RunOptions {
        check: true,
        passes: Passes::from_flags(false, true),
        ..manifest_options(dir.path())
    };

    let outcome = run(&driver(FakeToolchain::present()), &options).await;
    assert_eq!(outcome.exit_code, CHECK_FAILED);
    assert_eq!(outcome.diagnostics, 1);

    let lenient = WsfmtConfig {
        analyzers: AnalyzerConfig {
            severity_threshold: Severity::Error,
            ..AnalyzerConfig::default()
        },
        ..WsfmtConfig::default()
    };
    let outcome = RunDriver::new()
        .with_toolchain(Arc::new(FakeToolchain::present()))
        .with_config(lenient)
        .run(&options, &CancellationToken::new())
        .await;
    assert_eq!(outcome.exit_code, SUCCESS);
    assert_eq!(outcome.diagnostics, 1);
}

#[tokio::test]
async fn test_report_lists_changes_and_diagnostics() {
    let dir = cargo_workspace(&[
        ("core", &[("src/lib.rs", TRAILING)]),
        ("util", &[("src/lib.rs", "// TODO: split\npub fn u() {}\n")]),
    ]);
    let options = RunOptions {
        check: true,
        report: Some(PathBuf::from("reports")),
        ..manifest_options(dir.path())
    };

    let outcome = run(&driver(FakeToolchain::present()), &options).await;
    let report_path = outcome.report_path.expect("report written");
    assert_eq!(report_path, dir.path().join("reports/format-report.json"));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(report_path).unwrap()).unwrap();
    let entries = report.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["project"], "core");
    assert_eq!(entries[0]["file_name"], "lib.rs");
    assert_eq!(entries[0]["changes"][0]["diagnostic_id"], "WHITESPACE");
    assert_eq!(entries[0]["changes"][0]["line"], 1);
    assert_eq!(entries[1]["project"], "util");
    assert_eq!(entries[1]["changes"][0]["diagnostic_id"], "WS0003");
}

/// Loader whose single project points at a file that does not exist.
struct GhostLoader;

impl WorkspaceLoader for GhostLoader {
    fn load(&self, target: &WorkspaceTarget) -> wsfmt::Result<Workspace> {
        let mut builder = Workspace::builder(target.kind, &target.directory);
        builder.add_project(
            "ghost",
            &target.directory,
            None,
            vec![target.directory.join("missing.rs")],
        );
        Ok(builder.build())
    }
}

#[tokio::test]
async fn test_faulted_project_exits_with_1() {
    let dir = cargo_workspace(&[("core", &[("src/lib.rs", CLEAN)])]);
    let options = RunOptions {
        passes: Passes::from_flags(false, true),
        ..manifest_options(dir.path())
    };

    let outcome = driver(FakeToolchain::present())
        .with_loader(Arc::new(GhostLoader))
        .run(&options, &CancellationToken::new())
        .await;
    assert_eq!(outcome.exit_code, UNHANDLED_EXCEPTION);
    assert_eq!(outcome.failed_projects.len(), 1);
    assert_eq!(outcome.failed_projects[0].name, "ghost");
}

#[tokio::test]
async fn test_cancelled_run_exits_with_1() {
    let dir = cargo_workspace(&[("core", &[("src/lib.rs", TRAILING)])]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = driver(FakeToolchain::present())
        .run(&manifest_options(dir.path()), &cancel)
        .await;
    assert_eq!(outcome.exit_code, UNHANDLED_EXCEPTION);
    assert!(outcome.cancelled);
}

fn run_config(run: RunConfig) -> WsfmtConfig {
    WsfmtConfig {
        run,
        ..WsfmtConfig::default()
    }
}

fn analyzers_only(dir: &Path) -> RunOptions {
    RunOptions {
        passes: Passes::from_flags(false, true),
        ..manifest_options(dir)
    }
}

const TEST_RULE: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "T0100",
    title: "Test rule",
    category: "Test",
    default_severity: Severity::Warning,
};

type PhaseLog = Arc<parking_lot::Mutex<Vec<Option<RunPhase>>>>;

/// Cargo loader that records the run phase it was called in.
struct PhaseRecordingLoader(PhaseLog);

impl WorkspaceLoader for PhaseRecordingLoader {
    fn load(&self, target: &WorkspaceTarget) -> wsfmt::Result<Workspace> {
        self.0.lock().push(get_current_context().phase);
        CargoWorkspaceLoader.load(target)
    }
}

/// Rule that records its run phase, sleeps, panics on a project, or cancels a token.
#[derive(Default)]
struct ScriptedRule {
    phases: Option<PhaseLog>,
    sleep: Option<Duration>,
    panic_on: Option<&'static str>,
    cancel: Option<CancellationToken>,
}

impl AnalyzerRule for ScriptedRule {
    fn descriptors(&self) -> &[DiagnosticDescriptor] {
        std::slice::from_ref(&TEST_RULE)
    }

    fn analyze(&self, compilation: &Compilation) -> Vec<Diagnostic> {
        if let Some(phases) = &self.phases {
            phases.lock().push(get_current_context().phase);
        }
        if let Some(sleep) = self.sleep {
            std::thread::sleep(sleep);
        }
        if self.panic_on == Some(compilation.project_name()) {
            panic!("rule failed on {}", compilation.project_name());
        }
        if let Some(cancel) = &self.cancel {
            cancel.cancel_with_reason("stop requested");
        }
        Vec::new()
    }
}

fn scripted(rule: ScriptedRule) -> Arc<RuleSet> {
    Arc::new(RuleSet::new(vec![Arc::new(rule)]))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_loader_and_rules_run_under_their_phase() {
    let dir = cargo_workspace(&[("core", &[("src/lib.rs", CLEAN)])]);
    let loader_phases = PhaseLog::default();
    let rule_phases = PhaseLog::default();

    let outcome = driver(FakeToolchain::present())
        .with_loader(Arc::new(PhaseRecordingLoader(Arc::clone(&loader_phases))))
        .with_rules(scripted(ScriptedRule {
            phases: Some(Arc::clone(&rule_phases)),
            ..ScriptedRule::default()
        }))
        .run(&manifest_options(dir.path()), &CancellationToken::new())
        .await;

    assert_eq!(outcome.exit_code, SUCCESS);
    assert_eq!(*loader_phases.lock(), vec![Some(RunPhase::WorkspaceLoading)]);
    assert_eq!(*rule_phases.lock(), vec![Some(RunPhase::Analysis)]);
}

#[tokio::test]
async fn test_timeout_cancels_run_with_timeout_reason() {
    let dir = cargo_workspace(&[("core", &[("src/lib.rs", CLEAN)])]);
    let config = run_config(RunConfig {
        timeout_secs: Some(1),
        ..RunConfig::default()
    });

    let outcome = RunDriver::new()
        .with_toolchain(Arc::new(FakeToolchain::present()))
        .with_config(config)
        .with_rules(scripted(ScriptedRule {
            sleep: Some(Duration::from_millis(1500)),
            ..ScriptedRule::default()
        }))
        .run(&analyzers_only(dir.path()), &CancellationToken::new())
        .await;

    assert_eq!(outcome.exit_code, UNHANDLED_EXCEPTION);
    assert!(outcome.cancelled);
    assert_eq!(outcome.cancel_reason.as_deref(), Some("timeout"));
}

#[tokio::test]
async fn test_abort_policy_fault_exits_with_1() {
    let dir = cargo_workspace(&[
        ("alpha", &[("src/lib.rs", CLEAN)]),
        ("beta", &[("src/lib.rs", CLEAN)]),
    ]);
    let panicking = || {
        scripted(ScriptedRule {
            panic_on: Some("beta"),
            ..ScriptedRule::default()
        })
    };

    let isolated = driver(FakeToolchain::present())
        .with_rules(panicking())
        .run(&analyzers_only(dir.path()), &CancellationToken::new())
        .await;
    assert_eq!(isolated.exit_code, UNHANDLED_EXCEPTION);
    assert_eq!(isolated.failed_projects.len(), 1);
    assert_eq!(isolated.failed_projects[0].name, "beta");

    let config = run_config(RunConfig {
        fault_policy: FaultPolicy::AbortOnFirst,
        ..RunConfig::default()
    });
    let aborted = RunDriver::new()
        .with_toolchain(Arc::new(FakeToolchain::present()))
        .with_config(config)
        .with_rules(panicking())
        .run(&analyzers_only(dir.path()), &CancellationToken::new())
        .await;
    assert_eq!(aborted.exit_code, UNHANDLED_EXCEPTION);
    assert!(!aborted.cancelled);
}

#[tokio::test]
async fn test_sequential_analysis_matches_parallel() {
    let dir = cargo_workspace(&[
        ("core", &[("src/lib.rs", "// TODO: later\npub fn a() {}\n")]),
        ("util", &[("src/lib.rs", "pub fn b(x: u8) -> u8 {\n    dbg!(x)\n}\n")]),
    ]);
    let options = RunOptions {
        check: true,
        ..analyzers_only(dir.path())
    };

    let parallel = run(&driver(FakeToolchain::present()), &options).await;
    let sequential = RunDriver::new()
        .with_toolchain(Arc::new(FakeToolchain::present()))
        .with_config(run_config(RunConfig {
            parallel: false,
            ..RunConfig::default()
        }))
        .run(&options, &CancellationToken::new())
        .await;

    assert_eq!(parallel.diagnostics, 2);
    assert_eq!(sequential.diagnostics, parallel.diagnostics);
    assert_eq!(sequential.exit_code, CHECK_FAILED);
    assert_eq!(sequential.exit_code, parallel.exit_code);
}

/// Loader that cancels the run right after loading.
struct CancellingLoader(CancellationToken);

impl WorkspaceLoader for CancellingLoader {
    fn load(&self, target: &WorkspaceTarget) -> wsfmt::Result<Workspace> {
        let workspace = CargoWorkspaceLoader.load(target)?;
        self.0.cancel_with_reason("interrupted");
        Ok(workspace)
    }
}

#[tokio::test]
async fn test_cancellation_after_loading_reaches_both_passes() {
    let dir = cargo_workspace(&[("core", &[("src/lib.rs", TRAILING)])]);
    let cancel = CancellationToken::new();

    let outcome = driver(FakeToolchain::present())
        .with_loader(Arc::new(CancellingLoader(cancel.clone())))
        .run(&manifest_options(dir.path()), &cancel)
        .await;

    assert_eq!(outcome.exit_code, UNHANDLED_EXCEPTION);
    assert!(outcome.cancelled);
    assert_eq!(outcome.cancel_reason.as_deref(), Some("interrupted"));
    assert_eq!(outcome.files_formatted, 0);
    assert_eq!(
        fs::read_to_string(dir.path().join("crates/core/src/lib.rs")).unwrap(),
        TRAILING
    );
}

#[tokio::test]
async fn test_cancellation_from_a_rule_skips_remaining_projects() {
    let dir = cargo_workspace(&[
        ("alpha", &[("src/lib.rs", CLEAN)]),
        ("beta", &[("src/lib.rs", CLEAN)]),
        ("gamma", &[("src/lib.rs", CLEAN)]),
    ]);
    let cancel = CancellationToken::new();
    let options = RunOptions {
        jobs: Some(1),
        ..analyzers_only(dir.path())
    };

    let outcome = driver(FakeToolchain::present())
        .with_rules(scripted(ScriptedRule {
            cancel: Some(cancel.clone()),
            ..ScriptedRule::default()
        }))
        .run(&options, &cancel)
        .await;

    assert_eq!(outcome.exit_code, UNHANDLED_EXCEPTION);
    assert!(outcome.cancelled);
    assert_eq!(outcome.cancel_reason.as_deref(), Some("stop requested"));
    assert!(outcome.failed_projects.is_empty());
}
