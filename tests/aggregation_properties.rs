//! Property-based tests for concurrent diagnostic aggregation
//!
//! - K writers inserting M diagnostics leave exactly M entries, each under its document
//! - Per-writer append order survives within a document
//! - The analyzer runner's result does not depend on scheduling

mod common;

use proptest::prelude::*;
use std::sync::Arc;
use wsfmt::config::AnalyzerConfig;
use wsfmt::workspace::{find_workspace, CargoWorkspaceLoader, WorkspaceLoader};
use wsfmt::{
    AnalysisResult, AnalyzerRunner, CancellationToken, Diagnostic, DiagnosticDescriptor, DocumentId,
    LineSpan, RuleSet, Severity,
};

const RULE: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "WS9000",
    title: "Property",
    category: "Test",
    default_severity: Severity::Info,
};

/// Diagnostic tagged with its writer and sequence number.
fn tagged(writer: usize, sequence: usize) -> Diagnostic {
    Diagnostic::new(
        &RULE,
        format!("/ws/writer{}.rs", writer),
        LineSpan::on_line(sequence + 1, 1, 1),
        format!("{}:{}", writer, sequence),
    )
}

proptest! {
    #[test]
    fn prop_concurrent_inserts_lose_nothing(
        writers in 1usize..8,
        per_writer in 0usize..120,
        documents in 1usize..6,
    ) {
        let result = Arc::new(AnalysisResult::new());
        let handles: Vec<_> = (0..writers)
            .map(|writer| {
                let result = Arc::clone(&result);
                std::thread::spawn(move || {
                    for sequence in 0..per_writer {
                        result.add_diagnostic(DocumentId(sequence % documents), tagged(writer, sequence));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        prop_assert_eq!(result.diagnostic_count(), writers * per_writer);
        for document in 0..documents {
            let expected = writers * (0..per_writer).filter(|s| s % documents == document).count();
            let stored = result.diagnostics_for(DocumentId(document));
            prop_assert_eq!(stored.len(), expected);

            // each writer's entries keep their append order
            for writer in 0..writers {
                let lines: Vec<_> = stored
                    .iter()
                    .filter(|d| d.path.as_path() == std::path::Path::new(&format!("/ws/writer{}.rs", writer)))
                    .map(|d| d.span.start_line)
                    .collect();
                prop_assert!(lines.windows(2).all(|pair| pair[0] < pair[1]));
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_runner_result_is_schedule_independent(
        dbg_lines in proptest::collection::vec(0usize..6, 1..5),
        jobs in 1usize..4,
    ) {
        let sources: Vec<(String, String)> = dbg_lines
            .iter()
            .enumerate()
            .map(|(index, count)| {
                let body = "    dbg!(x);\n".repeat(*count);
                (format!("member{}", index), format!("fn f(x: u8) {{\n{}}}\n", body))
            })
            .collect();
        let files: Vec<Vec<(&str, &str)>> = sources
            .iter()
            .map(|(_, text)| vec![("src/lib.rs", text.as_str())])
            .collect();
        let members: Vec<common::Member<'_>> = sources
            .iter()
            .zip(&files)
            .map(|((name, _), files)| (name.as_str(), files.as_slice()))
            .collect();
        let dir = common::cargo_workspace(&members);

        let target = find_workspace(dir.path(), std::path::Path::new(".")).unwrap();
        let workspace = CargoWorkspaceLoader.load(&target).unwrap();
        let documents = workspace.all_documents();
        let rules = Arc::new(RuleSet::builtin(&AnalyzerConfig::default()));

        let sequential = AnalyzerRunner::new()
            .run_sequential(&rules, &workspace, &documents, &CancellationToken::new())
            .unwrap();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .build()
            .unwrap();
        let concurrent = runtime
            .block_on(
                AnalyzerRunner::new().with_max_concurrency(Some(jobs)).run(
                    rules,
                    Arc::new(workspace),
                    Arc::new(documents),
                    &CancellationToken::new(),
                ),
            )
            .unwrap();

        prop_assert_eq!(concurrent.result.diagnostic_count(), dbg_lines.iter().sum::<usize>());
        prop_assert_eq!(sequential.result.into_sorted(), concurrent.result.into_sorted());
    }
}
