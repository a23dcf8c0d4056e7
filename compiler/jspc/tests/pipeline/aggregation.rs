use std::sync::Arc;

use crate::common::{Project, Scripted};

#[test]
fn both_failing_workers_are_reported() {
    let project = Project::new();
    project.page("a.jsp", "FAIL");
    project.page("b.jsp", "<p>fine</p>");
    project.page("c.jsp", "FAIL");

    let summary = project.run(Arc::new(Scripted::default()), |c| c.threads = Some(3));

    assert!(!summary.is_success());
    assert_eq!(summary.workers, 3);
    assert_eq!(summary.failed_workers, vec![0, 2]);
    assert_eq!(summary.errors, 2);
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.processed(), 3);
}

#[test]
fn clean_workers_make_a_clean_build() {
    let project = Project::new();
    for name in ["a.jsp", "b.jsp", "c.jsp", "d.jsp", "e.jsp"] {
        project.page(name, "<p/>");
    }

    let summary = project.run(Arc::new(Scripted::default()), |c| c.threads = Some(2));

    assert!(summary.is_success());
    assert_eq!(summary.workers, 2);
    assert_eq!(summary.compiled, 5);
    assert!(summary.failed_workers.is_empty());
}

#[test]
fn compile_fault_aborts_the_run_after_all_workers() {
    let project = Project::new();
    project.page("a.jsp", "IOFAULT");
    project.page("b.jsp", "<p/>");
    let compiler = Arc::new(Scripted::default());

    let err = project
        .precompiler(compiler.clone(), |c| c.threads = Some(2))
        .run()
        .unwrap_err();

    assert!(matches!(err, jspc::JspcError::Compile(_)), "{err}");
    assert_eq!(compiler.attempted(), vec!["a.jsp", "b.jsp"]);
    assert!(!project.exists("target/web.xml"));
}
