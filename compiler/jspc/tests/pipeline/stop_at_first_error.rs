use std::sync::Arc;

use crate::common::{Project, Scripted};

fn project() -> Project {
    let project = Project::new();
    project.page("a.jsp", "<p>\nFAIL</p>");
    project.page("b.jsp", "<p>b</p>");
    project.page("c.jsp", "<p>c</p>");
    project
}

#[test]
fn first_error_ends_the_shard() {
    let project = project();
    let compiler = Arc::new(Scripted::default());

    let summary = project.run(compiler.clone(), |c| c.threads = Some(1));

    assert_eq!(compiler.attempted(), vec!["a.jsp"]);
    assert!(!summary.is_success());
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.compiled, 0);
}

#[test]
fn without_the_flag_every_page_is_attempted() {
    let project = project();
    project.page("c.jsp", "FAIL");
    let compiler = Arc::new(Scripted::default());

    let summary = project.run(compiler.clone(), |c| {
        c.threads = Some(1);
        c.stop_at_first_error = false;
    });

    assert_eq!(compiler.attempted(), vec!["a.jsp", "b.jsp", "c.jsp"]);
    assert_eq!(summary.errors, 2);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.compiled, 1);
    assert_eq!(summary.skipped, 0);
}

#[test]
fn stopping_is_local_to_one_worker() {
    let project = project();
    let compiler = Arc::new(Scripted::default());

    // shards: [a, b] and [c]
    let summary = project.run(compiler.clone(), |c| c.threads = Some(2));

    assert_eq!(compiler.attempted(), vec!["a.jsp", "c.jsp"]);
    assert_eq!(summary.failed_workers, vec![0]);
    assert_eq!(summary.compiled, 1);
    assert_eq!(summary.skipped, 1);
    // a failed run never merges
    assert!(!project.exists("target/web.xml"));
    assert!(project.exists("target/webfrag.xml.1"));
}
