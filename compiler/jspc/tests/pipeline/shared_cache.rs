use std::sync::Arc;

use jspc::DirectiveCompiler;

use crate::common::{CountingSource, Project};

const PAGE: &str = "<%@ page import=\"com.acme.Cart, com.acme.*\" %>\n<p>cart</p>\n";

fn project_with_pages(count: usize) -> Project {
    let project = Project::new();
    for i in 0..count {
        project.page(&format!("p{i:02}.jsp"), PAGE);
    }
    project
}

#[test]
fn each_name_is_scanned_once_per_run() {
    let project = project_with_pages(6);
    let source = Arc::new(CountingSource::new(&["com.acme.Cart"]));

    let summary = project
        .precompiler(Arc::new(DirectiveCompiler::new()), |c| c.threads = Some(1))
        .with_class_source(source.clone())
        .run()
        .unwrap();

    assert!(summary.is_success());
    assert_eq!(source.scans_of("com.acme.Cart"), 1);
    // negative answers are cached too
    assert_eq!(source.scans_of("com"), 1);
    assert_eq!(source.scans_of("com.acme"), 1);
    assert_eq!(source.total(), 3);
    assert_eq!(summary.cache.found, 1);
    assert_eq!(summary.cache.not_found, 2);
    assert_eq!(summary.cache.misses, 3);
}

#[test]
fn workers_share_one_cache() {
    let workers = 4;
    let project = project_with_pages(40);
    let source = Arc::new(CountingSource::new(&["com.acme.Cart"]));

    let summary = project
        .precompiler(Arc::new(DirectiveCompiler::new()), |c| {
            c.threads = Some(workers);
        })
        .with_class_source(source.clone())
        .run()
        .unwrap();

    assert!(summary.is_success());
    assert_eq!(summary.compiled, 40);
    assert_eq!(summary.cache.entries, 3);
    for name in ["com.acme.Cart", "com", "com.acme"] {
        let scans = source.scans_of(name);
        // racing workers may scan the same name, but never more than once each
        assert!((1..=workers).contains(&scans), "{name} scanned {scans} times");
    }
}

#[test]
fn page_naming_its_own_class_is_not_scanned() {
    let project = Project::new();
    project.page("self.jsp", "<jsp:useBean id=\"me\" class=\"jsp.self_jsp\"/>");
    let source = Arc::new(CountingSource::new(&[]));

    let summary = project
        .precompiler(Arc::new(DirectiveCompiler::new()), |c| c.threads = Some(1))
        .with_class_source(source.clone())
        .run()
        .unwrap();

    assert!(summary.is_success());
    assert_eq!(source.scans_of("jsp.self_jsp"), 0);
    assert_eq!(summary.cache.entries, 0);
}
