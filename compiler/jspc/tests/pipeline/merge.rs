use std::sync::Arc;

use jspc::DirectiveCompiler;
use pretty_assertions::assert_eq;

use crate::common::{Project, Scripted, WEB_XML};

#[test]
fn fragments_are_inserted_in_worker_order() {
    let project = Project::new();
    project.page("a.jsp", "<p>a</p>");
    project.page("b.jsp", "<%@ include NOMAP %>");
    project.page("c.jsp", "<p>c</p>");

    let summary = project.run(Arc::new(Scripted::default()), |c| c.threads = Some(3));
    assert!(summary.is_success());
    assert!(!project.exists("target/webfrag.xml.1"));

    let first = project.read("target/webfrag.xml.0");
    let third = project.read("target/webfrag.xml.2");
    let expected = format!(
        "<?xml version=\"1.0\"?>\n<web-app>\n  <display-name>shop</display-name>\n\
         {first}{third}</web-app>\n<!-- end -->\n"
    );
    assert_eq!(project.read("target/web.xml"), expected);
}

#[test]
fn default_marker_keeps_one_closing_tag() {
    let project = Project::new();
    for name in ["a.jsp", "b.jsp", "c.jsp", "d.jsp"] {
        project.page(name, "<p/>");
    }

    project.run(Arc::new(Scripted::default()), |c| c.threads = Some(2));

    let merged = project.read("target/web.xml");
    assert_eq!(merged.matches("</web-app>").count(), 1);
    let closing = merged.find("</web-app>").unwrap();
    assert!(merged.rfind("</servlet-mapping>").unwrap() < closing);
    assert!(merged.ends_with("</web-app>\n<!-- end -->\n"));
}

#[test]
fn custom_marker_is_consumed() {
    let project = Project::new();
    project.write(
        "src/main/webapp/WEB-INF/web.xml",
        "<web-app>\n  <!-- jspc-insert -->\n  <welcome-file-list/>\n</web-app>\n",
    );
    project.page("index.jsp", "<p/>");

    project.run(Arc::new(Scripted::default()), |c| {
        c.threads = Some(1);
        c.insertion_marker = Some("<!-- jspc-insert -->".to_string());
    });

    let fragment = project.read("target/webfrag.xml");
    assert_eq!(
        project.read("target/web.xml"),
        format!("<web-app>\n{fragment}  <welcome-file-list/>\n</web-app>\n")
    );
}

#[test]
fn missing_descriptor_is_not_fatal() {
    let project = Project::new();
    std::fs::remove_file(project.root().join("src/main/webapp/WEB-INF/web.xml")).unwrap();
    project.page("a.jsp", "<p/>");

    let summary = project.run(Arc::new(Scripted::default()), |c| c.threads = Some(1));

    assert!(summary.is_success());
    assert!(project.exists("target/webfrag.xml"));
    assert!(!project.exists("target/web.xml"));
}

#[test]
fn directive_compiler_end_to_end() {
    let project = Project::new();
    let names: Vec<String> = (0..9).map(|i| format!("pages/p{i}.jsp")).collect();
    for name in &names {
        project.page(name, "<%@ page import=\"java.util.*\" %>\n<h1>page</h1>\n");
    }

    let summary = project.run(Arc::new(DirectiveCompiler::new()), |c| c.threads = Some(4));

    assert!(summary.is_success(), "{summary:?}");
    assert_eq!(summary.compiled, 9);
    let merged = project.read("target/web.xml");
    let mut last = 0;
    for name in &names {
        let at = merged.find(&format!("<url-pattern>/{name}</url-pattern>")).unwrap();
        assert!(at > last, "{name} out of order");
        last = at;
        let class = format!("{}_jsp.java", name.trim_end_matches(".jsp"));
        assert!(project.exists(&format!("target/classes/jsp/{class}")));
    }
    assert!(merged.starts_with(&WEB_XML[..WEB_XML.find("</web-app>").unwrap()]));
}
