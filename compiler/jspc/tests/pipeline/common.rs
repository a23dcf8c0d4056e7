//! Shared fixtures for pipeline tests.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use jspc::compile::{class_name_for, CompilationOutcome, CompileFault, UnitCompiler};
use jspc::fragment::ServletMapping;
use jspc::{BuildSummary, JspcConfig, Precompiler, SourceFile};
use jspc_diagnostic::Diagnostic;
use jspc_resolve::{
    ClassArtifact, ClassSource, CompilationContext, ResolutionEntry, ResolutionKey,
};
use parking_lot::Mutex;
use tempfile::TempDir;

pub const WEB_XML: &str = "<?xml version=\"1.0\"?>\n\
<web-app>\n\
  <display-name>shop</display-name>\n\
</web-app>\n\
<!-- end -->\n";

/// A project directory with the default layout.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let project = Project {
            dir: tempfile::tempdir().unwrap(),
        };
        project.write("src/main/webapp/WEB-INF/web.xml", WEB_XML);
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    pub fn page(&self, name: &str, content: &str) {
        self.write(&format!("src/main/webapp/{name}"), content);
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.root().join(relative)).unwrap()
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.root().join(relative).exists()
    }

    pub fn precompiler(
        &self,
        compiler: Arc<dyn UnitCompiler>,
        edit: impl FnOnce(&mut JspcConfig),
    ) -> Precompiler {
        let mut config = JspcConfig::default();
        edit(&mut config);
        Precompiler::new(config.resolve(self.root()).unwrap(), compiler)
    }

    pub fn run(
        &self,
        compiler: Arc<dyn UnitCompiler>,
        edit: impl FnOnce(&mut JspcConfig),
    ) -> BuildSummary {
        self.precompiler(compiler, edit).run().unwrap()
    }
}

/// Decides each page's outcome from its content.
///
/// `FAIL` anywhere fails the page, `IOFAULT` raises a [`CompileFault`],
/// `NOMAP` compiles it without a servlet mapping, anything else compiles it
/// with one.
#[derive(Default)]
pub struct Scripted {
    attempted: Mutex<Vec<String>>,
}

impl Scripted {
    pub fn attempted(&self) -> Vec<String> {
        let mut attempted = self.attempted.lock().clone();
        attempted.sort();
        attempted
    }
}

impl UnitCompiler for Scripted {
    fn compile(
        &self,
        file: &SourceFile,
        ctx: &mut CompilationContext,
    ) -> Result<CompilationOutcome, CompileFault> {
        self.attempted.lock().push(file.relative.clone());
        let text =
            fs::read_to_string(&file.path).map_err(|e| CompileFault::new("read", &file.path, e))?;

        if text.contains("IOFAULT") {
            let disk_full = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
            return Err(CompileFault::new("write", &file.path, disk_full));
        }
        if let Some(offset) = text.find("FAIL") {
            let line = text[..offset].matches('\n').count() + 1;
            return Ok(CompilationOutcome::failure([Diagnostic::error(
                &file.path,
                u32::try_from(line).unwrap(),
                format!("scripted failure in {}", file.relative),
            )]));
        }
        let mapping = (!text.contains("NOMAP")).then(|| {
            let (package, class) = class_name_for(&ctx.settings().package_root, &file.relative);
            ServletMapping::new(format!("{package}.{class}"), format!("/{}", file.relative))
        });
        Ok(CompilationOutcome::Success {
            artifacts: Vec::new(),
            mapping,
        })
    }
}

/// Class source that knows a fixed set of names and counts every scan.
pub struct CountingSource {
    known: Vec<&'static str>,
    scans: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl CountingSource {
    pub fn new(known: &[&'static str]) -> Self {
        CountingSource {
            known: known.to_vec(),
            scans: Mutex::new(HashMap::new()),
            total: AtomicUsize::new(0),
        }
    }

    pub fn scans_of(&self, name: &str) -> usize {
        self.scans.lock().get(name).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

impl ClassSource for CountingSource {
    fn scan(&self, key: &ResolutionKey) -> ResolutionEntry {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.scans.lock().entry(key.as_str().to_string()).or_default() += 1;
        if self.known.contains(&key.as_str()) {
            let bytes = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 51];
            ResolutionEntry::found(
                ClassArtifact::from_bytes(key.clone(), bytes, key.resource_path().into()).unwrap(),
            )
        } else {
            ResolutionEntry::NotFound
        }
    }
}
