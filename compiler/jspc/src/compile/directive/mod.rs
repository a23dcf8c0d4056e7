//! Built-in page compiler.
//!
//! Reads the type references a page declares (`page import`, `page extends`
//! and `jsp:useBean class`), resolves each one through the worker's
//! [`CompilationContext`] and emits a servlet source for the page. Template
//! text outside JSP elements becomes `out.write` calls; scripting elements
//! are not translated.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use jspc_diagnostic::{Diagnostic, DiagnosticList};
use jspc_resolve::{CompilationContext, Resolution, ResolutionKey, TargetUnit};

use super::{CompilationOutcome, CompileFault, UnitCompiler};
use crate::fragment::ServletMapping;
use crate::SourceFile;

/// Superclass of generated servlets when a page does not name one.
pub const DEFAULT_BASE_CLASS: &str = "org.apache.jasper.runtime.HttpJspBase";

/// Packages visible to every page without an import.
const IMPLICIT_PACKAGES: &[&str] = &["java.lang"];

const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "false", "final", "finally",
    "float", "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "null", "package", "private", "protected", "public", "return", "short",
    "static", "strictfp", "super", "switch", "synchronized", "this", "throw", "throws",
    "transient", "true", "try", "void", "volatile", "while",
];

/// Compiles pages by resolving their declared type references.
#[derive(Copy, Clone, Debug, Default)]
pub struct DirectiveCompiler;

impl DirectiveCompiler {
    pub fn new() -> Self {
        DirectiveCompiler
    }
}

impl UnitCompiler for DirectiveCompiler {
    fn compile(
        &self,
        file: &SourceFile,
        ctx: &mut CompilationContext,
    ) -> Result<CompilationOutcome, CompileFault> {
        let bytes = match fs::read(&file.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                return Ok(CompilationOutcome::failure([Diagnostic::file_error(
                    &file.path,
                    format!("Unable to read page: {e}"),
                )]));
            }
        };
        let text = match ctx.settings().encoding.decode(&bytes) {
            Ok(text) => text,
            Err(e) => {
                let line = line_at_bytes(&bytes, e.offset);
                return Ok(CompilationOutcome::failure([Diagnostic::error(
                    &file.path,
                    line,
                    e.to_string(),
                )]));
            }
        };

        let (package, simple_name) =
            class_name_for(&ctx.settings().package_root, &file.relative);
        let class_name = format!("{package}.{simple_name}");
        let mut java_path = ctx.output_dir().to_path_buf();
        java_path.extend(package.split('.'));
        java_path.push(format!("{simple_name}.java"));

        ctx.begin_unit(TargetUnit::new(class_name.as_str(), java_path.as_path()));

        let page = PageDirectives::scan(&text);
        let diagnostics = check_references(ctx, &page, &package, file);
        if diagnostics.has_errors() {
            return Ok(CompilationOutcome::Failure { diagnostics });
        }
        for warning in &diagnostics {
            tracing::warn!("{warning}");
        }

        let source = servlet_source(&page, &package, &simple_name, &text, file);
        write_source(&java_path, &source)?;

        Ok(CompilationOutcome::Success {
            artifacts: vec![java_path],
            mapping: Some(ServletMapping::new(class_name, format!("/{}", file.relative))),
        })
    }
}

fn servlet_source(
    page: &PageDirectives<'_>,
    package: &str,
    simple_name: &str,
    text: &str,
    file: &SourceFile,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "// Generated by jspc from {}", file.relative);
    let _ = writeln!(out, "package {package};\n");
    for import in &page.imports {
        let _ = writeln!(out, "import {};", import.name);
    }
    if !page.imports.is_empty() {
        out.push('\n');
    }
    let base = page.extends.as_ref().map_or(DEFAULT_BASE_CLASS, |e| e.name);
    let _ = writeln!(out, "public final class {simple_name} extends {base} {{\n");
    out.push_str(
        "    public void _jspService(javax.servlet.jsp.JspWriter out) throws java.io.IOException {\n",
    );
    for chunk in template_chunks(text) {
        let _ = writeln!(out, "        out.write(\"{}\");", escape_java(chunk));
    }
    out.push_str("    }\n}\n");
    out
}

fn write_source(path: &Path, source: &str) -> Result<(), CompileFault> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| CompileFault::new("create", parent, e))?;
    }
    fs::write(path, source).map_err(|e| CompileFault::new("write", path, e))
}

/// Generated class for a page: `(package, simple name)`.
///
/// The package is `package_root` followed by the page's directories; every
/// segment is mangled into a Java identifier (`index.jsp` becomes
/// `index_jsp`).
pub fn class_name_for(package_root: &str, relative: &str) -> (String, String) {
    let mut segments: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
    let file_name = segments.pop().unwrap_or_default();
    let mut package = package_root.to_string();
    for dir in segments {
        package.push('.');
        package.push_str(&mangle_identifier(dir));
    }
    (package, mangle_identifier(file_name))
}

/// Turn an arbitrary name into a Java identifier.
///
/// `.` becomes `_`, `_` and other characters that cannot appear in an
/// identifier become `_` plus four hex digits, a leading character that
/// cannot start an identifier gets a `_` prefix, and keywords get a `_`
/// suffix.
pub fn mangle_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    if !name.starts_with(|c: char| c.is_alphabetic() || c == '_' || c == '$') {
        out.push('_');
    }
    for c in name.chars() {
        match c {
            '.' => out.push('_'),
            c if c != '_' && (c.is_alphanumeric() || c == '$') => out.push(c),
            c => {
                let _ = write!(out, "_{:04x}", u32::from(c));
            }
        }
    }
    if JAVA_KEYWORDS.contains(&out.as_str()) {
        out.push('_');
    }
    out
}

/// A type name referenced by the page and the line it appears on.
#[derive(Clone, Debug, PartialEq, Eq)]
struct TypeRef<'a> {
    name: &'a str,
    line: u32,
}

/// Type references declared by one page, in source order.
#[derive(Debug, Default)]
struct PageDirectives<'a> {
    imports: Vec<TypeRef<'a>>,
    extends: Option<TypeRef<'a>>,
    beans: Vec<TypeRef<'a>>,
}

impl<'a> PageDirectives<'a> {
    fn scan(text: &'a str) -> Self {
        let mut page = PageDirectives::default();
        let mut pos = 0;
        while let Some(found) = text[pos..].find('<') {
            let start = pos + found;
            let rest = &text[start..];
            pos = if rest.starts_with("<%--") {
                rest.find("--%>").map_or(text.len(), |end| start + end + 4)
            } else if let Some(body) = rest.strip_prefix("<%@") {
                let end = body.find("%>").unwrap_or(body.len());
                let directive = &body[..end];
                let lead = directive.len() - directive.trim_start().len();
                let name_len = directive[lead..]
                    .find(char::is_whitespace)
                    .unwrap_or(directive.len() - lead);
                if directive[lead..lead + name_len].eq("page") {
                    let attrs_at = lead + name_len;
                    page.collect_page(text, start + 3 + attrs_at, &directive[attrs_at..]);
                }
                start + 3 + end
            } else if let Some(body) = rest.strip_prefix("<jsp:directive.page") {
                let end = body.find('>').unwrap_or(body.len());
                page.collect_page(text, start + 19, &body[..end]);
                start + 19 + end
            } else if let Some(body) = rest.strip_prefix("<jsp:useBean") {
                let end = body.find('>').unwrap_or(body.len());
                for attr in attributes(text, start + 12, &body[..end]) {
                    if attr.name == "class" {
                        page.beans.push(attr.value_ref());
                    }
                }
                start + 12 + end
            } else {
                start + 1
            };
        }
        page
    }

    fn collect_page(&mut self, text: &'a str, offset: usize, body: &'a str) {
        for attr in attributes(text, offset, body) {
            match attr.name {
                "import" => {
                    let mut item_offset = attr.value_offset;
                    for item in attr.value.split(',') {
                        let name = item.trim();
                        if !name.is_empty() {
                            let lead = item.len() - item.trim_start().len();
                            self.imports.push(TypeRef {
                                name,
                                line: line_at(text, item_offset + lead),
                            });
                        }
                        item_offset += item.len() + 1;
                    }
                }
                "extends" => self.extends = Some(attr.value_ref()),
                _ => {}
            }
        }
    }
}

struct Attribute<'a> {
    name: &'a str,
    value: &'a str,
    /// Byte offset of the value in the page.
    value_offset: usize,
    line: u32,
}

impl<'a> Attribute<'a> {
    fn value_ref(&self) -> TypeRef<'a> {
        TypeRef {
            name: self.value.trim(),
            line: self.line,
        }
    }
}

/// Parse `name="value"` pairs. `offset` is the position of `body` in `text`.
fn attributes<'a>(text: &'a str, offset: usize, body: &'a str) -> Vec<Attribute<'a>> {
    let mut attrs = Vec::new();
    let mut pos = 0;
    let bytes = body.as_bytes();
    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let name_start = pos;
        while pos < bytes.len()
            && (bytes[pos].is_ascii_alphanumeric()
                || matches!(bytes[pos], b'_' | b'-' | b':' | b'.'))
        {
            pos += 1;
        }
        if pos == name_start {
            break;
        }
        let name = &body[name_start..pos];
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if bytes.get(pos) != Some(&b'=') {
            break;
        }
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let Some(&quote) = bytes.get(pos).filter(|&&b| b == b'"' || b == b'\'') else {
            break;
        };
        let value_start = pos + 1;
        let Some(len) = body[value_start..].find(char::from(quote)) else {
            break;
        };
        attrs.push(Attribute {
            name,
            value: &body[value_start..value_start + len],
            value_offset: offset + value_start,
            line: line_at(text, offset + name_start),
        });
        pos = value_start + len + 1;
    }
    attrs
}

/// Resolve every declared reference, reporting the ones that do not exist.
fn check_references(
    ctx: &CompilationContext,
    page: &PageDirectives<'_>,
    own_package: &str,
    file: &SourceFile,
) -> DiagnosticList {
    let mut diagnostics = DiagnosticList::new();
    let mut single = Vec::new();
    let mut on_demand: Vec<&str> = IMPLICIT_PACKAGES.to_vec();
    on_demand.push(own_package);

    for (i, import) in page.imports.iter().enumerate() {
        if page.imports[..i].iter().any(|earlier| earlier.name == import.name) {
            diagnostics.push(Diagnostic::warning(
                &file.path,
                import.line,
                format!("The import {} is repeated", import.name),
            ));
            continue;
        }
        let resolved = match import.name.strip_suffix(".*") {
            Some(prefix) => {
                let ok = ctx.is_package_path(prefix) || resolve_qualified(ctx, prefix).exists();
                if ok {
                    on_demand.push(prefix);
                }
                ok
            }
            None => {
                let resolution = resolve_qualified(ctx, import.name);
                if let Some(message) = newer_than_target(ctx, &resolution, import.name) {
                    diagnostics.push(Diagnostic::error(&file.path, import.line, message));
                }
                let ok = resolution.exists();
                if ok {
                    single.push(import.name);
                }
                ok
            }
        };
        if !resolved {
            let shown = import.name.strip_suffix(".*").unwrap_or(import.name);
            diagnostics.push(Diagnostic::error(
                &file.path,
                import.line,
                format!("The import {shown} cannot be resolved"),
            ));
        }
    }

    for type_ref in page.extends.iter().chain(&page.beans) {
        let name = erase_type(type_ref.name);
        let resolution = resolve_type(ctx, name, &single, &on_demand);
        if !resolution.exists() {
            diagnostics.push(Diagnostic::error(
                &file.path,
                type_ref.line,
                format!("{name} cannot be resolved to a type"),
            ));
        } else if let Some(message) = newer_than_target(ctx, &resolution, name) {
            diagnostics.push(Diagnostic::error(&file.path, type_ref.line, message));
        }
    }
    diagnostics
}

/// Strip type arguments and array brackets.
fn erase_type(name: &str) -> &str {
    let end = name.find(&['<', '['][..]).unwrap_or(name.len());
    name[..end].trim()
}

fn resolve_type(
    ctx: &CompilationContext,
    name: &str,
    single: &[&str],
    on_demand: &[&str],
) -> Resolution {
    if name.contains('.') {
        return resolve_qualified(ctx, name);
    }
    if let Some(import) = single
        .iter()
        .find(|import| ResolutionKey::new(import).simple_name() == name)
    {
        return resolve_qualified(ctx, import);
    }
    for package in on_demand {
        let resolution = resolve_qualified(ctx, &format!("{package}.{name}"));
        if resolution.exists() {
            return resolution;
        }
    }
    ctx.resolve(name)
}

/// Error text when `resolution` is a class file newer than the target level.
fn newer_than_target(
    ctx: &CompilationContext,
    resolution: &Resolution,
    name: &str,
) -> Option<String> {
    let Resolution::Found(artifact) = resolution else {
        return None;
    };
    let target = ctx.settings().target_level;
    (artifact.metadata.major_version > target.class_file_major()).then(|| {
        format!(
            "{name} was compiled for release {}, newer than the target {target}",
            artifact.metadata.release()
        )
    })
}

/// Resolve a source-level qualified name, retrying nested types in their
/// binary form (`a.Outer.Inner` as `a.Outer$Inner`).
fn resolve_qualified(ctx: &CompilationContext, name: &str) -> Resolution {
    let mut candidate = name.to_string();
    loop {
        let resolution = ctx.resolve(&candidate);
        if resolution.exists() {
            return resolution;
        }
        let Some(dot) = candidate.rfind('.') else {
            return Resolution::NotFound;
        };
        let owner_start = candidate[..dot].rfind(&['.', '$'][..]).map_or(0, |i| i + 1);
        if !candidate[owner_start..dot].starts_with(char::is_uppercase) {
            return Resolution::NotFound;
        }
        candidate.replace_range(dot..=dot, "$");
    }
}

/// Template text between JSP elements, in page order.
fn template_chunks(text: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("<%") {
        if start > 0 {
            chunks.push(&rest[..start]);
        }
        let close = if rest[start..].starts_with("<%--") { "--%>" } else { "%>" };
        match rest[start..].find(close) {
            Some(end) => rest = &rest[start + end + close.len()..],
            None => return chunks,
        }
    }
    if !rest.is_empty() {
        chunks.push(rest);
    }
    chunks
}

fn escape_java(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out
}

fn line_at(text: &str, offset: usize) -> u32 {
    line_at_bytes(text.as_bytes(), offset)
}

/// 1-based line containing byte `offset`.
fn line_at_bytes(bytes: &[u8], offset: usize) -> u32 {
    let end = offset.min(bytes.len());
    let newlines = bytes[..end].iter().filter(|&&b| b == b'\n').count();
    u32::try_from(newlines + 1).unwrap_or(u32::MAX)
}
