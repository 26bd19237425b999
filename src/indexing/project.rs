//! Project indexing.
//!
//! Runs the whole pipeline over a set of Java sources:
//!
//! 1. PARSE (parallel): one tree-sitter parser per worker thread
//! 2. DECLARE (serial): collect every file's classes into one symbol table
//! 3. LINK (serial): resolve member types now that every class is known
//! 4. RESOLVE (parallel): each file on its own fork of the table
//!
//! With `parallel_threads = 1` step 4 reuses the table itself for every file, in
//! file order. Both modes produce the same usages.
//!
//! A file that fails to parse or resolve is logged, counted and left out of the
//! usage list. It never stops the run.

use super::declarations::{collect_declarations, link_declarations};
use super::walker::FileWalker;
use crate::config::Settings;
use crate::error::{IndexError, IndexResult};
use crate::parsing::{JavaParser, ParseError, ParseResult};
use crate::resolution::{ResolveResult, SymbolTable, extract_usages};
use crate::storage::IndexData;
use crate::symbol::{ClassType, Usage};
use crate::syntax::CompilationUnit;
use crate::types::FileId;
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One source file handed to the indexer.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path as recorded in the index, `/`-separated.
    pub path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub files_indexed: usize,
    pub parse_failures: usize,
    pub resolve_failures: usize,
    pub classes: usize,
    pub usages: usize,
    pub elapsed: Duration,
}

impl IndexStats {
    pub fn failures(&self) -> usize {
        self.parse_failures + self.resolve_failures
    }
}

/// Output of one indexing run.
#[derive(Debug, Clone)]
pub struct ProjectIndex {
    pub data: IndexData,
    pub stats: IndexStats,
    /// Paths of files that failed to parse or resolve, in file order.
    pub failed_files: Vec<String>,
}

/// A parsed file waiting for declaration and resolution.
struct ParsedFile<'a> {
    id: FileId,
    source: &'a SourceFile,
    unit: CompilationUnit,
    classes: Vec<ClassType>,
}

pub struct ProjectIndexer {
    settings: Arc<Settings>,
}

impl ProjectIndexer {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn threads(&self) -> usize {
        self.settings.indexing.parallel_threads.max(1)
    }

    /// Discover, read and index every source file under `root`.
    ///
    /// Paths in the index are relative to `root`.
    pub fn index_directory(&self, root: &Path) -> IndexResult<ProjectIndex> {
        if !root.is_dir() {
            return Err(IndexError::DirectoryNotFound(root.to_path_buf()));
        }

        let walker = FileWalker::new(self.settings.indexing.clone());
        let paths = walker.walk(root);
        crate::debug_event!(
            "indexer",
            "discovered",
            "{} files under {}",
            paths.len(),
            root.display()
        );

        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let content = fs::read_to_string(&path).map_err(|source| IndexError::FileRead {
                path: path.clone(),
                source,
            })?;
            let relative = path.strip_prefix(root).unwrap_or(&path);
            sources.push(SourceFile::new(
                relative.to_string_lossy().replace('\\', "/"),
                content,
            ));
        }

        self.index_sources(&sources)
    }

    /// Index `sources`. File ids follow the order of `sources`, starting at 1.
    pub fn index_sources(&self, sources: &[SourceFile]) -> IndexResult<ProjectIndex> {
        let start = Instant::now();
        let threads = self.threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| IndexError::ThreadPool(e.to_string()))?;

        let mut data = IndexData::new();
        let mut stats = IndexStats::default();
        let mut failed_files = Vec::new();

        let mut ids = Vec::with_capacity(sources.len());
        for (index, source) in sources.iter().enumerate() {
            let id = u32::try_from(index + 1)
                .ok()
                .and_then(FileId::new)
                .ok_or_else(|| IndexError::General("too many files to index".to_string()))?;
            data.files.insert(source.path.clone(), id);
            ids.push(id);
        }

        // PARSE
        let parsed: Vec<ParseResult<CompilationUnit>> = pool.install(|| {
            sources
                .par_iter()
                .map_init(JavaParser::new, |parser, source| match parser {
                    Ok(parser) => parser.parse(&source.content),
                    Err(e) => Err(ParseError::LanguageSetup(e.to_string())),
                })
                .collect()
        });

        let mut files = Vec::with_capacity(sources.len());
        for ((source, id), result) in sources.iter().zip(ids).zip(parsed) {
            match result {
                Ok(unit) => files.push(ParsedFile {
                    id,
                    source,
                    unit,
                    classes: Vec::new(),
                }),
                Err(ParseError::LanguageSetup(reason)) => {
                    return Err(IndexError::ParserSetup(ParseError::LanguageSetup(reason)));
                }
                Err(e) => {
                    tracing::warn!(target: "indexer", "failed to parse {}: {e}", source.path);
                    stats.parse_failures += 1;
                    failed_files.push(source.path.clone());
                }
            }
        }

        // DECLARE
        let mut table = SymbolTable::new();
        for file in &mut files {
            file.classes = collect_declarations(file.id, &file.unit);
            for class in &file.classes {
                if table.registry().get_by_name(class.name()).is_some() {
                    tracing::warn!(
                        target: "indexer",
                        "{} declared again in {}, replacing the earlier declaration",
                        class.name(),
                        file.source.path
                    );
                }
                table.register_class_type(class.clone());
            }
        }
        // Replaced declarations must not be linked back into the registry.
        for file in &mut files {
            file.classes.retain(|class| {
                table
                    .get_class_type_by_location(class.location.file, class.location.span)
                    .is_some()
            });
        }

        // LINK
        let mut relinked = 0;
        for file in &files {
            relinked += link_declarations(&mut table, &file.unit, &file.classes)?;
        }
        crate::debug_event!("indexer", "linked", "{relinked} classes with project member types");

        for file in &files {
            for class in &file.classes {
                if let Some(registered) = table.registry().get_by_name(class.name()) {
                    data.classes
                        .insert(class.name().to_string(), ClassType::clone(registered));
                }
            }
        }

        // RESOLVE
        let resolved: Vec<ResolveResult<Vec<Usage>>> = if threads == 1 {
            files
                .iter()
                .map(|file| resolve_file(&mut table, file))
                .collect()
        } else {
            let table = &table;
            pool.install(|| {
                files
                    .par_iter()
                    .map(|file| resolve_file(&mut table.fork(), file))
                    .collect()
            })
        };

        for (file, result) in files.iter().zip(resolved) {
            match result {
                Ok(usages) => data.usages.extend(usages),
                Err(e) => {
                    tracing::warn!(
                        target: "indexer",
                        "failed to resolve {}: {e}",
                        file.source.path
                    );
                    stats.resolve_failures += 1;
                    failed_files.push(file.source.path.clone());
                }
            }
        }
        // Keep failures in file order
        failed_files.sort_by_key(|path| data.file_by_path(path));

        stats.files_indexed = files.len() - stats.resolve_failures;
        stats.classes = data.class_count();
        stats.usages = data.usage_count();
        stats.elapsed = start.elapsed();

        crate::log_event!(
            "indexer",
            "indexed",
            "{} files, {} classes, {} usages, {} failures in {:?}",
            stats.files_indexed,
            stats.classes,
            stats.usages,
            stats.failures(),
            stats.elapsed
        );

        Ok(ProjectIndex {
            data,
            stats,
            failed_files,
        })
    }
}

fn resolve_file(table: &mut SymbolTable, file: &ParsedFile<'_>) -> ResolveResult<Vec<Usage>> {
    tracing::trace!(target: "indexer", "resolving {}", file.source.path);
    extract_usages(file.id, &file.source.content, &file.unit, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{MethodUsageKind, TypeUsageKind};
    use tempfile::TempDir;

    const FOO: &str = "package q;\npublic class Foo {\n    public void bar() {}\n}\n";
    const A: &str = "package p;\nimport q.Foo;\nclass A { void m() { Foo x = new Foo(); x.bar(); } }\n";

    fn indexer(threads: usize) -> ProjectIndexer {
        let mut settings = Settings::default();
        settings.indexing.parallel_threads = threads;
        ProjectIndexer::new(Arc::new(settings))
    }

    fn sources() -> Vec<SourceFile> {
        vec![
            SourceFile::new("q/Foo.java", FOO),
            SourceFile::new("p/A.java", A),
        ]
    }

    #[test]
    fn test_index_sources_end_to_end() {
        let index = indexer(2).index_sources(&sources()).unwrap();
        let data = &index.data;

        assert_eq!(data.file_by_path("q/Foo.java"), FileId::new(1));
        assert_eq!(data.file_by_path("p/A.java"), FileId::new(2));
        assert_eq!(data.classes.keys().collect::<Vec<_>>(), vec!["q.Foo", "p.A"]);

        let targets: Vec<_> = data.usages.iter().map(|usage| usage.target_name()).collect();
        assert_eq!(targets, vec!["q.Foo", "q.Foo.<init>", "q.Foo.bar"]);
        assert_eq!(
            data.usages[0].as_type().map(|(_, kind)| kind),
            Some(TypeUsageKind::LocalVariable)
        );
        assert_eq!(
            data.usages[1].as_method().map(|(_, kind)| kind),
            Some(MethodUsageKind::InstanceCreation)
        );
        assert_eq!(
            data.usages[2].as_method().map(|(_, kind)| kind),
            Some(MethodUsageKind::MethodCall)
        );
        assert!(data.usages.iter().all(|usage| usage.location.file == FileId::new(2).unwrap()));

        assert_eq!(index.stats.files_indexed, 2);
        assert_eq!(index.stats.usages, 3);
        assert_eq!(index.stats.failures(), 0);
    }

    #[test]
    fn test_serial_and_parallel_agree() {
        let mut sources = sources();
        sources.push(SourceFile::new(
            "p/B.java",
            "package p;\nclass B { void n(A a) { a.m(); A other = new A(); other.m(); } }\n",
        ));

        let serial = indexer(1).index_sources(&sources).unwrap();
        let parallel = indexer(4).index_sources(&sources).unwrap();

        assert_eq!(serial.data.usages, parallel.data.usages);
        assert_eq!(serial.data.classes, parallel.data.classes);
        // a.m() resolves through the linked parameter type of n(A)
        assert_eq!(serial.data.references_to("p.A.m").len(), 2);
    }

    #[test]
    fn test_file_failure_does_not_stop_run() {
        let mut sources = sources();
        // The second declaration of `Dup` replaces the first, so the first file's
        // type declaration has nothing registered at its location.
        sources.push(SourceFile::new("Dup1.java", "class Dup { void a() {} }\n"));
        sources.push(SourceFile::new("Dup2.java", "class Dup { void b() { b(); } }\n"));

        let index = indexer(2).index_sources(&sources).unwrap();
        assert_eq!(index.failed_files, vec!["Dup1.java"]);
        assert_eq!(index.stats.resolve_failures, 1);
        assert_eq!(index.stats.files_indexed, 3);
        // Foo's three usages plus the call to b()
        assert_eq!(index.data.usage_count(), 4);
        assert_eq!(index.data.references_to("Dup.b").len(), 1);
    }

    #[test]
    fn test_same_simple_name_in_two_packages() {
        let q_node = SourceFile::new(
            "q/Node.java",
            "package q;\npublic class Node { public void bar() {} }\n",
        );
        let r_node = SourceFile::new(
            "r/Node.java",
            "package r;\npublic class Node { public void baz() {} }\n",
        );
        let user = SourceFile::new(
            "p/A.java",
            "package p;\nimport q.*;\nclass A { void m() { Node x = new Node(); x.bar(); } }\n",
        );

        // The wildcard import finds q.Node whichever Node was declared last.
        for order in [
            vec![q_node.clone(), r_node.clone(), user.clone()],
            vec![r_node.clone(), q_node.clone(), user.clone()],
        ] {
            for threads in [1, 4] {
                let index = indexer(threads).index_sources(&order).unwrap();
                let targets: Vec<_> =
                    index.data.usages.iter().map(|usage| usage.target_name()).collect();
                assert_eq!(targets, vec!["q.Node", "q.Node.<init>", "q.Node.bar"]);
                assert_eq!(index.data.class_count(), 3);
            }
        }
    }

    #[test]
    fn test_same_named_local_classes_in_one_file() {
        let code = r#"package p;
class A {
    void a() { class Local {} helper(); }
    void b() { class Local {} helper(); }
    void helper() {}
}
"#;
        let sources = [SourceFile::new("p/A.java", code)];

        let index = indexer(2).index_sources(&sources).unwrap();
        assert!(index.failed_files.is_empty());
        assert_eq!(index.data.class_count(), 3);
        assert!(index.data.classes.contains_key("p.A$1Local"));
        assert!(index.data.classes.contains_key("p.A$2Local"));
        assert_eq!(index.data.references_to("p.A.helper").len(), 2);
    }

    #[test]
    fn test_index_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("q")).unwrap();
        fs::create_dir_all(root.join("p")).unwrap();
        fs::write(root.join("q/Foo.java"), FOO).unwrap();
        fs::write(root.join("p/A.java"), A).unwrap();

        let index = indexer(2).index_directory(root).unwrap();
        // Sorted walk: p/A.java gets id 1
        assert_eq!(index.data.file_by_path("p/A.java"), FileId::new(1));
        assert_eq!(index.data.usage_count(), 3);

        assert!(matches!(
            indexer(2).index_directory(&root.join("missing")),
            Err(IndexError::DirectoryNotFound(_))
        ));
    }
}
