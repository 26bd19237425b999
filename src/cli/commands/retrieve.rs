//! Retrieve command - query a persisted index.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::cli::RetrieveQuery;
use crate::config::Settings;
use crate::storage::{IndexData, IndexPersistence};
use crate::symbol::{ClassType, Usage, UsageKind, member_name, package_of, simple_name};
use crate::types::{FileId, LineIndex, Location};

/// Run the retrieve command against the index configured in `config`.
pub fn run(query: RetrieveQuery, json: bool, config: &Settings) -> Result<()> {
    let persistence = IndexPersistence::new(config.index_dir());
    let (data, metadata) = persistence
        .load()
        .context("Could not load index. Run 'codexref index' first")?;
    let mut sources = SourceCache::new(&data, metadata.source_root);

    match query {
        RetrieveQuery::References { name } => {
            let usages = find_references(&data, &name);
            if json {
                return print_json(&usages);
            }
            if usages.is_empty() {
                println!("No references to {name}");
            } else {
                println!("{} reference(s) to {name}:", usages.len());
                for usage in usages {
                    print_usage(&mut sources, usage);
                }
            }
        }

        RetrieveQuery::Definition { file, offset } => {
            let Some(file_id) = data.file_by_path(&file) else {
                bail!("File not in index: {file}");
            };
            let definition = data.definition_at(file_id, offset);
            if json {
                return print_json(&definition);
            }
            match (data.usage_at(file_id, offset), definition) {
                (Some(usage), Some(location)) => {
                    println!("{} -> {}", usage.target_name(), sources.describe(&location));
                }
                (Some(usage), None) => {
                    println!("{} is not declared in the indexed sources", usage.target_name());
                }
                (None, _) => println!("No reference at {file}:{offset}"),
            }
        }

        RetrieveQuery::Usages { file } => {
            let Some(file_id) = data.file_by_path(&file) else {
                bail!("File not in index: {file}");
            };
            let usages: Vec<&Usage> = data.usages_in(file_id).collect();
            if json {
                return print_json(&usages);
            }
            println!("{} usage(s) in {file}:", usages.len());
            for usage in usages {
                print_usage(&mut sources, usage);
            }
        }

        RetrieveQuery::Class { name } => {
            let classes = data.find_class(&name);
            if json {
                return print_json(&classes);
            }
            if classes.is_empty() {
                println!("Class not found: {name}");
            }
            for class in classes {
                print_class(&mut sources, class);
            }
        }
    }
    Ok(())
}

/// Usages of whatever `name` denotes.
///
/// `name` is a qualified class or method name (`q.Foo`, `q.Foo.bar`), or a simple
/// class name optionally followed by a member (`Foo`, `Foo.bar`, `Foo.<init>`).
pub fn find_references<'a>(data: &'a IndexData, name: &str) -> Vec<&'a Usage> {
    let direct = data.references_to(name);
    if !direct.is_empty() {
        return direct;
    }

    let targets: Vec<String> = match data.find_class(name).as_slice() {
        [] => data
            .find_class(package_of(name))
            .into_iter()
            .map(|class| member_name(class.name(), simple_name(name)))
            .collect(),
        classes => classes.iter().map(|class| class.name().to_string()).collect(),
    };

    let mut usages: Vec<&Usage> = targets
        .iter()
        .flat_map(|target| data.references_to(target))
        .collect();
    usages.sort_by_key(|usage| (usage.location.file, usage.location.span.from));
    usages
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_usage(sources: &mut SourceCache, usage: &Usage) {
    let kind = match &usage.kind {
        UsageKind::Type { kind, .. } => kind.to_string(),
        UsageKind::Method { kind, .. } => kind.to_string(),
    };
    println!(
        "  {}  {kind}  {}",
        sources.describe(&usage.location),
        usage.target_name()
    );
    println!("      {}", usage.snippet.trim());
}

fn print_class(sources: &mut SourceCache, class: &ClassType) {
    println!("{:?} {} at {}", class.kind, class.name(), sources.describe(&class.location));
    if let Some(doc) = &class.doc_comment {
        for line in doc.lines() {
            println!("  // {}", line.trim());
        }
    }
    for field in &class.fields {
        println!("  field  {}: {}", class.unqualified_field_name(field), field.ty);
    }
    for method in &class.methods {
        let parameters: Vec<String> = method
            .parameters
            .iter()
            .map(|parameter| format!("{}: {}", parameter.name, parameter.ty))
            .collect();
        println!(
            "  method {}({})  {}",
            method.handle.member_name(),
            parameters.join(", "),
            sources.describe(&method.location)
        );
    }
}

/// Turns locations into `path:line:column` by reading the indexed sources on demand.
struct SourceCache {
    root: Option<PathBuf>,
    paths: HashMap<FileId, String>,
    texts: HashMap<FileId, Option<String>>,
}

impl SourceCache {
    fn new(data: &IndexData, root: Option<PathBuf>) -> Self {
        let paths = data
            .files
            .iter()
            .map(|(path, id)| (*id, path.clone()))
            .collect();
        Self {
            root,
            paths,
            texts: HashMap::new(),
        }
    }

    fn describe(&mut self, location: &Location) -> String {
        let Some(path) = self.paths.get(&location.file) else {
            return location.to_string();
        };
        let root = self.root.clone();
        let text = self.texts.entry(location.file).or_insert_with(|| {
            let full = match &root {
                Some(root) => root.join(path),
                None => PathBuf::from(path),
            };
            fs::read_to_string(full).ok()
        });
        format_position(path, text.as_deref(), location)
    }
}

/// `path:line:column` (1-based) when the source text is known, else `path@from..to`.
fn format_position(path: &str, text: Option<&str>, location: &Location) -> String {
    match text {
        Some(text) => {
            let (line, column) = LineIndex::new(text).position_of(location.span.from);
            format!("{path}:{}:{}", line + 1, column + 1)
        }
        None => format!("{path}@{}", location.span),
    }
}
