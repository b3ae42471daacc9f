//! Turns command-line paths and the optional config file into compile
//! inputs.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use quill_config::{Config, DirectiveBody, DirectiveConfig, DirectiveScope};
use quill_engine::{
    CompileInput, CompileOptions, DirectiveDescriptor, DirectiveKind, DirectiveRegistry,
    DirectiveTokenDescriptor, DirectiveUsage, SourceText, io,
};
use relative_path::RelativePathBuf;

pub struct Project {
    root: PathBuf,
    options: CompileOptions,
    /// Imports from the config file, applied before any `_Imports.qtml`.
    global_imports: Vec<SourceText>,
}

impl Project {
    /// `root` is used when the config names no project root.
    pub fn new(config: Option<&Config>, root: PathBuf) -> Result<Self> {
        let Some(config) = config else {
            return Ok(Self {
                root,
                options: CompileOptions::default(),
                global_imports: Vec::new(),
            });
        };

        let root = config.project_root.clone().unwrap_or(root);
        let global_imports = config
            .resolve_imports()?
            .into_iter()
            .map(|path| {
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("reading import {}", path.display()))?;
                let label = path
                    .strip_prefix(&root)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .replace('\\', "/");
                Ok(SourceText::with_path(label, &text))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            root,
            options: compile_options(config)?,
            global_imports,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Template files named by `paths`; directories are scanned.
    pub fn templates(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut templates = Vec::new();
        for path in paths {
            if path.is_dir() {
                templates.extend(io::scan_templates(path)?);
            } else {
                templates.push(path.clone());
            }
        }
        Ok(templates)
    }

    /// Reads a template and the imports that apply to it.
    pub fn input(&self, file: &Path) -> Result<CompileInput> {
        let relative = self.relative_path(file)?;
        let source = io::read_template(&relative, &self.root)?;
        let mut imports = self.global_imports.clone();
        imports.extend(io::read_imports(&relative, &self.root)?);
        log::debug!("{relative}: {} imports", imports.len());
        Ok(CompileInput { source, imports })
    }

    fn relative_path(&self, file: &Path) -> Result<RelativePathBuf> {
        let root = fs::canonicalize(&self.root)
            .with_context(|| format!("project root {}", self.root.display()))?;
        let absolute =
            fs::canonicalize(file).with_context(|| format!("template {}", file.display()))?;
        let Ok(relative) = absolute.strip_prefix(&root) else {
            bail!(
                "{} is outside the project root {}",
                file.display(),
                self.root.display()
            );
        };
        RelativePathBuf::from_path(relative)
            .with_context(|| format!("template path {}", relative.display()))
    }
}

fn compile_options(config: &Config) -> Result<CompileOptions> {
    let mut options = CompileOptions::default();
    if let Some(root_namespace) = &config.root_namespace {
        options.root_namespace = root_namespace.clone();
    }
    if let Some(base_type) = &config.base_type {
        options.base_type = base_type.clone();
    }
    options.design_time = config.design_time;

    let mut registry = DirectiveRegistry::builtin();
    for directive in &config.directives {
        registry = registry.with(descriptor(directive)?);
    }
    options.directives = Arc::new(registry);
    Ok(options)
}

fn descriptor(directive: &DirectiveConfig) -> Result<DirectiveDescriptor> {
    let tokens = directive
        .tokens
        .iter()
        .map(|token| token.parse::<DirectiveTokenDescriptor>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("directive @{}", directive.name))?;
    let kind = match directive.body {
        DirectiveBody::None => DirectiveKind::SingleLine,
        DirectiveBody::Code => DirectiveKind::CodeBlock,
        DirectiveBody::Markup => DirectiveKind::MarkupBlock,
    };
    let usage = match directive.scope {
        DirectiveScope::Anywhere => DirectiveUsage::Unrestricted,
        DirectiveScope::File => DirectiveUsage::FileScopedMultipleOccurring,
        DirectiveScope::FileOnce => DirectiveUsage::FileScopedSinglyOccurring,
    };
    Ok(DirectiveDescriptor::new(
        directive.name.clone(),
        kind,
        usage,
        tokens,
    ))
}
