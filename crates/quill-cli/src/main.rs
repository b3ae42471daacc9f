mod dump;
mod explorer;
mod project;

use anyhow::{Result, anyhow, bail};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use quill_config::Config;
use quill_engine::{CodeDocument, CompileError, compile_all};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    env,
    io::{Write, stdout},
    path::PathBuf,
    process,
};

use explorer::{Entry, Explorer};
use project::Project;

const USAGE: &str = "Usage: quill-cli <file.qtml|dir>... [--config <path>] [--dump]";

#[derive(Debug, PartialEq, Eq)]
struct Args {
    paths: Vec<PathBuf>,
    config: Option<PathBuf>,
    dump: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut parsed = Args {
        paths: Vec::new(),
        config: None,
        dump: false,
    };
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dump" => parsed.dump = true,
            "--config" => {
                let path = args.next().ok_or_else(|| anyhow!("--config needs a path"))?;
                parsed.config = Some(PathBuf::from(path));
            }
            flag if flag.starts_with("--") => bail!("unknown option {flag}"),
            path => parsed.paths.push(PathBuf::from(path)),
        }
    }
    if parsed.paths.is_empty() {
        bail!("no template given");
    }
    Ok(parsed)
}

fn load_config(path: Option<&PathBuf>) -> Result<Option<Config>> {
    match path {
        Some(path) => match Config::load_from_path(path)? {
            Some(config) => Ok(Some(config)),
            None => bail!("config file {} not found", path.display()),
        },
        None => Ok(Config::load()?),
    }
}

/// Compiles every template, keeping read failures alongside compile results.
fn compile(project: &Project, templates: &[PathBuf]) -> Vec<Entry> {
    let mut entries = Vec::new();
    let mut inputs = Vec::new();
    let mut slots = Vec::new();
    for template in templates {
        let name = template.display().to_string();
        match project.input(template) {
            Ok(input) => {
                slots.push(Some(inputs.len()));
                inputs.push(input);
            }
            Err(e) => {
                log::warn!("skipping {name}: {e:#}");
                slots.push(None);
            }
        }
        entries.push(name);
    }

    let mut results = compile_all(&inputs, project.options())
        .into_iter()
        .map(Some)
        .collect::<Vec<Option<Result<CodeDocument, CompileError>>>>();

    entries
        .into_iter()
        .zip(slots)
        .map(|(name, slot)| {
            let document = match slot.and_then(|i| results[i].take()) {
                Some(result) => result.map_err(|e| e.to_string()),
                None => Err(format!("could not read {name}")),
            };
            Entry { name, document }
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{USAGE}");
            eprintln!(
                "Settings are read from {} unless --config is given",
                Config::config_path().display()
            );
            process::exit(1);
        }
    };

    let config = match load_config(args.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config: {e}");
            process::exit(1);
        }
    };
    let project = Project::new(config.as_ref(), env::current_dir()?)?;
    log::info!("Project root: {}", project.root().display());

    let templates = project.templates(&args.paths)?;
    if templates.is_empty() {
        eprintln!("Error: no .qtml templates found");
        process::exit(1);
    }
    let entries = compile(&project, &templates);

    if args.dump {
        let mut failed = false;
        let mut out = stdout().lock();
        for entry in &entries {
            match &entry.document {
                Ok(document) => {
                    failed |= document.has_errors();
                    dump::write_document(&mut out, document)?;
                }
                Err(e) => {
                    failed = true;
                    eprintln!("Error: {}: {e}", entry.name);
                }
            }
        }
        out.flush()?;
        if failed {
            process::exit(1);
        }
        return Ok(());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = Explorer::new(entries);
    let res = explorer::run(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}
