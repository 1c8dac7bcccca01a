//! Zen Writer CLI.
//!
//! Analyzes, rewrites, and formats a text or HTML file with the writing
//! assistant and prints the result.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use smol::Executor;
use zen_assist::{AnalysisResult, GoogleWritingModel, SessionPlatform, WriterSession};
use zen_core::{
    JsonFileStore, ManualSelection, MarkupCommandExecutor, ToolbarCommand, ZenConfig,
    escape_text, strip_markup,
};

#[derive(Parser)]
#[command(name = "zen-writer")]
#[command(author, version, about = "A calm writing assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file to use instead of ~/.zen_writer/config.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model identifier, overriding the config file
    #[arg(long, global = true)]
    model: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Report tone, style suggestions, and grammar mistakes
    Analyze {
        file: PathBuf,

        /// Print the raw analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rewrite the file, or only the selected range
    Transform {
        /// `shorten`, `formalize`, or any verb phrase such as "Make funny"
        action: String,

        file: PathBuf,

        /// Byte range of the file to rewrite, e.g. 10..42
        ///
        /// Offsets count bytes of the file as stored on disk.
        #[arg(long, value_parser = parse_selection)]
        selection: Option<Range<usize>>,
    },

    /// Replace the first occurrence of a mistake with its correction
    Correct {
        file: PathBuf,
        mistake: String,
        correction: String,
    },

    /// Apply a toolbar command such as `bold` or `font-size=5` to a range
    Format {
        command: String,

        file: PathBuf,

        /// Byte range of the file to format, e.g. 10..42
        #[arg(long, value_parser = parse_selection)]
        selection: Option<Range<usize>>,
    },

    /// Write a config file with default settings
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show or toggle the light/dark theme preference
    Theme {
        #[arg(value_enum)]
        action: Option<ThemeAction>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeAction {
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Html,
    Text,
}

impl DocumentKind {
    fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|extension| extension.to_str()) {
            Some("html" | "htm") => DocumentKind::Html,
            _ => DocumentKind::Text,
        }
    }

    fn to_markup(self, contents: &str) -> String {
        match self {
            DocumentKind::Html => contents.to_string(),
            DocumentKind::Text => escape_text(contents),
        }
    }

    /// Map a byte range of the file onto the markup built by [`Self::to_markup`].
    fn markup_range(self, contents: &str, range: Range<usize>) -> Result<Range<usize>> {
        let (Some(before), Some(selected)) = (contents.get(..range.start), contents.get(range.clone()))
        else {
            bail!(
                "selection {range:?} does not fit the {} bytes of the file or splits a character",
                contents.len()
            );
        };
        Ok(match self {
            DocumentKind::Html => range,
            DocumentKind::Text => {
                let start = escape_text(before).len();
                start..start + escape_text(selected).len()
            }
        })
    }

    fn render(self, markup: &str) -> String {
        match self {
            DocumentKind::Html => markup.to_string(),
            DocumentKind::Text => strip_markup(&markup.replace("<br>", "\n")),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(error) = run(Cli::parse()) {
        log::error!("{error:?}");
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => ZenConfig::config_path()?,
    };
    if let Command::Init { force } = cli.command {
        if config_path.exists() && !force {
            bail!("{} already exists, pass --force to replace it", config_path.display());
        }
        return ZenConfig::default().save_to(&config_path);
    }

    let mut config = ZenConfig::load_from(&config_path)?;
    if let Some(model) = cli.model {
        config.model = model;
    }

    let http_client = Arc::new(reqwest_client::ReqwestClient::new()?);
    let model = Arc::new(GoogleWritingModel::new(http_client, &config)?);
    log::info!("using model {}", model.model());
    let executor = Arc::new(Executor::new());

    let open = |file: &Path, selection: Option<Range<usize>>| -> Result<(WriterSession, DocumentKind)> {
        let kind = DocumentKind::for_path(file);
        let contents = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let selection = selection
            .map(|range| kind.markup_range(&contents, range))
            .transpose()?;
        let platform = SessionPlatform {
            selection: Arc::new(ManualSelection::new(selection)),
            commands: Arc::new(MarkupCommandExecutor),
            preferences: Arc::new(JsonFileStore::new(ZenConfig::preferences_path()?)),
        };
        let session = WriterSession::new(
            model.clone(),
            executor.clone(),
            platform,
            &config,
            kind.to_markup(&contents),
        );
        Ok((session, kind))
    };

    match cli.command {
        Command::Analyze { file, json } => {
            let (session, _) = open(&file, None)?;
            let Some(task) = session.analyze_now() else {
                println!(
                    "Text is too short to analyze (needs more than {} characters).",
                    config.min_analysis_chars
                );
                return Ok(());
            };
            smol::block_on(executor.run(task));

            let state = session.store().state();
            if let Some(error) = state.error {
                bail!(error);
            }
            let Some(analysis) = state.analysis else {
                bail!("analysis produced no result");
            };
            if json {
                println!("{}", serde_json::to_string_pretty(analysis.as_ref())?);
            } else {
                print!("{}", format_analysis(&analysis));
            }
        }
        Command::Transform {
            action,
            file,
            selection,
        } => {
            let (session, kind) = open(&file, selection)?;
            smol::block_on(executor.run(session.transform_content(&action)))?;
            println!("{}", kind.render(&session.markup()));
        }
        Command::Correct {
            file,
            mistake,
            correction,
        } => {
            let (session, kind) = open(&file, None)?;
            if !session.apply_grammar_correction(&mistake, &correction) {
                log::warn!("{mistake:?} not found in {}", file.display());
            }
            println!("{}", kind.render(&session.markup()));
        }
        Command::Format {
            command,
            file,
            selection,
        } => {
            let command = ToolbarCommand::parse(&command)?;
            let (session, _) = open(&file, selection)?;
            if !session.exec_command(&command)? {
                log::warn!("{} changed nothing", command.command_name());
            }
            println!("{}", session.markup());
        }
        Command::Theme { action } => {
            let preferences_path = ZenConfig::preferences_path()?;
            let platform = SessionPlatform::headless(Arc::new(JsonFileStore::new(preferences_path)));
            let session = WriterSession::new(model, executor, platform, &config, "");
            let theme = match action {
                Some(ThemeAction::Toggle) => session.toggle_theme()?,
                None => session.theme(),
            };
            println!("{}", theme.as_str());
        }
        Command::Init { .. } => unreachable!("handled before the model is configured"),
    }
    Ok(())
}

fn format_analysis(analysis: &AnalysisResult) -> String {
    let mut output = format!(
        "Tone: {} ({}/100) {}\n",
        analysis.tone.name,
        analysis.tone.score,
        analysis.tone_color().hex()
    );
    output.push_str("\nSuggestions:\n");
    for (index, suggestion) in analysis.suggestions.iter().enumerate() {
        output.push_str(&format!("  {}. {suggestion}\n", index + 1));
    }
    output.push_str("\nGrammar:\n");
    if analysis.grammar_mistakes.is_empty() {
        output.push_str("  No mistakes found.\n");
    }
    for mistake in &analysis.grammar_mistakes {
        output.push_str(&format!(
            "  {:?} -> {:?}: {}\n",
            mistake.mistake, mistake.correction, mistake.explanation
        ));
    }
    output
}

fn parse_selection(value: &str) -> Result<Range<usize>, String> {
    let (start, end) = value
        .split_once("..")
        .ok_or_else(|| format!("expected START..END, got {value:?}"))?;
    let start: usize = start
        .trim()
        .parse()
        .map_err(|error| format!("invalid start {start:?}: {error}"))?;
    let end: usize = end
        .trim()
        .parse()
        .map_err(|error| format!("invalid end {end:?}: {error}"))?;
    if start > end {
        return Err(format!("selection start {start} is after end {end}"));
    }
    Ok(start..end)
}
