use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use typo_detector::{
    load_detector, AnnotationStrategy, Config, Detection, InferenceMode, Markers, OnnxModelManager,
};

const ANSI_ITALIC: &str = "\x1b[3m";
const ANSI_RESET_ITALIC: &str = "\x1b[23m";

#[derive(Parser, Debug)]
#[command(name = "typo-detector")]
#[command(about = "Highlight misspelled words with a token-classification model")]
#[command(version)]
struct Cli {
    /// Config file (created with defaults when missing)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory containing model.onnx and tokenizer.json
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    /// optimized | compiled
    #[arg(long, global = true)]
    mode: Option<InferenceMode>,

    /// Static sequence length for the compiled path
    #[arg(long, global = true)]
    max_sequence_length: Option<usize>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check sentences given as arguments, or one per line on stdin
    Detect {
        sentences: Vec<String>,

        /// positional | literal
        #[arg(long)]
        annotation: Option<AnnotationStrategy>,

        /// Print one JSON report per sentence
        #[arg(long)]
        json: bool,

        /// Render markers as terminal italics
        #[arg(long)]
        ansi: bool,
    },
    /// Convert the ONNX model to the cached NNEF representation and exit
    Convert,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_from(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    if let Some(model_dir) = &cli.model_dir {
        config.model_dir = model_dir.clone();
    }
    if let Some(mode) = cli.mode {
        config.inference_mode = mode;
    }
    if let Some(length) = cli.max_sequence_length {
        config.max_sequence_length = length;
    }
    if let Some(Command::Detect {
        annotation: Some(annotation),
        ..
    }) = &cli.command
    {
        config.annotation = *annotation;
    }

    config.validate()?;
    Ok(config)
}

fn render_ansi(annotated: &str, markers: &Markers) -> String {
    annotated
        .replace(&markers.open, ANSI_ITALIC)
        .replace(&markers.close, ANSI_RESET_ITALIC)
}

fn print_detection(detection: &Detection, markers: &Markers, json: bool, ansi: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(detection)?);
        return Ok(());
    }

    let annotated = if ansi {
        render_ansi(&detection.annotated, markers)
    } else {
        detection.annotated.clone()
    };
    println!("original:  {}", detection.original);
    println!("annotated: {}", annotated);
    Ok(())
}

/// Feed every non-blank sentence to `check` as soon as it is read
fn for_each_sentence<I, F>(sentences: I, mut check: F) -> Result<()>
where
    I: IntoIterator<Item = io::Result<String>>,
    F: FnMut(&str) -> Result<()>,
{
    for sentence in sentences {
        let sentence = sentence.context("Failed to read sentence from stdin")?;
        if sentence.trim().is_empty() {
            continue;
        }
        check(&sentence)?;
    }
    Ok(())
}

fn run_detect(config: &Config, sentences: Vec<String>, json: bool, ansi: bool) -> Result<()> {
    let detector = load_detector(config).context("Failed to load typo detector")?;
    let markers = config.markers();

    let check = |sentence: &str| -> Result<()> {
        let detection = detector
            .analyze(sentence)
            .with_context(|| format!("Failed to check '{}'", sentence))?;
        print_detection(&detection, &markers, json, ansi)
    };

    if sentences.is_empty() {
        for_each_sentence(io::stdin().lock().lines(), check)
    } else {
        for_each_sentence(sentences.into_iter().map(Ok), check)
    }
}

fn run_convert(config: &Config) -> Result<()> {
    let onnx_path = OnnxModelManager::find_onnx_model(&config.model_dir)?;
    let ir_dir = config
        .ir_cache_dir
        .clone()
        .unwrap_or_else(|| config.model_dir.join("ir"));
    let ir_path = OnnxModelManager::convert_to_ir(&onnx_path, config.max_sequence_length, &ir_dir)?;
    println!("{}", ir_path.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let config = resolve_config(&cli)?;
    info!(?config, "Resolved configuration");

    let result = match cli.command {
        Some(Command::Convert) => run_convert(&config),
        Some(Command::Detect {
            sentences,
            json,
            ansi,
            ..
        }) => run_detect(&config, sentences, json, ansi),
        None => run_detect(&config, Vec::new(), false, false),
    };

    if let Err(e) = &result {
        error!("❌ {:#}", e);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_ansi_swaps_markers() {
        let rendered = render_ansi("a <i>smple</i> test", &Markers::default());
        assert_eq!(rendered, "a \x1b[3msmple\x1b[23m test");
    }

    #[test]
    fn test_sentences_are_checked_as_they_arrive() {
        let lines = vec![
            Ok("teh cat".to_string()),
            Ok("   ".to_string()),
            Ok("a dog".to_string()),
            Err(io::Error::new(io::ErrorKind::InvalidData, "not utf-8")),
            Ok("never read".to_string()),
        ];
        let mut checked = Vec::new();

        let result = for_each_sentence(lines, |sentence| {
            checked.push(sentence.to_string());
            Ok(())
        });

        // sentences before the read error were already handled
        assert!(result.is_err());
        assert_eq!(checked, vec!["teh cat", "a dog"]);
    }

    #[test]
    fn test_cli_parses_detect_flags() {
        let cli = Cli::parse_from([
            "typo-detector",
            "--mode",
            "compiled",
            "detect",
            "--annotation",
            "literal",
            "--json",
            "teh cat",
        ]);
        assert_eq!(cli.mode, Some(InferenceMode::Compiled));
        match cli.command {
            Some(Command::Detect {
                sentences,
                annotation,
                json,
                ansi,
            }) => {
                assert_eq!(sentences, vec!["teh cat"]);
                assert_eq!(annotation, Some(AnnotationStrategy::Literal));
                assert!(json);
                assert!(!ansi);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
