//! cfigen - EPUB CFI generator

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cfigen::dom::ArenaDom;
use cfigen::{Epub, Exclusions, Generator, compose};

#[derive(Parser)]
#[command(name = "cfigen")]
#[command(version, about = "Generate EPUB CFIs for elements and text positions", long_about = None)]
#[command(after_help = "EXAMPLES:
    cfigen book.epub --idref chap01 --id p12              CFI for an element
    cfigen book.epub --idref chap01 --id p12 --char 40    CFI for the 40th character of an element
    cfigen book.epub --spine 3 --exclude-class highlight  Body of the 4th spine item")]
struct Cli {
    /// EPUB file
    #[arg(value_name = "EPUB")]
    input: PathBuf,

    /// Spine idref of the content document
    #[arg(long, conflicts_with = "spine", required_unless_present = "spine")]
    idref: Option<String>,

    /// Zero-based spine position of the content document
    #[arg(long, value_name = "N")]
    spine: Option<usize>,

    /// Target element id (defaults to <body>)
    #[arg(long)]
    id: Option<String>,

    /// Character offset within the target element's text
    #[arg(long = "char", value_name = "OFFSET")]
    char_offset: Option<usize>,

    /// Ignore elements with this class (repeatable)
    #[arg(long = "exclude-class", value_name = "CLASS")]
    exclude_classes: Vec<String>,

    /// Ignore elements with this tag name (repeatable)
    #[arg(long = "exclude-tag", value_name = "TAG")]
    exclude_tags: Vec<String>,

    /// Ignore the element with this id (repeatable)
    #[arg(long = "exclude-id", value_name = "ID")]
    exclude_ids: Vec<String>,

    /// JSON file with "classes", "elements" and "ids" arrays to ignore
    #[arg(long, value_name = "FILE")]
    exclusions: Option<PathBuf>,

    /// Print a JSON object instead of the bare CFI
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(serde::Serialize)]
struct Output<'a> {
    cfi: &'a str,
    idref: &'a str,
    href: Option<&'a str>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "cfigen=debug",
        _ => "cfigen=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), String> {
    let exclusions = load_exclusions(cli)?;
    debug!(?exclusions, "exclusion policy");

    let mut epub = Epub::open(&cli.input).map_err(|e| e.to_string())?;
    let idref = match (&cli.idref, cli.spine) {
        (Some(idref), _) => idref.clone(),
        (None, Some(position)) => epub.spine().get(position).cloned().ok_or_else(|| {
            format!(
                "spine position {position} is out of range ({} items)",
                epub.spine().len()
            )
        })?,
        (None, None) => return Err("either --idref or --spine is required".to_string()),
    };

    let chapter = epub.content_document(&idref).map_err(|e| e.to_string())?;
    let generator = Generator::with_exclusions(exclusions);

    let container = match cli.spine {
        Some(position) if cli.idref.is_none() => {
            generator.package_component_at(position, epub.package())
        }
        _ => generator.package_component(&idref, epub.package()),
    }
    .map_err(|e| e.to_string())?;
    let content = content_component(cli, &generator, &chapter, &idref)?;
    let cfi = compose(&container, &content);

    if cli.json {
        let output = Output {
            cfi: &cfi,
            idref: &idref,
            href: epub.manifest_item(&idref).map(|item| item.href.as_str()),
        };
        let json = serde_json::to_string_pretty(&output).map_err(|e| e.to_string())?;
        println!("{json}");
    } else {
        println!("{cfi}");
    }

    Ok(())
}

fn content_component(
    cli: &Cli,
    generator: &Generator,
    chapter: &ArenaDom,
    idref: &str,
) -> Result<String, String> {
    // The generator requires an <html> ancestor for every target
    let is_html = chapter
        .root_element()
        .and_then(|root| chapter.element_name(root))
        .is_some_and(|name| name.as_ref() == "html");
    if !is_html {
        return Err(format!("content document {idref} has no <html> root element"));
    }

    let element = match &cli.id {
        Some(id) => chapter
            .get_by_id(id)
            .ok_or_else(|| format!("no element with id {id:?} in {idref}"))?,
        None => chapter
            .find_by_tag("body")
            .ok_or_else(|| format!("content document {idref} has no <body>"))?,
    };

    let component = match cli.char_offset {
        Some(offset) => {
            let (text, local) = chapter
                .text_position(element, offset)
                .ok_or_else(|| format!("character offset {offset} is beyond the element's text"))?;
            let text = chapter
                .node(text)
                .ok_or_else(|| "text position did not resolve to a text node".to_string())?;
            generator.character_offset_component(&text, local as i64)
        }
        None => {
            let element = chapter
                .node(element)
                .ok_or_else(|| "target is not an element".to_string())?;
            generator.element_component(element)
        }
    };
    component.map_err(|e| e.to_string())
}

fn load_exclusions(cli: &Cli) -> Result<Exclusions, String> {
    let mut exclusions = match &cli.exclusions {
        Some(path) => read_exclusions(path)?,
        None => Exclusions::new(),
    };
    exclusions.extend(Exclusions {
        classes: cli.exclude_classes.iter().cloned().collect(),
        elements: cli.exclude_tags.iter().cloned().collect(),
        ids: cli.exclude_ids.iter().cloned().collect(),
    });
    Ok(exclusions)
}

fn read_exclusions(path: &Path) -> Result<Exclusions, String> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    serde_json::from_str(&data).map_err(|e| format!("invalid exclusions in {}: {e}", path.display()))
}
