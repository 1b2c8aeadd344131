//! Source Editor - highlights a file and prints the attribute runs.
//!
//! Usage: source-editor FILE [--language ID] [--theme dark|light] [--config FILE]
//!                      [--edit START..END=TEXT]... [--stats]

use source_editor_core::{
    AttributeUpdate, BufferId, BuiltinGrammars, HighlightConfig, HighlightError, Language,
    SessionRegistry, TextBuffer, Theme,
};
use std::env;
use std::ops::Range;
use std::path::Path;
use std::process;
use std::thread;
use std::time::Duration;

const MAX_IDLE_STEPS: usize = 10_000;

#[derive(Debug, Default)]
struct Options {
    file: Option<String>,
    language: Option<String>,
    theme: Option<String>,
    config: Option<String>,
    edits: Vec<(Range<usize>, String)>,
    stats: bool,
}

/// Parses `START..END=TEXT`. `\n` in TEXT stands for a newline.
fn parse_edit(script: &str) -> Result<(Range<usize>, String), String> {
    let (range, text) = script
        .split_once('=')
        .ok_or_else(|| format!("edit '{}' is missing '='", script))?;
    let (start, end) = range
        .split_once("..")
        .ok_or_else(|| format!("edit range '{}' is not START..END", range))?;
    let start = start.parse().map_err(|_| format!("bad edit start '{}'", start))?;
    let end = end.parse().map_err(|_| format!("bad edit end '{}'", end))?;
    Ok((start..end, text.replace("\\n", "\n")))
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut options = Options::default();
    let mut args = args;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--language" | "-l" => options.language = Some(args.next().ok_or("--language needs a value")?),
            "--theme" | "-t" => options.theme = Some(args.next().ok_or("--theme needs a value")?),
            "--config" | "-c" => options.config = Some(args.next().ok_or("--config needs a value")?),
            "--edit" | "-e" => {
                let script = args.next().ok_or("--edit needs a value")?;
                options.edits.push(parse_edit(&script)?);
            }
            "--stats" => options.stats = true,
            flag if flag.starts_with('-') => return Err(format!("unknown option '{}'", flag)),
            _ if options.file.is_none() => options.file = Some(arg.clone()),
            _ => return Err(format!("unexpected argument '{}'", arg)),
        }
    }
    Ok(options)
}

fn print_update(update: &AttributeUpdate) {
    println!("update {}..{}", update.range.start, update.range.end);
    for run in &update.runs {
        let capture = run.capture.map_or("default", |c| c.as_str());
        let [r, g, b, _] = run.attributes.foreground;
        println!(
            "  {:>6}..{:<6} {:<28} #{:02x}{:02x}{:02x}{}{}",
            run.range.start,
            run.range.end,
            capture,
            (r * 255.0) as u8,
            (g * 255.0) as u8,
            (b * 255.0) as u8,
            if run.attributes.font.bold { " bold" } else { "" },
            if run.attributes.font.italic { " italic" } else { "" },
        );
    }
}

fn run(options: Options) -> Result<(), String> {
    let path = options.file.ok_or("no input file given")?;
    let text = std::fs::read_to_string(&path).map_err(|e| format!("failed to read '{}': {}", path, e))?;

    let config = match &options.config {
        Some(config_path) => {
            let json = std::fs::read_to_string(config_path)
                .map_err(|e| format!("failed to read '{}': {}", config_path, e))?;
            HighlightConfig::from_json_str(&json).map_err(|e| e.to_string())?
        }
        None => HighlightConfig::default(),
    };

    let theme = match options.theme.as_deref() {
        None | Some("dark") => Theme::dark(),
        Some("light") => Theme::light(),
        Some(other) => return Err(format!("unknown theme '{}'", other)),
    };

    let language_id = options
        .language
        .unwrap_or_else(|| Language::from_path(Path::new(&path)).id().to_string());

    let mut registry = SessionRegistry::new(BuiltinGrammars, config);
    let id = match registry.attach(TextBuffer::from_str(&text), &language_id, theme.clone(), print_update) {
        Ok(id) => id,
        Err(HighlightError::UnsupportedLanguage(language)) => {
            log::warn!("No grammar for '{}', showing plain text", language);
            registry
                .attach(TextBuffer::from_str(&text), Language::PlainText.id(), theme, print_update)
                .map_err(|e| e.to_string())?
        }
        Err(e) => return Err(e.to_string()),
    };

    drain(&mut registry, id)?;
    for (range, text) in &options.edits {
        println!("edit {}..{} {:?}", range.start, range.end, text);
        registry.on_edit(id, range.clone(), text).map_err(|e| e.to_string())?;
        drain(&mut registry, id)?;
    }

    if options.stats {
        if let Some(session) = registry.get(id) {
            eprintln!("{}", session.highlighter().stats().summary());
        }
    }
    registry.detach(id).map_err(|e| e.to_string())?;
    Ok(())
}

/// Runs deferred and background work until the buffer is fully highlighted.
fn drain(registry: &mut SessionRegistry, id: BufferId) -> Result<(), String> {
    for _ in 0..MAX_IDLE_STEPS {
        registry.poll();
        let more = registry.on_idle(id).map_err(|e| e.to_string())?;
        let pending = registry
            .get(id)
            .map_or(false, |session| session.highlighter().has_pending_work());
        if !more && !pending {
            break;
        }
        thread::sleep(Duration::from_millis(1));
    }
    if registry
        .get(id)
        .map_or(false, |session| session.highlighter().has_pending_work())
    {
        log::warn!("Highlighting did not finish after {} idle steps", MAX_IDLE_STEPS);
    }
    Ok(())
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = match parse_args(env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!(
                "usage: source-editor FILE [--language ID] [--theme dark|light] [--config FILE] \
                 [--edit START..END=TEXT]... [--stats]"
            );
            process::exit(2);
        }
    };

    if let Err(e) = run(options) {
        log::error!("{}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_args() {
        let options = parse_args(args(&["main.go", "--theme", "light", "--stats"])).unwrap();
        assert_eq!(options.file.as_deref(), Some("main.go"));
        assert_eq!(options.theme.as_deref(), Some("light"));
        assert!(options.stats);
        assert!(options.language.is_none());
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(args(&["--language"])).is_err());
        assert!(parse_args(args(&["a", "b"])).is_err());
        assert!(parse_args(args(&["--bogus"])).is_err());
        assert!(parse_args(args(&["a", "--edit", "3..1"])).is_err());
    }

    #[test]
    fn test_parse_edit() {
        assert_eq!(parse_edit("0..4=fn").unwrap(), (0..4, "fn".to_string()));
        assert_eq!(parse_edit("7..7=a\\nb").unwrap(), (7..7, "a\nb".to_string()));
        assert_eq!(parse_edit("2..5=").unwrap(), (2..5, String::new()));
        assert!(parse_edit("x..5=a").is_err());
        assert!(parse_edit("5=a").is_err());
    }
}
