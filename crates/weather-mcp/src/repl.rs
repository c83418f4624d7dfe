//! Interactive REPL for the weather MCP server.
//!
//! Launch with `weather-mcp repl`. Calls go straight to the dispatcher,
//! without JSON-RPC framing. Type `/help` for available commands.

use std::sync::Arc;

use rustyline::completion::{Completer, Pair};
use rustyline::config::CompletionType;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, ConditionalEventHandler, Config, Editor, Event, EventContext, EventHandler, Helper,
    KeyEvent, RepeatCount,
};
use serde_json::Value;

use crate::dispatch::{Dispatcher, Outcome, Request};
use crate::registry::{Arguments, CapabilityKind};
use crate::types::InitializeResult;

const COMMANDS: &[(&str, &str)] = &[
    ("/info", "Show server identity and capability counts"),
    ("/tools", "List registered tools"),
    ("/resources", "List registered resource templates"),
    ("/prompts", "List registered prompts"),
    ("/call", "Invoke a tool: /call <tool> key=value ..."),
    ("/read", "Read a resource: /read <uri>"),
    ("/prompt", "Render a prompt: /prompt <name> key=value ..."),
    ("/clear", "Clear the screen"),
    ("/help", "Show available commands"),
    ("/exit", "Quit the REPL"),
];

/// Completes commands, then capability names for the invoking commands.
struct WeatherHelper {
    tools: Vec<String>,
    prompts: Vec<String>,
}

impl Completer for WeatherHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let input = &line[..pos];

        if !input.contains(' ') {
            let matches: Vec<Pair> = COMMANDS
                .iter()
                .filter(|(cmd, _)| cmd.starts_with(input))
                .map(|(cmd, desc)| Pair {
                    display: format!("{cmd:<16} {desc}"),
                    replacement: format!("{cmd} "),
                })
                .collect();
            return Ok((0, matches));
        }

        let (cmd, rest) = input.split_once(' ').unwrap_or((input, ""));
        if rest.contains(' ') {
            return Ok((pos, Vec::new()));
        }
        let names = match cmd {
            "/call" => &self.tools,
            "/prompt" => &self.prompts,
            _ => return Ok((pos, Vec::new())),
        };
        let matches: Vec<Pair> = names
            .iter()
            .filter(|n| n.starts_with(rest))
            .map(|n| Pair {
                display: n.clone(),
                replacement: format!("{n} "),
            })
            .collect();
        Ok((input.len() - rest.len(), matches))
    }
}

impl Hinter for WeatherHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() || !line.starts_with('/') || line.contains(' ') {
            return None;
        }
        COMMANDS
            .iter()
            .find(|(cmd, _)| cmd.starts_with(line) && *cmd != line)
            .map(|(cmd, _)| cmd[line.len()..].to_string())
    }
}

impl Highlighter for WeatherHelper {}
impl Validator for WeatherHelper {}
impl Helper for WeatherHelper {}

struct TabCompleteOrAcceptHint;

impl ConditionalEventHandler for TabCompleteOrAcceptHint {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        ctx: &EventContext<'_>,
    ) -> Option<Cmd> {
        if ctx.has_hint() {
            Some(Cmd::CompleteHint)
        } else {
            Some(Cmd::Complete)
        }
    }
}

/// Run the interactive REPL. Blocks the calling thread until `/exit` or EOF.
pub fn run(dispatcher: Arc<Dispatcher>) -> anyhow::Result<()> {
    eprintln!();
    eprintln!(
        "  \x1b[32m\u{2601}\x1b[0m \x1b[1mweather-mcp v{}\x1b[0m",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!();
    eprintln!(
        "    Press \x1b[36m/\x1b[0m to browse commands, \x1b[90mTab\x1b[0m to complete, \x1b[90m/exit\x1b[0m to quit."
    );
    eprintln!();

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .completion_type(CompletionType::List)
        .completion_prompt_limit(20)
        .build();

    let registry = dispatcher.registry();
    let keys = |kind| {
        registry
            .list(kind)
            .iter()
            .map(|c| c.key().to_string())
            .collect::<Vec<_>>()
    };
    let helper = WeatherHelper {
        tools: keys(CapabilityKind::Tool),
        prompts: keys(CapabilityKind::Prompt),
    };

    let mut rl: Editor<WeatherHelper, rustyline::history::DefaultHistory> =
        Editor::with_config(config)?;
    rl.set_helper(Some(helper));
    rl.bind_sequence(
        KeyEvent::from('\t'),
        EventHandler::Conditional(Box::new(TabCompleteOrAcceptHint)),
    );

    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    let hist_path = std::path::PathBuf::from(&home).join(".weather_mcp_history");
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    let mut next_id: i64 = 1;
    let prompt = " \x1b[36mweather>\x1b[0m ";

    loop {
        match rl.readline(prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let input = line.strip_prefix('/').unwrap_or(line);
                if input.is_empty() {
                    cmd_help();
                    continue;
                }

                let (cmd, args) = input.split_once(' ').unwrap_or((input, ""));
                let args = args.trim();

                match cmd {
                    "exit" | "quit" => {
                        eprintln!("  Goodbye!");
                        break;
                    }
                    "help" | "h" | "?" => cmd_help(),
                    "clear" | "cls" => eprint!("\x1b[2J\x1b[H"),
                    "info" => cmd_info(&dispatcher),
                    "tools" => cmd_list(&dispatcher, CapabilityKind::Tool),
                    "resources" => cmd_list(&dispatcher, CapabilityKind::Resource),
                    "prompts" => cmd_list(&dispatcher, CapabilityKind::Prompt),
                    "call" | "read" | "prompt" => {
                        let kind = match cmd {
                            "call" => CapabilityKind::Tool,
                            "read" => CapabilityKind::Resource,
                            _ => CapabilityKind::Prompt,
                        };
                        cmd_invoke(&dispatcher, kind, args, next_id);
                        next_id += 1;
                    }
                    _ => {
                        eprintln!("  Unknown command '/{cmd}'. Type /help for commands.");
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("  \x1b[90m(Ctrl+C)\x1b[0m Type \x1b[1m/exit\x1b[0m to quit.");
            }
            Err(ReadlineError::Eof) => {
                eprintln!("  Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("  Error: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(&hist_path);

    Ok(())
}

fn cmd_help() {
    eprintln!();
    eprintln!("  Commands:");
    eprintln!();
    for (cmd, desc) in COMMANDS {
        eprintln!("    {cmd:<18} {desc}");
    }
    eprintln!();
    eprintln!("  Values are parsed as JSON when they can be, e.g. days=5 is a number.");
    eprintln!();
}

fn cmd_info(dispatcher: &Dispatcher) {
    let registry = dispatcher.registry();
    let init = InitializeResult::for_registry(registry);
    eprintln!();
    eprintln!(
        "  Server:    {} v{}",
        init.server_info.name, init.server_info.version
    );
    eprintln!("  Protocol:  {}", init.protocol_version);
    eprintln!("  Tools:     {}", registry.list(CapabilityKind::Tool).len());
    eprintln!("  Resources: {}", registry.list(CapabilityKind::Resource).len());
    eprintln!("  Prompts:   {}", registry.list(CapabilityKind::Prompt).len());
    eprintln!(
        "  Arguments: {}",
        if dispatcher.config().strict_arguments {
            "strict"
        } else {
            "lenient"
        }
    );
    eprintln!();
}

fn cmd_list(dispatcher: &Dispatcher, kind: CapabilityKind) {
    let entries = dispatcher.registry().list(kind);
    eprintln!();
    eprintln!("  {} {kind}(s) registered:", entries.len());
    eprintln!();
    for capability in entries {
        eprintln!("    {:<28} {}", capability.key(), capability.description());
    }
    eprintln!();
}

fn cmd_invoke(dispatcher: &Dispatcher, kind: CapabilityKind, args: &str, id: i64) {
    let mut words = args.split_whitespace();
    let Some(target) = words.next() else {
        let usage = match kind {
            CapabilityKind::Tool => "/call <tool> key=value ...",
            CapabilityKind::Resource => "/read <uri>",
            CapabilityKind::Prompt => "/prompt <name> key=value ...",
        };
        eprintln!("  Usage: {usage}");
        return;
    };

    let arguments = match parse_assignments(words) {
        Ok(arguments) => arguments,
        Err(word) => {
            eprintln!("  Expected key=value, got '{word}'");
            return;
        }
    };

    let response = dispatcher.dispatch(Request::new(id.into(), kind, target, arguments));
    match response.outcome {
        Outcome::Success(Value::String(text)) => eprintln!("  {text}"),
        Outcome::Success(value) => {
            let pretty = serde_json::to_string_pretty(&value).unwrap_or_default();
            for line in pretty.lines() {
                eprintln!("  {line}");
            }
        }
        Outcome::Error(err) => {
            eprintln!("  \x1b[31m{:?}\x1b[0m ({}): {}", err.kind, err.code, err.message);
        }
    }
}

/// Turn `key=value` words into arguments. Returns the first malformed word.
fn parse_assignments<'a>(words: impl Iterator<Item = &'a str>) -> Result<Arguments, &'a str> {
    let mut arguments = Arguments::new();
    for word in words {
        let Some((key, raw)) = word.split_once('=') else {
            return Err(word);
        };
        if key.is_empty() {
            return Err(word);
        }
        let value =
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        arguments.insert(key.to_string(), value);
    }
    Ok(arguments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignments_prefer_json_values() {
        let args = parse_assignments("city=Tokyo days=5".split_whitespace()).unwrap();
        assert_eq!(args["city"], "Tokyo");
        assert_eq!(args["days"], 5);
    }

    #[test]
    fn quoted_numbers_stay_strings() {
        let args = parse_assignments(std::iter::once("city=\"42\"")).unwrap();
        assert_eq!(args["city"], "42");
    }

    #[test]
    fn bare_word_is_rejected() {
        assert_eq!(
            parse_assignments(["city=Paris", "oops"].into_iter()),
            Err("oops")
        );
        assert_eq!(parse_assignments(std::iter::once("=x")), Err("=x"));
    }
}
