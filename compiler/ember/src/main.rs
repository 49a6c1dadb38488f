//! Ember command line.

use std::process::ExitCode;

use ember::{Engine, EngineBuilder, Error, MapContext, Value};

/// Flags shared by `eval` and `run`.
struct RunFlags {
    builder: EngineBuilder,
    defines: Vec<(String, Value)>,
    color: bool,
}

impl RunFlags {
    fn parse(args: &[String]) -> Result<(RunFlags, Vec<&str>), String> {
        let mut builder = Engine::builder();
        let mut defines = Vec::new();
        let mut color = true;
        let mut positional = Vec::new();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--strict" => builder = builder.strict(true),
                "--silent" => builder = builder.silent(true),
                "--assertions" => builder = builder.assertions(true),
                "--cancellable" => builder = builder.cancellable(true),
                "--no-cancellable" => builder = builder.cancellable(false),
                "--strict-arithmetic" => builder = builder.strict_arithmetic(true),
                "--no-color" => color = false,
                "-D" => {
                    let Some(define) = iter.next() else {
                        return Err("-D needs name=value".to_owned());
                    };
                    defines.push(parse_define(define)?);
                }
                other => {
                    if let Some(size) = other.strip_prefix("--cache=") {
                        let size = size
                            .parse()
                            .map_err(|_| format!("invalid cache size `{size}`"))?;
                        builder = builder.cache(size);
                    } else if let Some(define) = other.strip_prefix("-D") {
                        defines.push(parse_define(define)?);
                    } else if other.starts_with('-') && other.len() > 1 {
                        return Err(format!("unknown flag `{other}`"));
                    } else {
                        positional.push(other);
                    }
                }
            }
        }
        Ok((
            RunFlags {
                builder,
                defines,
                color,
            },
            positional,
        ))
    }
}

/// `name=value`; the value is read as a boolean, null, integer or float
/// when it looks like one, and as text otherwise.
fn parse_define(define: &str) -> Result<(String, Value), String> {
    let Some((name, raw)) = define.split_once('=') else {
        return Err(format!("invalid define `{define}`, expected name=value"));
    };
    let value = match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => {
            if let Ok(n) = raw.parse::<i64>() {
                Value::Int(n)
            } else if let Ok(f) = raw.parse::<f64>() {
                Value::Float(f)
            } else {
                Value::string(raw)
            }
        }
    };
    Ok((name.to_owned(), value))
}

fn execute(name: &str, source: &str, flags: RunFlags) -> ExitCode {
    let engine = flags.builder.build();
    let mut ctx = MapContext::new();
    for (var, value) in flags.defines {
        ctx = ctx.with(&var, value);
    }
    match engine.evaluate(source, &mut ctx) {
        Ok(value) => {
            println!("{value}");
            ExitCode::SUCCESS
        }
        Err(err) => report(&err, name, source, flags.color),
    }
}

fn report(err: &Error, name: &str, source: &str, color: bool) -> ExitCode {
    let mut stderr = std::io::stderr();
    if ember::render_error_to(err, name, source, &mut stderr, color).is_err() {
        eprintln!("error: {err}");
    }
    ExitCode::FAILURE
}

fn read_source(path: &str) -> Result<String, ExitCode> {
    std::fs::read_to_string(path).map_err(|e| {
        eprintln!("error: cannot read {path}: {e}");
        ExitCode::FAILURE
    })
}

fn parse_file(path: &str) -> ExitCode {
    let source = match read_source(path) {
        Ok(source) => source,
        Err(code) => return code,
    };
    match Engine::builder().cache(0).build().create_script(&source) {
        Ok(script) => {
            println!("{}", script.to_source());
            ExitCode::SUCCESS
        }
        Err(err) => report(&err, path, source.trim(), true),
    }
}

fn lex_file(path: &str) -> ExitCode {
    let source = match read_source(path) {
        Ok(source) => source,
        Err(code) => return code,
    };
    let interner = ember_ir::StringInterner::new();
    match ember_lexer::lex(&source, &interner) {
        Ok(tokens) => {
            for token in tokens.iter() {
                println!("{:>5}..{:<5} {:?}", token.span.start, token.span.end, token.kind);
            }
            ExitCode::SUCCESS
        }
        Err(err) => report(
            &Error::Parse(ember::ParseError::from(err)),
            path,
            &source,
            true,
        ),
    }
}

fn main() -> ExitCode {
    ember::init_tracing();
    let args: Vec<String> = std::env::args().collect();

    let Some(command) = args.get(1) else {
        print_usage();
        return ExitCode::FAILURE;
    };

    match command.as_str() {
        "eval" | "run" => {
            let (flags, positional) = match RunFlags::parse(&args[2..]) {
                Ok(parsed) => parsed,
                Err(msg) => {
                    eprintln!("error: {msg}");
                    return ExitCode::FAILURE;
                }
            };
            let Some(&target) = positional.first() else {
                let operand = if command == "eval" { "expr" } else { "file" };
                eprintln!("Usage: ember {command} <{operand}> [flags]");
                return ExitCode::FAILURE;
            };
            if command == "eval" {
                execute("<eval>", target.trim(), flags)
            } else {
                match read_source(target) {
                    Ok(source) => execute(target, source.trim(), flags),
                    Err(code) => code,
                }
            }
        }
        "parse" => match args.get(2) {
            Some(path) => parse_file(path),
            None => {
                eprintln!("Usage: ember parse <file>");
                ExitCode::FAILURE
            }
        },
        "lex" => match args.get(2) {
            Some(path) => lex_file(path),
            None => {
                eprintln!("Usage: ember lex <file>");
                ExitCode::FAILURE
            }
        },
        "help" | "--help" | "-h" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("Ember {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    println!("Ember expression engine");
    println!();
    println!("Usage: ember <command> [options]");
    println!();
    println!("Commands:");
    println!("  eval <expr>          Evaluate a script given on the command line");
    println!("  run <file>           Evaluate a script file");
    println!("  parse <file>         Parse and print the reconstructed source");
    println!("  lex <file>           Tokenize and print tokens");
    println!("  help                 Show this help message");
    println!("  version              Show version information");
    println!();
    println!("Evaluation options:");
    println!("  --strict             Unknown variables, properties and methods fail");
    println!("  --silent             In strict mode, log lookup failures and yield null");
    println!("  --assertions         Check `assert` statements");
    println!("  --no-cancellable     Cancellation yields null instead of failing");
    println!("  --strict-arithmetic  Null operands fail in arithmetic");
    println!("  --cache=<n>          Script cache capacity (0 disables)");
    println!("  -D name=value        Define a context variable");
    println!("  --no-color           Plain error output");
    println!();
    println!("Examples:");
    println!("  ember eval '1 + 2 * 3'");
    println!("  ember eval 'x * 2' -D x=21");
    println!("  ember run script.ember --strict --assertions");
    println!("  RUST_LOG=ember=debug ember run script.ember");
}
