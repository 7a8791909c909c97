use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use log::{debug, error};
use thompson_nfa_regex_transformer::{parse, Builder, SyntaxError};
use thompson_nfa_util::EPSILON_INPUT;

/// Compile a regular expression over a-z into a Thompson NFA.
///
/// Operators: `+` union, juxtaposition for concatenation, `*` zero or more,
/// `!` three or more, parentheses for grouping.
#[derive(Parser, Debug)]
#[command(name = "thompson_nfa", version)]
struct Cli {
    /// Expression to compile; read from standard input when omitted
    expression: Option<String>,

    /// Word to run through the automaton, may be repeated
    #[arg(short, long = "check", value_name = "WORD")]
    check: Vec<String>,

    /// Id given to the first state created
    #[arg(long, env = "THOMPSON_NFA_START_ID", default_value_t = 0)]
    start_id: usize,
}

fn read_expression() -> io::Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "expression (a-z, {EPSILON_INPUT}, + * ! ( )): ")?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Blanks out everything before `position`, keeping tabs so the caret lines up.
fn caret_padding(expression: &str, position: usize) -> String {
    expression
        .chars()
        .take(position)
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect()
}

fn report(expression: &str, e: &SyntaxError) {
    eprintln!("error: {e}");
    eprintln!("  {expression}");
    eprintln!("  {}^", caret_padding(expression, e.position()));
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let expression = match cli.expression {
        Some(e) => e,
        None => match read_expression() {
            Ok(e) => e,
            Err(e) => {
                error!("could not read expression: {e}");
                return ExitCode::FAILURE;
            }
        },
    };

    let ast = match parse(&expression) {
        Ok(ast) => ast,
        Err(e) => {
            report(&expression, &e);
            return ExitCode::FAILURE;
        }
    };
    println!("ast: {ast}");

    let mut builder = Builder::starting_at(cli.start_id);
    let automaton = builder.build(&ast);
    debug!("builder continues at id {}", builder.next_id());
    print!("{automaton}");

    for word in &cli.check {
        let verdict = if automaton.accepts(word) { "accepted" } else { "rejected" };
        println!("{word:?}: {verdict}");
    }

    ExitCode::SUCCESS
}
