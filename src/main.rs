use std::{env, io, process};

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use loxrs::Lox;

fn main() {
    let args: Vec<String> = env::args().collect();

    match args.len() {
        1 => run_prompt(),
        2 => {
            let mut lox = Lox::new(io::stdout());
            lox.run_file(&args[1]);
        }
        _ => {
            println!("Usage: loxrs [script]");
            process::exit(64);
        }
    }
}

fn history_path() -> Option<std::path::PathBuf> {
    home::home_dir().map(|home| home.join(".loxrs_history"))
}

fn run_prompt() {
    let mut lox = Lox::new(io::stdout());
    let mut editor = DefaultEditor::new().expect("failed to initialize line editor");

    let history = history_path();
    if let Some(history) = &history {
        let _ = editor.load_history(history);
    }

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                lox.run_line(&line);
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Readline error: {err}");
                break;
            }
        }
    }

    if let Some(history) = &history {
        let _ = editor.save_history(history);
    }
}
