//! Interactive terminal front end: asks for a spreadsheet link, a sheet and
//! one column per timetable field, then writes `cleaned_timetable.xlsx`.
use anyhow::Result;
use rusty_timetable::config::Config;
use rusty_timetable::pipeline::{user_message, Session};
use rusty_timetable::table::{ColumnMapping, Row, SemanticKey, Table};
use std::io::{self, BufRead, Write};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    let config = Config::default();
    let preview_rows = config.preview_rows;
    let mut session = Session::new(config);
    let stdin = io::stdin();
    let mut input = stdin.lock();

    println!("Substitute Teacher Timetable Generator");
    loop {
        let Some(locator) = ask(&mut input, "Paste your spreadsheet URL or path (empty to quit): ")? else {
            return Ok(());
        };
        if locator.is_empty() {
            return Ok(());
        }
        if !run(&mut session, &mut input, &locator, preview_rows)? {
            return Ok(());
        }
    }
}

/// One submission. Returns `Ok(false)` when input ended.
fn run(session: &mut Session, input: &mut impl BufRead, locator: &str, preview_rows: usize) -> Result<bool> {
    let sheet_names = match session.probe(locator) {
        Ok(sheet_names) => sheet_names.to_vec(),
        Err(error) => {
            eprintln!("{}", user_message(&error));
            return Ok(true);
        }
    };

    let sheet_name = if sheet_names.len() > 1 {
        println!("Multiple sheets found:");
        match choose(input, "Select one to load", &sheet_names)? {
            Some(index) => sheet_names[index].to_owned(),
            None => return Ok(false),
        }
    } else {
        sheet_names.first().cloned().unwrap_or_default()
    };

    let table = match session.load(Some(sheet_name.as_str())) {
        Ok(table) => table.clone(),
        Err(error) => {
            eprintln!("{}", user_message(&error));
            return Ok(true);
        }
    };
    println!("Data loaded successfully from sheet: {sheet_name}");
    print_table(&table, Some(preview_rows));
    if table.header().is_empty() {
        println!("The sheet has no data.");
        return Ok(true);
    }

    let mut mapping = ColumnMapping::new();
    for key in SemanticKey::ALL {
        println!("Select column for: {}", key.prompt());
        match choose(input, &format!("Which column represents {}?", key.prompt()), table.header())? {
            Some(index) => mapping.assign(key, table.header()[index].to_owned()),
            None => return Ok(false),
        };
    }
    if !mapping.is_complete() {
        eprintln!("Column selection incomplete: {:?}", mapping.missing());
        return Ok(true);
    }

    match session.submit(&mapping) {
        Ok(cleaned) => {
            println!("Final Extracted Data");
            print_table(&cleaned.table, None);
            match cleaned.write_to(".") {
                Ok(path) => {
                    info!(path = %path.display(), "saved");
                    println!("Saved {} ({})", path.display(), cleaned.mime_type());
                }
                Err(error) => eprintln!("{}", user_message(&error)),
            }
        }
        Err(error) => eprintln!("{}", user_message(&error)),
    }
    Ok(true)
}

/// Prints `prompt` and reads one trimmed line; `None` at end of input.
fn ask(input: &mut impl BufRead, prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_owned()))
}

/// Lists `options` and reads a 1-based choice until a valid one is given.
fn choose(input: &mut impl BufRead, prompt: &str, options: &[String]) -> Result<Option<usize>> {
    for (index, option) in options.iter().enumerate() {
        println!("  {}) {}", index + 1, option);
    }
    loop {
        let Some(answer) = ask(input, &format!("{prompt} [1-{}]: ", options.len()))? else {
            return Ok(None);
        };
        match answer.parse::<usize>() {
            Ok(choice) if (1..=options.len()).contains(&choice) => return Ok(Some(choice - 1)),
            _ => match options.iter().position(|option| *option == answer) {
                Some(index) => return Ok(Some(index)),
                None => println!("Please enter a number between 1 and {}.", options.len()),
            },
        }
    }
}

fn print_table(table: &Table, limit: Option<usize>) {
    let rows: &[Row] = match limit {
        Some(limit) => table.head(limit),
        None => table.rows(),
    };
    println!("{}", table.header().join("\t"));
    for row in rows {
        let cells = row.iter().map(ToString::to_string).collect::<Vec<_>>();
        println!("{}", cells.join("\t"));
    }
    if rows.len() < table.grid().height() {
        println!("... {} rows in total", table.grid().height());
    }
}
