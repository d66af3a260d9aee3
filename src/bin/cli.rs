use chrono::NaiveDate;
use clap::Parser;
use exam_timetable::{
    AssignmentPolicy, HttpBackend, TimeRange, Timetable, TimetableConfig,
    TimetableSession, logging, save_timetable_to_csv, save_timetable_to_json,
    save_timetable_to_pdf,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "cli", about = "Build exam timetables for a course")]
struct Args {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Records API base url (overrides config and environment)
    #[arg(long)]
    base_url: Option<String>,
    /// Static bearer token for the records API
    #[arg(long)]
    token: Option<String>,
    /// Assignment policy: strict or multi
    #[arg(long)]
    policy: Option<AssignmentPolicy>,
    /// Persist the exam window on every `generate`
    #[arg(long)]
    persist: bool,
}

type Session = TimetableSession<HttpBackend>;

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
}

fn parse_date_list(s: &str) -> Option<Vec<NaiveDate>> {
    if s == "-" || s.eq_ignore_ascii_case("none") {
        return Some(Vec::new());
    }
    s.split(',')
        .filter(|p| !p.trim().is_empty())
        .map(|p| parse_date(p.trim()))
        .collect()
}

/// First `n` whitespace-separated tokens plus the untouched remainder of the line.
fn split_args(input: &str, n: usize) -> (Vec<&str>, &str) {
    let mut tokens = Vec::with_capacity(n);
    let mut rest = input.trim_start();
    while tokens.len() < n && !rest.is_empty() {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        tokens.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    (tokens, rest.trim_end())
}

fn fmt_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn print_help() {
    println!(
        "Commands:\n  help                                   Show this help\n  courses                                Reload and list courses\n  course <name...>                       Select a course and fetch its subjects\n  range <start> <end>                    Set the exam window (DD/MM/YYYY or YYYY-MM-DD)\n  holiday <date>                         Exclude a date from the window\n  dates                                  List open exam dates\n  subjects                               List subjects and their assignments\n  assign <n> <date> <start> to <end>     Give subject n one exam date (strict)\n  select <n> <d1,d2,...|-> <start> to <end>\n                                         Give subject n any open dates (multi)\n  clear <n>                              Remove the assignment of subject n\n  show                                   Preview the timetable\n  generate [persist]                     Build the timetable, optionally saving the exam window\n  export <pdf|csv|json> <path>           Write the last generated timetable\n  quit|exit                              Exit"
    );
}

fn print_courses(session: &Session) {
    if session.courses().is_empty() {
        println!("No courses available.");
        return;
    }
    println!("Courses:");
    for (idx, course) in session.courses().iter().enumerate() {
        println!("  {:>2}. {}", idx + 1, course.name);
    }
}

fn print_subjects(session: &Session) {
    let Some(book) = session.book() else {
        println!("Select a course first.");
        return;
    };
    if book.subjects().is_empty() {
        println!("No subjects for this course.");
        return;
    }
    for (idx, subject) in book.subjects().iter().enumerate() {
        let status = match book.assignment(&subject.id) {
            Some(entry) if entry.dates.is_empty() => format!("no dates, {}", entry.time),
            Some(entry) => {
                let dates = entry
                    .dates
                    .iter()
                    .map(|d| fmt_date(*d))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{dates}, {}", entry.time)
            }
            None if book.policy() == AssignmentPolicy::Strict => {
                format!("pending, default {}", fmt_date(book.default_date()))
            }
            None => "pending".to_string(),
        };
        println!("  {:>2}. {:<30} [{}]", idx + 1, subject.name, status);
    }
}

fn print_dates(session: &Session) {
    let Some(book) = session.book() else {
        println!("Select a course first.");
        return;
    };
    let slots = book.valid_dates();
    if slots.is_empty() {
        println!("No open dates in the window.");
        return;
    }
    for slot in slots {
        println!("  {slot}");
    }
}

fn report_dropped(session: &Session, dropped: &[String]) {
    for subject_id in dropped {
        let name = session
            .subjects()
            .iter()
            .find(|s| &s.id == subject_id)
            .map(|s| s.name.as_str())
            .unwrap_or(subject_id.as_str());
        println!("Assignment for {name} no longer fits and was cleared.");
    }
}

fn subject_id_at(session: &Session, index: &str) -> Result<String, String> {
    let n: usize = index
        .parse()
        .map_err(|_| format!("Invalid subject number '{index}'"))?;
    session
        .subjects()
        .get(n.wrapping_sub(1))
        .map(|s| s.id.clone())
        .ok_or_else(|| format!("No subject number {n}"))
}

fn print_table(timetable: &Timetable) {
    match timetable.render_text_table() {
        Ok(table) => println!("{table}"),
        Err(e) => println!("Error: {e}"),
    }
}

fn export(timetable: &Timetable, format: &str, path: &str) {
    let result = match format {
        "pdf" => save_timetable_to_pdf(timetable, path),
        "csv" => save_timetable_to_csv(timetable, path),
        "json" => save_timetable_to_json(timetable, path),
        other => {
            println!("Unknown export format '{other}' (pdf|csv|json)");
            return;
        }
    };
    match result {
        Ok(()) => println!("Timetable written to {path}"),
        Err(e) => println!("Export error: {e}"),
    }
}

fn main() -> ExitCode {
    logging::init_tracing();
    let args = Args::parse();

    let mut config = match TimetableConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(url) = args.base_url {
        config.backend.base_url = url;
    }
    if let Some(token) = args.token {
        config.backend.token = Some(token);
    }
    if let Some(policy) = args.policy {
        config.policy = policy;
    }
    let persist_default = args.persist || config.persist_exam_window;

    let backend = match HttpBackend::new(config.backend.clone()) {
        Ok(backend) => backend,
        Err(e) => {
            eprintln!("Backend error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let mut session = match TimetableSession::new(backend, config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Config error: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "Exam Timetable (CLI, {} policy) - type 'help' for commands\n",
        session.config().policy
    );
    session.load_courses();
    print_courses(&session);

    let mut generated: Option<Timetable> = None;
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let (head, rest) = split_args(input, 1);
        let cmd = head.first().copied().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "courses" => {
                session.load_courses();
                print_courses(&session);
            }
            "course" => {
                if rest.is_empty() {
                    println!("Usage: course <name>");
                    continue;
                }
                match session.select_course(rest) {
                    Ok(course) => {
                        let name = course.name.clone();
                        generated = None;
                        println!(
                            "Selected course {} ({} subjects).",
                            name,
                            session.subjects().len()
                        );
                        print_subjects(&session);
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            "range" => {
                let (args, _) = split_args(rest, 2);
                let dates = match args.as_slice() {
                    [start, end] => parse_date(start).zip(parse_date(end)),
                    _ => {
                        println!("Usage: range <start> <end>");
                        continue;
                    }
                };
                let Some((start, end)) = dates else {
                    println!("Invalid date (DD/MM/YYYY or YYYY-MM-DD)");
                    continue;
                };
                match session.set_window(start, end) {
                    Ok(dropped) => {
                        let open = session.calendar().count_available_days(start, end);
                        println!(
                            "Window set to {} - {} ({} open dates).",
                            fmt_date(start),
                            fmt_date(end),
                            open
                        );
                        report_dropped(&session, &dropped);
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            "holiday" => match parse_date(rest) {
                Some(date) => {
                    let dropped = session.add_holiday(date);
                    println!("Holiday {} added.", fmt_date(date));
                    report_dropped(&session, &dropped);
                }
                None => println!("Usage: holiday <date>"),
            },
            "dates" => print_dates(&session),
            "subjects" => print_subjects(&session),
            "assign" | "select" => {
                let (args, time_text) = split_args(rest, 2);
                let [index, date_arg] = args.as_slice() else {
                    if cmd == "select" {
                        println!("Usage: select <n> <d1,d2,...|-> <start> to <end>");
                    } else {
                        println!("Usage: assign <n> <date> <start> to <end>");
                    }
                    continue;
                };
                let subject_id = match subject_id_at(&session, index) {
                    Ok(id) => id,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                let dates = if cmd == "assign" {
                    parse_date(date_arg).map(|d| vec![d])
                } else {
                    parse_date_list(date_arg)
                };
                let Some(dates) = dates else {
                    println!("Invalid date (DD/MM/YYYY or YYYY-MM-DD)");
                    continue;
                };
                let time = TimeRange::parse(time_text);
                match session.assign(&subject_id, &dates, time) {
                    Ok(entry) => {
                        let dates = entry
                            .dates
                            .iter()
                            .map(|d| fmt_date(*d))
                            .collect::<Vec<_>>()
                            .join(", ");
                        println!("{}: {} {}", entry.subject_name, dates, entry.time);
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            "clear" => match subject_id_at(&session, rest) {
                Ok(subject_id) => match session.unassign(&subject_id) {
                    Ok(Some(entry)) => println!("Cleared {}.", entry.subject_name),
                    Ok(None) => println!("Nothing assigned."),
                    Err(e) => println!("Error: {e}"),
                },
                Err(e) => println!("{e}"),
            },
            "show" => match session.preview() {
                Ok(timetable) => print_table(&timetable),
                Err(e) => println!("Error: {e}"),
            },
            "generate" => {
                let persist = persist_default || rest == "persist";
                match session.generate(persist) {
                    Ok(result) => {
                        println!("Generated Timetable");
                        print_table(&result.timetable);
                        match result.saved {
                            Some(Ok(outcome)) if outcome.success => println!("Exam window saved."),
                            Some(Ok(outcome)) => println!(
                                "Exam window not saved (HTTP {}): {}",
                                outcome.status, outcome.body
                            ),
                            Some(Err(e)) => println!("Exam window not saved: {e}"),
                            None => {}
                        }
                        generated = Some(result.timetable);
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            "export" => {
                let (args, path) = split_args(rest, 1);
                let [format] = args.as_slice() else {
                    println!("Usage: export <pdf|csv|json> <path>");
                    continue;
                };
                if path.is_empty() {
                    println!("Usage: export <pdf|csv|json> <path>");
                    continue;
                }
                match &generated {
                    Some(timetable) => export(timetable, format, path),
                    None => println!("Run 'generate' first."),
                }
            }
            _ => println!("Unknown command '{cmd}'. Type 'help'."),
        }
    }
    ExitCode::SUCCESS
}
