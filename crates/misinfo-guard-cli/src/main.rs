use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use misinfo_guard_core::{
    client::parse_timeout, dispatch, report::markdown_to_plain, report::REPORT_WIDTH,
    ClientSettings, FormView, HttpRequestClient, Lang, Panel, PresentationShell, QuizOption,
    QuizView, ReportDocument, ReturnLevel, ShellView, Strings, Tab, Transition, Viewport,
};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "misinfo-guard",
    author,
    version,
    about = "Misinformation risk checker"
)]
struct Cli {
    /// Settings file (TOML, YAML or JSON) with `endpoint`, `timeout` and `lang`
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Base URL of the risk engine (overrides config and MISINFO_GUARD_ENDPOINT)
    #[arg(long, value_name = "URL", global = true)]
    endpoint: Option<String>,

    /// Request timeout, e.g. `30s` (overrides config and MISINFO_GUARD_TIMEOUT)
    #[arg(long, value_name = "DURATION", global = true)]
    timeout: Option<String>,

    /// Language for labels and analysis (en, hi)
    #[arg(long, global = true)]
    lang: Option<Lang>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check one message or link and print the report
    Check {
        /// Text to check; read from stdin when omitted
        text: Option<String>,
        /// Answer the lesson quiz (1 or 2) and show the feedback
        #[arg(long)]
        answer: Option<QuizOption>,
        /// Tab to show after the check completes (results, teach-me)
        #[arg(long)]
        tab: Option<Tab>,
        /// Export the report as misinfo-report.pdf into this directory
        #[arg(long, value_name = "DIR")]
        export: Option<PathBuf>,
        /// Emit the view as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
        /// Ask the engine for a simple verdict without evidence lookup
        #[arg(long)]
        simple: bool,
    },
    /// Interactive session reading submissions and `:commands` from stdin
    Session,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    endpoint: Option<String>,
    timeout: Option<String>,
    lang: Option<Lang>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let (settings, lang) = resolve_settings(&cli)?;
    match cli.command {
        Commands::Check {
            text,
            answer,
            tab,
            export,
            json,
            simple,
        } => {
            let options = CheckOptions {
                answer,
                tab,
                export,
                json,
                simple,
            };
            run_check(&settings, lang, text, options).await
        }
        Commands::Session => run_session(&settings, lang).await,
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    config::Config::builder()
        .add_source(config::File::from(path))
        .build()
        .with_context(|| format!("failed to read config file {}", path.display()))?
        .try_deserialize()
        .with_context(|| format!("invalid config file {}", path.display()))
}

/// Layer settings: defaults < config file < environment < flags.
fn resolve_settings(cli: &Cli) -> Result<(ClientSettings, Lang)> {
    let file = match &cli.config {
        Some(path) => load_file_config(path)?,
        None => FileConfig::default(),
    };

    let mut settings = ClientSettings::default();
    if let Some(endpoint) = file.endpoint.filter(|v| !v.trim().is_empty()) {
        settings.endpoint = endpoint;
    }
    if let Some(timeout) = &file.timeout {
        settings.timeout = parse_timeout(timeout).context("invalid `timeout` in config file")?;
    }
    let mut settings = settings.overlay_env()?;
    if let Some(endpoint) = &cli.endpoint {
        settings.endpoint = endpoint.clone();
    }
    if let Some(timeout) = &cli.timeout {
        settings.timeout = parse_timeout(timeout).context("invalid --timeout")?;
    }
    let lang = cli.lang.or(file.lang).unwrap_or_default();
    debug!(endpoint = %settings.endpoint, timeout = ?settings.timeout, %lang, "settings resolved");
    Ok((settings, lang))
}

struct CheckOptions {
    answer: Option<QuizOption>,
    tab: Option<Tab>,
    export: Option<PathBuf>,
    json: bool,
    simple: bool,
}

async fn run_check(
    settings: &ClientSettings,
    lang: Lang,
    text: Option<String>,
    options: CheckOptions,
) -> Result<ExitCode> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("failed to read text from stdin")?;
            buf
        }
    };

    let client = HttpRequestClient::new(settings)?;
    let mut shell = PresentationShell::new(lang);
    if options.simple {
        shell.set_return_level(Some(ReturnLevel::Simple));
    }
    let submission = match shell.submit(&text) {
        Ok(submission) => submission,
        Err(err) => {
            eprintln!("{}", err.message.red());
            return Ok(ExitCode::from(2));
        }
    };
    info!(endpoint = client.url(), ticket = %submission.ticket, "submitting check");
    let transition = shell.complete(dispatch(&client, submission).await);

    if let Some(answer) = options.answer {
        shell.select_tab(Tab::TeachMe);
        shell.select_answer(answer);
        shell.submit_quiz();
    }
    if let Some(tab) = options.tab {
        shell.select_tab(tab);
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&JsonView::from(shell.view()))?);
    } else {
        print_view(&shell.view(), lang.strings());
    }

    if transition == Transition::Failed {
        return Ok(ExitCode::FAILURE);
    }
    if let Some(dir) = options.export {
        match shell.export_report(&dir, Viewport::default()) {
            Ok(path) => eprintln!("{}: {}", lang.strings().share_report, path.display()),
            Err(err) => {
                eprintln!("{}", err.message.red());
                return Ok(ExitCode::from(3));
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[derive(Debug, PartialEq)]
enum SessionCommand {
    Submit(String),
    Lang(Lang),
    Tab(Tab),
    Answer(QuizOption),
    Simple(bool),
    Quiz,
    Export(PathBuf),
    Show,
    Help,
    Quit,
}

fn parse_session_command(line: &str) -> Result<Option<SessionCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(Some(SessionCommand::Submit(line.to_string())));
    };
    let (name, arg) = rest
        .split_once(char::is_whitespace)
        .map(|(name, arg)| (name, arg.trim()))
        .unwrap_or((rest, ""));
    let command = match name {
        "lang" => SessionCommand::Lang(arg.parse()?),
        "tab" => SessionCommand::Tab(arg.parse()?),
        "answer" => SessionCommand::Answer(arg.parse()?),
        "simple" => SessionCommand::Simple(match arg {
            "on" => true,
            "off" => false,
            other => anyhow::bail!("expected `:simple on` or `:simple off`, got `{other}`"),
        }),
        "quiz" => SessionCommand::Quiz,
        "export" if arg.is_empty() => SessionCommand::Export(PathBuf::from(".")),
        "export" => SessionCommand::Export(PathBuf::from(arg)),
        "show" => SessionCommand::Show,
        "help" => SessionCommand::Help,
        "quit" | "q" => SessionCommand::Quit,
        other => anyhow::bail!("unknown command `:{other}` (try :help)"),
    };
    Ok(Some(command))
}

const SESSION_HELP: &str = "\
Type text to check it. Commands:
  :lang en|hi      switch language
  :tab results|teach-me
  :answer 1|2      select a quiz answer
  :quiz            submit the quiz answer
  :simple on|off   request simple verdicts without evidence
  :export [DIR]    save misinfo-report.pdf
  :show            print the current view
  :quit";

async fn run_session(settings: &ClientSettings, lang: Lang) -> Result<ExitCode> {
    let client = Arc::new(HttpRequestClient::new(settings)?);
    let mut shell = PresentationShell::new(lang);
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut in_flight = 0usize;

    println!("{}", shell.lang().strings().app_title.bold());
    while stdin_open || in_flight > 0 {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line.context("failed to read stdin")? else {
                    stdin_open = false;
                    continue;
                };
                let command = match parse_session_command(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(err) => {
                        eprintln!("{}", err.to_string().red());
                        continue;
                    }
                };
                let strings = shell.lang().strings();
                match command {
                    SessionCommand::Submit(text) => match shell.submit(&text) {
                        Ok(submission) => {
                            let client = Arc::clone(&client);
                            let done_tx = done_tx.clone();
                            tokio::spawn(async move {
                                let completion = dispatch(client.as_ref(), submission).await;
                                let _ = done_tx.send(completion);
                            });
                            in_flight += 1;
                            println!("{}", strings.loading);
                        }
                        Err(err) => eprintln!("{}", err.message.red()),
                    },
                    SessionCommand::Lang(lang) => shell.set_lang(lang),
                    SessionCommand::Tab(tab) => {
                        shell.select_tab(tab);
                        print_view(&shell.view(), strings);
                    }
                    SessionCommand::Answer(option) => shell.select_answer(option),
                    SessionCommand::Simple(on) => {
                        shell.set_return_level(on.then_some(ReturnLevel::Simple));
                    }
                    SessionCommand::Quiz => {
                        let feedback = shell.submit_quiz();
                        print_feedback(feedback.correct, &feedback.message);
                    }
                    SessionCommand::Export(dir) => {
                        match shell.export_report(&dir, Viewport::default()) {
                            Ok(path) => println!("{}: {}", strings.share_report, path.display()),
                            Err(err) => eprintln!("{}", err.message.red()),
                        }
                    }
                    SessionCommand::Show => print_view(&shell.view(), strings),
                    SessionCommand::Help => println!("{SESSION_HELP}"),
                    SessionCommand::Quit => break,
                }
            }
            Some(completion) = done_rx.recv(), if in_flight > 0 => {
                in_flight -= 1;
                match shell.complete(completion) {
                    Transition::Stale => debug!("ignored superseded response"),
                    Transition::Succeeded | Transition::Failed => {
                        print_view(&shell.view(), shell.lang().strings());
                    }
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_view(view: &ShellView<'_>, strings: &Strings) {
    print_form(&view.form, strings);
    let (results, teach_me) = match view.active_tab {
        Tab::Results => (format!("[{}]", strings.results), strings.teach_me.to_string()),
        Tab::TeachMe => (strings.results.to_string(), format!("[{}]", strings.teach_me)),
    };
    println!("{results} | {teach_me}");
    match &view.panel {
        Panel::Results(Some(report)) => print_report(report),
        Panel::Results(None) => {}
        Panel::TeachMe(quiz) => print_quiz(quiz),
    }
}

fn print_form(form: &FormView, strings: &Strings) {
    if form.loading {
        println!("{}", strings.loading);
    }
    if let Some(error) = &form.error {
        eprintln!("{}", error.red());
    }
}

fn print_report(report: &ReportDocument) {
    for (idx, line) in report.lines(REPORT_WIDTH).iter().enumerate() {
        if idx == 0 && report.high_risk {
            println!("{}", line.red().bold());
        } else {
            println!("{line}");
        }
    }
}

fn print_quiz(quiz: &QuizView<'_>) {
    if let Some(lesson) = quiz.lesson_md {
        for line in markdown_to_plain(lesson) {
            println!("{line}");
        }
        println!();
    }
    println!("{}", quiz.question.bold());
    for (option, label) in quiz.options {
        let mark = if quiz.selected == Some(option) { "x" } else { " " };
        println!("  ({mark}) {option}. {label}");
    }
    if let Some(feedback) = quiz.feedback {
        print_feedback(feedback.correct, &feedback.message);
    }
}

fn print_feedback(correct: bool, message: &str) {
    if correct {
        println!("{}", message.green());
    } else {
        println!("{}", message.yellow());
    }
}

#[derive(Serialize)]
struct JsonView<'a> {
    tab: Tab,
    form: FormView,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<ReportDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quiz: Option<QuizView<'a>>,
}

impl<'a> From<ShellView<'a>> for JsonView<'a> {
    fn from(view: ShellView<'a>) -> Self {
        let (report, quiz) = match view.panel {
            Panel::Results(report) => (report, None),
            Panel::TeachMe(quiz) => (None, Some(quiz)),
        };
        Self {
            tab: view.active_tab,
            form: view.form,
            report,
            quiz,
        }
    }
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,tokio=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
