use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use nextkey::config::Config;
use nextkey::engine::WordOutcome;
use nextkey::session::typing::{is_word_separator, last_word};
use nextkey::session::{Highlight, TypingSession};
use nextkey::store::WordStore;
use nextkey::store::json_store::JsonStore;

#[derive(Parser)]
#[command(name = "nextkey", version, about = "Personalized next-letter prediction")]
struct Cli {
    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase log verbosity")]
    verbose: u8,

    #[arg(long, help = "Data directory (overrides the config file)")]
    data_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the next-letter distribution after typing a prefix
    Predict { prefix: String },
    /// Feed text through a typing session and save what was learned
    Type { text: String },
    /// Add a word to the vocabulary without typing it
    Learn { word: String },
    /// Always offer LETTER after CONTEXT, whatever the statistics say
    Force {
        /// Prefix typed so far; empty for the start of a word
        context: String,
        letter: char,
    },
    /// Summarize the stored vocabulary and aggressiveness
    Stats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    let mut config = Config::load()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    config.validate();

    let store = JsonStore::with_base_dir(config.data_path())
        .with_context(|| format!("cannot open data directory {}", config.data_dir))?;
    let mut session = TypingSession::open(store, &config)?;

    match cli.command {
        Command::Predict { prefix } => {
            for ch in prefix.chars() {
                session.letter(ch);
            }
            print_predictions(&session);
        }
        Command::Type { text } => {
            let mut typed = String::new();
            for ch in text.chars() {
                if is_word_separator(ch) {
                    report(session.word_separator(last_word(&typed))?, last_word(&typed));
                } else {
                    session.letter(ch);
                }
                typed.push(ch);
            }
            if !session.engine().composing().is_empty() {
                report(session.word_separator(last_word(&typed))?, last_word(&typed));
            }
            let summary = session.close()?;
            println!(
                "saved {} words, pruned {}",
                summary.words_saved, summary.words_pruned
            );
        }
        Command::Learn { word } => {
            session.learn(&word)?;
            session.close()?;
            println!("learned '{}'", word.to_lowercase());
        }
        Command::Force { context, letter } => {
            let store = session.store();
            let mut sublanguage = store.load_sublanguage()?;
            if !sublanguage.mark(&context, letter) {
                bail!("'{letter}' is not a letter a-z");
            }
            store.save_sublanguage(&sublanguage)?;
            println!("'{letter}' now always follows '{}'", context.to_lowercase());
        }
        Command::Stats => {
            let engine = session.engine();
            let controller = session.controller();
            println!("vocabulary:      {}", engine.vocabulary_size());
            println!("trained words:   {}", engine.total_trained_words());
            println!("usage ratio:     {:.2}", engine.usage_ratio());
            println!("candidate set:   {}", controller.candidate_set_size());
            println!("success streak:  {}", controller.consecutive_successes());
        }
    }

    Ok(())
}

fn report(outcome: WordOutcome, word: &str) {
    match outcome {
        WordOutcome::Learned => println!("new word: {word}"),
        WordOutcome::Skipped => println!("skipped: {word}"),
        WordOutcome::Trained | WordOutcome::Empty => {}
    }
}

fn print_predictions(session: &TypingSession<JsonStore>) {
    let engine = session.engine();
    let mut predictions: Vec<(char, f64)> = engine
        .predict_next_letters()
        .into_iter()
        .filter(|&(_, p)| p > 0.0)
        .collect();
    if predictions.is_empty() {
        println!("no prediction for '{}'", engine.composing());
        return;
    }
    predictions.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    for (letter, probability) in predictions {
        println!("{letter}  {probability:.2}");
    }
    if let Highlight::Probable(letters) = session.highlight() {
        let letters: String = letters.into_iter().collect();
        println!("probable (k = {}): {letters}", session.controller().candidate_set_size());
    }
}
