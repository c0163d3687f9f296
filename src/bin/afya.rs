use chrono::Local;
use clap::{App, AppSettings, Arg, ArgMatches};
use log::{info, warn};
use std::io::{self, BufRead, Write};
use std::time::Duration;

use afya::app::{AppState, View};
use afya::assistant::format_timestamp;
use afya::config::AppOptions;
use afya::conversation::{MessageRole, TurnOutcome, SUGGESTIONS};
use afya::emergency;
use afya::error::{Error, Result};
use afya::profile::{DiabetesType, Gender, ProfileDraft};
use afya::speech::{
    CommandRecognizer, CommandSynthesizer, LogSynthesizer, SpeechInput, SpeechOutput,
    SpeechRecognizer, SpeechSynthesizer,
};
use afya::vitals::ReadingContext;
use afya::Afya;

fn cli() -> App<'static> {
    App::new("afya")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Diabetes companion: glucose log, meal diary and a health assistant")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .takes_value(true)
                .global(true)
                .help("Directory holding the saved profile, vitals and meals"),
        )
        .arg(
            Arg::new("model")
                .long("model")
                .value_name("NAME")
                .takes_value(true)
                .global(true)
                .help("Generative model name"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECONDS")
                .takes_value(true)
                .global(true)
                .help("Assistant request timeout, 0 to disable"),
        )
        .arg(
            Arg::new("mute")
                .long("mute")
                .global(true)
                .help("Do not speak replies"),
        )
        .subcommand(App::new("dashboard").about("Show today's summary"))
        .subcommand(
            App::new("log")
                .about("Record a blood sugar reading")
                .arg(Arg::new("glucose").required(true).help("Level in mg/dL"))
                .arg(
                    Arg::new("context")
                        .short('c')
                        .long("context")
                        .takes_value(true)
                        .default_value("random")
                        .help("fasting, post-meal or random"),
                )
                .arg(
                    Arg::new("note")
                        .short('n')
                        .long("note")
                        .takes_value(true)
                        .help("Optional note"),
                ),
        )
        .subcommand(App::new("meals").about("List the meal diary"))
        .subcommand(
            App::new("meal")
                .about("Estimate a meal and log it")
                .arg(Arg::new("description").required(true).multiple_values(true))
                .arg(
                    Arg::new("yes")
                        .short('y')
                        .long("yes")
                        .help("Log the estimate without asking"),
                ),
        )
        .subcommand(
            App::new("chat")
                .about("Talk to AFYA; starts an interactive session without a message")
                .arg(Arg::new("message").multiple_values(true)),
        )
        .subcommand(
            App::new("profile")
                .about("Show or edit the profile")
                .subcommand(App::new("show"))
                .subcommand(
                    App::new("set")
                        .arg(Arg::new("name").long("name").takes_value(true))
                        .arg(Arg::new("age").long("age").takes_value(true))
                        .arg(Arg::new("gender").long("gender").takes_value(true))
                        .arg(Arg::new("weight").long("weight").takes_value(true))
                        .arg(Arg::new("height").long("height").takes_value(true))
                        .arg(Arg::new("type").long("type").takes_value(true))
                        .arg(Arg::new("contact-name").long("contact-name").takes_value(true))
                        .arg(Arg::new("contact-phone").long("contact-phone").takes_value(true)),
                )
                .subcommand(App::new("add-med").arg(Arg::new("medication").required(true)))
                .subcommand(
                    App::new("remove-med").arg(
                        Arg::new("index")
                            .required(true)
                            .help("Position in the list, starting at 1"),
                    ),
                ),
        )
        .subcommand(App::new("sos").about("Emergency help and medical ID"))
}

fn options_from(matches: &ArgMatches) -> Result<AppOptions> {
    let mut options = AppOptions::default().with_voice_enabled(!matches.is_present("mute"));
    if let Some(dir) = matches.value_of("data-dir") {
        options = options.with_data_dir(dir);
    }
    if let Some(model) = matches.value_of("model") {
        options = options.with_model(model);
    }
    if let Some(timeout) = matches.value_of("timeout") {
        let secs: u64 = timeout
            .parse()
            .map_err(|_| Error::validation(format!("invalid timeout: {}", timeout)))?;
        options = options.with_request_timeout((secs > 0).then(|| Duration::from_secs(secs)));
    }
    Ok(options)
}

fn speech_from_env(voice_enabled: bool) -> (SpeechOutput, SpeechInput) {
    let synthesizer: Box<dyn SpeechSynthesizer> = match std::env::var("AFYA_TTS_COMMAND")
        .ok()
        .and_then(|c| CommandSynthesizer::from_command_line(&c))
    {
        Some(command) => Box::new(command),
        None => Box::new(LogSynthesizer),
    };
    let recognizer = std::env::var("AFYA_STT_COMMAND")
        .ok()
        .and_then(|c| CommandRecognizer::from_command_line(&c));
    (
        SpeechOutput::new(synthesizer, voice_enabled),
        SpeechInput::new(recognizer.map(|r| Box::new(r) as Box<dyn SpeechRecognizer>)),
    )
}

fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn print_outcome(outcome: &TurnOutcome) {
    match outcome.reply() {
        Some(reply) => println!("AFYA: {}\n", reply.text),
        None => println!("(no reply)\n"),
    }
}

async fn chat(state: &mut AppState, matches: &ArgMatches) -> Result<()> {
    state.navigate(View::Chat);
    if let Some(words) = matches.values_of("message") {
        let message = words.collect::<Vec<_>>().join(" ");
        let outcome = state.send_message(&message).await?;
        print_outcome(&outcome);
        return Ok(());
    }

    for message in state.conversation().transcript() {
        if message.role == MessageRole::Model {
            println!("AFYA: {}\n", message.text);
        }
    }
    println!("Suggestions:");
    for (i, suggestion) in SUGGESTIONS.iter().enumerate() {
        println!("  {}. {}", i + 1, suggestion);
    }
    println!("Commands: /listen, /voice on|off, /quit\n");

    while let Some(line) = read_line("You: ")? {
        let text = match line.as_str() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/voice on" => {
                state.set_voice_enabled(true);
                continue;
            }
            "/voice off" => {
                state.set_voice_enabled(false);
                continue;
            }
            "/listen" => {
                match state.send_voice_message().await {
                    Ok(Some(outcome)) => print_outcome(&outcome),
                    Ok(None) => println!("(nothing heard)\n"),
                    Err(e) => println!("{}\n", e),
                }
                continue;
            }
            other => match other.parse::<usize>() {
                Ok(n) if (1..=SUGGESTIONS.len()).contains(&n) => SUGGESTIONS[n - 1].to_string(),
                _ => other.to_string(),
            },
        };
        match state.send_message(&text).await {
            Ok(outcome) => print_outcome(&outcome),
            Err(e) => println!("{}\n", e),
        }
    }
    Ok(())
}

async fn meal(state: &mut AppState, matches: &ArgMatches) -> Result<()> {
    state.navigate(View::Nutrition);
    let description = matches
        .values_of("description")
        .map(|v| v.collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    let pending = match state.analyze_meal(&description).await? {
        Some(pending) => pending,
        None => {
            println!("Could not analyze this meal right now. Nothing was logged.");
            return Ok(());
        }
    };
    let analysis = &pending.analysis;
    println!("{}", pending.description);
    println!("  Calories:      {} kcal", analysis.calories);
    println!("  Carbs:         {} g", analysis.carbs);
    println!("  Glycemic load: {}", analysis.glycemic_index);
    println!("  {}", analysis.advice);

    let confirmed = matches.is_present("yes")
        || matches!(read_line("Log this meal? [y/N] ")?.as_deref(), Some("y") | Some("Y"));
    if confirmed {
        if let Some(meal) = state.confirm_meal()? {
            info!("logged meal {}", meal.id);
            println!("Logged.");
        }
    } else {
        state.discard_meal();
    }
    Ok(())
}

fn list_meals(state: &AppState) {
    if state.meals().is_empty() {
        println!("No meals logged yet.");
    }
    for meal in state.meals().newest_first() {
        print!("{}  {}", format_timestamp(&meal.timestamp), meal.description);
        if let (Some(calories), Some(carbs)) = (meal.calories, meal.carbs) {
            print!("  ({} kcal, {} g carbs)", calories, carbs);
        }
        if let Some(gi) = meal.glycemic_index {
            print!("  [{} GI]", gi);
        }
        println!();
    }
}

fn show_profile(state: &AppState) {
    let p = state.profile();
    println!("Name:        {}", p.name);
    println!("Age:         {}", p.age);
    println!("Gender:      {}", p.gender);
    println!("Weight:      {} kg", p.weight);
    println!("Height:      {} cm", p.height);
    println!("Condition:   {}", p.diabetes_type);
    println!("Medications:");
    for (i, med) in p.medications.iter().enumerate() {
        println!("  {}. {}", i + 1, med);
    }
    println!(
        "Emergency:   {} {}",
        p.emergency_contact_name, p.emergency_contact_phone
    );
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::validation(format!("invalid {}: {}", field, value)))
}

fn edit_profile(draft: &mut ProfileDraft, matches: &ArgMatches) -> Result<()> {
    if let Some(name) = matches.value_of("name") {
        draft.set_name(name)?;
    }
    if let Some(age) = matches.value_of("age") {
        draft.set_age(parse_number("age", age)?)?;
    }
    if let Some(gender) = matches.value_of("gender") {
        let gender = Gender::parse(gender)
            .ok_or_else(|| Error::validation(format!("unknown gender: {}", gender)))?;
        draft.set_gender(gender);
    }
    if let Some(weight) = matches.value_of("weight") {
        draft.set_weight(parse_number("weight", weight)?)?;
    }
    if let Some(height) = matches.value_of("height") {
        draft.set_height(parse_number("height", height)?)?;
    }
    if let Some(kind) = matches.value_of("type") {
        let kind = DiabetesType::parse(kind)
            .ok_or_else(|| Error::validation(format!("unknown diabetes type: {}", kind)))?;
        draft.set_diabetes_type(kind);
    }
    if matches.is_present("contact-name") || matches.is_present("contact-phone") {
        let current = draft.profile().clone();
        draft.set_emergency_contact(
            matches
                .value_of("contact-name")
                .unwrap_or(&current.emergency_contact_name),
            matches
                .value_of("contact-phone")
                .unwrap_or(&current.emergency_contact_phone),
        );
    }
    Ok(())
}

fn profile(state: &mut AppState, matches: &ArgMatches) -> Result<()> {
    state.navigate(View::Profile);
    let mut draft = state.edit_profile();
    match matches.subcommand() {
        None | Some(("show", _)) => {
            show_profile(state);
            return Ok(());
        }
        Some(("set", sub)) => edit_profile(&mut draft, sub)?,
        Some(("add-med", sub)) => {
            let medication = sub.value_of("medication").unwrap_or_default();
            if !draft.add_medication(medication) {
                return Err(Error::validation("medication name cannot be empty"));
            }
        }
        Some(("remove-med", sub)) => {
            let index: usize = parse_number("index", sub.value_of("index").unwrap_or_default())?;
            if index == 0 || draft.remove_medication(index - 1).is_none() {
                warn!("no medication at position {}", index);
            }
        }
        Some((other, _)) => return Err(Error::general(format!("unknown command: {}", other))),
    }
    state.save_profile(draft)?;
    show_profile(state);
    Ok(())
}

fn sos(state: &mut AppState, muted: bool) -> Result<()> {
    println!("{}", emergency::render(state.profile()));
    state.enter_emergency(muted);
    let mut muted = muted;
    loop {
        let hint = if muted { "unmute" } else { "mute" };
        match read_line(&format!("[m] {} guidance, [enter] close: ", hint))?.as_deref() {
            Some("m") => {
                muted = !muted;
                state.set_emergency_muted(muted)?;
            }
            _ => break,
        }
    }
    state.exit_emergency();
    Ok(())
}

async fn run(matches: ArgMatches) -> Result<()> {
    let options = options_from(&matches)?;
    let afya = match Afya::from_env(options.clone()) {
        Ok(afya) => afya,
        Err(e) => {
            warn!("{}; the assistant will be unavailable", e);
            Afya::new_with_options("", options)
        }
    };
    let (speech_out, speech_in) = speech_from_env(afya.options.voice_enabled);
    let mut state = afya.open(speech_out, speech_in)?;

    match matches.subcommand() {
        Some(("dashboard", _)) => {
            print!("{}", state.dashboard(Local::now()).render(state.profile()));
        }
        Some(("log", sub)) => {
            let context = sub.value_of("context").unwrap_or_default();
            let context = ReadingContext::parse(context)
                .ok_or_else(|| Error::validation(format!("unknown context: {}", context)))?;
            let entry = state.log_vital(
                sub.value_of("glucose").unwrap_or_default(),
                context,
                sub.value_of("note").unwrap_or_default(),
            )?;
            println!(
                "Logged {} mg/dL ({}) [{}]",
                entry.blood_sugar,
                entry.context,
                entry.status()
            );
        }
        Some(("meals", _)) => list_meals(&state),
        Some(("meal", sub)) => meal(&mut state, sub).await?,
        Some(("chat", sub)) => chat(&mut state, sub).await?,
        Some(("profile", sub)) => profile(&mut state, sub)?,
        Some(("sos", _)) => sos(&mut state, matches.is_present("mute"))?,
        _ => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    pretty_env_logger::init();

    if let Err(e) = run(cli().get_matches()).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
