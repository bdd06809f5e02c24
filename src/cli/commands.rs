use crate::cli::config::{AppConfig, build_flow, build_reconstructor};
use crate::driver::appium::AppiumSession;
use crate::driver::query::ElementQuery;
use crate::driver::replay::ReplayScreen;
use crate::picker::flow::{PairOutcome, PickMode, PickOutcome, PickRequest};
use crate::picker::model::{Entry, ExclusionSet};
use crate::picker::verify::SectionBounds;
use crate::trace::logger::TraceLogger;

/// Open the replay snapshot if one was given, otherwise a live Appium session.
pub fn open_session(
    snapshot: Option<&str>,
    config: &AppConfig,
) -> Result<Box<dyn ElementQuery>, Box<dyn std::error::Error>> {
    match snapshot {
        Some(path) => Ok(Box::new(ReplayScreen::load(path)?)),
        None => Ok(Box::new(AppiumSession::launch(&config.driver)?)),
    }
}

pub fn open_tracer(config: &AppConfig) -> TraceLogger {
    TraceLogger::open(config.trace.path.as_deref())
}

// ============================================================================
// reconstruct subcommand
// ============================================================================

pub fn cmd_reconstruct(
    query: &mut dyn ElementQuery,
    config: &AppConfig,
    threshold: Option<i32>,
) -> Result<Vec<Entry>, Box<dyn std::error::Error>> {
    let reconstructor = build_reconstructor(&config.picker, threshold);
    let entries = reconstructor.reconstruct(query)?;

    if entries.is_empty() {
        println!("No entries found");
    }
    for entry in &entries {
        println!("{}", format_entry(entry));
    }

    Ok(entries)
}

/// One-line rendering: `[index] label (y=..) | detail, detail`.
pub fn format_entry(entry: &Entry) -> String {
    let mut line = format!("[{}] {} (y={})", entry.index, entry.label, entry.y());
    if !entry.details.is_empty() {
        line.push_str(" | ");
        line.push_str(&entry.details.join(", "));
    }
    line
}

// ============================================================================
// select subcommand
// ============================================================================

pub struct SelectArgs {
    pub field: String,
    pub open: Option<String>,
    pub index: Option<usize>,
    pub exclude_index: Vec<usize>,
    pub exclude_name: Vec<String>,
    pub section_exit: Option<String>,
    pub seed: Option<u64>,
}

/// Run one pick and print it as JSON. Returns the outcome for the exit code.
pub fn cmd_select(
    query: &mut dyn ElementQuery,
    config: &AppConfig,
    args: SelectArgs,
    tracer: &TraceLogger,
) -> Result<PickOutcome, Box<dyn std::error::Error>> {
    let mut flow = build_flow(config, args.seed);

    let exclusions = args
        .exclude_index
        .iter()
        .fold(ExclusionSet::new(), |set, &i| set.exclude_index(i));
    let exclusions = args
        .exclude_name
        .iter()
        .fold(exclusions, |set, name| set.exclude_name(name));

    let section_exit = args
        .section_exit
        .unwrap_or_else(|| config.verify.section_exit.clone());

    let request = PickRequest {
        section: SectionBounds::new(&args.field, &section_exit),
        field_label: args.field,
        open_label: args.open,
        mode: args.index.map_or(PickMode::RandomSibling, PickMode::Index),
        exclusions,
    };

    let outcome = flow.pick(query, &request, tracer)?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(outcome)
}

// ============================================================================
// pair subcommand
// ============================================================================

pub struct PairArgs {
    pub source_field: String,
    pub source_open: Option<String>,
    pub target_field: String,
    pub target_open: Option<String>,
    pub seed: Option<u64>,
}

/// Pick a source and a distinct target. The source's read-back section ends
/// at the target field's label.
pub fn cmd_pair(
    query: &mut dyn ElementQuery,
    config: &AppConfig,
    args: PairArgs,
    tracer: &TraceLogger,
) -> Result<PairOutcome, Box<dyn std::error::Error>> {
    let mut flow = build_flow(config, args.seed);

    let source = PickRequest {
        section: SectionBounds::new(&args.source_field, &args.target_field),
        field_label: args.source_field,
        open_label: args.source_open,
        mode: PickMode::RandomSibling,
        exclusions: ExclusionSet::new(),
    };
    let target = PickRequest {
        section: SectionBounds::new(&args.target_field, &config.verify.section_exit),
        field_label: args.target_field,
        open_label: args.target_open,
        mode: PickMode::RandomSibling,
        exclusions: ExclusionSet::new(),
    };

    let outcome = flow.pick_distinct_pair(query, &source, &target, tracer)?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(outcome)
}
