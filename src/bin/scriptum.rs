use std::{path::PathBuf, process::ExitCode, rc::Rc};

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use scriptum::{
    ExecutionResult, Orchestrator, Repl, ScriptEngine, ScriptumConfig, ScriptumError,
    config::CONFIG_FILE_NAME,
    engine::{ListingEngine, ProcessEngine},
    filesystem::LocalFileSystem,
    library::ScriptLibraryComposer,
    preprocessor::DirectivePreprocessor,
    repl::print_result,
};

#[derive(Parser)]
#[command(author, version, about = "Script execution orchestrator")]
struct Args {
    /// Path to the configuration file
    #[arg(long, env = "SCRIPTUM_CONFIG", default_value = CONFIG_FILE_NAME)]
    config: PathBuf,
    /// External command that runs composed scripts (overrides the config file)
    #[arg(long, env = "SCRIPTUM_ENGINE")]
    engine: Option<String>,
    /// Print the composed compilation unit instead of running it
    #[arg(long)]
    dry_run: bool,
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a script file
    Run {
        script: PathBuf,
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Evaluate a snippet of script code
    Eval {
        source: String,
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Start an interactive session
    Repl,
}

fn main() -> Result<ExitCode, ScriptumError> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = ScriptumConfig::load_from(&args.config)?;
    let engine = select_engine(&args, &config);
    let mut orchestrator = build_orchestrator(&config, engine)?;

    match args.command.unwrap_or(Command::Repl) {
        Command::Run { script, args } => {
            start_session(&mut orchestrator, &config, args.clone())?;
            let result = orchestrator.execute(&script, &args);
            finish(orchestrator, result)
        }
        Command::Eval { source, args } => {
            start_session(&mut orchestrator, &config, args.clone())?;
            let result = orchestrator.execute_script(&source, &args);
            finish(orchestrator, result)
        }
        Command::Repl => {
            start_session(&mut orchestrator, &config, Vec::new())?;
            Repl::new(orchestrator, config).run()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "scriptum=debug" } else { "scriptum=warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn select_engine(args: &Args, config: &ScriptumConfig) -> Box<dyn ScriptEngine> {
    let command = args.engine.clone().or_else(|| config.engine.command.clone());
    match command {
        Some(command) if !args.dry_run => Box::new(ProcessEngine::new(
            command,
            config.engine.args.clone(),
            config.engine.extension.clone(),
        )),
        _ => {
            if !args.dry_run {
                tracing::warn!("no engine command configured, printing the composed unit");
            }
            Box::new(ListingEngine::default())
        }
    }
}

fn build_orchestrator(
    config: &ScriptumConfig,
    engine: Box<dyn ScriptEngine>,
) -> Result<Orchestrator, ScriptumError> {
    let fs = Rc::new(LocalFileSystem::from_env(config.folders.clone())?);
    let preprocessor = DirectivePreprocessor::new(fs.clone());
    Ok(Orchestrator::new(
        fs,
        Box::new(preprocessor),
        engine,
        Box::new(ScriptLibraryComposer),
    ))
}

fn start_session(
    orchestrator: &mut Orchestrator,
    config: &ScriptumConfig,
    args: Vec<String>,
) -> Result<(), ScriptumError> {
    orchestrator.initialize(Vec::new(), args)?;
    config.apply(orchestrator)
}

fn finish(
    mut orchestrator: Orchestrator,
    result: Result<ExecutionResult, ScriptumError>,
) -> Result<ExitCode, ScriptumError> {
    let result = orchestrator.finish(result)?;
    print_result(&result);
    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
