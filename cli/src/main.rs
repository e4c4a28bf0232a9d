mod config;
mod test_runner;
mod verbose;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use folio::Outline;
use folio::parser::ParseError;
use folio::validate::{ValidationOptions, validate};
use manuscript::{
    ChapterBreak, HeadingStyle, ManuscriptError, ProgressReport, SceneSeparator, WordCountReport,
};
use tracing::{debug, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::Config;
use crate::verbose::Verbosity;

#[derive(Parser)]
#[command(name = "folio", version, about = "Novel outline checker and manuscript compiler")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Project settings file (defaults to ./folio.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(flatten)]
    verbose: Verbosity,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse and validate an outline
    Check(CheckArgs),

    /// Print a parsed outline
    Show(ShowArgs),

    /// Concatenate the manuscript into one markdown file
    Compile(CompileArgs),

    /// Count words by scene and chapter
    Count(CountArgs),

    /// Compare drafted chapters against the outline
    Progress(ProgressArgs),

    /// Run .test.md outline fixtures
    Test(TestArgs),
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Outline file (defaults to `outline.path` from the config)
    outline: Option<PathBuf>,

    /// Fail on warnings too
    #[arg(long)]
    strict: bool,
}

#[derive(clap::Args)]
struct ShowArgs {
    /// Outline file (defaults to `outline.path` from the config)
    outline: Option<PathBuf>,

    /// Dump the parsed structure
    #[arg(long, conflicts_with_all = ["json", "list"])]
    ast: bool,

    /// Print the outline as JSON
    #[arg(long, conflicts_with = "list")]
    json: bool,

    /// List acts and chapter headings only
    #[arg(long)]
    list: bool,
}

#[derive(clap::Args)]
struct CompileArgs {
    /// Manuscript root directory
    #[arg(long)]
    root: Option<PathBuf>,

    /// Output markdown file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Leave out the body of header_material.md
    #[arg(long)]
    no_header: bool,

    /// Don't generate a title page from header_material.md front matter
    #[arg(long)]
    no_title_page: bool,

    /// Chapter heading style: title, number or none
    #[arg(long, value_name = "STYLE")]
    chapter_heading: Option<HeadingStyle>,

    /// Scene separator: em, hr, none, or any literal text
    #[arg(long, value_name = "SEP")]
    scene_sep: Option<SceneSeparator>,

    /// Chapter break: hr, page or none
    #[arg(long, value_name = "BREAK")]
    chapter_break: Option<ChapterBreak>,
}

#[derive(clap::Args)]
struct CountArgs {
    /// Manuscript root directory
    #[arg(long)]
    root: Option<PathBuf>,

    /// Show file paths in scene output
    #[arg(long)]
    show_paths: bool,
}

#[derive(clap::Args)]
struct ProgressArgs {
    /// Outline file (defaults to `outline.path` from the config)
    outline: Option<PathBuf>,

    /// Manuscript root directory
    #[arg(long)]
    root: Option<PathBuf>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or directory containing them
    path: PathBuf,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let cli = Cli::parse();

    let subscriber = Registry::default()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(cli.verbose.log_level_filter().into()));
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: cannot install logger: {}", e);
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let ctx = Context {
        config,
        color_choice: if cli.no_color {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        },
    };

    match cli.command {
        Command::Check(args) => do_check(&ctx, args),
        Command::Show(args) => do_show(&ctx, args),
        Command::Compile(args) => do_compile(&ctx, args),
        Command::Count(args) => do_count(&ctx, args),
        Command::Progress(args) => do_progress(&ctx, args),
        Command::Test(args) => {
            if args.list_categories {
                test_runner::list_categories(&args.path);
                return;
            }
            let exit_code = test_runner::run_tests(&args.path, cli.no_color, &args.category);
            process::exit(exit_code);
        }
    }
}

struct Context {
    config: Config,
    color_choice: ColorChoice,
}

/// An outline parsed into its file database, ready for diagnostics.
struct LoadedOutline {
    outline: Outline,
    files: SimpleFiles<String, String>,
    path: PathBuf,
}

impl Context {
    fn outline_path(&self, arg: Option<PathBuf>) -> PathBuf {
        match arg.or_else(|| self.config.outline.path.clone()) {
            Some(path) => path,
            None => {
                eprintln!("error: no outline given and `outline.path` is not set in the config");
                process::exit(2);
            }
        }
    }

    fn manuscript_root(&self, arg: Option<PathBuf>) -> PathBuf {
        arg.unwrap_or_else(|| self.config.manuscript.root.clone())
    }

    /// Read and parse an outline. Parse errors are rendered and end the process.
    fn load_outline(&self, arg: Option<PathBuf>) -> LoadedOutline {
        let path = self.outline_path(arg);
        let source = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: cannot read '{}': {}", path.display(), e);
                process::exit(1);
            }
        };

        let mut files = SimpleFiles::new();
        let file_id = files.add(path.display().to_string(), source.clone());

        match folio::parser::Parser::new(source, file_id).parse() {
            Ok(outline) => LoadedOutline {
                outline,
                files,
                path,
            },
            Err(errors) => {
                self.emit(&files, &errors);
                process::exit(1);
            }
        }
    }

    fn emit(&self, files: &SimpleFiles<String, String>, diagnostics: &[ParseError]) {
        let writer = StandardStream::stderr(self.color_choice);
        let config = term::Config::default();
        for diagnostic in diagnostics {
            let _ = term::emit_to_write_style(
                &mut writer.lock(),
                &config,
                files,
                &diagnostic.to_diagnostic(),
            );
        }
    }
}

fn exit_with(error: ManuscriptError) -> ! {
    eprintln!("error: {}", error);
    process::exit(error.exit_code());
}

fn do_check(ctx: &Context, args: CheckArgs) {
    let loaded = ctx.load_outline(args.outline);
    let options = ValidationOptions {
        require_setting: ctx.config.outline.require_setting,
    };
    let diagnostics = validate(&loaded.outline, &options);
    ctx.emit(&loaded.files, &diagnostics);

    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    let warnings = diagnostics.len() - errors;
    if errors > 0 || (args.strict && warnings > 0) {
        eprintln!(
            "error: {}: {} error(s), {} warning(s)",
            loaded.path.display(),
            errors,
            warnings
        );
        process::exit(1);
    }

    eprintln!(
        "ok: {}: {} act(s), {} chapter(s), {} warning(s)",
        loaded.path.display(),
        loaded.outline.acts.len(),
        loaded.outline.chapters().count(),
        warnings
    );
}

fn do_show(ctx: &Context, args: ShowArgs) {
    let LoadedOutline { outline, .. } = ctx.load_outline(args.outline);

    if args.ast {
        println!("{:#?}", outline);
    } else if args.json {
        match serde_json::to_string_pretty(&outline) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: cannot serialize outline: {}", e);
                process::exit(1);
            }
        }
    } else if args.list {
        for act in &outline.acts {
            println!("{}", act.heading());
            for chapter in &act.chapters {
                println!("  {}", chapter.heading());
            }
        }
    } else {
        print!("{}", outline);
    }
}

fn do_compile(ctx: &Context, args: CompileArgs) {
    let settings = &ctx.config.manuscript;
    let root = ctx.manuscript_root(args.root);
    let output = args.output.unwrap_or_else(|| settings.output.clone());

    let mut options = settings.compile_options();
    if args.no_header {
        options.include_header = false;
    }
    if args.no_title_page {
        options.title_page = false;
    }
    if let Some(style) = args.chapter_heading {
        options.chapter_heading = style;
    }
    if let Some(sep) = args.scene_sep {
        options.scene_separator = sep;
    }
    if let Some(chapter_break) = args.chapter_break {
        options.chapter_break = chapter_break;
    }
    debug!(?options, root = %root.display(), "compiling");

    let compiled = manuscript::compile(&root, &options).unwrap_or_else(|e| exit_with(e));
    if let Err(e) = manuscript::write_output(&output, &compiled.text) {
        exit_with(e);
    }
    info!(
        chapters = compiled.chapters,
        scenes = compiled.scenes,
        words = compiled.words,
        "compiled manuscript"
    );
    println!("Wrote: {}", display_slash(&output));
}

fn do_count(ctx: &Context, args: CountArgs) {
    let root = ctx.manuscript_root(args.root);
    let report = WordCountReport::collect(&root).unwrap_or_else(|e| exit_with(e));
    print!("{}", report.with_paths(args.show_paths));
}

fn do_progress(ctx: &Context, args: ProgressArgs) {
    let LoadedOutline { outline, .. } = ctx.load_outline(args.outline);
    let root = ctx.manuscript_root(args.root);
    let counts = WordCountReport::collect(&root).unwrap_or_else(|e| exit_with(e));
    print!("{}", ProgressReport::build(&outline, &counts));
}

fn display_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
