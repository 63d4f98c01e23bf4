//! Grade Predictor CLI Module
//!
//! Command-line interface for predicting, charting and evaluating student grades.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::cache::ModelCache;
use crate::charts::{self, render, Comparison};
use crate::config::AppConfig;
use crate::dataset::Dataset;
use crate::training::{evaluate, train_test_split, Backend, Evaluation, ModelType};
use crate::utils::DataLoader;

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("  {}", line);
    }
}

fn print_error(err: &dyn std::fmt::Display) {
    println!();
    println!("  {} {}", "error".red().bold(), err);
}

fn wait_enter() {
    println!();
    println!("  {}", dim("press enter to continue"));
    let mut input = String::new();
    let _ = std::io::stdin().read_line(&mut input);
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "grade-predictor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Predict student grades with linear and random forest regression")]
#[command(long_about = None)]
pub struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, env = "GRADE_PREDICTOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Student table (CSV or TSV)
    #[arg(short, long, global = true)]
    pub data: Option<PathBuf>,

    /// Identifier column name
    #[arg(long, global = true)]
    pub id_column: Option<String>,

    /// Label column name
    #[arg(long, global = true)]
    pub label_column: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict the grade of one student
    Predict {
        /// Student identifier
        #[arg(short, long)]
        student: String,

        /// Model type (linear, ensemble)
        #[arg(short, long, default_value = "linear")]
        model: String,
    },

    /// Show dataset charts
    Charts,

    /// Score both models on a seeded hold-out split
    Evaluate {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Evaluate a single model type (linear, ensemble)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Show dataset information
    Info,
}

impl Cli {
    /// Configuration file (if any) with command-line overrides applied
    pub fn app_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };
        if let Some(data) = &self.data {
            config = config.with_data_path(data);
        }
        if let Some(id) = &self.id_column {
            config = config.with_id_column(id);
        }
        if let Some(label) = &self.label_column {
            config = config.with_label_column(label);
        }
        config.validate()?;
        Ok(config)
    }
}

// ─── Shared steps ──────────────────────────────────────────────────────────────

fn load_dataset(config: &AppConfig) -> anyhow::Result<Dataset> {
    step_run("Loading data");
    let start = Instant::now();
    let dataset = Dataset::load(&config.data_path, &config.id_column, &config.label_column)?;
    step_done(&format!(
        "{} students × {} features in {:?}",
        dataset.n_rows(),
        dataset.feature_columns().len(),
        start.elapsed()
    ));
    Ok(dataset)
}

fn backend_for(config: &AppConfig, model_type: ModelType) -> Backend {
    Backend::new(model_type, config.training.clone())
}

fn show_prediction(
    config: &AppConfig,
    cache: &ModelCache,
    dataset: &Dataset,
    model_type: ModelType,
    student_id: &str,
) -> anyhow::Result<()> {
    let record = dataset.student(student_id)?;

    section("Student");
    for (column, value) in dataset.student_row(student_id)? {
        let value = if column == dataset.label_column() {
            value.white().bold()
        } else {
            value.white()
        };
        println!("  {:<24} {}", muted(&column), value);
    }
    println!();

    step_run(&format!("Fitting {}", model_type.display_name().cyan()));
    let start = Instant::now();
    let model = cache.get_or_train(&backend_for(config, model_type), dataset)?;
    step_done(&format!("{:?}", start.elapsed()));

    let predicted = model
        .predict(&record.features)?
        .first()
        .copied()
        .ok_or_else(|| anyhow::anyhow!("model returned no prediction"))?;

    let comparison = Comparison {
        student_id: record.id.clone(),
        predicted,
        actual: record.label,
    };

    section("Prediction");
    println!("  {:<16} {}", muted("Model"), model_type.display_name().white());
    println!("  {:<16} {}", muted("Predicted"), format!("{:.2}", comparison.predicted).white().bold());
    println!("  {:<16} {}", muted("Actual"), format!("{:.2}", comparison.actual).white());
    println!("  {:<16} {}", muted("Error"), format!("{:+.2}", comparison.error()).white());
    println!();
    print_lines(&render::comparison(&comparison));
    println!();
    Ok(())
}

fn show_charts(dataset: &Dataset) -> anyhow::Result<()> {
    section("Charts");
    for chart in charts::overview_charts(dataset)? {
        println!();
        print_lines(&render::chart(&chart));
    }
    println!();
    Ok(())
}

fn print_evaluation_table(results: &[Evaluation]) {
    println!();
    println!(
        "  {:<20} {:>10} {:>10} {:>10} {:>10}",
        muted("Model"), muted("MSE"), muted("RMSE"), muted("MAE"), muted("R²")
    );
    println!("  {}", dim(&"─".repeat(64)));

    let fmt = |v: Option<f64>| v.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "-".to_string());
    for r in results {
        println!(
            "  {:<20} {:>10} {:>10} {:>10} {:>10}",
            r.model_type.display_name(),
            fmt(r.metrics.mse),
            fmt(r.metrics.rmse),
            fmt(r.metrics.mae),
            fmt(r.metrics.r2)
        );
    }
    println!("  {}", dim(&"─".repeat(64)));

    let best = results
        .iter()
        .filter_map(|r| r.metrics.r2.map(|r2| (r, r2)))
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    if let Some((r, r2)) = best {
        println!();
        println!("  {} {} {} {:.4}", ok("best"), r.model_type.display_name().white().bold(), muted("R²:"), r2);
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_predict(config: &AppConfig, student: &str, model: &str) -> anyhow::Result<()> {
    section("Predict");
    let model_type: ModelType = model.parse()?;
    let dataset = load_dataset(config)?;
    let cache = ModelCache::new(config.cache_capacity)?;
    show_prediction(config, &cache, &dataset, model_type, student)
}

pub fn cmd_charts(config: &AppConfig) -> anyhow::Result<()> {
    section("Dataset");
    let dataset = load_dataset(config)?;
    show_charts(&dataset)
}

pub fn cmd_evaluate(config: &AppConfig, json: bool, model: Option<&str>) -> anyhow::Result<()> {
    let model_types: Vec<ModelType> = match model {
        Some(m) => vec![m.parse()?],
        None => ModelType::ALL.to_vec(),
    };

    // JSON output stays machine readable: no progress lines
    let dataset = if json {
        Dataset::load(&config.data_path, &config.id_column, &config.label_column)?
    } else {
        section("Evaluate");
        load_dataset(config)?
    };

    show_evaluation(config, &dataset, &model_types, json)
}

fn show_evaluation(
    config: &AppConfig,
    dataset: &Dataset,
    model_types: &[ModelType],
    json: bool,
) -> anyhow::Result<()> {
    let (x, y) = dataset.split()?;
    let split = train_test_split(x.n_rows(), config.training.test_size, config.training.random_state)?;

    let mut results = Vec::with_capacity(model_types.len());
    for &model_type in model_types {
        if !json {
            step_run(&format!("Evaluating {}", model_type.display_name().cyan()));
        }
        let start = Instant::now();
        let result = evaluate(&backend_for(config, model_type), &x, &y, &split)?;
        if !json {
            step_done(&format!("{:?}", start.elapsed()));
        }
        results.push(result);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        println!();
        println!("  {:<16} {} train / {} test", muted("Split"), split.train_indices.len(), split.test_indices.len());
        print_evaluation_table(&results);
        println!();
    }
    Ok(())
}

pub fn cmd_info(config: &AppConfig) -> anyhow::Result<()> {
    section("Data Info");

    let info = DataLoader::new().get_file_info(&config.data_path)?;
    let dataset = Dataset::load(&config.data_path, &config.id_column, &config.label_column)?;
    let df = dataset.frame();

    println!("  {:<12} {}", muted("File"), info.path);
    println!("  {:<12} {:.1} KB", muted("Size"), info.file_size as f64 / 1024.0);
    println!("  {:<12} {}", muted("Students"), dataset.n_rows());
    println!("  {:<12} {}", muted("Features"), dataset.feature_columns().len());
    println!("  {:<12} {}", muted("Identifier"), dataset.id_column());
    println!("  {:<12} {}", muted("Label"), dataset.label_column());
    println!("  {:<12} {}", muted("Version"), dataset.version().short());
    println!();

    println!("  {:<24} {:<12} {:>6}", muted("Column"), muted("Type"), muted("Nulls"));
    println!("  {}", dim(&"─".repeat(44)));

    for col in df.get_columns() {
        println!(
            "  {:<24} {:<12} {:>6}",
            col.name().as_str(),
            format!("{:?}", col.dtype()).truecolor(140, 140, 140),
            col.null_count()
        );
    }

    println!();
    Ok(())
}

// ─── Interactive mode ──────────────────────────────────────────────────────────

fn print_banner(config: &AppConfig) {
    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Student Grade Predictor".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Data   ", &config.data_path.display().to_string()));
    line_box(&kv("Id     ", &config.id_column));
    line_box(&kv("Label  ", &config.label_column));
    line_box_empty();
    line_box_bottom();
    println!();
}

pub fn cmd_interactive(config: &AppConfig) -> anyhow::Result<()> {
    use dialoguer::{Select, theme::ColorfulTheme};

    print_banner(config);

    let dataset = load_dataset(config)?;
    let cache = ModelCache::new(config.cache_capacity)?;

    let theme = ColorfulTheme {
        active_item_prefix: dialoguer::console::style("  ›".to_string()).for_stderr().cyan(),
        active_item_style: dialoguer::console::Style::new().for_stderr().white().bold(),
        inactive_item_prefix: dialoguer::console::style("   ".to_string()).for_stderr(),
        inactive_item_style: dialoguer::console::Style::new().for_stderr().color256(245),
        prompt_prefix: dialoguer::console::style("  ?".to_string()).for_stderr().color256(111),
        prompt_style: dialoguer::console::Style::new().for_stderr().white().bold(),
        ..ColorfulTheme::default()
    };

    loop {
        let items = &[
            "Predict               one student's grade",
            "Charts                dataset distributions",
            "Evaluate              hold-out scores for both models",
            "Exit",
        ];

        println!();
        let sel = Select::with_theme(&theme)
            .with_prompt("What would you like to do")
            .items(items)
            .default(0)
            .interact_opt()?;

        let outcome = match sel {
            Some(0) => {
                let model_names: Vec<&str> = ModelType::ALL.iter().map(|m| m.display_name()).collect();
                let model_sel = Select::with_theme(&theme)
                    .with_prompt("Model")
                    .items(&model_names[..])
                    .default(0)
                    .interact_opt()?;
                let Some(model_idx) = model_sel else { continue };

                let student_sel = Select::with_theme(&theme)
                    .with_prompt("Student")
                    .items(dataset.student_ids())
                    .default(0)
                    .max_length(12)
                    .interact_opt()?;
                let Some(student_idx) = student_sel else { continue };

                show_prediction(
                    config,
                    &cache,
                    &dataset,
                    ModelType::ALL[model_idx],
                    &dataset.student_ids()[student_idx],
                )
            }
            Some(1) => show_charts(&dataset),
            Some(2) => {
                section("Evaluate");
                show_evaluation(config, &dataset, &ModelType::ALL, false)
            }
            Some(3) | None => {
                println!();
                println!("  {}", dim("goodbye"));
                println!();
                break;
            }
            _ => Ok(()),
        };

        if let Err(e) = outcome {
            print_error(&e);
        }
        wait_enter();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi() {
        let colored = format!("{}", "hello".red());
        assert_eq!(strip_ansi(&colored), "hello");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from([
            "grade-predictor",
            "--data",
            "students.csv",
            "predict",
            "--student",
            "1001",
            "--model",
            "ensemble",
        ])
        .unwrap();
        assert_eq!(cli.data, Some(PathBuf::from("students.csv")));
        match cli.command {
            Some(Commands::Predict { student, model }) => {
                assert_eq!(student, "1001");
                assert_eq!(model.parse::<ModelType>().unwrap(), ModelType::RandomForest);
            }
            _ => panic!("expected predict"),
        }

        let cli = Cli::try_parse_from(["grade-predictor", "evaluate", "--json"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Evaluate { json: true, model: None })));

        let cli = Cli::try_parse_from(["grade-predictor"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_overrides_apply_over_defaults() {
        let cli = Cli::try_parse_from([
            "grade-predictor",
            "--data",
            "other.tsv",
            "--label-column",
            "GPA",
            "info",
        ])
        .unwrap();
        let config = cli.app_config().unwrap();
        assert_eq!(config.data_path, PathBuf::from("other.tsv"));
        assert_eq!(config.label_column, "GPA");
        assert_eq!(config.id_column, "StudentID");
    }
}
