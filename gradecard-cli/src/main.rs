use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::error;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use gradecard::{
    analyze_student, filter_by_institution, tag_branch, write_students_csv, GradecardProcessor, ParseResult,
    ParsingConfig,
};

#[derive(Parser)]
#[command(name = "gradecard")]
#[command(about = "Extract student results and statistics from gradecard page dumps")]
struct Args {
    /// Path to the page dump (JSON) to process
    #[arg(short, long, required_unless_present = "list_cache")]
    input: Option<String>,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Output file path (if not specified, auto-generated based on input)
    #[arg(short, long)]
    output: Option<String>,

    /// Directory holding cached results
    #[arg(long, default_value = "cache")]
    cache_dir: String,

    /// Skip cache and force fresh processing
    #[arg(long)]
    skip_cache: bool,

    /// Enable detailed profiling of all pipeline steps
    #[arg(long)]
    profile: bool,

    /// Log level: error, warn, info, debug or trace
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Print a rank and per-subject comparison for one seat number
    #[arg(long)]
    analyze: Option<String>,

    /// Also write the students as CSV to this path
    #[arg(long)]
    csv: Option<String>,

    /// Only export students whose institution contains this text (case-insensitive)
    #[arg(long, requires = "csv")]
    institution: Option<String>,

    /// Branch tag written into the CSV Branch column
    #[arg(long, requires = "csv")]
    branch: Option<String>,

    /// List cached results and exit
    #[arg(long)]
    list_cache: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    TermLogger::init(
        args.log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    println!("🎓 Gradecard Result Parser");

    let processor = GradecardProcessor::new_cli(&args.cache_dir)?;

    if args.list_cache {
        return list_cache(&processor);
    }

    let input = args
        .input
        .as_deref()
        .ok_or_else(|| anyhow!("--input is required"))?;

    if !Path::new(input).exists() {
        println!("⚠️  Input page dump not found at: {}", input);
        println!("   Please check the file path.");
        std::process::exit(1);
    }

    let config = ParsingConfig::load_with_fallback(args.config.as_deref());
    if let Some(config_path) = &args.config {
        println!("📋 Loaded config from: {}", config_path);
    } else {
        println!("📋 Using default config");
    }

    println!("📄 Processing: {}", input);

    match processor.process_file_with_config_and_profiling(input, &config, args.profile, args.skip_cache) {
        Ok(mut result) => {
            println!("✅ Successfully processed document");
            print_summary(&result);

            let output_path = args.output.clone().unwrap_or_else(|| default_output_path(input));
            save_result(&result, &output_path)?;

            if let Some(seat_no) = &args.analyze {
                let analysis = analyze_student(&result, seat_no)?;
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            }

            if let Some(csv_path) = &args.csv {
                if let Some(branch) = &args.branch {
                    tag_branch(&mut result.students, branch);
                }
                export_csv(&result, csv_path, args.institution.as_deref())?;
            }
        }
        Err(e) => {
            error!("❌ Processing failed: {e:#}");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn default_output_path(input: &str) -> String {
    let input_name = Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    format!("{input_name}_results.json")
}

fn print_summary(result: &ParseResult) {
    let stats = &result.statistics;
    println!("📊 Results:");
    println!("   - Program: {} ({})", result.exam_info.program, result.exam_info.semester);
    println!("   - Examination: {}", result.exam_info.examination);
    println!("   - Subjects: {}", result.course_metadata.len());
    println!("   - Students: {}", stats.total_students);
    println!("   - Passed: {} ({}%)", stats.passed_students, stats.pass_percentage);
    println!("   - Median CGPA: {}", stats.median_cgpa);
    println!("   - Institutions: {}", stats.college_statistics.len());
    if result.unparsed_blocks > 0 {
        println!("   ⚠️  Unparsed blocks: {}", result.unparsed_blocks);
    }
}

fn save_result(result: &ParseResult, output_path: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(output_path, json).with_context(|| format!("Failed to write {}", output_path))?;
    println!("💾 Results saved to: {}", output_path);
    Ok(())
}

fn export_csv(result: &ParseResult, csv_path: &str, institution: Option<&str>) -> Result<()> {
    let students = match institution {
        Some(keyword) => filter_by_institution(&result.students, keyword),
        None => result.students.iter().collect(),
    };

    if students.is_empty() {
        println!("⚠️  No students matched, CSV not written");
        return Ok(());
    }

    let file = File::create(csv_path).with_context(|| format!("Failed to create {}", csv_path))?;
    let mut writer = BufWriter::new(file);
    write_students_csv(&mut writer, &students)?;
    writer.flush()?;
    println!("💾 {} students exported to: {}", students.len(), csv_path);
    Ok(())
}

fn list_cache(processor: &GradecardProcessor) -> Result<()> {
    let entries = processor.list_cached_results()?;
    if entries.is_empty() {
        println!("📭 Cache is empty");
        return Ok(());
    }

    println!("🗂️  Cached results ({}):", entries.len());
    for entry in entries {
        println!(
            "   {}  {}  {} students, {} institutions  {} / {} / {}  [{}]",
            entry.created_at.format("%Y-%m-%d %H:%M"),
            entry.filename,
            entry.student_count,
            entry.institution_count,
            entry.program,
            entry.semester,
            entry.examination,
            &entry.hash[..12.min(entry.hash.len())]
        );
    }
    Ok(())
}
