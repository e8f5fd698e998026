use meeting_assistant::extraction;
use std::env;
use std::fs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: extract_check <completion_file>");
        std::process::exit(2);
    }

    let raw = fs::read_to_string(&args[1])?;
    let result = extraction::extract(&raw);

    println!(
        "Summary ({} chars):\n{}\n",
        result.summary.chars().count(),
        result.summary
    );
    println!("Tasks: {}", result.tasks.len());
    for (i, task) in result.tasks.iter().enumerate() {
        println!("  {}. {}", i + 1, task);
    }

    Ok(())
}
