use cfhex::commands::dump_source;
use std::env;
use std::error::Error;
use std::path::Path;

// Usage: cfhdump <src-root> <classes-root> <source-file>
fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 4 {
        eprintln!("Usage: {} <src-root> <classes-root> <source-file>", args[0]);
        std::process::exit(1);
    }

    match process_source(&args[1], &args[2], &args[3]) {
        Ok(out) => println!("Wrote {}", out),
        Err(err) => {
            eprintln!("Aborted due to error: {err}");
            std::process::exit(1);
        }
    }
}

fn process_source(src_root: &str, classes_root: &str, source_file: &str) -> Result<String, Box<dyn Error>> {
    let out = dump_source(Path::new(src_root), Path::new(classes_root), Path::new(source_file))?;
    Ok(out.display().to_string())
}
