use cfhex::commands::reassemble_file;
use std::env;
use std::path::Path;

// Usage: cfhasm <out-base> <input.cfh|input.dfh>...
// Each input is converted on its own; the first failure stops the run.
fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <out-base> <input.cfh|input.dfh>...", args[0]);
        std::process::exit(1);
    }

    let out_base = Path::new(&args[1]);
    for input in &args[2..] {
        match reassemble_file(Path::new(input), out_base) {
            Ok(out) => println!("{} -> {}", input, out.display()),
            Err(err) => {
                eprintln!("Aborted due to error: {err}");
                std::process::exit(1);
            }
        }
    }
}
