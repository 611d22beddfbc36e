use cfhex::commands::dump_dex_file;
use cfhex::dex::walker::DexDumpOptions;
use std::env;
use std::path::Path;

// Usage: dfhdump <dex-file> <out.dfh> [--leave-checksum] [--leave-signature]
fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <dex-file> <out.dfh> [--leave-checksum] [--leave-signature]", args[0]);
        std::process::exit(1);
    }

    let mut options = DexDumpOptions::default();
    for flag in &args[3..] {
        match flag.as_str() {
            "--leave-checksum" => options.flags.leave_checksum = true,
            "--leave-signature" => options.flags.leave_signature = true,
            other => {
                eprintln!("Unknown option {other}");
                std::process::exit(1);
            }
        }
    }

    match dump_dex_file(Path::new(&args[1]), Path::new(&args[2]), &options) {
        Ok(_) => println!("Wrote {}", args[2]),
        Err(err) => {
            eprintln!("Aborted due to error: {err}");
            std::process::exit(1);
        }
    }
}
