fn main() {
    if let Err(err) = ai_workbench::cli::main() {
        eprintln!("❌ Error: {err}");
        std::process::exit(1);
    }
}
