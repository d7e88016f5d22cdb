use std::process;

fn main() {
    if let Err(e) = uprun::cli::run() {
        if !e.is_exit() {
            eprintln!("Error: {}", e);
        }
        process::exit(e.exit_code());
    }
}
