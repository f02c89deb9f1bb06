mod cli;
mod platform;

fn main() {
    if let Err(err) = cli::run_from_args() {
        eprintln!("docgrab error: {err:#}");
        std::process::exit(1);
    }
}
