//! metahead binary entry point.

fn main() {
    if let Err(err) = metahead::cli::run() {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}
