fn main() {
    if let Err(err) = tracegraph::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
