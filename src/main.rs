fn main() {
    if let Err(err) = csv_correct::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
