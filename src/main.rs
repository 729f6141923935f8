fn main() {
    if let Err(err) = table_review::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
