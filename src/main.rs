fn main() {
    if let Err(err) = facility_filter::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
